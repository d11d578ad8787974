use crate::config::types::{Config, SeedInput};
use crate::config::validation::{validate, validate_seed};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Destination used when neither the command line nor the file names one
const DEFAULT_DESTINATION: &str = "manga";

/// Environment variable consulted for the ad-block extension when the file has none
pub const EXTENSION_ENV_VAR: &str = "ADBLOCK_PATH";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use manga_capture::config::load_config;
///
/// let config = load_config(Path::new("capture.toml")).unwrap();
/// println!("Retries per page: {}", config.retry.max_attempts);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Command-line values that take precedence over the `[seed]` section
#[derive(Debug, Clone, Default)]
pub struct SeedOverrides {
    pub address: Option<String>,
    pub destination_root: Option<PathBuf>,
    pub window_width: Option<u32>,
    pub window_height: Option<u32>,
}

/// Builds the seed input from overrides and the file, then validates it
///
/// # Returns
///
/// * `Ok(SeedInput)` - All four values resolved
/// * `Err(ConfigError::MissingValue)` - No address anywhere
/// * `Err(ConfigError)` - A resolved value is invalid
pub fn resolve_seed(config: &Config, overrides: SeedOverrides) -> Result<SeedInput, ConfigError> {
    let address = overrides
        .address
        .or_else(|| config.seed.address.clone())
        .ok_or_else(|| {
            ConfigError::MissingValue("seed address (pass a URL or set seed.address)".to_string())
        })?;

    let destination_root = overrides
        .destination_root
        .or_else(|| config.seed.destination_root.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION));

    let seed = SeedInput {
        address,
        destination_root,
        window_width: overrides.window_width.unwrap_or(config.seed.window_width),
        window_height: overrides.window_height.unwrap_or(config.seed.window_height),
    };

    validate_seed(&seed)?;
    Ok(seed)
}
