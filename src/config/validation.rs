use crate::config::types::{
    BrowserSettings, Config, RetryConfig, SeedInput, SelectorConfig, TimingConfig,
};
use crate::ConfigError;
use url::Url;

/// Largest accepted window edge, in pixels
const MAX_WINDOW_EDGE: u32 = 10_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if let Some(address) = &config.seed.address {
        validate_seed_address(address)?;
    }
    validate_window(config.seed.window_width, config.seed.window_height)?;
    validate_browser_settings(&config.browser)?;
    validate_timing_config(&config.timing)?;
    validate_retry_config(&config.retry)?;
    validate_selectors(&config.selectors)?;
    Ok(())
}

/// Validates the resolved seed input
pub fn validate_seed(seed: &SeedInput) -> Result<(), ConfigError> {
    validate_seed_address(&seed.address)?;

    if seed.destination_root.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "destination_root cannot be empty".to_string(),
        ));
    }

    validate_window(seed.window_width, seed.window_height)
}

/// Validates that the seed is an absolute http(s) URL
fn validate_seed_address(address: &str) -> Result<(), ConfigError> {
    let url = Url::parse(address)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed address '{}': {}", address, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::Validation(format!(
            "Seed address '{}' must use HTTP or HTTPS",
            address
        )));
    }

    Ok(())
}

/// Validates window geometry
fn validate_window(width: u32, height: u32) -> Result<(), ConfigError> {
    for (name, value) in [("window_width", width), ("window_height", height)] {
        if value == 0 || value > MAX_WINDOW_EDGE {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_WINDOW_EDGE, value
            )));
        }
    }
    Ok(())
}

/// Validates browser launch settings
fn validate_browser_settings(config: &BrowserSettings) -> Result<(), ConfigError> {
    if let Some(path) = &config.extension_path {
        if !path.exists() {
            return Err(ConfigError::Validation(format!(
                "extension_path '{}' does not exist",
                path.display()
            )));
        }
    }

    if config.idle_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "idle_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates element timeouts (settle delays may be zero)
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("element_timeout_ms", config.element_timeout_ms),
        ("container_timeout_ms", config.container_timeout_ms),
        ("advance_timeout_ms", config.advance_timeout_ms),
        ("not_found_timeout_ms", config.not_found_timeout_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 1ms, got 0",
                name
            )));
        }
    }
    Ok(())
}

/// Validates retry bounds
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    if config.stall_window < 1 || config.stall_window > config.max_attempts {
        return Err(ConfigError::Validation(format!(
            "stall_window must be between 1 and max_attempts ({}), got {}",
            config.max_attempts, config.stall_window
        )));
    }

    Ok(())
}

/// Validates that no locator is blank
fn validate_selectors(config: &SelectorConfig) -> Result<(), ConfigError> {
    for (name, locator) in config.all() {
        if locator.expression().trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "selector '{}' cannot be empty",
                name
            )));
        }
    }
    Ok(())
}
