//! Configuration module for Manga-Capture
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file, and resolving the operator's seed input.
//!
//! # Example
//!
//! ```no_run
//! use manga_capture::config::{load_config, resolve_seed, SeedOverrides};
//! use std::path::Path;
//!
//! let config = load_config(Path::new("capture.toml")).unwrap();
//! let seed = resolve_seed(&config, SeedOverrides::default()).unwrap();
//! println!("Starting at {}", seed.address);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserSettings, Config, RetryConfig, SeedConfig, SeedInput, SelectorConfig, TimingConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, resolve_seed,
    SeedOverrides, EXTENSION_ENV_VAR,
};
pub use validation::{validate, validate_seed};
