//! Manga-Capture: a sequential chapter/volume page capturer
//!
//! This crate drives a browser through a reader website, captures every page of a
//! chapter or volume as an image, and advances through the series until a unit
//! resolves to a not-found page.

pub mod address;
pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Manga-Capture operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),

    #[error("Page count unavailable for {unit}: {reason}")]
    PageCountUnavailable { unit: String, reason: String },

    #[error("Page {page} of {unit} failed after {attempts} attempts")]
    FatalPage {
        unit: String,
        page: u32,
        attempts: u32,
    },

    #[error("Next control not actionable after page {page} of {unit}")]
    AdvanceFailed { unit: String, page: u32 },

    #[error("Failed to save {}: {source}", path.display())]
    Capture {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Renderer error: {0}")]
    Renderer(#[from] RendererError),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::UnitState,
        to: state::UnitState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing required value: {0}")]
    MissingValue(String),
}

/// Errors raised while deriving a unit's identity from its address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("could not determine content kind from segment '{0}'")]
    MissingKind(String),

    #[error("invalid number in segment '{0}'")]
    InvalidNumber(String),

    #[error("sequence number {0} has no successor")]
    SequenceOverflow(u64),
}

/// Errors reported by the browser-backed renderer
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation to {address} failed: {message}")]
    Navigation { address: String, message: String },

    #[error("Reload failed: {0}")]
    Refresh(String),

    #[error("Screenshot failed: {0}")]
    Screenshot(String),
}

/// Result type alias for Manga-Capture operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for address operations
pub type AddressResult<T> = std::result::Result<T, AddressError>;

// Re-export commonly used types
pub use address::{next_address, parse_address, ContentAddress, ContentKind};
pub use config::{Config, SeedInput};
pub use crawler::{Renderer, SequenceController, UnitCrawler};
pub use output::{CaptureSink, FileSink, SequenceRun};
pub use state::{PageCaptureResult, UnitOutcome, UnitState};
