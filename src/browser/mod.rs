//! Browser module: the Chrome-backed renderer
//!
//! This module provides:
//! - Launch options built from the seed geometry and `[browser]` settings
//! - `ChromeRenderer`, the `Renderer` implementation that drives one tab
//! - Not-found detection on the rendered document

mod chrome;
mod config;

pub use chrome::{is_not_found_document, ChromeRenderer};
pub use config::LaunchConfig;
