use crate::config::{BrowserSettings, SeedInput};
use std::path::PathBuf;
use std::time::Duration;

/// Everything needed to start the browser for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Run browser in headless mode
    pub headless: bool,

    /// Browser window size
    pub window_size: (u32, u32),

    /// Unpacked extension directory, if any
    pub extension: Option<PathBuf>,

    /// How long the driver waits on an unresponsive browser
    pub idle_timeout: Duration,

    /// Upper bound for a single navigation
    pub navigation_timeout: Duration,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: (1450, 1934),
            extension: None,
            idle_timeout: Duration::from_secs(600),
            navigation_timeout: Duration::from_secs(30),
        }
    }
}

impl LaunchConfig {
    /// Window geometry from the seed, everything else from `[browser]`
    pub fn from_settings(seed: &SeedInput, settings: &BrowserSettings) -> Self {
        let extension = if settings.headless && settings.extension_path.is_some() {
            tracing::warn!("Extensions are not loaded in headless mode, ignoring extension path");
            None
        } else {
            settings.extension_path.clone()
        };

        Self {
            headless: settings.headless,
            window_size: (seed.window_width, seed.window_height),
            extension,
            idle_timeout: settings.idle_timeout(),
            ..Self::default()
        }
    }
}
