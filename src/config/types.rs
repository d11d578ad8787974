use crate::crawler::Locator;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Manga-Capture
///
/// Every section is optional; missing values fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub seed: SeedConfig,
    pub browser: BrowserSettings,
    pub timing: TimingConfig,
    pub retry: RetryConfig,
    pub selectors: SelectorConfig,
}

/// Operator-supplied seed values; command-line arguments take precedence
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Address of the first chapter or volume
    pub address: Option<String>,

    /// Root folder that receives one sub-folder per unit
    #[serde(rename = "destination-root")]
    pub destination_root: Option<PathBuf>,

    #[serde(rename = "window-width")]
    pub window_width: u32,

    #[serde(rename = "window-height")]
    pub window_height: u32,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            address: None,
            destination_root: None,
            window_width: 1450,
            window_height: 1934,
        }
    }
}

/// The one-shot operator input the sequence controller is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInput {
    pub address: String,
    pub destination_root: PathBuf,
    pub window_width: u32,
    pub window_height: u32,
}

/// Browser launch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window (extensions are not loaded in headless mode)
    pub headless: bool,

    /// Unpacked ad-block extension directory to load
    #[serde(rename = "extension-path")]
    pub extension_path: Option<PathBuf>,

    /// How long the browser may sit idle before the driver gives up on it
    #[serde(rename = "idle-timeout-secs")]
    pub idle_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            extension_path: None,
            idle_timeout_secs: 600,
        }
    }
}

impl BrowserSettings {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

/// Settle delays and element timeouts (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TimingConfig {
    /// Pause after a load or reload before querying the DOM
    pub navigation_settle_ms: u64,

    /// Pause after clicking "next" before touching the renderer again
    pub advance_settle_ms: u64,

    /// Pause before screenshotting the page image
    pub capture_settle_ms: u64,

    /// Timeout for page-count and reading-mode lookups
    pub element_timeout_ms: u64,

    /// Timeout for the active page container and its image
    pub container_timeout_ms: u64,

    /// Timeout for the "next" control
    pub advance_timeout_ms: u64,

    /// Timeout for the not-found marker
    pub not_found_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_settle_ms: 2000,
            advance_settle_ms: 100,
            capture_settle_ms: 1000,
            element_timeout_ms: 2000,
            container_timeout_ms: 10_000,
            advance_timeout_ms: 1000,
            not_found_timeout_ms: 2000,
        }
    }
}

impl TimingConfig {
    /// Timings with every delay at zero and minimal timeouts, for scripted renderers
    pub fn immediate() -> Self {
        Self {
            navigation_settle_ms: 0,
            advance_settle_ms: 0,
            capture_settle_ms: 0,
            element_timeout_ms: 1,
            container_timeout_ms: 1,
            advance_timeout_ms: 1,
            not_found_timeout_ms: 1,
        }
    }

    pub fn navigation_settle(&self) -> Duration {
        Duration::from_millis(self.navigation_settle_ms)
    }

    pub fn advance_settle(&self) -> Duration {
        Duration::from_millis(self.advance_settle_ms)
    }

    pub fn capture_settle(&self) -> Duration {
        Duration::from_millis(self.capture_settle_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }

    pub fn container_timeout(&self) -> Duration {
        Duration::from_millis(self.container_timeout_ms)
    }

    pub fn advance_timeout(&self) -> Duration {
        Duration::from_millis(self.advance_timeout_ms)
    }

    pub fn not_found_timeout(&self) -> Duration {
        Duration::from_millis(self.not_found_timeout_ms)
    }
}

/// Per-page retry bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Retries allowed after the first failed attempt
    pub max_attempts: u32,

    /// Consecutive unchanged-address retries that count as a stall
    pub stall_window: u32,

    /// Base delay before a retry; multiplied by the retry number
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            stall_window: 3,
            backoff_ms: 500,
        }
    }
}

/// Site locators for the reader page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectorConfig {
    /// Primary total-page indicator
    pub page_count: Locator,

    /// Used when the primary indicator is absent
    pub page_count_fallback: Option<Locator>,

    /// Marker that identifies a not-found page
    pub not_found: Option<Locator>,

    /// Control that switches the reader into single-page mode
    pub reading_mode: Option<Locator>,

    /// Container of the page currently shown
    pub container: Locator,

    /// Image region inside the active container
    pub image: Locator,

    /// Control that advances to the next page
    pub next: Locator,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            page_count: Locator::css(".hoz-total-image"),
            page_count_fallback: Some(Locator::css(
                "div.navi-buttons:nth-child(3) > div:nth-child(2) > span:nth-child(1) > span:nth-child(2)",
            )),
            not_found: Some(Locator::xpath("//h1[contains(text(), '404')]")),
            reading_mode: Some(Locator::xpath("//div[text()='Horizontal Follow']")),
            container: Locator::css(".ds-item.active"),
            image: Locator::css(".ds-item.active .image-horizontal"),
            next: Locator::css("a.nabu.nabu-left.hoz-next"),
        }
    }
}

impl SelectorConfig {
    /// Every configured locator, for validation
    pub fn all(&self) -> Vec<(&'static str, &Locator)> {
        let mut locators = vec![
            ("page-count", &self.page_count),
            ("container", &self.container),
            ("image", &self.image),
            ("next", &self.next),
        ];
        if let Some(locator) = &self.page_count_fallback {
            locators.push(("page-count-fallback", locator));
        }
        if let Some(locator) = &self.not_found {
            locators.push(("not-found", locator));
        }
        if let Some(locator) = &self.reading_mode {
            locators.push(("reading-mode", locator));
        }
        locators
    }
}
