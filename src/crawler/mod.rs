//! Crawler module for walking a series and capturing its pages
//!
//! This module contains the core control logic, including:
//! - The renderer interface the crawl drives
//! - Per-unit page capture with retry and stall detection
//! - Operator acknowledgment of fatal page failures
//! - The sequence controller that advances unit by unit

mod coordinator;
mod operator;
mod renderer;
mod retry;
mod unit;

pub use coordinator::SequenceController;
pub use operator::{AbortOnFatal, Acknowledgment, ConsolePrompt, FatalPageNotice, OperatorPrompt};
pub use renderer::{ElementHandle, Locator, Renderer};
pub use retry::{RetryPolicy, StallTracker};
pub use unit::{CrawlUnit, UnitCrawler};

use crate::config::{Config, SeedInput};
use crate::output::{FileSink, SequenceRun};
use crate::CrawlError;

/// Runs a complete capture session, writing pages to the local filesystem
///
/// This is the main entry point for starting a session. It will:
/// 1. Derive the unit identity from the seed address
/// 2. Load the seed unit and every following one in turn
/// 3. Capture each unit's pages into `<root>/<kind>-<NNN>/`
/// 4. Stop at the first not-found or failed unit
///
/// # Arguments
///
/// * `seed` - Starting address, destination root and window geometry
/// * `config` - Locators, timing and retry settings
/// * `renderer` - The browser (or stand-in) to drive
/// * `prompt` - How fatal page failures are acknowledged
///
/// # Returns
///
/// * `Ok(SequenceRun)` - Session summary
/// * `Err(CrawlError)` - The seed was invalid or the state machine broke
///
/// # Example
///
/// ```no_run
/// use manga_capture::browser::ChromeRenderer;
/// use manga_capture::config::{resolve_seed, Config, SeedOverrides};
/// use manga_capture::crawler::{capture_series, AbortOnFatal};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let seed = resolve_seed(
///     &config,
///     SeedOverrides {
///         address: Some("https://site/read/title/chapter-1".to_string()),
///         ..SeedOverrides::default()
///     },
/// )?;
/// let mut renderer = ChromeRenderer::launch(&seed, &config)?;
/// let run = capture_series(seed, &config, &mut renderer, Box::new(AbortOnFatal))?;
/// println!("{}", run.summary_line());
/// # Ok(())
/// # }
/// ```
pub fn capture_series<R: Renderer + ?Sized>(
    seed: SeedInput,
    config: &Config,
    renderer: &mut R,
    prompt: Box<dyn OperatorPrompt>,
) -> Result<SequenceRun, CrawlError> {
    SequenceController::new(seed, config, renderer, Box::new(FileSink::new()))
        .with_prompt(prompt)
        .run()
}
