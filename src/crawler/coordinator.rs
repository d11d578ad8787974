//! Sequence controller - walks a series unit by unit
//!
//! This module contains the outer loop of a capture session:
//! - Deriving the unit identity from the seed before any navigation
//! - Loading each unit and detecting the end of the series (not-found page)
//! - Counting pages and handing the unit to the `UnitCrawler`
//! - Advancing to the next sequence number while units succeed
//! - Recording the session summary

use crate::address::{next_address, parse_address, ContentAddress};
use crate::config::{Config, SeedInput, TimingConfig};
use crate::crawler::operator::{AbortOnFatal, OperatorPrompt};
use crate::crawler::renderer::{Locator, Renderer};
use crate::crawler::unit::{pause, CrawlUnit, UnitCrawler};
use crate::output::{CaptureSink, SequenceRun};
use crate::state::{UnitOutcome, UnitState};
use crate::CrawlError;

/// Main sequence controller structure
///
/// Borrows the renderer for the whole session; only one unit is ever in flight.
pub struct SequenceController<'r, R: Renderer + ?Sized> {
    seed: SeedInput,
    crawler: UnitCrawler,
    timing: TimingConfig,
    reading_mode: Option<Locator>,
    renderer: &'r mut R,
    sink: Box<dyn CaptureSink>,
    prompt: Box<dyn OperatorPrompt>,
    state: UnitState,
}

impl<'r, R: Renderer + ?Sized> SequenceController<'r, R> {
    /// Creates a controller for `seed`
    ///
    /// Fatal page failures abort the session unless a different prompt is set
    /// with [`SequenceController::with_prompt`].
    pub fn new(
        seed: SeedInput,
        config: &Config,
        renderer: &'r mut R,
        sink: Box<dyn CaptureSink>,
    ) -> Self {
        Self {
            seed,
            crawler: UnitCrawler::from_config(config),
            timing: config.timing.clone(),
            reading_mode: config.selectors.reading_mode.clone(),
            renderer,
            sink,
            prompt: Box::new(AbortOnFatal),
            state: UnitState::Idle,
        }
    }

    pub fn with_prompt(mut self, prompt: Box<dyn OperatorPrompt>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Current controller state
    pub fn state(&self) -> UnitState {
        self.state
    }

    /// Runs the session until a unit resolves to not-found or fails
    ///
    /// # Returns
    ///
    /// * `Ok(SequenceRun)` - The session ended; `last_outcome` says how
    /// * `Err(CrawlError::Address)` - The seed does not name a chapter or volume;
    ///   nothing was loaded
    /// * `Err(CrawlError::InvalidTransition)` - Internal state machine violation
    pub fn run(&mut self) -> Result<SequenceRun, CrawlError> {
        let seed = parse_address(&self.seed.address)?;
        let mut run = SequenceRun::start(self.seed.address.clone(), seed.kind());

        tracing::info!(
            "Starting capture at {} ({}) into {}",
            seed,
            self.seed.address,
            self.seed.destination_root.display()
        );

        // The seed is loaded verbatim; later units use the derived address
        let mut current = seed;
        let mut address = self.seed.address.clone();

        loop {
            let outcome = self.process_unit(&current, &address, &mut run)?;
            debug_assert!(self.state.is_active());
            self.transition(UnitState::UnitDone(outcome))?;

            if outcome != UnitOutcome::Success {
                self.transition(UnitState::SessionDone)?;
                run.finish(&address, outcome);
                break;
            }

            run.units_completed += 1;
            let following = next_address(current.base(), current.kind(), current.sequence_number())
                .and_then(|next| current.next().map(|unit| (unit, next)));
            match following {
                Ok((unit, next)) => {
                    current = unit;
                    address = next;
                }
                Err(e) => {
                    tracing::error!("Cannot continue past {}: {}", current, e);
                    self.transition(UnitState::SessionDone)?;
                    run.record_failure(&address, None, e.to_string());
                    run.finish(&address, UnitOutcome::Error);
                    break;
                }
            }
        }

        match run.last_outcome {
            Some(UnitOutcome::NotFound) => {
                tracing::info!("No content at {}, series finished", current)
            }
            Some(outcome) => tracing::warn!("Session stopped at {} ({})", current, outcome),
            None => {}
        }
        tracing::info!("{}", run.summary_line());

        Ok(run)
    }

    /// Takes one unit from navigation through its last page
    fn process_unit(
        &mut self,
        unit: &ContentAddress,
        address: &str,
        run: &mut SequenceRun,
    ) -> Result<UnitOutcome, CrawlError> {
        self.transition(UnitState::NavigatingUnit)?;
        tracing::info!("Opening {} at {}", unit, address);

        if let Err(e) = self.renderer.load(address) {
            tracing::error!("Could not load {}: {}", address, e);
            run.record_failure(address, None, e.to_string());
            return Ok(UnitOutcome::Error);
        }
        pause(self.timing.navigation_settle());

        if self.renderer.is_not_found() {
            return Ok(UnitOutcome::NotFound);
        }

        self.select_reading_mode(unit);

        self.transition(UnitState::CountingPages)?;
        let total_pages = match self.crawler.determine_page_count(&mut *self.renderer, unit) {
            Ok(total) => total,
            Err(e) => {
                tracing::error!("{}", e);
                run.record_failure(address, None, e.to_string());
                return Ok(UnitOutcome::Error);
            }
        };
        tracing::info!("{} has {} pages", unit, total_pages);

        self.transition(UnitState::CrawlingUnit)?;
        let mut crawl = CrawlUnit::new(unit.clone(), &self.seed.destination_root, total_pages);
        let result = self.crawler.run_unit(
            &mut *self.renderer,
            self.sink.as_mut(),
            self.prompt.as_mut(),
            &mut crawl,
        );

        run.pages_captured += crawl.captured;
        run.pages_stalled += crawl.stalled.len() as u32;
        run.pages_abandoned += crawl.abandoned.len() as u32;

        match result {
            Ok(true) => Ok(UnitOutcome::Success),
            Ok(false) => {
                run.record_failure(address, None, "reader never showed an active page");
                Ok(UnitOutcome::Error)
            }
            Err(e) => {
                tracing::error!("{}", e);
                let page = (crawl.current_page > 0).then_some(crawl.current_page);
                run.record_failure(address, page, e.to_string());
                Ok(UnitOutcome::Error)
            }
        }
    }

    /// Switches the reader to single-page mode when a toggle is configured
    fn select_reading_mode(&mut self, unit: &ContentAddress) {
        let Some(locator) = &self.reading_mode else {
            return;
        };
        if self
            .renderer
            .wait_for_element(locator, self.timing.element_timeout(), true)
            .is_some()
        {
            tracing::debug!("Selected reading mode for {}", unit);
            pause(self.timing.advance_settle());
        } else {
            tracing::warn!("Reading mode toggle {} not found on {}", locator, unit);
        }
    }

    fn transition(&mut self, next: UnitState) -> Result<(), CrawlError> {
        tracing::debug!("State {} -> {}", self.state, next);
        self.state = self.state.transition(next)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::renderer::ElementHandle;
    use crate::RendererError;
    use std::io;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, Instant};

    /// Every address up to `last` has two pages; anything above is not found
    struct SeriesReader {
        last: u64,
        current: u64,
        loads: Vec<String>,
        fail_load: bool,
        toggled_at: Option<Instant>,
        toggle_to_count: Option<Duration>,
    }

    impl SeriesReader {
        fn new(last: u64) -> Self {
            Self {
                last,
                current: 0,
                loads: Vec::new(),
                fail_load: false,
                toggled_at: None,
                toggle_to_count: None,
            }
        }
    }

    impl Renderer for SeriesReader {
        fn load(&mut self, address: &str) -> Result<(), RendererError> {
            self.loads.push(address.to_string());
            if self.fail_load {
                return Err(RendererError::Navigation {
                    address: address.to_string(),
                    message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
                });
            }
            self.current = parse_address(address)
                .map(|a| a.sequence_number())
                .unwrap_or(u64::MAX);
            Ok(())
        }

        fn is_not_found(&mut self) -> bool {
            self.current > self.last
        }

        fn wait_for_element(
            &mut self,
            locator: &Locator,
            _timeout: Duration,
            click: bool,
        ) -> Option<ElementHandle> {
            if click && self.toggled_at.is_none() {
                self.toggled_at = Some(Instant::now());
            } else if let (Some(at), None) = (self.toggled_at, self.toggle_to_count) {
                self.toggle_to_count = Some(at.elapsed());
            }
            Some(ElementHandle::new(locator.clone(), "2"))
        }

        fn refresh(&mut self) -> Result<(), RendererError> {
            Ok(())
        }

        fn current_address(&mut self) -> String {
            format!("https://site/x/chapter-{}", self.current)
        }

        fn capture(&mut self, _element: &ElementHandle) -> Result<Vec<u8>, RendererError> {
            Ok(vec![0xFF, 0xD8])
        }
    }

    struct NullSink;

    impl CaptureSink for NullSink {
        fn save(&mut self, _image: &[u8], folder: &Path, page: u32) -> io::Result<PathBuf> {
            Ok(folder.join(page.to_string()))
        }
    }

    fn config() -> Config {
        let mut config = Config::default();
        config.timing = TimingConfig::immediate();
        config.retry.backoff_ms = 0;
        config
    }

    fn seed(address: &str) -> SeedInput {
        SeedInput {
            address: address.to_string(),
            destination_root: PathBuf::from("/out"),
            window_width: 1450,
            window_height: 1934,
        }
    }

    #[test]
    fn test_runs_until_not_found() {
        let mut reader = SeriesReader::new(3);
        let config = config();
        let run = {
            let mut controller = SequenceController::new(
                seed("https://site/x/chapter-2"),
                &config,
                &mut reader,
                Box::new(NullSink),
            );
            let run = controller.run().unwrap();
            assert_eq!(controller.state(), UnitState::SessionDone);
            run
        };

        assert_eq!(run.units_completed, 2);
        assert_eq!(run.pages_captured, 4);
        assert_eq!(run.last_outcome, Some(UnitOutcome::NotFound));
        assert_eq!(run.stopped_at.as_deref(), Some("https://site/x/chapter-4"));
        assert_eq!(run.summary_line(), "Captured 2 chapters.");
        assert_eq!(
            reader.loads,
            vec![
                "https://site/x/chapter-2",
                "https://site/x/chapter-3",
                "https://site/x/chapter-4",
            ]
        );
    }

    #[test]
    fn test_invalid_seed_loads_nothing() {
        let mut reader = SeriesReader::new(3);
        let config = config();
        {
            let mut controller = SequenceController::new(
                seed("https://site/x/episode-2"),
                &config,
                &mut reader,
                Box::new(NullSink),
            );
            let err = controller.run().unwrap_err();
            assert!(matches!(err, CrawlError::Address(_)));
            assert_eq!(controller.state(), UnitState::Idle);
        }
        assert!(reader.loads.is_empty());
    }

    #[test]
    fn test_load_failure_ends_with_error() {
        let mut reader = SeriesReader::new(3);
        reader.fail_load = true;
        let config = config();
        let mut controller = SequenceController::new(
            seed("https://site/x/volume-1"),
            &config,
            &mut reader,
            Box::new(NullSink),
        );

        let run = controller.run().unwrap();

        assert_eq!(run.last_outcome, Some(UnitOutcome::Error));
        assert_eq!(run.units_completed, 0);
        assert_eq!(run.summary_line(), "Captured 0 volumes.");
        let failure = run.last_error.unwrap();
        assert_eq!(failure.address, "https://site/x/volume-1");
        assert_eq!(failure.page, None);
    }

    #[test]
    fn test_last_representable_unit_ends_without_panic() {
        let mut reader = SeriesReader::new(u64::MAX);
        let config = config();
        let seed_address = format!("https://site/x/chapter-{}", u64::MAX);
        let run = {
            let mut controller = SequenceController::new(
                seed(&seed_address),
                &config,
                &mut reader,
                Box::new(NullSink),
            );
            let run = controller.run().unwrap();
            assert_eq!(controller.state(), UnitState::SessionDone);
            run
        };

        assert_eq!(run.units_completed, 1);
        assert_eq!(run.pages_captured, 2);
        assert_eq!(run.last_outcome, Some(UnitOutcome::Error));
        assert_eq!(run.stopped_at.as_deref(), Some(seed_address.as_str()));
        let failure = run.last_error.unwrap();
        assert!(failure.message.contains("has no successor"));
        assert_eq!(reader.loads, vec![seed_address]);
    }

    #[test]
    fn test_reading_mode_toggle_settles_before_counting() {
        let mut reader = SeriesReader::new(1);
        let mut config = config();
        config.timing.advance_settle_ms = 40;
        {
            let mut controller = SequenceController::new(
                seed("https://site/x/chapter-1"),
                &config,
                &mut reader,
                Box::new(NullSink),
            );
            controller.run().unwrap();
        }

        assert!(reader.toggled_at.is_some());
        assert!(reader.toggle_to_count.unwrap() >= Duration::from_millis(40));
    }
}
