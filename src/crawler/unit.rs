//! Unit page crawler
//!
//! Captures every page of one chapter or volume:
//! - Reads the total page count (primary indicator, then fallback)
//! - Captures the active page, retrying with reloads when it does not render
//! - Abandons pages whose reloads stop making progress (stalls)
//! - Clicks "next" between pages, never after the last one

use crate::address::ContentAddress;
use crate::config::{Config, SelectorConfig, TimingConfig};
use crate::crawler::operator::{Acknowledgment, FatalPageNotice, OperatorPrompt};
use crate::crawler::renderer::Renderer;
use crate::crawler::retry::RetryPolicy;
use crate::output::{page_file_name, CaptureSink};
use crate::state::PageCaptureResult;
use crate::CrawlError;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Working state for one chapter or volume
#[derive(Debug, Clone)]
pub struct CrawlUnit {
    pub address: ContentAddress,

    /// `<root>/<kind>-<NNN>`
    pub destination: PathBuf,

    pub total_pages: u32,

    /// Page being processed; 0 before the first page
    pub current_page: u32,

    /// Pages written to disk
    pub captured: u32,

    /// Pages that needed at least one retry before they were captured
    pub retried: u32,

    /// Pages given up on after a stall
    pub stalled: Vec<u32>,

    /// Pages given up on by the operator after a fatal failure
    pub abandoned: Vec<u32>,
}

impl CrawlUnit {
    pub fn new(address: ContentAddress, root: &Path, total_pages: u32) -> Self {
        let destination = address.destination(root);
        Self {
            address,
            destination,
            total_pages,
            current_page: 0,
            captured: 0,
            retried: 0,
            stalled: Vec::new(),
            abandoned: Vec::new(),
        }
    }

    /// True once every page was captured or explicitly given up on
    pub fn is_complete(&self) -> bool {
        self.current_page == self.total_pages
            && self.captured as usize + self.stalled.len() + self.abandoned.len()
                == self.total_pages as usize
    }

    fn record(&mut self, page: u32, result: PageCaptureResult) {
        match result {
            PageCaptureResult::Captured => self.captured += 1,
            PageCaptureResult::Retried(_) => {
                self.captured += 1;
                self.retried += 1;
            }
            PageCaptureResult::SkippedAfterStall => self.stalled.push(page),
            PageCaptureResult::FatalFailure => {}
        }
    }
}

/// Drives the renderer through the pages of a unit
#[derive(Debug, Clone)]
pub struct UnitCrawler {
    selectors: SelectorConfig,
    timing: TimingConfig,
    retry: RetryPolicy,
}

impl UnitCrawler {
    pub fn new(selectors: SelectorConfig, timing: TimingConfig, retry: RetryPolicy) -> Self {
        Self {
            selectors,
            timing,
            retry,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.selectors.clone(),
            config.timing.clone(),
            RetryPolicy::from(&config.retry),
        )
    }

    /// Reads the unit's total page count
    ///
    /// # Returns
    ///
    /// * `Ok(u32)` - A positive page count
    /// * `Err(CrawlError::PageCountUnavailable)` - Both indicators missing, or the
    ///   text is not a positive integer
    pub fn determine_page_count<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        address: &ContentAddress,
    ) -> Result<u32, CrawlError> {
        let timeout = self.timing.element_timeout();

        let mut element = renderer.wait_for_element(&self.selectors.page_count, timeout, false);
        if element.is_none() {
            if let Some(fallback) = &self.selectors.page_count_fallback {
                tracing::info!(
                    "Page count indicator {} missing for {}, trying fallback",
                    self.selectors.page_count,
                    address
                );
                element = renderer.wait_for_element(fallback, timeout, false);
            }
        }

        let unavailable = |reason: String| CrawlError::PageCountUnavailable {
            unit: address.to_string(),
            reason,
        };

        let element = element
            .ok_or_else(|| unavailable("no page count indicator found".to_string()))?;

        let text = element.text.trim();
        let total = text
            .parse::<i64>()
            .map_err(|_| unavailable(format!("'{}' is not a page count", text)))?;

        if total <= 0 {
            return Err(unavailable(format!("invalid page count ({})", total)));
        }

        u32::try_from(total).map_err(|_| unavailable(format!("page count {} is too large", total)))
    }

    /// Captures one page, retrying with reloads until it renders, stalls, or
    /// retries run out
    ///
    /// Only capture-sink io errors are returned as `Err`; every renderer-side
    /// problem is folded into the `PageCaptureResult`.
    pub fn capture_page<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        sink: &mut dyn CaptureSink,
        unit: &CrawlUnit,
        page: u32,
    ) -> Result<PageCaptureResult, CrawlError> {
        if self.try_capture(renderer, sink, unit, page)? {
            return Ok(PageCaptureResult::Captured);
        }

        let mut stall = self.retry.stall_tracker();

        for retry in 1..=self.retry.max_attempts {
            tracing::warn!(
                "Page {}/{} of {} not ready, reloading (retry {}/{})",
                page,
                unit.total_pages,
                unit.address,
                retry,
                self.retry.max_attempts
            );
            pause(self.retry.backoff_for(retry));

            let before = renderer.current_address();
            if let Err(e) = renderer.refresh() {
                tracing::warn!("Reload failed on page {} of {}: {}", page, unit.address, e);
            }
            pause(self.timing.navigation_settle());

            if self.try_capture(renderer, sink, unit, page)? {
                return Ok(PageCaptureResult::Retried(retry));
            }

            let after = renderer.current_address();
            if stall.observe(&before, &after) {
                tracing::warn!(
                    "Page {}/{} of {} stalled at {} after {} unchanged reloads, skipping",
                    page,
                    unit.total_pages,
                    unit.address,
                    after,
                    stall.unchanged()
                );
                return Ok(PageCaptureResult::SkippedAfterStall);
            }
        }

        Ok(PageCaptureResult::FatalFailure)
    }

    /// Clicks the "next" control
    ///
    /// Always waits the advance settle delay afterwards so no two navigation
    /// commands reach the renderer back to back.
    pub fn advance<R: Renderer + ?Sized>(&self, renderer: &mut R) -> bool {
        let clicked = renderer
            .wait_for_element(&self.selectors.next, self.timing.advance_timeout(), true)
            .is_some();
        pause(self.timing.advance_settle());
        clicked
    }

    /// Captures pages 1 through `total_pages` in order
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Every page was captured or given up on
    /// * `Ok(false)` - The reader never showed an active page
    /// * `Err(CrawlError::FatalPage)` - A page failed and the operator aborted
    /// * `Err(CrawlError::Capture)` - The sink could not write a page
    /// * `Err(CrawlError::AdvanceFailed)` - The "next" control could not be clicked
    pub fn run_unit<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        sink: &mut dyn CaptureSink,
        prompt: &mut dyn OperatorPrompt,
        unit: &mut CrawlUnit,
    ) -> Result<bool, CrawlError> {
        if renderer
            .wait_for_element(&self.selectors.container, self.timing.container_timeout(), false)
            .is_none()
        {
            tracing::warn!("Reader for {} never showed an active page", unit.address);
            return Ok(false);
        }

        for page in 1..=unit.total_pages {
            unit.current_page = page;
            tracing::debug!("Processing page {}/{} of {}", page, unit.total_pages, unit.address);

            let result = self.capture_page(renderer, sink, unit, page)?;
            unit.record(page, result);

            if result == PageCaptureResult::FatalFailure {
                tracing::error!(
                    "Page {}/{} of {} failed after {} retries",
                    page,
                    unit.total_pages,
                    unit.address,
                    self.retry.max_attempts
                );

                let attempts = self.retry.max_attempts + 1;
                let notice = FatalPageNotice {
                    unit: &unit.address,
                    page,
                    total_pages: unit.total_pages,
                    attempts,
                };
                match prompt.acknowledge(&notice) {
                    Acknowledgment::Continue => {
                        tracing::warn!("Operator skipped page {} of {}", page, unit.address);
                        unit.abandoned.push(page);
                    }
                    Acknowledgment::Abort => {
                        return Err(CrawlError::FatalPage {
                            unit: unit.address.to_string(),
                            page,
                            attempts,
                        });
                    }
                }
            }

            if page < unit.total_pages && !self.advance(renderer) {
                tracing::error!(
                    "Next control not actionable after page {}/{} of {}",
                    page,
                    unit.total_pages,
                    unit.address
                );
                return Err(CrawlError::AdvanceFailed {
                    unit: unit.address.to_string(),
                    page,
                });
            }
        }

        debug_assert!(unit.is_complete());

        tracing::info!(
            "Finished {}: {} captured, {} stalled, {} abandoned",
            unit.address,
            unit.captured,
            unit.stalled.len(),
            unit.abandoned.len()
        );
        Ok(true)
    }

    /// One capture attempt: container, image, settle, screenshot, save
    fn try_capture<R: Renderer + ?Sized>(
        &self,
        renderer: &mut R,
        sink: &mut dyn CaptureSink,
        unit: &CrawlUnit,
        page: u32,
    ) -> Result<bool, CrawlError> {
        let timeout = self.timing.container_timeout();

        if renderer
            .wait_for_element(&self.selectors.container, timeout, false)
            .is_none()
        {
            tracing::debug!("No active container for page {} of {}", page, unit.address);
            return Ok(false);
        }

        let image = match renderer.wait_for_element(&self.selectors.image, timeout, false) {
            Some(image) => image,
            None => {
                tracing::debug!("No image in container for page {} of {}", page, unit.address);
                return Ok(false);
            }
        };

        pause(self.timing.capture_settle());

        let bytes = match renderer.capture(&image) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Screenshot of page {} of {} failed: {}", page, unit.address, e);
                return Ok(false);
            }
        };

        let path = sink
            .save(&bytes, &unit.destination, page)
            .map_err(|source| CrawlError::Capture {
                path: unit.destination.join(page_file_name(page)),
                source,
            })?;

        tracing::info!("Screenshot saved: {}", path.display());
        Ok(true)
    }
}

pub(crate) fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
