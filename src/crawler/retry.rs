//! Per-page retry policy and stall detection
//!
//! One policy applies uniformly to every page of every unit:
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Page image captured | Done |
//! | Attempt failed, retries left | Back off, reload, try again |
//! | Address unchanged for `stall_window` consecutive retries | Abandon page, continue unit |
//! | `max_attempts` retries failed, no stall | Fatal page failure |

use crate::config::RetryConfig;
use std::time::Duration;

/// Bounds applied to each page's retries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first failed attempt
    pub max_attempts: u32,

    /// Consecutive unchanged-address retries that count as a stall
    pub stall_window: u32,

    /// Base backoff, multiplied by the retry number
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            stall_window: config.stall_window,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry (1-based); grows linearly
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(retry)
    }

    /// A fresh stall tracker sized for this policy
    pub fn stall_tracker(&self) -> StallTracker {
        StallTracker::new(self.stall_window)
    }
}

/// Counts consecutive retries that left the renderer's address unchanged
#[derive(Debug, Clone)]
pub struct StallTracker {
    window: u32,
    unchanged: u32,
}

impl StallTracker {
    pub fn new(window: u32) -> Self {
        Self {
            window,
            unchanged: 0,
        }
    }

    /// Records one retry's before/after addresses
    ///
    /// Returns true once the address has stayed the same for `window`
    /// consecutive retries.
    pub fn observe(&mut self, before: &str, after: &str) -> bool {
        if before == after {
            self.unchanged += 1;
        } else {
            self.unchanged = 0;
        }
        self.is_stalled()
    }

    pub fn is_stalled(&self) -> bool {
        self.window > 0 && self.unchanged >= self.window
    }

    /// Consecutive unchanged retries seen so far
    pub fn unchanged(&self) -> u32 {
        self.unchanged
    }
}
