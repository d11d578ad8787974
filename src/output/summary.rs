//! Session summary
//!
//! `SequenceRun` is created when the controller starts, updated once per unit,
//! and finalized when the loop exits.

use crate::address::ContentKind;
use crate::state::UnitOutcome;
use chrono::{DateTime, Utc};

/// Why and where a unit ended badly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitFailure {
    /// Address of the unit that failed
    pub address: String,

    /// Page being processed, if the failure was page-specific
    pub page: Option<u32>,

    /// Error message
    pub message: String,
}

/// Aggregate state of one capture session
#[derive(Debug, Clone)]
pub struct SequenceRun {
    // Run metadata
    pub starting_address: String,
    pub kind: ContentKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    // Progress
    pub units_completed: u32,
    pub pages_captured: u32,
    pub pages_stalled: u32,
    pub pages_abandoned: u32,

    // Termination
    pub last_outcome: Option<UnitOutcome>,
    pub stopped_at: Option<String>,
    pub last_error: Option<UnitFailure>,
}

impl SequenceRun {
    /// Starts a new run at the given seed
    pub fn start(starting_address: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            starting_address: starting_address.into(),
            kind,
            started_at: Utc::now(),
            finished_at: None,
            units_completed: 0,
            pages_captured: 0,
            pages_stalled: 0,
            pages_abandoned: 0,
            last_outcome: None,
            stopped_at: None,
            last_error: None,
        }
    }

    /// Records the unit-level failure that ends the session
    pub fn record_failure(&mut self, address: &str, page: Option<u32>, message: impl Into<String>) {
        self.last_error = Some(UnitFailure {
            address: address.to_string(),
            page,
            message: message.into(),
        });
    }

    /// Closes the run after the unit at `address` ended with `outcome`
    pub fn finish(&mut self, address: &str, outcome: UnitOutcome) {
        self.last_outcome = Some(outcome);
        self.stopped_at = Some(address.to_string());
        self.finished_at = Some(Utc::now());
    }

    /// True if the series ran out normally (a not-found unit) rather than on a fault
    pub fn ended_cleanly(&self) -> bool {
        self.last_outcome == Some(UnitOutcome::NotFound)
    }

    /// Elapsed time, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// One-line outcome, e.g. "Captured 2 volumes."
    pub fn summary_line(&self) -> String {
        format!(
            "Captured {} {}.",
            self.units_completed,
            self.kind.label(self.units_completed)
        )
    }
}

/// Prints the run summary to stdout in a formatted manner
pub fn print_summary(run: &SequenceRun) {
    println!("=== Capture Summary ===\n");

    println!("{}", run.summary_line());
    println!("  Started at: {}", run.starting_address);
    println!("  Pages captured: {}", run.pages_captured);
    if run.pages_stalled > 0 {
        println!("  Pages skipped after stall: {}", run.pages_stalled);
    }
    if run.pages_abandoned > 0 {
        println!("  Pages abandoned after failure: {}", run.pages_abandoned);
    }
    if let Some(seconds) = run.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    match (&run.last_outcome, &run.stopped_at) {
        (Some(UnitOutcome::NotFound), Some(address)) => {
            println!("Stopped: no content at {}", address);
        }
        (Some(outcome), Some(address)) => {
            println!("Stopped: {} at {}", outcome, address);
        }
        _ => {}
    }

    if let Some(failure) = &run.last_error {
        match failure.page {
            Some(page) => println!("  Reason: {} (page {})", failure.message, page),
            None => println!("  Reason: {}", failure.message),
        }
        println!("  Resume from: {}", failure.address);
    }
}
