//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UnitState`: Tracks where the sequence controller is for the current unit
//! - `UnitOutcome`: How a unit ended (success, not found, error)
//! - `PageCaptureResult`: Outcome of a single page attempt

mod page_result;
mod unit_state;

// Re-export main types
pub use page_result::PageCaptureResult;
pub use unit_state::{UnitOutcome, UnitState};
