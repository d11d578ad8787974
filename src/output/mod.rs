//! Output module for captured pages and the session report
//!
//! This module handles:
//! - Persisting page images to the unit's folder
//! - Tracking and printing the session summary

mod sink;
pub mod summary;

pub use sink::{page_file_name, CaptureSink, FileSink};
pub use summary::{print_summary, SequenceRun, UnitFailure};
