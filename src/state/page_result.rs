use std::fmt;

/// Outcome of one page attempt inside a unit
///
/// Not persisted; the crawler acts on it immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCaptureResult {
    /// Captured on the first attempt
    Captured,

    /// Captured after the given number of retries
    Retried(u32),

    /// The renderer stopped progressing; the page was abandoned and the unit continues
    SkippedAfterStall,

    /// Retries were exhausted without a stall being detected
    FatalFailure,
}

impl PageCaptureResult {
    /// Returns true if an image was written for the page
    pub fn is_captured(&self) -> bool {
        matches!(self, Self::Captured | Self::Retried(_))
    }
}

impl fmt::Display for PageCaptureResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Captured => write!(f, "captured"),
            Self::Retried(n) => write!(f, "captured after {} retries", n),
            Self::SkippedAfterStall => write!(f, "skipped after stall"),
            Self::FatalFailure => write!(f, "fatal failure"),
        }
    }
}
