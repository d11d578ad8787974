/// Unit state definitions for the sequence controller
///
/// This module defines every state a unit passes through and which transitions
/// between them are legal.
use crate::CrawlError;
use std::fmt;

/// How a unit ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOutcome {
    /// Every page was captured or explicitly given up on
    Success,

    /// The address resolved to a not-found page (end of the series)
    NotFound,

    /// The unit ended on a fault (page count, fatal page, capture io, renderer)
    Error,
}

impl UnitOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for UnitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents the current state of the sequence controller for one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitState {
    // ===== Active States =====
    /// Nothing has been attempted yet
    Idle,

    /// The unit's address is being loaded and checked for not-found
    NavigatingUnit,

    /// The page-count indicators are being read
    CountingPages,

    /// Pages are being captured
    CrawlingUnit,

    // ===== Terminal States =====
    /// The unit finished with the given outcome
    UnitDone(UnitOutcome),

    /// The whole session has stopped
    SessionDone,
}

impl UnitState {
    /// Returns true if no further work happens for the current unit
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::UnitDone(_) | Self::SessionDone)
    }

    /// Returns true if a unit is being worked on
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            Self::NavigatingUnit | Self::CountingPages | Self::CrawlingUnit
        )
    }

    /// Returns true if the state machine may move from `self` to `next`
    ///
    /// Only a successful unit loops back to navigation; every other unit outcome
    /// ends the session. A successful unit also ends the session when its
    /// sequence number has no successor.
    pub fn can_transition_to(&self, next: UnitState) -> bool {
        use UnitOutcome::*;
        use UnitState::*;

        match (self, next) {
            (Idle, NavigatingUnit) => true,
            (NavigatingUnit, CountingPages) => true,
            (NavigatingUnit, UnitDone(NotFound)) | (NavigatingUnit, UnitDone(Error)) => true,
            (CountingPages, CrawlingUnit) | (CountingPages, UnitDone(Error)) => true,
            (CrawlingUnit, UnitDone(Success)) | (CrawlingUnit, UnitDone(Error)) => true,
            (UnitDone(Success), NavigatingUnit) => true,
            (UnitDone(_), SessionDone) => true,
            _ => false,
        }
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(self, next: UnitState) -> Result<UnitState, CrawlError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CrawlError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::NavigatingUnit => write!(f, "navigating"),
            Self::CountingPages => write!(f, "counting_pages"),
            Self::CrawlingUnit => write!(f, "crawling"),
            Self::UnitDone(outcome) => write!(f, "unit_done({})", outcome),
            Self::SessionDone => write!(f, "session_done"),
        }
    }
}
