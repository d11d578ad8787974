//! Address handling module for Manga-Capture
//!
//! This module derives a unit's identity (content kind and sequence number) from a
//! reader address and synthesizes the address of the next unit in the series.

mod parse;

use crate::AddressError;
use std::fmt;
use std::path::{Path, PathBuf};

// Re-export main functions
pub use parse::{next_address, parse_address};

/// Kind of content a unit holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Chapter,
    Volume,
}

impl ContentKind {
    /// Returns the lowercase path token used in addresses and folder names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Volume => "volume",
        }
    }

    /// Returns the token with a count-aware plural suffix ("1 chapter", "2 chapters")
    pub fn label(&self, count: u32) -> String {
        if count == 1 {
            self.as_str().to_string()
        } else {
            format!("{}s", self.as_str())
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of one chapter or volume
///
/// Constructed once per unit, either from the seed address or by incrementing the
/// previous unit's sequence number. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentAddress {
    base: String,
    kind: ContentKind,
    sequence_number: u64,
}

impl ContentAddress {
    /// Everything before the trailing `<kind>-<n>` segment, without a trailing slash
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Full address of this unit: `<base>/<kind>-<n>`
    pub fn url(&self) -> String {
        format!("{}/{}-{}", self.base, self.kind, self.sequence_number)
    }

    /// Identity of the following unit in the series
    ///
    /// Fails with [`AddressError::SequenceOverflow`] when the number is already `u64::MAX`.
    pub fn next(&self) -> Result<ContentAddress, AddressError> {
        let sequence_number = self
            .sequence_number
            .checked_add(1)
            .ok_or(AddressError::SequenceOverflow(self.sequence_number))?;

        Ok(ContentAddress {
            base: self.base.clone(),
            kind: self.kind,
            sequence_number,
        })
    }

    /// Folder name for this unit's captures, e.g. `chapter-005`
    ///
    /// The number is zero-padded to three digits; wider numbers are written in full.
    pub fn folder_name(&self) -> String {
        format!("{}-{:03}", self.kind, self.sequence_number)
    }

    /// Destination folder for this unit under the given root
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(self.folder_name())
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.sequence_number)
    }
}
