//! Capture sink trait and the filesystem implementation

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Persists one captured page image
pub trait CaptureSink {
    /// Writes `image` as `<folder>/<page:03>.jpg`, creating `folder` if needed
    ///
    /// Returns the path that was written.
    fn save(&mut self, image: &[u8], folder: &Path, page: u32) -> io::Result<PathBuf>;
}

/// File name for a page: zero-padded to three digits (`007.jpg`)
///
/// Pages beyond 999 are written with their full width and no longer sort lexically.
pub fn page_file_name(page: u32) -> String {
    format!("{:03}.jpg", page)
}

/// Writes captures straight to the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSink;

impl FileSink {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureSink for FileSink {
    fn save(&mut self, image: &[u8], folder: &Path, page: u32) -> io::Result<PathBuf> {
        fs::create_dir_all(folder)?;
        let path = folder.join(page_file_name(page));
        fs::write(&path, image)?;
        Ok(path)
    }
}
