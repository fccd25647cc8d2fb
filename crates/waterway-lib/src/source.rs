//! Data source abstraction for boundary, depth and stop data.
//!
//! Stores never open files themselves; callers inject a [`DataSource`] so the
//! same loaders work for files on disk, embedded fixtures, or text fetched by
//! an outer layer.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Provider of raw text for one of the planner's inputs.
pub trait DataSource: Send + Sync {
    /// Human-readable description used in logs and error messages.
    fn describe(&self) -> String;

    /// Read the full contents of the source.
    fn read_to_string(&self) -> Result<String>;
}

/// Source backed by a file on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_to_string(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

/// Source holding its contents in memory.
#[derive(Debug, Clone)]
pub struct InlineSource {
    name: String,
    contents: String,
}

impl InlineSource {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

impl DataSource for InlineSource {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn read_to_string(&self) -> Result<String> {
        Ok(self.contents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_source_returns_contents() {
        let source = InlineSource::new("inline", "{}");
        assert_eq!(source.describe(), "inline");
        assert_eq!(source.read_to_string().expect("read"), "{}");
    }

    #[test]
    fn missing_file_reports_io_error() {
        let source = FileSource::new("/definitely/not/here.geojson");
        let err = source.read_to_string().expect_err("missing file");
        assert!(matches!(err, crate::Error::Io(_)));
    }
}
