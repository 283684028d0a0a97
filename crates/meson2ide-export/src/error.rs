//! Error types for meson2ide-export.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for meson2ide-export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while writing project files.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Failed to write a project file.
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The project name has no usable file-name characters.
    #[error("Project name {0:?} leaves no valid file name characters")]
    EmptyName(String),
}
