//! IDE project generation for meson2ide.
//!
//! Turns the aggregated [`meson2ide_build::FileDatabase`] into Qt Creator
//! generic project files.

mod error;
mod meson_files;
mod qtcreator;

pub use error::{ExportError, Result};
pub use meson_files::{collect_meson_files, BUILD_DESCRIPTION_FILES};
pub use qtcreator::{sanitize_project_name, ProjectFiles, QtCreatorProject};
