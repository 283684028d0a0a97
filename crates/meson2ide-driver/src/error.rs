//! Errors reported to the user.

use meson2ide_build::BuildError;
use meson2ide_export::ExportError;
use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for meson2ide-driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error, Diagnostic)]
pub enum DriverError {
    #[error("{0} does not appear to be a valid source directory")]
    #[diagnostic(
        code(meson2ide::layout::source_dir),
        help("a Meson source directory contains a meson.build file; pass it as PATH or run from it")
    )]
    NotSourceDir(PathBuf),

    #[error("{0} does not appear to be a valid build directory")]
    #[diagnostic(
        code(meson2ide::layout::build_dir),
        help(
            "a configured Meson build directory contains build.ninja and \
             compile_commands.json; run `meson setup` first"
        )
    )]
    NotBuildDir(PathBuf),

    #[error("Cannot determine the current directory: {0}")]
    #[diagnostic(code(meson2ide::layout::cwd))]
    CurrentDir(#[source] std::io::Error),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(code(meson2ide::config))]
    Config(#[source] BuildError),

    #[error("Unusable compile database: {0}")]
    #[diagnostic(
        code(meson2ide::compile_db),
        help("regenerate it by reconfiguring the build directory")
    )]
    Database(#[source] BuildError),

    #[error("Compiler invocation failed: {0}")]
    #[diagnostic(
        code(meson2ide::discovery),
        help("set `[discovery] errors = \"continue\"` to export without this unit's headers")
    )]
    Discovery(#[source] BuildError),

    #[error("Meson introspection failed: {0}")]
    #[diagnostic(
        code(meson2ide::introspect),
        help("pass --name to skip introspection, or set `[introspect] errors = \"continue\"`")
    )]
    Introspection(#[source] BuildError),

    #[error("Meson introspection returned unexpected output: {source}\n{output}")]
    #[diagnostic(code(meson2ide::introspect::output))]
    IntrospectionOutput {
        output: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write project files: {0}")]
    #[diagnostic(code(meson2ide::export))]
    Export(#[from] ExportError),
}

impl DriverError {
    /// Sort a compile-database load failure into the right user-facing kind.
    pub fn from_load(err: BuildError) -> Self {
        match err {
            err if err.is_data_format() => DriverError::Database(err),
            err @ (BuildError::TracePattern { .. } | BuildError::WorkerPool(_)) => {
                DriverError::Config(err)
            }
            err => DriverError::Discovery(err),
        }
    }
}
