//! Error types for meson2ide-build.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for meson2ide-build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while reading the compile database or querying the compiler.
#[derive(Error, Debug)]
pub enum BuildError {
    /// Failed to read the compile database.
    #[error("Failed to read compile database {path}: {source}")]
    ReadDatabase {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compile database is not a JSON array of compile commands.
    #[error("Failed to parse compile database {path}: {source}")]
    ParseDatabase {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A compile database record has neither `command` nor `arguments`.
    #[error("Compile database entry #{index} ({file}) has no `command` or `arguments`")]
    MissingCommand { index: usize, file: PathBuf },

    /// A single compile command has neither `command` nor `arguments`.
    #[error("Compile database entry for {file} has no `command` or `arguments`")]
    NoCommand { file: PathBuf },

    /// Failed to read the tool configuration file.
    #[error("Failed to read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("Failed to parse TOML config {path}: {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// The header-trace pattern is not a valid regular expression.
    #[error("Invalid header trace pattern `{pattern}`: {source}")]
    TracePattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Failed to build the discovery worker pool.
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    /// The compile command is empty after splitting.
    #[error("Empty compile command for {0}")]
    EmptyCommand(PathBuf),

    /// The command line could not be split into words (unbalanced quotes).
    #[error("Malformed command line for {file}: {command}")]
    MalformedCommand { file: PathBuf, command: String },

    /// An external tool could not be started.
    #[error("Failed to execute `{command}` in {dir}: {source}")]
    Spawn {
        command: String,
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external tool exited unsuccessfully.
    #[error("`{command}` exited with {status} in {dir}:\n{output}")]
    ToolFailed {
        command: String,
        dir: PathBuf,
        status: std::process::ExitStatus,
        output: String,
    },

    /// Header discovery failed for a unit while failures are fatal.
    #[error("Header discovery failed for {file}: {source}")]
    Discovery {
        file: PathBuf,
        #[source]
        source: Box<BuildError>,
    },

    /// An external tool did not finish in time and was killed.
    #[error("`{command}` timed out after {timeout:?} in {dir}")]
    Timeout {
        command: String,
        dir: PathBuf,
        timeout: Duration,
    },
}

impl BuildError {
    /// Whether this error means the compile database itself is unusable.
    pub fn is_data_format(&self) -> bool {
        matches!(
            self,
            BuildError::ReadDatabase { .. }
                | BuildError::ParseDatabase { .. }
                | BuildError::MissingCommand { .. }
                | BuildError::NoCommand { .. }
                | BuildError::EmptyCommand(_)
                | BuildError::MalformedCommand { .. }
        )
    }
}
