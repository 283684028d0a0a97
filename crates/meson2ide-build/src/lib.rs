//! Compile database interpretation for meson2ide.
//!
//! This crate provides:
//! - compile_commands.json parsing
//! - compiler command-line interpretation (include directories, definitions)
//! - header discovery by re-running the compiler with header tracing
//! - aggregation of all units into one [`FileDatabase`]
//! - the `meson2ide.toml` tool configuration
//!
//! # Example
//!
//! ```toml
//! # meson2ide.toml
//! [discovery]
//! timeout_secs = 30
//! jobs = 4
//! errors = "continue"
//!
//! [introspect]
//! command = ["meson", "introspect"]
//! ```

mod compile_commands;
mod config;
mod database;
mod error;
mod flags;
mod headers;
pub mod paths;
pub mod process;

pub use compile_commands::{CompileCommand, CompileCommands};
pub use config::{
    DiscoveryConfig, IntrospectConfig, ToolConfig, ToolErrorPolicy, CONFIG_FILE_NAME,
};
pub use database::{Aggregator, EntryFlags, FileDatabase, FileEntry, FileKind};
pub use error::{BuildError, Result};
pub use flags::{
    CompileFlags, CompilerDialect, DialectKind, FlagEffect, FlagMatch, GccDialect, NULL_DEVICE,
};
pub use headers::{HeaderDiscovery, HeaderSource};
