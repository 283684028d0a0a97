//! Header discovery.
//!
//! Re-runs each compile command as a preprocess-only job with header tracing
//! turned on (`-H` for GCC/Clang) and collects the traced paths.

use crate::compile_commands::CompileCommand;
use crate::config::DiscoveryConfig;
use crate::error::BuildError;
use crate::flags::CompilerDialect;
use crate::{paths, process};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Anything that can list the headers a compile unit includes.
pub trait HeaderSource: Sync {
    /// Absolute paths of every header transitively included by `record`.
    fn headers(&self, record: &CompileCommand) -> crate::Result<BTreeSet<PathBuf>>;
}

/// Finds headers by invoking the compiler.
#[derive(Debug)]
pub struct HeaderDiscovery {
    dialect: &'static dyn CompilerDialect,
    trace_pattern: Regex,
    compiler: Option<String>,
    timeout: Option<Duration>,
}

impl HeaderDiscovery {
    /// Create a discovery engine from configuration.
    pub fn new(config: &DiscoveryConfig) -> crate::Result<Self> {
        let dialect = config.dialect.dialect();
        let pattern = config
            .trace_pattern
            .as_deref()
            .unwrap_or_else(|| dialect.default_trace_pattern());
        let trace_pattern = Regex::new(pattern).map_err(|source| BuildError::TracePattern {
            pattern: pattern.to_string(),
            source,
        })?;

        Ok(Self {
            dialect,
            trace_pattern,
            compiler: config.compiler.clone(),
            timeout: config.timeout(),
        })
    }

    /// The argument vector used to trace headers for `record`.
    pub fn trace_command(&self, record: &CompileCommand) -> crate::Result<Vec<String>> {
        let args = record.args()?;
        let mut args = self.dialect.header_trace_args(&args);
        match args.first_mut() {
            Some(program) => {
                if let Some(compiler) = &self.compiler {
                    *program = compiler.clone();
                }
                Ok(args)
            }
            None => Err(BuildError::EmptyCommand(record.file.clone())),
        }
    }

    /// Extract header paths from compiler trace output.
    ///
    /// Each line matching the trace pattern contributes the text after the
    /// match, resolved against `base` when relative.
    pub fn parse_trace(&self, output: &str, base: &Path) -> BTreeSet<PathBuf> {
        output
            .lines()
            .filter_map(|line| {
                let m = self.trace_pattern.find(line)?;
                let path = line[m.end()..].trim();
                (!path.is_empty()).then(|| paths::absolutize(base, path))
            })
            .collect()
    }
}

impl HeaderSource for HeaderDiscovery {
    fn headers(&self, record: &CompileCommand) -> crate::Result<BTreeSet<PathBuf>> {
        let args = self.trace_command(record)?;
        debug!(file = %record.file.display(), command = %args.join(" "), "tracing headers");

        let output = process::run_tool(&args, &record.directory, self.timeout)?;
        let headers = self.parse_trace(&output.combined(), &record.directory);

        debug!(file = %record.file.display(), count = headers.len(), "headers found");
        Ok(headers)
    }
}
