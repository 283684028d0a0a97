//! The unified file database.
//!
//! Every compile unit contributes its source file plus each header it
//! includes. A header reached from several units keeps the flags of the first
//! unit, in compile database order, that reached it.

use crate::compile_commands::{CompileCommand, CompileCommands};
use crate::config::{DiscoveryConfig, ToolErrorPolicy};
use crate::error::BuildError;
use crate::flags::{CompileFlags, CompilerDialect};
use crate::headers::{HeaderDiscovery, HeaderSource};
use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Whether an entry was compiled directly or only included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Source,
    Header,
}

/// Include directories and definitions attached to a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub include_dirs: IndexSet<PathBuf>,
    pub defines: IndexSet<String>,
}

impl From<CompileFlags> for EntryFlags {
    fn from(flags: CompileFlags) -> Self {
        Self {
            include_dirs: flags.include_dirs.into_iter().collect(),
            defines: flags.defines.into_iter().collect(),
        }
    }
}

/// One file known to the database.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub kind: FileKind,
    /// Shared between a source and the headers it introduced.
    pub flags: Arc<EntryFlags>,
}

impl FileEntry {
    pub fn include_dirs(&self) -> &IndexSet<PathBuf> {
        &self.flags.include_dirs
    }

    pub fn defines(&self) -> &IndexSet<String> {
        &self.flags.defines
    }
}

/// Files keyed by absolute path, in insertion order.
#[derive(Debug, Default)]
pub struct FileDatabase {
    entries: IndexMap<PathBuf, FileEntry>,
    seen_headers: FxHashSet<PathBuf>,
    failed_units: Vec<PathBuf>,
}

impl FileDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one compile unit.
    ///
    /// The source entry is inserted or replaced. A header is only recorded
    /// the first time any unit reports it; it never replaces an existing entry.
    pub fn add_unit(
        &mut self,
        source: PathBuf,
        flags: CompileFlags,
        headers: impl IntoIterator<Item = PathBuf>,
    ) {
        let flags = Arc::new(EntryFlags::from(flags));

        self.entries.insert(
            source.clone(),
            FileEntry {
                path: source,
                kind: FileKind::Source,
                flags: Arc::clone(&flags),
            },
        );

        for header in headers {
            if !self.seen_headers.insert(header.clone()) {
                continue;
            }
            self.entries.entry(header.clone()).or_insert_with(|| FileEntry {
                path: header,
                kind: FileKind::Header,
                flags: Arc::clone(&flags),
            });
        }
    }

    /// Note a unit whose headers could not be discovered.
    pub fn mark_failed(&mut self, source: PathBuf) {
        self.failed_units.push(source);
    }

    pub fn get(&self, path: &Path) -> Option<&FileEntry> {
        self.entries.get(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Units whose header discovery failed and contributed no headers.
    pub fn failed_units(&self) -> &[PathBuf] {
        &self.failed_units
    }

    /// Load `compile_commands.json` and aggregate it with compiler-based
    /// header discovery.
    pub fn load(path: &Path, config: &DiscoveryConfig) -> crate::Result<Self> {
        let commands = CompileCommands::from_file(path)?;
        info!(path = %path.display(), units = commands.len(), "loaded compile database");

        let discovery = HeaderDiscovery::new(config)?;
        Aggregator::new(config.dialect.dialect(), &discovery)
            .policy(config.errors)
            .jobs(config.jobs)
            .aggregate(&commands)
    }
}

/// Builds a [`FileDatabase`] from compile commands.
pub struct Aggregator<'a> {
    dialect: &'a dyn CompilerDialect,
    headers: &'a dyn HeaderSource,
    policy: ToolErrorPolicy,
    jobs: Option<usize>,
}

struct Unit {
    source: PathBuf,
    flags: CompileFlags,
}

impl<'a> Aggregator<'a> {
    pub fn new(dialect: &'a dyn CompilerDialect, headers: &'a dyn HeaderSource) -> Self {
        Self {
            dialect,
            headers,
            policy: ToolErrorPolicy::Continue,
            jobs: None,
        }
    }

    /// What to do when header discovery fails for a unit.
    pub fn policy(mut self, policy: ToolErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Worker pool size; `None` uses one worker per CPU.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Interpret every command, discover headers in parallel, then merge the
    /// results sequentially in input order.
    pub fn aggregate(&self, commands: &CompileCommands) -> crate::Result<FileDatabase> {
        // Command lines are checked up front so a bad record aborts the run
        // before any compiler is started.
        let units = commands
            .commands()
            .iter()
            .map(|cmd| self.interpret(cmd))
            .collect::<crate::Result<Vec<_>>>()?;

        let mut pool = rayon::ThreadPoolBuilder::new();
        if let Some(jobs) = self.jobs {
            pool = pool.num_threads(jobs.max(1));
        }
        let pool = pool.build()?;

        let discovered: Vec<crate::Result<BTreeSet<PathBuf>>> = pool.install(|| {
            commands
                .commands()
                .par_iter()
                .map(|cmd| self.headers.headers(cmd))
                .collect()
        });

        let mut db = FileDatabase::new();
        for (unit, headers) in units.into_iter().zip(discovered) {
            match headers {
                Ok(headers) => {
                    debug!(source = %unit.source.display(), headers = headers.len(), "adding unit");
                    db.add_unit(unit.source, unit.flags, headers);
                }
                Err(err) => match self.policy {
                    ToolErrorPolicy::Continue => {
                        warn!(source = %unit.source.display(), "header discovery failed: {err}");
                        db.mark_failed(unit.source.clone());
                        db.add_unit(unit.source, unit.flags, std::iter::empty());
                    }
                    ToolErrorPolicy::Fail => {
                        return Err(BuildError::Discovery {
                            file: unit.source,
                            source: Box::new(err),
                        });
                    }
                },
            }
        }

        info!(
            files = db.len(),
            failed = db.failed_units().len(),
            "file database ready"
        );
        Ok(db)
    }

    fn interpret(&self, cmd: &CompileCommand) -> crate::Result<Unit> {
        let args = cmd.args()?;
        if args.is_empty() {
            return Err(BuildError::EmptyCommand(cmd.file.clone()));
        }
        Ok(Unit {
            source: cmd.source_path(),
            flags: CompileFlags::from_args(self.dialect, &args, &cmd.directory),
        })
    }
}
