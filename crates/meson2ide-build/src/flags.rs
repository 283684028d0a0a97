//! Compiler command-line interpretation.
//!
//! A [`CompilerDialect`] knows how one compiler family spells include
//! directories and macro definitions, and how to turn a compile command into a
//! preprocess-only command that traces every opened header. Only the GCC/Clang
//! dialect exists today.

use crate::paths;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Destination for output the header-trace run must not keep.
pub const NULL_DEVICE: &str = "/dev/null";

/// What a recognised flag contributes to a compile unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagEffect {
    /// An include directory, as written (not yet absolutized).
    IncludeDir(String),
    /// A macro token, `NAME` or `NAME=VALUE`, verbatim.
    Define(String),
}

/// A recognised flag and whether its value was the following token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagMatch {
    pub effect: FlagEffect,
    pub consumes_next: bool,
}

/// A compiler family's command-line conventions.
pub trait CompilerDialect: fmt::Debug + Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Classify `token`. `next` is the token after it, for flags whose value
    /// may be given separately. Unknown flags yield `None`.
    fn interpret_flag(&self, token: &str, next: Option<&str>) -> Option<FlagMatch>;

    /// Rewrite a compile command so that it only preprocesses, writes nothing,
    /// and reports each opened header on its diagnostic stream.
    fn header_trace_args(&self, args: &[String]) -> Vec<String>;

    /// Regex matching one header-trace line emitted by this compiler.
    fn default_trace_pattern(&self) -> &'static str;
}

/// Selects a [`CompilerDialect`] from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialectKind {
    /// GCC and Clang (`-I`, `-D`, `-H`).
    #[default]
    #[serde(alias = "clang")]
    Gcc,
}

impl DialectKind {
    pub fn dialect(self) -> &'static dyn CompilerDialect {
        match self {
            DialectKind::Gcc => &GccDialect,
        }
    }
}

/// GCC/Clang flag syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct GccDialect;

const DEPFILE_FLAGS: &[&str] = &["-M", "-MM", "-MG", "-MP", "-MD", "-MMD"];
const DEPFILE_VALUE_FLAGS: &[&str] = &["-MF", "-MT", "-MQ"];

impl GccDialect {
    fn prefixed(token: &str, next: Option<&str>, prefix: &str) -> Option<(String, bool)> {
        let rest = token.strip_prefix(prefix)?;
        match (rest.is_empty(), next) {
            (true, Some(value)) => Some((value.trim().to_string(), true)),
            _ => Some((rest.trim().to_string(), false)),
        }
    }
}

impl CompilerDialect for GccDialect {
    fn name(&self) -> &'static str {
        "gcc"
    }

    fn interpret_flag(&self, token: &str, next: Option<&str>) -> Option<FlagMatch> {
        if let Some((dir, consumes_next)) = Self::prefixed(token, next, "-I") {
            Some(FlagMatch {
                effect: FlagEffect::IncludeDir(dir),
                consumes_next,
            })
        } else if let Some((def, consumes_next)) = Self::prefixed(token, next, "-D") {
            Some(FlagMatch {
                effect: FlagEffect::Define(def),
                consumes_next,
            })
        } else {
            None
        }
    }

    fn header_trace_args(&self, args: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(args.len() + 1);
        let Some((program, rest)) = args.split_first() else {
            return out;
        };
        out.push(program.clone());

        let mut rest = rest.iter().peekable();
        while let Some(arg) = rest.next() {
            match arg.trim() {
                "" => {}
                // Preprocess only, no code generation.
                "-c" => out.push("-E".to_string()),
                "-o" if rest.peek().is_some() => {
                    rest.next();
                    out.push(arg.clone());
                    out.push(NULL_DEVICE.to_string());
                }
                flag if DEPFILE_FLAGS.contains(&flag) => {}
                flag if DEPFILE_VALUE_FLAGS.contains(&flag) && rest.peek().is_some() => {
                    rest.next();
                }
                _ => out.push(arg.clone()),
            }
        }

        out.push("-H".to_string());
        out
    }

    fn default_trace_pattern(&self) -> &'static str {
        r"^\.+ "
    }
}

/// Include directories and definitions recovered from one compile command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileFlags {
    /// Absolute include directories, in command order, duplicates kept.
    pub include_dirs: Vec<PathBuf>,
    /// Macro tokens in command order.
    pub defines: Vec<String>,
}

impl CompileFlags {
    /// Interpret every token of `args`, resolving include directories against `base`.
    pub fn from_args(dialect: &dyn CompilerDialect, args: &[String], base: &Path) -> Self {
        let mut flags = CompileFlags::default();

        let mut i = 0;
        while i < args.len() {
            let next = args.get(i + 1).map(String::as_str);
            match dialect.interpret_flag(&args[i], next) {
                Some(FlagMatch {
                    effect,
                    consumes_next,
                }) => {
                    match effect {
                        FlagEffect::IncludeDir(dir) => {
                            flags.include_dirs.push(paths::absolutize(base, dir))
                        }
                        FlagEffect::Define(def) => flags.defines.push(def),
                    }
                    i += if consumes_next { 2 } else { 1 };
                }
                None => i += 1,
            }
        }

        flags
    }
}
