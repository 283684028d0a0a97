//! Tool configuration (`meson2ide.toml` format).

use crate::error::BuildError;
use crate::flags::DialectKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the source directory when no config path is given.
pub const CONFIG_FILE_NAME: &str = "meson2ide.toml";

/// What to do when an external tool fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorPolicy {
    /// Log the failure and carry on with a fallback result.
    Continue,
    /// Abort the run.
    Fail,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    /// Project name override; skips Meson introspection when set.
    #[serde(default)]
    pub project_name: Option<String>,

    /// Header discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Meson introspection settings.
    #[serde(default)]
    pub introspect: IntrospectConfig,
}

/// Header discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Program to run instead of the one recorded in each compile command.
    #[serde(default)]
    pub compiler: Option<String>,

    /// Flag dialect of the recorded compile commands.
    #[serde(default)]
    pub dialect: DialectKind,

    /// Regex a header-trace line must match; the path follows the match.
    #[serde(default)]
    pub trace_pattern: Option<String>,

    /// Per-invocation timeout in seconds, 0 to wait forever.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Worker pool size (default: number of CPUs).
    #[serde(default)]
    pub jobs: Option<usize>,

    /// Policy for failing compiler invocations.
    #[serde(default = "default_discovery_errors")]
    pub errors: ToolErrorPolicy,
}

/// Meson introspection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntrospectConfig {
    /// Introspection program and leading arguments; `--projectinfo` is appended.
    #[serde(default = "default_introspect_command")]
    pub command: Vec<String>,

    /// Policy for a failing introspection call.
    #[serde(default = "default_introspect_errors")]
    pub errors: ToolErrorPolicy,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_discovery_errors() -> ToolErrorPolicy {
    ToolErrorPolicy::Continue
}

fn default_introspect_command() -> Vec<String> {
    vec!["meson".to_string(), "introspect".to_string()]
}

fn default_introspect_errors() -> ToolErrorPolicy {
    ToolErrorPolicy::Fail
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            compiler: None,
            dialect: DialectKind::default(),
            trace_pattern: None,
            timeout_secs: default_timeout_secs(),
            jobs: None,
            errors: default_discovery_errors(),
        }
    }
}

impl Default for IntrospectConfig {
    fn default() -> Self {
        Self {
            command: default_introspect_command(),
            errors: default_introspect_errors(),
        }
    }
}

impl DiscoveryConfig {
    /// The per-invocation timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl ToolConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BuildError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| BuildError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else `<source_dir>/meson2ide.toml` if it exists,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, source_dir: &Path) -> crate::Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let candidate: PathBuf = source_dir.join(CONFIG_FILE_NAME);
                if candidate.is_file() {
                    Self::from_file(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
project_name = "demo"

[discovery]
compiler = "clang"
dialect = "clang"
trace_pattern = '^\.+\s'
timeout_secs = 5
jobs = 2
errors = "fail"

[introspect]
command = ["mesonintrospect.py"]
errors = "continue"
        "#;

        let config: ToolConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.project_name.as_deref(), Some("demo"));
        assert_eq!(config.discovery.compiler.as_deref(), Some("clang"));
        assert_eq!(config.discovery.trace_pattern.as_deref(), Some(r"^\.+\s"));
        assert_eq!(config.discovery.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.discovery.jobs, Some(2));
        assert_eq!(config.discovery.errors, ToolErrorPolicy::Fail);
        assert_eq!(config.introspect.command, vec!["mesonintrospect.py"]);
        assert_eq!(config.introspect.errors, ToolErrorPolicy::Continue);
    }

    #[test]
    fn test_defaults() {
        let config: ToolConfig = toml::from_str("").unwrap();

        assert!(config.project_name.is_none());
        assert_eq!(config.discovery.timeout(), Some(Duration::from_secs(60)));
        assert_eq!(config.discovery.errors, ToolErrorPolicy::Continue);
        assert_eq!(config.introspect.command, vec!["meson", "introspect"]);
        assert_eq!(config.introspect.errors, ToolErrorPolicy::Fail);
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config: ToolConfig = toml::from_str("[discovery]\ntimeout_secs = 0").unwrap();
        assert_eq!(config.discovery.timeout(), None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(toml::from_str::<ToolConfig>("[discovery]\ntimeout = 3").is_err());
    }

    #[test]
    fn test_discover_in_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ToolConfig::discover(None, dir.path()).unwrap().project_name.is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "project_name = \"x\"").unwrap();
        let config = ToolConfig::discover(None, dir.path()).unwrap();
        assert_eq!(config.project_name.as_deref(), Some("x"));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err =
            ToolConfig::discover(Some(&dir.path().join("nope.toml")), dir.path()).unwrap_err();
        assert!(matches!(err, BuildError::ReadConfig { .. }));
    }
}
