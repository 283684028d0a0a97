//! Meson introspection (`meson introspect --projectinfo`).

use crate::error::{DriverError, Result};
use crate::layout::ProjectLayout;
use meson2ide_build::{process, IntrospectConfig, ToolConfig, ToolErrorPolicy};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// The part of `--projectinfo` output we use.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl ProjectInfo {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| DriverError::IntrospectionOutput {
            output: json.trim().to_string(),
            source,
        })
    }
}

/// Ask Meson for the project info of `build_dir`.
pub fn project_info(
    config: &IntrospectConfig,
    build_dir: &Path,
    timeout: Option<Duration>,
) -> Result<ProjectInfo> {
    let mut args = config.command.clone();
    args.push("--projectinfo".to_string());
    debug!(command = %args.join(" "), "introspecting");

    let output =
        process::run_tool(&args, build_dir, timeout).map_err(DriverError::Introspection)?;
    ProjectInfo::parse(&output.stdout)
}

/// The project name: configured override, else introspection, else (when
/// introspection failures are tolerated) the source directory name.
pub fn project_name(config: &ToolConfig, layout: &ProjectLayout) -> Result<String> {
    if let Some(name) = &config.project_name {
        return Ok(name.clone());
    }

    match project_info(&config.introspect, &layout.build_dir, config.discovery.timeout()) {
        Ok(info) => Ok(info.name),
        Err(err) => match config.introspect.errors {
            ToolErrorPolicy::Fail => Err(err),
            ToolErrorPolicy::Continue => {
                let fallback = layout.fallback_name();
                warn!("{err}; using project name `{fallback}`");
                Ok(fallback)
            }
        },
    }
}
