//! Qt Creator generic project files.
//!
//! A generic project is four flat text files sharing one base name:
//! `.creator` (marker), `.config` (predefined macros), `.files` (file list)
//! and `.includes` (include search path). Paths are written relative to the
//! directory holding the project files.

use crate::error::{ExportError, Result};
use meson2ide_build::paths;
use meson2ide_build::FileDatabase;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::info;

const CREATOR_CONTENTS: &str = "[General]";

const CONFIG_HEADER: &str = "\
// Add predefined macros for your project here. For example:
// #define THE_ANSWER 42
";

/// Keep only ASCII alphanumerics, `_` and `-`.
pub fn sanitize_project_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Paths of the files written by [`QtCreatorProject::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFiles {
    pub creator: PathBuf,
    pub config: PathBuf,
    pub files: PathBuf,
    pub includes: PathBuf,
}

impl ProjectFiles {
    fn new(dir: &Path, name: &str) -> Self {
        Self {
            creator: dir.join(format!("{name}.creator")),
            config: dir.join(format!("{name}.config")),
            files: dir.join(format!("{name}.files")),
            includes: dir.join(format!("{name}.includes")),
        }
    }
}

/// The projection of a [`FileDatabase`] into Qt Creator's format.
#[derive(Debug, Clone, Default)]
pub struct QtCreatorProject {
    defines: BTreeSet<String>,
    files: BTreeSet<String>,
    includes: BTreeSet<String>,
}

impl QtCreatorProject {
    /// Project `db` plus the build-description files `meson_files`, with
    /// paths made relative to `build_dir`.
    pub fn new(db: &FileDatabase, meson_files: &[PathBuf], build_dir: &Path) -> Self {
        let rel = |p: &Path| paths::relative_to(p, build_dir).to_string_lossy().into_owned();

        let defines = db
            .entries()
            .flat_map(|e| e.defines().iter().cloned())
            .collect();

        let files = db
            .entries()
            .map(|e| e.path.as_path())
            .chain(meson_files.iter().map(PathBuf::as_path))
            .map(rel)
            .collect();

        let includes = db
            .entries()
            .flat_map(|e| e.include_dirs().iter())
            .map(|p| rel(p.as_path()))
            .collect();

        Self {
            defines,
            files,
            includes,
        }
    }

    pub fn defines(&self) -> impl Iterator<Item = &str> {
        self.defines.iter().map(String::as_str)
    }

    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.includes.iter().map(String::as_str)
    }

    /// Contents of `<name>.creator`.
    pub fn creator_contents(&self) -> String {
        CREATOR_CONTENTS.to_string()
    }

    /// Contents of `<name>.config`.
    pub fn config_contents(&self) -> String {
        let mut out = String::from(CONFIG_HEADER);
        for define in &self.defines {
            out.push_str("#define ");
            out.push_str(define);
            out.push('\n');
        }
        out
    }

    /// Contents of `<name>.files`.
    pub fn files_contents(&self) -> String {
        lines(&self.files)
    }

    /// Contents of `<name>.includes`.
    pub fn includes_contents(&self) -> String {
        lines(&self.includes)
    }

    /// Write the four project files into `dir`, named after `project_name`
    /// once sanitised. Existing files are overwritten.
    pub fn write(&self, dir: &Path, project_name: &str) -> Result<ProjectFiles> {
        let name = sanitize_project_name(project_name);
        if name.is_empty() {
            return Err(ExportError::EmptyName(project_name.to_string()));
        }

        let out = ProjectFiles::new(dir, &name);
        write_file(&out.creator, &self.creator_contents())?;
        write_file(&out.config, &self.config_contents())?;
        write_file(&out.files, &self.files_contents())?;
        write_file(&out.includes, &self.includes_contents())?;

        info!(
            project = %name,
            files = self.files.len(),
            includes = self.includes.len(),
            defines = self.defines.len(),
            "wrote Qt Creator project to {}",
            dir.display()
        );
        Ok(out)
    }
}

fn lines(items: &BTreeSet<String>) -> String {
    let mut out = String::new();
    for item in items {
        out.push_str(item);
        out.push('\n');
    }
    out
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
