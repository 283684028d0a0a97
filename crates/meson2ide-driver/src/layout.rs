//! Source and build directory detection.

use crate::error::{DriverError, Result};
use meson2ide_build::paths;
use std::path::{Path, PathBuf};

/// Marks a Meson source directory.
pub const SOURCE_MARKER: &str = "meson.build";
/// Marks a configured Meson build directory (alongside the compile database).
pub const BUILD_MARKER: &str = "build.ninja";
/// Compile database written into the build directory.
pub const COMPILE_DB: &str = "compile_commands.json";

pub fn is_source_dir(dir: &Path) -> bool {
    dir.join(SOURCE_MARKER).is_file()
}

pub fn is_build_dir(dir: &Path) -> bool {
    dir.join(BUILD_MARKER).is_file() && dir.join(COMPILE_DB).is_file()
}

/// A validated pair of source and build directories, both absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
}

impl ProjectLayout {
    /// Validate an explicit source/build pair.
    pub fn new(source_dir: PathBuf, build_dir: PathBuf) -> Result<Self> {
        if !is_source_dir(&source_dir) {
            return Err(DriverError::NotSourceDir(source_dir));
        }
        if !is_build_dir(&build_dir) {
            return Err(DriverError::NotBuildDir(build_dir));
        }
        Ok(Self {
            source_dir,
            build_dir,
        })
    }

    /// Work out which role `path` plays; `cwd` takes the other one.
    ///
    /// A path holding `meson.build` is the source directory, anything else is
    /// taken as the build directory.
    pub fn detect(path: &Path, cwd: &Path) -> Result<Self> {
        let cwd = paths::normalize(cwd);
        let path = paths::absolutize(&cwd, path);

        if is_source_dir(&path) {
            Self::new(path, cwd)
        } else {
            Self::new(cwd, path)
        }
    }

    /// Like [`ProjectLayout::detect`] using the process working directory.
    pub fn detect_from_current_dir(path: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(DriverError::CurrentDir)?;
        Self::detect(path, &cwd)
    }

    pub fn compile_db(&self) -> PathBuf {
        self.build_dir.join(COMPILE_DB)
    }

    /// Name used when Meson cannot be asked for one.
    pub fn fallback_name(&self) -> String {
        self.source_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let build = dir.path().join("build");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&build).unwrap();
        fs::write(src.join(SOURCE_MARKER), "project('demo', 'c')").unwrap();
        fs::write(build.join(BUILD_MARKER), "").unwrap();
        fs::write(build.join(COMPILE_DB), "[]").unwrap();
        (dir, src, build)
    }

    #[test]
    fn test_path_is_source_dir() {
        let (_dir, src, build) = tree();
        let layout = ProjectLayout::detect(&src, &build).unwrap();
        assert_eq!(layout.source_dir, src);
        assert_eq!(layout.build_dir, build);
        assert_eq!(layout.compile_db(), build.join(COMPILE_DB));
    }

    #[test]
    fn test_path_is_build_dir() {
        let (_dir, src, build) = tree();
        let layout = ProjectLayout::detect(&build, &src).unwrap();
        assert_eq!(layout.source_dir, src);
        assert_eq!(layout.build_dir, build);
    }

    #[test]
    fn test_relative_path_resolves_against_cwd() {
        let (_dir, src, build) = tree();
        let layout = ProjectLayout::detect(Path::new("../build"), &src).unwrap();
        assert_eq!(layout.build_dir, build);
        assert_eq!(layout.fallback_name(), "src");
    }

    #[test]
    fn test_invalid_source_dir() {
        let (dir, _src, build) = tree();
        let err = ProjectLayout::detect(&build, dir.path()).unwrap_err();
        assert!(matches!(err, DriverError::NotSourceDir(p) if p == dir.path()));
    }

    #[test]
    fn test_invalid_build_dir() {
        let (_dir, src, build) = tree();
        fs::remove_file(build.join(COMPILE_DB)).unwrap();
        let err = ProjectLayout::detect(&src, &build).unwrap_err();
        assert!(matches!(err, DriverError::NotBuildDir(_)));
    }
}
