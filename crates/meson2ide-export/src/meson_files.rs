//! Build-description file discovery.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// File names Meson reads as project definitions.
pub const BUILD_DESCRIPTION_FILES: &[&str] = &["meson.build", "meson_options.txt", "meson.options"];

/// Every build-description file under `src_dir`, recursively.
///
/// Unreadable directories are skipped with a warning.
pub fn collect_meson_files(src_dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(src_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping unreadable path while scanning {}: {err}", src_dir.display());
                continue;
            }
        };
        // Follows symlinks, so a linked `meson.build` still counts.
        if !entry.path().is_file() {
            continue;
        }
        let is_build_file = entry
            .file_name()
            .to_str()
            .is_some_and(|name| BUILD_DESCRIPTION_FILES.contains(&name));
        if is_build_file {
            files.push(entry.into_path());
        }
    }

    files.sort();
    files
}
