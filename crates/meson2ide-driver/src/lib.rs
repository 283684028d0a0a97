//! End-to-end export of a Meson build to IDE project files.

mod error;
mod introspect;
mod layout;

pub use error::{DriverError, Result};
pub use introspect::{project_info, project_name, ProjectInfo};
pub use layout::{
    is_build_dir, is_source_dir, ProjectLayout, BUILD_MARKER, COMPILE_DB, SOURCE_MARKER,
};

use meson2ide_build::{FileDatabase, ToolConfig};
use meson2ide_export::{collect_meson_files, ProjectFiles, QtCreatorProject};
use tracing::info;

/// Orchestrates the export pipeline.
pub struct Driver {
    config: ToolConfig,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(ToolConfig::default())
    }
}

impl Driver {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Read and aggregate the build directory's compile database.
    pub fn load_database(&self, layout: &ProjectLayout) -> Result<FileDatabase> {
        FileDatabase::load(&layout.compile_db(), &self.config.discovery)
            .map_err(DriverError::from_load)
    }

    /// Export a Qt Creator project into the build directory.
    ///
    /// Everything that can fail fatally (compile database, introspection)
    /// runs before the first file is written.
    pub fn run(&self, layout: &ProjectLayout) -> Result<ProjectFiles> {
        info!(
            source = %layout.source_dir.display(),
            build = %layout.build_dir.display(),
            "exporting Qt Creator project"
        );

        let db = self.load_database(layout)?;
        let name = project_name(&self.config, layout)?;

        let meson_files = collect_meson_files(&layout.source_dir);
        info!(count = meson_files.len(), "found build description files");

        let project = QtCreatorProject::new(&db, &meson_files, &layout.build_dir);
        Ok(project.write(&layout.build_dir, &name)?)
    }
}
