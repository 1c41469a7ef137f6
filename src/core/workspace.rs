//! Workspace - the project root and the manifest that describes it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::core::manifest::Manifest;
use crate::core::project::SourceProject;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Quay.toml";

/// Directory holding project-local Quay state and build output.
pub const QUAY_DIR: &str = ".quay";

/// Errors locating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{}` in `{}` or any parent directory", MANIFEST_NAME, .dir.display())]
    NotFound { dir: PathBuf },
}

/// Look for the manifest in `dir` itself (no upward search).
pub fn find_manifest(dir: &Path) -> Result<PathBuf, ManifestError> {
    let path = dir.join(MANIFEST_NAME);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ManifestError::NotFound {
            dir: dir.to_path_buf(),
        })
    }
}

/// A loaded project: its manifest and the source project built from it.
#[derive(Debug)]
pub struct Workspace {
    manifest: Manifest,
    project: SourceProject,
    target_dir: PathBuf,
}

impl Workspace {
    /// Load the workspace described by the manifest at `manifest_path`.
    pub fn new(manifest_path: &Path) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let project = manifest.to_source_project()?;
        let target_dir = manifest.root().join(QUAY_DIR).join("target");
        tracing::debug!(
            "loaded project `{}` with {} package(s)",
            project.name(),
            project.packages().len()
        );

        Ok(Workspace {
            manifest,
            project,
            target_dir,
        })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn project(&self) -> &SourceProject {
        &self.project
    }

    /// Directory containing Quay.toml.
    pub fn root(&self) -> &Path {
        self.manifest.root()
    }

    /// Default output directory for emitted listings.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }
}
