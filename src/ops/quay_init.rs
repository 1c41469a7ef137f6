//! Implementation of `quay init`.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::manifest::{generate_default_manifest, DEFAULT_EXTENSION};
use crate::core::workspace::{MANIFEST_NAME, QUAY_DIR};

/// Options for creating a project.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Project name; also the name of its only package
    pub name: String,
}

/// Create a Quay project in `path`, creating the directory if needed.
///
/// Writes `Quay.toml`, `src/main.verse` and a `.gitignore`.
pub fn init_project(path: &Path, opts: &InitOptions) -> Result<()> {
    if opts.name.is_empty() {
        bail!("project name must not be empty");
    }

    let manifest_path = path.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_NAME, path.display());
    }

    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    fs::write(&manifest_path, generate_default_manifest(&opts.name))
        .with_context(|| format!("failed to write {}", MANIFEST_NAME))?;

    let src_dir = path.join("src");
    fs::create_dir_all(&src_dir).with_context(|| "failed to create src directory")?;
    let main = src_dir.join(format!("main.{}", DEFAULT_EXTENSION));
    if !main.exists() {
        fs::write(&main, "main():void =\n    Print(\"Hello, Quay!\")\n")
            .with_context(|| format!("failed to write {}", main.display()))?;
    }

    let gitignore = path.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, format!("# Quay build output\n{}/\n", QUAY_DIR))?;
    }

    tracing::info!("Created project `{}` in {}", opts.name, path.display());
    Ok(())
}
