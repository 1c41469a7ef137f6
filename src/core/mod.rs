//! Core data structures for Quay.
//!
//! This module contains the source project model handed to the toolchain:
//! - Snippets, modules and packages
//! - The project and its dependency graph
//! - Quay.toml manifests and workspace discovery

pub mod manifest;
pub mod module;
pub mod package;
pub mod project;
pub mod snippet;
pub mod workspace;

pub use manifest::Manifest;
pub use module::SourceModule;
pub use package::{PackageRole, PackageScope, PackageSettings, SourcePackage, VersionedDigest};
pub use project::{ProjectError, SourceProject};
pub use snippet::{FileSnippet, MissingSnippet, SourceSnippet, TextSnippet, VstSnippet};
pub use workspace::{find_manifest, ManifestError, Workspace, MANIFEST_NAME, QUAY_DIR};
