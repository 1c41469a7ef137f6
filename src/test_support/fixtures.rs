//! Test fixtures for common test scenarios.
//!
//! Builds Quay projects on disk or in memory for tests that need more than
//! a single snippet.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::project::SourceProject;
use crate::core::snippet::TextSnippet;
use crate::core::workspace::MANIFEST_NAME;

/// Fixture for one package of a project.
#[derive(Debug, Clone)]
pub struct PackageFixture {
    pub name: String,
    pub dependencies: Vec<String>,
    /// Source files, path relative to the package directory -> content.
    pub sources: Vec<(String, String)>,
}

impl PackageFixture {
    pub fn new(name: impl Into<String>) -> Self {
        PackageFixture {
            name: name.into(),
            dependencies: Vec::new(),
            sources: Vec::new(),
        }
    }

    pub fn depends_on(mut self, dependency: impl Into<String>) -> Self {
        self.dependencies.push(dependency.into());
        self
    }

    pub fn source(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.sources.push((path.into(), content.into()));
        self
    }
}

/// Fixture for a complete project.
#[derive(Debug, Clone)]
pub struct ProjectFixture {
    pub name: String,
    pub packages: Vec<PackageFixture>,
}

impl ProjectFixture {
    pub fn new(name: impl Into<String>) -> Self {
        ProjectFixture {
            name: name.into(),
            packages: Vec::new(),
        }
    }

    /// A library and an application using it.
    pub fn app_with_library(name: impl Into<String>) -> Self {
        ProjectFixture::new(name)
            .package(
                PackageFixture::new("lib")
                    .source("greet.verse", "greet():void =\n    Print(\"hello\")\n"),
            )
            .package(
                PackageFixture::new("app")
                    .depends_on("lib")
                    .source("main.verse", "using { lib }\nmain():void =\n    greet()\n"),
            )
    }

    pub fn package(mut self, package: PackageFixture) -> Self {
        self.packages.push(package);
        self
    }

    /// Quay.toml content for this project.
    pub fn manifest(&self) -> String {
        let mut manifest = format!("[project]\nname = \"{}\"\n", self.name);
        for package in &self.packages {
            manifest.push_str(&format!("\n[[package]]\nname = \"{}\"\n", package.name));
            if !package.dependencies.is_empty() {
                let deps: Vec<_> = package
                    .dependencies
                    .iter()
                    .map(|d| format!("\"{}\"", d))
                    .collect();
                manifest.push_str(&format!("dependencies = [{}]\n", deps.join(", ")));
            }
        }
        manifest
    }

    /// Write the project under `root`; returns the manifest path.
    pub fn write_to(&self, root: &Path) -> PathBuf {
        for package in &self.packages {
            for (path, content) in &package.sources {
                let file = root.join(&package.name).join(path);
                if let Some(parent) = file.parent() {
                    std::fs::create_dir_all(parent).unwrap();
                }
                std::fs::write(file, content).unwrap();
            }
            std::fs::create_dir_all(root.join(&package.name)).unwrap();
        }
        let manifest_path = root.join(MANIFEST_NAME);
        std::fs::write(&manifest_path, self.manifest()).unwrap();
        manifest_path
    }

    /// The same project, in memory. Snippet paths are `<package>/<path>`.
    pub fn source_project(&self) -> SourceProject {
        let mut project = SourceProject::new(&self.name);
        for fixture in &self.packages {
            let verse_path = format!("/{}/{}", self.name, fixture.name);
            let package = project.find_or_add_package(&fixture.name, &verse_path);
            for dependency in &fixture.dependencies {
                package.add_dependency(dependency.clone());
            }
            for (path, content) in &fixture.sources {
                let module_path = Path::new(path)
                    .parent()
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                package
                    .root_module_mut()
                    .find_or_add_module_path(&module_path)
                    .add_snippet(Arc::new(TextSnippet::new(
                        format!("{}/{}", fixture.name, path),
                        content.clone(),
                    )));
            }
        }
        project
    }
}
