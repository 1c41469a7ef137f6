//! Source project: the set of packages one build compiles.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use thiserror::Error;

use crate::core::package::{PackageSettings, SourcePackage};
use crate::core::snippet::SourceSnippet;

/// Problems with the shape of a project's package graph.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectError {
    #[error("package `{package}` depends on `{dependency}`, which is not in the project")]
    UnknownDependency { package: String, dependency: String },

    #[error("dependency cycle involving package `{package}`")]
    DependencyCycle { package: String },

    #[error("package `{0}` is defined more than once")]
    DuplicatePackage(String),

    #[error("package `{0}` not found")]
    PackageNotFound(String),
}

/// Owns every package of one build, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct SourceProject {
    name: String,
    packages: Vec<SourcePackage>,
}

impl SourceProject {
    pub fn new(name: impl Into<String>) -> Self {
        SourceProject {
            name: name.into(),
            packages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn packages(&self) -> &[SourcePackage] {
        &self.packages
    }

    pub fn packages_mut(&mut self) -> &mut [SourcePackage] {
        &mut self.packages
    }

    pub fn add_package(&mut self, package: SourcePackage) -> Result<&mut SourcePackage, ProjectError> {
        if self.find_package(package.name()).is_some() {
            return Err(ProjectError::DuplicatePackage(package.name().to_string()));
        }
        self.packages.push(package);
        let last = self.packages.len() - 1;
        Ok(&mut self.packages[last])
    }

    pub fn find_package(&self, name: &str) -> Option<&SourcePackage> {
        self.packages.iter().find(|p| p.name() == name)
    }

    pub fn find_package_mut(&mut self, name: &str) -> Option<&mut SourcePackage> {
        self.packages.iter_mut().find(|p| p.name() == name)
    }

    /// Find a package by name, creating it with `verse_path` if missing.
    ///
    /// An existing package keeps its settings; `verse_path` is only used
    /// for a new one.
    pub fn find_or_add_package(&mut self, name: &str, verse_path: &str) -> &mut SourcePackage {
        match self.packages.iter().position(|p| p.name() == name) {
            Some(index) => &mut self.packages[index],
            None => {
                let settings = PackageSettings {
                    verse_path: verse_path.to_string(),
                    ..PackageSettings::default()
                };
                self.packages.push(SourcePackage::new(name, settings));
                let last = self.packages.len() - 1;
                &mut self.packages[last]
            }
        }
    }

    pub fn remove_package(&mut self, name: &str) -> Option<SourcePackage> {
        let index = self.packages.iter().position(|p| p.name() == name)?;
        Some(self.packages.remove(index))
    }

    /// Remove a snippet by path from whichever package holds it.
    pub fn remove_snippet(&mut self, path: &str) -> Option<Arc<dyn SourceSnippet>> {
        self.packages
            .iter_mut()
            .find_map(|p| p.root_module_mut().remove_snippet_recursive(path))
    }

    pub fn find_snippet(&self, path: &str) -> Option<Arc<dyn SourceSnippet>> {
        self.packages
            .iter()
            .find_map(|p| p.root_module().find_snippet(path))
    }

    pub fn snippet_count(&self) -> usize {
        self.packages.iter().map(SourcePackage::snippet_count).sum()
    }

    /// Check that every declared dependency names a package in the project.
    pub fn validate_dependencies(&self) -> Result<(), ProjectError> {
        for package in &self.packages {
            for dependency in package.dependency_packages() {
                if self.find_package(dependency).is_none() {
                    return Err(ProjectError::UnknownDependency {
                        package: package.name().to_string(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Package names ordered so every package follows its dependencies.
    pub fn dependency_order(&self) -> Result<Vec<&str>, ProjectError> {
        self.validate_dependencies()?;

        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let indices: HashMap<&str, NodeIndex> = self
            .packages
            .iter()
            .map(|p| (p.name(), graph.add_node(p.name())))
            .collect();

        for package in &self.packages {
            let to = indices[package.name()];
            for dependency in package.dependency_packages() {
                let from = indices[dependency.as_str()];
                graph.add_edge(from, to, ());
            }
        }

        toposort(&graph, None)
            .map(|order| order.into_iter().map(|index| graph[index]).collect())
            .map_err(|cycle| ProjectError::DependencyCycle {
                package: graph[cycle.node_id()].to_string(),
            })
    }
}
