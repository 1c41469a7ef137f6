//! Quay.toml manifest parsing and project loading.
//!
//! A manifest names the project and lists its packages in build order:
//!
//! ```toml
//! [project]
//! name = "demo"
//!
//! [[package]]
//! name = "lib"
//! path = "lib"
//!
//! [[package]]
//! name = "app"
//! path = "app"
//! dependencies = ["lib"]
//! ```
//!
//! Every file with the project's source extension below a package's
//! directory becomes a snippet; every subdirectory becomes a submodule.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::core::package::{PackageRole, PackageScope, PackageSettings, SourcePackage, VersionedDigest};
use crate::core::project::SourceProject;
use crate::core::snippet::FileSnippet;
use crate::core::workspace::MANIFEST_NAME;
use crate::compiler::context::LATEST_LANGUAGE_VERSION;
use crate::util::diagnostic::ManifestParseError;

/// Default extension of source files.
pub const DEFAULT_EXTENSION: &str = "verse";

/// The parsed Quay.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub project: ProjectMetadata,

    /// Packages in declaration order
    pub packages: Vec<PackageManifest>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

/// Project metadata from the [project] section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectMetadata {
    /// Project name
    pub name: String,

    /// Extension of source files, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Glob patterns excluded from every package
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

/// One `[[package]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageManifest {
    pub name: String,

    /// Package directory, relative to the manifest. Defaults to the name.
    pub path: Option<PathBuf>,

    /// Mount path. Defaults to `/<project>/<package>`.
    pub verse_path: Option<String>,

    #[serde(default)]
    pub role: PackageRole,

    #[serde(default)]
    pub scope: PackageScope,

    pub language_version: Option<u32>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub treat_modules_as_implicit: bool,

    pub vni_dest_dir: Option<String>,

    pub uploaded_at_version: Option<u32>,

    #[serde(default)]
    pub allow_experimental: bool,

    /// Digest file standing in for the package's source
    pub digest: Option<PathBuf>,

    /// Language version the digest was produced with
    pub digest_version: Option<u32>,

    /// Glob patterns excluded from this package, relative to its directory
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    project: Option<ProjectMetadata>,
    #[serde(default)]
    package: Vec<PackageManifest>,
}

impl Manifest {
    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| MANIFEST_NAME.to_string());
            ManifestParseError::new(&name, content, &e)
        })?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let Some(project) = raw.project else {
            bail!("manifest at {} must have a [project] section", path.display());
        };
        if project.name.is_empty() {
            bail!("project name in {} must not be empty", path.display());
        }

        for (index, package) in raw.package.iter().enumerate() {
            if raw.package[..index].iter().any(|p| p.name == package.name) {
                bail!("package `{}` is declared more than once", package.name);
            }
        }

        Ok(Manifest {
            project,
            packages: raw.package,
            manifest_dir,
        })
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    /// Directory containing the manifest.
    pub fn root(&self) -> &Path {
        &self.manifest_dir
    }

    pub fn package(&self, name: &str) -> Option<&PackageManifest> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Build the source project: one package per entry, in declaration
    /// order, each filled from its directory.
    pub fn to_source_project(&self) -> Result<SourceProject> {
        let mut project = SourceProject::new(self.name());
        for entry in &self.packages {
            let package = self.load_package(entry)?;
            project.add_package(package)?;
        }
        Ok(project)
    }

    fn load_package(&self, entry: &PackageManifest) -> Result<SourcePackage> {
        let dir = self
            .manifest_dir
            .join(entry.path.clone().unwrap_or_else(|| PathBuf::from(&entry.name)));

        let settings = PackageSettings {
            verse_path: entry
                .verse_path
                .clone()
                .unwrap_or_else(|| format!("/{}/{}", self.name(), entry.name)),
            scope: entry.scope,
            role: entry.role,
            language_version: entry.language_version,
            dependency_packages: entry.dependencies.clone(),
            treat_modules_as_implicit: entry.treat_modules_as_implicit,
            vni_dest_dir: entry.vni_dest_dir.clone(),
            uploaded_at_version: entry.uploaded_at_version,
            allow_experimental: entry.allow_experimental,
        };

        let mut package =
            SourcePackage::new(&entry.name, settings).with_dir_path(self.snippet_path(&dir));
        package.truncate_vni_dest_dir();

        if let Some(digest) = &entry.digest {
            let file = self.manifest_dir.join(digest);
            let snippet = FileSnippet::new(self.snippet_path(&file), file);
            let version = entry
                .digest_version
                .or(entry.language_version)
                .unwrap_or(LATEST_LANGUAGE_VERSION);
            let mut digest = VersionedDigest::new(Arc::new(snippet), version);
            digest.dependency_packages = entry.dependencies.clone();
            package = package.with_digest(digest);
        }

        if !dir.is_dir() {
            // A constraint package may be represented by its digest alone.
            if entry.digest.is_some() {
                return Ok(package);
            }
            bail!(
                "directory for package `{}` not found: {}",
                entry.name,
                dir.display()
            );
        }

        let excludes = self.exclude_patterns(entry)?;
        let walker = WalkDir::new(&dir)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e.path()) && !is_excluded(&excludes, &dir, e.path()));

        for item in walker {
            let item = item.with_context(|| format!("failed to walk {}", dir.display()))?;
            let relative = item.path().strip_prefix(&dir).unwrap_or(item.path());

            if item.file_type().is_dir() {
                package
                    .root_module_mut()
                    .find_or_add_module_path(&to_slash(relative));
                continue;
            }
            if item.path().extension().and_then(|e| e.to_str()) != Some(self.project.extension.as_str()) {
                continue;
            }

            let module_path = relative.parent().map(to_slash).unwrap_or_default();
            let snippet = FileSnippet::new(self.snippet_path(item.path()), item.path());
            tracing::trace!("snippet {}", snippet.file().display());
            package
                .root_module_mut()
                .find_or_add_module_path(&module_path)
                .add_snippet(Arc::new(snippet));
        }

        Ok(package)
    }

    fn exclude_patterns(&self, entry: &PackageManifest) -> Result<Vec<Pattern>> {
        self.project
            .exclude
            .iter()
            .chain(&entry.exclude)
            .map(|pattern| {
                Pattern::new(pattern)
                    .with_context(|| format!("invalid exclude pattern `{}`", pattern))
            })
            .collect()
    }

    /// Project-relative, `/`-separated path used as a snippet's identity.
    fn snippet_path(&self, file: &Path) -> String {
        let relative = pathdiff::diff_paths(file, &self.manifest_dir).unwrap_or_else(|| file.to_path_buf());
        to_slash(&relative)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn is_excluded(patterns: &[Pattern], dir: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    let relative = to_slash(relative);
    patterns.iter().any(|pattern| pattern.matches(&relative))
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Generate a starter Quay.toml with a single package.
pub fn generate_default_manifest(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"

[[package]]
name = "{name}"
path = "src"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snippet::SourceSnippet;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_basic_manifest() {
        let content = r#"
[project]
name = "demo"

[[package]]
name = "lib"
role = "external-constraint"
scope = "public-api"
language-version = 1

[[package]]
name = "app"
path = "apps/app"
dependencies = ["lib"]
"#;
        let tmp = TempDir::new().unwrap();
        let manifest = Manifest::parse(content, &tmp.path().join(MANIFEST_NAME)).unwrap();

        assert_eq!(manifest.name(), "demo");
        assert_eq!(manifest.project.extension, "verse");
        assert_eq!(manifest.packages.len(), 2);
        let lib = manifest.package("lib").unwrap();
        assert_eq!(lib.role, PackageRole::ExternalConstraint);
        assert_eq!(lib.scope, PackageScope::PublicApi);
        assert_eq!(manifest.package("app").unwrap().dependencies, vec!["lib"]);
    }

    #[test]
    fn test_manifest_requires_project() {
        let tmp = TempDir::new().unwrap();
        let result = Manifest::parse("[[package]]\nname = \"a\"\n", &tmp.path().join(MANIFEST_NAME));
        assert!(result.unwrap_err().to_string().contains("[project]"));
    }

    #[test]
    fn test_manifest_rejects_duplicate_packages() {
        let tmp = TempDir::new().unwrap();
        let content = "[project]\nname = \"d\"\n[[package]]\nname = \"a\"\n[[package]]\nname = \"a\"\n";
        let result = Manifest::parse(content, &tmp.path().join(MANIFEST_NAME));
        assert!(result.unwrap_err().to_string().contains("more than once"));
    }

    #[test]
    fn test_parse_error_carries_span() {
        let tmp = TempDir::new().unwrap();
        let err = Manifest::parse("[project\n", &tmp.path().join(MANIFEST_NAME)).unwrap_err();
        let parse_error = err.downcast_ref::<ManifestParseError>().unwrap();
        assert!(parse_error.span.is_some());
    }

    #[test]
    fn test_load_project_tree() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "app/main.verse", "main()");
        write(tmp.path(), "app/b.verse", "b()");
        write(tmp.path(), "app/ui/widgets.verse", "w()");
        write(tmp.path(), "app/ui/notes.txt", "ignored");
        write(tmp.path(), "app/.hidden/x.verse", "ignored");
        write(tmp.path(), "app/gen/out.verse", "ignored");
        write(
            tmp.path(),
            MANIFEST_NAME,
            r#"
[project]
name = "demo"

[[package]]
name = "app"
exclude = ["gen"]
"#,
        );

        let manifest = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap();
        let project = manifest.to_source_project().unwrap();
        let app = project.find_package("app").unwrap();

        assert_eq!(app.settings().verse_path, "/demo/app");
        assert_eq!(app.dir_path(), "app");
        let root = app.root_module();
        let paths: Vec<_> = root.snippets().iter().map(|s| s.path().to_string()).collect();
        assert_eq!(paths, vec!["app/b.verse", "app/main.verse"]);
        assert_eq!(root.submodules().len(), 1);
        assert_eq!(root.submodules()[0].name(), "ui");
        assert_eq!(root.submodules()[0].snippets()[0].path(), "app/ui/widgets.verse");
        assert_eq!(project.snippet_count(), 3);
    }

    #[test]
    fn test_digest_only_package() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "digests/lib.digest", "lib digest");
        write(
            tmp.path(),
            MANIFEST_NAME,
            r#"
[project]
name = "demo"

[[package]]
name = "lib"
role = "external-constraint"
digest = "digests/lib.digest"
digest-version = 0
"#,
        );

        let manifest = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap();
        let project = manifest.to_source_project().unwrap();
        let lib = project.find_package("lib").unwrap();
        let digest = lib.digest().unwrap();

        assert_eq!(digest.effective_language_version, 0);
        assert_eq!(digest.snippet.path(), "digests/lib.digest");
        assert_eq!(digest.snippet.text().as_deref(), Some("lib digest"));
        assert!(lib.digest_substitute().is_some());
    }

    #[test]
    fn test_missing_package_dir() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            MANIFEST_NAME,
            "[project]\nname = \"demo\"\n[[package]]\nname = \"ghost\"\n",
        );
        let manifest = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap();
        let err = manifest.to_source_project().unwrap_err();
        assert!(err.to_string().contains("ghost"));
    }
}
