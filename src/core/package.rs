//! Source packages: a named module tree plus the settings it builds under.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::module::SourceModule;
use crate::core::snippet::SourceSnippet;

/// Who may see a package's definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageScope {
    #[default]
    PublicUser,
    InternalUser,
    PublicApi,
    InternalApi,
}

impl FromStr for PackageScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public-user" => Ok(PackageScope::PublicUser),
            "internal-user" => Ok(PackageScope::InternalUser),
            "public-api" => Ok(PackageScope::PublicApi),
            "internal-api" => Ok(PackageScope::InternalApi),
            _ => Err(format!(
                "invalid scope '{}'; expected 'public-user', 'internal-user', 'public-api' or 'internal-api'",
                s
            )),
        }
    }
}

/// What a package contributes to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageRole {
    /// Compiled from its own source.
    #[default]
    Source,
    /// Only constrains other packages; may be represented by a digest.
    ExternalConstraint,
    /// Compatibility constraint against an older published version.
    GeneralCompatConstraint,
}

impl PackageRole {
    pub fn is_source(self) -> bool {
        self == PackageRole::Source
    }
}

impl fmt::Display for PackageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackageRole::Source => "source",
            PackageRole::ExternalConstraint => "external-constraint",
            PackageRole::GeneralCompatConstraint => "general-compat-constraint",
        };
        f.write_str(name)
    }
}

/// Per-package build settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSettings {
    /// Mount path of the package in the global namespace, e.g. `/acme.com/app`.
    pub verse_path: String,
    pub scope: PackageScope,
    pub role: PackageRole,
    /// Language version the package targets; `None` means the latest.
    pub language_version: Option<u32>,
    /// Names of the packages this one depends on, in declaration order.
    pub dependency_packages: Vec<String>,
    pub treat_modules_as_implicit: bool,
    /// Destination directory for generated native interface code.
    pub vni_dest_dir: Option<String>,
    /// Version marker recorded when the package was uploaded. Drives
    /// legacy snippet ordering.
    pub uploaded_at_version: Option<u32>,
    pub allow_experimental: bool,
}

/// A pre-built stand-in for a package's source.
#[derive(Debug, Clone)]
pub struct VersionedDigest {
    pub snippet: Arc<dyn SourceSnippet>,
    /// Language version the digest was produced with. May differ from the
    /// package's nominal version, e.g. for externally cooked content.
    pub effective_language_version: u32,
    pub dependency_packages: Vec<String>,
}

impl VersionedDigest {
    pub fn new(snippet: Arc<dyn SourceSnippet>, effective_language_version: u32) -> Self {
        VersionedDigest {
            snippet,
            effective_language_version,
            dependency_packages: Vec::new(),
        }
    }
}

/// A package of source: name, settings, root module and optional digest.
#[derive(Debug, Clone)]
pub struct SourcePackage {
    name: String,
    /// Directory the package was loaded from, `/`-separated. Empty for
    /// in-memory packages.
    dir_path: String,
    settings: PackageSettings,
    root_module: SourceModule,
    digest: Option<VersionedDigest>,
}

impl SourcePackage {
    pub fn new(name: impl Into<String>, settings: PackageSettings) -> Self {
        let name = name.into();
        SourcePackage {
            root_module: SourceModule::new(name.clone()),
            name,
            dir_path: String::new(),
            settings,
            digest: None,
        }
    }

    pub fn with_dir_path(mut self, dir_path: impl Into<String>) -> Self {
        self.dir_path = dir_path.into();
        self
    }

    pub fn with_digest(mut self, digest: VersionedDigest) -> Self {
        self.digest = Some(digest);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir_path(&self) -> &str {
        &self.dir_path
    }

    pub fn settings(&self) -> &PackageSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut PackageSettings {
        &mut self.settings
    }

    pub fn root_module(&self) -> &SourceModule {
        &self.root_module
    }

    pub fn root_module_mut(&mut self) -> &mut SourceModule {
        &mut self.root_module
    }

    pub fn digest(&self) -> Option<&VersionedDigest> {
        self.digest.as_ref()
    }

    pub fn set_digest(&mut self, digest: Option<VersionedDigest>) {
        self.digest = digest;
    }

    /// The digest to build from instead of source, if this package uses one.
    ///
    /// Only non-source packages are ever represented by their digest.
    pub fn digest_substitute(&self) -> Option<&VersionedDigest> {
        if self.settings.role.is_source() {
            return None;
        }
        self.digest.as_ref()
    }

    pub fn dependency_packages(&self) -> &[String] {
        &self.settings.dependency_packages
    }

    /// Declare a dependency. Re-adding an existing name changes nothing.
    pub fn add_dependency(&mut self, package_name: impl Into<String>) {
        let package_name = package_name.into();
        if !self.depends_on(&package_name) {
            self.settings.dependency_packages.push(package_name);
        }
    }

    pub fn depends_on(&self, package_name: &str) -> bool {
        self.settings
            .dependency_packages
            .iter()
            .any(|dep| dep == package_name)
    }

    /// Make the native-interface destination directory relative to this
    /// package's directory when it lies underneath it.
    ///
    /// Pure string manipulation: nothing touches the filesystem.
    pub fn truncate_vni_dest_dir(&mut self) {
        let Some(dest) = self.settings.vni_dest_dir.as_deref() else {
            return;
        };
        if let Some(relative) = relative_to(dest, &self.dir_path) {
            self.settings.vni_dest_dir = Some(relative);
        }
    }

    pub fn snippet_count(&self) -> usize {
        self.root_module.snippet_count()
    }
}

/// `path` relative to `base` if `base` is a directory prefix of `path`.
fn relative_to(path: &str, base: &str) -> Option<String> {
    let path = path.replace('\\', "/");
    let base = base.replace('\\', "/");
    let base = base.trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    let rest = path.strip_prefix(base)?;
    if rest.is_empty() {
        return Some(String::new());
    }
    let rest = rest.strip_prefix('/')?;
    Some(rest.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snippet::TextSnippet;

    fn package(role: PackageRole) -> SourcePackage {
        SourcePackage::new(
            "lib",
            PackageSettings {
                verse_path: "/acme/lib".to_string(),
                role,
                ..PackageSettings::default()
            },
        )
    }

    #[test]
    fn test_add_dependency_is_idempotent() {
        let mut pkg = package(PackageRole::Source);
        pkg.add_dependency("core");
        pkg.add_dependency("util");
        pkg.add_dependency("core");
        assert_eq!(pkg.dependency_packages(), &["core", "util"]);
        assert!(pkg.depends_on("util"));
        assert!(!pkg.depends_on("other"));
    }

    #[test]
    fn test_digest_substitute_only_for_non_source_roles() {
        let digest = VersionedDigest::new(Arc::new(TextSnippet::new("/lib.digest", "")), 3);

        let source = package(PackageRole::Source).with_digest(digest.clone());
        assert!(source.digest().is_some());
        assert!(source.digest_substitute().is_none());

        let external = package(PackageRole::ExternalConstraint).with_digest(digest);
        assert_eq!(
            external.digest_substitute().map(|d| d.effective_language_version),
            Some(3)
        );
    }

    #[test]
    fn test_truncate_vni_dest_dir() {
        let mut pkg = package(PackageRole::Source).with_dir_path("C:\\work\\lib");
        pkg.settings_mut().vni_dest_dir = Some("C:/work/lib/generated/vni".to_string());
        pkg.truncate_vni_dest_dir();
        assert_eq!(pkg.settings().vni_dest_dir.as_deref(), Some("generated/vni"));
    }

    #[test]
    fn test_truncate_vni_dest_dir_outside_package() {
        let mut pkg = package(PackageRole::Source).with_dir_path("/work/lib");
        pkg.settings_mut().vni_dest_dir = Some("/work/library/out".to_string());
        pkg.truncate_vni_dest_dir();
        assert_eq!(pkg.settings().vni_dest_dir.as_deref(), Some("/work/library/out"));
    }

    #[test]
    fn test_scope_from_str() {
        assert_eq!("internal-api".parse::<PackageScope>(), Ok(PackageScope::InternalApi));
        assert!("everyone".parse::<PackageScope>().is_err());
    }
}
