//! Per-build inputs and outputs: parameters, build context, results.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::compiler::diagnostics::{BuildStatistics, Diagnostics};
use crate::compiler::digest::GeneratedDigest;
use crate::compiler::injection::Injections;
use crate::compiler::localization::{LocalizationInfo, StringInfo};
use crate::compiler::result::CompilerResult;
use crate::core::package::PackageSettings;
use crate::core::project::SourceProject;
use crate::program::ir::TargetBackend;

/// Language version assumed for packages that do not name one.
pub const LATEST_LANGUAGE_VERSION: u32 = 1;

/// How the link stage treats the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    /// Every referenced symbol must resolve and an entry point must exist.
    RequireComplete,
    /// Do not link.
    Skip,
    /// Link what is there.
    #[default]
    Default,
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(LinkType::Default),
            "require-complete" => Ok(LinkType::RequireComplete),
            "skip" => Ok(LinkType::Skip),
            _ => Err(format!(
                "invalid link type '{}'; expected 'default', 'require-complete' or 'skip'",
                s
            )),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::RequireComplete => f.write_str("require-complete"),
            LinkType::Skip => f.write_str("skip"),
            LinkType::Default => f.write_str("default"),
        }
    }
}

/// Order in which a package's snippets and submodules are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderingPolicy {
    /// Declaration order, as stored in the module tree.
    #[default]
    Declaration,
    /// Always sort snippets by path and submodules by name.
    Lexicographic,
    /// Sort packages uploaded before `below_version`; keep declaration order
    /// for newer packages and for packages without an upload marker.
    Legacy { below_version: u32 },
}

impl OrderingPolicy {
    /// Whether a package with this upload marker is parsed in sorted order.
    pub fn sorts(self, uploaded_at_version: Option<u32>) -> bool {
        match self {
            OrderingPolicy::Declaration => false,
            OrderingPolicy::Lexicographic => true,
            OrderingPolicy::Legacy { below_version } => {
                uploaded_at_version.is_some_and(|version| version < below_version)
            }
        }
    }
}

/// Read-only inputs for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    pub generate_digests: bool,
    /// When false the pipeline stops after IR generation.
    pub generate_code: bool,
    pub link_type: LinkType,
    pub semantic_analysis_only: bool,
    /// Upper bound on persistent definitions in source packages.
    pub max_num_persistent_vars: Option<u32>,
    /// Replaces every package's own language version.
    pub language_version_override: Option<u32>,
    /// Replaces every package's upload marker.
    pub uploaded_at_version_override: Option<u32>,
    pub ordering: OrderingPolicy,
    pub target: TargetBackend,
    pub track_package_usage: bool,
}

impl Default for BuildParams {
    fn default() -> Self {
        BuildParams {
            generate_digests: false,
            generate_code: true,
            link_type: LinkType::Default,
            semantic_analysis_only: false,
            max_num_persistent_vars: None,
            language_version_override: None,
            uploaded_at_version_override: None,
            ordering: OrderingPolicy::Declaration,
            target: TargetBackend::Bytecode,
            track_package_usage: false,
        }
    }
}

impl BuildParams {
    pub fn effective_language_version(&self, settings: &PackageSettings) -> u32 {
        self.language_version_override
            .or(settings.language_version)
            .unwrap_or(LATEST_LANGUAGE_VERSION)
    }

    pub fn effective_uploaded_at_version(&self, settings: &PackageSettings) -> Option<u32> {
        self.uploaded_at_version_override
            .or(settings.uploaded_at_version)
    }

    /// Whether the link stage runs at all under these parameters.
    pub fn wants_link(&self) -> bool {
        !self.semantic_analysis_only && self.generate_code && self.link_type != LinkType::Skip
    }
}

/// Which declared dependencies each package actually referenced.
///
/// Only direct dependencies are recorded; a reference to a package that is
/// not declared by the referring package is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PackageUsage {
    #[serde(skip)]
    declared: BTreeMap<String, BTreeSet<String>>,
    used: BTreeMap<String, BTreeSet<String>>,
}

impl PackageUsage {
    /// An empty table that knows every package's declared dependencies.
    pub fn for_project(project: &SourceProject) -> Self {
        let declared = project
            .packages()
            .iter()
            .map(|package| {
                let deps = package.dependency_packages().iter().cloned().collect();
                (package.name().to_string(), deps)
            })
            .collect();
        PackageUsage {
            declared,
            used: BTreeMap::new(),
        }
    }

    /// Record that `package` referenced `dependency`. Returns whether the
    /// reference was recorded.
    pub fn record(&mut self, package: &str, dependency: &str) -> bool {
        let declared = self
            .declared
            .get(package)
            .is_some_and(|deps| deps.contains(dependency));
        if !declared {
            return false;
        }
        self.used
            .entry(package.to_string())
            .or_default()
            .insert(dependency.to_string());
        true
    }

    pub fn used_dependencies(&self, package: &str) -> Vec<&str> {
        self.used
            .get(package)
            .map(|deps| deps.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn unused_dependencies(&self, package: &str) -> Vec<&str> {
        let Some(declared) = self.declared.get(package) else {
            return Vec::new();
        };
        let used = self.used.get(package);
        declared
            .iter()
            .filter(|dep| !used.is_some_and(|used| used.contains(*dep)))
            .map(String::as_str)
            .collect()
    }
}

/// State for one build invocation.
#[derive(Debug, Default)]
pub struct BuildContext {
    pub diagnostics: Diagnostics,
    pub params: BuildParams,
    /// Build-level injections, run after the toolchain's own.
    pub injections: Injections,
    /// Present when package usage is being tracked.
    pub package_usage: Option<PackageUsage>,
}

impl BuildContext {
    pub fn new(params: BuildParams) -> Self {
        BuildContext {
            params,
            ..BuildContext::default()
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_injections(mut self, injections: Injections) -> Self {
        self.injections = injections;
        self
    }

    pub fn with_package_usage(mut self, usage: PackageUsage) -> Self {
        self.package_usage = Some(usage);
        self
    }
}

/// Everything a build produced, including partial progress on failure.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct BuildResults {
    pub compiler_result: CompilerResult,
    pub linker_result: CompilerResult,
    pub io_errors_found: bool,
    pub statistics: BuildStatistics,
    pub localization: Vec<LocalizationInfo>,
    pub strings: Vec<StringInfo>,
    pub digests: Vec<GeneratedDigest>,
    pub package_usage: Option<PackageUsage>,
}

impl BuildResults {
    /// Some stage, link included, failed.
    pub fn has_failure(&self) -> bool {
        self.io_errors_found || self.compiler_result.is_failure() || self.linker_result.is_failure()
    }

    /// Compilation did not run to completion.
    pub fn is_aborted(&self) -> bool {
        self.compiler_result.is_aborted()
    }
}
