//! Configuration file support for Quay.
//!
//! Quay supports two configuration file locations:
//! - Global: `~/.quay/config.toml` - User-wide defaults
//! - Project: `.quay/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Command-line flags
//! take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::compiler::context::{BuildParams, LinkType, OrderingPolicy};
use crate::program::ir::TargetBackend;

/// Quay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Build settings
    pub build: BuildConfig,

    /// Diagnostics output settings
    pub diagnostics: DiagnosticsConfig,
}

/// Defaults for build parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Link mode (default, require-complete, skip)
    pub link: Option<String>,

    /// Stop after semantic analysis
    pub semantic_only: Option<bool>,

    /// Run IR generation's successors (assembly and link)
    pub generate_code: Option<bool>,

    /// Produce package digests
    pub generate_digests: Option<bool>,

    /// Upper bound on persistent variables
    pub max_persistent_vars: Option<u32>,

    /// Snippet ordering (declaration, lexicographic, legacy)
    pub ordering: Option<String>,

    /// Upload version below which `legacy` ordering sorts a package
    pub legacy_ordering_below: Option<u32>,

    /// Backend (bytecode, native)
    pub target: Option<String>,

    /// Record which dependencies each package uses
    pub track_package_usage: Option<bool>,
}

/// Diagnostics output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DiagnosticsConfig {
    /// Colorize human output (None = auto)
    pub color: Option<bool>,

    /// Default message format (human, json)
    pub message_format: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        let build = other.build;
        if build.link.is_some() {
            self.build.link = build.link;
        }
        if build.semantic_only.is_some() {
            self.build.semantic_only = build.semantic_only;
        }
        if build.generate_code.is_some() {
            self.build.generate_code = build.generate_code;
        }
        if build.generate_digests.is_some() {
            self.build.generate_digests = build.generate_digests;
        }
        if build.max_persistent_vars.is_some() {
            self.build.max_persistent_vars = build.max_persistent_vars;
        }
        if build.ordering.is_some() {
            self.build.ordering = build.ordering;
        }
        if build.legacy_ordering_below.is_some() {
            self.build.legacy_ordering_below = build.legacy_ordering_below;
        }
        if build.target.is_some() {
            self.build.target = build.target;
        }
        if build.track_package_usage.is_some() {
            self.build.track_package_usage = build.track_package_usage;
        }

        if other.diagnostics.color.is_some() {
            self.diagnostics.color = other.diagnostics.color;
        }
        if other.diagnostics.message_format.is_some() {
            self.diagnostics.message_format = other.diagnostics.message_format;
        }
    }

    /// Build parameters with this config's defaults applied.
    pub fn build_params(&self) -> Result<BuildParams> {
        let mut params = BuildParams::default();
        let build = &self.build;

        if let Some(link) = &build.link {
            params.link_type = link.parse::<LinkType>().map_err(anyhow::Error::msg)?;
        }
        if let Some(semantic_only) = build.semantic_only {
            params.semantic_analysis_only = semantic_only;
        }
        if let Some(generate_code) = build.generate_code {
            params.generate_code = generate_code;
        }
        if let Some(generate_digests) = build.generate_digests {
            params.generate_digests = generate_digests;
        }
        params.max_num_persistent_vars = build.max_persistent_vars;
        if let Some(target) = &build.target {
            params.target = target.parse::<TargetBackend>().map_err(anyhow::Error::msg)?;
        }
        if let Some(track) = build.track_package_usage {
            params.track_package_usage = track;
        }
        params.ordering = self.ordering()?;

        Ok(params)
    }

    fn ordering(&self) -> Result<OrderingPolicy> {
        match self.build.ordering.as_deref() {
            None | Some("declaration") => Ok(OrderingPolicy::Declaration),
            Some("lexicographic") => Ok(OrderingPolicy::Lexicographic),
            Some("legacy") => match self.build.legacy_ordering_below {
                Some(below_version) => Ok(OrderingPolicy::Legacy { below_version }),
                None => bail!("`legacy` ordering requires `legacy-ordering-below`"),
            },
            Some(other) => bail!(
                "invalid ordering '{}'; expected 'declaration', 'lexicographic' or 'legacy'",
                other
            ),
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.quay/config.toml)
/// 2. Global config (~/.quay/config.toml)
/// 3. Defaults
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global quay config directory (~/.quay).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".quay"))
}

/// Get the project config path (.quay/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".quay").join("config.toml")
}
