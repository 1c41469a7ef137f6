//! Implementation of `quay build` and `quay check`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::compiler::context::{BuildParams, BuildResults, LinkType};
use crate::compiler::diagnostics::{Diagnostics, Glitch, Severity};
use crate::compiler::events::{BuildEvent, JsonEventObserver, TracingObserver};
use crate::core::Workspace;
use crate::ops::build_manager::ProgramBuildManager;
use crate::ops::reference::outline_toolchain;
use crate::util::config::Config;
use crate::util::diagnostic::{self, Diagnostic};

/// Directory under the target dir that receives generated digests.
pub const DIGEST_DIR: &str = "digests";

/// How build messages are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    /// Rendered diagnostics on stderr.
    #[default]
    Human,
    /// One JSON event per line on stdout.
    Json,
}

impl FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(MessageFormat::Human),
            "json" => Ok(MessageFormat::Json),
            _ => Err(format!(
                "invalid message format '{}'; expected 'human' or 'json'",
                s
            )),
        }
    }
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFormat::Human => f.write_str("human"),
            MessageFormat::Json => f.write_str("json"),
        }
    }
}

/// Options for the build command. `None` fields fall back to configuration.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Stop after semantic analysis
    pub semantic_only: bool,

    /// Link policy override
    pub link: Option<LinkType>,

    /// Stop after IR generation
    pub no_codegen: bool,

    /// Generate package digests
    pub digests: bool,

    /// Where build messages go
    pub message_format: Option<MessageFormat>,

    /// Write listings and the link map here
    pub emit_dir: Option<PathBuf>,

    /// Log glitches as they are recorded
    pub verbose: bool,
}

/// What a build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub results: BuildResults,
    pub glitches: Vec<Glitch>,
    /// Digest files written under the target dir.
    pub digest_paths: Vec<PathBuf>,
    pub message_format: MessageFormat,
}

impl BuildOutcome {
    pub fn succeeded(&self) -> bool {
        !self.results.has_failure()
    }
}

/// Effective build parameters: defaults, then config, then `opts`.
pub fn resolve_params(config: &Config, opts: &BuildOptions) -> Result<BuildParams> {
    let mut params = config.build_params()?;
    if opts.semantic_only {
        params.semantic_analysis_only = true;
    }
    if let Some(link) = opts.link {
        params.link_type = link;
    }
    if opts.no_codegen {
        params.generate_code = false;
    }
    if opts.digests {
        params.generate_digests = true;
    }
    Ok(params)
}

/// The message format to use: `opts`, then config, then human.
pub fn resolve_message_format(config: &Config, opts: &BuildOptions) -> Result<MessageFormat> {
    if let Some(format) = opts.message_format {
        return Ok(format);
    }
    match config.diagnostics.message_format.as_deref() {
        Some(format) => format.parse().map_err(anyhow::Error::msg),
        None => Ok(MessageFormat::default()),
    }
}

/// Build the workspace with the outline passes.
pub fn build(ws: &Workspace, config: &Config, opts: &BuildOptions) -> Result<BuildOutcome> {
    let params = resolve_params(config, opts)?;
    let message_format = resolve_message_format(config, opts)?;
    tracing::debug!("Build parameters: {:?}", params);

    let toolchain = outline_toolchain(opts.emit_dir.clone())
        .context("failed to set up the outline passes")?;
    let mut manager = ProgramBuildManager::with_project(ws.project().clone(), toolchain);

    let json = match message_format {
        MessageFormat::Json => Some(Arc::new(JsonEventObserver::stdout())),
        MessageFormat::Human => None,
    };
    let mut diagnostics = Diagnostics::new();
    if let Some(observer) = &json {
        diagnostics.add_observer(observer.clone());
    }
    if opts.verbose {
        diagnostics.add_observer(Arc::new(TracingObserver));
    }

    let started = Instant::now();
    let results = manager.build(params, &mut diagnostics);
    let duration_ms = started.elapsed().as_millis() as u64;

    if let Some(observer) = &json {
        for event in BuildEvent::stages(&results) {
            observer.emit(&event);
        }
        observer.emit(&BuildEvent::finished(&results, duration_ms));
    }

    let digest_paths = if results.digests.is_empty() {
        Vec::new()
    } else {
        write_digests(&ws.target_dir().join(DIGEST_DIR), &results)?
    };

    Ok(BuildOutcome {
        glitches: diagnostics.glitches().to_vec(),
        results,
        digest_paths,
        message_format,
    })
}

/// Write every generated digest to `dir`, one `<package>.digest.verse` each.
pub fn write_digests(dir: &Path, results: &BuildResults) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory: {}", dir.display()))?;
    results
        .digests
        .iter()
        .map(|digest| {
            let path = dir.join(format!("{}.digest.verse", digest.package));
            std::fs::write(&path, &digest.text)
                .with_context(|| format!("failed to write digest: {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

/// Render glitches on stderr, quoting source lines read from `root`.
pub fn report_glitches(root: &Path, glitches: &[Glitch], color: bool) {
    for glitch in glitches {
        let source = if glitch.locus.snippet_path.is_empty() {
            None
        } else {
            std::fs::read_to_string(root.join(&glitch.locus.snippet_path)).ok()
        };
        diagnostic::emit(&Diagnostic::from_glitch(glitch, source.as_deref()), color);
    }
}

/// One-line summary of a finished build.
pub fn summary(project: &str, outcome: &BuildOutcome) -> String {
    let stats = &outcome.results.statistics;
    let errors = outcome.glitches.iter().filter(|g| g.is_error()).count();
    let warnings = outcome
        .glitches
        .iter()
        .filter(|g| g.severity() == Severity::Warning)
        .count();
    if outcome.succeeded() {
        format!(
            "Finished `{}`: {} definition(s), {} function(s), {} warning(s)",
            project, stats.num_top_level_definitions, stats.num_functions, warnings
        )
    } else {
        format!(
            "Failed `{}`: {} error(s), {} warning(s) (compiler {}, linker {})",
            project,
            errors,
            warnings,
            outcome.results.compiler_result,
            outcome.results.linker_result
        )
    }
}
