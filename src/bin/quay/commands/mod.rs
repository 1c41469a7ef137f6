//! Command implementations

pub mod build;
pub mod check;
pub mod completions;
pub mod init;
pub mod tree;

use std::io::IsTerminal;

use anyhow::{anyhow, bail, Result};

use quay::core::Workspace;
use quay::ops::quay_build::{build, report_glitches, summary, BuildOptions, MessageFormat};
use quay::util::diagnostic::suggestions;
use quay::util::GlobalContext;

/// Flags shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct GlobalArgs {
    pub verbose: bool,
    pub no_color: bool,
}

/// Load the workspace containing the current directory.
pub fn load_workspace(ctx: &GlobalContext) -> Result<Workspace> {
    let manifest_path = ctx
        .find_manifest()
        .map_err(|e| anyhow!("{}\n{}", e, suggestions::NO_MANIFEST))?;
    Workspace::new(&manifest_path)
}

/// Shared body of `build` and `check`.
pub fn run_build(mut opts: BuildOptions, global: GlobalArgs) -> Result<()> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(global.verbose);

    let ws = load_workspace(&ctx)?;
    let config = ctx.load_config(ws.root());
    let color = !global.no_color
        && config
            .diagnostics
            .color
            .unwrap_or_else(|| std::io::stderr().is_terminal());
    ctx.set_color(color);
    opts.verbose = ctx.is_verbose();

    let outcome = build(&ws, &config, &opts)?;

    if outcome.message_format == MessageFormat::Human {
        report_glitches(ws.root(), &outcome.glitches, ctx.color());
        for path in &outcome.digest_paths {
            eprintln!("      Digest {}", path.display());
        }
        eprintln!("    {}", summary(ws.manifest().name(), &outcome));
    }

    if !outcome.succeeded() {
        bail!(
            "could not build `{}`\n{}",
            ws.manifest().name(),
            suggestions::BUILD_FAILED
        );
    }
    Ok(())
}
