//! `quay build` command

use anyhow::Result;

use super::GlobalArgs;
use crate::cli::BuildArgs;
use quay::compiler::LinkType;
use quay::ops::quay_build::{BuildOptions, MessageFormat};

pub fn execute(args: BuildArgs, global: GlobalArgs) -> Result<()> {
    let link = args
        .link
        .as_deref()
        .map(str::parse::<LinkType>)
        .transpose()
        .map_err(|e| anyhow::anyhow!("invalid link mode: {}", e))?;

    let message_format = args
        .message_format
        .as_deref()
        .map(str::parse::<MessageFormat>)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let opts = BuildOptions {
        semantic_only: args.semantic_only,
        link,
        no_codegen: args.no_codegen,
        digests: args.digests,
        message_format,
        emit_dir: args.emit,
        ..BuildOptions::default()
    };

    super::run_build(opts, global)
}
