//! `quay check` command
//!
//! Runs the pipeline up to semantic analysis; nothing is generated or linked.

use anyhow::Result;

use super::GlobalArgs;
use crate::cli::CheckArgs;
use quay::ops::quay_build::{BuildOptions, MessageFormat};

pub fn execute(args: CheckArgs, global: GlobalArgs) -> Result<()> {
    let message_format = args
        .message_format
        .as_deref()
        .map(str::parse::<MessageFormat>)
        .transpose()
        .map_err(anyhow::Error::msg)?;

    let opts = BuildOptions {
        semantic_only: true,
        digests: args.digests,
        message_format,
        ..BuildOptions::default()
    };

    super::run_build(opts, global)
}
