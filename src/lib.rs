//! Quay - a retargetable multi-pass compiler toolchain
//!
//! This crate provides the core library functionality for Quay: the source
//! project model, pluggable compiler passes with filters and injections,
//! the toolchain that drives them, and the program build manager.

pub mod compiler;
pub mod core;
pub mod ops;
pub mod program;
pub mod util;

/// Test utilities and mocks for Quay unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides recording passes and project fixtures.
#[cfg(test)]
pub mod test_support;

pub use compiler::{
    BuildContext, BuildParams, BuildResults, CompilerResult, Diagnostics, Glitch, Toolchain,
    ToolchainParams,
};
pub use core::{SourcePackage, SourceProject, Workspace};
pub use ops::ProgramBuildManager;
pub use program::ProgramContext;
pub use util::context::GlobalContext;
