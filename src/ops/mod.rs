//! High-level operations.
//!
//! This module contains the program build manager, the outline pass set
//! and the implementation of Quay commands.

pub mod build_manager;
pub mod quay_build;
pub mod quay_init;
pub mod reference;

pub use build_manager::ProgramBuildManager;
pub use quay_build::{build, BuildOptions, BuildOutcome, MessageFormat};
pub use quay_init::{init_project, InitOptions};
pub use reference::outline_toolchain;
