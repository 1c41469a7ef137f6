//! The outline pass set.
//!
//! A small, grammar-agnostic set of passes that makes the toolchain usable
//! end to end from the command line:
//!
//! - [`OutlineParser`]: indentation outline, bracket and quote balance
//! - [`OutlineAnalyzer`]: top-level definitions, `using` references,
//!   string literals and localized messages
//! - [`OutlineIrGenerator`]: one IR unit per definition
//! - [`ListingAssembler`]: text listings and a link map
//! - [`OutlineDigestGenerator`]: bodiless re-loadable package digests

pub mod analyzer;
pub mod assembler;
pub mod digest;
pub mod ir;
pub mod parser;

use std::path::PathBuf;

pub use analyzer::OutlineAnalyzer;
pub use assembler::ListingAssembler;
pub use digest::OutlineDigestGenerator;
pub use ir::OutlineIrGenerator;
pub use parser::OutlineParser;

use crate::compiler::toolchain::{Toolchain, ToolchainParams};

/// A toolchain with every outline pass registered.
///
/// With `emit_dir`, the assembler writes its listings and link map there.
pub fn outline_toolchain(emit_dir: Option<PathBuf>) -> Result<Toolchain, regex::Error> {
    let mut assembler = ListingAssembler::new();
    if let Some(dir) = emit_dir {
        assembler = assembler.with_emit_dir(dir);
    }
    let params = ToolchainParams::new()
        .with_parser(OutlineParser::new())
        .with_semantic_analyzer(OutlineAnalyzer::new()?)
        .with_ir_generator(OutlineIrGenerator::new())
        .with_assembler(assembler)
        .with_digest_generator(OutlineDigestGenerator::new());
    Ok(Toolchain::new(params))
}
