//! Program representations produced by the toolchain stages.

pub mod ir;
pub mod semantic;
pub mod vst;

pub use ir::{IrProgram, IrUnit, TargetBackend};
pub use semantic::{
    AstPackage, AstProject, Definition, DefinitionKind, LocalizableMessage, ProgramContext,
    SemanticProgram, StringLiteral,
};
