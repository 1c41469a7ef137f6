//! The semantic program and the context that carries it between builds.

use serde::Serialize;

use crate::compiler::diagnostics::Locus;
use crate::core::package::{PackageRole, PackageScope};
use crate::program::ir::IrProgram;

/// What a top-level definition declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DefinitionKind {
    Function,
    Class,
    Data,
    PersistentVar,
    PersistentWeakMap,
    Module,
}

impl DefinitionKind {
    /// Whether instances of this definition live in persistent storage.
    pub fn is_persistent(self) -> bool {
        matches!(
            self,
            DefinitionKind::PersistentVar | DefinitionKind::PersistentWeakMap
        )
    }
}

/// A string literal found in a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringLiteral {
    pub text: String,
    pub locus: Locus,
}

/// A message declared as localizable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizableMessage {
    pub key: String,
    pub default_text: String,
    pub locus: Locus,
}

/// One analyzed top-level definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Definition {
    pub name: String,
    pub kind: DefinitionKind,
    pub locus: Locus,
    pub experimental: bool,
    /// Source lines making up the definition's body, in order.
    pub body: Vec<String>,
    pub strings: Vec<StringLiteral>,
    pub localizable: Vec<LocalizableMessage>,
}

impl Definition {
    pub fn new(name: impl Into<String>, kind: DefinitionKind, locus: Locus) -> Self {
        Definition {
            name: name.into(),
            kind,
            locus,
            experimental: false,
            body: Vec::new(),
            strings: Vec::new(),
            localizable: Vec::new(),
        }
    }
}

/// An analyzed package.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AstPackage {
    pub name: String,
    pub verse_path: String,
    pub role: PackageRole,
    pub scope: PackageScope,
    pub language_version: u32,
    pub dependency_packages: Vec<String>,
    pub from_digest: bool,
    pub definitions: Vec<Definition>,
    /// Packages whose definitions this package refers to, in first-use order.
    pub referenced_packages: Vec<String>,
}

impl AstPackage {
    pub fn find_definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }
}

/// The analyzed project.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AstProject {
    pub packages: Vec<AstPackage>,
}

impl AstProject {
    pub fn find_package(&self, name: &str) -> Option<&AstPackage> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = (&AstPackage, &Definition)> {
        self.packages
            .iter()
            .flat_map(|p| p.definitions.iter().map(move |d| (p, d)))
    }
}

/// The evolving semantic program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemanticProgram {
    ast: Option<AstProject>,
    ir: Option<IrProgram>,
}

impl SemanticProgram {
    pub fn new() -> Self {
        SemanticProgram::default()
    }

    pub fn ast(&self) -> Option<&AstProject> {
        self.ast.as_ref()
    }

    pub fn ast_mut(&mut self) -> Option<&mut AstProject> {
        self.ast.as_mut()
    }

    pub fn set_ast(&mut self, ast: AstProject) {
        self.ast = Some(ast);
    }

    pub fn ir(&self) -> Option<&IrProgram> {
        self.ir.as_ref()
    }

    pub fn ir_mut(&mut self) -> Option<&mut IrProgram> {
        self.ir.as_mut()
    }

    pub fn set_ir(&mut self, ir: IrProgram) {
        self.ir = Some(ir);
    }

    /// Number of persistent definitions in source-role packages.
    pub fn persistent_var_count(&self) -> usize {
        self.ast
            .iter()
            .flat_map(AstProject::definitions)
            .filter(|(package, definition)| {
                package.role.is_source() && definition.kind.is_persistent()
            })
            .count()
    }
}

/// Shared, mutated-in-place program state.
///
/// Reusing one context across builds is how incremental compilation keeps
/// earlier results; call [`ProgramContext::reset_semantic_program`] for a
/// clean build.
#[derive(Debug, Clone, Default)]
pub struct ProgramContext {
    pub program: SemanticProgram,
}

impl ProgramContext {
    pub fn new() -> Self {
        ProgramContext::default()
    }

    pub fn reset_semantic_program(&mut self) {
        self.program = SemanticProgram::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(name: &str, role: PackageRole, kinds: &[DefinitionKind]) -> AstPackage {
        AstPackage {
            name: name.to_string(),
            role,
            definitions: kinds
                .iter()
                .enumerate()
                .map(|(i, kind)| Definition::new(format!("d{}", i), *kind, Locus::build()))
                .collect(),
            ..AstPackage::default()
        }
    }

    #[test]
    fn test_persistent_var_count_ignores_non_source_packages() {
        let mut program = SemanticProgram::new();
        program.set_ast(AstProject {
            packages: vec![
                package(
                    "app",
                    PackageRole::Source,
                    &[
                        DefinitionKind::PersistentVar,
                        DefinitionKind::Function,
                        DefinitionKind::PersistentWeakMap,
                    ],
                ),
                package("ext", PackageRole::ExternalConstraint, &[DefinitionKind::PersistentVar]),
            ],
        });
        assert_eq!(program.persistent_var_count(), 2);
    }

    #[test]
    fn test_reset_semantic_program() {
        let mut context = ProgramContext::new();
        context.program.set_ast(AstProject::default());
        assert!(context.program.ast().is_some());

        context.reset_semantic_program();
        assert_eq!(context.program, SemanticProgram::new());
    }
}
