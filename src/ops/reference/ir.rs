//! Outline IR generator: one unit per definition of every source package.

use crate::compiler::context::BuildContext;
use crate::compiler::diagnostics::{DiagnosticCode, Glitch};
use crate::compiler::pass::{IrGeneratorPass, PassLifecycle};
use crate::program::ir::{IrProgram, IrUnit};
use crate::program::semantic::{Definition, DefinitionKind, SemanticProgram};

#[derive(Debug, Default)]
pub struct OutlineIrGenerator;

impl OutlineIrGenerator {
    pub fn new() -> Self {
        OutlineIrGenerator
    }
}

/// Lowered instructions of `definition`, or `None` when it cannot be lowered.
fn lower(definition: &Definition) -> Option<Vec<String>> {
    let eval = |line: &String| format!("eval {}", line);
    let mut body = Vec::with_capacity(definition.body.len() + 2);
    match definition.kind {
        DefinitionKind::Function => {
            if definition.body.is_empty() {
                return None;
            }
            body.extend(definition.body.iter().map(eval));
            body.push("ret".to_string());
        }
        DefinitionKind::PersistentVar | DefinitionKind::PersistentWeakMap => {
            body.push(format!("alloc persistent {}", definition.name));
            body.extend(definition.body.iter().map(eval));
            if !definition.body.is_empty() {
                body.push(format!("store {}", definition.name));
            }
        }
        DefinitionKind::Class => {
            body.push(format!("class {}", definition.name));
            body.extend(definition.body.iter().map(|line| format!("field {}", line)));
        }
        DefinitionKind::Data => {
            body.extend(definition.body.iter().map(eval));
            body.push(format!("const {}", definition.name));
        }
        DefinitionKind::Module => body.push(format!("module {}", definition.name)),
    }
    Some(body)
}

impl PassLifecycle for OutlineIrGenerator {}

impl IrGeneratorPass for OutlineIrGenerator {
    fn process_program(&mut self, program: &mut SemanticProgram, build_ctx: &mut BuildContext) {
        let mut ir = IrProgram::new(build_ctx.params.target);
        let Some(ast) = program.ast() else {
            program.set_ir(ir);
            return;
        };

        for package in ast.packages.iter().filter(|p| p.role.is_source()) {
            for definition in &package.definitions {
                let Some(body) = lower(definition) else {
                    build_ctx.diagnostics.append_glitch(Glitch::with_message(
                        DiagnosticCode::IrError,
                        format!("function `{}` has no body", definition.name),
                        definition.locus.clone(),
                    ));
                    continue;
                };
                ir.units.push(IrUnit {
                    package: package.name.clone(),
                    name: definition.name.clone(),
                    kind: definition.kind,
                    locus: definition.locus.clone(),
                    body,
                });
            }
        }
        tracing::debug!("Lowered {} unit(s) for {}", ir.units.len(), ir.target);
        program.set_ir(ir);
    }
}
