//! Outline semantic analyzer.
//!
//! Reads the top-level lines of every snippet as declarations:
//!
//! | Line                          | Definition           |
//! |-------------------------------|----------------------|
//! | `using { lib }`               | package reference    |
//! | `var Name : weak_map(k, v)`   | persistent weak map  |
//! | `var Name : type = value`     | persistent variable  |
//! | `Name := class` / `interface` | class                |
//! | `Name := struct` / `enum`     | data                 |
//! | `Name := module`              | module               |
//! | `Name(params) ... = body`     | function             |
//! | `Name : type = value`         | data                 |
//!
//! Specifiers such as `<experimental>` or `<localizes>` follow the name.
//! Nested lines are the definition's body.

use std::collections::HashMap;

use regex::Regex;

use crate::compiler::context::BuildContext;
use crate::compiler::diagnostics::{BuildStatistic, DiagnosticCode, Glitch, Locus, TextRange};
use crate::compiler::injection::{IntraSemanticHook, SemanticPhase};
use crate::compiler::pass::{PassLifecycle, SemanticAnalyzerPass};
use crate::program::semantic::{
    AstPackage, AstProject, Definition, DefinitionKind, LocalizableMessage, ProgramContext,
    StringLiteral,
};
use crate::program::vst;

#[derive(Debug, Clone)]
struct Patterns {
    using: Regex,
    var: Regex,
    type_def: Regex,
    function: Regex,
    data: Regex,
    specifier: Regex,
    string: Regex,
    ident: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Patterns {
            using: Regex::new(r"^using\s*\{\s*([^}\s]+)\s*\}$")?,
            var: Regex::new(r"^var\s+([A-Za-z_]\w*)((?:<\w+>)*)\s*:\s*(.*?)\s*(?:=\s*(.*))?$")?,
            type_def: Regex::new(
                r"^([A-Za-z_]\w*)((?:<\w+>)*)\s*:=\s*(class|interface|struct|enum|module)\b",
            )?,
            function: Regex::new(r"^([A-Za-z_]\w*)((?:<\w+>)*)\s*\(.*?\)[^=]*?(?:=\s*(.*))?$")?,
            data: Regex::new(r"^([A-Za-z_]\w*)((?:<\w+>)*)\s*:(.*)$")?,
            specifier: Regex::new(r"<(\w+)>")?,
            string: Regex::new(r#""((?:[^"\\]|\\.)*)""#)?,
            ident: Regex::new(r"[A-Za-z_]\w*")?,
        })
    }
}

/// A declaration line, classified.
struct Declared {
    name: String,
    kind: DefinitionKind,
    specifiers: Vec<String>,
    value: Option<String>,
}

/// A `using` line waiting for every package to be declared.
struct PendingUsing {
    package: usize,
    target: String,
    locus: Locus,
}

#[derive(Debug, Clone)]
pub struct OutlineAnalyzer {
    patterns: Patterns,
}

impl OutlineAnalyzer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(OutlineAnalyzer {
            patterns: Patterns::compile()?,
        })
    }

    fn classify(&self, text: &str) -> Option<Declared> {
        let p = &self.patterns;
        let specifiers = |m: Option<regex::Match<'_>>| -> Vec<String> {
            m.map(|m| {
                p.specifier
                    .captures_iter(m.as_str())
                    .map(|c| c[1].to_string())
                    .collect()
            })
            .unwrap_or_default()
        };
        let value = |m: Option<regex::Match<'_>>| {
            m.map(|m| m.as_str().trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(caps) = p.var.captures(text) {
            let kind = if caps[3].starts_with("weak_map") {
                DefinitionKind::PersistentWeakMap
            } else {
                DefinitionKind::PersistentVar
            };
            return Some(Declared {
                name: caps[1].to_string(),
                kind,
                specifiers: specifiers(caps.get(2)),
                value: value(caps.get(4)),
            });
        }
        if let Some(caps) = p.type_def.captures(text) {
            let kind = match &caps[3] {
                "class" | "interface" => DefinitionKind::Class,
                "module" => DefinitionKind::Module,
                _ => DefinitionKind::Data,
            };
            return Some(Declared {
                name: caps[1].to_string(),
                kind,
                specifiers: specifiers(caps.get(2)),
                value: None,
            });
        }
        if let Some(caps) = p.function.captures(text) {
            return Some(Declared {
                name: caps[1].to_string(),
                kind: DefinitionKind::Function,
                specifiers: specifiers(caps.get(2)),
                value: value(caps.get(3)),
            });
        }
        if let Some(caps) = p.data.captures(text) {
            let rest = caps.get(3).map_or("", |m| m.as_str());
            return Some(Declared {
                name: caps[1].to_string(),
                kind: DefinitionKind::Data,
                specifiers: specifiers(caps.get(2)),
                value: rest
                    .split_once('=')
                    .map(|(_, v)| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            });
        }
        None
    }

    fn strings_in(&self, text: &str, locus: &Locus) -> Vec<StringLiteral> {
        self.patterns
            .string
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let range = TextRange::on_row(
                    locus.range.begin_row,
                    locus.range.begin_column + text[..whole.start()].chars().count() as u32,
                    whole.as_str().chars().count() as u32,
                );
                Some(StringLiteral {
                    text: caps[1].to_string(),
                    locus: Locus::new(&locus.snippet_path, range),
                })
            })
            .collect()
    }

    /// Turn one top-level node into a definition of `package`.
    fn declare(
        &self,
        package: &mut AstPackage,
        package_index: usize,
        snippet: &vst::Snippet,
        node: &vst::Node,
        usings: &mut Vec<PendingUsing>,
        build_ctx: &mut BuildContext,
    ) {
        let locus = Locus::new(&snippet.path, node.range);
        if let Some(caps) = self.patterns.using.captures(&node.text) {
            usings.push(PendingUsing {
                package: package_index,
                target: caps[1].to_string(),
                locus,
            });
            return;
        }

        let Some(declared) = self.classify(&node.text) else {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::SemanticError,
                format!("unrecognized declaration `{}`", node.text),
                locus,
            ));
            return;
        };

        if let Some(existing) = package.find_definition(&declared.name) {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::DuplicateDefinition,
                format!("`{}` is already defined at {}", declared.name, existing.locus),
                locus,
            ));
            return;
        }

        let localizes = declared.specifiers.iter().any(|s| s == "localizes");
        let kind = if localizes {
            DefinitionKind::Data
        } else {
            declared.kind
        };
        let mut definition = Definition::new(&declared.name, kind, locus.clone());
        definition.experimental = declared.specifiers.iter().any(|s| s == "experimental");

        if localizes {
            let literal = self.strings_in(&node.text, &locus).into_iter().next();
            match literal {
                Some(literal) => definition.localizable.push(LocalizableMessage {
                    key: format!("{}/{}", package.verse_path.trim_end_matches('/'), declared.name),
                    default_text: literal.text,
                    locus: literal.locus,
                }),
                None => build_ctx.diagnostics.append_glitch(Glitch::with_message(
                    DiagnosticCode::SemanticError,
                    format!("localized message `{}` needs a string literal", declared.name),
                    locus.clone(),
                )),
            }
        } else {
            definition.strings = self.strings_in(&node.text, &locus);
        }

        if let Some(value) = declared.value {
            definition.body.push(value);
        }
        for child in &node.children {
            child.walk(&mut |line: &vst::Node| {
                let line_locus = Locus::new(&snippet.path, line.range);
                definition.body.push(line.text.clone());
                definition.strings.extend(self.strings_in(&line.text, &line_locus));
            });
        }

        let diagnostics = &mut build_ctx.diagnostics;
        diagnostics.increment(BuildStatistic::TopLevelDefinitions, 1);
        match kind {
            DefinitionKind::Function => diagnostics.increment(BuildStatistic::Functions, 1),
            DefinitionKind::Class => diagnostics.increment(BuildStatistic::Classes, 1),
            DefinitionKind::PersistentWeakMap => {
                diagnostics.increment(BuildStatistic::PersistentWeakMaps, 1)
            }
            _ => {}
        }
        package.definitions.push(definition);
    }

    /// Resolve `using` lines to packages and record the references.
    fn bind(
        &self,
        vst: &vst::Project,
        ast: &mut AstProject,
        usings: Vec<PendingUsing>,
        build_ctx: &mut BuildContext,
    ) {
        for using in usings {
            let Some(target) = vst
                .packages
                .iter()
                .find(|p| p.name == using.target || p.verse_path == using.target)
            else {
                build_ctx.diagnostics.append_glitch(Glitch::with_message(
                    DiagnosticCode::UnknownDependency,
                    format!("no package `{}` in this project", using.target),
                    using.locus,
                ));
                continue;
            };

            let package = &mut ast.packages[using.package];
            if target.name == package.name {
                continue;
            }
            if !package.dependency_packages.contains(&target.name) {
                build_ctx.diagnostics.append_glitch(Glitch::with_message(
                    DiagnosticCode::UnknownDependency,
                    format!(
                        "package `{}` uses `{}`, which is not one of its dependencies",
                        package.name, target.name
                    ),
                    using.locus,
                ));
            }
            if !package.referenced_packages.contains(&target.name) {
                package.referenced_packages.push(target.name.clone());
            }
        }
    }

    /// Count uses of experimental definitions inside source package bodies.
    fn check_bodies(&self, vst: &vst::Project, ast: &AstProject, build_ctx: &mut BuildContext) {
        let experimental: HashMap<&str, &str> = ast
            .definitions()
            .filter(|(_, definition)| definition.experimental)
            .map(|(package, definition)| (definition.name.as_str(), package.name.as_str()))
            .collect();
        if experimental.is_empty() {
            return;
        }

        for (index, package) in ast.packages.iter().enumerate() {
            if !package.role.is_source() {
                continue;
            }
            let allowed = vst.packages.get(index).is_some_and(|p| p.allow_experimental);
            for definition in &package.definitions {
                for line in &definition.body {
                    for ident in self.patterns.ident.find_iter(line) {
                        let name = ident.as_str();
                        let Some(owner) = experimental.get(name) else {
                            continue;
                        };
                        if name == definition.name {
                            continue;
                        }
                        build_ctx
                            .diagnostics
                            .increment(BuildStatistic::UsesOfExperimentalDefinitions, 1);
                        if !allowed {
                            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                                DiagnosticCode::ExperimentalDefinitionUse,
                                format!(
                                    "`{}` uses experimental definition `{}` from `{}`",
                                    definition.name, name, owner
                                ),
                                definition.locus.clone(),
                            ));
                        }
                    }
                }
            }
        }
    }
}

impl PassLifecycle for OutlineAnalyzer {}

impl SemanticAnalyzerPass for OutlineAnalyzer {
    fn process_vst(
        &mut self,
        vst: &vst::Project,
        hook: &IntraSemanticHook,
        build_ctx: &mut BuildContext,
        program_ctx: &mut ProgramContext,
    ) {
        let mut ast = AstProject::default();
        let mut usings = Vec::new();
        for (index, package) in vst.packages.iter().enumerate() {
            let mut ast_package = AstPackage {
                name: package.name.clone(),
                verse_path: package.verse_path.clone(),
                role: package.role,
                scope: package.scope,
                language_version: package.language_version,
                dependency_packages: package.dependency_packages.clone(),
                from_digest: package.from_digest,
                ..AstPackage::default()
            };
            for snippet in package.snippets_recursive() {
                for node in &snippet.nodes {
                    self.declare(&mut ast_package, index, snippet, node, &mut usings, build_ctx);
                }
            }
            ast.packages.push(ast_package);
        }
        program_ctx.program.set_ast(ast);
        if hook.fire(SemanticPhase::Declarations, program_ctx, build_ctx) {
            return;
        }

        if let Some(ast) = program_ctx.program.ast_mut() {
            self.bind(vst, ast, usings, build_ctx);
        }
        if hook.fire(SemanticPhase::Bindings, program_ctx, build_ctx) {
            return;
        }

        if let Some(ast) = program_ctx.program.ast() {
            self.check_bodies(vst, ast, build_ctx);
        }
        hook.fire(SemanticPhase::Bodies, program_ctx, build_ctx);
    }
}
