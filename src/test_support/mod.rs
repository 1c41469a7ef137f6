//! Test utilities and mocks for Quay unit tests.
//!
//! The recording passes write one line per call into a shared [`CallLog`],
//! so tests can assert on which stages ran and in what order.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::{recording_toolchain, CallLog};
//!
//! #[test]
//! fn test_example() {
//!     let log = CallLog::default();
//!     let mut toolchain = recording_toolchain(&log, ToolchainParams::new());
//!     // Build, then inspect log.entries()...
//! }
//! ```

pub mod fixtures;

use std::sync::{Arc, Mutex};

use crate::compiler::context::BuildContext;
use crate::compiler::diagnostics::{
    BuildStatistic, BuildStatisticEvent, DiagnosticCode, DiagnosticsObserver, Glitch, Locus,
    TextRange,
};
use crate::compiler::injection::{IntraSemanticHook, PreParseInjection, SemanticPhase};
use crate::compiler::pass::{
    AssemblerPass, IrGeneratorPass, ParserPass, PassLifecycle, SemanticAnalyzerPass,
    SnippetVersions,
};
use crate::compiler::toolchain::{Toolchain, ToolchainParams};
use crate::program::ir::{IrProgram, IrUnit};
use crate::program::semantic::{
    AstPackage, AstProject, Definition, DefinitionKind, ProgramContext, SemanticProgram,
};
use crate::program::vst;

// Re-export fixtures for convenience
pub use fixtures::*;

/// Shared, ordered record of pass and injection calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Parser producing one `line` node per non-empty line.
///
/// Any text containing `error` also gets a syntax error.
pub struct RecordingParser {
    log: CallLog,
}

impl RecordingParser {
    pub fn new(log: CallLog) -> Self {
        RecordingParser { log }
    }
}

impl PassLifecycle for RecordingParser {}

impl ParserPass for RecordingParser {
    fn process_snippet(
        &mut self,
        out: &mut vst::Snippet,
        text: &str,
        versions: SnippetVersions,
        build_ctx: &mut BuildContext,
    ) {
        self.log
            .push(format!("parse:{}@{}", out.path, versions.language_version));
        for (row, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            out.nodes.push(vst::Node::new(
                "line",
                line,
                TextRange::on_row(row as u32, 0, line.len() as u32),
            ));
        }
        if text.contains("error") {
            build_ctx
                .diagnostics
                .append_glitch(Glitch::new(DiagnosticCode::SyntaxError, Locus::snippet(&out.path)));
        }
    }
}

/// Analyzer turning every syntax node into a top-level definition.
///
/// Nodes mentioning `persistent` become persistent variables; the rest
/// become functions.
pub struct RecordingAnalyzer {
    log: CallLog,
}

impl RecordingAnalyzer {
    pub fn new(log: CallLog) -> Self {
        RecordingAnalyzer { log }
    }
}

impl PassLifecycle for RecordingAnalyzer {}

impl SemanticAnalyzerPass for RecordingAnalyzer {
    fn process_vst(
        &mut self,
        vst: &vst::Project,
        hook: &IntraSemanticHook,
        build_ctx: &mut BuildContext,
        program_ctx: &mut ProgramContext,
    ) {
        let mut ast = AstProject::default();
        let mut count = 0;
        for package in &vst.packages {
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
                    let kind = if node.text.contains("persistent") {
                        DefinitionKind::PersistentVar
                    } else {
                        DefinitionKind::Function
                    };
                    ast_package.definitions.push(Definition::new(
                        node.text.clone(),
                        kind,
                        Locus::new(&snippet.path, node.range),
                    ));
                    build_ctx.diagnostics.increment(BuildStatistic::TopLevelDefinitions, 1);
                    if kind == DefinitionKind::Function {
                        build_ctx.diagnostics.increment(BuildStatistic::Functions, 1);
                    }
                    count += 1;
                }
            }
            ast.packages.push(ast_package);
        }

        program_ctx.program.set_ast(ast);
        if hook.fire(SemanticPhase::Declarations, program_ctx, build_ctx) {
            self.log.push("analyze:halted");
            return;
        }
        self.log.push(format!("analyze:{}", count));
    }
}

/// IR generator lowering each definition to one unit.
pub struct RecordingIrGenerator {
    log: CallLog,
}

impl RecordingIrGenerator {
    pub fn new(log: CallLog) -> Self {
        RecordingIrGenerator { log }
    }
}

impl PassLifecycle for RecordingIrGenerator {}

impl IrGeneratorPass for RecordingIrGenerator {
    fn process_program(&mut self, program: &mut SemanticProgram, build_ctx: &mut BuildContext) {
        self.log.push("ir");
        let mut ir = IrProgram::new(build_ctx.params.target);
        if let Some(ast) = program.ast() {
            for (package, definition) in ast.definitions() {
                ir.units.push(IrUnit {
                    package: package.name.clone(),
                    name: definition.name.clone(),
                    kind: definition.kind,
                    locus: definition.locus.clone(),
                    body: definition.body.clone(),
                });
            }
        }
        program.set_ir(ir);
    }
}

/// Assembler that only records its calls.
///
/// With `failing_link`, link reports an error.
pub struct RecordingAssembler {
    log: CallLog,
    failing_link: bool,
}

impl RecordingAssembler {
    pub fn new(log: CallLog) -> Self {
        RecordingAssembler {
            log,
            failing_link: false,
        }
    }

    pub fn failing_link(mut self) -> Self {
        self.failing_link = true;
        self
    }
}

impl PassLifecycle for RecordingAssembler {}

impl AssemblerPass for RecordingAssembler {
    fn process_program(&mut self, _program: &SemanticProgram, _build_ctx: &mut BuildContext) {
        self.log.push("assemble");
    }

    fn link(&mut self, _program: &SemanticProgram, build_ctx: &mut BuildContext) {
        self.log.push("link");
        if self.failing_link {
            build_ctx
                .diagnostics
                .append_glitch(Glitch::new(DiagnosticCode::LinkError, Locus::build()));
        }
    }
}

/// Pre-parse injection that records the snippet and halts.
pub struct HaltingPreParse {
    log: CallLog,
}

impl HaltingPreParse {
    pub fn new(log: CallLog) -> Self {
        HaltingPreParse { log }
    }
}

impl PreParseInjection for HaltingPreParse {
    fn pre_parse(&self, snippet_path: &str, _text: &str, _build_ctx: &BuildContext) -> bool {
        self.log.push(format!("pre-parse:{}", snippet_path));
        true
    }
}

/// A toolchain with all four recording passes on top of `params`.
pub fn recording_toolchain(log: &CallLog, params: ToolchainParams) -> Toolchain {
    Toolchain::new(
        params
            .with_parser(RecordingParser::new(log.clone()))
            .with_semantic_analyzer(RecordingAnalyzer::new(log.clone()))
            .with_ir_generator(RecordingIrGenerator::new(log.clone()))
            .with_assembler(RecordingAssembler::new(log.clone())),
    )
}

/// Observer keeping every event it sees.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    glitches: Mutex<Vec<Glitch>>,
    statistics: Mutex<Vec<BuildStatisticEvent>>,
}

impl RecordingObserver {
    pub fn glitch_paths(&self) -> Vec<String> {
        self.glitches
            .lock()
            .unwrap()
            .iter()
            .map(|glitch| glitch.locus.snippet_path.clone())
            .collect()
    }

    pub fn statistic_events(&self) -> Vec<BuildStatisticEvent> {
        self.statistics.lock().unwrap().clone()
    }
}

impl DiagnosticsObserver for RecordingObserver {
    fn on_glitch(&self, glitch: &Glitch) {
        self.glitches.lock().unwrap().push(glitch.clone());
    }

    fn on_statistic(&self, event: &BuildStatisticEvent) {
        self.statistics.lock().unwrap().push(*event);
    }
}
