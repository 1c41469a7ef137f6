//! The toolchain: five stages composed from pluggable passes.
//!
//! Stages are parse, semantic analysis, localization extraction, IR
//! generation and assembly, followed by link. Every stage can also be run on
//! its own. Results are accumulated as [`CompilerResult`] flags and problems
//! are recorded on the build's [`Diagnostics`]; nothing here returns an
//! error across a stage boundary.
//!
//! [`Diagnostics`]: crate::compiler::diagnostics::Diagnostics

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::compiler::context::{BuildContext, BuildResults, LinkType};
use crate::compiler::diagnostics::{DiagnosticCode, Glitch, Locus};
use crate::compiler::digest::{DigestGenerator, GeneratedDigest};
use crate::compiler::injection::{run_injections, Injections, IntraSemanticHook};
use crate::compiler::localization::{
    DefinitionStringExtractor, ExtractedStrings, LocalizationExtractor,
};
use crate::compiler::pass::{
    AssemblerPass, IrGeneratorPass, ParserPass, PassSlot, PostIrFilter, PostSemanticFilter,
    PostVstFilter, SemanticAnalyzerPass, SnippetVersions,
};
use crate::compiler::result::CompilerResult;
use crate::core::module::SourceModule;
use crate::core::package::SourcePackage;
use crate::core::project::SourceProject;
use crate::core::snippet::SourceSnippet;
use crate::program::semantic::ProgramContext;
use crate::program::vst;
use crate::util::float_mode::FloatModeGuard;

/// Everything a toolchain is built from.
pub struct ToolchainParams {
    parser: Option<Box<dyn ParserPass>>,
    analyzer: Option<Box<dyn SemanticAnalyzerPass>>,
    ir_generator: Option<Box<dyn IrGeneratorPass>>,
    assembler: Option<Box<dyn AssemblerPass>>,
    post_vst_filters: Vec<Arc<dyn PostVstFilter>>,
    post_semantic_filters: Vec<Arc<dyn PostSemanticFilter>>,
    post_ir_filters: Vec<Arc<dyn PostIrFilter>>,
    localization: Box<dyn LocalizationExtractor>,
    digest_generator: Option<Box<dyn DigestGenerator>>,
    injections: Injections,
}

impl Default for ToolchainParams {
    fn default() -> Self {
        ToolchainParams {
            parser: None,
            analyzer: None,
            ir_generator: None,
            assembler: None,
            post_vst_filters: Vec::new(),
            post_semantic_filters: Vec::new(),
            post_ir_filters: Vec::new(),
            localization: Box::new(DefinitionStringExtractor),
            digest_generator: None,
            injections: Injections::default(),
        }
    }
}

impl ToolchainParams {
    pub fn new() -> Self {
        ToolchainParams::default()
    }

    pub fn with_parser(mut self, parser: impl ParserPass + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    pub fn with_semantic_analyzer(mut self, analyzer: impl SemanticAnalyzerPass + 'static) -> Self {
        self.analyzer = Some(Box::new(analyzer));
        self
    }

    pub fn with_ir_generator(mut self, generator: impl IrGeneratorPass + 'static) -> Self {
        self.ir_generator = Some(Box::new(generator));
        self
    }

    pub fn with_assembler(mut self, assembler: impl AssemblerPass + 'static) -> Self {
        self.assembler = Some(Box::new(assembler));
        self
    }

    pub fn with_post_vst_filter(mut self, filter: impl PostVstFilter + 'static) -> Self {
        self.post_vst_filters.push(Arc::new(filter));
        self
    }

    pub fn with_post_semantic_filter(mut self, filter: impl PostSemanticFilter + 'static) -> Self {
        self.post_semantic_filters.push(Arc::new(filter));
        self
    }

    pub fn with_post_ir_filter(mut self, filter: impl PostIrFilter + 'static) -> Self {
        self.post_ir_filters.push(Arc::new(filter));
        self
    }

    pub fn with_localization_extractor(
        mut self,
        extractor: impl LocalizationExtractor + 'static,
    ) -> Self {
        self.localization = Box::new(extractor);
        self
    }

    pub fn with_digest_generator(mut self, generator: impl DigestGenerator + 'static) -> Self {
        self.digest_generator = Some(Box::new(generator));
        self
    }

    /// Toolchain-level injections. These run before any build's own.
    pub fn with_injections(mut self, injections: Injections) -> Self {
        self.injections = injections;
        self
    }
}

pub struct Toolchain {
    parser: PassSlot<dyn ParserPass>,
    analyzer: PassSlot<dyn SemanticAnalyzerPass>,
    ir_generator: PassSlot<dyn IrGeneratorPass>,
    assembler: PassSlot<dyn AssemblerPass>,
    post_vst_filters: Vec<Arc<dyn PostVstFilter>>,
    post_semantic_filters: Vec<Arc<dyn PostSemanticFilter>>,
    post_ir_filters: Vec<Arc<dyn PostIrFilter>>,
    localization: Box<dyn LocalizationExtractor>,
    digest_generator: Option<Box<dyn DigestGenerator>>,
    injections: Injections,
    /// Syntax tree of the most recent `build_project`.
    project_vst: Option<vst::Project>,
}

impl fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolchain")
            .field("parser", &!self.parser.is_empty())
            .field("analyzer", &!self.analyzer.is_empty())
            .field("ir_generator", &!self.ir_generator.is_empty())
            .field("assembler", &!self.assembler.is_empty())
            .field("post_vst_filters", &self.post_vst_filters.len())
            .field("post_semantic_filters", &self.post_semantic_filters.len())
            .field("post_ir_filters", &self.post_ir_filters.len())
            .field("injections", &self.injections)
            .finish()
    }
}

impl Toolchain {
    pub fn new(params: ToolchainParams) -> Self {
        Toolchain {
            parser: PassSlot::new(params.parser),
            analyzer: PassSlot::new(params.analyzer),
            ir_generator: PassSlot::new(params.ir_generator),
            assembler: PassSlot::new(params.assembler),
            post_vst_filters: params.post_vst_filters,
            post_semantic_filters: params.post_semantic_filters,
            post_ir_filters: params.post_ir_filters,
            localization: params.localization,
            digest_generator: params.digest_generator,
            injections: params.injections,
            project_vst: None,
        }
    }

    /// Syntax tree produced by the last [`Toolchain::build_project`].
    pub fn project_vst(&self) -> Option<&vst::Project> {
        self.project_vst.as_ref()
    }

    pub fn take_project_vst(&mut self) -> Option<vst::Project> {
        self.project_vst.take()
    }

    /// Build a whole project: parse every package, then compile and link.
    ///
    /// Compilation only starts if no snippet failed or was skipped.
    pub fn build_project(
        &mut self,
        project: &SourceProject,
        build_ctx: &mut BuildContext,
        program_ctx: &mut ProgramContext,
    ) -> BuildResults {
        let _float_mode = FloatModeGuard::deterministic();
        tracing::info!(
            "Building project {} ({} packages)",
            project.name(),
            project.packages().len()
        );

        let mut results = BuildResults::default();
        let mut project_vst = vst::Project::new(project.name());
        let mut parse_result = CompilerResult::NO_BUILD;

        for package in project.packages() {
            let (package_vst, result) =
                self.parse_package(package, build_ctx, program_ctx, &mut results.io_errors_found);
            parse_result |= result;
            project_vst.packages.push(package_vst);
        }
        results.compiler_result = parse_result;
        tracing::debug!("Parse finished: {}", parse_result);

        let parse_failed = parse_result
            .intersects(CompilerResult::ERROR_MASK | CompilerResult::SKIPPED_MASK);
        if !parse_failed {
            let compiled = self.compile_vst(&mut project_vst, build_ctx, program_ctx);
            results.compiler_result |= compiled.compiler_result;
            results.localization = compiled.localization;
            results.strings = compiled.strings;
            results.digests = compiled.digests;

            if !results.compiler_result.is_aborted() {
                results.linker_result = if build_ctx.params.wants_link() {
                    self.link(build_ctx, program_ctx)
                } else {
                    CompilerResult::LINK_SKIPPED
                };
            }
        }

        self.project_vst = Some(project_vst);
        results.statistics = *build_ctx.diagnostics.statistics();
        results.package_usage = build_ctx.package_usage.clone();

        tracing::info!(
            "Build finished: compiler {}, linker {}",
            results.compiler_result,
            results.linker_result
        );
        results
    }

    fn parse_package(
        &mut self,
        package: &SourcePackage,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
        io_errors_found: &mut bool,
    ) -> (vst::Package, CompilerResult) {
        let settings = package.settings();
        let uploaded_at_version = build_ctx.params.effective_uploaded_at_version(settings);
        let mut package_vst = vst::Package {
            name: package.name().to_string(),
            verse_path: settings.verse_path.clone(),
            role: settings.role,
            scope: settings.scope,
            language_version: build_ctx.params.effective_language_version(settings),
            uploaded_at_version,
            dependency_packages: settings.dependency_packages.clone(),
            treat_modules_as_implicit: settings.treat_modules_as_implicit,
            allow_experimental: settings.allow_experimental,
            ..vst::Package::default()
        };

        if let Some(digest) = package.digest_substitute() {
            tracing::debug!(
                "Using digest for package {} (language version {})",
                package.name(),
                digest.effective_language_version
            );
            build_ctx.diagnostics.append_glitch(Glitch::new(
                DiagnosticCode::DigestSubstituted,
                Locus::snippet(digest.snippet.path()),
            ));
            package_vst.from_digest = true;
            package_vst.language_version = digest.effective_language_version;
            if !digest.dependency_packages.is_empty() {
                package_vst.dependency_packages = digest.dependency_packages.clone();
            }
            let versions = SnippetVersions {
                language_version: digest.effective_language_version,
                uploaded_at_version,
            };
            let (snippet, result) = self.parse_isolated(
                digest.snippet.as_ref(),
                versions,
                build_ctx,
                program_ctx,
                io_errors_found,
            );
            package_vst.snippets.push(snippet);
            return (package_vst, result);
        }

        tracing::debug!("Parsing package {}", package.name());
        let versions = SnippetVersions {
            language_version: package_vst.language_version,
            uploaded_at_version,
        };
        let root = if build_ctx.params.ordering.sorts(uploaded_at_version) {
            let mut sorted = package.root_module().clone();
            sorted.sort_lexicographically();
            Cow::Owned(sorted)
        } else {
            Cow::Borrowed(package.root_module())
        };

        let mut result = CompilerResult::NO_BUILD;
        for snippet in root.snippets() {
            let (snippet_vst, snippet_result) = self.parse_isolated(
                snippet.as_ref(),
                versions,
                build_ctx,
                program_ctx,
                io_errors_found,
            );
            result |= snippet_result;
            package_vst.snippets.push(snippet_vst);
        }
        for module in root.submodules() {
            let (module_vst, module_result) =
                self.parse_module(module, versions, build_ctx, program_ctx, io_errors_found);
            result |= module_result;
            package_vst.modules.push(module_vst);
        }
        (package_vst, result)
    }

    fn parse_module(
        &mut self,
        module: &SourceModule,
        versions: SnippetVersions,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
        io_errors_found: &mut bool,
    ) -> (vst::Module, CompilerResult) {
        let mut module_vst = vst::Module::new(module.name());
        let mut result = CompilerResult::NO_BUILD;
        for snippet in module.snippets() {
            let (snippet_vst, snippet_result) = self.parse_isolated(
                snippet.as_ref(),
                versions,
                build_ctx,
                program_ctx,
                io_errors_found,
            );
            result |= snippet_result;
            module_vst.snippets.push(snippet_vst);
        }
        for submodule in module.submodules() {
            let (submodule_vst, submodule_result) =
                self.parse_module(submodule, versions, build_ctx, program_ctx, io_errors_found);
            result |= submodule_result;
            module_vst.modules.push(submodule_vst);
        }
        (module_vst, result)
    }

    /// Parse one snippet against a scratch diagnostics sink, then merge the
    /// scratch sink back into the build's.
    fn parse_isolated(
        &mut self,
        snippet: &dyn SourceSnippet,
        versions: SnippetVersions,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
        io_errors_found: &mut bool,
    ) -> (vst::Snippet, CompilerResult) {
        let outer = std::mem::take(&mut build_ctx.diagnostics);
        let mut out = vst::Snippet::new(snippet.path());
        let result = self.parse_source_snippet(&mut out, snippet, versions, build_ctx, program_ctx);
        let scratch = std::mem::replace(&mut build_ctx.diagnostics, outer);

        if scratch
            .glitches()
            .iter()
            .any(|glitch| glitch.code == DiagnosticCode::UnreadableSnippet)
        {
            *io_errors_found = true;
        }
        build_ctx.diagnostics.append(scratch);
        (out, result)
    }

    /// Parse a source snippet, whatever it resolves to.
    ///
    /// A pre-built syntax tree is adopted as is. A snippet with neither text
    /// nor tree records an unreadable-snippet glitch and fails.
    pub fn parse_source_snippet(
        &mut self,
        out: &mut vst::Snippet,
        snippet: &dyn SourceSnippet,
        versions: SnippetVersions,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
    ) -> CompilerResult {
        let _float_mode = FloatModeGuard::deterministic();
        if let Some(tree) = snippet.vst() {
            tracing::trace!("Adopting pre-built syntax tree for {}", snippet.path());
            *out = tree;
            out.path = snippet.path().to_string();
            return CompilerResult::RAN_SYNTAX_PASS;
        }
        match snippet.text() {
            Some(text) => self.parse_snippet(out, &text, versions, build_ctx, program_ctx),
            None => {
                out.clear();
                build_ctx.diagnostics.append_glitch(Glitch::new(
                    DiagnosticCode::UnreadableSnippet,
                    Locus::snippet(snippet.path()),
                ));
                CompilerResult::SYNTAX_ERROR
            }
        }
    }

    /// Parse `text` into `out`. `out.path` names the snippet.
    pub fn parse_snippet(
        &mut self,
        out: &mut vst::Snippet,
        text: &str,
        versions: SnippetVersions,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
    ) -> CompilerResult {
        let _float_mode = FloatModeGuard::deterministic();
        out.clear();

        let halted = run_injections(
            "pre-parse",
            &self.injections.pre_parse,
            &build_ctx.injections.pre_parse,
            |injection| injection.pre_parse(&out.path, text, build_ctx),
        );
        if halted {
            return CompilerResult::SKIPPED_BY_INJECTION;
        }

        let Some(parser) = self.parser.initialize(build_ctx, program_ctx) else {
            return CompilerResult::SKIPPED_BY_EMPTY_PASS;
        };
        let errors_before = build_ctx.diagnostics.error_count();
        parser.process_snippet(out, text, versions, build_ctx);
        self.parser.clean_up();

        if build_ctx.diagnostics.error_count() > errors_before {
            tracing::debug!("Syntax errors in {}", out.path);
            CompilerResult::SYNTAX_ERROR
        } else {
            CompilerResult::RAN_SYNTAX_PASS
        }
    }

    /// Compile a parsed project: semantic analysis, localization, IR and
    /// assembly. Link is not part of this.
    pub fn compile_vst(
        &mut self,
        project_vst: &mut vst::Project,
        build_ctx: &mut BuildContext,
        program_ctx: &mut ProgramContext,
    ) -> BuildResults {
        let _float_mode = FloatModeGuard::deterministic();
        let mut results = BuildResults::default();

        let halted = run_injections(
            "post-parse",
            &self.injections.post_parse,
            &build_ctx.injections.post_parse,
            |injection| injection.post_parse(project_vst, build_ctx),
        );
        if halted {
            results.compiler_result = CompilerResult::SKIPPED_BY_INJECTION;
            return results;
        }
        let errors_before = build_ctx.diagnostics.error_count();
        for filter in &self.post_vst_filters {
            filter.filter(project_vst, build_ctx);
        }
        if build_ctx.diagnostics.error_count() > errors_before {
            tracing::debug!("Post-parse filters reported errors");
            results.compiler_result = CompilerResult::SYNTAX_ERROR;
            return results;
        }

        let mut result = self.semantic_analyze_vst(project_vst, build_ctx, program_ctx);
        results.compiler_result = result;
        if result.is_aborted() {
            return results;
        }

        if build_ctx.params.generate_digests {
            results.digests = self.generate_digests(build_ctx, program_ctx);
        }
        if build_ctx.params.semantic_analysis_only {
            return results;
        }

        let (localization_result, extracted) = self.extract_localization(build_ctx, program_ctx);
        result |= localization_result;
        results.localization = extracted.localization;
        results.strings = extracted.strings;
        results.compiler_result = result;
        if result.is_aborted() {
            return results;
        }

        result |= self.ir_generate_program(build_ctx, program_ctx);
        results.compiler_result = result;
        if result.is_aborted() || !build_ctx.params.generate_code {
            return results;
        }

        result |= self.assemble_program(build_ctx, program_ctx);
        results.compiler_result = result;
        results
    }

    pub fn semantic_analyze_vst(
        &mut self,
        project_vst: &vst::Project,
        build_ctx: &mut BuildContext,
        program_ctx: &mut ProgramContext,
    ) -> CompilerResult {
        let _float_mode = FloatModeGuard::deterministic();

        let halted = run_injections(
            "pre-semantic",
            &self.injections.pre_semantic,
            &build_ctx.injections.pre_semantic,
            |injection| injection.pre_semantic(project_vst, build_ctx),
        );
        if halted {
            return CompilerResult::SKIPPED_BY_INJECTION;
        }

        let hook = IntraSemanticHook::new(
            self.injections.intra_semantic.clone(),
            build_ctx.injections.intra_semantic.clone(),
        );
        let Some(analyzer) = self.analyzer.initialize(build_ctx, program_ctx) else {
            return CompilerResult::SKIPPED_BY_EMPTY_PASS;
        };
        let errors_before = build_ctx.diagnostics.error_count();
        analyzer.process_vst(project_vst, &hook, build_ctx, program_ctx);
        self.analyzer.clean_up();

        if hook.halted() {
            // Errors recorded before the halt still fail the stage.
            if build_ctx.diagnostics.error_count() > errors_before {
                return CompilerResult::SKIPPED_BY_INJECTION | CompilerResult::SEMANTIC_ERROR;
            }
            return CompilerResult::SKIPPED_BY_INJECTION;
        }

        self.check_persistent_vars(build_ctx, program_ctx);
        record_package_usage(build_ctx, program_ctx);

        if build_ctx.diagnostics.error_count() > errors_before {
            tracing::debug!("Semantic analysis reported errors");
            return CompilerResult::SEMANTIC_ERROR;
        }

        for filter in &self.post_semantic_filters {
            filter.filter(program_ctx, build_ctx);
        }
        if build_ctx.diagnostics.error_count() > errors_before {
            tracing::debug!("Post-semantic filters reported errors");
            return CompilerResult::SEMANTIC_ERROR;
        }

        let halted = run_injections(
            "post-semantic",
            &self.injections.post_semantic,
            &build_ctx.injections.post_semantic,
            |injection| injection.post_semantic(&program_ctx.program, build_ctx),
        );
        if halted {
            return CompilerResult::RAN_SEMANTIC_PASS | CompilerResult::SKIPPED_BY_INJECTION;
        }
        CompilerResult::RAN_SEMANTIC_PASS
    }

    fn check_persistent_vars(&self, build_ctx: &mut BuildContext, program_ctx: &ProgramContext) {
        let Some(max) = build_ctx.params.max_num_persistent_vars else {
            return;
        };
        let count = program_ctx.program.persistent_var_count();
        if count > max as usize {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::TooManyPersistentVars,
                format!(
                    "program defines {} persistent variables; at most {} are allowed",
                    count, max
                ),
                Locus::build(),
            ));
        }
    }

    fn generate_digests(
        &self,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
    ) -> Vec<GeneratedDigest> {
        let (Some(generator), Some(ast)) = (&self.digest_generator, program_ctx.program.ast())
        else {
            return Vec::new();
        };
        ast.packages
            .iter()
            .filter(|package| package.role.is_source())
            .filter_map(|package| {
                let text = generator.generate(package, &mut build_ctx.diagnostics)?;
                Some(GeneratedDigest {
                    package: package.name.clone(),
                    language_version: package.language_version,
                    text,
                })
            })
            .collect()
    }

    pub fn extract_localization(
        &self,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
    ) -> (CompilerResult, ExtractedStrings) {
        let _float_mode = FloatModeGuard::deterministic();
        let Some(ast) = program_ctx.program.ast() else {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::LocalizationError,
                "no semantic program to extract strings from",
                Locus::build(),
            ));
            return (CompilerResult::LOCALIZATION_ERROR, ExtractedStrings::default());
        };

        let errors_before = build_ctx.diagnostics.error_count();
        let extracted = self.localization.extract(ast, &mut build_ctx.diagnostics);
        if build_ctx.diagnostics.error_count() > errors_before {
            (CompilerResult::LOCALIZATION_ERROR, extracted)
        } else {
            (CompilerResult::RAN_LOCALIZATION_PASS, extracted)
        }
    }

    pub fn ir_generate_program(
        &mut self,
        build_ctx: &mut BuildContext,
        program_ctx: &mut ProgramContext,
    ) -> CompilerResult {
        let _float_mode = FloatModeGuard::deterministic();
        if program_ctx.program.ast().is_none() {
            build_ctx.diagnostics.append_glitch(Glitch::with_message(
                DiagnosticCode::IrError,
                "no semantic program to generate IR from",
                Locus::build(),
            ));
            return CompilerResult::IR_ERROR;
        }

        let Some(generator) = self.ir_generator.initialize(build_ctx, program_ctx) else {
            return CompilerResult::SKIPPED_BY_EMPTY_PASS;
        };
        let errors_before = build_ctx.diagnostics.error_count();
        generator.process_program(&mut program_ctx.program, build_ctx);
        self.ir_generator.clean_up();

        if build_ctx.diagnostics.error_count() > errors_before {
            return CompilerResult::IR_ERROR;
        }
        for filter in &self.post_ir_filters {
            filter.filter(&mut program_ctx.program, build_ctx);
        }
        if build_ctx.diagnostics.error_count() > errors_before {
            tracing::debug!("Post-IR filters reported errors");
            return CompilerResult::IR_ERROR;
        }
        CompilerResult::RAN_IR_PASS
    }

    pub fn assemble_program(
        &mut self,
        build_ctx: &mut BuildContext,
        program_ctx: &ProgramContext,
    ) -> CompilerResult {
        let _float_mode = FloatModeGuard::deterministic();

        let halted = run_injections(
            "pre-translate",
            &self.injections.pre_translate,
            &build_ctx.injections.pre_translate,
            |injection| injection.pre_translate(&program_ctx.program, build_ctx),
        );
        if halted {
            return CompilerResult::SKIPPED_BY_INJECTION;
        }

        let Some(assembler) = self.assembler.initialize(build_ctx, program_ctx) else {
            return CompilerResult::SKIPPED_BY_EMPTY_PASS;
        };
        let errors_before = build_ctx.diagnostics.error_count();
        assembler.process_program(&program_ctx.program, build_ctx);
        self.assembler.clean_up();

        if build_ctx.diagnostics.error_count() > errors_before {
            CompilerResult::CODE_GEN_ERROR
        } else {
            CompilerResult::RAN_CODE_GEN_PASS
        }
    }

    /// Link the assembled program. Returns one of the `LINK_*` flags.
    pub fn link(&mut self, build_ctx: &mut BuildContext, program_ctx: &ProgramContext) -> CompilerResult {
        let _float_mode = FloatModeGuard::deterministic();
        if build_ctx.params.link_type == LinkType::Skip {
            return CompilerResult::LINK_SKIPPED;
        }

        let halted = run_injections(
            "pre-link",
            &self.injections.pre_link,
            &build_ctx.injections.pre_link,
            |injection| injection.pre_link(&program_ctx.program, build_ctx),
        );
        if halted {
            return CompilerResult::LINK_SKIPPED_BY_INJECTION;
        }

        let Some(assembler) = self.assembler.initialize(build_ctx, program_ctx) else {
            return CompilerResult::LINK_SKIPPED_BY_EMPTY_PASS;
        };
        let errors_before = build_ctx.diagnostics.error_count();
        assembler.link(&program_ctx.program, build_ctx);
        self.assembler.clean_up();

        if build_ctx.diagnostics.error_count() > errors_before {
            CompilerResult::LINK_FAILURE
        } else {
            CompilerResult::LINK_SUCCESS
        }
    }
}

fn record_package_usage(build_ctx: &mut BuildContext, program_ctx: &ProgramContext) {
    let (Some(usage), Some(ast)) = (build_ctx.package_usage.as_mut(), program_ctx.program.ast())
    else {
        return;
    };
    for package in &ast.packages {
        for referenced in &package.referenced_packages {
            usage.record(&package.name, referenced);
        }
    }
}
