//! Program build manager: a held project, program and toolchain for
//! edit-rebuild loops.

use std::sync::Arc;

use crate::compiler::context::{BuildContext, BuildParams, BuildResults, PackageUsage};
use crate::compiler::diagnostics::Diagnostics;
use crate::compiler::injection::Injections;
use crate::compiler::toolchain::Toolchain;
use crate::core::package::SourcePackage;
use crate::core::project::{ProjectError, SourceProject};
use crate::core::snippet::SourceSnippet;
use crate::program::semantic::ProgramContext;

/// Owns one source project, one program context and a bound toolchain.
///
/// Snippets and packages can be changed between builds without
/// re-registering any pass.
#[derive(Debug)]
pub struct ProgramBuildManager {
    project: SourceProject,
    program_ctx: ProgramContext,
    toolchain: Toolchain,
}

impl ProgramBuildManager {
    pub fn new(project_name: impl Into<String>, toolchain: Toolchain) -> Self {
        Self::with_project(SourceProject::new(project_name), toolchain)
    }

    /// Manage an already loaded project.
    pub fn with_project(project: SourceProject, toolchain: Toolchain) -> Self {
        ProgramBuildManager {
            project,
            program_ctx: ProgramContext::new(),
            toolchain,
        }
    }

    pub fn project(&self) -> &SourceProject {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut SourceProject {
        &mut self.project
    }

    pub fn program_context(&self) -> &ProgramContext {
        &self.program_ctx
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Build the held project from a clean semantic program.
    ///
    /// Glitches and statistics land in `diagnostics`, whose observers see
    /// every event as it happens.
    pub fn build(&mut self, params: BuildParams, diagnostics: &mut Diagnostics) -> BuildResults {
        self.build_with_injections(params, Injections::default(), diagnostics)
    }

    /// Like [`ProgramBuildManager::build`], with build-level injections.
    pub fn build_with_injections(
        &mut self,
        params: BuildParams,
        injections: Injections,
        diagnostics: &mut Diagnostics,
    ) -> BuildResults {
        let track_usage = params.track_package_usage;
        let mut build_ctx = BuildContext::new(params)
            .with_diagnostics(std::mem::take(diagnostics))
            .with_injections(injections);
        if track_usage {
            build_ctx = build_ctx.with_package_usage(PackageUsage::for_project(&self.project));
        }

        self.reset_semantic_program();
        let results = self
            .toolchain
            .build_project(&self.project, &mut build_ctx, &mut self.program_ctx);

        *diagnostics = build_ctx.diagnostics;
        results
    }

    /// Add `snippet` to the module at `module_path` (`/`-separated, empty
    /// for the root module) of package `package_name`.
    pub fn add_source_snippet(
        &mut self,
        package_name: &str,
        module_path: &str,
        snippet: Arc<dyn SourceSnippet>,
    ) -> Result<(), ProjectError> {
        let package = self
            .project
            .find_package_mut(package_name)
            .ok_or_else(|| ProjectError::PackageNotFound(package_name.to_string()))?;
        tracing::debug!("Adding snippet {} to package {}", snippet.path(), package_name);
        package
            .root_module_mut()
            .find_or_add_module_path(module_path)
            .add_snippet(snippet);
        Ok(())
    }

    /// Remove the snippet with path `path`, wherever it lives.
    pub fn remove_source_snippet(&mut self, path: &str) -> Option<Arc<dyn SourceSnippet>> {
        let removed = self.project.remove_snippet(path);
        if removed.is_some() {
            tracing::debug!("Removed snippet {}", path);
        }
        removed
    }

    pub fn find_or_add_source_package(&mut self, name: &str, verse_path: &str) -> &mut SourcePackage {
        self.project.find_or_add_package(name, verse_path)
    }

    /// Drop everything the previous build analyzed.
    pub fn reset_semantic_program(&mut self) {
        self.program_ctx.reset_semantic_program();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::context::LinkType;
    use crate::compiler::result::CompilerResult;
    use crate::compiler::toolchain::ToolchainParams;
    use crate::core::snippet::TextSnippet;
    use crate::test_support::{recording_toolchain, CallLog, ProjectFixture};

    fn manager(log: &CallLog) -> ProgramBuildManager {
        let mut manager =
            ProgramBuildManager::new("demo", recording_toolchain(log, ToolchainParams::new()));
        manager.find_or_add_source_package("app", "/demo/app");
        manager
    }

    #[test]
    fn test_add_then_build() {
        let log = CallLog::default();
        let mut manager = manager(&log);
        manager
            .add_source_snippet("app", "", Arc::new(TextSnippet::new("app/a.verse", "a")))
            .unwrap();

        let mut diagnostics = Diagnostics::new();
        let results = manager.build(BuildParams::default(), &mut diagnostics);

        assert_eq!(
            results.compiler_result,
            CompilerResult::RAN_SYNTAX_PASS
                | CompilerResult::RAN_SEMANTIC_PASS
                | CompilerResult::RAN_LOCALIZATION_PASS
                | CompilerResult::RAN_IR_PASS
                | CompilerResult::RAN_CODE_GEN_PASS
        );
        assert_eq!(results.linker_result, CompilerResult::LINK_SUCCESS);
        assert!(diagnostics.is_empty());
        assert!(manager.program_context().program.ast().is_some());
    }

    #[test]
    fn test_add_snippet_to_unknown_package() {
        let log = CallLog::default();
        let mut manager = manager(&log);
        let err = manager
            .add_source_snippet("nope", "", Arc::new(TextSnippet::new("x", "")))
            .unwrap_err();
        assert_eq!(err, ProjectError::PackageNotFound("nope".to_string()));
    }

    #[test]
    fn test_remove_snippet_between_builds() {
        let log = CallLog::default();
        let mut manager = manager(&log);
        manager
            .add_source_snippet("app", "ui", Arc::new(TextSnippet::new("app/ui/w.verse", "error")))
            .unwrap();

        let mut diagnostics = Diagnostics::new();
        let failed = manager.build(BuildParams::default(), &mut diagnostics);
        assert!(failed.compiler_result.contains(CompilerResult::SYNTAX_ERROR));

        assert!(manager.remove_source_snippet("app/ui/w.verse").is_some());
        assert!(manager.remove_source_snippet("app/ui/w.verse").is_none());
        manager
            .add_source_snippet("app", "", Arc::new(TextSnippet::new("app/ok.verse", "ok")))
            .unwrap();

        let mut diagnostics = Diagnostics::new();
        let rebuilt = manager.build(BuildParams::default(), &mut diagnostics);
        assert!(!rebuilt.has_failure());
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let log = CallLog::default();
        let project = ProjectFixture::app_with_library("demo").source_project();
        let mut manager =
            ProgramBuildManager::with_project(project, recording_toolchain(&log, ToolchainParams::new()));

        let first = manager.build(BuildParams::default(), &mut Diagnostics::new());
        manager.reset_semantic_program();
        let second = manager.build(BuildParams::default(), &mut Diagnostics::new());

        assert_eq!(first.compiler_result, second.compiler_result);
        assert_eq!(first.linker_result, second.linker_result);
        assert_eq!(first.statistics, second.statistics);
    }

    #[test]
    fn test_package_usage_tracking() {
        let log = CallLog::default();
        let project = ProjectFixture::app_with_library("demo").source_project();
        let mut manager =
            ProgramBuildManager::with_project(project, recording_toolchain(&log, ToolchainParams::new()));

        let params = BuildParams {
            track_package_usage: true,
            link_type: LinkType::Skip,
            ..BuildParams::default()
        };
        let results = manager.build(params, &mut Diagnostics::new());
        let usage = results.package_usage.unwrap();
        // The recording analyzer references nothing.
        assert!(usage.used_dependencies("app").is_empty());
        assert_eq!(usage.unused_dependencies("app"), vec!["lib"]);
        assert_eq!(results.linker_result, CompilerResult::LINK_SKIPPED);

        let untracked = manager.build(BuildParams::default(), &mut Diagnostics::new());
        assert!(untracked.package_usage.is_none());
    }
}
