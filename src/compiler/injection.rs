//! Injection hooks.
//!
//! Each hook point holds an ordered list of injections. Returning `true`
//! from an injection halts the pipeline at that point. The toolchain runs
//! its own injections for a hook before the build's, and stops at the first
//! halt.

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use crate::compiler::context::BuildContext;
use crate::program::semantic::{ProgramContext, SemanticProgram};
use crate::program::vst;

pub trait PreParseInjection: Send + Sync {
    fn pre_parse(&self, snippet_path: &str, text: &str, build_ctx: &BuildContext) -> bool;
}

pub trait PostParseInjection: Send + Sync {
    fn post_parse(&self, vst: &vst::Project, build_ctx: &BuildContext) -> bool;
}

pub trait PreSemanticInjection: Send + Sync {
    fn pre_semantic(&self, vst: &vst::Project, build_ctx: &BuildContext) -> bool;
}

/// Phases a semantic analyzer may report through [`IntraSemanticHook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticPhase {
    /// Top-level names are known.
    Declarations,
    /// Cross-package references are bound.
    Bindings,
    /// Definition bodies are analyzed.
    Bodies,
}

pub trait IntraSemanticInjection: Send + Sync {
    fn intra_semantic(
        &self,
        phase: SemanticPhase,
        program_ctx: &ProgramContext,
        build_ctx: &BuildContext,
    ) -> bool;
}

pub trait PostSemanticInjection: Send + Sync {
    fn post_semantic(&self, program: &SemanticProgram, build_ctx: &BuildContext) -> bool;
}

pub trait PreTranslateInjection: Send + Sync {
    fn pre_translate(&self, program: &SemanticProgram, build_ctx: &BuildContext) -> bool;
}

pub trait PreLinkInjection: Send + Sync {
    fn pre_link(&self, program: &SemanticProgram, build_ctx: &BuildContext) -> bool;
}

/// Injection lists for every hook point.
///
/// Used both for the toolchain's long-lived injections and for the extra
/// injections a single build supplies.
#[derive(Clone, Default)]
pub struct Injections {
    pub pre_parse: Vec<Arc<dyn PreParseInjection>>,
    pub post_parse: Vec<Arc<dyn PostParseInjection>>,
    pub pre_semantic: Vec<Arc<dyn PreSemanticInjection>>,
    pub intra_semantic: Vec<Arc<dyn IntraSemanticInjection>>,
    pub post_semantic: Vec<Arc<dyn PostSemanticInjection>>,
    pub pre_translate: Vec<Arc<dyn PreTranslateInjection>>,
    pub pre_link: Vec<Arc<dyn PreLinkInjection>>,
}

impl Injections {
    pub fn new() -> Self {
        Injections::default()
    }

    pub fn with_pre_parse(mut self, injection: impl PreParseInjection + 'static) -> Self {
        self.pre_parse.push(Arc::new(injection));
        self
    }

    pub fn with_post_parse(mut self, injection: impl PostParseInjection + 'static) -> Self {
        self.post_parse.push(Arc::new(injection));
        self
    }

    pub fn with_pre_semantic(mut self, injection: impl PreSemanticInjection + 'static) -> Self {
        self.pre_semantic.push(Arc::new(injection));
        self
    }

    pub fn with_intra_semantic(mut self, injection: impl IntraSemanticInjection + 'static) -> Self {
        self.intra_semantic.push(Arc::new(injection));
        self
    }

    pub fn with_post_semantic(mut self, injection: impl PostSemanticInjection + 'static) -> Self {
        self.post_semantic.push(Arc::new(injection));
        self
    }

    pub fn with_pre_translate(mut self, injection: impl PreTranslateInjection + 'static) -> Self {
        self.pre_translate.push(Arc::new(injection));
        self
    }

    pub fn with_pre_link(mut self, injection: impl PreLinkInjection + 'static) -> Self {
        self.pre_link.push(Arc::new(injection));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pre_parse.is_empty()
            && self.post_parse.is_empty()
            && self.pre_semantic.is_empty()
            && self.intra_semantic.is_empty()
            && self.post_semantic.is_empty()
            && self.pre_translate.is_empty()
            && self.pre_link.is_empty()
    }
}

impl fmt::Debug for Injections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injections")
            .field("pre_parse", &self.pre_parse.len())
            .field("post_parse", &self.post_parse.len())
            .field("pre_semantic", &self.pre_semantic.len())
            .field("intra_semantic", &self.intra_semantic.len())
            .field("post_semantic", &self.post_semantic.len())
            .field("pre_translate", &self.pre_translate.len())
            .field("pre_link", &self.pre_link.len())
            .finish()
    }
}

/// Run `toolchain` injections, then `build` injections, until one halts.
pub(crate) fn run_injections<I: ?Sized>(
    hook: &str,
    toolchain: &[Arc<I>],
    build: &[Arc<I>],
    mut fire: impl FnMut(&I) -> bool,
) -> bool {
    for (index, injection) in toolchain.iter().chain(build).enumerate() {
        if fire(injection.as_ref()) {
            let level = if index < toolchain.len() { "toolchain" } else { "build" };
            tracing::debug!("{} injection #{} ({}) halted the build", hook, index, level);
            return true;
        }
    }
    false
}

/// Intra-semantic injections, handed to the semantic analyzer so it can
/// fire them between its own phases.
pub struct IntraSemanticHook {
    toolchain: Vec<Arc<dyn IntraSemanticInjection>>,
    build: Vec<Arc<dyn IntraSemanticInjection>>,
    halted: Cell<bool>,
}

impl IntraSemanticHook {
    pub fn new(
        toolchain: Vec<Arc<dyn IntraSemanticInjection>>,
        build: Vec<Arc<dyn IntraSemanticInjection>>,
    ) -> Self {
        IntraSemanticHook {
            toolchain,
            build,
            halted: Cell::new(false),
        }
    }

    /// Run the injections for `phase`. Once any injection has halted, every
    /// later call returns `true` without running anything.
    pub fn fire(
        &self,
        phase: SemanticPhase,
        program_ctx: &ProgramContext,
        build_ctx: &BuildContext,
    ) -> bool {
        if self.halted.get() {
            return true;
        }
        let halted = run_injections("intra-semantic", &self.toolchain, &self.build, |injection| {
            injection.intra_semantic(phase, program_ctx, build_ctx)
        });
        self.halted.set(halted);
        halted
    }

    pub fn halted(&self) -> bool {
        self.halted.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Logged {
        name: &'static str,
        halt: bool,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl IntraSemanticInjection for Logged {
        fn intra_semantic(&self, _: SemanticPhase, _: &ProgramContext, _: &BuildContext) -> bool {
            self.log.lock().unwrap().push(self.name);
            self.halt
        }
    }

    fn logged(
        name: &'static str,
        halt: bool,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn IntraSemanticInjection> {
        Arc::new(Logged {
            name,
            halt,
            log: log.clone(),
        })
    }

    #[test]
    fn test_toolchain_injections_run_first() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hook = IntraSemanticHook::new(
            vec![logged("t1", false, &log), logged("t2", false, &log)],
            vec![logged("b1", false, &log)],
        );
        assert!(!hook.fire(SemanticPhase::Declarations, &ProgramContext::new(), &BuildContext::default()));
        assert_eq!(*log.lock().unwrap(), vec!["t1", "t2", "b1"]);
    }

    #[test]
    fn test_toolchain_halt_skips_build_injections() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let hook = IntraSemanticHook::new(
            vec![logged("t1", true, &log)],
            vec![logged("b1", false, &log)],
        );
        let program_ctx = ProgramContext::new();
        let build_ctx = BuildContext::default();

        assert!(hook.fire(SemanticPhase::Declarations, &program_ctx, &build_ctx));
        assert!(hook.halted());
        // Later phases short-circuit without re-running anything.
        assert!(hook.fire(SemanticPhase::Bodies, &program_ctx, &build_ctx));
        assert_eq!(*log.lock().unwrap(), vec!["t1"]);
    }

    #[test]
    fn test_injections_builder() {
        struct Never;
        impl PreLinkInjection for Never {
            fn pre_link(&self, _: &SemanticProgram, _: &BuildContext) -> bool {
                false
            }
        }

        let injections = Injections::new().with_pre_link(Never);
        assert!(!injections.is_empty());
        assert_eq!(injections.pre_link.len(), 1);
        assert!(Injections::new().is_empty());
    }
}
