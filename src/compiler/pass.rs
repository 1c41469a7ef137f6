//! Pass and filter interfaces.
//!
//! A toolchain holds at most one implementation of each pass and any number
//! of filters per kind. Passes are bracketed by `initialize` / `clean_up`
//! around their `process_*` calls; filters are stateless transforms applied
//! to a finished artifact in registration order.

use crate::compiler::context::BuildContext;
use crate::compiler::injection::IntraSemanticHook;
use crate::program::semantic::{ProgramContext, SemanticProgram};
use crate::program::vst;

/// Versions a snippet is parsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnippetVersions {
    pub language_version: u32,
    pub uploaded_at_version: Option<u32>,
}

/// Lifecycle shared by every pass.
pub trait PassLifecycle {
    fn initialize(&mut self, _build_ctx: &BuildContext, _program_ctx: &ProgramContext) {}

    fn clean_up(&mut self) {}
}

pub trait ParserPass: PassLifecycle + Send {
    /// Parse `text` into `out`, which arrives empty.
    ///
    /// Problems are reported as glitches on `build_ctx.diagnostics`; any
    /// error-severity glitch marks the snippet as failed.
    fn process_snippet(
        &mut self,
        out: &mut vst::Snippet,
        text: &str,
        versions: SnippetVersions,
        build_ctx: &mut BuildContext,
    );
}

pub trait SemanticAnalyzerPass: PassLifecycle + Send {
    /// Analyze the whole-project syntax tree into `program_ctx`.
    ///
    /// Implementations should call `hook.fire` between their internal
    /// phases and stop as soon as it returns `true`.
    fn process_vst(
        &mut self,
        vst: &vst::Project,
        hook: &IntraSemanticHook,
        build_ctx: &mut BuildContext,
        program_ctx: &mut ProgramContext,
    );
}

pub trait IrGeneratorPass: PassLifecycle + Send {
    fn process_program(&mut self, program: &mut SemanticProgram, build_ctx: &mut BuildContext);
}

pub trait AssemblerPass: PassLifecycle + Send {
    fn process_program(&mut self, program: &SemanticProgram, build_ctx: &mut BuildContext);

    fn link(&mut self, program: &SemanticProgram, build_ctx: &mut BuildContext);
}

pub trait PostVstFilter: Send + Sync {
    fn filter(&self, vst: &mut vst::Project, build_ctx: &mut BuildContext);
}

pub trait PostSemanticFilter: Send + Sync {
    fn filter(&self, program_ctx: &mut ProgramContext, build_ctx: &mut BuildContext);
}

pub trait PostIrFilter: Send + Sync {
    fn filter(&self, program: &mut SemanticProgram, build_ctx: &mut BuildContext);
}

/// Holds an optional pass and tracks whether it is between `initialize`
/// and `clean_up`.
pub struct PassSlot<P: ?Sized> {
    pass: Option<Box<P>>,
    initialized: bool,
}

impl<P: ?Sized + PassLifecycle> PassSlot<P> {
    pub fn new(pass: Option<Box<P>>) -> Self {
        PassSlot {
            pass,
            initialized: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pass.is_none()
    }

    /// Initialize the pass and hand it out, or `None` for an empty slot.
    ///
    /// Must be paired with [`PassSlot::clean_up`].
    pub fn initialize(
        &mut self,
        build_ctx: &BuildContext,
        program_ctx: &ProgramContext,
    ) -> Option<&mut P> {
        let pass = self.pass.as_deref_mut()?;
        debug_assert!(!self.initialized, "pass initialized twice without clean_up");
        self.initialized = true;
        pass.initialize(build_ctx, program_ctx);
        Some(pass)
    }

    pub fn clean_up(&mut self) {
        if let Some(pass) = self.pass.as_deref_mut() {
            if self.initialized {
                pass.clean_up();
            }
        }
        self.initialized = false;
    }
}
