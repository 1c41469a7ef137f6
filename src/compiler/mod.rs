//! The compiler pipeline: diagnostics, pass interfaces and the toolchain.

pub mod context;
pub mod diagnostics;
pub mod digest;
pub mod events;
pub mod injection;
pub mod localization;
pub mod pass;
pub mod result;
pub mod toolchain;

pub use context::{
    BuildContext, BuildParams, BuildResults, LinkType, OrderingPolicy, PackageUsage,
    LATEST_LANGUAGE_VERSION,
};
pub use diagnostics::{
    BuildStatistic, BuildStatisticEvent, BuildStatistics, DiagnosticCode, Diagnostics,
    DiagnosticsObserver, Glitch, Locus, Severity, TextRange,
};
pub use digest::{DigestGenerator, GeneratedDigest};
pub use events::{BuildEvent, JsonEventObserver, TracingObserver};
pub use injection::{
    Injections, IntraSemanticHook, IntraSemanticInjection, PostParseInjection,
    PostSemanticInjection, PreLinkInjection, PreParseInjection, PreSemanticInjection,
    PreTranslateInjection, SemanticPhase,
};
pub use localization::{
    DefinitionStringExtractor, ExtractedStrings, LocalizationExtractor, LocalizationInfo,
    StringInfo,
};
pub use pass::{
    AssemblerPass, IrGeneratorPass, ParserPass, PassLifecycle, PostIrFilter, PostSemanticFilter,
    PostVstFilter, SemanticAnalyzerPass, SnippetVersions,
};
pub use result::CompilerResult;
pub use toolchain::{Toolchain, ToolchainParams};
