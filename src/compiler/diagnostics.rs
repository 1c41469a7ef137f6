//! Build-wide diagnostics accumulator.
//!
//! Every stage of the pipeline records problems here instead of returning
//! errors. The accumulator is append-only between explicit [`Diagnostics::reset`]
//! calls, and notifies attached observers for every glitch and statistic it
//! records.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Severity of a glitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A range of source text, rows and columns are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TextRange {
    pub begin_row: u32,
    pub begin_column: u32,
    pub end_row: u32,
    pub end_column: u32,
}

impl TextRange {
    pub fn new(begin_row: u32, begin_column: u32, end_row: u32, end_column: u32) -> Self {
        TextRange {
            begin_row,
            begin_column,
            end_row,
            end_column,
        }
    }

    /// A range covering `len` columns of a single row.
    pub fn on_row(row: u32, column: u32, len: u32) -> Self {
        TextRange::new(row, column, row, column + len)
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(self, other: TextRange) -> Self {
        let (begin_row, begin_column) = std::cmp::min(
            (self.begin_row, self.begin_column),
            (other.begin_row, other.begin_column),
        );
        let (end_row, end_column) = std::cmp::max(
            (self.end_row, self.end_column),
            (other.end_row, other.end_column),
        );
        TextRange::new(begin_row, begin_column, end_row, end_column)
    }
}

/// Where a glitch was raised.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Locus {
    /// Globally unique path of the snippet, empty for build-wide problems.
    pub snippet_path: String,
    pub range: TextRange,
}

impl Locus {
    pub fn new(snippet_path: impl Into<String>, range: TextRange) -> Self {
        Locus {
            snippet_path: snippet_path.into(),
            range,
        }
    }

    /// A locus naming a whole snippet.
    pub fn snippet(snippet_path: impl Into<String>) -> Self {
        Locus::new(snippet_path, TextRange::default())
    }

    /// A locus for problems not tied to any source text.
    pub fn build() -> Self {
        Locus::default()
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.snippet_path.is_empty() {
            return f.write_str("<build>");
        }
        write!(
            f,
            "{}:{}:{}",
            self.snippet_path,
            self.range.begin_row + 1,
            self.range.begin_column + 1
        )
    }
}

/// Well-known diagnostic kinds.
///
/// Each code has a fixed numeric id and severity; passes that need their own
/// wording attach a message to the [`Glitch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    /// Snippet had neither readable text nor a pre-built syntax tree.
    UnreadableSnippet,
    SyntaxError,
    SemanticError,
    LocalizationError,
    IrError,
    CodeGenError,
    LinkError,
    TooManyPersistentVars,
    UnknownDependency,
    DuplicateDefinition,
    ExperimentalDefinitionUse,
    DigestSubstituted,
    Note,
}

impl DiagnosticCode {
    pub fn id(self) -> u16 {
        match self {
            DiagnosticCode::UnreadableSnippet => 1001,
            DiagnosticCode::SyntaxError => 2000,
            DiagnosticCode::SemanticError => 3000,
            DiagnosticCode::UnknownDependency => 3001,
            DiagnosticCode::DuplicateDefinition => 3002,
            DiagnosticCode::TooManyPersistentVars => 3003,
            DiagnosticCode::ExperimentalDefinitionUse => 3500,
            DiagnosticCode::LocalizationError => 4000,
            DiagnosticCode::IrError => 5000,
            DiagnosticCode::CodeGenError => 6000,
            DiagnosticCode::LinkError => 7000,
            DiagnosticCode::DigestSubstituted => 9000,
            DiagnosticCode::Note => 9001,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::ExperimentalDefinitionUse => Severity::Warning,
            DiagnosticCode::DigestSubstituted | DiagnosticCode::Note => Severity::Info,
            _ => Severity::Error,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            DiagnosticCode::UnreadableSnippet => "snippet has no readable text or syntax tree",
            DiagnosticCode::SyntaxError => "syntax error",
            DiagnosticCode::SemanticError => "semantic error",
            DiagnosticCode::LocalizationError => "localization extraction failed",
            DiagnosticCode::IrError => "IR generation failed",
            DiagnosticCode::CodeGenError => "code generation failed",
            DiagnosticCode::LinkError => "link failed",
            DiagnosticCode::TooManyPersistentVars => "too many persistent variables",
            DiagnosticCode::UnknownDependency => "reference to a package that is not a dependency",
            DiagnosticCode::DuplicateDefinition => "duplicate definition",
            DiagnosticCode::ExperimentalDefinitionUse => "use of an experimental definition",
            DiagnosticCode::DigestSubstituted => "package digest used in place of source",
            DiagnosticCode::Note => "note",
        }
    }
}

/// One recorded issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Glitch {
    pub code: DiagnosticCode,
    pub message: String,
    pub locus: Locus,
}

impl Glitch {
    /// A glitch with the code's default message.
    pub fn new(code: DiagnosticCode, locus: Locus) -> Self {
        Glitch {
            code,
            message: code.default_message().to_string(),
            locus,
        }
    }

    /// A glitch with a specific message.
    pub fn with_message(code: DiagnosticCode, message: impl Into<String>, locus: Locus) -> Self {
        Glitch {
            code,
            message: message.into(),
            locus,
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Glitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {} ({})",
            self.severity(),
            self.code.id(),
            self.message,
            self.locus
        )
    }
}

/// The statistics a build counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildStatistic {
    Functions,
    Classes,
    PersistentWeakMaps,
    UsesOfExperimentalDefinitions,
    TopLevelDefinitions,
}

impl BuildStatistic {
    pub const ALL: [BuildStatistic; 5] = [
        BuildStatistic::Functions,
        BuildStatistic::Classes,
        BuildStatistic::PersistentWeakMaps,
        BuildStatistic::UsesOfExperimentalDefinitions,
        BuildStatistic::TopLevelDefinitions,
    ];
}

/// Running counters for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BuildStatistics {
    pub num_functions: u32,
    pub num_classes: u32,
    pub num_persistent_weak_maps: u32,
    pub num_uses_of_experimental_definitions: u32,
    pub num_top_level_definitions: u32,
}

impl BuildStatistics {
    pub fn get(&self, statistic: BuildStatistic) -> u32 {
        match statistic {
            BuildStatistic::Functions => self.num_functions,
            BuildStatistic::Classes => self.num_classes,
            BuildStatistic::PersistentWeakMaps => self.num_persistent_weak_maps,
            BuildStatistic::UsesOfExperimentalDefinitions => {
                self.num_uses_of_experimental_definitions
            }
            BuildStatistic::TopLevelDefinitions => self.num_top_level_definitions,
        }
    }

    fn counter_mut(&mut self, statistic: BuildStatistic) -> &mut u32 {
        match statistic {
            BuildStatistic::Functions => &mut self.num_functions,
            BuildStatistic::Classes => &mut self.num_classes,
            BuildStatistic::PersistentWeakMaps => &mut self.num_persistent_weak_maps,
            BuildStatistic::UsesOfExperimentalDefinitions => {
                &mut self.num_uses_of_experimental_definitions
            }
            BuildStatistic::TopLevelDefinitions => &mut self.num_top_level_definitions,
        }
    }
}

/// Fired for every statistic increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildStatisticEvent {
    pub statistic: BuildStatistic,
    pub delta: u32,
    /// Counter value after the increment.
    pub total: u32,
}

/// Receives diagnostics events as they are recorded.
pub trait DiagnosticsObserver: Send + Sync {
    fn on_glitch(&self, glitch: &Glitch);

    fn on_statistic(&self, _event: &BuildStatisticEvent) {}
}

/// Append-only sink of glitches and statistics.
#[derive(Default)]
pub struct Diagnostics {
    glitches: Vec<Glitch>,
    statistics: BuildStatistics,
    observers: Vec<Arc<dyn DiagnosticsObserver>>,
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("glitches", &self.glitches)
            .field("statistics", &self.statistics)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    /// Attach an observer. Only events recorded afterwards are delivered.
    pub fn add_observer(&mut self, observer: Arc<dyn DiagnosticsObserver>) {
        self.observers.push(observer);
    }

    pub fn with_observer(mut self, observer: Arc<dyn DiagnosticsObserver>) -> Self {
        self.add_observer(observer);
        self
    }

    /// Record one glitch.
    pub fn append_glitch(&mut self, glitch: Glitch) {
        for observer in &self.observers {
            observer.on_glitch(&glitch);
        }
        self.glitches.push(glitch);
    }

    pub fn append_glitches(&mut self, glitches: impl IntoIterator<Item = Glitch>) {
        for glitch in glitches {
            self.append_glitch(glitch);
        }
    }

    /// Merge another accumulator into this one.
    ///
    /// Each merged glitch and each non-zero statistic fires exactly one event
    /// on this accumulator's observers. The other accumulator's observers are
    /// dropped with it.
    pub fn append(&mut self, other: Diagnostics) {
        let Diagnostics {
            glitches,
            statistics,
            ..
        } = other;
        self.append_glitches(glitches);
        for statistic in BuildStatistic::ALL {
            self.increment(statistic, statistics.get(statistic));
        }
    }

    /// Increase a statistic counter. A zero delta records nothing.
    pub fn increment(&mut self, statistic: BuildStatistic, delta: u32) {
        if delta == 0 {
            return;
        }
        let counter = self.statistics.counter_mut(statistic);
        *counter = counter.saturating_add(delta);
        let event = BuildStatisticEvent {
            statistic,
            delta,
            total: *counter,
        };
        for observer in &self.observers {
            observer.on_statistic(&event);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.glitches.iter().any(Glitch::is_error)
    }

    pub fn has_warnings(&self) -> bool {
        self.glitches
            .iter()
            .any(|glitch| glitch.severity() == Severity::Warning)
    }

    pub fn glitch_count(&self) -> usize {
        self.glitches.len()
    }

    pub fn error_count(&self) -> usize {
        self.glitches.iter().filter(|glitch| glitch.is_error()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.glitches.is_empty()
    }

    pub fn glitches(&self) -> &[Glitch] {
        &self.glitches
    }

    pub fn statistics(&self) -> &BuildStatistics {
        &self.statistics
    }

    /// Forget all glitches and statistics. Observers stay attached.
    pub fn reset(&mut self) {
        self.glitches.clear();
        self.statistics = BuildStatistics::default();
    }
}
