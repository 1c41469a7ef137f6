//! Build event types for JSON output.
//!
//! Emitted one JSON object per line when using `--message-format=json`.
//!
//! # Event Types
//!
//! - `glitch`: a diagnostic was recorded
//! - `statistic`: a build statistic was incremented
//! - `stage-finished`: outcome of one pipeline stage
//! - `build-finished`: build completed (success or failure)
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::io::Write;
use std::sync::Mutex;

use serde::Serialize;

use crate::compiler::context::BuildResults;
use crate::compiler::diagnostics::{
    BuildStatistic, BuildStatisticEvent, DiagnosticsObserver, Glitch, Severity,
};
use crate::compiler::result::CompilerResult;

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageOutcome {
    Ran,
    Failed,
    Skipped,
    NotRun,
}

/// A build event emitted during the build process.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// A diagnostic was recorded.
    #[serde(rename = "glitch")]
    Glitch {
        level: Severity,
        code: u16,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        line: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        column: Option<u32>,
    },

    /// A statistic counter moved.
    #[serde(rename = "statistic")]
    Statistic {
        statistic: BuildStatistic,
        delta: u32,
        total: u32,
    },

    /// A pipeline stage finished.
    #[serde(rename = "stage-finished")]
    StageFinished {
        stage: &'static str,
        outcome: StageOutcome,
    },

    /// Build completed (success or failure).
    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        compiler_result: CompilerResult,
        linker_result: CompilerResult,
        duration_ms: u64,
    },
}

const STAGES: [(&str, CompilerResult, CompilerResult); 5] = [
    ("syntax", CompilerResult::RAN_SYNTAX_PASS, CompilerResult::SYNTAX_ERROR),
    ("semantic", CompilerResult::RAN_SEMANTIC_PASS, CompilerResult::SEMANTIC_ERROR),
    (
        "localization",
        CompilerResult::RAN_LOCALIZATION_PASS,
        CompilerResult::LOCALIZATION_ERROR,
    ),
    ("ir", CompilerResult::RAN_IR_PASS, CompilerResult::IR_ERROR),
    ("code-gen", CompilerResult::RAN_CODE_GEN_PASS, CompilerResult::CODE_GEN_ERROR),
];

impl BuildEvent {
    pub fn glitch(glitch: &Glitch) -> Self {
        let located = !glitch.locus.snippet_path.is_empty();
        BuildEvent::Glitch {
            level: glitch.severity(),
            code: glitch.code.id(),
            message: glitch.message.clone(),
            file: located.then(|| glitch.locus.snippet_path.clone()),
            line: located.then_some(glitch.locus.range.begin_row + 1),
            column: located.then_some(glitch.locus.range.begin_column + 1),
        }
    }

    pub fn statistic(event: &BuildStatisticEvent) -> Self {
        BuildEvent::Statistic {
            statistic: event.statistic,
            delta: event.delta,
            total: event.total,
        }
    }

    /// One `stage-finished` event per stage, in pipeline order, derived
    /// from the build's result flags.
    ///
    /// Skip flags are not tied to a stage, so a skip is attributed to the
    /// first stage that neither ran nor failed.
    pub fn stages(results: &BuildResults) -> Vec<BuildEvent> {
        let compiler = results.compiler_result;
        let mut skip_pending = compiler.intersects(CompilerResult::SKIPPED_MASK);
        let mut events: Vec<BuildEvent> = STAGES
            .iter()
            .map(|&(stage, ran, failed)| {
                let outcome = if compiler.intersects(failed) {
                    StageOutcome::Failed
                } else if compiler.contains(ran) {
                    StageOutcome::Ran
                } else if skip_pending {
                    skip_pending = false;
                    StageOutcome::Skipped
                } else {
                    StageOutcome::NotRun
                };
                BuildEvent::StageFinished { stage, outcome }
            })
            .collect();

        let linker = results.linker_result;
        let link = if linker.contains(CompilerResult::LINK_FAILURE) {
            StageOutcome::Failed
        } else if linker.contains(CompilerResult::LINK_SUCCESS) {
            StageOutcome::Ran
        } else if linker.is_empty() {
            StageOutcome::NotRun
        } else {
            StageOutcome::Skipped
        };
        events.push(BuildEvent::StageFinished {
            stage: "link",
            outcome: link,
        });
        events
    }

    pub fn finished(results: &BuildResults, duration_ms: u64) -> Self {
        BuildEvent::BuildFinished {
            success: !results.has_failure(),
            compiler_result: results.compiler_result,
            linker_result: results.linker_result,
            duration_ms,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Writes every diagnostics event as a JSON line.
pub struct JsonEventObserver {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventObserver {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        JsonEventObserver {
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout() -> Self {
        JsonEventObserver::new(std::io::stdout())
    }

    pub fn emit(&self, event: &BuildEvent) {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| {
            tracing::debug!("Build event writer was poisoned, recovering");
            poisoned.into_inner()
        });
        if let Err(e) = writeln!(out, "{}", event.to_json()) {
            tracing::debug!("Failed to write build event: {}", e);
        }
    }
}

impl DiagnosticsObserver for JsonEventObserver {
    fn on_glitch(&self, glitch: &Glitch) {
        self.emit(&BuildEvent::glitch(glitch));
    }

    fn on_statistic(&self, event: &BuildStatisticEvent) {
        self.emit(&BuildEvent::statistic(event));
    }
}

/// Forwards glitches to `tracing` at a level matching their severity.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl DiagnosticsObserver for TracingObserver {
    fn on_glitch(&self, glitch: &Glitch) {
        match glitch.severity() {
            Severity::Error => tracing::error!("{}", glitch),
            Severity::Warning => tracing::warn!("{}", glitch),
            Severity::Info => tracing::info!("{}", glitch),
        }
    }

    fn on_statistic(&self, event: &BuildStatisticEvent) {
        tracing::trace!("{:?} +{} = {}", event.statistic, event.delta, event.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::diagnostics::{DiagnosticCode, Diagnostics, Locus, TextRange};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_glitch_event_json() {
        let glitch = Glitch::new(
            DiagnosticCode::SyntaxError,
            Locus::new("/app/a.verse", TextRange::on_row(2, 4, 1)),
        );
        let json = BuildEvent::glitch(&glitch).to_json();
        assert!(json.contains(r#""reason":"glitch""#));
        assert!(json.contains(r#""level":"error""#));
        assert!(json.contains(r#""line":3"#));
        assert!(json.contains(r#""column":5"#));
    }

    #[test]
    fn test_build_level_glitch_has_no_location() {
        let glitch = Glitch::new(DiagnosticCode::LinkError, Locus::build());
        let json = BuildEvent::glitch(&glitch).to_json();
        assert!(!json.contains("file"));
        assert!(!json.contains("line"));
    }

    #[test]
    fn test_json_observer_writes_lines() {
        let buffer = SharedBuffer::default();
        let mut diagnostics =
            Diagnostics::new().with_observer(Arc::new(JsonEventObserver::new(buffer.clone())));
        diagnostics.append_glitch(Glitch::new(DiagnosticCode::Note, Locus::build()));
        diagnostics.increment(BuildStatistic::Classes, 2);

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""reason":"glitch""#));
        assert!(lines[1].contains(r#""reason":"statistic""#));
        assert!(lines[1].contains(r#""statistic":"classes""#));
    }

    #[test]
    fn test_json_observer_survives_poisoned_writer() {
        let buffer = SharedBuffer::default();
        let observer = Arc::new(JsonEventObserver::new(buffer.clone()));
        let poisoner = Arc::clone(&observer);
        let joined = std::thread::spawn(move || {
            let _held = poisoner.out.lock().unwrap();
            panic!("writer poisoned");
        })
        .join();
        assert!(joined.is_err());
        assert!(observer.out.is_poisoned());

        observer.emit(&BuildEvent::glitch(&Glitch::new(
            DiagnosticCode::Note,
            Locus::build(),
        )));
        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.contains(r#""reason":"glitch""#));
    }

    #[test]
    fn test_stage_events() {
        let results = BuildResults {
            compiler_result: CompilerResult::RAN_SYNTAX_PASS | CompilerResult::SEMANTIC_ERROR,
            ..BuildResults::default()
        };
        let outcomes: Vec<_> = BuildEvent::stages(&results)
            .into_iter()
            .map(|event| match event {
                BuildEvent::StageFinished { stage, outcome } => (stage, outcome),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("syntax", StageOutcome::Ran),
                ("semantic", StageOutcome::Failed),
                ("localization", StageOutcome::NotRun),
                ("ir", StageOutcome::NotRun),
                ("code-gen", StageOutcome::NotRun),
                ("link", StageOutcome::NotRun),
            ]
        );
    }

    #[test]
    fn test_finished_event() {
        let results = BuildResults {
            compiler_result: CompilerResult::RAN_SYNTAX_PASS,
            linker_result: CompilerResult::LINK_SUCCESS,
            ..BuildResults::default()
        };
        let json = BuildEvent::finished(&results, 12).to_json();
        assert!(json.contains(r#""success":true"#));
        assert!(json.contains(r#""linker_result":["LinkSuccess"]"#));
    }
}
