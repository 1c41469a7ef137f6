//! User-friendly diagnostic messages.
//!
//! Every glitch is rendered with its location, the offending source line
//! when available, and suggested fixes for the codes that have one.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::compiler::diagnostics::{self, DiagnosticCode, Glitch};

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no manifest file is found.
    pub const NO_MANIFEST: &str = "help: Create a Quay.toml with a [project] section and one [[package]]";

    /// Suggestion when a package refers to an undeclared package.
    pub const UNKNOWN_DEPENDENCY: &str =
        "help: Add the package to `dependencies` in its [[package]] entry";

    /// Suggestion when the persistent variable budget is exceeded.
    pub const TOO_MANY_PERSISTENT_VARS: &str =
        "help: Raise `max-persistent-vars` in .quay/config.toml or remove persistent definitions";

    /// Suggestion when a snippet cannot be read.
    pub const UNREADABLE_SNIPPET: &str = "help: Check that the file exists and is valid UTF-8";

    /// Suggestion when link fails for a missing entry point.
    pub const LINK_FAILED: &str = "help: Run `quay build --link default` to link without an entry point";

    /// Suggestion when build fails.
    pub const BUILD_FAILED: &str = "help: Run `quay build --verbose` for more details";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

impl From<diagnostics::Severity> for Severity {
    fn from(severity: diagnostics::Severity) -> Self {
        match severity {
            diagnostics::Severity::Error => Severity::Error,
            diagnostics::Severity::Warning => Severity::Warning,
            diagnostics::Severity::Info => Severity::Note,
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location, `path:line:column`
    pub location: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic::new(Severity::Error, message)
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Render a glitch. `source` is the text of the glitch's snippet, if
    /// the caller has it; the offending line is quoted from it.
    pub fn from_glitch(glitch: &Glitch, source: Option<&str>) -> Self {
        let mut diag = Diagnostic::new(
            glitch.severity().into(),
            format!("{} [Q{:04}]", glitch.message, glitch.code.id()),
        );
        if !glitch.locus.snippet_path.is_empty() {
            diag = diag.with_location(glitch.locus.to_string());
        }

        let row = glitch.locus.range.begin_row as usize;
        if let Some(line) = source.and_then(|text| text.lines().nth(row)) {
            let column = glitch.locus.range.begin_column as usize;
            diag = diag
                .with_context(line.to_string())
                .with_context(format!("{}^", " ".repeat(column.min(line.chars().count()))));
        }

        if let Some(suggestion) = suggestion_for(glitch.code) {
            diag = diag.with_suggestion(suggestion);
        }
        diag
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        // Severity prefix with optional color
        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
                Severity::Help => "\x1b[1;32mhelp\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
                Severity::Help => "help",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref location) = self.location {
            output.push_str(&format!("  --> {}\n", location));
        }

        for ctx in &self.context {
            output.push_str(&format!("   | {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

fn suggestion_for(code: DiagnosticCode) -> Option<&'static str> {
    let text = match code {
        DiagnosticCode::UnreadableSnippet => suggestions::UNREADABLE_SNIPPET,
        DiagnosticCode::UnknownDependency => suggestions::UNKNOWN_DEPENDENCY,
        DiagnosticCode::TooManyPersistentVars => suggestions::TOO_MANY_PERSISTENT_VARS,
        DiagnosticCode::LinkError => suggestions::LINK_FAILED,
        _ => return None,
    };
    Some(text.trim_start_matches("help: "))
}

/// Malformed project manifest.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("failed to parse manifest: {message}")]
#[diagnostic(
    code(quay::manifest::parse),
    help("See the [project] and [[package]] tables expected in Quay.toml")
)]
pub struct ManifestParseError {
    pub message: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl ManifestParseError {
    pub fn new(name: &str, content: &str, error: &toml::de::Error) -> Self {
        ManifestParseError {
            message: error.message().to_string(),
            src: NamedSource::new(name, content.to_string()),
            span: error.span().map(SourceSpan::from),
        }
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
