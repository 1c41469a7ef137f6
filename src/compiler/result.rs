//! Stage outcome flags.
//!
//! A build ORs together the outcome of every stage that ran, so callers can
//! see both how far the pipeline got and why it stopped.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Serialize, Serializer};

/// OR-combinable set of stage outcome flags.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CompilerResult(u32);

impl CompilerResult {
    /// Nothing ran.
    pub const NO_BUILD: CompilerResult = CompilerResult(0);

    pub const RAN_SYNTAX_PASS: CompilerResult = CompilerResult(1 << 0);
    pub const RAN_SEMANTIC_PASS: CompilerResult = CompilerResult(1 << 1);
    pub const RAN_LOCALIZATION_PASS: CompilerResult = CompilerResult(1 << 2);
    pub const RAN_IR_PASS: CompilerResult = CompilerResult(1 << 3);
    pub const RAN_CODE_GEN_PASS: CompilerResult = CompilerResult(1 << 4);

    pub const SKIPPED_BY_INJECTION: CompilerResult = CompilerResult(1 << 5);
    pub const SKIPPED_BY_EMPTY_PASS: CompilerResult = CompilerResult(1 << 6);

    pub const SYNTAX_ERROR: CompilerResult = CompilerResult(1 << 7);
    pub const SEMANTIC_ERROR: CompilerResult = CompilerResult(1 << 8);
    pub const LOCALIZATION_ERROR: CompilerResult = CompilerResult(1 << 9);
    pub const IR_ERROR: CompilerResult = CompilerResult(1 << 10);
    pub const CODE_GEN_ERROR: CompilerResult = CompilerResult(1 << 11);

    pub const LINK_SUCCESS: CompilerResult = CompilerResult(1 << 12);
    /// Link not attempted: build parameters asked for it, or an earlier
    /// stage stopped the build.
    pub const LINK_SKIPPED: CompilerResult = CompilerResult(1 << 13);
    pub const LINK_SKIPPED_BY_INJECTION: CompilerResult = CompilerResult(1 << 14);
    pub const LINK_SKIPPED_BY_EMPTY_PASS: CompilerResult = CompilerResult(1 << 15);
    pub const LINK_FAILURE: CompilerResult = CompilerResult(1 << 16);

    pub const ERROR_MASK: CompilerResult = CompilerResult(
        Self::SYNTAX_ERROR.0
            | Self::SEMANTIC_ERROR.0
            | Self::LOCALIZATION_ERROR.0
            | Self::IR_ERROR.0
            | Self::CODE_GEN_ERROR.0
            | Self::LINK_FAILURE.0,
    );

    pub const SKIPPED_MASK: CompilerResult = CompilerResult(
        Self::SKIPPED_BY_INJECTION.0
            | Self::SKIPPED_BY_EMPTY_PASS.0
            | Self::LINK_SKIPPED.0
            | Self::LINK_SKIPPED_BY_INJECTION.0
            | Self::LINK_SKIPPED_BY_EMPTY_PASS.0,
    );

    const NAMES: [(CompilerResult, &'static str); 17] = [
        (Self::RAN_SYNTAX_PASS, "RanSyntaxPass"),
        (Self::RAN_SEMANTIC_PASS, "RanSemanticPass"),
        (Self::RAN_LOCALIZATION_PASS, "RanLocalizationPass"),
        (Self::RAN_IR_PASS, "RanIrPass"),
        (Self::RAN_CODE_GEN_PASS, "RanCodeGenPass"),
        (Self::SKIPPED_BY_INJECTION, "SkippedByInjection"),
        (Self::SKIPPED_BY_EMPTY_PASS, "SkippedByEmptyPass"),
        (Self::SYNTAX_ERROR, "SyntaxError"),
        (Self::SEMANTIC_ERROR, "SemanticError"),
        (Self::LOCALIZATION_ERROR, "LocalizationError"),
        (Self::IR_ERROR, "IrError"),
        (Self::CODE_GEN_ERROR, "CodeGenError"),
        (Self::LINK_SUCCESS, "LinkSuccess"),
        (Self::LINK_SKIPPED, "LinkSkipped"),
        (Self::LINK_SKIPPED_BY_INJECTION, "LinkSkippedByInjection"),
        (Self::LINK_SKIPPED_BY_EMPTY_PASS, "LinkSkippedByEmptyPass"),
        (Self::LINK_FAILURE, "LinkFailure"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if every flag in `other` is set.
    pub const fn contains(self, other: CompilerResult) -> bool {
        self.0 & other.0 == other.0
    }

    /// True if any flag in `other` is set.
    pub const fn intersects(self, other: CompilerResult) -> bool {
        self.0 & other.0 != 0
    }

    /// A stage failed.
    pub const fn is_failure(self) -> bool {
        self.intersects(Self::ERROR_MASK)
    }

    /// The pipeline must not continue past this result: nothing ran, a stage
    /// failed, or a stage was skipped.
    pub const fn is_aborted(self) -> bool {
        self.is_empty() || self.intersects(Self::ERROR_MASK) || self.intersects(Self::SKIPPED_MASK)
    }

    /// Flag names of every set bit, in stage order.
    pub fn flag_names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for CompilerResult {
    type Output = CompilerResult;

    fn bitor(self, rhs: CompilerResult) -> CompilerResult {
        CompilerResult(self.0 | rhs.0)
    }
}

impl BitOrAssign for CompilerResult {
    fn bitor_assign(&mut self, rhs: CompilerResult) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for CompilerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompilerResult({})", self)
    }
}

impl fmt::Display for CompilerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NoBuild");
        }
        f.write_str(&self.flag_names().join(" | "))
    }
}

impl Serialize for CompilerResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.flag_names())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_combines() {
        let mut result = CompilerResult::RAN_SYNTAX_PASS;
        result |= CompilerResult::RAN_SEMANTIC_PASS;
        assert!(result.contains(CompilerResult::RAN_SYNTAX_PASS | CompilerResult::RAN_SEMANTIC_PASS));
        assert!(!result.contains(CompilerResult::RAN_IR_PASS));
        assert_eq!(result.to_string(), "RanSyntaxPass | RanSemanticPass");
    }

    #[test]
    fn test_empty_result_is_aborted() {
        assert!(CompilerResult::NO_BUILD.is_aborted());
        assert!(!CompilerResult::NO_BUILD.is_failure());
        assert_eq!(CompilerResult::NO_BUILD.to_string(), "NoBuild");
    }

    #[test]
    fn test_skip_aborts_without_failing() {
        let result = CompilerResult::RAN_SYNTAX_PASS | CompilerResult::SKIPPED_BY_INJECTION;
        assert!(result.is_aborted());
        assert!(!result.is_failure());
    }

    #[test]
    fn test_error_is_failure() {
        let result = CompilerResult::RAN_SYNTAX_PASS | CompilerResult::SEMANTIC_ERROR;
        assert!(result.is_aborted());
        assert!(result.is_failure());
        assert!(CompilerResult::LINK_FAILURE.is_failure());
    }

    #[test]
    fn test_success_flags_do_not_abort() {
        let result = CompilerResult::RAN_SYNTAX_PASS
            | CompilerResult::RAN_SEMANTIC_PASS
            | CompilerResult::RAN_IR_PASS;
        assert!(!result.is_aborted());
        assert!(!CompilerResult::LINK_SUCCESS.is_aborted());
    }

    #[test]
    fn test_serializes_as_flag_names() {
        let result = CompilerResult::RAN_SYNTAX_PASS | CompilerResult::SYNTAX_ERROR;
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"["RanSyntaxPass","SyntaxError"]"#);
    }
}
