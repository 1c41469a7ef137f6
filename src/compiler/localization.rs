//! Localization extraction over a finished semantic tree.

use std::collections::HashMap;

use serde::Serialize;

use crate::compiler::diagnostics::{DiagnosticCode, Diagnostics, Glitch};
use crate::program::semantic::AstProject;

/// A message declared as localizable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizationInfo {
    pub key: String,
    pub default_text: String,
    /// Source location rendered as text, `path:row:column`.
    pub locus: String,
}

/// A plain string literal found in the program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringInfo {
    pub text: String,
    pub locus: String,
}

/// The two flat lists an extraction produces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedStrings {
    pub localization: Vec<LocalizationInfo>,
    pub strings: Vec<StringInfo>,
}

/// Reads the semantic tree and lists its strings. Never mutates the tree.
pub trait LocalizationExtractor: Send + Sync {
    fn extract(&self, ast: &AstProject, diagnostics: &mut Diagnostics) -> ExtractedStrings;
}

/// Collects strings from every source-role package's definitions.
///
/// A localization key declared twice is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionStringExtractor;

impl LocalizationExtractor for DefinitionStringExtractor {
    fn extract(&self, ast: &AstProject, diagnostics: &mut Diagnostics) -> ExtractedStrings {
        let mut out = ExtractedStrings::default();
        let mut seen_keys: HashMap<&str, String> = HashMap::new();

        for (package, definition) in ast.definitions() {
            if !package.role.is_source() {
                continue;
            }
            for literal in &definition.strings {
                out.strings.push(StringInfo {
                    text: literal.text.clone(),
                    locus: literal.locus.to_string(),
                });
            }
            for message in &definition.localizable {
                let locus = message.locus.to_string();
                if let Some(first) = seen_keys.get(message.key.as_str()) {
                    diagnostics.append_glitch(Glitch::with_message(
                        DiagnosticCode::LocalizationError,
                        format!(
                            "localization key `{}` already declared at {}",
                            message.key, first
                        ),
                        message.locus.clone(),
                    ));
                    continue;
                }
                seen_keys.insert(&message.key, locus.clone());
                out.localization.push(LocalizationInfo {
                    key: message.key.clone(),
                    default_text: message.default_text.clone(),
                    locus,
                });
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::diagnostics::{Locus, TextRange};
    use crate::core::package::PackageRole;
    use crate::program::semantic::{
        AstPackage, Definition, DefinitionKind, LocalizableMessage, StringLiteral,
    };

    fn definition_with(key: &str, row: u32) -> Definition {
        let locus = Locus::new("/app/a.verse", TextRange::on_row(row, 0, 4));
        let mut definition = Definition::new(format!("d{}", row), DefinitionKind::Data, locus.clone());
        definition.strings.push(StringLiteral {
            text: "hello".to_string(),
            locus: locus.clone(),
        });
        definition.localizable.push(LocalizableMessage {
            key: key.to_string(),
            default_text: "Hello".to_string(),
            locus,
        });
        definition
    }

    #[test]
    fn test_extracts_source_packages_only() {
        let ast = AstProject {
            packages: vec![
                AstPackage {
                    name: "app".to_string(),
                    definitions: vec![definition_with("greeting", 0)],
                    ..AstPackage::default()
                },
                AstPackage {
                    name: "ext".to_string(),
                    role: PackageRole::ExternalConstraint,
                    definitions: vec![definition_with("other", 0)],
                    ..AstPackage::default()
                },
            ],
        };
        let mut diagnostics = Diagnostics::new();
        let out = DefinitionStringExtractor.extract(&ast, &mut diagnostics);

        assert!(diagnostics.is_empty());
        assert_eq!(out.strings.len(), 1);
        assert_eq!(out.localization.len(), 1);
        assert_eq!(out.localization[0].key, "greeting");
        assert_eq!(out.localization[0].locus, "/app/a.verse:1:1");
    }

    #[test]
    fn test_duplicate_key_is_an_error() {
        let ast = AstProject {
            packages: vec![AstPackage {
                name: "app".to_string(),
                definitions: vec![definition_with("greeting", 0), definition_with("greeting", 4)],
                ..AstPackage::default()
            }],
        };
        let mut diagnostics = Diagnostics::new();
        let out = DefinitionStringExtractor.extract(&ast, &mut diagnostics);

        assert!(diagnostics.has_errors());
        assert_eq!(out.localization.len(), 1);
        assert_eq!(out.strings.len(), 2);
    }
}
