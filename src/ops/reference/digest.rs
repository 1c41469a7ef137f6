//! Outline digests: a package's public surface as outline source.
//!
//! Every definition becomes one declaration line without a body, so a
//! digest can be loaded back as the stand-in of an external package.

use crate::compiler::diagnostics::Diagnostics;
use crate::compiler::digest::DigestGenerator;
use crate::program::semantic::{AstPackage, Definition, DefinitionKind};

#[derive(Debug, Default)]
pub struct OutlineDigestGenerator;

impl OutlineDigestGenerator {
    pub fn new() -> Self {
        OutlineDigestGenerator
    }
}

fn declaration(definition: &Definition) -> String {
    let mut name = definition.name.clone();
    if definition.experimental {
        name.push_str("<experimental>");
    }
    if let Some(message) = definition.localizable.first() {
        return format!("{}<localizes> : message = \"{}\"", name, message.default_text);
    }
    match definition.kind {
        DefinitionKind::Function => format!("{}()", name),
        DefinitionKind::Class => format!("{} := class", name),
        DefinitionKind::Module => format!("{} := module", name),
        DefinitionKind::Data => format!("{} : any", name),
        DefinitionKind::PersistentVar => format!("var {} : any", name),
        DefinitionKind::PersistentWeakMap => format!("var {} : weak_map(player, any)", name),
    }
}

impl DigestGenerator for OutlineDigestGenerator {
    fn generate(&self, package: &AstPackage, _diagnostics: &mut Diagnostics) -> Option<String> {
        if package.definitions.is_empty() {
            return None;
        }
        let mut text = format!(
            "# digest of {} at language version {}\n",
            package.verse_path, package.language_version
        );
        for using in &package.referenced_packages {
            text.push_str(&format!("using {{ {} }}\n", using));
        }
        for definition in &package.definitions {
            text.push_str(&declaration(definition));
            text.push('\n');
        }
        Some(text)
    }
}
