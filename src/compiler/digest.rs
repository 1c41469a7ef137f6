//! Package digests: compact stand-ins for a package's source.

use serde::Serialize;

use crate::compiler::diagnostics::Diagnostics;
use crate::program::semantic::AstPackage;

/// A digest produced by a build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDigest {
    pub package: String,
    pub language_version: u32,
    pub text: String,
}

/// Produces the digest text of one analyzed package.
pub trait DigestGenerator: Send + Sync {
    /// `None` when the package has nothing to publish.
    fn generate(&self, package: &AstPackage, diagnostics: &mut Diagnostics) -> Option<String>;
}
