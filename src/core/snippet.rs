//! Snippets: the smallest unit of source handed to the toolchain.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::program::vst;

/// One unit of source with a globally unique path.
///
/// A snippet resolves to raw text, to an already-produced syntax tree, or to
/// neither; the parse stage reports an unreadable snippet in the last case.
pub trait SourceSnippet: Send + Sync + fmt::Debug {
    /// Globally unique path. This is the snippet's identity.
    fn path(&self) -> &str;

    /// Source text, if available.
    fn text(&self) -> Option<String>;

    /// A syntax tree produced ahead of time, if any.
    fn vst(&self) -> Option<vst::Snippet> {
        None
    }
}

/// A snippet whose text lives in memory.
#[derive(Debug, Clone)]
pub struct TextSnippet {
    path: String,
    text: String,
}

impl TextSnippet {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        TextSnippet {
            path: path.into(),
            text: text.into(),
        }
    }
}

impl SourceSnippet for TextSnippet {
    fn path(&self) -> &str {
        &self.path
    }

    fn text(&self) -> Option<String> {
        Some(self.text.clone())
    }
}

/// A snippet backed by a file, read on demand.
///
/// An unreadable file resolves to no text.
#[derive(Debug, Clone)]
pub struct FileSnippet {
    path: String,
    file: PathBuf,
}

impl FileSnippet {
    pub fn new(path: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        FileSnippet {
            path: path.into(),
            file: file.into(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

impl SourceSnippet for FileSnippet {
    fn path(&self) -> &str {
        &self.path
    }

    fn text(&self) -> Option<String> {
        match std::fs::read_to_string(&self.file) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!("failed to read snippet {}: {}", self.file.display(), e);
                None
            }
        }
    }
}

/// A snippet that was parsed ahead of time.
#[derive(Debug, Clone)]
pub struct VstSnippet {
    vst: vst::Snippet,
}

impl VstSnippet {
    pub fn new(vst: vst::Snippet) -> Self {
        VstSnippet { vst }
    }
}

impl SourceSnippet for VstSnippet {
    fn path(&self) -> &str {
        &self.vst.path
    }

    fn text(&self) -> Option<String> {
        None
    }

    fn vst(&self) -> Option<vst::Snippet> {
        Some(self.vst.clone())
    }
}

/// A snippet with nothing behind it. Parsing it always reports an I/O
/// problem; useful as a placeholder for content that failed to load.
#[derive(Debug, Clone)]
pub struct MissingSnippet {
    path: String,
}

impl MissingSnippet {
    pub fn new(path: impl Into<String>) -> Self {
        MissingSnippet { path: path.into() }
    }
}

impl SourceSnippet for MissingSnippet {
    fn path(&self) -> &str {
        &self.path
    }

    fn text(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_text_snippet_resolves_text() {
        let snippet = TextSnippet::new("/app/main.verse", "main()");
        assert_eq!(snippet.path(), "/app/main.verse");
        assert_eq!(snippet.text().as_deref(), Some("main()"));
        assert!(snippet.vst().is_none());
    }

    #[test]
    fn test_file_snippet_reads_lazily() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.verse");
        let snippet = FileSnippet::new("/app/a.verse", &file);

        assert!(snippet.text().is_none());

        std::fs::write(&file, "x := 1").unwrap();
        assert_eq!(snippet.text().as_deref(), Some("x := 1"));
    }

    #[test]
    fn test_vst_snippet_has_tree_only() {
        let snippet = VstSnippet::new(vst::Snippet::new("/app/pre.verse"));
        assert!(snippet.text().is_none());
        assert_eq!(snippet.vst().map(|v| v.path), Some("/app/pre.verse".to_string()));
    }
}
