//! Whole-project syntax tree container.
//!
//! The toolchain mirrors the source project's package/module/snippet tree
//! here and parsers fill in each snippet's nodes. Node content is opaque to
//! the pipeline: `kind` and `text` mean whatever the registered parser says.

use serde::Serialize;

use crate::compiler::diagnostics::TextRange;
use crate::core::package::{PackageRole, PackageScope};

/// One syntax node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub kind: String,
    pub text: String,
    pub range: TextRange,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(kind: impl Into<String>, text: impl Into<String>, range: TextRange) -> Self {
        Node {
            kind: kind.into(),
            text: text.into(),
            range,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Pre-order walk over this node and its descendants.
    pub fn walk<'a>(&'a self, visitor: &mut impl FnMut(&'a Node)) {
        visitor(self);
        for child in &self.children {
            child.walk(visitor);
        }
    }

    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }
}

/// Parsed content of one source snippet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Snippet {
    pub path: String,
    pub nodes: Vec<Node>,
}

impl Snippet {
    pub fn new(path: impl Into<String>) -> Self {
        Snippet {
            path: path.into(),
            nodes: Vec::new(),
        }
    }

    /// Drop any previous parse result.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn range(&self) -> Option<TextRange> {
        self.nodes
            .iter()
            .map(|node| node.range)
            .reduce(TextRange::union)
    }
}

/// A module and its nested content.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Module {
    pub name: String,
    pub snippets: Vec<Snippet>,
    pub modules: Vec<Module>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            snippets: Vec::new(),
            modules: Vec::new(),
        }
    }

    fn visit_snippets<'a>(&'a self, visitor: &mut impl FnMut(&'a Snippet)) {
        for snippet in &self.snippets {
            visitor(snippet);
        }
        for module in &self.modules {
            module.visit_snippets(visitor);
        }
    }

    fn visit_snippets_mut(&mut self, visitor: &mut impl FnMut(&mut Snippet)) {
        for snippet in &mut self.snippets {
            visitor(snippet);
        }
        for module in &mut self.modules {
            module.visit_snippets_mut(visitor);
        }
    }
}

/// A package as seen by the later stages.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Package {
    pub name: String,
    pub verse_path: String,
    pub role: PackageRole,
    pub scope: PackageScope,
    /// Language version the package was parsed under. For a digest this is
    /// the digest's own version.
    pub language_version: u32,
    pub uploaded_at_version: Option<u32>,
    pub dependency_packages: Vec<String>,
    pub treat_modules_as_implicit: bool,
    pub allow_experimental: bool,
    /// Parsed from a digest rather than from the module tree.
    pub from_digest: bool,
    pub snippets: Vec<Snippet>,
    pub modules: Vec<Module>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Package {
            name: name.into(),
            ..Package::default()
        }
    }

    /// Every snippet of the package, package-level snippets first, then
    /// module snippets depth first.
    pub fn snippets_recursive(&self) -> Vec<&Snippet> {
        let mut all = Vec::new();
        all.extend(self.snippets.iter());
        for module in &self.modules {
            module.visit_snippets(&mut |snippet| all.push(snippet));
        }
        all
    }

    pub fn for_each_snippet_mut(&mut self, mut visitor: impl FnMut(&mut Snippet)) {
        for snippet in &mut self.snippets {
            visitor(snippet);
        }
        for module in &mut self.modules {
            module.visit_snippets_mut(&mut visitor);
        }
    }
}

/// The whole project's syntax.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Project {
    pub name: String,
    pub packages: Vec<Package>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Project {
            name: name.into(),
            packages: Vec::new(),
        }
    }

    pub fn find_package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.name == name)
    }

    pub fn snippet_count(&self) -> usize {
        self.packages
            .iter()
            .map(|p| p.snippets_recursive().len())
            .sum()
    }

    pub fn find_snippet(&self, path: &str) -> Option<&Snippet> {
        self.packages
            .iter()
            .flat_map(|p| p.snippets_recursive())
            .find(|s| s.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(text: &str, row: u32) -> Node {
        Node::new("line", text, TextRange::on_row(row, 0, text.len() as u32))
    }

    #[test]
    fn test_snippets_recursive_order() {
        let mut package = Package::new("app");
        package.snippets.push(Snippet::new("/app/a"));
        let mut module = Module::new("m");
        module.snippets.push(Snippet::new("/app/m/b"));
        let mut nested = Module::new("n");
        nested.snippets.push(Snippet::new("/app/m/n/c"));
        module.modules.push(nested);
        package.modules.push(module);

        let paths: Vec<_> = package
            .snippets_recursive()
            .into_iter()
            .map(|s| s.path.as_str())
            .collect();
        assert_eq!(paths, vec!["/app/a", "/app/m/b", "/app/m/n/c"]);
    }

    #[test]
    fn test_node_walk_and_counts() {
        let node = leaf("a", 0).with_child(leaf("b", 1).with_child(leaf("c", 2)));
        let mut seen = Vec::new();
        node.walk(&mut |n| seen.push(n.text.clone()));
        assert_eq!(seen, vec!["a", "b", "c"]);
        assert_eq!(node.descendant_count(), 2);
    }

    #[test]
    fn test_snippet_range_covers_nodes() {
        let mut snippet = Snippet::new("/x");
        assert!(snippet.range().is_none());
        snippet.nodes.push(leaf("abc", 0));
        snippet.nodes.push(leaf("de", 3));
        assert_eq!(snippet.range(), Some(TextRange::new(0, 0, 3, 2)));
    }
}
