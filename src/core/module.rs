//! Source modules: a tree of snippets.

use std::sync::Arc;

use crate::core::snippet::SourceSnippet;

/// A named module holding snippets and submodules, in order.
///
/// Names identify submodules within their parent; keeping them unique is the
/// caller's job.
#[derive(Debug, Clone, Default)]
pub struct SourceModule {
    name: String,
    snippets: Vec<Arc<dyn SourceSnippet>>,
    submodules: Vec<SourceModule>,
}

impl SourceModule {
    pub fn new(name: impl Into<String>) -> Self {
        SourceModule {
            name: name.into(),
            snippets: Vec::new(),
            submodules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn snippets(&self) -> &[Arc<dyn SourceSnippet>] {
        &self.snippets
    }

    pub fn submodules(&self) -> &[SourceModule] {
        &self.submodules
    }

    pub fn add_snippet(&mut self, snippet: Arc<dyn SourceSnippet>) {
        self.snippets.push(snippet);
    }

    /// Remove the snippet with the given path from this module only.
    pub fn remove_snippet(&mut self, path: &str) -> Option<Arc<dyn SourceSnippet>> {
        let index = self.snippets.iter().position(|s| s.path() == path)?;
        Some(self.snippets.remove(index))
    }

    /// Remove the snippet with the given path from this module or any
    /// descendant.
    pub fn remove_snippet_recursive(&mut self, path: &str) -> Option<Arc<dyn SourceSnippet>> {
        if let Some(removed) = self.remove_snippet(path) {
            return Some(removed);
        }
        self.submodules
            .iter_mut()
            .find_map(|module| module.remove_snippet_recursive(path))
    }

    pub fn add_submodule(&mut self, module: SourceModule) -> &mut SourceModule {
        self.submodules.push(module);
        let last = self.submodules.len() - 1;
        &mut self.submodules[last]
    }

    pub fn find_submodule(&self, name: &str) -> Option<&SourceModule> {
        self.submodules.iter().find(|m| m.name == name)
    }

    pub fn find_submodule_mut(&mut self, name: &str) -> Option<&mut SourceModule> {
        self.submodules.iter_mut().find(|m| m.name == name)
    }

    pub fn find_or_add_submodule(&mut self, name: &str) -> &mut SourceModule {
        match self.submodules.iter().position(|m| m.name == name) {
            Some(index) => &mut self.submodules[index],
            None => self.add_submodule(SourceModule::new(name)),
        }
    }

    /// Walk a `/`-separated chain of submodule names, creating missing ones.
    /// An empty path names this module.
    pub fn find_or_add_module_path(&mut self, path: &str) -> &mut SourceModule {
        let mut module = self;
        for name in path.split('/').filter(|part| !part.is_empty()) {
            module = module.find_or_add_submodule(name);
        }
        module
    }

    pub fn remove_submodule(&mut self, name: &str) -> Option<SourceModule> {
        let index = self.submodules.iter().position(|m| m.name == name)?;
        Some(self.submodules.remove(index))
    }

    /// Depth-first pre-order walk: this module, then each submodule in order.
    ///
    /// Stops and returns `false` the first time `visitor` returns `false`.
    pub fn visit_all<F>(&self, visitor: &mut F) -> bool
    where
        F: FnMut(&SourceModule) -> bool,
    {
        if !visitor(self) {
            return false;
        }
        self.submodules
            .iter()
            .all(|module| module.visit_all(visitor))
    }

    pub fn find_snippet(&self, path: &str) -> Option<Arc<dyn SourceSnippet>> {
        let mut found = None;
        self.visit_all(&mut |module| {
            found = module.snippets.iter().find(|s| s.path() == path).cloned();
            found.is_none()
        });
        found
    }

    /// Number of snippets in this module and all descendants.
    pub fn snippet_count(&self) -> usize {
        let mut count = 0;
        self.visit_all(&mut |module| {
            count += module.snippets.len();
            true
        });
        count
    }

    /// Sort snippets by path and submodules by name, recursively.
    pub fn sort_lexicographically(&mut self) {
        self.snippets.sort_by(|a, b| a.path().cmp(b.path()));
        self.submodules.sort_by(|a, b| a.name.cmp(&b.name));
        for module in &mut self.submodules {
            module.sort_lexicographically();
        }
    }
}
