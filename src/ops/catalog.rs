//! Named component and style catalogs
//!
//! Components are reusable portable subtrees keyed by name, instantiated by
//! the `insert-reference-component` operation. Styles map names to paints
//! for `apply-named-style`.

use std::collections::HashMap;

use crate::scene::{Paint, PortableNode};

/// Reusable subtrees the planner can instantiate by key
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalog {
    components: HashMap<String, PortableNode>,
}

impl ComponentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, template: PortableNode) {
        self.components.insert(key.into(), template);
    }

    pub fn resolve(&self, key: &str) -> Option<&PortableNode> {
        self.components.get(key)
    }
}

/// Named paints the planner can apply by name
#[derive(Debug, Clone, Default)]
pub struct StyleCatalog {
    styles: HashMap<String, Paint>,
}

impl StyleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, paint: Paint) {
        self.styles.insert(name.into(), paint);
    }

    pub fn resolve(&self, name: &str) -> Option<&Paint> {
        self.styles.get(name)
    }
}
