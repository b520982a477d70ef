//! Font resolution for text mutations
//!
//! Text content cannot change until its typeface is loaded in the host. The
//! resolver is an external capability; when the exact requested face fails
//! to load, text operations degrade to the known-good default face instead
//! of aborting.

use std::collections::HashSet;

use crate::engine::EngineConfig;

/// External typeface resolution capability
pub trait FontResolver {
    /// Attempt to load a typeface; `true` when the face is usable
    fn load(&self, family: &str, style: &str) -> bool;
}

/// In-memory catalog of loadable typefaces
#[derive(Debug, Clone, Default)]
pub struct FontCatalog {
    available: HashSet<(String, String)>,
}

impl FontCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog seeded with the common faces of the default family
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for style in ["Regular", "Medium", "Semi Bold", "Bold"] {
            catalog.insert("Inter", style);
        }
        catalog
    }

    pub fn insert(&mut self, family: impl Into<String>, style: impl Into<String>) {
        self.available.insert((family.into(), style.into()));
    }
}

impl FontResolver for FontCatalog {
    fn load(&self, family: &str, style: &str) -> bool {
        self.available
            .contains(&(family.to_string(), style.to_string()))
    }
}

/// Resolve the face a text mutation should use: the requested one when it
/// loads, the configured default otherwise
pub fn ensure_font(
    resolver: &dyn FontResolver,
    config: &EngineConfig,
    family: &str,
    style: &str,
) -> (String, String) {
    if resolver.load(family, style) {
        return (family.to_string(), style.to_string());
    }
    log::warn!(
        "font {family} {style} failed to load, falling back to {} {}",
        config.default_font_family,
        config.default_font_style
    );
    (
        config.default_font_family.clone(),
        config.default_font_style.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads_seeded_faces() {
        let catalog = FontCatalog::with_defaults();
        assert!(catalog.load("Inter", "Bold"));
        assert!(!catalog.load("Inter", "Black"));
        assert!(!catalog.load("Comic Sans", "Regular"));
    }

    #[test]
    fn test_ensure_font_degrades_to_default() {
        let catalog = FontCatalog::with_defaults();
        let config = EngineConfig::default();

        let (family, style) = ensure_font(&catalog, &config, "Inter", "Medium");
        assert_eq!((family.as_str(), style.as_str()), ("Inter", "Medium"));

        let (family, style) = ensure_font(&catalog, &config, "Missing Face", "Black");
        assert_eq!((family.as_str(), style.as_str()), ("Inter", "Regular"));
    }
}
