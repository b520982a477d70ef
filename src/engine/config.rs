//! Configuration for the propagation engine

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading an engine profile
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read engine profile: {0}")]
    IoError(#[from] std::io::Error),
    #[error("failed to parse engine profile TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Tuning knobs for geometry propagation
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Leaf elements with both dimensions at or under this size are treated
    /// as icons: repositioned during scaling, never resized
    pub icon_size_threshold: f64,

    /// Positional comparisons within this distance count as equal
    pub gap_tolerance: f64,

    /// Grid cells diverging from the reference cell by more than this many
    /// units are forced back to the reference size
    pub grid_divergence_tolerance: f64,

    /// Width/height ratio above which an element counts as roughly square
    /// for circularity detection
    pub squareness_ratio: f64,

    /// Containers are never shrunk below this size on either axis
    pub min_container_size: f64,

    /// Known-good fallback typeface for degraded text operations
    pub default_font_family: String,

    /// Known-good fallback style for degraded text operations
    pub default_font_style: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            icon_size_threshold: 48.0,
            gap_tolerance: 0.5,
            grid_divergence_tolerance: 1.0,
            squareness_ratio: 0.9,
            min_container_size: 1.0,
            default_font_family: "Inter".to_string(),
            default_font_style: "Regular".to_string(),
        }
    }
}

/// TOML structure for deserializing engine profiles
#[derive(Deserialize)]
struct TomlProfile {
    geometry: Option<TomlGeometry>,
    fonts: Option<TomlFonts>,
}

#[derive(Deserialize)]
struct TomlGeometry {
    icon_size_threshold: Option<f64>,
    gap_tolerance: Option<f64>,
    grid_divergence_tolerance: Option<f64>,
    squareness_ratio: Option<f64>,
    min_container_size: Option<f64>,
}

#[derive(Deserialize)]
struct TomlFonts {
    default_family: Option<String>,
    default_style: Option<String>,
}

impl EngineConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the icon size threshold
    pub fn with_icon_size_threshold(mut self, threshold: f64) -> Self {
        self.icon_size_threshold = threshold;
        self
    }

    /// Set the gap tolerance
    pub fn with_gap_tolerance(mut self, tolerance: f64) -> Self {
        self.gap_tolerance = tolerance;
        self
    }

    /// Set the fallback typeface
    pub fn with_default_font(
        mut self,
        family: impl Into<String>,
        style: impl Into<String>,
    ) -> Self {
        self.default_font_family = family.into();
        self.default_font_style = style.into();
        self
    }

    /// Load a profile from a TOML file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load a profile from a TOML string; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlProfile = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(geometry) = parsed.geometry {
            if let Some(v) = geometry.icon_size_threshold {
                config.icon_size_threshold = v;
            }
            if let Some(v) = geometry.gap_tolerance {
                config.gap_tolerance = v;
            }
            if let Some(v) = geometry.grid_divergence_tolerance {
                config.grid_divergence_tolerance = v;
            }
            if let Some(v) = geometry.squareness_ratio {
                config.squareness_ratio = v;
            }
            if let Some(v) = geometry.min_container_size {
                config.min_container_size = v;
            }
        }
        if let Some(fonts) = parsed.fonts {
            if let Some(v) = fonts.default_family {
                config.default_font_family = v;
            }
            if let Some(v) = fonts.default_style {
                config.default_font_style = v;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.icon_size_threshold, 48.0);
        assert_eq!(config.gap_tolerance, 0.5);
        assert_eq!(config.grid_divergence_tolerance, 1.0);
        assert_eq!(config.default_font_family, "Inter");
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_icon_size_threshold(32.0)
            .with_default_font("Roboto", "Medium");

        assert_eq!(config.icon_size_threshold, 32.0);
        assert_eq!(config.default_font_family, "Roboto");
        assert_eq!(config.default_font_style, "Medium");
    }

    #[test]
    fn test_toml_profile_partial_override() {
        let toml_str = r#"
[geometry]
icon_size_threshold = 40.0

[fonts]
default_family = "Source Sans"
"#;
        let config = EngineConfig::from_toml_str(toml_str).expect("Should parse");
        assert_eq!(config.icon_size_threshold, 40.0);
        assert_eq!(config.gap_tolerance, 0.5);
        assert_eq!(config.default_font_family, "Source Sans");
        assert_eq!(config.default_font_style, "Regular");
    }

    #[test]
    fn test_invalid_toml_error() {
        let invalid = "this is not valid toml {{{{";
        assert!(EngineConfig::from_toml_str(invalid).is_err());
    }
}
