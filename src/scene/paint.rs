//! Paint attributes: solid colors, image fills, and strokes

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from parsing color strings
#[derive(Debug, Error)]
pub enum ColorError {
    #[error("invalid color '{value}': expected #rgb or #rrggbb")]
    Malformed { value: String },
}

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a hex color string: `#rgb` or `#rrggbb`
    pub fn from_hex(value: &str) -> Result<Self, ColorError> {
        let malformed = || ColorError::Malformed {
            value: value.to_string(),
        };

        let digits = value.strip_prefix('#').ok_or_else(malformed)?;
        match digits.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = c.to_digit(16).ok_or_else(malformed)? as u8;
                    out[i] = v * 16 + v;
                }
                Ok(Self::new(out[0], out[1], out[2]))
            }
            6 => {
                let parse =
                    |s: &str| u8::from_str_radix(s, 16).map_err(|_| malformed());
                Ok(Self::new(
                    parse(&digits[0..2])?,
                    parse(&digits[2..4])?,
                    parse(&digits[4..6])?,
                ))
            }
            _ => Err(malformed()),
        }
    }

    /// Format as a `#rrggbb` hex string
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Raw image bytes, carried base64-encoded on the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes(pub Vec<u8>);

impl Serialize for ImageBytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ImageBytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.as_bytes())
            .map(ImageBytes)
            .map_err(serde::de::Error::custom)
    }
}

/// A single fill applied to a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Paint {
    Solid {
        color: Color,
        #[serde(default = "default_opacity")]
        opacity: f64,
    },
    Image {
        bytes: ImageBytes,
        #[serde(default = "default_opacity")]
        opacity: f64,
    },
}

fn default_opacity() -> f64 {
    1.0
}

impl Paint {
    /// A fully opaque solid fill
    pub fn solid(color: Color) -> Self {
        Paint::Solid {
            color,
            opacity: 1.0,
        }
    }

    /// A fully opaque image fill
    pub fn image(bytes: Vec<u8>) -> Self {
        Paint::Image {
            bytes: ImageBytes(bytes),
            opacity: 1.0,
        }
    }
}

/// Stroke attributes for a node's outline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub weight: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_long_hex() {
        let c = Color::from_hex("#2196f3").unwrap();
        assert_eq!(c, Color::new(0x21, 0x96, 0xf3));
    }

    #[test]
    fn test_parse_short_hex() {
        let c = Color::from_hex("#f00").unwrap();
        assert_eq!(c, Color::new(255, 0, 0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Color::from_hex("red").is_err());
        assert!(Color::from_hex("#12345").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Color::from_hex("#336699").unwrap();
        assert_eq!(c.to_hex(), "#336699");
    }

    #[test]
    fn test_image_bytes_serialize_as_base64() {
        let paint = Paint::image(vec![1, 2, 3, 4]);
        let json = serde_json::to_string(&paint).unwrap();
        assert!(json.contains("AQIDBA=="));

        let back: Paint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, paint);
    }
}
