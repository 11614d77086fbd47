//! Editor configuration.

use crate::shapes::{Circle, FontFamily, Rectangle, SerializableColor, Shape, ShapeKind, ShapeStyle, Text};
use crate::surface::SurfaceConfig;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Default attributes for a rectangle added by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleDefaults {
    pub position: Point,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
    pub fill: SerializableColor,
}

impl Default for RectangleDefaults {
    fn default() -> Self {
        Self {
            position: Point::new(50.0, 50.0),
            width: 160.0,
            height: 100.0,
            corner_radius: 8.0,
            fill: SerializableColor::rgb(0x4f, 0x46, 0xe5),
        }
    }
}

/// Default attributes for a circle added by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircleDefaults {
    pub position: Point,
    pub radius: f64,
    pub fill: SerializableColor,
}

impl Default for CircleDefaults {
    fn default() -> Self {
        Self {
            position: Point::new(120.0, 80.0),
            radius: 50.0,
            fill: SerializableColor::rgb(0x22, 0xc5, 0x5e),
        }
    }
}

/// Default attributes for a text added by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDefaults {
    pub position: Point,
    pub content: String,
    pub font_size: f64,
    pub font_family: FontFamily,
    pub fill: SerializableColor,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            position: Point::new(80.0, 80.0),
            content: "Double-click to edit".to_string(),
            font_size: 28.0,
            font_family: FontFamily::default(),
            fill: SerializableColor::rgb(0x11, 0x18, 0x27),
        }
    }
}

/// Defaults for every kind the host can add.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDefaults {
    pub rectangle: RectangleDefaults,
    pub circle: CircleDefaults,
    pub text: TextDefaults,
}

impl ShapeDefaults {
    /// Build a fresh drawable of the given kind.
    pub fn build(&self, kind: ShapeKind) -> Shape {
        match kind {
            ShapeKind::Rectangle => {
                let d = &self.rectangle;
                let mut rect = Rectangle::new(d.position, d.width, d.height).with_corner_radius(d.corner_radius);
                rect.style = ShapeStyle::filled(d.fill);
                Shape::Rectangle(rect)
            }
            ShapeKind::Circle => {
                let d = &self.circle;
                let mut circle = Circle::new(d.position, d.radius);
                circle.style = ShapeStyle::filled(d.fill);
                Shape::Circle(circle)
            }
            ShapeKind::Text => {
                let d = &self.text;
                let mut text = Text::new(d.position, d.content.clone())
                    .with_font_size(d.font_size)
                    .with_font_family(d.font_family.clone());
                text.style = ShapeStyle::filled(d.fill);
                Shape::Text(text)
            }
        }
    }
}

/// Placement rules for decoded images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagePlacement {
    /// Max displayed width as a fraction of the scene width.
    pub max_width_ratio: f64,
    /// Fixed top-left offset of new images.
    pub offset: Point,
}

impl ImagePlacement {
    /// Widest an added image may be displayed on a canvas `canvas_width` wide.
    pub fn max_width(&self, canvas_width: f64) -> f64 {
        canvas_width * self.max_width_ratio
    }
}

impl Default for ImagePlacement {
    fn default() -> Self {
        Self {
            max_width_ratio: 0.6,
            offset: Point::new(100.0, 100.0),
        }
    }
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Working canvas width in display pixels.
    pub width: f64,
    /// Working canvas height in display pixels.
    pub height: f64,
    /// Surface construction options.
    pub surface: SurfaceConfig,
    /// Placement of decoded images.
    pub image: ImagePlacement,
    /// Defaults for added shapes.
    pub defaults: ShapeDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 500.0,
            surface: SurfaceConfig::default(),
            image: ImagePlacement::default(),
            defaults: ShapeDefaults::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a config from JSON. Missing fields use defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.width.is_finite() && self.width > 0.0 && self.height.is_finite() && self.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.image.max_width_ratio.is_finite() && self.image.max_width_ratio > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "image.max_width_ratio must be positive, got {}",
                self.image.max_width_ratio
            )));
        }
        let d = &self.defaults;
        let sizes = [
            ("defaults.rectangle.width", d.rectangle.width),
            ("defaults.rectangle.height", d.rectangle.height),
            ("defaults.circle.radius", d.circle.radius),
            ("defaults.text.font_size", d.text.font_size),
        ];
        for (name, value) in sizes {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, value)));
            }
        }
        if !(d.rectangle.corner_radius.is_finite() && d.rectangle.corner_radius >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "defaults.rectangle.corner_radius must not be negative, got {}",
                d.rectangle.corner_radius
            )));
        }
        Ok(())
    }
}
