//! Text drawable.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use uuid::Uuid;

/// Font family requested by a text drawable.
///
/// Generic CSS families map to the matching system fallback; anything else is
/// looked up by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FontFamily {
    SansSerif,
    Serif,
    Monospace,
    Named(String),
}

impl FontFamily {
    /// Parse a CSS-style family name.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "sans-serif" | "sans" => FontFamily::SansSerif,
            "serif" => FontFamily::Serif,
            "monospace" | "mono" => FontFamily::Monospace,
            _ => FontFamily::Named(name.trim().to_string()),
        }
    }

    /// Get the family name as written in CSS.
    pub fn name(&self) -> &str {
        match self {
            FontFamily::SansSerif => "sans-serif",
            FontFamily::Serif => "serif",
            FontFamily::Monospace => "monospace",
            FontFamily::Named(name) => name,
        }
    }
}

impl Default for FontFamily {
    fn default() -> Self {
        FontFamily::Named("Arial".to_string())
    }
}

impl From<String> for FontFamily {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<FontFamily> for String {
    fn from(family: FontFamily) -> Self {
        family.name().to_string()
    }
}

/// A text drawable.
#[derive(Debug)]
pub struct Text {
    pub(crate) id: ShapeId,
    /// Position (top-left corner of text bounding box).
    pub position: Point,
    /// The text content.
    content: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Font family.
    pub font_family: FontFamily,
    /// Rotation angle in radians (around center).
    pub rotation: f64,
    /// Style properties.
    pub style: ShapeStyle,
    /// Layout size (width, height) measured by the renderer at 1x.
    /// If None, approximate bounds are used.
    cached_size: RwLock<Option<(f64, f64)>>,
}

impl Clone for Text {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            position: self.position,
            content: self.content.clone(),
            font_size: self.font_size,
            font_family: self.font_family.clone(),
            rotation: self.rotation,
            style: self.style.clone(),
            // Clone the cached size value, not the lock
            cached_size: RwLock::new(self.cached_size.read().ok().and_then(|guard| *guard)),
        }
    }
}

impl Text {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 28.0;

    /// Line height as a multiple of the font size.
    pub const LINE_HEIGHT: f64 = 1.16;

    /// Create a new text drawable.
    pub fn new(position: Point, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            content: content.into(),
            font_size: Self::DEFAULT_FONT_SIZE,
            font_family: FontFamily::default(),
            rotation: 0.0,
            style: ShapeStyle::default(),
            cached_size: RwLock::new(None),
        }
    }

    /// Set the font size.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = size;
        self
    }

    /// Set the font family.
    pub fn with_font_family(mut self, family: FontFamily) -> Self {
        self.font_family = family;
        self
    }

    /// Get the text content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replace the text content.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.invalidate_cache();
    }

    /// Record the layout size measured by the renderer.
    /// Uses interior mutability so this can be called while painting.
    pub fn set_cached_size(&self, width: f64, height: f64) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = Some((width, height));
        }
    }

    /// Clear the cached size (call when text properties change).
    pub fn invalidate_cache(&self) {
        if let Ok(mut cache) = self.cached_size.write() {
            *cache = None;
        }
    }

    /// Line height in pixels.
    pub fn line_height(&self) -> f64 {
        self.font_size * Self::LINE_HEIGHT
    }

    /// Approximate width based on character count and font size.
    fn approximate_width(&self) -> f64 {
        let max_line_len = self
            .content
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        max_line_len as f64 * self.font_size * 0.55
    }

    /// Approximate height based on font size and number of lines.
    fn approximate_height(&self) -> f64 {
        let mut line_count = self.content.lines().count().max(1);
        // lines() drops a trailing empty line
        if self.content.ends_with('\n') {
            line_count += 1;
        }
        line_count as f64 * self.line_height()
    }
}

impl ShapeTrait for Text {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        let (width, height) = self
            .cached_size
            .read()
            .ok()
            .and_then(|guard| *guard)
            .unwrap_or_else(|| (self.approximate_width(), self.approximate_height()));
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + width.max(1.0),
            self.position.y + height,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        // Glyph outlines belong to the renderer; the box is enough for outlines
        self.bounds().to_path(0.1)
    }

    fn style(&self) -> &ShapeStyle {
        &self.style
    }

    fn style_mut(&mut self) -> &mut ShapeStyle {
        &mut self.style
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
        let coeffs = affine.as_coeffs();
        let scale = (coeffs[0].abs() + coeffs[3].abs()) / 2.0;
        if (scale - 1.0).abs() > f64::EPSILON {
            self.font_size *= scale;
            self.invalidate_cache();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_creation() {
        let text = Text::new(Point::new(80.0, 80.0), "Hello");
        assert_eq!(text.content(), "Hello");
        assert!((text.font_size - Text::DEFAULT_FONT_SIZE).abs() < f64::EPSILON);
        assert_eq!(text.font_family.name(), "Arial");
    }

    #[test]
    fn test_font_family_names() {
        assert_eq!(FontFamily::from_name("Serif"), FontFamily::Serif);
        assert_eq!(FontFamily::from_name("mono"), FontFamily::Monospace);
        assert_eq!(FontFamily::from_name(" Helvetica "), FontFamily::Named("Helvetica".into()));
        assert_eq!(String::from(FontFamily::SansSerif), "sans-serif");
    }

    #[test]
    fn test_hit_test() {
        let text = Text::new(Point::new(100.0, 100.0), "Hello World");
        let center = text.bounds().center();
        assert!(text.hit_test(center, 0.0));
        assert!(!text.hit_test(Point::new(0.0, 0.0), 0.0));
    }

    #[test]
    fn test_cached_size_overrides_estimate() {
        let mut text = Text::new(Point::new(0.0, 0.0), "Hi");
        text.set_cached_size(123.0, 40.0);
        assert!((text.bounds().width() - 123.0).abs() < f64::EPSILON);

        text.set_content("Changed");
        assert!((text.bounds().width() - 123.0).abs() > f64::EPSILON);
    }

    #[test]
    fn test_multiline_height() {
        let text = Text::new(Point::ZERO, "a\nb\n").with_font_size(10.0);
        assert!((text.bounds().height() - 3.0 * 10.0 * Text::LINE_HEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_scale_font() {
        let mut text = Text::new(Point::new(10.0, 10.0), "x").with_font_size(20.0);
        let origin = text.position.to_vec2();
        text.transform(Affine::translate(origin) * Affine::scale(2.0) * Affine::translate(-origin));
        assert!((text.font_size - 40.0).abs() < 1e-9);
        assert_eq!(text.position, Point::new(10.0, 10.0));
    }
}
