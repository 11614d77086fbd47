//! Image drawable for decoded raster images.

use super::{ShapeId, ShapeStyle, ShapeTrait};
use kurbo::{Affine, BezPath, Point, Rect, Shape as KurboShape};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Encoded format an image was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG format.
    Png,
    /// JPEG format.
    Jpeg,
    /// WebP format.
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // GIF: GIF87a / GIF89a
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }
}

impl From<ImageFormat> for ::image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => ::image::ImageFormat::Png,
            ImageFormat::Jpeg => ::image::ImageFormat::Jpeg,
            ImageFormat::WebP => ::image::ImageFormat::WebP,
            ImageFormat::Gif => ::image::ImageFormat::Gif,
        }
    }
}

/// Shared, immutable RGBA8 pixel buffer (straight alpha, row-major).
#[derive(Clone, PartialEq, Eq)]
pub struct PixelData(Arc<Vec<u8>>);

impl PixelData {
    pub fn new(rgba: Vec<u8>) -> Self {
        Self(Arc::new(rgba))
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PixelData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelData({} bytes)", self.0.len())
    }
}

/// An image drawable holding decoded pixels and a uniform display scale.
#[derive(Debug, Clone)]
pub struct Image {
    pub(crate) id: ShapeId,
    /// Top-left corner position.
    pub position: Point,
    /// Decoded image width in pixels.
    pub source_width: u32,
    /// Decoded image height in pixels.
    pub source_height: u32,
    /// Uniform display scale (1.0 = natural size).
    pub scale: f64,
    /// Format the pixels were decoded from.
    pub format: ImageFormat,
    /// Rotation angle in radians (around center).
    pub rotation: f64,
    /// Style properties. The fill is kept for uniformity but images paint pixels only.
    pub style: ShapeStyle,
    pixels: PixelData,
}

impl Image {
    /// Create an image drawable from decoded RGBA8 pixels.
    pub fn new(
        position: Point,
        pixels: PixelData,
        source_width: u32,
        source_height: u32,
        format: ImageFormat,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            source_width,
            source_height,
            scale: 1.0,
            format,
            rotation: 0.0,
            style: ShapeStyle::default(),
            pixels,
        }
    }

    /// Set the display scale.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Scale that fits `source_width` within `max_width`; only ever shrinks.
    pub fn fit_scale(source_width: u32, max_width: f64) -> f64 {
        if source_width == 0 {
            return 1.0;
        }
        (max_width / source_width as f64).min(1.0)
    }

    /// Displayed width.
    pub fn width(&self) -> f64 {
        self.source_width as f64 * self.scale
    }

    /// Displayed height.
    pub fn height(&self) -> f64 {
        self.source_height as f64 * self.scale
    }

    /// Decoded RGBA8 pixels.
    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    /// Get the bounding rectangle.
    pub fn as_rect(&self) -> Rect {
        Rect::new(
            self.position.x,
            self.position.y,
            self.position.x + self.width(),
            self.position.y + self.height(),
        )
    }
}

impl ShapeTrait for Image {
    fn id(&self) -> ShapeId {
        self.id
    }

    fn bounds(&self) -> Rect {
        self.as_rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_rect().inflate(tolerance, tolerance).contains(point)
    }

    fn to_path(&self) -> BezPath {
        self.as_rect().to_path(0.1)
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
        self.scale *= coeffs[0].abs().min(coeffs[3].abs());
    }
}
