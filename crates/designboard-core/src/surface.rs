//! Rendering surface abstraction driven by the scene editor.

use crate::scene::Scene;
use crate::selection::Selection;
use crate::shapes::{SerializableColor, Shape, ShapeId};
use kurbo::Size;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name of the downloaded export artifact.
pub const EXPORT_FILE_NAME: &str = "design.png";

/// Export errors.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export size {width}x{height} (multiplier {multiplier})")]
    InvalidSize { width: f64, height: f64, multiplier: f64 },
    #[error("Rendering failed: {0}")]
    Render(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

/// Configuration a surface is constructed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Canvas background color.
    pub background_color: SerializableColor,
    /// Keep selected drawables at their z-order while displayed.
    /// When false the displayed frame paints the selection on top.
    pub preserve_stacking_order: bool,
    /// Allow pointer selection and show selection outlines.
    pub selection_enabled: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            background_color: SerializableColor::white(),
            preserve_stacking_order: true,
            selection_enabled: true,
        }
    }
}

/// Encoded raster format for exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    #[default]
    Png,
    Jpeg,
}

impl RasterFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
        }
    }
}

/// Parameters of a raster export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Output encoding.
    pub format: RasterFormat,
    /// Resolution multiplier relative to the display size.
    pub multiplier: f64,
    /// Encoder quality in 0..=1 (ignored by lossless formats).
    pub quality: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: RasterFormat::Png,
            multiplier: 2.0,
            quality: 1.0,
        }
    }
}

impl ExportOptions {
    /// Output pixel size for a canvas of the given display size.
    pub fn output_size(&self, width: f64, height: f64) -> Result<(u32, u32), ExportError> {
        let invalid = || ExportError::InvalidSize {
            width,
            height,
            multiplier: self.multiplier,
        };
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(invalid());
        }
        let out_w = (width * self.multiplier).round();
        let out_h = (height * self.multiplier).round();
        if !(1.0..=Self::MAX_DIMENSION).contains(&out_w) || !(1.0..=Self::MAX_DIMENSION).contains(&out_h) {
            return Err(invalid());
        }
        Ok((out_w as u32, out_h as u32))
    }

    /// Largest accepted output dimension in pixels.
    pub const MAX_DIMENSION: f64 = 16384.0;
}

/// A surface that paints the scene and rasterizes it on request.
///
/// The surface holds a derived projection of the scene (which drawables it has
/// been told about, its last painted frame); the editor owns the truth and
/// resyncs the surface with an explicit `request_render` after each mutation.
pub trait RenderSurface {
    /// Configuration the surface was constructed with.
    fn config(&self) -> &SurfaceConfig;

    /// Working canvas size in display pixels.
    fn canvas_size(&self) -> Size;

    /// A drawable was appended to the scene.
    fn object_added(&mut self, shape: &Shape);

    /// A drawable was removed from the scene.
    fn object_removed(&mut self, id: ShapeId);

    /// Every drawable was removed.
    fn cleared(&mut self);

    /// Repaint the displayed frame from the current scene.
    fn request_render(&mut self, scene: &Scene, selection: &Selection);

    /// Rasterize the full scene and encode it. Must not depend on selection.
    fn export(&mut self, scene: &Scene, options: &ExportOptions) -> Result<Vec<u8>, ExportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_options() {
        let options = ExportOptions::default();
        assert_eq!(options.format, RasterFormat::Png);
        assert!((options.multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(options.output_size(800.0, 500.0).unwrap(), (1600, 1000));
    }

    #[test]
    fn test_invalid_multipliers() {
        for multiplier in [0.0, -1.0, f64::NAN, f64::INFINITY, 1e6] {
            let options = ExportOptions { multiplier, ..Default::default() };
            assert!(matches!(
                options.output_size(800.0, 500.0),
                Err(ExportError::InvalidSize { .. })
            ));
        }
    }

    #[test]
    fn test_fractional_multiplier_rounds() {
        let options = ExportOptions { multiplier: 1.5, ..Default::default() };
        assert_eq!(options.output_size(801.0, 333.0).unwrap(), (1202, 500));
    }

    #[test]
    fn test_surface_config_defaults_from_partial_json() {
        let config: SurfaceConfig = serde_json::from_str(r##"{"background_color":"#000000"}"##).unwrap();
        assert_eq!(config.background_color, SerializableColor::black());
        assert!(config.preserve_stacking_order);
        assert!(config.selection_enabled);
    }
}
