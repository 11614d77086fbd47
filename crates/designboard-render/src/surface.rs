//! Raster rendering surface.

use crate::encode::encode_pixmap;
use crate::raster::RasterRenderer;
use crate::renderer::{RenderContext, Renderer};
use designboard_core::scene::Scene;
use designboard_core::selection::Selection;
use designboard_core::shapes::{Shape, ShapeId};
use designboard_core::{EditorConfig, ExportError, ExportOptions, RenderSurface, SurfaceConfig};
use kurbo::Size;
use std::collections::HashSet;
use tiny_skia::Pixmap;

/// A CPU surface holding the last displayed frame.
///
/// Tracks which drawables it has been told about; the pixels of the displayed
/// frame are repainted from the scene on every `request_render`.
pub struct RasterSurface {
    config: SurfaceConfig,
    canvas_size: Size,
    renderer: RasterRenderer,
    known: HashSet<ShapeId>,
    frame: Option<Pixmap>,
    render_count: usize,
}

impl RasterSurface {
    /// Create a surface for a canvas of `width` x `height` display pixels.
    pub fn new(config: SurfaceConfig, width: f64, height: f64) -> Self {
        Self {
            config,
            canvas_size: Size::new(width, height),
            renderer: RasterRenderer::new(),
            known: HashSet::new(),
            frame: None,
            render_count: 0,
        }
    }

    /// Create a surface matching an editor configuration.
    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.surface.clone(), config.width, config.height)
    }

    /// The last displayed frame, if one was painted.
    pub fn frame(&self) -> Option<&Pixmap> {
        self.frame.as_ref()
    }

    /// Number of repaint requests served.
    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Whether the surface was told about a drawable.
    pub fn knows(&self, id: ShapeId) -> bool {
        self.known.contains(&id)
    }

    /// Number of drawables the surface was told about.
    pub fn known_count(&self) -> usize {
        self.known.len()
    }
}

impl RenderSurface for RasterSurface {
    fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    fn object_added(&mut self, shape: &Shape) {
        self.known.insert(shape.id());
    }

    fn object_removed(&mut self, id: ShapeId) {
        self.known.remove(&id);
        self.renderer.forget(id);
    }

    fn cleared(&mut self) {
        self.known.clear();
        self.renderer.clear_cache();
    }

    fn request_render(&mut self, scene: &Scene, selection: &Selection) {
        self.render_count += 1;
        let selection = self.config.selection_enabled.then_some(selection);
        let ctx = RenderContext::new(scene, self.canvas_size)
            .with_background(self.config.background_color.into())
            .with_selection(selection)
            .with_stacking_order(self.config.preserve_stacking_order);
        match self.renderer.render(&ctx) {
            Ok(pixmap) => self.frame = Some(pixmap),
            Err(e) => log::warn!("Failed to paint frame: {}", e),
        }
    }

    fn export(&mut self, scene: &Scene, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        // Validates the multiplier and output bounds before any allocation
        let (width, height) = options.output_size(self.canvas_size.width, self.canvas_size.height)?;
        let ctx = RenderContext::new(scene, self.canvas_size)
            .with_scale_factor(options.multiplier)
            .with_background(self.config.background_color.into());
        let pixmap = self.renderer.render(&ctx)?;
        debug_assert_eq!((pixmap.width(), pixmap.height()), (width, height));
        log::debug!("Encoding {}x{} {}", width, height, options.format.mime_type());
        encode_pixmap(&pixmap, options.format, options.quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use designboard_core::SceneEditor;

    fn editor() -> SceneEditor<RasterSurface> {
        let config = EditorConfig::default();
        let surface = RasterSurface::from_config(&config);
        SceneEditor::new(config, surface)
    }

    #[test]
    fn test_tracks_known_drawables() {
        let mut editor = editor();
        let rect = editor.add_rectangle();
        let circle = editor.add_circle();
        assert!(editor.surface().knows(rect));
        assert_eq!(editor.surface().known_count(), 2);

        editor.delete_selected();
        assert!(!editor.surface().knows(circle));
        editor.clear_all();
        assert_eq!(editor.surface().known_count(), 0);
    }

    #[test]
    fn test_frame_painted_per_mutation() {
        let mut editor = editor();
        assert!(editor.surface().frame().is_none());
        editor.add_rectangle();
        let frame = editor.surface().frame().unwrap();
        assert_eq!((frame.width(), frame.height()), (800, 500));
        assert_eq!(editor.surface().render_count(), 1);
    }

    #[test]
    fn test_vanishing_text_renders() {
        let mut editor = editor();
        editor.add_text();
        assert!(editor.scale_selected(1e-50));
        assert_eq!(editor.surface().render_count(), 2);
        assert!(editor.export_raster(&ExportOptions::default()).is_ok());
    }

    #[test]
    fn test_export_ignores_selection() {
        let mut editor = editor();
        editor.add_rectangle();
        let selected = editor.export_raster(&ExportOptions::default()).unwrap();
        editor.clear_selection();
        let unselected = editor.export_raster(&ExportOptions::default()).unwrap();
        assert_eq!(selected, unselected);
    }
}
