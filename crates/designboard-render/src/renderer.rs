//! Renderer trait abstraction.

use designboard_core::scene::Scene;
use designboard_core::selection::Selection;
use designboard_core::ExportError;
use kurbo::Size;
use peniko::Color;
use thiserror::Error;
use tiny_skia::Pixmap;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Cannot allocate a {width}x{height} pixmap")]
    Allocation { width: u32, height: u32 },
}

impl From<RendererError> for ExportError {
    fn from(err: RendererError) -> Self {
        ExportError::Render(err.to_string())
    }
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single rendered frame.
pub struct RenderContext<'a> {
    /// The scene to render.
    pub scene: &'a Scene,
    /// Selection to decorate, if any. Exports pass `None`.
    pub selection: Option<&'a Selection>,
    /// Canvas size in display pixels.
    pub canvas_size: Size,
    /// Output pixels per display pixel.
    pub scale_factor: f64,
    /// Background color.
    pub background_color: Color,
    /// Selection outline color.
    pub selection_color: Color,
    /// Paint in true z-order. When false, selected drawables are painted last.
    pub preserve_stacking_order: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(scene: &'a Scene, canvas_size: Size) -> Self {
        Self {
            scene,
            selection: None,
            canvas_size,
            scale_factor: 1.0,
            background_color: Color::WHITE,
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            preserve_stacking_order: true,
        }
    }

    /// Set the output scale factor.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the selection to decorate.
    pub fn with_selection(mut self, selection: Option<&'a Selection>) -> Self {
        self.selection = selection;
        self
    }

    /// Set whether selected drawables keep their z-order.
    pub fn with_stacking_order(mut self, preserve: bool) -> Self {
        self.preserve_stacking_order = preserve;
        self
    }

    /// Output size in device pixels.
    pub fn pixel_size(&self) -> (u32, u32) {
        let width = (self.canvas_size.width * self.scale_factor).round().max(0.0);
        let height = (self.canvas_size.height * self.scale_factor).round().max(0.0);
        (width as u32, height as u32)
    }
}

/// Trait for rendering backends.
pub trait Renderer {
    /// Rasterize a frame.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Pixmap>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
