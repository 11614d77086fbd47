//! DesignBoard Render Library
//!
//! CPU rendering surface for the DesignBoard scene editor.
//! Shapes and images are rasterized with tiny-skia; text is laid out with
//! cosmic-text when the `text` feature is enabled.

pub mod encode;
mod raster;
mod renderer;
mod surface;

#[cfg(feature = "text")]
mod text;

pub use encode::{encode_pixmap, jpeg_quality, straight_rgba};
pub use raster::RasterRenderer;
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
pub use surface::RasterSurface;

#[cfg(feature = "text")]
pub use text::{ShapedText, TextRasterizer};

pub use tiny_skia::Pixmap;
