//! Text layout and glyph rasterization.
//!
//! Uses cosmic-text with the system font database. A family that is not
//! installed falls back to whatever the database offers; a system without fonts
//! lays out nothing.

use crate::raster::to_skia_transform;
use cosmic_text::{
    Attrs as TextAttrs, Buffer, Color as TextColor, Family, FontSystem, Metrics, Shaping, SwashCache,
};
use designboard_core::shapes::{FontFamily, ShapeTrait, Text};
use kurbo::Affine;
use tiny_skia::{Paint, Pixmap, Rect as SkiaRect};

/// Layout width limit; text drawables only wrap on explicit newlines.
const MAX_LAYOUT_WIDTH: f32 = 4096.0;

/// A text drawable shaped at a given device scale.
pub struct ShapedText {
    buffer: Buffer,
    scale: f64,
}

impl ShapedText {
    /// Laid-out size in display pixels.
    pub fn size(&self, line_height: f64) -> (f64, f64) {
        let mut max_x = 0.0f32;
        let mut max_y = 0.0f32;
        for run in self.buffer.layout_runs() {
            for glyph in run.glyphs.iter() {
                max_x = max_x.max(glyph.x + glyph.w);
            }
            max_y = max_y.max(run.line_top + (line_height * self.scale) as f32);
        }
        let width = max_x as f64 / self.scale;
        let height = (max_y as f64 / self.scale).max(line_height);
        (width, height)
    }
}

/// Owns the font database and glyph cache.
pub struct TextRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRasterizer {
    /// Load the system font database.
    pub fn new() -> Self {
        log::debug!("Loading system fonts");
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    /// Shape `text` at `scale` device pixels per display pixel.
    ///
    /// Returns `None` when the device font size or line height is not a
    /// positive normal `f32`. The measured size is recorded on the drawable
    /// only for 1x layouts.
    pub fn shape(&mut self, text: &Text, scale: f64) -> Option<ShapedText> {
        let font_size = (text.font_size * scale) as f32;
        let line_height = (text.line_height() * scale) as f32;
        if !(font_size.is_normal() && font_size > 0.0 && line_height.is_normal() && line_height > 0.0) {
            log::debug!("Skipping text {} at font size {}", text.id(), text.font_size);
            return None;
        }
        let metrics = Metrics::new(font_size, line_height);

        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, Some(MAX_LAYOUT_WIDTH * scale as f32), None);

        let family = match &text.font_family {
            FontFamily::SansSerif => Family::SansSerif,
            FontFamily::Serif => Family::Serif,
            FontFamily::Monospace => Family::Monospace,
            FontFamily::Named(name) => Family::Name(name),
        };
        buffer.set_text(
            &mut self.font_system,
            text.content(),
            &TextAttrs::new().family(family),
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let shaped = ShapedText { buffer, scale };
        if scale == 1.0 {
            let (width, height) = shaped.size(text.line_height());
            text.set_cached_size(width, height);
        }
        Some(shaped)
    }

    /// Paint shaped glyphs. `transform` maps the drawable's unrotated frame
    /// (display pixels) into the pixmap.
    pub fn draw(&mut self, pixmap: &mut Pixmap, text: &Text, shaped: &mut ShapedText, transform: Affine) {
        let fill = text.style.fill_with_opacity();
        if fill.a == 0 {
            return;
        }
        // Glyph coverage arrives in device pixels relative to the text origin
        let glyph_transform = to_skia_transform(
            transform * Affine::translate(text.position.to_vec2()) * Affine::scale(1.0 / shaped.scale),
        );
        let mut paint = Paint {
            anti_alias: false,
            ..Default::default()
        };
        shaped.buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            TextColor::rgba(fill.r, fill.g, fill.b, fill.a),
            |x, y, w, h, color| {
                if color.a() == 0 {
                    return;
                }
                let Some(rect) = SkiaRect::from_xywh(x as f32, y as f32, w as f32, h as f32) else {
                    return;
                };
                paint.set_color_rgba8(color.r(), color.g(), color.b(), color.a());
                pixmap.fill_rect(rect, &paint, glyph_transform, None);
            },
        );
    }
}
