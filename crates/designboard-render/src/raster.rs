//! CPU renderer built on tiny-skia.

use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
#[cfg(feature = "text")]
use crate::text::TextRasterizer;
use designboard_core::shapes::{Image, SerializableColor, Shape, ShapeId, ShapeTrait, Text};
use kurbo::{Affine, BezPath, PathEl, Shape as KurboShape};
use peniko::Color;
use std::collections::HashMap;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, StrokeDash, Transform,
};

/// Selection outline width in display pixels.
const SELECTION_STROKE_WIDTH: f64 = 1.5;
/// Gap between a drawable and its selection outline.
const SELECTION_PADDING: f64 = 4.0;

/// Convert a kurbo affine into a tiny-skia transform.
pub(crate) fn to_skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

/// Convert a kurbo path into a tiny-skia path. Returns `None` for empty paths.
fn to_skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let mut builder = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => builder.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => builder.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(p1, p2) => builder.quad_to(p1.x as f32, p1.y as f32, p2.x as f32, p2.y as f32),
            PathEl::CurveTo(p1, p2, p3) => builder.cubic_to(
                p1.x as f32,
                p1.y as f32,
                p2.x as f32,
                p2.y as f32,
                p3.x as f32,
                p3.y as f32,
            ),
            PathEl::ClosePath => builder.close(),
        }
    }
    builder.finish()
}

fn solid_paint(color: SerializableColor) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

/// Straight-alpha RGBA8 pixels to a premultiplied pixmap.
fn image_pixmap(image: &Image) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.source_width, image.source_height)?;
    let src = image.pixels().as_slice();
    if src.len() != pixmap.pixels().len() * 4 {
        return None;
    }
    for (dst, px) in pixmap.pixels_mut().iter_mut().zip(src.chunks_exact(4)) {
        *dst = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
    }
    Some(pixmap)
}

/// CPU renderer for scenes.
///
/// Keeps a cache of premultiplied image pixmaps keyed by drawable id; image
/// pixels never change after creation so entries stay valid until removed.
#[derive(Default)]
pub struct RasterRenderer {
    /// Decoded image pixmaps by drawable id.
    image_cache: HashMap<ShapeId, Pixmap>,
    /// Created on the first text drawable.
    #[cfg(feature = "text")]
    text: Option<TextRasterizer>,
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop cached data for a removed drawable.
    pub fn forget(&mut self, id: ShapeId) {
        self.image_cache.remove(&id);
    }

    /// Drop all cached image data.
    pub fn clear_cache(&mut self) {
        self.image_cache.clear();
    }

    /// Number of cached image pixmaps.
    pub fn cached_images(&self) -> usize {
        self.image_cache.len()
    }

    fn fill_path(pixmap: &mut Pixmap, path: &BezPath, color: SerializableColor, transform: Affine) {
        if color.a == 0 {
            return;
        }
        let Some(path) = to_skia_path(path) else {
            return;
        };
        pixmap.fill_path(
            &path,
            &solid_paint(color),
            FillRule::Winding,
            to_skia_transform(transform),
            None,
        );
    }

    fn render_shape(&mut self, pixmap: &mut Pixmap, shape: &Shape, base: Affine, scale: f64) {
        match shape {
            Shape::Text(text) => self.render_text(pixmap, shape, text, base, scale),
            Shape::Image(image) => {
                let transform = base * shape.rotation_transform();
                self.render_image(pixmap, image, transform);
            }
            _ => {
                let transform = base * shape.rotation_transform();
                Self::fill_path(pixmap, &shape.to_path(), shape.style().fill_with_opacity(), transform);
            }
        }
    }

    #[cfg(feature = "text")]
    fn render_text(
        &mut self,
        pixmap: &mut Pixmap,
        shape: &Shape,
        text: &Text,
        base: Affine,
        scale: f64,
    ) {
        let rasterizer = self.text.get_or_insert_with(TextRasterizer::new);
        // A 1x layout records the measured size, which the rotation center depends on
        let Some(mut shaped) = rasterizer.shape(text, scale) else {
            return;
        };
        let transform = base * shape.rotation_transform();
        rasterizer.draw(pixmap, text, &mut shaped, transform);
    }

    #[cfg(not(feature = "text"))]
    fn render_text(
        &mut self,
        _pixmap: &mut Pixmap,
        _shape: &Shape,
        _text: &Text,
        _base: Affine,
        _scale: f64,
    ) {
    }

    fn render_image(&mut self, pixmap: &mut Pixmap, image: &Image, transform: Affine) {
        let id = image.id();
        if !self.image_cache.contains_key(&id) {
            match image_pixmap(image) {
                Some(decoded) => {
                    self.image_cache.insert(id, decoded);
                }
                None => {
                    log::warn!(
                        "Image {} has no valid {}x{} pixel buffer",
                        id,
                        image.source_width,
                        image.source_height
                    );
                    Self::render_image_placeholder(pixmap, image, transform);
                    return;
                }
            }
        }
        let Some(source) = self.image_cache.get(&id) else {
            return;
        };
        let image_transform = transform
            * Affine::translate(image.position.to_vec2())
            * Affine::scale(image.scale);
        let paint = PixmapPaint {
            opacity: image.style.opacity.clamp(0.0, 1.0) as f32,
            quality: FilterQuality::Bilinear,
            ..Default::default()
        };
        pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, to_skia_transform(image_transform), None);
    }

    /// Render a placeholder for images whose pixels are unusable.
    fn render_image_placeholder(pixmap: &mut Pixmap, image: &Image, transform: Affine) {
        let path = image.as_rect().to_path(0.1);
        Self::fill_path(pixmap, &path, SerializableColor::rgb(200, 200, 200), transform);
    }

    fn render_selection_outline(pixmap: &mut Pixmap, shape: &Shape, base: Affine, color: Color, scale: f64) {
        let bounds = shape.bounds().inflate(SELECTION_PADDING, SELECTION_PADDING);
        let Some(path) = to_skia_path(&bounds.to_path(0.1)) else {
            return;
        };
        let stroke = Stroke {
            width: (SELECTION_STROKE_WIDTH / scale.max(f64::EPSILON)) as f32,
            dash: StrokeDash::new(vec![4.0, 4.0], 0.0),
            ..Default::default()
        };
        let transform = base * shape.rotation_transform();
        pixmap.stroke_path(
            &path,
            &solid_paint(SerializableColor::from(color)),
            &stroke,
            to_skia_transform(transform),
            None,
        );
    }
}

impl Renderer for RasterRenderer {
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Pixmap> {
        let (width, height) = ctx.pixel_size();
        let mut pixmap = Pixmap::new(width, height).ok_or(RendererError::Allocation { width, height })?;
        let background = SerializableColor::from(self.background_color(ctx));
        pixmap.fill(tiny_skia::Color::from_rgba8(
            background.r,
            background.g,
            background.b,
            background.a,
        ));

        let scale = ctx.scale_factor;
        let base = Affine::scale(scale);
        let is_selected = |shape: &Shape| ctx.selection.is_some_and(|s| s.contains(shape.id()));

        if ctx.preserve_stacking_order {
            for shape in ctx.scene.shapes_ordered() {
                self.render_shape(&mut pixmap, shape, base, scale);
            }
        } else {
            // Selected drawables are lifted above the rest, keeping their relative order
            for shape in ctx.scene.shapes_ordered().filter(|s| !is_selected(s)) {
                self.render_shape(&mut pixmap, shape, base, scale);
            }
            for shape in ctx.scene.shapes_ordered().filter(|s| is_selected(s)) {
                self.render_shape(&mut pixmap, shape, base, scale);
            }
        }

        if let Some(selection) = ctx.selection {
            for &id in selection.ids() {
                if let Some(shape) = ctx.scene.get_shape(id) {
                    Self::render_selection_outline(&mut pixmap, shape, base, ctx.selection_color, scale);
                }
            }
        }

        Ok(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use designboard_core::scene::Scene;
    use designboard_core::selection::Selection;
    use designboard_core::shapes::{Circle, ImageFormat, PixelData, Rectangle, ShapeStyle};
    use kurbo::{Point, Size};

    fn pixel(pixmap: &Pixmap, x: u32, y: u32) -> [u8; 4] {
        let c = pixmap.pixel(x, y).unwrap().demultiply();
        [c.red(), c.green(), c.blue(), c.alpha()]
    }

    fn filled_rect(x: f64, y: f64, w: f64, h: f64, color: SerializableColor) -> Shape {
        let mut rect = Rectangle::new(Point::new(x, y), w, h);
        rect.style = ShapeStyle::filled(color);
        Shape::Rectangle(rect)
    }

    #[test]
    fn test_transform_conversion() {
        let t = to_skia_transform(Affine::translate((10.0, 20.0)) * Affine::scale(2.0));
        assert_eq!((t.sx, t.sy, t.tx, t.ty), (2.0, 2.0, 10.0, 20.0));
    }

    #[test]
    fn test_empty_path() {
        assert!(to_skia_path(&BezPath::new()).is_none());
    }

    #[test]
    fn test_background_fill() {
        let scene = Scene::new();
        let ctx = RenderContext::new(&scene, Size::new(20.0, 10.0))
            .with_background(Color::from_rgba8(255, 0, 0, 255));
        let pixmap = RasterRenderer::new().render(&ctx).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (20, 10));
        assert_eq!(pixel(&pixmap, 5, 5), [255, 0, 0, 255]);
    }

    #[test]
    fn test_z_order_painting() {
        let mut scene = Scene::new();
        let red = SerializableColor::rgb(255, 0, 0);
        let blue = SerializableColor::rgb(0, 0, 255);
        scene.add_shape(filled_rect(0.0, 0.0, 40.0, 40.0, red));
        scene.add_shape(filled_rect(20.0, 20.0, 40.0, 40.0, blue));

        let mut renderer = RasterRenderer::new();
        let ctx = RenderContext::new(&scene, Size::new(64.0, 64.0));
        let pixmap = renderer.render(&ctx).unwrap();
        assert_eq!(pixel(&pixmap, 30, 30), [0, 0, 255, 255]);
        assert_eq!(pixel(&pixmap, 10, 10), [255, 0, 0, 255]);
    }

    #[test]
    fn test_selected_lifted_when_stacking_not_preserved() {
        let mut scene = Scene::new();
        let back = filled_rect(0.0, 0.0, 40.0, 40.0, SerializableColor::rgb(255, 0, 0));
        let back_id = back.id();
        scene.add_shape(back);
        scene.add_shape(filled_rect(20.0, 20.0, 40.0, 40.0, SerializableColor::rgb(0, 0, 255)));

        let mut selection = Selection::new();
        selection.set_single(back_id);
        let mut renderer = RasterRenderer::new();

        let ctx = RenderContext::new(&scene, Size::new(64.0, 64.0)).with_selection(Some(&selection));
        assert_eq!(pixel(&renderer.render(&ctx).unwrap(), 30, 30), [0, 0, 255, 255]);

        let ctx = ctx.with_stacking_order(false);
        assert_eq!(pixel(&renderer.render(&ctx).unwrap(), 30, 30), [255, 0, 0, 255]);
    }

    #[test]
    fn test_selection_outline_drawn() {
        let mut scene = Scene::new();
        let shape = Shape::Circle(Circle::new(Point::new(20.0, 20.0), 10.0));
        let id = shape.id();
        scene.add_shape(shape);
        let mut selection = Selection::new();
        selection.set_single(id);

        let mut renderer = RasterRenderer::new();
        let plain = renderer.render(&RenderContext::new(&scene, Size::new(64.0, 64.0))).unwrap();
        let outlined = renderer
            .render(&RenderContext::new(&scene, Size::new(64.0, 64.0)).with_selection(Some(&selection)))
            .unwrap();
        assert_ne!(plain.data(), outlined.data());
    }

    #[test]
    fn test_image_drawn_scaled() {
        let pixels = PixelData::new([0u8, 255, 0, 255].repeat(100 * 100));
        let image = Image::new(Point::new(10.0, 10.0), pixels, 100, 100, ImageFormat::Png).with_scale(0.2);
        let mut scene = Scene::new();
        scene.add_shape(Shape::Image(image));

        let mut renderer = RasterRenderer::new();
        let pixmap = renderer.render(&RenderContext::new(&scene, Size::new(64.0, 64.0))).unwrap();
        assert_eq!(pixel(&pixmap, 20, 20), [0, 255, 0, 255]);
        assert_eq!(pixel(&pixmap, 40, 40), [255, 255, 255, 255]);
        assert_eq!(renderer.cached_images(), 1);
    }

    #[test]
    fn test_zero_size_rejected() {
        let scene = Scene::new();
        let ctx = RenderContext::new(&scene, Size::new(0.0, 10.0));
        assert!(matches!(
            RasterRenderer::new().render(&ctx),
            Err(RendererError::Allocation { .. })
        ));
    }
}
