//! Encoding rendered pixmaps into export formats.

use designboard_core::{ExportError, RasterFormat, media};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use tiny_skia::Pixmap;

/// Encode a pixmap in the requested format. `quality` (0..=1) only affects JPEG.
pub fn encode_pixmap(pixmap: &Pixmap, format: RasterFormat, quality: f32) -> Result<Vec<u8>, ExportError> {
    match format {
        RasterFormat::Png => media::encode_png(&straight_rgba(pixmap), pixmap.width(), pixmap.height())
            .map_err(|e| ExportError::Encode(format!("PNG: {}", e))),
        RasterFormat::Jpeg => encode_jpeg(&flatten_rgb(pixmap), pixmap.width(), pixmap.height(), quality),
    }
}

/// Straight-alpha RGBA8 bytes of a premultiplied pixmap.
pub fn straight_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(pixmap.pixels().len() * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    rgba
}

/// RGB8 bytes with transparent areas composited over white.
fn flatten_rgb(pixmap: &Pixmap) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixmap.pixels().len() * 3);
    for px in pixmap.pixels() {
        // Premultiplied source over opaque white
        let backdrop = 255 - px.alpha();
        rgb.extend_from_slice(&[px.red() + backdrop, px.green() + backdrop, px.blue() + backdrop]);
    }
    rgb
}

/// Map 0..=1 quality onto the JPEG encoder's 1..=100 scale.
pub fn jpeg_quality(quality: f32) -> u8 {
    let quality = if quality.is_finite() { quality.clamp(0.0, 1.0) } else { 1.0 };
    ((quality * 100.0).round() as u8).max(1)
}

fn encode_jpeg(rgb: &[u8], width: u32, height: u32, quality: f32) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, jpeg_quality(quality));
        encoder
            .encode(rgb, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| ExportError::Encode(format!("JPEG: {}", e)))?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn solid(width: u32, height: u32, color: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(color);
        pixmap
    }

    #[test]
    fn test_png_signature_and_decode() {
        let pixmap = solid(4, 3, Color::from_rgba8(79, 70, 229, 255));
        let bytes = encode_pixmap(&pixmap, RasterFormat::Png, 1.0).unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(2, 1).0, [79, 70, 229, 255]);
    }

    #[test]
    fn test_jpeg_flattens_over_white() {
        let pixmap = solid(8, 8, Color::TRANSPARENT);
        let bytes = encode_pixmap(&pixmap, RasterFormat::Jpeg, 0.9).unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
        let decoded = image::load_from_memory(&bytes).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(4, 4).0;
        assert!(r > 250 && g > 250 && b > 250);
    }

    #[test]
    fn test_jpeg_quality_mapping() {
        assert_eq!(jpeg_quality(1.0), 100);
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(0.92), 92);
        assert_eq!(jpeg_quality(7.0), 100);
        assert_eq!(jpeg_quality(f32::NAN), 100);
    }

    #[test]
    fn test_straight_rgba_unpremultiplies() {
        let pixmap = solid(1, 1, Color::from_rgba8(255, 0, 0, 128));
        let rgba = straight_rgba(&pixmap);
        assert_eq!(rgba[3], 128);
        assert!(rgba[0] >= 254);
    }
}
