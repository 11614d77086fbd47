use designboard_core::{
    AnimatedImageSource, EditorConfig, ExportError, ExportOptions, RasterFormat, ReorderDirection,
    SceneEditor, SerializableColor,
};
use designboard_render::RasterSurface;
use image::{Rgba, RgbaImage};
use std::io::Cursor;

fn editor() -> SceneEditor<RasterSurface> {
    let config = EditorConfig::default();
    let surface = RasterSurface::from_config(&config);
    SceneEditor::new(config, surface)
}

fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba(color))
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn decode(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes).unwrap().to_rgba8()
}

#[test]
fn rectangle_on_top_after_circle_sent_backward() {
    let mut editor = editor();
    editor.add_rectangle();
    editor.add_circle();
    assert!(editor.reorder(ReorderDirection::Backward));

    let options = ExportOptions::default();
    let exported = decode(&editor.export_raster(&options).unwrap());
    assert_eq!(exported.dimensions(), (1600, 1000));

    // Inside both shapes; the rectangle now paints last
    assert_eq!(exported.get_pixel(340, 260).0, [0x4f, 0x46, 0xe5, 0xff]);
    // Circle-only area keeps the circle color
    assert_eq!(exported.get_pixel(340, 340).0, [0x22, 0xc5, 0x5e, 0xff]);
    // Background
    assert_eq!(exported.get_pixel(1500, 900).0, [0xff, 0xff, 0xff, 0xff]);
}

#[test]
fn unchanged_scene_exports_identically() {
    let mut editor = editor();
    editor.add_rectangle();
    editor.add_circle();
    editor.add_text();
    pollster::block_on(editor.add_image(png_bytes(64, 32, [200, 10, 10, 255]))).unwrap();

    let options = ExportOptions::default();
    let first = editor.export_raster(&options).unwrap();
    let second = editor.export_raster(&options).unwrap();
    assert_eq!(first, second);
}

#[test]
fn wide_image_is_scaled_to_fit() {
    let mut editor = editor();
    let outcome = pollster::block_on(editor.add_image(png_bytes(2000, 50, [0, 0, 0, 255]))).unwrap();
    let id = outcome.id().unwrap();

    let image = editor.scene().get_shape(id).unwrap().as_image().unwrap();
    assert!((image.scale - 0.24).abs() < 1e-12);
    assert!((image.width() - 480.0).abs() < 1e-9);

    // Drawn at (100, 100), 480 x 12 display pixels
    let exported = decode(&editor.export_raster(&ExportOptions { multiplier: 1.0, ..Default::default() }).unwrap());
    assert_eq!(exported.get_pixel(300, 105).0, [0, 0, 0, 255]);
    assert_eq!(exported.get_pixel(620, 105).0, [255, 255, 255, 255]);
}

#[test]
fn video_frame_becomes_image() {
    let mut editor = editor();
    let source = AnimatedImageSource::new(png_bytes(40, 20, [0, 128, 255, 255]));
    let id = pollster::block_on(editor.add_video_frame(&source)).unwrap().id().unwrap();

    let image = editor.scene().get_shape(id).unwrap().as_image().unwrap();
    assert_eq!((image.source_width, image.source_height), (40, 20));
    assert_eq!(editor.selection().ids(), &[id]);

    let exported = decode(&editor.export_raster(&ExportOptions { multiplier: 1.0, ..Default::default() }).unwrap());
    assert_eq!(exported.get_pixel(120, 110).0, [0, 128, 255, 255]);
}

#[test]
fn recolor_shows_in_export() {
    let mut editor = editor();
    editor.add_rectangle();
    editor.recolor("#ff0000".parse::<SerializableColor>().unwrap());
    let exported = decode(&editor.export_raster(&ExportOptions { multiplier: 1.0, ..Default::default() }).unwrap());
    assert_eq!(exported.get_pixel(100, 100).0, [255, 0, 0, 255]);
}

#[test]
fn jpeg_export() {
    let mut editor = editor();
    editor.add_rectangle();
    let options = ExportOptions {
        format: RasterFormat::Jpeg,
        multiplier: 0.5,
        quality: 0.8,
    };
    let bytes = editor.export_raster(&options).unwrap();
    assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    assert_eq!(decode(&bytes).dimensions(), (400, 250));
}

#[test]
fn invalid_multiplier_is_rejected() {
    let mut editor = editor();
    for multiplier in [0.0, -1.0, f64::NAN] {
        let options = ExportOptions { multiplier, ..Default::default() };
        assert!(matches!(editor.export_raster(&options), Err(ExportError::InvalidSize { .. })));
    }
}

#[test]
fn cleared_scene_exports_background_only() {
    let mut editor = editor();
    editor.add_rectangle();
    editor.clear_all();
    editor.clear_all();
    let exported = decode(&editor.export_raster(&ExportOptions { multiplier: 1.0, ..Default::default() }).unwrap());
    assert!(exported.pixels().all(|p| p.0 == [255, 255, 255, 255]));
}
