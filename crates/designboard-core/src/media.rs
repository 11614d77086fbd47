//! Media decoding: raster images and first frames of video-like sources.

use crate::shapes::{ImageFormat, PixelData};
use ::image::codecs::gif::GifDecoder;
use ::image::codecs::png::PngDecoder;
use ::image::codecs::webp::WebPDecoder;
use ::image::{AnimationDecoder, ImageError, RgbaImage};
use std::future::Future;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use thiserror::Error;

/// Decoding errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unsupported image format")]
    UnsupportedFormat,
    #[error("Image decoding failed: {0}")]
    Image(String),
    #[error("Source has no decodable frame")]
    NoFrames,
    #[error("Video unavailable: {0}")]
    VideoUnavailable(String),
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<ImageError> for DecodeError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Unsupported(_) => DecodeError::UnsupportedFormat,
            other => DecodeError::Image(other.to_string()),
        }
    }
}

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A decoded raster image ready to become an image drawable.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// RGBA8 pixels, straight alpha.
    pub pixels: PixelData,
    pub width: u32,
    pub height: u32,
    /// Format the bytes were detected as.
    pub format: ImageFormat,
}

/// Decode PNG, JPEG, WebP or GIF bytes. Animated formats yield their first frame.
pub async fn decode_image(bytes: Vec<u8>) -> Result<DecodedImage, DecodeError> {
    decode_still(&bytes)
}

fn decode_still(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let format = ImageFormat::from_magic_bytes(bytes).ok_or(DecodeError::UnsupportedFormat)?;
    let rgba = ::image::load_from_memory_with_format(bytes, format.into())?.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::NoFrames);
    }
    Ok(DecodedImage {
        pixels: PixelData::new(rgba.into_raw()),
        width,
        height,
        format,
    })
}

/// One uncompressed RGBA8 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl From<RgbaImage> for VideoFrame {
    fn from(buffer: RgbaImage) -> Self {
        Self {
            width: buffer.width(),
            height: buffer.height(),
            rgba: buffer.into_raw(),
        }
    }
}

/// A source that can produce its first decodable frame.
pub trait VideoSource {
    /// Resolve once the first frame is available.
    fn first_frame(&self) -> BoxFuture<'_, Result<VideoFrame, DecodeError>>;
}

/// Frame source backed by in-memory animated image bytes (GIF, APNG, animated WebP).
/// Still images are accepted as single-frame sources.
#[derive(Debug, Clone)]
pub struct AnimatedImageSource {
    bytes: Vec<u8>,
}

impl AnimatedImageSource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl VideoSource for AnimatedImageSource {
    fn first_frame(&self) -> BoxFuture<'_, Result<VideoFrame, DecodeError>> {
        Box::pin(async move { first_animation_frame(&self.bytes) })
    }
}

/// Frame source read from a file path.
#[derive(Debug, Clone)]
pub struct FileVideoSource {
    path: PathBuf,
}

impl FileVideoSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VideoSource for FileVideoSource {
    fn first_frame(&self) -> BoxFuture<'_, Result<VideoFrame, DecodeError>> {
        Box::pin(async move {
            let bytes = std::fs::read(&self.path).map_err(|e| {
                DecodeError::VideoUnavailable(format!("Failed to read {}: {}", self.path.display(), e))
            })?;
            first_animation_frame(&bytes)
        })
    }
}

fn first_animation_frame(bytes: &[u8]) -> Result<VideoFrame, DecodeError> {
    let format = ImageFormat::from_magic_bytes(bytes).ok_or(DecodeError::UnsupportedFormat)?;
    let cursor = Cursor::new(bytes);
    let mut frames = match format {
        ImageFormat::Gif => GifDecoder::new(cursor)?.into_frames(),
        ImageFormat::Png => {
            let decoder = PngDecoder::new(cursor)?;
            if !decoder.is_apng()? {
                return still_frame(bytes);
            }
            decoder.apng()?.into_frames()
        }
        ImageFormat::WebP => {
            let decoder = WebPDecoder::new(cursor)?;
            if !decoder.has_animation() {
                return still_frame(bytes);
            }
            decoder.into_frames()
        }
        ImageFormat::Jpeg => return still_frame(bytes),
    };
    let frame = frames.next().ok_or(DecodeError::NoFrames)??;
    Ok(frame.into_buffer().into())
}

fn still_frame(bytes: &[u8]) -> Result<VideoFrame, DecodeError> {
    let decoded = decode_still(bytes)?;
    Ok(VideoFrame {
        width: decoded.width,
        height: decoded.height,
        rgba: decoded.pixels.as_slice().to_vec(),
    })
}

/// Wait for the first frame of `source` and encode it as PNG.
pub async fn capture_first_frame(source: &dyn VideoSource) -> Result<Vec<u8>, DecodeError> {
    let frame = source.first_frame().await?;
    if frame.width == 0 || frame.height == 0 {
        return Err(DecodeError::NoFrames);
    }
    let (width, height) = (frame.width, frame.height);
    let buffer = RgbaImage::from_raw(width, height, frame.rgba).ok_or_else(|| {
        DecodeError::Image(format!("Frame buffer does not match {}x{} RGBA", width, height))
    })?;
    encode_png(buffer.as_raw(), width, height)
}

/// Encode straight-alpha RGBA8 pixels as PNG.
pub fn encode_png(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>, DecodeError> {
    let mut buf = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| DecodeError::Encode(e.to_string()))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| DecodeError::Encode(e.to_string()))?;
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::codecs::gif::GifEncoder;
    use ::image::{Frame, Rgba};

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    fn encoded(img: &RgbaImage, format: ::image::ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn animated_gif() -> Vec<u8> {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            encoder
                .encode_frames(vec![
                    Frame::new(solid(4, 3, [255, 0, 0, 255])),
                    Frame::new(solid(4, 3, [0, 0, 255, 255])),
                ])
                .unwrap();
        }
        bytes
    }

    struct FixedSource(VideoFrame);

    impl VideoSource for FixedSource {
        fn first_frame(&self) -> BoxFuture<'_, Result<VideoFrame, DecodeError>> {
            let frame = self.0.clone();
            Box::pin(async move { Ok(frame) })
        }
    }

    #[test]
    fn test_decode_png() {
        let bytes = encoded(&solid(6, 4, [1, 2, 3, 255]), ::image::ImageFormat::Png);
        let decoded = pollster::block_on(decode_image(bytes)).unwrap();
        assert_eq!((decoded.width, decoded.height), (6, 4));
        assert_eq!(decoded.format, ImageFormat::Png);
        assert_eq!(decoded.pixels.len(), 6 * 4 * 4);
        assert_eq!(&decoded.pixels.as_slice()[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn test_decode_jpeg() {
        let rgb = ::image::DynamicImage::ImageRgba8(solid(8, 8, [200, 200, 200, 255])).to_rgb8();
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), ::image::ImageFormat::Jpeg).unwrap();
        let decoded = pollster::block_on(decode_image(bytes)).unwrap();
        assert_eq!(decoded.format, ImageFormat::Jpeg);
        assert_eq!((decoded.width, decoded.height), (8, 8));
    }

    #[test]
    fn test_decode_rejects_unknown_bytes() {
        let result = pollster::block_on(decode_image(b"not an image at all".to_vec()));
        assert!(matches!(result, Err(DecodeError::UnsupportedFormat)));
    }

    #[test]
    fn test_decode_truncated_png_fails() {
        let mut bytes = encoded(&solid(6, 4, [0, 0, 0, 255]), ::image::ImageFormat::Png);
        bytes.truncate(20);
        assert!(pollster::block_on(decode_image(bytes)).is_err());
    }

    #[test]
    fn test_gif_first_frame() {
        let source = AnimatedImageSource::new(animated_gif());
        let frame = pollster::block_on(source.first_frame()).unwrap();
        assert_eq!((frame.width, frame.height), (4, 3));
        assert_eq!(&frame.rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_still_image_is_single_frame_source() {
        let bytes = encoded(&solid(2, 2, [9, 9, 9, 255]), ::image::ImageFormat::Png);
        let frame = pollster::block_on(AnimatedImageSource::new(bytes).first_frame()).unwrap();
        assert_eq!(frame.rgba, vec![9, 9, 9, 255].repeat(4));
    }

    #[test]
    fn test_capture_first_frame_encodes_png() {
        let png = pollster::block_on(capture_first_frame(&AnimatedImageSource::new(animated_gif()))).unwrap();
        assert_eq!(ImageFormat::from_magic_bytes(&png), Some(ImageFormat::Png));
        let decoded = pollster::block_on(decode_image(png)).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 3));
    }

    #[test]
    fn test_capture_rejects_bad_frames() {
        let empty = FixedSource(VideoFrame { width: 0, height: 0, rgba: Vec::new() });
        assert!(matches!(pollster::block_on(capture_first_frame(&empty)), Err(DecodeError::NoFrames)));

        let short = FixedSource(VideoFrame { width: 2, height: 2, rgba: vec![0; 3] });
        assert!(matches!(pollster::block_on(capture_first_frame(&short)), Err(DecodeError::Image(_))));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileVideoSource::new(dir.path().join("clip.gif"));
        let result = pollster::block_on(capture_first_frame(&source));
        assert!(matches!(result, Err(DecodeError::VideoUnavailable(_))));
    }
}
