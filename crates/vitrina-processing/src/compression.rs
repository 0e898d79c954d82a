use bytes::Bytes;
use image::{imageops, DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use serde::Serialize;
use std::io::Cursor;

use crate::error::ProcessingError;

/// Output format for optimized images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
    Png,
    Avif,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Result<Self, ProcessingError> {
        match s.trim().to_lowercase().as_str() {
            "webp" => Ok(OutputFormat::WebP),
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "avif" => Ok(OutputFormat::Avif),
            _ => Err(ProcessingError::InvalidInput(format!(
                "Unsupported output format: {}",
                s
            ))),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Avif => "image/avif",
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Avif => "avif",
        }
    }

    /// Formats that keep an alpha channel. Everything else is flattened onto white.
    pub fn supports_transparency(self) -> bool {
        matches!(self, OutputFormat::WebP | OutputFormat::Png)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Encodes decoded images into their final byte representation.
pub struct ImageCompressor;

impl ImageCompressor {
    /// Encode `img` as `format`. `quality` is a fraction in (0, 1]; PNG ignores it.
    pub fn encode(
        img: &DynamicImage,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Bytes, ProcessingError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(ProcessingError::Encode(format!(
                "Cannot encode an empty {}x{} image",
                width, height
            )));
        }

        let data = match format {
            OutputFormat::WebP => Self::compress_webp(img, quality)?,
            OutputFormat::Jpeg => Self::compress_jpeg(img, quality)?,
            OutputFormat::Png => Self::compress_png(img)?,
            OutputFormat::Avif => Self::compress_avif(img, quality)?,
        };

        if data.is_empty() {
            return Err(ProcessingError::Encode(format!(
                "{} encoder produced no output",
                format
            )));
        }

        Ok(data)
    }

    /// Composite `img` over an opaque white canvas of the same size.
    pub fn flatten_onto_white(img: &DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        imageops::overlay(&mut canvas, &img.to_rgba8(), 0, 0);
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
    }

    /// Compress to JPEG using mozjpeg
    fn compress_jpeg(img: &DynamicImage, quality: f32) -> Result<Bytes, ProcessingError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality_percent(quality));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let jpeg_error = |e: std::io::Error| ProcessingError::Encode(format!("JPEG: {}", e));

        let mut comp = comp.start_compress(Vec::new()).map_err(jpeg_error)?;
        comp.write_scanlines(&rgb_img).map_err(jpeg_error)?;
        let jpeg_data = comp.finish().map_err(jpeg_error)?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Compress to PNG
    fn compress_png(img: &DynamicImage) -> Result<Bytes, ProcessingError> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| ProcessingError::Encode(format!("PNG: {}", e)))?;

        Ok(Bytes::from(buffer))
    }

    /// Compress to lossy WebP, keeping alpha only when the source has it
    fn compress_webp(img: &DynamicImage, quality: f32) -> Result<Bytes, ProcessingError> {
        let (width, height) = img.dimensions();
        if width > WEBP_MAX_DIMENSION || height > WEBP_MAX_DIMENSION {
            return Err(ProcessingError::Encode(format!(
                "WebP: {}x{} exceeds the {}px limit",
                width, height, WEBP_MAX_DIMENSION
            )));
        }
        let quality = quality_percent(quality);

        let result = if img.color().has_alpha() {
            let rgba_img = img.to_rgba8();
            webp::Encoder::from_rgba(&rgba_img, width, height).encode_simple(false, quality)
        } else {
            let rgb_img = img.to_rgb8();
            webp::Encoder::from_rgb(&rgb_img, width, height).encode_simple(false, quality)
        };

        let webp_data =
            result.map_err(|e| ProcessingError::Encode(format!("WebP: {:?}", e)))?;

        Ok(Bytes::copy_from_slice(&webp_data))
    }

    /// Compress to AVIF
    fn compress_avif(img: &DynamicImage, quality: f32) -> Result<Bytes, ProcessingError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let rgb_data: Vec<rgb::RGB8> = rgb_img
            .as_raw()
            .chunks_exact(3)
            .map(|chunk| rgb::RGB8::new(chunk[0], chunk[1], chunk[2]))
            .collect();

        let img_buf = ravif::Img::new(rgb_data.as_slice(), width as usize, height as usize);

        let encoder = ravif::Encoder::new()
            .with_quality(quality_percent(quality))
            .with_speed(6);

        let avif_data = encoder
            .encode_rgb(img_buf)
            .map_err(|e| ProcessingError::Encode(format!("AVIF: {}", e)))?;

        Ok(Bytes::from(avif_data.avif_file))
    }
}

/// Largest side libwebp accepts.
const WEBP_MAX_DIMENSION: u32 = 16383;

/// Map a (0, 1] quality fraction onto the encoders' 1-100 scale.
fn quality_percent(quality: f32) -> f32 {
    (quality * 100.0).clamp(1.0, 100.0)
}
