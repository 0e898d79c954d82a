use bytes::Bytes;
use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::sync::Arc;
use vitrina_core::constants::{DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use vitrina_core::{Config, ImageDefaults};
use vitrina_storage::{KeyStrategy, TimestampKeyStrategy};

use super::orientation::ImageOrientation;
use super::resize::ImageResize;
use crate::compression::{ImageCompressor, OutputFormat};
use crate::error::{BatchError, ProcessingError};
use crate::validator::MediaValidator;

/// Raw bytes as handed over by the caller, plus the declared media type.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub data: Bytes,
    pub content_type: String,
    /// Original file name, for logs only.
    pub name: Option<String>,
}

impl SourceImage {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Bounding box, quality and output format for one optimization run.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationSpec {
    pub max_width: u32,
    pub max_height: u32,
    /// Lossy quality in (0, 1]
    pub quality: f32,
    pub format: OutputFormat,
}

impl Default for OptimizationSpec {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            format: OutputFormat::default(),
        }
    }
}

impl OptimizationSpec {
    pub fn new(
        max_width: u32,
        max_height: u32,
        quality: f32,
        format: OutputFormat,
    ) -> Result<Self, ProcessingError> {
        let spec = Self {
            max_width,
            max_height,
            quality,
            format,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_defaults(defaults: &ImageDefaults) -> Result<Self, ProcessingError> {
        Self::new(
            defaults.max_width,
            defaults.max_height,
            defaults.quality,
            OutputFormat::parse(&defaults.format)?,
        )
    }

    pub fn from_config(config: &Config) -> Result<Self, ProcessingError> {
        Self::from_defaults(&config.images)
    }

    pub fn validate(&self) -> Result<(), ProcessingError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(ProcessingError::InvalidInput(format!(
                "Bounding box must be positive, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ProcessingError::InvalidInput(format!(
                "Quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Result of [`ImageOptimizer::optimize`].
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub data: Bytes,
    pub content_type: &'static str,
    pub format: OutputFormat,
    /// Unique per invocation; extension matches `format`.
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// Upright dimensions of the decoded source.
    pub original_width: u32,
    pub original_height: u32,
    pub original_size: u64,
    pub optimized_size: u64,
    /// Negative when the re-encode is larger than the source.
    pub reduction_percent: i64,
}

impl OptimizedImage {
    pub fn stats(&self) -> OptimizationStats {
        OptimizationStats {
            file_name: self.file_name.clone(),
            content_type: self.content_type,
            width: self.width,
            height: self.height,
            original_size: self.original_size,
            optimized_size: self.optimized_size,
            reduction_percent: self.reduction_percent,
        }
    }
}

/// Serializable summary of an optimization, without the encoded bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationStats {
    pub file_name: String,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub original_size: u64,
    pub optimized_size: u64,
    pub reduction_percent: i64,
}

/// `round((original - optimized) / original * 100)`, 0 for an empty original.
pub fn reduction_percent(original_size: u64, optimized_size: u64) -> i64 {
    if original_size == 0 {
        return 0;
    }
    let original = original_size as f64;
    ((original - optimized_size as f64) / original * 100.0).round() as i64
}

/// Validates, decodes, resizes and re-encodes source images.
///
/// CPU-bound; async callers should run it on a blocking thread.
#[derive(Clone)]
pub struct ImageOptimizer {
    validator: MediaValidator,
    keys: Arc<dyn KeyStrategy>,
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageOptimizer {
    pub fn new() -> Self {
        Self {
            validator: MediaValidator::default(),
            keys: Arc::new(TimestampKeyStrategy::new()),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new().with_validator(MediaValidator::from_config(config))
    }

    pub fn with_validator(mut self, validator: MediaValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_key_strategy(mut self, keys: Arc<dyn KeyStrategy>) -> Self {
        self.keys = keys;
        self
    }

    pub fn optimize(
        &self,
        source: &SourceImage,
        spec: &OptimizationSpec,
    ) -> Result<OptimizedImage, ProcessingError> {
        spec.validate()?;
        self.validator.validate(&source.content_type, source.len())?;

        let img = Self::decode(&source.data)?;
        let img = ImageOrientation::apply_exif_orientation(img, &source.data);
        let (original_width, original_height) = img.dimensions();

        let (width, height) = ImageResize::calculate_dimensions(
            original_width,
            original_height,
            spec.max_width,
            spec.max_height,
        );

        // Flatten before resampling so transparent pixels cannot bleed into edges.
        let img = if !spec.format.supports_transparency() && img.color().has_alpha() {
            ImageCompressor::flatten_onto_white(&img)
        } else {
            img
        };

        let img = if (width, height) == (original_width, original_height) {
            img
        } else {
            ImageResize::resize_image(&img, width, height)
        };

        let data = ImageCompressor::encode(&img, spec.format, spec.quality)?;

        let original_size = source.len() as u64;
        let optimized_size = data.len() as u64;
        let reduction = reduction_percent(original_size, optimized_size);
        let file_name = self.keys.file_name(spec.format.extension());

        tracing::debug!(
            source = source.name.as_deref().unwrap_or("<memory>"),
            file_name = %file_name,
            format = %spec.format,
            quality = spec.quality,
            original_width,
            original_height,
            width,
            height,
            original_size,
            optimized_size,
            reduction_percent = reduction,
            "Image optimized"
        );

        Ok(OptimizedImage {
            data,
            content_type: spec.format.to_mime_type(),
            format: spec.format,
            file_name,
            width,
            height,
            original_width,
            original_height,
            original_size,
            optimized_size,
            reduction_percent: reduction,
        })
    }

    /// Optimize every source in order. Stops at the first failure; later
    /// sources are not attempted.
    pub fn optimize_batch(
        &self,
        sources: &[SourceImage],
        spec: &OptimizationSpec,
    ) -> Result<Vec<OptimizedImage>, BatchError> {
        let mut optimized = Vec::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            let image = self
                .optimize(source, spec)
                .map_err(|error| BatchError::new(index, error))?;
            optimized.push(image);
        }
        Ok(optimized)
    }

    fn decode(data: &[u8]) -> Result<DynamicImage, ProcessingError> {
        let format = image::guess_format(data)
            .map_err(|e| ProcessingError::Decode(format!("Unrecognized image data: {}", e)))?;

        image::load_from_memory_with_format(data, format)
            .map_err(|e| ProcessingError::Decode(format!("{:?}: {}", format, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::validator::ValidationError;
    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use vitrina_storage::UploadDestination;

    fn encode(img: DynamicImage, format: ImageFormat) -> Bytes {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        Bytes::from(buf)
    }

    fn png_source(width: u32, height: u32) -> SourceImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        SourceImage::new(encode(DynamicImage::ImageRgb8(img), ImageFormat::Png), "image/png")
    }

    /// Counts generated file names, to observe which sources were attempted.
    #[derive(Default)]
    struct CountingKeys {
        calls: AtomicUsize,
    }

    impl KeyStrategy for CountingKeys {
        fn file_name(&self, extension: &str) -> String {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            format!("image-{}.{}", n, extension)
        }

        fn object_key(&self, destination: &UploadDestination, file_name: &str) -> String {
            format!("{}/{}/{}", destination.folder(), destination.item_id(), file_name)
        }
    }

    #[test]
    fn test_reduction_percent() {
        assert_eq!(reduction_percent(1000, 250), 75);
        assert_eq!(reduction_percent(1000, 1000), 0);
        assert_eq!(reduction_percent(1000, 1500), -50);
        assert_eq!(reduction_percent(3, 2), 33);
        assert_eq!(reduction_percent(8, 7), 13); // 12.5 rounds away from zero
        assert_eq!(reduction_percent(0, 10), 0);
    }

    #[test]
    fn test_spec_validation() {
        assert!(OptimizationSpec::new(1920, 1440, 0.75, OutputFormat::WebP).is_ok());
        assert!(OptimizationSpec::new(1920, 1440, 1.0, OutputFormat::WebP).is_ok());
        assert!(OptimizationSpec::new(0, 1440, 0.75, OutputFormat::WebP).is_err());
        assert!(OptimizationSpec::new(1920, 1440, 0.0, OutputFormat::WebP).is_err());
        assert!(OptimizationSpec::new(1920, 1440, 1.5, OutputFormat::WebP).is_err());
        assert!(OptimizationSpec::new(1920, 1440, f32::NAN, OutputFormat::WebP).is_err());
    }

    #[test]
    fn test_spec_from_config() {
        let mut config = Config::default();
        assert_eq!(
            OptimizationSpec::from_config(&config).unwrap(),
            OptimizationSpec::default()
        );

        config.images.format = "jpg".to_string();
        config.images.max_width = 800;
        let spec = OptimizationSpec::from_config(&config).unwrap();
        assert_eq!(spec.format, OutputFormat::Jpeg);
        assert_eq!(spec.max_width, 800);

        config.images.format = "bmp".to_string();
        assert!(OptimizationSpec::from_config(&config).is_err());
    }

    #[test]
    fn test_small_image_keeps_dimensions() {
        let optimizer = ImageOptimizer::new();
        let result = optimizer
            .optimize(&png_source(120, 80), &OptimizationSpec::default())
            .unwrap();

        assert_eq!((result.width, result.height), (120, 80));
        assert_eq!((result.original_width, result.original_height), (120, 80));
        assert_eq!(result.content_type, "image/webp");
        assert!(result.file_name.ends_with(".webp"));
        assert_eq!(result.optimized_size, result.data.len() as u64);
        assert_eq!(
            result.reduction_percent,
            reduction_percent(result.original_size, result.optimized_size)
        );
    }

    #[test]
    fn test_portrait_is_bound_by_height() {
        let optimizer = ImageOptimizer::new();
        let spec = OptimizationSpec::new(200, 150, 0.8, OutputFormat::Jpeg).unwrap();
        let result = optimizer.optimize(&png_source(200, 300), &spec).unwrap();

        assert_eq!((result.width, result.height), (100, 150));
        assert!(result.file_name.ends_with(".jpg"));

        let decoded = image::load_from_memory(&result.data).unwrap();
        assert_eq!(decoded.dimensions(), (100, 150));
    }

    #[test]
    fn test_transparency_kept_for_png_output() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
        let source = SourceImage::new(
            encode(DynamicImage::ImageRgba8(img), ImageFormat::Png),
            "image/png",
        );
        let spec = OptimizationSpec::new(100, 100, 0.8, OutputFormat::Png).unwrap();

        let result = ImageOptimizer::new().optimize(&source, &spec).unwrap();
        let decoded = image::load_from_memory(&result.data).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(8, 8)[3], 0);
    }

    #[test]
    fn test_rejects_non_image_content_type() {
        let source = SourceImage::new(Bytes::from_static(b"hello"), "text/plain");
        let err = ImageOptimizer::new()
            .optimize(&source, &OptimizationSpec::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_rejects_oversized_source() {
        let optimizer =
            ImageOptimizer::new().with_validator(MediaValidator::new(64, vec!["image/png".into()]));
        let err = optimizer
            .optimize(&png_source(64, 64), &OptimizationSpec::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_corrupt_data_is_decode_error() {
        let source = SourceImage::new(Bytes::from_static(b"\xFF\xD8\xFF\xE0garbage"), "image/jpeg");
        let err = ImageOptimizer::new()
            .optimize(&source, &OptimizationSpec::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);

        let source = SourceImage::new(Bytes::from_static(b"plain text"), "image/png");
        let err = ImageOptimizer::new()
            .optimize(&source, &OptimizationSpec::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_encoder_rejection_is_encode_error() {
        // Within the box, so it reaches the encoder at full width
        let spec = OptimizationSpec::new(20000, 20000, 0.75, OutputFormat::WebP).unwrap();
        let err = ImageOptimizer::new()
            .optimize(&png_source(17000, 4), &spec)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    #[test]
    fn test_svg_is_rejected_before_decoding() {
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"10\" height=\"10\"/>";
        let source = SourceImage::new(Bytes::from_static(svg), "image/svg+xml");
        let err = ImageOptimizer::new()
            .optimize(&source, &OptimizationSpec::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(matches!(
            err,
            ProcessingError::Validation(ValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_batch_preserves_order() {
        let keys = Arc::new(CountingKeys::default());
        let optimizer = ImageOptimizer::new().with_key_strategy(keys.clone());
        let sources = vec![png_source(10, 10), png_source(20, 10), png_source(30, 10)];

        let results = optimizer
            .optimize_batch(&sources, &OptimizationSpec::default())
            .unwrap();

        let widths: Vec<u32> = results.iter().map(|r| r.width).collect();
        assert_eq!(widths, vec![10, 20, 30]);
        assert_eq!(results[2].file_name, "image-2.webp");
    }

    #[test]
    fn test_batch_fails_fast() {
        let keys = Arc::new(CountingKeys::default());
        let optimizer = ImageOptimizer::new().with_key_strategy(keys.clone());
        let sources = vec![
            png_source(10, 10),
            SourceImage::new(Bytes::from_static(b"corrupt"), "image/png"),
            png_source(10, 10),
        ];

        let err = optimizer
            .optimize_batch(&sources, &OptimizationSpec::default())
            .unwrap_err();

        assert_eq!(err.index, 1);
        assert_eq!(err.kind(), ErrorKind::Decode);
        // Only the first source got as far as naming
        assert_eq!(keys.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_batch() {
        let results = ImageOptimizer::new()
            .optimize_batch(&[], &OptimizationSpec::default())
            .unwrap();
        assert!(results.is_empty());
    }
}
