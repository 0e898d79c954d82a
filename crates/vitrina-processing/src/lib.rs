//! Vitrina Image Processing Library
//!
//! This crate turns user-supplied images into size- and format-normalized
//! artifacts ([`ImageOptimizer`]) and drives them into object storage
//! ([`UploadSequencer`]).

pub mod compression;
pub mod error;
pub mod image;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use compression::{ImageCompressor, OutputFormat};
pub use error::{BatchError, ErrorKind, ProcessingError};
pub use self::image::{
    reduction_percent, ImageOptimizer, ImageOrientation, ImageResize, OptimizationSpec,
    OptimizationStats, OptimizedImage, SourceImage,
};
pub use upload::{ProgressReporter, UploadProgress, UploadResult, UploadSequencer, UploadStage};
pub use validator::{content_type_for_extension, MediaValidator, ValidationError};
