pub mod optimizer;
pub mod orientation;
pub mod resize;

pub use optimizer::{
    reduction_percent, ImageOptimizer, OptimizationSpec, OptimizationStats, OptimizedImage,
    SourceImage,
};
pub use orientation::ImageOrientation;
pub use resize::ImageResize;
