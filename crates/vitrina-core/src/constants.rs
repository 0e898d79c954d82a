//! Application-wide constants.

/// Default bounding box width for optimized images, in pixels.
pub const DEFAULT_MAX_WIDTH: u32 = 1920;

/// Default bounding box height for optimized images, in pixels.
pub const DEFAULT_MAX_HEIGHT: u32 = 1440;

/// Default lossy encoder quality, as a fraction in (0, 1].
pub const DEFAULT_QUALITY: f32 = 0.75;

/// Default encoded format name.
pub const DEFAULT_FORMAT: &str = "webp";

/// Default maximum accepted source size, in megabytes.
pub const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;

/// Cache directive attached to uploaded objects. Keys are unique per upload,
/// so an object never changes once written.
pub const DEFAULT_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Media types the optimizer accepts as input. Only raster formats the
/// decoder can read; vector images are rejected up front.
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/webp",
    "image/gif",
];

/// Logical folders used by the site.
pub const PROPERTIES_FOLDER: &str = "propiedades";
pub const ANNOUNCEMENTS_FOLDER: &str = "anuncios";
