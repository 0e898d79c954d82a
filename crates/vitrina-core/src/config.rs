//! Configuration module
//!
//! Configuration is read from the process environment (after loading a `.env`
//! file when present). Every setting has a default except the ones a chosen
//! storage backend requires, which `validate` checks.

use std::env;

use crate::constants::{
    DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_CACHE_CONTROL, DEFAULT_FORMAT, DEFAULT_MAX_FILE_SIZE_MB,
    DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY,
};
use crate::storage_types::StorageBackend;

/// Storage backend settings
#[derive(Clone, Debug, Default)]
pub struct StorageConfig {
    pub backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, Supabase, etc.)
    pub aws_region: Option<String>,
    /// Base URL objects are publicly served from; overrides the derived S3 URL.
    pub public_base_url: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
}

/// Default optimization parameters
#[derive(Clone, Debug, PartialEq)]
pub struct ImageDefaults {
    pub max_width: u32,
    pub max_height: u32,
    pub quality: f32,
    pub format: String,
}

impl Default for ImageDefaults {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            quality: DEFAULT_QUALITY,
            format: DEFAULT_FORMAT.to_string(),
        }
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub storage: StorageConfig,
    pub images: ImageDefaults,
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub cache_control: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            storage: StorageConfig::default(),
            images: ImageDefaults::default(),
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or(defaults.environment);

        let backend = lookup("STORAGE_BACKEND")
            .map(|s| s.parse::<StorageBackend>())
            .transpose()?;

        let storage = StorageConfig {
            backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            public_base_url: lookup("STORAGE_PUBLIC_BASE_URL"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
        };

        let images = ImageDefaults {
            max_width: parse_or("IMAGE_MAX_WIDTH", &lookup, defaults.images.max_width)?,
            max_height: parse_or("IMAGE_MAX_HEIGHT", &lookup, defaults.images.max_height)?,
            quality: parse_or("IMAGE_QUALITY", &lookup, defaults.images.quality)?,
            format: lookup("IMAGE_FORMAT")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or(defaults.images.format),
        };

        let max_file_size_mb = parse_or("MAX_FILE_SIZE_MB", &lookup, DEFAULT_MAX_FILE_SIZE_MB)?;
        let max_file_size_bytes = max_file_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large: {}", max_file_size_mb))?;

        let allowed_content_types = match lookup("ALLOWED_CONTENT_TYPES") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.allowed_content_types,
        };

        let cache_control = lookup("UPLOAD_CACHE_CONTROL").unwrap_or(defaults.cache_control);

        Ok(Config {
            environment,
            storage,
            images,
            max_file_size_bytes,
            allowed_content_types,
            cache_control,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.storage.backend
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.images.max_width == 0 || self.images.max_height == 0 {
            return Err(anyhow::anyhow!(
                "IMAGE_MAX_WIDTH and IMAGE_MAX_HEIGHT must be positive"
            ));
        }

        if !(self.images.quality > 0.0 && self.images.quality <= 1.0) {
            return Err(anyhow::anyhow!(
                "IMAGE_QUALITY must be in (0, 1], got {}",
                self.images.quality
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be positive"));
        }

        // Validate storage backend configuration
        let backend = self.storage.backend.unwrap_or(StorageBackend::S3);
        match backend {
            StorageBackend::S3 => {
                if self.storage.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.storage.s3_region.is_none() && self.storage.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.storage.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.storage.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            StorageBackend::Memory => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "memory storage backend cannot be used in production"
                    ));
                }
            }
        }

        Ok(())
    }
}

fn parse_or<T, F>(key: &str, lookup: &F, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}
