use vitrina_core::constants::{DEFAULT_ALLOWED_CONTENT_TYPES, DEFAULT_MAX_FILE_SIZE_MB};
use vitrina_core::Config;

/// Validation errors for source images
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Not an image: {content_type}")]
    NotAnImage { content_type: String },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Empty file")]
    EmptyFile,
}

/// Gatekeeper run before any decoding work.
///
/// Content types are compared case-insensitively with parameters
/// (`; charset=...`) stripped.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl Default for MediaValidator {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl MediaValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .iter()
                .map(|ct| normalize_content_type(ct))
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_content_type(content_type);

        if !normalized.starts_with("image/") {
            return Err(ValidationError::NotAnImage {
                content_type: content_type.to_string(),
            });
        }

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Run all checks: content type first, then size.
    pub fn validate(&self, content_type: &str, size: usize) -> Result<(), ValidationError> {
        self.validate_content_type(content_type)?;
        self.validate_file_size(size)
    }
}

fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Map a file extension to the media type the browser would report for it.
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        "avif" => Some("image/avif"),
        "txt" => Some("text/plain"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_size() {
        let validator = MediaValidator::new(1000, vec!["image/png".to_string()]);

        assert!(validator.validate_file_size(500).is_ok());
        assert!(validator.validate_file_size(1000).is_ok());
        assert!(matches!(
            validator.validate_file_size(1001),
            Err(ValidationError::FileTooLarge { size: 1001, max: 1000 })
        ));
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_content_type() {
        let validator = MediaValidator::default();

        assert!(validator.validate_content_type("image/jpeg").is_ok());
        assert!(validator.validate_content_type("IMAGE/PNG").is_ok());
        assert!(validator
            .validate_content_type("image/webp; charset=binary")
            .is_ok());

        assert!(matches!(
            validator.validate_content_type("text/plain"),
            Err(ValidationError::NotAnImage { .. })
        ));
        assert!(matches!(
            validator.validate_content_type(""),
            Err(ValidationError::NotAnImage { .. })
        ));
        assert!(matches!(
            validator.validate_content_type("image/tiff"),
            Err(ValidationError::InvalidContentType { .. })
        ));
        assert!(matches!(
            validator.validate_content_type("image/svg+xml"),
            Err(ValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_validate_checks_type_before_size() {
        let validator = MediaValidator::default();
        assert!(matches!(
            validator.validate("application/pdf", 0),
            Err(ValidationError::NotAnImage { .. })
        ));
        assert!(matches!(
            validator.validate("image/png", 0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_from_config_normalizes_allow_list() {
        let mut config = Config::default();
        config.allowed_content_types = vec![" Image/PNG ".to_string()];
        config.max_file_size_bytes = 10;

        let validator = MediaValidator::from_config(&config);
        assert!(validator.validate("image/png", 10).is_ok());
        assert!(validator.validate("image/jpeg", 10).is_err());
        assert_eq!(validator.max_file_size(), 10);
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(content_type_for_extension("svg"), Some("image/svg+xml"));
        assert_eq!(content_type_for_extension("txt"), Some("text/plain"));
        assert_eq!(content_type_for_extension("heic"), None);
    }
}
