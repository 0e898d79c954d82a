use serde::Serialize;
use thiserror::Error;
use vitrina_core::{ErrorMetadata, LogLevel};
use vitrina_storage::StorageError;

use crate::validator::ValidationError;

/// Failures surfaced by the optimizer and the upload sequencer.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Rejected file: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Failed to upload image: {0}")]
    Transfer(#[from] StorageError),
}

/// Coarse error category, stable across variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    Decode,
    Encode,
    Transfer,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Decode => "decode",
            ErrorKind::Encode => "encode",
            ErrorKind::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcessingError::InvalidInput(_) | ProcessingError::Validation(_) => {
                ErrorKind::InvalidInput
            }
            ProcessingError::Decode(_) => ErrorKind::Decode,
            ProcessingError::Encode(_) => ErrorKind::Encode,
            ProcessingError::Transfer(_) => ErrorKind::Transfer,
        }
    }
}

impl ErrorMetadata for ProcessingError {
    fn error_code(&self) -> &'static str {
        match self {
            ProcessingError::InvalidInput(_) => "INVALID_INPUT",
            ProcessingError::Validation(_) => "INVALID_IMAGE",
            ProcessingError::Decode(_) => "CORRUPT_IMAGE",
            ProcessingError::Encode(_) => "ENCODE_FAILED",
            ProcessingError::Transfer(_) => "UPLOAD_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, ProcessingError::Transfer(_))
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            ProcessingError::InvalidInput(_) => None,
            ProcessingError::Validation(_) => {
                Some("Choose a JPEG, PNG, WebP or GIF image within the size limit")
            }
            ProcessingError::Decode(_) => {
                Some("Export the image again or choose a different file")
            }
            ProcessingError::Encode(_) => Some("Try a different output format"),
            ProcessingError::Transfer(_) => Some("Check your connection and retry the upload"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            ProcessingError::InvalidInput(msg) => msg.clone(),
            ProcessingError::Validation(e) => format!("The selected file is not accepted: {}", e),
            ProcessingError::Decode(_) => {
                "The image could not be read. It may be corrupted or in an unsupported format."
                    .to_string()
            }
            ProcessingError::Encode(_) => "The image could not be converted.".to_string(),
            ProcessingError::Transfer(_) => {
                "The image could not be uploaded. Please try again.".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            ProcessingError::InvalidInput(_) | ProcessingError::Validation(_) => LogLevel::Debug,
            ProcessingError::Decode(_) => LogLevel::Warn,
            ProcessingError::Encode(_) | ProcessingError::Transfer(_) => LogLevel::Error,
        }
    }
}

/// A batch aborted at `index` (zero-based). Later images were not attempted.
#[derive(Debug, Error)]
#[error("Image {} of the batch failed: {}", .index + 1, .error)]
pub struct BatchError {
    pub index: usize,
    #[source]
    pub error: ProcessingError,
}

impl BatchError {
    pub fn new(index: usize, error: ProcessingError) -> Self {
        Self { index, error }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

impl ErrorMetadata for BatchError {
    fn error_code(&self) -> &'static str {
        self.error.error_code()
    }

    fn is_recoverable(&self) -> bool {
        self.error.is_recoverable()
    }

    fn suggested_action(&self) -> Option<&'static str> {
        self.error.suggested_action()
    }

    fn client_message(&self) -> String {
        format!("Image {}: {}", self.index + 1, self.error.client_message())
    }

    fn log_level(&self) -> LogLevel {
        self.error.log_level()
    }
}
