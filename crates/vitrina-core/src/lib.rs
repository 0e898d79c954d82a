//! Vitrina Core Library
//!
//! This crate provides configuration, error presentation metadata and shared
//! constants used by the storage, processing and CLI crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, ImageDefaults, StorageConfig};
pub use error::{detailed_message, log_error, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
