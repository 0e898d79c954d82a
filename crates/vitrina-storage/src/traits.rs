//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Objects are written once under a unique key and then served as-is from
/// `public_url(key)`; nothing in the upload flow overwrites or deletes them.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `storage_key` and return its public URL.
    ///
    /// `content_type` and `cache_control` are recorded as object metadata by
    /// backends that support it.
    async fn put_object(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> StorageResult<String>;

    /// Public URL of an object. Deterministic from the key, no round trip.
    fn public_url(&self, storage_key: &str) -> String;

    /// Download an object by its storage key.
    ///
    /// Not used by the upload flow; kept for tests and tooling that verify
    /// what was stored.
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Check if an object exists. Like `download`, a verification hook for
    /// tests and tooling.
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
