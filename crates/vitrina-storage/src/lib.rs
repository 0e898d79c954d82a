//! Vitrina Storage Library
//!
//! This crate provides the object store boundary used by the upload flow: the
//! `Storage` trait and implementations for S3-compatible stores (plus an
//! in-memory store with the same semantics) and the local filesystem.
//!
//! # Object key format
//!
//! Keys are produced by a [`KeyStrategy`]. The default strategy lays keys out as
//!
//! - `{folder}/{item_id}/{timestamp}-{file_name}`
//!
//! where `file_name` itself embeds a timestamp and a random token, so two uploads
//! never share a key and objects are never overwritten. Keys must not contain
//! `..`, empty segments or a leading `/`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use keys::{slugify, KeyStrategy, TimestampKeyStrategy, UploadDestination};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use vitrina_core::StorageBackend;
