#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use vitrina_core::Config;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.storage_backend().unwrap_or(StorageBackend::S3);
    let storage = &config.storage;

    tracing::debug!(backend = %backend, "Creating storage backend");

    match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = storage
                .s3_bucket
                .clone()
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = storage
                .s3_region
                .clone()
                .or_else(|| storage.aws_region.clone())
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;

            let s3 = S3Storage::new(
                bucket,
                region,
                storage.s3_endpoint.clone(),
                storage.public_base_url.clone(),
            )?;
            Ok(Arc::new(s3))
        }

        #[cfg(feature = "storage-s3")]
        StorageBackend::Memory => {
            let bucket = storage
                .s3_bucket
                .clone()
                .unwrap_or_else(|| "memory".to_string());
            Ok(Arc::new(S3Storage::in_memory(
                bucket,
                storage.public_base_url.clone(),
            )))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 | StorageBackend::Memory => Err(StorageError::ConfigError(
            format!("{} storage backend not available (storage-s3 feature not enabled)", backend),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = storage.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = storage.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let local = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(local))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-s3", feature = "storage-local"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_memory_storage() {
        let mut config = Config::default();
        config.storage.backend = Some(StorageBackend::Memory);

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
    }

    #[tokio::test]
    async fn test_create_local_storage() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.backend = Some(StorageBackend::Local);
        config.storage.local_storage_path = Some(dir.path().display().to_string());
        config.storage.local_storage_base_url = Some("http://localhost:3000/media".to_string());

        let storage = create_storage(&config).await.unwrap();
        assert_eq!(storage.backend_type(), StorageBackend::Local);
        assert_eq!(
            storage.public_url("propiedades/a.webp"),
            "http://localhost:3000/media/propiedades/a.webp"
        );
    }

    #[tokio::test]
    async fn test_missing_s3_bucket_is_config_error() {
        let config = Config::default();
        let result = create_storage(&config).await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }
}
