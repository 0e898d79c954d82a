use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::sync::Arc;

/// S3-compatible storage implementation
///
/// Also backs the `memory` backend: an [`InMemory`] store with the same
/// put/get semantics, used for dry runs and tests.
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    region: Option<String>,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    public_base_url: Option<String>,
    backend: StorageBackend,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `public_base_url` - Optional base URL objects are served from (CDN or
    ///   the provider's public bucket URL). Takes precedence when building URLs.
    pub fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_base_url: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment (AWS_ACCESS_KEY_ID, ...).
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket,
            region: Some(region),
            endpoint_url,
            public_base_url,
            backend: StorageBackend::S3,
        })
    }

    /// Create an in-memory store. Contents live as long as this value (and its clones).
    pub fn in_memory(bucket: impl Into<String>, public_base_url: Option<String>) -> Self {
        S3Storage {
            store: Arc::new(InMemory::new()),
            bucket: bucket.into(),
            region: None,
            endpoint_url: None,
            public_base_url,
            backend: StorageBackend::Memory,
        }
    }

    /// Generate public URL for an object
    ///
    /// Order of precedence: configured public base URL, then path-style
    /// `{endpoint}/{bucket}/{key}` for S3-compatible providers, then the
    /// standard AWS virtual-hosted URL.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref base) = self.public_base_url {
            return format!("{}/{}", base.trim_end_matches('/'), key);
        }

        match (&self.endpoint_url, &self.region) {
            (Some(endpoint), _) => {
                format!("{}/{}/{}", endpoint.trim_end_matches('/'), self.bucket, key)
            }
            (None, Some(region)) => {
                format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, region, key)
            }
            (None, None) => format!("memory://{}/{}", self.bucket, key),
        }
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn put_object(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> StorageResult<String> {
        validate_key(storage_key)?;

        let size = data.len() as u64;
        let location = Path::from(storage_key.to_string());

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, content_type.to_string().into());
        attributes.insert(Attribute::CacheControl, cache_control.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = self.generate_url(storage_key);

        tracing::info!(
            backend = %self.backend,
            bucket = %self.bucket,
            key = %storage_key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(url)
    }

    fn public_url(&self, storage_key: &str) -> String {
        self.generate_url(storage_key)
    }

    async fn download(&self, storage_key: &str) -> StorageResult<Bytes> {
        validate_key(storage_key)?;

        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(storage_key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object download successful"
        );

        Ok(bytes)
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_key(storage_key)?;

        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_put_and_download() {
        let storage = S3Storage::in_memory("media", Some("https://cdn.example.com".to_string()));
        let data = Bytes::from_static(b"webp bytes");

        let url = storage
            .put_object(
                "propiedades/casa-1/1-a.webp",
                data.clone(),
                "image/webp",
                "public, max-age=31536000, immutable",
            )
            .await
            .unwrap();

        assert_eq!(url, "https://cdn.example.com/propiedades/casa-1/1-a.webp");
        assert!(storage.exists("propiedades/casa-1/1-a.webp").await.unwrap());
        assert_eq!(
            storage.download("propiedades/casa-1/1-a.webp").await.unwrap(),
            data
        );
        assert_eq!(storage.backend_type(), StorageBackend::Memory);
    }

    #[tokio::test]
    async fn test_put_records_content_type_and_cache_control() {
        let storage = S3Storage::in_memory("media", None);

        storage
            .put_object(
                "anuncios/oferta/1-b.webp",
                Bytes::from_static(b"x"),
                "image/webp",
                "public, max-age=31536000, immutable",
            )
            .await
            .unwrap();

        let result = storage
            .store
            .get(&Path::from("anuncios/oferta/1-b.webp"))
            .await
            .unwrap();
        let content_type: Option<&str> = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.as_ref());
        let cache_control: Option<&str> = result
            .attributes
            .get(&Attribute::CacheControl)
            .map(|v| v.as_ref());

        assert_eq!(content_type, Some("image/webp"));
        assert_eq!(cache_control, Some("public, max-age=31536000, immutable"));
    }

    #[tokio::test]
    async fn test_missing_object() {
        let storage = S3Storage::in_memory("media", None);
        assert!(!storage.exists("propiedades/nope.webp").await.unwrap());
        assert!(matches!(
            storage.download("propiedades/nope.webp").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_key_rejected_before_write() {
        let storage = S3Storage::in_memory("media", None);
        let result = storage
            .put_object("../escape.webp", Bytes::new(), "image/webp", "no-cache")
            .await;
        assert!(matches!(result, Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_generate_url_variants() {
        let memory = S3Storage::in_memory("media", None);
        assert_eq!(memory.public_url("a/b.webp"), "memory://media/a/b.webp");

        let aws = S3Storage::new("media".to_string(), "us-east-1".to_string(), None, None)
            .unwrap();
        assert_eq!(
            aws.public_url("a/b.webp"),
            "https://media.s3.us-east-1.amazonaws.com/a/b.webp"
        );

        let minio = S3Storage::new(
            "media".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000/".to_string()),
            None,
        )
        .unwrap();
        assert_eq!(
            minio.public_url("a/b.webp"),
            "http://localhost:9000/media/a/b.webp"
        );

        let cdn = S3Storage::new(
            "media".to_string(),
            "us-east-1".to_string(),
            Some("http://localhost:9000".to_string()),
            Some("https://cdn.example.com/storage/v1/object/public/media/".to_string()),
        )
        .unwrap();
        assert_eq!(
            cdn.public_url("a/b.webp"),
            "https://cdn.example.com/storage/v1/object/public/media/a/b.webp"
        );
    }
}
