use std::sync::Arc;
use vitrina_core::constants::DEFAULT_CACHE_CONTROL;
use vitrina_core::{log_error, Config};
use vitrina_storage::{KeyStrategy, Storage, TimestampKeyStrategy, UploadDestination};

use super::progress::ProgressReporter;
use super::types::{UploadResult, UploadStage};
use crate::error::{BatchError, ProcessingError};
use crate::image::{ImageOptimizer, OptimizationSpec, OptimizedImage, SourceImage};

/// Optimizes images and writes them to object storage, one at a time.
///
/// Dropping a returned future cancels the remaining work at its next await
/// point. Objects already stored stay in place.
pub struct UploadSequencer {
    storage: Arc<dyn Storage>,
    optimizer: Arc<ImageOptimizer>,
    keys: Arc<dyn KeyStrategy>,
    spec: OptimizationSpec,
    cache_control: String,
}

impl UploadSequencer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            optimizer: Arc::new(ImageOptimizer::new()),
            keys: Arc::new(TimestampKeyStrategy::new()),
            spec: OptimizationSpec::default(),
            cache_control: DEFAULT_CACHE_CONTROL.to_string(),
        }
    }

    pub fn from_config(config: &Config, storage: Arc<dyn Storage>) -> Result<Self, ProcessingError> {
        let mut sequencer = Self::new(storage)
            .with_spec(OptimizationSpec::from_config(config)?)
            .with_cache_control(config.cache_control.clone());
        sequencer.optimizer = Arc::new(ImageOptimizer::from_config(config));
        Ok(sequencer)
    }

    /// Use `keys` for both generated file names and object keys.
    pub fn with_key_strategy(mut self, keys: Arc<dyn KeyStrategy>) -> Self {
        self.optimizer = Arc::new(self.optimizer.as_ref().clone().with_key_strategy(keys.clone()));
        self.keys = keys;
        self
    }

    pub fn with_spec(mut self, spec: OptimizationSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn with_cache_control(mut self, cache_control: impl Into<String>) -> Self {
        self.cache_control = cache_control.into();
        self
    }

    pub fn spec(&self) -> &OptimizationSpec {
        &self.spec
    }

    /// Optimize `source` and store it under `folder/item_id`.
    pub async fn process_image(
        &self,
        source: SourceImage,
        folder: &str,
        item_id: &str,
        progress: &ProgressReporter,
    ) -> Result<UploadResult, ProcessingError> {
        let destination = Self::destination(folder, item_id)?;
        self.upload_one(source, &destination, 0, 1, progress)
            .await
            .inspect_err(|e| log_error(e, "Image upload failed"))
    }

    /// Process `sources` in order, strictly one after another.
    ///
    /// The first failure aborts the batch: later sources are not attempted
    /// and earlier uploads are not rolled back.
    pub async fn process_batch(
        &self,
        sources: Vec<SourceImage>,
        folder: &str,
        item_id: &str,
        progress: &ProgressReporter,
    ) -> Result<Vec<UploadResult>, BatchError> {
        let destination =
            Self::destination(folder, item_id).map_err(|error| BatchError::new(0, error))?;

        let total = sources.len();
        let mut results = Vec::with_capacity(total);

        for (index, source) in sources.into_iter().enumerate() {
            match self
                .upload_one(source, &destination, index, total, progress)
                .await
            {
                Ok(result) => results.push(result),
                Err(error) => {
                    let err = BatchError::new(index, error);
                    log_error(&err, "Batch upload aborted");
                    return Err(err);
                }
            }
        }

        tracing::info!(
            folder = destination.folder(),
            item_id = destination.item_id(),
            count = results.len(),
            "Batch upload completed"
        );

        Ok(results)
    }

    fn destination(folder: &str, item_id: &str) -> Result<UploadDestination, ProcessingError> {
        UploadDestination::new(folder, item_id)
            .map_err(|e| ProcessingError::InvalidInput(e.to_string()))
    }

    async fn upload_one(
        &self,
        source: SourceImage,
        destination: &UploadDestination,
        index: usize,
        total: usize,
        progress: &ProgressReporter,
    ) -> Result<UploadResult, ProcessingError> {
        progress.report(UploadStage::Optimizing, index, total, None);
        let optimized = self.optimize_blocking(source).await?;

        let key = self.keys.object_key(destination, &optimized.file_name);

        progress.report(UploadStage::Uploading, index, total, None);
        let url = self
            .storage
            .put_object(
                &key,
                optimized.data.clone(),
                optimized.content_type,
                &self.cache_control,
            )
            .await?;

        progress.report(
            UploadStage::Completed,
            index,
            total,
            Some(optimized.reduction_percent),
        );

        Ok(UploadResult {
            url,
            key,
            file_name: optimized.file_name,
            content_type: optimized.content_type.to_string(),
            width: optimized.width,
            height: optimized.height,
            original_size: optimized.original_size,
            optimized_size: optimized.optimized_size,
            reduction_percent: optimized.reduction_percent,
        })
    }

    async fn optimize_blocking(&self, source: SourceImage) -> Result<OptimizedImage, ProcessingError> {
        let optimizer = Arc::clone(&self.optimizer);
        let spec = self.spec.clone();

        tokio::task::spawn_blocking(move || optimizer.optimize(&source, &spec))
            .await
            .map_err(|e| ProcessingError::Encode(format!("Optimization task failed: {}", e)))?
    }
}
