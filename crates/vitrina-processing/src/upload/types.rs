use serde::Serialize;

/// Outcome of storing one optimized image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResult {
    pub url: String,
    pub key: String,
    pub file_name: String,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
    pub original_size: u64,
    pub optimized_size: u64,
    pub reduction_percent: i64,
}

/// Step of the per-image pipeline a progress event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStage {
    Optimizing,
    Uploading,
    Completed,
}

/// Progress notification for a single image or a batch.
///
/// `file_index` is zero-based; `percent` covers the whole batch and never
/// decreases within one call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadProgress {
    pub stage: UploadStage,
    pub file_index: usize,
    pub total_files: usize,
    pub percent: u8,
    pub message: String,
}
