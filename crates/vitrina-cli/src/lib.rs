//! Helpers shared by the `vitrina` binary.

use anyhow::{bail, Context, Result};
use std::path::Path;
use vitrina_processing::{content_type_for_extension, SourceImage};
use vitrina_storage::slugify;

/// Read `path` into a [`SourceImage`], declaring the media type implied by
/// its extension.
pub async fn load_source(path: &Path) -> Result<SourceImage> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let content_type = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(content_type_for_extension)
        .unwrap_or("application/octet-stream");

    let mut source = SourceImage::new(data, content_type);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        source = source.with_name(name);
    }
    Ok(source)
}

/// Pick the item id: an explicit id wins, otherwise slugify the title.
pub fn resolve_item_id(item_id: Option<&str>, title: Option<&str>) -> Result<String> {
    if let Some(id) = item_id {
        return Ok(id.trim().to_string());
    }
    match title.map(slugify) {
        Some(slug) if !slug.is_empty() => Ok(slug),
        Some(_) => bail!("Title does not contain any usable characters"),
        None => bail!("Either --item-id or --title is required"),
    }
}

/// Human-readable byte count ("512 B", "1.5 KB", "2.3 MB").
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let value = bytes as f64;
    if value >= MB {
        format!("{:.1} MB", value / MB)
    } else if value >= KB {
        format!("{:.1} KB", value / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays
/// clean for `--json` output.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
