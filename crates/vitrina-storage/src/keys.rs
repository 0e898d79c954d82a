//! Object key generation shared by all storage backends.
//!
//! Key format: `{folder}/{item_id}/{timestamp}-{file_name}`. The file name
//! carries its own timestamp and random token, so the key is unique without a
//! pre-existence check against the store.

use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};

use crate::traits::{StorageError, StorageResult};

/// Length of the random token embedded in generated file names.
const TOKEN_LEN: usize = 6;

/// Where an uploaded image belongs: a logical folder and the owning item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadDestination {
    folder: String,
    item_id: String,
}

impl UploadDestination {
    /// Both parts must be non-empty and made of ASCII letters, digits, `-`,
    /// `_` or `.`, so the key needs no escaping in object paths or URLs.
    pub fn new(folder: impl Into<String>, item_id: impl Into<String>) -> StorageResult<Self> {
        let folder = folder.into().trim().to_string();
        let item_id = item_id.into().trim().to_string();
        validate_segment("folder", &folder)?;
        validate_segment("item id", &item_id)?;
        Ok(Self { folder, item_id })
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }
}

fn validate_segment(what: &str, value: &str) -> StorageResult<()> {
    if value.is_empty() {
        return Err(StorageError::InvalidKey(format!("{} must not be empty", what)));
    }
    if value == "." || value == ".." {
        return Err(StorageError::InvalidKey(format!(
            "{} must be a single path segment: {}",
            what, value
        )));
    }
    if let Some(c) = value.chars().find(|c| !is_key_char(*c)) {
        return Err(StorageError::InvalidKey(format!(
            "{} contains {:?}, use letters, digits, '-', '_' or '.': {}",
            what, c, value
        )));
    }
    Ok(())
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

/// Validate a full storage key before it reaches a backend.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.starts_with('/') {
        return Err(StorageError::InvalidKey(
            "Storage key must not start with '/'".to_string(),
        ));
    }
    if storage_key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "..")
    {
        return Err(StorageError::InvalidKey(format!(
            "Storage key contains invalid segments: {}",
            storage_key
        )));
    }
    Ok(())
}

/// Generates unique file names and object keys.
///
/// Injected into the optimizer and the upload sequencer so tests can supply
/// deterministic names.
pub trait KeyStrategy: Send + Sync {
    /// Unique file name for an encoded image with the given extension.
    fn file_name(&self, extension: &str) -> String;

    /// Object key under which `file_name` is stored for `destination`.
    fn object_key(&self, destination: &UploadDestination, file_name: &str) -> String;
}

/// Default strategy: millisecond timestamp plus a short random token.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampKeyStrategy;

impl TimestampKeyStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl KeyStrategy for TimestampKeyStrategy {
    fn file_name(&self, extension: &str) -> String {
        format!(
            "{}-{}.{}",
            Utc::now().timestamp_millis(),
            random_token(TOKEN_LEN),
            extension
        )
    }

    fn object_key(&self, destination: &UploadDestination, file_name: &str) -> String {
        format!(
            "{}/{}/{}-{}",
            destination.folder(),
            destination.item_id(),
            Utc::now().timestamp_millis(),
            file_name
        )
    }
}

fn random_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Derive a URL-safe, lowercase, hyphenated identifier from a title.
///
/// Common Latin accents are folded (`"Casa en Peñalolén"` → `"casa-en-penalolen"`).
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars().flat_map(char::to_lowercase) {
        let folded = match c {
            'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        };

        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else {
            pending_dash = true;
        }
    }

    slug
}
