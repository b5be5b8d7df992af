//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::keys::{ImageKey, ImageSize};
use crate::StorageBackend;
use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncSeek};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested key does not exist. Callers doing existence checks match
    /// on this variant rather than treating it as a failure.
    #[error("not found requested image: {0}")]
    NotFound(String),

    #[error("specify unknown storage: {0}")]
    UnknownStorage(String),

    #[error("{message}")]
    InvalidStorageOption { message: String },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub fn invalid_option(message: impl Into<String>) -> Self {
        StorageError::InvalidStorageOption {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Metadata for one stored image variant, as returned by [`Storage::list`]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StorageItem {
    pub key: String,
    pub extension: String,
    pub image_size: ImageSize,
}

impl StorageItem {
    /// Build an item from a key, or `None` if the key isn't a well-formed image key.
    pub fn from_key(key: &str) -> Option<Self> {
        ImageKey::parse(key).map(|parsed| StorageItem {
            key: key.to_string(),
            extension: parsed.extension.to_string(),
            image_size: parsed.size,
        })
    }
}

/// Readable and seekable upload source for [`Storage::put`]
pub trait SeekableReader: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> SeekableReader for T {}

/// Storage abstraction trait
///
/// Both backends (S3, local filesystem) implement this trait, so callers that
/// persist or fetch images never depend on which backend the process selected.
///
/// **Key format:** keys written through `put`/`put_from_blob` must satisfy the
/// image key grammar (see the crate root documentation).
#[async_trait]
pub trait Storage: Send + Sync {
    /// Prepare the backend for use (create the root directory, build the
    /// object-store client). Called once by the factory before the backend is
    /// shared.
    async fn open(&mut self) -> StorageResult<()>;

    /// Fetch the bytes stored under `key`
    ///
    /// Returns [`StorageError::NotFound`] if the key does not exist.
    async fn fetch(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Store the contents of `reader` under `key`
    ///
    /// The reader is rewound to its start before it is consumed.
    async fn put(&self, key: &str, reader: Box<dyn SeekableReader>) -> StorageResult<()>;

    /// Store `data` under `key`
    async fn put_from_blob(&self, key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// List the image variants stored under `prefix`, sorted by key
    ///
    /// Objects whose names don't satisfy the image key grammar are skipped.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<StorageItem>>;

    /// Move the object at `from` to `to`
    async fn move_object(&self, from: &str, to: &str) -> StorageResult<()>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Publicly reachable URL for `key`, if the backend is served from one
    fn public_url(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Reject put targets that don't satisfy the image key grammar.
pub(crate) fn ensure_image_key(key: &str) -> StorageResult<()> {
    if crate::keys::is_valid_key(key) {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(format!(
            "{} does not match {{name}}.{{size|original}}.{{jpeg|jpg|png|gif}}",
            key
        )))
    }
}
