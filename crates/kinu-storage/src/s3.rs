use crate::traits::{ensure_image_key, SeekableReader, Storage, StorageError, StorageItem, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};
use std::io::SeekFrom;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Option<Arc<dyn ObjectStore>>,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    base_path: Option<String>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// The client is built by [`Storage::open`].
    pub fn new(bucket: String, region: String, endpoint_url: Option<String>) -> Self {
        S3Storage {
            store: None,
            bucket,
            region,
            endpoint_url,
            base_path: None,
        }
    }

    /// Wrap an already-built object store (in-memory store in tests, or any
    /// other S3-compatible client).
    pub fn with_store(bucket: String, store: Arc<dyn ObjectStore>) -> Self {
        S3Storage {
            store: Some(store),
            bucket,
            region: String::new(),
            endpoint_url: None,
            base_path: None,
        }
    }

    /// Prefix every key with `base_path` inside the bucket
    pub fn with_base_path(mut self, base_path: Option<String>) -> Self {
        self.base_path = base_path
            .map(|p| p.trim_matches('/').to_string())
            .filter(|p| !p.is_empty());
        self
    }

    fn store(&self) -> StorageResult<&Arc<dyn ObjectStore>> {
        self.store.as_ref().ok_or_else(|| {
            StorageError::BackendError(format!("S3 storage for bucket {} is not open", self.bucket))
        })
    }

    fn location(&self, key: &str) -> Path {
        match self.base_path {
            Some(ref base) => Path::from(format!("{}/{}", base, key)),
            None => Path::from(key),
        }
    }

    /// Strip the bucket base path from an object location, yielding the key
    fn key_from_location<'a>(&self, location: &'a str) -> Option<&'a str> {
        match self.base_path {
            Some(ref base) => location.strip_prefix(base.as_str())?.strip_prefix('/'),
            None => Some(location),
        }
    }

    async fn put_bytes(&self, key: &str, bytes: Bytes) -> StorageResult<()> {
        let store = self.store()?;
        let size = bytes.len() as u64;
        let location = self.location(key);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = store.put(&location, PutPayload::from(bytes)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 put failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 put successful"
        );

        Ok(())
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn open(&mut self) -> StorageResult<()> {
        if self.store.is_some() {
            return Ok(());
        }

        // Credentials come from the standard AWS environment variables.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(self.bucket.clone());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::invalid_option(e.to_string()))?;

        self.store = Some(Arc::new(store));

        tracing::info!(
            bucket = %self.bucket,
            region = %self.region,
            endpoint = ?self.endpoint_url,
            "S3 storage opened"
        );
        Ok(())
    }

    async fn fetch(&self, key: &str) -> StorageResult<Vec<u8>> {
        let store = self.store()?;
        let start = std::time::Instant::now();
        let location = self.location(key);

        let result: ObjectResult<_> = store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 fetch failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let bytes = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 fetch successful"
        );

        Ok(bytes.to_vec())
    }

    async fn put(&self, key: &str, mut reader: Box<dyn SeekableReader>) -> StorageResult<()> {
        ensure_image_key(key)?;

        reader.seek(SeekFrom::Start(0)).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to rewind upload source: {}", e))
        })?;

        // object_store takes a single payload, so the source is buffered in memory.
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
        })?;

        self.put_bytes(key, Bytes::from(buffer)).await
    }

    async fn put_from_blob(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        ensure_image_key(key)?;
        self.put_bytes(key, Bytes::from(data)).await
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StorageItem>> {
        let store = self.store()?;
        let prefix = prefix.trim_matches('/');
        let location = if prefix.is_empty() {
            self.base_path.as_deref().map(Path::from)
        } else {
            Some(self.location(prefix))
        };

        let objects: Vec<_> = store
            .list(location.as_ref())
            .try_collect()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    prefix = %prefix,
                    "S3 list failed"
                );
                StorageError::BackendError(e.to_string())
            })?;

        let mut items: Vec<StorageItem> = objects
            .iter()
            .filter_map(|meta| {
                let location = meta.location.to_string();
                let key = self.key_from_location(&location)?;
                // Direct children of the prefix only, matching the File backend.
                let file_name = if prefix.is_empty() {
                    key
                } else {
                    key.strip_prefix(prefix)?.strip_prefix('/')?
                };
                if file_name.contains('/') {
                    return None;
                }
                StorageItem::from_key(key)
            })
            .collect();

        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }

    async fn move_object(&self, from: &str, to: &str) -> StorageResult<()> {
        ensure_image_key(to)?;
        let store = self.store()?;
        let start = std::time::Instant::now();
        let from_location = self.location(from);
        let to_location = self.location(to);

        let copy_result: ObjectResult<_> = store.copy(&from_location, &to_location).await;
        copy_result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(from.to_string()),
            other => StorageError::BackendError(other.to_string()),
        })?;

        let delete_result: ObjectResult<_> = store.delete(&from_location).await;
        delete_result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %from,
                "S3 delete after copy failed"
            );
            StorageError::BackendError(e.to_string())
        })?;

        tracing::info!(
            from_key = %from,
            to_key = %to,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 move successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
