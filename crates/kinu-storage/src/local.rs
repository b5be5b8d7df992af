use crate::traits::{ensure_image_key, SeekableReader, Storage, StorageError, StorageItem, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct FileStorage {
    base_path: PathBuf,
    base_url: Option<String>,
}

impl FileStorage {
    /// Create a new FileStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for image storage (e.g., "/var/lib/kinu/images")
    /// * `base_url` - Optional base URL the directory is served from (e.g., "http://localhost:8080/images")
    ///
    /// Nothing touches the filesystem until [`Storage::open`] is called.
    pub fn new(base_path: impl Into<PathBuf>, base_url: Option<String>) -> Self {
        FileStorage {
            base_path: base_path.into(),
            base_url,
        }
    }

    /// Convert storage key to filesystem path with security validation
    ///
    /// Keys may not contain `..` or start with `/`, and an existing path must
    /// not resolve (through symlinks) outside the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(key);

        if let Ok(canonical) = path.canonicalize() {
            let base_canonical = self.base_path.canonicalize().map_err(|e| {
                StorageError::invalid_option(format!("Failed to canonicalize base path: {}", e))
            })?;
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn open(&mut self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            StorageError::invalid_option(format!(
                "Failed to create storage directory {}: {}",
                self.base_path.display(),
                e
            ))
        })?;

        tracing::info!(path = %self.base_path.display(), "File storage opened");
        Ok(())
    }

    async fn fetch(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
            _ => StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                path.display(),
                e
            )),
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File storage fetch successful"
        );

        Ok(data)
    }

    async fn put(&self, key: &str, mut reader: Box<dyn SeekableReader>) -> StorageResult<()> {
        ensure_image_key(key)?;
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        reader.seek(SeekFrom::Start(0)).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to rewind upload source: {}", e))
        })?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to write stream to file {}: {}",
                path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File storage put successful"
        );

        Ok(())
    }

    async fn put_from_blob(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        ensure_image_key(key)?;
        let path = self.key_to_path(key)?;
        let size = data.len();
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File storage put_from_blob successful"
        );

        Ok(())
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<StorageItem>> {
        let prefix = prefix.trim_end_matches('/');
        let dir = if prefix.is_empty() {
            self.base_path.clone()
        } else {
            self.key_to_path(prefix)?
        };

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::BackendError(format!(
                    "Failed to read directory {}: {}",
                    dir.display(),
                    e
                )))
            }
        };

        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let key = if prefix.is_empty() {
                file_name.to_string()
            } else {
                format!("{}/{}", prefix, file_name)
            };
            if let Some(item) = StorageItem::from_key(&key) {
                items.push(item);
            }
        }

        items.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(items)
    }

    async fn move_object(&self, from: &str, to: &str) -> StorageResult<()> {
        ensure_image_key(to)?;
        let from_path = self.key_to_path(from)?;
        let to_path = self.key_to_path(to)?;

        self.ensure_parent_dir(&to_path).await?;

        fs::rename(&from_path, &to_path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => StorageError::NotFound(from.to_string()),
                _ => StorageError::BackendError(format!(
                    "Failed to move {} to {}: {}",
                    from_path.display(),
                    to_path.display(),
                    e
                )),
            })?;

        tracing::info!(
            from_key = %from,
            to_key = %to,
            from_path = %from_path.display(),
            to_path = %to_path.display(),
            "File storage move successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::File
    }

    fn public_url(&self, key: &str) -> Option<String> {
        self.base_url
            .as_ref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), key))
    }
}
