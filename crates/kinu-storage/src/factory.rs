#[cfg(feature = "storage-local")]
use crate::FileStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use kinu_core::Config;
use std::sync::Arc;

/// Open the storage backend selected by the configuration
///
/// The backend is built from its backend-specific settings, opened, and then
/// returned ready to be shared across requests. Missing backend settings are
/// reported as [`StorageError::InvalidStorageOption`]; a selection whose
/// backend is compiled out is [`StorageError::UnknownStorage`].
pub async fn open_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.storage_backend();

    let storage: Arc<dyn Storage> = match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let s3 = config.s3_storage();
            let bucket = s3
                .bucket
                .clone()
                .ok_or_else(|| StorageError::invalid_option("KINU_S3_BUCKET not configured"))?;
            let region = s3.region.clone().ok_or_else(|| {
                StorageError::invalid_option("KINU_S3_REGION or AWS_REGION not configured")
            })?;

            let mut storage = S3Storage::new(bucket, region, s3.endpoint.clone())
                .with_base_path(s3.bucket_base_path.clone());
            storage.open().await?;
            Arc::new(storage)
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::File => {
            let file = config.file_storage();
            let directory = file.directory.clone().ok_or_else(|| {
                StorageError::invalid_option("KINU_FILE_DIRECTORY not configured")
            })?;

            let mut storage = FileStorage::new(directory, file.base_url.clone());
            storage.open().await?;
            Arc::new(storage)
        }

        #[allow(unreachable_patterns)]
        other => return Err(StorageError::UnknownStorage(other.to_string())),
    };

    tracing::info!(backend = %backend, "Storage backend opened");
    Ok(storage)
}
