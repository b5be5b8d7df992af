//! Configuration module
//!
//! Configuration is resolved once at process start and then shared read-only.
//! Storage selection is validated here so that a misconfigured process fails
//! before it serves anything; backend-specific settings are carried as-is and
//! checked by the storage factory when the backend is opened.

use std::env;

use crate::error::ConfigError;
use crate::storage_types::StorageBackend;

/// Settings for the local filesystem backend
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileStorageConfig {
    pub directory: Option<String>,
    pub base_url: Option<String>,
}

/// Settings for the S3 backend
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct S3StorageConfig {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub bucket_base_path: Option<String>,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    storage_backend: StorageBackend,
    file: FileStorageConfig,
    s3: S3StorageConfig,
    resize_quality: Option<u8>,
}

impl Config {
    /// Build the configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        let storage_backend = var("KINU_STORAGE_TYPE")
            .ok_or(ConfigError::MissingStorageType)?
            .parse::<StorageBackend>()?;

        let file = FileStorageConfig {
            directory: var("KINU_FILE_DIRECTORY"),
            base_url: var("KINU_FILE_BASE_URL"),
        };

        let s3 = S3StorageConfig {
            bucket: var("KINU_S3_BUCKET"),
            region: var("KINU_S3_REGION").or_else(|| var("AWS_REGION")),
            endpoint: var("KINU_S3_ENDPOINT"),
            bucket_base_path: var("KINU_S3_BUCKET_BASE_PATH"),
        };

        let resize_quality = match var("KINU_RESIZE_QUALITY") {
            Some(raw) => Some(parse_quality(&raw)?),
            None => None,
        };

        Ok(Config {
            storage_backend,
            file,
            s3,
            resize_quality,
        })
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage_backend
    }

    pub fn file_storage(&self) -> &FileStorageConfig {
        &self.file
    }

    pub fn s3_storage(&self) -> &S3StorageConfig {
        &self.s3
    }

    /// Default output quality for resize requests that don't specify one.
    pub fn resize_quality(&self) -> Option<u8> {
        self.resize_quality
    }
}

fn parse_quality(raw: &str) -> Result<u8, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        name: "KINU_RESIZE_QUALITY",
        message: format!("{raw:?} is not an integer between 1 and 100"),
    };
    let quality = raw.trim().parse::<u8>().map_err(|_| invalid())?;
    if (1..=100).contains(&quality) {
        Ok(quality)
    } else {
        Err(invalid())
    }
}
