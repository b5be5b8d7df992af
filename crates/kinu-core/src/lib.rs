//! Kinu Core Library
//!
//! This crate provides the configuration, storage backend selection, and error
//! types shared by every Kinu component.

pub mod config;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, FileStorageConfig, S3StorageConfig};
pub use error::ConfigError;
pub use storage_types::StorageBackend;
