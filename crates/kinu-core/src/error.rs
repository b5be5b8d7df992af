//! Configuration error types
//!
//! Every variant is fatal at startup: a process that fails to build its
//! [`Config`](crate::Config) must not serve requests.

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("must specify KINU_STORAGE_TYPE environment variable")]
    MissingStorageType,

    #[error("unknown KINU_STORAGE_TYPE {0:?} (expected one of: S3, File)")]
    UnknownStorageType(String),

    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: &'static str, message: String },
}
