use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::error::ConfigError;

/// Storage backend types
///
/// The allow-list of backends a process may select through `KINU_STORAGE_TYPE`.
/// It's defined in core because it's resolved during configuration, before any
/// storage crate code runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    S3,
    File,
}

impl StorageBackend {
    pub const ALL: [StorageBackend; 2] = [StorageBackend::S3, StorageBackend::File];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::S3 => "S3",
            StorageBackend::File => "File",
        }
    }
}

impl FromStr for StorageBackend {
    type Err = ConfigError;

    /// Matching is exact: `"s3"` or `"file"` are not members of the allow-list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StorageBackend::ALL
            .into_iter()
            .find(|backend| backend.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownStorageType(s.to_string()))
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
