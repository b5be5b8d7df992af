//! Kinu Storage Library
//!
//! This crate provides the storage abstraction for Kinu and its two backends,
//! S3 (object storage) and File (local filesystem). Exactly one backend is
//! active per process; it is chosen from [`kinu_core::Config`] by
//! [`open_storage`].
//!
//! # Storage key format
//!
//! Image objects are stored under path-like keys whose final segment names the
//! image variant:
//!
//! - `{name}.original.{ext}` for the uploaded source image
//! - `{name}.{size}.{ext}` for a resized variant, `size` being a pixel count
//!
//! where `ext` is one of `jpeg`, `jpg`, `png`, `gif`. For example
//! `user/1/avatar.200.jpg`. The grammar lives in the `keys` module so every
//! backend filters and validates keys the same way.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::open_storage;
pub use keys::{is_valid_key, ImageKey, ImageSize};
pub use kinu_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::FileStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{SeekableReader, Storage, StorageError, StorageItem, StorageResult};
