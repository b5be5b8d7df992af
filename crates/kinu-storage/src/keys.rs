//! Image key grammar shared by all storage backends.
//!
//! The final segment of a key must match `{name}.{size|original}.{ext}` with
//! `ext` in `jpeg|jpg|png|gif`. Everything before the last `/` is an opaque
//! prefix (e.g. `user/1/`).

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::LazyLock;

use regex::Regex;

static IMAGE_FILE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[^/]+)\.(?P<size>[0-9]+|original)\.(?P<ext>jpeg|jpg|png|gif)$")
        .expect("image file name pattern is valid")
});

/// Size tag of a stored image variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Pixels(u32),
    Original,
}

impl Display for ImageSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ImageSize::Pixels(px) => write!(f, "{}", px),
            ImageSize::Original => f.write_str("original"),
        }
    }
}

impl serde::Serialize for ImageSize {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A storage key that satisfies the image key grammar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageKey<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub size: ImageSize,
    pub extension: &'a str,
}

impl<'a> ImageKey<'a> {
    /// Parse `key`, returning `None` if its file name segment is not well-formed.
    pub fn parse(key: &'a str) -> Option<Self> {
        let file_name = key.rsplit('/').next()?;
        let caps = IMAGE_FILE_NAME.captures(file_name)?;

        let size = match caps.name("size")?.as_str() {
            "original" => ImageSize::Original,
            digits => ImageSize::Pixels(digits.parse().ok()?),
        };

        Some(ImageKey {
            key,
            name: caps.name("name")?.as_str(),
            size,
            extension: caps.name("ext")?.as_str(),
        })
    }
}

/// Check a key against the image key grammar.
pub fn is_valid_key(key: &str) -> bool {
    ImageKey::parse(key).is_some()
}
