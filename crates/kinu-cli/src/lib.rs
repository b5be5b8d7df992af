//! Shared pieces of the `kinu` command-line tool.

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use kinu_processing::ResizeOption;
use kinu_storage::{Storage, StorageItem, StorageResult};

/// Flags of the `resize` subcommand, before defaults are applied
#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeFlags {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
    pub hint_width: Option<u32>,
    pub hint_height: Option<u32>,
    pub auto_crop: bool,
}

impl ResizeFlags {
    /// Build the pipeline option. An explicit `--quality` wins over the
    /// configured default; with neither, the pipeline default applies.
    pub fn to_option(self, default_quality: Option<u8>) -> ResizeOption {
        ResizeOption {
            width: self.width.unwrap_or(0),
            height: self.height.unwrap_or(0),
            quality: self.quality.or(default_quality).unwrap_or(0),
            size_hint_width: self.hint_width.unwrap_or(0),
            size_hint_height: self.hint_height.unwrap_or(0),
            needs_auto_crop: self.auto_crop,
        }
    }
}

/// Fetch `source_key`, resize it off the async runtime and store the result
/// under `dest_key`. Returns the size of the stored image.
pub async fn resize_object(
    storage: &dyn Storage,
    source_key: &str,
    dest_key: &str,
    option: ResizeOption,
) -> anyhow::Result<usize> {
    let start = Instant::now();
    let source = storage
        .fetch(source_key)
        .await
        .with_context(|| format!("Fetch {}", source_key))?;

    let output = tokio::task::spawn_blocking(move || kinu_processing::resize(&source, &option))
        .await
        .context("Resize task failed")??;

    let size_bytes = output.len();
    storage
        .put_from_blob(dest_key, output.to_vec())
        .await
        .with_context(|| format!("Store {}", dest_key))?;

    tracing::info!(
        source = %source_key,
        dest = %dest_key,
        size_bytes,
        duration_ms = start.elapsed().as_millis() as u64,
        "Resized image"
    );
    Ok(size_bytes)
}

/// Stream a local file into storage under `key`. Returns the object's public
/// URL when the backend has one.
pub async fn upload_file(
    storage: &dyn Storage,
    path: &Path,
    key: &str,
) -> anyhow::Result<Option<String>> {
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("Open {}", path.display()))?;
    storage
        .put(key, Box::new(file))
        .await
        .with_context(|| format!("Upload {}", key))?;
    Ok(storage.public_url(key))
}

/// Write the object at `key` to a local file. Returns the number of bytes written.
pub async fn download_object(storage: &dyn Storage, key: &str, path: &Path) -> StorageResult<usize> {
    let data = storage.fetch(key).await?;
    tokio::fs::write(path, &data).await?;
    Ok(data.len())
}

/// One JSON document per item, for line-oriented output
pub fn item_json_line(item: &StorageItem) -> anyhow::Result<String> {
    serde_json::to_string(item).context("Serialize storage item")
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
