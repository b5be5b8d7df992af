//! Kinu CLI: resize and manage stored images from the command line.
//!
//! Storage is selected with KINU_STORAGE_TYPE (S3 or File) plus the matching
//! backend settings; see `kinu_core::Config`.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use kinu_cli::{download_object, init_tracing, item_json_line, resize_object, upload_file, ResizeFlags};
use kinu_core::Config;
use kinu_storage::open_storage;

#[derive(Parser)]
#[command(name = "kinu", about = "Kinu image resize and storage CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resize a stored image into another key
    Resize {
        /// Key of the source image
        source_key: String,
        /// Key to store the resized image under
        dest_key: String,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        /// Output quality, 1-100 (defaults to KINU_RESIZE_QUALITY, then 85)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        quality: Option<u8>,
        /// Decode at roughly this width when both hint dimensions are set
        #[arg(long)]
        hint_width: Option<u32>,
        #[arg(long)]
        hint_height: Option<u32>,
        /// Cover the box and center-crop instead of fitting inside it
        #[arg(long)]
        auto_crop: bool,
    },
    /// Upload a local file
    Upload {
        /// Path to the file to upload
        path: PathBuf,
        /// Destination key
        key: String,
    },
    /// Download a stored object to a local file
    Fetch {
        key: String,
        path: PathBuf,
    },
    /// List image variants directly under a prefix
    List {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Move an object to a new key
    Move {
        from: String,
        to: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env().context("Load configuration")?;
    let storage = open_storage(&config)
        .await
        .with_context(|| format!("Open {} storage", config.storage_backend()))?;
    tracing::debug!(backend = %storage.backend_type(), "Storage ready");

    match cli.command {
        Commands::Resize {
            source_key,
            dest_key,
            width,
            height,
            quality,
            hint_width,
            hint_height,
            auto_crop,
        } => {
            let option = ResizeFlags {
                width,
                height,
                quality,
                hint_width,
                hint_height,
                auto_crop,
            }
            .to_option(config.resize_quality());
            let size = resize_object(storage.as_ref(), &source_key, &dest_key, option).await?;
            println!("{} ({} bytes)", dest_key, size);
        }
        Commands::Upload { path, key } => {
            match upload_file(storage.as_ref(), &path, &key).await? {
                Some(url) => println!("{} {}", key, url),
                None => println!("{}", key),
            }
        }
        Commands::Fetch { key, path } => {
            match download_object(storage.as_ref(), &key, &path).await {
                Ok(size) => println!("{} ({} bytes)", path.display(), size),
                Err(err) if err.is_not_found() => {
                    eprintln!("not found: {}", key);
                    return Ok(ExitCode::FAILURE);
                }
                Err(err) => return Err(err).with_context(|| format!("Fetch {}", key)),
            }
        }
        Commands::List { prefix } => {
            for item in storage.list(&prefix).await.context("List storage")? {
                println!("{}", item_json_line(&item)?);
            }
        }
        Commands::Move { from, to } => {
            storage
                .move_object(&from, &to)
                .await
                .with_context(|| format!("Move {} to {}", from, to))?;
            println!("{} -> {}", from, to);
        }
    }

    Ok(ExitCode::SUCCESS)
}
