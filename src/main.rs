use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facefit::session::TryOnSession;
use facefit::{config, history, Category};
use log::info;

#[derive(Parser)]
#[command(name = "facefit")]
#[command(version, about = "Virtual try-on compositor for wearable accessories")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Composite a product onto an uploaded photo
    Photo {
        /// Product identifier for the try-on counter
        #[arg(short, long)]
        product: String,
        /// Product sprite image (transparent PNG)
        #[arg(long)]
        sprite: PathBuf,
        /// Product category (earrings|glasses)
        #[arg(short, long)]
        category: Category,
        /// Landmark script from the external detector
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Photo to try the product on
        input: PathBuf,
        /// Where to write the composited result
        #[arg(short, long, default_value = "tryon.png")]
        output: PathBuf,
    },
    /// Composite a product onto a directory of decoded video frames
    Video {
        #[arg(short, long)]
        product: String,
        #[arg(long)]
        sprite: PathBuf,
        #[arg(short, long)]
        category: Category,
        #[arg(short, long)]
        landmarks: PathBuf,
        /// Directory of host-decoded frames, processed in name order
        frames: PathBuf,
        /// Directory for the composited frames
        #[arg(short, long, default_value = "tryon-frames")]
        output: PathBuf,
    },
    /// Continuous live try-on from the configured camera
    Live {
        #[arg(short, long)]
        product: String,
        #[arg(long)]
        sprite: PathBuf,
        #[arg(short, long)]
        category: Category,
        #[arg(short, long)]
        landmarks: PathBuf,
        /// File the latest composited preview frame is written to
        #[arg(short = 'o', long, default_value = "preview.png")]
        preview: PathBuf,
    },
    /// Show the try-on count for a product
    History {
        #[arg(short, long)]
        product: String,
    },
    /// Remove all recorded try-ons for a product
    Purge {
        #[arg(short, long)]
        product: String,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(None)?;

    match cli.command {
        Commands::Photo {
            product,
            sprite,
            category,
            landmarks,
            input,
            output,
        } => {
            let session = TryOnSession::new(cfg, &product, &sprite, category, &landmarks, false)?;
            session.photo(&input, &output)
        }
        Commands::Video {
            product,
            sprite,
            category,
            landmarks,
            frames,
            output,
        } => {
            let session = TryOnSession::new(cfg, &product, &sprite, category, &landmarks, true)?;
            session.video(&frames, &output)?;
            Ok(())
        }
        Commands::Live {
            product,
            sprite,
            category,
            landmarks,
            preview,
        } => {
            let session = TryOnSession::new(cfg, &product, &sprite, category, &landmarks, true)?;
            session.live(&preview)
        }
        Commands::History { product } => {
            let count = history::count(&config::TRYON_STORE_PREFIX, &product)?;
            info!("Product {product}: {count} try-on(s)");
            Ok(())
        }
        Commands::Purge { product } => {
            history::purge(&config::TRYON_STORE_PREFIX, &product)
                .context("Failed to purge try-on records")?;
            info!("✓ Try-on records purged for product: {product}");
            Ok(())
        }
        Commands::Config => open_config(),
    }
}

fn open_config() -> Result<()> {
    let config_path = config::CONFIG_PATH.as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {config_path:?}");

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
