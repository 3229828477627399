//! Batch import of remote OGP/cover images into the asset store.
//!
//! Reads the scraped-data JSON produced by the content pipeline, uploads every
//! referenced image and writes an `entry id -> asset id` mapping that document
//! conversion steps use to attach images.

use anyhow::{Context, Result};
use asset_uploader::assets::AssetClient;
use asset_uploader::import::{ensure_token, load_entries, write_mapping, RemoteImageImporter};
use asset_uploader::models::Config;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "import-remote-images")]
#[command(about = "Download remote images listed in scraped data and upload them as assets")]
struct CliArgs {
    /// Scraped data keyed by entry id, each with an optional `image_url`.
    #[arg(long, default_value = "scraped_data.json")]
    input: PathBuf,

    /// Where to write the entry id to asset id mapping.
    #[arg(long, default_value = "image_asset_mapping.json")]
    output: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_uploader=info,import_remote_images=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let config = Config::from_env()?;
    ensure_token(&config)?;

    let entries = load_entries(&args.input)
        .with_context(|| format!("Could not load {}", args.input.display()))?;
    info!("Loaded {} entries from {}", entries.len(), args.input.display());

    let importer = RemoteImageImporter::new(Box::new(AssetClient::new(config)?))?;
    let report = importer.import_all(&entries).await;

    write_mapping(&args.output, &report.mapping)?;
    info!(
        "Wrote {} ({} uploaded, {} skipped, {} failed)",
        args.output.display(),
        report.mapping.len(),
        report.skipped.len(),
        report.failed.len()
    );

    Ok(())
}
