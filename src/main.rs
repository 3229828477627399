use asset_uploader::app::{report_failure, App, EXIT_FAILURE};
use asset_uploader::models::{AssetKind, Config, UploadOptions, UploadRequest};
use clap::error::ErrorKind;
use clap::Parser;
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "upload-image")]
#[command(about = "Upload a local image to the studio asset store and print the asset document")]
struct CliArgs {
    /// Path of the image file to upload.
    #[arg(value_name = "FILE")]
    file_path: Option<OsString>,

    /// Filename recorded on the asset (defaults to the file's own name).
    #[arg(long)]
    filename: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Metadata for the service to extract, e.g. palette, exif, lqip. Repeatable.
    #[arg(long = "extract", value_name = "KEY")]
    extract: Vec<String>,
}

impl CliArgs {
    /// Positional path as given; an empty value is kept for the usage check.
    fn file_path(&self) -> Option<PathBuf> {
        self.file_path.clone().map(PathBuf::from)
    }

    fn options(&self) -> UploadOptions {
        UploadOptions {
            filename: self.filename.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            extract: self.extract.clone(),
        }
    }
}

/// First line of a clap error without its `error:` prefix.
fn clap_diagnostic(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered.lines().next().unwrap_or_default().trim();
    first.strip_prefix("error:").unwrap_or(first).trim().to_string()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "asset_uploader=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            eprintln!("Error: {}", clap_diagnostic(&e));
            std::process::exit(EXIT_FAILURE);
        }
    };

    let request = match UploadRequest::from_arg(args.file_path()) {
        Ok(request) => request.with_options(args.options()),
        Err(e) => std::process::exit(report_failure(AssetKind::Image, &e, &mut io::stderr())),
    };

    let app = match Config::from_env().and_then(App::from_config) {
        Ok(app) => app,
        Err(e) => std::process::exit(report_failure(request.kind, &e, &mut io::stderr())),
    };

    info!("Starting upload of {}", request.path().display());
    let code = app.run(&request, &mut io::stdout(), &mut io::stderr()).await;
    std::process::exit(code);
}
