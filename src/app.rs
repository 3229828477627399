//! Application orchestration for a single asset upload.

use crate::assets::{AssetClient, AssetService};
use crate::models::{AssetDescriptor, AssetKind, Config, UploadRequest};
use crate::{Error, Result};
use std::io::Write;
use tracing::{debug, info};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Uploads one file and reports the outcome on the process streams.
pub struct App {
    assets: Box<dyn AssetService>,
}

impl App {
    /// Build an app around any asset service; tests inject mocks here.
    pub fn with_service(assets: Box<dyn AssetService>) -> Self {
        Self { assets }
    }

    pub fn from_config(config: Config) -> Result<Self> {
        info!(
            "Asset store: project {} dataset {} (API v{})",
            config.project_id, config.dataset, config.api_version
        );
        Ok(Self::with_service(Box::new(AssetClient::new(config)?)))
    }

    pub async fn upload(&self, request: &UploadRequest) -> Result<AssetDescriptor> {
        debug!("Uploading {} as {}", request.path().display(), request.kind);
        self.assets.upload(request).await
    }

    /// Upload and write the outcome: one JSON line on `out` for success, one
    /// diagnostic line on `err` otherwise. Returns the process exit code.
    pub async fn run<O, E>(&self, request: &UploadRequest, out: &mut O, err: &mut E) -> i32
    where
        O: Write,
        E: Write,
    {
        let result = self
            .upload(request)
            .await
            .and_then(|descriptor| write_descriptor(&descriptor, out));

        match result {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => report_failure(request.kind, &e, err),
        }
    }
}

pub fn write_descriptor<O: Write>(descriptor: &AssetDescriptor, out: &mut O) -> Result<()> {
    let line = descriptor.to_json_line()?;
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

/// Write a single-line diagnostic for `error` and return the failure exit code.
pub fn report_failure<E: Write>(kind: AssetKind, error: &Error, err: &mut E) -> i32 {
    let message = if error.is_usage() {
        format!("Error: {}", error)
    } else {
        format!("Error uploading {}: {}", kind, error)
    };
    let line = message.split_whitespace().collect::<Vec<_>>().join(" ");

    // Nothing left to report to if stderr itself is gone.
    let _ = writeln!(err, "{}", line);
    EXIT_FAILURE
}
