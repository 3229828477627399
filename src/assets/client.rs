use super::AssetService;
use crate::mime::{detect_content_type, SNIFF_LEN};
use crate::models::{AssetDescriptor, Config, UploadRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, StatusCode};
use serde::Deserialize;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Write client for the asset-ingestion API.
///
/// Always talks to the origin API host; the CDN-fronted read host never
/// sees writes.
pub struct AssetClient {
    client: Client,
    config: Config,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    document: Option<serde_json::Value>,
}

struct FileStream {
    body: Body,
    len: u64,
    content_type: &'static str,
}

impl AssetClient {
    pub fn new(config: Config) -> Result<Self> {
        Self::new_with_client(config, Client::new())
    }

    pub fn new_with_client(config: Config, client: Client) -> Result<Self> {
        if config.use_cdn {
            return Err(Error::Config(
                "Asset uploads must go to the origin API; disable use_cdn".to_string(),
            ));
        }
        config.validate()?;

        let base_url = match &config.api_host {
            Some(host) if is_cdn_host(host) => {
                return Err(Error::Config(format!(
                    "API host {} is the cached read endpoint; uploads need the origin API",
                    host
                )));
            }
            Some(host) => host.trim_end_matches('/').to_string(),
            None => format!("https://{}.api.sanity.io", config.project_id),
        };

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn upload_url(&self, request: &UploadRequest) -> String {
        format!(
            "{}/v{}/assets/{}/{}",
            self.base_url,
            self.config.api_version,
            request.kind.endpoint_segment(),
            self.config.dataset
        )
    }

    fn query_params(request: &UploadRequest) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(filename) = request.filename() {
            params.push(("filename", filename));
        }
        if let Some(title) = &request.options.title {
            params.push(("title", title.clone()));
        }
        if let Some(description) = &request.options.description {
            params.push(("description", description.clone()));
        }
        for key in &request.options.extract {
            params.push(("meta", key.clone()));
        }
        params
    }

    async fn open_stream(path: &Path) -> Result<FileStream> {
        let mut file = File::open(path).await.map_err(|e| Error::file(path, e))?;

        let metadata = file.metadata().await.map_err(|e| Error::file(path, e))?;
        if metadata.is_dir() {
            return Err(Error::file(
                path,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "is a directory"),
            ));
        }

        let mut head = Vec::with_capacity(SNIFF_LEN);
        (&mut file)
            .take(SNIFF_LEN as u64)
            .read_to_end(&mut head)
            .await
            .map_err(|e| Error::file(path, e))?;
        file.seek(SeekFrom::Start(0))
            .await
            .map_err(|e| Error::file(path, e))?;

        Ok(FileStream {
            body: Body::wrap_stream(ReaderStream::new(file)),
            len: metadata.len(),
            content_type: detect_content_type(&head),
        })
    }
}

fn is_cdn_host(base_url: &str) -> bool {
    base_url.to_ascii_lowercase().contains("apicdn.")
}

/// Best human-readable message from an error payload.
fn api_error_message(status: StatusCode, body: &str) -> String {
    let from_payload = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|payload| {
            let error = payload.get("error");
            payload
                .get("message")
                .and_then(|v| v.as_str())
                .or_else(|| error.and_then(|e| e.get("description")).and_then(|v| v.as_str()))
                .or_else(|| error.and_then(|v| v.as_str()))
                .map(str::to_string)
        });

    from_payload
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| format!("Server responded with {}", status))
}

#[async_trait]
impl AssetService for AssetClient {
    async fn upload(&self, request: &UploadRequest) -> Result<AssetDescriptor> {
        let stream = Self::open_stream(request.path()).await?;
        let url = self.upload_url(request);

        tracing::info!(
            kind = %request.kind,
            bytes = stream.len,
            content_type = stream.content_type,
            "Uploading {} to {}",
            request.path().display(),
            url
        );

        let mut builder = self
            .client
            .post(&url)
            .query(&Self::query_params(request))
            .header(CONTENT_TYPE, stream.content_type)
            .header(CONTENT_LENGTH, stream.len)
            .body(stream.body);
        if let Some(token) = &self.config.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!("Failed to send upload request: {}", e);
            e
        })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = api_error_message(status, &body);
            tracing::debug!("Asset API error (status {}): {}", status, body);
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: UploadResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::debug!("Failed to parse upload response: {}\nBody: {}", e, body);
            Error::Generic(format!("Failed to parse upload response: {}", e))
        })?;

        let document = parsed.document.ok_or_else(|| {
            Error::Generic("Upload response did not contain an asset document".to_string())
        })?;

        let descriptor = AssetDescriptor::new(document);
        tracing::info!("Created asset {}", descriptor.id().unwrap_or("<unknown>"));
        Ok(descriptor)
    }
}
