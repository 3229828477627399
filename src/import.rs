//! Batch import of remotely hosted images into the asset store.
//!
//! Reads a scraped-data map of `entry id -> { image_url, .. }`, downloads each
//! image to a temporary file, uploads it as an image asset and records the
//! resulting asset id per entry. Entries are handled one at a time; a failing
//! entry is reported and skipped.

use crate::assets::AssetService;
use crate::models::{Config, UploadRequest};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Connect and per-read inactivity limit; a slow but steady body is not cut off.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Entry id to uploaded asset `_id`.
pub type AssetMapping = BTreeMap<String, String>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapedEntry {
    pub image_url: Option<String>,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub mapping: AssetMapping,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, String)>,
}

pub struct RemoteImageImporter {
    http: reqwest::Client,
    assets: Box<dyn AssetService>,
}

impl RemoteImageImporter {
    pub fn new(assets: Box<dyn AssetService>) -> Result<Self> {
        Ok(Self::with_client(download_client(DOWNLOAD_TIMEOUT)?, assets))
    }

    pub fn with_client(http: reqwest::Client, assets: Box<dyn AssetService>) -> Self {
        Self { http, assets }
    }

    /// Stream `url` into a temporary file that is removed on drop.
    pub async fn download(&self, url: &str) -> Result<NamedTempFile> {
        let mut response = self.http.get(url).send().await?.error_for_status()?;

        let temp = NamedTempFile::new()?;
        let mut file = tokio::fs::File::from_std(temp.as_file().try_clone()?);
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        Ok(temp)
    }

    /// Download and upload one image, returning the new asset id.
    pub async fn import_one(&self, url: &str) -> Result<String> {
        let temp = self.download(url).await?;
        let descriptor = self.assets.upload(&UploadRequest::image(temp.path())).await?;

        descriptor
            .id()
            .map(str::to_string)
            .ok_or_else(|| Error::Generic("Uploaded asset has no _id".to_string()))
    }

    pub async fn import_all(&self, entries: &BTreeMap<String, ScrapedEntry>) -> ImportReport {
        let mut report = ImportReport::default();

        for (entry_id, entry) in entries {
            let Some(url) = entry.image_url.as_deref().filter(|u| !u.is_empty()) else {
                info!("Skipping {}: no image_url", entry_id);
                report.skipped.push(entry_id.clone());
                continue;
            };

            info!("Processing image for {} from {}", entry_id, url);
            match self.import_one(url).await {
                Ok(asset_id) => {
                    info!("Uploaded {} as asset {}", url, asset_id);
                    report.mapping.insert(entry_id.clone(), asset_id);
                }
                Err(e) => {
                    warn!("Failed to import image for {}: {}", entry_id, e);
                    report.failed.push((entry_id.clone(), e.to_string()));
                }
            }
        }

        report
    }
}

pub fn download_client(idle_timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(idle_timeout)
        .read_timeout(idle_timeout)
        .build()?)
}

/// The batch writes many assets, so it refuses to start without a credential.
pub fn ensure_token(config: &Config) -> Result<()> {
    if config.has_token() {
        Ok(())
    } else {
        Err(Error::Config(
            "SANITY_API_TOKEN environment variable is not set".to_string(),
        ))
    }
}

pub fn load_entries(path: &Path) -> Result<BTreeMap<String, ScrapedEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_mapping(path: &Path, mapping: &AssetMapping) -> Result<()> {
    let json = serde_json::to_string_pretty(mapping)?;
    std::fs::write(path, json).map_err(|e| Error::file(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MockAssetClient;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn entry(url: Option<String>) -> ScrapedEntry {
        ScrapedEntry { image_url: url }
    }

    #[tokio::test]
    async fn test_download_streams_to_temp_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/og.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4E, 0x47]))
            .mount(&server)
            .await;

        let importer = RemoteImageImporter::new(Box::new(MockAssetClient::new())).unwrap();
        let temp = importer
            .download(&format!("{}/og.png", server.uri()))
            .await
            .unwrap();

        assert_eq!(std::fs::read(temp.path()).unwrap(), vec![0x89, 0x50, 0x4E, 0x47]);
    }

    #[tokio::test]
    async fn test_download_client_applies_idle_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stalled.png"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/quick.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1, 2, 3])
                    .set_delay(Duration::from_millis(20)),
            )
            .mount(&server)
            .await;

        let http = download_client(Duration::from_millis(200)).unwrap();
        let importer = RemoteImageImporter::with_client(http, Box::new(MockAssetClient::new()));

        let stalled = importer
            .download(&format!("{}/stalled.png", server.uri()))
            .await;
        assert!(matches!(stalled, Err(Error::Http(_))));

        let quick = importer
            .download(&format!("{}/quick.png", server.uri()))
            .await
            .unwrap();
        assert_eq!(std::fs::read(quick.path()).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_ensure_token() {
        let config = Config::new("proj1".to_string(), "production".to_string());
        assert!(matches!(ensure_token(&config), Err(Error::Config(_))));
        assert!(ensure_token(&config.with_token("sk-test")).is_ok());
    }

    #[tokio::test]
    async fn test_import_all_skips_and_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mock = MockAssetClient::new();
        let importer = RemoteImageImporter::new(Box::new(mock.clone())).unwrap();

        let mut entries = BTreeMap::new();
        entries.insert("post-1".to_string(), entry(Some(format!("{}/ok.jpg", server.uri()))));
        entries.insert("post-2".to_string(), entry(None));
        entries.insert("post-3".to_string(), entry(Some(format!("{}/gone.jpg", server.uri()))));

        let report = importer.import_all(&entries).await;

        assert_eq!(
            report.mapping.get("post-1").map(String::as_str),
            Some("image-mock-1")
        );
        assert_eq!(report.mapping.len(), 1);
        assert_eq!(report.skipped, vec!["post-2".to_string()]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "post-3");
        assert_eq!(mock.get_upload_count(), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_is_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .mount(&server)
            .await;

        let mock = MockAssetClient::new().with_failure(403, "Insufficient permissions");
        let importer = RemoteImageImporter::new(Box::new(mock)).unwrap();

        let mut entries = BTreeMap::new();
        entries.insert("post-1".to_string(), entry(Some(format!("{}/a.png", server.uri()))));

        let report = importer.import_all(&entries).await;
        assert!(report.mapping.is_empty());
        assert!(report.failed[0].1.contains("Insufficient permissions"));
    }

    #[tokio::test]
    async fn test_descriptor_without_id_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .mount(&server)
            .await;

        let mock = MockAssetClient::new().with_response(serde_json::json!({ "url": "x" }));
        let importer = RemoteImageImporter::new(Box::new(mock)).unwrap();

        let err = importer
            .import_one(&format!("{}/a.png", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("_id"));
    }

    #[test]
    fn test_load_entries_and_write_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("scraped_data.json");
        std::fs::write(
            &input,
            r#"{
                "post-1": { "title": "Hello", "image_url": "https://example.com/a.png" },
                "post-2": { "title": "No image" }
            }"#,
        )
        .unwrap();

        let entries = load_entries(&input).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries["post-1"].image_url.as_deref(),
            Some("https://example.com/a.png")
        );
        assert!(entries["post-2"].image_url.is_none());

        let mut mapping = AssetMapping::new();
        mapping.insert("post-1".to_string(), "image-abc".to_string());
        let output = dir.path().join("image_asset_mapping.json");
        write_mapping(&output, &mapping).unwrap();

        let written: AssetMapping =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written, mapping);
    }

    #[test]
    fn test_load_entries_missing_file() {
        let err = load_entries(Path::new("/no/such/scraped_data.json")).unwrap_err();
        assert!(matches!(err, Error::File { .. }));
    }
}
