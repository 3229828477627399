use super::AssetService;
use crate::models::{AssetDescriptor, UploadRequest};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory asset store that records every upload request.
#[derive(Clone)]
pub struct MockAssetClient {
    uploads: Arc<Mutex<Vec<UploadRequest>>>,
    response: Option<serde_json::Value>,
    failure: Option<(u16, String)>,
}

impl MockAssetClient {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            response: None,
            failure: None,
        }
    }

    pub fn with_response(mut self, document: serde_json::Value) -> Self {
        self.response = Some(document);
        self
    }

    /// Make every upload fail with an API error.
    pub fn with_failure(mut self, status: u16, message: impl Into<String>) -> Self {
        self.failure = Some((status, message.into()));
        self
    }

    pub fn get_upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn get_uploads(&self) -> Vec<UploadRequest> {
        self.uploads.lock().unwrap().clone()
    }
}

impl Default for MockAssetClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AssetService for MockAssetClient {
    async fn upload(&self, request: &UploadRequest) -> Result<AssetDescriptor> {
        self.uploads.lock().unwrap().push(request.clone());

        if let Some((status, message)) = &self.failure {
            return Err(Error::Api {
                status: *status,
                message: message.clone(),
            });
        }

        tokio::fs::metadata(request.path())
            .await
            .map_err(|e| Error::file(request.path(), e))?;

        let document = match &self.response {
            Some(document) => document.clone(),
            None => {
                let count = self.get_upload_count();
                serde_json::json!({
                    "_id": format!("image-mock-{}", count),
                    "_type": "sanity.imageAsset",
                    "originalFilename": request.filename(),
                })
            }
        };
        Ok(AssetDescriptor::new(document))
    }
}
