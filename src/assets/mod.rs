//! Asset store integration for uploading local files
//!
//! Streams files to the hosted content platform's asset-ingestion API and
//! returns the asset document it creates.

pub mod client;
pub mod mock;

pub use client::AssetClient;
pub use mock::MockAssetClient;

use crate::models::{AssetDescriptor, UploadRequest};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AssetService: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<AssetDescriptor>;
}
