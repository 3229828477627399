//! Data models and structures
//!
//! Defines the upload request built from the command line, the opaque asset
//! descriptor returned by the asset store, and the remote client
//! configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PROJECT_ID: &str = "4n33m7o6";
pub const DEFAULT_DATASET: &str = "production";
pub const DEFAULT_API_VERSION: &str = "2024-05-01";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Image,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Image => "image",
        }
    }

    /// Path segment of the ingestion endpoint (`/assets/<segment>/<dataset>`).
    pub fn endpoint_segment(&self) -> &'static str {
        match self {
            AssetKind::Image => "images",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional metadata passed through to the asset store as query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadOptions {
    pub filename: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub extract: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub file_path: PathBuf,
    pub kind: AssetKind,
    pub options: UploadOptions,
}

impl UploadRequest {
    pub fn image(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            kind: AssetKind::Image,
            options: UploadOptions::default(),
        }
    }

    /// Build a request from the positional command-line argument.
    ///
    /// An absent or empty argument is a usage error; nothing touches the
    /// filesystem here.
    pub fn from_arg(arg: Option<PathBuf>) -> crate::Result<Self> {
        match arg {
            Some(path) if !path.as_os_str().is_empty() => Ok(Self::image(path)),
            _ => Err(crate::Error::Usage),
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Explicit filename, falling back to the last path component.
    pub fn filename(&self) -> Option<String> {
        self.options.filename.clone().or_else(|| {
            self.file_path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

/// Asset document as returned by the asset store.
///
/// The shape is owned by the remote service; it is forwarded verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetDescriptor(serde_json::Value);

impl AssetDescriptor {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("_id").and_then(|v| v.as_str())
    }

    pub fn url(&self) -> Option<&str> {
        self.0.get("url").and_then(|v| v.as_str())
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Compact single-line JSON rendering.
    pub fn to_json_line(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }
}

// Configuration
#[derive(Clone)]
pub struct Config {
    pub project_id: String,
    pub dataset: String,
    pub api_version: String,
    pub use_cdn: bool,
    pub token: Option<String>,
    pub api_host: Option<String>,
}

impl Config {
    pub fn new(project_id: String, dataset: String) -> Self {
        Self {
            project_id,
            dataset,
            api_version: DEFAULT_API_VERSION.to_string(),
            use_cdn: false,
            token: None,
            api_host: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_api_host(mut self, api_host: impl Into<String>) -> Self {
        self.api_host = Some(api_host.into());
        self
    }

    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_version = non_empty("SANITY_API_VERSION")
            .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
        let api_version = api_version
            .strip_prefix('v')
            .unwrap_or(&api_version)
            .to_string();

        let config = Self {
            project_id: non_empty("SANITY_PROJECT_ID")
                .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string()),
            dataset: non_empty("SANITY_DATASET").unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            api_version,
            use_cdn: false,
            token: non_empty("SANITY_API_TOKEN"),
            api_host: non_empty("SANITY_API_HOST"),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        let valid_id = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        };

        if !valid_id(&self.project_id) {
            return Err(crate::Error::Config(format!(
                "Invalid project id '{}'",
                self.project_id
            )));
        }
        if !valid_id(&self.dataset) {
            return Err(crate::Error::Config(format!(
                "Invalid dataset name '{}'",
                self.dataset
            )));
        }
        Ok(())
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("api_version", &self.api_version)
            .field("use_cdn", &self.use_cdn)
            .field("token", &self.token.as_ref().map(|_| "[redacted]"))
            .field("api_host", &self.api_host)
            .finish()
    }
}
