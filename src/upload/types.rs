use crate::error::{Result, UploadError};
use crate::progress::{ProgressCallback, UploadProgress};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_FILE_NAME: &str = "original";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw file contents plus the name and type to upload them under
#[derive(Debug, Clone, PartialEq)]
pub struct FileData {
    pub data: Bytes,
    pub name: Option<String>,
    pub content_type: Option<String>,
}

impl FileData {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            name: None,
            content_type: None,
        }
    }

    /// Reads a file from disk, naming the upload after it
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(UploadError::invalid_parameter(
                "path",
                format!("File does not exist: {}", path.display()),
            ));
        }

        let data = tokio::fs::read(path).await?;
        let mut file = Self::new(data);
        file.name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string);
        Ok(file)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn file_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_FILE_NAME)
    }

    pub fn mime_type(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

impl From<Vec<u8>> for FileData {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<Bytes> for FileData {
    fn from(data: Bytes) -> Self {
        Self::new(data)
    }
}

/// Where a single file comes from
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    /// Bytes we upload ourselves
    Data(FileData),
    /// A public URL the remote fetches
    Url(String),
    /// A file that is already uploaded
    Uuid(String),
}

/// Per-call upload options
#[derive(Clone, Default)]
pub struct UploadOptions {
    pub metadata: Option<BTreeMap<String, String>>,
    pub cancel: CancellationToken,
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("metadata", &self.metadata)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl UploadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn progress_callback(mut self, callback: Option<ProgressCallback>) -> Self {
        self.on_progress = callback;
        self
    }

    pub(crate) fn report(&self, progress: UploadProgress) {
        if let Some(ref callback) = self.on_progress {
            callback(progress);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(ref metadata) = self.metadata {
            if let Some(key) = metadata.keys().find(|key| key.is_empty()) {
                return Err(UploadError::invalid_parameter(
                    "metadata",
                    format!("Metadata key '{}' must not be empty", key),
                ));
            }
        }

        Ok(())
    }
}

/// File descriptor returned by the Upload API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub uuid: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub is_image: bool,
    #[serde(default)]
    pub is_stored: bool,
    #[serde(default)]
    pub is_ready: Option<bool>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub datetime_uploaded: Option<DateTime<Utc>>,
    #[serde(default)]
    pub image_info: Option<serde_json::Value>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// Terminal result of one file upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUploadResult {
    pub uuid: String,
    pub name: Option<String>,
    pub size: u64,
    pub mime_type: Option<String>,
    pub is_image: bool,
    pub is_stored: bool,
    pub original_filename: Option<String>,
    /// `<base_cdn>/<uuid>/`
    pub url_base: String,
    pub cdn_url: String,
    pub cdn_url_modifiers: Option<String>,
}

impl FileUploadResult {
    pub fn from_info(info: FileInfo, base_cdn: &str) -> Self {
        let url_base = format!("{}/{}/", base_cdn.trim_end_matches('/'), info.uuid);

        Self {
            uuid: info.uuid,
            name: info.filename,
            size: info.size,
            mime_type: info.mime_type,
            is_image: info.is_image,
            is_stored: info.is_stored,
            original_filename: info.original_filename,
            cdn_url: url_base.clone(),
            url_base,
            cdn_url_modifiers: None,
        }
    }

    /// Applies CDN operations, e.g. `resize/200x/`
    pub fn with_effects(mut self, effects: &str) -> Self {
        let modifiers = format!("-/{}", effects);
        self.cdn_url = format!("{}{}", self.url_base, modifiers);
        self.cdn_url_modifiers = Some(modifiers);
        self
    }
}
