//! Client configuration
//!
//! `UploadSettings` holds everything that used to be a process-wide default:
//! endpoints, chunking, concurrency and retry bounds. It is passed explicitly
//! to every operation through [`crate::UploadClient`].

use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://upload.uploadcare.com";
pub const DEFAULT_BASE_CDN: &str = "https://ucarecdn.com";
pub const DEFAULT_MULTIPART_CHUNK_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MULTIPART_MIN_FILE_SIZE: u64 = 25 * 1024 * 1024;
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;
pub const DEFAULT_RETRY_THROTTLED_MAX_TIMES: u32 = 1;
pub const DEFAULT_SOURCE: &str = "local";

/// Configuration shared by all uploads made through one client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Project public key, sent with every request
    pub public_key: String,

    /// Upload API endpoint (default: https://upload.uploadcare.com)
    pub base_url: String,

    /// CDN endpoint used to build file URLs (default: https://ucarecdn.com)
    pub base_cdn: String,

    /// Bytes per multipart chunk (default: 5 MiB)
    pub multipart_chunk_size: u64,

    /// Files at least this large are uploaded with multipart (default: 25 MiB)
    pub multipart_min_file_size: u64,

    /// Upper bound on concurrently uploading parts (default: 4)
    pub multipart_max_concurrent_requests: usize,

    /// How many times a throttled request is retried (default: 1)
    pub retry_throttled_request_max_times: u32,

    /// First backoff delay in milliseconds, doubled on every attempt (default: 1000)
    pub retry_base_delay_ms: u64,

    /// Cap on any single backoff delay in milliseconds (default: 15000)
    pub retry_max_delay_ms: u64,

    /// Interval between URL-upload status checks in milliseconds (default: 500)
    pub poll_interval_ms: u64,

    /// Store files permanently; None lets the project setting decide
    pub store: Option<bool>,

    /// Signature for signed uploads
    pub secure_signature: Option<String>,

    /// Expiry timestamp matching `secure_signature`
    pub secure_expire: Option<String>,

    /// Upload source marker (default: "local")
    pub source: String,

    /// Integration name appended to the user agent
    pub integration: Option<String>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            public_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            base_cdn: DEFAULT_BASE_CDN.to_string(),
            multipart_chunk_size: DEFAULT_MULTIPART_CHUNK_SIZE,
            multipart_min_file_size: DEFAULT_MULTIPART_MIN_FILE_SIZE,
            multipart_max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            retry_throttled_request_max_times: DEFAULT_RETRY_THROTTLED_MAX_TIMES,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 15_000,
            poll_interval_ms: 500,
            store: None,
            secure_signature: None,
            secure_expire: None,
            source: DEFAULT_SOURCE.to_string(),
            integration: None,
        }
    }
}

impl UploadSettings {
    pub fn new(public_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            ..Self::default()
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn base_cdn(mut self, url: impl Into<String>) -> Self {
        self.base_cdn = url.into();
        self
    }

    pub fn multipart_chunk_size(mut self, size: u64) -> Self {
        self.multipart_chunk_size = size;
        self
    }

    pub fn multipart_min_file_size(mut self, size: u64) -> Self {
        self.multipart_min_file_size = size;
        self
    }

    pub fn multipart_max_concurrent_requests(mut self, limit: usize) -> Self {
        self.multipart_max_concurrent_requests = limit;
        self
    }

    pub fn retry_throttled_request_max_times(mut self, times: u32) -> Self {
        self.retry_throttled_request_max_times = times;
        self
    }

    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.retry_max_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }

    pub fn secure_signature(
        mut self,
        signature: impl Into<String>,
        expire: impl Into<String>,
    ) -> Self {
        self.secure_signature = Some(signature.into());
        self.secure_expire = Some(expire.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn integration(mut self, integration: impl Into<String>) -> Self {
        self.integration = Some(integration.into());
        self
    }

    pub fn retry_base_delay_duration(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn retry_max_delay_duration(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    pub fn poll_interval_duration(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wire value of the `UPLOADCARE_STORE` field
    pub fn store_value(&self) -> &'static str {
        match self.store {
            Some(true) => "1",
            Some(false) => "0",
            None => "auto",
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.public_key.is_empty() {
            return Err(UploadError::config_error("Public key must not be empty"));
        }

        if self.base_url.is_empty() {
            return Err(UploadError::config_error("Base URL must not be empty"));
        }

        if self.multipart_chunk_size == 0 {
            return Err(UploadError::config_error(
                "Multipart chunk size must be greater than 0",
            ));
        }

        if self.multipart_max_concurrent_requests == 0 {
            return Err(UploadError::config_error(
                "Multipart concurrency must be greater than 0",
            ));
        }

        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(UploadError::from)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(UploadError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = UploadSettings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.multipart_chunk_size, 5_242_880);
        assert_eq!(settings.multipart_max_concurrent_requests, 4);
        assert_eq!(settings.retry_throttled_request_max_times, 1);
        assert_eq!(settings.source, "local");
        assert_eq!(settings.store_value(), "auto");
    }

    #[test]
    fn test_settings_builder() {
        let settings = UploadSettings::new("demopublickey")
            .base_url("http://localhost:8080")
            .multipart_chunk_size(1024)
            .retry_base_delay(Duration::from_millis(10))
            .store(false)
            .secure_signature("sig", "1700000000")
            .integration("my-app");

        assert_eq!(settings.public_key, "demopublickey");
        assert_eq!(settings.base_url, "http://localhost:8080");
        assert_eq!(settings.multipart_chunk_size, 1024);
        assert_eq!(settings.retry_base_delay_duration(), Duration::from_millis(10));
        assert_eq!(settings.store_value(), "0");
        assert_eq!(settings.secure_expire.as_deref(), Some("1700000000"));
        assert_eq!(settings.integration.as_deref(), Some("my-app"));
    }

    #[test]
    fn test_settings_validation() {
        assert!(UploadSettings::default().validate().is_err());

        let mut settings = UploadSettings::new("demopublickey");
        assert!(settings.validate().is_ok());

        settings.multipart_chunk_size = 0;
        assert!(settings.validate().is_err());

        settings.multipart_chunk_size = 1024;
        settings.multipart_max_concurrent_requests = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_json() {
        let settings = UploadSettings::from_json(r#"{"public_key": "pk", "store": true}"#).unwrap();
        assert_eq!(settings.public_key, "pk");
        assert_eq!(settings.store_value(), "1");
        assert_eq!(settings.base_cdn, DEFAULT_BASE_CDN);

        let json = settings.to_json().unwrap();
        assert!(json.contains("\"public_key\":\"pk\""));
    }
}
