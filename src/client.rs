//! The client handle passed to every upload operation

use crate::config::UploadSettings;
use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::transport::{build_url, user_agent, FormData, HttpRequest, ReqwestTransport, Transport};
use std::fmt;
use std::sync::Arc;

/// Transport plus settings
///
/// Cheap to clone; clones share the same transport.
#[derive(Clone)]
pub struct UploadClient {
    transport: Arc<dyn Transport>,
    settings: Arc<UploadSettings>,
}

impl fmt::Debug for UploadClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl UploadClient {
    /// Creates a client that talks HTTP through `reqwest`
    pub fn new(settings: UploadSettings) -> Result<Self> {
        Self::with_transport(settings, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(settings: UploadSettings, transport: Arc<dyn Transport>) -> Result<Self> {
        settings.validate()?;

        Ok(Self {
            transport,
            settings: Arc::new(settings),
        })
    }

    pub fn settings(&self) -> &UploadSettings {
        &self.settings
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from_settings(&self.settings)
    }

    fn user_agent(&self) -> String {
        user_agent(
            &self.settings.public_key,
            self.settings.integration.as_deref(),
        )
    }

    /// POST to an Upload API endpoint
    pub(crate) fn api_post(&self, path: &str, form: FormData) -> Result<HttpRequest> {
        let url = build_url(&self.settings.base_url, path, &[("jsonerrors", "1")])?;
        Ok(HttpRequest::post(url)
            .header("X-UC-User-Agent", self.user_agent())
            .form(form))
    }

    /// GET from an Upload API endpoint
    pub(crate) fn api_get(&self, path: &str, query: &[(&str, &str)]) -> Result<HttpRequest> {
        let mut query = query.to_vec();
        query.push(("jsonerrors", "1"));
        let url = build_url(&self.settings.base_url, path, &query)?;
        Ok(HttpRequest::get(url).header("X-UC-User-Agent", self.user_agent()))
    }

    /// Adds the fields every upload form carries
    pub(crate) fn upload_form(&self) -> FormData {
        FormData::new()
            .text("UPLOADCARE_PUB_KEY", &self.settings.public_key)
            .text("UPLOADCARE_STORE", self.settings.store_value())
            .optional_text("signature", self.settings.secure_signature.as_deref())
            .optional_text("expire", self.settings.secure_expire.as_deref())
            .text("source", &self.settings.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Method;

    fn client() -> UploadClient {
        UploadClient::new(
            UploadSettings::new("demopublickey")
                .base_url("http://localhost:8080")
                .secure_signature("sig", "123"),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        assert!(UploadClient::new(UploadSettings::default()).is_err());
    }

    #[test]
    fn test_api_post() {
        let request = client().api_post("/multipart/start/", FormData::new()).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "http://localhost:8080/multipart/start/?jsonerrors=1");
        assert!(request
            .headers
            .iter()
            .any(|(name, value)| name == "X-UC-User-Agent" && value.contains("demopublickey")));
    }

    #[test]
    fn test_api_get_query() {
        let request = client()
            .api_get("/info/", &[("pub_key", "demopublickey"), ("file_id", "abc")])
            .unwrap();
        assert_eq!(
            request.url,
            "http://localhost:8080/info/?pub_key=demopublickey&file_id=abc&jsonerrors=1"
        );
    }

    #[test]
    fn test_upload_form_fields() {
        let form = client().upload_form();
        assert_eq!(form.get("UPLOADCARE_PUB_KEY"), Some("demopublickey"));
        assert_eq!(form.get("UPLOADCARE_STORE"), Some("auto"));
        assert_eq!(form.get("signature"), Some("sig"));
        assert_eq!(form.get("expire"), Some("123"));
        assert_eq!(form.get("source"), Some("local"));
    }
}
