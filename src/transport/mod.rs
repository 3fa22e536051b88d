//! HTTP plumbing consumed by the upload pipeline
//!
//! The pipeline only talks to the network through the [`Transport`] trait so
//! that the request function can be swapped, e.g. for a scripted one in tests.
//! This module also turns raw responses into typed values or upload errors.

pub mod http;
pub mod tools;
pub mod types;

pub use http::ReqwestTransport;
pub use tools::{build_url, camelize_keys, user_agent};
pub use types::{ByteProgress, FormData, FormValue, HttpRequest, HttpResponse, Method, RequestBody};

use crate::error::{Result, UploadClientError, UploadError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// Sends one request and returns whatever the remote answered
///
/// Implementations return `Ok` for every response that arrived, regardless of
/// status, and `UploadError::Transport` when no response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Sends a request, giving up as soon as `cancel` fires
pub async fn send(
    transport: &dyn Transport,
    request: HttpRequest,
    cancel: &CancellationToken,
    operation: &str,
) -> Result<HttpResponse> {
    if cancel.is_cancelled() {
        return Err(UploadError::cancelled(operation));
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UploadError::cancelled(operation)),
        response = transport.request(request) => response,
    }
}

fn remote_error(response: &HttpResponse, content: String, json: Option<Value>) -> UploadClientError {
    UploadClientError::new(content, response.request.clone())
        .status(response.status)
        .response(json)
        .headers(response.headers.clone())
}

/// Decodes an Upload API response
///
/// Any body carrying an `error` key is a failure even when the status is 2xx.
pub fn decode_response<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    let json = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .map(camelize_keys);

    if let Some(error) = json.as_ref().and_then(|body| body.get("error")) {
        let content = match error {
            Value::String(message) => message.clone(),
            other => other
                .get("content")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| other.to_string()),
        };
        let code = error
            .get("errorCode")
            .and_then(Value::as_str)
            .map(str::to_string);

        return Err(UploadError::from_remote(
            remote_error(&response, content, json.clone()).error_code(code),
        ));
    }

    if !response.is_success() {
        let content = String::from_utf8_lossy(&response.body).into_owned();
        return Err(UploadError::from_remote(remote_error(&response, content, json)));
    }

    match json {
        Some(body) => Ok(serde_json::from_value(body)?),
        None => Err(UploadError::invalid_response(format!(
            "{} did not return JSON",
            response.request
        ))),
    }
}

/// Decodes a polled status body, where `error` is part of the payload
///
/// A 2xx body carrying a `status` key is decoded as is; anything else is
/// classified like [`decode_response`] does.
pub fn decode_status<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    if response.is_success() {
        let status_body = serde_json::from_slice::<Value>(&response.body)
            .ok()
            .filter(|body| body.get("status").is_some());
        if let Some(body) = status_body {
            return Ok(serde_json::from_value(camelize_keys(body))?);
        }
    }

    decode_response(response)
}

/// Accepts any 2xx response, wrapping everything else into an upload error
pub fn ensure_success(response: HttpResponse) -> Result<HttpResponse> {
    if response.is_success() {
        return Ok(response);
    }

    let json = serde_json::from_slice::<Value>(&response.body).ok();
    let content = format!(
        "Request failed with status {}: {}",
        response.status,
        String::from_utf8_lossy(&response.body)
    );

    Err(UploadError::from_remote(remote_error(&response, content, json)))
}
