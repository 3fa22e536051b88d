//! Uploads the remote fetches from a public URL
//!
//! The remote either answers right away with the file, or hands out a token
//! whose status is polled until it settles.

use crate::client::UploadClient;
use crate::error::{Result, UploadClientError, UploadError};
use crate::progress::UploadProgress;
use crate::transport;
use crate::upload::types::{FileInfo, FileUploadResult, UploadOptions};
use log::{debug, info};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FromUrlResponse {
    Token { token: String },
    FileInfo(FileInfo),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum FromUrlStatus {
    Unknown,
    Waiting,
    Progress {
        #[serde(default)]
        done: u64,
        #[serde(default)]
        total: u64,
    },
    Success(FileInfo),
    Error {
        #[serde(default)]
        error: String,
    },
}

async fn from_url_status(
    client: &UploadClient,
    token: &str,
    cancel: &CancellationToken,
) -> Result<FromUrlStatus> {
    client
        .retry_policy()
        .retry_if_throttled(cancel, || {
            let request = client.api_get("/from_url/status/", &[("token", token)]);
            async move {
                let response =
                    transport::send(client.transport(), request?, cancel, "from url status").await?;
                transport::decode_status(response)
            }
        })
        .await
}

async fn poll_until_ready(
    client: &UploadClient,
    token: &str,
    options: &UploadOptions,
) -> Result<FileInfo> {
    let interval = client.settings().poll_interval_duration();

    loop {
        match from_url_status(client, token, &options.cancel).await? {
            FromUrlStatus::Success(info) => return Ok(info),
            FromUrlStatus::Error { error } => {
                let request = client.api_get("/from_url/status/", &[("token", token)])?;
                return Err(UploadError::Client(Box::new(
                    UploadClientError::new(error, request.summary())
                        .error_code(Some("FromUrlError".to_string())),
                )));
            }
            FromUrlStatus::Progress { done, total } => {
                options.report(UploadProgress::bytes(done, total));
            }
            FromUrlStatus::Unknown | FromUrlStatus::Waiting => {
                debug!("URL upload {} is still pending", token);
            }
        }

        tokio::select! {
            biased;
            _ = options.cancel.cancelled() => {
                return Err(UploadError::cancelled("from url polling"));
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

/// Upload a file the remote downloads from `source_url`
///
/// # Errors
///
/// Returns an error if the URL is not http(s), the remote fails to fetch it,
/// or the upload is cancelled while polling
pub async fn upload_from_url(
    client: &UploadClient,
    source_url: &str,
    options: UploadOptions,
) -> Result<FileUploadResult> {
    options.validate()?;

    if !(source_url.starts_with("http://") || source_url.starts_with("https://")) {
        return Err(UploadError::invalid_parameter(
            "source_url",
            format!("Not an http(s) URL: {}", source_url),
        ));
    }

    let form = client
        .upload_form()
        .text("source_url", source_url)
        .metadata(options.metadata.as_ref());

    let response: FromUrlResponse = client
        .retry_policy()
        .retry_if_throttled(&options.cancel, || {
            let request = client.api_post("/from_url/", form.clone());
            let cancel = &options.cancel;
            async move {
                let response =
                    transport::send(client.transport(), request?, cancel, "from url").await?;
                transport::decode_response(response)
            }
        })
        .await?;

    let info = match response {
        FromUrlResponse::FileInfo(info) => info,
        FromUrlResponse::Token { token } => poll_until_ready(client, &token, &options).await?,
    };
    options.report(UploadProgress::complete());

    info!("Uploaded {} from {}", info.uuid, source_url);
    Ok(FileUploadResult::from_info(info, &client.settings().base_cdn))
}
