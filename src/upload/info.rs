//! File info lookups

use crate::client::UploadClient;
use crate::error::{Result, UploadError};
use crate::progress::UploadProgress;
use crate::transport;
use crate::upload::types::{FileInfo, FileUploadResult, UploadOptions};
use tokio_util::sync::CancellationToken;

/// Fetch the descriptor of an uploaded file
pub async fn file_info(
    client: &UploadClient,
    uuid: &str,
    cancel: &CancellationToken,
) -> Result<FileInfo> {
    if uuid.is_empty() {
        return Err(UploadError::invalid_parameter("uuid", "File uuid cannot be empty"));
    }

    let public_key = client.settings().public_key.as_str();

    client
        .retry_policy()
        .retry_if_throttled(cancel, || {
            let request = client.api_get("/info/", &[("pub_key", public_key), ("file_id", uuid)]);
            async move {
                let response = transport::send(client.transport(), request?, cancel, "file info").await?;
                transport::decode_response(response)
            }
        })
        .await
}

/// "Upload" a file that already exists remotely by looking it up
pub async fn upload_from_uuid(
    client: &UploadClient,
    uuid: &str,
    options: UploadOptions,
) -> Result<FileUploadResult> {
    let info = file_info(client, uuid, &options.cancel).await?;
    options.report(UploadProgress::complete());

    Ok(FileUploadResult::from_info(info, &client.settings().base_cdn))
}
