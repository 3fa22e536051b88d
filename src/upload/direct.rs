//! Single-request uploads for files below the multipart threshold

use crate::client::UploadClient;
use crate::error::{Result, UploadError};
use crate::progress::UploadProgress;
use crate::transport;
use crate::upload::info::file_info;
use crate::upload::types::{FileData, FileUploadResult, UploadOptions};
use bytesize::ByteSize;
use log::info;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct BaseResponse {
    file: String,
}

/// Upload a whole file with one `/base/` request
///
/// The returned uuid is resolved into a full descriptor with an info call.
/// Progress is reported once, when the file is ready.
///
/// # Errors
///
/// Returns an error if the file is empty or the remote rejects it
pub async fn upload_direct(
    client: &UploadClient,
    file: FileData,
    options: UploadOptions,
) -> Result<FileUploadResult> {
    options.validate()?;

    if file.data.is_empty() {
        return Err(UploadError::invalid_parameter(
            "data",
            "File data cannot be empty",
        ));
    }

    let total = file.size();
    let form = client
        .upload_form()
        .metadata(options.metadata.as_ref())
        .file("file", file.data.clone(), file.file_name(), file.mime_type());

    let response: BaseResponse = client
        .retry_policy()
        .retry_if_throttled(&options.cancel, || {
            let request = client.api_post("/base/", form.clone());
            let cancel = &options.cancel;
            async move {
                let response =
                    transport::send(client.transport(), request?, cancel, "direct upload").await?;
                transport::decode_response(response)
            }
        })
        .await?;

    let info = file_info(client, &response.file, &options.cancel).await?;
    options.report(UploadProgress::complete());

    info!("Uploaded {} ({}) directly", info.uuid, ByteSize(total));
    Ok(FileUploadResult::from_info(info, &client.settings().base_cdn))
}
