//! Uploading a single multipart chunk

use crate::client::UploadClient;
use crate::error::Result;
use crate::transport::{self, ByteProgress, HttpRequest};
use bytes::Bytes;
use bytesize::ByteSize;
use log::trace;
use tokio_util::sync::CancellationToken;

/// Upload one chunk to its pre-signed part URL
///
/// Each attempt is wrapped by the client's retry policy. A non-2xx answer is
/// turned into an upload error that keeps the request, status, headers and
/// body of the failed attempt.
///
/// # Arguments
///
/// * `client` - The client to upload through
/// * `target` - The part URL handed out by the multipart start call
/// * `chunk` - The bytes of this part
/// * `on_progress` - Receives cumulative bytes sent during each attempt
/// * `cancel` - Aborts the upload, including a pending retry
pub async fn upload_part(
    client: &UploadClient,
    target: &str,
    chunk: Bytes,
    on_progress: Option<ByteProgress>,
    cancel: &CancellationToken,
) -> Result<()> {
    let size = chunk.len();

    client
        .retry_policy()
        .retry_if_throttled(cancel, || {
            if let Some(ref callback) = on_progress {
                callback(0);
            }

            let request = HttpRequest::put(target)
                .header("Content-Type", "application/octet-stream")
                .bytes(chunk.clone())
                .on_upload_progress(on_progress.clone());

            async move {
                let response =
                    transport::send(client.transport(), request, cancel, "part upload").await?;
                transport::ensure_success(response)?;
                Ok(())
            }
        })
        .await?;

    trace!("Uploaded part of {} to {}", ByteSize(size as u64), target);
    Ok(())
}
