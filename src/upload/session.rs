//! Multipart session management
//!
//! This module provides the two Upload API calls that bracket a multipart
//! upload: `start`, which hands out one upload target per part, and
//! `complete`, which assembles the uploaded parts into a file.

use crate::client::UploadClient;
use crate::error::{Result, UploadError};
use crate::transport::{self, FormData};
use crate::upload::chunks::ChunkPlan;
use crate::upload::types::{FileData, FileInfo, UploadOptions};
use log::debug;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

/// One multipart upload in progress
#[derive(Debug, Clone, PartialEq)]
pub struct UploadSession {
    /// Remote identifier of the file being assembled
    pub uuid: String,
    /// Upload target of part `i` at index `i`
    pub part_targets: Vec<String>,
    pub plan: ChunkPlan,
}

impl UploadSession {
    pub fn part_count(&self) -> usize {
        self.part_targets.len()
    }
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    parts: Value,
    uuid: String,
}

/// Orders the `parts` object of a start response by numeric key
///
/// The transport gives no ordering guarantee for object keys, so the
/// sequence is rebuilt from the indices themselves.
pub fn ordered_part_targets(parts: &Value) -> Result<Vec<String>> {
    let entries: Vec<(usize, String)> = match parts {
        Value::Object(map) => indexed_entries(map)?,
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| Ok((index, target_url(index, item)?)))
            .collect::<Result<_>>()?,
        other => {
            return Err(UploadError::invalid_response(format!(
                "Expected part targets, got {}",
                other
            )))
        }
    };

    let mut entries = entries;
    entries.sort_by_key(|(index, _)| *index);

    let contiguous = entries
        .iter()
        .enumerate()
        .all(|(position, (index, _))| position == *index);
    if !contiguous {
        return Err(UploadError::invalid_response(
            "Part indices are not contiguous from 0",
        ));
    }

    Ok(entries.into_iter().map(|(_, url)| url).collect())
}

fn indexed_entries(map: &Map<String, Value>) -> Result<Vec<(usize, String)>> {
    map.iter()
        .map(|(key, value)| {
            let index = key.parse::<usize>().map_err(|_| {
                UploadError::invalid_response(format!("Part index '{}' is not a number", key))
            })?;
            Ok((index, target_url(index, value)?))
        })
        .collect()
}

fn target_url(index: usize, value: &Value) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| UploadError::invalid_response(format!("Part {} has no URL", index)))
}

/// Start a multipart upload
///
/// Sends the `/multipart/start/` call and returns the session holding one
/// upload target per planned part.
///
/// # Errors
///
/// Returns an error if the remote refuses the upload, keeps throttling after
/// all retries, or hands out a number of targets that does not match the plan
pub async fn multipart_start(
    client: &UploadClient,
    file: &FileData,
    options: &UploadOptions,
) -> Result<UploadSession> {
    let settings = client.settings();
    let plan = ChunkPlan::new(file.size(), settings.multipart_chunk_size)?;

    let form = FormData::new()
        .text("filename", file.file_name())
        .text("size", file.size())
        .text("content_type", file.mime_type())
        .text("part_size", settings.multipart_chunk_size)
        .text("UPLOADCARE_STORE", settings.store_value())
        .text("UPLOADCARE_PUB_KEY", &settings.public_key)
        .optional_text("signature", settings.secure_signature.as_deref())
        .optional_text("expire", settings.secure_expire.as_deref())
        .text("source", &settings.source)
        .metadata(options.metadata.as_ref());

    let response: StartResponse = client
        .retry_policy()
        .retry_if_throttled(&options.cancel, || {
            let request = client.api_post("/multipart/start/", form.clone());
            async move {
                let response = transport::send(
                    client.transport(),
                    request?,
                    &options.cancel,
                    "multipart start",
                )
                .await?;
                transport::decode_response(response)
            }
        })
        .await?;

    let part_targets = ordered_part_targets(&response.parts)?;
    if part_targets.len() != plan.count() {
        return Err(UploadError::invalid_response(format!(
            "Expected {} part targets, got {}",
            plan.count(),
            part_targets.len()
        )));
    }

    debug!(
        "Multipart session {} started with {} parts",
        response.uuid,
        part_targets.len()
    );

    Ok(UploadSession {
        uuid: response.uuid,
        part_targets,
        plan,
    })
}

/// Complete a multipart upload
///
/// # Returns
///
/// The descriptor of the assembled file
pub async fn multipart_complete(
    client: &UploadClient,
    uuid: &str,
    cancel: &CancellationToken,
) -> Result<FileInfo> {
    if uuid.is_empty() {
        return Err(UploadError::invalid_parameter(
            "uuid",
            "Session uuid cannot be empty",
        ));
    }

    let settings = client.settings();
    let form = FormData::new()
        .text("uuid", uuid)
        .text("UPLOADCARE_PUB_KEY", &settings.public_key)
        .text("source", &settings.source);

    client
        .retry_policy()
        .retry_if_throttled(cancel, || {
            let request = client.api_post("/multipart/complete/", form.clone());
            async move {
                let response =
                    transport::send(client.transport(), request?, cancel, "multipart complete")
                        .await?;
                transport::decode_response(response)
            }
        })
        .await
}
