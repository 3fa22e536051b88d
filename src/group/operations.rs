use crate::client::UploadClient;
use crate::error::{Result, UploadError};
use crate::group::types::{GroupInfo, GroupItem, GroupOptions, GroupSource, UploadGroup};
use crate::progress::ProgressAggregator;
use crate::transport::{self, FormData};
use crate::upload::file::upload_file;
use crate::upload::types::FileUploadResult;
use futures::future::try_join_all;
use log::{debug, info};
use tokio_util::sync::CancellationToken;

/// Register already uploaded files as a group
///
/// # Errors
///
/// Returns an error if `uuids` is empty or the remote rejects the group
pub async fn create_group(
    client: &UploadClient,
    uuids: &[String],
    cancel: &CancellationToken,
) -> Result<GroupInfo> {
    if uuids.is_empty() {
        return Err(UploadError::invalid_parameter(
            "uuids",
            "Group must contain at least one file",
        ));
    }

    let settings = client.settings();
    let form = uuids.iter().enumerate().fold(
        FormData::new().text("pub_key", &settings.public_key),
        |form, (i, uuid)| form.text(format!("files[{}]", i), uuid),
    );
    let form = form
        .optional_text("signature", settings.secure_signature.as_deref())
        .optional_text("expire", settings.secure_expire.as_deref())
        .text("source", &settings.source);

    client
        .retry_policy()
        .retry_if_throttled(cancel, || {
            let request = client.api_post("/group/", form.clone());
            async move {
                let response =
                    transport::send(client.transport(), request?, cancel, "create group").await?;
                transport::decode_response(response)
            }
        })
        .await
}

/// Upload every member of `source` concurrently, then group them
///
/// Members share the cancellation token in `options.upload`; the progress
/// callback there receives the mean progress of all members. The first
/// member failure aborts the rest and no group is created.
pub async fn upload_group(
    client: &UploadClient,
    source: GroupSource,
    options: GroupOptions,
) -> Result<UploadGroup> {
    source.validate()?;
    options.upload.validate()?;

    let members = source.len();
    let aggregator = options
        .upload
        .on_progress
        .clone()
        .map(|callback| ProgressAggregator::new(members, callback));

    debug!("Uploading group of {} files", members);

    let uploads = source.into_sources().into_iter().enumerate().map(|(i, source)| {
        let callback = aggregator
            .as_ref()
            .and_then(|aggregator| aggregator.slot(i))
            .map(|slot| slot.into_callback());
        let member_options = options.upload.clone().progress_callback(callback);
        upload_file(client, source, member_options)
    });
    let files: Vec<FileUploadResult> = try_join_all(uploads).await?;

    let files = match options.default_effects.as_deref() {
        Some(effects) => files
            .into_iter()
            .map(|file| file.with_effects(effects))
            .collect(),
        None => files,
    };

    let uuids: Vec<String> = files.iter().map(|file| file.uuid.clone()).collect();
    let info = create_group(client, &uuids, &options.upload.cancel).await?;

    info!("Created group {} with {} files", info.id, files.len());
    Ok(UploadGroup { info, files })
}

/// Upload loose items as a group
///
/// The items must all be of one kind; a mixed list fails before any request.
pub async fn upload_group_items(
    client: &UploadClient,
    items: Vec<GroupItem>,
    options: GroupOptions,
) -> Result<UploadGroup> {
    let source = GroupSource::from_items(items)?;
    upload_group(client, source, options).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadSettings;
    use crate::transport::{HttpRequest, HttpResponse, Transport};
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct GroupEndpoint {
        forms: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for GroupEndpoint {
        async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
            let summary = request.summary();
            self.forms.lock().unwrap().push(request);
            Ok(HttpResponse {
                status: 200,
                headers: Default::default(),
                body: Bytes::from_static(
                    br#"{"id":"group~2","files_count":2,"cdn_url":"https://ucarecdn.com/group~2/"}"#,
                ),
                request: summary,
            })
        }
    }

    #[tokio::test]
    async fn test_create_group_form() {
        let transport = Arc::new(GroupEndpoint::default());
        let client = UploadClient::with_transport(
            UploadSettings::new("demopublickey").base_url("http://localhost:8080"),
            transport.clone(),
        )
        .unwrap();

        let uuids = vec!["a".to_string(), "b".to_string()];
        let info = create_group(&client, &uuids, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(info.id, "group~2");
        assert_eq!(info.files_count, 2);

        let requests = transport.forms.lock().unwrap();
        let form = requests[0].form_data().unwrap();
        assert_eq!(form.get("pub_key"), Some("demopublickey"));
        assert_eq!(form.get("files[0]"), Some("a"));
        assert_eq!(form.get("files[1]"), Some("b"));
        assert!(requests[0].url.starts_with("http://localhost:8080/group/"));
    }

    #[tokio::test]
    async fn test_create_group_requires_files() {
        let client = UploadClient::with_transport(
            UploadSettings::new("demopublickey"),
            Arc::new(GroupEndpoint::default()),
        )
        .unwrap();

        let err = create_group(&client, &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::InvalidParameter { .. }));
    }
}
