//! High-level single file upload
//!
//! Picks the upload strategy from the kind of source: URLs are fetched by the
//! remote, uuids are looked up, and raw data goes through a direct request or
//! the multipart protocol depending on its size.

use crate::client::UploadClient;
use crate::error::Result;
use crate::upload::direct::upload_direct;
use crate::upload::from_url::upload_from_url;
use crate::upload::info::upload_from_uuid;
use crate::upload::multipart::upload_multipart;
use crate::upload::types::{FileData, FileSource, FileUploadResult, UploadOptions};

/// How raw data of a given size is uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStrategy {
    Direct,
    Multipart,
}

impl UploadStrategy {
    pub fn for_size(size: u64, multipart_min_file_size: u64) -> Self {
        if size >= multipart_min_file_size {
            UploadStrategy::Multipart
        } else {
            UploadStrategy::Direct
        }
    }
}

/// Upload raw data, choosing direct or multipart by size
pub async fn upload_data(
    client: &UploadClient,
    file: FileData,
    options: UploadOptions,
) -> Result<FileUploadResult> {
    match UploadStrategy::for_size(file.size(), client.settings().multipart_min_file_size) {
        UploadStrategy::Direct => upload_direct(client, file, options).await,
        UploadStrategy::Multipart => upload_multipart(client, file, options).await,
    }
}

/// Upload one file from any supported source
///
/// # Returns
///
/// A fully populated `FileUploadResult`; there is no partial result on error
pub async fn upload_file(
    client: &UploadClient,
    source: FileSource,
    options: UploadOptions,
) -> Result<FileUploadResult> {
    match source {
        FileSource::Data(file) => upload_data(client, file, options).await,
        FileSource::Url(url) => upload_from_url(client, &url, options).await,
        FileSource::Uuid(uuid) => upload_from_uuid(client, &uuid, options).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_threshold() {
        let threshold = 25 * 1024 * 1024;
        assert_eq!(UploadStrategy::for_size(1, threshold), UploadStrategy::Direct);
        assert_eq!(
            UploadStrategy::for_size(threshold - 1, threshold),
            UploadStrategy::Direct
        );
        assert_eq!(
            UploadStrategy::for_size(threshold, threshold),
            UploadStrategy::Multipart
        );
    }
}
