pub mod client;
pub mod config;
pub mod error;
pub mod group;
pub mod progress;
pub mod retry;
pub mod transport;
pub mod upload;

pub use client::UploadClient;

pub use config::UploadSettings;

pub use error::{RequestSummary, Result, UploadClientError, UploadError};

pub use group::{
    create_group, upload_group, upload_group_items, GroupInfo, GroupItem, GroupOptions,
    GroupSource, UploadGroup,
};

pub use progress::{ProgressAggregator, ProgressCallback, ProgressSlot, UploadProgress};

pub use retry::RetryPolicy;

pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub use upload::{
    file_info, upload_data, upload_direct, upload_file, upload_from_url, upload_from_uuid,
    upload_multipart, ChunkPlan, FileData, FileInfo, FileSource, FileUploadResult,
    MultipartState, MultipartUpload, UploadOptions, UploadStrategy,
};

pub use tokio_util::sync::CancellationToken;
