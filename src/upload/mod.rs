//! Single file uploads
//!
//! This module provides the upload pipeline for one file: chunk planning,
//! part uploads, the multipart session calls and state machine, plus direct,
//! URL and uuid uploads and the strategy choice between them.

pub mod chunks;
pub mod direct;
pub mod file;
pub mod from_url;
pub mod info;
pub mod multipart;
pub mod part;
pub mod session;
pub mod types;

pub use chunks::{part_count, ChunkPlan};
pub use direct::upload_direct;
pub use file::{upload_data, upload_file, UploadStrategy};
pub use from_url::upload_from_url;
pub use info::{file_info, upload_from_uuid};
pub use multipart::{upload_multipart, MultipartState, MultipartUpload};
pub use part::upload_part;
pub use session::{multipart_complete, multipart_start, ordered_part_targets, UploadSession};
pub use types::{FileData, FileInfo, FileSource, FileUploadResult, UploadOptions};
