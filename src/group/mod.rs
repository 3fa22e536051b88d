//! Group uploads
//!
//! Uploads a homogeneous batch of files concurrently and registers the
//! finished set as a remote group.

pub mod operations;
pub mod types;

pub use operations::{create_group, upload_group, upload_group_items};
pub use types::{is_uuid, GroupInfo, GroupItem, GroupOptions, GroupSource, UploadGroup};
