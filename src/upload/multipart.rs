//! Multipart upload coordination
//!
//! A multipart upload moves through
//! `NotStarted -> Started -> PartsUploading -> Completing -> Completed`,
//! and drops to `Failed` from any of the non-terminal states. Parts are
//! uploaded concurrently up to the configured bound; the first part that
//! fails for good aborts the rest and `complete` is never sent.

use crate::client::UploadClient;
use crate::error::{Result, UploadError};
use crate::progress::UploadProgress;
use crate::transport::ByteProgress;
use crate::upload::part::upload_part;
use crate::upload::session::{multipart_complete, multipart_start, UploadSession};
use crate::upload::types::{FileData, FileUploadResult, UploadOptions};
use bytesize::ByteSize;
use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartState {
    NotStarted,
    Started,
    PartsUploading,
    Completing,
    Completed,
    Failed,
}

impl MultipartState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MultipartState::Completed | MultipartState::Failed)
    }
}

impl fmt::Display for MultipartState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartState::NotStarted => write!(f, "not-started"),
            MultipartState::Started => write!(f, "started"),
            MultipartState::PartsUploading => write!(f, "parts-uploading"),
            MultipartState::Completing => write!(f, "completing"),
            MultipartState::Completed => write!(f, "completed"),
            MultipartState::Failed => write!(f, "failed"),
        }
    }
}

/// Bytes sent per part, summed into one file-level progress value
struct PartProgress {
    sent: Vec<AtomicU64>,
    total: u64,
    options: UploadOptions,
}

impl PartProgress {
    fn new(parts: usize, total: u64, options: UploadOptions) -> Arc<Self> {
        Arc::new(Self {
            sent: (0..parts).map(|_| AtomicU64::new(0)).collect(),
            total,
            options,
        })
    }

    fn callback(self: &Arc<Self>, index: usize) -> Option<ByteProgress> {
        self.options.on_progress.as_ref()?;

        let progress = self.clone();
        Some(Arc::new(move |sent: u64| {
            progress.sent[index].store(sent, Ordering::Release);
            let uploaded = progress
                .sent
                .iter()
                .map(|part| part.load(Ordering::Acquire))
                .sum::<u64>();
            progress
                .options
                .report(UploadProgress::bytes(uploaded, progress.total));
        }))
    }
}

/// Drives one file through the multipart state machine
pub struct MultipartUpload<'a> {
    client: &'a UploadClient,
    file: FileData,
    options: UploadOptions,
    state: MultipartState,
    session: Option<UploadSession>,
}

impl<'a> MultipartUpload<'a> {
    pub fn new(client: &'a UploadClient, file: FileData, options: UploadOptions) -> Self {
        Self {
            client,
            file,
            options,
            state: MultipartState::NotStarted,
            session: None,
        }
    }

    pub fn state(&self) -> MultipartState {
        self.state
    }

    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    fn transition(&mut self, next: MultipartState) {
        debug!(
            "Multipart upload of {}: {} -> {}",
            self.file.file_name(),
            self.state,
            next
        );
        self.state = next;
    }

    /// Runs the upload to a terminal state
    pub async fn run(&mut self) -> Result<FileUploadResult> {
        if self.state != MultipartState::NotStarted {
            return Err(UploadError::invalid_parameter(
                "state",
                format!("Multipart upload already {}", self.state),
            ));
        }

        match self.drive().await {
            Ok(result) => {
                self.transition(MultipartState::Completed);
                Ok(result)
            }
            Err(e) => {
                self.transition(MultipartState::Failed);
                Err(e)
            }
        }
    }

    async fn drive(&mut self) -> Result<FileUploadResult> {
        self.options.validate()?;

        let session = multipart_start(self.client, &self.file, &self.options).await?;
        self.transition(MultipartState::Started);
        self.session = Some(session.clone());

        self.transition(MultipartState::PartsUploading);
        self.upload_parts(&session).await?;

        self.transition(MultipartState::Completing);
        let info = multipart_complete(self.client, &session.uuid, &self.options.cancel).await?;
        self.options.report(UploadProgress::complete());

        Ok(FileUploadResult::from_info(
            info,
            &self.client.settings().base_cdn,
        ))
    }

    async fn upload_parts(&self, session: &UploadSession) -> Result<()> {
        let progress = PartProgress::new(
            session.part_count(),
            session.plan.total_size(),
            self.options.clone(),
        );
        let limit = self.client.settings().multipart_max_concurrent_requests;
        let cancel = &self.options.cancel;

        let uploads = session
            .part_targets
            .iter()
            .enumerate()
            .map(|(index, target)| {
                let range = session.plan.range(index).unwrap_or(0..0);
                let chunk = self.file.data.slice(range);
                let on_progress = progress.callback(index);
                async move { upload_part(self.client, target, chunk, on_progress, cancel).await }
            });

        // Dropping the stream on the first error cancels the parts in flight
        stream::iter(uploads)
            .buffer_unordered(limit)
            .try_collect::<Vec<()>>()
            .await?;

        Ok(())
    }
}

/// Upload a file with the multipart protocol
///
/// # Arguments
///
/// * `client` - The client to upload through
/// * `file` - The file contents
/// * `options` - Metadata, cancellation and progress for this upload
///
/// # Returns
///
/// The uploaded file once the remote has assembled all parts
pub async fn upload_multipart(
    client: &UploadClient,
    file: FileData,
    options: UploadOptions,
) -> Result<FileUploadResult> {
    let started = Instant::now();
    let size = file.size();

    let result = MultipartUpload::new(client, file, options).run().await?;

    info!(
        "Uploaded {} ({}) with multipart in {:?}",
        result.uuid,
        ByteSize(size),
        started.elapsed()
    );
    Ok(result)
}
