//! Zoom cloud recording API: authentication, listing, download and deletion.

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub mod auth;
pub mod client;
pub mod models;

pub use auth::AccessToken;
pub use client::ZoomClient;
pub use models::{Meeting, MeetingId, RecordingFile, RecordingWindow, RecordingsPage};

pub(crate) const SERVICE: &str = "Zoom";

/// Remote side of the recording fetcher. Every call is a single request
/// sequence with no retries; the first failure is returned as-is.
#[async_trait]
pub trait RecordingService: Send + Sync {
    async fn authenticate(&self) -> Result<AccessToken>;

    async fn list_recordings(
        &self,
        token: &AccessToken,
        window: &RecordingWindow,
    ) -> Result<Vec<Meeting>>;

    /// Stream `url` into `destination`, reporting `(bytes_written, total)`
    /// after each chunk. Returns the number of bytes written.
    async fn download(
        &self,
        token: &AccessToken,
        url: &str,
        destination: &Path,
        progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
    ) -> Result<u64>;

    async fn delete_recordings(&self, token: &AccessToken, meeting_id: &MeetingId) -> Result<()>;
}
