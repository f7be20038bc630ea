//! Recording fetcher: authenticate, list, download every MP4, then delete the
//! source recordings.
//!
//! The run is strictly sequential and stops at the first failure. Remote
//! recordings are only deleted after every planned download landed on disk,
//! so a failed transfer never costs the remote copy.

use anyhow::{Context, Result};
use std::fmt;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info};

pub mod plan;

pub use plan::{plan_downloads, DownloadPlan, PlannedDownload};

use crate::filename::FilenameDeriver;
use crate::zoom::{MeetingId, RecordingService, RecordingWindow};

/// Phase a fetch failed in. Attached to errors as context so the binary can
/// map it to an exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Authenticate,
    List,
    Plan,
    Download,
    Delete,
}

impl FetchStage {
    pub fn exit_code(&self) -> i32 {
        match self {
            FetchStage::Authenticate => 1,
            FetchStage::List | FetchStage::Plan => 2,
            FetchStage::Download => 3,
            FetchStage::Delete => 4,
        }
    }
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            FetchStage::Authenticate => "Authentication with Zoom failed",
            FetchStage::List => "Listing recordings failed",
            FetchStage::Plan => "Preparing downloads failed",
            FetchStage::Download => "Downloading recordings failed",
            FetchStage::Delete => "Deleting remote recordings failed",
        };
        f.write_str(message)
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub window: RecordingWindow,
    pub output_dir: PathBuf,
    /// List and plan only.
    pub dry_run: bool,
    /// Download but leave the remote recordings in place.
    pub keep_remote: bool,
    /// Leave files that already exist locally untouched.
    pub skip_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub meeting_id: MeetingId,
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    pub meetings_listed: usize,
    pub plan: DownloadPlan,
    pub downloaded: Vec<DownloadedFile>,
    pub existing: Vec<PathBuf>,
    pub deleted: Vec<MeetingId>,
    pub dry_run: bool,
}

impl FetchReport {
    pub fn bytes_downloaded(&self) -> u64 {
        self.downloaded.iter().map(|file| file.bytes).sum()
    }
}

/// Hooks for presenting progress. All methods default to no-ops.
pub trait FetchObserver: Send + Sync {
    fn planned(&self, _plan: &DownloadPlan) {}

    fn download_started(&self, _index: usize, _count: usize, _item: &PlannedDownload) {}

    fn download_progress(&self, _written: u64, _total: Option<u64>) {}

    fn download_finished(&self, _item: &PlannedDownload, _bytes: u64) {}

    fn deleted(&self, _meeting_id: &MeetingId) {}
}

pub struct SilentObserver;

impl FetchObserver for SilentObserver {}

pub struct Fetcher<'a> {
    service: &'a dyn RecordingService,
    deriver: FilenameDeriver,
    observer: &'a dyn FetchObserver,
}

impl<'a> Fetcher<'a> {
    pub fn new(service: &'a dyn RecordingService, deriver: FilenameDeriver) -> Self {
        Self {
            service,
            deriver,
            observer: &SilentObserver,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn FetchObserver) -> Self {
        self.observer = observer;
        self
    }

    pub async fn run(&self, options: &FetchOptions) -> Result<FetchReport> {
        let token = self
            .service
            .authenticate()
            .await
            .context(FetchStage::Authenticate)?;

        info!(
            "Listing recordings from {} to {}",
            options.window.from,
            options
                .window
                .to
                .map(|to| to.to_string())
                .unwrap_or_else(|| "today".to_string())
        );
        let meetings = self
            .service
            .list_recordings(&token, &options.window)
            .await
            .context(FetchStage::List)?;

        let plan = plan_downloads(&meetings, &self.deriver).context(FetchStage::Plan)?;
        info!(
            "Found {} MP4 recordings in {} meetings",
            plan.downloads.len(),
            meetings.len()
        );
        self.observer.planned(&plan);

        let mut report = FetchReport {
            meetings_listed: meetings.len(),
            plan: plan.clone(),
            dry_run: options.dry_run,
            ..Default::default()
        };

        if options.dry_run {
            info!("Dry run: nothing downloaded or deleted");
            return Ok(report);
        }

        if !plan.downloads.is_empty() {
            fs::create_dir_all(&options.output_dir)
                .await
                .with_context(|| {
                    format!("Failed to create {}", options.output_dir.display())
                })
                .context(FetchStage::Download)?;
        }

        let observer = self.observer;
        let progress = move |written: u64, total: Option<u64>| {
            observer.download_progress(written, total);
        };

        let count = plan.downloads.len();
        for (index, item) in plan.downloads.iter().enumerate() {
            let destination = options.output_dir.join(&item.filename);

            if options.skip_existing && destination.exists() {
                info!("{} already exists, skipping", destination.display());
                report.existing.push(destination);
                continue;
            }

            info!("Downloading {}...", item.filename);
            debug!("URL: {}", item.url);
            self.observer.download_started(index, count, item);

            let bytes = self
                .service
                .download(&token, &item.url, &destination, &progress)
                .await
                .with_context(|| format!("Failed to download {}", item.filename))
                .context(FetchStage::Download)?;

            info!("{} downloaded successfully ({} bytes)", item.filename, bytes);
            self.observer.download_finished(item, bytes);
            report.downloaded.push(DownloadedFile {
                meeting_id: item.meeting_id.clone(),
                path: destination,
                bytes,
            });
        }

        if options.keep_remote {
            info!(
                "Keeping {} meetings on Zoom as requested",
                plan.pending_deletions.len()
            );
            return Ok(report);
        }

        for meeting_id in &plan.pending_deletions {
            debug!("Deleting meeting files. ID {}...", meeting_id);
            self.service
                .delete_recordings(&token, meeting_id)
                .await
                .with_context(|| format!("Failed to delete recordings of meeting {meeting_id}"))
                .context(FetchStage::Delete)?;
            info!("Meeting ID {} files deleted successfully.", meeting_id);
            self.observer.deleted(meeting_id);
            report.deleted.push(meeting_id.clone());
        }

        Ok(report)
    }
}

/// Exit code for a failed run: the stage's code when the error carries one,
/// 1 otherwise.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<FetchStage>()
        .map(FetchStage::exit_code)
        .unwrap_or(1)
}
