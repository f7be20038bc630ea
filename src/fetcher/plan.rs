//! Turn a recording listing into the list of files to download and the
//! meetings to delete afterwards.

use anyhow::{anyhow, Context, Result};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::filename::{FilenameDeriver, RECORDING_EXTENSION};
use crate::zoom::{Meeting, MeetingId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDownload {
    pub meeting_id: MeetingId,
    pub topic: Option<String>,
    pub url: String,
    pub recording_start: String,
    pub filename: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPlan {
    pub downloads: Vec<PlannedDownload>,
    /// Meetings to delete once every download succeeded, in first-seen order.
    pub pending_deletions: Vec<MeetingId>,
    /// MP4 entries left out because the listing lacked a URL or start time.
    pub skipped_files: usize,
}

impl DownloadPlan {
    pub fn total_bytes(&self) -> Option<u64> {
        self.downloads.iter().map(|d| d.size).sum()
    }
}

/// Build the plan for one listing. Each file is named from its own
/// meeting's timezone. A meeting id is queued for deletion only when every
/// MP4 file listed under it, across all of its instances, is in the plan.
pub fn plan_downloads(meetings: &[Meeting], deriver: &FilenameDeriver) -> Result<DownloadPlan> {
    let mut plan = DownloadPlan::default();
    let mut queued: HashSet<MeetingId> = HashSet::new();
    let mut incomplete: HashSet<MeetingId> = HashSet::new();
    let mut name_counts: HashMap<String, usize> = HashMap::new();

    for meeting in meetings {
        let mp4_files: Vec<_> = meeting
            .recording_files
            .iter()
            .filter(|file| file.is_mp4())
            .collect();
        if mp4_files.is_empty() {
            debug!("Meeting {} has no MP4 recordings", meeting.id);
            continue;
        }

        let timezone = meeting
            .timezone
            .as_deref()
            .ok_or_else(|| anyhow!("Meeting {} has MP4 recordings but no timezone", meeting.id))?;

        let mut complete = true;
        for file in mp4_files {
            let (Some(url), Some(start)) =
                (file.download_url.as_deref(), file.recording_start.as_deref())
            else {
                warn!(
                    "Skipping MP4 in meeting {} without download URL or start time",
                    meeting.id
                );
                plan.skipped_files += 1;
                complete = false;
                continue;
            };

            let filename = deriver
                .recording_filename(start, timezone)
                .with_context(|| format!("Cannot name recording of meeting {}", meeting.id))?;
            let filename = disambiguate(filename, &mut name_counts);

            plan.downloads.push(PlannedDownload {
                meeting_id: meeting.id.clone(),
                topic: meeting.topic.clone(),
                url: url.to_string(),
                recording_start: start.to_string(),
                filename,
                size: file.file_size,
            });
        }

        if !complete {
            incomplete.insert(meeting.id.clone());
        } else if queued.insert(meeting.id.clone()) {
            plan.pending_deletions.push(meeting.id.clone());
        }
    }

    // Recurring meetings list every instance under one id.
    plan.pending_deletions.retain(|id| !incomplete.contains(id));
    for id in &incomplete {
        warn!("Meeting {id} will be kept remotely because some recordings were skipped");
    }

    debug!(
        "Planned {} downloads, {} deletions, {} skipped",
        plan.downloads.len(),
        plan.pending_deletions.len(),
        plan.skipped_files
    );
    Ok(plan)
}

/// Several MP4 views of one meeting share a start time. The first keeps the
/// plain name, later ones get `-2`, `-3`, ... before the extension.
fn disambiguate(filename: String, counts: &mut HashMap<String, usize>) -> String {
    let count = counts.entry(filename.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        return filename;
    }

    let suffix = format!(".{RECORDING_EXTENSION}");
    let stem = filename.strip_suffix(&suffix).unwrap_or(&filename);
    format!("{stem}-{count}{suffix}")
}
