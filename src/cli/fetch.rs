//! CLI handler for downloading recordings.
//!
//! Presentation only: progress bars and the final summary. The flow itself
//! lives in the `fetcher` module.

use anyhow::{bail, Context, Result};
use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

use super::args::FetchCliArgs;
use crate::config::{Config, DeleteAction};
use crate::fetcher::{
    DownloadPlan, FetchObserver, FetchOptions, FetchReport, FetchStage, Fetcher, PlannedDownload,
};
use crate::filename::FilenameDeriver;
use crate::zoom::{RecordingWindow, ZoomClient};

pub async fn handle_fetch_command(args: FetchCliArgs, mut config: Config) -> Result<()> {
    if args.hard_delete {
        config.zoom.delete_action = DeleteAction::Delete;
    }

    let zone = args
        .target_zone
        .clone()
        .unwrap_or_else(|| config.download.target_timezone.clone());
    let deriver = FilenameDeriver::from_name(&zone)?;

    let window = resolve_window(&args, &config)?;
    let options = FetchOptions {
        window,
        output_dir: args
            .output_dir
            .clone()
            .unwrap_or_else(|| config.output_dir()),
        dry_run: args.dry_run,
        keep_remote: args.keep_remote,
        skip_existing: args.skip_existing,
    };

    let client = ZoomClient::from_config(&config).context(FetchStage::Authenticate)?;
    let observer = ProgressObserver::new(!args.no_progress);

    let report = Fetcher::new(&client, deriver)
        .with_observer(&observer)
        .run(&options)
        .await?;

    print_report(&report, &options);
    Ok(())
}

fn resolve_window(args: &FetchCliArgs, config: &Config) -> Result<RecordingWindow> {
    let today = Local::now().date_naive();
    let from = args.from.unwrap_or_else(|| {
        RecordingWindow::lookback(today, config.download.lookback_months).from
    });

    if let Some(to) = args.to {
        if to < from {
            bail!("--to ({to}) is before --from ({from})");
        }
    }

    Ok(RecordingWindow { from, to: args.to })
}

fn print_report(report: &FetchReport, options: &FetchOptions) {
    if report.dry_run {
        println!(
            "Would download {} recording(s) from {} meeting(s):",
            report.plan.downloads.len(),
            report.meetings_listed
        );
        for item in &report.plan.downloads {
            println!(
                "  {}  meeting {} {}",
                options.output_dir.join(&item.filename).display(),
                item.meeting_id,
                item.topic.as_deref().unwrap_or("")
            );
        }
        if let Some(total) = report.plan.total_bytes() {
            println!("Total size: {}", format_bytes(total));
        }
        if !options.keep_remote {
            println!(
                "Would then delete recordings of {} meeting(s) from Zoom.",
                report.plan.pending_deletions.len()
            );
        }
        return;
    }

    println!(
        "Downloaded {} recording(s) ({}) to {}",
        report.downloaded.len(),
        format_bytes(report.bytes_downloaded()),
        options.output_dir.display()
    );
    if !report.existing.is_empty() {
        println!("Skipped {} existing file(s).", report.existing.len());
    }
    if report.plan.skipped_files > 0 {
        println!(
            "Ignored {} MP4 entr(ies) without a download URL or start time.",
            report.plan.skipped_files
        );
    }
    if options.keep_remote {
        println!("Remote recordings kept on Zoom.");
    } else {
        println!(
            "Deleted recordings of {} meeting(s) from Zoom.",
            report.deleted.len()
        );
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64;
    let mut unit = "B";
    for next in UNITS {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Draws one progress bar per download.
struct ProgressObserver {
    enabled: bool,
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: Mutex::new(None),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl FetchObserver for ProgressObserver {
    fn planned(&self, plan: &DownloadPlan) {
        if self.enabled && plan.downloads.is_empty() {
            eprintln!("No MP4 recordings found.");
        }
    }

    fn download_started(&self, index: usize, count: usize, item: &PlannedDownload) {
        if !self.enabled {
            return;
        }
        let bar = create_progress_bar(item.size);
        bar.set_message(format!("[{}/{}] {}", index + 1, count, item.filename));
        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn download_progress(&self, written: u64, total: Option<u64>) {
        self.with_bar(|bar| {
            if let Some(total) = total {
                bar.set_length(total);
            }
            bar.set_position(written);
        });
    }

    fn download_finished(&self, item: &PlannedDownload, bytes: u64) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
                eprintln!("{} ({})", item.filename, format_bytes(bytes));
            }
        }
    }
}

fn create_progress_bar(size: Option<u64>) -> ProgressBar {
    let pb = ProgressBar::new(size.unwrap_or(0));
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━╸━");
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
