use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "zoom-archive")]
#[command(about = "Archive Zoom cloud recordings and push notes to Notion", long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of ~/.config/zoom-archive/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Download MP4 cloud recordings, then delete them from Zoom
    Fetch(FetchCliArgs),
    /// Append a paragraph to a Notion page
    Note(NoteCliArgs),
    /// Print the filename a recording would be saved under
    Filename(FilenameCliArgs),
    /// Print version information
    Version,
}

#[derive(ClapArgs, Debug)]
pub struct FetchCliArgs {
    /// First day to list (YYYY-MM-DD, default: one year ago)
    #[arg(long)]
    pub from: Option<NaiveDate>,
    /// Last day to list (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub to: Option<NaiveDate>,
    /// Directory recordings are written to
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// List what would be downloaded without downloading or deleting
    #[arg(long)]
    pub dry_run: bool,
    /// Download but keep the recordings on Zoom
    #[arg(long)]
    pub keep_remote: bool,
    /// Do not download files that already exist locally
    #[arg(long)]
    pub skip_existing: bool,
    /// Delete recordings permanently instead of moving them to the Zoom trash
    #[arg(long, conflicts_with = "keep_remote")]
    pub hard_delete: bool,
    /// IANA timezone filenames are expressed in (default: Europe/Madrid)
    #[arg(long)]
    pub target_zone: Option<String>,
    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,
}

#[derive(ClapArgs, Debug)]
pub struct NoteCliArgs {
    /// Page id or URL (default: notion.page_id / NOTION_PAGE_ID)
    #[arg(short, long)]
    pub page: Option<String>,
    /// Paragraph text; multiple words are joined with spaces
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct FilenameCliArgs {
    /// Recording start, e.g. 2023-09-05T05:00:32Z
    pub timestamp: String,
    /// Meeting timezone descriptor, e.g. GMT+08:00
    #[arg(allow_hyphen_values = true)]
    pub timezone: String,
    /// IANA timezone the filename is expressed in (default: Europe/Madrid)
    #[arg(long)]
    pub target_zone: Option<String>,
}
