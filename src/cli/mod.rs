pub mod args;
mod fetch;
mod filename;
mod note;

pub use args::{Cli, CliCommand, FetchCliArgs, FilenameCliArgs, NoteCliArgs};
pub use fetch::{format_bytes, handle_fetch_command};
pub use filename::handle_filename_command;
pub use note::handle_note_command;

use tracing_subscriber::filter::LevelFilter;

/// Env var consulted for the log level when `--verbose` is not given.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Parse a `LOG_LEVEL` value. Besides tracing's own names this accepts
/// `warning`, `critical` and `fatal` in any case.
pub fn parse_log_level(raw: &str) -> Option<LevelFilter> {
    let level = raw.trim().to_ascii_lowercase();
    let level = match level.as_str() {
        "warning" => "warn",
        "critical" | "fatal" => "error",
        other => other,
    };
    level.parse().ok()
}

/// Tracing filter directive: `--verbose` wins, then `LOG_LEVEL`, then `info`.
/// Unrecognized levels fall back to `info`.
pub fn log_directive(verbose: bool, env_level: Option<&str>) -> String {
    if verbose {
        return LevelFilter::DEBUG.to_string().to_lowercase();
    }
    env_level
        .and_then(parse_log_level)
        .unwrap_or(LevelFilter::INFO)
        .to_string()
        .to_lowercase()
}
