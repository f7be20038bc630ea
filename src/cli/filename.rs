use anyhow::Result;

use super::args::FilenameCliArgs;
use crate::config::Config;
use crate::filename::FilenameDeriver;

pub fn handle_filename_command(args: FilenameCliArgs, config: &Config) -> Result<()> {
    let zone = args
        .target_zone
        .as_deref()
        .unwrap_or(&config.download.target_timezone);
    let deriver = FilenameDeriver::from_name(zone)?;
    println!(
        "{}",
        deriver.recording_filename(&args.timestamp, &args.timezone)?
    );
    Ok(())
}
