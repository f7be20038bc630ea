use anyhow::Result;
use clap::Parser;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use zoom_archive::{
    cli::{
        handle_fetch_command, handle_filename_command, handle_note_command, log_directive,
        parse_log_level, Cli, CliCommand, LOG_LEVEL_ENV,
    },
    config::Config,
    fetcher::exit_code_for,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let env_level = std::env::var(LOG_LEVEL_ENV).ok();
    let directive = log_directive(cli.verbose, env_level.as_deref());
    let env_filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(level) = env_level.as_deref() {
        if !cli.verbose && !level.trim().is_empty() && parse_log_level(level).is_none() {
            warn!("Unrecognized {LOG_LEVEL_ENV}={level:?}, logging at info");
        }
    }

    if let Err(err) = run(cli).await {
        error!("{err:#}");
        std::process::exit(exit_code_for(&err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        CliCommand::Version => {
            println!("zoom-archive {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        CliCommand::Filename(args) => {
            let config = Config::load(cli.config.as_deref())?;
            handle_filename_command(args, &config)
        }
        CliCommand::Fetch(args) => {
            let config = Config::load(cli.config.as_deref())?;
            handle_fetch_command(args, config).await
        }
        CliCommand::Note(args) => {
            let config = Config::load(cli.config.as_deref())?;
            handle_note_command(args, config).await
        }
    }
}
