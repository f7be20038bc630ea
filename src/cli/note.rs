//! CLI handler for appending a note to a Notion page.

use anyhow::{Context, Result};

use super::args::NoteCliArgs;
use crate::config::{env_keys, Config};
use crate::notion::{NotionClient, PageId};
use crate::uploader::NoteUploader;

pub async fn handle_note_command(args: NoteCliArgs, config: Config) -> Result<()> {
    let raw_page = args
        .page
        .or_else(|| config.notion.page_id.clone())
        .with_context(|| {
            format!(
                "No Notion page given: pass --page or set notion.page_id / ${}",
                env_keys::NOTION_PAGE_ID
            )
        })?;
    let page_id = PageId::parse(&raw_page)?;
    let text = args.text.join(" ");

    let client = NotionClient::from_config(&config)?;
    let report = NoteUploader::new(&client).run(&page_id, &text).await?;

    println!(
        "Appended {} block(s) to \"{}\" ({} existing)",
        report.appended_blocks,
        report.title.as_deref().unwrap_or("untitled"),
        report.existing_blocks
    );
    if let Some(url) = report.url {
        println!("{url}");
    }
    Ok(())
}
