//! Note uploader: append a paragraph to a Notion page.

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

use crate::notion::{NoteService, PageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteReport {
    pub page_id: PageId,
    pub title: Option<String>,
    pub url: Option<String>,
    pub existing_blocks: usize,
    pub appended_blocks: usize,
}

pub struct NoteUploader<'a> {
    service: &'a dyn NoteService,
}

impl<'a> NoteUploader<'a> {
    pub fn new(service: &'a dyn NoteService) -> Self {
        Self { service }
    }

    pub async fn run(&self, page_id: &PageId, text: &str) -> Result<NoteReport> {
        if text.trim().is_empty() {
            bail!("Refusing to append an empty paragraph");
        }

        let page = self
            .service
            .retrieve_page(page_id)
            .await
            .with_context(|| format!("Failed to retrieve page {page_id}"))?;
        if page.archived {
            bail!("Page {page_id} is archived");
        }
        let title = page.title();
        info!(
            "Page {}: {}",
            page_id,
            title.as_deref().unwrap_or("(untitled)")
        );

        let blocks = self
            .service
            .list_children(page_id)
            .await
            .with_context(|| format!("Failed to list blocks of page {page_id}"))?;
        debug!("Page has {} blocks", blocks.len());

        let appended = self
            .service
            .append_paragraph(page_id, text)
            .await
            .with_context(|| format!("Failed to append to page {page_id}"))?;

        Ok(NoteReport {
            page_id: page_id.clone(),
            title,
            url: page.url,
            existing_blocks: blocks.len(),
            appended_blocks: appended.len(),
        })
    }
}
