//! Notion API client used by the note uploader.

use anyhow::Result;
use async_trait::async_trait;

pub mod client;
pub mod models;

pub use client::NotionClient;
pub use models::{paragraph_block, Block, Page, PageId};

pub(crate) const SERVICE: &str = "Notion";

#[async_trait]
pub trait NoteService: Send + Sync {
    async fn retrieve_page(&self, page_id: &PageId) -> Result<Page>;

    /// All direct children of a page or block, across every result page.
    async fn list_children(&self, block_id: &PageId) -> Result<Vec<Block>>;

    async fn append_paragraph(&self, block_id: &PageId, text: &str) -> Result<Vec<Block>>;
}
