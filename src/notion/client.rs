use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};

use super::models::{paragraph_block, Block, BlockList, Page, PageId};
use super::{NoteService, SERVICE};
use crate::config::{Config, Secret};
use crate::error::ApiError;

const VERSION_HEADER: &str = "Notion-Version";
const CHILDREN_PAGE_SIZE: &str = "100";

pub struct NotionClient {
    client: reqwest::Client,
    token: Secret,
    base_url: String,
    api_version: String,
}

impl NotionClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.notion_token()?.clone();
        let client = reqwest::Client::builder()
            .timeout(config.http.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = config.notion.api_base_url.trim_end_matches('/').to_string();
        info!("Initialized Notion client with API base: {}", base_url);

        Ok(Self {
            client,
            token,
            base_url,
            api_version: config.notion.api_version.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(self.token.expose())
            .header(VERSION_HEADER, &self.api_version)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(ApiError::transport(SERVICE, operation))?;
        let response = ApiError::ensure_success(SERVICE, operation, response).await?;
        let body = response
            .text()
            .await
            .map_err(ApiError::transport(SERVICE, operation))?;
        ApiError::decode(SERVICE, operation, &body)
    }
}

#[async_trait]
impl NoteService for NotionClient {
    async fn retrieve_page(&self, page_id: &PageId) -> Result<Page> {
        let url = format!("{}/v1/pages/{}", self.base_url, page_id);
        let page: Page = self.send("page retrieve", self.client.get(&url)).await?;
        debug!("Retrieved page {} ({:?})", page.id, page.url);
        Ok(page)
    }

    async fn list_children(&self, block_id: &PageId) -> Result<Vec<Block>> {
        let url = format!("{}/v1/blocks/{}/children", self.base_url, block_id);
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", CHILDREN_PAGE_SIZE.to_string())];
            if let Some(cursor) = &cursor {
                query.push(("start_cursor", cursor.clone()));
            }

            let list: BlockList = self
                .send("block children list", self.client.get(&url).query(&query))
                .await?;
            blocks.extend(list.results);

            match (list.has_more, list.next_cursor) {
                (true, Some(next)) if cursor.as_deref() == Some(next.as_str()) => {
                    bail!("Notion returned the same cursor twice: {next}");
                }
                (true, Some(next)) => cursor = Some(next),
                _ => break,
            }
        }

        debug!("Block {} has {} children", block_id, blocks.len());
        Ok(blocks)
    }

    async fn append_paragraph(&self, block_id: &PageId, text: &str) -> Result<Vec<Block>> {
        let url = format!("{}/v1/blocks/{}/children", self.base_url, block_id);
        let body = json!({ "children": [paragraph_block(text)] });

        let list: BlockList = self
            .send("block append", self.client.patch(&url).json(&body))
            .await?;
        info!("Appended paragraph ({} chars) to {}", text.chars().count(), block_id);
        Ok(list.results)
    }
}
