use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::auth::{self, AccessToken};
use super::models::{Meeting, MeetingId, RecordingWindow, RecordingsPage};
use super::{RecordingService, SERVICE};
use crate::config::{Config, DeleteAction, ZoomCredentials};
use crate::error::ApiError;

const PARTIAL_SUFFIX: &str = "part";

pub struct ZoomClient {
    client: reqwest::Client,
    download_client: reqwest::Client,
    credentials: ZoomCredentials,
    oauth_base_url: String,
    api_base_url: String,
    page_size: u32,
    delete_action: DeleteAction,
}

impl ZoomClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let credentials = config.zoom_credentials()?;

        let client = reqwest::Client::builder()
            .timeout(config.http.request_timeout())
            .build()
            .context("Failed to create HTTP client")?;
        let download_client = reqwest::Client::builder()
            .timeout(config.http.download_timeout())
            .build()
            .context("Failed to create download HTTP client")?;

        let api_base_url = config.zoom.api_base_url.trim_end_matches('/').to_string();
        info!("Initialized Zoom client with API base: {}", api_base_url);

        Ok(Self {
            client,
            download_client,
            credentials,
            oauth_base_url: config.zoom.oauth_base_url.trim_end_matches('/').to_string(),
            api_base_url,
            page_size: config.zoom.page_size,
            delete_action: config.zoom.delete_action,
        })
    }

    async fn fetch_page(
        &self,
        token: &AccessToken,
        window: &RecordingWindow,
        page_token: Option<&str>,
    ) -> Result<RecordingsPage, ApiError> {
        const OPERATION: &str = "recording list";

        let url = format!("{}/users/me/recordings", self.api_base_url);
        let mut query = window.query();
        query.push(("page_size", self.page_size.to_string()));
        if let Some(page_token) = page_token {
            query.push(("next_page_token", page_token.to_string()));
        }

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.as_str())
            .query(&query)
            .send()
            .await
            .map_err(ApiError::transport(SERVICE, OPERATION))?;

        let response = ApiError::ensure_success(SERVICE, OPERATION, response).await?;
        let body = response
            .text()
            .await
            .map_err(ApiError::transport(SERVICE, OPERATION))?;
        ApiError::decode(SERVICE, OPERATION, &body)
    }

    fn recordings_url(&self, meeting_id: &MeetingId) -> Result<Url> {
        let mut url = Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid Zoom API base URL: {}", self.api_base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Zoom API base URL cannot take a path: {}", self.api_base_url))?
            .pop_if_empty()
            .push("meetings")
            .push(&meeting_id.to_string())
            .push("recordings");
        Ok(url)
    }
}

#[async_trait]
impl RecordingService for ZoomClient {
    async fn authenticate(&self) -> Result<AccessToken> {
        let token =
            auth::request_access_token(&self.client, &self.oauth_base_url, &self.credentials)
                .await?;
        Ok(token)
    }

    async fn list_recordings(
        &self,
        token: &AccessToken,
        window: &RecordingWindow,
    ) -> Result<Vec<Meeting>> {
        let mut meetings = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_page(token, window, page_token.as_deref()).await?;
            pages += 1;

            let next = page.next_token().map(str::to_string);
            debug!(
                "Recording page {}: {} meetings (total records: {:?})",
                pages,
                page.meetings.len(),
                page.total_records
            );
            meetings.extend(page.meetings);

            match next {
                Some(next) if page_token.as_deref() == Some(next.as_str()) => {
                    bail!("Zoom returned the same page token twice: {next}");
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(
            "Listed {} meetings with recordings across {} page(s)",
            meetings.len(),
            pages
        );
        Ok(meetings)
    }

    async fn download(
        &self,
        token: &AccessToken,
        url: &str,
        destination: &Path,
        progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
    ) -> Result<u64> {
        const OPERATION: &str = "download";

        let response = self
            .download_client
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(ApiError::transport(SERVICE, OPERATION))?;
        let response = ApiError::ensure_success(SERVICE, OPERATION, response).await?;

        let partial = partial_path(destination);
        let mut file = fs::File::create(&partial)
            .await
            .with_context(|| format!("Failed to create {}", partial.display()))?;

        let written = match stream_body(response, &mut file, progress).await {
            Ok(written) => written,
            Err(err) => {
                drop(file);
                discard_partial(&partial).await;
                return Err(err);
            }
        };
        drop(file);

        if let Err(err) = fs::rename(&partial, destination).await {
            discard_partial(&partial).await;
            return Err(err)
                .with_context(|| format!("Failed to move download to {}", destination.display()));
        }
        debug!("Wrote {} bytes to {}", written, destination.display());
        Ok(written)
    }

    async fn delete_recordings(&self, token: &AccessToken, meeting_id: &MeetingId) -> Result<()> {
        const OPERATION: &str = "recording delete";

        let url = self.recordings_url(meeting_id)?;
        debug!("Deleting recordings for meeting {}: {}", meeting_id, url);

        let response = self
            .client
            .delete(url)
            .bearer_auth(token.as_str())
            .query(&[("action", self.delete_action.as_str())])
            .send()
            .await
            .map_err(ApiError::transport(SERVICE, OPERATION))?;

        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(ApiError::from_failed(SERVICE, OPERATION, response)
                .await
                .into()),
        }
    }
}

async fn stream_body(
    mut response: reqwest::Response,
    file: &mut fs::File,
    progress: &(dyn Fn(u64, Option<u64>) + Send + Sync),
) -> Result<u64> {
    let total = response.content_length();
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(ApiError::transport(SERVICE, "download"))?
    {
        file.write_all(&chunk)
            .await
            .context("Failed to write recording chunk")?;
        written += chunk.len() as u64;
        progress(written, total);
    }

    file.flush().await.context("Failed to flush recording")?;

    if let Some(total) = total {
        if written != total {
            bail!("Download ended early: got {written} of {total} bytes");
        }
    }
    Ok(written)
}

async fn discard_partial(partial: &Path) {
    if let Err(err) = fs::remove_file(partial).await {
        warn!("Failed to remove partial download {}: {err}", partial.display());
    }
}

/// `2023-09-05T07-00-32+0200.mp4` is written as `2023-09-05T07-00-32+0200.mp4.part`
/// until the body is complete.
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    destination.with_file_name(name)
}
