//! Server-to-server OAuth: exchange account credentials for a bearer token.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::AUTHORIZATION;
use std::fmt;
use tracing::{debug, info};

use super::models::TokenResponse;
use super::SERVICE;
use crate::config::ZoomCredentials;
use crate::error::ApiError;

const OPERATION: &str = "token request";
const GRANT_TYPE: &str = "account_credentials";

/// Bearer token returned by the OAuth endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<redacted>)")
    }
}

/// `Basic base64(client_id:client_secret)`
pub fn basic_authorization(credentials: &ZoomCredentials) -> String {
    let combined = format!(
        "{}:{}",
        credentials.client_id,
        credentials.client_secret.expose()
    );
    format!("Basic {}", BASE64.encode(combined.as_bytes()))
}

pub async fn request_access_token(
    client: &reqwest::Client,
    oauth_base_url: &str,
    credentials: &ZoomCredentials,
) -> Result<AccessToken, ApiError> {
    let url = format!("{}/oauth/token", oauth_base_url.trim_end_matches('/'));
    debug!("Requesting access token from {}", url);

    let response = client
        .post(&url)
        .query(&[
            ("grant_type", GRANT_TYPE),
            ("account_id", credentials.account_id.as_str()),
        ])
        .header(AUTHORIZATION, basic_authorization(credentials))
        .send()
        .await
        .map_err(ApiError::transport(SERVICE, OPERATION))?;

    let response = ApiError::ensure_success(SERVICE, OPERATION, response).await?;
    let body = response
        .text()
        .await
        .map_err(ApiError::transport(SERVICE, OPERATION))?;
    let token: TokenResponse = ApiError::decode(SERVICE, OPERATION, &body)?;

    info!(
        "Obtained access token (type: {}, expires in {}s)",
        token.token_type.as_deref().unwrap_or("bearer"),
        token.expires_in.unwrap_or_default()
    );
    Ok(AccessToken::new(token.access_token))
}
