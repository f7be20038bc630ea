//! Typed errors shared by the Zoom and Notion clients.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Failure talking to a remote API. Non-2xx responses keep the status and
/// body so the caller can report them before halting.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{service} {operation} failed with status {status}: {body}")]
    Status {
        service: &'static str,
        operation: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{service} {operation} request failed: {source}")]
    Transport {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} {operation} returned an unexpected body: {source}")]
    Decode {
        service: &'static str,
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub(crate) fn transport(
        service: &'static str,
        operation: &'static str,
    ) -> impl FnOnce(reqwest::Error) -> ApiError {
        move |source| ApiError::Transport {
            service,
            operation,
            source,
        }
    }

    /// Turn a non-2xx response into [`ApiError::Status`], keeping the body.
    pub(crate) async fn ensure_success(
        service: &'static str,
        operation: &'static str,
        response: Response,
    ) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        Err(Self::from_failed(service, operation, response).await)
    }

    pub(crate) async fn from_failed(
        service: &'static str,
        operation: &'static str,
        response: Response,
    ) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        ApiError::Status {
            service,
            operation,
            status,
            body,
        }
    }

    pub(crate) fn decode<T: DeserializeOwned>(
        service: &'static str,
        operation: &'static str,
        body: &str,
    ) -> Result<T, ApiError> {
        serde_json::from_str(body).map_err(|source| ApiError::Decode {
            service,
            operation,
            source,
        })
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport { source, .. } => source.status(),
            ApiError::Decode { .. } => None,
        }
    }
}

/// Which part of the configuration a flow needed but did not find.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing {field} (set it in the config file or via ${env})")]
    Missing {
        field: &'static str,
        env: &'static str,
    },
}
