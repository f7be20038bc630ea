use crate::error::ConfigError;
use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Environment variables that override values from the config file.
pub mod env_keys {
    pub const ACCOUNT_ID: &str = "ACCOUNT_ID";
    pub const CLIENT_ID: &str = "CLIENT_ID";
    pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
    pub const NOTION_TOKEN_V2: &str = "NOTION_TOKEN_V2";
    pub const NOTION_TOKEN: &str = "NOTION_TOKEN";
    pub const NOTION_PAGE_ID: &str = "NOTION_PAGE_ID";
    pub const OUTPUT_DIR: &str = "ZOOM_ARCHIVE_OUTPUT_DIR";
    pub const TARGET_ZONE: &str = "ZOOM_ARCHIVE_TARGET_ZONE";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub zoom: ZoomConfig,
    pub notion: NotionConfig,
    pub download: DownloadConfig,
    pub http: HttpConfig,
}

/// A credential that never shows up in logs.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "Secret(<empty>)")
        } else {
            write!(f, "Secret(<redacted>)")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: Secret,
    pub oauth_base_url: String,
    pub api_base_url: String,
    /// `trash` moves recordings to the Zoom trash, `delete` removes them for good.
    pub delete_action: DeleteAction,
    pub page_size: u32,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            client_id: String::new(),
            client_secret: Secret::default(),
            oauth_base_url: "https://zoom.us".to_string(),
            api_base_url: "https://api.zoom.us/v2".to_string(),
            delete_action: DeleteAction::Trash,
            page_size: 300,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteAction {
    #[default]
    Trash,
    Delete,
}

impl DeleteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteAction::Trash => "trash",
            DeleteAction::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    pub token: Secret,
    pub page_id: Option<String>,
    pub api_base_url: String,
    pub api_version: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token: Secret::default(),
            page_id: None,
            api_base_url: "https://api.notion.com".to_string(),
            api_version: "2022-06-28".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub output_dir: Option<PathBuf>,
    /// IANA zone every filename is expressed in.
    pub target_timezone: String,
    /// How far back the default listing window reaches.
    pub lookback_months: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            target_timezone: "Europe/Madrid".to_string(),
            lookback_months: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub request_timeout_secs: u64,
    /// Covers the whole body of a single recording download.
    pub download_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            download_timeout_secs: 3600,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

/// Credentials for the account-level client-credential grant.
#[derive(Debug, Clone)]
pub struct ZoomCredentials {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: Secret,
}

impl Config {
    /// Load the config file (explicit path or the per-user default) and
    /// overlay environment variables. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => global::config_file()?,
        };

        let mut config = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config = Self::from_toml(&content)?;
            info!("Loaded config from {:?}", config_path);
            config
        } else if path.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display());
        } else {
            info!(
                "Config file not found at {:?}, using defaults and environment",
                config_path
            );
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Overlay values from the environment. Empty variables are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get(env_keys::ACCOUNT_ID) {
            self.zoom.account_id = value;
        }
        if let Some(value) = get(env_keys::CLIENT_ID) {
            self.zoom.client_id = value;
        }
        if let Some(value) = get(env_keys::CLIENT_SECRET) {
            self.zoom.client_secret = Secret::new(value);
        }
        if let Some(value) = get(env_keys::NOTION_TOKEN_V2).or_else(|| get(env_keys::NOTION_TOKEN)) {
            self.notion.token = Secret::new(value);
        }
        if let Some(value) = get(env_keys::NOTION_PAGE_ID) {
            self.notion.page_id = Some(value);
        }
        if let Some(value) = get(env_keys::OUTPUT_DIR) {
            self.download.output_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get(env_keys::TARGET_ZONE) {
            self.download.target_timezone = value;
        }
    }

    pub fn zoom_credentials(&self) -> Result<ZoomCredentials, ConfigError> {
        if self.zoom.account_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "zoom.account_id",
                env: env_keys::ACCOUNT_ID,
            });
        }
        if self.zoom.client_id.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "zoom.client_id",
                env: env_keys::CLIENT_ID,
            });
        }
        if self.zoom.client_secret.is_empty() {
            return Err(ConfigError::Missing {
                field: "zoom.client_secret",
                env: env_keys::CLIENT_SECRET,
            });
        }
        Ok(ZoomCredentials {
            account_id: self.zoom.account_id.trim().to_string(),
            client_id: self.zoom.client_id.trim().to_string(),
            client_secret: self.zoom.client_secret.clone(),
        })
    }

    pub fn notion_token(&self) -> Result<&Secret, ConfigError> {
        if self.notion.token.is_empty() {
            return Err(ConfigError::Missing {
                field: "notion.token",
                env: env_keys::NOTION_TOKEN_V2,
            });
        }
        Ok(&self.notion.token)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.download
            .output_dir
            .clone()
            .unwrap_or_else(global::default_output_dir)
    }
}
