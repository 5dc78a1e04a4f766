//! Client configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the client can start with zero
//! configuration for local development.

use std::path::PathBuf;
use std::time::Duration;

use tidings_shared::constants::{
    APP_NAME, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_UPLOAD_PRESET, DEFAULT_UPLOAD_URL,
    MAX_UPLOAD_SIZE,
};

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// SQLite file backing the document store.
    /// Env: `TIDINGS_DB_PATH`
    /// Default: platform data directory.
    pub db_path: Option<PathBuf>,

    /// Base URL of the blob store. Uploads go to `{base}/{resource}/upload`.
    /// Env: `TIDINGS_UPLOAD_URL`
    pub upload_url: String,

    /// Preset token sent with every upload.
    /// Env: `TIDINGS_UPLOAD_PRESET`
    pub upload_preset: String,

    /// Base URL of the notification backend. Fanout is disabled when unset.
    /// Env: `TIDINGS_NOTIFY_URL`
    pub notify_url: Option<String>,

    /// Title carried by every notification.
    /// Env: `TIDINGS_NOTIFY_TITLE`
    pub notification_title: String,

    /// Per-request timeout for uploads and notification dispatch.
    /// Env: `TIDINGS_HTTP_TIMEOUT_SECS`
    pub http_timeout: Duration,

    /// Largest blob accepted for upload, in bytes.
    pub max_upload_size: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            upload_url: DEFAULT_UPLOAD_URL.to_string(),
            upload_preset: DEFAULT_UPLOAD_PRESET.to_string(),
            notify_url: None,
            notification_title: APP_NAME.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("TIDINGS_DB_PATH").filter(|p| !p.is_empty()) {
            config.db_path = Some(PathBuf::from(path));
        }

        if let Some(url) = lookup("TIDINGS_UPLOAD_URL").filter(|u| !u.is_empty()) {
            config.upload_url = url.trim_end_matches('/').to_string();
        }

        if let Some(preset) = lookup("TIDINGS_UPLOAD_PRESET") {
            config.upload_preset = preset;
        }

        if let Some(url) = lookup("TIDINGS_NOTIFY_URL").filter(|u| !u.is_empty()) {
            config.notify_url = Some(url.trim_end_matches('/').to_string());
        }

        if let Some(title) = lookup("TIDINGS_NOTIFY_TITLE").filter(|t| !t.is_empty()) {
            config.notification_title = title;
        }

        if let Some(val) = lookup("TIDINGS_HTTP_TIMEOUT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) if secs > 0 => config.http_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    value = %val,
                    "Invalid TIDINGS_HTTP_TIMEOUT_SECS, using default"
                ),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }

    /// HTTP client shared by media ingest and notification fanout.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(self.http_timeout).build()
    }
}
