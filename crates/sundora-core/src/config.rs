//! Configuration module
//!
//! The backend URL and the session timing knobs are injected through
//! [`ClientConfig`] instead of being baked into the workflows, so everything can be
//! pointed at a mock endpoint.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Public backend used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "https://inshare-backend-c9p8.onrender.com";

const POLL_INTERVAL_MS: u64 = 3000;
const SUCCESS_NOTICE_DELAY_MS: u64 = 500;
const DOWNLOAD_DIR: &str = "sundora-downloads";
const MEDIA_DIR: &str = "sundora-gallery";

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub api_url: String,
    /// Cadence of the session listing poll.
    pub poll_interval: Duration,
    /// Delay between observing an acknowledged upload and announcing it.
    pub success_notice_delay: Duration,
    /// `None` keeps the transport default (no timeout).
    pub request_timeout: Option<Duration>,
    /// Where downloaded files are staged before being saved to the media library.
    pub download_dir: PathBuf,
    /// Directory standing in for the device media library.
    pub media_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval: Duration::from_millis(POLL_INTERVAL_MS),
            success_notice_delay: Duration::from_millis(SUCCESS_NOTICE_DELAY_MS),
            request_timeout: None,
            download_dir: PathBuf::from(DOWNLOAD_DIR),
            media_dir: PathBuf::from(MEDIA_DIR),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment (after reading `.env`).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Malformed numbers fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_url = lookup("SUNDORA_API_URL")
            .or_else(|| lookup("API_URL"))
            .filter(|url| !url.trim().is_empty())
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let millis = |key: &str, default: u64| {
            lookup(key)
                .and_then(|raw| match raw.trim().parse::<u64>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!(key, value = %raw, "Ignoring malformed configuration value");
                        None
                    }
                })
                .unwrap_or(default)
        };

        let poll_interval =
            Duration::from_millis(millis("SUNDORA_POLL_INTERVAL_MS", POLL_INTERVAL_MS).max(1));
        let success_notice_delay = Duration::from_millis(millis(
            "SUNDORA_SUCCESS_NOTICE_DELAY_MS",
            SUCCESS_NOTICE_DELAY_MS,
        ));
        let request_timeout = match millis("SUNDORA_REQUEST_TIMEOUT_SECS", 0) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let download_dir = lookup("SUNDORA_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.download_dir);
        let media_dir = lookup("SUNDORA_MEDIA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.media_dir);

        Self {
            api_url,
            poll_interval,
            success_notice_delay,
            request_timeout,
            download_dir,
            media_dir,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}
