//! Client configuration resolved once at startup.

use std::time::Duration;

/// Environment variable holding the inference service base URL.
pub const API_URL_ENV: &str = "LEAF_API_URL";

/// Base URL used when [`API_URL_ENV`] is unset or blank.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Configuration for the HTTP inference client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service root without a trailing slash, e.g. `http://localhost:5000`.
    pub base_url: String,
    /// Whole-request timeout; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with the default timeout.
    pub fn with_base_url(base_url: impl AsRef<str>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            ..Self::default()
        }
    }

    /// Reads [`API_URL_ENV`] from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the config through `lookup` instead of the real environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(API_URL_ENV) {
            Some(url) if !url.trim().is_empty() => Self::with_base_url(url.trim()),
            _ => Self::default(),
        }
    }

    /// `POST` target for classification requests.
    pub fn predict_url(&self) -> String {
        format!("{}/predict", self.base_url)
    }

    /// `GET` target for the liveness check.
    pub fn health_url(&self) -> String {
        format!("{}/healthz", self.base_url)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
