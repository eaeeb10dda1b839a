//! Configuration for the encyclopedia client and image preloading.

use ghostchat_retries::RetryPolicy;
use std::time::Duration;

/// Configuration for [`WikipediaClient`](crate::WikipediaClient).
#[derive(Debug, Clone)]
pub struct WikipediaConfig {
    /// Wiki origin, e.g. `https://fr.wikipedia.org`.
    pub base_url: String,
    /// Requested thumbnail width in pixels.
    pub thumbnail_size: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Rate-limit retry policy.
    pub retry: RetryPolicy,
}

impl Default for WikipediaConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fr.wikipedia.org".to_string(),
            thumbnail_size: 800,
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

impl WikipediaConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the wiki origin.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the thumbnail width.
    #[must_use]
    pub fn thumbnail_size(mut self, size: u32) -> Self {
        self.thumbnail_size = size;
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

/// Configuration for [`HttpImagePreloader`](crate::HttpImagePreloader).
#[derive(Debug, Clone)]
pub struct PreloadConfig {
    /// Hard limit for an image to start loading.
    pub timeout: Duration,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
        }
    }
}

impl PreloadConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preload timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
