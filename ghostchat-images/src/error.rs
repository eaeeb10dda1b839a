//! Image resolution errors.

use ghostchat_retries::NetworkError;
use thiserror::Error;

/// Errors from image lookup and preload verification.
#[derive(Debug, Error)]
pub enum ImageError {
    /// The query was empty after normalization.
    #[error("Empty image query")]
    EmptyQuery,

    /// The image did not start loading in time.
    #[error("Image load timeout: {url}")]
    PreloadTimeout {
        /// Candidate URL.
        url: String,
    },

    /// The image request failed.
    #[error("Image failed to load: {url}: {reason}")]
    PreloadFailed {
        /// Candidate URL.
        url: String,
        /// Failure detail.
        reason: String,
    },

    /// The URL does not serve an image.
    #[error("Not an image ({content_type}): {url}")]
    NotAnImage {
        /// Candidate URL.
        url: String,
        /// Reported content type.
        content_type: String,
    },

    /// Every resolver stage failed.
    #[error("No image found for '{query}'")]
    Exhausted {
        /// The normalized query.
        query: String,
    },

    /// Network failure.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

impl ImageError {
    /// Create a preload failure.
    pub fn preload_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PreloadFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for image operations.
pub type ImageResult<T> = std::result::Result<T, ImageError>;
