//! Renderer configuration.

/// Origin used to resolve relative URLs when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://localhost/";

/// Default image synthesis endpoint.
pub const DEFAULT_IMAGE_SYNTHESIS_BASE: &str = "https://image.pollinations.ai";

/// Configuration for [`Renderer`](crate::Renderer).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Page origin relative URLs are resolved against.
    pub base_url: String,
    /// Base of the image synthesis endpoint used by `generate_image`.
    pub image_synthesis_base: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            image_synthesis_base: DEFAULT_IMAGE_SYNTHESIS_BASE.to_string(),
        }
    }
}

impl RenderConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page origin.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the image synthesis endpoint.
    #[must_use]
    pub fn image_synthesis_base(mut self, url: impl Into<String>) -> Self {
        self.image_synthesis_base = url.into();
        self
    }

    /// URL of a synthesized image for `prompt`.
    pub fn synthesis_url(&self, prompt: &str) -> String {
        format!(
            "{}/prompt/{}?nologo=true",
            self.image_synthesis_base.trim_end_matches('/'),
            urlencoding::encode(prompt)
        )
    }
}
