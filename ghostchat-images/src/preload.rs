//! Preload verification of candidate image URLs.

use crate::config::PreloadConfig;
use crate::error::{ImageError, ImageResult};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

/// Checks that a URL actually serves a loadable image.
#[async_trait]
pub trait ImagePreloader: Send + Sync {
    /// Succeed once the image starts loading.
    async fn preload(&self, url: &str) -> ImageResult<()>;
}

/// Preloader that fetches the image over HTTP.
///
/// Success means a 2xx response with an `image/*` content type whose first
/// body chunk arrived before the timeout.
#[derive(Debug, Clone, Default)]
pub struct HttpImagePreloader {
    client: Client,
    config: PreloadConfig,
}

impl HttpImagePreloader {
    /// Create a preloader.
    pub fn new(config: PreloadConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Use a custom HTTP client.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn fetch_first_chunk(&self, url: &str) -> ImageResult<()> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::preload_failed(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::preload_failed(url, format!("HTTP {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !content_type.starts_with("image/") {
            return Err(ImageError::NotAnImage {
                url: url.to_string(),
                content_type,
            });
        }

        match response.chunk().await {
            Ok(Some(chunk)) if !chunk.is_empty() => Ok(()),
            Ok(_) => Err(ImageError::preload_failed(url, "empty body")),
            Err(e) => Err(ImageError::preload_failed(url, e.to_string())),
        }
    }
}

#[async_trait]
impl ImagePreloader for HttpImagePreloader {
    async fn preload(&self, url: &str) -> ImageResult<()> {
        debug!(url = %url, timeout_ms = self.config.timeout.as_millis() as u64, "Preloading image");
        match tokio::time::timeout(self.config.timeout, self.fetch_first_chunk(url)).await {
            Ok(result) => result,
            Err(_) => Err(ImageError::PreloadTimeout {
                url: url.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_image_loads() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/cat.png",
            ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"),
        )
        .await;

        let preloader = HttpImagePreloader::default();
        assert!(preloader.preload(&format!("{}/cat.png", server.uri())).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejections() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/page.html",
            ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
        )
        .await;
        serve(&server, "/gone.png", ResponseTemplate::new(404)).await;
        serve(
            &server,
            "/empty.png",
            ResponseTemplate::new(200).set_body_raw(Vec::<u8>::new(), "image/png"),
        )
        .await;

        let preloader = HttpImagePreloader::default();
        let uri = server.uri();
        assert!(matches!(
            preloader.preload(&format!("{uri}/page.html")).await,
            Err(ImageError::NotAnImage { .. })
        ));
        assert!(matches!(
            preloader.preload(&format!("{uri}/gone.png")).await,
            Err(ImageError::PreloadFailed { .. })
        ));
        assert!(matches!(
            preloader.preload(&format!("{uri}/empty.png")).await,
            Err(ImageError::PreloadFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_timeout() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/slow.png",
            ResponseTemplate::new(200)
                .set_body_raw(vec![1, 2, 3], "image/png")
                .set_delay(Duration::from_secs(5)),
        )
        .await;

        let preloader =
            HttpImagePreloader::new(PreloadConfig::new().timeout(Duration::from_millis(100)));
        let result = preloader.preload(&format!("{}/slow.png", server.uri())).await;
        assert!(matches!(result, Err(ImageError::PreloadTimeout { .. })));
    }
}
