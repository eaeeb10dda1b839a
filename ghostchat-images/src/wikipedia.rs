//! Encyclopedia lookups backed by the MediaWiki APIs.
//!
//! Every lookup is best effort: HTTP failures and malformed payloads are
//! logged and reported as "no result" so the resolver can move on.

use crate::config::WikipediaConfig;
use crate::result::{shorten_text, MAX_DESCRIPTION_CHARS};
use async_trait::async_trait;
use ghostchat_render::UrlSanitizer;
use ghostchat_retries::RetryClient;
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Summary of an article.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleSummary {
    /// Canonical title, when reported.
    pub title: Option<String>,
    /// Shortened description or extract.
    pub description: String,
    /// Sanitized lead image URL.
    pub image_url: Option<String>,
}

/// Lead image of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// Sanitized image URL.
    pub url: String,
    /// Title of the page the image belongs to.
    pub title: Option<String>,
}

/// Source of article summaries, searches and page images.
#[async_trait]
pub trait EncyclopediaSource: Send + Sync {
    /// Summary of the article titled `title`.
    async fn summary(&self, title: &str) -> Option<ArticleSummary>;

    /// Best matching article title for a full-text search.
    async fn search_title(&self, query: &str) -> Option<String>;

    /// Lead image of the article titled `title`.
    async fn page_image_by_title(&self, title: &str) -> Option<PageImage>;

    /// Lead image of the best full-text search hit.
    async fn page_image_by_search(&self, query: &str) -> Option<PageImage>;

    /// Short description of an article, empty when unavailable.
    async fn description(&self, title: &str) -> String {
        self.summary(title)
            .await
            .map(|summary| summary.description)
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    title: Option<String>,
    description: Option<String>,
    extract: Option<String>,
    thumbnail: Option<ImageRef>,
    originalimage: Option<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    source: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PageImagesResponse {
    query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    pages: Option<Pages>,
}

/// `pages` is keyed by page id in format version 1 and a list in version 2.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Pages {
    List(Vec<Page>),
    Map(IndexMap<String, Page>),
}

impl Pages {
    fn into_vec(self) -> Vec<Page> {
        match self {
            Self::List(pages) => pages,
            Self::Map(pages) => pages.into_values().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Page {
    title: Option<String>,
    #[serde(default)]
    missing: Option<serde::de::IgnoredAny>,
    thumbnail: Option<ImageRef>,
    original: Option<ImageRef>,
}

/// MediaWiki client.
#[derive(Debug, Clone)]
pub struct WikipediaClient {
    http: RetryClient,
    config: WikipediaConfig,
    sanitizer: UrlSanitizer,
}

impl Default for WikipediaClient {
    fn default() -> Self {
        Self::new(WikipediaConfig::default())
    }
}

impl WikipediaClient {
    /// Create a client.
    pub fn new(config: WikipediaConfig) -> Self {
        let http = RetryClient::with_timeout(config.retry.clone(), config.timeout);
        Self {
            http,
            config,
            sanitizer: UrlSanitizer::absolute_only(),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &WikipediaConfig {
        &self.config
    }

    fn origin(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn api_url(&self, params: &[(&str, &str)]) -> Option<Url> {
        let base = format!("{}/w/api.php", self.origin());
        match Url::parse_with_params(&base, params) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(base = %base, error = %e, "Invalid wiki API URL");
                None
            }
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        match self.http.get_json(url).await {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(url = %url, error = %e, "Wiki lookup failed");
                None
            }
        }
    }

    fn image_url(&self, primary: Option<ImageRef>, fallback: Option<ImageRef>) -> Option<String> {
        let raw = primary
            .map(|image| image.source)
            .filter(|source| !source.is_empty())
            .or_else(|| fallback.map(|image| image.source))?;
        self.sanitizer.sanitize(&raw)
    }

    async fn page_image(&self, url: Option<Url>) -> Option<PageImage> {
        let data: PageImagesResponse = self.fetch(url?.as_str()).await?;
        let pages = data.query?.pages?.into_vec();

        pages.into_iter().filter(|page| page.missing.is_none()).find_map(|page| {
            let url = self.image_url(page.thumbnail, page.original)?;
            Some(PageImage {
                url,
                title: page.title.filter(|title| !title.is_empty()),
            })
        })
    }
}

#[async_trait]
impl EncyclopediaSource for WikipediaClient {
    async fn summary(&self, title: &str) -> Option<ArticleSummary> {
        let url = format!(
            "{}/api/rest_v1/page/summary/{}",
            self.origin(),
            urlencoding::encode(title)
        );
        let data: SummaryResponse = self.fetch(&url).await?;

        let raw_description = data
            .description
            .filter(|d| !d.trim().is_empty())
            .or(data.extract)
            .unwrap_or_default();

        Some(ArticleSummary {
            title: data.title.filter(|t| !t.is_empty()),
            description: shorten_text(&raw_description, MAX_DESCRIPTION_CHARS),
            image_url: self.image_url(data.thumbnail, data.originalimage),
        })
    }

    async fn search_title(&self, query: &str) -> Option<String> {
        let url = self.api_url(&[
            ("action", "query"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", "1"),
            ("format", "json"),
            ("origin", "*"),
        ])?;
        let data: SearchResponse = self.fetch(url.as_str()).await?;
        data.query?
            .search
            .into_iter()
            .next()
            .map(|hit| hit.title)
            .filter(|title| !title.is_empty())
    }

    async fn page_image_by_title(&self, title: &str) -> Option<PageImage> {
        let size = self.config.thumbnail_size.to_string();
        let url = self.api_url(&[
            ("action", "query"),
            ("titles", title),
            ("prop", "pageimages"),
            ("piprop", "thumbnail|original"),
            ("pithumbsize", &size),
            ("format", "json"),
            ("origin", "*"),
            ("redirects", "1"),
        ]);
        self.page_image(url).await
    }

    async fn page_image_by_search(&self, query: &str) -> Option<PageImage> {
        let size = self.config.thumbnail_size.to_string();
        let url = self.api_url(&[
            ("action", "query"),
            ("generator", "search"),
            ("gsrsearch", query),
            ("gsrlimit", "1"),
            ("prop", "pageimages"),
            ("piprop", "thumbnail|original"),
            ("pithumbsize", &size),
            ("format", "json"),
            ("origin", "*"),
        ]);
        self.page_image(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghostchat_retries::RetryPolicy;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> WikipediaClient {
        WikipediaClient::new(
            WikipediaConfig::new()
                .base_url(server.uri())
                .retry(RetryPolicy::no_retry()),
        )
    }

    #[tokio::test]
    async fn test_summary() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Girafe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Girafe",
                "description": "",
                "extract": "La girafe est une espèce de mammifères.",
                "thumbnail": {"source": "https://upload.wikimedia.org/girafe.jpg"}
            })))
            .mount(&server)
            .await;

        let summary = client(&server).summary("Girafe").await.unwrap();
        assert_eq!(
            summary,
            ArticleSummary {
                title: Some("Girafe".into()),
                description: "La girafe est une espèce de mammifères.".into(),
                image_url: Some("https://upload.wikimedia.org/girafe.jpg".into()),
            }
        );
    }

    #[tokio::test]
    async fn test_summary_rejects_unsafe_image_and_missing_article() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Bad"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Bad",
                "originalimage": {"source": "javascript:alert(1)"}
            })))
            .mount(&server)
            .await;

        let wiki = client(&server);
        let summary = wiki.summary("Bad").await.unwrap();
        assert_eq!(summary.image_url, None);
        assert_eq!(wiki.summary("Nope").await, None);
    }

    #[tokio::test]
    async fn test_search_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("list", "search"))
            .and(query_param("srsearch", "tour eiffel"))
            .and(query_param("srlimit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"search": [{"title": "Tour Eiffel"}, {"title": "Gustave Eiffel"}]}
            })))
            .mount(&server)
            .await;

        let title = client(&server).search_title("tour eiffel").await;
        assert_eq!(title.as_deref(), Some("Tour Eiffel"));
    }

    #[tokio::test]
    async fn test_page_image_by_title_map_form() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("titles", "Lyon"))
            .and(query_param("prop", "pageimages"))
            .and(query_param("pithumbsize", "800"))
            .and(query_param("redirects", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": {
                    "-1": {"title": "Lyon (homonymie)", "missing": ""},
                    "2140": {"title": "Lyon", "original": {"source": "https://upload.wikimedia.org/lyon.jpg"}}
                }}
            })))
            .mount(&server)
            .await;

        let image = client(&server).page_image_by_title("Lyon").await.unwrap();
        assert_eq!(image.url, "https://upload.wikimedia.org/lyon.jpg");
        assert_eq!(image.title.as_deref(), Some("Lyon"));
    }

    #[tokio::test]
    async fn test_page_image_by_search_list_form() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .and(query_param("generator", "search"))
            .and(query_param("gsrsearch", "mont blanc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "query": {"pages": [
                    {"title": "Sans image"},
                    {"title": "Mont Blanc", "thumbnail": {"source": "https://upload.wikimedia.org/mb.jpg"}}
                ]}
            })))
            .mount(&server)
            .await;

        let image = client(&server).page_image_by_search("mont blanc").await.unwrap();
        assert_eq!(image.title.as_deref(), Some("Mont Blanc"));
    }

    #[tokio::test]
    async fn test_failures_are_no_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/w/api.php"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/rest_v1/page/summary/Down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let wiki = client(&server);
        assert_eq!(wiki.search_title("x").await, None);
        assert_eq!(wiki.page_image_by_title("x").await, None);
        assert_eq!(wiki.summary("Down").await, None);
        assert_eq!(wiki.description("Down").await, "");
    }
}
