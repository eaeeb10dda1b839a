//! The image resolution driver.

use crate::config::{PreloadConfig, WikipediaConfig};
use crate::error::{ImageError, ImageResult};
use crate::preload::{HttpImagePreloader, ImagePreloader};
use crate::result::ImageResolutionResult;
use crate::stage::{default_stages, ResolverStage, StageContext};
use crate::wikipedia::{EncyclopediaSource, WikipediaClient};
use ghostchat_render::normalize_image_query;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves free-text queries into verified images.
///
/// Stages run in order; each candidate must pass preload verification before
/// it is accepted. A candidate that fails verification is discarded and the
/// next stage runs.
pub struct ImageResolver {
    source: Arc<dyn EncyclopediaSource>,
    preloader: Arc<dyn ImagePreloader>,
    stages: Vec<Box<dyn ResolverStage>>,
}

impl std::fmt::Debug for ImageResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stages: Vec<_> = self.stages.iter().map(|stage| stage.name()).collect();
        f.debug_struct("ImageResolver")
            .field("stages", &stages)
            .finish()
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::wikipedia(WikipediaConfig::default(), PreloadConfig::default())
    }
}

impl ImageResolver {
    /// Create a resolver with the default stage order.
    pub fn new(
        source: Arc<dyn EncyclopediaSource>,
        preloader: Arc<dyn ImagePreloader>,
    ) -> Self {
        Self {
            source,
            preloader,
            stages: default_stages(),
        }
    }

    /// Resolver backed by Wikipedia and HTTP preloading.
    pub fn wikipedia(wiki: WikipediaConfig, preload: PreloadConfig) -> Self {
        Self::new(
            Arc::new(WikipediaClient::new(wiki)),
            Arc::new(HttpImagePreloader::new(preload)),
        )
    }

    /// Replace the stage list.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<Box<dyn ResolverStage>>) -> Self {
        self.stages = stages;
        self
    }

    /// Stage names in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Resolve `query` into the first verified image.
    pub async fn resolve(&self, query: &str) -> ImageResult<ImageResolutionResult> {
        let query = normalize_image_query(query);
        if query.is_empty() {
            return Err(ImageError::EmptyQuery);
        }

        let mut ctx = StageContext::new(&query, self.source.as_ref());
        for stage in &self.stages {
            let Some(candidate) = stage.candidate(&mut ctx).await else {
                debug!(stage = stage.name(), query = %query, "No candidate");
                continue;
            };

            match self.preloader.preload(&candidate.url).await {
                Ok(()) => {
                    debug!(stage = stage.name(), url = %candidate.url, "Image resolved");
                    return Ok(candidate);
                }
                Err(e) => {
                    debug!(
                        stage = stage.name(),
                        url = %candidate.url,
                        error = %e,
                        "Discarding unverifiable candidate"
                    );
                }
            }
        }

        warn!(query = %query, "Image resolution exhausted");
        Err(ImageError::Exhausted { query })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wikipedia::{ArticleSummary, PageImage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::{HashMap, HashSet};

    /// Scripted encyclopedia recording every call.
    #[derive(Default)]
    struct FakeSource {
        summaries: HashMap<String, ArticleSummary>,
        search: HashMap<String, String>,
        page_images: HashMap<String, PageImage>,
        search_images: HashMap<String, PageImage>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSource {
        fn summary(mut self, title: &str, url: &str, description: &str) -> Self {
            self.summaries.insert(
                title.into(),
                ArticleSummary {
                    title: Some(title.into()),
                    description: description.into(),
                    image_url: (!url.is_empty()).then(|| url.into()),
                },
            );
            self
        }

        fn search(mut self, query: &str, title: &str) -> Self {
            self.search.insert(query.into(), title.into());
            self
        }

        fn page_image(mut self, title: &str, url: &str) -> Self {
            self.page_images.insert(
                title.into(),
                PageImage {
                    url: url.into(),
                    title: Some(title.into()),
                },
            );
            self
        }

        fn search_image(mut self, query: &str, title: &str, url: &str) -> Self {
            self.search_images.insert(
                query.into(),
                PageImage {
                    url: url.into(),
                    title: Some(title.into()),
                },
            );
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl EncyclopediaSource for FakeSource {
        async fn summary(&self, title: &str) -> Option<ArticleSummary> {
            self.calls.lock().push(format!("summary:{title}"));
            self.summaries.get(title).cloned()
        }

        async fn search_title(&self, query: &str) -> Option<String> {
            self.calls.lock().push(format!("search:{query}"));
            self.search.get(query).cloned()
        }

        async fn page_image_by_title(&self, title: &str) -> Option<PageImage> {
            self.calls.lock().push(format!("page_image:{title}"));
            self.page_images.get(title).cloned()
        }

        async fn page_image_by_search(&self, query: &str) -> Option<PageImage> {
            self.calls.lock().push(format!("search_image:{query}"));
            self.search_images.get(query).cloned()
        }
    }

    /// Preloader that only accepts listed URLs.
    #[derive(Default)]
    struct FakePreloader {
        loadable: HashSet<String>,
        attempts: Mutex<Vec<String>>,
    }

    impl FakePreloader {
        fn accepting(urls: &[&str]) -> Self {
            Self {
                loadable: urls.iter().map(|u| u.to_string()).collect(),
                attempts: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl ImagePreloader for FakePreloader {
        async fn preload(&self, url: &str) -> ImageResult<()> {
            self.attempts.lock().push(url.to_string());
            if self.loadable.contains(url) {
                Ok(())
            } else {
                Err(ImageError::PreloadTimeout { url: url.into() })
            }
        }
    }

    fn resolver(source: FakeSource, preloader: FakePreloader) -> (ImageResolver, Arc<FakeSource>, Arc<FakePreloader>) {
        let source = Arc::new(source);
        let preloader = Arc::new(preloader);
        let resolver = ImageResolver::new(source.clone(), preloader.clone());
        (resolver, source, preloader)
    }

    #[tokio::test]
    async fn test_unverifiable_first_stage_falls_through() {
        let source = FakeSource::default()
            .summary("giraffe", "https://img/broken.jpg", "first")
            .search("giraffe", "Girafe")
            .summary("Girafe", "https://img/girafe.jpg", "Mammifère d'Afrique");
        let preloader = FakePreloader::accepting(&["https://img/girafe.jpg"]);
        let (resolver, _, preloader) = resolver(source, preloader);

        let result = resolver.resolve("giraffe").await.unwrap();
        assert_eq!(
            result,
            ImageResolutionResult {
                url: "https://img/girafe.jpg".into(),
                description: "Mammifère d'Afrique".into(),
                title: "Girafe".into(),
            }
        );
        assert_eq!(
            *preloader.attempts.lock(),
            vec!["https://img/broken.jpg", "https://img/girafe.jpg"]
        );
    }

    #[tokio::test]
    async fn test_direct_summary_wins() {
        let source = FakeSource::default().summary("Lyon", "https://img/lyon.jpg", "Ville");
        let (resolver, source, _) =
            resolver(source, FakePreloader::accepting(&["https://img/lyon.jpg"]));

        let result = resolver.resolve("Lyon").await.unwrap();
        assert_eq!(result.url, "https://img/lyon.jpg");
        assert_eq!(source.calls(), vec!["summary:Lyon"]);
    }

    #[tokio::test]
    async fn test_page_image_stages_in_order() {
        let source = FakeSource::default()
            .search("chat roux", "Chat")
            .summary("Chat", "", "Félin domestique")
            .page_image("Chat", "https://img/chat.jpg");
        let (resolver, source, _) =
            resolver(source, FakePreloader::accepting(&["https://img/chat.jpg"]));

        let result = resolver.resolve("chat roux").await.unwrap();
        assert_eq!(result.title, "Chat");
        assert_eq!(result.description, "Félin domestique");
        assert_eq!(
            source.calls(),
            vec![
                "summary:chat roux",
                "search:chat roux",
                "summary:Chat",
                "page_image:chat roux",
                "page_image:Chat",
                "summary:Chat",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_generator_is_last_resort() {
        let source = FakeSource::default().search_image("volcan", "Volcan", "https://img/volcan.jpg");
        let (resolver, _, _) =
            resolver(source, FakePreloader::accepting(&["https://img/volcan.jpg"]));

        let result = resolver.resolve("volcan").await.unwrap();
        assert_eq!(result.title, "Volcan");
        assert_eq!(result.description, "");
    }

    #[tokio::test]
    async fn test_exhausted() {
        let source = FakeSource::default().summary("x", "https://img/x.jpg", "");
        let (resolver, _, preloader) = resolver(source, FakePreloader::default());

        let err = resolver.resolve("  x ").await.unwrap_err();
        assert!(matches!(err, ImageError::Exhausted { ref query } if query == "x"));
        assert_eq!(preloader.attempts.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_query() {
        let (resolver, source, _) = resolver(FakeSource::default(), FakePreloader::default());
        assert!(matches!(resolver.resolve("   ").await, Err(ImageError::EmptyQuery)));
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_article_url_query_is_normalized() {
        let source = FakeSource::default().summary("Tour Eiffel", "https://img/te.jpg", "");
        let (resolver, source, _) =
            resolver(source, FakePreloader::accepting(&["https://img/te.jpg"]));

        let result = resolver
            .resolve("https://fr.wikipedia.org/wiki/Tour_Eiffel")
            .await
            .unwrap();
        assert_eq!(result.title, "Tour Eiffel");
        assert_eq!(source.calls()[0], "summary:Tour Eiffel");
    }

    #[test]
    fn test_custom_stages() {
        let (resolver, _, _) = resolver(FakeSource::default(), FakePreloader::default());
        let resolver = resolver.with_stages(vec![Box::new(crate::stage::PageImageBySearch)]);
        assert_eq!(resolver.stage_names(), vec!["page_image_by_search"]);
    }
}
