//! Resolver stages.
//!
//! Each stage turns the query into at most one candidate image. Stages never
//! fail: a lookup that errors is simply a stage without a candidate.

use crate::result::ImageResolutionResult;
use crate::wikipedia::{EncyclopediaSource, PageImage};
use async_trait::async_trait;
use tracing::debug;

/// Shared state for one resolution run.
pub struct StageContext<'a> {
    query: &'a str,
    source: &'a dyn EncyclopediaSource,
    search_title: Option<Option<String>>,
}

impl<'a> StageContext<'a> {
    /// Create a context for a normalized query.
    pub fn new(query: &'a str, source: &'a dyn EncyclopediaSource) -> Self {
        Self {
            query,
            source,
            search_title: None,
        }
    }

    /// The normalized query.
    pub fn query(&self) -> &'a str {
        self.query
    }

    /// The encyclopedia being queried.
    pub fn source(&self) -> &'a dyn EncyclopediaSource {
        self.source
    }

    /// Best search title for the query, if it differs from the query.
    ///
    /// The search runs at most once per context.
    pub async fn distinct_search_title(&mut self) -> Option<String> {
        if self.search_title.is_none() {
            let title = self.source.search_title(self.query).await;
            debug!(query = %self.query, title = ?title, "Search title");
            self.search_title = Some(title);
        }
        self.search_title
            .clone()
            .flatten()
            .filter(|title| title != self.query)
    }
}

/// One step of the image resolution chain.
#[async_trait]
pub trait ResolverStage: Send + Sync {
    /// Stage name for logs.
    fn name(&self) -> &'static str;

    /// Produce a candidate image, if any.
    async fn candidate(&self, ctx: &mut StageContext<'_>) -> Option<ImageResolutionResult>;
}

async fn from_summary(
    source: &dyn EncyclopediaSource,
    title: &str,
) -> Option<ImageResolutionResult> {
    let summary = source.summary(title).await?;
    let url = summary.image_url?;
    Some(ImageResolutionResult {
        url,
        description: summary.description,
        title: summary.title.unwrap_or_else(|| title.to_string()),
    })
}

async fn from_page_image(
    source: &dyn EncyclopediaSource,
    image: Option<PageImage>,
    fallback_title: &str,
) -> Option<ImageResolutionResult> {
    let image = image?;
    let title = image.title.unwrap_or_else(|| fallback_title.to_string());
    let description = source.description(&title).await;
    Some(ImageResolutionResult {
        url: image.url,
        description,
        title,
    })
}

/// Summary lookup by the query itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSummary;

#[async_trait]
impl ResolverStage for DirectSummary {
    fn name(&self) -> &'static str {
        "direct_summary"
    }

    async fn candidate(&self, ctx: &mut StageContext<'_>) -> Option<ImageResolutionResult> {
        from_summary(ctx.source(), ctx.query()).await
    }
}

/// Full-text search, then summary lookup of the found title.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchThenSummary;

#[async_trait]
impl ResolverStage for SearchThenSummary {
    fn name(&self) -> &'static str {
        "search_then_summary"
    }

    async fn candidate(&self, ctx: &mut StageContext<'_>) -> Option<ImageResolutionResult> {
        let title = ctx.distinct_search_title().await?;
        from_summary(ctx.source(), &title).await
    }
}

/// Page image of the article named by the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageImageByTitle;

#[async_trait]
impl ResolverStage for PageImageByTitle {
    fn name(&self) -> &'static str {
        "page_image_by_title"
    }

    async fn candidate(&self, ctx: &mut StageContext<'_>) -> Option<ImageResolutionResult> {
        let image = ctx.source().page_image_by_title(ctx.query()).await;
        from_page_image(ctx.source(), image, ctx.query()).await
    }
}

/// Page image of the article found by search, when distinct from the query.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageImageBySearchTitle;

#[async_trait]
impl ResolverStage for PageImageBySearchTitle {
    fn name(&self) -> &'static str {
        "page_image_by_search_title"
    }

    async fn candidate(&self, ctx: &mut StageContext<'_>) -> Option<ImageResolutionResult> {
        let title = ctx.distinct_search_title().await?;
        let image = ctx.source().page_image_by_title(&title).await;
        from_page_image(ctx.source(), image, &title).await
    }
}

/// Page image through a search generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageImageBySearch;

#[async_trait]
impl ResolverStage for PageImageBySearch {
    fn name(&self) -> &'static str {
        "page_image_by_search"
    }

    async fn candidate(&self, ctx: &mut StageContext<'_>) -> Option<ImageResolutionResult> {
        let image = ctx.source().page_image_by_search(ctx.query()).await;
        from_page_image(ctx.source(), image, ctx.query()).await
    }
}

/// The stages in resolution order.
pub fn default_stages() -> Vec<Box<dyn ResolverStage>> {
    vec![
        Box::new(DirectSummary),
        Box::new(SearchThenSummary),
        Box::new(PageImageByTitle),
        Box::new(PageImageBySearchTitle),
        Box::new(PageImageBySearch),
    ]
}
