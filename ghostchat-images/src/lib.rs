//! # ghostchat-images
//!
//! Turns a free-text image request into a verified, loadable image.
//!
//! The [`ImageResolver`] runs an ordered list of [`ResolverStage`]s against an
//! [`EncyclopediaSource`] (Wikipedia by default):
//!
//! 1. Summary lookup by the query
//! 2. Search, then summary lookup of the found title
//! 3. Page image by the query as a title
//! 4. Page image by the search title
//! 5. Page image through a search generator
//!
//! Every candidate URL is checked by an [`ImagePreloader`] with a hard
//! timeout before it is accepted. Failed lookups and unverifiable candidates
//! only move the chain to the next stage.
//!
//! [`ImageBackfill`] connects the resolver to rendered documents: it fills the
//! pending image fragments produced by `ghostchat-render`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use ghostchat_images::{ImageBackfill, ImageResolver};
//! use ghostchat_render::Renderer;
//!
//! let renderer = Renderer::default();
//! let mut doc = renderer.render(r#"[tool:show_image query="girafe"]"#);
//!
//! let resolver = ImageResolver::default();
//! let mut backfill = ImageBackfill::new();
//! backfill.fill(&mut doc, &resolver).await;
//! println!("{}", doc.to_html());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod backfill;
pub mod config;
pub mod error;
pub mod preload;
pub mod resolver;
pub mod result;
pub mod stage;
pub mod wikipedia;

pub use backfill::{BackfillState, ImageBackfill};
pub use config::{PreloadConfig, WikipediaConfig};
pub use error::{ImageError, ImageResult};
pub use preload::{HttpImagePreloader, ImagePreloader};
pub use resolver::ImageResolver;
pub use result::{shorten_text, ImageResolutionResult};
pub use stage::{
    default_stages, DirectSummary, PageImageBySearch, PageImageBySearchTitle, PageImageByTitle,
    ResolverStage, SearchThenSummary, StageContext,
};
pub use wikipedia::{ArticleSummary, EncyclopediaSource, PageImage, WikipediaClient};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        EncyclopediaSource, ImageBackfill, ImageError, ImageResolutionResult, ImageResolver,
        ImageResult, ImagePreloader,
    };
}
