//! Filling pending image fragments with resolved images.
//!
//! A rendered [`Document`] may contain pending images that only carry a
//! query. [`ImageBackfill`] tracks, per [`PendingImageId`], whether a
//! resolution was already requested so that an image is never resolved
//! twice, even when the same document is rendered and back-filled again.

use crate::error::ImageResult;
use crate::resolver::ImageResolver;
use crate::result::ImageResolutionResult;
use futures::future::join_all;
use ghostchat_render::{Document, PendingImage, PendingImageId};
use std::collections::HashMap;
use tracing::debug;

/// Resolution state of a pending image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackfillState {
    /// Resolution started.
    Requested,
    /// Resolution succeeded.
    Resolved(ImageResolutionResult),
    /// Resolution failed; the alt text is used as caption.
    Failed,
}

/// Bookkeeping for pending image resolution.
#[derive(Debug, Default)]
pub struct ImageBackfill {
    states: HashMap<PendingImageId, BackfillState>,
}

impl ImageBackfill {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a pending image.
    pub fn state(&self, id: PendingImageId) -> Option<&BackfillState> {
        self.states.get(&id)
    }

    /// Pending images of `doc` that were never requested, now marked requested.
    pub fn claim(&mut self, doc: &Document) -> Vec<PendingImage> {
        let mut claimed = Vec::new();
        for pending in doc.pending_images() {
            if self.states.contains_key(&pending.id) {
                continue;
            }
            self.states.insert(pending.id, BackfillState::Requested);
            claimed.push(pending.clone());
        }
        claimed
    }

    /// Record an outcome and fill the matching fragment of `doc`.
    ///
    /// On success the caption is the description, else the title, else the
    /// alt text. On failure only the alt text is shown.
    pub fn apply(
        &mut self,
        doc: &mut Document,
        id: PendingImageId,
        outcome: ImageResult<ImageResolutionResult>,
    ) {
        match outcome {
            Ok(result) => {
                let alt = doc
                    .pending_image(id)
                    .map(|image| image.alt.clone())
                    .unwrap_or_default();
                doc.resolve_image(id, &result.url, result.caption(&alt));
                self.states.insert(id, BackfillState::Resolved(result));
            }
            Err(e) => {
                debug!(id = %id, error = %e, "Image back-fill failed");
                doc.fail_image(id);
                self.states.insert(id, BackfillState::Failed);
            }
        }
    }

    /// Resolve every unclaimed pending image of `doc` and fill it in.
    ///
    /// Resolutions run concurrently. Returns the number of images processed.
    pub async fn fill(&mut self, doc: &mut Document, resolver: &ImageResolver) -> usize {
        let claimed = self.claim(doc);
        let outcomes = join_all(claimed.iter().map(|pending| resolver.resolve(&pending.query))).await;

        for (pending, outcome) in claimed.iter().zip(outcomes) {
            self.apply(doc, pending.id, outcome);
        }
        claimed.len()
    }
}
