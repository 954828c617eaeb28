use async_trait::async_trait;

use crate::{error::ResolutionFailure, models::OriginalDocument};

/// Turns a url into plain text. Collaborator of the candidate resolver.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extracted text of `url`. An empty or short text signals an unreadable page.
    async fn extract(&self, url: &str) -> Result<String, ResolutionFailure>;
}

/// Produces the original documents to track.
///
/// Returns an empty list, not an error, when nothing is found.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn documents(&self) -> Vec<OriginalDocument>;
}

pub mod blog;
pub mod html;

pub use blog::{BlogIndex, ManualQuery, SingleDocument};
pub use html::HtmlExtractor;
