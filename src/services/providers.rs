//! Collaborator seams of the resolution engine.
//!
//! The resolver and the feed browser only talk to these traits. Production
//! wiring plugs in [`crate::clients::nyaa::NyaaClient`] and
//! [`crate::services::catalog::AnilistCatalog`]; tests plug in in-memory fakes.

use crate::clients::nyaa::FeedError;
use crate::clients::sneedex::SourceError;
use crate::domain::{Media, MediaId};
use crate::models::episode::{EpisodeMetadata, MediaMatch};
use crate::models::release::FeedDocument;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Media not found: {0}")]
    NotFound(MediaId),

    /// The title-to-media resolver produced no usable candidate.
    #[error("No media matches '{0}'")]
    Unresolved(String),

    #[error("Provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Provider returned errors: {0}")]
    Graphql(String),
}

/// Absolute numbering for a later season: how many episodes the prequels
/// span and which entry releasers file the franchise under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonOffset {
    pub offset: u32,
    pub root: Media,
}

/// Fetches and parses a release feed.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<FeedDocument, FeedError>;
}

/// Franchise graph: full media records and season offsets.
#[async_trait::async_trait]
pub trait FranchiseGraph: Send + Sync {
    async fn media(&self, id: MediaId) -> Result<Media, ProviderError>;

    /// `None` when the media has no multi-season ancestry. With `force`
    /// the offset is computed even when `episode` fits the media itself.
    async fn resolve_season(
        &self,
        media: &Media,
        episode: u32,
        force: bool,
    ) -> Result<Option<SeasonOffset>, ProviderError>;
}

/// Free text to ranked media candidates, best first.
#[async_trait::async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve_title(&self, text: &str) -> Result<Vec<MediaMatch>, ProviderError>;
}

#[async_trait::async_trait]
pub trait EpisodeMetadataProvider: Send + Sync {
    async fn episodes(&self, media: &Media) -> Result<Vec<EpisodeMetadata>, ProviderError>;
}

/// Curated list of community-preferred release ids.
#[async_trait::async_trait]
pub trait VerifiedIdSource: Send + Sync {
    async fn fetch_ids(&self) -> Result<Vec<u64>, SourceError>;
}
