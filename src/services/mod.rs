pub mod catalog;
pub use catalog::AnilistCatalog;

pub mod completeness;
pub mod episode_pattern;

pub mod feed_browser;
pub use feed_browser::{FeedBrowser, FeedItem, FeedItemKind};

pub mod playback;
pub use playback::CodecExclusions;

pub mod providers;
pub use providers::{
    EpisodeMetadataProvider, FeedSource, FranchiseGraph, ProviderError, SeasonOffset,
    TitleResolver, VerifiedIdSource,
};

pub mod resolve_queue;
pub use resolve_queue::{PendingRelease, ResolveQueue};

pub mod resolver;
pub use resolver::ReleaseResolver;

pub mod titles;

pub mod verified;
pub use verified::{IndexState, VerifiedIndex};
