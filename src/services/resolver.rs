//! Release resolution for one `(media, episode)` pair.
//!
//! A call builds a feed query from the media's titles, an episode or batch
//! clause, the quality token and the codec exclusions, then widens or narrows
//! the result through the franchise graph:
//!
//! - later seasons also search the first season's titles with the absolute
//!   episode number,
//! - entries outside the media's airing window (relative to the prequel's end
//!   and the sequel's start) are dropped,
//! - entries that also answer the sequel's query belong to the sequel,
//! - finished seasons pull in pure batch releases,
//! - an empty result is retried once without the quality token.
//!
//! Every recursive step runs on a fresh [`QueryContext`] and is awaited before
//! the parent continues. A failed fetch never fails the call: its branch is
//! empty and a [`NotificationEvent::SearchFailed`] goes out on the event bus.

use crate::clients::nyaa::{FeedError, search_url};
use crate::config::Config;
use crate::constants::dates::MONTH_JITTER_MS;
use crate::constants::limits::MAX_RESOLVE_DEPTH;
use crate::domain::events::NotificationEvent;
use crate::domain::{Media, MediaFormat, MediaStatus};
use crate::models::query::{QueryContext, QueryMode};
use crate::models::release::ReleaseEntry;
use crate::services::episode_pattern::{batch_clause, encodes_episode_number, episode_clause};
use crate::services::playback::CodecExclusions;
use crate::services::providers::{FeedSource, FranchiseGraph, SeasonOffset};
use crate::services::titles::{candidate_titles, title_clause};
use crate::services::verified::VerifiedIndex;
use chrono::{DateTime, Duration, Utc};
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

/// Snapshot of the settings a query needs, read at call time.
struct QuerySettings {
    base_url: String,
    quality: Option<String>,
}

pub struct ReleaseResolver {
    feeds: Arc<dyn FeedSource>,
    graph: Arc<dyn FranchiseGraph>,
    config: Arc<RwLock<Config>>,
    exclusions: CodecExclusions,
    verified: VerifiedIndex,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl ReleaseResolver {
    #[must_use]
    pub const fn new(
        feeds: Arc<dyn FeedSource>,
        graph: Arc<dyn FranchiseGraph>,
        config: Arc<RwLock<Config>>,
        exclusions: CodecExclusions,
        verified: VerifiedIndex,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            feeds,
            graph,
            config,
            exclusions,
            verified,
            event_bus,
        }
    }

    /// Full resolution of `episode` of `media`.
    pub async fn resolve(&self, media: impl Into<Arc<Media>>, episode: u32) -> Vec<ReleaseEntry> {
        self.resolve_with(QueryContext::new(media, episode)).await
    }

    /// Resolution with an explicit mode and quality setting.
    pub async fn resolve_with(&self, ctx: QueryContext) -> Vec<ReleaseEntry> {
        metrics::counter!("resolutions_total").increment(1);
        let media_id = ctx.media.id;
        let episode = ctx.episode;

        let entries = self.resolve_ctx(ctx).await;

        debug!(
            media_id = %media_id,
            episode,
            count = entries.len(),
            "Resolved release candidates"
        );
        entries
    }

    fn resolve_ctx(&self, ctx: QueryContext) -> BoxFuture<'_, Vec<ReleaseEntry>> {
        Box::pin(async move {
            let settings = self.settings().await;
            let media = Arc::clone(&ctx.media);

            let absolute = self.absolute_offset(&ctx).await;
            let absolute_episode = absolute
                .as_ref()
                .and_then(|a| ctx.episode.checked_add(a.offset));

            let mut episodes = vec![ctx.episode];
            if let Some(abs) = absolute_episode
                && abs < media.max_episode().unwrap_or(ctx.episode)
            {
                episodes.push(abs);
            }

            let quality = if ctx.ignore_quality {
                String::new()
            } else {
                settings
                    .quality
                    .as_deref()
                    .map(|q| format!("\"{q}\""))
                    .unwrap_or_default()
            };
            let exclusions = self.exclusions.clause();

            let episode_part = if media.is_single_episode() || ctx.mode == QueryMode::Batch {
                String::new()
            } else if let Some(total) = media.episodes.filter(|_| media.is_batch_eligible()) {
                batch_clause(total, ctx.episode)
            } else {
                episode_clause(&episodes)
            };

            let titles = title_clause(&candidate_titles(&media));
            let query = format!("{titles}{episode_part}{quality}{exclusions}");
            let mut entries = self.fetch_branch(&settings.base_url, &query).await;

            if let (Some(season), Some(abs)) = (&absolute, absolute_episode) {
                let root_titles = title_clause(&candidate_titles(&season.root));
                let query = format!(
                    "{root_titles}{}{quality}{exclusions}",
                    episode_clause(&[abs])
                );
                entries.extend(self.fetch_branch(&settings.base_url, &query).await);
            }

            if let Some(end) = prequel_window_end(&media) {
                entries.retain(|e| e.date.is_none_or(|d| d > end));
            }
            if let Some(start) = sequel_window_start(&media) {
                entries.retain(|e| e.date.is_none_or(|d| d < start));
            }

            let sequel_entries = self.sequel_entries(&ctx).await;
            if !sequel_entries.is_empty() {
                if ctx.mode == QueryMode::Check {
                    entries.extend(sequel_entries);
                } else {
                    let sequel_links: HashSet<&str> =
                        sequel_entries.iter().map(|e| e.link.as_str()).collect();
                    entries.retain(|e| !sequel_links.contains(e.link.as_str()));
                }
            }

            if ctx.mode == QueryMode::Full && media.is_batch_eligible() && can_recurse(&ctx) {
                let batches = self
                    .resolve_ctx(ctx.rerun(QueryMode::Batch, ctx.ignore_quality))
                    .await;
                entries.extend(
                    batches
                        .into_iter()
                        .filter(|e| !encodes_episode_number(&e.title)),
                );
            }

            if entries.is_empty()
                && !ctx.ignore_quality
                && ctx.mode == QueryMode::Full
                && can_recurse(&ctx)
            {
                debug!(media_id = %media.id, "No results, retrying without quality filter");
                entries = self.resolve_ctx(ctx.rerun(QueryMode::Full, true)).await;
            }

            let mut entries = dedupe_by_link(entries);
            self.verified.mark(&mut entries);
            entries
        })
    }

    async fn settings(&self) -> QuerySettings {
        let config = self.config.read().await;
        QuerySettings {
            base_url: config.feed.base_url.clone(),
            quality: config.quality_token().map(str::to_string),
        }
    }

    /// Season offset of a later season, looked up only for full resolutions.
    async fn absolute_offset(&self, ctx: &QueryContext) -> Option<SeasonOffset> {
        if ctx.mode != QueryMode::Full || ctx.media.prequel().is_none() {
            return None;
        }
        match self
            .graph
            .resolve_season(&ctx.media, ctx.episode, true)
            .await
        {
            Ok(offset) => offset,
            Err(e) => {
                warn!(media_id = %ctx.media.id, error = %e, "Season offset lookup failed");
                None
            }
        }
    }

    /// Results of the sequel's own resolution, empty when it has not aired.
    async fn sequel_entries(&self, ctx: &QueryContext) -> Vec<ReleaseEntry> {
        let Some(sequel) = ctx.media.sequel().filter(|s| s.status.has_aired()) else {
            return Vec::new();
        };
        if !can_recurse(ctx) {
            debug!(media_id = %ctx.media.id, depth = ctx.depth, "Sequel chain too deep, stopping");
            return Vec::new();
        }

        let sequel_media = match self.graph.media(sequel.id).await {
            Ok(media) => media,
            Err(e) => {
                warn!(sequel_id = %sequel.id, error = %e, "Failed to load sequel");
                return Vec::new();
            }
        };

        let mode = match ctx.mode {
            QueryMode::Full => QueryMode::Check,
            other => other,
        };
        self.resolve_ctx(ctx.for_related(sequel_media, mode)).await
    }

    async fn fetch_branch(&self, base_url: &str, query: &str) -> Vec<ReleaseEntry> {
        let result = match search_url(base_url, query) {
            Ok(url) => {
                debug!(url = %url, "Querying feed");
                self.feeds
                    .fetch(&url)
                    .await
                    .map(|doc| doc.items)
                    .map_err(|e| (url.to_string(), e))
            }
            Err(e) => Err((base_url.to_string(), e)),
        };

        result.unwrap_or_else(|(url, e)| {
            self.report_failure(&url, &e);
            Vec::new()
        })
    }

    fn report_failure(&self, url: &str, error: &FeedError) {
        warn!(event = "feed_fetch_failed", url = %url, error = %error, "Search failed");
        let _ = self.event_bus.send(NotificationEvent::SearchFailed {
            url: url.to_string(),
            status: error.status(),
            message: error.to_string(),
        });
    }
}

fn can_recurse(ctx: &QueryContext) -> bool {
    ctx.depth < MAX_RESOLVE_DEPTH
}

fn month() -> Duration {
    Duration::milliseconds(MONTH_JITTER_MS)
}

/// Entries must be newer than this: the finished prequel's end plus a month.
#[must_use]
pub fn prequel_window_end(media: &Media) -> Option<DateTime<Utc>> {
    if !media.status.has_aired() {
        return None;
    }
    let prequel = media
        .prequel()
        .filter(|p| p.status == MediaStatus::Finished)?;
    Some(prequel.end_date?.to_datetime()? + month())
}

/// Entries must be older than this: the aired sequel's start minus a month.
/// Only finished TV series are cut off; movies and specials overlap freely.
#[must_use]
pub fn sequel_window_start(media: &Media) -> Option<DateTime<Utc>> {
    if media.status != MediaStatus::Finished || media.format != MediaFormat::Tv {
        return None;
    }
    let sequel = media.sequel().filter(|s| s.status.has_aired())?;
    Some(sequel.start_date?.to_datetime()? - month())
}

/// Keeps the first entry for every link, in order.
#[must_use]
pub fn dedupe_by_link(entries: Vec<ReleaseEntry>) -> Vec<ReleaseEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.link.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FuzzyDate, MediaEdge, MediaId, MediaTitle, RelatedMedia, RelationKind};
    use chrono::TimeZone;

    fn related(kind: RelationKind, status: MediaStatus) -> MediaEdge {
        MediaEdge {
            kind,
            node: RelatedMedia {
                id: MediaId::new(2),
                title: MediaTitle::default(),
                status,
                format: MediaFormat::Tv,
                episodes: Some(12),
                start_date: Some(FuzzyDate::new(2023, 7, 1)),
                end_date: Some(FuzzyDate::new(2023, 1, 1)),
            },
        }
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_prequel_window() {
        let media = Media {
            status: MediaStatus::Releasing,
            relations: vec![related(RelationKind::Prequel, MediaStatus::Finished)],
            ..Default::default()
        };
        let end = prequel_window_end(&media).unwrap();
        assert!(day(2023, 1, 15) < end);
        assert!(day(2023, 3, 1) > end);
    }

    #[test]
    fn test_prequel_window_needs_finished_prequel() {
        let media = Media {
            status: MediaStatus::Releasing,
            relations: vec![related(RelationKind::Prequel, MediaStatus::Releasing)],
            ..Default::default()
        };
        assert!(prequel_window_end(&media).is_none());
    }

    #[test]
    fn test_sequel_window_only_for_finished_tv() {
        let mut media = Media {
            status: MediaStatus::Finished,
            format: MediaFormat::Tv,
            relations: vec![related(RelationKind::Sequel, MediaStatus::Releasing)],
            ..Default::default()
        };
        let start = sequel_window_start(&media).unwrap();
        assert!(day(2023, 5, 1) < start);
        assert!(day(2023, 6, 15) > start);

        media.format = MediaFormat::Movie;
        assert!(sequel_window_start(&media).is_none());

        media.format = MediaFormat::Tv;
        media.status = MediaStatus::Releasing;
        assert!(sequel_window_start(&media).is_none());
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let entries = vec![
            ReleaseEntry::new("first", "https://nyaa.si/download/1.torrent"),
            ReleaseEntry::new("other", "https://nyaa.si/download/2.torrent"),
            ReleaseEntry::new("second", "https://nyaa.si/download/1.torrent"),
        ];
        let deduped = dedupe_by_link(entries);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "first");
        assert_eq!(deduped[1].title, "other");
    }
}
