//! Paged browsing of a release feed with lazily resolved items.
//!
//! A page request answers immediately with `per_page` placeholders. The feed
//! fetch and the per-item media lookups run in the background; each
//! placeholder resolves to its item, or to `None` past the end of the feed.
//!
//! Lookups are cached per feed and page until the feed's top `pubDate`
//! changes.

use crate::clients::nyaa::{FeedError, feed_url_for};
use crate::config::Config;
use crate::constants::limits::MAX_FEED_PAGE_SIZE;
use crate::domain::events::NotificationEvent;
use crate::services::providers::FeedSource;
use crate::services::resolve_queue::{PendingRelease, ResolveQueue};
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};

/// Index of the first item of a 1-based page, `None` when it does not fit a `usize`.
fn page_start(page: usize, per_page: usize) -> Option<usize> {
    page.saturating_sub(1).checked_mul(per_page)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedItemKind {
    Episode,
}

#[derive(Clone)]
pub struct FeedItem {
    pub kind: FeedItemKind,
    pub data: PendingRelease,
}

struct CachedFeed {
    date: String,
    pages: HashMap<(usize, usize), Vec<PendingRelease>>,
}

#[derive(Clone)]
pub struct FeedBrowser {
    feeds: Arc<dyn FeedSource>,
    queue: ResolveQueue,
    config: Arc<RwLock<Config>>,
    cache: Arc<std::sync::RwLock<HashMap<String, CachedFeed>>>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl FeedBrowser {
    #[must_use]
    pub fn new(
        feeds: Arc<dyn FeedSource>,
        queue: ResolveQueue,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            feeds,
            queue,
            config,
            cache: Arc::new(std::sync::RwLock::new(HashMap::new())),
            event_bus,
        }
    }

    /// `per_page` placeholders for page `page` (1-based) of a preset or feed
    /// URL. `per_page` is capped at [`MAX_FEED_PAGE_SIZE`]. Must be called
    /// inside a tokio runtime.
    #[must_use]
    pub fn get_media_for_feed(
        &self,
        page: usize,
        per_page: usize,
        preset_or_url: &str,
    ) -> Vec<FeedItem> {
        let per_page = per_page.min(usize::from(MAX_FEED_PAGE_SIZE));
        let browser = self.clone();
        let key = preset_or_url.to_string();
        let load = tokio::spawn(async move { browser.load_page(page, per_page, &key).await });
        let page_items = async move { Arc::new(load.await.unwrap_or_default()) }
            .boxed()
            .shared();

        (0..per_page)
            .map(|i| {
                let page_items = page_items.clone();
                let data = async move {
                    let pending = page_items.await.get(i).cloned()?;
                    pending.await
                }
                .boxed()
                .shared();
                FeedItem {
                    kind: FeedItemKind::Episode,
                    data,
                }
            })
            .collect()
    }

    async fn load_page(&self, page: usize, per_page: usize, key: &str) -> Vec<PendingRelease> {
        let Some(start) = page_start(page, per_page) else {
            debug!(feed = %key, page, per_page, "Page lies beyond any feed, skipping fetch");
            return Vec::new();
        };

        let url = {
            let config = self.config.read().await;
            feed_url_for(&config.feed.base_url, key, config.quality_token())
        };
        let url = match url {
            Ok(url) => url,
            Err(e) => {
                self.report_failure(key, &e);
                return Vec::new();
            }
        };

        let doc = match self.feeds.fetch(&url).await {
            Ok(doc) => doc,
            Err(e) => {
                self.report_failure(url.as_str(), &e);
                return Vec::new();
            }
        };

        if let Some(date) = &doc.pub_date
            && let Some(hit) = self.cached(key, date, page, per_page)
        {
            debug!(feed = %key, page, "Feed unchanged, reusing page");
            return hit;
        }

        let pending: Vec<PendingRelease> = doc
            .items
            .into_iter()
            .skip(start)
            .take(per_page)
            .map(|item| self.queue.submit(item.title, item.link))
            .collect();

        if let Some(date) = doc.pub_date {
            self.store(key, date, page, per_page, pending.clone());
        }
        pending
    }

    fn cached(&self, key: &str, date: &str, page: usize, per_page: usize) -> Option<Vec<PendingRelease>> {
        let cache = self.cache.read().ok()?;
        let feed = cache.get(key).filter(|f| f.date == date)?;
        feed.pages.get(&(page, per_page)).cloned()
    }

    fn store(&self, key: &str, date: String, page: usize, per_page: usize, items: Vec<PendingRelease>) {
        let Ok(mut cache) = self.cache.write() else {
            return;
        };
        let feed = cache
            .entry(key.to_string())
            .or_insert_with(|| CachedFeed {
                date: date.clone(),
                pages: HashMap::new(),
            });
        if feed.date != date {
            feed.date = date;
            feed.pages.clear();
        }
        feed.pages.insert((page, per_page), items);
    }

    fn report_failure(&self, url: &str, error: &FeedError) {
        warn!(event = "feed_fetch_failed", url = %url, error = %error, "Failed fetching feed");
        let _ = self.event_bus.send(NotificationEvent::SearchFailed {
            url: url.to_string(),
            status: error.status(),
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_start() {
        assert_eq!(page_start(1, 20), Some(0));
        assert_eq!(page_start(0, 20), Some(0));
        assert_eq!(page_start(3, 20), Some(40));
        assert_eq!(page_start(usize::MAX, 2), None);
    }
}
