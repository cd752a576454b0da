mod common;

use common::{FakeFeed, entry};
use release_resolver::config::Config;
use release_resolver::constants::limits::MAX_FEED_PAGE_SIZE;
use release_resolver::domain::Media;
use release_resolver::domain::events::NotificationEvent;
use release_resolver::models::episode::{EpisodeMetadata, MediaMatch};
use release_resolver::services::{
    EpisodeMetadataProvider, FeedBrowser, FeedItemKind, ProviderError, ResolveQueue,
    TitleResolver,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{RwLock, broadcast};

#[derive(Default)]
struct CountingResolver {
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl TitleResolver for CountingResolver {
    async fn resolve_title(&self, text: &str) -> Result<Vec<MediaMatch>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![MediaMatch::unresolved(text, None)])
    }
}

struct NoEpisodes;

#[async_trait::async_trait]
impl EpisodeMetadataProvider for NoEpisodes {
    async fn episodes(&self, _media: &Media) -> Result<Vec<EpisodeMetadata>, ProviderError> {
        Ok(Vec::new())
    }
}

struct Harness {
    feed: Arc<FakeFeed>,
    resolver: Arc<CountingResolver>,
    browser: FeedBrowser,
    events: broadcast::Receiver<NotificationEvent>,
}

fn harness(feed: FakeFeed) -> Harness {
    let feed = Arc::new(feed);
    let resolver = Arc::new(CountingResolver::default());
    let queue = ResolveQueue::spawn(resolver.clone(), Arc::new(NoEpisodes));
    let (tx, events) = broadcast::channel(16);
    let browser = FeedBrowser::new(
        feed.clone(),
        queue,
        Arc::new(RwLock::new(Config::default())),
        tx,
    );
    Harness {
        feed,
        resolver,
        browser,
        events,
    }
}

fn five_items() -> Vec<release_resolver::models::release::ReleaseEntry> {
    (1..=5).map(|i| entry(&format!("[SubsPlease] Show {i} - 01"), i)).collect()
}

async fn titles(browser: &FeedBrowser, page: usize, per_page: usize, source: &str) -> Vec<Option<String>> {
    let mut out = Vec::new();
    for item in browser.get_media_for_feed(page, per_page, source) {
        assert_eq!(item.kind, FeedItemKind::Episode);
        out.push(item.data.await.map(|r| r.title.clone()));
    }
    out
}

#[tokio::test]
async fn test_page_has_placeholder_per_slot() {
    let h = harness(FakeFeed::new().respond("subsplease", five_items()));
    h.feed.set_pub_date("Mon, 01 Jan 2024 00:00:00 -0000");

    let page = titles(&h.browser, 2, 3, "SubsPlease").await;
    assert_eq!(
        page,
        vec![
            Some("[SubsPlease] Show 4 - 01".to_string()),
            Some("[SubsPlease] Show 5 - 01".to_string()),
            None,
        ]
    );

    let fetched = h.feed.fetched();
    assert_eq!(fetched.len(), 1);
    assert!(fetched[0].contains("u=subsplease"));
    assert!(fetched[0].ends_with(r#"q="1080""#));
}

#[tokio::test]
async fn test_unchanged_feed_reuses_lookups() {
    let h = harness(FakeFeed::new().respond("subsplease", five_items()));
    h.feed.set_pub_date("Mon, 01 Jan 2024 00:00:00 -0000");

    titles(&h.browser, 1, 2, "SubsPlease").await;
    assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 2);

    titles(&h.browser, 1, 2, "SubsPlease").await;
    assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.feed.fetched().len(), 2);

    titles(&h.browser, 2, 2, "SubsPlease").await;
    assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_new_publish_date_invalidates_cache() {
    let h = harness(FakeFeed::new().respond("subsplease", five_items()));
    h.feed.set_pub_date("Mon, 01 Jan 2024 00:00:00 -0000");

    titles(&h.browser, 1, 2, "SubsPlease").await;
    h.feed.set_pub_date("Mon, 01 Jan 2024 01:00:00 -0000");
    titles(&h.browser, 1, 2, "SubsPlease").await;

    assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_literal_feed_url_is_fetched_as_is() {
    let h = harness(FakeFeed::new().respond("example.org", five_items()));

    let page = titles(&h.browser, 1, 1, "https://example.org/rss").await;
    assert_eq!(page, vec![Some("[SubsPlease] Show 1 - 01".to_string())]);
    assert_eq!(h.feed.fetched(), vec!["https://example.org/rss".to_string()]);
}

#[tokio::test]
async fn test_failed_feed_resolves_every_slot_to_none() {
    let mut h = harness(FakeFeed::new().fail("subsplease"));

    let page = titles(&h.browser, 1, 2, "SubsPlease").await;
    assert_eq!(page, vec![None, None]);
    assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        h.events.recv().await.unwrap(),
        NotificationEvent::SearchFailed { status: Some(503), .. }
    ));
}

#[tokio::test]
async fn test_page_past_addressable_range_is_empty() {
    let h = harness(FakeFeed::new().respond("subsplease", five_items()));

    let page = titles(&h.browser, usize::MAX, 2, "SubsPlease").await;
    assert_eq!(page, vec![None, None]);
    assert_eq!(h.resolver.calls.load(Ordering::SeqCst), 0);
    assert!(h.feed.fetched().is_empty());
}

#[tokio::test]
async fn test_page_size_is_capped() {
    let h = harness(FakeFeed::new().respond("subsplease", five_items()));

    let items = h.browser.get_media_for_feed(1, usize::MAX, "SubsPlease");
    assert_eq!(items.len(), usize::from(MAX_FEED_PAGE_SIZE));

    let resolved = futures::future::join_all(items.into_iter().map(|item| item.data)).await;
    assert_eq!(resolved.iter().filter(|r| r.is_some()).count(), 5);
}
