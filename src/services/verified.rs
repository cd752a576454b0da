//! Index of curated "verified" release ids.
//!
//! The index is filled once, in the background, right after startup. Until it
//! is `Ready` every lookup answers "not verified"; a failed load stays failed
//! for the life of the process.

use crate::domain::events::NotificationEvent;
use crate::models::release::ReleaseEntry;
use crate::services::providers::VerifiedIdSource;
use regex::Regex;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Default)]
pub enum IndexState {
    #[default]
    Empty,
    Loading,
    /// Sorted ascending, no duplicates.
    Ready(Arc<[u64]>),
    Failed(String),
}

#[derive(Clone, Default)]
pub struct VerifiedIndex {
    state: Arc<RwLock<IndexState>>,
}

fn link_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("Invalid regex"))
}

/// First run of digits in a release link.
#[must_use]
pub fn link_id(link: &str) -> Option<u64> {
    link_id_re()
        .find(link)
        .and_then(|m| m.as_str().parse().ok())
}

impl VerifiedIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index that is `Ready` from the start.
    #[must_use]
    pub fn from_ids(mut ids: Vec<u64>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self {
            state: Arc::new(RwLock::new(IndexState::Ready(ids.into()))),
        }
    }

    #[must_use]
    pub fn state(&self) -> IndexState {
        self.state
            .read()
            .map_or(IndexState::Empty, |guard| guard.clone())
    }

    /// Sorted ids, empty in every state but `Ready`.
    #[must_use]
    pub fn ids(&self) -> Arc<[u64]> {
        match self.state() {
            IndexState::Ready(ids) => ids,
            _ => Arc::from(Vec::new()),
        }
    }

    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.ids().binary_search(&id).is_ok()
    }

    /// Flags every entry whose link id is in the index.
    pub fn mark(&self, entries: &mut [ReleaseEntry]) {
        let ids = self.ids();
        if ids.is_empty() {
            return;
        }
        for entry in entries {
            if let Some(id) = link_id(&entry.link)
                && ids.binary_search(&id).is_ok()
            {
                entry.verified = true;
            }
        }
    }

    /// Waits, at most `timeout`, for a running load to finish. Returns the
    /// state at that point.
    pub async fn wait_until_settled(&self, timeout: Duration) -> IndexState {
        let poll = async {
            loop {
                match self.state() {
                    IndexState::Loading => tokio::time::sleep(SETTLE_POLL_INTERVAL).await,
                    settled => return settled,
                }
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .unwrap_or(IndexState::Loading)
    }

    fn set(&self, state: IndexState) {
        if let Ok(mut guard) = self.state.write() {
            *guard = state;
        }
    }

    /// Starts the one-shot background load. A second call while the first is
    /// still loading or after it finished is a no-op.
    pub fn spawn_load(
        &self,
        source: Arc<dyn VerifiedIdSource>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Option<JoinHandle<()>> {
        {
            let Ok(mut guard) = self.state.write() else {
                return None;
            };
            if !matches!(*guard, IndexState::Empty) {
                return None;
            }
            *guard = IndexState::Loading;
        }

        let index = self.clone();
        Some(tokio::spawn(async move {
            match source.fetch_ids().await {
                Ok(mut ids) => {
                    ids.sort_unstable();
                    ids.dedup();
                    let count = ids.len();
                    index.set(IndexState::Ready(ids.into()));
                    info!(count, "Verified release index loaded");
                    let _ = event_bus.send(NotificationEvent::VerifiedIndexReady { count });
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(error = %message, "Verified release index unavailable");
                    index.set(IndexState::Failed(message.clone()));
                    let _ = event_bus.send(NotificationEvent::VerifiedIndexFailed { message });
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::sneedex::SourceError;

    struct StaticSource(Result<Vec<u64>, u16>);

    #[async_trait::async_trait]
    impl VerifiedIdSource for StaticSource {
        async fn fetch_ids(&self) -> Result<Vec<u64>, SourceError> {
            self.0.clone().map_err(SourceError::Status)
        }
    }

    fn entry(link: &str) -> ReleaseEntry {
        ReleaseEntry::new("title", link)
    }

    #[test]
    fn test_marks_known_ids_only() {
        let index = VerifiedIndex::from_ids(vec![15, 5, 10]);
        let mut entries = vec![
            entry("https://nyaa.si/download/10.torrent"),
            entry("https://nyaa.si/download/12.torrent"),
        ];
        index.mark(&mut entries);
        assert!(entries[0].verified);
        assert!(!entries[1].verified);
    }

    #[test]
    fn test_empty_index_marks_nothing() {
        let index = VerifiedIndex::new();
        let mut entries = vec![entry("https://nyaa.si/download/10.torrent")];
        index.mark(&mut entries);
        assert!(!entries[0].verified);
        assert!(index.ids().is_empty());
    }

    #[test]
    fn test_link_id_takes_first_number() {
        assert_eq!(link_id("https://nyaa.si/view/1701234"), Some(1_701_234));
        assert_eq!(link_id("magnet:?xt=urn:btih:abc"), None);
        assert_eq!(link_id("?"), None);
    }

    #[tokio::test]
    async fn test_background_load_reaches_ready() {
        let index = VerifiedIndex::new();
        let (tx, mut rx) = broadcast::channel(4);
        let handle = index
            .spawn_load(Arc::new(StaticSource(Ok(vec![3, 1, 2]))), tx.clone())
            .unwrap();
        assert!(index.spawn_load(Arc::new(StaticSource(Ok(vec![9]))), tx).is_none());
        handle.await.unwrap();

        assert!(matches!(
            index.wait_until_settled(Duration::from_secs(1)).await,
            IndexState::Ready(_)
        ));
        assert_eq!(&*index.ids(), &[1, 2, 3]);
        assert!(index.contains(2));
        assert_eq!(
            rx.recv().await.unwrap(),
            NotificationEvent::VerifiedIndexReady { count: 3 }
        );
    }

    #[tokio::test]
    async fn test_failed_load_reads_as_empty() {
        let index = VerifiedIndex::new();
        let (tx, mut rx) = broadcast::channel(4);
        index
            .spawn_load(Arc::new(StaticSource(Err(503))), tx)
            .unwrap()
            .await
            .unwrap();

        assert!(matches!(index.state(), IndexState::Failed(_)));
        assert!(!index.contains(1));
        assert!(matches!(
            rx.recv().await.unwrap(),
            NotificationEvent::VerifiedIndexFailed { .. }
        ));
    }
}
