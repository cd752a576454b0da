//! Strict FIFO queue in front of the title-to-media resolver.
//!
//! The resolver keeps state that breaks when lookups interleave, so every
//! lookup goes through one channel drained by one worker task: job `n + 1`
//! starts only after job `n` finished, in submission order, no matter which
//! feed page submitted it.

use crate::models::episode::{MediaMatch, ResolvedRelease};
use crate::services::providers::{EpisodeMetadataProvider, ProviderError, TitleResolver};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Result of a queued lookup. Cloneable, so several consumers can await the
/// same item. `None` once the worker is gone.
pub type PendingRelease = Shared<BoxFuture<'static, Option<Arc<ResolvedRelease>>>>;

struct ResolveJob {
    title: String,
    link: String,
    reply: oneshot::Sender<Arc<ResolvedRelease>>,
}

struct ResolveWorker {
    titles: Arc<dyn TitleResolver>,
    episodes: Arc<dyn EpisodeMetadataProvider>,
    receiver: mpsc::UnboundedReceiver<ResolveJob>,
}

impl ResolveWorker {
    async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            let resolved = self.resolve(job.title, job.link).await;
            let _ = job.reply.send(Arc::new(resolved));
        }
        debug!("Resolve queue closed");
    }

    async fn resolve(&self, title: String, link: String) -> ResolvedRelease {
        let matched = match self.titles.resolve_title(&title).await {
            Ok(matches) => matches.into_iter().next(),
            Err(ProviderError::Unresolved(_)) => None,
            Err(e) => {
                warn!(title = %title, error = %e, "Title resolution failed");
                None
            }
        };

        let episode_data = match &matched {
            Some(MediaMatch {
                media: Some(media),
                episode: Some(episode),
                ..
            }) => match self.episodes.episodes(media).await {
                Ok(list) => list.into_iter().find(|e| e.number == *episode),
                Err(e) => {
                    warn!(media_id = %media.id, error = %e, "Episode metadata lookup failed");
                    None
                }
            },
            _ => None,
        };

        ResolvedRelease {
            title,
            link,
            matched,
            episode_data,
        }
    }
}

#[derive(Clone)]
pub struct ResolveQueue {
    sender: mpsc::UnboundedSender<ResolveJob>,
}

impl ResolveQueue {
    /// Starts the worker on the current runtime.
    #[must_use]
    pub fn spawn(
        titles: Arc<dyn TitleResolver>,
        episodes: Arc<dyn EpisodeMetadataProvider>,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = ResolveWorker {
            titles,
            episodes,
            receiver,
        };
        tokio::spawn(worker.run());
        Self { sender }
    }

    /// Enqueues a lookup. The job runs whether or not the result is awaited.
    #[must_use]
    pub fn submit(&self, title: impl Into<String>, link: impl Into<String>) -> PendingRelease {
        let (reply, rx) = oneshot::channel();
        let job = ResolveJob {
            title: title.into(),
            link: link.into(),
            reply,
        };
        if self.sender.send(job).is_err() {
            warn!("Resolve queue is closed, dropping lookup");
        }
        async move { rx.await.ok() }.boxed().shared()
    }
}
