use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::info;

use crate::clients::anilist::AnilistClient;
use crate::clients::nyaa::NyaaClient;
use crate::clients::sneedex::SneedexClient;
use crate::config::Config;
use crate::domain::events::NotificationEvent;
use crate::services::{
    AnilistCatalog, CodecExclusions, FeedBrowser, FranchiseGraph, ReleaseResolver, ResolveQueue,
    VerifiedIndex,
};

/// One HTTP client for every outbound service, so connections are pooled.
fn build_shared_http_client(config: &Config) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(
            config.feed.request_timeout_seconds.into(),
        ))
        .user_agent(&config.feed.user_agent)
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub catalog: Arc<AnilistCatalog>,

    pub resolver: Arc<ReleaseResolver>,

    pub feed_browser: FeedBrowser,

    pub verified: VerifiedIndex,

    pub event_bus: broadcast::Sender<NotificationEvent>,
}

impl SharedState {
    /// Wires every service and starts the background verified-index load.
    /// Must be called inside a tokio runtime.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let (event_bus, _) = broadcast::channel(config.general.event_bus_buffer_size.max(1));
        Self::with_event_bus(config, event_bus)
    }

    pub fn with_event_bus(
        config: Config,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client(&config)?;

        let nyaa = Arc::new(NyaaClient::with_shared_client(http_client.clone()));
        let anilist = Arc::new(AnilistClient::with_shared_client(
            http_client.clone(),
            config.anilist.api_url.clone(),
        ));
        let catalog = Arc::new(AnilistCatalog::new(anilist));

        let verified = VerifiedIndex::new();
        if config.verified.enabled {
            let source = Arc::new(SneedexClient::with_shared_client(
                http_client,
                config.verified.source_url.clone(),
            ));
            verified.spawn_load(source, event_bus.clone());
        } else {
            info!("Verified release index disabled");
        }

        let exclusions = CodecExclusions::probe(&config.playback);
        let config = Arc::new(RwLock::new(config));

        let resolver = Arc::new(ReleaseResolver::new(
            nyaa.clone(),
            catalog.clone() as Arc<dyn FranchiseGraph>,
            config.clone(),
            exclusions,
            verified.clone(),
            event_bus.clone(),
        ));

        let queue = ResolveQueue::spawn(catalog.clone(), catalog.clone());
        let feed_browser = FeedBrowser::new(nyaa, queue, config.clone(), event_bus.clone());

        Ok(Self {
            config,
            catalog,
            resolver,
            feed_browser,
            verified,
            event_bus,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
