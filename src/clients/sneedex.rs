use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Verified list request failed with status {0}")]
    Status(u16),

    #[error("Verified list request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// One curated entry; only the release ids matter here.
#[derive(Debug, Deserialize, Clone)]
pub struct SneedexEntry {
    #[serde(rename = "nyaaIDs", default)]
    pub nyaa_ids: Vec<u64>,
}

/// Flattens the curated entries into one sorted, duplicate-free id list.
#[must_use]
pub fn collect_ids(entries: Vec<SneedexEntry>) -> Vec<u64> {
    let mut ids: Vec<u64> = entries.into_iter().flat_map(|e| e.nyaa_ids).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[derive(Clone)]
pub struct SneedexClient {
    client: Client,
    source_url: String,
}

impl SneedexClient {
    #[must_use]
    pub fn with_shared_client(client: Client, source_url: impl Into<String>) -> Self {
        Self {
            client,
            source_url: source_url.into(),
        }
    }

    /// Fetches the curated list and returns its release ids, sorted.
    pub async fn fetch_verified_ids(&self) -> Result<Vec<u64>, SourceError> {
        debug!(url = %self.source_url, "Fetching verified release list");

        let response = self.client.get(&self.source_url).send().await?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let entries: Vec<SneedexEntry> = response.json().await?;
        Ok(collect_ids(entries))
    }
}

#[async_trait::async_trait]
impl crate::services::providers::VerifiedIdSource for SneedexClient {
    async fn fetch_ids(&self) -> Result<Vec<u64>, SourceError> {
        self.fetch_verified_ids().await
    }
}
