use crate::domain::MediaId;
use crate::models::query::{QueryContext, QueryMode};
use crate::parser::size::format_size;
use crate::services::{FranchiseGraph, IndexState};
use crate::state::SharedState;
use std::time::Duration;

const VERIFIED_WAIT: Duration = Duration::from_secs(10);

pub async fn cmd_search_releases(
    state: &SharedState,
    media_id: i32,
    episode: u32,
    batch: bool,
    ignore_quality: bool,
) -> anyhow::Result<()> {
    let media = state.catalog.media(MediaId::new(media_id)).await?;

    println!("Searching releases for: {} - episode {episode}", media.title.display());

    if let IndexState::Failed(reason) = state.verified.wait_until_settled(VERIFIED_WAIT).await {
        println!("Verified releases unavailable: {reason}");
    }

    let mode = if batch { QueryMode::Batch } else { QueryMode::Full };
    let ctx = QueryContext::new(media, episode)
        .with_mode(mode)
        .ignoring_quality(ignore_quality);
    let entries = state.resolver.resolve_with(ctx).await;

    if entries.is_empty() {
        println!("No releases found.");
        return Ok(());
    }

    println!();
    println!("Releases:");
    println!("{:-<60}", "");

    for entry in &entries {
        let marker = if entry.verified { "★" } else { "•" };
        println!("{marker} {}", entry.title);
        println!(
            "  Seeders: {} | Size: {} | Date: {}",
            entry.seeders.map_or_else(|| "?".to_string(), |s| s.to_string()),
            entry.size.as_deref().unwrap_or("?"),
            entry
                .date
                .map_or_else(|| "?".to_string(), |d| d.format("%Y-%m-%d").to_string()),
        );
        println!("  {}", entry.link);
        println!();
    }

    let total: i64 = entries.iter().filter_map(|e| e.size_bytes()).sum();
    println!(
        "{} releases, {} verified, {} total",
        entries.len(),
        entries.iter().filter(|e| e.verified).count(),
        format_size(total)
    );

    Ok(())
}
