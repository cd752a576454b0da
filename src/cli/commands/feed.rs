use crate::clients::nyaa::preset_names;
use crate::state::SharedState;

pub async fn cmd_browse_feed(
    state: &SharedState,
    source: &str,
    page: u32,
    per_page: u16,
) -> anyhow::Result<()> {
    if page == 0 || per_page == 0 {
        anyhow::bail!("Page and page size must be at least 1");
    }
    let page = usize::try_from(page)?;
    let per_page = usize::from(per_page);

    println!("Browsing feed: {source} (page {page})");
    if !preset_names().iter().any(|p| *p == source) {
        println!("Presets: {}", preset_names().join(", "));
    }
    println!("{:-<60}", "");

    let items = state.feed_browser.get_media_for_feed(page, per_page, source);

    let mut shown = 0;
    for item in items {
        let Some(release) = item.data.await else {
            continue;
        };
        shown += 1;

        println!("• {}", release.title);
        match (release.media(), &release.matched) {
            (Some(media), Some(matched)) => {
                let episode = matched
                    .episode
                    .map_or_else(|| "?".to_string(), |e| e.to_string());
                let flag = if matched.failed { " (episode out of range)" } else { "" };
                println!(
                    "  Media: {} | ID: {} | Episode: {episode}{flag}",
                    media.title.display(),
                    media.id
                );
            }
            _ => println!("  Media: unresolved"),
        }
        if let Some(title) = release.episode_data.as_ref().and_then(|e| e.title.as_deref()) {
            println!("  Episode title: {title}");
        }
        println!("  {}", release.link);
        println!();
    }

    if shown == 0 {
        println!("No items on this page.");
    }

    Ok(())
}
