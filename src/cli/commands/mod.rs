mod feed;
mod search;

pub use feed::cmd_browse_feed;
pub use search::cmd_search_releases;
