pub const VERIFIED_SOURCE_URL: &str = "https://sneedex.moe/api/public/nyaa";

pub const DEFAULT_QUALITY: &str = "1080";

pub mod feed {
    /// Anime, English-translated.
    pub const CATEGORY: &str = "1_2";

    /// Every category, used by the release-group presets.
    pub const ALL_CATEGORIES: &str = "0_0";

    pub const NO_FILTER: &str = "0";
}

pub mod dates {
    /// Roughly one month in milliseconds. Tolerance for early pre-releases and
    /// late uploads around season boundaries.
    pub const MONTH_JITTER_MS: i64 = 2_674_848_460;
}

pub mod limits {
    /// Deepest sequel/prequel chain a single resolution follows.
    pub const MAX_RESOLVE_DEPTH: u8 = 8;

    /// Deepest prequel chain walked when computing absolute episode offsets.
    pub const MAX_SEASON_WALK: usize = 16;

    /// Most placeholders one feed page hands out.
    pub const MAX_FEED_PAGE_SIZE: u16 = 100;
}
