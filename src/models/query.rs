use crate::domain::Media;
use std::sync::Arc;

/// How much of the resolution pipeline a call runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMode {
    /// Top-level resolution: absolute numbering, batch and quality fallbacks.
    #[default]
    Full,
    /// Existence probe for a related entry; no fallbacks.
    Check,
    /// Batch releases only; no episode clause.
    Batch,
}

/// Parameters of one resolution call. Recursive calls derive a fresh
/// context instead of mutating the parent's.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub media: Arc<Media>,
    pub episode: u32,
    pub mode: QueryMode,
    pub ignore_quality: bool,
    pub depth: u8,
}

impl QueryContext {
    #[must_use]
    pub fn new(media: impl Into<Arc<Media>>, episode: u32) -> Self {
        Self {
            media: media.into(),
            episode,
            mode: QueryMode::Full,
            ignore_quality: false,
            depth: 0,
        }
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn ignoring_quality(mut self, ignore_quality: bool) -> Self {
        self.ignore_quality = ignore_quality;
        self
    }

    /// Same query against another media, one level deeper.
    #[must_use]
    pub fn for_related(&self, media: impl Into<Arc<Media>>, mode: QueryMode) -> Self {
        Self {
            media: media.into(),
            episode: self.episode,
            mode,
            ignore_quality: false,
            depth: self.depth.saturating_add(1),
        }
    }

    /// Same media and episode in another mode, one level deeper.
    #[must_use]
    pub fn rerun(&self, mode: QueryMode, ignore_quality: bool) -> Self {
        Self {
            media: Arc::clone(&self.media),
            episode: self.episode,
            mode,
            ignore_quality,
            depth: self.depth.saturating_add(1),
        }
    }
}
