use crate::config::PlaybackConfig;

/// Release tokens excluded from every feed query, derived once from what the
/// local player can decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecExclusions {
    tokens: Vec<&'static str>,
}

impl Default for CodecExclusions {
    fn default() -> Self {
        Self::probe(&PlaybackConfig::default())
    }
}

impl CodecExclusions {
    #[must_use]
    pub fn probe(playback: &PlaybackConfig) -> Self {
        let mut tokens = vec!["DTS"];
        if !playback.hevc_supported {
            tokens.extend(["HEVC", "x265", "H.265"]);
        }
        if !playback.ac3_supported {
            tokens.extend(["AC3", "AC-3"]);
        }
        Self { tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &[&'static str] {
        &self.tokens
    }

    /// `-(A|B|C)` suffix of the feed query.
    #[must_use]
    pub fn clause(&self) -> String {
        format!("-({})", self.tokens.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_codecs_are_excluded() {
        let exclusions = CodecExclusions::probe(&PlaybackConfig::default());
        assert_eq!(exclusions.clause(), "-(DTS|HEVC|x265|H.265|AC3|AC-3)");
    }

    #[test]
    fn test_capable_player_only_excludes_dts() {
        let exclusions = CodecExclusions::probe(&PlaybackConfig {
            hevc_supported: true,
            ac3_supported: true,
        });
        assert_eq!(exclusions.tokens(), &["DTS"]);
    }
}
