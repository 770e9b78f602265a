//! Season/episode markers and file-name trait extraction.

use std::fmt;

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Placeholder used when a trait cannot be read from a file name.
pub const UNKNOWN_TRAIT: &str = "unknown";

static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(4k|\d{3,4}p)").expect("valid resolution regex"));

static CODEC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(h\.?264|h\.?265|x\.?264|x\.?265|av1|hevc)").expect("valid codec regex")
});

static SOURCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(bluray|web-?dl|webrip|web|hdrip|dvdrip|brrip)").expect("valid source regex")
});

/// A fully qualified `SxxEyy` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeMarker {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeMarker {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }

    /// Lowercase season token, zero-padded to two digits (`s01`).
    pub fn season_token(season: u32) -> String {
        format!("s{:02}", season)
    }

    /// Whether `text` carries this marker as `S01E02` or `S01.E02`, ignoring case.
    pub fn matches(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        let season = Self::season_token(self.season);
        let compact = format!("{}e{:02}", season, self.episode);
        let dotted = format!("{}.e{:02}", season, self.episode);
        lower.contains(&compact) || lower.contains(&dotted)
    }

    /// Whether `text` names any single episode of `season` (`S01E<digits>` or `S01.E<digits>`).
    pub fn names_episode_of_season(text: &str, season: u32) -> bool {
        let lower = text.to_lowercase();
        let token = Self::season_token(season);
        lower.match_indices(&token).any(|(idx, _)| {
            let rest = &lower[idx + token.len()..];
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            let mut chars = rest.chars();
            chars.next() == Some('e') && chars.next().is_some_and(|c| c.is_ascii_digit())
        })
    }
}

impl fmt::Display for EpisodeMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{:02}E{:02}", self.season, self.episode)
    }
}

/// Resolution, codec and source type read from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTraits {
    pub resolution: String,
    pub codec: String,
    pub source: String,
}

/// Extract display traits from a file name; missing traits become [`UNKNOWN_TRAIT`].
pub fn describe_file(file_name: &str) -> FileTraits {
    let grab = |re: &Regex| {
        re.find(file_name)
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| UNKNOWN_TRAIT.to_string())
    };

    FileTraits {
        resolution: grab(&RESOLUTION_RE),
        codec: grab(&CODEC_RE),
        source: grab(&SOURCE_RE),
    }
}

/// Format a byte count as gigabytes with two decimals.
pub fn format_size_gb(bytes: u64) -> String {
    let gb = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    format!("{:.2} GB", gb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_display_pads() {
        assert_eq!(EpisodeMarker::new(1, 2).to_string(), "S01E02");
        assert_eq!(EpisodeMarker::new(12, 104).to_string(), "S12E104");
    }

    #[test]
    fn test_marker_matches_both_styles() {
        let marker = EpisodeMarker::new(1, 2);
        assert!(marker.matches("Show.S01E02.1080p.mkv"));
        assert!(marker.matches("show s01.e02 multi"));
        assert!(!marker.matches("Show.S01E03.1080p.mkv"));
        assert!(!marker.matches("Show.S02E02.1080p.mkv"));
    }

    #[test]
    fn test_names_episode_of_season() {
        assert!(EpisodeMarker::names_episode_of_season("Show S01E05 720p", 1));
        assert!(EpisodeMarker::names_episode_of_season("Show.S01.E05.720p", 1));
        assert!(!EpisodeMarker::names_episode_of_season("Show S01 COMPLETE", 1));
        assert!(!EpisodeMarker::names_episode_of_season("Show S02E05", 1));
        assert!(!EpisodeMarker::names_episode_of_season("Show S01.Extras", 1));
    }

    #[test]
    fn test_describe_file_full() {
        let traits = describe_file("Movie.2019.1080p.BluRay.x264-GRP.mkv");
        assert_eq!(traits.resolution, "1080p");
        assert_eq!(traits.codec, "x264");
        assert_eq!(traits.source, "BluRay");
    }

    #[test]
    fn test_describe_file_dotted_codec_and_webdl() {
        let traits = describe_file("Show.S01E02.2160p.WEB-DL.H.265.mkv");
        assert_eq!(traits.resolution, "2160p");
        assert_eq!(traits.codec, "H.265");
        assert_eq!(traits.source, "WEB-DL");
    }

    #[test]
    fn test_describe_file_unknowns() {
        let traits = describe_file("home_video.avi");
        assert_eq!(traits.resolution, UNKNOWN_TRAIT);
        assert_eq!(traits.codec, UNKNOWN_TRAIT);
        assert_eq!(traits.source, UNKNOWN_TRAIT);
    }

    #[test]
    fn test_format_size_gb() {
        assert_eq!(format_size_gb(0), "0.00 GB");
        assert_eq!(format_size_gb(1024 * 1024 * 1024 * 3 / 2), "1.50 GB");
    }
}
