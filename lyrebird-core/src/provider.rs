use crate::error::Result;
use async_trait::async_trait;

/// Query parameters for fetching lyrics
#[derive(Debug, Clone)]
pub struct LyricsQuery {
    /// Track name (already normalized for search)
    pub track_name: String,
    /// Artist name
    pub artist_name: String,
    /// Album name (optional)
    pub album_name: Option<String>,
    /// Track duration in whole seconds (for matching)
    pub duration_secs: Option<u32>,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
            album_name: None,
            duration_secs: None,
        }
    }

    /// Set album name
    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album_name = Some(album.into());
        self
    }

    /// Set duration
    #[must_use]
    pub const fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    /// Combined "title artist" term used by fuzzy search endpoints
    #[must_use]
    pub fn search_term(&self) -> String {
        format!("{} {}", self.track_name, self.artist_name)
            .trim()
            .to_string()
    }
}

/// Raw lyrics text returned by a provider, before parsing
#[derive(Debug, Clone, Default)]
pub struct SourceLyrics {
    /// LRC-formatted text with per-line timestamps
    pub synced: Option<String>,
    /// Plain text without timing
    pub plain: Option<String>,
}

impl SourceLyrics {
    /// An empty result: the provider had nothing for this track
    #[must_use]
    pub const fn none() -> Self {
        Self {
            synced: None,
            plain: None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.synced.is_none() && self.plain.is_none()
    }
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch lyrics for a query
    async fn fetch(&self, query: &LyricsQuery) -> Result<SourceLyrics>;
}
