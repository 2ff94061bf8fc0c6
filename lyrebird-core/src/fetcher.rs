//! Orchestrates the primary and fallback lyrics providers into one result.

use tracing::{debug, info, warn};

use crate::lrc::{self, LyricLine};
use crate::provider::{LyricsProvider, LyricsQuery};
use crate::title;

/// Placeholder when track metadata carries no artist
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Where a lyrics result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsSource {
    Primary,
    Fallback,
    Cache,
}

impl LyricsSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
            Self::Cache => "cache",
        }
    }
}

/// Parsed lyrics tagged with provenance. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct LyricsResult {
    /// Timed lines, ascending by time
    pub lines: Vec<LyricLine>,
    /// Which provider produced the raw text
    pub source: LyricsSource,
    /// True iff any line carries a non-empty word list
    pub has_word_sync: bool,
    /// The raw LRC text as received
    pub raw: String,
}

/// Sequences the primary and fallback providers for a track.
///
/// Providers are injected at construction; each holds its own client and
/// cache state, so one fetcher per process keeps single-instance cache
/// semantics without global singletons.
pub struct LyricsFetcher {
    primary: Box<dyn LyricsProvider>,
    fallback: Box<dyn LyricsProvider>,
}

impl LyricsFetcher {
    #[must_use]
    pub fn new(primary: Box<dyn LyricsProvider>, fallback: Box<dyn LyricsProvider>) -> Self {
        Self { primary, fallback }
    }

    /// Fetch and parse lyrics for a track.
    ///
    /// The title is normalized before any lookup; an empty normalized title
    /// short-circuits to `None` without touching the network. Providers are
    /// tried strictly in sequence, and a provider error is treated the same
    /// as that provider returning nothing. A failed lookup and a track that
    /// simply has no lyrics are indistinguishable to the caller.
    pub async fn fetch_lyrics(
        &self,
        track_title: &str,
        artist: Option<&str>,
        album: Option<&str>,
        duration_secs: Option<f64>,
    ) -> Option<LyricsResult> {
        let cleaned_title = title::normalize(track_title);
        let artist = artist.filter(|a| !a.is_empty()).unwrap_or(UNKNOWN_ARTIST);

        if cleaned_title.is_empty() {
            debug!("no usable title after cleanup, skipping lyrics lookup");
            return None;
        }

        info!("Fetching lyrics for: \"{cleaned_title}\" by \"{artist}\"");

        let mut query = LyricsQuery::new(&cleaned_title, artist);
        if let Some(album) = album {
            query = query.with_album(album);
        }
        if let Some(duration) = duration_secs {
            query = query.with_duration(round_duration(duration));
        }

        match self.primary.fetch(&query).await {
            Ok(result) => {
                if let Some(synced) = result.synced {
                    info!("Got synced lyrics from {}", self.primary.name());
                    let lines = lrc::parse(&synced);
                    return Some(LyricsResult {
                        lines,
                        source: LyricsSource::Primary,
                        has_word_sync: false,
                        raw: synced,
                    });
                }
                debug!("Provider {} returned no synced lyrics", self.primary.name());
            }
            Err(e) => warn!("Provider {} failed: {e}", self.primary.name()),
        }

        match self.fallback.fetch(&query).await {
            Ok(result) => {
                if let Some(synced) = result.synced {
                    let lines = lrc::parse(&synced);
                    let has_word_sync = lines
                        .iter()
                        .any(|l| l.words.as_ref().is_some_and(|w| !w.is_empty()));
                    info!(
                        "Got synced lyrics from {} (word sync: {has_word_sync})",
                        self.fallback.name()
                    );
                    return Some(LyricsResult {
                        lines,
                        source: LyricsSource::Fallback,
                        has_word_sync,
                        raw: synced,
                    });
                }
                debug!(
                    "Provider {} returned no synced lyrics",
                    self.fallback.name()
                );
            }
            Err(e) => warn!("Provider {} failed: {e}", self.fallback.name()),
        }

        info!("No lyrics found for \"{cleaned_title}\" by \"{artist}\"");
        None
    }
}

/// Round a fractional duration to the nearest whole second for matching
fn round_duration(duration: f64) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    {
        duration.round().clamp(0.0, f64::from(u32::MAX)) as u32
    }
}
