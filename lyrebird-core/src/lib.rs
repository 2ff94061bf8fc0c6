pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lrc;
pub mod provider;
pub mod title;

pub use cache::SearchCache;
pub use config::{CacheConfig, Config, LyricsConfig};
pub use error::{CoreError, Result};
pub use fetcher::{LyricsFetcher, LyricsResult, LyricsSource, UNKNOWN_ARTIST};
pub use lrc::{LyricLine, WordTiming};
pub use provider::{LyricsProvider, LyricsQuery, SourceLyrics};
