//! LRCLIB.net lyrics provider: exact metadata match with a fuzzy-search
//! fallback and a time-bounded in-memory cache over search results.

use std::time::Duration;

use async_trait::async_trait;
use lyrebird_core::{
    CacheConfig, CoreError, LyricsConfig, LyricsProvider, LyricsQuery, SearchCache, SourceLyrics,
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use tracing::{debug, info, warn};

const PROVIDER_NAME: &str = "lrclib";
const USER_AGENT: &str = "Lyrebird/0.1 (https://github.com/lyrebird/lyrebird)";

/// Record shape returned by both the `/get` and `/search` endpoints.
/// The API returns additional fields; serde ignores unknown ones.
#[derive(Debug, Clone, Deserialize)]
struct LrclibRecord {
    id: i64,
    #[serde(rename = "trackName")]
    track_name: String,
    #[serde(rename = "artistName")]
    artist_name: String,
    #[serde(rename = "albumName", default)]
    album_name: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "plainLyrics")]
    plain_lyrics: Option<String>,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

impl LrclibRecord {
    fn synced(&self) -> Option<&str> {
        self.synced_lyrics.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn plain(&self) -> Option<&str> {
        self.plain_lyrics.as_deref().filter(|s| !s.trim().is_empty())
    }

    fn has_lyrics(&self) -> bool {
        self.synced().is_some() || self.plain().is_some()
    }

    fn to_source_lyrics(&self) -> SourceLyrics {
        SourceLyrics {
            synced: self.synced().map(str::to_string),
            plain: self.plain().map(str::to_string),
        }
    }
}

/// LRCLIB.net lyrics provider
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    base_url: String,
    search_cache: SearchCache<Vec<LrclibRecord>>,
}

impl LrclibProvider {
    /// Create a new LRCLIB provider.
    ///
    /// The request timeout, retry policy, and base URL come from the lyrics
    /// config; the search-result cache TTL and capacity from the cache config.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(lyrics: &LyricsConfig, cache: &CacheConfig) -> Result<Self, CoreError> {
        // Base client with timeout; covers exact-match and search calls alike
        let base_client = reqwest::Client::builder()
            .timeout(lyrics.request_timeout())
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()?;

        // Retry middleware driven by the configured attempt count and delay
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(lyrics.retry_delay(), lyrics.retry_delay() * 4)
            .build_with_max_retries(lyrics.retry_attempts);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: lyrics.lrclib_base_url.trim_end_matches('/').to_string(),
            search_cache: SearchCache::new(cache.expiry(), cache.max_entries),
        })
    }

    /// Exact-match lookup via `/get`. HTTP 404 is the API's defined
    /// "no exact match" signal and yields `Ok(None)`.
    async fn get_exact(&self, query: &LyricsQuery) -> Result<Option<LrclibRecord>, CoreError> {
        let mut url = format!(
            "{}/get?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(&query.artist_name),
            urlencoding::encode(&query.track_name)
        );

        if let Some(ref album) = query.album_name {
            use std::fmt::Write;
            let _ = write!(url, "&album_name={}", urlencoding::encode(album));
        }

        if let Some(duration) = query.duration_secs {
            use std::fmt::Write;
            let _ = write!(url, "&duration={duration}");
        }

        debug!("LRCLIB GET (exact match): {url}");

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!("LRCLIB no exact match found");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(CoreError::ProviderFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("get returned status {}", response.status()),
            });
        }

        let record: LrclibRecord = response.json().await?;
        debug!(
            "LRCLIB exact match id {} (instrumental: {}, duration: {:?}, album: {:?})",
            record.id, record.instrumental, record.duration, record.album_name
        );
        Ok(Some(record))
    }

    /// Fuzzy search via `/search?q=`. Results are cached for the configured
    /// TTL keyed by artist/title; transport and parse failures yield an
    /// empty result set rather than an error.
    async fn search(&self, artist: &str, title: &str) -> Vec<LrclibRecord> {
        let cache_key = SearchCache::<Vec<LrclibRecord>>::key(artist, title);
        if let Some(cached) = self.search_cache.get(&cache_key).await {
            debug!("LRCLIB using cached search results");
            return cached;
        }

        let term = format!("{title} {artist}").trim().to_string();
        info!("LRCLIB searching: \"{term}\"");

        let url = format!(
            "{}/search?q={}",
            self.base_url,
            urlencoding::encode(&term)
        );

        match self.request_search(&url).await {
            Ok(results) => {
                info!("LRCLIB found {} results", results.len());
                self.search_cache.insert(cache_key, results.clone()).await;
                results
            }
            Err(e) => {
                warn!("LRCLIB search failed: {e}");
                Vec::new()
            }
        }
    }

    async fn request_search(&self, url: &str) -> Result<Vec<LrclibRecord>, CoreError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoreError::ProviderFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("search returned status {}", response.status()),
            });
        }

        Ok(response.json().await?)
    }

    /// Best-match selection over search results: first with synced lyrics,
    /// else first with any lyrics, else the first result overall.
    fn find_best_match(results: &[LrclibRecord]) -> Option<&LrclibRecord> {
        if let Some(record) = results.iter().find(|r| r.synced().is_some()) {
            return Some(record);
        }
        results
            .iter()
            .find(|r| r.has_lyrics())
            .or_else(|| results.first())
    }

    /// Fetch lyrics, trying exact match first and falling back to search.
    /// All failures are swallowed into an empty result at this boundary;
    /// the orchestrator decides whether to try another source.
    async fn get_lyrics(&self, query: &LyricsQuery) -> SourceLyrics {
        match self.get_exact(query).await {
            Ok(Some(record)) if record.has_lyrics() => {
                info!("LRCLIB got exact match (id: {})", record.id);
                return record.to_source_lyrics();
            }
            Ok(_) => {}
            Err(e) => warn!("LRCLIB exact match failed: {e}"),
        }

        let results = self.search(&query.artist_name, &query.track_name).await;
        match Self::find_best_match(&results) {
            Some(best) => {
                info!(
                    "LRCLIB best match: \"{}\" by \"{}\"",
                    best.track_name, best.artist_name
                );
                best.to_source_lyrics()
            }
            None => SourceLyrics::none(),
        }
    }
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<SourceLyrics, CoreError> {
        Ok(self.get_lyrics(query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, synced: Option<&str>, plain: Option<&str>) -> LrclibRecord {
        LrclibRecord {
            id,
            track_name: "track".to_string(),
            artist_name: "artist".to_string(),
            album_name: None,
            duration: Some(180.0),
            instrumental: false,
            plain_lyrics: plain.map(str::to_string),
            synced_lyrics: synced.map(str::to_string),
        }
    }

    #[test]
    fn test_best_match_prefers_synced() {
        let results = vec![
            record(1, None, Some("plain")),
            record(2, Some("[00:01.00]hi"), None),
        ];
        let best = LrclibProvider::find_best_match(&results).unwrap();
        assert_eq!(best.id, 2);
    }

    #[test]
    fn test_best_match_falls_back_to_any_lyrics() {
        let results = vec![record(1, None, None), record(2, None, Some("plain"))];
        let best = LrclibProvider::find_best_match(&results).unwrap();
        assert_eq!(best.id, 2);
    }

    #[test]
    fn test_best_match_falls_back_to_first_result() {
        let results = vec![record(1, None, None), record(2, None, None)];
        let best = LrclibProvider::find_best_match(&results).unwrap();
        assert_eq!(best.id, 1);
    }

    #[test]
    fn test_best_match_empty_results() {
        assert!(LrclibProvider::find_best_match(&[]).is_none());
    }

    #[test]
    fn test_empty_string_lyrics_not_counted() {
        let results = vec![record(1, Some(""), Some("  ")), record(2, None, Some("words"))];
        let best = LrclibProvider::find_best_match(&results).unwrap();
        assert_eq!(best.id, 2);
        assert!(results[0].to_source_lyrics().is_empty());
    }

    #[test]
    fn test_record_deserializes_api_fields() {
        let json = r#"{
            "id": 42,
            "trackName": "My Song",
            "artistName": "Artist",
            "albumName": "Album",
            "duration": 183.5,
            "instrumental": false,
            "plainLyrics": "hello",
            "syncedLyrics": "[00:01.00]hello"
        }"#;
        let record: LrclibRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 42);
        assert_eq!(record.track_name, "My Song");
        assert_eq!(record.synced(), Some("[00:01.00]hello"));
        assert_eq!(record.plain(), Some("hello"));
    }

    #[test]
    fn test_record_tolerates_nulls() {
        let json = r#"{
            "id": 7,
            "trackName": "t",
            "artistName": "a",
            "albumName": null,
            "duration": null,
            "instrumental": true,
            "plainLyrics": null,
            "syncedLyrics": null
        }"#;
        let record: LrclibRecord = serde_json::from_str(json).unwrap();
        assert!(!record.has_lyrics());
    }
}
