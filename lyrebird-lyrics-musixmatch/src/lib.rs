//! Musixmatch word-synced lyrics provider using the desktop "usertoken" flow.
//!
//! **WARNING:** This talks to an unofficial desktop endpoint. It may break or
//! be rate limited at any time; treat it strictly as a fallback source.
//!
//! The flow mirrors the desktop client: acquire a usertoken via `token.get`
//! (cached for the process lifetime), then call `macro.subtitles.get` with the
//! combined search term. In enhanced mode the richsync body is converted into
//! enhanced-LRC text with per-word `<mm:ss.xx>` tags; otherwise the first
//! subtitle body is returned as plain LRC text.

use std::time::Duration;

use async_trait::async_trait;
use lyrebird_core::{CoreError, LyricsConfig, LyricsProvider, LyricsQuery, SourceLyrics};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

const PROVIDER_NAME: &str = "musixmatch";
const APP_ID: &str = "web-desktop-app-v1.0";
/// Token value the API returns when it refuses to hand out a free token
const UPGRADE_ONLY_TOKEN: &str = "UpgradeOnlyUpgradeOnlyUpgradeOnlyUpgradeOnly";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Musixmatch desktop-endpoint lyrics provider
pub struct MusixmatchProvider {
    client: ClientWithMiddleware,
    root_url: String,
    enhanced: bool,
    usertoken: RwLock<Option<String>>,
}

impl MusixmatchProvider {
    /// Create a new Musixmatch provider.
    ///
    /// Uses the configured usertoken when present; otherwise a token is
    /// fetched on first use and cached. `word_sync_enabled` selects the
    /// richsync (word-timed) response when the service offers one.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(lyrics: &LyricsConfig) -> Result<Self, CoreError> {
        let base_client = reqwest::Client::builder()
            .timeout(lyrics.request_timeout())
            .connect_timeout(Duration::from_secs(5))
            .user_agent(USER_AGENT)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(lyrics.retry_delay(), lyrics.retry_delay() * 4)
            .build_with_max_retries(lyrics.retry_attempts);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            root_url: lyrics.musixmatch_root_url.trim_end_matches('/').to_string(),
            enhanced: lyrics.word_sync_enabled,
            usertoken: RwLock::new(lyrics.musixmatch_usertoken.clone()),
        })
    }

    /// Get a usable usertoken, fetching and caching one if needed
    async fn usertoken(&self) -> Result<String, CoreError> {
        {
            let guard = self.usertoken.read().await;
            if let Some(token) = guard.as_ref() {
                return Ok(token.clone());
            }
        }

        debug!("Musixmatch requesting usertoken");
        let url = format!("{}/token.get?app_id={APP_ID}", self.root_url);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CoreError::ProviderFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("token.get returned status {}", response.status()),
            });
        }

        let json: Value = response.json().await?;
        let token = json
            .pointer("/message/body/user_token")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty() && *t != UPGRADE_ONLY_TOKEN)
            .ok_or_else(|| CoreError::ProviderFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: "token.get returned no usable token".to_string(),
            })?
            .to_string();

        *self.usertoken.write().await = Some(token.clone());
        Ok(token)
    }

    /// Fetch synced lyrics for a combined "title artist" search term.
    /// Returns `None` when the service has nothing synced for the track.
    async fn get_lrc(&self, search_term: &str) -> Result<Option<String>, CoreError> {
        let token = self.usertoken().await?;

        info!("Musixmatch searching: \"{search_term}\"");
        let url = format!(
            "{}/macro.subtitles.get?format=json&namespace=lyrics_richsynched&subtitle_format=lrc&app_id={APP_ID}&q_track={}&usertoken={}",
            self.root_url,
            urlencoding::encode(search_term),
            urlencoding::encode(&token),
        );

        let response = self
            .client
            .get(&url)
            // The desktop endpoint expects the token as a cookie as well
            .header("Cookie", format!("x-mxm-token-guid={token}"))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CoreError::ProviderFailed {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("macro.subtitles.get returned status {}", response.status()),
            });
        }

        let json: Value = response.json().await?;
        Ok(extract_synced(&json, self.enhanced))
    }
}

#[async_trait]
impl LyricsProvider for MusixmatchProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<SourceLyrics, CoreError> {
        let synced = self.get_lrc(&query.search_term()).await?;
        if synced.is_none() {
            debug!("Musixmatch returned no synced lyrics");
        }
        Ok(SourceLyrics {
            synced,
            plain: None,
        })
    }
}

/// Pull synced lyrics out of a `macro.subtitles.get` response, preferring
/// richsync (word-level) when enhanced mode is on.
fn extract_synced(response: &Value, enhanced: bool) -> Option<String> {
    let macro_calls = response.pointer("/message/body/macro_calls")?;

    let matcher_status = macro_calls
        .pointer("/matcher.track.get/message/header/status_code")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if matcher_status != 200 {
        debug!("Musixmatch matcher.track.get status {matcher_status}");
        return None;
    }

    if enhanced {
        if let Some(lrc) = richsync_to_enhanced_lrc(macro_calls) {
            return Some(lrc);
        }
    }

    subtitle_body(macro_calls)
}

/// Convert a richsync body into enhanced-LRC text with per-word tags
fn richsync_to_enhanced_lrc(macro_calls: &Value) -> Option<String> {
    let status = macro_calls
        .pointer("/track.richsync.get/message/header/status_code")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if status != 200 {
        return None;
    }

    let body = macro_calls
        .pointer("/track.richsync.get/message/body/richsync/richsync_body")
        .and_then(Value::as_str)?;
    let parsed: Value = serde_json::from_str(body).ok()?;
    let entries = parsed.as_array()?;

    let mut out = String::new();
    for entry in entries {
        let Some(start) = entry.get("ts").and_then(Value::as_f64) else {
            continue;
        };
        out.push('[');
        out.push_str(&format_stamp(start));
        out.push(']');

        match entry.get("l").and_then(Value::as_array) {
            Some(words) => {
                for word in words {
                    let text = word.get("c").and_then(Value::as_str).unwrap_or("");
                    if text.trim().is_empty() {
                        continue;
                    }
                    let offset = word.get("o").and_then(Value::as_f64).unwrap_or(0.0);
                    out.push('<');
                    out.push_str(&format_stamp(start + offset));
                    out.push('>');
                    out.push_str(text.trim());
                    out.push(' ');
                }
            }
            None => {
                // Fall back to the whole-line text for this entry
                let text = entry.get("x").and_then(Value::as_str).unwrap_or("\u{266a}");
                out.push_str(text);
            }
        }
        while out.ends_with(' ') {
            out.pop();
        }
        out.push('\n');
    }

    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// First subtitle body, already LRC-formatted by `subtitle_format=lrc`
fn subtitle_body(macro_calls: &Value) -> Option<String> {
    let status = macro_calls
        .pointer("/track.subtitles.get/message/header/status_code")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    if status != 200 {
        return None;
    }

    macro_calls
        .pointer("/track.subtitles.get/message/body/subtitle_list/0/subtitle/subtitle_body")
        .and_then(Value::as_str)
        .filter(|body| !body.trim().is_empty())
        .map(str::to_string)
}

/// Format seconds as an LRC `mm:ss.cc` stamp
fn format_stamp(seconds: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let minutes = ms / 60_000;
    let secs = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{minutes:02}:{secs:02}.{centis:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wrap(macro_calls: Value) -> Value {
        json!({ "message": { "body": { "macro_calls": macro_calls } } })
    }

    fn matcher_ok() -> Value {
        json!({ "message": { "header": { "status_code": 200 } } })
    }

    #[test]
    fn test_format_stamp() {
        assert_eq!(format_stamp(0.0), "00:00.00");
        assert_eq!(format_stamp(1.5), "00:01.50");
        assert_eq!(format_stamp(62.34), "01:02.34");
    }

    #[test]
    fn test_matcher_failure_yields_none() {
        let response = wrap(json!({
            "matcher.track.get": { "message": { "header": { "status_code": 404 } } }
        }));
        assert!(extract_synced(&response, true).is_none());
    }

    #[test]
    fn test_subtitle_body_extracted() {
        let response = wrap(json!({
            "matcher.track.get": matcher_ok(),
            "track.subtitles.get": {
                "message": {
                    "header": { "status_code": 200 },
                    "body": {
                        "subtitle_list": [
                            { "subtitle": { "subtitle_body": "[00:01.00]hi" } }
                        ]
                    }
                }
            }
        }));
        assert_eq!(
            extract_synced(&response, false).as_deref(),
            Some("[00:01.00]hi")
        );
    }

    #[test]
    fn test_richsync_preferred_in_enhanced_mode() {
        let richsync_body =
            r#"[{"ts": 10.0, "te": 11.0, "x": "foo bar", "l": [{"c": "foo", "o": 0.0}, {"c": "bar", "o": 0.5}]}]"#;
        let response = wrap(json!({
            "matcher.track.get": matcher_ok(),
            "track.richsync.get": {
                "message": {
                    "header": { "status_code": 200 },
                    "body": { "richsync": { "richsync_body": richsync_body } }
                }
            },
            "track.subtitles.get": {
                "message": {
                    "header": { "status_code": 200 },
                    "body": {
                        "subtitle_list": [
                            { "subtitle": { "subtitle_body": "[00:10.00]foo bar" } }
                        ]
                    }
                }
            }
        }));

        let lrc = extract_synced(&response, true).unwrap();
        assert_eq!(lrc, "[00:10.00]<00:10.00>foo <00:10.50>bar\n");

        // Enhanced mode off falls through to the subtitle body
        assert_eq!(
            extract_synced(&response, false).as_deref(),
            Some("[00:10.00]foo bar")
        );
    }

    #[test]
    fn test_richsync_entry_without_words_uses_line_text() {
        let richsync_body = r#"[{"ts": 5.0, "x": "whole line"}]"#;
        let response = wrap(json!({
            "matcher.track.get": matcher_ok(),
            "track.richsync.get": {
                "message": {
                    "header": { "status_code": 200 },
                    "body": { "richsync": { "richsync_body": richsync_body } }
                }
            }
        }));
        assert_eq!(
            extract_synced(&response, true).as_deref(),
            Some("[00:05.00]whole line\n")
        );
    }

    #[test]
    fn test_richsync_unavailable_falls_back_to_subtitles() {
        let response = wrap(json!({
            "matcher.track.get": matcher_ok(),
            "track.richsync.get": { "message": { "header": { "status_code": 404 } } },
            "track.subtitles.get": {
                "message": {
                    "header": { "status_code": 200 },
                    "body": {
                        "subtitle_list": [
                            { "subtitle": { "subtitle_body": "[00:01.00]hi" } }
                        ]
                    }
                }
            }
        }));
        assert_eq!(
            extract_synced(&response, true).as_deref(),
            Some("[00:01.00]hi")
        );
    }

    #[test]
    fn test_empty_subtitle_body_yields_none() {
        let response = wrap(json!({
            "matcher.track.get": matcher_ok(),
            "track.subtitles.get": {
                "message": {
                    "header": { "status_code": 200 },
                    "body": { "subtitle_list": [ { "subtitle": { "subtitle_body": "  " } } ] }
                }
            }
        }));
        assert!(extract_synced(&response, false).is_none());
    }
}
