use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsConfig {
    #[serde(default = "default_lrclib_base_url")]
    pub lrclib_base_url: String,
    #[serde(default = "default_musixmatch_root_url")]
    pub musixmatch_root_url: String,
    /// Optional Musixmatch desktop usertoken; fetched automatically when unset
    pub musixmatch_usertoken: Option<String>,
    /// Ask the fallback provider for word-level timing when available
    #[serde(default = "default_true")]
    pub word_sync_enabled: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Minimum delay between retries of a failed request
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
}

fn default_lrclib_base_url() -> String {
    "https://lrclib.net/api".to_string()
}

fn default_musixmatch_root_url() -> String {
    "https://apic-desktop.musixmatch.com/ws/1.1".to_string()
}

const fn default_true() -> bool {
    true
}

const fn default_request_timeout() -> u64 {
    10
}

const fn default_retry_attempts() -> u32 {
    2
}

const fn default_retry_delay() -> u64 {
    1000
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            lrclib_base_url: default_lrclib_base_url(),
            musixmatch_root_url: default_musixmatch_root_url(),
            musixmatch_usertoken: None,
            word_sync_enabled: default_true(),
            request_timeout_secs: default_request_timeout(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay(),
        }
    }
}

impl LyricsConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_expiry_hours")]
    pub expiry_hours: u64,
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

const fn default_cache_expiry_hours() -> u64 {
    24
}

const fn default_cache_max_entries() -> usize {
    100
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            expiry_hours: default_cache_expiry_hours(),
            max_entries: default_cache_max_entries(),
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_hours.saturating_mul(60 * 60))
    }
}

impl Config {
    /// Load config from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file, writing a commented template on first run
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigNotFound`] after writing the template, or
    /// an error if the existing file cannot be read or parsed.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, CONFIG_TEMPLATE)?;
            return Err(CoreError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        Self::load(path)
    }

    fn validate(&self) -> Result<()> {
        if self.lyrics.lrclib_base_url.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "lyrics.lrclib_base_url must not be empty".to_string(),
            });
        }
        if self.cache.max_entries == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "cache.max_entries must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

const CONFIG_TEMPLATE: &str = r#"# Lyrebird configuration

[lyrics]
lrclib_base_url = "https://lrclib.net/api"
musixmatch_root_url = "https://apic-desktop.musixmatch.com/ws/1.1"
# Optional: a Musixmatch desktop usertoken. When unset, a token is fetched
# and cached for the process lifetime.
# musixmatch_usertoken = ""
# Ask the fallback provider for word-level timing when available
word_sync_enabled = true
request_timeout_secs = 10
retry_attempts = 2
retry_delay_ms = 1000

[cache]
# Search results are reused for this long before re-querying the network
expiry_hours = 24
max_entries = 100
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.lyrics.lrclib_base_url, "https://lrclib.net/api");
        assert_eq!(config.lyrics.request_timeout_secs, 10);
        assert_eq!(config.lyrics.retry_attempts, 2);
        assert_eq!(config.lyrics.retry_delay_ms, 1000);
        assert_eq!(config.cache.expiry_hours, 24);
        assert_eq!(config.cache.max_entries, 100);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert!(config.lyrics.word_sync_enabled);
        assert!(config.lyrics.musixmatch_usertoken.is_none());
        assert_eq!(config.cache.expiry(), Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn test_partial_override() {
        let config: Config = toml::from_str("[cache]\nexpiry_hours = 1").unwrap();
        assert_eq!(config.cache.expiry_hours, 1);
        assert_eq!(config.cache.max_entries, 100);
    }

    #[test]
    fn test_absurd_expiry_hours_saturates() {
        let config = CacheConfig {
            expiry_hours: u64::MAX,
            max_entries: 100,
        };
        assert_eq!(config.expiry(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let config: Config = toml::from_str("[cache]\nmax_entries = 0").unwrap();
        assert!(config.validate().is_err());
    }
}
