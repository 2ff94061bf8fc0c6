//! In-memory, time-bounded cache for provider search results.
//!
//! Entries expire lazily after the TTL; there is no background eviction task.
//! The map is bounded: inserting into a full cache evicts the oldest entry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// TTL + capacity bounded map keyed by `lower(artist)|lower(title)`
pub struct SearchCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> SearchCache<V> {
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Build the canonical cache key for an artist/title pair
    #[must_use]
    pub fn key(artist: &str, title: &str) -> String {
        format!("{}|{}", artist.to_lowercase(), title.to_lowercase())
    }

    /// Look up a fresh entry. Stale entries are removed and treated as absent.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Insert a value, evicting the oldest entry when at capacity
    pub async fn insert(&self, key: String, value: V) {
        let mut entries = self.entries.lock().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                debug!("search cache full, evicting \"{oldest}\"");
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let cache = SearchCache::new(Duration::from_secs(60), 10);
        cache.insert("a|b".to_string(), 42).await;
        assert_eq!(cache.get("a|b").await, Some(42));
    }

    #[tokio::test]
    async fn test_miss_on_unknown_key() {
        let cache: SearchCache<i32> = SearchCache::new(Duration::from_secs(60), 10);
        assert_eq!(cache.get("nope").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_treated_as_absent() {
        let cache = SearchCache::new(Duration::from_millis(20), 10);
        cache.insert("a|b".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("a|b").await, None);
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest() {
        let cache = SearchCache::new(Duration::from_secs(60), 2);
        cache.insert("first".to_string(), 1).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert("second".to_string(), 2).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.insert("third".to_string(), 3).await;

        assert_eq!(cache.get("first").await, None);
        assert_eq!(cache.get("second").await, Some(2));
        assert_eq!(cache.get("third").await, Some(3));
    }

    #[tokio::test]
    async fn test_reinsert_existing_key_does_not_evict() {
        let cache = SearchCache::new(Duration::from_secs(60), 2);
        cache.insert("a".to_string(), 1).await;
        cache.insert("b".to_string(), 2).await;
        cache.insert("a".to_string(), 3).await;

        assert_eq!(cache.get("a").await, Some(3));
        assert_eq!(cache.get("b").await, Some(2));
    }

    #[test]
    fn test_key_is_lowercased() {
        assert_eq!(
            SearchCache::<i32>::key("The Artist", "My Song"),
            "the artist|my song"
        );
    }
}
