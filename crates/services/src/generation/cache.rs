use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use storage::repository::KeyValueStore;
use tutor_core::model::{CacheKey, SeriesId};

use crate::Clock;

/// Storage key holding the whole cache blob.
pub const CACHE_STORAGE_KEY: &str = "tutor_cache_v1";
/// Blobs with any other version are discarded.
pub const CACHE_VERSION: u32 = 1;
pub const CACHE_TTL_DAYS: i64 = 7;
pub const CACHE_MAX_ITEMS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheItem {
    text: String,
    /// Unix epoch milliseconds.
    #[serde(rename = "createdAt")]
    created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CacheData {
    version: u32,
    items: HashMap<String, CacheItem>,
}

impl Default for CacheData {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            items: HashMap::new(),
        }
    }
}

fn ttl_millis() -> i64 {
    Duration::days(CACHE_TTL_DAYS).num_milliseconds()
}

impl CacheData {
    fn is_expired(item: &CacheItem, now_ms: i64) -> bool {
        now_ms - item.created_at > ttl_millis()
    }

    fn prune_expired(&mut self, now_ms: i64) -> usize {
        let before = self.items.len();
        self.items.retain(|_, item| !Self::is_expired(item, now_ms));
        before - self.items.len()
    }

    /// Keep only the `keep` newest entries by creation time. `protect` is
    /// never evicted, so an entry cannot lose a same-millisecond tie on its
    /// own insert.
    fn prune_oldest(&mut self, keep: usize, protect: Option<&str>) -> usize {
        if self.items.len() <= keep {
            return 0;
        }
        let mut by_age: Vec<(i64, String)> = self
            .items
            .iter()
            .filter(|(key, _)| Some(key.as_str()) != protect)
            .map(|(key, item)| (item.created_at, key.clone()))
            .collect();
        by_age.sort();
        let evict = (self.items.len() - keep).min(by_age.len());
        for (_, key) in by_age.into_iter().take(evict) {
            self.items.remove(&key);
        }
        evict
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub item_count: usize,
    pub oldest_age: Duration,
    pub newest_age: Duration,
}

/// TTL'd, size-bounded cache of generated text, stored as one blob in the
/// key-value store.
///
/// Entries live for seven days; past 200 entries the oldest are evicted.
/// Nothing here fails the caller: unreadable blobs count as empty and a write
/// that still fails after an aggressive prune is dropped.
///
/// Every read-modify-write of the blob runs under one lock shared by all
/// clones, so overlapping calls on the same cache do not drop each other's
/// updates.
#[derive(Clone)]
pub struct GenerationCache {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

impl GenerationCache {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Cached text for `key`, or `None` on miss.
    ///
    /// Expired entries are evicted on read. Legacy homework keys without an
    /// understanding level are deleted rather than served.
    pub async fn get(&self, key: impl AsRef<str>) -> Option<String> {
        let key = key.as_ref();
        let _guard = self.write_lock.lock().await;
        if CacheKey::is_legacy_homework(key) {
            self.remove_locked(key).await;
            return None;
        }

        let mut data = self.load().await;
        let Some(item) = data.items.get(key) else {
            debug!(key, "cache miss");
            return None;
        };

        if CacheData::is_expired(item, self.clock.now_millis()) {
            data.items.remove(key);
            self.persist(&mut data).await;
            debug!(key, "cache entry expired");
            return None;
        }

        debug!(key, "cache hit");
        Some(item.text.clone())
    }

    /// Store `text` under `key` stamped with the current time.
    pub async fn set(&self, key: impl AsRef<str>, text: &str) {
        let key = key.as_ref();
        let now = self.clock.now_millis();
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await;

        data.prune_expired(now);
        data.items.insert(
            key.to_string(),
            CacheItem {
                text: text.to_string(),
                created_at: now,
            },
        );
        let evicted = data.prune_oldest(CACHE_MAX_ITEMS, Some(key));
        if evicted > 0 {
            debug!(evicted, "evicted oldest cache entries");
        }

        self.persist(&mut data).await;
        debug!(key, items = data.items.len(), "cache set");
    }

    /// Remove a single entry. Returns whether it existed.
    pub async fn delete(&self, key: impl AsRef<str>) -> bool {
        let _guard = self.write_lock.lock().await;
        self.remove_locked(key.as_ref()).await
    }

    /// Caller holds `write_lock`.
    async fn remove_locked(&self, key: &str) -> bool {
        let mut data = self.load().await;
        if data.items.remove(key).is_none() {
            return false;
        }
        self.persist(&mut data).await;
        if CacheKey::is_legacy_homework(key) {
            info!(key, "deleted legacy homework cache key");
        }
        true
    }

    /// Delete homework entries written without an understanding level.
    pub async fn delete_legacy_homework(
        &self,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
    ) -> usize {
        let _guard = self.write_lock.lock().await;
        let mut data = self.load().await;
        let removed = CacheKey::legacy_homework(series, lesson_id, paragraph)
            .iter()
            .filter(|key| data.items.remove(key.as_str()).is_some())
            .count();
        if removed > 0 {
            self.persist(&mut data).await;
            info!(series = %series, lesson = lesson_id, removed, "deleted legacy homework cache keys");
        }
        removed
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.load().await.items.into_keys().collect();
        keys.sort();
        keys
    }

    pub async fn stats(&self) -> CacheStats {
        let data = self.load().await;
        let now = self.clock.now_millis();
        let ages = data.items.values().map(|item| now - item.created_at);
        CacheStats {
            item_count: data.items.len(),
            oldest_age: Duration::milliseconds(ages.clone().max().unwrap_or(0)),
            newest_age: Duration::milliseconds(ages.min().unwrap_or(0)),
        }
    }

    /// Drop the whole cache.
    pub async fn clear(&self) {
        let _guard = self.write_lock.lock().await;
        match self.store.delete(CACHE_STORAGE_KEY).await {
            Ok(()) => info!("generation cache cleared"),
            Err(err) => warn!(error = %err, "failed to clear generation cache"),
        }
    }

    async fn load(&self) -> CacheData {
        let raw = match self.store.get(CACHE_STORAGE_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheData::default(),
            Err(err) => {
                warn!(error = %err, "failed to read generation cache");
                return CacheData::default();
            }
        };
        match serde_json::from_str::<CacheData>(&raw) {
            Ok(data) if data.version == CACHE_VERSION => data,
            Ok(data) => {
                info!(version = data.version, "discarding cache with another version");
                CacheData::default()
            }
            Err(err) => {
                warn!(error = %err, "generation cache is malformed, starting empty");
                CacheData::default()
            }
        }
    }

    /// Write the blob; on failure prune to half capacity and try once more.
    async fn persist(&self, data: &mut CacheData) {
        if self.write(data).await.is_ok() {
            return;
        }
        let evicted = data.prune_oldest(CACHE_MAX_ITEMS / 2, None);
        warn!(evicted, "cache write failed, retrying after prune");
        if let Err(err) = self.write(data).await {
            warn!(error = %err, "cache write failed again, continuing uncached");
        }
    }

    async fn write(&self, data: &CacheData) -> Result<(), storage::repository::StorageError> {
        let json = serde_json::to_string(data)
            .map_err(|err| storage::repository::StorageError::Serialization(err.to_string()))?;
        self.store.set(CACHE_STORAGE_KEY, &json).await
    }
}
