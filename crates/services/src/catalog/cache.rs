use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tutor_core::model::{Series, SeriesId};

/// How long a fetched series is served from memory, in seconds.
pub const SERIES_CACHE_TTL_SECS: i64 = 5 * 60;

/// In-memory series cache. Expiry is checked lazily on read.
#[derive(Debug)]
pub struct SeriesCache {
    ttl: Duration,
    entries: HashMap<SeriesId, (Arc<Series>, DateTime<Utc>)>,
}

impl Default for SeriesCache {
    fn default() -> Self {
        Self::new(Duration::seconds(SERIES_CACHE_TTL_SECS))
    }
}

impl SeriesCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// The cached series if it was stored less than one TTL before `now`.
    #[must_use]
    pub fn get(&self, id: SeriesId, now: DateTime<Utc>) -> Option<Arc<Series>> {
        self.entries
            .get(&id)
            .filter(|(_, stored_at)| now - *stored_at < self.ttl)
            .map(|(series, _)| Arc::clone(series))
    }

    pub fn insert(&mut self, id: SeriesId, series: Arc<Series>, now: DateTime<Utc>) {
        self.entries.insert(id, (series, now));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_core::time::fixed_now;

    #[test]
    fn entries_expire_after_ttl() {
        let mut cache = SeriesCache::default();
        let series = Arc::new(Series::new(SeriesId::Ot, "OT", "", Vec::new()));
        cache.insert(SeriesId::Ot, series, fixed_now());

        assert!(cache.get(SeriesId::Ot, fixed_now() + Duration::minutes(4)).is_some());
        assert!(cache.get(SeriesId::Ot, fixed_now() + Duration::minutes(5)).is_none());
        assert!(cache.get(SeriesId::U, fixed_now()).is_none());

        cache.clear();
        assert!(cache.get(SeriesId::Ot, fixed_now()).is_none());
    }
}
