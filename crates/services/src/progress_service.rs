use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use storage::repository::KeyValueStore;
use tutor_core::model::{Progress, SeriesId};
use tutor_core::policy;

use crate::Clock;

/// Storage key of the progress record.
pub const PROGRESS_KEY: &str = "tutor_progress_v1";
/// Storage key of the ephemeral session pointer, wiped together with progress.
pub const SESSION_KEY: &str = "tutor_session_id";

/// Durable learner progress on top of a key-value store.
///
/// Storage failures never escape: reads fall back to defaults and failed writes
/// are logged, so callers always get a usable `Progress`. Read-modify-write
/// cycles are serialized by a lock shared by all clones.
#[derive(Clone)]
pub struct ProgressStore {
    clock: Clock,
    store: Arc<dyn KeyValueStore>,
    write_lock: Arc<Mutex<()>>,
}

/// Lenient shape of the stored record, also accepting the legacy layout that
/// predates `currentSeriesId`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProgress {
    #[serde(default)]
    current_series_id: Option<String>,
    #[serde(default)]
    completed_lesson_ids: Vec<String>,
    #[serde(default)]
    current_lesson_id: Option<String>,
    #[serde(default)]
    current_paragraph_index: usize,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

enum Loaded {
    Current(Progress),
    Migrated(Progress),
}

impl StoredProgress {
    fn into_progress(self, now: DateTime<Utc>) -> Loaded {
        let series = self
            .current_series_id
            .as_deref()
            .and_then(|raw| raw.parse::<SeriesId>().ok());
        let mut progress = Progress {
            current_series_id: series
                .unwrap_or_else(|| SeriesId::from_lesson_id(self.current_lesson_id.as_deref())),
            completed_lesson_ids: self.completed_lesson_ids,
            current_lesson_id: self.current_lesson_id,
            current_paragraph_index: self.current_paragraph_index,
            last_updated: self.last_updated.unwrap_or(now),
        };
        progress.dedup_completed();
        if series.is_some() {
            Loaded::Current(progress)
        } else {
            Loaded::Migrated(progress)
        }
    }
}

impl ProgressStore {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Current progress, creating and persisting defaults on first access.
    ///
    /// Unreadable or malformed records fall back to defaults. A legacy record
    /// without a current series is upgraded in place.
    pub async fn load(&self) -> Progress {
        let _guard = self.write_lock.lock().await;
        self.load_locked().await
    }

    /// Caller holds `write_lock`.
    async fn load_locked(&self) -> Progress {
        let raw = match self.store.get(PROGRESS_KEY).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "failed to read progress, using defaults");
                return Progress::new(self.clock.now());
            }
        };

        let Some(raw) = raw else {
            debug!("no stored progress, creating defaults");
            return self.write(Progress::new(self.clock.now())).await;
        };

        match serde_json::from_str::<StoredProgress>(&raw) {
            Ok(stored) => match stored.into_progress(self.clock.now()) {
                Loaded::Current(progress) => progress,
                Loaded::Migrated(progress) => {
                    info!(
                        series = %progress.current_series_id,
                        "migrated progress record: added current series"
                    );
                    self.write(progress).await
                }
            },
            Err(err) => {
                warn!(error = %err, "stored progress is malformed, resetting to defaults");
                self.write(Progress::new(self.clock.now())).await
            }
        }
    }

    /// Load, then repair a current series that the unlock rules do not allow.
    ///
    /// The correction is persisted only when something changed.
    pub async fn load_sanitized(&self) -> Progress {
        let _guard = self.write_lock.lock().await;
        let progress = self.load_locked().await;
        let sanitized = policy::sanitize(progress.clone());
        if sanitized == progress {
            return progress;
        }
        warn!(
            from = %progress.current_series_id,
            to = %sanitized.current_series_id,
            "current series not reachable, progress sanitized"
        );
        self.write(sanitized).await
    }

    /// Persist the full record, stamping `last_updated`. Returns what was written.
    pub async fn save(&self, progress: Progress) -> Progress {
        let _guard = self.write_lock.lock().await;
        self.write(progress).await
    }

    /// Load, apply `change` and persist as one step.
    pub async fn update(&self, change: impl FnOnce(&mut Progress)) -> Progress {
        let _guard = self.write_lock.lock().await;
        let mut progress = self.load_locked().await;
        change(&mut progress);
        self.write(progress).await
    }

    async fn write(&self, mut progress: Progress) -> Progress {
        progress.last_updated = self.clock.now();
        match serde_json::to_string(&progress) {
            Ok(json) => {
                if let Err(err) = self.store.set(PROGRESS_KEY, &json).await {
                    warn!(error = %err, "failed to save progress");
                }
            }
            Err(err) => warn!(error = %err, "failed to serialize progress"),
        }
        progress
    }

    /// Add `lesson_id` to the completed set (idempotent) and persist.
    pub async fn mark_completed(&self, lesson_id: &str) -> Progress {
        self.update(|progress| {
            if progress.mark_completed(lesson_id) {
                info!(lesson = lesson_id, "lesson completed");
            }
        })
        .await
    }

    /// Record the reading position; the current series follows the lesson prefix.
    pub async fn update_position(&self, lesson_id: &str, paragraph_index: usize) -> Progress {
        self.update(|progress| progress.set_position(lesson_id, paragraph_index))
            .await
    }

    pub async fn is_lesson_completed(&self, lesson_id: &str) -> bool {
        self.load().await.is_completed(lesson_id)
    }

    /// Wipe progress and the session pointer entirely.
    pub async fn reset(&self) {
        let _guard = self.write_lock.lock().await;
        for key in [PROGRESS_KEY, SESSION_KEY] {
            if let Err(err) = self.store.delete(key).await {
                warn!(key, error = %err, "failed to clear progress state");
            }
        }
        info!("progress and session reset");
    }

    pub async fn session_id(&self) -> Option<String> {
        match self.store.get(SESSION_KEY).await {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, "failed to read session pointer");
                None
            }
        }
    }

    pub async fn set_session_id(&self, session_id: &str) {
        if let Err(err) = self.store.set(SESSION_KEY, session_id).await {
            warn!(error = %err, "failed to save session pointer");
        }
    }
}
