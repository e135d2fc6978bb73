use std::sync::Arc;

use storage::repository::Storage;
use tutor_core::model::{Progress, Series, SeriesId};
use tutor_core::{LessonStatus, lesson_statuses};
use tracing::info;

use crate::Clock;
use crate::auth::TokenSource;
use crate::catalog::CatalogService;
use crate::config::TutorConfig;
use crate::error::AppServicesError;
use crate::generation::{GenerationCache, GenerationClient, TutorGenerator};
use crate::progress_service::ProgressStore;

/// Where the learner goes after finishing a lesson.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NextStep {
    /// Another lesson in the same series.
    Lesson { lesson_id: String },
    /// The series is done; the next one is now open.
    Series { series_id: SeriesId },
    /// Last lesson of the last series.
    CurriculumComplete,
}

/// Assembles the tutor services over one storage backend.
#[derive(Clone)]
pub struct TutorServices {
    config: TutorConfig,
    progress: Arc<ProgressStore>,
    catalog: Arc<CatalogService>,
    generator: Arc<TutorGenerator>,
}

impl TutorServices {
    #[must_use]
    pub fn new(
        storage: &Storage,
        clock: Clock,
        config: TutorConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let progress = Arc::new(ProgressStore::new(clock, Arc::clone(&storage.kv)));
        let catalog = Arc::new(CatalogService::new(
            config.clone(),
            clock,
            Arc::clone(&tokens),
        ));
        let cache = GenerationCache::new(clock, Arc::clone(&storage.kv));
        let client = GenerationClient::new(config.clone(), tokens);
        let generator = Arc::new(TutorGenerator::new(client, cache, config.retry));

        Self {
            config,
            progress,
            catalog,
            generator,
        }
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        config: TutorConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::new(&storage, clock, config, tokens))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, config: TutorConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self::new(&Storage::in_memory(), clock, config, tokens)
    }

    #[must_use]
    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn generator(&self) -> Arc<TutorGenerator> {
        Arc::clone(&self.generator)
    }

    /// Per-lesson status, with every lesson opened when the unlock-all
    /// development flag is set.
    #[must_use]
    pub fn lesson_statuses(&self, series: &Series, progress: &Progress) -> Vec<LessonStatus> {
        let statuses = lesson_statuses(series, progress);
        if !self.config.unlock_all_lessons {
            return statuses;
        }
        statuses
            .into_iter()
            .map(|status| match status {
                LessonStatus::Locked => LessonStatus::Available,
                other => other,
            })
            .collect()
    }

    /// Mark `lesson_id` completed and move the position to what comes next.
    ///
    /// Finishing a series moves the current series forward without picking a
    /// lesson; finishing the last series clears the position.
    pub async fn complete_lesson(&self, series: &Series, lesson_id: &str) -> NextStep {
        let next = match series.find_next_lesson_id(lesson_id) {
            Some(next) => NextStep::Lesson {
                lesson_id: next.to_string(),
            },
            None => match series.series_id().next() {
                Some(series_id) => NextStep::Series { series_id },
                None => NextStep::CurriculumComplete,
            },
        };

        self.progress
            .update(|progress| {
                progress.mark_completed(lesson_id);
                match &next {
                    NextStep::Lesson { lesson_id } => progress.set_position(lesson_id, 0),
                    NextStep::Series { series_id } => {
                        progress.clear_position();
                        progress.current_series_id = *series_id;
                    }
                    NextStep::CurriculumComplete => progress.clear_position(),
                }
            })
            .await;
        info!(lesson = lesson_id, next = ?next, "advanced after completion");
        next
    }

    /// Wipe learner progress. Cached generations are kept.
    pub async fn reset(&self) {
        self.progress.reset().await;
    }
}
