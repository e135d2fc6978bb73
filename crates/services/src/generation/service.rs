use tracing::{debug, info};

use tutor_core::model::{CacheKey, GenerationKind, SeriesId, Understanding};

use super::cache::GenerationCache;
use super::client::{GenerationClient, GenerationRequest};
use super::retry::{RetryPolicy, tokio_sleep, with_retry};
use crate::error::GenerationError;

/// Cache-first generation of supplementary paragraph text.
///
/// A miss goes to the backend with bounded retries and the result is written
/// back. Explanations answering a learner question are never cached.
#[derive(Clone)]
pub struct TutorGenerator {
    client: GenerationClient,
    cache: GenerationCache,
    retry: RetryPolicy,
}

impl TutorGenerator {
    #[must_use]
    pub fn new(client: GenerationClient, cache: GenerationCache, retry: RetryPolicy) -> Self {
        Self {
            client,
            cache,
            retry,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &GenerationCache {
        &self.cache
    }

    /// # Errors
    ///
    /// Returns `GenerationError` when the call fails after all retries, or
    /// `Unauthorized` without trying when no credential is available.
    pub async fn explain(
        &self,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
        question: Option<&str>,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(GenerationKind::Explain, series, lesson_id, paragraph);
        match question.map(str::trim).filter(|q| !q.is_empty()) {
            Some(question) => self.fetch(&request.with_user_input(question)).await,
            None => {
                self.cached_or_fetch(CacheKey::explain(series, lesson_id, paragraph), request)
                    .await
            }
        }
    }

    /// # Errors
    ///
    /// See [`TutorGenerator::explain`].
    pub async fn summary(
        &self,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
    ) -> Result<String, GenerationError> {
        self.simple(GenerationKind::Summary, series, lesson_id, paragraph)
            .await
    }

    /// # Errors
    ///
    /// See [`TutorGenerator::explain`].
    pub async fn understanding_question(
        &self,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
    ) -> Result<String, GenerationError> {
        self.simple(
            GenerationKind::UnderstandingQuestion,
            series,
            lesson_id,
            paragraph,
        )
        .await
    }

    /// # Errors
    ///
    /// See [`TutorGenerator::explain`].
    pub async fn render_block(
        &self,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
    ) -> Result<String, GenerationError> {
        self.simple(GenerationKind::RenderBlock, series, lesson_id, paragraph)
            .await
    }

    /// Homework tailored to `understanding`, cached per level.
    ///
    /// Level-less entries left by older versions are purged first.
    ///
    /// # Errors
    ///
    /// See [`TutorGenerator::explain`].
    pub async fn homework(
        &self,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
        understanding: Understanding,
    ) -> Result<String, GenerationError> {
        self.cache
            .delete_legacy_homework(series, lesson_id, paragraph)
            .await;
        let key = CacheKey::homework(series, lesson_id, paragraph, understanding);
        let request = GenerationRequest::new(GenerationKind::Homework, series, lesson_id, paragraph)
            .with_understanding(understanding);
        self.cached_or_fetch(key, request).await
    }

    /// Dispatch by kind.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::MissingUnderstanding` for homework without an
    /// understanding level; otherwise see [`TutorGenerator::explain`].
    pub async fn generate(
        &self,
        kind: GenerationKind,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
        understanding: Option<Understanding>,
        question: Option<&str>,
    ) -> Result<String, GenerationError> {
        match kind {
            GenerationKind::Explain => self.explain(series, lesson_id, paragraph, question).await,
            GenerationKind::Homework => {
                let level = understanding.ok_or(GenerationError::MissingUnderstanding)?;
                self.homework(series, lesson_id, paragraph, level).await
            }
            other => self.simple(other, series, lesson_id, paragraph).await,
        }
    }

    async fn simple(
        &self,
        kind: GenerationKind,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
    ) -> Result<String, GenerationError> {
        let request = GenerationRequest::new(kind, series, lesson_id, paragraph);
        match CacheKey::for_kind(kind, series, lesson_id, paragraph) {
            Some(key) => self.cached_or_fetch(key, request).await,
            None => self.fetch(&request).await,
        }
    }

    async fn cached_or_fetch(
        &self,
        key: CacheKey,
        request: GenerationRequest,
    ) -> Result<String, GenerationError> {
        if let Some(text) = self.cache.get(&key).await {
            debug!(%key, "serving generation from cache");
            return Ok(text);
        }
        let text = self.fetch(&request).await?;
        self.cache.set(&key, &text).await;
        Ok(text)
    }

    /// Credential check once, then the retried network call.
    async fn fetch(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let token = self.client.credential()?;
        let context = format!("{} {}#{}", request.kind, request.lesson_id, request.paragraph_index);
        let text = with_retry(
            self.retry,
            &context,
            || self.client.send(request, token.as_deref()),
            tokio_sleep,
        )
        .await?;
        info!(kind = %request.kind, lesson = %request.lesson_id, "generated");
        Ok(text)
    }
}
