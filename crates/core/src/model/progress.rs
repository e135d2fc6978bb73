use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::series::SeriesId;

/// A learner's position in the curriculum and their completion history.
///
/// `completed_lesson_ids` behaves as a set: membership matters, order does not,
/// and [`Progress::mark_completed`] never adds a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_series_id: SeriesId,
    pub completed_lesson_ids: Vec<String>,
    pub current_lesson_id: Option<String>,
    pub current_paragraph_index: usize,
    /// Advisory only; never used to resolve conflicts.
    pub last_updated: DateTime<Utc>,
}

impl Progress {
    /// Fresh progress: first series, nothing completed, no current lesson.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            current_series_id: SeriesId::first(),
            completed_lesson_ids: Vec::new(),
            current_lesson_id: None,
            current_paragraph_index: 0,
            last_updated: now,
        }
    }

    #[must_use]
    pub fn is_completed(&self, lesson_id: &str) -> bool {
        self.completed_lesson_ids.iter().any(|id| id == lesson_id)
    }

    /// Add `lesson_id` to the completed set. Returns `false` if it was already there.
    pub fn mark_completed(&mut self, lesson_id: &str) -> bool {
        if self.is_completed(lesson_id) {
            return false;
        }
        self.completed_lesson_ids.push(lesson_id.to_string());
        true
    }

    /// Move the reading position; the current series follows the lesson id prefix.
    pub fn set_position(&mut self, lesson_id: &str, paragraph_index: usize) {
        self.current_lesson_id = Some(lesson_id.to_string());
        self.current_paragraph_index = paragraph_index;
        self.current_series_id = SeriesId::from_lesson_id(Some(lesson_id));
    }

    /// Drop the reading position, keeping completions.
    pub fn clear_position(&mut self) {
        self.current_lesson_id = None;
        self.current_paragraph_index = 0;
    }

    /// Collapse duplicate completions, keeping first occurrences.
    pub fn dedup_completed(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.completed_lesson_ids.retain(|id| seen.insert(id.clone()));
    }
}
