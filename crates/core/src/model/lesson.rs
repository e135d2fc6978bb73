use serde::{Deserialize, Serialize};

use crate::model::series::SeriesId;

/// Text shown when the catalog yields no paragraphs for a lesson.
pub const PLACEHOLDER_PARAGRAPH: &str = "(content could not be loaded)";

/// A single lesson: an ordered sequence of paragraphs a learner steps through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    series_id: SeriesId,
    lesson_id: String,
    title: String,
    description: Option<String>,
    paragraphs: Vec<String>,
}

impl Lesson {
    /// Build a lesson. An empty paragraph list is replaced by a single placeholder.
    #[must_use]
    pub fn new(
        series_id: SeriesId,
        lesson_id: impl Into<String>,
        title: impl Into<String>,
        description: Option<String>,
        paragraphs: Vec<String>,
    ) -> Self {
        let paragraphs = if paragraphs.is_empty() {
            vec![PLACEHOLDER_PARAGRAPH.to_string()]
        } else {
            paragraphs
        };
        Self {
            series_id,
            lesson_id: lesson_id.into(),
            title: title.into(),
            description,
            paragraphs,
        }
    }

    #[must_use]
    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Never empty.
    #[must_use]
    pub fn paragraphs(&self) -> &[String] {
        &self.paragraphs
    }

    #[must_use]
    pub fn paragraph(&self, index: usize) -> Option<&str> {
        self.paragraphs.get(index).map(String::as_str)
    }
}

/// A curriculum series with its lessons in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    series_id: SeriesId,
    title: String,
    description: String,
    lessons: Vec<Lesson>,
}

impl Series {
    #[must_use]
    pub fn new(
        series_id: SeriesId,
        title: impl Into<String>,
        description: impl Into<String>,
        lessons: Vec<Lesson>,
    ) -> Self {
        Self {
            series_id,
            title: title.into(),
            description: description.into(),
            lessons,
        }
    }

    #[must_use]
    pub fn series_id(&self) -> SeriesId {
        self.series_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn find_lesson_by_id(&self, lesson_id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.lesson_id == lesson_id)
    }

    #[must_use]
    pub fn find_lesson_index(&self, lesson_id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.lesson_id == lesson_id)
    }

    /// Id of the lesson after `lesson_id`.
    ///
    /// Returns `None` when `lesson_id` is the last lesson, which means the caller
    /// should consider moving on to the next series. An id that is not part of
    /// this series yields the first lesson.
    #[must_use]
    pub fn find_next_lesson_id(&self, lesson_id: &str) -> Option<&str> {
        let next = match self.find_lesson_index(lesson_id) {
            Some(index) => index + 1,
            None => 0,
        };
        self.lessons.get(next).map(Lesson::lesson_id)
    }

    /// True when the series has lessons and every one of them is completed.
    #[must_use]
    pub fn is_completed(&self, completed_lesson_ids: &[String]) -> bool {
        !self.lessons.is_empty()
            && self
                .lessons
                .iter()
                .all(|l| completed_lesson_ids.iter().any(|id| *id == l.lesson_id))
    }
}
