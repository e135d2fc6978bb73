use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::{Progress, Series, SeriesId, lesson_ordinal};
use crate::policy::has_completed_lesson_in_series;

/// Display status for a lesson, derived fresh from progress every time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Completed,
    Current,
    Available,
    Locked,
}

impl LessonStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Completed => "completed",
            LessonStatus::Current => "current",
            LessonStatus::Available => "available",
            LessonStatus::Locked => "locked",
        }
    }

    /// Whether the learner can open the lesson.
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, LessonStatus::Locked)
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one lesson at `lesson_index` within `series`.
///
/// Rules, first match wins:
/// 1. completed lessons are `Completed`;
/// 2. outside the current series only index 0 can be `Available`;
/// 3. the current lesson is `Current`;
/// 4. with no current lesson in this series only index 0 is `Available`;
/// 5. otherwise everything up to the current lesson plus the one after it is
///    `Available`, the rest `Locked`.
///
/// Lessons far ahead stay locked even if reached out of order; pacing is linear.
#[must_use]
pub fn calculate_status(
    lesson_id: &str,
    lesson_index: usize,
    series: SeriesId,
    progress: &Progress,
) -> LessonStatus {
    if progress.is_completed(lesson_id) {
        return LessonStatus::Completed;
    }

    if series != progress.current_series_id {
        let opened = series.info().available
            || has_completed_lesson_in_series(series, &progress.completed_lesson_ids);
        return if lesson_index == 0 && opened {
            LessonStatus::Available
        } else {
            LessonStatus::Locked
        };
    }

    if progress.current_lesson_id.as_deref() == Some(lesson_id) {
        return LessonStatus::Current;
    }

    // the window is only derived from ids carrying this series' prefix
    let current = progress
        .current_lesson_id
        .as_deref()
        .filter(|id| series.owns_lesson(id));
    let Some(current) = current else {
        return if lesson_index == 0 {
            LessonStatus::Available
        } else {
            LessonStatus::Locked
        };
    };

    // ordinals are 1-based; an unparsable ordinal leaves only index 0 open
    let current_index = lesson_ordinal(current)
        .and_then(|n| n.checked_sub(1))
        .map(|n| n as usize);
    let next_index = current_index.map_or(0, |i| i + 1);
    let already_passed = current_index.is_some_and(|i| lesson_index <= i);

    if already_passed || lesson_index == next_index {
        LessonStatus::Available
    } else {
        LessonStatus::Locked
    }
}

/// Statuses for every lesson of a fetched series, in lesson order.
#[must_use]
pub fn lesson_statuses(series: &Series, progress: &Progress) -> Vec<LessonStatus> {
    series
        .lessons()
        .iter()
        .enumerate()
        .map(|(index, lesson)| {
            calculate_status(lesson.lesson_id(), index, series.series_id(), progress)
        })
        .collect()
}
