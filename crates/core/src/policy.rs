//! Sequential unlock rules across the fixed `OT → U → L → C` order.
//!
//! Everything here is pure: callers pass the progress they loaded and decide
//! whether to persist a corrected record.

use crate::model::{Progress, SeriesId};

/// True if any completed lesson id carries the `{series}-` prefix.
#[must_use]
pub fn has_completed_lesson_in_series(series: SeriesId, completed_lesson_ids: &[String]) -> bool {
    completed_lesson_ids.iter().any(|id| series.owns_lesson(id))
}

/// The first series is always reachable. Any later series needs at least one
/// completed lesson in *every* earlier series, not just the one right before it.
#[must_use]
pub fn is_series_reachable(series: SeriesId, progress: &Progress) -> bool {
    series
        .predecessors()
        .iter()
        .all(|prev| has_completed_lesson_in_series(*prev, &progress.completed_lesson_ids))
}

/// Whether a learner may open a specific lesson.
///
/// The series must be reachable; past that a lesson opens if it is completed,
/// current, the first of its series, or follows a completed lesson.
#[must_use]
pub fn is_lesson_reachable(
    series: SeriesId,
    lesson_id: &str,
    lesson_index: usize,
    progress: &Progress,
) -> bool {
    if !is_series_reachable(series, progress) {
        return false;
    }
    if progress.is_completed(lesson_id)
        || progress.current_lesson_id.as_deref() == Some(lesson_id)
        || lesson_index == 0
    {
        return true;
    }
    // index N holds ordinal N + 1, so the previous lesson is ordinal N
    let previous = format!("{}{lesson_index}", series.lesson_prefix());
    progress.is_completed(&previous)
}

/// First reachable series without any completed lesson, falling back to the first series.
#[must_use]
pub fn first_reachable_series(progress: &Progress) -> SeriesId {
    SeriesId::ORDER
        .into_iter()
        .find(|series| {
            is_series_reachable(*series, progress)
                && !has_completed_lesson_in_series(*series, &progress.completed_lesson_ids)
        })
        .unwrap_or_else(SeriesId::first)
}

/// Repair a progress record whose current series is not reachable.
///
/// The current series is moved to [`first_reachable_series`] and the reading
/// position is cleared. A valid record is returned unchanged.
#[must_use]
pub fn sanitize(progress: Progress) -> Progress {
    if is_series_reachable(progress.current_series_id, &progress) {
        return progress;
    }
    let mut fixed = progress;
    fixed.current_series_id = first_reachable_series(&fixed);
    fixed.clear_position();
    fixed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn progress_with(completed: &[&str], current: SeriesId) -> Progress {
        let mut p = Progress::new(fixed_now());
        p.completed_lesson_ids = completed.iter().map(|s| (*s).to_string()).collect();
        p.current_series_id = current;
        p
    }

    #[test]
    fn first_series_is_always_reachable() {
        assert!(is_series_reachable(SeriesId::Ot, &progress_with(&[], SeriesId::Ot)));
        assert!(is_series_reachable(SeriesId::Ot, &progress_with(&["C-1"], SeriesId::C)));
    }

    #[test]
    fn every_prior_series_gates_reachability() {
        // U fully done but OT untouched: L stays locked
        let p = progress_with(&["U-1", "U-2", "U-3"], SeriesId::U);
        assert!(!is_series_reachable(SeriesId::L, &p));
        assert!(!is_series_reachable(SeriesId::U, &p));

        let p = progress_with(&["OT-1", "U-2"], SeriesId::U);
        assert!(is_series_reachable(SeriesId::U, &p));
        assert!(is_series_reachable(SeriesId::L, &p));
        assert!(!is_series_reachable(SeriesId::C, &p));
    }

    #[test]
    fn prefix_match_needs_dash() {
        let p = progress_with(&["OTX-1"], SeriesId::Ot);
        assert!(!is_series_reachable(SeriesId::U, &p));
    }

    #[test]
    fn sanitize_resets_unreachable_series() {
        let mut p = progress_with(&[], SeriesId::L);
        p.current_lesson_id = Some("L-2".into());
        p.current_paragraph_index = 5;

        let fixed = sanitize(p);
        assert_eq!(fixed.current_series_id, SeriesId::Ot);
        assert_eq!(fixed.current_lesson_id, None);
        assert_eq!(fixed.current_paragraph_index, 0);
    }

    #[test]
    fn sanitize_picks_first_reachable_series_without_progress() {
        let mut p = progress_with(&["OT-1"], SeriesId::C);
        p.current_lesson_id = Some("C-1".into());
        let fixed = sanitize(p);
        assert_eq!(fixed.current_series_id, SeriesId::U);
        assert_eq!(fixed.completed_lesson_ids, ["OT-1"]);
    }

    #[test]
    fn sanitize_keeps_valid_progress() {
        let mut p = progress_with(&["OT-1"], SeriesId::U);
        p.current_lesson_id = Some("U-1".into());
        p.current_paragraph_index = 2;
        assert_eq!(sanitize(p.clone()), p);
    }

    #[test]
    fn lesson_reachability() {
        let mut p = progress_with(&["OT-1"], SeriesId::Ot);
        p.current_lesson_id = Some("OT-2".into());
        assert!(is_lesson_reachable(SeriesId::Ot, "OT-1", 0, &p));
        assert!(is_lesson_reachable(SeriesId::Ot, "OT-2", 1, &p));
        assert!(!is_lesson_reachable(SeriesId::Ot, "OT-4", 3, &p));
        assert!(is_lesson_reachable(SeriesId::U, "U-1", 0, &p));
        assert!(!is_lesson_reachable(SeriesId::L, "L-1", 0, &p));
    }
}
