use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::series::SeriesId;
use crate::model::understanding::Understanding;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown generation type: {raw}")]
pub struct ParseGenerationKindError {
    raw: String,
}

/// Kind of supplementary text the backend can generate for a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Explain,
    Summary,
    UnderstandingQuestion,
    Homework,
    /// Readable rendering of a raw paragraph.
    RenderBlock,
}

impl GenerationKind {
    pub const ALL: [GenerationKind; 5] = [
        GenerationKind::Explain,
        GenerationKind::Summary,
        GenerationKind::UnderstandingQuestion,
        GenerationKind::Homework,
        GenerationKind::RenderBlock,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationKind::Explain => "explain",
            GenerationKind::Summary => "summary",
            GenerationKind::UnderstandingQuestion => "understanding_question",
            GenerationKind::Homework => "homework",
            GenerationKind::RenderBlock => "render_block",
        }
    }
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationKind {
    type Err = ParseGenerationKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParseGenerationKindError { raw: s.to_string() })
    }
}

//
// ─── CACHE KEYS ────────────────────────────────────────────────────────────────
//

/// Deterministic key for a cached generation.
///
/// Layout is `{type}:{series}:{lesson}:{paragraph}`, with homework keys carrying
/// an extra `:{understanding}` segment so different levels never share a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    fn build(kind: GenerationKind, series: SeriesId, lesson_id: &str, paragraph: usize) -> String {
        format!("{kind}:{series}:{lesson_id}:{paragraph}")
    }

    #[must_use]
    pub fn explain(series: SeriesId, lesson_id: &str, paragraph: usize) -> Self {
        Self(Self::build(GenerationKind::Explain, series, lesson_id, paragraph))
    }

    #[must_use]
    pub fn summary(series: SeriesId, lesson_id: &str, paragraph: usize) -> Self {
        Self(Self::build(GenerationKind::Summary, series, lesson_id, paragraph))
    }

    #[must_use]
    pub fn understanding_question(series: SeriesId, lesson_id: &str, paragraph: usize) -> Self {
        Self(Self::build(
            GenerationKind::UnderstandingQuestion,
            series,
            lesson_id,
            paragraph,
        ))
    }

    #[must_use]
    pub fn render_block(series: SeriesId, lesson_id: &str, paragraph: usize) -> Self {
        Self(Self::build(GenerationKind::RenderBlock, series, lesson_id, paragraph))
    }

    #[must_use]
    pub fn homework(
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
        understanding: Understanding,
    ) -> Self {
        Self(format!(
            "{}:{understanding}",
            Self::build(GenerationKind::Homework, series, lesson_id, paragraph)
        ))
    }

    /// Key for any kind except homework, which needs an understanding level.
    ///
    /// Returns `None` for [`GenerationKind::Homework`].
    #[must_use]
    pub fn for_kind(
        kind: GenerationKind,
        series: SeriesId,
        lesson_id: &str,
        paragraph: usize,
    ) -> Option<Self> {
        match kind {
            GenerationKind::Homework => None,
            other => Some(Self(Self::build(other, series, lesson_id, paragraph))),
        }
    }

    /// Homework keys written before the understanding level was part of the key.
    #[must_use]
    pub fn legacy_homework(series: SeriesId, lesson_id: &str, paragraph: usize) -> [String; 2] {
        [
            format!("{}:{series}:{lesson_id}", GenerationKind::Homework),
            Self::build(GenerationKind::Homework, series, lesson_id, paragraph),
        ]
    }

    /// True for a homework key lacking a valid understanding segment.
    #[must_use]
    pub fn is_legacy_homework(raw: &str) -> bool {
        let mut parts = raw.split(':');
        if parts.next() != Some(GenerationKind::Homework.as_str()) {
            return false;
        }
        let rest: Vec<&str> = parts.collect();
        match rest.as_slice() {
            [_, _, _, level] => level.parse::<Understanding>().is_err(),
            _ => true,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic() {
        assert_eq!(
            CacheKey::explain(SeriesId::Ot, "OT-1", 2).as_str(),
            "explain:OT:OT-1:2"
        );
        assert_eq!(
            CacheKey::understanding_question(SeriesId::U, "U-1", 0).as_str(),
            "understanding_question:U:U-1:0"
        );
        assert_eq!(
            CacheKey::homework(SeriesId::L, "L-3", 1, Understanding::Partial).as_str(),
            "homework:L:L-3:1:partial"
        );
    }

    #[test]
    fn homework_levels_do_not_collide() {
        let a = CacheKey::homework(SeriesId::Ot, "OT-1", 0, Understanding::Understood);
        let b = CacheKey::homework(SeriesId::Ot, "OT-1", 0, Understanding::NotYet);
        assert_ne!(a, b);
    }

    #[test]
    fn for_kind_refuses_homework() {
        assert!(CacheKey::for_kind(GenerationKind::Homework, SeriesId::Ot, "OT-1", 0).is_none());
        assert_eq!(
            CacheKey::for_kind(GenerationKind::Summary, SeriesId::Ot, "OT-1", 0),
            Some(CacheKey::summary(SeriesId::Ot, "OT-1", 0))
        );
    }

    #[test]
    fn detects_legacy_homework_keys() {
        for legacy in CacheKey::legacy_homework(SeriesId::Ot, "OT-1", 0) {
            assert!(CacheKey::is_legacy_homework(&legacy), "{legacy}");
        }
        let current = CacheKey::homework(SeriesId::Ot, "OT-1", 0, Understanding::Understood);
        assert!(!CacheKey::is_legacy_homework(current.as_str()));
        assert!(!CacheKey::is_legacy_homework("explain:OT:OT-1:0"));
    }

    #[test]
    fn kind_round_trips_wire_name() {
        for kind in GenerationKind::ALL {
            assert_eq!(kind.as_str().parse::<GenerationKind>().unwrap(), kind);
        }
    }
}
