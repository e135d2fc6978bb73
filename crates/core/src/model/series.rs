use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown series id: {raw}")]
pub struct ParseSeriesIdError {
    raw: String,
}

//
// ─── SERIES ID ─────────────────────────────────────────────────────────────────
//

/// One of the four curriculum series, in the order a learner walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SeriesId {
    #[serde(rename = "OT")]
    Ot,
    #[serde(rename = "U")]
    U,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "C")]
    C,
}

/// Static display metadata for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub transition_name: &'static str,
    pub available: bool,
}

impl SeriesId {
    /// Progression order. A series unlocks only after every earlier one has progress.
    pub const ORDER: [SeriesId; 4] = [SeriesId::Ot, SeriesId::U, SeriesId::L, SeriesId::C];

    #[must_use]
    pub fn first() -> Self {
        Self::ORDER[0]
    }

    /// Canonical code used in lesson ids and on the wire (`OT`, `U`, `L`, `C`).
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SeriesId::Ot => "OT",
            SeriesId::U => "U",
            SeriesId::L => "L",
            SeriesId::C => "C",
        }
    }

    /// Position of this series in [`SeriesId::ORDER`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            SeriesId::Ot => 0,
            SeriesId::U => 1,
            SeriesId::L => 2,
            SeriesId::C => 3,
        }
    }

    /// The series that follows this one, or `None` after the last.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ORDER.get(self.index() + 1).copied()
    }

    /// Series strictly before this one in progression order.
    #[must_use]
    pub fn predecessors(self) -> &'static [SeriesId] {
        &Self::ORDER[..self.index()]
    }

    /// Lenient mapping for loosely typed input such as `"orientation"` or `"ot"`.
    ///
    /// Anything unrecognised falls back to the first series.
    #[must_use]
    pub fn normalize(input: &str) -> Self {
        match input.trim().to_ascii_uppercase().as_str() {
            "U" | "UNDERSTANDING" | "UNDER" => SeriesId::U,
            "L" | "LESSON" => SeriesId::L,
            "C" | "CHALLENGE" | "COMPLETE" => SeriesId::C,
            _ => SeriesId::Ot,
        }
    }

    /// Infer the series from a lesson id prefix (`"U-3"` → `U`), defaulting to `OT`.
    #[must_use]
    pub fn from_lesson_id(lesson_id: Option<&str>) -> Self {
        lesson_id
            .and_then(|id| id.split('-').next())
            .and_then(|prefix| prefix.parse().ok())
            .unwrap_or(SeriesId::Ot)
    }

    /// Prefix every lesson id of this series starts with, e.g. `"OT-"`.
    #[must_use]
    pub fn lesson_prefix(self) -> String {
        format!("{}-", self.as_str())
    }

    /// True when `lesson_id` belongs to this series.
    #[must_use]
    pub fn owns_lesson(self, lesson_id: &str) -> bool {
        lesson_id
            .strip_prefix(self.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
    }

    #[must_use]
    pub fn info(self) -> SeriesInfo {
        match self {
            SeriesId::Ot => SeriesInfo {
                title: "Orientation",
                description: "The first step of the journey",
                transition_name: "Orientation",
                available: true,
            },
            SeriesId::U => SeriesInfo {
                title: "Understanding",
                description: "Understanding your own mind more deeply",
                transition_name: "UNDER (Understanding)",
                available: true,
            },
            SeriesId::L => SeriesInfo {
                title: "Lesson",
                description: "Concrete practice drills",
                transition_name: "LESSON (Lesson)",
                available: true,
            },
            SeriesId::C => SeriesInfo {
                title: "Complete",
                description: "Applying what you learned to everyday life",
                transition_name: "COMPLETE (Complete)",
                available: true,
            },
        }
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::first()
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeriesId {
    type Err = ParseSeriesIdError;

    /// Strict parse of the canonical codes (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OT" => Ok(SeriesId::Ot),
            "U" => Ok(SeriesId::U),
            "L" => Ok(SeriesId::L),
            "C" => Ok(SeriesId::C),
            _ => Err(ParseSeriesIdError { raw: s.to_string() }),
        }
    }
}

/// Numeric ordinal encoded after the series prefix (`"OT-2"` → `2`).
#[must_use]
pub fn lesson_ordinal(lesson_id: &str) -> Option<u32> {
    lesson_id.split('-').nth(1)?.trim().parse().ok()
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
