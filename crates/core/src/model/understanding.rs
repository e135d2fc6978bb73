use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid understanding level: {raw}")]
pub struct ParseUnderstandingError {
    raw: String,
}

/// A learner's self-assessed comprehension at the end of a lesson.
///
/// Chosen per completion flow and never persisted; it only selects which
/// homework variant to fetch or generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Understanding {
    /// Can recall without explanation.
    Understood,
    /// Would understand if reviewed again.
    Partial,
    /// Needs more practice.
    NotYet,
}

impl Understanding {
    pub const ALL: [Understanding; 3] = [
        Understanding::Understood,
        Understanding::Partial,
        Understanding::NotYet,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Understanding::Understood => "understood",
            Understanding::Partial => "partial",
            Understanding::NotYet => "not_yet",
        }
    }
}

impl fmt::Display for Understanding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Understanding {
    type Err = ParseUnderstandingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| ParseUnderstandingError { raw: s.to_string() })
    }
}
