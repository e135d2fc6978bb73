mod generation;
mod lesson;
mod progress;
mod series;
mod understanding;

pub use generation::{CacheKey, GenerationKind, ParseGenerationKindError};
pub use lesson::{Lesson, PLACEHOLDER_PARAGRAPH, Series};
pub use progress::Progress;
pub use series::{ParseSeriesIdError, SeriesId, SeriesInfo, lesson_ordinal};
pub use understanding::{ParseUnderstandingError, Understanding};
