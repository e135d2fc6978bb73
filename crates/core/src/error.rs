use thiserror::Error;

use crate::model::{ParseGenerationKindError, ParseSeriesIdError, ParseUnderstandingError};

/// Any parse failure raised by the domain crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    SeriesId(#[from] ParseSeriesIdError),
    #[error(transparent)]
    Understanding(#[from] ParseUnderstandingError),
    #[error(transparent)]
    GenerationKind(#[from] ParseGenerationKindError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationKind, SeriesId, Understanding};

    fn parse_all(
        series: &str,
        kind: &str,
        level: &str,
    ) -> Result<(SeriesId, GenerationKind, Understanding), Error> {
        Ok((series.parse()?, kind.parse()?, level.parse()?))
    }

    #[test]
    fn parse_failures_convert_into_domain_error() {
        assert!(parse_all("U", "homework", "partial").is_ok());
        assert!(matches!(
            parse_all("X", "homework", "partial"),
            Err(Error::SeriesId(_))
        ));
        assert!(matches!(
            parse_all("U", "quiz", "partial"),
            Err(Error::GenerationKind(_))
        ));
        assert!(matches!(
            parse_all("U", "summary", "meh"),
            Err(Error::Understanding(_))
        ));
    }
}
