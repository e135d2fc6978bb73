//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `CatalogService`.
///
/// Every variant carries the URL that was attempted so the failure can be
/// diagnosed from the message alone.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("could not reach {url}: {message}")]
    Network { url: String, message: String },
    #[error("{url} answered with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("{url} returned a body that is not JSON: {message}")]
    Decode { url: String, message: String },
    #[error("{url} returned no lessons")]
    NoLessons { url: String },
}

impl CatalogError {
    /// The URL the failed request was sent to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            CatalogError::Network { url, .. }
            | CatalogError::HttpStatus { url, .. }
            | CatalogError::Decode { url, .. }
            | CatalogError::NoLessons { url } => url,
        }
    }

    /// All URLs attempted before giving up.
    #[must_use]
    pub fn tried_urls(&self) -> Vec<String> {
        vec![self.url().to_string()]
    }
}

/// Errors emitted by `GenerationClient` and `TutorGenerator`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// No credential available and the development bypass is off.
    #[error("sign-in required: no credential available for generation")]
    Unauthorized,
    #[error("generation failed with status {status}")]
    HttpStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    /// Homework is tailored per level and cannot be requested without one.
    #[error("homework requires an understanding level")]
    MissingUnderstanding,
    #[error("generation returned an empty response")]
    EmptyResponse,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
