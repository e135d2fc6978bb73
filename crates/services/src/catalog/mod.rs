mod cache;
mod parse;
mod service;

pub use crate::error::CatalogError;
pub use cache::{SERIES_CACHE_TTL_SECS, SeriesCache};
pub use parse::parse_series;
pub use service::CatalogService;
