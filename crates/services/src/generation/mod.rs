//! Supplementary text generation: local cache, HTTP client and retry loop.

mod cache;
mod client;
mod retry;
mod service;

pub use cache::{
    CACHE_MAX_ITEMS, CACHE_STORAGE_KEY, CACHE_TTL_DAYS, CACHE_VERSION, CacheStats,
    GenerationCache,
};
pub use client::{GenerationClient, GenerationRequest};
pub use retry::{RetryPolicy, tokio_sleep, with_retry};
pub use service::TutorGenerator;
