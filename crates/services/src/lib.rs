#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generation;
pub mod progress_service;

pub use tutor_core::Clock;

pub use app_services::{NextStep, TutorServices};
pub use auth::{EnvToken, StaticToken, TokenSource};
pub use catalog::CatalogService;
pub use config::TutorConfig;
pub use error::{AppServicesError, CatalogError, GenerationError};
pub use generation::{GenerationCache, GenerationClient, RetryPolicy, TutorGenerator};
pub use progress_service::ProgressStore;
