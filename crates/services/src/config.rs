use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::generation::RetryPolicy;

/// Runtime configuration for the tutor services.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TutorConfig {
    /// Base URL for `/content/series/{id}` and `/tutor/generate`.
    pub api_base_url: String,
    /// Development bypass: call the generation endpoint without a credential.
    pub skip_auth: bool,
    /// Development flag: show every locked lesson as available.
    pub unlock_all_lessons: bool,
    pub retry: RetryPolicy,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".into(),
            skip_auth: false,
            unlock_all_lessons: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl TutorConfig {
    /// Read configuration from `TUTOR_*` environment variables, falling back
    /// to defaults for anything missing or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_base_url = env::var("TUTOR_API_BASE_URL")
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.api_base_url);
        let max_retries = env_parse("TUTOR_MAX_RETRIES").unwrap_or(defaults.retry.max_retries);
        let base_delay = env_parse::<u64>("TUTOR_RETRY_BASE_MS")
            .map_or(defaults.retry.base_delay, Duration::from_millis);

        Self {
            api_base_url,
            skip_auth: env_flag("TUTOR_SKIP_AUTH"),
            unlock_all_lessons: env_flag("TUTOR_UNLOCK_ALL"),
            retry: RetryPolicy {
                max_retries,
                base_delay,
            },
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Join `path` onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).is_ok_and(|v| parse_flag(&v))
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok()?.trim().parse().ok()
}
