use std::sync::{Arc, Mutex};

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use tutor_core::model::{Series, SeriesId};

use super::cache::SeriesCache;
use super::parse::parse_series;
use crate::auth::TokenSource;
use crate::config::TutorConfig;
use crate::error::CatalogError;
use crate::Clock;

/// Fetches curriculum series from the content backend, keeping a short-lived
/// in-memory copy of each.
///
/// Failures are not retried here; the caller offers a manual retry instead.
#[derive(Clone)]
pub struct CatalogService {
    client: Client,
    config: TutorConfig,
    clock: Clock,
    tokens: Arc<dyn TokenSource>,
    cache: Arc<Mutex<SeriesCache>>,
}

impl CatalogService {
    #[must_use]
    pub fn new(config: TutorConfig, clock: Clock, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client: Client::new(),
            config,
            clock,
            tokens,
            cache: Arc::new(Mutex::new(SeriesCache::default())),
        }
    }

    #[must_use]
    pub fn series_url(&self, series: SeriesId) -> String {
        self.config.endpoint(&format!("content/series/{series}"))
    }

    /// Fetch a series by loosely typed id (`"OT"`, `"ot"`, `"orientation"`, ...).
    ///
    /// Served from memory while the cached copy is younger than five minutes.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` carrying the attempted URL when the request fails,
    /// the backend answers with an error status, the body is not JSON, or no
    /// lessons can be found in it.
    pub async fn get_series(&self, input: &str) -> Result<Arc<Series>, CatalogError> {
        let series_id = SeriesId::normalize(input);

        if let Some(cached) = self.cached(series_id) {
            debug!(series = %series_id, "using cached series");
            return Ok(cached);
        }

        let url = self.series_url(series_id);
        let body = self.fetch(&url).await?;
        let series = parse_series(series_id, &body)
            .map(Arc::new)
            .ok_or_else(|| CatalogError::NoLessons { url: url.clone() })
            .inspect_err(|err| warn!(error = %err, "catalog response unusable"))?;

        info!(
            series = %series_id,
            lessons = series.lessons().len(),
            "fetched series"
        );
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(series_id, Arc::clone(&series), self.clock.now());
        }
        Ok(series)
    }

    /// Drop every cached series so the next request goes to the network.
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn cached(&self, series_id: SeriesId) -> Option<Arc<Series>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(series_id, self.clock.now()))
    }

    async fn fetch(&self, url: &str) -> Result<Value, CatalogError> {
        debug!(url, "fetching series");
        let mut request = self.client.get(url);
        if let Some(token) = self.tokens.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|err| {
            warn!(url, error = %err, "series request failed");
            CatalogError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url, %status, "series request rejected");
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| CatalogError::Decode {
                url: url.to_string(),
                message: err.to_string(),
            })
    }
}
