use std::sync::Arc;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tutor_core::model::{GenerationKind, SeriesId, Understanding};

use crate::auth::TokenSource;
use crate::config::TutorConfig;
use crate::error::GenerationError;

/// One call to the generation endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: GenerationKind,
    pub series_id: SeriesId,
    pub lesson_id: String,
    pub paragraph_index: usize,
    /// Learner free text, used by `explain`.
    pub user_input: Option<String>,
    /// Self-reported level, used by `homework`.
    pub understanding: Option<Understanding>,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(
        kind: GenerationKind,
        series_id: SeriesId,
        lesson_id: impl Into<String>,
        paragraph_index: usize,
    ) -> Self {
        Self {
            kind,
            series_id,
            lesson_id: lesson_id.into(),
            paragraph_index,
            user_input: None,
            understanding: None,
        }
    }

    #[must_use]
    pub fn with_user_input(mut self, input: impl Into<String>) -> Self {
        self.user_input = Some(input.into());
        self
    }

    #[must_use]
    pub fn with_understanding(mut self, understanding: Understanding) -> Self {
        self.understanding = Some(understanding);
        self
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(rename = "type")]
    kind: GenerationKind,
    series_id: SeriesId,
    lesson_id: &'a str,
    chunk_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_input: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    understanding: Option<Understanding>,
}

impl<'a> From<&'a GenerationRequest> for WireRequest<'a> {
    fn from(req: &'a GenerationRequest) -> Self {
        Self {
            kind: req.kind,
            series_id: req.series_id,
            lesson_id: &req.lesson_id,
            chunk_index: req.paragraph_index,
            user_input: req.user_input.as_deref(),
            understanding: req.understanding,
        }
    }
}

#[derive(Deserialize)]
struct WireResponse {
    #[serde(default)]
    content: Option<String>,
}

/// Thin HTTP client for `POST /tutor/generate`.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    config: TutorConfig,
    tokens: Arc<dyn TokenSource>,
}

impl GenerationClient {
    #[must_use]
    pub fn new(config: TutorConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            client: Client::new(),
            config,
            tokens,
        }
    }

    #[must_use]
    pub fn generate_url(&self) -> String {
        self.config.endpoint("tutor/generate")
    }

    /// Resolve the bearer credential before any network I/O.
    ///
    /// `Ok(None)` means the development bypass is on and no token is available.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Unauthorized` when no token is available and
    /// the bypass is off.
    pub fn credential(&self) -> Result<Option<String>, GenerationError> {
        match self.tokens.token() {
            Some(token) => Ok(Some(token)),
            None if self.config.skip_auth => {
                debug!("no credential, auth bypass enabled");
                Ok(None)
            }
            None => Err(GenerationError::Unauthorized),
        }
    }

    /// Single attempt: check credentials, then send.
    ///
    /// # Errors
    ///
    /// See [`GenerationClient::credential`] and [`GenerationClient::send`].
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let token = self.credential()?;
        self.send(request, token.as_deref()).await
    }

    /// Send one request with an already resolved credential.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::HttpStatus` on a non-success answer,
    /// `GenerationError::EmptyResponse` when `content` is missing or blank,
    /// and `GenerationError::Http` for transport or decode failures.
    pub async fn send(
        &self,
        request: &GenerationRequest,
        token: Option<&str>,
    ) -> Result<String, GenerationError> {
        let url = self.generate_url();
        debug!(
            kind = %request.kind,
            lesson = %request.lesson_id,
            paragraph = request.paragraph_index,
            "requesting generation"
        );

        let mut builder = self.client.post(&url).json(&WireRequest::from(request));
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, "generation request rejected");
            return Err(GenerationError::HttpStatus { status, body });
        }

        let body: WireResponse = response.json().await?;
        body.content
            .filter(|text| !text.trim().is_empty())
            .ok_or(GenerationError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use serde_json::json;

    #[test]
    fn wire_body_omits_absent_extras() {
        let req = GenerationRequest::new(GenerationKind::Summary, SeriesId::Ot, "OT-1", 2);
        let body = serde_json::to_value(WireRequest::from(&req)).unwrap();
        assert_eq!(
            body,
            json!({"type": "summary", "series_id": "OT", "lesson_id": "OT-1", "chunk_index": 2})
        );
    }

    #[test]
    fn wire_body_carries_extras() {
        let req = GenerationRequest::new(GenerationKind::Homework, SeriesId::U, "U-3", 0)
            .with_understanding(Understanding::NotYet);
        let body = serde_json::to_value(WireRequest::from(&req)).unwrap();
        assert_eq!(body["type"], "homework");
        assert_eq!(body["understanding"], "not_yet");

        let req = GenerationRequest::new(GenerationKind::Explain, SeriesId::U, "U-3", 0)
            .with_user_input("why?");
        let body = serde_json::to_value(WireRequest::from(&req)).unwrap();
        assert_eq!(body["user_input"], "why?");
    }

    #[test]
    fn missing_credential_is_rejected_unless_bypassed() {
        let config = TutorConfig::default();
        let client = GenerationClient::new(config.clone(), Arc::new(StaticToken::none()));
        assert!(matches!(
            client.credential(),
            Err(GenerationError::Unauthorized)
        ));

        let bypass = TutorConfig {
            skip_auth: true,
            ..config.clone()
        };
        let client = GenerationClient::new(bypass, Arc::new(StaticToken::none()));
        assert_eq!(client.credential().unwrap(), None);

        let client = GenerationClient::new(config, Arc::new(StaticToken::new("t")));
        assert_eq!(client.credential().unwrap().as_deref(), Some("t"));
    }
}
