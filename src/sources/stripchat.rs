//! Stripchat model listing integration.
//!
//! Fetches the current model list from the affiliate models-ext endpoint.
//! Auth: bearer token plus a `userId` query parameter, both supplied via
//! the environment (`STRIPCHAT_USERID`, `STRIPCHAT_BEARER`).
//!
//! The response is an object with a `models` array; each entry carries a
//! `modelsCountry` field among many others we pass through untouched.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::DataSource;
use crate::types::{CensusError, Credentials, Model};

const API_URL: &str = "https://go.rmhfrtnd.com/app/models-ext/models";
const SOURCE_NAME: &str = "stripchat";

/// Env-var names the source reads from the credentials bag.
const USER_ID_KEY: &str = "STRIPCHAT_USERID";
const BEARER_KEY: &str = "STRIPCHAT_BEARER";

/// Max bytes of a provider error body to carry in the error.
const BODY_EXCERPT_LEN: usize = 256;

/// Stripchat data source.
pub struct StripchatSource {
    http: Client,
    api_url: String,
}

impl StripchatSource {
    /// Create a new Stripchat source with the production endpoint.
    pub fn new() -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("camcensus/0.1.0")
            .build()
            .context("Failed to build HTTP client for Stripchat")?;

        Ok(Self {
            http,
            api_url: API_URL.to_string(),
        })
    }

    /// Create a source pointed at an arbitrary endpoint. Used by tests
    /// against a mock server.
    pub fn with_api_url(api_url: impl Into<String>) -> anyhow::Result<Self> {
        let mut source = Self::new()?;
        source.api_url = api_url.into();
        Ok(source)
    }

    /// Truncate a response body for inclusion in an error message.
    fn excerpt(body: &str) -> String {
        if body.len() <= BODY_EXCERPT_LEN {
            body.to_string()
        } else {
            let mut end = BODY_EXCERPT_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}…", &body[..end])
        }
    }
}

#[async_trait]
impl DataSource for StripchatSource {
    async fn fetch_models(&self, credentials: &Credentials) -> Result<Vec<Model>, CensusError> {
        let user_id = credentials.get(USER_ID_KEY).ok_or_else(|| {
            CensusError::Configuration(format!(
                "Stripchat user ID secret ({USER_ID_KEY}) is not configured"
            ))
        })?;
        let bearer = credentials.get(BEARER_KEY).ok_or_else(|| {
            CensusError::Configuration(format!(
                "Stripchat bearer token secret ({BEARER_KEY}) is not configured"
            ))
        })?;

        debug!(url = %self.api_url, "Fetching Stripchat models");

        let resp = self
            .http
            .get(&self.api_url)
            .query(&[("userId", user_id)])
            .bearer_auth(bearer)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CensusError::Transport {
                source_name: SOURCE_NAME.to_string(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CensusError::RemoteApi {
                source_name: SOURCE_NAME.to_string(),
                status: status.as_u16(),
                body: Self::excerpt(&body),
            });
        }

        let payload: serde_json::Value =
            resp.json().await.map_err(|e| CensusError::MalformedResponse {
                source_name: SOURCE_NAME.to_string(),
                message: format!("response body is not valid JSON: {e}"),
            })?;

        // The endpoint returns { "models": [...] }. Anything else is a
        // contract violation, reported rather than silently ignored.
        let models_value = payload
            .get("models")
            .cloned()
            .ok_or_else(|| CensusError::MalformedResponse {
                source_name: SOURCE_NAME.to_string(),
                message: "missing \"models\" field".to_string(),
            })?;

        if !models_value.is_array() {
            return Err(CensusError::MalformedResponse {
                source_name: SOURCE_NAME.to_string(),
                message: "\"models\" field is not an array".to_string(),
            });
        }

        let models: Vec<Model> =
            serde_json::from_value(models_value).map_err(|e| CensusError::MalformedResponse {
                source_name: SOURCE_NAME.to_string(),
                message: format!("could not decode model entries: {e}"),
            })?;

        info!(count = models.len(), "Fetched Stripchat models");

        Ok(models)
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn full_creds() -> Credentials {
        Credentials::from_pairs([(USER_ID_KEY, "12345"), (BEARER_KEY, "token-abc")])
    }

    #[tokio::test]
    async fn test_missing_user_id_is_configuration_error() {
        let source = StripchatSource::new().unwrap();
        let creds = Credentials::from_pairs([(BEARER_KEY, "token-abc")]);

        let err = source.fetch_models(&creds).await.unwrap_err();
        match err {
            CensusError::Configuration(msg) => assert!(msg.contains(USER_ID_KEY)),
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_bearer_is_configuration_error() {
        let source = StripchatSource::new().unwrap();
        let creds = Credentials::from_pairs([(USER_ID_KEY, "12345")]);

        let err = source.fetch_models(&creds).await.unwrap_err();
        match err {
            CensusError::Configuration(msg) => assert!(msg.contains(BEARER_KEY)),
            other => panic!("expected Configuration error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/models")
                    .query_param("userId", "12345")
                    .header("authorization", "Bearer token-abc");
                then.status(200).json_body(serde_json::json!({
                    "models": [
                        {"modelsCountry": "fr", "username": "a"},
                        {"username": "b"},
                    ]
                }));
            })
            .await;

        let source = StripchatSource::with_api_url(server.url("/models")).unwrap();
        let models = source.fetch_models(&full_creds()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].country_code.as_deref(), Some("fr"));
        assert!(models[1].country_code.is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_remote_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/models");
                then.status(503).body("upstream unavailable");
            })
            .await;

        let source = StripchatSource::with_api_url(server.url("/models")).unwrap();
        let err = source.fetch_models(&full_creds()).await.unwrap_err();

        match err {
            CensusError::RemoteApi { status, body, .. } => {
                assert_eq!(status, 503);
                assert!(body.contains("upstream unavailable"));
            }
            other => panic!("expected RemoteApi error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_models_field_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/models");
                then.status(200).json_body(serde_json::json!({"girls": []}));
            })
            .await;

        let source = StripchatSource::with_api_url(server.url("/models")).unwrap();
        let err = source.fetch_models(&full_creds()).await.unwrap_err();

        match err {
            CensusError::MalformedResponse { message, .. } => {
                assert!(message.contains("models"));
            }
            other => panic!("expected MalformedResponse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_array_models_field_is_malformed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/models");
                then.status(200)
                    .json_body(serde_json::json!({"models": "not-a-list"}));
            })
            .await;

        let source = StripchatSource::with_api_url(server.url("/models")).unwrap();
        let err = source.fetch_models(&full_creds()).await.unwrap_err();

        assert!(matches!(err, CensusError::MalformedResponse { .. }));
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let long = "x".repeat(1000);
        let excerpt = StripchatSource::excerpt(&long);
        assert!(excerpt.len() < long.len());
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn test_excerpt_keeps_short_bodies() {
        assert_eq!(StripchatSource::excerpt("short"), "short");
    }
}
