//! Shared types for CamCensus.
//!
//! The data model is deliberately thin: providers return arbitrary JSON
//! records, and the only field the aggregation layer understands is the
//! country code. Everything else is carried opaquely.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A single model record as returned by a provider.
///
/// `modelsCountry` is the one field the aggregator reads; all other
/// provider-specific fields are preserved untouched in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// Two-letter country code, if the provider supplied one.
    /// Not validated at this layer — the aggregator does that.
    #[serde(rename = "modelsCountry", default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,

    /// Provider-specific fields we don't interpret.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Model {
    /// Convenience constructor used heavily in tests.
    pub fn with_country(code: &str) -> Self {
        Self {
            country_code: Some(code.to_string()),
            extra: serde_json::Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// AggregatedData
// ---------------------------------------------------------------------------

/// Count of models per two-letter uppercase country code.
///
/// Keys exist only for codes that passed validation. Built once per
/// aggregation call and never mutated afterwards.
pub type AggregatedData = HashMap<String, u64>;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Opaque bag of provider secrets.
///
/// Sources look up the environment-variable names they need; the bag itself
/// knows nothing about any provider. Passed by reference into every fetch
/// and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    values: HashMap<String, String>,
}

impl Credentials {
    /// Capture the current process environment.
    ///
    /// Read at call time (per request), not at startup, so secrets rotated
    /// in the environment take effect without a restart.
    pub fn from_env() -> Self {
        Self {
            values: std::env::vars().collect(),
        }
    }

    /// Build from explicit key/value pairs. Used by tests.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a secret by its environment-variable name.
    /// Empty values are treated as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for CamCensus.
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    /// Missing required credential or an empty source list.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A provider answered with a non-2xx status.
    #[error("Remote API error ({source_name}): status {status}: {body}")]
    RemoteApi {
        source_name: String,
        status: u16,
        body: String,
    },

    /// A provider answered 2xx but the payload wasn't structured as expected.
    #[error("Malformed response from {source_name}: {message}")]
    MalformedResponse {
        source_name: String,
        message: String,
    },

    /// The request never produced a response (DNS, connect, timeout).
    #[error("Request to {source_name} failed: {source}")]
    Transport {
        source_name: String,
        #[source]
        source: reqwest::Error,
    },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
