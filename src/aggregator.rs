//! Multi-source aggregation.
//!
//! Fans out to every configured data source concurrently, isolates
//! per-source failures, and tallies the combined model list into a count
//! per two-letter country code. One misbehaving provider never blocks the
//! others — its error is logged and it simply contributes nothing.

use futures::future::join_all;
use tracing::{info, warn};

use crate::sources::DataSource;
use crate::types::{AggregatedData, CensusError, Credentials, Model};

/// Aggregates model listings from multiple data sources.
pub struct Aggregator {
    sources: Vec<Box<dyn DataSource>>,
}

impl std::fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Aggregator")
            .field("sources", &self.sources.len())
            .finish()
    }
}

impl Aggregator {
    /// Create an aggregator over a non-empty set of sources.
    ///
    /// An empty set is rejected up front rather than silently serving an
    /// always-empty aggregate.
    pub fn new(sources: Vec<Box<dyn DataSource>>) -> Result<Self, CensusError> {
        if sources.is_empty() {
            return Err(CensusError::Configuration(
                "Aggregator requires at least one data source".to_string(),
            ));
        }
        Ok(Self { sources })
    }

    /// Fetch from all sources concurrently and count models per country.
    ///
    /// Per-source errors are contained here: a failing source is logged and
    /// substituted with an empty list, so the method itself cannot fail.
    /// Zero valid models yields an empty mapping, which is a normal outcome.
    pub async fn get_aggregated_data(&self, credentials: &Credentials) -> AggregatedData {
        info!(sources = self.sources.len(), "Aggregating data");

        // Fan out to every source; the join_all is the barrier — counting
        // starts only once every fetch has settled.
        let fetches = self.sources.iter().map(|source| async move {
            let outcome = source.fetch_models(credentials).await;
            (source.name(), outcome)
        });

        let mut all_models: Vec<Model> = Vec::new();
        for (name, outcome) in join_all(fetches).await {
            match outcome {
                Ok(models) => all_models.extend(models),
                Err(e) => {
                    warn!(source = name, error = %e, "Source fetch failed, continuing without");
                }
            }
        }

        info!(total = all_models.len(), "Models fetched across all sources");

        let mut counts = AggregatedData::new();
        for model in &all_models {
            if let Some(code) = model.country_code.as_deref().and_then(normalize_country_code) {
                *counts.entry(code).or_insert(0) += 1;
            }
        }

        info!(countries = counts.len(), "Aggregation complete");

        counts
    }
}

/// Trim, uppercase, and validate a raw country code.
///
/// Accepts exactly two ASCII letters; anything else is rejected. This is a
/// strict format check, not an ISO-3166 lookup — unknown but well-formed
/// codes pass through.
fn normalize_country_code(raw: &str) -> Option<String> {
    let code = raw.trim().to_uppercase();
    if code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase()) {
        Some(code)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
