//! Data source integrations.
//!
//! Defines the `DataSource` trait and provides implementations for:
//! - Stripchat — live model listing via the affiliate models-ext API
//!
//! Sources fetch and parse only. Normalization, validation, and counting
//! all happen in the aggregator, so a new provider only has to return its
//! raw model records.

pub mod stripchat;

use async_trait::async_trait;

use crate::types::{CensusError, Credentials, Model};

/// Abstraction over external model-listing providers.
///
/// Implementors handle the API request, authentication, and basic parsing,
/// and return the provider's model records unaltered. A failing source
/// never takes the aggregation down — isolation is the aggregator's job,
/// the source just reports the error honestly.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch the current model listing from this provider.
    ///
    /// Fails with `CensusError::Configuration` when a required credential
    /// is missing, `CensusError::RemoteApi` on a non-2xx response, and
    /// `CensusError::MalformedResponse` when the payload doesn't have the
    /// expected shape.
    async fn fetch_models(&self, credentials: &Credentials) -> Result<Vec<Model>, CensusError>;

    /// Source name for logging and identification.
    fn name(&self) -> &str;
}
