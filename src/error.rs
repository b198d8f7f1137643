//! Error types shared across the aggregation and rollup layers
//!
//! Only conditions that abort work are modeled here. Thin days, zero-width
//! IQR bounds and malformed stored records are handled in place and counted
//! in the run report instead.

use crate::aggregator_core::quote::Side;

/// Storage backend failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or a statement failed. Fatal for the run.
    #[error("store connectivity error: {0}")]
    Connectivity(String),

    #[error("document serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Connectivity(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    /// VWAP requested over zero admitted ads
    #[error("no admitted {side} ads left to aggregate")]
    EmptyBatch { side: Side },

    /// Listing source failed to return a page
    #[error("ad source unavailable: {0}")]
    SourceUnavailable(String),
}

/// A failed rollup stage, tagged with the day or period being processed
#[derive(Debug, thiserror::Error)]
pub enum RollupError {
    #[error("rollup aborted while processing {context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("interval {context} could not be aggregated: {source}")]
    Aggregation {
        context: String,
        #[source]
        source: AggregationError,
    },
}

impl RollupError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        RollupError::Store {
            context: context.into(),
            source,
        }
    }

    /// The day, period or interval that was being processed
    pub fn context(&self) -> &str {
        match self {
            RollupError::Store { context, .. } | RollupError::Aggregation { context, .. } => {
                context
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
