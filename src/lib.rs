pub mod aggregator_core;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod sqlite_pragma;
pub mod store;

pub use config::RollupConfig;
pub use error::{AggregationError, ConfigError, RollupError, StoreError};
