//! Aggregator Core - Order-Book Snapshot Aggregation
//!
//! Turns the ads listed on a P2P exchange at one instant into a single
//! `AggregatedInterval` per pair.
//!
//! # Architecture
//!
//! ```text
//! AdPageSource → AdCollector (AdmissionPolicy per ad, paging signal)
//!     ↓
//! filter_outliers (IQR fences, per batch)
//!     ↓
//! rank_quotes → weighted_vwap (top-N, 1/rank weights) → spread
//!     ↓
//! liquidity_depth + near-VWAP volume
//!     ↓
//! AggregatedInterval → store (USDT_<FIAT>_Binance)
//! ```

pub mod admission;
pub mod blocklist;
pub mod depth;
pub mod interval;
pub mod outlier;
pub mod paging;
pub mod quote;
pub mod vwap;

pub use admission::{
    AdmissionDecision, AdmissionPolicy, AdvertiserAttributes, PrimaryPairPolicy,
    SecondaryPairPolicy,
};
pub use blocklist::{Blocklist, BlocklistProvider};
pub use depth::{liquidity_depth, DepthLevel};
pub use interval::{AggregatedInterval, IntervalAggregator};
pub use outlier::filter_outliers;
pub use paging::{AdCollector, AdPageSource, ListedAd};
pub use quote::{rank_quotes, round2, AdQuote, CurrencyPair, RankedQuote, Side};
pub use vwap::{spread, weighted_vwap};
