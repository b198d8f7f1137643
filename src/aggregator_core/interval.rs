//! Per-interval aggregation of a sell/buy ad snapshot
//!
//! ```text
//! raw batch → OutlierFilter → rank → VWAP(top-N) ─┐
//!                               └──→ depth, near-VWAP volume
//! ```

use super::blocklist::Blocklist;
use super::depth::{liquidity_depth, DepthLevel};
use super::outlier::filter_outliers;
use super::quote::{rank_quotes, round2, AdQuote, CurrencyPair, Side};
use super::vwap::{spread, weighted_vwap};
use crate::error::AggregationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Band around the VWAP inside which volume counts as near-price liquidity
const NEAR_VWAP_BAND: f64 = 0.01;

/// One stored snapshot per (timestamp, pair)
///
/// Every field except `timestamp` is a pure function of the raw batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedInterval {
    pub timestamp: DateTime<Utc>,
    pub sell_vwap: f64,
    pub buy_vwap: f64,
    pub spread: f64,
    pub sell_volume: f64,
    pub buy_volume: f64,
    pub sell_liquidity_depth: Vec<DepthLevel>,
    pub buy_liquidity_depth: Vec<DepthLevel>,
    pub sell_raw_data: Vec<AdQuote>,
    pub buy_raw_data: Vec<AdQuote>,
}

/// Builds `AggregatedInterval`s for one currency pair
#[derive(Debug, Clone)]
pub struct IntervalAggregator {
    pair: CurrencyPair,
}

impl IntervalAggregator {
    pub fn new(pair: CurrencyPair) -> Self {
        Self { pair }
    }

    pub fn pair(&self) -> &CurrencyPair {
        &self.pair
    }

    /// Aggregate admitted sell/buy batches captured at `timestamp`
    pub fn aggregate(
        &self,
        timestamp: DateTime<Utc>,
        sell_raw_data: Vec<AdQuote>,
        buy_raw_data: Vec<AdQuote>,
    ) -> Result<AggregatedInterval, AggregationError> {
        let sell = filter_outliers(sell_raw_data.clone());
        let buy = filter_outliers(buy_raw_data.clone());

        let depth = self.pair.vwap_depth();
        let sell_vwap = weighted_vwap(&rank_quotes(sell.clone()), depth, Side::Sell)?;
        let buy_vwap = weighted_vwap(&rank_quotes(buy.clone()), depth, Side::Buy)?;

        let sell_ceiling = sell_vwap + sell_vwap * NEAR_VWAP_BAND;
        let sell_volume = round2(
            sell.iter()
                .filter(|q| q.price > 0.0 && q.price < sell_ceiling)
                .map(|q| q.volume)
                .sum(),
        );

        let buy_floor = buy_vwap - buy_vwap * NEAR_VWAP_BAND;
        let buy_volume = round2(
            buy.iter()
                .filter(|q| q.price > buy_floor)
                .map(|q| q.volume)
                .sum(),
        );

        Ok(AggregatedInterval {
            timestamp,
            sell_vwap,
            buy_vwap,
            spread: spread(sell_vwap, buy_vwap),
            sell_volume,
            buy_volume,
            sell_liquidity_depth: liquidity_depth(&sell),
            buy_liquidity_depth: liquidity_depth(&buy),
            sell_raw_data,
            buy_raw_data,
        })
    }

    /// Re-derive a stored interval from its raw batches
    ///
    /// The primary pair drops ads from advertisers blocked since capture; the
    /// stored raw batches are replaced by the filtered ones.
    pub fn reaggregate(
        &self,
        stored: &AggregatedInterval,
        blocklist: &Blocklist,
    ) -> Result<AggregatedInterval, AggregationError> {
        let keep = |q: &AdQuote| !(self.pair.is_primary() && blocklist.contains(&q.username));

        let sell = stored.sell_raw_data.iter().filter(|q| keep(q)).cloned().collect();
        let buy = stored.buy_raw_data.iter().filter(|q| keep(q)).cloned().collect();

        self.aggregate(stored.timestamp, sell, buy)
    }
}
