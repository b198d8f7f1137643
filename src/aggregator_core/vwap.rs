//! Rank-weighted VWAP and bid/ask spread
//!
//! Weight of rank `r` is `1/r`, so top-of-book listings dominate.
//!
//! ```text
//! VWAP = Σ(price · volume · 1/r) / Σ(volume · 1/r)
//! ```

use super::quote::{round2, RankedQuote, Side};
use crate::error::AggregationError;

/// Rank-weighted VWAP over the first `depth` ranked quotes, rounded to 2 decimals
///
/// Returns `EmptyBatch` when nothing is left to weigh; the caller must treat
/// that interval as failed rather than default it.
pub fn weighted_vwap(
    ranked: &[RankedQuote],
    depth: usize,
    side: Side,
) -> Result<f64, AggregationError> {
    let top = &ranked[..ranked.len().min(depth)];

    let (weighted_sum, weighted_volume) = top.iter().fold((0.0, 0.0), |(sum, vol), rq| {
        let weight = 1.0 / rq.rank_position as f64;
        (
            sum + rq.quote.price * rq.quote.volume * weight,
            vol + rq.quote.volume * weight,
        )
    });

    if top.is_empty() || weighted_volume == 0.0 {
        return Err(AggregationError::EmptyBatch { side });
    }

    Ok(round2(weighted_sum / weighted_volume))
}

/// Relative spread in percent, positive when sell exceeds buy
pub fn spread(sell_vwap: f64, buy_vwap: f64) -> f64 {
    round2((sell_vwap - buy_vwap) / ((sell_vwap + buy_vwap) / 2.0) * 100.0)
}
