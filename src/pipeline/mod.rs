//! # Temporal Rollup Pipeline
//!
//! Rolls stored interval aggregates and curated rate hints up into daily,
//! monthly and quarterly summaries.
//!
//! ## Architecture
//!
//! ```text
//! USDT_<FIAT>_Binance ──┐
//! USDT_BOB_Other ───────┤
//! USD_BOB_Parallel ─────┼──→ DailyComposer ──→ Daily_Averages
//! official/market feeds ┘                         │   ↑
//!                                                 │   └── smoother (USD_BOB_Parallel_series)
//!                                                 ↓
//!                                       reduce_period ──→ Monthly_Averages
//!                                                     └─→ Quarterly_Averages
//! ```
//!
//! **Key Principle:** every write is compare-then-upsert. A run over
//! unchanged inputs writes nothing, and an interrupted run resumes by simply
//! running again.
//!
//! Module layout:
//! - `calendar` - local days and month/quarter keys
//! - `daily` - per-day composition with the fallback policy
//! - `hints` - merging approved hints into a `[lower, upper]` range
//! - `smoother` - gap filling and smoothing of the curated series
//! - `period` - month/quarter reducers
//! - `intervals` - recording and reprocessing interval aggregates
//! - `upsert` - compare-then-upsert and the run report
//! - `engine` - `RollupEngine`, the stage driver

pub mod calendar;
pub mod daily;
pub mod engine;
pub mod hints;
pub mod intervals;
pub mod period;
pub mod smoother;
pub mod types;
pub mod upsert;

pub use calendar::{days_between, periods_between, LocalDay, PeriodKey, PeriodKind};
pub use daily::DailyComposer;
pub use engine::RollupEngine;
pub use hints::merge_hints;
pub use intervals::{record_interval, reprocess_intervals};
pub use period::reduce_period;
pub use smoother::{parallel_curve, smooth_curve};
pub use types::{
    CryptoPairStats, CuratedPeriod, CuratedRange, DailyCandle, DailySummary, HintSource,
    HintType, OfficialPeg, PeriodCandle, PeriodSummary, RateHint, SellQuote,
    PARALLEL_SERIES_FIELD,
};
pub use upsert::{upsert_if_changed, write_if_changed, RollupReport, WriteOutcome};
