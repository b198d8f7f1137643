//! Summary document shapes
//!
//! Field names follow the stored collections (`USDT_BOB_Binance`, ...), so
//! the serde renames here are the wire contract read by chart rendering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Daily field filled in by the curve smoother
pub const PARALLEL_SERIES_FIELD: &str = "USD_BOB_Parallel_series";

/// Daily or period statistics for a crypto P2P pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoPairStats {
    pub sell_vwap: f64,
    pub buy_vwap: f64,
    pub sell_volume: Option<f64>,
    pub buy_volume: Option<f64>,
    pub spread: f64,
}

/// Daily candle from the external market-data feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyCandle {
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Candle reduced over a month or quarter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodCandle {
    pub open: f64,
    pub close: f64,
    /// (mean open + mean close) / 2
    pub average: f64,
    pub high: f64,
    pub low: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellQuote {
    pub sell_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfficialPeg {
    pub sell_price: f64,
    pub buy_price: f64,
}

/// Where an approved hint was read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintSource {
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Curated parallel-rate range for one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedRange {
    /// `[lower, upper]`, absent when no hint contributed a bound
    pub quote_interval: Option<[f64; 2]>,
    pub sources: Vec<HintSource>,
}

/// Curated parallel-rate range reduced over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedPeriod {
    pub quote_interval: Option<[f64; 2]>,
    /// Mean of the smoothed daily series
    pub series_average: Option<f64>,
    pub sources: Vec<HintSource>,
}

/// One calendar day, keyed by the local date at 00:00 UTC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "USDT_BOB_Binance", default)]
    pub usdt_bob: Option<CryptoPairStats>,
    #[serde(rename = "USDT_ARS_Binance", default)]
    pub usdt_ars: Option<CryptoPairStats>,
    #[serde(rename = "USDT_ARS_TradingView", default)]
    pub usdt_ars_market: Option<DailyCandle>,
    #[serde(rename = "USD_ARS_Parallel", default)]
    pub usd_ars_parallel: Option<SellQuote>,
    #[serde(rename = "USD_BOB_Parallel", default)]
    pub usd_bob_parallel: Option<CuratedRange>,
    #[serde(rename = "USD_BOB_Parallel_series", default)]
    pub parallel_series: Option<f64>,
    #[serde(rename = "USD_BOB_Official", default)]
    pub usd_bob_official: Option<OfficialPeg>,
    #[serde(rename = "USD_BOB_Tarjeta", default)]
    pub usd_bob_card: Option<SellQuote>,
    #[serde(rename = "USD_ARS_Official", default)]
    pub usd_ars_official: Option<DailyCandle>,
}

impl DailySummary {
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            usdt_bob: None,
            usdt_ars: None,
            usdt_ars_market: None,
            usd_ars_parallel: None,
            usd_bob_parallel: None,
            parallel_series: None,
            usd_bob_official: None,
            usd_bob_card: None,
            usd_ars_official: None,
        }
    }
}

/// Monthly or quarterly summary keyed by (`month` | `quarter`, `year`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
    pub year: String,
    #[serde(rename = "USDT_BOB_Binance", default)]
    pub usdt_bob: Option<CryptoPairStats>,
    #[serde(rename = "USDT_ARS_Binance", default)]
    pub usdt_ars: Option<CryptoPairStats>,
    #[serde(rename = "USDT_ARS_TradingView", default)]
    pub usdt_ars_market: Option<PeriodCandle>,
    #[serde(rename = "USD_ARS_Parallel", default)]
    pub usd_ars_parallel: Option<SellQuote>,
    #[serde(rename = "USD_BOB_Parallel", default)]
    pub usd_bob_parallel: Option<CuratedPeriod>,
    #[serde(rename = "USD_BOB_Official", default)]
    pub usd_bob_official: Option<OfficialPeg>,
    #[serde(rename = "USD_BOB_Tarjeta", default)]
    pub usd_bob_card: Option<SellQuote>,
    #[serde(rename = "USD_ARS_Official", default)]
    pub usd_ars_official: Option<PeriodCandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintType {
    Exact,
    Above,
    Below,
    Null,
}

/// A human-reviewed parallel-rate mention extracted from news text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHint {
    pub timestamp: DateTime<Utc>,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub quote: Option<f64>,
    #[serde(default)]
    pub hint_type: Option<HintType>,
    #[serde(default)]
    pub human_approved: bool,
}
