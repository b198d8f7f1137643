//! Composition of one day's summary from the source collections
//!
//! | Series | Source | Rule |
//! |---|---|---|
//! | USDT_BOB_Binance | interval rows in the local day | mean, needs `min_daily_samples` rows, else `USDT_BOB_Other` |
//! | USDT_ARS_Binance | interval rows in the local day | mean, needs `min_daily_samples` rows, else null |
//! | USDT_ARS_TradingView | rows at the day key, from the cutover on | mean OHLC, summed volume |
//! | USD_BOB_Parallel | approved hints in the local day | `merge_hints` |
//! | USD_ARS_Parallel, USD_BOB_Tarjeta, USD_ARS_Official | row at the day key | copied |
//! | USD_BOB_Official | config | constant peg |
//!
//! Hints are read when the day is processed: a hint approved while the run
//! is past its day is picked up by the next run.

use super::calendar::LocalDay;
use super::hints::merge_hints;
use super::types::{
    CryptoPairStats, CuratedRange, DailyCandle, DailySummary, OfficialPeg, RateHint, SellQuote,
};
use super::upsert::RollupReport;
use crate::aggregator_core::quote::round2;
use crate::aggregator_core::vwap::spread;
use crate::config::RollupConfig;
use crate::error::StoreError;
use crate::store::{collections, from_document, Document, DocumentQuery, DocumentStore};
use serde::de::DeserializeOwned;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct IntervalRow {
    sell_vwap: f64,
    buy_vwap: f64,
    #[serde(default)]
    sell_volume: Option<f64>,
    #[serde(default)]
    buy_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FallbackRow {
    sell_price: f64,
    buy_price: f64,
}

#[derive(Debug, Deserialize)]
struct CandleRow {
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    #[serde(default)]
    volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CardRow {
    price: f64,
}

/// Decode rows, skipping and counting the ones missing required fields
pub(crate) fn decode_rows<T: DeserializeOwned>(
    docs: Vec<Document>,
    collection: &str,
    report: &mut RollupReport,
) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match from_document::<T>(doc) {
            Ok(row) => Some(row),
            Err(e) => {
                log::warn!("⚠️  Skipping malformed {} record: {}", collection, e);
                report.malformed_records += 1;
                None
            }
        })
        .collect()
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

// Zero daily volume is stored as null.
fn nonzero(volume: Option<f64>) -> Option<f64> {
    volume.filter(|v| *v != 0.0)
}

fn crypto_stats(rows: &[IntervalRow]) -> Option<CryptoPairStats> {
    let sell_vwap = round2(mean(rows.iter().map(|r| r.sell_vwap))?);
    let buy_vwap = round2(mean(rows.iter().map(|r| r.buy_vwap))?);
    Some(CryptoPairStats {
        sell_vwap,
        buy_vwap,
        sell_volume: nonzero(mean(rows.iter().filter_map(|r| r.sell_volume)).map(round2)),
        buy_volume: nonzero(mean(rows.iter().filter_map(|r| r.buy_volume)).map(round2)),
        spread: spread(sell_vwap, buy_vwap),
    })
}

fn fallback_stats(rows: &[FallbackRow]) -> Option<CryptoPairStats> {
    let sell_vwap = round2(mean(rows.iter().map(|r| r.sell_price))?);
    let buy_vwap = round2(mean(rows.iter().map(|r| r.buy_price))?);
    Some(CryptoPairStats {
        sell_vwap,
        buy_vwap,
        sell_volume: None,
        buy_volume: None,
        spread: spread(sell_vwap, buy_vwap),
    })
}

fn candle(row: &CandleRow) -> DailyCandle {
    DailyCandle {
        open: round2(row.open),
        close: round2(row.close),
        high: round2(row.high),
        low: round2(row.low),
        volume: None,
    }
}

/// Reads the source collections for one local day
pub struct DailyComposer<'a, S: DocumentStore + ?Sized> {
    store: &'a S,
    config: &'a RollupConfig,
}

impl<'a, S: DocumentStore + ?Sized> DailyComposer<'a, S> {
    pub fn new(store: &'a S, config: &'a RollupConfig) -> Self {
        Self { store, config }
    }

    pub fn compose(
        &self,
        day: &LocalDay,
        report: &mut RollupReport,
    ) -> Result<DailySummary, StoreError> {
        let mut summary = DailySummary::empty(day.key);

        summary.usdt_bob = self.crypto_pair(day, collections::USDT_BOB_BINANCE, report)?;
        if summary.usdt_bob.is_none() {
            summary.usdt_bob = self.primary_fallback(day, report)?;
            if summary.usdt_bob.is_some() {
                log::debug!(
                    "{} USDT_BOB_Binance built from {}",
                    day.date,
                    collections::USDT_BOB_OTHER
                );
                report.fallback_days += 1;
            }
        }
        summary.usdt_ars = self.crypto_pair(day, collections::USDT_ARS_BINANCE, report)?;

        if day.date >= self.config.market_feed_cutover {
            summary.usdt_ars_market = self.market_candle(day, report)?;
        }

        summary.usd_bob_parallel = self.curated_range(day, report)?;

        summary.usd_ars_parallel = self
            .at_key::<SellQuote>(day, collections::USD_ARS_PARALLEL, report)?;
        summary.usd_bob_card = self
            .at_key::<CardRow>(day, collections::USD_BOB_TARJETA, report)?
            .map(|row| SellQuote { sell_price: row.price });
        summary.usd_ars_official = self
            .at_key::<CandleRow>(day, collections::USD_ARS_OFFICIAL, report)?
            .map(|row| candle(&row));

        summary.usd_bob_official = Some(OfficialPeg {
            sell_price: self.config.official_sell_rate,
            buy_price: self.config.official_buy_rate,
        });

        Ok(summary)
    }

    fn crypto_pair(
        &self,
        day: &LocalDay,
        collection: &str,
        report: &mut RollupReport,
    ) -> Result<Option<CryptoPairStats>, StoreError> {
        let docs = self.store.find(collection, &DocumentQuery::range(day.start, day.end))?;
        let rows: Vec<IntervalRow> = decode_rows(docs, collection, report);

        if rows.len() < self.config.min_daily_samples {
            if !rows.is_empty() {
                log::debug!(
                    "{} {}: {} interval(s), below minimum of {}",
                    day.date,
                    collection,
                    rows.len(),
                    self.config.min_daily_samples
                );
            }
            return Ok(None);
        }
        Ok(crypto_stats(&rows))
    }

    fn primary_fallback(
        &self,
        day: &LocalDay,
        report: &mut RollupReport,
    ) -> Result<Option<CryptoPairStats>, StoreError> {
        let docs = self
            .store
            .find(collections::USDT_BOB_OTHER, &DocumentQuery::range(day.start, day.end))?;
        let rows: Vec<FallbackRow> = decode_rows(docs, collections::USDT_BOB_OTHER, report);
        Ok(fallback_stats(&rows))
    }

    fn market_candle(
        &self,
        day: &LocalDay,
        report: &mut RollupReport,
    ) -> Result<Option<DailyCandle>, StoreError> {
        let docs = self
            .store
            .find(collections::USDT_ARS_TRADINGVIEW, &DocumentQuery::at(day.key))?;
        let rows: Vec<CandleRow> = decode_rows(docs, collections::USDT_ARS_TRADINGVIEW, report);

        let Some(open) = mean(rows.iter().map(|r| r.open)) else {
            return Ok(None);
        };
        Ok(Some(DailyCandle {
            open: round2(open),
            close: round2(mean(rows.iter().map(|r| r.close)).unwrap_or(open)),
            high: round2(mean(rows.iter().map(|r| r.high)).unwrap_or(open)),
            low: round2(mean(rows.iter().map(|r| r.low)).unwrap_or(open)),
            volume: Some(round2(rows.iter().filter_map(|r| r.volume).sum())),
        }))
    }

    fn curated_range(
        &self,
        day: &LocalDay,
        report: &mut RollupReport,
    ) -> Result<Option<CuratedRange>, StoreError> {
        let query = DocumentQuery::range(day.start, day.end).with("human_approved", true);
        let docs = self.store.find(collections::USD_BOB_PARALLEL, &query)?;
        let hints: Vec<RateHint> = decode_rows(docs, collections::USD_BOB_PARALLEL, report);
        Ok(merge_hints(&hints))
    }

    fn at_key<T: DeserializeOwned>(
        &self,
        day: &LocalDay,
        collection: &str,
        report: &mut RollupReport,
    ) -> Result<Option<T>, StoreError> {
        let docs = self
            .store
            .find_one(collection, &DocumentQuery::at(day.key))?
            .into_iter()
            .collect();
        Ok(decode_rows(docs, collection, report).into_iter().next())
    }
}
