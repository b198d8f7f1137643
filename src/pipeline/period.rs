//! Reduction of daily summaries into a month or quarter
//!
//! Per series:
//! - crypto pairs: mean prices and volumes, spread recomputed from the means
//! - candles: first open, last close, max high, min low, mean volume,
//!   `average` = (mean open + mean close) / 2
//! - sell quotes: mean
//! - curated range: min of lowers, max of uppers, sources unioned,
//!   `series_average` = mean of the smoothed daily series
//! - official peg: carried as is
//!
//! A series absent on every day of the period is null.

use super::calendar::{PeriodKey, PeriodKind};
use super::types::{
    CryptoPairStats, CuratedPeriod, DailyCandle, DailySummary, HintSource, OfficialPeg,
    PeriodCandle, PeriodSummary, SellQuote,
};
use crate::aggregator_core::quote::round2;
use crate::aggregator_core::vwap::spread;

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn present<'a, T: 'a>(
    days: &'a [DailySummary],
    series: impl Fn(&'a DailySummary) -> Option<&'a T>,
) -> Vec<&'a T> {
    days.iter().filter_map(series).collect()
}

fn reduce_crypto(stats: &[&CryptoPairStats]) -> Option<CryptoPairStats> {
    let sell_vwap = round2(mean(stats.iter().map(|s| s.sell_vwap))?);
    let buy_vwap = round2(mean(stats.iter().map(|s| s.buy_vwap))?);
    Some(CryptoPairStats {
        sell_vwap,
        buy_vwap,
        sell_volume: mean(stats.iter().filter_map(|s| s.sell_volume)).map(round2),
        buy_volume: mean(stats.iter().filter_map(|s| s.buy_volume)).map(round2),
        spread: spread(sell_vwap, buy_vwap),
    })
}

fn reduce_candles(candles: &[&DailyCandle]) -> Option<PeriodCandle> {
    let first = candles.first()?;
    let last = candles.last()?;
    let mean_open = mean(candles.iter().map(|c| c.open))?;
    let mean_close = mean(candles.iter().map(|c| c.close))?;

    Some(PeriodCandle {
        open: round2(first.open),
        close: round2(last.close),
        average: round2((mean_open + mean_close) / 2.0),
        high: round2(candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max)),
        low: round2(candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min)),
        volume: mean(candles.iter().filter_map(|c| c.volume)).map(round2),
    })
}

fn reduce_sell_quotes(quotes: &[&SellQuote]) -> Option<SellQuote> {
    mean(quotes.iter().map(|q| q.sell_price)).map(|m| SellQuote {
        sell_price: round2(m),
    })
}

fn reduce_curated(days: &[DailySummary]) -> Option<CuratedPeriod> {
    let ranges = present(days, |d| d.usd_bob_parallel.as_ref());
    if ranges.is_empty() {
        return None;
    }

    let intervals: Vec<[f64; 2]> = ranges.iter().filter_map(|r| r.quote_interval).collect();
    let quote_interval = (!intervals.is_empty()).then(|| {
        [
            intervals.iter().map(|i| i[0]).fold(f64::INFINITY, f64::min),
            intervals.iter().map(|i| i[1]).fold(f64::NEG_INFINITY, f64::max),
        ]
    });

    let mut sources: Vec<HintSource> = Vec::new();
    for source in ranges.iter().flat_map(|r| r.sources.iter()) {
        if !sources.contains(source) {
            sources.push(source.clone());
        }
    }

    Some(CuratedPeriod {
        quote_interval,
        series_average: mean(days.iter().filter_map(|d| d.parallel_series)).map(round2),
        sources,
    })
}

/// Reduce the period's daily summaries, ascending by date
pub fn reduce_period(key: &PeriodKey, days: &[DailySummary]) -> PeriodSummary {
    let (month, quarter) = match key.kind {
        PeriodKind::Month => (Some(key.index.to_string()), None),
        PeriodKind::Quarter => (None, Some(key.index.to_string())),
    };

    PeriodSummary {
        month,
        quarter,
        year: key.year.to_string(),
        usdt_bob: reduce_crypto(&present(days, |d| d.usdt_bob.as_ref())),
        usdt_ars: reduce_crypto(&present(days, |d| d.usdt_ars.as_ref())),
        usdt_ars_market: reduce_candles(&present(days, |d| d.usdt_ars_market.as_ref())),
        usd_ars_parallel: reduce_sell_quotes(&present(days, |d| d.usd_ars_parallel.as_ref())),
        usd_bob_parallel: reduce_curated(days),
        usd_bob_official: present(days, |d| d.usd_bob_official.as_ref())
            .last()
            .map(|peg| OfficialPeg {
                sell_price: peg.sell_price,
                buy_price: peg.buy_price,
            }),
        usd_bob_card: reduce_sell_quotes(&present(days, |d| d.usd_bob_card.as_ref())),
        usd_ars_official: reduce_candles(&present(days, |d| d.usd_ars_official.as_ref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::CuratedRange;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn day(d: u32) -> DailySummary {
        DailySummary::empty(Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap())
    }

    fn march() -> PeriodKey {
        PeriodKey::containing(PeriodKind::Month, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    fn stats(sell_vwap: f64, buy_vwap: f64, sell_volume: Option<f64>) -> CryptoPairStats {
        CryptoPairStats {
            sell_vwap,
            buy_vwap,
            sell_volume,
            buy_volume: None,
            spread: spread(sell_vwap, buy_vwap),
        }
    }

    fn candle(open: f64, close: f64, high: f64, low: f64, volume: f64) -> DailyCandle {
        DailyCandle {
            open,
            close,
            high,
            low,
            volume: Some(volume),
        }
    }

    fn curated(quote_interval: Option<[f64; 2]>, names: &[&str]) -> CuratedRange {
        CuratedRange {
            quote_interval,
            sources: names.iter().map(|name| source(name)).collect(),
        }
    }

    fn source(name: &str) -> HintSource {
        HintSource {
            source: name.to_string(),
            url: Some(format!("https://{}.example", name)),
        }
    }

    #[test]
    fn test_crypto_means_and_spread() {
        let mut d1 = day(1);
        d1.usdt_bob = Some(stats(12.0, 11.0, Some(100.0)));
        let mut d2 = day(2);
        d2.usdt_bob = Some(stats(13.0, 12.0, None));

        let summary = reduce_period(&march(), &[d1, d2, day(3)]);
        let bob = summary.usdt_bob.unwrap();
        assert_eq!(bob.sell_vwap, 12.5);
        assert_eq!(bob.buy_vwap, 11.5);
        assert_eq!(bob.sell_volume, Some(100.0));
        assert_eq!(bob.buy_volume, None);
        assert_eq!(bob.spread, spread(12.5, 11.5));
        assert_eq!(summary.usdt_ars, None);
        assert_eq!(summary.month.as_deref(), Some("3"));
        assert_eq!(summary.quarter, None);
    }

    #[test]
    fn test_candle_reduction() {
        let candles = [
            candle(400.0, 410.0, 415.0, 395.0, 10.0),
            candle(410.0, 405.0, 420.0, 401.0, 20.0),
            candle(405.0, 430.0, 431.0, 399.0, 30.0),
        ];
        let days: Vec<DailySummary> = candles
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let mut d = day(i as u32 + 1);
                d.usdt_ars_market = Some(c.clone());
                d
            })
            .collect();

        let market = reduce_period(&march(), &days).usdt_ars_market.unwrap();
        assert_eq!(market.open, 400.0);
        assert_eq!(market.close, 430.0);
        assert_eq!(market.high, 431.0);
        assert_eq!(market.low, 395.0);
        assert_eq!(market.volume, Some(20.0));
        // (mean open 405 + mean close 415) / 2
        assert_eq!(market.average, 410.0);
    }

    #[test]
    fn test_curated_range_merge() {
        let mut d1 = day(1);
        d1.usd_bob_parallel = Some(curated(Some([10.0, 11.0]), &["a"]));
        d1.parallel_series = Some(10.5);
        let mut d2 = day(2);
        d2.usd_bob_parallel = Some(curated(None, &["a", "b"]));
        d2.parallel_series = Some(11.0);
        let mut d3 = day(3);
        d3.usd_bob_parallel = Some(curated(Some([10.5, 12.5]), &["c"]));
        d3.parallel_series = Some(11.5);

        let merged = reduce_period(&march(), &[d1, d2, d3])
            .usd_bob_parallel
            .unwrap();
        assert_eq!(merged.quote_interval, Some([10.0, 12.5]));
        assert_eq!(merged.series_average, Some(11.0));
        assert_eq!(merged.sources, vec![source("a"), source("b"), source("c")]);
    }

    #[test]
    fn test_empty_period_is_all_null() {
        let may = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let key = PeriodKey::containing(PeriodKind::Quarter, may);
        let summary = reduce_period(&key, &[]);
        assert_eq!(summary.quarter.as_deref(), Some("2"));
        assert_eq!(summary.year, "2024");
        assert_eq!(summary.usdt_bob, None);
        assert_eq!(summary.usd_bob_official, None);
        assert_eq!(summary.usd_bob_parallel, None);
    }
}
