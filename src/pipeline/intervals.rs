//! Storing and re-deriving per-interval aggregates

use super::daily::decode_rows;
use super::upsert::{upsert_if_changed, RollupReport, WriteOutcome};
use crate::aggregator_core::{AdQuote, AggregatedInterval, Blocklist, IntervalAggregator};
use crate::error::{AggregationError, RollupError};
use crate::store::{to_document, DocumentQuery, DocumentStore};
use chrono::{DateTime, Utc};

/// Aggregate one snapshot and store it under its timestamp
///
/// A snapshot with an empty side is rejected and nothing is written.
pub fn record_interval<S: DocumentStore + ?Sized>(
    store: &mut S,
    aggregator: &IntervalAggregator,
    timestamp: DateTime<Utc>,
    sell_raw_data: Vec<AdQuote>,
    buy_raw_data: Vec<AdQuote>,
) -> Result<WriteOutcome, RollupError> {
    let context = format!("{} {}", aggregator.pair(), timestamp.to_rfc3339());
    let interval = aggregator
        .aggregate(timestamp, sell_raw_data, buy_raw_data)
        .map_err(|source| RollupError::Aggregation {
            context: context.clone(),
            source,
        })?;

    let collection = aggregator.pair().interval_collection();
    let doc = to_document(&interval).map_err(|e| RollupError::store(context.clone(), e))?;
    upsert_if_changed(store, &collection, &DocumentQuery::at(timestamp), doc)
        .map_err(|e| RollupError::store(context, e))
}

/// Recompute every stored interval of the aggregator's pair
///
/// Intervals whose raw batches no longer yield a VWAP on both sides are
/// left as stored and counted in `failed_intervals`. The comparison is on
/// decoded values, so a stored timestamp spelled `+00:00` instead of `Z`
/// does not force a rewrite.
pub fn reprocess_intervals<S: DocumentStore + ?Sized>(
    store: &mut S,
    aggregator: &IntervalAggregator,
    blocklist: &Blocklist,
) -> Result<RollupReport, RollupError> {
    let collection = aggregator.pair().interval_collection();
    let mut report = RollupReport::default();

    let docs = store
        .find(&collection, &DocumentQuery::all())
        .map_err(|e| RollupError::store(collection.clone(), e))?;
    log::info!(
        "🔁 Reprocessing {} stored {} intervals",
        docs.len(),
        aggregator.pair()
    );

    let intervals: Vec<AggregatedInterval> = decode_rows(docs, &collection, &mut report);

    for stored in intervals {
        let context = format!("{} {}", aggregator.pair(), stored.timestamp.to_rfc3339());
        let redone = match aggregator.reaggregate(&stored, blocklist) {
            Ok(interval) => interval,
            Err(AggregationError::EmptyBatch { side }) => {
                log::warn!(
                    "⚠️  {}: no {} ads left after filtering, keeping stored interval",
                    context,
                    side
                );
                report.failed_intervals += 1;
                continue;
            }
            Err(source) => return Err(RollupError::Aggregation { context, source }),
        };

        if redone == stored {
            report.record(WriteOutcome::Unchanged);
            continue;
        }

        let doc = to_document(&redone).map_err(|e| RollupError::store(context.clone(), e))?;
        store
            .upsert(&collection, &DocumentQuery::at(stored.timestamp), doc)
            .map_err(|e| RollupError::store(context, e))?;
        report.record(WriteOutcome::Updated);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator_core::CurrencyPair;
    use crate::store::{collections, from_document, MemoryStore};
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, hour, 0, 0).unwrap()
    }

    fn ad(username: &str, price: f64, volume: f64) -> AdQuote {
        AdQuote::new(username, price, volume)
    }

    fn stored_interval(store: &MemoryStore, hour: u32) -> AggregatedInterval {
        let doc = store
            .find_one(collections::USDT_BOB_BINANCE, &DocumentQuery::at(ts(hour)))
            .unwrap()
            .unwrap();
        from_document(doc).unwrap()
    }

    #[test]
    fn test_record_interval_keyed_by_timestamp() {
        let mut store = MemoryStore::new();
        let aggregator = IntervalAggregator::new(CurrencyPair::usdt_bob());
        let sell = vec![ad("a", 10.0, 5.0)];
        let buy = vec![ad("b", 9.8, 4.0)];

        let first =
            record_interval(&mut store, &aggregator, ts(12), sell.clone(), buy.clone()).unwrap();
        let again = record_interval(&mut store, &aggregator, ts(12), sell, buy).unwrap();

        assert_eq!(first, WriteOutcome::Inserted);
        assert_eq!(again, WriteOutcome::Unchanged);
        assert_eq!(store.len(collections::USDT_BOB_BINANCE), 1);
    }

    #[test]
    fn test_record_interval_rejects_empty_side() {
        let mut store = MemoryStore::new();
        let aggregator = IntervalAggregator::new(CurrencyPair::usdt_ars());

        let err = record_interval(
            &mut store,
            &aggregator,
            ts(12),
            vec![ad("a", 1000.0, 5.0)],
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RollupError::Aggregation { .. }));
        assert_eq!(store.write_count(), 0);
    }

    #[test]
    fn test_reprocess_drops_blocked_and_keeps_failures() {
        let mut store = MemoryStore::new();
        let aggregator = IntervalAggregator::new(CurrencyPair::usdt_bob());
        record_interval(
            &mut store,
            &aggregator,
            ts(10),
            vec![ad("spam", 14.0, 500.0), ad("a", 10.0, 5.0), ad("b", 10.5, 3.0)],
            vec![ad("c", 9.8, 10.0)],
        )
        .unwrap();
        // only the blocked advertiser on the buy side
        record_interval(
            &mut store,
            &aggregator,
            ts(11),
            vec![ad("a", 10.0, 5.0)],
            vec![ad("spam", 9.9, 10.0)],
        )
        .unwrap();
        let broken = json!({"timestamp": "2024-03-14T12:00:00Z"});
        store
            .insert(collections::USDT_BOB_BINANCE, broken.as_object().cloned().unwrap())
            .unwrap();

        let report =
            reprocess_intervals(&mut store, &aggregator, &Blocklist::new(["spam"])).unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.failed_intervals, 1);
        assert_eq!(report.malformed_records, 1);

        let redone = stored_interval(&store, 10);
        assert_eq!(redone.sell_vwap, 10.12);
        assert!(redone.sell_raw_data.iter().all(|q| q.username != "spam"));

        let kept = stored_interval(&store, 11);
        assert_eq!(kept.buy_raw_data.len(), 1);
    }

    #[test]
    fn test_reprocess_twice_is_a_no_op() {
        let mut store = MemoryStore::new();
        let aggregator = IntervalAggregator::new(CurrencyPair::usdt_bob());
        record_interval(
            &mut store,
            &aggregator,
            ts(10),
            vec![ad("spam", 14.0, 500.0), ad("a", 10.0, 5.0)],
            vec![ad("c", 9.8, 10.0)],
        )
        .unwrap();

        let blocklist = Blocklist::new(["spam"]);
        reprocess_intervals(&mut store, &aggregator, &blocklist).unwrap();
        let writes = store.write_count();
        let second = reprocess_intervals(&mut store, &aggregator, &blocklist).unwrap();

        assert_eq!(second.unchanged, 1);
        assert_eq!(store.write_count(), writes);
    }

    #[test]
    fn test_reprocess_ignores_timestamp_spelling() {
        // Test: an interval stored with a `+00:00` offset is not rewritten
        let mut store = MemoryStore::new();
        let aggregator = IntervalAggregator::new(CurrencyPair::usdt_bob());
        let interval = aggregator
            .aggregate(
                ts(16),
                vec![ad("a", 10.0, 5.0), ad("b", 10.5, 3.0)],
                vec![ad("c", 9.8, 10.0)],
            )
            .unwrap();
        let mut doc = to_document(&interval).unwrap();
        doc.insert(
            "timestamp".to_string(),
            Value::from("2024-03-14T16:00:00+00:00"),
        );
        store.insert(collections::USDT_BOB_BINANCE, doc).unwrap();
        let writes = store.write_count();

        let report =
            reprocess_intervals(&mut store, &aggregator, &Blocklist::default()).unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(store.write_count(), writes);
    }
}
