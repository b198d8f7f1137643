//! Rollup Engine - Drives every stage over the document store
//!
//! Stages, in run order:
//! 1. `reprocess` - re-derive stored intervals of a pair (optional)
//! 2. `run_daily` - one `DailySummary` per local day, epoch through today
//! 3. `run_smoother` - write the smoothed parallel-rate series into the days
//! 4. `run_period` - monthly and quarterly reductions of the days
//!
//! Every write goes through compare-then-upsert, so re-running any stage
//! over unchanged inputs writes nothing.

use super::calendar::{days_between, periods_between, PeriodKind};
use super::daily::{decode_rows, DailyComposer};
use super::intervals::reprocess_intervals;
use super::period::reduce_period;
use super::smoother::parallel_curve;
use super::types::{DailySummary, PARALLEL_SERIES_FIELD};
use super::upsert::{upsert_if_changed, write_if_changed, RollupReport, WriteOutcome};
use crate::aggregator_core::quote::round2;
use crate::aggregator_core::{BlocklistProvider, CurrencyPair, IntervalAggregator};
use crate::config::RollupConfig;
use crate::error::RollupError;
use crate::store::{collections, to_document, Document, DocumentQuery, DocumentStore};
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

/// Sequential rollup over one store
pub struct RollupEngine<'a, S: DocumentStore + ?Sized> {
    store: &'a mut S,
    config: RollupConfig,
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl<'a, S: DocumentStore + ?Sized> RollupEngine<'a, S> {
    pub fn new(store: &'a mut S, config: RollupConfig) -> Self {
        Self::new_with_clock(store, config, Box::new(Utc::now))
    }

    /// Create an engine with a custom clock (for testing)
    pub fn new_with_clock(
        store: &'a mut S,
        config: RollupConfig,
        now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    ) -> Self {
        Self {
            store,
            config,
            now_fn,
        }
    }

    /// Local date in the configured timezone
    pub fn today(&self) -> NaiveDate {
        (self.now_fn)().with_timezone(&self.config.timezone).date_naive()
    }

    /// Build and upsert the summary of every day from the epoch through today
    pub fn run_daily(&mut self) -> Result<RollupReport, RollupError> {
        let days = days_between(self.config.timezone, self.config.epoch, self.today());
        log::info!(
            "📅 Daily rollup over {} days from {}",
            days.len(),
            self.config.epoch
        );

        let mut report = RollupReport::default();
        for day in days {
            let context = day.date.to_string();
            let mut summary = DailyComposer::new(&*self.store, &self.config)
                .compose(&day, &mut report)
                .map_err(|e| RollupError::store(context.clone(), e))?;

            let key = DocumentQuery::at(day.key);
            let existing = self
                .store
                .find_one(collections::DAILY_AVERAGES, &key)
                .map_err(|e| RollupError::store(context.clone(), e))?;

            // The smoothed series is owned by the smoother stage.
            summary.parallel_series = existing
                .as_ref()
                .and_then(|doc| doc.get(PARALLEL_SERIES_FIELD))
                .and_then(Value::as_f64);

            let doc =
                to_document(&summary).map_err(|e| RollupError::store(context.clone(), e))?;
            let outcome = write_if_changed(
                &mut *self.store,
                collections::DAILY_AVERAGES,
                &key,
                existing,
                doc,
            )
            .map_err(|e| RollupError::store(context.clone(), e))?;
            if outcome == WriteOutcome::Unchanged {
                log::debug!("{} unchanged, write skipped", context);
            }
            report.record(outcome);
        }

        Ok(report)
    }

    /// Recompute the smoothed parallel-rate series and write it into each day
    pub fn run_smoother(&mut self) -> Result<RollupReport, RollupError> {
        let mut report = RollupReport::default();
        let docs = self
            .store
            .find(collections::DAILY_AVERAGES, &DocumentQuery::all())
            .map_err(|e| RollupError::store(collections::DAILY_AVERAGES, e))?;

        // Keep the stored document next to its decoded form so the write
        // only touches the series field.
        let mut stored: Vec<Document> = Vec::with_capacity(docs.len());
        let mut days: Vec<DailySummary> = Vec::with_capacity(docs.len());
        for doc in docs {
            let decoded: Vec<DailySummary> =
                decode_rows(vec![doc.clone()], collections::DAILY_AVERAGES, &mut report);
            if let Some(day) = decoded.into_iter().next() {
                stored.push(doc);
                days.push(day);
            }
        }

        let curve = parallel_curve(&days, self.config.curve_cutover);
        log::info!(
            "📈 Smoothing {} days after {}",
            curve.len(),
            self.config.curve_cutover
        );

        for (idx, value) in curve {
            let value = value.map(round2);
            if days[idx].parallel_series == value {
                report.record(WriteOutcome::Unchanged);
                continue;
            }

            let day = &days[idx];
            let mut doc = stored[idx].clone();
            doc.insert(
                PARALLEL_SERIES_FIELD.to_string(),
                value.map_or(Value::Null, Value::from),
            );
            let context = day.timestamp.date_naive().to_string();
            self.store
                .upsert(
                    collections::DAILY_AVERAGES,
                    &DocumentQuery::at(day.timestamp),
                    doc,
                )
                .map_err(|e| RollupError::store(context, e))?;
            report.record(WriteOutcome::Updated);
        }

        Ok(report)
    }

    /// Reduce the daily summaries into every month or quarter since the epoch
    pub fn run_period(&mut self, kind: PeriodKind) -> Result<RollupReport, RollupError> {
        let collection = match kind {
            PeriodKind::Month => collections::MONTHLY_AVERAGES,
            PeriodKind::Quarter => collections::QUARTERLY_AVERAGES,
        };
        let periods = periods_between(kind, self.config.epoch, self.today());
        log::info!("🗓️  {} rollup over {} periods", kind, periods.len());

        let mut report = RollupReport::default();
        for key in periods {
            let context = key.to_string();
            let docs = self
                .store
                .find(collections::DAILY_AVERAGES, &key.daily_range())
                .map_err(|e| RollupError::store(context.clone(), e))?;
            let days: Vec<DailySummary> =
                decode_rows(docs, collections::DAILY_AVERAGES, &mut report);

            let summary = reduce_period(&key, &days);
            let doc =
                to_document(&summary).map_err(|e| RollupError::store(context.clone(), e))?;
            let outcome = upsert_if_changed(&mut *self.store, collection, &key.identity(), doc)
                .map_err(|e| RollupError::store(context, e))?;
            report.record(outcome);
        }

        Ok(report)
    }
}

impl<'a, S: DocumentStore + BlocklistProvider + ?Sized> RollupEngine<'a, S> {
    /// Re-derive every stored interval of `pair` against the current block-list
    pub fn reprocess(&mut self, pair: CurrencyPair) -> Result<RollupReport, RollupError> {
        let now = (self.now_fn)().timestamp();
        let blocklist = self
            .store
            .active_blocklist(now)
            .map_err(|e| RollupError::store("advertiser_blocklist", e))?;
        log::info!("🚫 {} advertisers blocked", blocklist.len());

        reprocess_intervals(&mut *self.store, &IntervalAggregator::new(pair), &blocklist)
    }

    /// All stages in order, reprocessing `reprocess_pairs` first
    pub fn run_all(
        &mut self,
        reprocess_pairs: &[CurrencyPair],
    ) -> Result<Vec<(String, RollupReport)>, RollupError> {
        let mut reports = Vec::new();

        for pair in reprocess_pairs {
            let report = self.reprocess(pair.clone())?;
            log::info!("✅ Reprocessed {}: {}", pair, report);
            reports.push((format!("reprocess {}", pair), report));
        }

        let report = self.run_daily()?;
        log::info!("✅ Daily summaries: {}", report);
        reports.push(("daily".to_string(), report));

        let report = self.run_smoother()?;
        log::info!("✅ Parallel series: {}", report);
        reports.push(("smoother".to_string(), report));

        for kind in [PeriodKind::Month, PeriodKind::Quarter] {
            let report = self.run_period(kind)?;
            log::info!("✅ {} summaries: {}", kind, report);
            reports.push((kind.to_string(), report));
        }

        Ok(reports)
    }
}
