//! Compare-then-upsert for summary documents

use crate::error::StoreError;
use crate::store::{Document, DocumentQuery, DocumentStore};
use std::fmt;

/// Backend-assigned identity, never part of the comparison
const STORE_ID_FIELD: &str = "_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Write `doc` under `key` unless the stored document is field-for-field equal
pub fn upsert_if_changed<S: DocumentStore + ?Sized>(
    store: &mut S,
    collection: &str,
    key: &DocumentQuery,
    doc: Document,
) -> Result<WriteOutcome, StoreError> {
    let existing = store.find_one(collection, key)?;
    write_if_changed(store, collection, key, existing, doc)
}

/// Same as `upsert_if_changed` with the stored document already fetched
pub fn write_if_changed<S: DocumentStore + ?Sized>(
    store: &mut S,
    collection: &str,
    key: &DocumentQuery,
    existing: Option<Document>,
    doc: Document,
) -> Result<WriteOutcome, StoreError> {
    match existing {
        None => {
            store.insert(collection, doc)?;
            Ok(WriteOutcome::Inserted)
        }
        Some(mut stored) => {
            stored.remove(STORE_ID_FIELD);
            if stored == doc {
                Ok(WriteOutcome::Unchanged)
            } else {
                store.upsert(collection, key, doc)?;
                Ok(WriteOutcome::Updated)
            }
        }
    }
}

/// Counts reported at the end of each stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollupReport {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Stored records skipped for missing or mistyped fields
    pub malformed_records: usize,
    /// Primary-pair days built from the fallback collection
    pub fallback_days: usize,
    /// Intervals that could not be re-aggregated and were left as stored
    pub failed_intervals: usize,
}

impl RollupReport {
    pub fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Inserted => self.inserted += 1,
            WriteOutcome::Updated => self.updated += 1,
            WriteOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn writes(&self) -> usize {
        self.inserted + self.updated
    }
}

impl fmt::Display for RollupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted={} updated={} skipped={}",
            self.inserted, self.updated, self.unchanged
        )?;
        if self.malformed_records > 0 {
            write!(f, " malformed={}", self.malformed_records)?;
        }
        if self.fallback_days > 0 {
            write!(f, " fallback_days={}", self.fallback_days)?;
        }
        if self.failed_intervals > 0 {
            write!(f, " failed_intervals={}", self.failed_intervals)?;
        }
        Ok(())
    }
}
