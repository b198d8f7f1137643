//! In-memory document store

use super::{sort_by_timestamp, Document, DocumentQuery, DocumentStore};
use crate::aggregator_core::blocklist::{Blocklist, BlocklistProvider};
use crate::error::StoreError;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: HashMap<String, Vec<Document>>,
    blocked: Vec<(String, Option<i64>)>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of insert/upsert calls served so far
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map_or(0, Vec::len)
    }

    pub fn block_advertiser(&mut self, username: impl Into<String>, expires_at: Option<i64>) {
        self.blocked.push((username.into(), expires_at));
    }
}

impl DocumentStore for MemoryStore {
    fn find(&self, collection: &str, query: &DocumentQuery) -> Result<Vec<Document>, StoreError> {
        let mut docs: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();
        sort_by_timestamp(&mut docs);
        Ok(docs)
    }

    fn insert(&mut self, collection: &str, doc: Document) -> Result<(), StoreError> {
        self.writes += 1;
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        Ok(())
    }

    fn upsert(
        &mut self,
        collection: &str,
        key: &DocumentQuery,
        doc: Document,
    ) -> Result<(), StoreError> {
        self.writes += 1;
        let docs = self.collections.entry(collection.to_string()).or_default();
        match docs.iter_mut().find(|d| key.matches(d)) {
            Some(existing) => *existing = doc,
            None => docs.push(doc),
        }
        Ok(())
    }
}

impl BlocklistProvider for MemoryStore {
    fn active_blocklist(&self, now: i64) -> Result<Blocklist, StoreError> {
        Ok(Blocklist::new(
            self.blocked
                .iter()
                .filter(|(_, expires_at)| expires_at.map_or(true, |exp| exp > now))
                .map(|(username, _)| username.clone()),
        ))
    }
}
