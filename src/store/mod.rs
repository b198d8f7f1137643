//! Document store contract
//!
//! Every collection holds JSON documents. Most carry a `timestamp` field
//! (RFC 3339, UTC) that the backends index at millisecond resolution; period
//! summaries are keyed by equality predicates instead.
//!
//! Backends:
//! - `MemoryStore` - in-process fake used by tests
//! - `SqliteStore` - single `documents` table with `json_extract` predicates

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub type Document = serde_json::Map<String, Value>;

/// Collection names (wire contract shared with the ingestion side)
pub mod collections {
    pub const USDT_BOB_BINANCE: &str = "USDT_BOB_Binance";
    pub const USDT_ARS_BINANCE: &str = "USDT_ARS_Binance";
    /// Same-day fallback quotes for USDT/BOB from other venues
    pub const USDT_BOB_OTHER: &str = "USDT_BOB_Other";
    pub const USDT_ARS_TRADINGVIEW: &str = "USDT_ARS_TradingView";
    pub const USD_ARS_PARALLEL: &str = "USD_ARS_Parallel";
    /// Curated rate hints extracted from news text
    pub const USD_BOB_PARALLEL: &str = "USD_BOB_Parallel";
    pub const USD_BOB_TARJETA: &str = "USD_BOB_Tarjeta";
    pub const USD_ARS_OFFICIAL: &str = "USD_ARS_Official";
    pub const DAILY_AVERAGES: &str = "Daily_Averages";
    pub const MONTHLY_AVERAGES: &str = "Monthly_Averages";
    pub const QUARTERLY_AVERAGES: &str = "Quarterly_Averages";
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TimeFilter {
    #[default]
    Any,
    At(DateTime<Utc>),
    /// Half-open `[start, end)`
    Range {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl TimeFilter {
    pub fn matches(&self, ts: Option<DateTime<Utc>>) -> bool {
        let ms = ts.map(|t| t.timestamp_millis());
        match self {
            TimeFilter::Any => true,
            TimeFilter::At(at) => ms == Some(at.timestamp_millis()),
            TimeFilter::Range { start, end } => ms.map_or(false, |ms| {
                ms >= start.timestamp_millis() && ms < end.timestamp_millis()
            }),
        }
    }
}

/// Time filter plus equality predicates on dotted field paths
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DocumentQuery {
    pub time: TimeFilter,
    pub equals: Vec<(String, Value)>,
}

impl DocumentQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn at(ts: DateTime<Utc>) -> Self {
        Self {
            time: TimeFilter::At(ts),
            equals: Vec::new(),
        }
    }

    pub fn range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            time: TimeFilter::Range { start, end },
            equals: Vec::new(),
        }
    }

    pub fn with(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((path.into(), value.into()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.time.matches(document_timestamp(doc))
            && self.equals.iter().all(|(path, expected)| {
                field(doc, path).map_or(false, |v| values_equal(v, expected))
            })
    }
}

/// Repository interface consumed by the aggregation and rollup layers
pub trait DocumentStore {
    /// Matching documents, ascending by `timestamp`
    fn find(&self, collection: &str, query: &DocumentQuery) -> Result<Vec<Document>, StoreError>;

    fn find_one(
        &self,
        collection: &str,
        query: &DocumentQuery,
    ) -> Result<Option<Document>, StoreError> {
        Ok(self.find(collection, query)?.into_iter().next())
    }

    fn insert(&mut self, collection: &str, doc: Document) -> Result<(), StoreError>;

    /// Replace the first document matching `key` wholesale, inserting when none matches
    fn upsert(
        &mut self,
        collection: &str,
        key: &DocumentQuery,
        doc: Document,
    ) -> Result<(), StoreError>;
}

/// Parsed `timestamp` field, if present
pub fn document_timestamp(doc: &Document) -> Option<DateTime<Utc>> {
    doc.get("timestamp")
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Resolve a dotted path such as `USD_BOB_Parallel.quote_interval`
pub fn field<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

// Numbers compare by value so 5 and 5.0 match, the way SQLite compares them.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Serialization(serde::ser::Error::custom(
            "expected a JSON object",
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, serde_json::Error> {
    serde_json::from_value(Value::Object(doc))
}

pub(crate) fn sort_by_timestamp(docs: &mut [Document]) {
    docs.sort_by_key(|doc| document_timestamp(doc).map(|ts| ts.timestamp_millis()));
}
