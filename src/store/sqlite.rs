//! SQLite document store
//!
//! Schema:
//! - `documents` - one row per JSON document; `ts` mirrors the document's
//!   `timestamp` in unix millis (NULL for untimed documents)
//! - `advertiser_blocklist` - usernames excluded from the primary pair
//!
//! Equality predicates are evaluated with `json_extract(body, '$.path')`.

use super::{document_timestamp, Document, DocumentQuery, DocumentStore, TimeFilter};
use crate::aggregator_core::blocklist::{Blocklist, BlocklistProvider};
use crate::error::StoreError;
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    collection  TEXT NOT NULL,
    ts          INTEGER,
    body        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_documents_collection_ts
    ON documents (collection, ts);

CREATE TABLE IF NOT EXISTS advertiser_blocklist (
    username    TEXT PRIMARY KEY,
    reason      TEXT,
    created_at  INTEGER NOT NULL,
    expires_at  INTEGER
);
"#;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store at `db_path` and ensure the schema exists
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Connectivity(format!("{}: {}", parent.display(), e)))?;
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;
        conn.execute_batch(SCHEMA)?;

        log::info!("✅ SQLite document store ready: {}", db_path.display());
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Add or refresh a block-list entry; `expires_at = None` blocks permanently
    pub fn block_advertiser(
        &self,
        username: &str,
        reason: &str,
        created_at: i64,
        expires_at: Option<i64>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO advertiser_blocklist (username, reason, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(username) DO UPDATE SET
                reason = excluded.reason,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at",
            params![username, reason, created_at, expires_at],
        )?;
        Ok(())
    }

    /// WHERE clause and bound parameters for `query` within `collection`
    fn where_clause(collection: &str, query: &DocumentQuery) -> (String, Vec<SqlValue>) {
        let mut sql = String::from("collection = ?");
        let mut args = vec![SqlValue::Text(collection.to_string())];

        match &query.time {
            TimeFilter::Any => {}
            TimeFilter::At(ts) => {
                sql.push_str(" AND ts = ?");
                args.push(SqlValue::Integer(ts.timestamp_millis()));
            }
            TimeFilter::Range { start, end } => {
                sql.push_str(" AND ts >= ? AND ts < ?");
                args.push(SqlValue::Integer(start.timestamp_millis()));
                args.push(SqlValue::Integer(end.timestamp_millis()));
            }
        }

        for (path, value) in &query.equals {
            sql.push_str(" AND json_extract(body, ?) = ?");
            args.push(SqlValue::Text(format!("$.{}", path)));
            args.push(to_sql(value));
        }

        (sql, args)
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => SqlValue::Real(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

impl DocumentStore for SqliteStore {
    fn find(&self, collection: &str, query: &DocumentQuery) -> Result<Vec<Document>, StoreError> {
        let (clause, args) = Self::where_clause(collection, query);
        let sql = format!(
            "SELECT body FROM documents WHERE {} ORDER BY ts ASC, id ASC",
            clause
        );

        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), |row| row.get::<_, String>(0))?;

        let mut docs = Vec::new();
        for body in rows {
            docs.push(serde_json::from_str::<Document>(&body?)?);
        }
        Ok(docs)
    }

    fn insert(&mut self, collection: &str, doc: Document) -> Result<(), StoreError> {
        let ts = document_timestamp(&doc).map(|t| t.timestamp_millis());
        let body = serde_json::to_string(&doc)?;
        self.conn.execute(
            "INSERT INTO documents (collection, ts, body) VALUES (?1, ?2, ?3)",
            params![collection, ts, body],
        )?;
        Ok(())
    }

    fn upsert(
        &mut self,
        collection: &str,
        key: &DocumentQuery,
        doc: Document,
    ) -> Result<(), StoreError> {
        let (clause, args) = Self::where_clause(collection, key);
        let existing: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT id FROM documents WHERE {} ORDER BY id ASC LIMIT 1", clause),
                params_from_iter(args),
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                let ts = document_timestamp(&doc).map(|t| t.timestamp_millis());
                let body = serde_json::to_string(&doc)?;
                self.conn.execute(
                    "UPDATE documents SET ts = ?1, body = ?2 WHERE id = ?3",
                    params![ts, body, id],
                )?;
                Ok(())
            }
            None => self.insert(collection, doc),
        }
    }
}

impl BlocklistProvider for SqliteStore {
    fn active_blocklist(&self, now: i64) -> Result<Blocklist, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT username FROM advertiser_blocklist
             WHERE expires_at IS NULL OR expires_at > ?",
        )?;
        let usernames = stmt
            .query_map([now], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Blocklist::new(usernames))
    }
}
