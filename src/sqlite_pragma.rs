//! Shared SQLite PRAGMA setup

use rusqlite::Connection;

/// Apply the connection PRAGMAs used by every SQLite handle in the crate
///
/// WAL journaling, NORMAL sync, in-memory temp store, 64MB page cache and
/// a 5s busy timeout so a concurrent ingestion writer does not fail reads.
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "cache_size", -64_000)?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_pragmas_applied() {
        let dir = tempdir().unwrap();
        let conn = Connection::open(dir.path().join("p.db")).unwrap();
        apply_optimized_pragmas(&conn).unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
