//! SQLite schema definition.

/// Complete database schema for skintrack.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Local key/value store (annotations, appointments)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_kv_updated_at ON kv_store(updated_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_key_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        conn.execute("INSERT INTO kv_store (key, value) VALUES ('a', '1')", [])
            .unwrap();
        let result = conn.execute("INSERT INTO kv_store (key, value) VALUES ('a', '2')", []);
        assert!(result.is_err());
    }
}
