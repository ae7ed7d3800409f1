//! Tests for database migrations
//!
//! These tests verify that:
//! - All migrations apply successfully
//! - Schema version is tracked correctly
//! - Reopening an existing database does not re-run migrations

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::storage::database::Database;

    /// Helper to create a temporary database for testing
    fn create_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(&db_path).expect("Failed to create database");
        (db, temp_dir)
    }

    fn table_columns(db: &Database, table: &str) -> Vec<String> {
        let mut stmt = db
            .conn()
            .prepare(&format!("PRAGMA table_info({})", table))
            .expect("Failed to prepare PRAGMA");

        stmt.query_map([], |row| row.get::<_, String>(1))
            .expect("Failed to get columns")
            .filter_map(Result::ok)
            .collect()
    }

    #[test]
    fn test_database_creation() {
        let (db, _temp) = create_test_db();

        let version = db.get_schema_version();
        assert_eq!(version, 2, "Expected current schema version to be 2");
    }

    #[test]
    fn test_journal_table_columns() {
        let (db, _temp) = create_test_db();

        let columns = table_columns(&db, "session_structures");
        for expected in [
            "seq",
            "session_id",
            "operation",
            "content_id",
            "parent_content_id",
        ] {
            assert!(columns.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_scroll_positions_table_columns() {
        let (db, _temp) = create_test_db();

        let columns = table_columns(&db, "scroll_positions");
        assert!(columns.contains(&"position".to_string()));
        assert!(columns.contains(&"pixel_offset".to_string()));
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let (db, _temp) = create_test_db();

        let fk_enabled: i32 = db
            .conn()
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .expect("Failed to get foreign_keys setting");

        assert_eq!(fk_enabled, 1, "Foreign keys should be enabled");
    }

    #[test]
    fn test_reopen_keeps_version() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        drop(Database::new(&db_path).expect("Failed to create database"));
        let db = Database::new(&db_path).expect("Failed to reopen database");

        let rows: i32 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .expect("Failed to count versions");
        assert_eq!(rows, 2, "Each migration should be recorded once");
    }
}
