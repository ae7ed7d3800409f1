//! Scroll position storage
//!
//! Handles persistence of the last scroll position per session for restoration.

use anyhow::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use super::database::Database;
use crate::scroll::ScrollPosition;

/// Scroll position store
pub struct ScrollPositionStore<'a> {
    db: &'a Database,
}

impl<'a> ScrollPositionStore<'a> {
    /// Create a new scroll position store with database reference
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Save the position for a session, replacing any earlier one
    pub fn save(&self, session_id: &str, position: ScrollPosition) -> Result<()> {
        self.db.conn().execute(
            "INSERT OR REPLACE INTO scroll_positions
                (session_id, position, pixel_offset, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                session_id,
                position.position as i64,
                position.offset,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Load the saved position for a session, if any
    pub fn load(&self, session_id: &str) -> Result<Option<ScrollPosition>> {
        let position = self
            .db
            .conn()
            .query_row(
                "SELECT position, pixel_offset FROM scroll_positions WHERE session_id = ?1",
                [session_id],
                |row| {
                    Ok(ScrollPosition {
                        position: row.get::<_, i64>(0)?.max(0) as usize,
                        offset: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(position)
    }

    /// Forget the saved position, e.g. once it has been abandoned
    pub fn clear(&self, session_id: &str) -> Result<()> {
        self.db.conn().execute(
            "DELETE FROM scroll_positions WHERE session_id = ?1",
            [session_id],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::session::{Store, StreamStructure};
    use crate::storage::{Database, SqliteStore};

    use super::*;

    /// Helper to create a temporary database with one session for testing
    fn create_test_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(&db_path).expect("Failed to create database");
        let store = SqliteStore::new(db);
        store
            .commit_structures("s1", &[StreamStructure::add("0", None)])
            .expect("Failed to create session");
        (store, temp_dir)
    }

    #[test]
    fn test_save_and_load_position() {
        let (store, _temp) = create_test_store();
        let positions = ScrollPositionStore::new(store.db());

        assert_eq!(positions.load("s1").unwrap(), None);

        positions
            .save(
                "s1",
                ScrollPosition {
                    position: 3,
                    offset: -40,
                },
            )
            .expect("Failed to save position");
        positions
            .save(
                "s1",
                ScrollPosition {
                    position: 5,
                    offset: 12,
                },
            )
            .expect("Failed to save position");

        assert_eq!(
            positions.load("s1").unwrap(),
            Some(ScrollPosition {
                position: 5,
                offset: 12
            })
        );
    }

    #[test]
    fn test_clear_position() {
        let (store, _temp) = create_test_store();
        let positions = ScrollPositionStore::new(store.db());
        positions
            .save(
                "s1",
                ScrollPosition {
                    position: 1,
                    offset: 0,
                },
            )
            .unwrap();

        positions.clear("s1").unwrap();
        assert_eq!(positions.load("s1").unwrap(), None);
    }

    #[test]
    fn test_position_requires_session() {
        let (store, _temp) = create_test_store();
        let positions = ScrollPositionStore::new(store.db());

        let result = positions.save(
            "unknown",
            ScrollPosition {
                position: 1,
                offset: 0,
            },
        );
        assert!(result.is_err(), "foreign key should reject unknown session");
    }
}
