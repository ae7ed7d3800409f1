//! SQLite-backed session journal

use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::params;
use tracing::debug;

use super::database::Database;
use crate::session::{Operation, Store, StreamStructure};

/// [`Store`] that appends structures to the `session_structures` table
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get reference to underlying database
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Whether a session row exists
    pub fn session_exists(&self, session_id: &str) -> Result<bool> {
        let count: i64 = self.db.conn().query_row(
            "SELECT COUNT(*) FROM sessions WHERE id = ?1",
            [session_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl Store for SqliteStore {
    fn commit_structures(&self, session_id: &str, structures: &[StreamStructure]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.db.conn().unchecked_transaction()?;

        tx.execute(
            "INSERT INTO sessions (id, created_at, updated_at) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET updated_at = ?2",
            params![session_id, now],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO session_structures
                    (session_id, operation, content_id, parent_content_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for structure in structures {
                stmt.execute(params![
                    session_id,
                    structure.operation.as_str(),
                    structure.content_id,
                    structure.parent_content_id,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        debug!(session_id, count = structures.len(), "journaled structures");
        Ok(())
    }

    fn session_structures(&self, session_id: &str) -> Result<Vec<StreamStructure>> {
        let mut stmt = self.db.conn().prepare(
            "SELECT operation, content_id, parent_content_id
             FROM session_structures WHERE session_id = ?1
             ORDER BY seq",
        )?;

        let rows = stmt.query_map([session_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut structures = Vec::new();
        for row in rows {
            let (operation, content_id, parent_content_id) = row?;
            let operation = Operation::parse(&operation)
                .ok_or_else(|| anyhow!("unknown journaled operation: {}", operation))?;
            structures.push(StreamStructure {
                operation,
                content_id,
                parent_content_id,
            });
        }
        Ok(structures)
    }

    fn session_ids(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .db
            .conn()
            .prepare("SELECT id FROM sessions ORDER BY updated_at DESC")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn remove_session(&self, session_id: &str) -> Result<()> {
        self.db
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", [session_id])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tempfile::TempDir;

    use super::*;
    use crate::session::{CommitResult, ContentTree, Session};

    fn create_test_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(&db_path).expect("Failed to create database");
        (SqliteStore::new(db), temp_dir)
    }

    #[test]
    fn test_commit_and_read_back_in_order() {
        let (store, _temp) = create_test_store();

        store
            .commit_structures(
                "s1",
                &[
                    StreamStructure::add("0", None),
                    StreamStructure::add("1", Some("0")),
                ],
            )
            .expect("Failed to commit");
        store
            .commit_structures(
                "s1",
                &[
                    StreamStructure::clear_all(),
                    StreamStructure::remove("1", Some("0")),
                ],
            )
            .expect("Failed to commit");

        let journal = store.session_structures("s1").expect("Failed to read");
        assert_eq!(
            journal,
            vec![
                StreamStructure::add("0", None),
                StreamStructure::add("1", Some("0")),
                StreamStructure::clear_all(),
                StreamStructure::remove("1", Some("0")),
            ]
        );
        assert!(store.session_exists("s1").unwrap());
        assert_eq!(store.session_ids().unwrap(), vec!["s1"]);
    }

    #[test]
    fn test_remove_session_cascades_journal() {
        let (store, _temp) = create_test_store();
        store
            .commit_structures("s1", &[StreamStructure::add("0", None)])
            .unwrap();

        store.remove_session("s1").unwrap();

        assert!(!store.session_exists("s1").unwrap());
        assert!(store.session_structures("s1").unwrap().is_empty());
    }

    #[test]
    fn test_session_round_trip_through_sqlite() {
        let (store, _temp) = create_test_store();
        let store: Rc<dyn Store> = Rc::new(store);

        let mut session = Session::new("s1", store.clone());
        session.bind_model_provider(Rc::new(ContentTree::new()));
        let commit = session
            .populate_model_provider(
                &[
                    StreamStructure::add("0", None),
                    StreamStructure::add("a", Some("0")),
                ],
                None,
            )
            .unwrap();
        assert_eq!(commit, CommitResult::Success);
        session
            .update_session(false, &[StreamStructure::add("b", Some("0"))], 1, None)
            .unwrap();

        let tree = Rc::new(ContentTree::new());
        let restored = Session::restore(store, "s1", tree.clone()).unwrap();
        assert_eq!(restored.content_in_session().len(), 3);
        assert_eq!(tree.root_children(), vec!["a", "b"]);
    }
}
