//! Persistence seam for session journals

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{bail, Result};
use parking_lot::Mutex;
use tracing::warn;

use super::types::StreamStructure;

/// Outcome of committing a [`SessionMutation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    Success,
    Failure,
}

impl CommitResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CommitResult::Success)
    }
}

/// Append-only journal of structural operations per session
pub trait Store {
    /// Append `structures` to the session's journal atomically
    fn commit_structures(&self, session_id: &str, structures: &[StreamStructure]) -> Result<()>;

    /// Every structure journaled for the session, in commit order
    fn session_structures(&self, session_id: &str) -> Result<Vec<StreamStructure>>;

    /// Ids of all sessions with a journal
    fn session_ids(&self) -> Result<Vec<String>>;

    fn remove_session(&self, session_id: &str) -> Result<()>;
}

impl<'s> dyn Store + 's {
    /// Start a single-use mutation against one session's journal
    pub fn edit_session(&self, session_id: &str) -> SessionMutation<'_> {
        SessionMutation::new(self, session_id)
    }
}

/// Accumulates structures and commits them to a [`Store`] in one batch
pub struct SessionMutation<'a> {
    store: &'a dyn Store,
    session_id: String,
    structures: Vec<StreamStructure>,
}

impl<'a> SessionMutation<'a> {
    pub fn new(store: &'a dyn Store, session_id: &str) -> Self {
        Self {
            store,
            session_id: session_id.to_string(),
            structures: Vec::new(),
        }
    }

    pub fn add(&mut self, structure: StreamStructure) -> &mut Self {
        self.structures.push(structure);
        self
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Write the batch. Failures are logged and reported, never retried.
    pub fn commit(self) -> CommitResult {
        if self.structures.is_empty() {
            return CommitResult::Success;
        }
        match self
            .store
            .commit_structures(&self.session_id, &self.structures)
        {
            Ok(()) => CommitResult::Success,
            Err(e) => {
                warn!(
                    session_id = %self.session_id,
                    structures = self.structures.len(),
                    "session mutation commit failed: {:#}",
                    e
                );
                CommitResult::Failure
            }
        }
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    journals: Mutex<HashMap<String, Vec<StreamStructure>>>,
    fail_commits: AtomicBool,
    commit_count: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following commit fail, e.g. to exercise optimistic writes
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Successful commits so far
    pub fn commit_count(&self) -> usize {
        self.commit_count.load(Ordering::SeqCst)
    }
}

impl Store for InMemoryStore {
    fn commit_structures(&self, session_id: &str, structures: &[StreamStructure]) -> Result<()> {
        if self.fail_commits.load(Ordering::SeqCst) {
            bail!("store rejected commit for session {}", session_id);
        }
        self.journals
            .lock()
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(structures);
        self.commit_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn session_structures(&self, session_id: &str) -> Result<Vec<StreamStructure>> {
        Ok(self
            .journals
            .lock()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    fn session_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.journals.lock().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    fn remove_session(&self, session_id: &str) -> Result<()> {
        self.journals.lock().remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_mutation_commits_batch() {
        let store: Rc<dyn Store> = Rc::new(InMemoryStore::new());

        let mut mutation = store.edit_session("s1");
        mutation
            .add(StreamStructure::add("0", None))
            .add(StreamStructure::add("1", Some("0")));
        assert_eq!(mutation.len(), 2);
        assert_eq!(mutation.commit(), CommitResult::Success);

        let journal = store.session_structures("s1").unwrap();
        assert_eq!(journal.len(), 2);
        assert_eq!(store.session_ids().unwrap(), vec!["s1"]);
    }

    #[test]
    fn test_failed_commit_reports_failure() {
        let store = InMemoryStore::new();
        store.set_fail_commits(true);

        let mut mutation = SessionMutation::new(&store, "s1");
        mutation.add(StreamStructure::add("0", None));
        assert_eq!(mutation.commit(), CommitResult::Failure);
        assert!(store.session_structures("s1").unwrap().is_empty());
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn test_empty_mutation_skips_store() {
        let store = InMemoryStore::new();
        store.set_fail_commits(true);

        let mutation = SessionMutation::new(&store, "s1");
        assert!(mutation.is_empty());
        assert!(mutation.commit().is_success());
    }

    #[test]
    fn test_remove_session() {
        let store = InMemoryStore::new();
        store
            .commit_structures("s1", &[StreamStructure::add("0", None)])
            .unwrap();
        store.remove_session("s1").unwrap();
        assert!(store.session_ids().unwrap().is_empty());
    }
}
