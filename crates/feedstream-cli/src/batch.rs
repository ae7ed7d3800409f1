//! Applying operation batches to persisted sessions

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use feedstream_core::scroll::ScrollPosition;
use feedstream_core::session::{
    CommitResult, ContentTree, MutationContext, Session, Store, StreamStructure, StreamToken,
    UpdateOutcome,
};
use feedstream_core::storage::{ScrollPositionStore, SqliteStore};

/// A batch of structures as read from an ops file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OperationBatch {
    pub structures: Vec<StreamStructure>,
    /// Continuation token the batch was fetched behind
    pub token: Option<StreamToken>,
    pub schema_version: i32,
    pub requires_view_depth: bool,
}

impl OperationBatch {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid batch {}", path.display()))
    }

    fn mutation_context(&self) -> Option<MutationContext> {
        self.token.clone().map(MutationContext::with_token)
    }
}

/// What happened when a batch was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyOutcome {
    /// The session was new and the batch populated it
    Populated { journaled: bool },
    Updated { journaled: bool },
    StaleToken,
}

/// Materialized view of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: String,
    pub root: Option<String>,
    /// `(depth, content id)` in tree order
    pub content: Vec<(usize, String)>,
    pub scroll_position: Option<ScrollPosition>,
}

/// Apply `batch` to `session_id`, creating the session if it has no journal yet
pub fn apply(
    store: &Rc<SqliteStore>,
    session_id: &str,
    batch: &OperationBatch,
) -> Result<ApplyOutcome> {
    let tree = Rc::new(ContentTree::new());
    let journal: Rc<dyn Store> = store.clone();

    if !store.session_exists(session_id)? {
        let mut session = Session::new(session_id, journal);
        session.bind_model_provider(tree);
        let commit = session.populate_model_provider(&batch.structures, batch.mutation_context())?;
        info!(session_id, content = session.content_in_session().len(), "session created");
        return Ok(ApplyOutcome::Populated {
            journaled: commit.is_success(),
        });
    }

    let mut session = Session::restore(journal, session_id, tree)?;
    let outcome = session.update_session(
        batch.requires_view_depth,
        &batch.structures,
        batch.schema_version,
        batch.mutation_context(),
    )?;
    Ok(match outcome {
        UpdateOutcome::Applied { store_commit } => ApplyOutcome::Updated {
            journaled: store_commit == CommitResult::Success,
        },
        UpdateOutcome::StaleToken => ApplyOutcome::StaleToken,
    })
}

/// Rebuild the session's content tree from its journal
pub fn show(store: &Rc<SqliteStore>, session_id: &str) -> Result<SessionView> {
    let tree = Rc::new(ContentTree::new());
    let journal: Rc<dyn Store> = store.clone();
    Session::restore(journal, session_id, tree.clone())?;

    let mut content = Vec::new();
    let root = tree.root_id();
    if let Some(root) = root.as_deref() {
        walk(&tree, root, 0, &mut content);
    }

    Ok(SessionView {
        session_id: session_id.to_string(),
        root,
        content,
        scroll_position: ScrollPositionStore::new(store.db()).load(session_id)?,
    })
}

fn walk(tree: &ContentTree, id: &str, depth: usize, out: &mut Vec<(usize, String)>) {
    out.push((depth, id.to_string()));
    for child in tree.children_of(id) {
        walk(tree, &child, depth + 1, out);
    }
}
