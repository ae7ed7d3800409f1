//! Session state and delta reconciliation

use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, info, warn};

use super::model_provider::{ModelMutation, ModelProvider};
use super::store::{CommitResult, Store};
use super::types::{MutationContext, Operation, StreamStructure};
use crate::error::SessionError;

/// Lifecycle of a [`Session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No model provider attached
    Unbound,
    /// Provider attached, initial content not yet pushed
    Populating,
    /// Initial content pushed; incremental updates flow
    Bound,
}

/// Result of [`Session::update_session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Structures applied; `store_commit` reports the journal write
    Applied { store_commit: CommitResult },
    /// The continuation token is not part of this session; nothing applied
    StaleToken,
}

/// Materialized view of a session's structural operations
///
/// In-memory state is updated optimistically: a failed journal write is
/// reported but the model provider still receives the delta.
pub struct Session {
    session_id: String,
    content_in_session: HashSet<String>,
    model_provider: Option<Rc<dyn ModelProvider>>,
    store: Rc<dyn Store>,
    state: SessionState,
    schema_version: i32,
    update_count: usize,
    /// Whether the store may already hold journal rows for this session
    journaled: bool,
}

impl Session {
    pub fn new(session_id: impl Into<String>, store: Rc<dyn Store>) -> Self {
        Self {
            session_id: session_id.into(),
            content_in_session: HashSet::new(),
            model_provider: None,
            store,
            state: SessionState::Unbound,
            schema_version: 0,
            update_count: 0,
            journaled: false,
        }
    }

    /// New session with a generated id
    pub fn create(store: Rc<dyn Store>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), store)
    }

    /// Rebuild a session from its journal and push the surviving content to
    /// `provider`. The journal is replayed, not re-written.
    pub fn restore(
        store: Rc<dyn Store>,
        session_id: &str,
        provider: Rc<dyn ModelProvider>,
    ) -> Result<Self, SessionError> {
        let journal = store.session_structures(session_id)?;
        if journal.is_empty() {
            return Err(SessionError::SessionNotFound(session_id.to_string()));
        }
        let surviving = replay_journal(&journal);
        info!(
            session_id,
            journaled = journal.len(),
            surviving = surviving.len(),
            "restoring session from journal"
        );

        let mut session = Self::new(session_id, store);
        session.journaled = true;
        session.bind_model_provider(provider);
        session.populate(&surviving, None, false)?;
        Ok(session)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn schema_version(&self) -> i32 {
        self.schema_version
    }

    /// Incremental updates applied so far (stale-token batches excluded)
    pub fn update_count(&self) -> usize {
        self.update_count
    }

    /// Content ids currently materialized in the session
    pub fn content_in_session(&self) -> &HashSet<String> {
        &self.content_in_session
    }

    pub fn has_model_provider(&self) -> bool {
        self.model_provider.is_some()
    }

    /// Attach the provider that will receive this session's content
    pub fn bind_model_provider(&mut self, provider: Rc<dyn ModelProvider>) {
        self.model_provider = Some(provider);
        self.state = SessionState::Populating;
    }

    /// Drop the provider; content stays materialized for a later rebind
    pub fn detach_model_provider(&mut self) {
        if self.model_provider.take().is_some() {
            debug!(session_id = %self.session_id, "model provider detached");
        }
        self.state = SessionState::Unbound;
    }

    /// Initial bootstrap: materialize the ADD operations in `structures` and
    /// push them to the provider as one batch.
    pub fn populate_model_provider(
        &mut self,
        structures: &[StreamStructure],
        mutation_context: Option<MutationContext>,
    ) -> Result<CommitResult, SessionError> {
        self.populate(structures, mutation_context, true)
    }

    fn populate(
        &mut self,
        structures: &[StreamStructure],
        mutation_context: Option<MutationContext>,
        journal: bool,
    ) -> Result<CommitResult, SessionError> {
        let provider = self.bound_provider()?;
        if self.state == SessionState::Bound {
            return Err(SessionError::AlreadyPopulated(self.session_id.clone()));
        }

        let store = self.store.clone();
        let mut session_mutation = store.edit_session(&self.session_id);
        let mut model_mutation = ModelMutation::new(provider);
        model_mutation
            .set_session_id(&self.session_id)
            .set_mutation_context(mutation_context);

        // Earlier content must not survive a journal replay
        if !self.content_in_session.is_empty() || (journal && self.journaled) {
            self.content_in_session.clear();
            model_mutation.clear_all();
            if journal {
                session_mutation.add(StreamStructure::clear_all());
            }
        }
        for structure in structures {
            if structure.operation != Operation::UpdateOrAppend {
                debug!(operation = ?structure.operation, "skipping non-add during populate");
                continue;
            }
            if self.content_in_session.insert(structure.content_id.clone()) {
                model_mutation.add_child(structure.clone());
                if journal {
                    session_mutation.add(structure.clone());
                }
            }
        }

        self.journaled |= !session_mutation.is_empty();
        let commit = session_mutation.commit();
        model_mutation.commit();
        self.state = SessionState::Bound;

        info!(
            session_id = %self.session_id,
            content = self.content_in_session.len(),
            "session populated"
        );
        Ok(commit)
    }

    /// Apply an incremental batch of structures.
    ///
    /// A batch behind a continuation token only applies when the token's
    /// content id is already in the session.
    pub fn update_session(
        &mut self,
        requires_view_depth: bool,
        structures: &[StreamStructure],
        schema_version: i32,
        mutation_context: Option<MutationContext>,
    ) -> Result<UpdateOutcome, SessionError> {
        let provider = self.bound_provider()?;

        if let Some(token) = mutation_context
            .as_ref()
            .and_then(|context| context.continuation_token.as_ref())
        {
            if !self.content_in_session.contains(&token.content_id) {
                debug!(
                    session_id = %self.session_id,
                    token = %token.content_id,
                    "token not in session, ignoring update"
                );
                return Ok(UpdateOutcome::StaleToken);
            }
        }

        self.schema_version = schema_version;
        self.update_count += 1;

        let store = self.store.clone();
        let mut session_mutation = store.edit_session(&self.session_id);
        let mut model_mutation = ModelMutation::new(provider);
        model_mutation
            .set_session_id(&self.session_id)
            .set_requires_view_depth(requires_view_depth)
            .set_mutation_context(mutation_context);

        for structure in structures {
            let content_id = &structure.content_id;
            match structure.operation {
                Operation::ClearAll => {
                    self.content_in_session.clear();
                    model_mutation.clear_all();
                    session_mutation.add(structure.clone());
                }
                Operation::UpdateOrAppend => {
                    if self.content_in_session.insert(content_id.clone()) {
                        model_mutation.add_child(structure.clone());
                    } else {
                        model_mutation.update_child(structure.clone());
                    }
                    session_mutation.add(structure.clone());
                }
                Operation::Remove => {
                    if self.content_in_session.remove(content_id) {
                        model_mutation.remove_child(structure.clone());
                        session_mutation.add(structure.clone());
                    } else {
                        debug!(content_id = %content_id, "remove of content not in session");
                    }
                }
                Operation::Update => {
                    if self.content_in_session.contains(content_id) {
                        model_mutation.update_child(structure.clone());
                    } else {
                        debug!(content_id = %content_id, "update of content not in session");
                    }
                }
            }
        }

        self.journaled |= !session_mutation.is_empty();
        let store_commit = session_mutation.commit();
        if store_commit == CommitResult::Failure {
            warn!(
                session_id = %self.session_id,
                "journal write failed, applying update in memory only"
            );
        }
        model_mutation.commit();

        Ok(UpdateOutcome::Applied { store_commit })
    }

    fn bound_provider(&self) -> Result<Rc<dyn ModelProvider>, SessionError> {
        self.model_provider
            .clone()
            .ok_or_else(|| SessionError::ModelProviderNotBound(self.session_id.clone()))
    }
}

/// Fold a journal into the ADDs still materialized, in insertion order
fn replay_journal(journal: &[StreamStructure]) -> Vec<StreamStructure> {
    let mut surviving: Vec<StreamStructure> = Vec::new();
    for structure in journal {
        match structure.operation {
            Operation::ClearAll => surviving.clear(),
            Operation::UpdateOrAppend => {
                if !surviving
                    .iter()
                    .any(|s| s.content_id == structure.content_id)
                {
                    surviving.push(structure.clone());
                }
            }
            Operation::Remove => surviving.retain(|s| s.content_id != structure.content_id),
            Operation::Update => {}
        }
    }
    surviving
}
