//! Session mutation reconciliation
//!
//! A [`Session`] materializes structural operations into a set of content
//! ids, journals them to a [`Store`] through a single-use
//! [`SessionMutation`], and pushes each delta to a [`ModelProvider`].

mod content_tree;
mod model_provider;
mod session_impl;
mod store;
mod types;

pub use content_tree::ContentTree;
pub use model_provider::{ChildChange, ModelChange, ModelMutation, ModelProvider};
pub use session_impl::{Session, SessionState, UpdateOutcome};
pub use store::{CommitResult, InMemoryStore, SessionMutation, Store};
pub use types::{MutationContext, Operation, StreamStructure, StreamToken};
