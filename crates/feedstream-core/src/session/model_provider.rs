//! Model provider seam: consumers of committed session deltas

use std::rc::Rc;

use super::types::{MutationContext, StreamStructure};

/// One child-level edit inside a [`ModelChange`], in application order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildChange {
    ClearAll,
    Add(StreamStructure),
    Update(StreamStructure),
    Remove(StreamStructure),
}

/// Delta handed to a [`ModelProvider`] on commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelChange {
    pub session_id: Option<String>,
    pub changes: Vec<ChildChange>,
    pub mutation_context: Option<MutationContext>,
    pub requires_view_depth: bool,
}

impl ModelChange {
    pub fn added(&self) -> impl Iterator<Item = &StreamStructure> {
        self.changes.iter().filter_map(|c| match c {
            ChildChange::Add(s) => Some(s),
            _ => None,
        })
    }

    pub fn updated(&self) -> impl Iterator<Item = &StreamStructure> {
        self.changes.iter().filter_map(|c| match c {
            ChildChange::Update(s) => Some(s),
            _ => None,
        })
    }

    pub fn removed(&self) -> impl Iterator<Item = &StreamStructure> {
        self.changes.iter().filter_map(|c| match c {
            ChildChange::Remove(s) => Some(s),
            _ => None,
        })
    }

    pub fn cleared(&self) -> bool {
        self.changes.iter().any(|c| matches!(c, ChildChange::ClearAll))
    }
}

/// Maintains the renderable tree derived from session content
pub trait ModelProvider {
    /// Apply a committed delta
    fn commit(&self, change: ModelChange);
}

/// Single-use builder for a [`ModelChange`]
pub struct ModelMutation {
    provider: Rc<dyn ModelProvider>,
    change: ModelChange,
}

impl ModelMutation {
    pub fn new(provider: Rc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            change: ModelChange::default(),
        }
    }

    pub fn add_child(&mut self, structure: StreamStructure) -> &mut Self {
        self.change.changes.push(ChildChange::Add(structure));
        self
    }

    pub fn update_child(&mut self, structure: StreamStructure) -> &mut Self {
        self.change.changes.push(ChildChange::Update(structure));
        self
    }

    pub fn remove_child(&mut self, structure: StreamStructure) -> &mut Self {
        self.change.changes.push(ChildChange::Remove(structure));
        self
    }

    pub fn clear_all(&mut self) -> &mut Self {
        self.change.changes.push(ChildChange::ClearAll);
        self
    }

    pub fn set_session_id(&mut self, session_id: &str) -> &mut Self {
        self.change.session_id = Some(session_id.to_string());
        self
    }

    pub fn set_mutation_context(&mut self, context: Option<MutationContext>) -> &mut Self {
        self.change.mutation_context = context;
        self
    }

    pub fn set_requires_view_depth(&mut self, requires_view_depth: bool) -> &mut Self {
        self.change.requires_view_depth = requires_view_depth;
        self
    }

    /// Hand the accumulated delta to the provider
    pub fn commit(self) {
        self.provider.commit(self.change);
    }
}
