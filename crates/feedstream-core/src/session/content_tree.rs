//! Arena-style model provider
//!
//! Nodes are stored in a map keyed by content id; parent links are ids, not
//! references. Removing a node drops its entry and detaches it from its
//! parent, but never cascades to its children.

use std::cell::RefCell;
use std::collections::HashMap;

use tracing::{debug, warn};

use super::model_provider::{ChildChange, ModelChange, ModelProvider};
use super::types::StreamStructure;

#[derive(Debug, Default)]
struct Node {
    parent: Option<String>,
    children: Vec<String>,
}

#[derive(Debug, Default)]
struct TreeState {
    nodes: HashMap<String, Node>,
    root: Option<String>,
    session_id: Option<String>,
    commit_count: usize,
    update_count: usize,
}

impl TreeState {
    fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    fn add(&mut self, structure: &StreamStructure) {
        let id = &structure.content_id;
        if self.nodes.contains_key(id) {
            self.update_count += 1;
            return;
        }

        match structure.parent_content_id.as_deref() {
            None => {
                if let Some(root) = self.root.as_ref().filter(|root| *root != id) {
                    warn!(root = %root, content_id = %id, "second root ignored");
                    return;
                }
                self.root = Some(id.clone());
            }
            Some(parent_id) => {
                let Some(parent) = self.nodes.get_mut(parent_id) else {
                    warn!(content_id = %id, parent_id, "parent not found, child ignored");
                    return;
                };
                parent.children.push(id.clone());
            }
        }

        self.nodes.insert(
            id.clone(),
            Node {
                parent: structure.parent_content_id.clone(),
                children: Vec::new(),
            },
        );
    }

    fn remove(&mut self, structure: &StreamStructure) {
        let id = &structure.content_id;
        let Some(node) = self.nodes.remove(id) else {
            debug!(content_id = %id, "remove of unknown child");
            return;
        };
        match node.parent {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.children.retain(|child| child != id);
                }
            }
            None => {
                if self.root.as_ref() == Some(id) {
                    self.root = None;
                }
            }
        }
    }
}

/// In-memory tree of the content a session has committed
#[derive(Debug, Default)]
pub struct ContentTree {
    state: RefCell<TreeState>,
}

impl ContentTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root_id(&self) -> Option<String> {
        self.state.borrow().root.clone()
    }

    /// Ordered child ids of `content_id`; empty when unknown
    pub fn children_of(&self, content_id: &str) -> Vec<String> {
        self.state
            .borrow()
            .nodes
            .get(content_id)
            .map(|node| node.children.clone())
            .unwrap_or_default()
    }

    /// Children of the root feature
    pub fn root_children(&self) -> Vec<String> {
        self.root_id()
            .map(|root| self.children_of(&root))
            .unwrap_or_default()
    }

    pub fn contains(&self, content_id: &str) -> bool {
        self.state.borrow().nodes.contains_key(content_id)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn session_id(&self) -> Option<String> {
        self.state.borrow().session_id.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.state.borrow().commit_count
    }

    /// Updates seen for children that were already present
    pub fn update_count(&self) -> usize {
        self.state.borrow().update_count
    }
}

impl ModelProvider for ContentTree {
    fn commit(&self, change: ModelChange) {
        let mut state = self.state.borrow_mut();
        state.commit_count += 1;
        if change.session_id.is_some() {
            state.session_id = change.session_id.clone();
        }

        for child_change in &change.changes {
            match child_change {
                ChildChange::ClearAll => state.clear(),
                ChildChange::Add(structure) => state.add(structure),
                ChildChange::Update(_) => state.update_count += 1,
                ChildChange::Remove(structure) => state.remove(structure),
            }
        }

        debug!(
            changes = change.changes.len(),
            nodes = state.nodes.len(),
            commit = state.commit_count,
            "model committed"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::session::model_provider::ModelMutation;

    fn feature(id: &str, parent: &str) -> StreamStructure {
        StreamStructure::add(id, Some(parent))
    }

    #[test]
    fn test_builds_tree_in_order() {
        let tree = Rc::new(ContentTree::new());
        let mut mutation = ModelMutation::new(tree.clone());
        mutation
            .set_session_id("s1")
            .add_child(StreamStructure::add("0", None))
            .add_child(feature("1", "0"))
            .add_child(feature("2", "0"))
            .add_child(feature("1.a", "1"));
        mutation.commit();

        assert_eq!(tree.root_id().as_deref(), Some("0"));
        assert_eq!(tree.root_children(), vec!["1", "2"]);
        assert_eq!(tree.children_of("1"), vec!["1.a"]);
        assert_eq!(tree.session_id().as_deref(), Some("s1"));
        assert_eq!(tree.commit_count(), 1);
    }

    #[test]
    fn test_remove_does_not_cascade() {
        let tree = Rc::new(ContentTree::new());
        let mut mutation = ModelMutation::new(tree.clone());
        mutation
            .add_child(StreamStructure::add("0", None))
            .add_child(feature("1", "0"))
            .add_child(feature("1.a", "1"))
            .remove_child(StreamStructure::remove("1", Some("0")));
        mutation.commit();

        assert!(!tree.contains("1"));
        assert!(tree.contains("1.a"));
        assert!(tree.root_children().is_empty());
    }

    #[test]
    fn test_orphan_and_second_root_ignored() {
        let tree = Rc::new(ContentTree::new());
        let mut mutation = ModelMutation::new(tree.clone());
        mutation
            .add_child(StreamStructure::add("0", None))
            .add_child(StreamStructure::add("other-root", None))
            .add_child(feature("x", "missing"));
        mutation.commit();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_id().as_deref(), Some("0"));
    }

    #[test]
    fn test_clear_then_readd() {
        let tree = Rc::new(ContentTree::new());
        let mut first = ModelMutation::new(tree.clone());
        first
            .add_child(StreamStructure::add("0", None))
            .add_child(feature("1", "0"));
        first.commit();

        let mut second = ModelMutation::new(tree.clone());
        second
            .clear_all()
            .add_child(StreamStructure::add("0", None))
            .add_child(feature("1", "0"))
            .update_child(StreamStructure::update("1"));
        second.commit();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.root_children(), vec!["1"]);
        assert_eq!(tree.update_count(), 1);
        assert_eq!(tree.commit_count(), 2);
    }
}
