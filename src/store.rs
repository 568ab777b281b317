//! NodeStore - ordered node storage for one scene.
//!
//! The store owns the flattened node sequence that everything else derives
//! from: tree structure, node indices, item indices. Mutations are atomic
//! from the caller's perspective - `reorder` validates the whole permutation
//! before touching anything, and folder `children_ids` are resynced from the
//! committed order after every structural change so they can never go stale
//! independently.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::node::Node;
use crate::view::NodeRef;

/// Ordered storage for all nodes of a scene.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeStore {
    nodes: Vec<Node>,
}

impl NodeStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Full node order, front (index 0) first.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Node ids in node order.
    pub fn ids(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.id().to_string()).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id() == id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    /// Borrowing view over a node, for index/ancestry queries.
    pub fn view(&self, id: &str) -> Option<NodeRef<'_>> {
        self.node_index(id).map(|index| NodeRef::new(self, index))
    }

    /// Position of a node in the full node order.
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id() == id)
    }

    /// Inserts a node at the front of the node order.
    ///
    /// Fails with `DuplicateId` if the id is already taken - id uniqueness is
    /// enforced at construction, never repaired after the fact.
    pub fn insert_at_head(&mut self, node: Node) -> Result<(), SceneError> {
        if self.contains(node.id()) {
            return Err(SceneError::DuplicateId(node.id().to_string()));
        }
        self.nodes.insert(0, node);
        self.sync_children();
        Ok(())
    }

    /// Removes a node and returns it. Children of a removed folder are left
    /// in place - cascading is the caller's decision, not the store's.
    pub fn remove(&mut self, id: &str) -> Option<Node> {
        let pos = self.node_index(id)?;
        let node = self.nodes.remove(pos);
        self.sync_children();
        Some(node)
    }

    /// Replaces the node order with a permutation of the current ids.
    ///
    /// The sequence is validated up front; on a size mismatch or unknown id
    /// the store keeps its prior order and returns `InvalidPermutation`.
    /// That error means the caller's index arithmetic is broken, so it is
    /// also logged at error level.
    pub fn reorder(&mut self, new_order: &[String]) -> Result<(), SceneError> {
        if new_order.len() != self.nodes.len() {
            let reason = format!(
                "expected {} ids, got {}",
                self.nodes.len(),
                new_order.len()
            );
            log::error!("reorder rejected: {}", reason);
            return Err(SceneError::InvalidPermutation(reason));
        }
        let current: HashSet<&str> = self.nodes.iter().map(|n| n.id()).collect();
        let proposed: HashSet<&str> = new_order.iter().map(|s| s.as_str()).collect();
        if proposed.len() != new_order.len() || proposed != current {
            let reason = "sequence is not a permutation of current ids".to_string();
            log::error!("reorder rejected: {}", reason);
            return Err(SceneError::InvalidPermutation(reason));
        }

        let mut by_id: HashMap<String, Node> = self
            .nodes
            .drain(..)
            .map(|n| (n.id().to_string(), n))
            .collect();
        self.nodes = new_order
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
        self.sync_children();
        Ok(())
    }

    /// Mutable iteration over nodes, for bulk property updates.
    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.iter_mut()
    }

    /// Resyncs every folder's `children_ids` from the node order and
    /// `parent_id` fields - the single source of truth.
    pub(crate) fn sync_children(&mut self) {
        let mut children: HashMap<String, Vec<String>> = self
            .nodes
            .iter()
            .filter(|n| n.is_folder())
            .map(|n| (n.id().to_string(), Vec::new()))
            .collect();
        for node in &self.nodes {
            let parent = node.parent_id();
            if parent.is_empty() {
                continue;
            }
            if let Some(list) = children.get_mut(parent) {
                list.push(node.id().to_string());
            }
        }
        for node in &mut self.nodes {
            if let Node::Folder(folder) = node {
                folder.children_ids = children.remove(&folder.id).unwrap_or_default();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Folder, Item};

    fn item(id: &str) -> Node {
        Node::Item(Item::new(id, format!("src_{id}")))
    }

    fn folder(id: &str) -> Node {
        Node::Folder(Folder::new(id))
    }

    fn store_with(ids: &[&str]) -> NodeStore {
        let mut store = NodeStore::new();
        for id in ids.iter().rev() {
            store.insert_at_head(item(id)).unwrap();
        }
        store
    }

    #[test]
    fn insert_at_head_prepends() {
        let mut store = NodeStore::new();
        store.insert_at_head(item("a")).unwrap();
        store.insert_at_head(item("b")).unwrap();
        assert_eq!(store.ids(), ["b", "a"]);
        assert_eq!(store.node_index("b"), Some(0));
        assert_eq!(store.node_index("a"), Some(1));
    }

    #[test]
    fn insert_duplicate_id_rejected() {
        let mut store = NodeStore::new();
        store.insert_at_head(item("a")).unwrap();
        let err = store.insert_at_head(item("a")).unwrap_err();
        assert_eq!(err, SceneError::DuplicateId("a".into()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_returns_node_and_keeps_rest() {
        let mut store = store_with(&["a", "b", "c"]);
        let node = store.remove("b").unwrap();
        assert_eq!(node.id(), "b");
        assert_eq!(store.ids(), ["a", "c"]);
        assert!(store.remove("b").is_none());
    }

    #[test]
    fn reorder_applies_permutation() {
        let mut store = store_with(&["a", "b", "c"]);
        store
            .reorder(&["c".into(), "a".into(), "b".into()])
            .unwrap();
        assert_eq!(store.ids(), ["c", "a", "b"]);
    }

    #[test]
    fn reorder_rejects_size_mismatch() {
        let mut store = store_with(&["a", "b"]);
        let err = store.reorder(&["a".into()]).unwrap_err();
        assert!(matches!(err, SceneError::InvalidPermutation(_)));
        assert_eq!(store.ids(), ["a", "b"]);
    }

    #[test]
    fn reorder_rejects_unknown_id() {
        let mut store = store_with(&["a", "b"]);
        let err = store.reorder(&["a".into(), "x".into()]).unwrap_err();
        assert!(matches!(err, SceneError::InvalidPermutation(_)));
        assert_eq!(store.ids(), ["a", "b"]);
    }

    #[test]
    fn reorder_rejects_duplicated_id() {
        let mut store = store_with(&["a", "b"]);
        let err = store.reorder(&["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, SceneError::InvalidPermutation(_)));
        assert_eq!(store.ids(), ["a", "b"]);
    }

    #[test]
    fn sync_children_tracks_parent_ids() {
        let mut store = NodeStore::new();
        store.insert_at_head(item("b")).unwrap();
        store.insert_at_head(item("a")).unwrap();
        store.insert_at_head(folder("f")).unwrap();
        store.get_mut("a").unwrap().set_parent_id("f");
        store.get_mut("b").unwrap().set_parent_id("f");
        store.reorder(&["f".into(), "a".into(), "b".into()]).unwrap();

        let children = &store.get("f").unwrap().as_folder().unwrap().children_ids;
        assert_eq!(children, &["a", "b"]);

        store.remove("a");
        let children = &store.get("f").unwrap().as_folder().unwrap().children_ids;
        assert_eq!(children, &["b"]);
    }
}
