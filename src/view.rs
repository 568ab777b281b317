//! Node views - read-only navigation over a store entry.
//!
//! A `NodeRef` pairs a node with the store it lives in and answers the
//! derived-position questions the placement engine is built on: where is this
//! node in the full node order, where is it in the item-only order, what
//! precedes and follows it, what does its subtree contain. All answers are
//! recomputed from the node order on every call; nothing here is cached and
//! nothing here mutates.

use crate::node::Node;
use crate::store::NodeStore;

/// Borrowing, copyable view over one node of a store.
///
/// Holds the node's position at construction; the store cannot change while
/// the view's borrow is live, so the position stays valid.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    store: &'a NodeStore,
    index: usize,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(store: &'a NodeStore, index: usize) -> Self {
        Self { store, index }
    }

    pub fn node(&self) -> &'a Node {
        &self.store.nodes()[self.index]
    }

    pub fn id(&self) -> &'a str {
        self.node().id()
    }

    pub fn is_folder(&self) -> bool {
        self.node().is_folder()
    }

    /// Position in the full node order.
    pub fn node_index(&self) -> usize {
        self.index
    }

    /// Position in the item-only order.
    ///
    /// For an item this is its index among Item nodes. For a folder it is the
    /// item index of the nearest preceding item in node order - the anchor the
    /// placement engine measures folder destinations against - and `None`
    /// when no item precedes the folder anywhere in the scene.
    pub fn item_index(&self) -> Option<usize> {
        match self.node() {
            Node::Item(_) => Some(
                self.store.nodes()[..self.index]
                    .iter()
                    .filter(|n| n.is_item())
                    .count(),
            ),
            Node::Folder(_) => self.prev_item().and_then(|item| item.item_index()),
        }
    }

    /// Enclosing folder, if any.
    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let parent_id = self.node().parent_id();
        if parent_id.is_empty() {
            return None;
        }
        self.store.view(parent_id)
    }

    /// Adjacent node before this one in node order.
    pub fn prev_node(&self) -> Option<NodeRef<'a>> {
        if self.index == 0 {
            return None;
        }
        Some(NodeRef::new(self.store, self.index - 1))
    }

    /// Adjacent node after this one in node order.
    pub fn next_node(&self) -> Option<NodeRef<'a>> {
        if self.index + 1 >= self.store.len() {
            return None;
        }
        Some(NodeRef::new(self.store, self.index + 1))
    }

    /// Nearest preceding Item node in node order (skipping folders).
    pub fn prev_item(&self) -> Option<NodeRef<'a>> {
        self.store.nodes()[..self.index]
            .iter()
            .rposition(|n| n.is_item())
            .map(|idx| NodeRef::new(self.store, idx))
    }

    /// All descendants, depth-first in display order. Empty for items.
    pub fn nested_nodes(&self) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        if let Node::Folder(folder) = self.node() {
            for child_id in &folder.children_ids {
                if let Some(child) = self.store.view(child_id) {
                    out.push(child);
                    out.extend(child.nested_nodes());
                }
            }
        }
        out
    }

    /// Item-variant descendants, depth-first in display order.
    pub fn nested_items(&self) -> Vec<NodeRef<'a>> {
        self.nested_nodes()
            .into_iter()
            .filter(|n| !n.is_folder())
            .collect()
    }

    /// Ids of all descendants, depth-first.
    pub fn nested_node_ids(&self) -> Vec<String> {
        self.nested_nodes()
            .iter()
            .map(|n| n.id().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Folder, Item};

    /// Builds [f(a, g(b)), a, g, b, c] where f and g are folders.
    fn fixture() -> NodeStore {
        let mut store = NodeStore::new();
        for node in [
            Node::Item(Item::new("c", "src_c")),
            Node::Item(Item::new("b", "src_b")),
            Node::Folder(Folder::new("g")),
            Node::Item(Item::new("a", "src_a")),
            Node::Folder(Folder::new("f")),
        ] {
            store.insert_at_head(node).unwrap();
        }
        store.get_mut("a").unwrap().set_parent_id("f");
        store.get_mut("g").unwrap().set_parent_id("f");
        store.get_mut("b").unwrap().set_parent_id("g");
        store
            .reorder(&["f".into(), "a".into(), "g".into(), "b".into(), "c".into()])
            .unwrap();
        store
    }

    #[test]
    fn node_and_item_indices() {
        let store = fixture();
        assert_eq!(store.view("f").unwrap().node_index(), 0);
        assert_eq!(store.view("b").unwrap().node_index(), 3);
        // Items a, b, c have item indices 0, 1, 2.
        assert_eq!(store.view("a").unwrap().item_index(), Some(0));
        assert_eq!(store.view("b").unwrap().item_index(), Some(1));
        assert_eq!(store.view("c").unwrap().item_index(), Some(2));
    }

    #[test]
    fn folder_item_index_is_preceding_item_anchor() {
        let store = fixture();
        // f has no item before it anywhere in the scene.
        assert_eq!(store.view("f").unwrap().item_index(), None);
        // g is preceded by item a at item index 0.
        assert_eq!(store.view("g").unwrap().item_index(), Some(0));
    }

    #[test]
    fn neighbors() {
        let store = fixture();
        let g = store.view("g").unwrap();
        assert_eq!(g.prev_node().unwrap().id(), "a");
        assert_eq!(g.next_node().unwrap().id(), "b");
        assert_eq!(g.prev_item().unwrap().id(), "a");
        assert!(store.view("f").unwrap().prev_node().is_none());
        assert!(store.view("c").unwrap().next_node().is_none());
    }

    #[test]
    fn nested_traversal_is_depth_first() {
        let store = fixture();
        let f = store.view("f").unwrap();
        let nested: Vec<&str> = f.nested_nodes().iter().map(|n| n.id()).collect();
        assert_eq!(nested, ["a", "g", "b"]);
        let items: Vec<&str> = f.nested_items().iter().map(|n| n.id()).collect();
        assert_eq!(items, ["a", "b"]);
        assert!(store.view("c").unwrap().nested_nodes().is_empty());
    }

    #[test]
    fn parent_walks_up() {
        let store = fixture();
        let b = store.view("b").unwrap();
        assert_eq!(b.parent().unwrap().id(), "g");
        assert_eq!(b.parent().unwrap().parent().unwrap().id(), "f");
        assert!(store.view("f").unwrap().parent().is_none());
    }
}
