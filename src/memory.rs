//! In-memory reference implementations of the collaborator traits.
//!
//! These back headless use and the test suites: a Vec-based render stack, an
//! `IndexMap` source registry, an insertion-ordered selection set, and a
//! uuid-v4 id allocator. They implement the trait contracts exactly -
//! notably front insertion and remove-then-insert move semantics on the
//! stack - so tests against them exercise the same index arithmetic a real
//! backend would see.

use indexmap::{IndexMap, IndexSet};
use uuid::Uuid;

use crate::error::SceneError;
use crate::traits::{
    ContentHandle, EntryId, IdAllocator, RenderBackend, SelectionService, SourceRegistry,
};

/// One entry of the in-memory render stack.
#[derive(Clone, Debug)]
pub struct StackEntry {
    pub id: EntryId,
    pub content: ContentHandle,
}

/// Vec-backed render stack.
#[derive(Debug, Default)]
pub struct MemoryStack {
    entries: Vec<StackEntry>,
    next_id: EntryId,
    moves: usize,
}

impl MemoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    /// Entry ids front-to-back.
    pub fn entry_ids(&self) -> Vec<EntryId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Source ids front-to-back.
    pub fn source_order(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.content.source_id.clone())
            .collect()
    }

    /// How many `move_entry` calls this stack has served.
    pub fn move_count(&self) -> usize {
        self.moves
    }
}

impl RenderBackend for MemoryStack {
    fn create_stack_entry(&mut self, content: &ContentHandle) -> Result<EntryId, SceneError> {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.insert(
            0,
            StackEntry {
                id,
                content: content.clone(),
            },
        );
        log::trace!("stack: created entry {} for {}", id, content.source_id);
        Ok(id)
    }

    fn move_entry(&mut self, from: usize, to: usize) -> Result<(), SceneError> {
        if from >= self.entries.len() {
            return Err(SceneError::Backend(format!(
                "move from {} out of bounds ({} entries)",
                from,
                self.entries.len()
            )));
        }
        let entry = self.entries.remove(from);
        let to = to.min(self.entries.len());
        self.entries.insert(to, entry);
        self.moves += 1;
        Ok(())
    }

    fn remove_entry(&mut self, entry: EntryId) -> Result<(), SceneError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == entry)
            .ok_or_else(|| SceneError::Backend(format!("no stack entry {entry}")))?;
        self.entries.remove(pos);
        Ok(())
    }
}

/// Source registry over an insertion-ordered map.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    sources: IndexMap<String, ContentHandle>,
    scene_sources: IndexMap<String, Vec<String>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_media(&mut self, source_id: impl Into<String>) {
        let source_id = source_id.into();
        let handle = ContentHandle::media(source_id.clone());
        self.sources.insert(source_id, handle);
    }

    /// Registers a source that renders the given scene.
    pub fn register_scene(&mut self, source_id: impl Into<String>, scene_id: impl Into<String>) {
        let source_id = source_id.into();
        let handle = ContentHandle::scene(source_id.clone(), scene_id);
        self.sources.insert(source_id, handle);
    }

    pub fn unregister(&mut self, source_id: &str) {
        self.sources.shift_remove(source_id);
    }

    /// Records which sources a scene's items currently reference, for
    /// composition walks across scenes.
    pub fn set_scene_sources(&mut self, scene_id: impl Into<String>, source_ids: Vec<String>) {
        self.scene_sources.insert(scene_id.into(), source_ids);
    }
}

impl SourceRegistry for MemoryRegistry {
    fn resolve(&self, source_id: &str) -> Option<ContentHandle> {
        self.sources.get(source_id).cloned()
    }

    fn scene_source_ids(&self, scene_id: &str) -> Vec<String> {
        self.scene_sources.get(scene_id).cloned().unwrap_or_default()
    }
}

/// Insertion-ordered selection set.
#[derive(Debug, Default)]
pub struct MemorySelection {
    selected: IndexSet<String>,
}

impl MemorySelection {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionService for MemorySelection {
    fn select(&mut self, node_id: &str) {
        self.selected.insert(node_id.to_string());
    }

    fn deselect(&mut self, node_id: &str) {
        self.selected.shift_remove(node_id);
    }

    fn is_selected(&self, node_id: &str) -> bool {
        self.selected.contains(node_id)
    }

    fn selection(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }
}

/// Uuid-v4 id source for live authoring.
#[derive(Debug, Default)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn new_unique_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_inserts_at_front() {
        let mut stack = MemoryStack::new();
        stack.create_stack_entry(&ContentHandle::media("a")).unwrap();
        stack.create_stack_entry(&ContentHandle::media("b")).unwrap();
        assert_eq!(stack.source_order(), ["b", "a"]);
    }

    #[test]
    fn stack_move_is_remove_then_insert() {
        let mut stack = MemoryStack::new();
        for id in ["c", "b", "a"] {
            stack.create_stack_entry(&ContentHandle::media(id)).unwrap();
        }
        assert_eq!(stack.source_order(), ["a", "b", "c"]);
        stack.move_entry(0, 2).unwrap();
        assert_eq!(stack.source_order(), ["b", "c", "a"]);
        // Target past the end clamps to the tail.
        stack.move_entry(0, 99).unwrap();
        assert_eq!(stack.source_order(), ["c", "a", "b"]);
        assert_eq!(stack.move_count(), 2);
    }

    #[test]
    fn stack_move_from_out_of_bounds_fails() {
        let mut stack = MemoryStack::new();
        assert!(matches!(
            stack.move_entry(0, 0),
            Err(SceneError::Backend(_))
        ));
    }

    #[test]
    fn stack_remove_by_entry_id() {
        let mut stack = MemoryStack::new();
        let a = stack.create_stack_entry(&ContentHandle::media("a")).unwrap();
        let b = stack.create_stack_entry(&ContentHandle::media("b")).unwrap();
        stack.remove_entry(a).unwrap();
        assert_eq!(stack.entry_ids(), [b]);
        assert!(stack.remove_entry(a).is_err());
    }

    #[test]
    fn registry_resolves_registered_sources() {
        let mut registry = MemoryRegistry::new();
        registry.register_media("clip");
        registry.register_scene("nested", "scene_b");
        assert_eq!(registry.resolve("clip"), Some(ContentHandle::media("clip")));
        assert_eq!(
            registry.resolve("nested").unwrap().scene_id(),
            Some("scene_b")
        );
        assert!(registry.resolve("missing").is_none());
        registry.unregister("clip");
        assert!(registry.resolve("clip").is_none());
    }

    #[test]
    fn selection_preserves_insertion_order() {
        let mut selection = MemorySelection::new();
        selection.select("a");
        selection.select("b");
        selection.select("a");
        assert_eq!(selection.selection(), ["a", "b"]);
        assert!(selection.is_selected("a"));
        selection.deselect("a");
        assert!(!selection.is_selected("a"));
        assert_eq!(selection.selection(), ["b"]);
    }

    #[test]
    fn uuid_allocator_mints_unique_ids() {
        let ids = UuidAllocator;
        assert_ne!(ids.new_unique_id(), ids.new_unique_id());
    }
}
