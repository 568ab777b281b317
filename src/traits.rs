//! Abstract traits for the scene graph's external collaborators.
//!
//! These traits define the interfaces the core needs from its surroundings -
//! the render backend that owns the parallel item stack, the registry that
//! owns renderable content, the selection tracker, and the id allocator.
//! Concrete implementations live outside the core (in-memory reference
//! implementations for tests and headless use are in `memory`).
//!
//! Collaborators are passed explicitly via [`SceneContext`]; nothing is
//! resolved ambiently.

use serde::{Deserialize, Serialize};

use crate::error::SceneError;

/// Render backend's identifier for one entry in its linear stack.
pub type EntryId = u64;

/// What a resolved source actually is.
///
/// A `SceneRef` source renders another scene; nesting may go to arbitrary
/// depth but must stay acyclic, which the cycle detector checks before any
/// edge is added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    /// Plain renderable media.
    Media,
    /// The source renders another scene.
    SceneRef { scene_id: String },
}

/// Resolution result for a source id.
///
/// Handles are transient lookups, not ownership: the registry alone controls
/// the content's lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHandle {
    pub source_id: String,
    pub kind: ContentKind,
}

impl ContentHandle {
    pub fn media(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            kind: ContentKind::Media,
        }
    }

    pub fn scene(source_id: impl Into<String>, scene_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            kind: ContentKind::SceneRef {
                scene_id: scene_id.into(),
            },
        }
    }

    /// Scene id this handle renders, if it is a scene-type source.
    pub fn scene_id(&self) -> Option<&str> {
        match &self.kind {
            ContentKind::SceneRef { scene_id } => Some(scene_id),
            ContentKind::Media => None,
        }
    }
}

/// The rendering backend's linear item stack.
///
/// The backend must preserve a strict linear order matching the scene's item
/// order: entry at stack index `i` corresponds to the `i`-th Item node in
/// node order.
pub trait RenderBackend {
    /// Allocate a stack entry for resolved content. New entries are inserted
    /// at the front of the stack (index 0), matching head insertion of new
    /// items into the node order.
    fn create_stack_entry(&mut self, content: &ContentHandle) -> Result<EntryId, SceneError>;

    /// Move the entry at `from` so it ends up at index `to`. Semantics are
    /// remove-then-insert: the entry is taken out first, remaining entries
    /// shift, then it is inserted at `to` (clamped to the end).
    fn move_entry(&mut self, from: usize, to: usize) -> Result<(), SceneError>;

    /// Remove an entry from the stack.
    fn remove_entry(&mut self, entry: EntryId) -> Result<(), SceneError>;
}

/// Registry of renderable content, keyed by source id.
///
/// Sources are owned by the registry; the scene graph only holds ids.
pub trait SourceRegistry {
    /// Resolve a source id to a content handle, or `None` if the source no
    /// longer exists.
    fn resolve(&self, source_id: &str) -> Option<ContentHandle>;

    /// Source ids referenced by the items of the given scene, in item order.
    /// Used by the cycle detector and nested-source queries to walk
    /// scene-in-scene composition without the core owning other scenes.
    fn scene_source_ids(&self, scene_id: &str) -> Vec<String>;
}

/// Tracks which nodes are selected. Selection state outlives no scene
/// operation; the scene graph only pushes updates into it.
pub trait SelectionService {
    fn select(&mut self, node_id: &str);
    fn deselect(&mut self, node_id: &str);
    fn is_selected(&self, node_id: &str) -> bool;
    /// Snapshot of selected node ids, in selection order.
    fn selection(&self) -> Vec<String>;
}

/// Mints node ids when the caller does not supply one (live authoring, as
/// opposed to replay-from-persistence which supplies ids to preserve
/// identity).
pub trait IdAllocator {
    fn new_unique_id(&self) -> String;
}

/// Explicit bundle of collaborator handles passed into facade operations.
pub struct SceneContext<'a> {
    pub backend: &'a mut dyn RenderBackend,
    pub registry: &'a dyn SourceRegistry,
    pub selection: &'a mut dyn SelectionService,
    pub ids: &'a dyn IdAllocator,
}
