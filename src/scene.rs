//! Scene - the facade over store, placement, and cycle checking.
//!
//! A `Scene` owns one `NodeStore` and composes the lower layers into the
//! public mutation surface. External collaborators (render backend, source
//! registry, selection, id allocation) are passed in per call via
//! [`SceneContext`]; the scene holds only ids toward them, never ownership.
//!
//! Every mutation keeps the two invariants the rest of the system leans on:
//! a folder's subtree stays contiguous right after it in node order, and the
//! item-only order stays equal to the render backend's stack. Backend calls
//! happen before store commits, so a backend failure aborts with the store
//! untouched.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::cycle;
use crate::error::SceneError;
use crate::events::{SceneEvent, SceneEventSender};
use crate::node::{Folder, Item, Node, Transform};
use crate::place;
use crate::store::NodeStore;
use crate::traits::{SceneContext, SourceRegistry};

/// Options for [`Scene::add_source`].
///
/// `id` is supplied during replay from persistence to preserve node identity;
/// live authoring leaves it `None` and lets the allocator mint one.
#[derive(Clone, Debug)]
pub struct AddSourceOptions {
    pub id: Option<String>,
    pub select: bool,
}

impl Default for AddSourceOptions {
    fn default() -> Self {
        Self {
            id: None,
            select: true,
        }
    }
}

/// One scene: a named, ordered node graph bound to a render stack.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub name: String,
    store: NodeStore,
    #[serde(skip)]
    events: SceneEventSender,
}

impl Scene {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            store: NodeStore::new(),
            events: SceneEventSender::dummy(),
        }
    }

    /// Connects this scene to an event channel. Scenes start with a dummy
    /// sender (and deserialize to one), so this is opt-in wiring.
    pub fn set_event_sender(&mut self, events: SceneEventSender) {
        self.events = events;
    }

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    // --- mutations -------------------------------------------------------

    /// Adds an item for `source_id` at the front of the scene.
    ///
    /// Validation order matters: id collision and composition cycles are
    /// rejected before the backend entry is created, so a failed add leaves
    /// neither store nor stack touched.
    pub fn add_source(
        &mut self,
        ctx: &mut SceneContext,
        source_id: &str,
        opts: AddSourceOptions,
    ) -> Result<String, SceneError> {
        let id = match opts.id {
            Some(id) => {
                if self.store.contains(&id) {
                    return Err(SceneError::DuplicateId(id));
                }
                id
            }
            None => ctx.ids.new_unique_id(),
        };
        cycle::can_add_source(ctx.registry, &self.id, source_id)?;
        let handle = ctx
            .registry
            .resolve(source_id)
            .ok_or_else(|| SceneError::SourceNotFound(source_id.to_string()))?;

        let mut item = Item::new(id.clone(), source_id);
        item.entry_id = ctx.backend.create_stack_entry(&handle)?;
        self.store.insert_at_head(Node::Item(item))?;
        if opts.select {
            ctx.selection.select(&id);
        }
        log::debug!("scene {}: added item {id} for source {source_id}", self.id);
        self.events.emit(SceneEvent::NodeAdded {
            scene_id: self.id.clone(),
            node_id: id.clone(),
        });
        Ok(id)
    }

    /// Adds an empty folder at the front of the scene.
    pub fn add_folder(
        &mut self,
        ctx: &mut SceneContext,
        id: Option<String>,
    ) -> Result<String, SceneError> {
        let id = id.unwrap_or_else(|| ctx.ids.new_unique_id());
        self.store.insert_at_head(Node::Folder(Folder::new(id.clone())))?;
        log::debug!("scene {}: added folder {id}", self.id);
        self.events.emit(SceneEvent::NodeAdded {
            scene_id: self.id.clone(),
            node_id: id.clone(),
        });
        Ok(id)
    }

    /// Removes a node and returns it. Items release their backend entry and
    /// are dropped from the selection first. Removing a folder does not
    /// cascade: its children stay in the scene, keeping their positions.
    pub fn remove_node(
        &mut self,
        ctx: &mut SceneContext,
        node_id: &str,
    ) -> Result<Node, SceneError> {
        let entry = self
            .store
            .get(node_id)
            .ok_or_else(|| SceneError::NodeNotFound(node_id.to_string()))?
            .as_item()
            .map(|item| item.entry_id);
        if let Some(entry) = entry {
            ctx.backend.remove_entry(entry)?;
        }
        ctx.selection.deselect(node_id);
        let node = self
            .store
            .remove(node_id)
            .ok_or_else(|| SceneError::NodeNotFound(node_id.to_string()))?;
        log::debug!("scene {}: removed node {node_id}", self.id);
        self.events.emit(SceneEvent::NodeRemoved {
            scene_id: self.id.clone(),
            node_id: node_id.to_string(),
        });
        Ok(node)
    }

    /// Bulk-restores nodes captured by [`Scene::snapshot`], in their original
    /// order. Used by persistence replay.
    ///
    /// Unlike the single-node operations this tolerates partial failure:
    /// items whose source no longer resolves, and nodes whose id is already
    /// taken, are skipped with a warning while the rest of the batch is
    /// restored. Backend failures still abort. Returns the restored ids in
    /// input order.
    pub fn restore(
        &mut self,
        ctx: &mut SceneContext,
        nodes: Vec<Node>,
    ) -> Result<Vec<String>, SceneError> {
        let mut restored = Vec::new();
        // Head insertion reverses, so walk the batch back to front; the
        // backend's front insertion lines the stack up the same way.
        for mut node in nodes.into_iter().rev() {
            if self.store.contains(node.id()) {
                log::warn!("restore: skipping {}, id already in scene", node.id());
                continue;
            }
            if let Node::Item(item) = &mut node {
                let Some(handle) = ctx.registry.resolve(&item.source_id) else {
                    log::warn!(
                        "restore: skipping {}, source {} does not resolve",
                        item.id,
                        item.source_id
                    );
                    continue;
                };
                item.entry_id = ctx.backend.create_stack_entry(&handle)?;
            }
            let id = node.id().to_string();
            self.store.insert_at_head(node)?;
            restored.push(id);
        }
        restored.reverse();
        log::debug!("scene {}: restored {} nodes", self.id, restored.len());
        self.events.emit(SceneEvent::OrderChanged {
            scene_id: self.id.clone(),
        });
        Ok(restored)
    }

    /// Moves a node (folders move with their subtree) to immediately follow
    /// `dest_id` in node order; `None` means the front.
    pub fn place_after(
        &mut self,
        ctx: &mut SceneContext,
        source_id: &str,
        dest_id: Option<&str>,
    ) -> Result<(), SceneError> {
        place::place_after(&mut self.store, ctx.backend, source_id, dest_id)?;
        self.events.emit(SceneEvent::OrderChanged {
            scene_id: self.id.clone(),
        });
        Ok(())
    }

    /// Moves a node to immediately precede `dest_id`.
    pub fn place_before(
        &mut self,
        ctx: &mut SceneContext,
        source_id: &str,
        dest_id: &str,
    ) -> Result<(), SceneError> {
        place::place_before(&mut self.store, ctx.backend, source_id, dest_id)?;
        self.events.emit(SceneEvent::OrderChanged {
            scene_id: self.id.clone(),
        });
        Ok(())
    }

    /// Moves a node into a folder, or to the top level with `None`.
    ///
    /// The node is physically placed into the folder's run first: a node
    /// ahead of the folder in node order joins as its last child, a node
    /// behind it as the first. Detaching places it before its current
    /// topmost ancestor. The old parent link still holds through the
    /// placement and is rewritten after, so placement and link can never
    /// disagree in an observable state.
    pub fn set_parent(
        &mut self,
        ctx: &mut SceneContext,
        node_id: &str,
        parent: Option<&str>,
    ) -> Result<(), SceneError> {
        let node = self
            .store
            .view(node_id)
            .ok_or_else(|| SceneError::NodeNotFound(node_id.to_string()))?;
        match parent {
            Some(folder_id) => {
                let folder = self
                    .store
                    .get(folder_id)
                    .ok_or_else(|| SceneError::NodeNotFound(folder_id.to_string()))?;
                if !folder.is_folder()
                    || folder_id == node_id
                    || node.nested_node_ids().iter().any(|id| id == folder_id)
                {
                    // An item, the node itself, or one of its own descendants
                    // cannot become its parent.
                    return Err(SceneError::InvalidParent {
                        node: node_id.to_string(),
                        parent: folder_id.to_string(),
                    });
                }
                place::place_after(&mut self.store, ctx.backend, node_id, Some(folder_id))?;
                if let Some(node) = self.store.get_mut(node_id) {
                    node.set_parent_id(folder_id);
                }
                self.store.sync_children();
            }
            None => {
                if node.node().parent_id().is_empty() {
                    return Ok(());
                }
                let mut top = node;
                while let Some(parent) = top.parent() {
                    top = parent;
                }
                let top_id = top.id().to_string();
                place::place_before(&mut self.store, ctx.backend, node_id, &top_id)?;
                if let Some(node) = self.store.get_mut(node_id) {
                    node.set_parent_id("");
                }
                self.store.sync_children();
            }
        }
        self.events.emit(SceneEvent::NodeUpdated {
            scene_id: self.id.clone(),
            node_id: node_id.to_string(),
        });
        Ok(())
    }

    /// Locks or unlocks every item in the scene.
    pub fn set_lock_on_all_items(&mut self, locked: bool) {
        let mut changed = Vec::new();
        for node in self.store.nodes_mut() {
            if let Some(item) = node.as_item_mut() {
                if item.locked != locked {
                    item.locked = locked;
                    changed.push(item.id.clone());
                }
            }
        }
        for node_id in changed {
            self.events.emit(SceneEvent::NodeUpdated {
                scene_id: self.id.clone(),
                node_id,
            });
        }
    }

    pub fn set_visibility(&mut self, node_id: &str, visible: bool) -> Result<(), SceneError> {
        self.item_mut(node_id)?.visible = visible;
        self.emit_updated(node_id);
        Ok(())
    }

    pub fn set_locked(&mut self, node_id: &str, locked: bool) -> Result<(), SceneError> {
        self.item_mut(node_id)?.locked = locked;
        self.emit_updated(node_id);
        Ok(())
    }

    pub fn set_transform(
        &mut self,
        node_id: &str,
        transform: Transform,
    ) -> Result<(), SceneError> {
        self.item_mut(node_id)?.transform = transform;
        self.emit_updated(node_id);
        Ok(())
    }

    // Item properties live on items only; a folder id is as absent as an
    // unknown one here.
    fn item_mut(&mut self, node_id: &str) -> Result<&mut Item, SceneError> {
        self.store
            .get_mut(node_id)
            .and_then(Node::as_item_mut)
            .ok_or_else(|| SceneError::NodeNotFound(node_id.to_string()))
    }

    fn emit_updated(&self, node_id: &str) {
        self.events.emit(SceneEvent::NodeUpdated {
            scene_id: self.id.clone(),
            node_id: node_id.to_string(),
        });
    }

    // --- queries ---------------------------------------------------------

    /// Items in item order (front first).
    pub fn items(&self) -> Vec<&Item> {
        self.store.nodes().iter().filter_map(Node::as_item).collect()
    }

    /// Folders in node order.
    pub fn folders(&self) -> Vec<&Folder> {
        self.store
            .nodes()
            .iter()
            .filter_map(Node::as_folder)
            .collect()
    }

    /// Node ids in node order.
    pub fn node_ids(&self) -> Vec<String> {
        self.store.ids()
    }

    /// Full copy of the node list, suitable for [`Scene::restore`].
    pub fn snapshot(&self) -> Vec<Node> {
        self.store.nodes().to_vec()
    }

    /// Whether `source_id` may be added without creating a composition cycle.
    pub fn can_add_source(
        &self,
        registry: &dyn SourceRegistry,
        source_id: &str,
    ) -> Result<(), SceneError> {
        cycle::can_add_source(registry, &self.id, source_id)
    }

    /// Every source id this scene renders, directly or through nested
    /// scenes, deduplicated, in first-encounter order.
    pub fn nested_source_ids(&self, registry: &dyn SourceRegistry) -> Vec<String> {
        let mut out = IndexSet::new();
        let mut visited = HashSet::from([self.id.clone()]);
        for item in self.items() {
            collect_sources(registry, &item.source_id, &mut out, &mut visited);
        }
        out.into_iter().collect()
    }

    /// Ids of scenes nested below this one, deduplicated.
    pub fn nested_scene_ids(&self, registry: &dyn SourceRegistry) -> Vec<String> {
        let mut visited = HashSet::from([self.id.clone()]);
        self.nested_source_ids(registry)
            .into_iter()
            .filter_map(|source_id| {
                let scene_id = registry.resolve(&source_id)?.scene_id()?.to_string();
                visited.insert(scene_id.clone()).then_some(scene_id)
            })
            .collect()
    }

    // --- persistence -----------------------------------------------------

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

fn collect_sources(
    registry: &dyn SourceRegistry,
    source_id: &str,
    out: &mut IndexSet<String>,
    visited: &mut HashSet<String>,
) {
    // A nested scene may list ids whose content is gone; those are skipped,
    // same as restore skips them.
    let Some(handle) = registry.resolve(source_id) else {
        log::warn!("nested-source walk: skipping {source_id}, does not resolve");
        return;
    };
    if !out.insert(source_id.to_string()) {
        return;
    }
    let Some(scene_id) = handle.scene_id() else {
        return;
    };
    if !visited.insert(scene_id.to_string()) {
        return;
    }
    for nested in registry.scene_source_ids(scene_id) {
        collect_sources(registry, &nested, out, visited);
    }
}
