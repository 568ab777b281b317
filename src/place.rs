//! Placement engine - reordering and reparenting moves.
//!
//! `place_after` moves a node (and, for a folder, its whole subtree as one
//! block) to immediately follow a destination in node order, while issuing
//! the render-backend moves that keep the item-only order in step. The two
//! index spaces are reconciled here and nowhere else.
//!
//! The whole move is planned against the current order first - owned id
//! lists and index pairs, no live borrows - then executed: backend moves
//! first, node-order commit last. A backend failure therefore aborts before
//! the node order changes.
//!
//! The item-space loops are direction-asymmetric on purpose. `move_entry`
//! removes then inserts, so moving a block forward keeps pulling from the
//! same source index (the block shifts left under it), while moving backward
//! advances both source and target per step (everything shifts right).
//! Getting this wrong corrupts order silently instead of erroring, which is
//! why the tests pin both directions with explicit before/after orders.

use crate::error::SceneError;
use crate::store::NodeStore;
use crate::traits::RenderBackend;

/// A fully computed move: backend calls plus the node order to commit.
struct PlacePlan {
    /// `(from, to)` pairs for `RenderBackend::move_entry`, in issue order.
    item_moves: Vec<(usize, usize)>,
    /// Complete new node-id order for `NodeStore::reorder`.
    new_order: Vec<String>,
}

fn plan_place_after(
    store: &NodeStore,
    source_id: &str,
    dest_id: Option<&str>,
) -> Result<PlacePlan, SceneError> {
    let source = store
        .view(source_id)
        .ok_or_else(|| SceneError::NodeNotFound(source_id.to_string()))?;
    let dest = match dest_id {
        Some(id) => Some(
            store
                .view(id)
                .ok_or_else(|| SceneError::NodeNotFound(id.to_string()))?,
        ),
        None => None,
    };

    // Placing a node after itself recommits the unchanged order.
    if dest_id == Some(source_id) {
        return Ok(PlacePlan {
            item_moves: Vec::new(),
            new_order: store.ids(),
        });
    }

    let mut nodes_to_move = vec![source_id.to_string()];
    nodes_to_move.extend(source.nested_node_ids());

    if let Some(d) = dest {
        if nodes_to_move.iter().any(|id| id == d.id()) {
            // Destination inside the moved subtree would tear the block.
            return Err(SceneError::InvalidParent {
                node: source_id.to_string(),
                parent: d.id().to_string(),
            });
        }
    }

    let items_to_move: Vec<String> = if source.is_folder() {
        source
            .nested_items()
            .iter()
            .map(|n| n.id().to_string())
            .collect()
    } else {
        vec![source_id.to_string()]
    };

    // Item index of the block's first item, before any change.
    let first_item_index = items_to_move
        .first()
        .and_then(|id| store.view(id))
        .and_then(|v| v.item_index());

    let source_index = source.node_index();
    let forward = dest.map(|d| d.node_index() > source_index).unwrap_or(false);

    let new_item_index = match dest {
        None => 0,
        Some(d) => {
            let prev_item = d.prev_item();
            if d.is_folder() && prev_item.is_none() {
                // Folder at the very front of the render stack.
                0
            } else {
                // Folders are measured by the nearest preceding item; items
                // by their own position.
                let dest_item_index = if d.is_folder() {
                    prev_item.and_then(|p| p.item_index()).unwrap_or(0)
                } else {
                    d.item_index().unwrap_or(0)
                };
                if forward {
                    if d.is_folder() {
                        // Skip past the destination folder's own contents.
                        dest_item_index + d.nested_items().len()
                    } else {
                        dest_item_index
                    }
                } else {
                    dest_item_index + 1
                }
            }
        }
    };

    let mut item_moves = Vec::new();
    if let Some(first) = first_item_index {
        if new_item_index > first {
            // Forward: the source index stays fixed, each move shifts the
            // rest of the block left into it.
            for _ in &items_to_move {
                item_moves.push((first, new_item_index));
            }
        } else if new_item_index < first {
            // Backward: indices shift right, so both ends advance per step.
            for offset in 0..items_to_move.len() {
                item_moves.push((first + offset, new_item_index + offset));
            }
        }
    }

    let block_len = nodes_to_move.len();
    let new_node_index = match dest {
        None => 0,
        Some(d) => {
            let dest_index = d.node_index();
            if dest_index > source_index {
                let after_dest = if d.is_folder() {
                    dest_index + d.nested_nodes().len() + 1
                } else {
                    dest_index + 1
                };
                after_dest.saturating_sub(block_len)
            } else {
                dest_index + 1
            }
        }
    };

    let mut new_order: Vec<String> = store
        .ids()
        .into_iter()
        .filter(|id| !nodes_to_move.contains(id))
        .collect();
    let at = new_node_index.min(new_order.len());
    new_order.splice(at..at, nodes_to_move);

    log::trace!(
        "place_after: {source_id} after {dest_id:?}: item moves {item_moves:?}, node index {at}"
    );

    Ok(PlacePlan {
        item_moves,
        new_order,
    })
}

/// Moves `source_id` (with its subtree, if a folder) to immediately follow
/// `dest_id` in node order; `None` means the very front. Backend stack moves
/// are issued before the node order is committed.
pub fn place_after(
    store: &mut NodeStore,
    backend: &mut dyn RenderBackend,
    source_id: &str,
    dest_id: Option<&str>,
) -> Result<(), SceneError> {
    let plan = plan_place_after(store, source_id, dest_id)?;
    for (from, to) in &plan.item_moves {
        backend.move_entry(*from, *to)?;
    }
    store.reorder(&plan.new_order)
}

/// Moves `source_id` to immediately precede `dest_id`: place after the
/// destination's predecessor, or at the front when it has none.
pub fn place_before(
    store: &mut NodeStore,
    backend: &mut dyn RenderBackend,
    source_id: &str,
    dest_id: &str,
) -> Result<(), SceneError> {
    let prev = store
        .view(dest_id)
        .ok_or_else(|| SceneError::NodeNotFound(dest_id.to_string()))?
        .prev_node()
        .map(|n| n.id().to_string());
    place_after(store, backend, source_id, prev.as_deref())
}
