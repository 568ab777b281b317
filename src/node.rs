//! Node types - the entries of a scene's node order.
//!
//! A scene is an ordered sequence of nodes. Each node is either an `Item`
//! (renderable, backed by a source and a render-stack entry) or a `Folder`
//! (organizational container). The sequence itself is the single source of
//! truth: tree structure is carried by `parent_id` / `children_ids`, and the
//! pre-order flattening rule says a folder's entire subtree occupies a
//! contiguous run immediately after it.
//!
//! Ids are plain strings: uuid-v4 when minted live, caller-supplied during
//! replay from persistence so identity survives a round trip.

use serde::{Deserialize, Serialize};

use crate::traits::EntryId;

/// Crop margins applied to an item, in pixels from each edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

/// 2D placement of an item inside the scene canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in canvas space.
    pub position: [f32; 2],
    /// Per-axis scale factor.
    pub scale: [f32; 2],
    /// Rotation in degrees, clockwise.
    pub rotation: f32,
    /// Crop margins applied before scale/rotation.
    pub crop: Crop,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0],
            scale: [1.0, 1.0],
            rotation: 0.0,
            crop: Crop::default(),
        }
    }
}

/// Renderable leaf node.
///
/// `source_id` is a weak reference: the source registry owns the content and
/// its lifetime, the item only names it. `entry_id` is the render backend's
/// handle for this item in its linear stack; it is runtime-only and gets
/// re-allocated on restore.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    /// Id of the enclosing folder, empty for a root node.
    #[serde(default)]
    pub parent_id: String,
    /// Reference to externally-owned renderable content.
    pub source_id: String,
    /// Render backend stack-entry handle (runtime-only).
    #[serde(skip)]
    pub entry_id: EntryId,
    pub transform: Transform,
    pub visible: bool,
    pub locked: bool,
}

impl Item {
    /// Create an item referencing `source_id`, at identity transform,
    /// visible and unlocked, not yet attached to the render stack.
    pub fn new(id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: String::new(),
            source_id: source_id.into(),
            entry_id: 0,
            transform: Transform::default(),
            visible: true,
            locked: false,
        }
    }
}

/// Organizational container node.
///
/// `children_ids` lists direct children in display order. It is kept in sync
/// with the node order after every structural mutation and never trusted
/// across one - the flattened node sequence is authoritative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Folder {
    pub id: String,
    /// Id of the enclosing folder, empty for a root node.
    #[serde(default)]
    pub parent_id: String,
    /// Direct children in display order.
    #[serde(default)]
    pub children_ids: Vec<String>,
}

impl Folder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: String::new(),
            children_ids: Vec::new(),
        }
    }
}

/// A scene graph node: renderable item or organizational folder.
///
/// Every site that branches on node kind matches exhaustively; there is no
/// discriminant field to check and no cast to get wrong.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Node {
    Item(Item),
    Folder(Folder),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Self::Item(item) => &item.id,
            Self::Folder(folder) => &folder.id,
        }
    }

    pub fn parent_id(&self) -> &str {
        match self {
            Self::Item(item) => &item.parent_id,
            Self::Folder(folder) => &folder.parent_id,
        }
    }

    pub fn set_parent_id(&mut self, parent_id: impl Into<String>) {
        match self {
            Self::Item(item) => item.parent_id = parent_id.into(),
            Self::Folder(folder) => folder.parent_id = parent_id.into(),
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Self::Item(_))
    }

    pub fn as_item(&self) -> Option<&Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Folder(_) => None,
        }
    }

    pub fn as_item_mut(&mut self) -> Option<&mut Item> {
        match self {
            Self::Item(item) => Some(item),
            Self::Folder(_) => None,
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Self::Folder(folder) => Some(folder),
            Self::Item(_) => None,
        }
    }

    pub fn as_folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Self::Folder(folder) => Some(folder),
            Self::Item(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transform_is_identity() {
        let t = Transform::default();
        assert_eq!(t.position, [0.0, 0.0]);
        assert_eq!(t.scale, [1.0, 1.0]);
        assert_eq!(t.rotation, 0.0);
        assert_eq!(t.crop, Crop::default());
    }

    #[test]
    fn new_item_defaults() {
        let item = Item::new("a", "src");
        assert!(item.visible);
        assert!(!item.locked);
        assert_eq!(item.parent_id, "");
        assert_eq!(item.entry_id, 0);
    }

    #[test]
    fn node_kind_accessors() {
        let item = Node::Item(Item::new("a", "src"));
        let folder = Node::Folder(Folder::new("f"));
        assert!(item.is_item() && !item.is_folder());
        assert!(folder.is_folder() && !folder.is_item());
        assert!(item.as_item().is_some());
        assert!(item.as_folder().is_none());
        assert!(folder.as_folder().is_some());
    }

    #[test]
    fn entry_id_not_serialized() {
        let mut item = Item::new("a", "src");
        item.entry_id = 42;
        let json = serde_json::to_string(&item).unwrap();
        let back: Item = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entry_id, 0);
        assert_eq!(back.id, "a");
        assert_eq!(back.source_id, "src");
    }
}
