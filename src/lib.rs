//! SCENESTACK - Scene graph core for a 2D compositing engine
//!
//! An ordered node graph (items and folders) kept in lockstep with an
//! external render backend's linear stack. Re-exports the full public
//! surface for host applications.

// Core graph (storage, views, placement, cycle checking)
pub mod cycle;
pub mod node;
pub mod place;
pub mod store;
pub mod view;

// Surface modules
pub mod error;
pub mod events;
pub mod memory;
pub mod scene;
pub mod traits;

// Re-export commonly used types
pub use error::SceneError;
pub use events::{SceneEvent, SceneEventSender};
pub use node::{Crop, Folder, Item, Node, Transform};
pub use scene::{AddSourceOptions, Scene};
pub use store::NodeStore;
pub use traits::{
    ContentHandle, ContentKind, EntryId, IdAllocator, RenderBackend, SceneContext,
    SelectionService, SourceRegistry,
};
pub use view::NodeRef;
