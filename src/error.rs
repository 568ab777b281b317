//! Error taxonomy for scene graph operations.
//!
//! Every fallible operation returns `Result<_, SceneError>`. Operations abort
//! with no mutation when they fail: a caller that sees an error can assume the
//! node order and the render stack are exactly as they were before the call
//! (the only sanctioned exception is a backend failure mid-move, which leaves
//! the stack partially moved but never commits the node order).

use thiserror::Error;

/// Errors surfaced by scene graph operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SceneError {
    /// Operation referenced a node id absent from the store.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Add-item referenced a source the registry could not resolve.
    #[error("source not found: {0}")]
    SourceNotFound(String),

    /// Adding the source would create a scene-containment cycle
    /// (the referenced scene transitively contains the target scene).
    #[error("cyclic composition rejected: source {0} would nest a scene inside itself")]
    CyclicComposition(String),

    /// A node id collided with an id already present in the scene.
    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    /// `NodeStore::reorder` was given a sequence that is not a permutation of
    /// the current ids. Indicates an index arithmetic bug in the caller; the
    /// store keeps its prior order.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// A reparent or placement would make a node an ancestor of itself.
    #[error("invalid parent: cannot place {node} under {parent}")]
    InvalidParent { node: String, parent: String },

    /// The render backend rejected a stack call. Propagated as-is; the
    /// corresponding node-order change is never committed.
    #[error("render backend error: {0}")]
    Backend(String),
}
