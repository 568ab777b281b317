//! Event system for scene graph changes.
//!
//! Events are emitted after a mutation commits and are consumed by the host
//! application to trigger side effects (UI refresh, persistence, preview
//! invalidation). The core never blocks on a receiver.

use crossbeam_channel::Sender;

/// Events describing committed scene mutations
#[derive(Debug, Clone)]
pub enum SceneEvent {
    /// A node was added to the scene
    NodeAdded { scene_id: String, node_id: String },

    /// A node was removed from the scene
    NodeRemoved { scene_id: String, node_id: String },

    /// Node order changed (placement or explicit reorder)
    OrderChanged { scene_id: String },

    /// A node's properties changed (visibility, lock, transform, parent)
    NodeUpdated { scene_id: String, node_id: String },
}

/// Event sender wrapper for scenes
///
/// Scenes hold this sender to emit events when their state changes.
#[derive(Clone, Debug)]
pub struct SceneEventSender {
    sender: Option<Sender<SceneEvent>>,
}

impl SceneEventSender {
    /// Create event sender (connected to channel)
    pub fn new(sender: Sender<SceneEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Create dummy sender (for tests or when events not needed)
    pub fn dummy() -> Self {
        Self { sender: None }
    }

    /// Emit event (silent if no receiver)
    pub fn emit(&self, event: SceneEvent) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(event); // Ignore send errors (receiver might be dropped)
        }
    }
}

impl Default for SceneEventSender {
    fn default() -> Self {
        Self::dummy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn connected_sender_delivers_events() {
        let (tx, rx) = unbounded();
        let sender = SceneEventSender::new(tx);
        sender.emit(SceneEvent::OrderChanged {
            scene_id: "s".into(),
        });
        assert!(matches!(
            rx.try_recv(),
            Ok(SceneEvent::OrderChanged { .. })
        ));
    }

    #[test]
    fn dummy_sender_is_silent() {
        let sender = SceneEventSender::dummy();
        sender.emit(SceneEvent::NodeAdded {
            scene_id: "s".into(),
            node_id: "n".into(),
        });
    }

    #[test]
    fn emit_survives_dropped_receiver() {
        let (tx, rx) = unbounded();
        let sender = SceneEventSender::new(tx);
        drop(rx);
        sender.emit(SceneEvent::NodeRemoved {
            scene_id: "s".into(),
            node_id: "n".into(),
        });
    }
}
