//! Cycle detection for scene-in-scene composition.
//!
//! A scene may be used as a source inside another scene, to arbitrary depth,
//! but the composition graph must stay acyclic: a cycle would make render
//! order undefined. The check runs before a scene-type source is added, over
//! the registry's view of which sources each scene references.

use std::collections::HashSet;

use crate::error::SceneError;
use crate::traits::SourceRegistry;

/// Whether `scene_id` reaches `candidate` through nested scene sources,
/// directly or transitively.
pub fn has_nested_scene(
    registry: &dyn SourceRegistry,
    scene_id: &str,
    candidate: &str,
) -> bool {
    let mut visited = HashSet::new();
    reaches(registry, scene_id, candidate, &mut visited)
}

fn reaches(
    registry: &dyn SourceRegistry,
    scene_id: &str,
    candidate: &str,
    visited: &mut HashSet<String>,
) -> bool {
    // Guard against walking a cycle that already exists in the registry.
    if !visited.insert(scene_id.to_string()) {
        return false;
    }
    for source_id in registry.scene_source_ids(scene_id) {
        let Some(handle) = registry.resolve(&source_id) else {
            continue;
        };
        let Some(nested) = handle.scene_id() else {
            continue;
        };
        if nested == candidate || reaches(registry, nested, candidate, visited) {
            return true;
        }
    }
    false
}

/// Checks whether `source_id` may be added to `scene_id` without creating a
/// composition cycle. Media sources always pass; a scene-type source is
/// rejected when it is the scene itself or reaches back to it.
pub fn can_add_source(
    registry: &dyn SourceRegistry,
    scene_id: &str,
    source_id: &str,
) -> Result<(), SceneError> {
    let handle = registry
        .resolve(source_id)
        .ok_or_else(|| SceneError::SourceNotFound(source_id.to_string()))?;
    let Some(nested) = handle.scene_id() else {
        return Ok(());
    };
    if nested == scene_id || has_nested_scene(registry, nested, scene_id) {
        log::warn!("rejected source {source_id}: scene {nested} would cycle back to {scene_id}");
        return Err(SceneError::CyclicComposition(source_id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRegistry;

    #[test]
    fn media_sources_always_pass() {
        let mut registry = MemoryRegistry::new();
        registry.register_media("clip");
        assert!(can_add_source(&registry, "scene_a", "clip").is_ok());
    }

    #[test]
    fn unknown_source_fails() {
        let registry = MemoryRegistry::new();
        assert_eq!(
            can_add_source(&registry, "scene_a", "ghost"),
            Err(SceneError::SourceNotFound("ghost".into()))
        );
    }

    #[test]
    fn direct_self_reference_rejected() {
        let mut registry = MemoryRegistry::new();
        registry.register_scene("src_a", "scene_a");
        assert_eq!(
            can_add_source(&registry, "scene_a", "src_a"),
            Err(SceneError::CyclicComposition("src_a".into()))
        );
    }

    #[test]
    fn transitive_cycle_rejected() {
        // a -> b -> c, adding c's source to a is fine, but adding a's source
        // to c would close the loop.
        let mut registry = MemoryRegistry::new();
        registry.register_scene("src_a", "scene_a");
        registry.register_scene("src_b", "scene_b");
        registry.register_scene("src_c", "scene_c");
        registry.set_scene_sources("scene_a", vec!["src_b".into()]);
        registry.set_scene_sources("scene_b", vec!["src_c".into()]);

        assert!(has_nested_scene(&registry, "scene_a", "scene_c"));
        assert!(!has_nested_scene(&registry, "scene_c", "scene_a"));
        assert!(can_add_source(&registry, "scene_a", "src_c").is_ok());
        assert_eq!(
            can_add_source(&registry, "scene_c", "src_a"),
            Err(SceneError::CyclicComposition("src_a".into()))
        );
    }

    #[test]
    fn diamond_composition_is_not_a_cycle() {
        // a nests b and c, both nest d. Sharing d is fine.
        let mut registry = MemoryRegistry::new();
        registry.register_scene("src_b", "scene_b");
        registry.register_scene("src_c", "scene_c");
        registry.register_scene("src_d", "scene_d");
        registry.set_scene_sources("scene_a", vec!["src_b".into(), "src_c".into()]);
        registry.set_scene_sources("scene_b", vec!["src_d".into()]);
        registry.set_scene_sources("scene_c", vec!["src_d".into()]);

        assert!(can_add_source(&registry, "scene_a", "src_d").is_ok());
    }

    #[test]
    fn preexisting_cycle_does_not_hang_the_walk() {
        let mut registry = MemoryRegistry::new();
        registry.register_scene("src_a", "scene_a");
        registry.register_scene("src_b", "scene_b");
        registry.set_scene_sources("scene_a", vec!["src_b".into()]);
        registry.set_scene_sources("scene_b", vec!["src_a".into()]);

        assert!(has_nested_scene(&registry, "scene_a", "scene_b"));
        assert!(!has_nested_scene(&registry, "scene_a", "scene_x"));
    }
}
