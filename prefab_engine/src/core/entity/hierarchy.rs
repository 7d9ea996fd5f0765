//! Hierarchy traversal helpers built on the Parent/Children components

use super::components::{Parent, Transform};
use super::world::World;
use hecs::Entity;
use tracing::error;

/// Collect an entity and all of its descendants in depth-first pre-order
///
/// The root comes first, then each child subtree in `Children` order. This is
/// the order prefab trees are serialized and rebuilt in.
pub fn collect_subtree(world: &World, root: Entity) -> Vec<Entity> {
    let mut entities = Vec::new();
    collect_into(world, root, &mut entities);
    entities
}

fn collect_into(world: &World, entity: Entity, out: &mut Vec<Entity>) {
    if !world.contains(entity) {
        return;
    }
    out.push(entity);
    for child in world.children(entity) {
        collect_into(world, child, out);
    }
}

/// Check that every parented entity carries a Transform
///
/// Parent links only make sense for spatial entities; an entity with a
/// `Parent` but no `Transform` cannot inherit its parent's placement. Returns
/// the number of offending entities, logging each one.
pub fn validate_hierarchy(world: &World) -> usize {
    let mut invalid = 0;
    for (entity, _parent) in world.query::<&Parent>().without::<&Transform>().iter() {
        error!(entity = ?entity, "Entity has a Parent but no Transform");
        invalid += 1;
    }
    invalid
}
