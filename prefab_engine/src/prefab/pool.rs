//! Per-prefab object pool of pre-built, deactivated instances

use crate::core::entity::{collect_subtree, Entity, MeshRenderer, RigidBody, Transform, World};
use crate::io::ComponentRegistry;
use crate::prefab::applier::{destroy_instance, instantiate, InstantiateOptions};
use crate::prefab::definition::PrefabDefinition;
use glam::Vec3;
use std::collections::HashSet;
use tracing::{debug, error, warn};

/// Snapshot of a pool's occupancy
///
/// `total` can exceed `capacity`: the capacity bounds only the parked
/// `available` stack, never the number of simultaneously active instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub available: usize,
    pub active: usize,
    pub total: usize,
    pub capacity: usize,
}

/// Reuse cache for one prefab id
///
/// Holds two disjoint sets of entities: `available` (a stack, so the most
/// recently released instance is reused first) and `active` (currently
/// handed out). Parked instances stay spawned but deactivated, with
/// rendering and physics flags switched off.
pub struct PrefabPool {
    prefab_id: String,
    capacity: usize,
    available: Vec<Entity>,
    active: HashSet<Entity>,
}

impl PrefabPool {
    /// Create an empty pool for the given prefab id
    pub fn new(prefab_id: impl Into<String>, capacity: usize) -> Self {
        Self {
            prefab_id: prefab_id.into(),
            capacity,
            available: Vec::new(),
            active: HashSet::new(),
        }
    }

    /// The prefab id this pool serves
    pub fn prefab_id(&self) -> &str {
        &self.prefab_id
    }

    /// Maximum number of parked instances
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the parked-instance bound; takes effect on future releases
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    /// Check whether this pool handed out the given entity
    pub fn is_active(&self, entity: Entity) -> bool {
        self.active.contains(&entity)
    }

    /// Pre-build `count` deactivated instances into the available stack
    ///
    /// A failed instantiation is logged and skipped; warming continues for
    /// the remaining count.
    pub fn warm(
        &mut self,
        world: &mut World,
        components: &ComponentRegistry,
        definition: &PrefabDefinition,
        count: usize,
    ) {
        for _ in 0..count {
            match instantiate(world, components, definition, &InstantiateOptions::new()) {
                Ok(entity) => {
                    set_instance_active(world, entity, false);
                    self.available.push(entity);
                }
                Err(e) => {
                    error!(prefab_id = %self.prefab_id, error = %e, "Skipping failed warm instantiation");
                }
            }
        }
        debug!(
            prefab_id = %self.prefab_id,
            available = self.available.len(),
            "Warmed prefab pool"
        );
    }

    /// Hand out an instance, reusing a parked one when possible
    ///
    /// Reuse applies only the transform-shaped options onto the existing
    /// instance; a structural override patch is ignored with a log line,
    /// unlike the fresh-instantiation path which honors the full contract.
    /// With the stack empty, falls through to a full instantiation, which
    /// needs a resolvable definition. Returns `None` when no instance could
    /// be produced.
    pub fn acquire(
        &mut self,
        world: &mut World,
        components: &ComponentRegistry,
        definition: Option<&PrefabDefinition>,
        options: &InstantiateOptions,
    ) -> Option<Entity> {
        if let Some(entity) = self.available.pop() {
            if options.overrides.is_some() {
                debug!(entity = ?entity, "Ignoring structural overrides on pooled reuse");
            }
            apply_reuse_transform(world, entity, options);
            if let Some(parent) = options.parent {
                world.set_parent(entity, Some(parent));
            }
            set_instance_active(world, entity, true);
            self.active.insert(entity);
            return Some(entity);
        }

        let definition = match definition {
            Some(definition) => definition,
            None => {
                warn!(prefab_id = %self.prefab_id, "Cannot grow pool without a resolvable definition");
                return None;
            }
        };
        match instantiate(world, components, definition, options) {
            Ok(entity) => {
                self.active.insert(entity);
                Some(entity)
            }
            Err(e) => {
                error!(prefab_id = %self.prefab_id, error = %e, "Failed to instantiate for pool");
                None
            }
        }
    }

    /// Take an instance back, parking it for reuse or destroying on overflow
    ///
    /// Parked instances are reset to a canonical state: default Transform,
    /// zeroed velocities, detached from any parent, and deactivated.
    pub fn release(&mut self, world: &mut World, entity: Entity) {
        if !self.active.remove(&entity) {
            warn!(entity = ?entity, prefab_id = %self.prefab_id, "Ignoring release of an entity this pool does not track");
            return;
        }

        if self.available.len() < self.capacity {
            reset_instance(world, entity);
            set_instance_active(world, entity, false);
            self.available.push(entity);
        } else if let Err(e) = destroy_instance(world, entity) {
            error!(entity = ?entity, error = %e, "Failed to destroy instance released beyond capacity");
        }
    }

    /// Destroy every pooled entity, parked and active alike
    pub fn clear(&mut self, world: &mut World) {
        for entity in self.available.drain(..).chain(self.active.drain()) {
            if let Err(e) = destroy_instance(world, entity) {
                error!(entity = ?entity, error = %e, "Failed to destroy pooled entity");
            }
        }
        debug!(prefab_id = %self.prefab_id, "Cleared prefab pool");
    }

    /// Current occupancy numbers
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available.len(),
            active: self.active.len(),
            total: self.available.len() + self.active.len(),
            capacity: self.capacity,
        }
    }
}

/// Flip the activation flags on an instance subtree
///
/// Best-effort on known component types: rendering visibility and physics
/// participation. Entities lacking those components are left alone.
fn set_instance_active(world: &mut World, entity: Entity, active: bool) {
    for entity in collect_subtree(world, entity) {
        if let Ok(renderer) = world.query_one_mut::<&mut MeshRenderer>(entity) {
            renderer.visible = active;
        }
        if let Ok(body) = world.query_one_mut::<&mut RigidBody>(entity) {
            body.enabled = active;
        }
    }
}

/// Direct transform application for pooled reuse; no delta math
fn apply_reuse_transform(world: &mut World, entity: Entity, options: &InstantiateOptions) {
    if options.position.is_none() && options.rotation.is_none() && options.scale.is_none() {
        return;
    }
    if let Ok(transform) = world.query_one_mut::<&mut Transform>(entity) {
        if let Some(position) = options.position {
            transform.position = position;
        }
        if let Some(rotation) = options.rotation {
            transform.rotation = rotation;
        }
        if let Some(scale) = options.scale {
            transform.scale = scale;
        }
    }
}

/// Reset a parked instance to its canonical default state
fn reset_instance(world: &mut World, entity: Entity) {
    if let Ok(transform) = world.query_one_mut::<&mut Transform>(entity) {
        *transform = Transform::default();
    }
    if let Ok(body) = world.query_one_mut::<&mut RigidBody>(entity) {
        body.linear_velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;
    }
    world.set_parent(entity, None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefab::definition::PrefabEntity;
    use serde_json::json;

    fn setup() -> (World, ComponentRegistry) {
        (World::new(), ComponentRegistry::with_default_components())
    }

    fn crate_definition() -> PrefabDefinition {
        PrefabDefinition::new(
            "crate",
            "Crate",
            PrefabEntity::new("Crate")
                .with_component("Transform", json!({}))
                .with_component("MeshRenderer", json!({ "mesh": "crate" }))
                .with_component("RigidBody", json!({}))
                .with_child(
                    PrefabEntity::new("Lid")
                        .with_component("Transform", json!({ "position": [0.0, 1.0, 0.0] }))
                        .with_component("MeshRenderer", json!({ "mesh": "lid" })),
                ),
        )
    }

    #[test]
    fn test_warm_parks_deactivated_instances() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 4);

        pool.warm(&mut world, &components, &definition, 2);

        let stats = pool.stats();
        assert_eq!(stats.available, 2);
        assert_eq!(stats.active, 0);

        // Parked instances exist but are switched off, children included
        for (_, renderer) in world.query::<&MeshRenderer>().iter() {
            assert!(!renderer.visible);
        }
        for (_, body) in world.query::<&RigidBody>().iter() {
            assert!(!body.enabled);
        }
    }

    #[test]
    fn test_acquire_reuses_most_recent_release() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 4);
        pool.warm(&mut world, &components, &definition, 2);

        let entity = pool
            .acquire(&mut world, &components, Some(&definition), &InstantiateOptions::new())
            .unwrap();
        assert!(pool.is_active(entity));

        pool.release(&mut world, entity);
        assert!(!pool.is_active(entity));

        let reacquired = pool
            .acquire(&mut world, &components, Some(&definition), &InstantiateOptions::new())
            .unwrap();
        assert_eq!(reacquired, entity);
    }

    #[test]
    fn test_acquire_reactivates_and_repositions() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 4);
        pool.warm(&mut world, &components, &definition, 1);

        let entity = pool
            .acquire(
                &mut world,
                &components,
                Some(&definition),
                &InstantiateOptions::new().at_position(Vec3::new(3.0, 0.0, 0.0)),
            )
            .unwrap();

        let transform = *world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.position, Vec3::new(3.0, 0.0, 0.0));
        let renderer = world.get::<MeshRenderer>(entity).unwrap();
        assert!(renderer.visible);
        let body = world.get::<RigidBody>(entity).unwrap();
        assert!(body.enabled);
    }

    #[test]
    fn test_acquire_beyond_warm_creates_fresh_entities() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 2);
        pool.warm(&mut world, &components, &definition, 2);

        let mut acquired = Vec::new();
        for _ in 0..3 {
            acquired.push(
                pool.acquire(&mut world, &components, Some(&definition), &InstantiateOptions::new())
                    .unwrap(),
            );
        }

        let stats = pool.stats();
        assert_eq!(stats.active, 3);
        assert_eq!(stats.available, 0);
        assert_eq!(stats.total, 3);
        // Overflow growth is real: three distinct live entities
        let unique: HashSet<Entity> = acquired.iter().copied().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_acquire_on_empty_pool_without_definition_fails() {
        let (mut world, components) = setup();
        let mut pool = PrefabPool::new("crate", 2);

        let result = pool.acquire(&mut world, &components, None, &InstantiateOptions::new());
        assert!(result.is_none());
    }

    #[test]
    fn test_release_resets_parked_instance() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 2);

        let anchor = world.spawn((Transform::default(),));
        let entity = pool
            .acquire(
                &mut world,
                &components,
                Some(&definition),
                &InstantiateOptions::new()
                    .with_parent(anchor)
                    .at_position(Vec3::new(9.0, 9.0, 9.0)),
            )
            .unwrap();

        pool.release(&mut world, entity);

        let transform = *world.get::<Transform>(entity).unwrap();
        assert_eq!(transform, Transform::default());
        assert_eq!(world.parent(entity), None);
        let renderer = world.get::<MeshRenderer>(entity).unwrap();
        assert!(!renderer.visible);
    }

    #[test]
    fn test_release_untracked_entity_is_a_noop() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 2);
        pool.warm(&mut world, &components, &definition, 1);

        let stray = world.spawn((Transform::default(),));
        pool.release(&mut world, stray);

        assert!(world.contains(stray));
        assert_eq!(pool.stats().available, 1);
    }

    #[test]
    fn test_release_beyond_capacity_destroys() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 1);

        let first = pool
            .acquire(&mut world, &components, Some(&definition), &InstantiateOptions::new())
            .unwrap();
        let second = pool
            .acquire(&mut world, &components, Some(&definition), &InstantiateOptions::new())
            .unwrap();

        pool.release(&mut world, first);
        pool.release(&mut world, second);

        // Capacity 1: the first release parks, the second destroys
        assert!(world.contains(first));
        assert!(!world.contains(second));
        assert_eq!(pool.stats().available, 1);
        assert_eq!(pool.stats().active, 0);
    }

    #[test]
    fn test_clear_destroys_everything() {
        let (mut world, components) = setup();
        let definition = crate_definition();
        let mut pool = PrefabPool::new("crate", 4);
        pool.warm(&mut world, &components, &definition, 2);
        let held = pool
            .acquire(&mut world, &components, Some(&definition), &InstantiateOptions::new())
            .unwrap();

        pool.clear(&mut world);

        assert!(!world.contains(held));
        assert_eq!(world.inner().len(), 0);
        let stats = pool.stats();
        assert_eq!(stats.total, 0);
    }
}
