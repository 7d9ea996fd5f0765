//! World wrapper around hecs ECS

use crate::core::entity::components::{Children, Name, Parent};
use crate::io::ComponentRegistry;
use hecs::Entity;
use tracing::error;

/// Wrapper around hecs::World providing entity management and hierarchy upkeep
pub struct World {
    inner: hecs::World,
}

impl World {
    /// Create a new empty world
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
        }
    }

    /// Spawn a new entity with the given components
    pub fn spawn(&mut self, components: impl hecs::DynamicBundle) -> Entity {
        self.inner.spawn(components)
    }

    /// Get a reference to a component on an entity
    pub fn get<T: hecs::Component>(
        &self,
        entity: Entity,
    ) -> Result<hecs::Ref<T>, hecs::ComponentError> {
        self.inner.get::<&T>(entity)
    }

    /// Query a single entity for a mutable component reference
    pub fn query_one_mut<Q: hecs::Query>(
        &mut self,
        entity: Entity,
    ) -> Result<Q::Item<'_>, hecs::QueryOneError> {
        self.inner.query_one_mut::<Q>(entity)
    }

    /// Insert a single component on an entity
    pub fn insert_one(
        &mut self,
        entity: Entity,
        component: impl hecs::Component,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert_one(entity, component)
    }

    /// Remove a single component from an entity
    pub fn remove_one<T: hecs::Component>(
        &mut self,
        entity: Entity,
    ) -> Result<T, hecs::ComponentError> {
        self.inner.remove_one::<T>(entity)
    }

    /// Query entities with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<Q> {
        self.inner.query()
    }

    /// Query entities with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<Q> {
        self.inner.query_mut()
    }

    /// Despawn a single entity, leaving its children in place
    pub fn despawn(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        self.inner.despawn(entity)
    }

    /// Check if an entity exists
    pub fn contains(&self, entity: Entity) -> bool {
        self.inner.contains(entity)
    }

    /// Get direct access to the inner hecs world
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }

    /// Get mutable access to the inner hecs world
    pub fn inner_mut(&mut self) -> &mut hecs::World {
        &mut self.inner
    }
}

/// Hierarchy management
impl World {
    /// Set or clear an entity's parent, keeping `Children` lists in sync
    ///
    /// Passing `None` detaches the entity. Attaching appends the child to the
    /// end of the new parent's `Children` list.
    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) {
        // Unlink from the previous parent first
        if let Ok(Parent(old_parent)) = self.inner.remove_one::<Parent>(child) {
            if let Ok(children) = self.inner.query_one_mut::<&mut Children>(old_parent) {
                children.0.retain(|&c| c != child);
            }
        }

        if let Some(parent) = parent {
            if self.inner.insert_one(child, Parent(parent)).is_err() {
                error!(child = ?child, "Cannot set parent on a despawned entity");
                return;
            }
            match self.inner.query_one_mut::<&mut Children>(parent) {
                Ok(children) => {
                    if !children.0.contains(&child) {
                        children.0.push(child);
                    }
                }
                Err(_) => {
                    if self
                        .inner
                        .insert_one(parent, Children(vec![child]))
                        .is_err()
                    {
                        error!(parent = ?parent, "Cannot attach child to a despawned parent");
                        let _ = self.inner.remove_one::<Parent>(child);
                    }
                }
            }
        }
    }

    /// Get an entity's parent, if any
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.inner
            .get::<&Parent>(entity)
            .map(|parent| parent.0)
            .ok()
    }

    /// Get an entity's direct children in attachment order
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.inner
            .get::<&Children>(entity)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    /// Despawn an entity together with all of its descendants
    pub fn despawn_recursive(&mut self, entity: Entity) -> Result<(), hecs::NoSuchEntity> {
        if !self.inner.contains(entity) {
            return Err(hecs::NoSuchEntity);
        }
        for child in self.children(entity) {
            if self.inner.contains(child) {
                self.despawn_recursive(child)?;
            }
        }
        // Unlink from the parent's child list before despawning
        if let Some(parent) = self.parent(entity) {
            if let Ok(children) = self.inner.query_one_mut::<&mut Children>(parent) {
                children.0.retain(|&c| c != entity);
            }
        }
        self.inner.despawn(entity)
    }

    /// Get an entity's display name, if it has one
    pub fn entity_name(&self, entity: Entity) -> Option<String> {
        self.inner
            .get::<&Name>(entity)
            .map(|name| name.0.clone())
            .ok()
    }

    /// Set or replace an entity's display name
    pub fn set_entity_name(&mut self, entity: Entity, name: impl Into<String>) {
        let name = name.into();
        match self.inner.query_one_mut::<&mut Name>(entity) {
            Ok(existing) => existing.0 = name,
            Err(_) => {
                if self.inner.insert_one(entity, Name(name)).is_err() {
                    error!(entity = ?entity, "Cannot name a despawned entity");
                }
            }
        }
    }
}

/// Registry-mediated dynamic component access
impl World {
    /// Check whether an entity has a component, addressed by registered name
    pub fn has_component(&self, registry: &ComponentRegistry, entity: Entity, name: &str) -> bool {
        registry
            .get_metadata_by_name(name)
            .map(|metadata| (metadata.contains)(self, entity))
            .unwrap_or(false)
    }

    /// Extract a component's value as JSON, addressed by registered name
    ///
    /// Returns `None` if the entity lacks the component or the type is unknown.
    pub fn component_value(
        &self,
        registry: &ComponentRegistry,
        entity: Entity,
        name: &str,
    ) -> Option<serde_json::Value> {
        let metadata = registry.get_metadata_by_name(name)?;
        match (metadata.extract)(self, entity) {
            Ok(value) => value,
            Err(e) => {
                error!(entity = ?entity, component = name, error = %e, "Failed to extract component value");
                None
            }
        }
    }

    /// Insert or replace a component from a JSON value, addressed by registered name
    pub fn add_component_value(
        &mut self,
        registry: &ComponentRegistry,
        entity: Entity,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let metadata = registry
            .get_metadata_by_name(name)
            .ok_or_else(|| format!("Unknown component type: {name}"))?;
        (metadata.insert_value)(self, entity, value)
    }

    /// Merge a JSON value into an existing component, addressed by registered name
    ///
    /// Object values are merged key by key over the current value; anything
    /// else replaces the component wholesale.
    pub fn update_component_value(
        &mut self,
        registry: &ComponentRegistry,
        entity: Entity,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let metadata = registry
            .get_metadata_by_name(name)
            .ok_or_else(|| format!("Unknown component type: {name}"))?;
        let current = (metadata.extract)(self, entity)?
            .ok_or_else(|| format!("Entity has no {name} component"))?;
        let merged = match (current, value) {
            (serde_json::Value::Object(mut base), serde_json::Value::Object(updates)) => {
                for (key, update) in updates {
                    base.insert(key.clone(), update.clone());
                }
                serde_json::Value::Object(base)
            }
            (_, replacement) => replacement.clone(),
        };
        (metadata.insert_value)(self, entity, &merged)
    }

    /// Remove a component from an entity, addressed by registered name
    pub fn remove_component_value(
        &mut self,
        registry: &ComponentRegistry,
        entity: Entity,
        name: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let metadata = registry
            .get_metadata_by_name(name)
            .ok_or_else(|| format!("Unknown component type: {name}"))?;
        (metadata.remove)(self, entity)
    }

    /// List the registered component types present on an entity
    pub fn component_types(&self, registry: &ComponentRegistry, entity: Entity) -> Vec<String> {
        registry
            .iter_metadata()
            .filter(|metadata| (metadata.contains)(self, entity))
            .map(|metadata| metadata.name.to_string())
            .collect()
    }

    /// List all entities carrying a component, addressed by registered name
    pub fn entities_with_component(
        &self,
        registry: &ComponentRegistry,
        name: &str,
    ) -> Vec<Entity> {
        registry
            .get_metadata_by_name(name)
            .map(|metadata| (metadata.entities)(self))
            .unwrap_or_default()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::entity::components::Transform;
    use glam::Vec3;

    #[test]
    fn test_spawn_and_get() {
        let mut world = World::new();
        let entity = world.spawn((Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),));

        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_set_parent_maintains_children() {
        let mut world = World::new();
        let parent = world.spawn((Transform::default(),));
        let a = world.spawn((Transform::default(),));
        let b = world.spawn((Transform::default(),));

        world.set_parent(a, Some(parent));
        world.set_parent(b, Some(parent));

        assert_eq!(world.parent(a), Some(parent));
        assert_eq!(world.children(parent), vec![a, b]);
    }

    #[test]
    fn test_reparent_unlinks_old_parent() {
        let mut world = World::new();
        let first = world.spawn((Transform::default(),));
        let second = world.spawn((Transform::default(),));
        let child = world.spawn((Transform::default(),));

        world.set_parent(child, Some(first));
        world.set_parent(child, Some(second));

        assert!(world.children(first).is_empty());
        assert_eq!(world.children(second), vec![child]);
        assert_eq!(world.parent(child), Some(second));
    }

    #[test]
    fn test_detach_clears_parent() {
        let mut world = World::new();
        let parent = world.spawn((Transform::default(),));
        let child = world.spawn((Transform::default(),));

        world.set_parent(child, Some(parent));
        world.set_parent(child, None);

        assert_eq!(world.parent(child), None);
        assert!(world.children(parent).is_empty());
    }

    #[test]
    fn test_despawn_recursive() {
        let mut world = World::new();
        let root = world.spawn((Transform::default(),));
        let child = world.spawn((Transform::default(),));
        let grandchild = world.spawn((Transform::default(),));

        world.set_parent(child, Some(root));
        world.set_parent(grandchild, Some(child));

        world.despawn_recursive(root).unwrap();

        assert!(!world.contains(root));
        assert!(!world.contains(child));
        assert!(!world.contains(grandchild));
    }

    #[test]
    fn test_despawn_recursive_unlinks_from_parent() {
        let mut world = World::new();
        let root = world.spawn((Transform::default(),));
        let child = world.spawn((Transform::default(),));
        world.set_parent(child, Some(root));

        world.despawn_recursive(child).unwrap();

        assert!(world.contains(root));
        assert!(world.children(root).is_empty());
    }

    #[test]
    fn test_entity_names() {
        let mut world = World::new();
        let entity = world.spawn(());

        assert_eq!(world.entity_name(entity), None);
        world.set_entity_name(entity, "Player");
        assert_eq!(world.entity_name(entity), Some("Player".to_string()));
        world.set_entity_name(entity, "Enemy");
        assert_eq!(world.entity_name(entity), Some("Enemy".to_string()));
    }

    #[test]
    fn test_dynamic_component_access() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = World::new();
        let entity = world.spawn(());

        assert!(!world.has_component(&registry, entity, "Transform"));

        let value = serde_json::json!({
            "position": [1.0, 2.0, 3.0],
            "rotation": [0.0, 0.0, 0.0, 1.0],
            "scale": [1.0, 1.0, 1.0],
        });
        world
            .add_component_value(&registry, entity, "Transform", &value)
            .unwrap();

        assert!(world.has_component(&registry, entity, "Transform"));
        let extracted = world.component_value(&registry, entity, "Transform").unwrap();
        assert_eq!(extracted["position"], serde_json::json!([1.0, 2.0, 3.0]));

        let types = world.component_types(&registry, entity);
        assert_eq!(types, vec!["Transform".to_string()]);
    }

    #[test]
    fn test_update_component_value_merges_keys() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = World::new();
        let entity = world.spawn((Transform::from_position(Vec3::new(1.0, 2.0, 3.0)),));

        world
            .update_component_value(
                &registry,
                entity,
                "Transform",
                &serde_json::json!({ "position": [9.0, 9.0, 9.0] }),
            )
            .unwrap();

        let transform = world.get::<Transform>(entity).unwrap();
        assert_eq!(transform.position, Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(transform.scale, Vec3::ONE);
    }

    #[test]
    fn test_remove_component_value() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = World::new();
        let entity = world.spawn((Transform::default(),));

        world
            .remove_component_value(&registry, entity, "Transform")
            .unwrap();

        assert!(!world.has_component(&registry, entity, "Transform"));
        assert!(world.get::<Transform>(entity).is_err());
    }

    #[test]
    fn test_unknown_component_type_errors() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = World::new();
        let entity = world.spawn(());

        let result =
            world.add_component_value(&registry, entity, "DoesNotExist", &serde_json::json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn test_entities_with_component() {
        let registry = ComponentRegistry::with_default_components();
        let mut world = World::new();
        let a = world.spawn((Transform::default(),));
        let _b = world.spawn(());
        let c = world.spawn((Transform::default(),));

        let mut entities = world.entities_with_component(&registry, "Transform");
        entities.sort();
        let mut expected = vec![a, c];
        expected.sort();
        assert_eq!(entities, expected);
    }
}
