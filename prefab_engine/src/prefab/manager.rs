//! Façade coordinating the registry, applier, and per-prefab pools
//!
//! This is the surface the editor talks to. Lookup failures here log and
//! return `None` instead of failing, so fire-and-forget call sites keep
//! working; the fatal error taxonomy lives on the registry and applier.

use crate::core::entity::{Entity, World};
use crate::io::ComponentRegistry;
use crate::prefab::applier::{self, InstantiateOptions};
use crate::prefab::definition::PrefabDefinition;
use crate::prefab::pool::{PoolStats, PrefabPool};
use crate::prefab::registry::PrefabRegistry;
use crate::prefab::serializer;
use crate::prefab::PrefabError;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Explicit, constructible coordinator for the whole prefab system
///
/// Owns the registry and the pools; the world and component registry are
/// passed per call so one manager can serve any entity store.
#[derive(Default)]
pub struct PrefabManager {
    registry: PrefabRegistry,
    pools: HashMap<String, PrefabPool>,
}

impl PrefabManager {
    /// Create a manager with an empty registry and no pools
    pub fn new() -> Self {
        Self {
            registry: PrefabRegistry::new(),
            pools: HashMap::new(),
        }
    }

    /// Read access to the definition registry
    pub fn registry(&self) -> &PrefabRegistry {
        &self.registry
    }

    /// Mutable access to the definition registry
    pub fn registry_mut(&mut self) -> &mut PrefabRegistry {
        &mut self.registry
    }

    /// Register or update a definition
    pub fn register(&mut self, definition: PrefabDefinition) -> Result<(), PrefabError> {
        self.registry.upsert(definition)
    }

    /// Remove a definition; pools for it are left to `disable_pooling`
    pub fn unregister(&mut self, id: &str) -> Result<(), PrefabError> {
        self.registry.remove(id)
    }

    /// Look up a definition
    pub fn get(&self, id: &str) -> Option<&PrefabDefinition> {
        self.registry.get(id)
    }

    /// All definitions in registration order
    pub fn list(&self) -> Vec<&PrefabDefinition> {
        self.registry.list()
    }

    /// Search definitions by name, id, tag, or description
    pub fn search(&self, query: &str) -> Vec<&PrefabDefinition> {
        self.registry.search(query)
    }

    /// Instantiate a prefab by id, going through its pool when one exists
    ///
    /// An unknown id is logged and yields `None`, never an error.
    pub fn instantiate(
        &mut self,
        world: &mut World,
        components: &ComponentRegistry,
        prefab_id: &str,
        options: &InstantiateOptions,
    ) -> Option<Entity> {
        let definition = match self.registry.get(prefab_id) {
            Some(definition) => definition,
            None => {
                warn!(prefab_id = %prefab_id, "Cannot instantiate unknown prefab");
                return None;
            }
        };

        if let Some(pool) = self.pools.get_mut(prefab_id) {
            return pool.acquire(world, components, Some(definition), options);
        }

        match applier::instantiate(world, components, definition, options) {
            Ok(entity) => Some(entity),
            Err(e) => {
                error!(prefab_id = %prefab_id, error = %e, "Failed to instantiate prefab");
                None
            }
        }
    }

    /// Take an instance out of play: release to its pool, or destroy
    pub fn destroy(&mut self, world: &mut World, entity: Entity) {
        if let Some(prefab_id) = applier::get_prefab_id(world, entity) {
            if let Some(pool) = self.pools.get_mut(&prefab_id) {
                if pool.is_active(entity) {
                    pool.release(world, entity);
                    return;
                }
            }
        }
        if let Err(e) = applier::destroy_instance(world, entity) {
            warn!(entity = ?entity, error = %e, "Failed to destroy entity");
        }
    }

    /// Turn pooling on for a prefab, or resize an existing pool
    pub fn enable_pooling(&mut self, prefab_id: impl Into<String>, capacity: usize) {
        let prefab_id = prefab_id.into();
        match self.pools.get_mut(&prefab_id) {
            Some(pool) => pool.set_capacity(capacity),
            None => {
                info!(prefab_id = %prefab_id, capacity, "Enabled pooling");
                self.pools
                    .insert(prefab_id.clone(), PrefabPool::new(prefab_id, capacity));
            }
        }
    }

    /// Turn pooling off for a prefab, destroying its pooled entities
    pub fn disable_pooling(&mut self, world: &mut World, prefab_id: &str) {
        if let Some(mut pool) = self.pools.remove(prefab_id) {
            pool.clear(world);
            info!(prefab_id = %prefab_id, "Disabled pooling");
        }
    }

    /// Pre-build instances into a prefab's pool
    pub fn warm_pool(
        &mut self,
        world: &mut World,
        components: &ComponentRegistry,
        prefab_id: &str,
        count: usize,
    ) {
        let definition = match self.registry.get(prefab_id) {
            Some(definition) => definition,
            None => {
                warn!(prefab_id = %prefab_id, "Cannot warm pool for unknown prefab");
                return;
            }
        };
        match self.pools.get_mut(prefab_id) {
            Some(pool) => pool.warm(world, components, definition, count),
            None => warn!(prefab_id = %prefab_id, "Pooling is not enabled for this prefab"),
        }
    }

    /// Occupancy numbers for a prefab's pool, if pooling is enabled
    pub fn pool_stats(&self, prefab_id: &str) -> Option<PoolStats> {
        self.pools.get(prefab_id).map(|pool| pool.stats())
    }

    /// Snapshot an entity subtree as a new definition and register it
    pub fn create_from_entity(
        &mut self,
        world: &World,
        components: &ComponentRegistry,
        entity: Entity,
        name: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<PrefabDefinition, PrefabError> {
        let definition =
            serializer::create_prefab_from_entity(world, components, entity, name, id)?;
        self.registry.upsert(definition.clone())?;
        Ok(definition)
    }

    /// Fold an instance's live state back into its definition
    pub fn apply_to_asset(
        &mut self,
        world: &mut World,
        components: &ComponentRegistry,
        entity: Entity,
    ) -> Result<u32, PrefabError> {
        applier::apply_to_asset(world, components, &mut self.registry, entity)
    }

    /// Rebuild an instance fresh from its definition, discarding overrides
    pub fn revert_instance(
        &mut self,
        world: &mut World,
        components: &ComponentRegistry,
        entity: Entity,
    ) -> Result<Entity, PrefabError> {
        applier::revert_instance(world, components, &self.registry, entity)
    }

    /// Rebuild a stale instance at the definition's current version
    pub fn update_to_version(
        &mut self,
        world: &mut World,
        components: &ComponentRegistry,
        entity: Entity,
    ) -> Result<Entity, PrefabError> {
        applier::update_to_version(world, components, &self.registry, entity)
    }

    /// Check whether an entity is a tagged instance root
    pub fn is_instance(&self, world: &World, entity: Entity) -> bool {
        applier::is_instance(world, entity)
    }

    /// The prefab id an instance was built from
    pub fn get_prefab_id(&self, world: &World, entity: Entity) -> Option<String> {
        applier::get_prefab_id(world, entity)
    }

    /// All live instance roots of a prefab
    pub fn get_instances(&self, world: &World, prefab_id: &str) -> Vec<Entity> {
        applier::get_instances(world, prefab_id)
    }

    /// Tear everything down: pools cleared, registry emptied
    ///
    /// Intended for tests and editor session resets in place of any global
    /// singleton state.
    pub fn reset(&mut self, world: &mut World) {
        for (_, mut pool) in self.pools.drain() {
            pool.clear(world);
        }
        self.registry.clear();
        info!("Reset prefab manager");
    }
}
