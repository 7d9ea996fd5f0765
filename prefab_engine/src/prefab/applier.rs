//! Instance lifecycle: instantiate, destroy, revert, upgrade, apply-back
//!
//! Updates are destroy-and-recreate behind the `replace_instance` seam
//! rather than in-place component diffing; only transform-delta application
//! mutates live data directly.

use crate::core::entity::{Entity, Transform, World};
use crate::io::ComponentRegistry;
use crate::prefab::definition::{PrefabDefinition, PrefabInstance};
use crate::prefab::overrides::{apply_override_patch, PatchRules};
use crate::prefab::registry::PrefabRegistry;
use crate::prefab::serializer::{deserialize_entity, serialize_entity};
use crate::prefab::utils::{calculate_max_depth, MAX_PREFAB_DEPTH};
use crate::prefab::PrefabError;
use glam::{Quat, Vec3};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-instantiation knobs: placement, parenting, and override payloads
#[derive(Debug, Clone, Default)]
pub struct InstantiateOptions {
    /// Entity to parent the new root under
    pub parent: Option<Entity>,
    /// Override patch applied to the definition's root before materializing
    pub overrides: Option<serde_json::Value>,
    /// Requested root position
    pub position: Option<Vec3>,
    /// Requested root rotation
    pub rotation: Option<Quat>,
    /// Requested root scale
    pub scale: Option<Vec3>,
}

impl InstantiateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, parent: Entity) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_overrides(mut self, overrides: serde_json::Value) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn at_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// Materialize a definition into the world and tag the new root
///
/// The depth ceiling is the one hard failure here and is checked before any
/// entity is created. Override patches apply with structural changes
/// disallowed at this call site, so component additions or removals smuggled
/// into an override are dropped with a warning rather than honored.
pub fn instantiate(
    world: &mut World,
    components: &ComponentRegistry,
    definition: &PrefabDefinition,
    options: &InstantiateOptions,
) -> Result<Entity, PrefabError> {
    let depth = calculate_max_depth(&definition.root);
    if depth > MAX_PREFAB_DEPTH {
        return Err(PrefabError::MaxDepthExceeded {
            id: definition.id.clone(),
            depth,
            max: MAX_PREFAB_DEPTH,
        });
    }

    let effective_root = match &options.overrides {
        Some(patch) => {
            let root_value = serde_json::to_value(&definition.root)?;
            let patched = apply_override_patch(&root_value, patch, PatchRules::default());
            serde_json::from_value(patched)?
        }
        None => definition.root.clone(),
    };

    let entity = deserialize_entity(world, components, &effective_root, options.parent);

    let instance = PrefabInstance {
        prefab_id: definition.id.clone(),
        version: definition.version,
        instance_uuid: Uuid::new_v4(),
        override_patch: options.overrides.clone(),
    };
    world
        .insert_one(entity, instance)
        .map_err(|_| PrefabError::MissingEntity(entity))?;

    apply_transform_overrides(world, entity, options);

    info!(prefab_id = %definition.id, entity = ?entity, "Instantiated prefab");
    Ok(entity)
}

/// Apply requested position/rotation/scale onto a freshly built instance
///
/// Two cases. If the root owns a Transform, the supplied fields replace that
/// Transform's fields directly and children stay untouched in their local
/// coordinates. If the root is a pure organizational node, the request is
/// turned into a delta against the first spatial child and propagated to
/// every direct child carrying a Transform, preserving the children's
/// relative offsets: additive for position, quaternion composition for
/// rotation, and a per-axis multiplier for scale (axes currently at zero
/// keep multiplier 1). A root with neither a Transform nor spatial children
/// is a logged no-op.
pub fn apply_transform_overrides(world: &mut World, root: Entity, options: &InstantiateOptions) {
    if options.position.is_none() && options.rotation.is_none() && options.scale.is_none() {
        return;
    }

    if let Ok(transform) = world.query_one_mut::<&mut Transform>(root) {
        if let Some(position) = options.position {
            transform.position = position;
        }
        if let Some(rotation) = options.rotation {
            transform.rotation = rotation;
        }
        if let Some(scale) = options.scale {
            transform.scale = scale;
        }
        return;
    }

    let spatial_children: Vec<Entity> = world
        .children(root)
        .into_iter()
        .filter(|&child| world.get::<Transform>(child).is_ok())
        .collect();

    if spatial_children.is_empty() {
        warn!(root = ?root, "Transform override on a root with no spatial children is a no-op");
        return;
    }

    let first = match world.get::<Transform>(spatial_children[0]) {
        Ok(transform) => *transform,
        Err(_) => return,
    };

    let position_delta = options.position.map(|requested| requested - first.position);
    let rotation_delta = options
        .rotation
        .map(|requested| requested * first.rotation.inverse());
    let scale_multiplier = options.scale.map(|requested| {
        Vec3::new(
            safe_scale_ratio(requested.x, first.scale.x),
            safe_scale_ratio(requested.y, first.scale.y),
            safe_scale_ratio(requested.z, first.scale.z),
        )
    });

    for child in spatial_children {
        if let Ok(transform) = world.query_one_mut::<&mut Transform>(child) {
            if let Some(delta) = position_delta {
                transform.position += delta;
            }
            if let Some(delta) = rotation_delta {
                transform.rotation = delta * transform.rotation;
            }
            if let Some(multiplier) = scale_multiplier {
                transform.scale *= multiplier;
            }
        }
    }
}

fn safe_scale_ratio(requested: f32, current: f32) -> f32 {
    if current == 0.0 {
        1.0
    } else {
        requested / current
    }
}

/// Destroy an instance and its whole subtree
///
/// Works on untagged entities too, with a warning, so stray subtrees can be
/// cleaned up through the same path.
pub fn destroy_instance(world: &mut World, entity: Entity) -> Result<(), PrefabError> {
    if !world.contains(entity) {
        return Err(PrefabError::MissingEntity(entity));
    }
    if world.get::<PrefabInstance>(entity).is_err() {
        warn!(entity = ?entity, "Destroying an entity that is not tagged as a prefab instance");
    }

    world
        .despawn_recursive(entity)
        .map_err(|_| PrefabError::MissingEntity(entity))?;
    debug!(entity = ?entity, "Destroyed prefab instance");
    Ok(())
}

/// Fold an instance's live state back into its definition
///
/// Re-serializes the subtree as the definition's new root, bumps the version
/// by one, re-registers, and clears the instance's override patch since the
/// delta is now baked into the template. Returns the new version.
pub fn apply_to_asset(
    world: &mut World,
    components: &ComponentRegistry,
    registry: &mut PrefabRegistry,
    entity: Entity,
) -> Result<u32, PrefabError> {
    let instance = match world.get::<PrefabInstance>(entity) {
        Ok(instance) => (*instance).clone(),
        Err(_) => return Err(PrefabError::NotAnInstance(entity)),
    };
    let mut definition = registry
        .get(&instance.prefab_id)
        .cloned()
        .ok_or_else(|| PrefabError::UnknownPrefab(instance.prefab_id.clone()))?;

    definition.root = serialize_entity(world, components, entity)?;
    definition.version += 1;
    let new_version = definition.version;
    registry.upsert(definition)?;

    if let Ok(tag) = world.query_one_mut::<&mut PrefabInstance>(entity) {
        tag.version = new_version;
        tag.override_patch = None;
    }

    info!(
        prefab_id = %instance.prefab_id,
        version = new_version,
        "Applied instance state back to prefab asset"
    );
    Ok(new_version)
}

/// Rebuild an instance fresh from its definition, discarding overrides
///
/// Only the current parent and position survive the rebuild; rotation and
/// scale reset to the definition's values.
pub fn revert_instance(
    world: &mut World,
    components: &ComponentRegistry,
    registry: &PrefabRegistry,
    entity: Entity,
) -> Result<Entity, PrefabError> {
    let instance = match world.get::<PrefabInstance>(entity) {
        Ok(instance) => (*instance).clone(),
        Err(_) => return Err(PrefabError::NotAnInstance(entity)),
    };
    let definition = registry
        .get(&instance.prefab_id)
        .ok_or_else(|| PrefabError::UnknownPrefab(instance.prefab_id.clone()))?;

    let entity = replace_instance(world, components, definition, entity, None)?;
    info!(prefab_id = %definition.id, entity = ?entity, "Reverted instance to its definition");
    Ok(entity)
}

/// Rebuild a stale instance from the definition's current version
///
/// No-op when the stored version already matches. Unlike revert, the
/// instance's override patch is re-applied on the rebuilt copy, so upgrades
/// preserve overrides while reverts discard them.
pub fn update_to_version(
    world: &mut World,
    components: &ComponentRegistry,
    registry: &PrefabRegistry,
    entity: Entity,
) -> Result<Entity, PrefabError> {
    let instance = match world.get::<PrefabInstance>(entity) {
        Ok(instance) => (*instance).clone(),
        Err(_) => return Err(PrefabError::NotAnInstance(entity)),
    };
    let definition = registry
        .get(&instance.prefab_id)
        .ok_or_else(|| PrefabError::UnknownPrefab(instance.prefab_id.clone()))?;

    if instance.version == definition.version {
        debug!(entity = ?entity, version = instance.version, "Instance already at current version");
        return Ok(entity);
    }

    let entity = replace_instance(world, components, definition, entity, instance.override_patch)?;
    info!(
        prefab_id = %definition.id,
        from_version = instance.version,
        to_version = definition.version,
        entity = ?entity,
        "Updated instance to current version"
    );
    Ok(entity)
}

/// Destroy-and-recreate seam shared by revert and version updates
///
/// Captures the current parent and position before destroying; rotation and
/// scale are left to reset.
fn replace_instance(
    world: &mut World,
    components: &ComponentRegistry,
    definition: &PrefabDefinition,
    entity: Entity,
    override_patch: Option<serde_json::Value>,
) -> Result<Entity, PrefabError> {
    let parent = world.parent(entity);
    let position = world
        .get::<Transform>(entity)
        .ok()
        .map(|transform| transform.position);

    destroy_instance(world, entity)?;

    let options = InstantiateOptions {
        parent,
        overrides: override_patch,
        position,
        ..Default::default()
    };
    instantiate(world, components, definition, &options)
}

/// Check whether an entity is a tagged instance root
pub fn is_instance(world: &World, entity: Entity) -> bool {
    world.get::<PrefabInstance>(entity).is_ok()
}

/// The prefab id an instance was built from
pub fn get_prefab_id(world: &World, entity: Entity) -> Option<String> {
    world
        .get::<PrefabInstance>(entity)
        .map(|instance| instance.prefab_id.clone())
        .ok()
}

/// All live instance roots of the given prefab
///
/// Scans every tagged entity and filters; O(total instances), not indexed
/// per prefab.
pub fn get_instances(world: &World, prefab_id: &str) -> Vec<Entity> {
    world
        .query::<&PrefabInstance>()
        .iter()
        .filter(|(_, instance)| instance.prefab_id == prefab_id)
        .map(|(entity, _)| entity)
        .collect()
}
