//! Bidirectional mapping between live entity subtrees and prefab trees

use crate::core::entity::{Entity, Transform, World};
use crate::io::ComponentRegistry;
use crate::prefab::definition::{PrefabDefinition, PrefabEntity};
use crate::prefab::utils::traverse_prefab_entity;
use crate::prefab::PrefabError;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, error, warn};

/// Components that belong in a template tree
///
/// `Name` is lifted into the node's name field and `PrefabInstance` is
/// per-instance bookkeeping, so neither serializes as a payload.
fn is_template_component(name: &str) -> bool {
    name != "Name" && name != "PrefabInstance"
}

/// Snapshot a live entity subtree as a portable prefab tree
///
/// Component payloads are value copies with no aliasing into live storage.
/// Serialization is best-effort below the root: a component that fails to
/// extract is logged and skipped, and a child whose serialization fails is
/// dropped along with its whole subtree.
pub fn serialize_entity(
    world: &World,
    components: &ComponentRegistry,
    entity: Entity,
) -> Result<PrefabEntity, PrefabError> {
    if !world.contains(entity) {
        return Err(PrefabError::MissingEntity(entity));
    }

    let name = world.entity_name(entity).unwrap_or_default();
    let mut payloads = BTreeMap::new();
    for metadata in components.iter_metadata() {
        if !is_template_component(metadata.name) {
            continue;
        }
        match (metadata.extract)(world, entity) {
            Ok(Some(value)) => {
                payloads.insert(metadata.name.to_string(), value);
            }
            Ok(None) => {}
            Err(e) => {
                error!(entity = ?entity, component = metadata.name, error = %e, "Skipping unserializable component");
            }
        }
    }

    let mut node = PrefabEntity {
        name,
        components: payloads,
        children: Vec::new(),
    };

    for child in world.children(entity) {
        match serialize_entity(world, components, child) {
            Ok(child_node) => node.children.push(child_node),
            Err(e) => {
                error!(child = ?child, error = %e, "Skipping child subtree during serialization");
            }
        }
    }

    Ok(node)
}

/// Materialize a prefab tree into the world, one entity per node
///
/// Builds in pre-order: each node is fully constructed (name, components,
/// parent link) before its children are visited. A component payload that
/// fails to apply is logged and skipped; unknown component types are
/// tolerated and skipped so trees can carry forward-compatible data. Only
/// nodes carrying a Transform are linked under their parent.
pub fn deserialize_entity(
    world: &mut World,
    components: &ComponentRegistry,
    node: &PrefabEntity,
    parent: Option<Entity>,
) -> Entity {
    let entity = world.spawn(());
    if !node.name.is_empty() {
        world.set_entity_name(entity, node.name.clone());
    }

    for (type_name, value) in &node.components {
        match components.get_metadata_by_name(type_name) {
            Some(metadata) => {
                if let Err(e) = (metadata.insert_value)(world, entity, value) {
                    error!(entity = ?entity, component = %type_name, error = %e, "Skipping component that failed to apply");
                }
            }
            None => {
                warn!(component = %type_name, "Skipping unknown component type");
            }
        }
    }

    // A node without a Transform has no spatial relation to its parent, so
    // it stays unlinked
    if let Some(parent) = parent {
        if world.get::<Transform>(entity).is_ok() {
            world.set_parent(entity, Some(parent));
        } else {
            debug!(entity = ?entity, name = %node.name, "Node without Transform left unlinked");
        }
    }

    for child in &node.children {
        deserialize_entity(world, components, child, Some(entity));
    }

    entity
}

/// Snapshot an entity subtree as a brand-new version-1 definition
///
/// Walks the serialized tree collecting referenced asset ids (meshes and
/// scripts) into `dependencies`, in discovery order with duplicates dropped,
/// and stamps creation metadata.
pub fn create_prefab_from_entity(
    world: &World,
    components: &ComponentRegistry,
    entity: Entity,
    name: impl Into<String>,
    id: impl Into<String>,
) -> Result<PrefabDefinition, PrefabError> {
    let root = serialize_entity(world, components, entity)?;
    let dependencies = collect_dependencies(&root);

    let mut definition = PrefabDefinition::new(id, name, root);
    definition.dependencies = dependencies;
    definition.metadata.insert(
        "createdAt".to_string(),
        serde_json::Value::from(unix_timestamp_secs()),
    );
    definition.metadata.insert(
        "createdFrom".to_string(),
        serde_json::Value::from(entity.to_bits().get()),
    );

    debug!(
        prefab_id = %definition.id,
        dependency_count = definition.dependencies.len(),
        "Created prefab definition from entity"
    );
    Ok(definition)
}

fn collect_dependencies(root: &PrefabEntity) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();
    traverse_prefab_entity(root, |node, _depth| {
        for (component, key) in [("MeshRenderer", "mesh"), ("ScriptRef", "script")] {
            if let Some(asset) = node
                .components
                .get(component)
                .and_then(|value| value.get(key))
                .and_then(|value| value.as_str())
            {
                if !asset.is_empty() && seen.insert(asset.to_string()) {
                    dependencies.push(asset.to_string());
                }
            }
        }
    });
    dependencies
}

fn unix_timestamp_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}
