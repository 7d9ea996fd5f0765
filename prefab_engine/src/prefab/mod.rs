//! Prefab system: reusable entity-tree templates with live instances
//!
//! A definition is a versioned template tree held by the registry. The
//! applier materializes definitions into the world as tagged instances,
//! tracks per-instance override patches against the template, and folds
//! instance edits back into new definition versions. Pools park deactivated
//! instances for cheap reuse, and the manager fronts the whole system.

pub mod applier;
pub mod definition;
pub mod manager;
pub mod overrides;
pub mod pool;
pub mod registry;
pub mod serializer;
pub mod utils;

/// Errors from prefab operations
///
/// Everything here aborts its operation with no partial effect on stored
/// state. Per-item failures inside tree walks are logged and skipped
/// instead of surfacing through this type.
#[derive(Debug, thiserror::Error)]
pub enum PrefabError {
    #[error("Invalid prefab definition '{}': {}", .id, .errors.join("; "))]
    InvalidDefinition { id: String, errors: Vec<String> },

    #[error("Dependency cycle detected through prefab '{0}'")]
    DependencyCycle(String),

    #[error("Cannot remove prefab '{}', it is required by: {}", .id, .dependents.join(", "))]
    HasDependents { id: String, dependents: Vec<String> },

    #[error("Unknown prefab '{0}'")]
    UnknownPrefab(String),

    #[error("Unknown prefab variant '{0}'")]
    UnknownVariant(String),

    #[error("Variant '{variant_id}' references unregistered base '{base_id}'")]
    MissingBase { variant_id: String, base_id: String },

    #[error("Prefab '{id}' tree depth {depth} exceeds the maximum of {max}")]
    MaxDepthExceeded { id: String, depth: usize, max: usize },

    #[error("Entity {0:?} is not a prefab instance")]
    NotAnInstance(hecs::Entity),

    #[error("Entity {0:?} does not exist")]
    MissingEntity(hecs::Entity),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Re-export the types callers actually touch
pub use applier::{
    apply_to_asset, apply_transform_overrides, destroy_instance, get_instances, get_prefab_id,
    instantiate, is_instance, revert_instance, update_to_version, InstantiateOptions,
};
pub use definition::{
    PrefabDefinition, PrefabEntity, PrefabEntityPatch, PrefabInstance, PrefabVariant,
};
pub use manager::PrefabManager;
pub use overrides::{
    apply_override_patch, clear_overrides, compute_override_patch, merge_patches, validate_patch,
    PatchRules,
};
pub use pool::{PoolStats, PrefabPool};
pub use registry::PrefabRegistry;
pub use serializer::{create_prefab_from_entity, deserialize_entity, serialize_entity};
pub use utils::{
    calculate_max_depth, generate_prefab_hash, sanitize_prefab_id, validate_prefab,
    PrefabValidation, MAX_PREFAB_DEPTH,
};
