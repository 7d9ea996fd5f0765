//! Pure helpers over prefab trees: hashing, validation, cycle detection

use super::definition::{PrefabDefinition, PrefabEntity, PrefabEntityPatch};
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use tracing::error;

/// Hard ceiling on prefab tree height, enforced at instantiation time
pub const MAX_PREFAB_DEPTH: usize = 10;

/// The slice of a definition that participates in its content hash
///
/// Metadata, tags, description, id, and name are deliberately excluded: two
/// definitions differing only in those hash identically.
#[derive(Serialize)]
struct HashedContent<'a> {
    root: &'a PrefabEntity,
    version: u32,
    dependencies: &'a [String],
}

/// Compute a deterministic, non-cryptographic content hash for a definition
///
/// Stable across runs for identical input; used for cheap change detection,
/// never for security. Component maps are ordered maps, so serialization is
/// canonical.
pub fn generate_prefab_hash(definition: &PrefabDefinition) -> u64 {
    let content = HashedContent {
        root: &definition.root,
        version: definition.version,
        dependencies: &definition.dependencies,
    };
    let serialized = serde_json::to_string(&content).unwrap_or_else(|e| {
        error!(prefab_id = %definition.id, error = %e, "Failed to serialize prefab for hashing");
        String::new()
    });
    let mut hasher = DefaultHasher::new();
    serialized.hash(&mut hasher);
    hasher.finish()
}

/// Result of validating a definition against the domain rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefabValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Check a definition against the domain rules, collecting every violation
///
/// All checks run independently, so `errors` can hold multiple entries.
/// Never fails outright; an unvalidatable definition is simply invalid.
pub fn validate_prefab(definition: &PrefabDefinition) -> PrefabValidation {
    let mut errors = Vec::new();

    if definition.id.is_empty() {
        errors.push("Prefab id must not be empty".to_string());
    }
    if definition.name.is_empty() {
        errors.push("Prefab name must not be empty".to_string());
    }
    if definition.version < 1 {
        errors.push("Prefab version must be at least 1".to_string());
    }
    if definition.dependencies.iter().any(|d| d == &definition.id) {
        errors.push("Prefab must not depend on itself".to_string());
    }

    PrefabValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}

/// Depth-first cycle detection over the dependency graph reachable from `id`
///
/// `visited` holds the ids on the current path only; it is cloned per branch
/// so sibling branches sharing a dependency do not falsely report a cycle.
/// An id the resolver cannot produce a definition for is treated as acyclic,
/// which lets definitions be registered in any order.
pub fn detect_cycle<'a, F>(id: &str, resolver: &F, visited: &HashSet<String>) -> bool
where
    F: Fn(&str) -> Option<&'a PrefabDefinition>,
{
    if visited.contains(id) {
        return true;
    }
    let definition = match resolver(id) {
        Some(definition) => definition,
        None => return false,
    };

    let mut path = visited.clone();
    path.insert(id.to_string());
    definition
        .dependencies
        .iter()
        .any(|dependency| detect_cycle(dependency, resolver, &path))
}

/// Tree height of a prefab entity, 0 for a leaf
pub fn calculate_max_depth(entity: &PrefabEntity) -> usize {
    entity
        .children
        .iter()
        .map(|child| calculate_max_depth(child) + 1)
        .max()
        .unwrap_or(0)
}

/// Check a tree against a depth ceiling
pub fn is_max_depth_exceeded(entity: &PrefabEntity, max: usize) -> bool {
    calculate_max_depth(entity) > max
}

/// Visit every node of a tree in pre-order, passing the node and its depth
pub fn traverse_prefab_entity<F>(entity: &PrefabEntity, mut callback: F)
where
    F: FnMut(&PrefabEntity, usize),
{
    fn walk<F>(entity: &PrefabEntity, depth: usize, callback: &mut F)
    where
        F: FnMut(&PrefabEntity, usize),
    {
        callback(entity, depth);
        for child in &entity.children {
            walk(child, depth + 1, callback);
        }
    }
    walk(entity, 0, &mut callback);
}

/// Shallow-merge a partial node over a base node, one level deep
///
/// Present patch fields replace the base's wholesale; the children list in
/// particular is swapped as a unit, never spliced.
pub fn merge_prefab_entities(base: &PrefabEntity, patch: &PrefabEntityPatch) -> PrefabEntity {
    PrefabEntity {
        name: patch.name.clone().unwrap_or_else(|| base.name.clone()),
        components: patch
            .components
            .clone()
            .unwrap_or_else(|| base.components.clone()),
        children: patch
            .children
            .clone()
            .unwrap_or_else(|| base.children.clone()),
    }
}

/// Normalize an id into a filesystem-safe slug
///
/// Lowercases, maps anything outside ascii alphanumerics, `-`, and `_` to
/// `-`, collapses dash runs, and trims leading/trailing dashes.
pub fn sanitize_prefab_id(id: &str) -> String {
    let mut sanitized = String::with_capacity(id.len());
    for c in id.chars() {
        let lower = c.to_ascii_lowercase();
        if lower.is_ascii_alphanumeric() || lower == '_' {
            sanitized.push(lower);
        } else if !sanitized.ends_with('-') {
            sanitized.push('-');
        }
    }
    sanitized.trim_matches('-').to_string()
}

/// Deterministic relative asset path for a prefab id
pub fn generate_prefab_path(id: &str) -> String {
    format!("prefabs/{}.prefab.json", sanitize_prefab_id(id))
}
