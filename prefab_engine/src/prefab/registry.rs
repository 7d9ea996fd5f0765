//! Authoritative store of prefab definitions and variants

use super::definition::{PrefabDefinition, PrefabVariant};
use super::overrides::{apply_override_patch, PatchRules};
use super::utils::{detect_cycle, generate_prefab_hash, validate_prefab};
use super::PrefabError;
use ordermap::OrderMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Store of definitions and variants, keyed by id in registration order
///
/// Enforces the domain rules on every upsert: well-formed definitions, an
/// acyclic dependency graph, and no deletion while other definitions still
/// depend on the target. Content hashes are cached per definition for cheap
/// change detection.
#[derive(Default)]
pub struct PrefabRegistry {
    definitions: OrderMap<String, PrefabDefinition>,
    variants: OrderMap<String, PrefabVariant>,
    hashes: HashMap<String, u64>,
}

impl PrefabRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            definitions: OrderMap::new(),
            variants: OrderMap::new(),
            hashes: HashMap::new(),
        }
    }

    /// Insert or update a definition
    ///
    /// Validates the definition, then checks the full dependency graph for
    /// cycles with the new definition speculatively in place, rolling the
    /// insert back if one is found. Either the definition and its hash are
    /// both updated or neither is.
    pub fn upsert(&mut self, definition: PrefabDefinition) -> Result<(), PrefabError> {
        let validation = validate_prefab(&definition);
        if !validation.is_valid {
            return Err(PrefabError::InvalidDefinition {
                id: definition.id.clone(),
                errors: validation.errors,
            });
        }

        let id = definition.id.clone();
        let hash = generate_prefab_hash(&definition);

        // Speculative insert so the cycle check sees the new dependency edges
        let previous = self.definitions.insert(id.clone(), definition);

        let definitions = &self.definitions;
        let resolver = |lookup: &str| definitions.get(lookup);
        if detect_cycle(&id, &resolver, &HashSet::new()) {
            match previous {
                Some(previous) => {
                    self.definitions.insert(id.clone(), previous);
                }
                None => {
                    self.definitions.remove(&id);
                }
            }
            return Err(PrefabError::DependencyCycle(id));
        }

        self.hashes.insert(id.clone(), hash);
        debug!(prefab_id = %id, "Registered prefab definition");
        Ok(())
    }

    /// Remove a definition, refusing while anything still depends on it
    pub fn remove(&mut self, id: &str) -> Result<(), PrefabError> {
        if !self.definitions.contains_key(id) {
            return Err(PrefabError::UnknownPrefab(id.to_string()));
        }
        let dependents = self.find_dependents(id);
        if !dependents.is_empty() {
            warn!(prefab_id = %id, dependents = ?dependents, "Refusing to remove prefab with dependents");
            return Err(PrefabError::HasDependents {
                id: id.to_string(),
                dependents,
            });
        }

        self.definitions.remove(id);
        self.hashes.remove(id);
        debug!(prefab_id = %id, "Removed prefab definition");
        Ok(())
    }

    /// Names of every definition whose dependencies include `id`
    pub fn find_dependents(&self, id: &str) -> Vec<String> {
        self.definitions
            .values()
            .filter(|definition| definition.dependencies.iter().any(|d| d == id))
            .map(|definition| definition.name.clone())
            .collect()
    }

    /// Look up a definition by id
    pub fn get(&self, id: &str) -> Option<&PrefabDefinition> {
        self.definitions.get(id)
    }

    /// All definitions in registration order
    pub fn list(&self) -> Vec<&PrefabDefinition> {
        self.definitions.values().collect()
    }

    /// Check whether a definition is registered
    pub fn contains(&self, id: &str) -> bool {
        self.definitions.contains_key(id)
    }

    /// Number of registered definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check whether the registry holds no definitions
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Case-insensitive substring search over name, id, tags, and description
    ///
    /// A definition matches if any one field matches.
    pub fn search(&self, query: &str) -> Vec<&PrefabDefinition> {
        let query = query.to_lowercase();
        self.definitions
            .values()
            .filter(|definition| {
                definition.name.to_lowercase().contains(&query)
                    || definition.id.to_lowercase().contains(&query)
                    || definition
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
                    || definition
                        .description
                        .as_ref()
                        .map(|description| description.to_lowercase().contains(&query))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Definitions carrying any of the given tags; untagged ones never match
    pub fn filter_by_tags(&self, tags: &[&str]) -> Vec<&PrefabDefinition> {
        self.definitions
            .values()
            .filter(|definition| {
                definition
                    .tags
                    .iter()
                    .any(|tag| tags.contains(&tag.as_str()))
            })
            .collect()
    }

    /// Cached content hash for a definition
    pub fn get_hash(&self, id: &str) -> Option<u64> {
        self.hashes.get(id).copied()
    }

    /// Check whether a definition changed since a previously observed hash
    ///
    /// An unknown id reports changed, so stale clients refresh.
    pub fn has_changed(&self, id: &str, last_hash: u64) -> bool {
        self.get_hash(id)
            .map(|hash| hash != last_hash)
            .unwrap_or(true)
    }

    /// Register a variant; its base must already be registered
    pub fn upsert_variant(&mut self, variant: PrefabVariant) -> Result<(), PrefabError> {
        if variant.id.is_empty() {
            return Err(PrefabError::InvalidDefinition {
                id: variant.id.clone(),
                errors: vec!["Variant id must not be empty".to_string()],
            });
        }
        if !self.definitions.contains_key(&variant.base_id) {
            return Err(PrefabError::MissingBase {
                variant_id: variant.id.clone(),
                base_id: variant.base_id.clone(),
            });
        }

        let id = variant.id.clone();
        self.variants.insert(id.clone(), variant);
        debug!(variant_id = %id, "Registered prefab variant");
        Ok(())
    }

    /// Look up a variant by id
    pub fn get_variant(&self, id: &str) -> Option<&PrefabVariant> {
        self.variants.get(id)
    }

    /// All variants registered against the given base
    pub fn get_variants_of(&self, base_id: &str) -> Vec<&PrefabVariant> {
        self.variants
            .values()
            .filter(|variant| variant.base_id == base_id)
            .collect()
    }

    /// Remove a variant
    pub fn remove_variant(&mut self, id: &str) -> Result<(), PrefabError> {
        match self.variants.remove(id) {
            Some(_) => {
                debug!(variant_id = %id, "Removed prefab variant");
                Ok(())
            }
            None => Err(PrefabError::UnknownVariant(id.to_string())),
        }
    }

    /// Materialize a variant as a standalone definition
    ///
    /// Clones the base, applies the variant's patch over the base's root
    /// with structural changes allowed, and stamps the variant's identity on
    /// the result. Resolution happens at lookup time, so base edits flow
    /// through to every variant.
    pub fn resolve_variant(&self, variant_id: &str) -> Result<PrefabDefinition, PrefabError> {
        let variant = self
            .variants
            .get(variant_id)
            .ok_or_else(|| PrefabError::UnknownVariant(variant_id.to_string()))?;
        let base =
            self.definitions
                .get(&variant.base_id)
                .ok_or_else(|| PrefabError::MissingBase {
                    variant_id: variant.id.clone(),
                    base_id: variant.base_id.clone(),
                })?;

        let mut resolved = base.clone();
        if let Some(patch) = &variant.patch {
            let root_value = serde_json::to_value(&base.root)?;
            let patched = apply_override_patch(
                &root_value,
                patch,
                PatchRules {
                    allow_structural_changes: true,
                },
            );
            resolved.root = serde_json::from_value(patched)?;
        }
        resolved.id = variant.id.clone();
        resolved.name = variant.name.clone();
        resolved.version = variant.version;
        Ok(resolved)
    }

    /// Drop every definition, variant, and cached hash
    pub fn clear(&mut self) {
        self.definitions.clear();
        self.variants.clear();
        self.hashes.clear();
    }
}
