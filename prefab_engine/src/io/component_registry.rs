//! Component registry for dynamic component access by name

use crate::component_system::ComponentMetadata;
use std::any::TypeId;
use std::collections::HashMap;
use tracing::debug;

/// Registry of component metadata, addressable by type or by name
///
/// Prefab payloads store components as `name -> JSON value` maps. The
/// registry is what turns those names back into typed world operations, so
/// every component a prefab may carry must be registered before trees are
/// serialized or materialized.
#[derive(Default)]
pub struct ComponentRegistry {
    /// Maps TypeId to component metadata
    metadata: HashMap<TypeId, ComponentMetadata>,
    /// Maps component names to TypeId for lookup
    name_to_type: HashMap<String, TypeId>,
}

impl ComponentRegistry {
    /// Create a new empty component registry
    pub fn new() -> Self {
        Self {
            metadata: HashMap::new(),
            name_to_type: HashMap::new(),
        }
    }

    /// Register a component type from its metadata table
    ///
    /// Registering the same name again replaces the previous entry.
    pub fn register_with_metadata(&mut self, metadata: ComponentMetadata) {
        let type_id = metadata.type_id;
        let name = metadata.name.to_string();

        if let Some(old_type_id) = self.name_to_type.insert(name.clone(), type_id) {
            self.metadata.remove(&old_type_id);
        }
        self.metadata.insert(type_id, metadata);

        debug!(component_name = %name, "Registered component");
    }

    /// Get metadata for a component by its TypeId
    pub fn get_metadata(&self, type_id: TypeId) -> Option<&ComponentMetadata> {
        self.metadata.get(&type_id)
    }

    /// Get metadata for a component by its registered name
    pub fn get_metadata_by_name(&self, name: &str) -> Option<&ComponentMetadata> {
        self.name_to_type
            .get(name)
            .and_then(|type_id| self.metadata.get(type_id))
    }

    /// Iterate over all registered component metadata
    pub fn iter_metadata(&self) -> impl Iterator<Item = &ComponentMetadata> {
        self.metadata.values()
    }

    /// Get the names of all registered component types
    pub fn component_names(&self) -> Vec<&'static str> {
        self.metadata.values().map(|meta| meta.name).collect()
    }

    /// Check if a component type is registered
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.name_to_type.contains_key(type_name)
    }

    /// Get the number of registered component types
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }

    /// Create a registry with all built-in components registered
    pub fn with_default_components() -> Self {
        use crate::component_system::Component;
        use crate::core::entity::components::{MeshRenderer, Name, RigidBody, ScriptRef, Transform};
        use crate::prefab::PrefabInstance;

        let mut registry = Self::new();

        // Register core components
        Transform::register(&mut registry);
        Name::register(&mut registry);

        // Register asset-reference components
        MeshRenderer::register(&mut registry);
        RigidBody::register(&mut registry);
        ScriptRef::register(&mut registry);

        // Register the prefab instance tag
        PrefabInstance::register(&mut registry);

        debug!(
            component_count = registry.len(),
            "Created registry with default components"
        );

        registry
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field(
                "registered_types",
                &self.name_to_type.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
