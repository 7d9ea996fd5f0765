//! Prefab data model: definitions, variants, and the instance tag

use crate::component_system::{Component, ComponentMetadata};
use crate::io::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One node of a prefab template tree
///
/// Components are stored as JSON payloads keyed by registered component name,
/// so a tree can carry component types this build does not know about.
/// Children are order-significant; they materialize in list order. Trees are
/// treated as immutable once stored in a definition: edits produce new trees
/// via clone, merge, or patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrefabEntity {
    /// Display name of the entity this node materializes into
    pub name: String,
    /// Component payloads keyed by component type name
    #[serde(default)]
    pub components: BTreeMap<String, serde_json::Value>,
    /// Child nodes in hierarchy order
    #[serde(default)]
    pub children: Vec<PrefabEntity>,
}

impl PrefabEntity {
    /// Create a new leaf node with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a component payload to this node
    pub fn with_component(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.components.insert(name.into(), value);
        self
    }

    /// Append a child node
    pub fn with_child(mut self, child: PrefabEntity) -> Self {
        self.children.push(child);
        self
    }
}

/// A partial tree node for shallow merges over a [`PrefabEntity`]
///
/// Each present field replaces the base's field wholesale; `children` in
/// particular is never spliced, only swapped as a whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PrefabEntityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PrefabEntity>>,
}

/// A versioned, reusable entity-tree template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrefabDefinition {
    /// Unique key within a registry
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Monotonically bumped on apply-to-asset; must stay >= 1
    pub version: u32,
    /// The template tree this definition materializes
    pub root: PrefabEntity,
    /// Free-form metadata, excluded from the content hash
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Ids of prefabs this one references, for cycle and deletion tracking
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Search/filter tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional longer description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PrefabDefinition {
    /// Create a version-1 definition with the given root tree
    pub fn new(id: impl Into<String>, name: impl Into<String>, root: PrefabEntity) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: 1,
            root,
            metadata: BTreeMap::new(),
            dependencies: Vec::new(),
            tags: Vec::new(),
            description: None,
        }
    }

    /// Record a dependency on another prefab id
    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    /// Add a search tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named override patch against a base definition
///
/// Variants are separately addressable but resolve against their base's root
/// at lookup time, so a base edit flows through to all of its variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrefabVariant {
    /// Unique key within a registry
    pub id: String,
    /// Id of the base definition; must be registered before the variant
    pub base_id: String,
    /// Human-readable name
    pub name: String,
    /// Version of the variant itself, independent of the base's version
    pub version: u32,
    /// Override patch applied to the base's root when resolving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<serde_json::Value>,
}

impl PrefabVariant {
    /// Create a version-1 variant of the given base
    pub fn new(id: impl Into<String>, base_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            base_id: base_id.into(),
            name: name.into(),
            version: 1,
            patch: None,
        }
    }

    /// Set the override patch
    pub fn with_patch(mut self, patch: serde_json::Value) -> Self {
        self.patch = Some(patch);
        self
    }
}

/// Component tagging a live entity as the root of a prefab instance
///
/// Written by the applier at instantiation time and excluded from template
/// serialization, so templates never carry instance bookkeeping.
#[derive(prefab_engine_derive::Component, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PrefabInstance {
    /// Id of the definition this instance was built from
    pub prefab_id: String,
    /// Definition version the instance was built from; a later bump makes it stale
    pub version: u32,
    /// Fresh random identifier minted per instantiation
    pub instance_uuid: Uuid,
    /// Minimal diff between the definition's root and this instance's requested state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_patch: Option<serde_json::Value>,
}

impl Default for PrefabInstance {
    fn default() -> Self {
        Self {
            prefab_id: String::new(),
            version: 1,
            instance_uuid: Uuid::nil(),
            override_patch: None,
        }
    }
}
