//! Core components for the entity system

use crate::component_system::{Component, ComponentMetadata};
use crate::io::ComponentRegistry;
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Transform component representing position, rotation, and scale in local space
///
/// Child transforms are relative to their parent. Only entities carrying a
/// Transform participate in parent/child linkage (see the hierarchy module).
#[derive(
    prefab_engine_derive::Component, Debug, Clone, Copy, Serialize, Deserialize, PartialEq,
)]
#[serde(default)]
pub struct Transform {
    /// Position in local space
    pub position: Vec3,
    /// Rotation in local space as a quaternion
    pub rotation: Quat,
    /// Scale in local space
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a new transform with the given position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Set the scale of the transform
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }
}

/// Name component for user-friendly entity identification
#[derive(prefab_engine_derive::Component, Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Name(pub String);

impl Name {
    /// Create a new name component
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Parent component establishing a parent-child relationship
///
/// Never serialized: prefab trees encode hierarchy structurally, so parent
/// links are rebuilt when a tree is materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub hecs::Entity);

/// Ordered list of an entity's direct children
///
/// Maintained by `World::set_parent`; like `Parent`, never serialized. The
/// order mirrors the order in which children were attached, which is the
/// order prefab trees are rebuilt in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(pub Vec<hecs::Entity>);

/// Mesh renderer component referencing a mesh asset by id
#[derive(prefab_engine_derive::Component, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MeshRenderer {
    /// Id of the referenced mesh asset
    pub mesh: String,
    /// Whether the mesh is drawn; pooled instances are parked with this off
    pub visible: bool,
}

impl Default for MeshRenderer {
    fn default() -> Self {
        Self {
            mesh: String::new(),
            visible: true,
        }
    }
}

impl MeshRenderer {
    /// Create a renderer referencing the given mesh asset
    pub fn new(mesh: impl Into<String>) -> Self {
        Self {
            mesh: mesh.into(),
            ..Default::default()
        }
    }
}

/// Rigid body component for physics simulation
#[derive(prefab_engine_derive::Component, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RigidBody {
    /// Mass in kilograms
    pub mass: f32,
    /// Linear velocity in world space
    pub linear_velocity: Vec3,
    /// Angular velocity in world space
    pub angular_velocity: Vec3,
    /// Whether this body is affected by gravity
    pub use_gravity: bool,
    /// Kinematic bodies are not affected by forces
    pub is_kinematic: bool,
    /// Whether the body takes part in simulation; pooled instances are parked with this off
    pub enabled: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            use_gravity: true,
            is_kinematic: false,
            enabled: true,
        }
    }
}

/// Script reference component pointing at a script asset by id
#[derive(
    prefab_engine_derive::Component, Debug, Clone, Default, Serialize, Deserialize, PartialEq,
)]
#[serde(default)]
pub struct ScriptRef {
    /// Id of the referenced script asset
    pub script: String,
}

impl ScriptRef {
    /// Create a new script reference
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
        }
    }
}
