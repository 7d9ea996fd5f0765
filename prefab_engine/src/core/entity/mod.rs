//! Entity-Component System (ECS) functionality
//!
//! This module provides the entity store the prefab system materializes
//! into, including the core components and hierarchy management.

pub mod components;
pub mod hierarchy;
pub mod world;

// Re-export commonly used types
pub use components::{Children, MeshRenderer, Name, Parent, RigidBody, ScriptRef, Transform};
pub use hierarchy::{collect_subtree, validate_hierarchy};
pub use world::World;

// Re-export hecs types that users will need
pub use hecs::Entity;
