//! Prefab engine for entity-component worlds
//!
//! This crate provides reusable prefab templates over a hecs-backed world,
//! including variant resolution, per-instance override patches, instance
//! pooling, and JSON asset persistence.

pub mod component_system;
pub mod config;
pub mod core;
pub mod io;
pub mod prefab;

// Re-export commonly used types
pub mod prelude {
    // Entity system types
    pub use crate::core::entity::{
        Children, Entity, MeshRenderer, Name, Parent, RigidBody, ScriptRef, Transform, World,
    };

    // Math types
    pub use glam::{Quat, Vec3};

    // Prefab types
    pub use crate::prefab::{
        InstantiateOptions, PrefabDefinition, PrefabEntity, PrefabError, PrefabInstance,
        PrefabManager, PrefabRegistry, PrefabVariant,
    };

    // IO types
    pub use crate::io::ComponentRegistry;

    // Config types
    pub use crate::config::AssetConfig;
}

/// Initialize logging for the engine
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
