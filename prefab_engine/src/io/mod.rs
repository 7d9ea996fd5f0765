//! Input/Output module for component registration and prefab asset persistence

pub mod component_registry;
pub mod prefab_asset;

pub use component_registry::ComponentRegistry;
pub use prefab_asset::{
    load_all_definitions, load_definition, load_variant, save_definition, save_variant,
};
