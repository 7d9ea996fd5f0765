//! Modular component system with automatic registration and type-erased access
//!
//! Every component type registers a small function table
//! ([`ComponentMetadata`]) that lets the serializer, applier, and entity-store
//! helpers move component data between typed storage and JSON payloads without
//! knowing the concrete type.

use crate::core::entity::World;
use crate::io::component_registry::ComponentRegistry;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Type alias for component serializer function
pub type SerializerFn = Arc<
    dyn Fn(&dyn Any) -> Result<serde_json::Value, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Type alias for component deserializer function
pub type DeserializerFn = Arc<
    dyn Fn(&serde_json::Value) -> Result<Box<dyn Any>, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Type alias for add default component function
pub type AddDefaultFn = Arc<
    dyn Fn(&mut World, hecs::Entity) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Type alias for inserting a JSON payload as a typed component
pub type InsertValueFn = Arc<
    dyn Fn(
            &mut World,
            hecs::Entity,
            &serde_json::Value,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Type alias for reading a component back out as JSON
///
/// Returns `Ok(None)` when the entity does not carry the component.
pub type ExtractValueFn = Arc<
    dyn Fn(
            &World,
            hecs::Entity,
        )
            -> Result<Option<serde_json::Value>, Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Type alias for a component presence check
pub type ContainsFn = Arc<dyn Fn(&World, hecs::Entity) -> bool + Send + Sync>;

/// Type alias for removing a component from an entity
pub type RemoveFn = Arc<
    dyn Fn(&mut World, hecs::Entity) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
        + Send
        + Sync,
>;

/// Type alias for listing every entity carrying a component type
pub type EntitiesFn = Arc<dyn Fn(&World) -> Vec<hecs::Entity> + Send + Sync>;

/// Trait for components that can be automatically registered and managed
pub trait Component: Any + Send + Sync + 'static {
    /// Get the name of this component type
    fn component_name() -> &'static str
    where
        Self: Sized;

    /// Register this component type with the registry
    fn register(registry: &mut ComponentRegistry)
    where
        Self: Sized;
}

/// Metadata for a component type including serialization and world-access functions
pub struct ComponentMetadata {
    /// The display name of the component
    pub name: &'static str,

    /// The TypeId of the component
    pub type_id: TypeId,

    /// Function to serialize the component to JSON
    pub serializer: SerializerFn,

    /// Function to deserialize the component from JSON
    pub deserializer: DeserializerFn,

    /// Function to add a default instance of this component to an entity
    pub add_default: AddDefaultFn,

    /// Function to deserialize a JSON payload and attach it to an entity
    pub insert_value: InsertValueFn,

    /// Function to read the component off an entity as JSON
    pub extract: ExtractValueFn,

    /// Function to check whether an entity carries this component
    pub contains: ContainsFn,

    /// Function to remove this component from an entity
    pub remove: RemoveFn,

    /// Function to list all entities carrying this component
    pub entities: EntitiesFn,
}

impl ComponentMetadata {
    /// Create metadata for a component type that implements Serialize, Deserialize, and Default
    pub fn new<T>(name: &'static str) -> Self
    where
        T: Component + Serialize + for<'de> Deserialize<'de> + Default + 'static,
    {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            serializer: Arc::new(|component| {
                let typed_component = component
                    .downcast_ref::<T>()
                    .ok_or("Failed to downcast component for serialization")?;
                serde_json::to_value(typed_component)
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            }),
            deserializer: Arc::new(|value| {
                let component: T = serde_json::from_value(value.clone())
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
                Ok(Box::new(component) as Box<dyn Any>)
            }),
            add_default: Arc::new(|world, entity| {
                world
                    .insert_one(entity, T::default())
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            }),
            insert_value: Arc::new(|world, entity, value| {
                let component: T = serde_json::from_value(value.clone())
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
                world
                    .insert_one(entity, component)
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            }),
            extract: Arc::new(|world, entity| match world.get::<T>(entity) {
                Ok(component) => {
                    let value = serde_json::to_value(&*component)
                        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;
                    Ok(Some(value))
                }
                Err(_) => Ok(None),
            }),
            contains: Arc::new(|world, entity| world.get::<T>(entity).is_ok()),
            remove: Arc::new(|world, entity| {
                world
                    .remove_one::<T>(entity)
                    .map(|_| ())
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
            }),
            entities: Arc::new(|world| {
                world
                    .query::<&T>()
                    .iter()
                    .map(|(entity, _)| entity)
                    .collect()
            }),
        }
    }
}
