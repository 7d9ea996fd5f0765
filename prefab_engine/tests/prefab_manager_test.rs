//! End-to-end tests for the prefab manager: instantiation, live edits,
//! version updates, and reverts

use glam::{Quat, Vec3};
use prefab_engine::core::entity::{MeshRenderer, Name, Transform, World};
use prefab_engine::io::ComponentRegistry;
use prefab_engine::prefab::{
    InstantiateOptions, PrefabDefinition, PrefabEntity, PrefabInstance, PrefabManager,
};
use serde_json::json;

fn crate_definition() -> PrefabDefinition {
    PrefabDefinition::new(
        "crate",
        "Crate",
        PrefabEntity::new("Crate")
            .with_component(
                "Transform",
                json!({"position": [0.0, 0.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0], "scale": [1.0, 1.0, 1.0]}),
            )
            .with_component("MeshRenderer", json!({"mesh": "crate", "visible": true}))
            .with_child(
                PrefabEntity::new("Lid")
                    .with_component(
                        "Transform",
                        json!({"position": [0.0, 1.0, 0.0], "rotation": [0.0, 0.0, 0.0, 1.0], "scale": [1.0, 1.0, 1.0]}),
                    ),
            ),
    )
}

fn setup() -> (World, ComponentRegistry, PrefabManager) {
    let world = World::new();
    let components = ComponentRegistry::with_default_components();
    let mut manager = PrefabManager::new();
    manager.register(crate_definition()).unwrap();
    (world, components, manager)
}

#[test]
fn test_unknown_prefab_yields_none_not_a_panic() {
    let (mut world, components, mut manager) = setup();

    let result = manager.instantiate(
        &mut world,
        &components,
        "ghost",
        &InstantiateOptions::default(),
    );
    assert!(result.is_none());
    assert_eq!(world.inner().len(), 0, "Nothing may be spawned for an unknown id");
}

#[test]
fn test_instantiate_positions_root_and_keeps_child_local() {
    let (mut world, components, mut manager) = setup();

    let entity = manager
        .instantiate(
            &mut world,
            &components,
            "crate",
            &InstantiateOptions::new().at_position(Vec3::new(5.0, 0.0, 0.0)),
        )
        .unwrap();

    let transform = world.get::<Transform>(entity).unwrap();
    assert_eq!(transform.position, Vec3::new(5.0, 0.0, 0.0));
    drop(transform);

    let children = world.children(entity);
    assert_eq!(children.len(), 1);
    let lid = world.get::<Transform>(children[0]).unwrap();
    assert_eq!(
        lid.position,
        Vec3::new(0.0, 1.0, 0.0),
        "Child keeps its local offset when the root is repositioned"
    );
}

#[test]
fn test_instance_tagging_and_queries() {
    let (mut world, components, mut manager) = setup();

    let entity = manager
        .instantiate(
            &mut world,
            &components,
            "crate",
            &InstantiateOptions::default(),
        )
        .unwrap();

    assert!(manager.is_instance(&world, entity));
    assert_eq!(manager.get_prefab_id(&world, entity).as_deref(), Some("crate"));
    assert_eq!(manager.get_instances(&world, "crate"), vec![entity]);

    let tag = world.get::<PrefabInstance>(entity).unwrap();
    assert_eq!(tag.version, 1);
    assert!(tag.override_patch.is_none());
    assert!(!tag.instance_uuid.is_nil());

    // The child is part of the instance but carries no tag of its own
    let children = world.children(entity);
    assert!(!manager.is_instance(&world, children[0]));
}

#[test]
fn test_apply_to_asset_bumps_version_and_updates_stale_instances() {
    let (mut world, components, mut manager) = setup();
    let options = InstantiateOptions::default();

    let a = manager
        .instantiate(&mut world, &components, "crate", &options)
        .unwrap();
    let b = manager
        .instantiate(&mut world, &components, "crate", &options)
        .unwrap();

    // Edit instance A live, then fold the edit back into the asset
    world
        .query_one_mut::<&mut MeshRenderer>(a)
        .unwrap()
        .mesh = "crate_red".to_string();
    let new_version = manager.apply_to_asset(&mut world, &components, a).unwrap();
    assert_eq!(new_version, 2);

    let definition = manager.get("crate").unwrap();
    assert_eq!(definition.version, 2);
    assert_eq!(
        definition.root.components["MeshRenderer"]["mesh"],
        json!("crate_red")
    );

    // A is now clean at the new version
    let tag = world.get::<PrefabInstance>(a).unwrap();
    assert_eq!(tag.version, 2);
    assert!(tag.override_patch.is_none());
    drop(tag);

    // B is stale; updating rebuilds it as a new entity with the new template
    let tag = world.get::<PrefabInstance>(b).unwrap();
    assert_eq!(tag.version, 1);
    drop(tag);

    let b2 = manager.update_to_version(&mut world, &components, b).unwrap();
    assert_ne!(b2, b);
    assert!(!world.contains(b));
    assert_eq!(world.get::<MeshRenderer>(b2).unwrap().mesh, "crate_red");
    assert_eq!(world.get::<PrefabInstance>(b2).unwrap().version, 2);
}

#[test]
fn test_update_at_current_version_is_a_noop() {
    let (mut world, components, mut manager) = setup();

    let entity = manager
        .instantiate(
            &mut world,
            &components,
            "crate",
            &InstantiateOptions::default(),
        )
        .unwrap();

    let same = manager
        .update_to_version(&mut world, &components, entity)
        .unwrap();
    assert_eq!(same, entity, "Up-to-date instances are left untouched");
}

#[test]
fn test_update_preserves_overrides_where_revert_discards_them() {
    let (mut world, components, mut manager) = setup();

    // Plain instance used to bump the asset version
    let plain = manager
        .instantiate(
            &mut world,
            &components,
            "crate",
            &InstantiateOptions::default(),
        )
        .unwrap();

    // Overridden instance parked at version 1
    let overridden = manager
        .instantiate(
            &mut world,
            &components,
            "crate",
            &InstantiateOptions::new()
                .at_position(Vec3::new(3.0, 0.0, 0.0))
                .with_overrides(json!({
                    "components": {"MeshRenderer": {"mesh": "crate_gold"}}
                })),
        )
        .unwrap();
    assert_eq!(
        world.get::<MeshRenderer>(overridden).unwrap().mesh,
        "crate_gold"
    );

    manager.apply_to_asset(&mut world, &components, plain).unwrap();

    // Give the stale instance a rotation that the rebuild must reset
    world
        .query_one_mut::<&mut Transform>(overridden)
        .unwrap()
        .rotation = Quat::from_rotation_y(1.0);

    let updated = manager
        .update_to_version(&mut world, &components, overridden)
        .unwrap();
    assert_ne!(updated, overridden);

    let transform = world.get::<Transform>(updated).unwrap();
    assert_eq!(
        transform.position,
        Vec3::new(3.0, 0.0, 0.0),
        "Position survives the rebuild"
    );
    assert_eq!(
        transform.rotation,
        Quat::IDENTITY,
        "Rotation resets to the template"
    );
    drop(transform);

    // The override rode along through the upgrade
    assert_eq!(world.get::<MeshRenderer>(updated).unwrap().mesh, "crate_gold");
    let tag = world.get::<PrefabInstance>(updated).unwrap();
    assert_eq!(tag.version, 2);
    assert!(tag.override_patch.is_some());
    drop(tag);

    // Revert strips the override and goes back to the template mesh
    let reverted = manager
        .revert_instance(&mut world, &components, updated)
        .unwrap();
    assert_eq!(world.get::<MeshRenderer>(reverted).unwrap().mesh, "crate");
    assert!(world
        .get::<PrefabInstance>(reverted)
        .unwrap()
        .override_patch
        .is_none());
}

#[test]
fn test_create_from_entity_then_instantiate() {
    let (mut world, components, mut manager) = setup();

    let source = world.spawn((
        Name::new("Barrel"),
        Transform::from_position(Vec3::new(0.0, 0.5, 0.0)),
        MeshRenderer::new("barrel_mesh"),
    ));

    let definition = manager
        .create_from_entity(&world, &components, source, "Barrel", "barrel")
        .unwrap();
    assert_eq!(definition.dependencies, vec!["barrel_mesh".to_string()]);

    let copy = manager
        .instantiate(
            &mut world,
            &components,
            "barrel",
            &InstantiateOptions::default(),
        )
        .unwrap();
    assert_ne!(copy, source);
    assert_eq!(world.get::<MeshRenderer>(copy).unwrap().mesh, "barrel_mesh");
    assert_eq!(world.entity_name(copy).as_deref(), Some("Barrel"));
}

#[test]
fn test_destroy_tolerates_repeated_and_untracked_entities() {
    let (mut world, components, mut manager) = setup();

    let entity = manager
        .instantiate(
            &mut world,
            &components,
            "crate",
            &InstantiateOptions::default(),
        )
        .unwrap();

    manager.destroy(&mut world, entity);
    assert!(!world.contains(entity));

    // Destroying again just warns
    manager.destroy(&mut world, entity);

    // Untagged entities are destroyed with a warning rather than rejected
    let plain = world.spawn((Transform::default(),));
    manager.destroy(&mut world, plain);
    assert!(!world.contains(plain));
}

#[test]
fn test_reset_clears_registry_and_pools() {
    let (mut world, components, mut manager) = setup();

    manager.enable_pooling("crate", 4);
    manager.warm_pool(&mut world, &components, "crate", 2);
    // Two pooled instances, each a root plus its lid child
    assert_eq!(world.inner().len(), 4);

    manager.reset(&mut world);

    assert!(manager.get("crate").is_none());
    assert!(manager.pool_stats("crate").is_none());
    assert_eq!(world.inner().len(), 0, "Pooled entities are destroyed on reset");
}
