//! Quick prefab asset validation utility

use prefab_engine::core::entity::{validate_hierarchy, World};
use prefab_engine::io::{load_definition, load_variant, ComponentRegistry};
use prefab_engine::prefab::utils::traverse_prefab_entity;
use prefab_engine::prefab::{
    calculate_max_depth, instantiate, validate_prefab, InstantiateOptions, PrefabEntity,
    PrefabRegistry, MAX_PREFAB_DEPTH,
};
use std::{env, fs, path::Path, process};

fn main() {
    prefab_engine::init_logging();

    let args: Vec<String> = env::args().collect();
    let dir = if args.len() > 1 {
        &args[1]
    } else {
        "assets/prefabs"
    };

    let dir = Path::new(dir);
    println!("Validating prefab assets in: {}", dir.display());

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("✗ Failed to read directory: {e}");
            process::exit(1);
        }
    };

    let mut definition_paths = Vec::new();
    let mut variant_paths = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".prefab.json") {
            definition_paths.push(path);
        } else if name.ends_with(".variant.json") {
            variant_paths.push(path);
        }
    }
    definition_paths.sort();
    variant_paths.sort();

    let components = ComponentRegistry::with_default_components();
    let mut registry = PrefabRegistry::new();
    let mut failures = 0;

    for path in &definition_paths {
        println!("\nChecking {}", path.display());
        let definition = match load_definition(path) {
            Ok(definition) => definition,
            Err(e) => {
                eprintln!("✗ Failed to load: {e}");
                failures += 1;
                continue;
            }
        };

        let validation = validate_prefab(&definition);
        if !validation.is_valid {
            for error in &validation.errors {
                eprintln!("✗ {error}");
            }
            failures += 1;
            continue;
        }

        let mut nodes = 0;
        traverse_prefab_entity(&definition.root, &mut |_: &PrefabEntity, _| nodes += 1);
        let depth = calculate_max_depth(&definition.root);
        println!("  Nodes: {nodes}");
        println!("  Depth: {depth}");
        if depth > MAX_PREFAB_DEPTH {
            eprintln!("✗ Hierarchy depth {depth} exceeds limit of {MAX_PREFAB_DEPTH}");
            failures += 1;
            continue;
        }

        let mut world = World::new();
        match instantiate(
            &mut world,
            &components,
            &definition,
            &InstantiateOptions::default(),
        ) {
            Ok(root) => {
                let types = world.component_types(&components, root).join(", ");
                println!("  Root components: {types}");
                println!("✓ Instantiated {} entities", world.inner().len());
            }
            Err(e) => {
                eprintln!("✗ Failed to instantiate: {e}");
                failures += 1;
                continue;
            }
        }

        let invalid = validate_hierarchy(&world);
        if invalid > 0 {
            eprintln!("✗ {invalid} entities have a Parent but no Transform");
            failures += 1;
            continue;
        }

        if let Err(e) = registry.upsert(definition) {
            eprintln!("✗ Failed to register: {e}");
            failures += 1;
        }
    }

    for path in &variant_paths {
        println!("\nChecking {}", path.display());
        let variant = match load_variant(path) {
            Ok(variant) => variant,
            Err(e) => {
                eprintln!("✗ Failed to load: {e}");
                failures += 1;
                continue;
            }
        };

        let id = variant.id.clone();
        let base_id = variant.base_id.clone();
        if let Err(e) = registry.upsert_variant(variant) {
            eprintln!("✗ Failed to register: {e}");
            failures += 1;
            continue;
        }

        match registry.resolve_variant(&id) {
            Ok(_) => {
                println!("✓ Resolves against base '{base_id}'");
            }
            Err(e) => {
                eprintln!("✗ Failed to resolve: {e}");
                failures += 1;
            }
        }
    }

    let total = definition_paths.len() + variant_paths.len();
    println!("\nChecked {total} files, {failures} failed");
    if failures > 0 {
        process::exit(1);
    }
}
