//! Prefab asset persistence

use crate::config::AssetConfig;
use crate::prefab::{PrefabDefinition, PrefabError, PrefabRegistry, PrefabVariant};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Save a prefab definition to its canonical location under the asset root
pub fn save_definition(
    definition: &PrefabDefinition,
    config: &AssetConfig,
) -> Result<PathBuf, PrefabError> {
    let dir = config.prefabs_path();
    fs::create_dir_all(&dir)?;

    let path = config.prefab_path(&definition.id);
    info!(id = definition.id, path = ?path, "Saving prefab definition");

    let json = serde_json::to_string_pretty(definition)?;
    fs::write(&path, json)?;

    Ok(path)
}

/// Load a prefab definition from a JSON file
pub fn load_definition<P: AsRef<Path>>(path: P) -> Result<PrefabDefinition, PrefabError> {
    let path = path.as_ref();
    info!(path = ?path, "Loading prefab definition");

    let json = fs::read_to_string(path)?;
    let definition = serde_json::from_str(&json)?;

    Ok(definition)
}

/// Save a prefab variant to its canonical location under the asset root
pub fn save_variant(
    variant: &PrefabVariant,
    config: &AssetConfig,
) -> Result<PathBuf, PrefabError> {
    let dir = config.prefabs_path();
    fs::create_dir_all(&dir)?;

    let path = config.variant_path(&variant.id);
    info!(id = variant.id, path = ?path, "Saving prefab variant");

    let json = serde_json::to_string_pretty(variant)?;
    fs::write(&path, json)?;

    Ok(path)
}

/// Load a prefab variant from a JSON file
pub fn load_variant<P: AsRef<Path>>(path: P) -> Result<PrefabVariant, PrefabError> {
    let path = path.as_ref();
    info!(path = ?path, "Loading prefab variant");

    let json = fs::read_to_string(path)?;
    let variant = serde_json::from_str(&json)?;

    Ok(variant)
}

/// Load every prefab definition and variant under the configured asset
/// directory into the registry
///
/// Returns the number of assets loaded. Files that fail to parse or
/// register are skipped with a warning so one bad asset cannot block the
/// rest of the library.
pub fn load_all_definitions(
    config: &AssetConfig,
    registry: &mut PrefabRegistry,
) -> Result<usize, PrefabError> {
    let dir = config.prefabs_path();
    if !dir.exists() {
        warn!(path = ?dir, "Prefab directory does not exist, nothing to load");
        return Ok(0);
    }

    let mut definition_paths = Vec::new();
    let mut variant_paths = Vec::new();

    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if file_name.ends_with(".prefab.json") {
            definition_paths.push(path);
        } else if file_name.ends_with(".variant.json") {
            variant_paths.push(path);
        }
    }

    // Deterministic load order regardless of directory iteration order
    definition_paths.sort();
    variant_paths.sort();

    let mut loaded = 0;

    for path in &definition_paths {
        match load_definition(path) {
            Ok(definition) => match registry.upsert(definition) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Skipping prefab definition that failed to register");
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "Skipping prefab definition that failed to parse");
            }
        }
    }

    // Variants resolve against their base, so they load after all definitions
    for path in &variant_paths {
        match load_variant(path) {
            Ok(variant) => match registry.upsert_variant(variant) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    warn!(path = ?path, error = %e, "Skipping prefab variant that failed to register");
                }
            },
            Err(e) => {
                warn!(path = ?path, error = %e, "Skipping prefab variant that failed to parse");
            }
        }
    }

    info!(
        count = loaded,
        path = ?dir,
        "Loaded prefab assets from disk"
    );
    Ok(loaded)
}
