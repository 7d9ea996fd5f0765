//! Configuration types for asset storage

use crate::prefab::sanitize_prefab_id;
use std::path::PathBuf;
use tracing::debug;

/// Configuration for prefab asset paths
#[derive(Debug, Clone)]
pub struct AssetConfig {
    /// Root directory for all assets
    pub asset_root: PathBuf,
    /// Directory name for prefabs (relative to asset_root)
    pub prefabs_dir: String,
}

impl AssetConfig {
    /// Create a new AssetConfig with custom paths
    pub fn new(asset_root: PathBuf, prefabs_dir: String) -> Self {
        debug!(
            asset_root = ?asset_root,
            prefabs_dir = prefabs_dir,
            "Creating new AssetConfig"
        );
        Self {
            asset_root,
            prefabs_dir,
        }
    }

    /// Get the prefab asset directory
    pub fn prefabs_path(&self) -> PathBuf {
        self.asset_root.join(&self.prefabs_dir)
    }

    /// Get the full path to a prefab definition file
    ///
    /// Ids are slugified on the way in, so separators and dots cannot
    /// escape the prefab directory.
    pub fn prefab_path(&self, id: &str) -> PathBuf {
        let path = self
            .prefabs_path()
            .join(format!("{}.prefab.json", sanitize_prefab_id(id)));
        debug!(id = id, path = ?path, "Generated prefab path");
        path
    }

    /// Get the full path to a prefab variant file
    pub fn variant_path(&self, id: &str) -> PathBuf {
        let path = self
            .prefabs_path()
            .join(format!("{}.variant.json", sanitize_prefab_id(id)));
        debug!(id = id, path = ?path, "Generated variant path");
        path
    }

    /// Check if the asset directories exist
    pub fn validate(&self) -> Result<(), std::io::Error> {
        if !self.asset_root.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Asset root directory not found: {:?}", self.asset_root),
            ));
        }

        let prefabs_path = self.prefabs_path();
        if !prefabs_path.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Prefabs directory not found: {prefabs_path:?}"),
            ));
        }

        Ok(())
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("assets"),
            prefabs_dir: "prefabs".to_string(),
        }
    }
}
