//! `plugin.json` package manifests.
//!
//! A plugin package is a directory under the plugin directory holding a
//! `plugin.json` next to the resources the plugin ships with:
//!
//! ```text
//! plugins/
//!   greeter/
//!     plugin.json
//!     config.json
//!     libplugin_greeter.so   (optional)
//! ```

use crate::error::PluginError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name the manager looks for inside each package directory.
pub const MANIFEST_FILE: &str = "plugin.json";

/// Parsed contents of a package's `plugin.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: String,
    /// Registry key of the factory that builds this plugin
    #[serde(alias = "mainClass")]
    pub entry_point: String,
    /// Dynamic library inside the package exporting `create_plugin`
    #[serde(default)]
    pub library: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    /// Plugin API version the package was built against
    #[serde(default, alias = "api")]
    pub api_version: Option<u32>,
}

impl PluginManifest {
    /// Reads and validates the manifest inside `package_dir`.
    pub async fn load(package_dir: &Path) -> Result<Self, PluginError> {
        let path = package_dir.join(MANIFEST_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PluginError::InvalidManifest {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let manifest: PluginManifest =
            serde_json::from_str(&content).map_err(|e| PluginError::InvalidManifest {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        manifest
            .validate()
            .map_err(|reason| PluginError::InvalidManifest { path, reason })?;

        Ok(manifest)
    }

    /// Checks the fields the manager cannot work without.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self.version.trim().is_empty() {
            return Err("version cannot be empty".to_string());
        }
        if self.entry_point.trim().is_empty() {
            return Err("entry_point cannot be empty".to_string());
        }
        if let Some(library) = &self.library {
            if library.contains('/') || library.contains('\\') || library.contains("..") {
                return Err(format!("library must be a file name inside the package: {library}"));
            }
        }
        Ok(())
    }
}
