//! Immutable plugin metadata.

use crate::manifest::PluginManifest;
use serde::Serialize;

/// Name, version and description of one plugin, plus the entry point the
/// manager used to construct it.
///
/// Built by the manager before the plugin's initialization handshake and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginIdentifier {
    name: String,
    version: String,
    description: String,
    entry_point: String,
}

impl PluginIdentifier {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        description: impl Into<String>,
        entry_point: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: description.into(),
            entry_point: entry_point.into(),
        }
    }

    /// Builds the identifier for a package from its manifest.
    pub fn from_manifest(manifest: &PluginManifest) -> Self {
        Self::new(
            manifest.name.clone(),
            manifest.version.clone(),
            manifest.description.clone(),
            manifest.entry_point.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// The registry key or library symbol owner this plugin was built from.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }
}
