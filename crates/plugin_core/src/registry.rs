//! Entry-point resolution for plugins linked into the host.

use crate::error::PluginError;
use crate::plugin::Plugin;
use dashmap::DashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

type PluginConstructor = dyn Fn() -> Box<dyn Plugin> + Send + Sync;

/// Maps entry-point names from `plugin.json` to constructors.
///
/// Every call to [`instantiate`](Self::instantiate) builds a fresh,
/// uninitialized plugin instance.
#[derive(Default)]
pub struct EntryPointRegistry {
    factories: DashMap<String, Arc<PluginConstructor>>,
}

impl EntryPointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `entry_point`, replacing any earlier factory.
    pub fn register<F, P>(&self, entry_point: impl Into<String>, factory: F)
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Plugin,
    {
        let entry_point = entry_point.into();
        let constructor: Arc<PluginConstructor> =
            Arc::new(move || Box::new(factory()) as Box<dyn Plugin>);

        if self.factories.insert(entry_point.clone(), constructor).is_some() {
            warn!("Entry point {} was registered twice; keeping the latest", entry_point);
        } else {
            debug!("Registered entry point {}", entry_point);
        }
    }

    pub fn contains(&self, entry_point: &str) -> bool {
        self.factories.contains_key(entry_point)
    }

    /// Registered entry-point names, sorted.
    pub fn entry_points(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Builds a new instance of the plugin registered under `entry_point`.
    ///
    /// A panicking constructor is reported as `InitializationFailed`.
    pub fn instantiate(&self, entry_point: &str) -> Result<Box<dyn Plugin>, PluginError> {
        // Clone out of the map so the shard lock is not held while plugin code runs.
        let constructor = self
            .factories
            .get(entry_point)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| PluginError::EntryPointNotFound(entry_point.to_string()))?;

        catch_unwind(AssertUnwindSafe(|| constructor())).map_err(|payload| {
            PluginError::InitializationFailed(format!(
                "Constructor for {} failed: {}",
                entry_point,
                PluginError::from_panic(payload)
            ))
        })
    }
}
