//! Greeter sample plugin.
//!
//! Reads its messages from the `config.json` shipped in its own package,
//! greets the host server when enabled and says goodbye when disabled.
//! The crate builds both as a `cdylib`, for hosts that load it from disk,
//! and as an `rlib` the host can link and [`register`].

use plugin_core::{
    async_trait, export_plugin, EntryPointRegistry, Plugin, PluginBase, PluginError, PluginExt,
};
use serde::Deserialize;
use tracing::{debug, info};

/// Entry point named in the package's `plugin.json`.
pub const ENTRY_POINT: &str = "plugin_greeter::GreeterPlugin";

const CONFIG_RESOURCE: &str = "config.json";

/// Messages the greeter sends. `{plugin}` and `{server}` are substituted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GreeterConfig {
    pub greeting: String,
    pub farewell: String,
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            greeting: "{plugin} says hello to {server}".to_string(),
            farewell: "{plugin} says goodbye to {server}".to_string(),
        }
    }
}

impl GreeterConfig {
    pub fn render(template: &str, plugin: &str, server: &str) -> String {
        template.replace("{plugin}", plugin).replace("{server}", server)
    }
}

pub struct GreeterPlugin {
    base: PluginBase,
    config: GreeterConfig,
    greeted: bool,
}

impl GreeterPlugin {
    pub fn new() -> Self {
        Self {
            base: PluginBase::new(),
            config: GreeterConfig::default(),
            greeted: false,
        }
    }

    pub fn config(&self) -> &GreeterConfig {
        &self.config
    }

    fn server_name(&self) -> Option<String> {
        self.server().map(|server| server.name().to_string())
    }
}

impl Default for GreeterPlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for GreeterPlugin {
    fn base(&self) -> &PluginBase {
        &self.base
    }

    async fn on_load(&mut self) -> Result<(), PluginError> {
        let Some(stream) = self.resource(CONFIG_RESOURCE) else {
            debug!("{} has no {}, using default messages", self.name(), CONFIG_RESOURCE);
            return Ok(());
        };

        self.config = serde_json::from_reader(stream).map_err(|e| {
            PluginError::InitializationFailed(format!(
                "{} has an invalid {}: {}",
                self.name(),
                CONFIG_RESOURCE,
                e
            ))
        })?;
        debug!("{} loaded its messages", self.name());
        Ok(())
    }

    async fn on_enable(&mut self) -> Result<(), PluginError> {
        let server = self.server_name().ok_or_else(|| {
            PluginError::ExecutionError("no server is bound to greet".to_string())
        })?;

        info!(
            "👋 {}",
            GreeterConfig::render(&self.config.greeting, self.name(), &server)
        );
        self.greeted = true;
        Ok(())
    }

    async fn on_disable(&mut self) -> Result<(), PluginError> {
        if !self.greeted {
            return Ok(());
        }

        let server = self.server_name().unwrap_or_else(|| "the server".to_string());
        info!(
            "👋 {}",
            GreeterConfig::render(&self.config.farewell, self.name(), &server)
        );
        self.greeted = false;
        Ok(())
    }
}

/// Makes the greeter available to hosts that link this crate.
pub fn register(registry: &EntryPointRegistry) {
    registry.register(ENTRY_POINT, GreeterPlugin::new);
}

export_plugin!(GreeterPlugin);
