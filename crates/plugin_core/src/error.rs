//! Error types for the plugin core.

use crate::lifecycle::PluginState;
use std::path::PathBuf;

/// Errors that can occur while loading, initializing or driving plugins.
///
/// None of these are fatal to the host: the manager logs them and moves on
/// to the next plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// Plugin initialization failed during startup
    #[error("Plugin initialization failed: {0}")]
    InitializationFailed(String),
    /// Error returned from one of the plugin's lifecycle hooks
    #[error("Plugin execution error: {0}")]
    ExecutionError(String),
    /// Requested plugin was not found
    #[error("Plugin not found: {0}")]
    NotFound(String),
    /// Runtime error such as a panic inside a hook
    #[error("Plugin runtime error: {0}")]
    Runtime(String),
    /// A plugin with the same name is already managed
    #[error("Plugin {0} is already loaded")]
    AlreadyLoaded(String),
    /// Identity assignment attempted on an already-initialized plugin
    #[error("{plugin} had a reinitialization attempt")]
    Reinitialization { plugin: String },
    /// The manager tried to move a plugin along an edge the state machine does not have
    #[error("Plugin {plugin} cannot move from {from} to {to}")]
    InvalidTransition {
        plugin: String,
        from: PluginState,
        to: PluginState,
    },
    /// A package's plugin.json could not be read or is incomplete
    #[error("Invalid plugin manifest {}: {reason}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },
    /// No factory is registered under the manifest's entry point
    #[error("No entry point registered for {0}")]
    EntryPointNotFound(String),
    /// The host tried to bind a second server into the handle
    #[error("A game server is already bound to the server handle")]
    ServerAlreadyBound,
}

impl PluginError {
    /// Converts a caught panic payload into a `Runtime` error.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("Plugin panicked: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("Plugin panicked: {}", s)
        } else {
            "Plugin panicked with unknown error".to_string()
        };

        PluginError::Runtime(message)
    }
}
