//! # Plugin Core
//!
//! Lifecycle and isolation core for Horizon server plugins. It loads
//! extension modules at runtime, gives each one an isolated resource
//! namespace and a stable identity, and hands every plugin the same narrow
//! handle back into the running server.
//!
//! ## Pieces
//!
//! - [`PluginIdentifier`]: immutable name, version, description and entry point
//! - [`IsolatedLoader`]: per-plugin resource namespace
//! - [`ServerHandle`]: process-wide bridge to the running [`GameServer`]
//! - [`Plugin`] / [`PluginBase`] / [`PluginExt`]: the contract plugins implement
//!   and the accessors they get for free
//! - [`PluginState`]: the lifecycle state machine
//! - [`PluginManager`]: discovery, the identity handshake, and lifecycle driving
//!
//! ## Lifecycle
//!
//! ```text
//! Constructed --identity--> Initialized --on_load--> Loaded
//!     --on_enable--> Enabled --on_disable--> Disabled
//! ```
//!
//! The manager assigns each plugin's identity exactly once. Later attempts are
//! rejected, logged, and reported as [`PluginError::Reinitialization`], so a
//! plugin can never re-stamp itself as another plugin.
//!
//! ## Writing a plugin
//!
//! ```rust,no_run
//! use plugin_core::*;
//!
//! struct Motd {
//!     base: PluginBase,
//! }
//!
//! impl Motd {
//!     fn new() -> Self {
//!         Self { base: PluginBase::new() }
//!     }
//! }
//!
//! #[async_trait]
//! impl Plugin for Motd {
//!     fn base(&self) -> &PluginBase {
//!         &self.base
//!     }
//!
//!     async fn on_enable(&mut self) -> Result<(), PluginError> {
//!         if let Some(mut motd) = self.resource("motd.txt") {
//!             let mut text = String::new();
//!             std::io::Read::read_to_string(&mut motd, &mut text)
//!                 .map_err(|e| PluginError::ExecutionError(e.to_string()))?;
//!             println!("{}", text);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! // In a cdylib plugin crate:
//! export_plugin!(Motd);
//! ```

pub mod dynamic;
pub mod error;
pub mod handle;
pub mod identifier;
pub mod lifecycle;
pub mod loader;
pub mod manager;
pub mod manifest;
pub mod plugin;
pub mod registry;

pub use async_trait::async_trait;
pub use dynamic::{load_dynamic_plugin, DynamicPlugin};
pub use error::PluginError;
pub use handle::{GameServer, ServerHandle};
pub use identifier::PluginIdentifier;
pub use lifecycle::PluginState;
pub use loader::{IsolatedLoader, ResourceStream};
pub use manager::{PluginDiscovery, PluginInfo, PluginManager, PluginSystemStats};
pub use manifest::{PluginManifest, MANIFEST_FILE};
pub use plugin::{Plugin, PluginBase, PluginExt};
pub use registry::EntryPointRegistry;

/// Version of the plugin API exposed to plugins.
///
/// Dynamic libraries built against a different version are refused.
pub const API_VERSION: u32 = 1;
