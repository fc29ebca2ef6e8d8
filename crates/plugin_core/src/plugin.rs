//! The contract every plugin implements.
//!
//! A plugin embeds a [`PluginBase`] and hands it out through [`Plugin::base`].
//! The manager stamps the base with the plugin's [`PluginIdentifier`] and
//! [`IsolatedLoader`] exactly once; from then on the read accessors on
//! [`PluginExt`] are available on every plugin without the plugin writing
//! them itself.
//!
//! ```rust,no_run
//! use plugin_core::{async_trait, Plugin, PluginBase, PluginError, PluginExt};
//!
//! #[derive(Default)]
//! struct Motd {
//!     base: PluginBase,
//! }
//!
//! #[async_trait]
//! impl Plugin for Motd {
//!     fn base(&self) -> &PluginBase {
//!         &self.base
//!     }
//!
//!     async fn on_enable(&mut self) -> Result<(), PluginError> {
//!         if let Some(server) = self.server() {
//!             println!("{} {} running on {}", self.name(), self.version(), server.name());
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crate::error::PluginError;
use crate::handle::{GameServer, ServerHandle};
use crate::identifier::PluginIdentifier;
use crate::loader::{IsolatedLoader, ResourceStream};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Lifecycle hooks of a plugin.
///
/// The manager calls each hook at most once, always in the order
/// `on_load`, `on_enable`, `on_disable`. All hooks default to doing nothing,
/// so a plugin overrides only what it needs. An error (or a panic) moves the
/// plugin to the failed state without affecting other plugins.
#[async_trait]
pub trait Plugin: AsAny + Send + Sync + 'static {
    /// The embedded base holding this plugin's identity.
    fn base(&self) -> &PluginBase;

    /// Called once after the identity is assigned. Other plugins may not be
    /// loaded yet.
    async fn on_load(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called once after the host's subsystems are up; the host server is
    /// reachable through [`PluginExt::server`] from here on.
    async fn on_enable(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Called once before the host shuts down. Release anything acquired in
    /// `on_enable` here.
    async fn on_disable(&mut self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// Access to the concrete type behind a `dyn Plugin`.
///
/// Implemented for every `'static` type. Plugins use it through
/// `<dyn Plugin>::downcast_ref`.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Plugin {
    /// The plugin as its concrete type, if it is a `T`.
    pub fn downcast_ref<T: Plugin>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

struct PluginBinding {
    identifier: Arc<PluginIdentifier>,
    loader: Arc<IsolatedLoader>,
    handle: &'static ServerHandle,
}

/// Identity storage shared by all plugins.
///
/// Identifier, loader and server handle live in one write-once cell, so they
/// are either all unset or all set. Only the manager can fill the cell.
pub struct PluginBase {
    binding: OnceCell<PluginBinding>,
    reinit_attempts: AtomicUsize,
}

impl PluginBase {
    pub fn new() -> Self {
        Self {
            binding: OnceCell::new(),
            reinit_attempts: AtomicUsize::new(0),
        }
    }

    /// Assigns the plugin's identity and the host's server handle.
    ///
    /// A second call is a no-op: the first binding stays in place, a warning
    /// naming the plugin is logged and a [`PluginError::Reinitialization`] is
    /// returned.
    pub(crate) fn initialize(
        &self,
        identifier: Arc<PluginIdentifier>,
        loader: Arc<IsolatedLoader>,
        handle: &'static ServerHandle,
    ) -> Result<(), PluginError> {
        let attempted = identifier.name().to_string();
        let binding = PluginBinding {
            identifier,
            loader,
            handle,
        };
        match self.binding.set(binding) {
            Ok(()) => {
                debug!("Plugin {} initialized", attempted);
                Ok(())
            }
            Err(_) => {
                self.reinit_attempts.fetch_add(1, Ordering::Relaxed);
                let current = self.name().to_string();
                warn!("{} had a reinitialization attempt", current);
                debug!("Rejected identity for {} was {}", current, attempted);
                Err(PluginError::Reinitialization { plugin: current })
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.binding.get().is_some()
    }

    pub fn identifier(&self) -> Option<&PluginIdentifier> {
        self.binding.get().map(|binding| binding.identifier.as_ref())
    }

    pub fn loader(&self) -> Option<&IsolatedLoader> {
        self.binding.get().map(|binding| binding.loader.as_ref())
    }

    /// Name from the identifier, or `""` before initialization.
    pub fn name(&self) -> &str {
        self.identifier().map(PluginIdentifier::name).unwrap_or_default()
    }

    /// How many rejected identity assignments this plugin has seen.
    pub fn reinitialization_attempts(&self) -> usize {
        self.reinit_attempts.load(Ordering::Relaxed)
    }

    /// The handle injected at initialization.
    ///
    /// Before that, the singleton of the copy of this crate the plugin was
    /// compiled against, which for a dynamic library is never bound.
    pub fn handle(&self) -> &'static ServerHandle {
        self.binding
            .get()
            .map(|binding| binding.handle)
            .unwrap_or_else(ServerHandle::get_instance)
    }
}

impl Default for PluginBase {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PluginBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginBase")
            .field("identifier", &self.identifier())
            .field("loader", &self.loader())
            .field("reinit_attempts", &self.reinitialization_attempts())
            .finish()
    }
}

/// Read accessors available on every plugin.
///
/// Identity accessors require the plugin to be initialized; before that they
/// return `None` or an empty string. The manager never exposes a plugin to
/// other code before its identity is assigned.
pub trait PluginExt {
    fn identifier(&self) -> Option<&PluginIdentifier>;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn version(&self) -> &str;

    /// The running host server, through the injected server handle.
    fn server(&self) -> Option<Arc<dyn GameServer>>;

    /// Opens a resource from the plugin's own package.
    fn resource(&self, name: &str) -> Option<ResourceStream>;

    /// The host's server handle singleton, as injected by the manager.
    fn handle(&self) -> &'static ServerHandle;
}

impl<T: Plugin + ?Sized> PluginExt for T {
    fn identifier(&self) -> Option<&PluginIdentifier> {
        self.base().identifier()
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn description(&self) -> &str {
        self.base()
            .identifier()
            .map(PluginIdentifier::description)
            .unwrap_or_default()
    }

    fn version(&self) -> &str {
        self.base()
            .identifier()
            .map(PluginIdentifier::version)
            .unwrap_or_default()
    }

    fn server(&self) -> Option<Arc<dyn GameServer>> {
        self.base().handle().game_server()
    }

    fn resource(&self, name: &str) -> Option<ResourceStream> {
        self.base().loader()?.get_resource(name)
    }

    fn handle(&self) -> &'static ServerHandle {
        self.base().handle()
    }
}
