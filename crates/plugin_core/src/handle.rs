//! Process-wide bridge from plugins to the running host server.

use crate::error::PluginError;
use once_cell::sync::{Lazy, OnceCell};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Read-only view of the host server that plugins are allowed to see.
///
/// The host implements this for its concrete server type. Plugins that are
/// compiled against the host can recover the concrete type via [`as_any`].
///
/// [`as_any`]: GameServer::as_any
pub trait GameServer: Send + Sync + 'static {
    /// Display name of the server instance
    fn name(&self) -> &str;

    /// Version of the host software
    fn version(&self) -> &str;

    /// Whether the host finished starting and has not begun shutting down
    fn is_running(&self) -> bool;

    /// Time since the host started
    fn uptime(&self) -> Duration;

    fn as_any(&self) -> &dyn Any;
}

static INSTANCE: Lazy<ServerHandle> = Lazy::new(|| {
    debug!("Creating server handle");
    ServerHandle {
        server: OnceCell::new(),
    }
});

/// The single handle every plugin uses to reach the host server.
///
/// There is exactly one per process. It is created on first access and never
/// reset. The server it points at is bound once by the host, before any plugin
/// is loaded, and cannot be replaced afterwards.
///
/// A plugin built as a dynamic library links its own copy of this crate, and
/// with it a second, never-bound `INSTANCE`. Plugins therefore reach the handle
/// the manager injected at initialization through [`PluginExt::handle`],
/// not through [`get_instance`](Self::get_instance).
///
/// [`PluginExt::handle`]: crate::PluginExt::handle
pub struct ServerHandle {
    server: OnceCell<Arc<dyn GameServer>>,
}

impl ServerHandle {
    /// Returns the process-wide handle, creating it on first call.
    pub fn get_instance() -> &'static ServerHandle {
        &INSTANCE
    }

    /// The currently running host server.
    ///
    /// `None` only if the host has not bound its server yet; hosts bind before
    /// loading plugins, so plugins may treat `None` as a host bug.
    pub fn game_server(&self) -> Option<Arc<dyn GameServer>> {
        self.server.get().cloned()
    }

    pub fn is_bound(&self) -> bool {
        self.server.get().is_some()
    }

    /// Binds the host's server into the handle.
    ///
    /// Only the first call has an effect; any later call leaves the live
    /// server in place and returns [`PluginError::ServerAlreadyBound`].
    pub fn bind(&self, server: Arc<dyn GameServer>) -> Result<(), PluginError> {
        let name = server.name().to_string();
        match self.server.set(server) {
            Ok(()) => {
                info!("Server handle bound to {}", name);
                Ok(())
            }
            Err(_) => {
                warn!("Rejected attempt to rebind server handle to {}", name);
                Err(PluginError::ServerAlreadyBound)
            }
        }
    }
}

impl fmt::Debug for ServerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerHandle")
            .field("server", &self.server.get().map(|server| server.name().to_string()))
            .finish()
    }
}
