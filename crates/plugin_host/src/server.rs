//! The host server plugins see through the server handle.

use plugin_core::GameServer;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug)]
pub struct HostServer {
    name: String,
    started_at: Instant,
    running: AtomicBool,
}

impl HostServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started_at: Instant::now(),
            running: AtomicBool::new(false),
        }
    }

    /// Marks the server as running. Returns `false` if it already was.
    pub fn start(&self) -> bool {
        let started = !self.running.swap(true, Ordering::SeqCst);
        if started {
            info!("🚀 {} is running", self.name);
        }
        started
    }

    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("🛑 {} stopped after {:?}", self.name, self.uptime());
        }
    }
}

impl GameServer for HostServer {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
