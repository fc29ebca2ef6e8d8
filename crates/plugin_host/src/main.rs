//! Horizon plugin host.
//!
//! Loads configuration, binds the host server into the plugin server handle,
//! then brings plugins up and, on a shutdown signal, back down.

mod cli;
mod config;
mod logging;
mod server;
mod signals;

use anyhow::{anyhow, Context};
use plugin_core::{EntryPointRegistry, IsolatedLoader, PluginManager, ServerHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use cli::CliArgs;
use config::AppConfig;
use server::HostServer;

pub struct Application {
    config: AppConfig,
    server: Arc<HostServer>,
    plugins: Arc<PluginManager>,
}

impl Application {
    /// Loads configuration, applies CLI overrides and installs logging.
    pub async fn new(args: CliArgs) -> anyhow::Result<Self> {
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(plugin_dir) = args.plugin_dir {
            config.plugins.directory = plugin_dir.to_string_lossy().to_string();
        }

        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        config
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        logging::setup_logging(&config.logging)?;
        display_banner();
        info!(
            "📂 Config: {} | Plugins: {}",
            args.config_path.display(),
            config.plugins.directory
        );

        Self::from_config(config)
    }

    /// Builds the host server and plugin manager.
    ///
    /// The server is bound into the handle here, before any plugin exists.
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let server = Arc::new(HostServer::new(config.server.name.clone()));
        ServerHandle::get_instance()
            .bind(server.clone())
            .context("Failed to bind the host server")?;

        let registry = Arc::new(EntryPointRegistry::new());
        plugin_greeter::register(&registry);

        let mut plugins = PluginManager::new(config.plugin_directory())
            .with_registry(registry)
            .with_whitelist(config.plugins.whitelist.clone());

        if let Some(shared) = &config.plugins.shared_resources {
            plugins = plugins.with_shared_resources(Arc::new(IsolatedLoader::from_directory(
                "shared", shared,
            )));
        }

        Ok(Self {
            config,
            server,
            plugins: Arc::new(plugins),
        })
    }

    /// Loads plugins, marks the server running, then enables them.
    pub async fn start(&self) -> anyhow::Result<()> {
        if self.config.plugins.auto_load {
            let loaded = self.plugins.load_all_plugins().await?;
            info!("🔌 Loaded plugins: {:?}", loaded);
        } else {
            info!("🔌 Plugin auto-load is disabled");
        }

        self.server.start();

        let enabled = self.plugins.enable_all().await;
        let stats = self.plugins.stats().await;
        info!(
            "✅ {} of {} plugins enabled",
            enabled.len(),
            stats.total_plugins
        );
        if stats.failed > 0 {
            warn!("{} plugins failed; see errors above", stats.failed);
        }

        Ok(())
    }

    /// Disables plugins in reverse load order, then stops the server.
    pub async fn shutdown(&self) {
        let disabled = self.plugins.disable_all().await;
        info!("🔌 Disabled plugins: {:?}", disabled);
        self.server.stop();
    }

    pub async fn run(self) -> anyhow::Result<()> {
        info!("🌟 Starting Horizon plugin host");
        self.start().await?;

        let status_handle = (self.config.server.status_interval_secs > 0).then(|| {
            let plugins = self.plugins.clone();
            let period = Duration::from_secs(self.config.server.status_interval_secs);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                interval.tick().await;
                loop {
                    interval.tick().await;
                    let stats = plugins.stats().await;
                    info!(
                        "📊 Plugins - {} enabled | {} loaded | {} failed",
                        stats.enabled, stats.loaded, stats.failed
                    );
                }
            })
        });

        info!("🛑 Press Ctrl+C to gracefully shutdown");
        signals::wait_for_shutdown().await?;
        info!("🛑 Shutdown signal received, initiating graceful shutdown...");

        if let Some(handle) = status_handle {
            handle.abort();
        }
        self.shutdown().await;

        info!("👋 Horizon plugin host shutdown complete");
        Ok(())
    }
}

fn display_banner() {
    let version = env!("CARGO_PKG_VERSION");
    info!("╔══════════════════════════════════════════╗");
    info!("║            🌟 HORIZON HOST 🌟            ║");
    info!("║              plugin host v{}          ║", version);
    info!("╚══════════════════════════════════════════╝");
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let app = Application::new(args).await?;
    app.run().await
}
