//! Plugin discovery and lifecycle driving.
//!
//! The manager owns every plugin instance together with the identifier and
//! loader it built for it, and is the only code that moves plugins through
//! their [`PluginState`]s. Loading is split from enabling so the host can
//! bring its own subsystems up in between:
//!
//! 1. [`load_all_plugins`](PluginManager::load_all_plugins): discover
//!    packages, construct each plugin, assign its identity, call `on_load`
//! 2. [`enable_all`](PluginManager::enable_all): call `on_enable`
//! 3. [`disable_all`](PluginManager::disable_all): call `on_disable` in
//!    reverse load order
//!
//! A plugin whose hook fails or panics is marked failed and skipped by later
//! passes; the other plugins carry on.

use crate::dynamic::load_dynamic_plugin;
use crate::error::PluginError;
use crate::handle::ServerHandle;
use crate::identifier::PluginIdentifier;
use crate::lifecycle::PluginState;
use crate::loader::IsolatedLoader;
use crate::manifest::{PluginManifest, MANIFEST_FILE};
use crate::plugin::Plugin;
use crate::registry::EntryPointRegistry;
use crate::API_VERSION;
use futures::FutureExt;
use libloading::Library;
use serde::Serialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Manages plugin instances and drives their lifecycles.
pub struct PluginManager {
    /// Directory scanned for plugin packages
    plugin_directory: PathBuf,
    /// Constructors for entry points linked into the host
    registry: Arc<EntryPointRegistry>,
    /// Resources every plugin can see behind its own
    shared_resources: Option<Arc<IsolatedLoader>>,
    /// If non-empty, only these plugin names are loaded from disk
    whitelist: Vec<String>,
    /// Managed plugins in load order
    plugins: RwLock<Vec<ManagedPlugin>>,
}

/// A plugin instance and everything the manager built for it.
///
/// Built as soon as the instance exists, so an instance and the library its
/// code lives in are only ever dropped together.
struct ManagedPlugin {
    /// Declared before `_library` so the instance is dropped before its code is unloaded.
    plugin: Box<dyn Plugin>,
    identifier: Arc<PluginIdentifier>,
    state: PluginState,
    path: Option<PathBuf>,
    loaded_at: SystemTime,
    _library: Option<Library>,
}

impl ManagedPlugin {
    fn new(
        plugin: Box<dyn Plugin>,
        identifier: PluginIdentifier,
        path: Option<PathBuf>,
        library: Option<Library>,
    ) -> Self {
        Self {
            plugin,
            identifier: Arc::new(identifier),
            state: PluginState::Constructed,
            path,
            loaded_at: SystemTime::now(),
            _library: library,
        }
    }

    fn name(&self) -> &str {
        self.identifier.name()
    }

    fn info(&self) -> PluginInfo {
        PluginInfo {
            name: self.identifier.name().to_string(),
            version: self.identifier.version().to_string(),
            description: self.identifier.description().to_string(),
            entry_point: self.identifier.entry_point().to_string(),
            state: self.state,
            path: self.path.clone(),
            loaded_at: self.loaded_at,
        }
    }

    /// Runs the hook that leads to `target` and records the outcome.
    async fn advance(&mut self, target: PluginState) -> Result<(), PluginError> {
        let name = self.name().to_string();
        self.state.transition(target, &name)?;

        let result = match target {
            PluginState::Loaded => run_hook(self.plugin.on_load()).await,
            PluginState::Enabled => run_hook(self.plugin.on_enable()).await,
            PluginState::Disabled => run_hook(self.plugin.on_disable()).await,
            _ => Ok(()),
        };

        match result {
            Ok(()) => {
                debug!("Plugin {} is now {}", name, target);
                self.state = target;
                Ok(())
            }
            Err(e) => {
                self.state = PluginState::Failed;
                Err(e)
            }
        }
    }
}

/// Awaits a lifecycle hook, turning a panic into a `Runtime` error.
async fn run_hook<F>(hook: F) -> Result<(), PluginError>
where
    F: Future<Output = Result<(), PluginError>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(PluginError::from_panic(payload)),
    }
}

impl PluginManager {
    /// Creates a manager scanning `plugin_directory` with an empty entry-point registry.
    pub fn new(plugin_directory: impl AsRef<Path>) -> Self {
        Self {
            plugin_directory: plugin_directory.as_ref().to_path_buf(),
            registry: Arc::new(EntryPointRegistry::new()),
            shared_resources: None,
            whitelist: Vec::new(),
            plugins: RwLock::new(Vec::new()),
        }
    }

    pub fn with_registry(mut self, registry: Arc<EntryPointRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Gives every plugin loaded from disk `shared` as its parent loader.
    pub fn with_shared_resources(mut self, shared: Arc<IsolatedLoader>) -> Self {
        self.shared_resources = Some(shared);
        self
    }

    pub fn with_whitelist(mut self, whitelist: Vec<String>) -> Self {
        self.whitelist = whitelist;
        self
    }

    pub fn registry(&self) -> Arc<EntryPointRegistry> {
        self.registry.clone()
    }

    pub fn plugin_directory(&self) -> &Path {
        &self.plugin_directory
    }

    /// Takes ownership of `plugin`, assigns its identity and calls `on_load`.
    ///
    /// Fails with `AlreadyLoaded` if a plugin with the same name is managed,
    /// and with `Reinitialization` if `plugin` already carries an identity;
    /// either way the instance is dropped unregistered. If `on_load` fails
    /// the plugin stays registered in the failed state.
    pub async fn load_plugin(
        &self,
        plugin: Box<dyn Plugin>,
        identifier: PluginIdentifier,
        loader: IsolatedLoader,
    ) -> Result<(), PluginError> {
        self.install(ManagedPlugin::new(plugin, identifier, None, None), Arc::new(loader))
            .await
    }

    async fn install(
        &self,
        mut managed: ManagedPlugin,
        loader: Arc<IsolatedLoader>,
    ) -> Result<(), PluginError> {
        let name = managed.name().to_string();
        let mut plugins = self.plugins.write().await;

        if plugins.iter().any(|p| p.name() == name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        managed.plugin.base().initialize(
            managed.identifier.clone(),
            loader,
            ServerHandle::get_instance(),
        )?;
        managed.advance(PluginState::Initialized).await?;
        managed.loaded_at = SystemTime::now();

        let result = managed.advance(PluginState::Loaded).await;
        match &result {
            Ok(()) => info!(
                "Loaded plugin {} v{}",
                name,
                managed.identifier.version()
            ),
            Err(e) => error!("Plugin {} failed to load: {}", name, e),
        }

        plugins.push(managed);
        result
    }

    /// Lists plugin packages in the plugin directory.
    ///
    /// A missing directory yields an empty list. Packages whose manifest
    /// cannot be read are logged and left out. Results are sorted by
    /// directory name, which is also the load order.
    pub async fn discover_plugins(&self) -> Result<Vec<PluginDiscovery>, PluginError> {
        if !self.plugin_directory.exists() {
            warn!(
                "Plugin directory does not exist: {}",
                self.plugin_directory.display()
            );
            return Ok(Vec::new());
        }

        let mut discoveries = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.plugin_directory)
            .await
            .map_err(|e| {
                PluginError::InitializationFailed(format!("Failed to read plugin directory: {}", e))
            })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            PluginError::InitializationFailed(format!("Failed to read directory entry: {}", e))
        })? {
            let path = entry.path();
            if !path.is_dir() || !path.join(MANIFEST_FILE).is_file() {
                continue;
            }

            match PluginManifest::load(&path).await {
                Ok(manifest) => {
                    let is_loaded = self.state_of(&manifest.name).await.is_some();
                    discoveries.push(PluginDiscovery {
                        path,
                        manifest,
                        is_loaded,
                    });
                }
                Err(e) => warn!("Skipping plugin package: {}", e),
            }
        }

        discoveries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(discoveries)
    }

    /// Discovers and loads every package in the plugin directory.
    ///
    /// Returns the names of the plugins that reached the loaded state.
    pub async fn load_all_plugins(&self) -> Result<Vec<String>, PluginError> {
        let discoveries = self.discover_plugins().await?;
        let mut loaded = Vec::new();
        let mut failed = Vec::new();

        info!(
            "Loading {} discovered plugins from {}",
            discoveries.len(),
            self.plugin_directory.display()
        );

        for discovery in discoveries {
            let name = discovery.manifest.name.clone();
            if discovery.is_loaded {
                debug!("Plugin {} is already loaded, skipping", name);
                continue;
            }
            if !self.whitelist.is_empty() && !self.whitelist.contains(&name) {
                info!("Plugin {} is not whitelisted, skipping", name);
                continue;
            }

            match self.load_package(discovery).await {
                Ok(()) => loaded.push(name),
                Err(e) => {
                    error!("Failed to load plugin {}: {}", name, e);
                    failed.push((name, e));
                }
            }
        }

        if !failed.is_empty() {
            warn!("Failed to load {} plugins", failed.len());
            for (name, error) in &failed {
                warn!("  {}: {}", name, error);
            }
        }

        info!("{} plugins loaded successfully", loaded.len());
        Ok(loaded)
    }

    async fn load_package(&self, discovery: PluginDiscovery) -> Result<(), PluginError> {
        let PluginDiscovery { path, manifest, .. } = discovery;

        if let Some(version) = manifest.api_version {
            if version != API_VERSION {
                warn!(
                    "Plugin {} targets plugin API {} but the host provides {}",
                    manifest.name, version, API_VERSION
                );
            }
        }

        // Checked again under the write lock in `install`; this one keeps a
        // duplicate package from opening its library at all.
        if self.state_of(&manifest.name).await.is_some() {
            return Err(PluginError::AlreadyLoaded(manifest.name));
        }

        let identifier = PluginIdentifier::from_manifest(&manifest);
        let mut loader = IsolatedLoader::from_directory(manifest.name.clone(), &path);
        if let Some(shared) = &self.shared_resources {
            loader = loader.with_parent(shared.clone());
        }

        let managed = match &manifest.library {
            Some(library) => {
                let (plugin, library) = load_dynamic_plugin(&path.join(library))?.into_parts();
                ManagedPlugin::new(plugin, identifier, Some(path), Some(library))
            }
            None => {
                let plugin = self.registry.instantiate(&manifest.entry_point)?;
                ManagedPlugin::new(plugin, identifier, Some(path), None)
            }
        };

        self.install(managed, Arc::new(loader)).await
    }

    /// Calls `on_enable` on every loaded plugin, in load order.
    ///
    /// Returns the names of the plugins that are now enabled.
    pub async fn enable_all(&self) -> Vec<String> {
        let mut plugins = self.plugins.write().await;
        let mut enabled = Vec::new();

        for managed in plugins.iter_mut() {
            if managed.state != PluginState::Loaded {
                continue;
            }
            match managed.advance(PluginState::Enabled).await {
                Ok(()) => {
                    info!("Enabled plugin {}", managed.name());
                    enabled.push(managed.name().to_string());
                }
                Err(e) => error!("Failed to enable plugin {}: {}", managed.name(), e),
            }
        }

        enabled
    }

    /// Calls `on_disable` on every enabled plugin, in reverse load order.
    ///
    /// Returns the names of the plugins that are now disabled.
    pub async fn disable_all(&self) -> Vec<String> {
        let mut plugins = self.plugins.write().await;
        let mut disabled = Vec::new();

        info!("Disabling plugins");
        for managed in plugins.iter_mut().rev() {
            if managed.state != PluginState::Enabled {
                continue;
            }
            match managed.advance(PluginState::Disabled).await {
                Ok(()) => {
                    info!("Disabled plugin {}", managed.name());
                    disabled.push(managed.name().to_string());
                }
                Err(e) => error!("Failed to disable plugin {}: {}", managed.name(), e),
            }
        }

        disabled
    }

    /// Enables a single loaded plugin.
    pub async fn enable_plugin(&self, name: &str) -> Result<(), PluginError> {
        self.advance_plugin(name, PluginState::Enabled).await
    }

    /// Disables a single enabled plugin.
    pub async fn disable_plugin(&self, name: &str) -> Result<(), PluginError> {
        self.advance_plugin(name, PluginState::Disabled).await
    }

    async fn advance_plugin(&self, name: &str, target: PluginState) -> Result<(), PluginError> {
        let mut plugins = self.plugins.write().await;
        let managed = plugins
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;

        managed.advance(target).await.map_err(|e| {
            error!("Plugin {} could not become {}: {}", name, target, e);
            e
        })
    }

    /// Names of all managed plugins, in load order.
    pub async fn loaded_plugins(&self) -> Vec<String> {
        let plugins = self.plugins.read().await;
        plugins.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn state_of(&self, name: &str) -> Option<PluginState> {
        let plugins = self.plugins.read().await;
        plugins.iter().find(|p| p.name() == name).map(|p| p.state)
    }

    pub async fn plugin_info(&self, name: &str) -> Option<PluginInfo> {
        let plugins = self.plugins.read().await;
        plugins.iter().find(|p| p.name() == name).map(ManagedPlugin::info)
    }

    /// Runs `f` against the named plugin instance.
    pub async fn inspect<R>(&self, name: &str, f: impl FnOnce(&dyn Plugin) -> R) -> Option<R> {
        let plugins = self.plugins.read().await;
        plugins
            .iter()
            .find(|p| p.name() == name)
            .map(|p| f(p.plugin.as_ref()))
    }

    pub async fn stats(&self) -> PluginSystemStats {
        let plugins = self.plugins.read().await;
        let count = |state: PluginState| plugins.iter().filter(|p| p.state == state).count();

        PluginSystemStats {
            total_plugins: plugins.len(),
            loaded: count(PluginState::Loaded),
            enabled: count(PluginState::Enabled),
            disabled: count(PluginState::Disabled),
            failed: count(PluginState::Failed),
            plugins: plugins.iter().map(ManagedPlugin::info).collect(),
        }
    }
}

/// A plugin package found in the plugin directory.
#[derive(Debug, Clone)]
pub struct PluginDiscovery {
    pub path: PathBuf,
    pub manifest: PluginManifest,
    pub is_loaded: bool,
}

/// Information about a managed plugin.
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub entry_point: String,
    pub state: PluginState,
    /// Package directory, `None` for plugins handed to `load_plugin` directly
    pub path: Option<PathBuf>,
    pub loaded_at: SystemTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct PluginSystemStats {
    pub total_plugins: usize,
    pub loaded: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub failed: usize,
    pub plugins: Vec<PluginInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{PluginBase, PluginExt};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Quiet {
        base: PluginBase,
    }

    impl Plugin for Quiet {
        fn base(&self) -> &PluginBase {
            &self.base
        }
    }

    struct Fussy {
        base: PluginBase,
        fail_on: &'static str,
    }

    #[async_trait]
    impl Plugin for Fussy {
        fn base(&self) -> &PluginBase {
            &self.base
        }

        async fn on_load(&mut self) -> Result<(), PluginError> {
            if self.fail_on == "load" {
                return Err(PluginError::ExecutionError("load refused".to_string()));
            }
            Ok(())
        }

        async fn on_enable(&mut self) -> Result<(), PluginError> {
            if self.fail_on == "enable" {
                panic!("enable exploded");
            }
            Ok(())
        }
    }

    fn identifier(name: &str) -> PluginIdentifier {
        PluginIdentifier::new(name, "1.0", "test plugin", "test::Plugin")
    }

    fn loader(name: &str) -> IsolatedLoader {
        IsolatedLoader::embedded(name, Vec::<(String, Vec<u8>)>::new())
    }

    #[tokio::test]
    async fn test_plugin_manager_creation() {
        let manager = PluginManager::new("./test_plugins");
        assert!(manager.loaded_plugins().await.is_empty());
        assert_eq!(manager.stats().await.total_plugins, 0);
        assert_eq!(manager.plugin_directory(), Path::new("./test_plugins"));
    }

    #[tokio::test]
    async fn test_load_plugin_assigns_identity() {
        let manager = PluginManager::new("./test_plugins");
        manager
            .load_plugin(Box::new(Quiet::default()), identifier("quiet"), loader("quiet"))
            .await
            .unwrap();

        assert_eq!(manager.state_of("quiet").await, Some(PluginState::Loaded));
        let name = manager.inspect("quiet", |p| p.name().to_string()).await;
        assert_eq!(name.as_deref(), Some("quiet"));

        let info = manager.plugin_info("quiet").await.unwrap();
        assert_eq!(info.version, "1.0");
        assert!(info.path.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_names_are_rejected() {
        let manager = PluginManager::new("./test_plugins");
        manager
            .load_plugin(Box::new(Quiet::default()), identifier("dup"), loader("dup"))
            .await
            .unwrap();

        let result = manager
            .load_plugin(Box::new(Quiet::default()), identifier("dup"), loader("dup"))
            .await;
        assert!(matches!(result, Err(PluginError::AlreadyLoaded(name)) if name == "dup"));
        assert_eq!(manager.loaded_plugins().await.len(), 1);
    }

    #[tokio::test]
    async fn test_prestamped_plugin_is_refused() {
        let plugin = Quiet::default();
        plugin
            .base()
            .initialize(
                Arc::new(identifier("Foo")),
                Arc::new(loader("Foo")),
                ServerHandle::get_instance(),
            )
            .unwrap();

        let manager = PluginManager::new("./test_plugins");
        let result = manager
            .load_plugin(Box::new(plugin), identifier("Evil"), loader("Evil"))
            .await;

        assert!(matches!(result, Err(PluginError::Reinitialization { plugin }) if plugin == "Foo"));
        assert!(manager.loaded_plugins().await.is_empty());
        assert_eq!(manager.state_of("Evil").await, None);
        assert_eq!(manager.state_of("Foo").await, None);
    }

    #[tokio::test]
    async fn test_rejected_duplicate_is_dropped_unregistered() {
        static DROPPED: Mutex<Vec<String>> = Mutex::new(Vec::new());

        struct Tracked {
            base: PluginBase,
            tag: &'static str,
        }

        impl Drop for Tracked {
            fn drop(&mut self) {
                DROPPED.lock().unwrap().push(self.tag.to_string());
            }
        }

        impl Plugin for Tracked {
            fn base(&self) -> &PluginBase {
                &self.base
            }
        }

        let manager = PluginManager::new("./test_plugins");
        let tracked = |tag| Box::new(Tracked { base: PluginBase::new(), tag });
        manager
            .load_plugin(tracked("kept"), identifier("same"), loader("same"))
            .await
            .unwrap();

        let result = manager
            .load_plugin(tracked("rejected"), identifier("same"), loader("same"))
            .await;
        assert!(matches!(result, Err(PluginError::AlreadyLoaded(_))));
        assert_eq!(*DROPPED.lock().unwrap(), vec!["rejected"]);

        drop(manager);
        assert_eq!(*DROPPED.lock().unwrap(), vec!["rejected", "kept"]);
    }

    #[tokio::test]
    async fn test_manager_injects_host_handle() {
        let manager = PluginManager::new("./test_plugins");
        manager
            .load_plugin(Box::new(Quiet::default()), identifier("wired"), loader("wired"))
            .await
            .unwrap();

        let injected = manager
            .inspect("wired", |p| std::ptr::eq(p.handle(), ServerHandle::get_instance()))
            .await;
        assert_eq!(injected, Some(true));
    }

    #[tokio::test]
    async fn test_failing_load_marks_plugin_failed() {
        let manager = PluginManager::new("./test_plugins");
        let result = manager
            .load_plugin(
                Box::new(Fussy { base: PluginBase::new(), fail_on: "load" }),
                identifier("fussy"),
                loader("fussy"),
            )
            .await;

        assert!(matches!(result, Err(PluginError::ExecutionError(_))));
        assert_eq!(manager.state_of("fussy").await, Some(PluginState::Failed));
        assert!(manager.enable_all().await.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_enable_is_isolated() {
        let manager = PluginManager::new("./test_plugins");
        manager
            .load_plugin(
                Box::new(Fussy { base: PluginBase::new(), fail_on: "enable" }),
                identifier("a_fussy"),
                loader("a_fussy"),
            )
            .await
            .unwrap();
        manager
            .load_plugin(Box::new(Quiet::default()), identifier("b_quiet"), loader("b_quiet"))
            .await
            .unwrap();

        let enabled = manager.enable_all().await;
        assert_eq!(enabled, vec!["b_quiet"]);
        assert_eq!(manager.state_of("a_fussy").await, Some(PluginState::Failed));

        let stats = manager.stats().await;
        assert_eq!(stats.enabled, 1);
        assert_eq!(stats.failed, 1);

        assert_eq!(manager.disable_all().await, vec!["b_quiet"]);
        assert_eq!(manager.state_of("b_quiet").await, Some(PluginState::Disabled));
    }

    #[tokio::test]
    async fn test_single_plugin_transitions() {
        let manager = PluginManager::new("./test_plugins");
        manager
            .load_plugin(Box::new(Quiet::default()), identifier("single"), loader("single"))
            .await
            .unwrap();

        // Disabling before enabling skips a state.
        let result = manager.disable_plugin("single").await;
        assert!(matches!(result, Err(PluginError::InvalidTransition { .. })));
        assert_eq!(manager.state_of("single").await, Some(PluginState::Loaded));

        manager.enable_plugin("single").await.unwrap();
        assert!(manager.enable_plugin("single").await.is_err());
        manager.disable_plugin("single").await.unwrap();
        assert_eq!(manager.state_of("single").await, Some(PluginState::Disabled));

        assert!(matches!(
            manager.enable_plugin("ghost").await,
            Err(PluginError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_discovery_of_missing_directory() {
        let manager = PluginManager::new("./definitely_missing_plugin_dir");
        assert!(manager.discover_plugins().await.unwrap().is_empty());
        assert!(manager.load_all_plugins().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_whitelist_filters_packages() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["alpha", "beta"] {
            let package = dir.path().join(name);
            std::fs::create_dir(&package).unwrap();
            std::fs::write(
                package.join(MANIFEST_FILE),
                format!(r#"{{ "name": "{name}", "version": "1.0", "entry_point": "test::Quiet" }}"#),
            )
            .unwrap();
        }

        let registry = Arc::new(EntryPointRegistry::new());
        registry.register("test::Quiet", Quiet::default);

        let manager = PluginManager::new(dir.path())
            .with_registry(registry)
            .with_whitelist(vec!["beta".to_string()]);

        assert_eq!(manager.discover_plugins().await.unwrap().len(), 2);
        assert_eq!(manager.load_all_plugins().await.unwrap(), vec!["beta"]);
        assert_eq!(manager.loaded_plugins().await, vec!["beta"]);
    }

    #[tokio::test]
    async fn test_disable_runs_in_reverse_load_order() {
        static ORDER: Mutex<Vec<String>> = Mutex::new(Vec::new());

        #[derive(Default)]
        struct Recorder {
            base: PluginBase,
        }

        #[async_trait]
        impl Plugin for Recorder {
            fn base(&self) -> &PluginBase {
                &self.base
            }

            async fn on_disable(&mut self) -> Result<(), PluginError> {
                ORDER.lock().unwrap().push(self.name().to_string());
                Ok(())
            }
        }

        let manager = PluginManager::new("./test_plugins");
        for name in ["first", "second", "third"] {
            manager
                .load_plugin(Box::new(Recorder::default()), identifier(name), loader(name))
                .await
                .unwrap();
        }
        manager.enable_all().await;
        manager.disable_all().await;

        assert_eq!(*ORDER.lock().unwrap(), vec!["third", "second", "first"]);
    }
}
