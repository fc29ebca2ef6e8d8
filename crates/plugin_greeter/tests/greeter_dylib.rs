//! Loads the greeter from its built `cdylib` through a package manifest.
//!
//! The library is looked up next to the test binary. Builds that did not
//! produce it skip these tests.

use plugin_core::{GameServer, PluginExt, PluginManager, PluginState, ServerHandle};
use std::any::Any;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

struct Lobby;

impl GameServer for Lobby {
    fn name(&self) -> &str {
        "Lobby"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn is_running(&self) -> bool {
        true
    }

    fn uptime(&self) -> Duration {
        Duration::ZERO
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The greeter library cargo built for this test run, if any.
fn built_library() -> Option<PathBuf> {
    let deps = std::env::current_exe().ok()?.parent()?.to_path_buf();
    let file_name = format!("{}plugin_greeter{}", DLL_PREFIX, DLL_SUFFIX);

    if let Some(profile) = deps.parent() {
        let uplifted = profile.join(&file_name);
        if uplifted.is_file() {
            return Some(uplifted);
        }
    }

    let prefix = format!("{}plugin_greeter", DLL_PREFIX);
    std::fs::read_dir(&deps)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(DLL_SUFFIX))
        })
}

/// Writes a greeter package under `root/dir` that points at its own copy of `library`.
fn install_dylib_package(root: &Path, dir: &str, library: &Path) -> PathBuf {
    let package = root.join(dir);
    std::fs::create_dir_all(&package).unwrap();

    let file_name = format!("{}greeter_{}{}", DLL_PREFIX, dir, DLL_SUFFIX);
    std::fs::copy(library, package.join(&file_name)).unwrap();

    let mut manifest: serde_json::Value =
        serde_json::from_str(include_str!("../package/plugin.json")).unwrap();
    manifest["library"] = serde_json::Value::String(file_name);
    std::fs::write(
        package.join("plugin.json"),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
    std::fs::write(
        package.join("config.json"),
        include_str!("../package/config.json"),
    )
    .unwrap();

    package
}

macro_rules! require_library {
    () => {
        match built_library() {
            Some(library) => library,
            None => {
                eprintln!("plugin_greeter library not found next to the test binary, skipping");
                return;
            }
        }
    };
}

#[tokio::test]
async fn test_greeter_library_runs_through_its_lifecycle() {
    let library = require_library!();
    let _ = ServerHandle::get_instance().bind(Arc::new(Lobby));

    let dir = tempfile::tempdir().unwrap();
    install_dylib_package(dir.path(), "greeter", &library);
    let manager = PluginManager::new(dir.path());

    assert_eq!(manager.load_all_plugins().await.unwrap(), vec!["greeter"]);
    let injected = manager
        .inspect("greeter", |p| std::ptr::eq(p.handle(), ServerHandle::get_instance()))
        .await;
    assert_eq!(injected, Some(true));

    // Enabling fails unless the library's code reaches the host's server.
    assert_eq!(manager.enable_all().await, vec!["greeter"]);
    assert_eq!(manager.state_of("greeter").await, Some(PluginState::Enabled));

    assert_eq!(manager.disable_all().await, vec!["greeter"]);
    assert_eq!(manager.state_of("greeter").await, Some(PluginState::Disabled));
}

#[tokio::test]
async fn test_duplicate_library_packages_keep_the_first() {
    let library = require_library!();
    let _ = ServerHandle::get_instance().bind(Arc::new(Lobby));

    let dir = tempfile::tempdir().unwrap();
    let first = install_dylib_package(dir.path(), "a", &library);
    install_dylib_package(dir.path(), "b", &library);
    let manager = PluginManager::new(dir.path());

    assert_eq!(manager.load_all_plugins().await.unwrap(), vec!["greeter"]);
    assert_eq!(manager.loaded_plugins().await, vec!["greeter"]);
    let info = manager.plugin_info("greeter").await.unwrap();
    assert_eq!(info.path.as_deref(), Some(first.as_path()));

    assert_eq!(manager.enable_all().await, vec!["greeter"]);
    assert_eq!(manager.disable_all().await, vec!["greeter"]);
    drop(manager);
}
