//! Loading plugins from dynamic libraries.
//!
//! A plugin crate built as a `cdylib` exports two symbols through
//! [`export_plugin!`](crate::export_plugin): `plugin_api_version`, checked
//! against [`API_VERSION`], and `create_plugin`, which hands back a boxed,
//! uninitialized plugin.

use crate::error::PluginError;
use crate::plugin::Plugin;
use crate::API_VERSION;
use libloading::{Library, Symbol};
use std::path::Path;
use tracing::debug;

/// Symbol returning a `*mut dyn Plugin`, or null if construction failed.
pub const CREATE_PLUGIN_SYMBOL: &[u8] = b"create_plugin";

/// Symbol returning the API version the library was compiled against.
pub const API_VERSION_SYMBOL: &[u8] = b"plugin_api_version";

/// A plugin instance together with the library its code lives in.
///
/// The library has to outlive the instance; [`into_parts`](Self::into_parts)
/// returns them in drop order.
pub struct DynamicPlugin {
    plugin: Box<dyn Plugin>,
    library: Library,
}

impl DynamicPlugin {
    pub fn into_parts(self) -> (Box<dyn Plugin>, Library) {
        (self.plugin, self.library)
    }
}

/// Opens the library at `path` and constructs the plugin it exports.
pub fn load_dynamic_plugin(path: &Path) -> Result<DynamicPlugin, PluginError> {
    debug!("Loading plugin library from: {}", path.display());

    let library = unsafe {
        Library::new(path).map_err(|e| {
            PluginError::InitializationFailed(format!("Failed to load library: {}", e))
        })?
    };

    let plugin = {
        let api_version: Symbol<unsafe extern "C" fn() -> u32> = unsafe {
            library.get(API_VERSION_SYMBOL).map_err(|e| {
                PluginError::InitializationFailed(format!(
                    "Failed to find plugin_api_version function: {}",
                    e
                ))
            })?
        };

        let version = unsafe { api_version() };
        if version != API_VERSION {
            return Err(PluginError::InitializationFailed(format!(
                "{} was built against plugin API {} but the host provides {}",
                path.display(),
                version,
                API_VERSION
            )));
        }

        let create_plugin: Symbol<unsafe extern "C" fn() -> *mut dyn Plugin> = unsafe {
            library.get(CREATE_PLUGIN_SYMBOL).map_err(|e| {
                PluginError::InitializationFailed(format!(
                    "Failed to find create_plugin function: {}",
                    e
                ))
            })?
        };

        let plugin_ptr = unsafe { create_plugin() };
        if plugin_ptr.is_null() {
            return Err(PluginError::InitializationFailed(
                "create_plugin returned null pointer".to_string(),
            ));
        }

        unsafe { Box::from_raw(plugin_ptr) }
    };

    Ok(DynamicPlugin { plugin, library })
}

/// Exports the `create_plugin` and `plugin_api_version` symbols for a
/// plugin type with a `new()` constructor.
///
/// ```rust,ignore
/// plugin_core::export_plugin!(GreeterPlugin);
/// ```
#[macro_export]
macro_rules! export_plugin {
    ($plugin_type:ty) => {
        /// Plugin API version this library was compiled against.
        #[no_mangle]
        pub extern "C" fn plugin_api_version() -> u32 {
            $crate::API_VERSION
        }

        /// Creates a boxed plugin instance for the host.
        ///
        /// # Safety
        ///
        /// The host takes ownership of the returned pointer and must keep the
        /// library loaded for as long as the instance lives.
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub unsafe extern "C" fn create_plugin() -> *mut dyn $crate::Plugin {
            // Panics must not unwind across the FFI boundary.
            match ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| {
                let plugin: ::std::boxed::Box<dyn $crate::Plugin> =
                    ::std::boxed::Box::new(<$plugin_type>::new());
                ::std::boxed::Box::into_raw(plugin)
            })) {
                Ok(plugin_ptr) => plugin_ptr,
                Err(panic_info) => {
                    eprintln!("Plugin creation panicked: {:?}", panic_info);
                    ::std::ptr::null_mut::<$plugin_type>() as *mut dyn $crate::Plugin
                }
            }
        }
    };
}
