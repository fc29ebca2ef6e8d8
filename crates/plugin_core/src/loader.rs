//! Per-plugin resource namespaces.
//!
//! Every plugin gets its own [`IsolatedLoader`] rooted at the package it was
//! shipped in. Lookups never cross into another plugin's package, so two
//! plugins can both carry a `config.json` and each sees only its own. A loader
//! may have a parent holding resources the host shares with every plugin; the
//! plugin's own resources are consulted first.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{trace, warn};

/// Where a loader's resources live.
enum ResourceSource {
    /// Files under a package directory on disk
    Directory(PathBuf),
    /// Resources compiled into the host or supplied in memory
    Embedded(HashMap<String, Arc<[u8]>>),
}

/// Resource resolver scoped to a single plugin.
pub struct IsolatedLoader {
    namespace: String,
    source: ResourceSource,
    parent: Option<Arc<IsolatedLoader>>,
}

impl IsolatedLoader {
    /// Creates a loader serving files below `root`.
    pub fn from_directory(namespace: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            namespace: namespace.into(),
            source: ResourceSource::Directory(root.as_ref().to_path_buf()),
            parent: None,
        }
    }

    /// Creates a loader over an in-memory bundle of `(name, bytes)` pairs.
    ///
    /// Entries whose names cannot be normalized are dropped.
    pub fn embedded<I, N, B>(namespace: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (N, B)>,
        N: AsRef<str>,
        B: Into<Vec<u8>>,
    {
        let namespace = namespace.into();
        let mut resources = HashMap::new();
        for (name, bytes) in entries {
            match normalize_resource_name(name.as_ref()) {
                Some(key) => {
                    let bytes: Vec<u8> = bytes.into();
                    resources.insert(key, Arc::from(bytes));
                }
                None => warn!(
                    "Ignoring embedded resource with invalid name '{}' in {}",
                    name.as_ref(),
                    namespace
                ),
            }
        }

        Self {
            namespace,
            source: ResourceSource::Embedded(resources),
            parent: None,
        }
    }

    /// Falls back to `parent` for names this loader does not carry.
    pub fn with_parent(mut self, parent: Arc<IsolatedLoader>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Name of the namespace, normally the owning plugin's name.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Opens a fresh stream over the named resource.
    ///
    /// Returns `None` when neither this loader nor its parent has the resource.
    /// The returned stream owns its handle; dropping it releases the handle.
    pub fn get_resource(&self, name: &str) -> Option<ResourceStream> {
        let Some(key) = normalize_resource_name(name) else {
            trace!("Rejected resource name '{}' in {}", name, self.namespace);
            return None;
        };

        self.open_local(&key)
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.open_local(&key)))
    }

    /// Whether the resource resolves through this loader.
    pub fn contains(&self, name: &str) -> bool {
        let Some(key) = normalize_resource_name(name) else {
            return false;
        };

        self.contains_local(&key)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.contains_local(&key))
    }

    fn contains_local(&self, key: &str) -> bool {
        match &self.source {
            ResourceSource::Directory(root) => root.join(key).is_file(),
            ResourceSource::Embedded(resources) => resources.contains_key(key),
        }
    }

    fn open_local(&self, key: &str) -> Option<ResourceStream> {
        match &self.source {
            ResourceSource::Directory(root) => {
                let path = root.join(key);
                if !path.is_file() {
                    return None;
                }
                match File::open(&path) {
                    Ok(file) => Some(ResourceStream {
                        name: key.to_string(),
                        inner: StreamInner::File(BufReader::new(file)),
                    }),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                    Err(e) => {
                        warn!(
                            "Failed to open resource {} for {}: {}",
                            path.display(),
                            self.namespace,
                            e
                        );
                        None
                    }
                }
            }
            ResourceSource::Embedded(resources) => {
                resources.get(key).map(|bytes| ResourceStream {
                    name: key.to_string(),
                    inner: StreamInner::Memory(Cursor::new(bytes.clone())),
                })
            }
        }
    }
}

impl fmt::Debug for IsolatedLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            ResourceSource::Directory(root) => format!("directory({})", root.display()),
            ResourceSource::Embedded(resources) => format!("embedded({} entries)", resources.len()),
        };
        f.debug_struct("IsolatedLoader")
            .field("namespace", &self.namespace)
            .field("source", &source)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Readable stream over one resource, positioned at its first byte.
pub struct ResourceStream {
    name: String,
    inner: StreamInner,
}

enum StreamInner {
    File(BufReader<File>),
    Memory(Cursor<Arc<[u8]>>),
}

impl ResourceStream {
    /// Normalized name the stream was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the remainder of the stream into a buffer.
    pub fn read_all(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for ResourceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            StreamInner::File(reader) => reader.read(buf),
            StreamInner::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl fmt::Debug for ResourceStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStream").field("name", &self.name).finish()
    }
}

/// Turns a resource name into a `/`-separated path relative to the package.
///
/// Leading separators and `.` segments are dropped; `..` segments, drive
/// prefixes and names that end up empty are rejected.
fn normalize_resource_name(name: &str) -> Option<String> {
    let mut parts = Vec::new();
    for part in name.split(['/', '\\']) {
        match part {
            "" | "." => continue,
            ".." => return None,
            p if p.contains(':') => return None,
            p => parts.push(p),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_resource_name() {
        assert_eq!(normalize_resource_name("config.json").as_deref(), Some("config.json"));
        assert_eq!(normalize_resource_name("/data/./a.txt").as_deref(), Some("data/a.txt"));
        assert_eq!(normalize_resource_name("data\\b.txt").as_deref(), Some("data/b.txt"));
        assert_eq!(normalize_resource_name("../secret"), None);
        assert_eq!(normalize_resource_name("data/../../secret"), None);
        assert_eq!(normalize_resource_name("C:/Windows/win.ini"), None);
        assert_eq!(normalize_resource_name(""), None);
        assert_eq!(normalize_resource_name("///"), None);
    }

    #[test]
    fn test_embedded_resource_lookup() {
        let loader = IsolatedLoader::embedded("alpha", [("config.json", b"{\"a\":1}".to_vec())]);

        let stream = loader.get_resource("config.json").expect("resource should exist");
        assert_eq!(stream.name(), "config.json");
        assert_eq!(stream.read_all().unwrap(), b"{\"a\":1}");

        // Each call opens a fresh stream from the start.
        let again = loader.get_resource("/config.json").unwrap();
        assert_eq!(again.read_all().unwrap(), b"{\"a\":1}");

        assert!(loader.get_resource("missing.json").is_none());
        assert!(loader.contains("config.json"));
        assert!(!loader.contains("missing.json"));
    }

    #[test]
    fn test_directory_resource_lookup() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data").join("motd.txt"), "hello").unwrap();

        let loader = IsolatedLoader::from_directory("beta", dir.path());
        let stream = loader.get_resource("data/motd.txt").unwrap();
        assert_eq!(stream.read_all().unwrap(), b"hello");

        // Directories are not resources.
        assert!(loader.get_resource("data").is_none());
        assert!(loader.get_resource("nope.txt").is_none());
    }

    #[test]
    fn test_directory_loader_cannot_escape_root() {
        let outer = tempfile::tempdir().unwrap();
        let root = outer.path().join("package");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(outer.path().join("secret.txt"), "outside").unwrap();

        let loader = IsolatedLoader::from_directory("gamma", &root);
        assert!(loader.get_resource("../secret.txt").is_none());
        assert!(!loader.contains("../secret.txt"));
    }

    #[test]
    fn test_plugin_resources_shadow_shared_resources() {
        let shared = Arc::new(IsolatedLoader::embedded(
            "shared",
            [
                ("config.json", b"shared".to_vec()),
                ("lang/en.txt", b"hello".to_vec()),
            ],
        ));
        let loader = IsolatedLoader::embedded("delta", [("config.json", b"own".to_vec())])
            .with_parent(shared);

        assert_eq!(loader.get_resource("config.json").unwrap().read_all().unwrap(), b"own");
        assert_eq!(loader.get_resource("lang/en.txt").unwrap().read_all().unwrap(), b"hello");
        assert!(loader.contains("lang/en.txt"));
    }

    #[test]
    fn test_same_name_resources_stay_isolated() {
        let first = IsolatedLoader::embedded("first", [("config.json", b"one".to_vec())]);
        let second = IsolatedLoader::embedded("second", [("config.json", b"two".to_vec())]);

        assert_eq!(first.get_resource("config.json").unwrap().read_all().unwrap(), b"one");
        assert_eq!(second.get_resource("config.json").unwrap().read_all().unwrap(), b"two");
    }
}
