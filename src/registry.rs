//! Registry client: key and value operations.
//!
//! The registry API can neither create nor delete multi-level paths in one
//! step, so [`WinRegistry::create_key`] searches for the deepest existing
//! ancestor and [`WinRegistry::delete_key_tree`] prunes bottom-up.

use crate::access::{AccessMask, RegistryView};
use crate::api::RegistryApi;
use crate::codec;
use crate::config::ClientConfig;
use crate::error::{RegistryError, Result};
use crate::handle::{HandleManager, OpenKey};
use crate::key::{Entry, KeySnapshot};
use crate::path::KeyPath;
use crate::utils::filetime_to_datetime;
use crate::value::{Value, ValueType};
use std::fmt;
use tracing::{debug, instrument};

/// Client for one (local or remote) registry.
///
/// Operations are blocking and single-threaded; use one client per thread.
/// The cached root connection is released by [`close`](WinRegistry::close)
/// or when the client is dropped.
///
/// # Examples
///
/// ```no_run
/// # use winregistry::{RegistryApi, ValueType, WinRegistry};
/// # fn demo<A: RegistryApi>(api: A) -> winregistry::Result<()> {
/// let registry = WinRegistry::new(api);
/// registry.create_key("HKCU\\Software\\Vendor\\App")?;
/// registry.write_entry("HKCU\\Software\\Vendor\\App", "Retries", 3u32, ValueType::Dword)?;
///
/// let key = registry.read_key("HKCU\\Software\\Vendor\\App")?;
/// for entry in &key.entries {
///     println!("{} = {}", entry.name, entry.value);
/// }
/// # Ok(())
/// # }
/// ```
pub struct WinRegistry<A: RegistryApi> {
    handles: HandleManager<A>,
    view: RegistryView,
}

impl<A: RegistryApi> WinRegistry<A> {
    /// Creates a client for the local machine in the 64-bit view.
    pub fn new(api: A) -> Self {
        Self::with_config(api, ClientConfig::default())
    }

    /// Creates a client from explicit settings.
    pub fn with_config(api: A, config: ClientConfig) -> Self {
        Self {
            handles: HandleManager::new(api, config.host),
            view: config.view,
        }
    }

    /// Remote host, if any.
    pub fn host(&self) -> Option<&str> {
        self.handles.host()
    }

    /// Registry view used by every operation.
    pub fn view(&self) -> RegistryView {
        self.view
    }

    /// Switches the registry view for subsequent operations.
    pub fn set_view(&mut self, view: RegistryView) {
        self.view = view;
    }

    /// Handle manager owning the cached connection.
    pub fn handles(&self) -> &HandleManager<A> {
        &self.handles
    }

    /// The underlying registry API.
    pub fn api(&self) -> &A {
        self.handles.api()
    }

    /// Releases the cached connection. Idempotent.
    pub fn close(&self) -> Result<()> {
        self.handles.close()
    }

    fn open(&self, path: &KeyPath, access: AccessMask) -> Result<OpenKey<'_, A>> {
        self.handles.open_node(path, access, self.view)
    }

    fn make_entry(&self, key_path: &str, name: String, data: &[u8], type_code: u32) -> Entry {
        let value_type = ValueType::from_u32(type_code);
        Entry {
            name,
            value: codec::decode(data, value_type),
            value_type,
            key_path: key_path.to_string(),
            host: self.host().map(str::to_string),
        }
    }

    /// Reads a key's subkey names, values and last write time.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key does not exist.
    #[instrument(skip(self))]
    pub fn read_key(&self, path: &str) -> Result<KeySnapshot> {
        let key_path = KeyPath::parse(path)?;
        let mut key = self.open(&key_path, AccessMask::READ)?;

        // Both counts are taken before any index-based enumeration.
        let info = key.info()?;

        let subkeys = (0..info.subkey_count)
            .map(|i| key.subkey_name(i))
            .collect::<Result<Vec<_>>>()?;

        let entries = (0..info.value_count)
            .map(|i| {
                let raw = key.value_at(i)?;
                Ok(self.make_entry(path, raw.name, &raw.data, raw.type_code))
            })
            .collect::<Result<Vec<_>>>()?;

        key.close()?;
        debug!(subkeys = subkeys.len(), values = entries.len(), "Read key");

        Ok(KeySnapshot {
            path: path.to_string(),
            subkeys,
            entries,
            modified_at: filetime_to_datetime(info.last_write_ticks),
        })
    }

    /// Reads one named value.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key or the value does not exist.
    #[instrument(skip(self))]
    pub fn read_entry(&self, path: &str, name: &str) -> Result<Entry> {
        let key_path = KeyPath::parse(path)?;
        let mut key = self.open(&key_path, AccessMask::READ)?;
        let (data, value_type) = key.query_value(name)?;
        key.close()?;
        Ok(self.make_entry(path, name.to_string(), &data, value_type.code()))
    }

    /// Writes a named value to an existing key.
    ///
    /// The value is encoded before the key is opened, so codec errors never
    /// touch the registry.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key does not exist; `TypeMismatch`,
    /// `InvalidElement` or `UnsupportedValue` from the codec.
    #[instrument(skip(self, value))]
    pub fn write_entry(
        &self,
        path: &str,
        name: &str,
        value: impl Into<Value>,
        value_type: ValueType,
    ) -> Result<()> {
        let key_path = KeyPath::parse(path)?;
        let data = codec::encode(&value.into(), value_type)?;
        let mut key = self.open(&key_path, AccessMask::SET)?;
        key.set_value(name, value_type, &data)?;
        key.close()
    }

    /// Removes a named value.
    ///
    /// # Errors
    ///
    /// `NotFound` if the key or the value does not exist.
    #[instrument(skip(self))]
    pub fn delete_entry(&self, path: &str, name: &str) -> Result<()> {
        let key_path = KeyPath::parse(path)?;
        let mut key = self.open(&key_path, AccessMask::SET)?;
        key.delete_value(name)?;
        key.close()
    }

    /// Deletes a leaf key. Never recurses.
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent or the key does not exist, `NotEmpty` if the
    /// key still has subkeys.
    #[instrument(skip(self))]
    pub fn delete_key(&self, path: &str) -> Result<()> {
        let key_path = KeyPath::parse(path)?;
        self.remove_leaf(&key_path)
    }

    fn remove_leaf(&self, path: &KeyPath) -> Result<()> {
        let (parent, leaf) = match (path.parent(), path.leaf()) {
            (Some(parent), Some(leaf)) => (parent, leaf),
            _ => {
                return Err(RegistryError::malformed_path(
                    &path.to_string(),
                    "Cannot delete a root",
                ))
            }
        };
        let mut parent_key = self.open(&parent, AccessMask::WRITE)?;
        parent_key.delete_subkey(leaf)?;
        debug!(path = %path, "Deleted key");
        parent_key.close()
    }

    /// Deletes a key and everything below it, children first.
    ///
    /// Stops at the first failure; the error names the path that failed and
    /// the keys deleted so far stay deleted, so the call can simply be
    /// retried.
    #[instrument(skip(self))]
    pub fn delete_key_tree(&self, path: &str) -> Result<()> {
        let key_path = KeyPath::parse(path)?;
        self.remove_tree(&key_path)
    }

    fn remove_tree(&self, path: &KeyPath) -> Result<()> {
        // Collect every child name before deleting any, so index-based
        // enumeration never races our own deletions.
        let children = {
            let mut key = self.open(path, AccessMask::READ)?;
            let names = key.subkey_names()?;
            key.close()?;
            names
        };

        for child in &children {
            debug!(parent = %path, child = %child, "Descending into subkey");
            self.remove_tree(&path.join(child))?;
        }

        self.remove_leaf(path)
    }

    /// Creates a key together with any missing ancestors.
    ///
    /// Opens the longest existing prefix of `path` with write access and
    /// creates the remaining segments in one call. Succeeds without changes
    /// if the key already exists.
    ///
    /// # Errors
    ///
    /// `NotFound` if not even the root can be opened.
    #[instrument(skip(self))]
    pub fn create_key(&self, path: &str) -> Result<()> {
        let key_path = KeyPath::parse(path)?;

        let mut found = None;
        for depth in (0..=key_path.depth()).rev() {
            let prefix = key_path.prefix(depth);
            match self.open(&prefix, AccessMask::WRITE) {
                Ok(key) => {
                    found = Some((depth, key));
                    break;
                }
                Err(e) if e.is_not_found() => {
                    debug!(prefix = %prefix, "Ancestor does not exist");
                }
                Err(e) => return Err(e),
            }
        }

        let (depth, mut ancestor) =
            found.ok_or_else(|| RegistryError::not_found("ancestor of key", path))?;

        let tail = key_path.tail(depth);
        if tail.is_empty() {
            debug!("Key already exists");
        } else {
            debug!(ancestor = %ancestor.path(), tail = %tail, "Creating missing keys");
            let access = AccessMask::WRITE.with_view(self.view);
            let mut created = ancestor.create_subkey(&tail, access)?;
            created.close()?;
        }
        ancestor.close()
    }
}

impl<A: RegistryApi> fmt::Debug for WinRegistry<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WinRegistry")
            .field("handles", &self.handles)
            .field("view", &self.view)
            .finish()
    }
}
