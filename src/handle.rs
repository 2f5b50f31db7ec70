//! Handle lifetime management.
//!
//! [`OpenKey`] owns one open key handle and releases it exactly once, either
//! through [`OpenKey::close`] or when dropped. [`HandleManager`] owns the
//! cached root connection of one client.
//!
//! # Connection caching
//!
//! At most one connection is cached. It is reused while requests target the
//! same root and replaced (old one closed first) when the root changes. The
//! slot lives in a `RefCell`, so a manager can be shared by reference within
//! one thread but is never `Sync`.

use crate::access::{AccessMask, RegistryView};
use crate::api::{Hkey, KeyInfo, RawValue, RegistryApi};
use crate::error::{RegistryError, Result};
use crate::path::{KeyPath, RootKey};
use crate::value::ValueType;
use std::cell::RefCell;
use std::fmt;
use tracing::{debug, warn};

/// An open registry key.
///
/// The handle is closed on every exit path: explicitly via [`close`], or on
/// drop. Closing twice is a no-op, and a closed handle is never passed to
/// the API again.
///
/// [`close`]: OpenKey::close
pub struct OpenKey<'a, A: RegistryApi + ?Sized> {
    api: &'a A,
    hkey: Option<Hkey>,
    path: String,
}

impl<'a, A: RegistryApi + ?Sized> OpenKey<'a, A> {
    /// Takes ownership of an already opened handle.
    pub fn new(api: &'a A, hkey: Hkey, path: impl Into<String>) -> Self {
        Self {
            api,
            hkey: Some(hkey),
            path: path.into(),
        }
    }

    /// Key path this handle was opened for.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true once the handle has been released.
    pub fn is_closed(&self) -> bool {
        self.hkey.is_none()
    }

    fn raw(&self) -> Result<Hkey> {
        self.hkey
            .ok_or_else(|| RegistryError::HandleClosed(self.path.clone()))
    }

    fn value_context(&self, name: &str) -> String {
        format!("value '{}' of key '{}'", name, self.path)
    }

    /// Queries subkey count, value count and last write time.
    pub fn info(&self) -> Result<KeyInfo> {
        self.api
            .query_info(self.raw()?)
            .map_err(|e| RegistryError::from_os(e, &self.path))
    }

    /// Returns the name of the subkey at `index`.
    pub fn subkey_name(&self, index: u32) -> Result<String> {
        self.api
            .enum_key(self.raw()?, index)
            .map_err(|e| {
                RegistryError::from_os(e, &format!("subkey #{} of key '{}'", index, self.path))
            })
    }

    /// Returns the value at `index`.
    pub fn value_at(&self, index: u32) -> Result<RawValue> {
        self.api
            .enum_value(self.raw()?, index)
            .map_err(|e| {
                RegistryError::from_os(e, &format!("value #{} of key '{}'", index, self.path))
            })
    }

    /// Enumerates all immediate subkey names.
    ///
    /// The count is read first; enumeration is by index.
    pub fn subkey_names(&self) -> Result<Vec<String>> {
        let info = self.info()?;
        (0..info.subkey_count).map(|i| self.subkey_name(i)).collect()
    }

    /// Fetches the raw bytes and type of the named value.
    pub fn query_value(&self, name: &str) -> Result<(Vec<u8>, ValueType)> {
        let (data, code) = self
            .api
            .query_value(self.raw()?, name)
            .map_err(|e| RegistryError::from_os(e, &self.value_context(name)))?;
        Ok((data, ValueType::from_u32(code)))
    }

    /// Stores a typed buffer under `name`.
    pub fn set_value(&self, name: &str, value_type: ValueType, data: &[u8]) -> Result<()> {
        self.api
            .set_value(self.raw()?, name, value_type.code(), data)
            .map_err(|e| RegistryError::from_os(e, &self.value_context(name)))
    }

    /// Removes the named value.
    pub fn delete_value(&self, name: &str) -> Result<()> {
        self.api
            .delete_value(self.raw()?, name)
            .map_err(|e| RegistryError::from_os(e, &self.value_context(name)))
    }

    /// Deletes the leaf subkey `name`.
    pub fn delete_subkey(&self, name: &str) -> Result<()> {
        self.api
            .delete_key(self.raw()?, name)
            .map_err(|e| RegistryError::from_os(e, &format!("{}\\{}", self.path, name)))
    }

    /// Creates `tail` (one or more segments) below this key in a single call.
    pub fn create_subkey(&self, tail: &str, access: AccessMask) -> Result<OpenKey<'a, A>> {
        let path = format!("{}\\{}", self.path, tail);
        let hkey = self
            .api
            .create_key(self.raw()?, tail, access)
            .map_err(|e| RegistryError::from_os(e, &path))?;
        debug!(path = %path, "Created key chain");
        Ok(OpenKey::new(self.api, hkey, path))
    }

    /// Releases the handle.
    ///
    /// Idempotent: closing an already closed handle does nothing.
    pub fn close(&mut self) -> Result<()> {
        match self.hkey.take() {
            Some(hkey) => {
                debug!(path = %self.path, handle = hkey.raw(), "Closing key");
                self.api
                    .close(hkey)
                    .map_err(|e| RegistryError::from_os(e, &self.path))
            }
            None => Ok(()),
        }
    }
}

impl<A: RegistryApi + ?Sized> Drop for OpenKey<'_, A> {
    fn drop(&mut self) {
        if let Some(hkey) = self.hkey.take() {
            // Cleanup path: never mask an error already in flight.
            if let Err(e) = self.api.close(hkey) {
                warn!(path = %self.path, error = %e, "Failed to close key handle");
            }
        }
    }
}

impl<A: RegistryApi + ?Sized> fmt::Debug for OpenKey<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenKey")
            .field("path", &self.path)
            .field("hkey", &self.hkey)
            .finish()
    }
}

/// A cached connection to one root.
#[derive(Debug, Clone, Copy)]
struct Connection {
    root: RootKey,
    hkey: Hkey,
}

/// Owns the root connection of one client and opens key handles.
pub struct HandleManager<A: RegistryApi> {
    api: A,
    host: Option<String>,
    connection: RefCell<Option<Connection>>,
}

impl<A: RegistryApi> HandleManager<A> {
    /// Creates a manager for `host` (`None` for the local machine).
    pub fn new(api: A, host: Option<String>) -> Self {
        Self {
            api,
            host,
            connection: RefCell::new(None),
        }
    }

    /// The underlying registry API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Remote host, if any.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Root of the cached connection, if one is open.
    pub fn connected_root(&self) -> Option<RootKey> {
        self.connection.borrow().as_ref().map(|conn| conn.root)
    }

    /// Returns the connection for `root_name`, connecting if needed.
    ///
    /// # Errors
    ///
    /// `UnknownRoot` if the name is not a predefined root, `Unreachable` if
    /// the host cannot be contacted.
    fn connection(&self, root_name: &str) -> Result<Hkey> {
        let root = RootKey::from_name(root_name)?;
        let mut slot = self.connection.borrow_mut();

        if let Some(conn) = slot.as_ref() {
            if conn.root == root {
                debug!(root = %root, "Reusing cached connection");
                return Ok(conn.hkey);
            }
        }

        if let Some(old) = slot.take() {
            debug!(from = %old.root, to = %root, "Switching root connection");
            if let Err(e) = self.api.close(old.hkey) {
                warn!(root = %old.root, error = %e, "Failed to close previous connection");
            }
        }

        let hkey = self.api.connect(self.host.as_deref(), root).map_err(|e| {
            let target = format!("{} on {}", root, self.host.as_deref().unwrap_or("local machine"));
            RegistryError::from_os(e, &target)
        })?;
        debug!(root = %root, host = ?self.host, "Connected");
        *slot = Some(Connection { root, hkey });
        Ok(hkey)
    }

    /// Opens the key at `path` with `access` in the given view.
    ///
    /// A bare root path reopens the root itself.
    ///
    /// # Errors
    ///
    /// `NotFound` if any segment is absent, `AccessDenied` if the mask is
    /// refused, plus the connection errors of the root.
    pub fn open_node(
        &self,
        path: &KeyPath,
        access: AccessMask,
        view: RegistryView,
    ) -> Result<OpenKey<'_, A>> {
        let conn = self.connection(path.root())?;
        let mask = access.with_view(view);
        let hkey = self
            .api
            .open_key(conn, &path.relative(), mask)
            .map_err(|e| RegistryError::from_os(e, &path.to_string()))?;
        debug!(path = %path, access = %mask, handle = hkey.raw(), "Opened key");
        Ok(OpenKey::new(&self.api, hkey, path.to_string()))
    }

    /// Releases the cached connection.
    ///
    /// Idempotent: does nothing when no connection is cached.
    pub fn close(&self) -> Result<()> {
        let taken = self.connection.borrow_mut().take();
        match taken {
            Some(conn) => {
                debug!(root = %conn.root, "Closing connection");
                self.api
                    .close(conn.hkey)
                    .map_err(|e| RegistryError::from_os(e, conn.root.name()))
            }
            None => Ok(()),
        }
    }
}

impl<A: RegistryApi> Drop for HandleManager<A> {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.get_mut().take() {
            if let Err(e) = self.api.close(conn.hkey) {
                warn!(root = %conn.root, error = %e, "Failed to close connection");
            }
        }
    }
}

impl<A: RegistryApi> fmt::Debug for HandleManager<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleManager")
            .field("host", &self.host)
            .field("connection", &self.connection.borrow())
            .finish()
    }
}
