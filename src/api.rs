//! The registry call surface the client is built on.
//!
//! [`RegistryApi`] mirrors the advapi32 registry functions: every call is
//! blocking and takes raw handles. Implementations report failures as
//! [`OsError`]s carrying Win32 status codes; the client classifies them.

use crate::access::AccessMask;
use crate::error::OsError;
use crate::path::RootKey;
use std::rc::Rc;
use std::sync::Arc;

/// Result of a raw registry API call.
pub type ApiResult<T> = std::result::Result<T, OsError>;

/// Opaque raw handle to a connection or an open key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hkey(pub u64);

impl Hkey {
    /// Returns the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Counts and timestamp returned by [`RegistryApi::query_info`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyInfo {
    /// Number of immediate subkeys.
    pub subkey_count: u32,

    /// Number of values.
    pub value_count: u32,

    /// Last write time (Windows FILETIME, 100 ns ticks since 1601-01-01).
    pub last_write_ticks: u64,
}

/// A value as returned by enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawValue {
    /// Value name; empty for the default value.
    pub name: String,

    /// Raw value bytes.
    pub data: Vec<u8>,

    /// Wire type code.
    pub type_code: u32,
}

/// Blocking registry API.
///
/// Handles returned by `connect`, `open_key` and `create_key` are owned by
/// the caller and must be released with `close`.
pub trait RegistryApi {
    /// Connects to a predefined root on `host` (`None` for the local machine).
    fn connect(&self, host: Option<&str>, root: RootKey) -> ApiResult<Hkey>;

    /// Opens `sub_key` below `parent`; an empty `sub_key` reopens `parent`.
    fn open_key(&self, parent: Hkey, sub_key: &str, access: AccessMask) -> ApiResult<Hkey>;

    /// Creates (or opens) `sub_key` below `parent`, including missing intermediate keys.
    fn create_key(&self, parent: Hkey, sub_key: &str, access: AccessMask) -> ApiResult<Hkey>;

    /// Releases a handle.
    fn close(&self, hkey: Hkey) -> ApiResult<()>;

    /// Returns subkey and value counts plus last write time.
    fn query_info(&self, hkey: Hkey) -> ApiResult<KeyInfo>;

    /// Returns the name of the subkey at `index`.
    fn enum_key(&self, hkey: Hkey, index: u32) -> ApiResult<String>;

    /// Returns the value at `index`.
    fn enum_value(&self, hkey: Hkey, index: u32) -> ApiResult<RawValue>;

    /// Returns the raw bytes and type code of the named value.
    fn query_value(&self, hkey: Hkey, name: &str) -> ApiResult<(Vec<u8>, u32)>;

    /// Stores a typed buffer under `name`.
    fn set_value(&self, hkey: Hkey, name: &str, type_code: u32, data: &[u8]) -> ApiResult<()>;

    /// Removes the named value.
    fn delete_value(&self, hkey: Hkey, name: &str) -> ApiResult<()>;

    /// Deletes the subkey `name`, which must not have subkeys.
    fn delete_key(&self, hkey: Hkey, name: &str) -> ApiResult<()>;
}

macro_rules! forward_registry_api {
    ($($ptr:ty),*) => {$(
        impl<A: RegistryApi + ?Sized> RegistryApi for $ptr {
            fn connect(&self, host: Option<&str>, root: RootKey) -> ApiResult<Hkey> {
                (**self).connect(host, root)
            }

            fn open_key(&self, parent: Hkey, sub_key: &str, access: AccessMask) -> ApiResult<Hkey> {
                (**self).open_key(parent, sub_key, access)
            }

            fn create_key(
                &self,
                parent: Hkey,
                sub_key: &str,
                access: AccessMask,
            ) -> ApiResult<Hkey> {
                (**self).create_key(parent, sub_key, access)
            }

            fn close(&self, hkey: Hkey) -> ApiResult<()> {
                (**self).close(hkey)
            }

            fn query_info(&self, hkey: Hkey) -> ApiResult<KeyInfo> {
                (**self).query_info(hkey)
            }

            fn enum_key(&self, hkey: Hkey, index: u32) -> ApiResult<String> {
                (**self).enum_key(hkey, index)
            }

            fn enum_value(&self, hkey: Hkey, index: u32) -> ApiResult<RawValue> {
                (**self).enum_value(hkey, index)
            }

            fn query_value(&self, hkey: Hkey, name: &str) -> ApiResult<(Vec<u8>, u32)> {
                (**self).query_value(hkey, name)
            }

            fn set_value(
                &self,
                hkey: Hkey,
                name: &str,
                type_code: u32,
                data: &[u8],
            ) -> ApiResult<()> {
                (**self).set_value(hkey, name, type_code, data)
            }

            fn delete_value(&self, hkey: Hkey, name: &str) -> ApiResult<()> {
                (**self).delete_value(hkey, name)
            }

            fn delete_key(&self, hkey: Hkey, name: &str) -> ApiResult<()> {
                (**self).delete_key(hkey, name)
            }
        }
    )*};
}

forward_registry_api!(&A, Box<A>, Rc<A>, Arc<A>);
