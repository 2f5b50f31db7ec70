//! # Windows Registry Client
//!
//! A client for the Windows registry: a tree of keys, each holding named,
//! typed values and child keys, addressed through OS handles.
//!
//! ## Features
//!
//! - **Path resolution**: `HKLM\Software\Vendor` style paths with short root aliases
//! - **Handle hygiene**: every handle is closed exactly once, on every exit path
//! - **Connection caching**: one cached root connection per client, reused
//!   while the root stays the same
//! - **Typed values**: strict encoding and lenient decoding of DWORD, QWORD,
//!   strings, string lists and binary data
//! - **Tree operations**: create keys with missing ancestors, delete whole subtrees
//!
//! ## Architecture
//!
//! The client is built in four layers:
//!
//! 1. **Value codec** ([`codec`]): native [`Value`]s to and from registry buffers
//! 2. **Path resolver** ([`path`]): text to root plus relative segments
//! 3. **Handle manager** ([`handle`]): cached connection and scoped key handles
//! 4. **Registry client** ([`registry`]): read, write, create and delete operations
//!
//! The raw registry calls are abstracted behind the [`RegistryApi`] trait, so
//! the client can run against any implementation of the advapi32 surface.
//!
//! ## Value Layouts
//!
//! ```text
//! REG_DWORD       [b0 b1 b2 b3]                     little-endian
//! REG_SZ          [u0 u1 .. 00 00]                  UTF-16LE + NUL
//! REG_MULTI_SZ    [s0 .. 00 00][s1 .. 00 00][00 00] strings + empty terminator
//! REG_BINARY      [..]                              copied as is
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use winregistry::{RegistryApi, Value, ValueType, WinRegistry};
//!
//! # fn demo<A: RegistryApi>(api: A) -> Result<(), Box<dyn std::error::Error>> {
//! let registry = WinRegistry::new(api);
//!
//! registry.create_key("HKCU\\Software\\Vendor\\App\\Plugins")?;
//! registry.write_entry(
//!     "HKCU\\Software\\Vendor\\App",
//!     "SearchPath",
//!     vec!["C:\\plugins", "D:\\shared"],
//!     ValueType::MultiString,
//! )?;
//!
//! let entry = registry.read_entry("HKCU\\Software\\Vendor\\App", "SearchPath")?;
//! assert_eq!(entry.value, Value::from(vec!["C:\\plugins", "D:\\shared"]));
//!
//! registry.delete_key_tree("HKCU\\Software\\Vendor")?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access;
pub mod api;
pub mod codec;
pub mod config;
pub mod error;
pub mod handle;
pub mod key;
pub mod path;
pub mod registry;
pub mod utils;
pub mod value;

// Re-export main types for convenience
pub use access::{AccessMask, RegistryView};
pub use api::{ApiResult, Hkey, KeyInfo, RawValue, RegistryApi};
pub use config::ClientConfig;
pub use error::{OsError, RegistryError, Result};
pub use handle::{HandleManager, OpenKey};
pub use key::{Entry, KeySnapshot};
pub use path::{resolve, KeyPath, RootKey};
pub use registry::WinRegistry;
pub use value::{Value, ValueType};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
