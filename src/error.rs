//! Error types for registry client operations.
//!
//! Every failure surfaces as a [`RegistryError`]. Failures reported by the
//! underlying registry API arrive as an [`OsError`] carrying a Win32 status
//! code and are classified into the taxonomy by [`RegistryError::from_os`].

use crate::value::ValueType;
use std::fmt;
use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Win32 status codes the client knows how to classify.
pub mod codes {
    /// The system cannot find the file specified.
    pub const ERROR_FILE_NOT_FOUND: u32 = 2;
    /// The system cannot find the path specified.
    pub const ERROR_PATH_NOT_FOUND: u32 = 3;
    /// Access is denied.
    pub const ERROR_ACCESS_DENIED: u32 = 5;
    /// The handle is invalid.
    pub const ERROR_INVALID_HANDLE: u32 = 6;
    /// The network path was not found.
    pub const ERROR_BAD_NETPATH: u32 = 53;
    /// The network name cannot be found.
    pub const ERROR_BAD_NET_NAME: u32 = 67;
    /// No more data is available.
    pub const ERROR_NO_MORE_ITEMS: u32 = 259;
    /// The key already has subkeys.
    pub const ERROR_KEY_HAS_CHILDREN: u32 = 1020;
    /// The RPC server is unavailable.
    pub const RPC_S_SERVER_UNAVAILABLE: u32 = 1722;
}

/// A raw failure reported by the registry API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsError {
    /// Win32 status code.
    pub code: u32,
    /// System-provided message, if any.
    pub message: String,
}

impl OsError {
    /// Creates an OS error from a status code and message.
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates an OS error with an empty message.
    pub fn from_code(code: u32) -> Self {
        Self::new(code, String::new())
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "[Error {}]", self.code)
        } else {
            write!(f, "[Error {}] {}", self.code, self.message)
        }
    }
}

impl std::error::Error for OsError {}

/// Errors that can occur during registry client operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The key path text could not be parsed.
    #[error("Malformed path: {0}")]
    MalformedPath(String),

    /// The root name does not name a predefined registry root.
    #[error("Unknown root: {0}")]
    UnknownRoot(String),

    /// Key, value or ancestor not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A leaf delete was attempted on a key that still has subkeys.
    #[error("Key has subkeys: {0}")]
    NotEmpty(String),

    /// The requested access was denied.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The remote host could not be contacted.
    #[error("Host unreachable: {0}")]
    Unreachable(String),

    /// The native value's shape does not match the declared value type.
    #[error("Type mismatch: {expected} cannot hold {found}")]
    TypeMismatch {
        /// Declared value type.
        expected: ValueType,
        /// Description of the value that was given.
        found: String,
    },

    /// An element of a string list is not a string.
    #[error("Invalid element {index} in {value_type} list: {found}")]
    InvalidElement {
        /// Declared value type.
        value_type: ValueType,
        /// Position of the offending element.
        index: usize,
        /// Description of the element that was given.
        found: String,
    },

    /// The value cannot be stored as opaque bytes.
    #[error("Objects of type {found} can not be used as {value_type} values")]
    UnsupportedValue {
        /// Declared value type.
        value_type: ValueType,
        /// Description of the value that was given.
        found: String,
    },

    /// A value type name is not one of the `REG_*` names.
    #[error("Unknown value type: {0}")]
    UnknownValueType(String),

    /// A handle was used after it had been closed.
    #[error("Handle already closed: {0}")]
    HandleClosed(String),

    /// Client configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Snapshot serialization failed.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any API failure not otherwise classified.
    #[error("Unexpected error {code} on {context}: {message}")]
    Unexpected {
        /// Win32 status code.
        code: u32,
        /// System-provided message.
        message: String,
        /// What the client was doing.
        context: String,
    },
}

impl RegistryError {
    /// Classifies a raw API failure.
    ///
    /// # Arguments
    ///
    /// * `err` - Failure reported by the registry API
    /// * `context` - Key path (and value name) the failing call concerned
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use winregistry::error::{codes, OsError, RegistryError};
    /// let err = RegistryError::from_os(
    ///     OsError::from_code(codes::ERROR_FILE_NOT_FOUND),
    ///     "HKEY_LOCAL_MACHINE\\Software\\Missing",
    /// );
    /// assert!(matches!(err, RegistryError::NotFound(_)));
    /// ```
    pub fn from_os(err: OsError, context: &str) -> Self {
        let context = context.to_string();
        match err.code {
            codes::ERROR_FILE_NOT_FOUND | codes::ERROR_PATH_NOT_FOUND => Self::NotFound(context),
            codes::ERROR_ACCESS_DENIED => Self::AccessDenied(context),
            codes::ERROR_BAD_NETPATH
            | codes::ERROR_BAD_NET_NAME
            | codes::RPC_S_SERVER_UNAVAILABLE => Self::Unreachable(context),
            codes::ERROR_KEY_HAS_CHILDREN => Self::NotEmpty(context),
            codes::ERROR_INVALID_HANDLE => Self::HandleClosed(context),
            code => Self::Unexpected {
                code,
                message: err.message,
                context,
            },
        }
    }

    /// Creates a malformed path error quoting the offending text.
    pub fn malformed_path(path: &str, reason: &str) -> Self {
        Self::MalformedPath(format!("{} in \"{}\"", reason, path))
    }

    /// Creates a not found error with context about what was being searched.
    ///
    /// # Arguments
    ///
    /// * `item_type` - Type of item (e.g., "key", "value")
    /// * `name` - Name of the item that wasn't found
    pub fn not_found(item_type: &str, name: &str) -> Self {
        Self::NotFound(format!("{} '{}'", item_type, name))
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(expected: ValueType, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected,
            found: found.into(),
        }
    }

    /// Returns true if this error means the key or value does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
