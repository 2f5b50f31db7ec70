//! Key path parsing and root resolution.
//!
//! A key path has the form `ROOT\segment1\segment2`. The root token is
//! matched case-insensitively against the short alias table (`HKLM`, ...)
//! and otherwise kept verbatim as a canonical root name. Whether that name
//! designates a real root is only checked when a connection is made.

use crate::error::{RegistryError, Result};
use std::fmt;

/// Separator between key path segments.
pub const SEPARATOR: char = '\\';

/// Short root aliases and the canonical names they expand to.
pub const ROOT_ALIASES: &[(&str, &str)] = &[
    ("HKCR", "HKEY_CLASSES_ROOT"),
    ("HKCU", "HKEY_CURRENT_USER"),
    ("HKLM", "HKEY_LOCAL_MACHINE"),
    ("HKU", "HKEY_USERS"),
    ("HKPD", "HKEY_PERFORMANCE_DATA"),
    ("HKCC", "HKEY_CURRENT_CONFIG"),
    ("HKDD", "HKEY_DYN_DATA"),
];

/// Predefined registry roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RootKey {
    /// `HKEY_CLASSES_ROOT`.
    ClassesRoot,

    /// `HKEY_CURRENT_USER`.
    CurrentUser,

    /// `HKEY_LOCAL_MACHINE`.
    LocalMachine,

    /// `HKEY_USERS`.
    Users,

    /// `HKEY_PERFORMANCE_DATA`.
    PerformanceData,

    /// `HKEY_CURRENT_CONFIG`.
    CurrentConfig,

    /// `HKEY_DYN_DATA`.
    DynData,
}

impl RootKey {
    /// All predefined roots.
    pub const ALL: [RootKey; 7] = [
        RootKey::ClassesRoot,
        RootKey::CurrentUser,
        RootKey::LocalMachine,
        RootKey::Users,
        RootKey::PerformanceData,
        RootKey::CurrentConfig,
        RootKey::DynData,
    ];

    /// Looks up a root by canonical name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `UnknownRoot` if `name` is not a predefined root.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|root| root.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| RegistryError::UnknownRoot(name.to_string()))
    }

    /// Returns the canonical name.
    pub fn name(&self) -> &'static str {
        match self {
            RootKey::ClassesRoot => "HKEY_CLASSES_ROOT",
            RootKey::CurrentUser => "HKEY_CURRENT_USER",
            RootKey::LocalMachine => "HKEY_LOCAL_MACHINE",
            RootKey::Users => "HKEY_USERS",
            RootKey::PerformanceData => "HKEY_PERFORMANCE_DATA",
            RootKey::CurrentConfig => "HKEY_CURRENT_CONFIG",
            RootKey::DynData => "HKEY_DYN_DATA",
        }
    }

    /// Returns the predefined handle value of this root.
    pub fn predefined_handle(&self) -> u32 {
        match self {
            RootKey::ClassesRoot => 0x8000_0000,
            RootKey::CurrentUser => 0x8000_0001,
            RootKey::LocalMachine => 0x8000_0002,
            RootKey::Users => 0x8000_0003,
            RootKey::PerformanceData => 0x8000_0004,
            RootKey::CurrentConfig => 0x8000_0005,
            RootKey::DynData => 0x8000_0006,
        }
    }
}

impl fmt::Display for RootKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expands a short root alias; unknown tokens are returned unchanged.
pub fn expand_root(token: &str) -> String {
    let upper = token.to_ascii_uppercase();
    ROOT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(upper)
}

/// A parsed key path: canonical root name plus relative segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    root: String,
    segments: Vec<String>,
}

impl KeyPath {
    /// Parses `ROOT\sub\key`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedPath` if there is no separator (no subkey given),
    /// if nothing follows the root or if any segment is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use winregistry::KeyPath;
    ///
    /// let path = KeyPath::parse("hklm\\Software\\Vendor").unwrap();
    /// assert_eq!(path.root(), "HKEY_LOCAL_MACHINE");
    /// assert_eq!(path.segments(), ["Software", "Vendor"]);
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        let (root, rest) = text
            .split_once(SEPARATOR)
            .ok_or_else(|| RegistryError::malformed_path(text, "No key given after root"))?;

        if rest.is_empty() {
            return Err(RegistryError::malformed_path(text, "Not found key"));
        }

        let segments: Vec<String> = rest.split(SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(RegistryError::malformed_path(text, "Empty key segment"));
        }

        Ok(Self {
            root: expand_root(root),
            segments,
        })
    }

    /// Builds a path from a root and segments without alias expansion.
    pub fn from_parts(root: impl Into<String>, segments: Vec<String>) -> Self {
        Self {
            root: root.into(),
            segments,
        }
    }

    /// Canonical root name.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Relative segments below the root.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments below the root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for a bare root with no segments.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Relative path below the root, joined with the separator.
    pub fn relative(&self) -> String {
        self.segments.join(&SEPARATOR.to_string())
    }

    /// Last segment, if any.
    pub fn leaf(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Path with only the first `depth` segments.
    pub fn prefix(&self, depth: usize) -> KeyPath {
        KeyPath {
            root: self.root.clone(),
            segments: self.segments[..depth.min(self.segments.len())].to_vec(),
        }
    }

    /// Parent path; `None` for a bare root.
    pub fn parent(&self) -> Option<KeyPath> {
        if self.is_root() {
            None
        } else {
            Some(self.prefix(self.depth() - 1))
        }
    }

    /// Child path one level below.
    pub fn join(&self, child: &str) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.push(child.to_string());
        KeyPath {
            root: self.root.clone(),
            segments,
        }
    }

    /// Segments from `depth` onwards, joined with the separator.
    pub fn tail(&self, depth: usize) -> String {
        self.segments[depth.min(self.segments.len())..].join(&SEPARATOR.to_string())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.root)?;
        for segment in &self.segments {
            write!(f, "{}{}", SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for KeyPath {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        KeyPath::parse(s)
    }
}

/// Parses a key path.
///
/// Shorthand for [`KeyPath::parse`].
pub fn resolve(text: &str) -> Result<KeyPath> {
    KeyPath::parse(text)
}
