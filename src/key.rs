//! Point-in-time views of registry keys and values.
//!
//! [`KeySnapshot`] and [`Entry`] own no handles; they are produced fresh by
//! every read and never updated afterwards.

use crate::value::{Value, ValueType};
use chrono::{DateTime, Utc};

/// A named, typed value read from a key.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    /// Value name; empty for the default value.
    pub name: String,

    /// Decoded value.
    pub value: Value,

    /// Value type reported by the registry.
    pub value_type: ValueType,

    /// Path of the key holding the value, as given by the caller.
    pub key_path: String,

    /// Remote host the value was read from, if any.
    pub host: Option<String>,
}

impl Entry {
    /// Full path of the value in `key\name` form.
    pub fn path(&self) -> String {
        format!("{}\\{}", self.key_path, self.name)
    }

    /// Returns true if this is the key's default (unnamed) value.
    pub fn is_default(&self) -> bool {
        self.name.is_empty()
    }
}

/// Snapshot of one key: child names, values and last write time.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeySnapshot {
    /// Key path, as given by the caller.
    pub path: String,

    /// Names of the immediate subkeys, in enumeration order.
    pub subkeys: Vec<String>,

    /// Values of the key, in enumeration order.
    pub entries: Vec<Entry>,

    /// Last write time; `None` if out of the representable range.
    pub modified_at: Option<DateTime<Utc>>,
}

impl KeySnapshot {
    /// Number of immediate subkeys.
    pub fn subkey_count(&self) -> usize {
        self.subkeys.len()
    }

    /// Looks up a value by name (case-insensitive, like the registry).
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
    }

    /// Returns true if the key has a subkey called `name` (case-insensitive).
    pub fn has_subkey(&self, name: &str) -> bool {
        self.subkeys.iter().any(|key| key.eq_ignore_ascii_case(name))
    }

    /// Serializes the snapshot as pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
