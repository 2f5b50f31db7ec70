//! Access rights requested when opening keys.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Access mask passed to the registry API.
///
/// Composition is additive; conflicting combinations are left for the API
/// to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AccessMask(pub u32);

impl AccessMask {
    /// Query the values of a key.
    pub const QUERY_VALUE: u32 = 0x0001;

    /// Create, delete or set a value.
    pub const SET_VALUE: u32 = 0x0002;

    /// Create a subkey.
    pub const CREATE_SUB_KEY: u32 = 0x0004;

    /// Enumerate the subkeys of a key.
    pub const ENUMERATE_SUB_KEYS: u32 = 0x0008;

    /// Request change notifications.
    pub const NOTIFY: u32 = 0x0010;

    /// Operate on the 64-bit registry view.
    pub const WOW64_64KEY: u32 = 0x0100;

    /// Operate on the 32-bit registry view.
    pub const WOW64_32KEY: u32 = 0x0200;

    /// Standard read-control right.
    pub const READ_CONTROL: u32 = 0x0002_0000;

    /// Combination of read rights (`KEY_READ`).
    pub const READ: AccessMask = AccessMask(
        Self::READ_CONTROL | Self::QUERY_VALUE | Self::ENUMERATE_SUB_KEYS | Self::NOTIFY,
    );

    /// Combination of write rights (`KEY_WRITE`).
    pub const WRITE: AccessMask =
        AccessMask(Self::READ_CONTROL | Self::SET_VALUE | Self::CREATE_SUB_KEY);

    /// Value modification only (`KEY_SET_VALUE`).
    pub const SET: AccessMask = AccessMask(Self::SET_VALUE);

    /// Creates an access mask from raw bits.
    pub fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Returns true if all bits of `flag` are set.
    pub fn has_flag(&self, flag: u32) -> bool {
        (self.0 & flag) == flag
    }

    /// Adds the view flag selecting the 32- or 64-bit subtree.
    pub fn with_view(self, view: RegistryView) -> Self {
        self | view.flag()
    }
}

impl BitOr for AccessMask {
    type Output = AccessMask;

    fn bitor(self, rhs: AccessMask) -> AccessMask {
        AccessMask(self.0 | rhs.0)
    }
}

impl BitOr<u32> for AccessMask {
    type Output = AccessMask;

    fn bitor(self, rhs: u32) -> AccessMask {
        AccessMask(self.0 | rhs)
    }
}

impl BitOrAssign for AccessMask {
    fn bitor_assign(&mut self, rhs: AccessMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for AccessMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Registry view on multi-architecture hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegistryView {
    /// Native 64-bit subtree.
    #[default]
    Wide,

    /// 32-bit (WOW64) subtree.
    Narrow,
}

impl RegistryView {
    /// Selects the view from the `key_wow64_32key` style flag.
    pub fn from_wow64_32(narrow: bool) -> Self {
        if narrow {
            RegistryView::Narrow
        } else {
            RegistryView::Wide
        }
    }

    /// Access mask bit for this view.
    pub fn flag(&self) -> u32 {
        match self {
            RegistryView::Wide => AccessMask::WOW64_64KEY,
            RegistryView::Narrow => AccessMask::WOW64_32KEY,
        }
    }
}
