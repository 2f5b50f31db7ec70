//! Client configuration.
//!
//! Settings can be built in code or read from the environment:
//!
//! - `WINREGISTRY_HOST`: remote computer name (default: local machine)
//! - `WINREGISTRY_VIEW`: `64` (default) or `32` to use the WOW64 subtree
//!
//! # Example
//!
//! ```bash
//! export WINREGISTRY_HOST=\\\\buildbox
//! export WINREGISTRY_VIEW=32
//! ```

use crate::access::RegistryView;
use crate::error::{RegistryError, Result};
use std::env;

/// Environment variable naming the remote host.
pub const ENV_HOST: &str = "WINREGISTRY_HOST";

/// Environment variable selecting the registry view.
pub const ENV_VIEW: &str = "WINREGISTRY_VIEW";

/// Settings for one registry client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// Remote computer name; `None` for the local machine.
    pub host: Option<String>,

    /// Registry view used by every operation.
    pub view: RegistryView,
}

impl ClientConfig {
    /// Local machine, 64-bit view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the remote host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Sets the registry view.
    pub fn with_view(mut self, view: RegistryView) -> Self {
        self.view = view;
        self
    }

    /// Reads `WINREGISTRY_HOST` and `WINREGISTRY_VIEW`.
    ///
    /// Unset or empty variables keep the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Config` if `WINREGISTRY_VIEW` holds an unrecognized value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup(ENV_HOST)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        let view = match lookup(ENV_VIEW) {
            Some(raw) if !raw.trim().is_empty() => parse_view(&raw)?,
            _ => RegistryView::default(),
        };

        Ok(Self { host, view })
    }
}

fn parse_view(raw: &str) -> Result<RegistryView> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "64" | "wide" | "wow64_64" | "wow64_64key" => Ok(RegistryView::Wide),
        "32" | "narrow" | "wow64_32" | "wow64_32key" => Ok(RegistryView::Narrow),
        other => Err(RegistryError::Config(format!(
            "{} must be 32 or 64, got '{}'",
            ENV_VIEW, other
        ))),
    }
}
