//! HAL configuration file support.
//!
//! Loads and validates the HAL configuration from a JSON file.
//! Default location: /etc/vlan_hal.json
//!
//! ```json
//! {
//!   "group_prefixes": ["brlan"],
//!   "store_path": "/nvram/vlan_config.json",
//!   "backend": "linux",
//!   "command_timeout_secs": 10
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use vlan_hal_types::GroupNamePattern;

use crate::error::{HalResult, VlanHalError};

/// Default configuration file location.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vlan_hal.json";

/// Which bridge backend to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `brctl`/`ip` against the running kernel.
    #[default]
    Linux,
    /// In-memory bridge layer.
    Mock,
}

/// Complete HAL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalConfig {
    /// Prefixes a group name may carry, followed by a decimal index
    #[serde(default)]
    pub group_prefixes: GroupNamePattern,

    /// Where VLAN config entries are persisted
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Bridge backend
    #[serde(default)]
    pub backend: BackendKind,

    /// Per-command timeout in seconds (0 disables the timeout)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("/nvram/vlan_config.json")
}

fn default_command_timeout() -> u64 {
    10
}

impl Default for HalConfig {
    fn default() -> Self {
        Self {
            group_prefixes: GroupNamePattern::default(),
            store_path: default_store_path(),
            backend: BackendKind::default(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl HalConfig {
    /// Loads and validates configuration from `path`.
    pub fn load(path: impl AsRef<Path>) -> HalResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VlanHalError::invalid_config(
                path.display().to_string(),
                format!("failed to read: {}", e),
            )
        })?;
        Self::from_json(&contents)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> HalResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parses and validates configuration from a JSON string.
    pub fn from_json(contents: &str) -> HalResult<Self> {
        let config: HalConfig = serde_json::from_str(contents)
            .map_err(|e| VlanHalError::invalid_config("json", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field constraints serde cannot express.
    pub fn validate(&self) -> HalResult<()> {
        let prefixes = self.group_prefixes.prefixes();
        if prefixes.is_empty() {
            return Err(VlanHalError::invalid_config(
                "group_prefixes",
                "at least one prefix is required",
            ));
        }
        if let Some(bad) = prefixes
            .iter()
            .find(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(VlanHalError::invalid_config(
                "group_prefixes",
                format!("prefix '{}' must be non-empty ASCII letters", bad),
            ));
        }
        if self.store_path.as_os_str().is_empty() {
            return Err(VlanHalError::invalid_config("store_path", "must not be empty"));
        }
        Ok(())
    }

    /// File holding the mock backend's bridges, next to the store.
    ///
    /// `/nvram/vlan_config.json` maps to `/nvram/vlan_config.bridges.json`.
    pub fn mock_state_path(&self) -> PathBuf {
        self.store_path.with_extension("bridges.json")
    }

    /// Command timeout, `None` when disabled.
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = HalConfig::default();
        assert_eq!(config.group_prefixes.prefixes(), ["brlan"]);
        assert_eq!(config.store_path, PathBuf::from("/nvram/vlan_config.json"));
        assert_eq!(config.backend, BackendKind::Linux);
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = HalConfig::from_json(r#"{"backend": "mock"}"#).unwrap();
        assert_eq!(config.backend, BackendKind::Mock);
        assert_eq!(config.group_prefixes, GroupNamePattern::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"group_prefixes": ["brlan", "brpub"], "store_path": "/tmp/vlans.json", "command_timeout_secs": 0}}"#
        )
        .unwrap();

        let config = HalConfig::load(file.path()).unwrap();
        assert!(config.group_prefixes.matches("brpub2"));
        assert_eq!(config.store_path, PathBuf::from("/tmp/vlans.json"));
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_validation_rejects_bad_prefixes() {
        assert!(matches!(
            HalConfig::from_json(r#"{"group_prefixes": []}"#),
            Err(VlanHalError::InvalidConfig { .. })
        ));
        assert!(matches!(
            HalConfig::from_json(r#"{"group_prefixes": ["br-lan"]}"#),
            Err(VlanHalError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(HalConfig::from_json(r#"{"backend": "netlink"}"#).is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = HalConfig::load_or_default("/nonexistent/vlan_hal.json").unwrap();
        assert_eq!(config.backend, BackendKind::Linux);
    }
}
