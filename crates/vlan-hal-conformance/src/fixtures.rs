//! Fixture profiles for conformance runs
//!
//! A profile names the bridges, interfaces and VLAN IDs the contract cases
//! are built from. It is loaded from a JSON file or taken from the defaults:
//!
//! ```json
//! {
//!   "bridge_names": ["brlan0", "brlan1"],
//!   "interface_names": ["eth0", "eth1"],
//!   "vlan_ids": ["1", "100", "4094"],
//!   "invalid_bridge_names": ["", "1234", "BrLan0", "br@lan0", "brlan"],
//!   "invalid_interface_names": ["", "eth 0", "eth@0", "eth/0"]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// VLAN ID strings every HAL must reject.
pub const INVALID_VLAN_IDS: &[&str] = &["", "0", "4095", "-1", "abc", "1a2b", " 100", "99999"];

/// Fixture loading errors
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Failed to read fixture file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture profile: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Fixture profile needs at least {min} entries in '{field}'")]
    TooFew { field: &'static str, min: usize },
}

/// Names and IDs the contract cases are parameterized with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HalFixtures {
    /// Well-formed group names, created and torn down by the cases
    pub bridge_names: Vec<String>,
    /// Interfaces that may be attached to a group
    pub interface_names: Vec<String>,
    /// VLAN IDs inside the valid range, as decimal strings
    pub vlan_ids: Vec<String>,
    /// Group names the HAL must not recognize
    pub invalid_bridge_names: Vec<String>,
    /// Interface names the HAL must reject
    pub invalid_interface_names: Vec<String>,
}

impl Default for HalFixtures {
    fn default() -> Self {
        Self {
            bridge_names: vec!["brlan0".into(), "brlan1".into()],
            interface_names: vec!["eth0".into(), "eth1".into()],
            vlan_ids: vec!["1".into(), "100".into(), "4094".into()],
            invalid_bridge_names: vec![
                "".into(),
                "1234".into(),
                "BrLan0".into(),
                "br@lan0".into(),
                "brlan".into(),
            ],
            invalid_interface_names: vec![
                "".into(),
                "eth 0".into(),
                "eth@0".into(),
                "eth/0".into(),
            ],
        }
    }
}

impl HalFixtures {
    /// Loads a profile from a JSON file. Missing fields take the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Parses a profile from a JSON string.
    pub fn from_json(contents: &str) -> Result<Self, FixtureError> {
        let fixtures: HalFixtures = serde_json::from_str(contents)?;
        fixtures.validate()?;
        Ok(fixtures)
    }

    /// Cases need two distinct groups and interfaces and one VLAN ID. Every
    /// case family checks this before building its cases, and the accessors
    /// below panic on a profile that fails it.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let checks = [
            ("bridge_names", self.bridge_names.len(), 2),
            ("interface_names", self.interface_names.len(), 2),
            ("vlan_ids", self.vlan_ids.len(), 1),
        ];
        for (field, len, min) in checks {
            if len < min {
                return Err(FixtureError::TooFew { field, min });
            }
        }
        Ok(())
    }

    /// The group most cases operate on.
    pub fn primary_bridge(&self) -> &str {
        &self.bridge_names[0]
    }

    /// A second group, distinct from [`Self::primary_bridge`].
    pub fn secondary_bridge(&self) -> &str {
        &self.bridge_names[1]
    }

    /// The interface most cases attach.
    pub fn primary_interface(&self) -> &str {
        &self.interface_names[0]
    }

    /// A second interface, distinct from [`Self::primary_interface`].
    pub fn secondary_interface(&self) -> &str {
        &self.interface_names[1]
    }

    /// A valid VLAN ID.
    pub fn primary_vlan(&self) -> &str {
        &self.vlan_ids[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_default_profile_is_valid() {
        let fixtures = HalFixtures::default();
        fixtures.validate().unwrap();
        assert_eq!(fixtures.primary_bridge(), "brlan0");
        assert_eq!(fixtures.secondary_interface(), "eth1");
    }

    #[test]
    fn test_partial_profile() {
        let fixtures = HalFixtures::from_json(r#"{"vlan_ids": ["10", "20"]}"#).unwrap();
        assert_eq!(fixtures.vlan_ids, ["10", "20"]);
        assert_eq!(fixtures.bridge_names, HalFixtures::default().bridge_names);
    }

    #[test]
    fn test_profile_too_small() {
        let err = HalFixtures::from_json(r#"{"bridge_names": ["brlan0"]}"#).unwrap_err();
        assert!(matches!(
            err,
            FixtureError::TooFew {
                field: "bridge_names",
                min: 2
            }
        ));
    }

    #[test]
    fn test_struct_literal_profile_validated() {
        let fixtures = HalFixtures {
            vlan_ids: vec![],
            ..HalFixtures::default()
        };
        assert!(matches!(
            fixtures.validate(),
            Err(FixtureError::TooFew {
                field: "vlan_ids",
                min: 1
            })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"interface_names": ["moca0", "ath1"]}}"#).unwrap();

        let fixtures = HalFixtures::load(file.path()).unwrap();
        assert_eq!(fixtures.primary_interface(), "moca0");

        assert!(matches!(
            HalFixtures::load("/nonexistent/profile.json"),
            Err(FixtureError::Io { .. })
        ));
    }
}
