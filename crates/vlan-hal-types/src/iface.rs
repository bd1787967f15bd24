//! Interface names and VLAN sub-interfaces.

use crate::{is_name_char, ParseError, VlanId, MAX_NAME_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linux `IFNAMSIZ` minus the terminating NUL.
pub const IFNAMSIZ: usize = 15;

/// A physical or logical interface name (`eth0`, `moca0`, `ath1`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InterfaceName(String);

impl InterfaceName {
    /// Creates an interface name after checking length and character set.
    pub fn new(name: impl Into<String>) -> Result<Self, ParseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ParseError::Empty("interface name"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(ParseError::TooLong {
                field: "interface name",
                value: name,
                max: MAX_NAME_LEN,
            });
        }
        if !name.chars().all(is_name_char) {
            return Err(ParseError::InvalidInterfaceName(name));
        }
        Ok(InterfaceName(name))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InterfaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl FromStr for InterfaceName {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InterfaceName::new(s)
    }
}

impl TryFrom<String> for InterfaceName {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        InterfaceName::new(s)
    }
}

impl From<InterfaceName> for String {
    fn from(name: InterfaceName) -> String {
        name.0
    }
}

/// The 802.1Q device `<parent>.<vid>` that is enslaved to a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubInterface {
    /// Parent interface.
    pub parent: InterfaceName,
    /// VLAN tag.
    pub vlan_id: VlanId,
}

impl SubInterface {
    /// Creates a sub-interface, checking the kernel name fits `IFNAMSIZ`.
    pub fn new(parent: InterfaceName, vlan_id: VlanId) -> Result<Self, ParseError> {
        let sub = Self { parent, vlan_id };
        let name = sub.device_name();
        if name.len() > IFNAMSIZ {
            return Err(ParseError::TooLong {
                field: "VLAN device name",
                value: name,
                max: IFNAMSIZ,
            });
        }
        Ok(sub)
    }

    /// Kernel device name, e.g. `eth0.100`.
    pub fn device_name(&self) -> String {
        format!("{}.{}", self.parent, self.vlan_id)
    }

    /// Splits a kernel device name at its last `.` into parent and tag.
    ///
    /// Returns `None` for devices that are not VLAN sub-interfaces.
    pub fn parse_device_name(name: &str) -> Option<Self> {
        let (parent, vid) = name.rsplit_once('.')?;
        let parent = InterfaceName::new(parent).ok()?;
        let vlan_id = vid.parse().ok()?;
        Some(Self { parent, vlan_id })
    }
}

impl fmt::Display for SubInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.parent, self.vlan_id)
    }
}
