//! VLAN ID type with validation.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IEEE 802.1Q VLAN identifier (1-4094).
///
/// VLAN 0 is reserved (priority tagged frames).
/// VLAN 4095 is reserved.
/// Valid range is 1-4094.
///
/// At the HAL boundary a VLAN ID is a decimal string of one to four ASCII
/// digits (it must fit a 5-byte C buffer). Signs, whitespace and any other
/// characters are rejected.
///
/// # Examples
///
/// ```
/// use vlan_hal_types::VlanId;
///
/// let vlan: VlanId = "100".parse().unwrap();
/// assert_eq!(vlan.as_u16(), 100);
///
/// assert!("0".parse::<VlanId>().is_err());
/// assert!("4095".parse::<VlanId>().is_err());
/// assert!("-1".parse::<VlanId>().is_err());
/// assert!("1a2b".parse::<VlanId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    /// Minimum valid VLAN ID.
    pub const MIN: u16 = 1;

    /// Maximum valid VLAN ID.
    pub const MAX: u16 = 4094;

    /// Maximum number of digits in the string form.
    pub const MAX_DIGITS: usize = 4;

    /// Default VLAN ID (VLAN 1).
    pub const DEFAULT: VlanId = VlanId(1);

    /// Creates a new VLAN ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the VLAN ID is not in the valid range (1-4094).
    pub const fn new(id: u16) -> Result<Self, ParseError> {
        if id >= Self::MIN && id <= Self::MAX {
            Ok(VlanId(id))
        } else {
            Err(ParseError::InvalidVlanId(id))
        }
    }

    /// Returns the VLAN ID as a u16.
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns true if this is the default VLAN (VLAN 1).
    pub const fn is_default(&self) -> bool {
        self.0 == 1
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseError::Empty("VLAN ID"));
        }
        if s.len() > Self::MAX_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::MalformedVlanId(s.to_string()));
        }

        // At most four digits, cannot overflow u16.
        let id: u16 = s
            .parse()
            .map_err(|_| ParseError::MalformedVlanId(s.to_string()))?;

        VlanId::new(id)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ParseError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> u16 {
        vlan.0
    }
}
