//! Validated value types for the VLAN HAL.
//!
//! Every string that crosses the HAL boundary is parsed into one of these
//! types before it reaches the bridge layer:
//!
//! - [`VlanId`]: IEEE 802.1Q VLAN identifiers (1-4094)
//! - [`GroupName`]: bridge/group names, recognized via a [`GroupNamePattern`]
//! - [`InterfaceName`]: physical or logical interface names
//! - [`SubInterface`]: the `<ifname>.<vid>` device that carries one VLAN

mod group;
mod iface;
mod vlan;

pub use group::{GroupName, GroupNamePattern, DEFAULT_GROUP_PREFIX};
pub use iface::{InterfaceName, SubInterface, IFNAMSIZ};
pub use vlan::VlanId;

/// Maximum length of group and interface names (64-byte C buffer minus NUL).
pub const MAX_NAME_LEN: usize = 63;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("{0} is empty")]
    Empty(&'static str),

    #[error("{field} '{value}' is longer than {max} characters")]
    TooLong {
        field: &'static str,
        value: String,
        max: usize,
    },

    #[error("malformed VLAN ID '{0}': expected 1-4 decimal digits")]
    MalformedVlanId(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(u16),

    #[error("invalid group name '{0}': only ASCII letters, digits, '-', '_' and '.' are allowed")]
    InvalidGroupName(String),

    #[error("unrecognized group name '{name}': expected one of {expected}")]
    UnrecognizedGroupName { name: String, expected: String },

    #[error("invalid interface name '{0}': only ASCII letters, digits, '-', '_' and '.' are allowed")]
    InvalidInterfaceName(String),
}

/// Characters accepted in group and interface names.
pub(crate) fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}
