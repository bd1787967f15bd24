//! vlan-hal - VLAN hardware abstraction layer
//!
//! Manages VLAN groups (Linux bridges), VLAN memberships (`<ifname>.<vid>`
//! sub-interfaces enslaved to a bridge) and the persisted group → VLAN ID
//! configuration.
//!
//! - [`VlanHal`]: the HAL entry points
//! - [`BridgeBackend`]: bridge layer capability, with [`LinuxBridge`] and [`MockBridge`]
//! - [`ConfigStore`]: VLAN config entries, with [`FileConfigStore`] and [`MemoryConfigStore`]
//! - [`shell`]: command execution with proper quoting

mod bridge;
mod commands;
mod config;
mod error;
mod hal;
mod link;
mod mock;
mod report;
pub mod shell;
mod store;

pub use bridge::*;
pub use commands::*;
pub use config::*;
pub use error::*;
pub use hal::{DynVlanHal, VlanHal};
pub use link::*;
pub use mock::MockBridge;
pub use report::*;
pub use store::*;

pub use vlan_hal_types::{
    GroupName, GroupNamePattern, InterfaceName, ParseError, SubInterface, VlanId,
};
