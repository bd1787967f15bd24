//! C ABI for the VLAN HAL.
//!
//! Exposes the HAL entry points under their C names (`addGroup`,
//! `getVlanIdForGroupName`, ...). Every function returns [`RETURN_OK`] or
//! [`RETURN_ERR`]; the typed [`vlan_hal::VlanHalError`] behind a failure is
//! logged through `tracing` and otherwise dropped at the boundary.
//!
//! # Process state
//!
//! One HAL instance serves the whole process. It is built on first use from
//! the configuration file named by `VLAN_HAL_CONFIG` (default
//! `/etc/vlan_hal.json`) and driven on a current-thread tokio runtime, so
//! calls block until the underlying bridge commands finish. Rust hosts can
//! install their own configuration with [`init_with_config`].
//!
//! # Safety
//!
//! All pointer arguments are checked for NULL before use. Strings must be
//! NUL-terminated; non-UTF-8 input is rejected as an invalid argument.
//!
//! A C header with the exported prototypes lives in `include/vlan_hal.h`.

mod exports;
mod global;

pub use exports::*;
pub use global::{init_with_config, shutdown, CONFIG_ENV};
pub use vlan_hal::{RETURN_ERR, RETURN_OK};
