//! Exported C functions.
//!
//! Names and argument order follow the C HAL header. Each export parses its
//! pointers, runs the HAL operation to completion and collapses the result to
//! `RETURN_OK`/`RETURN_ERR`.

#![allow(non_snake_case)]

use std::ffi::{c_char, c_int, CStr};
use std::io::Write;
use tracing::{debug, warn};
use vlan_hal::{return_code, HalResult, VlanHalError};

use crate::global::with_hal;

/// Size of the caller buffer `getVlanIdForGroupName` writes into.
pub const VLAN_ID_BUF_LEN: usize = 5;

const GROUP_ARG: &str = "group name";
const BRIDGE_ARG: &str = "bridge name";
const IFACE_ARG: &str = "interface name";
const VLAN_ARG: &str = "VLAN ID";

/// Borrows a C string argument. NULL maps to `None`.
unsafe fn c_arg<'a>(ptr: *const c_char, argument: &'static str) -> HalResult<Option<&'a str>> {
    if ptr.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(Some)
        .map_err(|e| VlanHalError::invalid(argument, e))
}

/// Copies `value` and a terminating NUL into `buf`.
pub fn write_c_str(value: &str, buf: &mut [u8]) -> HalResult<()> {
    let needed = value.len() + 1;
    if buf.len() < needed {
        return Err(VlanHalError::invalid(
            "output buffer",
            format!("needs {} bytes, has {}", needed, buf.len()),
        ));
    }
    buf[..value.len()].copy_from_slice(value.as_bytes());
    buf[value.len()] = 0;
    Ok(())
}

fn found(present: bool, kind: &'static str, name: Option<&str>) -> HalResult<()> {
    if present {
        Ok(())
    } else {
        Err(VlanHalError::not_found(kind, name.unwrap_or_default()))
    }
}

fn run<T>(operation: &'static str, f: impl FnOnce() -> HalResult<T>) -> c_int {
    let result = f();
    match &result {
        Ok(_) => debug!(operation, "ok"),
        Err(e) if e.is_validation_error() => debug!(operation, "rejected: {}", e),
        Err(e) => warn!(operation, "failed: {}", e),
    }
    return_code(&result)
}

/// Creates a VLAN group with a default VLAN ID.
///
/// # Safety
///
/// - Non-NULL arguments must be valid NUL-terminated C strings
#[no_mangle]
pub unsafe extern "C" fn addGroup(
    group_name: *const c_char,
    default_vlan_id: *const c_char,
) -> c_int {
    run("addGroup", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        let vlan_id = c_arg(default_vlan_id, VLAN_ARG)?;
        with_hal(|rt, hal| rt.block_on(hal.add_group(group, vlan_id)))
    })
}

/// Deletes a VLAN group.
///
/// # Safety
///
/// - `group_name`, if non-NULL, must be a valid NUL-terminated C string
#[no_mangle]
pub unsafe extern "C" fn delGroup(group_name: *const c_char) -> c_int {
    run("delGroup", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        with_hal(|rt, hal| rt.block_on(hal.del_group(group)))
    })
}

/// Attaches an interface to a group under a VLAN tag.
///
/// # Safety
///
/// - Non-NULL arguments must be valid NUL-terminated C strings
#[no_mangle]
pub unsafe extern "C" fn addInterface(
    group_name: *const c_char,
    if_name: *const c_char,
    vlan_id: *const c_char,
) -> c_int {
    run("addInterface", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        let iface = c_arg(if_name, IFACE_ARG)?;
        let vlan_id = c_arg(vlan_id, VLAN_ARG)?;
        with_hal(|rt, hal| rt.block_on(hal.add_interface(group, iface, vlan_id)))
    })
}

/// Detaches an interface from a group.
///
/// # Safety
///
/// - Non-NULL arguments must be valid NUL-terminated C strings
#[no_mangle]
pub unsafe extern "C" fn delInterface(
    group_name: *const c_char,
    if_name: *const c_char,
    vlan_id: *const c_char,
) -> c_int {
    run("delInterface", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        let iface = c_arg(if_name, IFACE_ARG)?;
        let vlan_id = c_arg(vlan_id, VLAN_ARG)?;
        with_hal(|rt, hal| rt.block_on(hal.del_interface(group, iface, vlan_id)))
    })
}

/// Detaches every interface from a group.
///
/// # Safety
///
/// - `group_name`, if non-NULL, must be a valid NUL-terminated C string
#[no_mangle]
pub unsafe extern "C" fn deleteAllInterfaces(group_name: *const c_char) -> c_int {
    run("deleteAllInterfaces", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        with_hal(|rt, hal| rt.block_on(hal.delete_all_interfaces(group))).map(|_| ())
    })
}

/// Prints the members of a group to stdout.
///
/// # Safety
///
/// - `group_name`, if non-NULL, must be a valid NUL-terminated C string
#[no_mangle]
pub unsafe extern "C" fn printGroup(group_name: *const c_char) -> c_int {
    run("printGroup", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        with_hal(|rt, hal| {
            let mut out = std::io::stdout().lock();
            rt.block_on(hal.print_group(group, &mut out))?;
            out.flush()?;
            Ok(())
        })
    })
}

/// Prints every managed group to stdout.
#[no_mangle]
pub extern "C" fn printAllGroup() -> c_int {
    run("printAllGroup", || {
        with_hal(|rt, hal| {
            let mut out = std::io::stdout().lock();
            rt.block_on(hal.print_all_groups(&mut out))?;
            out.flush()?;
            Ok(())
        })
    })
}

/// Prints the persisted VLAN ID configuration to stdout.
#[no_mangle]
pub extern "C" fn printAllVlanIdConfiguration() -> c_int {
    run("printAllVlanIdConfiguration", || {
        with_hal(|rt, hal| {
            let mut out = std::io::stdout().lock();
            rt.block_on(hal.print_all_vlan_id_configuration(&mut out))?;
            out.flush()?;
            Ok(())
        })
    })
}

/// Returns `RETURN_OK` if the bridge exists.
///
/// # Safety
///
/// - `br_name`, if non-NULL, must be a valid NUL-terminated C string
#[no_mangle]
pub unsafe extern "C" fn isGroupAvailableInLinuxBridge(br_name: *const c_char) -> c_int {
    run("isGroupAvailableInLinuxBridge", || {
        let bridge = c_arg(br_name, BRIDGE_ARG)?;
        let present =
            with_hal(|rt, hal| rt.block_on(hal.is_group_available_in_linux_bridge(bridge)))?;
        found(present, "bridge", bridge)
    })
}

/// Returns `RETURN_OK` if `<if_name>.<vlan_id>` is in any bridge.
///
/// # Safety
///
/// - Non-NULL arguments must be valid NUL-terminated C strings
#[no_mangle]
pub unsafe extern "C" fn isInterfaceAvailableInLinuxBridge(
    if_name: *const c_char,
    vlan_id: *const c_char,
) -> c_int {
    run("isInterfaceAvailableInLinuxBridge", || {
        let iface = c_arg(if_name, IFACE_ARG)?;
        let vlan_id = c_arg(vlan_id, VLAN_ARG)?;
        let present = with_hal(|rt, hal| {
            rt.block_on(hal.is_interface_available_in_linux_bridge(iface, vlan_id))
        })?;
        found(present, "bridge port", iface)
    })
}

/// Returns `RETURN_OK` if `<if_name>.<vlan_id>` is in `br_name`.
///
/// # Safety
///
/// - Non-NULL arguments must be valid NUL-terminated C strings
#[no_mangle]
pub unsafe extern "C" fn isInterfaceAvailableInGivenLinuxBridge(
    if_name: *const c_char,
    br_name: *const c_char,
    vlan_id: *const c_char,
) -> c_int {
    run("isInterfaceAvailableInGivenLinuxBridge", || {
        let iface = c_arg(if_name, IFACE_ARG)?;
        let bridge = c_arg(br_name, BRIDGE_ARG)?;
        let vlan_id = c_arg(vlan_id, VLAN_ARG)?;
        let present = with_hal(|rt, hal| {
            rt.block_on(hal.is_interface_available_in_given_linux_bridge(iface, bridge, vlan_id))
        })?;
        found(present, "bridge port", iface)
    })
}

/// Persists a group to VLAN ID mapping.
///
/// # Safety
///
/// - Non-NULL arguments must be valid NUL-terminated C strings
#[no_mangle]
pub unsafe extern "C" fn insertVLANConfigEntry(
    group_name: *const c_char,
    vlan_id: *const c_char,
) -> c_int {
    run("insertVLANConfigEntry", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        let vlan_id = c_arg(vlan_id, VLAN_ARG)?;
        with_hal(|rt, hal| rt.block_on(hal.insert_vlan_config_entry(group, vlan_id)))
    })
}

/// Removes the persisted mapping for a group.
///
/// # Safety
///
/// - `group_name`, if non-NULL, must be a valid NUL-terminated C string
#[no_mangle]
pub unsafe extern "C" fn deleteVLANConfigEntry(group_name: *const c_char) -> c_int {
    run("deleteVLANConfigEntry", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        with_hal(|rt, hal| rt.block_on(hal.delete_vlan_config_entry(group)))
    })
}

/// Writes the persisted VLAN ID of a group into `vlan_id` as a decimal
/// string.
///
/// # Safety
///
/// - `group_name`, if non-NULL, must be a valid NUL-terminated C string
/// - `vlan_id`, if non-NULL, must point to at least [`VLAN_ID_BUF_LEN`]
///   writable bytes
#[no_mangle]
pub unsafe extern "C" fn getVlanIdForGroupName(
    group_name: *const c_char,
    vlan_id: *mut c_char,
) -> c_int {
    run("getVlanIdForGroupName", || {
        let group = c_arg(group_name, GROUP_ARG)?;
        if vlan_id.is_null() {
            return Err(VlanHalError::missing("output buffer"));
        }
        let value = with_hal(|rt, hal| rt.block_on(hal.get_vlan_id_for_group_name(group)))?;
        let buf = std::slice::from_raw_parts_mut(vlan_id.cast::<u8>(), VLAN_ID_BUF_LEN);
        write_c_str(&value.to_string(), buf)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::global::{init_with_config, shutdown};
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::ffi::CString;
    use std::ptr;
    use tempfile::TempDir;
    use vlan_hal::{BackendKind, HalConfig, RETURN_ERR, RETURN_OK};

    fn mock_hal() -> TempDir {
        let dir = TempDir::new().unwrap();
        let config = HalConfig {
            backend: BackendKind::Mock,
            store_path: dir.path().join("vlan_config.json"),
            ..HalConfig::default()
        };
        init_with_config(&config).unwrap();
        dir
    }

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    #[test]
    fn test_write_c_str() {
        let mut buf = [0xffu8; VLAN_ID_BUF_LEN];
        write_c_str("4094", &mut buf).unwrap();
        assert_eq!(&buf, b"4094\0");

        let mut short = [0u8; 3];
        assert!(write_c_str("100", &mut short).is_err());
    }

    #[test]
    #[serial]
    fn test_add_group_sentinels() {
        let _dir = mock_hal();
        unsafe {
            assert_eq!(addGroup(c("brlan0").as_ptr(), c("1").as_ptr()), RETURN_OK);
            assert_eq!(addGroup(c("brlan0").as_ptr(), c("1").as_ptr()), RETURN_OK);
            assert_eq!(addGroup(c("").as_ptr(), c("1").as_ptr()), RETURN_ERR);
            assert_eq!(addGroup(c("brlan0").as_ptr(), c("").as_ptr()), RETURN_ERR);
            assert_eq!(addGroup(ptr::null(), c("1").as_ptr()), RETURN_ERR);
            assert_eq!(addGroup(c("brlan0").as_ptr(), ptr::null()), RETURN_ERR);
        }
        shutdown();
    }

    #[test]
    #[serial]
    fn test_interface_lifecycle() {
        let _dir = mock_hal();
        unsafe {
            assert_eq!(addGroup(c("brlan0").as_ptr(), c("1").as_ptr()), RETURN_OK);
            assert_eq!(
                addInterface(c("brlan0").as_ptr(), c("eth0").as_ptr(), c("100").as_ptr()),
                RETURN_OK
            );
            assert_eq!(
                addInterface(c("brlan0").as_ptr(), c("eth0").as_ptr(), c("4095").as_ptr()),
                RETURN_ERR
            );
            assert_eq!(
                isInterfaceAvailableInGivenLinuxBridge(
                    c("eth0").as_ptr(),
                    c("brlan0").as_ptr(),
                    c("100").as_ptr()
                ),
                RETURN_OK
            );

            assert_eq!(deleteAllInterfaces(c("brlan0").as_ptr()), RETURN_OK);
            assert_eq!(
                isInterfaceAvailableInLinuxBridge(c("eth0").as_ptr(), c("100").as_ptr()),
                RETURN_ERR
            );
            assert_eq!(
                delInterface(c("brlan0").as_ptr(), c("eth0").as_ptr(), c("100").as_ptr()),
                RETURN_ERR
            );
        }
        shutdown();
    }

    #[test]
    #[serial]
    fn test_call_inside_async_runtime_fails() {
        let _dir = mock_hal();
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let code = rt.block_on(async {
            unsafe { addGroup(c("brlan0").as_ptr(), c("1").as_ptr()) }
        });
        assert_eq!(code, RETURN_ERR);

        unsafe {
            assert_eq!(isGroupAvailableInLinuxBridge(c("brlan0").as_ptr()), RETURN_ERR);
            assert_eq!(addGroup(c("brlan0").as_ptr(), c("1").as_ptr()), RETURN_OK);
        }
        shutdown();
    }

    #[test]
    #[serial]
    fn test_group_probe() {
        let _dir = mock_hal();
        unsafe {
            assert_eq!(isGroupAvailableInLinuxBridge(c("brlan0").as_ptr()), RETURN_ERR);
            assert_eq!(addGroup(c("brlan0").as_ptr(), c("1").as_ptr()), RETURN_OK);
            assert_eq!(isGroupAvailableInLinuxBridge(c("brlan0").as_ptr()), RETURN_OK);
            assert_eq!(isGroupAvailableInLinuxBridge(ptr::null()), RETURN_ERR);
            assert_eq!(delGroup(c("brlan0").as_ptr()), RETURN_OK);
            assert_eq!(isGroupAvailableInLinuxBridge(c("brlan0").as_ptr()), RETURN_ERR);
        }
        shutdown();
    }

    #[test]
    #[serial]
    fn test_vlan_config_round_trip() {
        let _dir = mock_hal();
        let mut buf = [0 as c_char; VLAN_ID_BUF_LEN];
        unsafe {
            assert_eq!(
                insertVLANConfigEntry(c("brlan0").as_ptr(), c("100").as_ptr()),
                RETURN_OK
            );
            assert_eq!(
                insertVLANConfigEntry(c("brlan0").as_ptr(), c("").as_ptr()),
                RETURN_ERR
            );
            assert_eq!(
                getVlanIdForGroupName(c("brlan0").as_ptr(), buf.as_mut_ptr()),
                RETURN_OK
            );
            assert_eq!(CStr::from_ptr(buf.as_ptr()).to_str().unwrap(), "100");

            assert_eq!(
                getVlanIdForGroupName(c("brlan0").as_ptr(), ptr::null_mut()),
                RETURN_ERR
            );
            assert_eq!(
                getVlanIdForGroupName(ptr::null(), buf.as_mut_ptr()),
                RETURN_ERR
            );

            assert_eq!(deleteVLANConfigEntry(c("brlan0").as_ptr()), RETURN_OK);
            assert_eq!(deleteVLANConfigEntry(c("brlan0").as_ptr()), RETURN_ERR);
            assert_eq!(
                getVlanIdForGroupName(c("brlan0").as_ptr(), buf.as_mut_ptr()),
                RETURN_ERR
            );
        }
        shutdown();
    }

    #[test]
    #[serial]
    fn test_print_operations() {
        let _dir = mock_hal();
        unsafe {
            assert_eq!(printGroup(c("brlan0").as_ptr()), RETURN_ERR);
            assert_eq!(addGroup(c("brlan0").as_ptr(), c("10").as_ptr()), RETURN_OK);
            assert_eq!(printGroup(c("brlan0").as_ptr()), RETURN_OK);
            assert_eq!(printGroup(ptr::null()), RETURN_ERR);
        }
        assert_eq!(printAllGroup(), RETURN_OK);
        assert_eq!(printAllVlanIdConfiguration(), RETURN_OK);
        shutdown();
    }

    #[test]
    #[serial]
    fn test_invalid_utf8_rejected() {
        let _dir = mock_hal();
        let bad = [0xc3u8, 0x28, 0];
        unsafe {
            assert_eq!(delGroup(bad.as_ptr().cast::<c_char>()), RETURN_ERR);
        }
        shutdown();
    }
}
