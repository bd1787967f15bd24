//! Shell command builders for bridge and VLAN operations

use vlan_hal_types::{GroupName, SubInterface};

use crate::shell::{self, shellquote};

/// sysfs root for network devices
pub const SYS_CLASS_NET: &str = "/sys/class/net";

/// Build command listing every bridge, one `ip -o` line each
pub fn build_list_bridges_cmd() -> String {
    format!("{} -o link show type bridge", shell::IP_CMD)
}

/// Build check if bridge exists command
///
/// Succeeds only when the device exists and is a bridge.
pub fn build_check_bridge_exists_cmd(group: &GroupName) -> String {
    format!(
        "{} -d {}/{}/bridge",
        shell::TEST_CMD,
        SYS_CLASS_NET,
        shellquote(group.as_str())
    )
}

/// Build create bridge command
pub fn build_add_bridge_cmd(group: &GroupName) -> String {
    let br = shellquote(group.as_str());
    format!(
        "{} addbr {} && {} link set {} up",
        shell::BRCTL_CMD,
        br,
        shell::IP_CMD,
        br
    )
}

/// Build delete bridge command
pub fn build_del_bridge_cmd(group: &GroupName) -> String {
    let br = shellquote(group.as_str());
    format!(
        "{} link set {} down && {} delbr {}",
        shell::IP_CMD,
        br,
        shell::BRCTL_CMD,
        br
    )
}

/// Build command listing the ports enslaved to a bridge
pub fn build_list_members_cmd(group: &GroupName) -> String {
    format!(
        "{} -o link show master {}",
        shell::IP_CMD,
        shellquote(group.as_str())
    )
}

/// Build show-device command for a single link
pub fn build_show_link_cmd(device: &str) -> String {
    format!("{} -o link show dev {}", shell::IP_CMD, shellquote(device))
}

/// Build create VLAN sub-interface command
pub fn build_add_vlan_device_cmd(sub: &SubInterface) -> String {
    format!(
        "{} link add link {} name {} type vlan id {}",
        shell::IP_CMD,
        shellquote(sub.parent.as_str()),
        shellquote(&sub.device_name()),
        sub.vlan_id
    )
}

/// Build delete VLAN sub-interface command
pub fn build_del_vlan_device_cmd(sub: &SubInterface) -> String {
    format!(
        "{} link del {}",
        shell::IP_CMD,
        shellquote(&sub.device_name())
    )
}

/// Build attach-to-bridge command
///
/// Enslaves the device and brings it up.
pub fn build_add_member_cmd(group: &GroupName, device: &str) -> String {
    let dev = shellquote(device);
    format!(
        "{} addif {} {} && {} link set {} up",
        shell::BRCTL_CMD,
        shellquote(group.as_str()),
        dev,
        shell::IP_CMD,
        dev
    )
}

/// Build detach-from-bridge command
pub fn build_del_member_cmd(group: &GroupName, device: &str) -> String {
    format!(
        "{} delif {} {}",
        shell::BRCTL_CMD,
        shellquote(group.as_str()),
        shellquote(device)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vlan_hal_types::{InterfaceName, VlanId};

    fn brlan0() -> GroupName {
        GroupName::new("brlan0").unwrap()
    }

    fn eth0_100() -> SubInterface {
        SubInterface::new(InterfaceName::new("eth0").unwrap(), VlanId::new(100).unwrap()).unwrap()
    }

    #[test]
    fn test_build_check_bridge_exists_cmd() {
        assert_eq!(
            build_check_bridge_exists_cmd(&brlan0()),
            "/usr/bin/test -d /sys/class/net/\"brlan0\"/bridge"
        );
    }

    #[test]
    fn test_build_add_bridge_cmd() {
        let cmd = build_add_bridge_cmd(&brlan0());
        assert!(cmd.contains("brctl addbr \"brlan0\""));
        assert!(cmd.contains("ip link set \"brlan0\" up"));
    }

    #[test]
    fn test_build_del_bridge_cmd() {
        let cmd = build_del_bridge_cmd(&brlan0());
        assert!(cmd.starts_with("/sbin/ip link set \"brlan0\" down"));
        assert!(cmd.contains("brctl delbr \"brlan0\""));
    }

    #[test]
    fn test_build_add_vlan_device_cmd() {
        assert_eq!(
            build_add_vlan_device_cmd(&eth0_100()),
            "/sbin/ip link add link \"eth0\" name \"eth0.100\" type vlan id 100"
        );
    }

    #[test]
    fn test_build_del_vlan_device_cmd() {
        assert_eq!(
            build_del_vlan_device_cmd(&eth0_100()),
            "/sbin/ip link del \"eth0.100\""
        );
    }

    #[test]
    fn test_build_member_cmds() {
        let add = build_add_member_cmd(&brlan0(), "eth0.100");
        assert!(add.contains("addif \"brlan0\" \"eth0.100\""));
        assert!(add.contains("link set \"eth0.100\" up"));

        let del = build_del_member_cmd(&brlan0(), "eth0.100");
        assert_eq!(del, "/sbin/brctl delif \"brlan0\" \"eth0.100\"");
    }

    #[test]
    fn test_build_list_cmds() {
        assert_eq!(build_list_bridges_cmd(), "/sbin/ip -o link show type bridge");
        assert_eq!(
            build_list_members_cmd(&brlan0()),
            "/sbin/ip -o link show master \"brlan0\""
        );
        assert_eq!(
            build_show_link_cmd("eth0.100"),
            "/sbin/ip -o link show dev \"eth0.100\""
        );
    }
}
