//! Human-readable and JSON reports for the print operations

use serde::Serialize;
use std::fmt;
use vlan_hal_types::{GroupName, InterfaceName, SubInterface, VlanId};

/// One device enslaved to a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberReport {
    /// Kernel device name
    pub device: String,
    /// Parent interface, for VLAN sub-interfaces
    pub interface: Option<InterfaceName>,
    /// VLAN tag, for VLAN sub-interfaces
    pub vlan_id: Option<VlanId>,
}

impl MemberReport {
    /// Describes a bridge port, splitting `<ifname>.<vid>` when possible.
    pub fn from_device(device: impl Into<String>) -> Self {
        let device = device.into();
        match SubInterface::parse_device_name(&device) {
            Some(sub) => Self {
                interface: Some(sub.parent),
                vlan_id: Some(sub.vlan_id),
                device,
            },
            None => Self {
                device,
                interface: None,
                vlan_id: None,
            },
        }
    }
}

/// Membership of a single group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub group: GroupName,
    /// Default VLAN ID from the config store
    pub default_vlan_id: Option<VlanId>,
    pub members: Vec<MemberReport>,
}

impl fmt::Display for GroupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Group: {}", self.group)?;
        match self.default_vlan_id {
            Some(vid) => writeln!(f, "  Default VLAN ID: {}", vid)?,
            None => writeln!(f, "  Default VLAN ID: not configured")?,
        }
        writeln!(f, "  Members ({}):", self.members.len())?;
        for member in &self.members {
            match (&member.interface, member.vlan_id) {
                (Some(iface), Some(vid)) => writeln!(
                    f,
                    "    {:<16} interface {:<12} vlan {}",
                    member.device, iface, vid
                )?,
                _ => writeln!(f, "    {}", member.device)?,
            }
        }
        Ok(())
    }
}

/// Every group managed by the HAL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AllGroupsReport {
    pub groups: Vec<GroupReport>,
}

impl fmt::Display for AllGroupsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.groups.is_empty() {
            return writeln!(f, "No VLAN groups configured");
        }
        for group in &self.groups {
            write!(f, "{}", group)?;
        }
        Ok(())
    }
}

/// A persisted group → VLAN ID mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlanConfigEntry {
    pub group: GroupName,
    pub vlan_id: VlanId,
}

/// Contents of the VLAN config store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VlanConfigReport {
    pub entries: Vec<VlanConfigEntry>,
}

impl fmt::Display for VlanConfigReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} VLAN ID", "Group")?;
        for entry in &self.entries {
            writeln!(f, "{:<16} {}", entry.group, entry.vlan_id)?;
        }
        writeln!(f, "Total entries: {}", self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_member_from_device() {
        let member = MemberReport::from_device("eth0.100");
        assert_eq!(member.interface.unwrap().as_str(), "eth0");
        assert_eq!(member.vlan_id.unwrap().as_u16(), 100);

        let plain = MemberReport::from_device("wl0");
        assert_eq!(plain.device, "wl0");
        assert!(plain.interface.is_none());
    }

    #[test]
    fn test_group_report_display() {
        let report = GroupReport {
            group: GroupName::new("brlan0").unwrap(),
            default_vlan_id: VlanId::new(100).ok(),
            members: vec![
                MemberReport::from_device("eth0.100"),
                MemberReport::from_device("wl0"),
            ],
        };
        let text = report.to_string();
        assert!(text.starts_with("Group: brlan0\n"));
        assert!(text.contains("Default VLAN ID: 100"));
        assert!(text.contains("Members (2):"));
        assert!(text.contains("eth0.100"));
        assert!(text.contains("    wl0\n"));
    }

    #[test]
    fn test_vlan_config_report_display() {
        let report = VlanConfigReport {
            entries: vec![VlanConfigEntry {
                group: GroupName::new("brlan1").unwrap(),
                vlan_id: VlanId::new(4094).unwrap(),
            }],
        };
        let text = report.to_string();
        assert!(text.contains("brlan1"));
        assert!(text.contains("4094"));
        assert!(text.ends_with("Total entries: 1\n"));
    }

    #[test]
    fn test_empty_groups_report() {
        assert_eq!(
            AllGroupsReport::default().to_string(),
            "No VLAN groups configured\n"
        );
    }

    #[test]
    fn test_group_report_json() {
        let report = GroupReport {
            group: GroupName::new("brlan0").unwrap(),
            default_vlan_id: None,
            members: vec![MemberReport::from_device("eth0.7")],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["group"], "brlan0");
        assert_eq!(json["default_vlan_id"], serde_json::Value::Null);
        assert_eq!(json["members"][0]["vlan_id"], 7);
    }
}
