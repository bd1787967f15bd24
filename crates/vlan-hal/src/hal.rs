//! VlanHal - the VLAN hardware abstraction layer
//!
//! Every entry point takes its string arguments as `Option<&str>`, where
//! `None` stands for a NULL pointer at the C boundary. Arguments are
//! validated in order before any bridge or store access, so a rejected call
//! has no side effects.

use std::io::Write;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use vlan_hal_types::{GroupName, GroupNamePattern, InterfaceName, SubInterface, VlanId};

use crate::bridge::{BridgeBackend, LinuxBridge};
use crate::config::{BackendKind, HalConfig};
use crate::error::{HalResult, VlanHalError};
use crate::mock::MockBridge;
use crate::report::{AllGroupsReport, GroupReport, MemberReport, VlanConfigEntry, VlanConfigReport};
use crate::store::{ConfigStore, FileConfigStore};

const GROUP_ARG: &str = "group name";
const BRIDGE_ARG: &str = "bridge name";
const IFACE_ARG: &str = "interface name";
const VLAN_ARG: &str = "VLAN ID";

/// VLAN HAL over a bridge backend and a VLAN config store
///
/// Operation mapping:
/// 1. Group lifecycle → bridge create/delete + default VLAN in the store
/// 2. Interface membership → `<ifname>.<vid>` sub-interfaces enslaved to the bridge
/// 3. Probes → bridge backend introspection
/// 4. VLAN config entries → store only
pub struct VlanHal<B, S> {
    backend: B,
    store: Mutex<S>,
    pattern: GroupNamePattern,
}

impl<B: BridgeBackend, S: ConfigStore> VlanHal<B, S> {
    /// Creates a HAL that recognizes group names matching `pattern`.
    pub fn new(backend: B, store: S, pattern: GroupNamePattern) -> Self {
        Self {
            backend,
            store: Mutex::new(store),
            pattern,
        }
    }

    /// The bridge backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The group name pattern.
    pub fn pattern(&self) -> &GroupNamePattern {
        &self.pattern
    }

    // ---- argument validation ----

    fn group_arg(&self, value: Option<&str>) -> HalResult<GroupName> {
        let value = value.ok_or_else(|| VlanHalError::missing(GROUP_ARG))?;
        self.pattern
            .recognize(value)
            .map_err(|e| VlanHalError::invalid(GROUP_ARG, e))
    }

    fn bridge_arg(value: Option<&str>) -> HalResult<GroupName> {
        let value = value.ok_or_else(|| VlanHalError::missing(BRIDGE_ARG))?;
        GroupName::new(value).map_err(|e| VlanHalError::invalid(BRIDGE_ARG, e))
    }

    fn vlan_arg(value: Option<&str>) -> HalResult<VlanId> {
        let value = value.ok_or_else(|| VlanHalError::missing(VLAN_ARG))?;
        value
            .parse()
            .map_err(|e| VlanHalError::invalid(VLAN_ARG, e))
    }

    fn sub_interface_arg(iface: Option<&str>, vlan: Option<&str>) -> HalResult<SubInterface> {
        let iface = iface.ok_or_else(|| VlanHalError::missing(IFACE_ARG))?;
        let iface = InterfaceName::new(iface).map_err(|e| VlanHalError::invalid(IFACE_ARG, e))?;
        let vlan_id = Self::vlan_arg(vlan)?;
        SubInterface::new(iface, vlan_id).map_err(|e| VlanHalError::invalid(IFACE_ARG, e))
    }

    async fn require_group(&self, group: &GroupName) -> HalResult<()> {
        if self.backend.group_exists(group).await? {
            Ok(())
        } else {
            warn!("Group {} does not exist in the bridge layer", group);
            Err(VlanHalError::not_found("group", group.as_str()))
        }
    }

    // ---- group lifecycle ----

    /// Creates a VLAN group with a default VLAN ID.
    ///
    /// Re-adding an existing group succeeds and refreshes its default VLAN.
    #[instrument(skip(self))]
    pub async fn add_group(
        &self,
        group_name: Option<&str>,
        default_vlan_id: Option<&str>,
    ) -> HalResult<()> {
        let group = self.group_arg(group_name)?;
        let vlan_id = Self::vlan_arg(default_vlan_id)?;

        let created = if self.backend.group_exists(&group).await? {
            debug!("Group {} already exists", group);
            false
        } else {
            self.backend.create_bridge(&group).await?;
            true
        };

        if let Err(e) = self.store.lock().await.insert(&group, vlan_id).await {
            if created {
                // Roll back so a failed add leaves no bridge behind.
                if let Err(cleanup) = self.backend.delete_bridge(&group).await {
                    warn!("Failed to remove bridge {} after store error: {}", group, cleanup);
                }
            }
            return Err(e);
        }
        info!("Added group {} with default VLAN {}", group, vlan_id);
        Ok(())
    }

    /// Removes a VLAN group, its members and its config entry.
    ///
    /// Deleting a well-formed group that does not exist succeeds.
    #[instrument(skip(self))]
    pub async fn del_group(&self, group_name: Option<&str>) -> HalResult<()> {
        let group = self.group_arg(group_name)?;

        if self.backend.group_exists(&group).await? {
            self.remove_members(&group).await?;
            self.backend.delete_bridge(&group).await?;
        } else {
            debug!("Group {} not present in bridge layer", group);
        }

        self.store.lock().await.remove(&group).await?;
        info!("Deleted group {}", group);
        Ok(())
    }

    // ---- interface membership ----

    /// Attaches `if_name` to the group under `vlan_id`.
    #[instrument(skip(self))]
    pub async fn add_interface(
        &self,
        group_name: Option<&str>,
        if_name: Option<&str>,
        vlan_id: Option<&str>,
    ) -> HalResult<()> {
        let group = self.group_arg(group_name)?;
        let sub = Self::sub_interface_arg(if_name, vlan_id)?;
        self.require_group(&group).await?;

        match self.backend.attached_bridge(&sub).await? {
            Some(bridge) if bridge == group.as_str() => {
                debug!("{} already attached to {}", sub, group);
                Ok(())
            }
            Some(bridge) => {
                warn!("{} is attached to {}, not {}", sub, bridge, group);
                Err(VlanHalError::already_exists(
                    "bridge port",
                    format!("{} (member of {})", sub, bridge),
                ))
            }
            None => {
                self.backend.attach(&group, &sub).await?;
                info!("Added {} to group {}", sub, group);
                Ok(())
            }
        }
    }

    /// Detaches `if_name` tagged `vlan_id` from the group and deletes the
    /// sub-interface.
    #[instrument(skip(self))]
    pub async fn del_interface(
        &self,
        group_name: Option<&str>,
        if_name: Option<&str>,
        vlan_id: Option<&str>,
    ) -> HalResult<()> {
        let group = self.group_arg(group_name)?;
        let sub = Self::sub_interface_arg(if_name, vlan_id)?;
        self.require_group(&group).await?;

        if !self.backend.interface_exists_in_group(&sub, &group).await? {
            return Err(VlanHalError::not_found(
                "bridge port",
                format!("{} in {}", sub, group),
            ));
        }

        self.backend.detach(&group, &sub.device_name()).await?;
        self.backend.delete_vlan_device(&sub).await?;
        info!("Removed {} from group {}", sub, group);
        Ok(())
    }

    /// Removes every member of the group. Returns how many were removed.
    #[instrument(skip(self))]
    pub async fn delete_all_interfaces(&self, group_name: Option<&str>) -> HalResult<usize> {
        let group = self.group_arg(group_name)?;
        self.require_group(&group).await?;
        let removed = self.remove_members(&group).await?;
        info!("Removed {} members from group {}", removed, group);
        Ok(removed)
    }

    async fn remove_members(&self, group: &GroupName) -> HalResult<usize> {
        let members = self.backend.members(group).await?;
        for device in &members {
            self.backend.detach(group, device).await?;
            // Only sub-interfaces are ours to delete; plain ports stay.
            if let Some(sub) = SubInterface::parse_device_name(device) {
                self.backend.delete_vlan_device(&sub).await?;
            }
        }
        Ok(members.len())
    }

    // ---- introspection ----

    /// Membership report for one group.
    pub async fn group_report(&self, group_name: Option<&str>) -> HalResult<GroupReport> {
        let group = self.group_arg(group_name)?;
        self.require_group(&group).await?;
        self.build_group_report(group).await
    }

    async fn build_group_report(&self, group: GroupName) -> HalResult<GroupReport> {
        let members = self
            .backend
            .members(&group)
            .await?
            .into_iter()
            .map(MemberReport::from_device)
            .collect();
        let default_vlan_id = self.store.lock().await.get(&group).await?;
        Ok(GroupReport {
            group,
            default_vlan_id,
            members,
        })
    }

    /// Reports for every bridge whose name matches the group pattern.
    pub async fn all_groups_report(&self) -> HalResult<AllGroupsReport> {
        let mut groups = Vec::new();
        for name in self.backend.list_bridges().await? {
            match self.pattern.recognize(&name) {
                Ok(group) => groups.push(self.build_group_report(group).await?),
                Err(_) => debug!("Skipping unmanaged bridge {}", name),
            }
        }
        Ok(AllGroupsReport { groups })
    }

    /// Contents of the VLAN config store.
    pub async fn vlan_config_report(&self) -> HalResult<VlanConfigReport> {
        let entries = self
            .store
            .lock()
            .await
            .entries()
            .await?
            .into_iter()
            .map(|(group, vlan_id)| VlanConfigEntry { group, vlan_id })
            .collect();
        Ok(VlanConfigReport { entries })
    }

    /// Writes the membership of one group to `out`.
    pub async fn print_group<W: Write>(
        &self,
        group_name: Option<&str>,
        out: &mut W,
    ) -> HalResult<()> {
        let report = self.group_report(group_name).await?;
        write!(out, "{}", report)?;
        Ok(())
    }

    /// Writes every managed group to `out`.
    pub async fn print_all_groups<W: Write>(&self, out: &mut W) -> HalResult<()> {
        let report = self.all_groups_report().await?;
        write!(out, "{}", report)?;
        Ok(())
    }

    /// Writes the VLAN config store to `out`.
    pub async fn print_all_vlan_id_configuration<W: Write>(&self, out: &mut W) -> HalResult<()> {
        let report = self.vlan_config_report().await?;
        write!(out, "{}", report)?;
        Ok(())
    }

    // ---- bridge probes ----

    /// Returns whether a bridge named `br_name` exists.
    pub async fn is_group_available_in_linux_bridge(
        &self,
        br_name: Option<&str>,
    ) -> HalResult<bool> {
        let bridge = Self::bridge_arg(br_name)?;
        self.backend.group_exists(&bridge).await
    }

    /// Returns whether `<if_name>.<vlan_id>` is enslaved to any bridge.
    pub async fn is_interface_available_in_linux_bridge(
        &self,
        if_name: Option<&str>,
        vlan_id: Option<&str>,
    ) -> HalResult<bool> {
        let sub = Self::sub_interface_arg(if_name, vlan_id)?;
        self.backend.interface_exists(&sub).await
    }

    /// Returns whether `<if_name>.<vlan_id>` is enslaved to `br_name`.
    pub async fn is_interface_available_in_given_linux_bridge(
        &self,
        if_name: Option<&str>,
        br_name: Option<&str>,
        vlan_id: Option<&str>,
    ) -> HalResult<bool> {
        let iface = if_name.ok_or_else(|| VlanHalError::missing(IFACE_ARG))?;
        let bridge = Self::bridge_arg(br_name)?;
        let sub = Self::sub_interface_arg(Some(iface), vlan_id)?;
        self.backend.interface_exists_in_group(&sub, &bridge).await
    }

    // ---- VLAN config store ----

    /// Persists a group → VLAN ID mapping, replacing any previous one.
    ///
    /// The group does not need to exist in the bridge layer.
    #[instrument(skip(self))]
    pub async fn insert_vlan_config_entry(
        &self,
        group_name: Option<&str>,
        vlan_id: Option<&str>,
    ) -> HalResult<()> {
        let group = self.group_arg(group_name)?;
        let vlan_id = Self::vlan_arg(vlan_id)?;
        self.store.lock().await.insert(&group, vlan_id).await?;
        info!("Stored VLAN {} for group {}", vlan_id, group);
        Ok(())
    }

    /// Removes the persisted mapping for a group.
    #[instrument(skip(self))]
    pub async fn delete_vlan_config_entry(&self, group_name: Option<&str>) -> HalResult<()> {
        let group = self.group_arg(group_name)?;
        match self.store.lock().await.remove(&group).await? {
            Some(vlan_id) => {
                info!("Removed VLAN {} entry for group {}", vlan_id, group);
                Ok(())
            }
            None => Err(VlanHalError::not_found("VLAN config entry", group.as_str())),
        }
    }

    /// Looks up the persisted VLAN ID for a group.
    pub async fn get_vlan_id_for_group_name(&self, group_name: Option<&str>) -> HalResult<VlanId> {
        let group = self.group_arg(group_name)?;
        self.store
            .lock()
            .await
            .get(&group)
            .await?
            .ok_or_else(|| VlanHalError::not_found("VLAN config entry", group.as_str()))
    }
}

/// HAL with the backend chosen at runtime and a file-backed store.
pub type DynVlanHal = VlanHal<Box<dyn BridgeBackend>, FileConfigStore>;

impl DynVlanHal {
    /// Builds the HAL described by `config`.
    ///
    /// The mock backend keeps its bridges in [`HalConfig::mock_state_path`]
    /// so that they outlive the process, like the store does.
    pub fn from_config(config: &HalConfig) -> HalResult<Self> {
        let backend: Box<dyn BridgeBackend> = match config.backend {
            BackendKind::Linux => {
                let bridge = LinuxBridge::new();
                Box::new(match config.command_timeout() {
                    Some(timeout) => bridge.with_timeout(timeout),
                    None => bridge,
                })
            }
            BackendKind::Mock => Box::new(MockBridge::with_state_file(config.mock_state_path())?),
        };
        info!(
            backend = ?config.backend,
            store = %config.store_path.display(),
            "VLAN HAL configured"
        );
        Ok(VlanHal::new(
            backend,
            FileConfigStore::new(&config.store_path),
            config.group_prefixes.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBridge;
    use crate::store::MemoryConfigStore;
    use pretty_assertions::assert_eq;

    fn hal() -> VlanHal<MockBridge, MemoryConfigStore> {
        VlanHal::new(
            MockBridge::new(),
            MemoryConfigStore::new(),
            GroupNamePattern::default(),
        )
    }

    #[tokio::test]
    async fn test_add_group_creates_bridge_and_entry() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("1")).await.unwrap();

        assert!(hal
            .is_group_available_in_linux_bridge(Some("brlan0"))
            .await
            .unwrap());
        assert_eq!(
            hal.get_vlan_id_for_group_name(Some("brlan0")).await.unwrap(),
            VlanId::DEFAULT
        );
        let cmds = hal.backend().captured_commands();
        assert!(cmds.iter().any(|c| c.contains("addbr \"brlan0\"")));
    }

    #[tokio::test]
    async fn test_add_group_is_idempotent() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("1")).await.unwrap();
        hal.add_group(Some("brlan0"), Some("1")).await.unwrap();

        let cmds = hal.backend().captured_commands();
        assert_eq!(cmds.iter().filter(|c| c.contains("addbr")).count(), 1);
    }

    #[tokio::test]
    async fn test_add_group_validation_has_no_side_effects() {
        let hal = hal();
        assert!(hal.add_group(Some("brlan0"), Some("4095")).await.is_err());
        assert!(hal.backend().captured_commands().is_empty());
        assert!(hal.vlan_config_report().await.unwrap().entries.is_empty());
    }

    #[tokio::test]
    async fn test_add_interface_requires_group() {
        let hal = hal();
        let err = hal
            .add_interface(Some("brlan0"), Some("eth0"), Some("100"))
            .await
            .unwrap_err();
        assert!(matches!(err, VlanHalError::NotFound { kind: "group", .. }));
    }

    #[tokio::test]
    async fn test_add_interface_conflicting_bridge() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("1")).await.unwrap();
        hal.add_group(Some("brlan1"), Some("1")).await.unwrap();
        hal.add_interface(Some("brlan0"), Some("eth0"), Some("100"))
            .await
            .unwrap();

        let err = hal
            .add_interface(Some("brlan1"), Some("eth0"), Some("100"))
            .await
            .unwrap_err();
        assert!(matches!(err, VlanHalError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_del_interface_missing_membership() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("1")).await.unwrap();
        let err = hal
            .del_interface(Some("brlan0"), Some("eth0"), Some("100"))
            .await
            .unwrap_err();
        assert!(matches!(err, VlanHalError::NotFound { kind: "bridge port", .. }));
    }

    #[tokio::test]
    async fn test_del_interface_removes_device() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("1")).await.unwrap();
        hal.add_interface(Some("brlan0"), Some("eth0"), Some("100"))
            .await
            .unwrap();
        hal.del_interface(Some("brlan0"), Some("eth0"), Some("100"))
            .await
            .unwrap();

        assert!(!hal.backend().has_device("eth0.100"));
        assert!(!hal
            .is_interface_available_in_linux_bridge(Some("eth0"), Some("100"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_all_interfaces_keeps_plain_ports() {
        let hal = VlanHal::new(
            MockBridge::new().with_member("brlan0", "wl0"),
            MemoryConfigStore::new(),
            GroupNamePattern::default(),
        );
        hal.add_interface(Some("brlan0"), Some("eth0"), Some("10"))
            .await
            .unwrap();
        hal.add_interface(Some("brlan0"), Some("eth1"), Some("20"))
            .await
            .unwrap();

        assert_eq!(hal.delete_all_interfaces(Some("brlan0")).await.unwrap(), 3);
        assert!(hal.backend().has_device("wl0"));
        assert!(!hal.backend().has_device("eth0.10"));
        assert_eq!(hal.delete_all_interfaces(Some("brlan0")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_del_group_nonexistent_succeeds() {
        let hal = hal();
        hal.del_group(Some("brlan7")).await.unwrap();
        assert!(hal.del_group(Some("brlan")).await.is_err());
        assert!(hal.del_group(Some("")).await.is_err());
        assert!(hal.del_group(None).await.is_err());
    }

    #[tokio::test]
    async fn test_del_group_removes_everything() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("5")).await.unwrap();
        hal.add_interface(Some("brlan0"), Some("eth0"), Some("5"))
            .await
            .unwrap();

        hal.del_group(Some("brlan0")).await.unwrap();

        assert!(!hal
            .is_group_available_in_linux_bridge(Some("brlan0"))
            .await
            .unwrap());
        assert!(hal.get_vlan_id_for_group_name(Some("brlan0")).await.is_err());
        assert!(!hal.backend().has_device("eth0.5"));
    }

    #[tokio::test]
    async fn test_given_bridge_membership() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("1")).await.unwrap();
        hal.add_interface(Some("brlan0"), Some("eth0"), Some("100"))
            .await
            .unwrap();

        async fn in_bridge(
            hal: &VlanHal<MockBridge, MemoryConfigStore>,
            iface: Option<&str>,
            bridge: Option<&str>,
        ) -> HalResult<bool> {
            hal.is_interface_available_in_given_linux_bridge(iface, bridge, Some("100"))
                .await
        }
        assert!(in_bridge(&hal, Some("eth0"), Some("brlan0")).await.unwrap());
        assert!(!in_bridge(&hal, Some("eth0"), Some("brlan1")).await.unwrap());
        assert!(in_bridge(&hal, None, Some("brlan0")).await.is_err());
        assert!(in_bridge(&hal, Some("eth0"), None).await.is_err());
        assert!(in_bridge(&hal, Some("eth0"), Some("")).await.is_err());
        assert!(in_bridge(&hal, Some("eth0"), Some("br@lan0")).await.is_err());
        assert!(in_bridge(&hal, Some(""), Some("brlan0")).await.is_err());
        assert!(in_bridge(&hal, Some("eth 0"), Some("brlan0")).await.is_err());
    }

    #[tokio::test]
    async fn test_config_entry_round_trip() {
        let hal = hal();
        hal.insert_vlan_config_entry(Some("brlan0"), Some("100"))
            .await
            .unwrap();
        let vid = hal.get_vlan_id_for_group_name(Some("brlan0")).await.unwrap();
        assert_eq!(vid.to_string(), "100");

        hal.delete_vlan_config_entry(Some("brlan0")).await.unwrap();
        assert!(matches!(
            hal.delete_vlan_config_entry(Some("brlan0")).await,
            Err(VlanHalError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_print_group() {
        let hal = hal();
        hal.add_group(Some("brlan0"), Some("100")).await.unwrap();
        hal.add_interface(Some("brlan0"), Some("eth0"), Some("100"))
            .await
            .unwrap();

        let mut out = Vec::new();
        hal.print_group(Some("brlan0"), &mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Group: brlan0"));
        assert!(text.contains("eth0.100"));

        let mut out = Vec::new();
        assert!(hal.print_group(Some("BrLan0"), &mut out).await.is_err());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_all_groups_skips_unmanaged_bridges() {
        let hal = VlanHal::new(
            MockBridge::new().with_bridge("docker0").with_bridge("brlan1"),
            MemoryConfigStore::new(),
            GroupNamePattern::default(),
        );
        let report = hal.all_groups_report().await.unwrap();
        assert_eq!(report.groups.len(), 1);
        assert_eq!(report.groups[0].group.as_str(), "brlan1");
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let hal = hal();
        hal.backend().fail_on("addbr");
        let err = hal.add_group(Some("brlan0"), Some("1")).await.unwrap_err();
        assert!(!err.is_validation_error());
        assert!(hal.get_vlan_id_for_group_name(Some("brlan0")).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_store_write_rolls_back() {
        let dir = tempfile::TempDir::new().unwrap();
        let hal = VlanHal::new(
            MockBridge::new(),
            FileConfigStore::new(dir.path().join("vlan.json")),
            GroupNamePattern::default(),
        );
        std::fs::create_dir(dir.path().join("vlan.json.tmp")).unwrap();

        assert!(hal
            .insert_vlan_config_entry(Some("brlan0"), Some("100"))
            .await
            .is_err());
        assert!(hal.get_vlan_id_for_group_name(Some("brlan0")).await.is_err());

        assert!(hal.add_group(Some("brlan1"), Some("7")).await.is_err());
        assert!(!hal
            .is_group_available_in_linux_bridge(Some("brlan1"))
            .await
            .unwrap());
        assert!(hal.get_vlan_id_for_group_name(Some("brlan1")).await.is_err());
    }

    #[tokio::test]
    async fn test_from_config_mock_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = HalConfig {
            backend: BackendKind::Mock,
            store_path: dir.path().join("vlan.json"),
            ..HalConfig::default()
        };
        let hal = DynVlanHal::from_config(&config).unwrap();
        hal.add_group(Some("brlan2"), Some("42")).await.unwrap();

        assert!(dir.path().join("vlan.json").exists());
        assert!(dir.path().join("vlan.bridges.json").exists());

        let reopened = DynVlanHal::from_config(&config).unwrap();
        reopened
            .add_interface(Some("brlan2"), Some("eth0"), Some("42"))
            .await
            .unwrap();
        assert_eq!(
            hal.get_vlan_id_for_group_name(Some("brlan2"))
                .await
                .unwrap()
                .as_u16(),
            42
        );
    }
}
