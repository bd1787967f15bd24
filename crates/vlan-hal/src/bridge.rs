//! Bridge layer abstraction and its Linux implementation.
//!
//! [`BridgeBackend`] is the capability set the HAL needs from the OS:
//! bridge lifecycle, port enslavement and the three introspection probes.
//! [`LinuxBridge`] drives `brctl` and `ip`; [`crate::MockBridge`] keeps the
//! same state in memory for tests.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument};
use vlan_hal_types::{GroupName, SubInterface};

use crate::commands::{
    build_add_bridge_cmd, build_add_member_cmd, build_add_vlan_device_cmd,
    build_check_bridge_exists_cmd, build_del_bridge_cmd, build_del_member_cmd,
    build_del_vlan_device_cmd, build_list_bridges_cmd, build_list_members_cmd,
    build_show_link_cmd,
};
use crate::error::HalResult;
use crate::link::{parse_link_line, parse_links};
use crate::shell;

/// Operations the HAL performs against the bridge layer.
#[async_trait]
pub trait BridgeBackend: Send + Sync {
    /// Names of every bridge device present.
    async fn list_bridges(&self) -> HalResult<Vec<String>>;

    /// Returns true if `group` exists and is a bridge.
    async fn group_exists(&self, group: &GroupName) -> HalResult<bool>;

    /// Creates the bridge and brings it up.
    async fn create_bridge(&self, group: &GroupName) -> HalResult<()>;

    /// Brings the bridge down and deletes it.
    async fn delete_bridge(&self, group: &GroupName) -> HalResult<()>;

    /// Device names currently enslaved to `group`.
    async fn members(&self, group: &GroupName) -> HalResult<Vec<String>>;

    /// Bridge the sub-interface is enslaved to, if it exists and has one.
    async fn attached_bridge(&self, sub: &SubInterface) -> HalResult<Option<String>>;

    /// Creates the sub-interface if needed and enslaves it to `group`.
    async fn attach(&self, group: &GroupName, sub: &SubInterface) -> HalResult<()>;

    /// Releases `device` from `group`.
    async fn detach(&self, group: &GroupName, device: &str) -> HalResult<()>;

    /// Deletes the sub-interface device.
    async fn delete_vlan_device(&self, sub: &SubInterface) -> HalResult<()>;

    /// Returns true if the sub-interface is enslaved to any bridge.
    async fn interface_exists(&self, sub: &SubInterface) -> HalResult<bool> {
        Ok(self.attached_bridge(sub).await?.is_some())
    }

    /// Returns true if the sub-interface is enslaved to `group`.
    async fn interface_exists_in_group(
        &self,
        sub: &SubInterface,
        group: &GroupName,
    ) -> HalResult<bool> {
        Ok(self.attached_bridge(sub).await?.as_deref() == Some(group.as_str()))
    }
}

#[async_trait]
impl<T: BridgeBackend + ?Sized> BridgeBackend for Box<T> {
    async fn list_bridges(&self) -> HalResult<Vec<String>> {
        (**self).list_bridges().await
    }

    async fn group_exists(&self, group: &GroupName) -> HalResult<bool> {
        (**self).group_exists(group).await
    }

    async fn create_bridge(&self, group: &GroupName) -> HalResult<()> {
        (**self).create_bridge(group).await
    }

    async fn delete_bridge(&self, group: &GroupName) -> HalResult<()> {
        (**self).delete_bridge(group).await
    }

    async fn members(&self, group: &GroupName) -> HalResult<Vec<String>> {
        (**self).members(group).await
    }

    async fn attached_bridge(&self, sub: &SubInterface) -> HalResult<Option<String>> {
        (**self).attached_bridge(sub).await
    }

    async fn attach(&self, group: &GroupName, sub: &SubInterface) -> HalResult<()> {
        (**self).attach(group, sub).await
    }

    async fn detach(&self, group: &GroupName, device: &str) -> HalResult<()> {
        (**self).detach(group, device).await
    }

    async fn delete_vlan_device(&self, sub: &SubInterface) -> HalResult<()> {
        (**self).delete_vlan_device(sub).await
    }
}

/// Bridge backend that shells out to `brctl` and `ip`.
#[derive(Debug, Clone, Default)]
pub struct LinuxBridge {
    timeout: Option<Duration>,
}

impl LinuxBridge {
    /// Creates a backend without a command timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills any command that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn run(&self, cmd: &str) -> HalResult<String> {
        shell::exec_or_throw(cmd, self.timeout).await
    }

    async fn device_exists(&self, device: &str) -> HalResult<bool> {
        let result = shell::exec(&build_show_link_cmd(device), self.timeout).await?;
        Ok(result.success())
    }
}

#[async_trait]
impl BridgeBackend for LinuxBridge {
    async fn list_bridges(&self) -> HalResult<Vec<String>> {
        let output = self.run(&build_list_bridges_cmd()).await?;
        Ok(parse_links(&output).into_iter().map(|l| l.name).collect())
    }

    async fn group_exists(&self, group: &GroupName) -> HalResult<bool> {
        let result = shell::exec(&build_check_bridge_exists_cmd(group), self.timeout).await?;
        debug!(bridge = %group, exists = result.success(), "Checked bridge");
        Ok(result.success())
    }

    #[instrument(skip(self))]
    async fn create_bridge(&self, group: &GroupName) -> HalResult<()> {
        self.run(&build_add_bridge_cmd(group)).await?;
        info!("Created bridge {}", group);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_bridge(&self, group: &GroupName) -> HalResult<()> {
        self.run(&build_del_bridge_cmd(group)).await?;
        info!("Deleted bridge {}", group);
        Ok(())
    }

    async fn members(&self, group: &GroupName) -> HalResult<Vec<String>> {
        let output = self.run(&build_list_members_cmd(group)).await?;
        Ok(parse_links(&output).into_iter().map(|l| l.name).collect())
    }

    async fn attached_bridge(&self, sub: &SubInterface) -> HalResult<Option<String>> {
        let result = shell::exec(&build_show_link_cmd(&sub.device_name()), self.timeout).await?;
        if !result.success() {
            return Ok(None);
        }
        Ok(parse_link_line(&result.stdout).and_then(|l| l.master))
    }

    #[instrument(skip(self))]
    async fn attach(&self, group: &GroupName, sub: &SubInterface) -> HalResult<()> {
        let device = sub.device_name();
        if !self.device_exists(&device).await? {
            self.run(&build_add_vlan_device_cmd(sub)).await?;
            debug!("Created VLAN device {}", device);
        }
        self.run(&build_add_member_cmd(group, &device)).await?;
        info!("Attached {} to {}", device, group);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn detach(&self, group: &GroupName, device: &str) -> HalResult<()> {
        self.run(&build_del_member_cmd(group, device)).await?;
        info!("Detached {} from {}", device, group);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_vlan_device(&self, sub: &SubInterface) -> HalResult<()> {
        self.run(&build_del_vlan_device_cmd(sub)).await?;
        debug!("Deleted VLAN device {}", sub);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_bridge_timeout() {
        let bridge = LinuxBridge::new().with_timeout(Duration::from_secs(3));
        assert_eq!(bridge.timeout, Some(Duration::from_secs(3)));
        assert_eq!(LinuxBridge::default().timeout, None);
    }

    #[tokio::test]
    async fn test_group_exists_missing_bridge() {
        // No sysfs entry for a name this unlikely; the probe must report
        // absence instead of failing.
        let group = GroupName::new("brlan9999").unwrap();
        let exists = LinuxBridge::new().group_exists(&group).await;
        assert!(matches!(exists, Ok(false)));
    }
}
