//! In-memory bridge backend.
//!
//! Mirrors the kernel state the Linux backend would produce and records the
//! command lines it would have issued, so tests can assert on both. The
//! bridge layout can be kept in a state file so separate processes see the
//! same bridges.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use vlan_hal_types::{GroupName, SubInterface};

use crate::bridge::BridgeBackend;
use crate::commands::{
    build_add_bridge_cmd, build_add_member_cmd, build_add_vlan_device_cmd, build_del_bridge_cmd,
    build_del_member_cmd, build_del_vlan_device_cmd,
};
use crate::error::{HalResult, VlanHalError};

#[derive(Debug, Default, Serialize, Deserialize)]
struct MockState {
    /// bridge -> enslaved devices
    #[serde(default)]
    bridges: BTreeMap<String, BTreeSet<String>>,
    /// device -> master bridge
    #[serde(default)]
    devices: BTreeMap<String, Option<String>>,
    #[serde(skip)]
    captured_commands: Vec<String>,
    #[serde(skip)]
    fail_patterns: Vec<String>,
}

impl MockState {
    fn run(&mut self, cmd: String) -> HalResult<()> {
        if self.fail_patterns.iter().any(|p| cmd.contains(p.as_str())) {
            return Err(VlanHalError::ShellCommandFailed {
                command: cmd,
                exit_code: 1,
                output: "injected failure".to_string(),
            });
        }
        debug!("Mock exec: {}", cmd);
        self.captured_commands.push(cmd);
        Ok(())
    }
}

/// Bridge backend that keeps bridge state in memory.
#[derive(Debug, Default)]
pub struct MockBridge {
    state: Mutex<MockState>,
    state_path: Option<PathBuf>,
}

impl MockBridge {
    /// Creates an empty bridge layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bridge layer backed by the JSON state file at `path`.
    ///
    /// A missing file starts empty. Every mutation rewrites the file.
    pub fn with_state_file(path: impl Into<PathBuf>) -> HalResult<Self> {
        let path = path.into();
        let state = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<MockState>(&bytes).map_err(|e| {
                VlanHalError::invalid_config(path.display().to_string(), e.to_string())
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => MockState::default(),
            Err(e) => return Err(e.into()),
        };
        info!(
            "Loaded {} mock bridges from {}",
            state.bridges.len(),
            path.display()
        );
        Ok(Self {
            state: Mutex::new(state),
            state_path: Some(path),
        })
    }

    /// Path of the state file, if any.
    pub fn state_path(&self) -> Option<&Path> {
        self.state_path.as_deref()
    }

    /// Adds a pre-existing bridge, e.g. one created outside the HAL.
    pub fn with_bridge(self, name: &str) -> Self {
        self.lock().bridges.entry(name.to_string()).or_default();
        self
    }

    /// Adds a plain device enslaved to an existing bridge.
    pub fn with_member(self, bridge: &str, device: &str) -> Self {
        {
            let mut state = self.lock();
            state
                .bridges
                .entry(bridge.to_string())
                .or_default()
                .insert(device.to_string());
            state
                .devices
                .insert(device.to_string(), Some(bridge.to_string()));
        }
        self
    }

    /// Makes every command containing `pattern` fail.
    pub fn fail_on(&self, pattern: impl Into<String>) {
        self.lock().fail_patterns.push(pattern.into());
    }

    /// Gets captured commands
    pub fn captured_commands(&self) -> Vec<String> {
        self.lock().captured_commands.clone()
    }

    /// Forgets captured commands.
    pub fn clear_commands(&self) {
        self.lock().captured_commands.clear();
    }

    /// Returns true if `device` exists, enslaved or not.
    pub fn has_device(&self, device: &str) -> bool {
        self.lock().devices.contains_key(device)
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panic while holding the lock leaves the maps consistent; keep going.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn save(&self) -> HalResult<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        let json = serde_json::to_vec_pretty(&*self.lock())
            .map_err(|e| VlanHalError::store(format!("failed to serialize mock state: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await.map_err(|e| {
            VlanHalError::store(format!("failed to write {}: {}", path.display(), e))
        })
    }
}

#[async_trait]
impl BridgeBackend for MockBridge {
    async fn list_bridges(&self) -> HalResult<Vec<String>> {
        Ok(self.lock().bridges.keys().cloned().collect())
    }

    async fn group_exists(&self, group: &GroupName) -> HalResult<bool> {
        Ok(self.lock().bridges.contains_key(group.as_str()))
    }

    async fn create_bridge(&self, group: &GroupName) -> HalResult<()> {
        {
            let mut state = self.lock();
            if state.bridges.contains_key(group.as_str()) {
                return Err(VlanHalError::ShellCommandFailed {
                    command: build_add_bridge_cmd(group),
                    exit_code: 1,
                    output: format!(
                        "device {} already exists; can't create bridge with the same name",
                        group
                    ),
                });
            }
            state.run(build_add_bridge_cmd(group))?;
            state.bridges.insert(group.to_string(), BTreeSet::new());
        }
        self.save().await
    }

    async fn delete_bridge(&self, group: &GroupName) -> HalResult<()> {
        {
            let mut state = self.lock();
            state.run(build_del_bridge_cmd(group))?;
            if let Some(members) = state.bridges.remove(group.as_str()) {
                for device in members {
                    if let Some(master) = state.devices.get_mut(&device) {
                        *master = None;
                    }
                }
            }
        }
        self.save().await
    }

    async fn members(&self, group: &GroupName) -> HalResult<Vec<String>> {
        Ok(self
            .lock()
            .bridges
            .get(group.as_str())
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn attached_bridge(&self, sub: &SubInterface) -> HalResult<Option<String>> {
        Ok(self
            .lock()
            .devices
            .get(&sub.device_name())
            .cloned()
            .flatten())
    }

    async fn attach(&self, group: &GroupName, sub: &SubInterface) -> HalResult<()> {
        let device = sub.device_name();
        {
            let mut state = self.lock();
            if !state.devices.contains_key(&device) {
                state.run(build_add_vlan_device_cmd(sub))?;
                state.devices.insert(device.clone(), None);
            }
            state.run(build_add_member_cmd(group, &device))?;
            state
                .bridges
                .entry(group.to_string())
                .or_default()
                .insert(device.clone());
            state.devices.insert(device, Some(group.to_string()));
        }
        self.save().await
    }

    async fn detach(&self, group: &GroupName, device: &str) -> HalResult<()> {
        {
            let mut state = self.lock();
            state.run(build_del_member_cmd(group, device))?;
            if let Some(members) = state.bridges.get_mut(group.as_str()) {
                members.remove(device);
            }
            if let Some(master) = state.devices.get_mut(device) {
                *master = None;
            }
        }
        self.save().await
    }

    async fn delete_vlan_device(&self, sub: &SubInterface) -> HalResult<()> {
        let device = sub.device_name();
        {
            let mut state = self.lock();
            state.run(build_del_vlan_device_cmd(sub))?;
            if let Some(Some(master)) = state.devices.remove(&device) {
                if let Some(members) = state.bridges.get_mut(&master) {
                    members.remove(&device);
                }
            }
        }
        self.save().await
    }
}
