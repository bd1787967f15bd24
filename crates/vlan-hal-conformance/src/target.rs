//! The implementation under test.

use async_trait::async_trait;
use std::io;
use vlan_hal::{
    return_code, BridgeBackend, ConfigStore, HalResult, VlanHal, VlanHalError, RETURN_ERR,
    RETURN_OK,
};

use crate::contract::Call;

/// What a HAL call returned at the C boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallOutcome {
    /// `RETURN_OK` or `RETURN_ERR`
    pub code: i32,
    /// Contents of the output buffer, for calls that fill one
    pub output: Option<String>,
}

impl CallOutcome {
    /// A successful call without output.
    pub fn ok() -> Self {
        Self {
            code: RETURN_OK,
            output: None,
        }
    }

    /// A failed call.
    pub fn err() -> Self {
        Self {
            code: RETURN_ERR,
            output: None,
        }
    }

    /// Returns true for `RETURN_OK`.
    pub fn is_ok(&self) -> bool {
        self.code == RETURN_OK
    }

    fn from_result<T>(result: HalResult<T>) -> Self {
        Self {
            code: return_code(&result),
            output: None,
        }
    }
}

/// A VLAN HAL seen through its two-valued C contract.
#[async_trait]
pub trait ConformanceTarget: Send + Sync {
    /// Performs `call` and reports the sentinel it produced.
    async fn invoke(&self, call: &Call) -> CallOutcome;
}

fn probe(found: HalResult<bool>) -> HalResult<()> {
    match found? {
        true => Ok(()),
        false => Err(VlanHalError::not_found("probe", "")),
    }
}

#[async_trait]
impl<B, S> ConformanceTarget for VlanHal<B, S>
where
    B: BridgeBackend,
    S: ConfigStore,
{
    async fn invoke(&self, call: &Call) -> CallOutcome {
        let result = match call {
            Call::AddGroup { group, vlan_id } => {
                self.add_group(group.as_deref(), vlan_id.as_deref()).await
            }
            Call::DelGroup { group } => self.del_group(group.as_deref()).await,
            Call::AddInterface {
                group,
                iface,
                vlan_id,
            } => {
                self.add_interface(group.as_deref(), iface.as_deref(), vlan_id.as_deref())
                    .await
            }
            Call::DelInterface {
                group,
                iface,
                vlan_id,
            } => {
                self.del_interface(group.as_deref(), iface.as_deref(), vlan_id.as_deref())
                    .await
            }
            Call::DeleteAllInterfaces { group } => self
                .delete_all_interfaces(group.as_deref())
                .await
                .map(|_| ()),
            Call::PrintGroup { group } => self.print_group(group.as_deref(), &mut io::sink()).await,
            Call::PrintAllGroup => self.print_all_groups(&mut io::sink()).await,
            Call::PrintAllVlanIdConfiguration => {
                self.print_all_vlan_id_configuration(&mut io::sink()).await
            }
            Call::IsGroupAvailable { bridge } => {
                probe(self.is_group_available_in_linux_bridge(bridge.as_deref()).await)
            }
            Call::IsInterfaceAvailable { iface, vlan_id } => probe(
                self.is_interface_available_in_linux_bridge(iface.as_deref(), vlan_id.as_deref())
                    .await,
            ),
            Call::IsInterfaceAvailableInBridge {
                iface,
                bridge,
                vlan_id,
            } => probe(
                self.is_interface_available_in_given_linux_bridge(
                    iface.as_deref(),
                    bridge.as_deref(),
                    vlan_id.as_deref(),
                )
                .await,
            ),
            Call::InsertVlanConfigEntry { group, vlan_id } => {
                self.insert_vlan_config_entry(group.as_deref(), vlan_id.as_deref())
                    .await
            }
            Call::DeleteVlanConfigEntry { group } => {
                self.delete_vlan_config_entry(group.as_deref()).await
            }
            Call::GetVlanId { group } => {
                return match self.get_vlan_id_for_group_name(group.as_deref()).await {
                    Ok(vlan_id) => CallOutcome {
                        code: RETURN_OK,
                        output: Some(vlan_id.to_string()),
                    },
                    Err(_) => CallOutcome::err(),
                };
            }
        };
        CallOutcome::from_result(result)
    }
}
