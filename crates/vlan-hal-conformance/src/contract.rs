//! The VLAN HAL behavioral contract as a case table.
//!
//! Each [`ContractCase`] is a short sequence of calls against a fresh HAL,
//! every one with an expected sentinel. The case families are:
//!
//! - validity gate: NULL, empty and unknown group names are rejected
//! - VLAN ID range: only decimal strings in `[1, 4094]` are accepted
//! - idempotence of `addGroup` and `addInterface`
//! - config store round trip through `getVlanIdForGroupName`
//! - the end-to-end group/interface/probe scenarios
//!
//! Cases are built from a [`HalFixtures`] profile passed in by the caller;
//! a profile that fails [`HalFixtures::validate`] yields an error instead.

use std::fmt;

use crate::fixtures::{FixtureError, HalFixtures, INVALID_VLAN_IDS};

/// Cases of one family, or why the profile cannot produce them
pub type CaseResult = Result<Vec<ContractCase>, FixtureError>;

/// A nullable string argument. `None` is a NULL pointer.
pub type Arg = Option<String>;

/// One HAL entry point with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AddGroup { group: Arg, vlan_id: Arg },
    DelGroup { group: Arg },
    AddInterface {
        group: Arg,
        iface: Arg,
        vlan_id: Arg,
    },
    DelInterface {
        group: Arg,
        iface: Arg,
        vlan_id: Arg,
    },
    DeleteAllInterfaces { group: Arg },
    PrintGroup { group: Arg },
    PrintAllGroup,
    PrintAllVlanIdConfiguration,
    IsGroupAvailable { bridge: Arg },
    IsInterfaceAvailable { iface: Arg, vlan_id: Arg },
    IsInterfaceAvailableInBridge {
        iface: Arg,
        bridge: Arg,
        vlan_id: Arg,
    },
    InsertVlanConfigEntry { group: Arg, vlan_id: Arg },
    DeleteVlanConfigEntry { group: Arg },
    GetVlanId { group: Arg },
}

struct ShowArg<'a>(&'a Arg);

impl fmt::Display for ShowArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(s) => write!(f, "{:?}", s),
            None => f.write_str("NULL"),
        }
    }
}

impl Call {
    /// The C name of the entry point.
    pub fn name(&self) -> &'static str {
        match self {
            Call::AddGroup { .. } => "addGroup",
            Call::DelGroup { .. } => "delGroup",
            Call::AddInterface { .. } => "addInterface",
            Call::DelInterface { .. } => "delInterface",
            Call::DeleteAllInterfaces { .. } => "deleteAllInterfaces",
            Call::PrintGroup { .. } => "printGroup",
            Call::PrintAllGroup => "printAllGroup",
            Call::PrintAllVlanIdConfiguration => "printAllVlanIdConfiguration",
            Call::IsGroupAvailable { .. } => "isGroupAvailableInLinuxBridge",
            Call::IsInterfaceAvailable { .. } => "isInterfaceAvailableInLinuxBridge",
            Call::IsInterfaceAvailableInBridge { .. } => "isInterfaceAvailableInGivenLinuxBridge",
            Call::InsertVlanConfigEntry { .. } => "insertVLANConfigEntry",
            Call::DeleteVlanConfigEntry { .. } => "deleteVLANConfigEntry",
            Call::GetVlanId { .. } => "getVlanIdForGroupName",
        }
    }

    fn args(&self) -> Vec<&Arg> {
        match self {
            Call::AddGroup { group, vlan_id } | Call::InsertVlanConfigEntry { group, vlan_id } => {
                vec![group, vlan_id]
            }
            Call::AddInterface {
                group,
                iface,
                vlan_id,
            }
            | Call::DelInterface {
                group,
                iface,
                vlan_id,
            } => vec![group, iface, vlan_id],
            Call::DelGroup { group }
            | Call::DeleteAllInterfaces { group }
            | Call::PrintGroup { group }
            | Call::DeleteVlanConfigEntry { group }
            | Call::GetVlanId { group } => vec![group],
            Call::PrintAllGroup | Call::PrintAllVlanIdConfiguration => Vec::new(),
            Call::IsGroupAvailable { bridge } => vec![bridge],
            Call::IsInterfaceAvailable { iface, vlan_id } => vec![iface, vlan_id],
            Call::IsInterfaceAvailableInBridge {
                iface,
                bridge,
                vlan_id,
            } => vec![iface, bridge, vlan_id],
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, arg) in self.args().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ShowArg(arg))?;
        }
        f.write_str(")")
    }
}

/// Expected result of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expect {
    /// `RETURN_OK`
    Ok,
    /// `RETURN_ERR`
    Err,
    /// `RETURN_OK` with this decimal VLAN ID in the output buffer
    VlanId(String),
}

impl fmt::Display for Expect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expect::Ok => f.write_str("RETURN_OK"),
            Expect::Err => f.write_str("RETURN_ERR"),
            Expect::VlanId(v) => write!(f, "RETURN_OK with VLAN ID {}", v),
        }
    }
}

/// A call and the result it must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub call: Call,
    pub expect: Expect,
}

/// A named sequence of steps run against a fresh HAL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCase {
    pub name: String,
    pub steps: Vec<Step>,
}

impl ContractCase {
    /// Starts an empty case.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step that must succeed.
    pub fn ok(self, call: Call) -> Self {
        self.step(call, Expect::Ok)
    }

    /// Appends a step that must fail.
    pub fn err(self, call: Call) -> Self {
        self.step(call, Expect::Err)
    }

    /// Appends a step with an explicit expectation.
    pub fn step(mut self, call: Call, expect: Expect) -> Self {
        self.steps.push(Step { call, expect });
        self
    }
}

// ---- argument and call shorthands ----

fn arg(s: &str) -> Arg {
    Some(s.to_string())
}

fn add_group(group: Arg, vlan_id: Arg) -> Call {
    Call::AddGroup { group, vlan_id }
}

fn add_interface(group: Arg, iface: Arg, vlan_id: Arg) -> Call {
    Call::AddInterface {
        group,
        iface,
        vlan_id,
    }
}

fn del_interface(group: Arg, iface: Arg, vlan_id: Arg) -> Call {
    Call::DelInterface {
        group,
        iface,
        vlan_id,
    }
}

fn insert_entry(group: Arg, vlan_id: Arg) -> Call {
    Call::InsertVlanConfigEntry { group, vlan_id }
}

/// Calls taking a group name, with every other argument valid.
fn group_calls(fx: &HalFixtures, group: Arg) -> Vec<Call> {
    let iface = arg(fx.primary_interface());
    let vlan = arg(fx.primary_vlan());
    vec![
        add_group(group.clone(), vlan.clone()),
        Call::DelGroup {
            group: group.clone(),
        },
        add_interface(group.clone(), iface.clone(), vlan.clone()),
        del_interface(group.clone(), iface, vlan.clone()),
        Call::DeleteAllInterfaces {
            group: group.clone(),
        },
        Call::PrintGroup {
            group: group.clone(),
        },
        insert_entry(group.clone(), vlan),
        Call::DeleteVlanConfigEntry {
            group: group.clone(),
        },
        Call::GetVlanId { group },
    ]
}

/// Calls that need the group to exist, with every argument well-formed.
fn existence_calls(fx: &HalFixtures, group: Arg) -> Vec<Call> {
    let iface = arg(fx.primary_interface());
    let vlan = arg(fx.primary_vlan());
    vec![
        add_interface(group.clone(), iface.clone(), vlan.clone()),
        del_interface(group.clone(), iface, vlan),
        Call::DeleteAllInterfaces {
            group: group.clone(),
        },
        Call::PrintGroup {
            group: group.clone(),
        },
        Call::DeleteVlanConfigEntry {
            group: group.clone(),
        },
        Call::GetVlanId { group },
    ]
}

/// Calls taking a VLAN ID, with `vlan_id` substituted and the group set up.
fn vlan_calls(fx: &HalFixtures, vlan_id: Arg) -> Vec<Call> {
    let group = arg(fx.primary_bridge());
    let bridge = group.clone();
    let iface = arg(fx.primary_interface());
    vec![
        add_group(group.clone(), vlan_id.clone()),
        add_interface(group.clone(), iface.clone(), vlan_id.clone()),
        del_interface(group.clone(), iface.clone(), vlan_id.clone()),
        Call::IsInterfaceAvailable {
            iface: iface.clone(),
            vlan_id: vlan_id.clone(),
        },
        Call::IsInterfaceAvailableInBridge {
            iface,
            bridge,
            vlan_id: vlan_id.clone(),
        },
        insert_entry(group, vlan_id),
    ]
}

// ---- case families ----

/// NULL, empty and unrecognized group names are rejected everywhere; well
/// formed names of groups never created are rejected where existence matters.
pub fn validity_gate_cases(fx: &HalFixtures) -> CaseResult {
    fx.validate()?;
    let mut cases = Vec::new();

    for call in group_calls(fx, None) {
        cases.push(ContractCase::new(format!("{} rejects NULL group", call.name())).err(call));
    }
    for call in group_calls(fx, arg("")) {
        cases.push(ContractCase::new(format!("{} rejects empty group", call.name())).err(call));
    }
    for name in &fx.invalid_bridge_names {
        for call in group_calls(fx, arg(name)) {
            cases.push(
                ContractCase::new(format!("{} rejects group {:?}", call.name(), name)).err(call),
            );
        }
        cases.push(
            ContractCase::new(format!("isGroupAvailableInLinuxBridge rejects {:?}", name))
                .err(Call::IsGroupAvailable { bridge: arg(name) }),
        );
        cases.push(
            ContractCase::new(format!(
                "isInterfaceAvailableInGivenLinuxBridge rejects bridge {:?}",
                name
            ))
            .err(Call::IsInterfaceAvailableInBridge {
                iface: arg(fx.primary_interface()),
                bridge: arg(name),
                vlan_id: arg(fx.primary_vlan()),
            }),
        );
    }
    for call in existence_calls(fx, arg(fx.secondary_bridge())) {
        cases.push(
            ContractCase::new(format!("{} rejects group never added", call.name()))
                .ok(add_group(arg(fx.primary_bridge()), arg(fx.primary_vlan())))
                .err(call),
        );
    }

    let iface = arg(fx.primary_interface());
    let vlan = arg(fx.primary_vlan());
    let group = arg(fx.primary_bridge());
    cases.push(
        ContractCase::new("addInterface rejects NULL and empty interface")
            .ok(add_group(group.clone(), vlan.clone()))
            .err(add_interface(group.clone(), None, vlan.clone()))
            .err(add_interface(group.clone(), arg(""), vlan.clone())),
    );
    cases.push(
        ContractCase::new("interface probes reject NULL and empty names")
            .err(Call::IsInterfaceAvailable {
                iface: None,
                vlan_id: vlan.clone(),
            })
            .err(Call::IsInterfaceAvailable {
                iface: arg(""),
                vlan_id: vlan.clone(),
            })
            .err(Call::IsInterfaceAvailableInBridge {
                iface: iface.clone(),
                bridge: None,
                vlan_id: vlan.clone(),
            })
            .err(Call::IsInterfaceAvailableInBridge {
                iface: None,
                bridge: group.clone(),
                vlan_id: vlan.clone(),
            }),
    );
    for name in &fx.invalid_interface_names {
        cases.push(
            ContractCase::new(format!("interface {:?} rejected", name))
                .ok(add_group(group.clone(), vlan.clone()))
                .err(add_interface(group.clone(), arg(name), vlan.clone()))
                .err(Call::IsInterfaceAvailable {
                    iface: arg(name),
                    vlan_id: vlan.clone(),
                })
                .err(Call::IsInterfaceAvailableInBridge {
                    iface: arg(name),
                    bridge: group.clone(),
                    vlan_id: vlan.clone(),
                }),
        );
    }

    Ok(cases)
}

/// Only decimal VLAN IDs in `[1, 4094]` are accepted.
pub fn vlan_range_cases(fx: &HalFixtures) -> CaseResult {
    fx.validate()?;
    let mut cases = Vec::new();
    let group = arg(fx.primary_bridge());
    let setup = add_group(group.clone(), arg(fx.primary_vlan()));

    let invalid = std::iter::once(None).chain(INVALID_VLAN_IDS.iter().map(|v| arg(v)));
    for vlan_id in invalid {
        for call in vlan_calls(fx, vlan_id.clone()) {
            cases.push(
                ContractCase::new(format!("{} rejects VLAN ID {}", call.name(), ShowArg(&vlan_id)))
                    .ok(setup.clone())
                    .err(call),
            );
        }
    }

    let iface = arg(fx.primary_interface());
    for vlan in &fx.vlan_ids {
        let vlan_id = arg(vlan);
        cases.push(
            ContractCase::new(format!("VLAN ID {} accepted", vlan))
                .ok(add_group(group.clone(), vlan_id.clone()))
                .ok(add_interface(group.clone(), iface.clone(), vlan_id.clone()))
                .ok(Call::IsInterfaceAvailable {
                    iface: iface.clone(),
                    vlan_id: vlan_id.clone(),
                })
                .ok(del_interface(group.clone(), iface.clone(), vlan_id.clone()))
                .ok(insert_entry(group.clone(), vlan_id)),
        );
    }

    Ok(cases)
}

/// Repeating a successful add succeeds.
pub fn idempotence_cases(fx: &HalFixtures) -> CaseResult {
    fx.validate()?;
    let group = arg(fx.primary_bridge());
    let iface = arg(fx.primary_interface());
    let vlan = arg(fx.primary_vlan());
    Ok(vec![
        ContractCase::new("addGroup twice")
            .ok(add_group(group.clone(), vlan.clone()))
            .ok(add_group(group.clone(), vlan.clone())),
        ContractCase::new("addInterface twice")
            .ok(add_group(group.clone(), vlan.clone()))
            .ok(add_interface(group.clone(), iface.clone(), vlan.clone()))
            .ok(add_interface(group.clone(), iface, vlan)),
        ContractCase::new("delGroup of a group never added")
            .ok(Call::DelGroup {
                group: arg(fx.secondary_bridge()),
            }),
    ])
}

/// Config entries read back as written.
pub fn round_trip_cases(fx: &HalFixtures) -> CaseResult {
    fx.validate()?;
    let group = arg(fx.primary_bridge());
    let mut cases: Vec<ContractCase> = fx
        .vlan_ids
        .iter()
        .map(|vlan| {
            ContractCase::new(format!("VLAN config entry {} round trip", vlan))
                .ok(insert_entry(group.clone(), arg(vlan)))
                .step(
                    Call::GetVlanId {
                        group: group.clone(),
                    },
                    Expect::VlanId(canonical_vlan(vlan)),
                )
                .ok(Call::DeleteVlanConfigEntry {
                    group: group.clone(),
                })
                .err(Call::GetVlanId {
                    group: group.clone(),
                })
        })
        .collect();

    let last = fx.vlan_ids.last().map_or(fx.primary_vlan(), String::as_str);
    cases.push(
        ContractCase::new("VLAN config entry is replaced")
            .ok(insert_entry(group.clone(), arg(fx.primary_vlan())))
            .ok(insert_entry(group.clone(), arg(last)))
            .step(Call::GetVlanId { group }, Expect::VlanId(canonical_vlan(last))),
    );
    Ok(cases)
}

/// The decimal form the HAL writes back, without leading zeros.
fn canonical_vlan(vlan: &str) -> String {
    let trimmed = vlan.trim_start_matches('0');
    if trimmed.is_empty() {
        vlan.to_string()
    } else {
        trimmed.to_string()
    }
}

/// End-to-end scenarios over groups, interfaces and probes.
pub fn scenario_cases(fx: &HalFixtures) -> CaseResult {
    fx.validate()?;
    let group = arg(fx.primary_bridge());
    let other = arg(fx.secondary_bridge());
    let eth0 = arg(fx.primary_interface());
    let eth1 = arg(fx.secondary_interface());

    Ok(vec![
        ContractCase::new("scenario: add group")
            .ok(add_group(group.clone(), arg("1")))
            .err(add_group(arg(""), arg("1")))
            .err(add_group(group.clone(), arg("")))
            .err(add_group(None, arg("1"))),
        ContractCase::new("scenario: add interface")
            .ok(add_group(group.clone(), arg("1")))
            .ok(add_interface(group.clone(), eth0.clone(), arg("100")))
            .err(add_interface(group.clone(), eth0.clone(), arg("0")))
            .err(add_interface(group.clone(), eth0.clone(), arg("4095"))),
        ContractCase::new("scenario: config entry")
            .ok(insert_entry(group.clone(), arg("100")))
            .step(
                Call::GetVlanId {
                    group: group.clone(),
                },
                Expect::VlanId("100".to_string()),
            )
            .err(insert_entry(group.clone(), arg(""))),
        ContractCase::new("scenario: delete all interfaces")
            .ok(add_group(group.clone(), arg("1")))
            .ok(add_interface(group.clone(), eth0.clone(), arg("100")))
            .ok(add_interface(group.clone(), eth1.clone(), arg("200")))
            .ok(Call::DeleteAllInterfaces {
                group: group.clone(),
            })
            .err(Call::IsInterfaceAvailable {
                iface: eth0.clone(),
                vlan_id: arg("100"),
            })
            .err(Call::IsInterfaceAvailable {
                iface: eth1.clone(),
                vlan_id: arg("200"),
            })
            .ok(Call::DeleteAllInterfaces {
                group: group.clone(),
            }),
        ContractCase::new("scenario: group probe")
            .err(Call::IsGroupAvailable {
                bridge: group.clone(),
            })
            .ok(add_group(group.clone(), arg("1")))
            .ok(Call::IsGroupAvailable {
                bridge: group.clone(),
            })
            .err(Call::IsGroupAvailable {
                bridge: other.clone(),
            }),
        ContractCase::new("scenario: interface in given bridge")
            .ok(add_group(group.clone(), arg("1")))
            .ok(add_group(other.clone(), arg("1")))
            .ok(add_interface(group.clone(), eth0.clone(), arg("100")))
            .ok(Call::IsInterfaceAvailableInBridge {
                iface: eth0.clone(),
                bridge: group.clone(),
                vlan_id: arg("100"),
            })
            .err(Call::IsInterfaceAvailableInBridge {
                iface: eth0.clone(),
                bridge: other.clone(),
                vlan_id: arg("100"),
            })
            .err(add_interface(other.clone(), eth0.clone(), arg("100")))
            .ok(del_interface(group.clone(), eth0.clone(), arg("100")))
            .err(del_interface(group.clone(), eth0.clone(), arg("100"))),
        ContractCase::new("scenario: delete group")
            .ok(add_group(group.clone(), arg("10")))
            .ok(add_interface(group.clone(), eth0.clone(), arg("10")))
            .ok(Call::DelGroup {
                group: group.clone(),
            })
            .err(Call::IsGroupAvailable {
                bridge: group.clone(),
            })
            .err(Call::IsInterfaceAvailable {
                iface: eth0,
                vlan_id: arg("10"),
            })
            .err(Call::GetVlanId {
                group: group.clone(),
            }),
        ContractCase::new("scenario: print")
            .ok(Call::PrintAllGroup)
            .ok(Call::PrintAllVlanIdConfiguration)
            .ok(add_group(group.clone(), arg("1")))
            .ok(Call::PrintGroup { group })
            .ok(Call::PrintAllGroup),
    ])
}

/// Every case family, in order.
pub fn all_cases(fx: &HalFixtures) -> CaseResult {
    let mut cases = validity_gate_cases(fx)?;
    cases.extend(vlan_range_cases(fx)?);
    cases.extend(idempotence_cases(fx)?);
    cases.extend(round_trip_cases(fx)?);
    cases.extend(scenario_cases(fx)?);
    Ok(cases)
}
