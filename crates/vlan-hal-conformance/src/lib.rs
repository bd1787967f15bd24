//! Conformance suite for VLAN HAL implementations
//!
//! Provides:
//! - Fixture profiles (bridge names, interface names, VLAN IDs)
//! - The behavioral contract as a table of cases
//! - A target adapter that reduces any HAL call to `RETURN_OK`/`RETURN_ERR`
//! - Reporting sinks and verification helpers

pub mod contract;
pub mod fixtures;
mod target;
mod verification;

pub use contract::{all_cases, Call, CaseResult, ContractCase, Expect, Step};
pub use fixtures::*;
pub use target::{CallOutcome, ConformanceTarget};
pub use verification::*;
