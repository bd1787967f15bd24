//! Running contract cases and reporting the results

use thiserror::Error;
use tracing::{error, info};

use crate::contract::{Call, ContractCase, Expect};
use crate::target::{CallOutcome, ConformanceTarget};

/// Verification error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("step {step}: {call} returned {actual}, expected {expected}")]
    UnexpectedCode {
        step: usize,
        call: String,
        expected: String,
        actual: i32,
    },

    #[error("step {step}: {call} wrote {actual:?}, expected {expected:?}")]
    ValueMismatch {
        step: usize,
        call: String,
        expected: String,
        actual: Option<String>,
    },

    #[error("{failed} of {total} contract cases failed")]
    CasesFailed { failed: usize, total: usize },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

fn check(step: usize, call: &Call, expect: &Expect, outcome: &CallOutcome) -> VerifyResult<()> {
    let want_ok = !matches!(expect, Expect::Err);
    if outcome.is_ok() != want_ok {
        return Err(VerificationError::UnexpectedCode {
            step,
            call: call.to_string(),
            expected: expect.to_string(),
            actual: outcome.code,
        });
    }
    if let Expect::VlanId(expected) = expect {
        if outcome.output.as_deref() != Some(expected.as_str()) {
            return Err(VerificationError::ValueMismatch {
                step,
                call: call.to_string(),
                expected: expected.clone(),
                actual: outcome.output.clone(),
            });
        }
    }
    Ok(())
}

/// Runs every step of `case` against `target`, stopping at the first
/// mismatch.
pub async fn run_case<T>(target: &T, case: &ContractCase) -> VerifyResult<()>
where
    T: ConformanceTarget + ?Sized,
{
    for (step, s) in case.steps.iter().enumerate() {
        let outcome = target.invoke(&s.call).await;
        check(step, &s.call, &s.expect, &outcome)?;
    }
    Ok(())
}

/// Outcome of one contract case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub name: String,
    pub error: Option<VerificationError>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Receives the outcome of each case as it completes.
pub trait ReportSink {
    fn record(&mut self, report: CaseReport);
}

/// Logs each outcome through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn record(&mut self, report: CaseReport) {
        match &report.error {
            None => info!(case = %report.name, "PASS"),
            Some(e) => error!(case = %report.name, "FAIL: {}", e),
        }
    }
}

/// Keeps every outcome for later inspection.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Vec<CaseReport>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[CaseReport] {
        &self.reports
    }

    /// Reports of the cases that failed.
    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.reports.iter().filter(|r| !r.passed())
    }

    /// Succeeds if every recorded case passed.
    pub fn assert_all_passed(&self) -> VerifyResult<()> {
        let failed = self.failures().count();
        if failed > 0 {
            return Err(VerificationError::CasesFailed {
                failed,
                total: self.reports.len(),
            });
        }
        Ok(())
    }
}

impl ReportSink for CollectingSink {
    fn record(&mut self, report: CaseReport) {
        self.reports.push(report);
    }
}

/// Pass/fail totals of a suite run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConformanceSummary {
    pub passed: usize,
    pub failed: usize,
}

impl ConformanceSummary {
    pub fn total(&self) -> usize {
        self.passed + self.failed
    }
}

/// Runs each case against a fresh target from `make_target` and records
/// the outcomes in `sink`.
pub async fn run_suite<T, F, R>(
    mut make_target: F,
    cases: &[ContractCase],
    sink: &mut R,
) -> ConformanceSummary
where
    T: ConformanceTarget,
    F: FnMut() -> T,
    R: ReportSink + ?Sized,
{
    let mut summary = ConformanceSummary::default();
    for case in cases {
        let target = make_target();
        let result = run_case(&target, case).await;
        match result {
            Ok(()) => summary.passed += 1,
            Err(_) => summary.failed += 1,
        }
        sink.record(CaseReport {
            name: case.name.clone(),
            error: result.err(),
        });
    }
    info!(
        passed = summary.passed,
        failed = summary.failed,
        "Conformance run complete"
    );
    summary
}
