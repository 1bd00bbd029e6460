//! Environment validation run before anything mutates the target system.
//!
//! A gate owns an ordered set of checks: cheap/foundational ones first so the
//! first failure is the most diagnosable one. Blocking failures stop the gate
//! and can request that just that check be re-run after the user remediates;
//! advisory failures are recorded and evaluation proceeds.

mod checks;

pub use checks::{FreeSpaceCheck, GameInstalledCheck, TargetEmptyCheck, TargetWritableCheck};

use crate::context::InstallContext;

/// Result of evaluating one pre-check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreCheckResult {
    Passed {
        message: Option<String>,
    },
    /// Failed with no sensible user remediation; the surrounding flow stops.
    Failed {
        message: String,
        retry_label: Option<String>,
    },
    /// Failed, but re-running this exact check after the suggested remediation
    /// may pass (the reevaluation request).
    FailedRetryable {
        message: String,
        retry_label: String,
    },
}

impl PreCheckResult {
    pub fn passed() -> Self {
        PreCheckResult::Passed { message: None }
    }

    pub fn passed_with(message: impl Into<String>) -> Self {
        PreCheckResult::Passed {
            message: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        PreCheckResult::Failed {
            message: message.into(),
            retry_label: None,
        }
    }

    pub fn failed_retryable(message: impl Into<String>, retry_label: impl Into<String>) -> Self {
        PreCheckResult::FailedRetryable {
            message: message.into(),
            retry_label: retry_label.into(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, PreCheckResult::Passed { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            PreCheckResult::Passed { message } => message.as_deref(),
            PreCheckResult::Failed { message, .. }
            | PreCheckResult::FailedRetryable { message, .. } => Some(message),
        }
    }

    pub fn retry_label(&self) -> Option<&str> {
        match self {
            PreCheckResult::Passed { .. } => None,
            PreCheckResult::Failed { retry_label, .. } => retry_label.as_deref(),
            PreCheckResult::FailedRetryable { retry_label, .. } => Some(retry_label),
        }
    }

    /// True when the failed check asks to be re-run after remediation.
    pub fn requests_reevaluation(&self) -> bool {
        matches!(self, PreCheckResult::FailedRetryable { .. })
    }
}

/// A named validation, evaluated against the shared context and current
/// filesystem state. Must be safely re-runnable.
pub trait PreCheck {
    fn name(&self) -> &str;

    /// Blocking checks must pass for the gate to pass; advisory checks only
    /// inform and never halt evaluation.
    fn blocking(&self) -> bool {
        true
    }

    fn evaluate(&mut self, ctx: &InstallContext) -> PreCheckResult;
}

/// One evaluated check in a gate report.
#[derive(Debug, Clone)]
pub struct CheckRecord {
    pub name: String,
    pub blocking: bool,
    pub result: PreCheckResult,
}

/// Aggregated outcome of a gate run.
#[derive(Debug, Clone)]
pub struct GateReport {
    pub records: Vec<CheckRecord>,
    /// Index (into the gate's check list) of the blocking check that stopped
    /// evaluation, when one did.
    pub failed_index: Option<usize>,
}

impl GateReport {
    /// Success iff every blocking check that ran passed and none stopped the gate.
    pub fn passed(&self) -> bool {
        self.failed_index.is_none()
    }

    /// The blocking failure that stopped the gate, if any. Fail-fast makes it
    /// the last evaluated record.
    pub fn failure(&self) -> Option<&CheckRecord> {
        self.failed_index?;
        self.records.last()
    }
}

/// Ordered set of pre-checks evaluated with blocking fail-fast semantics.
pub struct Gate {
    checks: Vec<Box<dyn PreCheck>>,
}

impl Gate {
    pub fn new(checks: Vec<Box<dyn PreCheck>>) -> Self {
        Self { checks }
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run all checks in declared order. Stops at the first failed blocking
    /// check; advisory failures are recorded and evaluation continues.
    pub fn evaluate(&mut self, ctx: &InstallContext) -> GateReport {
        self.evaluate_from(ctx, 0)
    }

    /// Re-run only the previously failed check (by index from a prior
    /// report), then continue with the remaining checks from that position.
    /// An index past the end (stale report after the check list changed)
    /// falls back to a full evaluation rather than a vacuous pass.
    pub fn reevaluate_failed(&mut self, ctx: &InstallContext, failed_index: usize) -> GateReport {
        let start = if failed_index < self.checks.len() {
            failed_index
        } else {
            tracing::warn!(
                "reevaluation index {} out of range ({} checks); re-running the full gate",
                failed_index,
                self.checks.len()
            );
            0
        };
        self.evaluate_from(ctx, start)
    }

    fn evaluate_from(&mut self, ctx: &InstallContext, start: usize) -> GateReport {
        let mut records = Vec::new();
        let mut failed_index = None;

        for (idx, check) in self.checks.iter_mut().enumerate().skip(start) {
            let result = check.evaluate(ctx);
            let blocking = check.blocking();
            match &result {
                PreCheckResult::Passed { .. } => {
                    tracing::debug!("pre-check passed: {}", check.name());
                }
                other => {
                    tracing::warn!(
                        "pre-check failed: {} - {}",
                        check.name(),
                        other.message().unwrap_or_default()
                    );
                }
            }
            let stop = blocking && !result.is_passed();
            records.push(CheckRecord {
                name: check.name().to_string(),
                blocking,
                result,
            });
            if stop {
                failed_index = Some(idx);
                break;
            }
        }

        GateReport {
            records,
            failed_index,
        }
    }
}
