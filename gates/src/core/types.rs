//! Shared deterministic types for gate evaluation.
//!
//! These types define stable contracts between gates, the runner, and the
//! report writer. They do not depend on external state or I/O.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a quality gate.
///
/// The snake_case key is the stable name persisted in `QUALITY_REPORT.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    UnitTests,
    Lint,
    TypeCheck,
    Security,
    Structure,
}

impl GateName {
    /// Stable report key.
    pub fn key(self) -> &'static str {
        match self {
            GateName::UnitTests => "unit_tests",
            GateName::Lint => "lint",
            GateName::TypeCheck => "type_check",
            GateName::Security => "security",
            GateName::Structure => "structure",
        }
    }

    /// Human title used in progress output.
    pub fn title(self) -> &'static str {
        match self {
            GateName::UnitTests => "Unit Tests",
            GateName::Lint => "Code Quality (Lint)",
            GateName::TypeCheck => "Type Safety",
            GateName::Security => "Security Scan",
            GateName::Structure => "File Structure",
        }
    }
}

impl fmt::Display for GateName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Internal tri-state outcome of a single gate.
///
/// `Skipped` means the gate could not be meaningfully evaluated (tool missing,
/// or a nonzero exit the gate's policy ignores). It collapses to a pass only
/// when the result is reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    Pass,
    Fail { reason: String },
    Skipped { reason: String },
}

impl GateOutcome {
    pub fn fail(reason: impl Into<String>) -> Self {
        GateOutcome::Fail {
            reason: reason.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        GateOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, GateOutcome::Fail { .. })
    }
}

/// Outcome of one gate together with its blocking policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateResult {
    pub name: GateName,
    pub outcome: GateOutcome,
    /// Advisory gates (`blocking = false`) never fail the run.
    pub blocking: bool,
}

impl GateResult {
    /// Boolean written to the report for this gate.
    pub fn verdict(&self) -> bool {
        !(self.blocking && self.outcome.is_fail())
    }
}

/// Logical AND over every gate verdict. An empty run passes.
pub fn overall_verdict(results: &[GateResult]) -> bool {
    results.iter().all(GateResult::verdict)
}

/// Report status string for an overall verdict.
pub fn overall_status(passed: bool) -> &'static str {
    if passed { "PASSED" } else { "FAILED" }
}
