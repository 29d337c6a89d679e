//! Orchestration of a full gate run.
//!
//! Every gate runs, in order, even after a failure, so the report always
//! reflects the state of the whole sandbox.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::checks::{Gate, GateContext, default_gates};
use crate::core::types::{GateOutcome, GateResult, overall_verdict};
use crate::io::config::GatesConfig;
use crate::io::report::{QualityReport, write_report};
use crate::io::tools::{ProcessToolRunner, ToolRunner};

const BANNER_WIDTH: usize = 60;

/// Result of one complete run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Per-gate results in execution order.
    pub results: Vec<GateResult>,
    /// Logical AND of every gate verdict.
    pub passed: bool,
    pub report: QualityReport,
    pub report_path: PathBuf,
}

impl RunSummary {
    pub fn failed_gates(&self) -> Vec<&GateResult> {
        self.results.iter().filter(|r| !r.verdict()).collect()
    }
}

/// Runs an ordered set of gates against one sandbox.
pub struct GateRunner {
    sandbox: PathBuf,
    config: GatesConfig,
    gates: Vec<Box<dyn Gate>>,
}

impl GateRunner {
    /// Runner with the five standard gates.
    pub fn new(sandbox: impl Into<PathBuf>, config: GatesConfig) -> Self {
        Self::with_gates(sandbox, config, default_gates())
    }

    pub fn with_gates(
        sandbox: impl Into<PathBuf>,
        config: GatesConfig,
        gates: Vec<Box<dyn Gate>>,
    ) -> Self {
        Self {
            sandbox: sandbox.into(),
            config,
            gates,
        }
    }

    pub fn sandbox(&self) -> &Path {
        &self.sandbox
    }

    /// Evaluate every gate, write `QUALITY_REPORT.json`, and print the verdict.
    ///
    /// Gate errors are recorded as failures of that gate. Only failing to
    /// write progress or the report aborts the run.
    #[instrument(skip_all, fields(sandbox = %self.sandbox.display()))]
    pub fn run(&self, tools: &dyn ToolRunner, out: &mut dyn Write) -> Result<RunSummary> {
        let rule = "=".repeat(BANNER_WIDTH);
        writeln!(out, "{rule}")?;
        writeln!(out, "QUALITY GATES - every gate must pass")?;
        writeln!(out, "{rule}")?;

        let ctx = GateContext {
            sandbox: &self.sandbox,
            config: &self.config,
            tools,
        };

        let mut results = Vec::with_capacity(self.gates.len());
        for (index, gate) in self.gates.iter().enumerate() {
            let name = gate.name();
            writeln!(out, "\nGate {}: {}", index + 1, name.title())?;
            let outcome = match gate.evaluate(&ctx, out) {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(gate = %name, err = %format!("{err:#}"), "gate errored");
                    writeln!(out, "   FAIL {err:#}")?;
                    GateOutcome::fail(format!("{err:#}"))
                }
            };
            let result = GateResult {
                name,
                outcome,
                blocking: gate.blocking(&self.config),
            };
            info!(gate = %name, outcome = ?result.outcome, verdict = result.verdict(), "gate finished");
            results.push(result);
        }

        let report = QualityReport::new(&self.sandbox, &results, Utc::now());
        let report_path = write_report(&self.sandbox, &report)?;
        writeln!(out, "\nReport written: {}", report_path.display())?;

        let passed = overall_verdict(&results);
        let summary = RunSummary {
            results,
            passed,
            report,
            report_path,
        };

        writeln!(out, "\n{rule}")?;
        if passed {
            writeln!(out, "ALL GATES GREEN")?;
        } else {
            writeln!(out, "GATES FAILED - NOT READY TO MERGE")?;
            writeln!(out, "\nFailed gates:")?;
            for failed in summary.failed_gates() {
                writeln!(out, "   - {}", failed.name)?;
            }
        }
        writeln!(out, "{rule}")?;
        Ok(summary)
    }
}

/// Run the standard gates with default configuration and real tools.
///
/// Returns `true` iff every gate passed. Progress goes to stdout.
pub fn run_all_gates(sandbox: &Path) -> Result<bool> {
    let runner = GateRunner::new(sandbox, GatesConfig::default());
    let summary = runner.run(&ProcessToolRunner, &mut io::stdout().lock())?;
    Ok(summary.passed)
}
