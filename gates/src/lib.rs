//! Local quality gate runner.
//!
//! Runs a fixed sequence of checks (unit tests, lint, type check, a lexical
//! security scan, a file structure check) against a sandbox directory, writes
//! `QUALITY_REPORT.json` into it, and reduces everything to one pass/fail
//! verdict for a calling CI job or agent.
//!
//! - **[`core`]**: Pure, deterministic logic (gate outcomes, verdicts, text scanning).
//! - **[`io`]**: Side effects (config, file discovery, subprocesses, the report).
//! - **[`checks`]**: The gates themselves, behind the [`checks::Gate`] trait.
//!
//! [`run`] ties them together.

pub mod checks;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use run::{GateRunner, RunSummary, run_all_gates};
