use std::io::Write;

use anyhow::Result;
use tracing::debug;

use super::command::run_tool_gate;
use super::{Gate, GateContext};
use crate::core::types::{GateName, GateOutcome};
use crate::io::config::GatesConfig;
use crate::io::discover::find_test_files;

/// Runs the test suite when the sandbox has test files.
///
/// A sandbox without tests passes: projects adopt the gates before they have any.
pub struct UnitTestsGate;

impl Gate for UnitTestsGate {
    fn name(&self) -> GateName {
        GateName::UnitTests
    }

    fn blocking(&self, config: &GatesConfig) -> bool {
        config.unit_tests.blocking
    }

    fn evaluate(&self, ctx: &GateContext<'_>, out: &mut dyn Write) -> Result<GateOutcome> {
        let tests = find_test_files(
            ctx.sandbox,
            &ctx.config.test_file_prefix,
            &ctx.config.source_extension,
        );
        if tests.is_empty() {
            writeln!(out, "   No tests found - OK (for now)")?;
            return Ok(GateOutcome::Pass);
        }
        debug!(files = tests.len(), "test files found");
        run_tool_gate(ctx, &ctx.config.unit_tests, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Sandbox, ScriptedToolRunner};

    fn evaluate(sandbox: &Sandbox, tools: &ScriptedToolRunner) -> (GateOutcome, String) {
        let config = GatesConfig::default();
        let ctx = GateContext {
            sandbox: sandbox.path(),
            config: &config,
            tools,
        };
        let mut out = Vec::new();
        let outcome = UnitTestsGate.evaluate(&ctx, &mut out).expect("evaluate");
        (outcome, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn no_test_files_passes_without_running_tools() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "x = 1\n").expect("write");
        let tools = ScriptedToolRunner::exiting(1, "");

        let (outcome, _) = evaluate(&sandbox, &tools);
        assert_eq!(outcome, GateOutcome::Pass);
        assert!(tools.calls().is_empty());
    }

    #[test]
    fn passing_suite_passes() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("tests/test_app.py", "def test_x(): pass\n").expect("write");
        let tools = ScriptedToolRunner::succeeding();

        let (outcome, _) = evaluate(&sandbox, &tools);
        assert_eq!(outcome, GateOutcome::Pass);
        let calls = tools.calls();
        assert_eq!(calls[0].command, vec!["python", "-m", "pytest", "-v", "--tb=short"]);
        assert_eq!(calls[0].timeout.as_secs(), 60);
    }

    #[test]
    fn failing_suite_fails_and_echoes_stdout() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("test_app.py", "def test_x(): assert False\n").expect("write");
        let tools = ScriptedToolRunner::exiting(1, "FAILED test_app.py::test_x");

        let (outcome, printed) = evaluate(&sandbox, &tools);
        assert!(outcome.is_fail());
        assert!(printed.contains("FAILED test_app.py::test_x"));
    }

    #[test]
    fn timeout_fails() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("test_slow.py", "").expect("write");
        let tools = ScriptedToolRunner::timing_out();

        let (outcome, printed) = evaluate(&sandbox, &tools);
        assert!(outcome.is_fail());
        assert!(printed.contains("timed out"));
    }

    #[test]
    fn missing_runner_is_skipped() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("test_app.py", "").expect("write");
        let tools = ScriptedToolRunner::not_found();

        let (outcome, _) = evaluate(&sandbox, &tools);
        assert!(matches!(outcome, GateOutcome::Skipped { .. }));
    }
}
