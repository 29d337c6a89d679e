//! Gates backed by an external tool: shared policy plus lint and type check.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use super::{Gate, GateContext};
use crate::core::types::{GateName, GateOutcome};
use crate::io::config::{CommandGateConfig, GatesConfig};
use crate::io::discover::find_source_files;
use crate::io::tools::{ToolOutcome, ToolRequest};

/// Run the configured tool in the sandbox and classify the result by gate policy.
///
/// A missing tool always skips. A nonzero exit, a timeout, or a failure to run
/// the tool fails the gate only when `fail_on_nonzero_exit` is set, and skips
/// it otherwise. Captured stdout is echoed for failures.
pub(super) fn run_tool_gate(
    ctx: &GateContext<'_>,
    gate: &CommandGateConfig,
    out: &mut dyn Write,
) -> Result<GateOutcome> {
    let tool = gate.command.join(" ");
    let request = ToolRequest {
        command: gate.command.clone(),
        workdir: ctx.sandbox.to_path_buf(),
        timeout: Duration::from_secs(gate.timeout_secs),
        output_limit_bytes: ctx.config.output_limit_bytes,
    };

    let outcome = match ctx.tools.run(&request) {
        Ok(outcome) => outcome,
        Err(err) => {
            let reason = format!("could not run `{tool}`: {err:#}");
            if gate.fail_on_nonzero_exit {
                writeln!(out, "   FAIL {reason}")?;
                return Ok(GateOutcome::fail(reason));
            }
            writeln!(out, "   SKIP {reason}")?;
            return Ok(GateOutcome::skipped(reason));
        }
    };

    match outcome {
        ToolOutcome::NotFound => {
            writeln!(out, "   SKIP `{tool}` not installed")?;
            Ok(GateOutcome::skipped(format!("`{tool}` not installed")))
        }
        ToolOutcome::TimedOut => {
            let reason = format!("`{tool}` timed out after {}s", gate.timeout_secs);
            if gate.fail_on_nonzero_exit {
                writeln!(out, "   FAIL {reason}")?;
                Ok(GateOutcome::fail(reason))
            } else {
                writeln!(out, "   SKIP {reason}")?;
                Ok(GateOutcome::skipped(reason))
            }
        }
        ToolOutcome::Exited { success: true, .. } => {
            writeln!(out, "   OK")?;
            Ok(GateOutcome::Pass)
        }
        ToolOutcome::Exited { code, stdout, .. } => {
            let code = code.map_or_else(|| "signal".to_string(), |code| code.to_string());
            let reason = format!("`{tool}` exited with {code}");
            if gate.fail_on_nonzero_exit {
                writeln!(out, "   FAIL {reason}")?;
                if !stdout.is_empty() {
                    writeln!(out, "{}", stdout.trim_end())?;
                }
                Ok(GateOutcome::fail(reason))
            } else {
                debug!(tool = %tool, code = %code, "nonzero exit ignored by policy");
                writeln!(out, "   SKIP {reason} (non-blocking)")?;
                Ok(GateOutcome::skipped(reason))
            }
        }
    }
}

/// Shared flow for gates that only run when source files exist.
fn run_on_sources(
    ctx: &GateContext<'_>,
    gate: &CommandGateConfig,
    out: &mut dyn Write,
) -> Result<GateOutcome> {
    let sources = find_source_files(
        ctx.sandbox,
        &ctx.config.source_extension,
        &ctx.config.excluded_dirs,
    );
    if sources.is_empty() {
        let extension = &ctx.config.source_extension;
        writeln!(out, "   No .{extension} files - OK")?;
        return Ok(GateOutcome::Pass);
    }
    debug!(files = sources.len(), "source files found");
    run_tool_gate(ctx, gate, out)
}

pub struct LintGate;

impl Gate for LintGate {
    fn name(&self) -> GateName {
        GateName::Lint
    }

    fn blocking(&self, config: &GatesConfig) -> bool {
        config.lint.blocking
    }

    fn evaluate(&self, ctx: &GateContext<'_>, out: &mut dyn Write) -> Result<GateOutcome> {
        run_on_sources(ctx, &ctx.config.lint, out)
    }
}

/// Advisory by default: its outcome is recorded but does not block the run.
pub struct TypeCheckGate;

impl Gate for TypeCheckGate {
    fn name(&self) -> GateName {
        GateName::TypeCheck
    }

    fn blocking(&self, config: &GatesConfig) -> bool {
        config.type_check.blocking
    }

    fn evaluate(&self, ctx: &GateContext<'_>, out: &mut dyn Write) -> Result<GateOutcome> {
        run_on_sources(ctx, &ctx.config.type_check, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GateResult;
    use crate::test_support::{Sandbox, ScriptedTool, ScriptedToolRunner};

    fn evaluate(gate: &dyn Gate, sandbox: &Sandbox, tools: &ScriptedToolRunner) -> GateOutcome {
        evaluate_with(gate, sandbox, tools, &GatesConfig::default())
    }

    fn evaluate_with(
        gate: &dyn Gate,
        sandbox: &Sandbox,
        tools: &ScriptedToolRunner,
        config: &GatesConfig,
    ) -> GateOutcome {
        let ctx = GateContext {
            sandbox: sandbox.path(),
            config,
            tools,
        };
        let mut out = Vec::new();
        gate.evaluate(&ctx, &mut out).expect("evaluate")
    }

    #[test]
    fn no_sources_passes_without_running_tools() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("README.md", "# hi").expect("write");
        sandbox.write(".venv/lib/site.py", "x = 1").expect("write");
        let tools = ScriptedToolRunner::exiting(1, "");

        assert_eq!(evaluate(&LintGate, &sandbox, &tools), GateOutcome::Pass);
        assert_eq!(evaluate(&TypeCheckGate, &sandbox, &tools), GateOutcome::Pass);
        assert!(tools.calls().is_empty());
    }

    #[test]
    fn no_sources_message_names_the_extension() {
        let sandbox = Sandbox::new().expect("sandbox");
        let tools = ScriptedToolRunner::succeeding();
        let config = GatesConfig::default();
        let ctx = GateContext {
            sandbox: sandbox.path(),
            config: &config,
            tools: &tools,
        };
        let mut out = Vec::new();
        LintGate.evaluate(&ctx, &mut out).expect("evaluate");
        assert_eq!(String::from_utf8(out).expect("utf8"), "   No .py files - OK\n");
    }

    #[test]
    fn lint_runs_in_sandbox_with_configured_command() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "x = 1\n").expect("write");
        let tools = ScriptedToolRunner::succeeding();

        assert_eq!(evaluate(&LintGate, &sandbox, &tools), GateOutcome::Pass);
        let calls = tools.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, vec!["python", "-m", "ruff", "check", "."]);
        assert_eq!(calls[0].workdir, sandbox.path());
        assert_eq!(calls[0].timeout, Duration::from_secs(30));
    }

    #[test]
    fn lint_nonzero_exit_is_skipped_by_default() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "import os\n").expect("write");
        let tools = ScriptedToolRunner::exiting(1, "F401 unused import");

        let outcome = evaluate(&LintGate, &sandbox, &tools);
        assert!(matches!(outcome, GateOutcome::Skipped { .. }));
    }

    #[test]
    fn lint_nonzero_exit_fails_when_configured() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "import os\n").expect("write");
        let tools = ScriptedToolRunner::exiting(1, "F401 unused import");
        let mut config = GatesConfig::default();
        config.lint.fail_on_nonzero_exit = true;

        let outcome = evaluate_with(&LintGate, &sandbox, &tools, &config);
        assert!(outcome.is_fail());
    }

    #[test]
    fn missing_tool_is_skipped() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "x = 1\n").expect("write");
        let tools = ScriptedToolRunner::not_found();

        let outcome = evaluate(&TypeCheckGate, &sandbox, &tools);
        assert!(matches!(outcome, GateOutcome::Skipped { .. }));
    }

    #[test]
    fn lint_timeout_is_skipped() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "x = 1\n").expect("write");
        let tools = ScriptedToolRunner::timing_out();

        let outcome = evaluate(&LintGate, &sandbox, &tools);
        match outcome {
            GateOutcome::Skipped { reason } => assert!(reason.contains("timed out")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn type_check_nonzero_exit_reports_true() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "x: int = 'a'\n").expect("write");
        let tools = ScriptedToolRunner::exiting(1, "error: Incompatible types");
        let config = GatesConfig::default();

        let result = GateResult {
            name: TypeCheckGate.name(),
            outcome: evaluate_with(&TypeCheckGate, &sandbox, &tools, &config),
            blocking: TypeCheckGate.blocking(&config),
        };
        assert!(!result.blocking);
        assert!(matches!(result.outcome, GateOutcome::Skipped { .. }));
        assert!(result.verdict());
        assert_eq!(tools.calls().len(), 1);
    }

    #[test]
    fn tool_error_follows_nonzero_policy() {
        let sandbox = Sandbox::new().expect("sandbox");
        sandbox.write("app.py", "x = 1\n").expect("write");
        let tools = ScriptedToolRunner::new(ScriptedTool::Error("permission denied".into()));

        let outcome = evaluate(&LintGate, &sandbox, &tools);
        assert!(matches!(outcome, GateOutcome::Skipped { .. }));

        let mut config = GatesConfig::default();
        config.lint.fail_on_nonzero_exit = true;
        let outcome = evaluate_with(&LintGate, &sandbox, &tools, &config);
        assert!(outcome.is_fail());
    }
}
