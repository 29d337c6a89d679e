//! External tool adapter used by the command gates.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::debug;

use super::process::{SpawnError, run_command_with_timeout, spawn_error};

/// One invocation of an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    /// Program followed by its arguments.
    pub command: Vec<String>,
    pub workdir: PathBuf,
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

/// Classified result of running a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// The process ran to completion.
    Exited {
        code: Option<i32>,
        success: bool,
        stdout: String,
        stderr: String,
    },
    /// The process exceeded its timeout and was killed.
    TimedOut,
    /// The program could not be located.
    NotFound,
}

/// Seam between gates and real processes.
pub trait ToolRunner {
    fn run(&self, request: &ToolRequest) -> Result<ToolOutcome>;
}

/// Runs tools as child processes.
pub struct ProcessToolRunner;

impl ToolRunner for ProcessToolRunner {
    fn run(&self, request: &ToolRequest) -> Result<ToolOutcome> {
        let Some((program, args)) = request.command.split_first() else {
            bail!("empty tool command");
        };
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(&request.workdir);

        let output = match run_command_with_timeout(
            cmd,
            request.timeout,
            request.output_limit_bytes,
        ) {
            Ok(output) => output,
            Err(err) => {
                if let Some(SpawnError::NotFound(_)) = spawn_error(&err) {
                    debug!(program = %program, "tool not found");
                    return Ok(ToolOutcome::NotFound);
                }
                return Err(err);
            }
        };

        if output.timed_out {
            return Ok(ToolOutcome::TimedOut);
        }
        Ok(ToolOutcome::Exited {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
