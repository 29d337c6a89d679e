//! Test-only helpers: scripted tool runner and throwaway sandboxes.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use anyhow::{Result, anyhow};
use tempfile::TempDir;

use crate::io::tools::{ToolOutcome, ToolRequest, ToolRunner};

/// Scripted response for every tool invocation.
#[derive(Debug, Clone)]
pub enum ScriptedTool {
    Outcome(ToolOutcome),
    Error(String),
}

/// Tool runner that returns a fixed response and records each request.
pub struct ScriptedToolRunner {
    script: ScriptedTool,
    calls: RefCell<Vec<ToolRequest>>,
}

impl ScriptedToolRunner {
    pub fn new(script: ScriptedTool) -> Self {
        Self {
            script,
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Every tool exits 0.
    pub fn succeeding() -> Self {
        Self::new(ScriptedTool::Outcome(exited(0, "")))
    }

    /// Every tool exits with `code` and prints `stdout`.
    pub fn exiting(code: i32, stdout: &str) -> Self {
        Self::new(ScriptedTool::Outcome(exited(code, stdout)))
    }

    pub fn not_found() -> Self {
        Self::new(ScriptedTool::Outcome(ToolOutcome::NotFound))
    }

    pub fn timing_out() -> Self {
        Self::new(ScriptedTool::Outcome(ToolOutcome::TimedOut))
    }

    pub fn calls(&self) -> Vec<ToolRequest> {
        self.calls.borrow().clone()
    }
}

impl ToolRunner for ScriptedToolRunner {
    fn run(&self, request: &ToolRequest) -> Result<ToolOutcome> {
        self.calls.borrow_mut().push(request.clone());
        match &self.script {
            ScriptedTool::Outcome(outcome) => Ok(outcome.clone()),
            ScriptedTool::Error(message) => Err(anyhow!("{message}")),
        }
    }
}

fn exited(code: i32, stdout: &str) -> ToolOutcome {
    ToolOutcome::Exited {
        code: Some(code),
        success: code == 0,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// Temporary sandbox directory.
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }
}
