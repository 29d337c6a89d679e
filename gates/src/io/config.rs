//! Gate configuration, optionally loaded from a TOML file given with `--config`.
//!
//! The file holds overrides only. Every key is optional and each section is
//! resolved against that gate's own defaults, so overriding one field never
//! changes another.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use tracing::debug;

/// Resolved gate configuration.
///
/// Defaults reproduce the stock Python toolchain behavior: pytest failures
/// block, ruff results never block, mypy and the structure check are advisory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatesConfig {
    /// File name prefix identifying test files (`test_*`).
    pub test_file_prefix: String,
    /// Source file extension, without the dot.
    pub source_extension: String,
    /// Directory names excluded from lint, type check and security scanning.
    pub excluded_dirs: Vec<String>,
    /// File whose presence the structure gate checks in the sandbox root.
    pub structure_file: String,
    /// Bound on captured stdout/stderr per subprocess.
    pub output_limit_bytes: usize,

    pub unit_tests: CommandGateConfig,
    pub lint: CommandGateConfig,
    pub type_check: CommandGateConfig,
    pub security: ScanGateConfig,
    pub structure: ScanGateConfig,
}

/// Policy for a gate that shells out to an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGateConfig {
    /// Program and arguments, run with the sandbox as working directory.
    pub command: Vec<String>,
    pub timeout_secs: u64,
    /// Whether a nonzero exit (or timeout) fails the gate instead of skipping it.
    pub fail_on_nonzero_exit: bool,
    pub blocking: bool,
}

/// Policy for an in-process gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanGateConfig {
    pub blocking: bool,
}

/// Config file contents (TOML). Absent keys keep the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub test_file_prefix: Option<String>,
    pub source_extension: Option<String>,
    pub excluded_dirs: Option<Vec<String>>,
    pub structure_file: Option<String>,
    pub output_limit_bytes: Option<usize>,
    pub unit_tests: Option<CommandGateOverride>,
    pub lint: Option<CommandGateOverride>,
    pub type_check: Option<CommandGateOverride>,
    pub security: Option<ScanGateOverride>,
    pub structure: Option<ScanGateOverride>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandGateOverride {
    pub command: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub fail_on_nonzero_exit: Option<bool>,
    pub blocking: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanGateOverride {
    pub blocking: Option<bool>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|part| (*part).to_string()).collect()
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            test_file_prefix: "test_".to_string(),
            source_extension: "py".to_string(),
            excluded_dirs: vec![".venv".to_string()],
            structure_file: "REPORT.md".to_string(),
            output_limit_bytes: 100_000,
            unit_tests: CommandGateConfig {
                command: argv(&["python", "-m", "pytest", "-v", "--tb=short"]),
                timeout_secs: 60,
                fail_on_nonzero_exit: true,
                blocking: true,
            },
            lint: CommandGateConfig {
                command: argv(&["python", "-m", "ruff", "check", "."]),
                timeout_secs: 30,
                fail_on_nonzero_exit: false,
                blocking: true,
            },
            type_check: CommandGateConfig {
                command: argv(&["python", "-m", "mypy", ".", "--ignore-missing-imports"]),
                timeout_secs: 30,
                fail_on_nonzero_exit: false,
                blocking: false,
            },
            security: ScanGateConfig { blocking: true },
            structure: ScanGateConfig { blocking: false },
        }
    }
}

impl GatesConfig {
    pub fn validate(&self) -> Result<()> {
        if self.source_extension.trim().is_empty() {
            bail!("source_extension must be non-empty");
        }
        if self.source_extension.starts_with('.') {
            bail!("source_extension must not start with '.'");
        }
        if self.structure_file.trim().is_empty() {
            bail!("structure_file must be non-empty");
        }
        if self.output_limit_bytes == 0 {
            bail!("output_limit_bytes must be > 0");
        }
        for (label, gate) in [
            ("unit_tests", &self.unit_tests),
            ("lint", &self.lint),
            ("type_check", &self.type_check),
        ] {
            gate.validate()
                .with_context(|| format!("invalid [{label}] section"))?;
        }
        Ok(())
    }
}

impl CommandGateConfig {
    fn validate(&self) -> Result<()> {
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            return Err(anyhow!("command must be a non-empty array"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be > 0"));
        }
        Ok(())
    }

    fn apply(&mut self, overrides: CommandGateOverride) {
        if let Some(command) = overrides.command {
            self.command = command;
        }
        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        if let Some(fail_on_nonzero_exit) = overrides.fail_on_nonzero_exit {
            self.fail_on_nonzero_exit = fail_on_nonzero_exit;
        }
        if let Some(blocking) = overrides.blocking {
            self.blocking = blocking;
        }
    }
}

impl ScanGateConfig {
    fn apply(&mut self, overrides: ScanGateOverride) {
        if let Some(blocking) = overrides.blocking {
            self.blocking = blocking;
        }
    }
}

/// Apply file overrides to the default configuration and validate the result.
pub fn apply_overrides(mut base: GatesConfig, file: ConfigFile) -> Result<GatesConfig> {
    if let Some(prefix) = file.test_file_prefix {
        base.test_file_prefix = prefix;
    }
    if let Some(extension) = file.source_extension {
        base.source_extension = extension;
    }
    if let Some(excluded_dirs) = file.excluded_dirs {
        base.excluded_dirs = excluded_dirs;
    }
    if let Some(structure_file) = file.structure_file {
        base.structure_file = structure_file;
    }
    if let Some(limit) = file.output_limit_bytes {
        base.output_limit_bytes = limit;
    }
    if let Some(overrides) = file.unit_tests {
        base.unit_tests.apply(overrides);
    }
    if let Some(overrides) = file.lint {
        base.lint.apply(overrides);
    }
    if let Some(overrides) = file.type_check {
        base.type_check.apply(overrides);
    }
    if let Some(overrides) = file.security {
        base.security.apply(overrides);
    }
    if let Some(overrides) = file.structure {
        base.structure.apply(overrides);
    }
    base.validate()?;
    Ok(base)
}

/// Load the run configuration.
///
/// Without a path the defaults apply. Nothing inside the sandbox is ever read
/// as configuration: the code under evaluation must not relax its own gates.
pub fn load_config(path: Option<&Path>) -> Result<GatesConfig> {
    let Some(path) = path else {
        debug!("no config file given, using defaults");
        let cfg = GatesConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    };
    if !path.is_file() {
        bail!("config file {} not found", path.display());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let file: ConfigFile =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    let cfg = apply_overrides(GatesConfig::default(), file)
        .with_context(|| format!("validate {}", path.display()))?;
    debug!(path = %path.display(), "config loaded");
    Ok(cfg)
}
