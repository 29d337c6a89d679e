use std::fs;
use std::io::Write;

use anyhow::Result;
use tracing::{debug, warn};

use super::{Gate, GateContext};
use crate::core::security::{SecurityIssue, decode_lossy_dropping, scan_text};
use crate::core::types::{GateName, GateOutcome};
use crate::io::config::GatesConfig;
use crate::io::discover::find_source_files;

/// Lexical scan of every source file for dynamic code evaluation.
pub struct SecurityGate;

impl SecurityGate {
    /// Collect issues across all non-excluded source files, in path order.
    pub fn collect_issues(ctx: &GateContext<'_>) -> Vec<SecurityIssue> {
        let mut issues = Vec::new();
        let files = find_source_files(
            ctx.sandbox,
            &ctx.config.source_extension,
            &ctx.config.excluded_dirs,
        );
        debug!(files = files.len(), "scanning source files");
        for path in files {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(path = %path.display(), err = %err, "skipping unreadable file");
                    continue;
                }
            };
            let file_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            issues.extend(scan_text(&file_name, &decode_lossy_dropping(&bytes)));
        }
        issues
    }
}

impl Gate for SecurityGate {
    fn name(&self) -> GateName {
        GateName::Security
    }

    fn blocking(&self, config: &GatesConfig) -> bool {
        config.security.blocking
    }

    fn evaluate(&self, ctx: &GateContext<'_>, out: &mut dyn Write) -> Result<GateOutcome> {
        let issues = Self::collect_issues(ctx);
        if issues.is_empty() {
            writeln!(out, "   OK no security issues")?;
            return Ok(GateOutcome::Pass);
        }
        writeln!(out, "   WARN security issues:")?;
        for issue in &issues {
            writeln!(out, "      - {issue}")?;
        }
        Ok(GateOutcome::fail(format!("{} security issue(s)", issues.len())))
    }
}
