use std::io::Write;

use anyhow::Result;

use super::{Gate, GateContext};
use crate::core::types::{GateName, GateOutcome};
use crate::io::config::GatesConfig;

/// Checks that the agent-written summary (`REPORT.md` by default) exists.
///
/// Advisory by default: a missing file is recorded as `Fail` but does not block.
pub struct StructureGate;

impl Gate for StructureGate {
    fn name(&self) -> GateName {
        GateName::Structure
    }

    fn blocking(&self, config: &GatesConfig) -> bool {
        config.structure.blocking
    }

    fn evaluate(&self, ctx: &GateContext<'_>, out: &mut dyn Write) -> Result<GateOutcome> {
        let expected = &ctx.config.structure_file;
        if ctx.sandbox.join(expected).exists() {
            writeln!(out, "   OK {expected} present")?;
            return Ok(GateOutcome::Pass);
        }
        writeln!(out, "   WARN {expected} missing - should be written by the agent")?;
        Ok(GateOutcome::fail(format!("{expected} missing")))
    }
}
