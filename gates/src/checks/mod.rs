//! The quality gates and their fixed execution order.
//!
//! Each gate is independent: it inspects the sandbox, optionally runs one
//! external tool, writes its progress lines, and returns a [`GateOutcome`].
//! Adding a gate means implementing [`Gate`] and appending it to
//! [`default_gates`]; aggregation does not change.

mod command;
mod security;
mod structure;
mod tests_gate;

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use crate::core::types::{GateName, GateOutcome};
use crate::io::config::GatesConfig;
use crate::io::tools::ToolRunner;

pub use command::{LintGate, TypeCheckGate};
pub use security::SecurityGate;
pub use structure::StructureGate;
pub use tests_gate::UnitTestsGate;

/// Everything a gate may read while evaluating.
pub struct GateContext<'a> {
    pub sandbox: &'a Path,
    pub config: &'a GatesConfig,
    pub tools: &'a dyn ToolRunner,
}

/// A named, independent check.
pub trait Gate {
    fn name(&self) -> GateName;

    /// Whether a `Fail` outcome from this gate fails the run.
    fn blocking(&self, config: &GatesConfig) -> bool;

    /// Evaluate the gate, writing indented progress lines to `out`.
    fn evaluate(&self, ctx: &GateContext<'_>, out: &mut dyn Write) -> Result<GateOutcome>;
}

/// Gates in execution order: unit tests, lint, type check, security, structure.
pub fn default_gates() -> Vec<Box<dyn Gate>> {
    vec![
        Box::new(UnitTestsGate),
        Box::new(LintGate),
        Box::new(TypeCheckGate),
        Box::new(SecurityGate),
        Box::new(StructureGate),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_fixed() {
        let names: Vec<GateName> = default_gates().iter().map(|gate| gate.name()).collect();
        assert_eq!(
            names,
            vec![
                GateName::UnitTests,
                GateName::Lint,
                GateName::TypeCheck,
                GateName::Security,
                GateName::Structure,
            ]
        );
    }

    #[test]
    fn default_blocking_policy() {
        let config = GatesConfig::default();
        let blocking: Vec<bool> = default_gates()
            .iter()
            .map(|gate| gate.blocking(&config))
            .collect();
        assert_eq!(blocking, vec![true, true, false, true, false]);
    }
}
