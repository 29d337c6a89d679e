//! Verifiable log: `QUALITY_REPORT.json` in the sandbox root.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::core::types::{GateResult, overall_status, overall_verdict};

pub const REPORT_FILE_NAME: &str = "QUALITY_REPORT.json";
pub const REPORT_VERSION: &str = "1.0.0";

/// Gate verdicts keyed by gate name, kept in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateVerdicts(pub Vec<(String, bool)>);

impl GateVerdicts {
    pub fn from_results(results: &[GateResult]) -> Self {
        Self(
            results
                .iter()
                .map(|result| (result.name.key().to_string(), result.verdict()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.0
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, passed)| *passed)
    }

    pub fn all_passed(&self) -> bool {
        self.0.iter().all(|(_, passed)| *passed)
    }
}

impl Serialize for GateVerdicts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, passed) in &self.0 {
            map.serialize_entry(name, passed)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for GateVerdicts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VerdictsVisitor;

        impl<'de> Visitor<'de> for VerdictsVisitor {
            type Value = GateVerdicts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of gate name to boolean")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, passed)) = access.next_entry::<String, bool>()? {
                    entries.push((name, passed));
                }
                Ok(GateVerdicts(entries))
            }
        }

        deserializer.deserialize_map(VerdictsVisitor)
    }
}

/// Persisted record of one gate run. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// ISO-8601 wall-clock time the report was built.
    pub timestamp: String,
    pub sandbox: String,
    pub gates: GateVerdicts,
    /// `PASSED` or `FAILED`.
    pub overall_status: String,
    pub version: String,
}

impl QualityReport {
    pub fn new(sandbox: &Path, results: &[GateResult], now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now.to_rfc3339(),
            sandbox: sandbox.display().to_string(),
            gates: GateVerdicts::from_results(results),
            overall_status: overall_status(overall_verdict(results)).to_string(),
            version: REPORT_VERSION.to_string(),
        }
    }
}

pub fn report_path(sandbox: &Path) -> PathBuf {
    sandbox.join(REPORT_FILE_NAME)
}

/// Write the report as indented JSON, replacing any previous report.
pub fn write_report(sandbox: &Path, report: &QualityReport) -> Result<PathBuf> {
    let path = report_path(sandbox);
    let mut payload = serde_json::to_string_pretty(report).context("serialize report")?;
    payload.push('\n');
    fs::write(&path, payload).with_context(|| format!("write report {}", path.display()))?;
    debug!(path = %path.display(), status = %report.overall_status, "report written");
    Ok(path)
}

pub fn load_report(path: &Path) -> Result<QualityReport> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}
