//! Stable exit codes for the quality-gates CLI.

/// Every blocking gate passed.
pub const OK: i32 = 0;
/// At least one blocking gate failed, or the run could not complete.
pub const FAILED: i32 = 1;
/// The sandbox argument was missing.
pub const USAGE: i32 = 1;
