//! I/O helpers for gate runs.

pub mod config;
pub mod discover;
pub mod process;
pub mod report;
pub mod tools;
