//! Quality gate runner CLI.
//!
//! Evaluates every gate against the sandbox directory, writes
//! `QUALITY_REPORT.json` there, and exits 0 only if all blocking gates pass.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use clap::error::ErrorKind;

use quality_gates::exit_codes;
use quality_gates::io::config::load_config;
use quality_gates::io::tools::ProcessToolRunner;
use quality_gates::logging;
use quality_gates::run::GateRunner;

const USAGE: &str = "Usage: quality-gates <sandbox_path>";

#[derive(Parser)]
#[command(
    name = "quality-gates",
    version,
    about = "Run quality gates against a sandbox directory"
)]
struct Cli {
    /// Directory to evaluate.
    sandbox: Option<PathBuf>,

    /// Extra positional arguments are accepted and ignored.
    #[arg(hide = true)]
    ignored: Vec<OsString>,

    /// Gate configuration file. Without it the built-in defaults apply.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Exit code for a command line clap rejected.
///
/// `--help` and `--version` succeed; everything else is a usage error.
fn parse_error_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => exit_codes::OK,
        _ => exit_codes::USAGE,
    }
}

fn main() {
    logging::init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = parse_error_exit_code(err.kind());
            // Printing can only fail on a closed stream; the exit code still applies.
            let _ = err.print();
            std::process::exit(code);
        }
    };
    let Some(sandbox) = cli.sandbox else {
        println!("{USAGE}");
        std::process::exit(exit_codes::USAGE);
    };
    match run(&sandbox, cli.config.as_deref()) {
        Ok(true) => std::process::exit(exit_codes::OK),
        Ok(false) => std::process::exit(exit_codes::FAILED),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::FAILED);
        }
    }
}

fn run(sandbox: &Path, config: Option<&Path>) -> Result<bool> {
    let config = load_config(config)?;
    let runner = GateRunner::new(sandbox, config);
    let summary = runner.run(&ProcessToolRunner, &mut io::stdout().lock())?;
    Ok(summary.passed)
}
