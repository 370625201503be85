//! worklock CLI entry point.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::process::ExitCode;
use worklock::cli::{self, Commands};
use worklock::commands::{self, RunReport, Status, WriteMode};

/// Exit code when lockfiles drifted or a workspace failed.
const EXIT_DRIFT: u8 = 1;
/// Exit code for configuration and usage errors.
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    // NOTE: eprintln! in the panic hook is intentional - tracing may be
    // unusable while panicking.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("worklock panicked: {panic_info}");
        eprintln!("Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();
    init_tracing(cli.level);

    let (project, focus, mode) = match cli.command {
        Commands::Generate {
            project,
            immutable,
            workspaces,
        } => {
            // Focused installs on CI must never rewrite lockfiles.
            let mode = if immutable || (!workspaces.is_empty() && commands::running_in_ci()) {
                WriteMode::Verify
            } else {
                WriteMode::Write
            };
            (project, workspaces, mode)
        }
        Commands::Check {
            project,
            workspaces,
        } => (project, workspaces, WriteMode::Verify),
    };

    match commands::run(&project, &focus, mode) {
        Ok(report) => render_report(&report, cli.json),
        Err(error) => {
            eprintln!("{:?}", miette::Report::new(error));
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

/// Initializes the stderr tracing subscriber; `RUST_LOG` overrides the CLI
/// level when set.
fn init_tracing(level: cli::LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_directive()));
    // Ignore the error if a subscriber is already installed (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Prints the per-workspace outcomes and picks the exit code.
fn render_report(report: &RunReport, json: bool) -> ExitCode {
    if json {
        match serde_json::to_string(report) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => {
                eprintln!("JSON serialization failed: {error}");
                return ExitCode::from(EXIT_CONFIG);
            }
        }
    } else {
        for result in &report.results {
            let label = match &result.status {
                Status::Written => "written",
                Status::UpToDate => "up to date",
                Status::Drift => "drift",
                Status::Failed { .. } => "failed",
            };
            println!("{}: {} ({})", result.workspace, result.lockfile.display(), label);
        }
    }

    let mut failed = report.has_failures();
    for drifted in report.drifted() {
        let violation = worklock_core::Error::PolicyViolation {
            path: drifted.lockfile.clone(),
        };
        eprintln!("{:?}", miette::Report::new(violation));
        failed = true;
    }

    if failed {
        ExitCode::from(EXIT_DRIFT)
    } else {
        ExitCode::SUCCESS
    }
}
