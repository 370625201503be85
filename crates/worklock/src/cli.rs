//! Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Per-workspace lockfiles for Yarn monorepos.
#[derive(Debug, Parser)]
#[command(name = "worklock", version, about, long_about = None)]
pub struct Cli {
    /// Minimum log level written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub level: LogLevel,

    /// Emit a JSON result envelope on stdout instead of human-readable text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a lockfile for every workspace (or a focused selection).
    Generate {
        /// Project root directory.
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Verify instead of writing; any drift fails the run.
        #[arg(long)]
        immutable: bool,

        /// Workspace names to focus on. Their `workspace:` dependencies are
        /// included recursively. Empty means every workspace.
        workspaces: Vec<String>,
    },

    /// Verify that on-disk lockfiles match freshly computed ones.
    Check {
        /// Project root directory.
        #[arg(long, default_value = ".")]
        project: PathBuf,

        /// Workspace names to focus on; empty means every workspace.
        workspaces: Vec<String>,
    },
}

/// Log level selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Traversal and discovery details.
    Debug,
    /// Progress and dropped-node reports.
    Info,
    /// Only suspicious conditions (default).
    Warn,
    /// Only failures.
    Error,
}

impl LogLevel {
    /// The equivalent `tracing` level filter directive.
    #[must_use]
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Parses the process arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
