//! Error types for lockfile generation.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for lockfile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or verifying workspace lockfiles.
///
/// Missing resolutions and missing package metadata are deliberately *not*
/// here: those are recoverable, per-node drops surfaced through
/// [`crate::Diagnostic`] values.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A requested workspace does not exist in the project.
    #[error("Workspace '{name}' not found in the project")]
    #[diagnostic(
        code(worklock::workspace_not_found),
        help("Check the workspace name against the root manifest's 'workspaces' field")
    )]
    WorkspaceNotFound {
        /// The requested workspace name.
        name: String,
    },

    /// An on-disk lockfile differs from the freshly computed document.
    #[error("The lockfile {path} would have been modified, which is explicitly forbidden")]
    #[diagnostic(
        code(worklock::policy_violation),
        help("Re-run without --immutable (or outside CI) to update the workspace lockfiles")
    )]
    PolicyViolation {
        /// Path of the drifting lockfile.
        path: PathBuf,
    },

    /// The repository lockfile could not be interpreted.
    #[error("Failed to parse lockfile at {path}: {message}")]
    #[diagnostic(
        code(worklock::lockfile_parse_failed),
        help("The lockfile may be corrupted. Regenerate it with your package manager")
    )]
    LockfileParseFailed {
        /// Path to the lockfile.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// A manifest exists but is not usable.
    #[error("Invalid manifest at {path}: {message}")]
    #[diagnostic(
        code(worklock::invalid_manifest),
        help("Check the manifest for syntax errors or missing required fields")
    )]
    InvalidManifest {
        /// Path to the manifest.
        path: PathBuf,
        /// Description of what is invalid.
        message: String,
    },

    /// I/O error occurred.
    #[error("I/O error during {operation}{}: {source}", path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(worklock::io_error),
        help("Check that the referenced paths exist and that you have permission to read or write them")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing error.
    #[error("JSON parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(worklock::json_error),
        help("Ensure the JSON has valid syntax and matches the expected manifest schema")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// YAML parsing error.
    #[error("YAML parsing error{}: {source}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    #[diagnostic(
        code(worklock::yaml_error),
        help("Ensure the YAML has valid syntax and matches the lockfile schema")
    )]
    Yaml {
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            source,
            path: None,
            operation: "file operation".to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source, path: None }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Yaml { source, path: None }
    }
}
