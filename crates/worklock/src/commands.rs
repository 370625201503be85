//! Batch lockfile generation over a project.
//!
//! Each workspace's document is fully computed in memory before any write or
//! comparison, and a failure in one workspace never stops the remaining ones.

use crate::project::Project;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use worklock_core::{
    DependencyScope, Error, Range, Result, Severity, WorkspaceSpec,
};
use worklock_lockfile::compute_workspace_lockfile;

/// What to do with each computed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Overwrite the on-disk lockfile.
    Write,
    /// Compare against the on-disk lockfile; never write.
    Verify,
}

/// Outcome for a single workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Status {
    /// Lockfile written.
    Written,
    /// On-disk lockfile already matches.
    UpToDate,
    /// On-disk lockfile differs (verify mode only).
    Drift,
    /// Computation or I/O failed for this workspace.
    Failed {
        /// What went wrong.
        message: String,
    },
}

/// Result row for one workspace.
#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceResult {
    /// Workspace name.
    pub workspace: String,
    /// Path of its lockfile.
    pub lockfile: PathBuf,
    /// What happened.
    #[serde(flatten)]
    pub status: Status,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// One row per processed workspace.
    pub results: Vec<WorkspaceResult>,
}

impl RunReport {
    /// The lockfile paths that drifted in verify mode.
    #[must_use]
    pub fn drifted(&self) -> Vec<&WorkspaceResult> {
        self.results
            .iter()
            .filter(|r| r.status == Status::Drift)
            .collect()
    }

    /// Whether any workspace failed outright.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| matches!(r.status, Status::Failed { .. }))
    }
}

/// Runs lockfile generation for a selection of workspaces.
///
/// An empty `focus` selects every workspace. A named focus selects the named
/// workspaces plus, recursively, every sibling they reach through
/// `workspace:` ranges.
///
/// # Errors
///
/// Returns an error when the project cannot be loaded or a focused workspace
/// name does not exist; per-workspace failures are reported in the
/// [`RunReport`] instead.
pub fn run(project_dir: &Path, focus: &[String], mode: WriteMode) -> Result<RunReport> {
    let project = Project::load(project_dir)?;
    let selected = select_workspaces(&project, focus)?;

    let mut results = Vec::new();
    for workspace in selected {
        let status = match generate_one(&project, workspace, mode) {
            Ok(status) => status,
            Err(error) => {
                tracing::error!(
                    workspace = %workspace.name,
                    %error,
                    "failed to generate workspace lockfile"
                );
                Status::Failed {
                    message: error.to_string(),
                }
            }
        };
        results.push(WorkspaceResult {
            workspace: workspace.name.clone(),
            lockfile: workspace.dir.join(crate::WORKSPACE_LOCKFILE_NAME),
            status,
        });
    }

    Ok(RunReport { results })
}

/// Resolves the focus list to workspace specs.
///
/// # Errors
///
/// Returns [`Error::WorkspaceNotFound`] for an unknown name, before any
/// closure work begins.
pub fn select_workspaces<'a>(
    project: &'a Project,
    focus: &[String],
) -> Result<Vec<&'a WorkspaceSpec>> {
    let all = project.workspaces();
    if focus.is_empty() {
        return Ok(all.iter().collect());
    }

    let by_name: HashMap<&str, &WorkspaceSpec> =
        all.iter().map(|ws| (ws.name.as_str(), ws)).collect();

    let mut queue: VecDeque<&WorkspaceSpec> = VecDeque::new();
    for name in focus {
        let workspace = by_name
            .get(name.as_str())
            .copied()
            .ok_or_else(|| Error::WorkspaceNotFound { name: name.clone() })?;
        queue.push_back(workspace);
    }

    let mut selected = Vec::new();
    let mut seen = HashSet::new();
    while let Some(workspace) = queue.pop_front() {
        if !seen.insert(workspace.name.as_str()) {
            continue;
        }
        selected.push(workspace);

        // Follow workspace: ranges so a focused workspace always comes with
        // the siblings it links against.
        for scope in [DependencyScope::Dependencies, DependencyScope::DevDependencies] {
            for (name, range) in workspace.declared_in(scope) {
                if Range::parse(range).is_workspace() {
                    if let Some(sibling) = by_name.get(name.as_str()).copied() {
                        queue.push_back(sibling);
                    }
                }
            }
        }
    }

    Ok(selected)
}

/// Computes and applies one workspace's lockfile under the write policy.
fn generate_one(project: &Project, workspace: &WorkspaceSpec, mode: WriteMode) -> Result<Status> {
    let document = compute_workspace_lockfile(workspace, &project.graph, &project.metadata);

    for diagnostic in &document.diagnostics {
        match diagnostic.severity {
            Severity::Info => tracing::info!(workspace = %workspace.name, "{diagnostic}"),
            Severity::Error => tracing::error!(workspace = %workspace.name, "{diagnostic}"),
        }
    }
    tracing::info!(
        workspace = %workspace.name,
        entries = document.entries.len(),
        "generated workspace lockfile entries"
    );

    let path = workspace.dir.join(crate::WORKSPACE_LOCKFILE_NAME);
    match mode {
        WriteMode::Write => {
            let existing = fs::read_to_string(&path).ok();
            if existing.as_deref() == Some(document.text.as_str()) {
                return Ok(Status::UpToDate);
            }
            fs::write(&path, &document.text).map_err(|source| Error::Io {
                source,
                path: Some(path),
                operation: "writing workspace lockfile".to_string(),
            })?;
            Ok(Status::Written)
        }
        WriteMode::Verify => {
            let existing = fs::read_to_string(&path).ok();
            if existing.as_deref() == Some(document.text.as_str()) {
                Ok(Status::UpToDate)
            } else {
                Ok(Status::Drift)
            }
        }
    }
}

/// Whether the process runs under a CI environment.
///
/// Focused generate runs become immutable on CI so a stale focus list cannot
/// silently rewrite lockfiles there.
#[must_use]
pub fn running_in_ci() -> bool {
    std::env::var("CI").is_ok_and(|value| {
        !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
    })
}
