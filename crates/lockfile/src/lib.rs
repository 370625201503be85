//! Per-workspace lockfile computation.
//!
//! Given a workspace's declared dependency ranges and a read-only view of the
//! repository-wide resolution graph, this crate computes the minimal closed
//! set of resolved packages the workspace needs and renders it as stable,
//! human-diffable text:
//!
//! 1. [`builder`] collects the workspace's root requests (including the
//!    one-level pull-in of sibling workspaces' declared dependencies) and
//!    expands them to the full transitive closure.
//! 2. [`group`] merges all descriptors that resolve to the same concrete
//!    package into one [`ClosureEntry`], filtering resolver-internal
//!    artifacts (virtual aliases, synthetic type-declaration peers).
//! 3. [`serialize`] renders the entries as sorted, quoted, byte-stable text
//!    whose ordering is independent of any traversal order.
//!
//! The whole pipeline is synchronous, allocation-only, and never touches the
//! filesystem; writing or verifying the artifact belongs to the driver.

pub mod builder;
pub mod group;
pub mod serialize;

use serde::Serialize;
use worklock_core::{ClosureEntry, Diagnostic, LockfileMetadata, ResolutionGraphView, WorkspaceSpec};

/// A computed per-workspace lockfile.
///
/// Carries both the serialized text (for writing or byte-comparison) and the
/// structured entries (for callers that compare programmatically).
#[derive(Debug, Clone, Serialize)]
pub struct LockfileDocument {
    /// The full serialized document.
    pub text: String,
    /// The grouped closure entries, ordered by locator.
    pub entries: Vec<ClosureEntry>,
    /// Everything that was dropped on the way, and why.
    pub diagnostics: Vec<Diagnostic>,
}

/// Computes the lockfile document for one workspace.
///
/// Missing resolutions and missing package records never fail the
/// computation; the affected nodes are dropped and reported through the
/// document's diagnostics, in phase order (traversal first, then grouping).
#[must_use]
pub fn compute_workspace_lockfile(
    workspace: &WorkspaceSpec,
    graph: &dyn ResolutionGraphView,
    metadata: &LockfileMetadata,
) -> LockfileDocument {
    let roots = builder::collect_roots(workspace, graph);
    let closure = builder::expand(roots, graph);
    let (entries, group_diagnostics) = group::group(&closure.groups, graph);
    let text = serialize::serialize(&entries, metadata);

    let mut diagnostics = closure.diagnostics;
    diagnostics.extend(group_diagnostics);

    tracing::debug!(
        workspace = %workspace.name,
        entries = entries.len(),
        diagnostics = diagnostics.len(),
        "computed workspace lockfile"
    );

    LockfileDocument {
        text,
        entries,
        diagnostics,
    }
}
