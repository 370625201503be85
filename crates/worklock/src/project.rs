//! Project discovery: workspaces and the resolution graph.
//!
//! The root `package.json` names the workspace member directories through
//! glob patterns; each member's own `package.json` contributes a
//! [`WorkspaceSpec`]. Members without a manifest or without a `name` are
//! skipped so that one broken directory never blocks the whole project.

use crate::berry;
use glob::Pattern;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use worklock_core::{
    DependencyScope, Error, InMemoryResolutionGraph, LockfileMetadata, ResolutionGraphView, Result,
    WorkspaceSpec,
};

/// A loaded project: workspace registry plus the resolution graph built from
/// the repository lockfile.
#[derive(Debug)]
pub struct Project {
    /// Project root directory.
    pub root: PathBuf,
    /// Resolution graph, with every workspace registered.
    pub graph: InMemoryResolutionGraph,
    /// Header metadata taken from the repository lockfile.
    pub metadata: LockfileMetadata,
}

impl Project {
    /// Loads a project from its root directory.
    ///
    /// # Errors
    ///
    /// Returns an error when the root manifest or the repository lockfile is
    /// missing or malformed.
    pub fn load(root: &Path) -> Result<Self> {
        let workspaces = discover_workspaces(root)?;
        let (mut graph, metadata) =
            berry::load_resolution_graph(&root.join(crate::REPO_LOCKFILE_NAME))?;
        for workspace in workspaces {
            graph.add_workspace(workspace);
        }

        Ok(Self {
            root: root.to_path_buf(),
            graph,
            metadata,
        })
    }

    /// Every workspace of the project, root first.
    #[must_use]
    pub fn workspaces(&self) -> &[WorkspaceSpec] {
        self.graph.workspaces()
    }
}

/// The subset of `package.json` this tool reads.
#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    workspaces: Option<WorkspacesField>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "peerDependencies")]
    peer_dependencies: BTreeMap<String, String>,
}

/// The two accepted shapes of the `workspaces` field.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WorkspacesField {
    /// `"workspaces": ["packages/*"]`
    Patterns(Vec<String>),
    /// `"workspaces": { "packages": ["packages/*"] }`
    Detailed {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl WorkspacesField {
    fn into_patterns(self) -> Vec<String> {
        match self {
            Self::Patterns(patterns) | Self::Detailed { packages: patterns } => patterns,
        }
    }
}

/// Discovers the project's workspaces: the root manifest itself plus every
/// member matched by its `workspaces` globs.
///
/// # Errors
///
/// Returns an error when the root manifest cannot be read or parsed, or when
/// a glob pattern is invalid.
pub fn discover_workspaces(root: &Path) -> Result<Vec<WorkspaceSpec>> {
    let manifest_path = root.join("package.json");
    let manifest: Manifest = read_json_file(&manifest_path)?;

    let root_name = manifest
        .name
        .clone()
        .or_else(|| {
            root.file_name()
                .and_then(|n| n.to_str())
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| "root".to_string());

    let mut specs = vec![spec_from_manifest(&manifest, root_name, root, true)];

    let patterns = manifest
        .workspaces
        .map(WorkspacesField::into_patterns)
        .unwrap_or_default();
    for dir in resolve_member_dirs(root, &patterns)? {
        let member_manifest_path = dir.join("package.json");
        if !member_manifest_path.exists() {
            continue;
        }

        let member: Manifest = match read_json_file(&member_manifest_path) {
            Ok(member) => member,
            Err(error) => {
                tracing::debug!(
                    path = %member_manifest_path.display(),
                    %error,
                    "skipping member with malformed manifest"
                );
                continue;
            }
        };

        let Some(name) = member.name.clone() else {
            tracing::debug!(
                path = %member_manifest_path.display(),
                "skipping member without a name"
            );
            continue;
        };

        specs.push(spec_from_manifest(&member, name, &dir, false));
    }

    Ok(specs)
}

fn spec_from_manifest(manifest: &Manifest, name: String, dir: &Path, is_root: bool) -> WorkspaceSpec {
    let mut spec = WorkspaceSpec::new(name, dir);
    spec.is_root = is_root;
    for (scope, declared) in [
        (DependencyScope::Dependencies, &manifest.dependencies),
        (DependencyScope::DevDependencies, &manifest.dev_dependencies),
        (DependencyScope::PeerDependencies, &manifest.peer_dependencies),
    ] {
        for (dep_name, range) in declared {
            spec.declare(scope, dep_name.clone(), range.clone());
        }
    }
    spec
}

/// Resolves workspace glob patterns to member directories.
///
/// Patterns starting with `!` are exclusions; `node_modules`, `.git`, and
/// `dist` are always pruned. The result is sorted and deduplicated.
///
/// # Errors
///
/// Returns an error when a glob pattern is invalid.
pub fn resolve_member_dirs(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut inclusions = Vec::new();
    let mut exclusions = Vec::new();

    for pattern in patterns {
        let (target, raw) = match pattern.strip_prefix('!') {
            Some(stripped) => (&mut exclusions, stripped),
            None => (&mut inclusions, pattern.as_str()),
        };
        let compiled = Pattern::new(raw).map_err(|e| Error::InvalidManifest {
            path: root.join("package.json"),
            message: format!("invalid workspace pattern '{pattern}': {e}"),
        })?;
        target.push(compiled);
    }

    let mut matched = HashSet::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();
    for entry in walker
        .filter_entry(|e| {
            let name = e.file_name().to_str().unwrap_or("");
            !matches!(name, "node_modules" | ".git" | "dist")
        })
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_dir() || entry.path() == root {
            continue;
        }

        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            continue;
        };

        if exclusions.iter().any(|p| p.matches_path(rel_path)) {
            continue;
        }
        if inclusions.iter().any(|p| p.matches_path(rel_path)) {
            matched.insert(entry.path().to_path_buf());
        }
    }

    let mut result: Vec<PathBuf> = matched.into_iter().collect();
    result.sort();
    Ok(result)
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed as valid JSON.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::Io {
        source: e,
        path: Some(path.to_path_buf()),
        operation: "reading json file".to_string(),
    })?;

    serde_json::from_str(&content).map_err(|e| Error::Json {
        source: e,
        path: Some(path.to_path_buf()),
    })
}
