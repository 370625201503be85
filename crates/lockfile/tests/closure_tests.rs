//! End-to-end closure tests against fabricated resolution graphs.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use proptest::prelude::*;
use std::collections::BTreeSet;
use worklock_core::{
    DependencyScope, Descriptor, Ident, InMemoryResolutionGraph, LinkType, Locator,
    LockfileMetadata, Package, WorkspaceSpec,
};
use worklock_lockfile::compute_workspace_lockfile;

fn descriptor(spec: &str) -> Descriptor {
    Descriptor::parse(spec).unwrap()
}

fn locator(spec: &str) -> Locator {
    Locator::parse(spec).unwrap()
}

/// Registers a registry package resolvable through `name@npm:^version`.
fn register(
    graph: &mut InMemoryResolutionGraph,
    name: &str,
    version: &str,
    deps: &[(&str, &str)],
) {
    let loc = Locator::new(Ident::parse(name), format!("npm:{version}"));
    graph.insert_resolution(
        Descriptor::new(Ident::parse(name), format!("npm:^{version}")),
        loc.clone(),
    );
    let mut package = Package::new(loc.clone(), Some(version), LinkType::Hard);
    for (dep_name, dep_range) in deps {
        package.dependencies.insert(
            (*dep_name).to_string(),
            Descriptor::new(Ident::parse(dep_name), (*dep_range).to_string()),
        );
    }
    graph.insert_package(package);
    graph.insert_checksum(loc, format!("10c0/{name}-{version}"));
}

/// Registers a workspace package: resolution for `name@workspace:*`, a soft
/// package record, and the workspace spec itself.
fn register_workspace(
    graph: &mut InMemoryResolutionGraph,
    name: &str,
    dir: &str,
    deps: &[(&str, &str)],
) {
    let loc = Locator::new(Ident::parse(name), format!("workspace:{dir}"));
    graph.insert_resolution(
        Descriptor::new(Ident::parse(name), "workspace:*"),
        loc.clone(),
    );
    graph.insert_package(Package::new(loc, None, LinkType::Soft));

    let mut spec = WorkspaceSpec::new(name, dir);
    for (dep_name, dep_range) in deps {
        spec.declare(DependencyScope::Dependencies, *dep_name, *dep_range);
    }
    graph.add_workspace(spec);
}

fn app_workspace(deps: &[(&str, &str)]) -> WorkspaceSpec {
    let mut ws = WorkspaceSpec::new("app", "packages/app");
    for (name, range) in deps {
        ws.declare(DependencyScope::Dependencies, *name, *range);
    }
    ws
}

#[test]
fn full_document_for_a_small_graph() {
    let mut graph = InMemoryResolutionGraph::new();
    register(&mut graph, "b", "2.0.0", &[]);
    register(&mut graph, "a", "1.0.0", &[("b", "npm:^2.0.0")]);

    let workspace = app_workspace(&[("a", "^1.0.0")]);
    let metadata = LockfileMetadata {
        version: "6".to_string(),
        cache_key: Some("10c0".to_string()),
    };

    let document = compute_workspace_lockfile(&workspace, &graph, &metadata);

    assert_eq!(
        document.text,
        "# This file is generated by running \"worklock generate\" inside your project.\n\
         # Manual changes might be lost - proceed with caution!\n\
         \n\
         __metadata:\n\
         \x20 version: 6\n\
         \x20 cacheKey: 10c0\n\
         \n\
         \"a@npm:^1.0.0\":\n\
         \x20 version: 1.0.0\n\
         \x20 resolution: \"a@npm:1.0.0\"\n\
         \x20 dependencies:\n\
         \x20   b: \"npm:^2.0.0\"\n\
         \x20 checksum: 10c0/a-1.0.0\n\
         \x20 languageName: node\n\
         \x20 linkType: hard\n\
         \n\
         \"b@npm:^2.0.0\":\n\
         \x20 version: 2.0.0\n\
         \x20 resolution: \"b@npm:2.0.0\"\n\
         \x20 checksum: 10c0/b-2.0.0\n\
         \x20 languageName: node\n\
         \x20 linkType: hard\n"
    );
    assert!(document.diagnostics.is_empty());
}

#[test]
fn workspace_dependency_pulls_in_the_sibling_and_its_dependencies() {
    let mut graph = InMemoryResolutionGraph::new();
    register(&mut graph, "c", "3.0.0", &[]);
    register_workspace(&mut graph, "b", "packages/b", &[("c", "^3.0.0")]);

    let workspace = app_workspace(&[("b", "workspace:*")]);
    let document = compute_workspace_lockfile(&workspace, &graph, &LockfileMetadata::default());

    let resolutions: BTreeSet<&str> = document
        .entries
        .iter()
        .map(|e| e.resolution.as_str())
        .collect();
    assert!(resolutions.contains("b@workspace:packages/b"));
    assert!(resolutions.contains("c@npm:3.0.0"));

    let b_entry = document
        .entries
        .iter()
        .find(|e| e.resolution == "b@workspace:packages/b")
        .unwrap();
    assert_eq!(b_entry.version, "0.0.0-use.local");
}

#[test]
fn workspace_without_sibling_dependencies_has_no_workspace_entries() {
    let mut graph = InMemoryResolutionGraph::new();
    register(&mut graph, "a", "1.0.0", &[]);
    register_workspace(&mut graph, "unrelated", "packages/unrelated", &[]);

    let workspace = app_workspace(&[("a", "^1.0.0")]);
    let document = compute_workspace_lockfile(&workspace, &graph, &LockfileMetadata::default());

    assert!(
        document
            .entries
            .iter()
            .all(|e| !e.resolution.contains("workspace:"))
    );
}

#[test]
fn every_descriptor_lands_in_exactly_one_entry() {
    let mut graph = InMemoryResolutionGraph::new();
    register(&mut graph, "shared", "1.0.0", &[]);
    // A second alias resolving to the same locator.
    graph.insert_resolution(
        descriptor("shared@npm:~1.0.0"),
        locator("shared@npm:1.0.0"),
    );
    register(&mut graph, "a", "1.0.0", &[("shared", "npm:^1.0.0")]);
    register(&mut graph, "b", "2.0.0", &[("shared", "npm:~1.0.0")]);

    let workspace = app_workspace(&[("a", "^1.0.0"), ("b", "^2.0.0")]);
    let document = compute_workspace_lockfile(&workspace, &graph, &LockfileMetadata::default());

    let shared = document
        .entries
        .iter()
        .find(|e| e.resolution == "shared@npm:1.0.0")
        .unwrap();
    assert_eq!(
        shared.keys,
        vec!["shared@npm:^1.0.0".to_string(), "shared@npm:~1.0.0".to_string()]
    );

    // No descriptor appears in two entries.
    let mut seen = BTreeSet::new();
    for entry in &document.entries {
        for key in &entry.keys {
            assert!(seen.insert(key.clone()), "{key} appears twice");
        }
    }
}

#[test]
fn empty_workspace_produces_a_header_only_document() {
    let graph = InMemoryResolutionGraph::new();
    let workspace = app_workspace(&[]);
    let metadata = LockfileMetadata {
        version: "6".to_string(),
        cache_key: Some("10c0".to_string()),
    };

    let document = compute_workspace_lockfile(&workspace, &graph, &metadata);

    assert!(document.entries.is_empty());
    assert!(document.text.contains("__metadata:"));
    assert!(document.text.ends_with("cacheKey: 10c0\n\n"));
}

#[test]
fn recomputing_from_an_unchanged_graph_is_byte_identical() {
    let mut graph = InMemoryResolutionGraph::new();
    register(&mut graph, "b", "2.0.0", &[]);
    register(&mut graph, "a", "1.0.0", &[("b", "npm:^2.0.0")]);
    let workspace = app_workspace(&[("a", "^1.0.0")]);
    let metadata = LockfileMetadata::default();

    let first = compute_workspace_lockfile(&workspace, &graph, &metadata);
    let second = compute_workspace_lockfile(&workspace, &graph, &metadata);

    assert_eq!(first.text, second.text);
}

/// The packages used by the permutation property below.
const PERMUTED: [(&str, &str); 5] = [
    ("alpha", "1.0.0"),
    ("beta", "2.1.0"),
    ("gamma", "3.0.1"),
    ("delta", "0.4.0"),
    ("epsilon", "5.5.5"),
];

/// Builds the same logical graph and workspace, inserting both in the given
/// order.
fn permuted_setup(order: &[usize]) -> (InMemoryResolutionGraph, WorkspaceSpec) {
    let mut graph = InMemoryResolutionGraph::new();
    let mut workspace = WorkspaceSpec::new("app", "packages/app");
    for &idx in order {
        let (name, version) = PERMUTED[idx];
        // Each package depends on the lexicographically next one, wrapping,
        // so the closure is reached through different paths per order.
        let next = PERMUTED[(idx + 1) % PERMUTED.len()];
        register(&mut graph, name, version, &[(next.0, &format!("npm:^{}", next.1))]);
        workspace.declare(DependencyScope::Dependencies, name, format!("^{version}"));
    }
    (graph, workspace)
}

proptest! {
    /// Shuffling the declaration/insertion order never changes the output.
    #[test]
    fn serialized_output_is_independent_of_input_order(
        order in Just((0..PERMUTED.len()).collect::<Vec<usize>>()).prop_shuffle()
    ) {
        let metadata = LockfileMetadata::default();

        let (baseline_graph, baseline_ws) = permuted_setup(&[0, 1, 2, 3, 4]);
        let baseline = compute_workspace_lockfile(&baseline_ws, &baseline_graph, &metadata);

        let (graph, workspace) = permuted_setup(&order);
        let document = compute_workspace_lockfile(&workspace, &graph, &metadata);

        prop_assert_eq!(baseline.text, document.text);
    }
}
