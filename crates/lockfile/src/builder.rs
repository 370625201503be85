//! Workspace closure construction.
//!
//! Root collection walks the three declared scopes of the target workspace;
//! a dependency that names a sibling workspace additionally pulls in that
//! sibling's own declared dependencies (one level only - deeper reach happens
//! through the resolution graph, not through manifests). Expansion is an
//! explicit worklist over the graph view, with the visited set keyed by the
//! normalized descriptor string.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use worklock_core::{
    DependencyScope, Descriptor, Diagnostic, Ident, Locator, Range, ResolutionGraphView,
    WorkspaceSpec,
};

/// The expanded closure: concrete packages grouped with every descriptor
/// that reached them, plus the drops recorded along the way.
#[derive(Debug, Default)]
pub struct Closure {
    /// Descriptors reaching each locator. A locator may be present without a
    /// package record; grouping skips those.
    pub groups: BTreeMap<Locator, BTreeSet<Descriptor>>,
    /// Per-node drops, in traversal order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Collects the root descriptor set for a workspace.
///
/// For each declared dependency, in scope order then name order:
/// - a name matching a sibling workspace keeps its declared range verbatim,
///   and the sibling's own three scopes of declared dependencies join the
///   root set as well (not recursively);
/// - any other name becomes a registry request, bare ranges coerced to the
///   `npm:` dialect.
#[must_use]
pub fn collect_roots(
    workspace: &WorkspaceSpec,
    graph: &dyn ResolutionGraphView,
) -> Vec<Descriptor> {
    let mut roots = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |roots: &mut Vec<Descriptor>, descriptor: Descriptor| {
        if seen.insert(descriptor.clone()) {
            roots.push(descriptor);
        }
    };

    for scope in DependencyScope::ALL {
        let declared = workspace.declared_in(scope);
        tracing::debug!(
            workspace = %workspace.name,
            scope = scope.manifest_key(),
            count = declared.len(),
            "collecting declared dependencies"
        );

        for (name, range) in declared {
            let sibling = graph.workspaces().iter().find(|ws| ws.name == *name);

            if let Some(sibling) = sibling {
                push(&mut roots, Descriptor::new(Ident::parse(name), range.clone()));

                // One-level pull-in: a workspace dependency is linked in
                // place rather than re-resolved, so its consumers must see
                // its declared needs directly.
                for inner_scope in DependencyScope::ALL {
                    for (inner_name, inner_range) in sibling.declared_in(inner_scope) {
                        push(
                            &mut roots,
                            Descriptor::new(Ident::parse(inner_name), inner_range.clone()),
                        );
                    }
                }
            } else {
                let coerced = match Range::parse(range) {
                    Range::Bare(raw) => format!("npm:{raw}"),
                    _ => range.clone(),
                };
                push(&mut roots, Descriptor::new(Ident::parse(name), coerced));
            }
        }
    }

    roots
}

/// Expands a root descriptor set to the full transitive closure.
///
/// Worklist traversal: each request is resolved to a locator, registered in
/// its locator's group, and its package's own dependencies and peer
/// dependencies are enqueued. A request is marked visited only after both
/// the resolution and the package record are found, so a transient miss on
/// one alias never suppresses a later alias that succeeds. Termination is
/// guaranteed by the acyclic-at-locator-level graph plus the visited set.
#[must_use]
pub fn expand(roots: Vec<Descriptor>, graph: &dyn ResolutionGraphView) -> Closure {
    let mut closure = Closure::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<Descriptor> = roots.into();

    while let Some(descriptor) = queue.pop_front() {
        let key = descriptor.visit_key();
        if visited.contains(&key) {
            continue;
        }

        let Some(locator) = graph.resolve(&descriptor) else {
            closure
                .diagnostics
                .push(Diagnostic::unresolved_descriptor(&descriptor));
            continue;
        };

        closure
            .groups
            .entry(locator.clone())
            .or_default()
            .insert(descriptor.clone());

        let Some(package) = graph.lookup(&locator) else {
            closure
                .diagnostics
                .push(Diagnostic::missing_package(&descriptor, &locator));
            continue;
        };

        visited.insert(key);

        for dep in package.dependencies.values() {
            queue.push_back(dep.clone());
        }
        for dep in package.peer_dependencies.values() {
            queue.push_back(dep.clone());
        }
    }

    closure
}

#[cfg(test)]
mod tests {
    use super::*;
    use worklock_core::{InMemoryResolutionGraph, LinkType, Package};

    fn descriptor(spec: &str) -> Descriptor {
        Descriptor::parse(spec).unwrap()
    }

    fn locator(spec: &str) -> Locator {
        Locator::parse(spec).unwrap()
    }

    /// Registry package with the given dependencies, registered under its
    /// caret descriptor.
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
        let mut package = Package::new(loc, Some(version), LinkType::Hard);
        for (dep_name, dep_range) in deps {
            package.dependencies.insert(
                (*dep_name).to_string(),
                Descriptor::new(Ident::parse(dep_name), (*dep_range).to_string()),
            );
        }
        graph.insert_package(package);
    }

    fn workspace_with(deps: &[(&str, &str)]) -> WorkspaceSpec {
        let mut ws = WorkspaceSpec::new("app", "packages/app");
        for (name, range) in deps {
            ws.declare(DependencyScope::Dependencies, *name, *range);
        }
        ws
    }

    // ==========================================================================
    // collect_roots
    // ==========================================================================

    #[test]
    fn bare_ranges_are_coerced_to_npm() {
        let graph = InMemoryResolutionGraph::new();
        let ws = workspace_with(&[("lodash", "^4.17.21")]);

        let roots = collect_roots(&ws, &graph);

        assert_eq!(roots, vec![descriptor("lodash@npm:^4.17.21")]);
    }

    #[test]
    fn npm_and_workspace_ranges_are_kept_verbatim() {
        let graph = InMemoryResolutionGraph::new();
        let ws = workspace_with(&[("a", "npm:~1.0.0"), ("b", "workspace:*")]);

        let roots = collect_roots(&ws, &graph);

        assert!(roots.contains(&descriptor("a@npm:~1.0.0")));
        // "b" names no sibling here, so the workspace: range passes through
        // the registry branch untouched.
        assert!(roots.contains(&descriptor("b@workspace:*")));
    }

    #[test]
    fn sibling_workspace_pulls_in_its_declared_dependencies() {
        let mut graph = InMemoryResolutionGraph::new();
        let mut lib = WorkspaceSpec::new("lib", "packages/lib");
        lib.declare(DependencyScope::Dependencies, "lodash", "^4.17.21");
        lib.declare(DependencyScope::DevDependencies, "typescript", "^5.3.0");
        graph.add_workspace(lib);

        let ws = workspace_with(&[("lib", "workspace:*")]);
        let roots = collect_roots(&ws, &graph);

        assert!(roots.contains(&descriptor("lib@workspace:*")));
        // Sibling deps join with their declared (uncoerced) ranges.
        assert!(roots.contains(&descriptor("lodash@^4.17.21")));
        assert!(roots.contains(&descriptor("typescript@^5.3.0")));
    }

    #[test]
    fn sibling_pull_in_is_one_level_only() {
        let mut graph = InMemoryResolutionGraph::new();
        let mut lib = WorkspaceSpec::new("lib", "packages/lib");
        lib.declare(DependencyScope::Dependencies, "util", "workspace:*");
        graph.add_workspace(lib);
        let mut util = WorkspaceSpec::new("util", "packages/util");
        util.declare(DependencyScope::Dependencies, "left-pad", "^1.3.0");
        graph.add_workspace(util);

        let ws = workspace_with(&[("lib", "workspace:*")]);
        let roots = collect_roots(&ws, &graph);

        // lib's declared deps join the roots; util's own deps do not.
        assert!(roots.contains(&descriptor("util@workspace:*")));
        assert!(!roots.contains(&descriptor("left-pad@^1.3.0")));
        assert!(!roots.contains(&descriptor("left-pad@npm:^1.3.0")));
    }

    #[test]
    fn duplicate_declarations_collapse() {
        let mut graph = InMemoryResolutionGraph::new();
        let mut lib = WorkspaceSpec::new("lib", "packages/lib");
        lib.declare(DependencyScope::Dependencies, "lodash", "^4.17.21");
        graph.add_workspace(lib);

        let mut ws = workspace_with(&[("lib", "workspace:*")]);
        // Same request in a second scope.
        ws.declare(DependencyScope::DevDependencies, "lib", "workspace:*");
        let roots = collect_roots(&ws, &graph);

        let libs = roots
            .iter()
            .filter(|d| d.ident.name == "lib")
            .count();
        assert_eq!(libs, 1);
    }

    // ==========================================================================
    // expand
    // ==========================================================================

    #[test]
    fn expands_transitive_dependencies() {
        let mut graph = InMemoryResolutionGraph::new();
        register(&mut graph, "a", "1.0.0", &[("b", "npm:^2.0.0")]);
        register(&mut graph, "b", "2.0.0", &[("c", "npm:^3.0.0")]);
        register(&mut graph, "c", "3.0.0", &[]);

        let closure = expand(vec![descriptor("a@npm:^1.0.0")], &graph);

        assert_eq!(closure.groups.len(), 3);
        assert!(closure.groups.contains_key(&locator("c@npm:3.0.0")));
        assert!(closure.diagnostics.is_empty());
    }

    #[test]
    fn missing_resolution_is_dropped_with_a_diagnostic() {
        let mut graph = InMemoryResolutionGraph::new();
        register(&mut graph, "a", "1.0.0", &[("ghost", "npm:^9.0.0")]);

        let closure = expand(vec![descriptor("a@npm:^1.0.0")], &graph);

        assert_eq!(closure.groups.len(), 1);
        assert_eq!(closure.diagnostics.len(), 1);
        assert!(closure.diagnostics[0].message.contains("ghost@npm:^9.0.0"));
    }

    #[test]
    fn missing_package_is_dropped_but_still_grouped() {
        let mut graph = InMemoryResolutionGraph::new();
        // Resolution exists, package record does not.
        graph.insert_resolution(descriptor("a@npm:^1.0.0"), locator("a@npm:1.0.0"));

        let closure = expand(vec![descriptor("a@npm:^1.0.0")], &graph);

        assert!(closure.groups.contains_key(&locator("a@npm:1.0.0")));
        assert_eq!(closure.diagnostics.len(), 1);
        assert!(closure.diagnostics[0].message.contains("No package found"));
    }

    #[test]
    fn failed_alias_does_not_poison_the_visited_set() {
        /// Exact-match graph: no bare-range fallback, unlike the in-memory
        /// implementation.
        struct ExactGraph(InMemoryResolutionGraph);

        impl ResolutionGraphView for ExactGraph {
            fn resolve(&self, descriptor: &Descriptor) -> Option<Locator> {
                if matches!(Range::parse(&descriptor.range), Range::Bare(_)) {
                    return None;
                }
                self.0.resolve(descriptor)
            }
            fn lookup(&self, locator: &Locator) -> Option<&Package> {
                self.0.lookup(locator)
            }
            fn workspaces(&self) -> &[WorkspaceSpec] {
                self.0.workspaces()
            }
            fn checksum_of(&self, locator: &Locator) -> Option<&str> {
                self.0.checksum_of(locator)
            }
        }

        let mut inner = InMemoryResolutionGraph::new();
        register(&mut inner, "a", "1.0.0", &[]);
        let graph = ExactGraph(inner);

        // Both spellings share one visit key; the bare one fails first.
        let bare = Descriptor::new(Ident::parse("a"), "^1.0.0");
        let prefixed = descriptor("a@npm:^1.0.0");
        assert_eq!(bare.visit_key(), prefixed.visit_key());

        let closure = expand(vec![bare, prefixed], &graph);

        // The failure did not mark the key visited, so the npm: spelling
        // still resolved.
        assert!(closure.groups.contains_key(&locator("a@npm:1.0.0")));
        assert_eq!(closure.diagnostics.len(), 1);
    }

    #[test]
    fn equivalent_spellings_are_traversed_once() {
        let mut graph = InMemoryResolutionGraph::new();
        register(&mut graph, "a", "1.0.0", &[]);

        let bare = Descriptor::new(Ident::parse("a"), "^1.0.0");
        let prefixed = descriptor("a@npm:^1.0.0");
        let closure = expand(vec![prefixed.clone(), bare], &graph);

        // Only the first spelling lands in the group.
        let group = &closure.groups[&locator("a@npm:1.0.0")];
        assert_eq!(group.len(), 1);
        assert!(group.contains(&prefixed));
    }

    #[test]
    fn peer_dependencies_are_traversed() {
        let mut graph = InMemoryResolutionGraph::new();
        register(&mut graph, "plugin", "1.0.0", &[]);
        register(&mut graph, "host", "2.0.0", &[]);
        let plugin_loc = locator("plugin@npm:1.0.0");
        let mut package = graph.lookup(&plugin_loc).cloned().unwrap();
        package.peer_dependencies.insert(
            "host".to_string(),
            descriptor("host@npm:^2.0.0"),
        );
        graph.insert_package(package);

        let closure = expand(vec![descriptor("plugin@npm:^1.0.0")], &graph);

        assert!(closure.groups.contains_key(&locator("host@npm:2.0.0")));
    }
}
