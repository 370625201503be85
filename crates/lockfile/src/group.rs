//! Resolution grouping: one lockfile record per concrete package.
//!
//! All descriptors resolving to the same locator collapse into one
//! [`ClosureEntry`]. Virtual aliases are resolution-time artifacts and never
//! appear in an emitted key; a group left with no real requester is skipped
//! entirely.

use std::collections::{BTreeMap, BTreeSet};
use worklock_core::{
    ClosureEntry, Descriptor, Diagnostic, LinkType, Locator, NormalizeContext, Package, Range,
    ResolutionGraphView, normalize,
};

/// Reserved namespace of type-declaration packages.
const TYPES_SCOPE_PREFIX: &str = "@types/";

/// Merges grouped descriptors into lockfile entries.
///
/// Groups whose locator has no package record are skipped (the traversal
/// already reported them); groups whose descriptor set is purely virtual are
/// skipped with a diagnostic.
#[must_use]
pub fn group(
    groups: &BTreeMap<Locator, BTreeSet<Descriptor>>,
    graph: &dyn ResolutionGraphView,
) -> (Vec<ClosureEntry>, Vec<Diagnostic>) {
    let mut entries = Vec::new();
    let mut diagnostics = Vec::new();

    for (locator, descriptors) in groups {
        let Some(package) = graph.lookup(locator) else {
            continue;
        };

        let mut keys: Vec<String> = descriptors
            .iter()
            .filter(|descriptor| !Range::parse(&descriptor.range).is_virtual())
            .map(ToString::to_string)
            .collect();
        keys.sort();

        if keys.is_empty() {
            diagnostics.push(Diagnostic::virtual_only_group(locator));
            continue;
        }

        let dependencies = package
            .dependencies
            .values()
            .map(|dep| {
                (
                    dep.ident.to_string(),
                    normalize(&dep.range, NormalizeContext::DependencyValue),
                )
            })
            .collect();

        let mut peer_dependencies = BTreeMap::new();
        for dep in package.peer_dependencies.values() {
            let name = dep.ident.to_string();
            if is_synthetic_types_peer(package, &name, &dep.range) {
                diagnostics.push(Diagnostic::synthetic_peer_skipped(locator, &name));
                continue;
            }
            peer_dependencies.insert(name, normalize(&dep.range, NormalizeContext::PeerValue));
        }

        entries.push(ClosureEntry {
            keys,
            version: entry_version(package),
            resolution: locator.to_string(),
            dependencies,
            peer_dependencies,
            bin: package.bin.clone(),
            checksum: graph.checksum_of(locator).unwrap_or_default().to_string(),
            language_name: package.language_name.clone(),
            link_type: package.link_type,
        });
    }

    (entries, diagnostics)
}

/// A peer dependency injected by the resolver's type-augmentation step
/// rather than declared by the package: reserved `@types/` namespace,
/// unconstrained range, and marked optional.
fn is_synthetic_types_peer(package: &Package, name: &str, range: &str) -> bool {
    name.starts_with(TYPES_SCOPE_PREFIX)
        && range == "*"
        && package
            .peer_dependencies_meta
            .get(name)
            .is_some_and(|meta| meta.optional)
}

/// Workspace-linked packages display a local placeholder instead of a
/// registry version; packages without any version fall back to `unknown`.
fn entry_version(package: &Package) -> String {
    if package.link_type == LinkType::Soft && Range::parse(&package.locator.reference).is_workspace()
    {
        return "0.0.0-use.local".to_string();
    }
    package
        .version
        .clone()
        .unwrap_or_else(|| "unknown".to_string())
}
