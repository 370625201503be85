//! Read-only access to the repository-wide resolution graph.
//!
//! The graph is produced by the repository resolver, outside this crate. The
//! closure builder only ever reads it, through [`ResolutionGraphView`], which
//! is threaded explicitly through every call so tests can substitute a
//! fabricated graph.

use crate::range::{NormalizeContext, Range, normalize};
use crate::types::{Descriptor, Locator, Package, WorkspaceSpec};
use std::collections::HashMap;

/// Read-only view over the repository-wide resolution table.
pub trait ResolutionGraphView {
    /// The concrete package a request resolved to, if any.
    fn resolve(&self, descriptor: &Descriptor) -> Option<Locator>;

    /// The metadata stored for a resolved package, if any.
    fn lookup(&self, locator: &Locator) -> Option<&Package>;

    /// Every workspace of the project.
    fn workspaces(&self) -> &[WorkspaceSpec];

    /// The externally computed checksum for a resolved package, if any.
    fn checksum_of(&self, locator: &Locator) -> Option<&str>;
}

/// An owned, immutable-after-construction resolution graph.
///
/// Both the driver's lockfile ingestion and fabricated test graphs build one
/// of these through the `insert_*` helpers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryResolutionGraph {
    resolutions: HashMap<Descriptor, Locator>,
    packages: HashMap<Locator, Package>,
    checksums: HashMap<Locator, String>,
    workspaces: Vec<WorkspaceSpec>,
}

impl InMemoryResolutionGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a descriptor resolves to a locator.
    pub fn insert_resolution(&mut self, descriptor: Descriptor, locator: Locator) {
        self.resolutions.insert(descriptor, locator);
    }

    /// Stores a package record, keyed by its own locator.
    pub fn insert_package(&mut self, package: Package) {
        self.packages.insert(package.locator.clone(), package);
    }

    /// Stores an externally supplied checksum for a locator.
    pub fn insert_checksum(&mut self, locator: Locator, checksum: impl Into<String>) {
        self.checksums.insert(locator, checksum.into());
    }

    /// Registers a workspace.
    pub fn add_workspace(&mut self, workspace: WorkspaceSpec) {
        self.workspaces.push(workspace);
    }

    /// Number of descriptor resolutions stored.
    #[must_use]
    pub fn resolution_count(&self) -> usize {
        self.resolutions.len()
    }

    /// Number of package records stored.
    #[must_use]
    pub fn package_count(&self) -> usize {
        self.packages.len()
    }
}

impl ResolutionGraphView for InMemoryResolutionGraph {
    fn resolve(&self, descriptor: &Descriptor) -> Option<Locator> {
        if let Some(locator) = self.resolutions.get(descriptor) {
            return Some(locator.clone());
        }

        // The repository resolver canonicalizes bare ranges under the npm:
        // dialect before storing them; retry a bare request under that
        // spelling so sibling-declared bare ranges still resolve.
        if matches!(Range::parse(&descriptor.range), Range::Bare(_)) {
            let canonical = Descriptor::new(
                descriptor.ident.clone(),
                normalize(&descriptor.range, NormalizeContext::VisitKey),
            );
            tracing::trace!(descriptor = %descriptor, retry = %canonical, "retrying bare range under npm: spelling");
            return self.resolutions.get(&canonical).cloned();
        }

        None
    }

    fn lookup(&self, locator: &Locator) -> Option<&Package> {
        self.packages.get(locator)
    }

    fn workspaces(&self) -> &[WorkspaceSpec] {
        &self.workspaces
    }

    fn checksum_of(&self, locator: &Locator) -> Option<&str> {
        self.checksums.get(locator).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Ident, LinkType};

    fn locator(spec: &str) -> Locator {
        Locator::parse(spec).unwrap()
    }

    fn descriptor(spec: &str) -> Descriptor {
        Descriptor::parse(spec).unwrap()
    }

    #[test]
    fn resolves_exact_descriptor() {
        let mut graph = InMemoryResolutionGraph::new();
        graph.insert_resolution(descriptor("lodash@npm:^4.17.21"), locator("lodash@npm:4.17.21"));

        assert_eq!(
            graph.resolve(&descriptor("lodash@npm:^4.17.21")),
            Some(locator("lodash@npm:4.17.21"))
        );
        assert_eq!(graph.resolve(&descriptor("lodash@npm:^5.0.0")), None);
    }

    #[test]
    fn bare_range_falls_back_to_npm_spelling() {
        let mut graph = InMemoryResolutionGraph::new();
        graph.insert_resolution(descriptor("lodash@npm:^4.17.21"), locator("lodash@npm:4.17.21"));

        let bare = Descriptor::new(Ident::parse("lodash"), "^4.17.21");
        assert_eq!(graph.resolve(&bare), Some(locator("lodash@npm:4.17.21")));
    }

    #[test]
    fn workspace_range_does_not_fall_back() {
        let mut graph = InMemoryResolutionGraph::new();
        graph.insert_resolution(
            descriptor("pkg@npm:workspace:*"),
            locator("pkg@workspace:packages/pkg"),
        );

        let ws = Descriptor::new(Ident::parse("pkg"), "workspace:*");
        assert_eq!(graph.resolve(&ws), None);
    }

    #[test]
    fn lookup_and_checksum_round_trip() {
        let mut graph = InMemoryResolutionGraph::new();
        let loc = locator("lodash@npm:4.17.21");
        graph.insert_package(Package::new(loc.clone(), Some("4.17.21"), LinkType::Hard));
        graph.insert_checksum(loc.clone(), "10c0/deadbeef");

        assert_eq!(
            graph.lookup(&loc).and_then(|p| p.version.as_deref()),
            Some("4.17.21")
        );
        assert_eq!(graph.checksum_of(&loc), Some("10c0/deadbeef"));
        assert_eq!(graph.checksum_of(&locator("missing@npm:1.0.0")), None);
    }
}
