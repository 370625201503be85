//! Core data model for per-workspace lockfile generation.
//!
//! This crate defines the vocabulary shared by the closure builder and the
//! driver:
//!
//! - [`Descriptor`] - a named, ranged dependency *request*
//! - [`Locator`] - a concrete, resolved package *instance*
//! - [`Package`] - the metadata attached to a locator (its own dependencies,
//!   peer dependencies, binaries, link type)
//! - [`Range`] - the closed set of range dialects (`workspace:`, `npm:`,
//!   `virtual:`, bare) with a single total parse function
//! - [`ResolutionGraphView`] - a read-only view over the repository-wide
//!   resolution table, threaded explicitly through every computation so
//!   tests can substitute a fabricated graph
//!
//! Nothing in this crate performs I/O or resolves version ranges; the
//! repository-wide resolution is an input, produced elsewhere and consumed
//! through [`ResolutionGraphView`].

pub mod diagnostics;
pub mod error;
pub mod graph;
pub mod range;
pub mod types;

pub use diagnostics::{Diagnostic, Severity};
pub use error::{Error, Result};
pub use graph::{InMemoryResolutionGraph, ResolutionGraphView};
pub use range::{NormalizeContext, Range, normalize};
pub use types::{
    ClosureEntry, DependencyScope, Descriptor, Ident, LinkType, Locator, LockfileMetadata,
    Package, PeerMeta, WorkspaceSpec,
};
