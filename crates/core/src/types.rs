//! Identity, package, and workspace types.
//!
//! [`Descriptor`] and [`Locator`] derive `Hash` and `Ord` and are used
//! directly as map keys; the grouping stage keys entries by [`Locator`] and
//! the traversal dedups requests by their normalized descriptor string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A package identifier: an optional scope plus a name.
///
/// Stringifies to `name` for unscoped packages and `@scope/name` for scoped
/// ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ident {
    /// Scope without the leading `@`, when present.
    pub scope: Option<String>,
    /// Unqualified package name.
    pub name: String,
}

impl Ident {
    /// Creates an identifier from an optional scope and a name.
    #[must_use]
    pub fn new(scope: Option<&str>, name: &str) -> Self {
        Self {
            scope: scope.map(ToString::to_string),
            name: name.to_string(),
        }
    }

    /// Parses `name` or `@scope/name`. Total: an `@`-prefixed string without
    /// a `/` is kept verbatim as the name.
    #[must_use]
    pub fn parse(full: &str) -> Self {
        if let Some(rest) = full.strip_prefix('@') {
            if let Some((scope, name)) = rest.split_once('/') {
                return Self::new(Some(scope), name);
            }
        }
        Self::new(None, full)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "@{}/{}", scope, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Splits `<ident>@<suffix>`, skipping the leading `@` of a scoped name.
fn split_ident(spec: &str) -> Option<(Ident, &str)> {
    let at = if let Some(rest) = spec.strip_prefix('@') {
        rest.find('@').map(|idx| idx + 1)?
    } else {
        spec.find('@')?
    };
    Some((Ident::parse(&spec[..at]), &spec[at + 1..]))
}

/// A dependency *request*: what a manifest asked for.
///
/// Many descriptors can resolve to the same concrete package; descriptors are
/// never unique across a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Descriptor {
    /// The requested package.
    pub ident: Ident,
    /// The requested range, in any dialect (see [`crate::Range`]).
    pub range: String,
}

impl Descriptor {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(ident: Ident, range: impl Into<String>) -> Self {
        Self {
            ident,
            range: range.into(),
        }
    }

    /// Parses `<ident>@<range>`; `None` when no range separator is present.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let (ident, range) = split_ident(spec)?;
        Some(Self::new(ident, range))
    }

    /// The key under which the traversal marks this request visited.
    ///
    /// Differently-spelled but equivalent requests (bare vs. `npm:`) share a
    /// visit key; `virtual:` wrappers deliberately do not collapse so each
    /// virtual instantiation is walked on its own.
    #[must_use]
    pub fn visit_key(&self) -> String {
        format!(
            "{}@{}",
            self.ident,
            crate::range::normalize(&self.range, crate::range::NormalizeContext::VisitKey)
        )
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.range)
    }
}

/// A concrete resolved package *instance*.
///
/// The reference pins one physical package: one registry version, one
/// workspace path, or one virtual instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locator {
    /// The resolved package.
    pub ident: Ident,
    /// The pinned reference, e.g. `npm:4.17.21` or `workspace:packages/a`.
    pub reference: String,
}

impl Locator {
    /// Creates a locator.
    #[must_use]
    pub fn new(ident: Ident, reference: impl Into<String>) -> Self {
        Self {
            ident,
            reference: reference.into(),
        }
    }

    /// Parses `<ident>@<reference>`; `None` when no separator is present.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let (ident, reference) = split_ident(spec)?;
        Some(Self::new(ident, reference))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.ident, self.reference)
    }
}

/// How a resolved package is materialized on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// A package fully owned by the install (copied or unpacked).
    Hard,
    /// A package linked in place, e.g. another workspace of the project.
    Soft,
}

impl LinkType {
    /// Parses the manifest spelling, case-insensitively; anything that is
    /// not `soft` is treated as hard.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("soft") {
            Self::Soft
        } else {
            Self::Hard
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hard => write!(f, "hard"),
            Self::Soft => write!(f, "soft"),
        }
    }
}

/// Per-peer-dependency metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMeta {
    /// Whether the peer dependency is optional for consumers.
    #[serde(default)]
    pub optional: bool,
}

/// Metadata attached to a [`Locator`] by the repository-wide resolver.
///
/// Checksums are intentionally absent here: they are externally supplied and
/// live on the graph view (see [`crate::ResolutionGraphView::checksum_of`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// The locator this metadata belongs to.
    pub locator: Locator,
    /// Package version; `None` for workspace-local packages.
    pub version: Option<String>,
    /// Resolver language namespace, e.g. `node`.
    pub language_name: String,
    /// How the package is materialized.
    pub link_type: LinkType,
    /// The package's own runtime dependencies, keyed by stringified ident.
    pub dependencies: BTreeMap<String, Descriptor>,
    /// The package's peer dependencies, keyed by stringified ident.
    pub peer_dependencies: BTreeMap<String, Descriptor>,
    /// Metadata qualifying entries of `peer_dependencies`.
    pub peer_dependencies_meta: BTreeMap<String, PeerMeta>,
    /// Executables the package exposes, name to relative path.
    pub bin: BTreeMap<String, String>,
}

impl Package {
    /// Creates an empty package record for a locator with the given link
    /// type; `language_name` defaults to `node`.
    #[must_use]
    pub fn new(locator: Locator, version: Option<&str>, link_type: LinkType) -> Self {
        Self {
            locator,
            version: version.map(ToString::to_string),
            language_name: "node".to_string(),
            link_type,
            dependencies: BTreeMap::new(),
            peer_dependencies: BTreeMap::new(),
            peer_dependencies_meta: BTreeMap::new(),
            bin: BTreeMap::new(),
        }
    }
}

/// One of the three declared dependency scopes of a manifest.
///
/// The derived `Ord` fixes the iteration order used everywhere: regular
/// dependencies, then dev, then peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyScope {
    /// `dependencies`.
    Dependencies,
    /// `devDependencies`.
    DevDependencies,
    /// `peerDependencies`.
    PeerDependencies,
}

impl DependencyScope {
    /// All scopes, in declaration-iteration order.
    pub const ALL: [Self; 3] = [Self::Dependencies, Self::DevDependencies, Self::PeerDependencies];

    /// The manifest key this scope is declared under.
    #[must_use]
    pub const fn manifest_key(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
        }
    }
}

/// A workspace of the project, as declared by its manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSpec {
    /// The manifest name (scoped or not).
    pub name: String,
    /// Directory the workspace lives in.
    pub dir: PathBuf,
    /// Declared dependency ranges per scope, name to raw range string.
    pub declared: BTreeMap<DependencyScope, BTreeMap<String, String>>,
    /// Whether this is the project root workspace.
    pub is_root: bool,
}

impl WorkspaceSpec {
    /// Creates a workspace with no declared dependencies.
    #[must_use]
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
            declared: BTreeMap::new(),
            is_root: false,
        }
    }

    /// The declared ranges for one scope; empty when the scope is absent.
    #[must_use]
    pub fn declared_in(&self, scope: DependencyScope) -> &BTreeMap<String, String> {
        static EMPTY: BTreeMap<String, String> = BTreeMap::new();
        self.declared.get(&scope).unwrap_or(&EMPTY)
    }

    /// Adds a declared dependency range under a scope.
    pub fn declare(&mut self, scope: DependencyScope, name: impl Into<String>, range: impl Into<String>) {
        self.declared
            .entry(scope)
            .or_default()
            .insert(name.into(), range.into());
    }
}

/// Header data for a serialized lockfile document, supplied by the driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockfileMetadata {
    /// Lock-format schema version, e.g. `6`.
    pub version: String,
    /// Opaque cache key of the resolver run, when known.
    pub cache_key: Option<String>,
}

impl Default for LockfileMetadata {
    fn default() -> Self {
        Self {
            version: "6".to_string(),
            cache_key: None,
        }
    }
}

/// One record of a per-workspace lockfile: a deduplicated resolution together
/// with every surviving descriptor that reaches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClosureEntry {
    /// Sorted stringified descriptors resolving here, `virtual:` ones
    /// already removed. Never empty.
    pub keys: Vec<String>,
    /// Display version: the package version, `0.0.0-use.local` for
    /// workspace-linked packages, or `unknown`.
    pub version: String,
    /// Stringified locator.
    pub resolution: String,
    /// Dependencies in output form (`npm:`-prefixed or `workspace:`).
    pub dependencies: BTreeMap<String, String>,
    /// Peer dependencies in output form (bare or `workspace:`).
    pub peer_dependencies: BTreeMap<String, String>,
    /// Exposed executables.
    pub bin: BTreeMap<String, String>,
    /// Externally supplied checksum; empty when the resolver had none.
    pub checksum: String,
    /// Resolver language namespace.
    pub language_name: String,
    /// Materialization of the package.
    pub link_type: LinkType,
}

impl ClosureEntry {
    /// The record key: all surviving descriptors, comma-joined.
    #[must_use]
    pub fn combined_key(&self) -> String {
        self.keys.join(", ")
    }
}
