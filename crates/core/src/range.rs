//! Version-range dialects and normalization.
//!
//! Ranges arrive in three overlapping dialects plus an ambiguous bare form.
//! [`Range::parse`] is the single total classifier; call sites match on the
//! variant instead of re-sniffing prefixes.

use std::fmt;

/// The dialect of a raw range string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Range {
    /// `workspace:` - links a sibling workspace of the same project.
    Workspace(String),
    /// `npm:` - a registry request (semver range or dist-tag).
    Npm(String),
    /// `virtual:<context>#npm:<inner>` - resolver-internal bookkeeping that
    /// disambiguates peer-dependency instantiations; never a genuine user
    /// requirement.
    Virtual {
        /// The virtualization context hash.
        context: String,
        /// The wrapped registry range.
        inner: String,
    },
    /// No recognized prefix; treated as a registry request on normalization.
    Bare(String),
}

impl Range {
    /// Classifies a raw range string. Total: every input maps to exactly one
    /// variant, [`Range::Bare`] being the fallback. A `virtual:` range whose
    /// payload lacks the `#npm:` splitter degrades to bare.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if let Some(rest) = raw.strip_prefix("workspace:") {
            return Self::Workspace(rest.to_string());
        }
        if let Some(rest) = raw.strip_prefix("npm:") {
            return Self::Npm(rest.to_string());
        }
        if let Some(rest) = raw.strip_prefix("virtual:") {
            if let Some((context, inner)) = rest.split_once("#npm:") {
                return Self::Virtual {
                    context: context.to_string(),
                    inner: inner.to_string(),
                };
            }
        }
        Self::Bare(raw.to_string())
    }

    /// Whether this is a resolver-internal virtual wrapper.
    #[must_use]
    pub const fn is_virtual(&self) -> bool {
        matches!(self, Self::Virtual { .. })
    }

    /// Whether this links a sibling workspace.
    #[must_use]
    pub const fn is_workspace(&self) -> bool {
        matches!(self, Self::Workspace(_))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workspace(rest) => write!(f, "workspace:{rest}"),
            Self::Npm(rest) => write!(f, "npm:{rest}"),
            Self::Virtual { context, inner } => write!(f, "virtual:{context}#npm:{inner}"),
            Self::Bare(raw) => write!(f, "{raw}"),
        }
    }
}

/// Where a normalized range will be used.
///
/// The key and value namespaces legitimately diverge: dependency values
/// spell the `npm:` prefix out, peer values elide it, and the visit key is a
/// canonical spelling that keeps `virtual:` wrappers intact so distinct
/// virtual instantiations are each traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeContext {
    /// Value position of an emitted `dependencies` map.
    DependencyValue,
    /// Value position of an emitted `peerDependencies` map.
    PeerValue,
    /// Visited-set key during closure traversal.
    VisitKey,
}

/// Canonicalizes a raw range for the given context.
///
/// Pure string transform: never consults the resolution graph, deterministic,
/// and idempotent per context.
#[must_use]
pub fn normalize(range: &str, ctx: NormalizeContext) -> String {
    match ctx {
        NormalizeContext::VisitKey => {
            if range.starts_with("workspace:") {
                range.to_string()
            } else {
                format!("npm:{}", range.strip_prefix("npm:").unwrap_or(range))
            }
        }
        NormalizeContext::DependencyValue => match Range::parse(range) {
            Range::Workspace(_) | Range::Npm(_) => range.to_string(),
            Range::Virtual { inner, .. } => format!("npm:{inner}"),
            Range::Bare(raw) => format!("npm:{raw}"),
        },
        NormalizeContext::PeerValue => match Range::parse(range) {
            Range::Workspace(_) => range.to_string(),
            Range::Npm(inner) | Range::Virtual { inner, .. } | Range::Bare(inner) => inner,
        },
    }
}
