//! Per-node drop reasons accumulated during closure building.
//!
//! The closure builder never aborts on a missing node and never logs from
//! inside the traversal; it records what it dropped and why, and returns the
//! list to the caller. The driver decides how loudly to surface them.

use crate::types::{Descriptor, Locator};
use serde::Serialize;
use std::fmt;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected, recoverable condition.
    Info,
    /// Unexpected condition worth investigating.
    Error,
}

/// A single event recorded while building a workspace closure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Event severity.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// An info-level diagnostic.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    /// An error-level diagnostic.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// A descriptor had no entry in the resolution graph and was dropped.
    #[must_use]
    pub fn unresolved_descriptor(descriptor: &Descriptor) -> Self {
        Self::info(format!("No resolution found for {descriptor}"))
    }

    /// A resolved locator had no package record and was dropped.
    #[must_use]
    pub fn missing_package(descriptor: &Descriptor, locator: &Locator) -> Self {
        Self::info(format!("No package found for {descriptor} (resolved to {locator})"))
    }

    /// Every descriptor of a group was virtual; the group was skipped.
    #[must_use]
    pub fn virtual_only_group(locator: &Locator) -> Self {
        Self::info(format!("Skipping {locator}: only virtual descriptors resolve to it"))
    }

    /// A synthetic type-declaration peer dependency was excluded.
    #[must_use]
    pub fn synthetic_peer_skipped(locator: &Locator, name: &str) -> Self {
        Self::info(format!("Skipping optional {name} peer dependency of {locator}"))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
