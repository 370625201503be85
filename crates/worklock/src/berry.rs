//! Repository `yarn.lock` ingestion.
//!
//! The Berry lockfile is YAML: a `__metadata` block plus one record per
//! resolution, keyed by the `", "`-joined descriptors that resolve there.
//! Each record feeds three tables of the in-memory graph: descriptor to
//! locator, locator to package, and locator to checksum.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use worklock_core::{
    Descriptor, Error, Ident, InMemoryResolutionGraph, LinkType, Locator, LockfileMetadata,
    Package, PeerMeta, Result,
};

/// A YAML scalar that may arrive as a string, number, or bool.
///
/// Berry writes most scalars unquoted, so `version: 2` parses as a number
/// while `version: 1.2.3` parses as a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    /// Quoted or unambiguous string.
    String(String),
    /// Bare integer or float.
    Number(serde_yaml::Number),
    /// Bare `true`/`false`.
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::String(s) => s,
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BerryMetadata {
    #[serde(default)]
    version: Option<Scalar>,
    #[serde(default)]
    cache_key: Option<Scalar>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct BerryRecord {
    #[serde(default)]
    version: Option<Scalar>,
    #[serde(default)]
    resolution: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, Scalar>,
    #[serde(default)]
    peer_dependencies: BTreeMap<String, Scalar>,
    #[serde(default)]
    peer_dependencies_meta: BTreeMap<String, BerryPeerMeta>,
    #[serde(default)]
    bin: BTreeMap<String, String>,
    #[serde(default)]
    checksum: Option<String>,
    #[serde(default)]
    language_name: Option<String>,
    #[serde(default)]
    link_type: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct BerryPeerMeta {
    #[serde(default)]
    optional: bool,
}

/// Loads the repository lockfile into a resolution graph.
///
/// Records without a `resolution` field are skipped with a warning; the
/// returned metadata feeds the generated documents' headers.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid YAML, or
/// contains a record whose key or resolution is not a valid descriptor or
/// locator.
pub fn load_resolution_graph(
    path: &Path,
) -> Result<(InMemoryResolutionGraph, LockfileMetadata)> {
    let contents = fs::read_to_string(path).map_err(|source| Error::Io {
        source,
        path: Some(path.to_path_buf()),
        operation: "reading yarn.lock".to_string(),
    })?;

    parse_resolution_graph(&contents, path)
}

/// Parses lockfile contents; split from [`load_resolution_graph`] so tests
/// can feed strings directly.
///
/// # Errors
///
/// See [`load_resolution_graph`].
pub fn parse_resolution_graph(
    contents: &str,
    path: &Path,
) -> Result<(InMemoryResolutionGraph, LockfileMetadata)> {
    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(contents).map_err(|source| Error::Yaml {
            source,
            path: Some(path.to_path_buf()),
        })?;

    let mut graph = InMemoryResolutionGraph::new();
    let mut metadata = LockfileMetadata::default();

    for (key, value) in raw {
        if key == "__metadata" {
            let meta: BerryMetadata =
                serde_yaml::from_value(value).map_err(|source| Error::Yaml {
                    source,
                    path: Some(path.to_path_buf()),
                })?;
            if let Some(version) = meta.version {
                metadata.version = version.into_string();
            }
            metadata.cache_key = meta.cache_key.map(Scalar::into_string);
            continue;
        }

        let record: BerryRecord = serde_yaml::from_value(value).map_err(|source| Error::Yaml {
            source,
            path: Some(path.to_path_buf()),
        })?;

        let Some(resolution) = record.resolution else {
            tracing::warn!(key = %key, "lockfile record has no resolution, skipping");
            continue;
        };

        let locator =
            Locator::parse(&resolution).ok_or_else(|| Error::LockfileParseFailed {
                path: path.to_path_buf(),
                message: format!("invalid resolution '{resolution}'"),
            })?;

        for part in key.split(',') {
            let spec = part.trim();
            let descriptor =
                Descriptor::parse(spec).ok_or_else(|| Error::LockfileParseFailed {
                    path: path.to_path_buf(),
                    message: format!("invalid descriptor '{spec}'"),
                })?;
            graph.insert_resolution(descriptor, locator.clone());
        }

        if let Some(checksum) = record.checksum {
            graph.insert_checksum(locator.clone(), checksum);
        }

        graph.insert_package(Package {
            locator: locator.clone(),
            version: record.version.map(Scalar::into_string),
            language_name: record.language_name.unwrap_or_else(|| "node".to_string()),
            link_type: LinkType::parse(record.link_type.as_deref().unwrap_or("hard")),
            dependencies: descriptor_map(record.dependencies),
            peer_dependencies: descriptor_map(record.peer_dependencies),
            peer_dependencies_meta: record
                .peer_dependencies_meta
                .into_iter()
                .map(|(name, meta)| (name, PeerMeta { optional: meta.optional }))
                .collect(),
            bin: record.bin,
        });
    }

    tracing::debug!(
        resolutions = graph.resolution_count(),
        packages = graph.package_count(),
        "loaded resolution graph"
    );

    Ok((graph, metadata))
}

fn descriptor_map(raw: BTreeMap<String, Scalar>) -> BTreeMap<String, Descriptor> {
    raw.into_iter()
        .map(|(name, range)| {
            let descriptor = Descriptor::new(Ident::parse(&name), range.into_string());
            (name, descriptor)
        })
        .collect()
}
