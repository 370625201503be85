//! Deterministic lockfile text rendering.
//!
//! Output is a pure function of the entry set: records are rendered first and
//! then sorted by their full text (ordinal), so ties are impossible and the
//! document is byte-identical across runs for identical input.

use worklock_core::{ClosureEntry, LockfileMetadata};

/// Banner comment at the top of every generated document.
const BANNER: &str = "# This file is generated by running \"worklock generate\" inside your project.\n\
                      # Manual changes might be lost - proceed with caution!\n";

/// Characters that force quoting of a peer-dependency value.
const PEER_QUOTE_TRIGGERS: &[char] = &[
    ':', '{', '}', '[', ']', ',', '&', '*', '#', '?', '<', '>', '=', '!', '%', '@', '\\',
];

/// Map keys are quoted only when they name a scoped package.
fn render_key(name: &str) -> String {
    if name.starts_with('@') {
        format!("\"{name}\"")
    } else {
        name.to_string()
    }
}

/// Peer values are emitted bare unless they contain a character the lock
/// format reserves.
fn render_peer_value(value: &str) -> String {
    if value.contains(PEER_QUOTE_TRIGGERS) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

/// Renders one entry as its record text. The record ends with a newline and
/// contains no blank line.
#[must_use]
pub fn render_entry(entry: &ClosureEntry) -> String {
    let mut lines = Vec::new();

    lines.push(format!("\"{}\":", entry.combined_key()));
    lines.push(format!("  version: {}", entry.version));
    lines.push(format!("  resolution: \"{}\"", entry.resolution));

    if !entry.dependencies.is_empty() {
        lines.push("  dependencies:".to_string());
        for (name, range) in &entry.dependencies {
            lines.push(format!("    {}: \"{}\"", render_key(name), range));
        }
    }

    if !entry.peer_dependencies.is_empty() {
        lines.push("  peerDependencies:".to_string());
        for (name, range) in &entry.peer_dependencies {
            lines.push(format!(
                "    {}: {}",
                render_key(name),
                render_peer_value(range)
            ));
        }
    }

    if !entry.bin.is_empty() {
        lines.push("  bin:".to_string());
        for (name, path) in &entry.bin {
            lines.push(format!("    {name}: {path}"));
        }
    }

    lines.push(format!("  checksum: {}", entry.checksum));
    lines.push(format!("  languageName: {}", entry.language_name.to_lowercase()));
    lines.push(format!("  linkType: {}", entry.link_type));

    let mut record = lines.join("\n");
    record.push('\n');
    record
}

/// Renders the whole document: banner, `__metadata` header, then records
/// separated by exactly one blank line.
#[must_use]
pub fn serialize(entries: &[ClosureEntry], metadata: &LockfileMetadata) -> String {
    let mut records: Vec<String> = entries.iter().map(render_entry).collect();
    records.sort();

    let mut out = String::from(BANNER);
    out.push('\n');
    out.push_str("__metadata:\n");
    out.push_str(&format!("  version: {}\n", metadata.version));
    if let Some(cache_key) = &metadata.cache_key {
        out.push_str(&format!("  cacheKey: {cache_key}\n"));
    }
    out.push('\n');
    out.push_str(&records.join("\n"));
    out
}
