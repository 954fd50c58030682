//! Manifest parser.
//!
//! A manifest lists documents and directories in merge order:
//! - one path per line, relative to the aggregation root
//! - blank lines and lines starting with `#` are skipped
//! - whitespace followed by `#` starts a trailing comment
//! - a directory expands to every document beneath it, alphabetically

use std::path::{Path, PathBuf};

use mdstitch_shared::{EntryKind, ManifestEntry, MdstitchError, Result, read_document};

use crate::walker::{WalkerConfig, discover_within};

/// A manifest entry expanded into a concrete document path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedEntry {
    pub path: PathBuf,
    /// Manifest line the document came from.
    pub line: usize,
}

/// Locate the manifest file.
///
/// Relative paths are tried against `root` first, then against the working
/// directory. When neither exists the root-relative candidate is returned so
/// the caller's error names the path the user most likely meant.
pub fn resolve_manifest_path(manifest: &Path, root: &Path) -> PathBuf {
    if manifest.is_absolute() {
        return manifest.to_path_buf();
    }
    let under_root = root.join(manifest);
    if under_root.exists() || !manifest.exists() {
        under_root
    } else {
        manifest.to_path_buf()
    }
}

/// Parse the manifest at `manifest`, classifying each entry against `root`.
pub fn parse_manifest(manifest: &Path, root: &Path) -> Result<Vec<ManifestEntry>> {
    if !manifest.is_file() {
        return Err(MdstitchError::ManifestNotFound {
            path: manifest.to_path_buf(),
        });
    }
    let content = read_document(manifest)?;

    parse_lines(&content)
        .into_iter()
        .map(|(line, path)| classify(manifest, root, line, path))
        .collect()
}

/// Expand parsed entries into document paths, in manifest order.
///
/// Directory entries are walked with `config` (same ignore patterns and
/// extensions as discovery). Duplicates are kept; ordering decides which
/// occurrence wins.
pub fn expand_entries(
    entries: &[ManifestEntry],
    root: &Path,
    config: &WalkerConfig,
) -> Result<Vec<ExpandedEntry>> {
    let mut expanded = Vec::new();

    for entry in entries {
        let path = root.join(&entry.path);
        match entry.kind {
            EntryKind::File => expanded.push(ExpandedEntry {
                path,
                line: entry.line,
            }),
            EntryKind::Directory => {
                for file in discover_within(root, &path, config)? {
                    expanded.push(ExpandedEntry {
                        path: file.path,
                        line: entry.line,
                    });
                }
            }
        }
    }

    Ok(expanded)
}

fn classify(manifest: &Path, root: &Path, line: usize, path: &str) -> Result<ManifestEntry> {
    let candidate = root.join(path);
    if !candidate.exists() {
        return Err(MdstitchError::ManifestEntryNotFound {
            manifest: manifest.to_path_buf(),
            line,
            entry: path.to_string(),
        });
    }

    let kind = if candidate.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    Ok(ManifestEntry {
        kind,
        path: path.to_string(),
        line,
    })
}

/// Comment-free, non-empty lines with their 1-based line numbers.
fn parse_lines(content: &str) -> Vec<(usize, &str)> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, raw)| strip_comment(raw).map(|path| (idx + 1, path)))
        .collect()
}

fn strip_comment(raw: &str) -> Option<&str> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let mut prev_ws = false;
    for (idx, ch) in line.char_indices() {
        if ch == '#' && prev_ws {
            let path = line[..idx].trim_end();
            return (!path.is_empty()).then_some(path);
        }
        prev_ws = ch.is_whitespace();
    }
    Some(line)
}
