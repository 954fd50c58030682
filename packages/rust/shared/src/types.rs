//! Core domain types for an aggregation run.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ManifestEntry
// ---------------------------------------------------------------------------

/// Whether a manifest line names a single document or a directory to expand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One parsed, comment-free line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub kind: EntryKind,
    /// Path text as written, relative to the aggregation root.
    pub path: String,
    /// 1-based line number in the manifest file.
    pub line: usize,
}

// ---------------------------------------------------------------------------
// ResolvedFile
// ---------------------------------------------------------------------------

/// Where a document in the final order came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Manifest,
    Discovery,
    /// The root argument itself named a single document.
    Direct,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Manifest => "manifest",
            Self::Discovery => "discovery",
            Self::Direct => "direct",
        };
        f.write_str(name)
    }
}

/// A document in the final merge order. Unique by `path` within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFile {
    /// Canonical absolute path.
    pub path: PathBuf,
    pub origin: Origin,
    /// 0-based position in the final order.
    pub position: usize,
}

// ---------------------------------------------------------------------------
// Headings and TOC
// ---------------------------------------------------------------------------

/// A heading found in merged text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRecord {
    /// 1–6.
    pub level: u8,
    pub text: String,
    /// Unique anchor slug within the document.
    pub anchor: String,
    /// Document whose block contained the heading, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

/// A single node of the nested table of contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    pub heading: HeadingRecord,
    /// Nested child entries (deeper headings).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocEntry>,
}

/// Root structure of a table of contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toc {
    /// Top-level entries.
    pub entries: Vec<TocEntry>,
}

impl Toc {
    /// Total number of entries at every depth.
    pub fn len(&self) -> usize {
        fn count(entries: &[TocEntry]) -> usize {
            entries.iter().map(|e| 1 + count(&e.children)).sum()
        }
        count(&self.entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Nesting depth of the outline (0 when empty).
    pub fn depth(&self) -> usize {
        fn depth(entries: &[TocEntry]) -> usize {
            entries
                .iter()
                .map(|e| 1 + depth(&e.children))
                .max()
                .unwrap_or(0)
        }
        depth(&self.entries)
    }
}
