//! TOC (Table of Contents) builder.
//!
//! Scans the merged body for headings, assigns each a unique anchor, and
//! nests them into an outline that is rendered as a Markdown list at the top
//! of the document.

use std::path::{Path, PathBuf};

use mdstitch_markdown::{AnchorRegistry, extract_headings};
use mdstitch_shared::{HeadingRecord, Toc, TocEntry};

/// Where each document's block begins in the merged body.
#[derive(Debug, Clone, Copy)]
pub struct BlockSpan<'a> {
    pub start: usize,
    pub source: &'a Path,
}

/// Collect heading records from merged `body`.
///
/// Anchors are assigned across every heading, in order, after reserving the
/// TOC's own title so a document heading with the same text does not shadow
/// it. Only headings up to `max_level` are returned.
pub fn collect_headings(
    body: &str,
    blocks: &[BlockSpan<'_>],
    toc_title: &str,
    max_level: u8,
) -> Vec<HeadingRecord> {
    let mut anchors = AnchorRegistry::new();
    anchors.anchor_for(toc_title);

    extract_headings(body)
        .into_iter()
        .map(|heading| {
            let anchor = anchors.anchor_for(&heading.text);
            HeadingRecord {
                level: heading.level,
                text: heading.text,
                anchor,
                source: source_at(blocks, heading.offset),
            }
        })
        .filter(|record| record.level <= max_level)
        .collect()
}

/// Nest flat heading records into an outline.
///
/// A heading becomes a child of the nearest preceding heading with a lower
/// level; skipped levels (`#` then `###`) nest one step, not two.
pub fn build_toc(records: &[HeadingRecord]) -> Toc {
    Toc {
        entries: nest(records),
    }
}

/// Render the outline as a Markdown list under a `##` heading.
pub fn render_toc(toc: &Toc, title: &str) -> String {
    let mut out = format!("## {title}\n\n");
    render_entries(&toc.entries, 0, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn nest(records: &[HeadingRecord]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    let mut i = 0;

    while i < records.len() {
        let head = &records[i];
        let end = records[i + 1..]
            .iter()
            .position(|r| r.level <= head.level)
            .map_or(records.len(), |p| i + 1 + p);

        entries.push(TocEntry {
            heading: head.clone(),
            children: nest(&records[i + 1..end]),
        });
        i = end;
    }

    entries
}

fn render_entries(entries: &[TocEntry], depth: usize, out: &mut String) {
    for entry in entries {
        let indent = "  ".repeat(depth);
        out.push_str(&format!(
            "{indent}- [{}](#{})\n",
            escape_link_text(&entry.heading.text),
            entry.heading.anchor
        ));
        render_entries(&entry.children, depth + 1, out);
    }
}

fn escape_link_text(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

fn source_at(blocks: &[BlockSpan<'_>], offset: usize) -> Option<PathBuf> {
    let idx = blocks.partition_point(|b| b.start <= offset);
    idx.checked_sub(1)
        .map(|i| blocks[i].source.to_path_buf())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
