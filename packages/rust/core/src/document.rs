//! The merged document model.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use mdstitch_shared::{HeadingRecord, Toc};

use crate::toc::{self, BlockSpan};

/// One source document after every per-file transform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedBlock {
    /// Canonical path of the source document.
    pub source: PathBuf,
    /// Source path relative to the aggregation root.
    pub relative: String,
    /// Rendered text, trimmed.
    pub text: String,
    /// Documents spliced in by include directives.
    pub included: Vec<PathBuf>,
}

/// Ordered per-file blocks plus an optional table of contents.
#[derive(Debug, Clone, Serialize)]
pub struct MergedDocument {
    pub root: PathBuf,
    pub blocks: Vec<RenderedBlock>,
    /// Placed between consecutive blocks; empty means a blank line only.
    pub separator: String,
    pub toc: Option<Toc>,
    /// Rendered TOC, prepended at position zero.
    pub toc_text: Option<String>,
}

impl MergedDocument {
    pub fn new(root: PathBuf, blocks: Vec<RenderedBlock>, separator: impl Into<String>) -> Self {
        Self {
            root,
            blocks,
            separator: separator.into(),
            toc: None,
            toc_text: None,
        }
    }

    /// Blocks joined by the separator, without the TOC.
    pub fn body(&self) -> String {
        self.join().0
    }

    /// Build the TOC from the merged body and attach it.
    pub fn attach_toc(&mut self, title: &str, max_level: u8) -> &Toc {
        let records = self.headings(title, max_level);
        let outline = toc::build_toc(&records);
        self.toc_text = Some(toc::render_toc(&outline, title));
        self.toc.insert(outline)
    }

    /// Heading records of the merged body, attributed to their blocks.
    pub fn headings(&self, toc_title: &str, max_level: u8) -> Vec<HeadingRecord> {
        let (body, starts) = self.join();
        let spans: Vec<BlockSpan<'_>> = starts
            .iter()
            .zip(&self.blocks)
            .map(|(&start, block)| BlockSpan {
                start,
                source: block.source.as_path(),
            })
            .collect();
        toc::collect_headings(&body, &spans, toc_title, max_level)
    }

    /// The final text: TOC (if any), then the body, ending in one newline.
    pub fn render(&self) -> String {
        let body = self.body();
        let mut out = String::with_capacity(body.len() + 256);

        if let Some(toc) = &self.toc_text {
            out.push_str(toc.trim_end());
            out.push_str("\n\n");
        }
        out.push_str(body.trim_end());
        out.push('\n');
        out
    }

    /// SHA-256 of [`render`](Self::render), hex-encoded. Identical inputs
    /// always produce the same digest.
    pub fn digest(&self) -> String {
        digest(&self.render())
    }

    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.blocks.iter().map(|b| b.source.as_path())
    }

    /// Body text and the byte offset where each block starts.
    fn join(&self) -> (String, Vec<usize>) {
        let glue = if self.separator.is_empty() {
            "\n\n".to_string()
        } else {
            format!("\n\n{}\n\n", self.separator)
        };

        let mut body = String::new();
        let mut starts = Vec::with_capacity(self.blocks.len());
        for (idx, block) in self.blocks.iter().enumerate() {
            if idx > 0 {
                body.push_str(&glue);
            }
            starts.push(body.len());
            body.push_str(&block.text);
        }
        (body, starts)
    }
}

/// SHA-256 of `text`, hex-encoded.
pub fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(name: &str, text: &str) -> RenderedBlock {
        RenderedBlock {
            source: PathBuf::from(format!("/docs/{name}")),
            relative: name.into(),
            text: text.into(),
            included: vec![],
        }
    }

    fn doc(separator: &str) -> MergedDocument {
        MergedDocument::new(
            "/docs".into(),
            vec![block("x.md", "# X"), block("y.md", "# Y"), block("z.md", "# Z")],
            separator,
        )
    }

    #[test]
    fn separators_only_between_blocks() {
        let text = doc("---").render();
        assert_eq!(text, "# X\n\n---\n\n# Y\n\n---\n\n# Z\n");
        assert_eq!(text.matches("---").count(), 2);
        assert!(!text.starts_with("---"));
        assert!(!text.trim_end().ends_with("---"));
    }

    #[test]
    fn empty_separator_joins_with_blank_line() {
        assert_eq!(doc("").render(), "# X\n\n# Y\n\n# Z\n");
    }

    #[test]
    fn toc_is_prepended_once() {
        let mut merged = doc("---");
        let toc = merged.attach_toc("Contents", 6);
        assert_eq!(toc.len(), 3);

        let text = merged.render();
        assert!(text.starts_with("## Contents\n\n- [X](#x)\n- [Y](#y)\n- [Z](#z)\n\n# X"));
        assert_eq!(text.matches("## Contents").count(), 1);
    }

    #[test]
    fn headings_name_their_source() {
        let merged = doc("***");
        let records = merged.headings("Contents", 6);
        assert_eq!(records[2].source.as_deref(), Some(Path::new("/docs/z.md")));
    }

    #[test]
    fn digest_is_stable() {
        assert_eq!(doc("---").digest(), doc("---").digest());
        assert_ne!(doc("---").digest(), doc("***").digest());
        assert_eq!(doc("---").digest().len(), 64);
        assert_eq!(doc("---").digest(), digest(&doc("---").render()));
    }
}
