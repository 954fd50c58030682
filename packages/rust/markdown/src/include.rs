//! Include directive expansion.
//!
//! A document may splice in another one with
//! `<!-- @include: relative/path.md -->`. Expansion is recursive and driven
//! by an explicit stack of in-progress documents, so nesting depth is not
//! bounded by the host call stack and a loop back to a document that is
//! still being expanded is detected as a cycle.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use mdstitch_shared::{
    CircularIncludePolicy, Event, EventSink, MdstitchError, Result, UnresolvedIncludePolicy,
    format_chain, read_document,
};

use crate::frontmatter::strip_frontmatter;

/// Matches `<!-- @include: path -->`; the path holds no whitespace or `>`.
static INCLUDE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*@include:\s*([^>\s]+)\s*-->").expect("include regex")
});

/// One directive found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Target path text as written.
    pub target: String,
    /// Byte span of the whole directive.
    pub span: Range<usize>,
}

/// Every include directive in `text`, in order of appearance.
pub fn find_directives(text: &str) -> Vec<IncludeDirective> {
    INCLUDE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(IncludeDirective {
                target: caps[1].to_string(),
                span: whole.range(),
            })
        })
        .collect()
}

fn next_directive(text: &str, from: usize) -> Option<IncludeDirective> {
    let caps = INCLUDE_RE.captures_at(text, from)?;
    let whole = caps.get(0)?;
    Some(IncludeDirective {
        target: caps[1].to_string(),
        span: whole.range(),
    })
}

/// Behaviour switches for [`IncludeResolver`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IncludeOptions {
    /// Strip frontmatter from every included document.
    pub strip_frontmatter: bool,
    pub unresolved: UnresolvedIncludePolicy,
    pub circular: CircularIncludePolicy,
}

/// Result of expanding one top-level document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    /// Canonical paths spliced in, in expansion order (repeats allowed).
    pub included: Vec<PathBuf>,
    /// Directives whose target could not be found.
    pub unresolved: usize,
    /// Directives replaced by a cycle placeholder.
    pub cycles: usize,
    /// Deepest nesting reached (0 when nothing was included).
    pub max_depth: usize,
}

/// A document whose directives are being expanded.
#[derive(Debug)]
struct Frame {
    path: PathBuf,
    text: String,
    /// Bytes of `text` already copied or consumed.
    cursor: usize,
    out: String,
}

impl Frame {
    fn new(path: PathBuf, text: String) -> Self {
        let capacity = text.len();
        Self {
            path,
            text,
            cursor: 0,
            out: String::with_capacity(capacity),
        }
    }
}

/// Documents currently being expanded along one inclusion chain.
#[derive(Debug, Default)]
struct ExpansionStack {
    frames: Vec<Frame>,
}

impl ExpansionStack {
    fn depth(&self) -> usize {
        self.frames.len()
    }

    fn contains(&self, path: &Path) -> bool {
        self.frames.iter().any(|f| f.path == path)
    }

    /// The cycle closed by revisiting `path`: from its first frame to the
    /// top of the stack, then `path` again.
    fn cycle_through(&self, path: &Path) -> Vec<PathBuf> {
        let start = self
            .frames
            .iter()
            .position(|f| f.path == path)
            .unwrap_or(0);
        self.frames[start..]
            .iter()
            .map(|f| f.path.clone())
            .chain(std::iter::once(path.to_path_buf()))
            .collect()
    }
}

/// Expands include directives relative to an aggregation root.
pub struct IncludeResolver<'a> {
    root: &'a Path,
    options: IncludeOptions,
    sink: &'a dyn EventSink,
}

impl<'a> IncludeResolver<'a> {
    pub fn new(root: &'a Path, options: IncludeOptions, sink: &'a dyn EventSink) -> Self {
        Self {
            root,
            options,
            sink,
        }
    }

    /// Resolve a directive target to a canonical path.
    ///
    /// Tried in order: relative to the containing document's directory,
    /// relative to the aggregation root, as given. Only existing regular
    /// files resolve.
    pub fn resolve_target(&self, target: &str, containing: &Path) -> Option<PathBuf> {
        let local = containing
            .parent()
            .map(|dir| dir.join(target))
            .unwrap_or_else(|| PathBuf::from(target));
        let candidates = [local, self.root.join(target), PathBuf::from(target)];

        candidates
            .iter()
            .find(|candidate| candidate.is_file())
            .and_then(|found| dunce::canonicalize(found).ok())
    }

    /// Expand every directive in `text`, the contents of the document at
    /// `path` (which should be canonical so cycles are recognised).
    ///
    /// Frontmatter of the top-level document is left to the caller; included
    /// documents are stripped when [`IncludeOptions::strip_frontmatter`] is set.
    pub fn expand(&self, path: &Path, text: String) -> Result<Expansion> {
        let mut stack = ExpansionStack::default();
        stack.frames.push(Frame::new(path.to_path_buf(), text));
        let mut expansion = Expansion::default();

        while let Some(frame) = stack.frames.last_mut() {
            let Some(directive) = next_directive(&frame.text, frame.cursor) else {
                // Document finished: splice it into its parent, or return it.
                let Some(mut done) = stack.frames.pop() else {
                    break;
                };
                done.out.push_str(&done.text[done.cursor..]);
                match stack.frames.last_mut() {
                    Some(parent) => parent.out.push_str(done.out.trim_end_matches(['\n', '\r'])),
                    None => {
                        expansion.text = done.out;
                        return Ok(expansion);
                    }
                }
                continue;
            };

            frame.out.push_str(&frame.text[frame.cursor..directive.span.start]);
            frame.cursor = directive.span.end;
            let raw = frame.text[directive.span.clone()].to_string();
            let containing = frame.path.clone();

            let Some(target) = self.resolve_target(&directive.target, &containing) else {
                self.unresolved(&directive.target, &containing);
                expansion.unresolved += 1;
                if self.options.unresolved == UnresolvedIncludePolicy::Keep {
                    push_out(&mut stack, &raw);
                }
                continue;
            };

            if stack.contains(&target) {
                let chain = stack.cycle_through(&target);
                match self.options.circular {
                    CircularIncludePolicy::Fail => {
                        return Err(MdstitchError::CircularInclude { chain });
                    }
                    CircularIncludePolicy::Placeholder => {
                        let placeholder = self.placeholder(&chain);
                        self.sink.emit(
                            Event::warn(MdstitchError::CircularInclude { chain }.to_string())
                                .with("file", containing.display()),
                        );
                        expansion.cycles += 1;
                        push_out(&mut stack, &placeholder);
                        continue;
                    }
                }
            }

            let mut text = read_document(&target)?;
            if self.options.strip_frontmatter {
                text = strip_frontmatter(&text);
            }
            self.sink.emit(
                Event::debug("expanding include")
                    .with("target", target.display())
                    .with("depth", stack.depth()),
            );
            expansion.included.push(target.clone());
            stack.frames.push(Frame::new(target, text));
            expansion.max_depth = expansion.max_depth.max(stack.depth() - 1);
        }

        Ok(expansion)
    }

    fn unresolved(&self, target: &str, containing: &Path) {
        let err = MdstitchError::IncludeNotFound {
            target: target.to_string(),
            from: containing.to_path_buf(),
        };
        self.sink.emit(
            Event::warn(err.to_string())
                .with("target", target)
                .with("file", containing.display()),
        );
    }

    fn placeholder(&self, chain: &[PathBuf]) -> String {
        let relative: Vec<PathBuf> = chain
            .iter()
            .map(|p| p.strip_prefix(self.root).unwrap_or(p).to_path_buf())
            .collect();
        format!("<!-- circular include skipped: {} -->", format_chain(&relative))
    }
}

fn push_out(stack: &mut ExpansionStack, text: &str) {
    if let Some(frame) = stack.frames.last_mut() {
        frame.out.push_str(text);
    }
}
