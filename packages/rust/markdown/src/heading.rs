//! Heading extraction and anchor slugs.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

/// Matches an ATX heading: up to three spaces, 1–6 `#`, text, optional
/// closing `#` run.
static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("heading regex")
});

/// A heading line found in Markdown text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 1–6.
    pub level: u8,
    pub text: String,
    /// Byte offset of the heading line in the scanned text.
    pub offset: usize,
}

/// Extract every ATX heading, skipping fenced code blocks.
pub fn extract_headings(text: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut fence: Option<char> = None;
    let mut offset = 0;

    for raw in text.split_inclusive('\n') {
        let line = raw.trim_end_matches(['\n', '\r']);
        let line_offset = offset;
        offset += raw.len();

        if let Some(marker) = fence_marker(line) {
            match fence {
                None => fence = Some(marker),
                Some(open) if open == marker => fence = None,
                Some(_) => {}
            }
            continue;
        }
        if fence.is_some() {
            continue;
        }

        if let Some(caps) = HEADING_RE.captures(line) {
            headings.push(Heading {
                level: caps[1].len() as u8,
                text: caps[2].trim().to_string(),
                offset: line_offset,
            });
        }
    }

    headings
}

/// Text of the first level-1 heading, if any.
pub fn first_h1(text: &str) -> Option<String> {
    extract_headings(text)
        .into_iter()
        .find(|h| h.level == 1)
        .map(|h| h.text)
}

fn fence_marker(line: &str) -> Option<char> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    if trimmed.starts_with("```") {
        Some('`')
    } else if trimmed.starts_with("~~~") {
        Some('~')
    } else {
        None
    }
}

/// Convert heading text to an anchor slug.
///
/// Lowercases, drops characters other than letters, digits, `_`, `-` and
/// whitespace, then collapses runs of whitespace, `_` and `-` into a single
/// `-`. Empty results become `section`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c == '-' || c == '_' {
            pending_sep = true;
        } else if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c);
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

/// Hands out unique anchors: the first use of a slug is returned as-is,
/// later uses get `-1`, `-2`, … in order of appearance.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    taken: HashSet<String>,
    next_suffix: HashMap<String, usize>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a unique anchor derived from `text`.
    pub fn anchor_for(&mut self, text: &str) -> String {
        self.reserve(slugify(text))
    }

    /// Reserve `base`, or the first free `base-N`.
    pub fn reserve(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }

        let counter = self.next_suffix.entry(base.clone()).or_insert(1);
        loop {
            let candidate = format!("{base}-{counter}");
            *counter += 1;
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

/// Human-readable title from a file stem (`getting_started` → `Getting Started`).
pub fn title_from_stem(stem: &str) -> String {
    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.collect::<String>())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
