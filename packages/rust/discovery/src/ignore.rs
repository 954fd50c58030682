//! Ignore-pattern matching for discovery.

use globset::{Glob, GlobSet, GlobSetBuilder};

use mdstitch_shared::{MdstitchError, Result};

/// Compiled ignore patterns.
///
/// A pattern is matched against the root-relative path (forward slashes) and
/// against the bare file or directory name. A trailing `/` restricts a
/// pattern to directories; any pattern that matches a directory prunes its
/// whole subtree.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    files: GlobSet,
    dirs: GlobSet,
    patterns: Vec<String>,
}

impl IgnoreSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut files = GlobSetBuilder::new();
        let mut dirs = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for raw in patterns {
            let trimmed = raw.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            let dir_only = trimmed.ends_with('/');
            let body = trimmed.trim_end_matches('/').trim_start_matches("./");

            let glob = Glob::new(body).map_err(|e| MdstitchError::InvalidPattern {
                pattern: trimmed.to_string(),
                message: e.kind().to_string(),
            })?;

            dirs.add(glob.clone());
            if !dir_only {
                files.add(glob);
            }
            kept.push(trimmed.to_string());
        }

        Ok(Self {
            files: build(files, &kept)?,
            dirs: build(dirs, &kept)?,
            patterns: kept,
        })
    }

    /// An ignore set that matches nothing.
    pub fn empty() -> Self {
        Self {
            files: GlobSet::empty(),
            dirs: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    /// Whether a file at `relative` is excluded.
    pub fn is_ignored_file(&self, relative: &str) -> bool {
        set_matches(&self.files, relative)
    }

    /// Whether the directory at `relative` (and everything under it) is excluded.
    pub fn is_ignored_dir(&self, relative: &str) -> bool {
        set_matches(&self.dirs, relative)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

fn build(builder: GlobSetBuilder, patterns: &[String]) -> Result<GlobSet> {
    builder.build().map_err(|e| MdstitchError::InvalidPattern {
        pattern: patterns.join(", "),
        message: e.to_string(),
    })
}

fn set_matches(set: &GlobSet, relative: &str) -> bool {
    if set.is_match(relative) {
        return true;
    }
    let name = relative.rsplit('/').next().unwrap_or(relative);
    name != relative && set.is_match(name)
}
