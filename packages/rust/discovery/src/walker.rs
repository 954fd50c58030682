//! Filesystem walker for document discovery.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use mdstitch_shared::{MdstitchError, Result};

use crate::ignore::IgnoreSet;

/// Walker configuration.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Patterns excluded from the walk.
    pub ignore: IgnoreSet,
    /// Extensions (without the dot) that mark a file as a document.
    pub extensions: Vec<String>,
}

impl WalkerConfig {
    pub fn new<S: AsRef<str>>(ignore: &[S], extensions: &[S]) -> Result<Self> {
        Ok(Self {
            ignore: IgnoreSet::new(ignore)?,
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        })
    }

    fn is_document(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
    }
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            ignore: IgnoreSet::empty(),
            extensions: vec!["md".into()],
        }
    }
}

/// A document found by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Path as walked (root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the aggregation root, `/`-separated.
    pub relative: String,
}

/// List every document under `root`, recursively.
///
/// Returns files sorted alphabetically (case-insensitive) by relative path,
/// ties broken by full path, so the order is stable across platforms.
pub fn discover(root: &Path, config: &WalkerConfig) -> Result<Vec<DiscoveredFile>> {
    walk(root, root, config)
}

/// List every document under `dir`, a directory inside `root`.
///
/// Relative paths (used for ordering and ignore matching) are computed
/// against `root`, not `dir`.
pub fn discover_within(root: &Path, dir: &Path, config: &WalkerConfig) -> Result<Vec<DiscoveredFile>> {
    walk(root, dir, config)
}

fn walk(root: &Path, start: &Path, config: &WalkerConfig) -> Result<Vec<DiscoveredFile>> {
    if !start.is_dir() {
        return Err(MdstitchError::RootNotFound {
            path: start.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let walker = WalkDir::new(start)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_pruned(root, entry, &config.ignore));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| start.to_path_buf());
            MdstitchError::io(path, e.into())
        })?;

        if !entry.file_type().is_file() || !config.is_document(entry.path()) {
            continue;
        }

        let relative = relative_path(root, entry.path());
        if config.ignore.is_ignored_file(&relative) {
            continue;
        }

        files.push(DiscoveredFile {
            path: entry.into_path(),
            relative,
        });
    }

    files.sort_by(|a, b| {
        a.relative
            .to_lowercase()
            .cmp(&b.relative.to_lowercase())
            .then_with(|| a.path.cmp(&b.path))
    });

    Ok(files)
}

/// Directories matching an ignore pattern are skipped with their subtree.
/// The walk's starting directory is never pruned.
fn is_pruned(root: &Path, entry: &DirEntry, ignore: &IgnoreSet) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    ignore.is_ignored_dir(&relative_path(root, entry.path()))
}

/// `path` relative to `root`, joined with `/` on every platform.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
