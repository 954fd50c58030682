//! Merge-order planning.
//!
//! Combines manifest entries and discovered documents into the final,
//! de-duplicated order:
//! - manifest-only: manifest expansion order
//! - discovery-only: alphabetical walk of the whole root
//! - hybrid: manifest order, then every discovered document it missed

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use mdstitch_discovery::{
    WalkerConfig, discover, expand_entries, parse_manifest, resolve_manifest_path,
};
use mdstitch_shared::{
    AggregateOptions, Event, EventSink, MdstitchError, Origin, ResolvedFile, Result,
};

/// How the final order is assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderMode {
    ManifestOnly,
    DiscoveryOnly,
    Hybrid,
    /// The root argument named a single document.
    SingleFile,
}

impl OrderMode {
    /// Mode implied by whether a manifest was given and the hybrid flag.
    pub fn select(has_manifest: bool, hybrid: bool) -> Self {
        match (has_manifest, hybrid) {
            (false, _) => Self::DiscoveryOnly,
            (true, true) => Self::Hybrid,
            (true, false) => Self::ManifestOnly,
        }
    }
}

impl fmt::Display for OrderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ManifestOnly => "manifest-only",
            Self::DiscoveryOnly => "discovery-only",
            Self::Hybrid => "hybrid",
            Self::SingleFile => "single-file",
        };
        f.write_str(name)
    }
}

/// The resolved merge order for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    /// Canonical aggregation root.
    pub root: PathBuf,
    pub mode: OrderMode,
    pub files: Vec<ResolvedFile>,
}

impl Plan {
    /// Drop `path` from the order (used to keep the output file out of its
    /// own input). Returns whether anything was removed.
    pub fn exclude(&mut self, path: &Path) -> bool {
        let Ok(canonical) = dunce::canonicalize(path) else {
            return false;
        };
        let before = self.files.len();
        self.files.retain(|f| f.path != canonical);
        for (position, file) in self.files.iter_mut().enumerate() {
            file.position = position;
        }
        self.files.len() != before
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|f| f.path.as_path())
    }
}

/// Resolve the merge order for `root`.
///
/// A `root` naming a regular file yields that single document, with its
/// parent directory as the aggregation root.
pub fn plan(
    root: &Path,
    manifest: Option<&Path>,
    options: &AggregateOptions,
    sink: &dyn EventSink,
) -> Result<Plan> {
    let canonical = dunce::canonicalize(root).map_err(|_| MdstitchError::RootNotFound {
        path: root.to_path_buf(),
    })?;

    if canonical.is_file() {
        let parent = canonical
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| MdstitchError::RootNotFound {
                path: root.to_path_buf(),
            })?;
        sink.emit(
            Event::info("treating root as a single document")
                .with("file", canonical.display())
                .with("root", parent.display()),
        );
        return Ok(Plan {
            root: parent,
            mode: OrderMode::SingleFile,
            files: vec![ResolvedFile {
                path: canonical,
                origin: Origin::Direct,
                position: 0,
            }],
        });
    }
    if !canonical.is_dir() {
        return Err(MdstitchError::RootNotFound {
            path: root.to_path_buf(),
        });
    }

    let walker = WalkerConfig::new(options.ignore.as_slice(), options.extensions.as_slice())?;
    let mode = OrderMode::select(manifest.is_some(), options.hybrid_mode);
    let mut order = OrderBuilder::new(sink);

    if let Some(manifest) = manifest {
        let manifest_path = resolve_manifest_path(manifest, &canonical);
        let entries = parse_manifest(&manifest_path, &canonical)?;
        for entry in expand_entries(&entries, &canonical, &walker)? {
            order.push(&entry.path, Origin::Manifest)?;
        }
        sink.emit(
            Event::debug("manifest parsed")
                .with("manifest", manifest_path.display())
                .with("entries", entries.len()),
        );
    }

    if mode != OrderMode::ManifestOnly {
        let from_manifest = order.len();
        let discovered = discover(&canonical, &walker)?;
        for file in &discovered {
            order.push(&file.path, Origin::Discovery)?;
        }
        if mode == OrderMode::Hybrid {
            sink.emit(
                Event::info("hybrid order resolved")
                    .with("manifest", from_manifest)
                    .with("discovered", discovered.len())
                    .with("total", order.len()),
            );
        }
    }

    let files = order.finish();
    if files.is_empty() {
        return Err(MdstitchError::NoFilesFound { root: canonical });
    }

    sink.emit(
        Event::info("merge order planned")
            .with("mode", mode)
            .with("files", files.len()),
    );

    Ok(Plan {
        root: canonical,
        mode,
        files,
    })
}

/// Accumulates files in order, keeping the first occurrence of each
/// canonical path.
struct OrderBuilder<'a> {
    seen: HashSet<PathBuf>,
    files: Vec<ResolvedFile>,
    sink: &'a dyn EventSink,
}

impl<'a> OrderBuilder<'a> {
    fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            seen: HashSet::new(),
            files: Vec::new(),
            sink,
        }
    }

    fn push(&mut self, path: &Path, origin: Origin) -> Result<()> {
        let canonical = dunce::canonicalize(path).map_err(|e| MdstitchError::io(path, e))?;
        if !self.seen.insert(canonical.clone()) {
            self.sink.emit(
                Event::debug("duplicate entry dropped")
                    .with("path", canonical.display())
                    .with("origin", origin),
            );
            return Ok(());
        }
        let position = self.files.len();
        self.files.push(ResolvedFile {
            path: canonical,
            origin,
            position,
        });
        Ok(())
    }

    fn len(&self) -> usize {
        self.files.len()
    }

    fn finish(self) -> Vec<ResolvedFile> {
        self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mdstitch_shared::{CollectingSink, EventLevel, NullSink};

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new(files: &[&str]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dunce::canonicalize(dir.path()).unwrap();
            for rel in files {
                let path = root.join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(path, format!("# {rel}\n")).unwrap();
            }
            Self { _dir: dir, root }
        }

        fn manifest(&self, content: &str) -> PathBuf {
            let path = self.root.join("order.txt");
            std::fs::write(&path, content).unwrap();
            path
        }

        fn names(&self, plan: &Plan) -> Vec<String> {
            plan.files
                .iter()
                .map(|f| f.path.strip_prefix(&self.root).unwrap().to_string_lossy().replace('\\', "/"))
                .collect()
        }
    }

    fn opts() -> AggregateOptions {
        AggregateOptions::default()
    }

    #[test]
    fn mode_selection() {
        assert_eq!(OrderMode::select(false, false), OrderMode::DiscoveryOnly);
        assert_eq!(OrderMode::select(false, true), OrderMode::DiscoveryOnly);
        assert_eq!(OrderMode::select(true, false), OrderMode::ManifestOnly);
        assert_eq!(OrderMode::select(true, true), OrderMode::Hybrid);
    }

    #[test]
    fn discovery_only_lists_every_document_once() {
        let fx = Fixture::new(&["c.md", "a.md", "sub/b.md"]);
        let plan = plan(&fx.root, None, &opts(), &NullSink).unwrap();
        assert_eq!(plan.mode, OrderMode::DiscoveryOnly);
        assert_eq!(fx.names(&plan), ["a.md", "c.md", "sub/b.md"]);
        let positions: Vec<_> = plan.files.iter().map(|f| f.position).collect();
        assert_eq!(positions, [0, 1, 2]);
        assert!(plan.files.iter().all(|f| f.origin == Origin::Discovery));
    }

    #[test]
    fn manifest_duplicates_keep_first() {
        let fx = Fixture::new(&["a.md", "b.md"]);
        let manifest = fx.manifest("a.md\nb.md\na.md\n");
        let sink = CollectingSink::new();

        let plan = plan(&fx.root, Some(&manifest), &opts(), &sink).unwrap();
        assert_eq!(plan.mode, OrderMode::ManifestOnly);
        assert_eq!(fx.names(&plan), ["a.md", "b.md"]);
        let dropped = sink.at_level(EventLevel::Debug);
        assert!(
            dropped
                .iter()
                .any(|e| e.message == "duplicate entry dropped" && e.get("origin") == Some("manifest"))
        );
    }

    #[test]
    fn hybrid_appends_unlisted_documents() {
        let fx = Fixture::new(&["a.md", "b.md", "c.md"]);
        let manifest = fx.manifest("b.md\n");
        let options = AggregateOptions {
            hybrid_mode: true,
            ..opts()
        };
        let sink = CollectingSink::new();

        let plan = plan(&fx.root, Some(&manifest), &options, &sink).unwrap();
        assert_eq!(plan.mode, OrderMode::Hybrid);
        assert_eq!(fx.names(&plan), ["b.md", "a.md", "c.md"]);
        assert_eq!(plan.files[0].origin, Origin::Manifest);
        assert_eq!(plan.files[1].origin, Origin::Discovery);

        let info = sink
            .at_level(EventLevel::Info)
            .into_iter()
            .find(|e| e.message == "hybrid order resolved")
            .unwrap();
        assert_eq!(info.get("manifest"), Some("1"));
        assert_eq!(info.get("discovered"), Some("3"));
        assert_eq!(info.get("total"), Some("3"));

        let dropped: Vec<_> = sink
            .at_level(EventLevel::Debug)
            .into_iter()
            .filter(|e| e.message == "duplicate entry dropped")
            .collect();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].get("origin"), Some("discovery"));
        assert!(dropped[0].get("path").is_some_and(|p| p.ends_with("b.md")));
    }

    #[test]
    fn manifest_only_skips_unlisted_documents() {
        let fx = Fixture::new(&["a.md", "b.md", "guide/x.md", "guide/y.md"]);
        let manifest = fx.manifest("guide\nb.md\n");

        let plan = plan(&fx.root, Some(&manifest), &opts(), &NullSink).unwrap();
        assert_eq!(fx.names(&plan), ["guide/x.md", "guide/y.md", "b.md"]);
    }

    #[test]
    fn manifest_resolves_relative_to_root() {
        let fx = Fixture::new(&["a.md"]);
        fx.manifest("a.md\n");

        let plan = plan(&fx.root, Some(Path::new("order.txt")), &opts(), &NullSink).unwrap();
        assert_eq!(fx.names(&plan), ["a.md"]);
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let fx = Fixture::new(&["a.md"]);
        let err = plan(&fx.root, Some(Path::new("nope.txt")), &opts(), &NullSink).unwrap_err();
        assert!(matches!(err, MdstitchError::ManifestNotFound { .. }));
    }

    #[test]
    fn empty_root_has_no_files() {
        let fx = Fixture::new(&["notes.txt"]);
        let err = plan(&fx.root, None, &opts(), &NullSink).unwrap_err();
        assert!(matches!(err, MdstitchError::NoFilesFound { .. }));
    }

    #[test]
    fn missing_root_is_an_error() {
        let fx = Fixture::new(&[]);
        let err = plan(&fx.root.join("missing"), None, &opts(), &NullSink).unwrap_err();
        assert!(matches!(err, MdstitchError::RootNotFound { .. }));
    }

    #[test]
    fn file_root_is_a_single_document() {
        let fx = Fixture::new(&["guide/only.md", "guide/other.md"]);
        let plan = plan(&fx.root.join("guide/only.md"), None, &opts(), &NullSink).unwrap();
        assert_eq!(plan.mode, OrderMode::SingleFile);
        assert_eq!(plan.root, fx.root.join("guide"));
        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.files[0].origin, Origin::Direct);
    }

    #[test]
    fn ignore_patterns_apply_to_discovery() {
        let fx = Fixture::new(&["a.md", "drafts/wip.md", "b.md"]);
        let options = AggregateOptions {
            ignore: vec!["drafts/".into(), "b.md".into()],
            ..opts()
        };
        let plan = plan(&fx.root, None, &options, &NullSink).unwrap();
        assert_eq!(fx.names(&plan), ["a.md"]);
    }

    #[test]
    fn exclude_renumbers_positions() {
        let fx = Fixture::new(&["a.md", "b.md", "c.md"]);
        let mut plan = plan(&fx.root, None, &opts(), &NullSink).unwrap();
        assert!(plan.exclude(&fx.root.join("b.md")));
        assert!(!plan.exclude(&fx.root.join("missing.md")));
        assert_eq!(fx.names(&plan), ["a.md", "c.md"]);
        assert_eq!(plan.files[1].position, 1);
    }
}
