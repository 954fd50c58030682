//! End-to-end aggregation over real directory trees.

use std::path::{Path, PathBuf};

use mdstitch_core::{Aggregator, OrderMode, aggregate};
use mdstitch_shared::{AggregateOptions, CollectingSink, EventLevel, MdstitchError, Origin};

struct Tree {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Tree {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dunce::canonicalize(dir.path()).unwrap();
        for (rel, content) in files {
            let path = root.join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, content).unwrap();
        }
        Self { _dir: dir, root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }
}

fn options() -> AggregateOptions {
    AggregateOptions {
        breadcrumbs: false,
        ..Default::default()
    }
}

fn names(root: &Path, plan: &mdstitch_core::Plan) -> Vec<String> {
    plan.paths()
        .map(|p| mdstitch_discovery::relative_path(root, p))
        .collect()
}

#[test]
fn discovery_merges_every_document_in_order() {
    let tree = Tree::new(&[
        ("b.md", "# B\n"),
        ("a.md", "# A\n"),
        ("sub/c.md", "# C\n"),
        ("notes.txt", "not markdown"),
    ]);

    let aggregator = Aggregator::new(options());
    let plan = aggregator.plan(&tree.root, None).unwrap();
    assert_eq!(plan.mode, OrderMode::DiscoveryOnly);
    assert_eq!(names(&tree.root, &plan), ["a.md", "b.md", "sub/c.md"]);

    let text = aggregator.aggregate(&tree.root, None, None).unwrap();
    assert_eq!(text, "# A\n\n---\n\n# B\n\n---\n\n# C\n");
}

#[test]
fn separator_appears_between_files_only() {
    let tree = Tree::new(&[("1.md", "one"), ("2.md", "two"), ("3.md", "three")]);
    let text = Aggregator::new(options())
        .aggregate(&tree.root, None, None)
        .unwrap();

    assert_eq!(text.lines().filter(|l| *l == "---").count(), 2);
    assert!(text.starts_with("one"));
    assert!(text.ends_with("three\n"));
}

#[test]
fn manifest_duplicates_keep_first_occurrence() {
    let tree = Tree::new(&[
        ("a.md", "# A\n"),
        ("b.md", "# B\n"),
        ("order.txt", "a.md\nb.md\na.md\n"),
    ]);
    let sink = CollectingSink::new();

    let plan = Aggregator::new(options())
        .with_sink(&sink)
        .plan(&tree.root, Some(&tree.path("order.txt")))
        .unwrap();
    assert_eq!(plan.mode, OrderMode::ManifestOnly);
    assert_eq!(names(&tree.root, &plan), ["a.md", "b.md"]);
    assert!(
        sink.events()
            .iter()
            .any(|e| e.message == "duplicate entry dropped")
    );
}

#[test]
fn hybrid_appends_unlisted_documents() {
    let tree = Tree::new(&[
        ("a.md", "# A\n"),
        ("b.md", "# B\n"),
        ("c.md", "# C\n"),
        ("order.txt", "# reading order\nb.md\n"),
    ]);
    let opts = AggregateOptions {
        hybrid_mode: true,
        ..options()
    };

    let plan = Aggregator::new(opts)
        .plan(&tree.root, Some(&tree.path("order.txt")))
        .unwrap();
    assert_eq!(plan.mode, OrderMode::Hybrid);
    assert_eq!(names(&tree.root, &plan), ["b.md", "a.md", "c.md"]);
    let origins: Vec<_> = plan.files.iter().map(|f| f.origin).collect();
    assert_eq!(origins, [Origin::Manifest, Origin::Discovery, Origin::Discovery]);
}

#[test]
fn manifest_directory_entries_expand_alphabetically() {
    let tree = Tree::new(&[
        ("intro.md", "# Intro\n"),
        ("guide/z.md", "# Z\n"),
        ("guide/a.md", "# A\n"),
        ("order.txt", "intro.md\nguide/\n"),
    ]);

    let plan = Aggregator::new(options())
        .plan(&tree.root, Some(&tree.path("order.txt")))
        .unwrap();
    assert_eq!(names(&tree.root, &plan), ["intro.md", "guide/a.md", "guide/z.md"]);
}

#[test]
fn missing_manifest_entry_is_reported() {
    let tree = Tree::new(&[("a.md", "# A\n"), ("order.txt", "a.md\nmissing.md\n")]);

    let err = Aggregator::new(options())
        .aggregate(&tree.root, Some(&tree.path("order.txt")), None)
        .unwrap_err();
    match err {
        MdstitchError::ManifestEntryNotFound { entry, line, .. } => {
            assert_eq!(entry, "missing.md");
            assert_eq!(line, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn frontmatter_removed_from_every_file() {
    let tree = Tree::new(&[
        ("a.md", "---\ntitle: A\ntags: [x]\n---\n# A\n"),
        ("b.md", "# B\n"),
    ]);
    let opts = AggregateOptions {
        strip_frontmatter: true,
        separator: String::new(),
        ..options()
    };

    let text = Aggregator::new(opts).aggregate(&tree.root, None, None).unwrap();
    assert_eq!(text, "# A\n\n# B\n");
    assert!(!text.contains("title:"));
}

#[test]
fn nested_includes_are_spliced() {
    let tree = Tree::new(&[
        ("main.md", "# Main\n\n<!-- @include: parts/one.md -->\n"),
        ("parts/one.md", "One\n\n<!-- @include: two.md -->\n"),
        ("parts/two.md", "Two\n"),
    ]);
    let opts = AggregateOptions {
        process_includes: true,
        ignore: vec!["parts/".into()],
        ..options()
    };

    let text = Aggregator::new(opts).aggregate(&tree.root, None, None).unwrap();
    assert_eq!(text, "# Main\n\nOne\n\nTwo\n");
}

#[test]
fn include_cycle_names_the_chain() {
    let tree = Tree::new(&[
        ("a.md", "<!-- @include: b.md -->"),
        ("b.md", "<!-- @include: a.md -->"),
    ]);
    let opts = AggregateOptions {
        process_includes: true,
        ..options()
    };

    let err = Aggregator::new(opts)
        .aggregate(&tree.root, None, None)
        .unwrap_err();
    let MdstitchError::CircularInclude { chain } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(chain.first(), chain.last());
    assert_eq!(chain.len(), 3);
    assert!(err.to_string().contains(" -> "));
}

#[test]
fn toc_has_distinct_anchors() {
    let tree = Tree::new(&[
        ("a.md", "# A\n"),
        ("b.md", "## B\n"),
        ("c.md", "# A\n"),
    ]);
    let opts = AggregateOptions {
        include_toc: true,
        ..options()
    };

    let document = Aggregator::new(opts).build(&tree.root, None).unwrap();
    let toc = document.toc.as_ref().unwrap();
    assert_eq!(toc.len(), 3);

    let text = document.render();
    assert!(text.starts_with("## Table of Contents\n\n- [A](#a)\n  - [B](#b)\n- [A](#a-1)\n"));
    assert_eq!(text.matches("## Table of Contents").count(), 1);
}

#[test]
fn empty_root_fails() {
    let tree = Tree::new(&[("readme.txt", "no markdown here")]);
    let err = Aggregator::new(options())
        .aggregate(&tree.root, None, None)
        .unwrap_err();
    assert!(matches!(err, MdstitchError::NoFilesFound { .. }));
}

#[test]
fn missing_root_fails() {
    let tree = Tree::new(&[]);
    let err = Aggregator::new(options())
        .aggregate(&tree.path("nope"), None, None)
        .unwrap_err();
    assert!(matches!(err, MdstitchError::RootNotFound { .. }));
}

#[test]
fn output_matches_returned_text() {
    let tree = Tree::new(&[("docs/a.md", "# A\n"), ("docs/b.md", "# B\n")]);
    let output = tree.path("dist/all.md");
    let sink = CollectingSink::new();

    let text = aggregate(
        &tree.path("docs"),
        None,
        Some(&output),
        &AggregateOptions::default(),
        &sink,
    )
    .unwrap();
    assert_eq!(std::fs::read_to_string(&output).unwrap(), text);
    assert!(text.contains("<!-- Source: a.md -->"));
    assert!(
        sink.at_level(EventLevel::Info)
            .iter()
            .any(|e| e.message == "merged document written")
    );
}

#[test]
fn failed_write_still_returns_merged_text() {
    let tree = Tree::new(&[("docs/a.md", "# A\n")]);
    let blocker = tree.path("blocker");
    std::fs::write(&blocker, "a file, not a directory").unwrap();

    let err = Aggregator::new(options())
        .aggregate(&tree.path("docs"), None, Some(&blocker.join("out.md")))
        .unwrap_err();
    assert!(matches!(err, MdstitchError::OutputWrite { .. }));
    assert_eq!(err.into_merged().as_deref(), Some("# A\n"));
}

#[test]
fn repeated_runs_are_identical() {
    let tree = Tree::new(&[
        ("a.md", "---\nx: 1\n---\n# A\n## Sub\n"),
        ("b.md", "# B\n"),
    ]);
    let opts = AggregateOptions {
        strip_frontmatter: true,
        include_toc: true,
        ..Default::default()
    };

    let aggregator = Aggregator::new(opts);
    let first = aggregator.build(&tree.root, None).unwrap();
    let second = aggregator.build(&tree.root, None).unwrap();
    assert_eq!(first.render(), second.render());
    assert_eq!(first.digest(), second.digest());
}
