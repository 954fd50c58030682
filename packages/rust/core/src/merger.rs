//! End-to-end aggregation: plan → per-file transforms → join → TOC → write.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use mdstitch_discovery::relative_path;
use mdstitch_markdown::{
    IncludeOptions, IncludeResolver, first_h1, slugify, strip_frontmatter, title_from_stem,
};
use mdstitch_shared::{
    AggregateOptions, Event, EventSink, MdstitchError, NullSink, ResolvedFile, Result,
    read_document,
};

use crate::document::{MergedDocument, RenderedBlock};
use crate::order::{self, Plan};

/// Merges a tree of documents into one.
///
/// ```no_run
/// use std::path::Path;
/// use mdstitch_core::Aggregator;
/// use mdstitch_shared::AggregateOptions;
///
/// let options = AggregateOptions {
///     include_toc: true,
///     ..Default::default()
/// };
/// let text = Aggregator::new(options).aggregate(Path::new("docs"), None, None)?;
/// # Ok::<(), mdstitch_shared::MdstitchError>(())
/// ```
pub struct Aggregator<'a> {
    options: AggregateOptions,
    sink: &'a dyn EventSink,
}

impl Aggregator<'static> {
    /// An aggregator that discards diagnostics.
    pub fn new(options: AggregateOptions) -> Self {
        Self {
            options,
            sink: &NullSink,
        }
    }
}

impl<'a> Aggregator<'a> {
    /// Route diagnostics to `sink`.
    pub fn with_sink<'b>(self, sink: &'b dyn EventSink) -> Aggregator<'b> {
        Aggregator {
            options: self.options,
            sink,
        }
    }

    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Resolve the merge order without reading any document.
    pub fn plan(&self, root: &Path, manifest: Option<&Path>) -> Result<Plan> {
        self.options.validate()?;
        order::plan(root, manifest, &self.options, self.sink)
    }

    /// Plan and merge, returning the document model.
    pub fn build(&self, root: &Path, manifest: Option<&Path>) -> Result<MergedDocument> {
        let plan = self.plan(root, manifest)?;
        self.merge(plan)
    }

    /// Merge the documents of an existing plan, in order.
    pub fn merge(&self, plan: Plan) -> Result<MergedDocument> {
        if plan.files.is_empty() {
            return Err(MdstitchError::NoFilesFound { root: plan.root });
        }

        let include_options = IncludeOptions {
            strip_frontmatter: self.options.strip_frontmatter,
            unresolved: self.options.unresolved_includes,
            circular: self.options.circular_includes,
        };
        let resolver = IncludeResolver::new(&plan.root, include_options, self.sink);

        let mut blocks = Vec::with_capacity(plan.files.len());
        for file in &plan.files {
            blocks.push(self.render_block(&plan.root, file, &resolver)?);
        }

        let mut document = MergedDocument::new(plan.root, blocks, self.options.separator.clone());
        if self.options.include_toc {
            let entries = document
                .attach_toc(&self.options.toc_title, self.options.toc_max_level)
                .len();
            self.sink.emit(Event::debug("table of contents built").with("entries", entries));
        }

        self.sink.emit(
            Event::info("documents merged")
                .with("files", document.blocks.len())
                .with("root", document.root.display()),
        );
        Ok(document)
    }

    /// Merge and return the final text, writing it to `output` when given.
    ///
    /// An existing `output` file inside the root is never merged into itself.
    /// A failed write returns [`MdstitchError::OutputWrite`], which still
    /// carries the merged text.
    pub fn aggregate(
        &self,
        root: &Path,
        manifest: Option<&Path>,
        output: Option<&Path>,
    ) -> Result<String> {
        let mut plan = self.plan(root, manifest)?;
        if let Some(output) = output {
            if plan.exclude(output) {
                self.sink.emit(
                    Event::debug("output file excluded from its own input")
                        .with("path", output.display()),
                );
            }
        }

        let text = self.merge(plan)?.render();

        if let Some(path) = output {
            if let Err(source) = write_output(path, &text) {
                return Err(MdstitchError::OutputWrite {
                    path: path.to_path_buf(),
                    source,
                    merged: text,
                });
            }
            self.sink.emit(
                Event::info("merged document written")
                    .with("path", path.display())
                    .with("bytes", text.len()),
            );
        }

        Ok(text)
    }

    fn render_block(
        &self,
        root: &Path,
        file: &ResolvedFile,
        resolver: &IncludeResolver<'_>,
    ) -> Result<RenderedBlock> {
        let mut text = read_document(&file.path)?;
        if self.options.strip_frontmatter {
            text = strip_frontmatter(&text);
        }

        let mut included = Vec::new();
        if self.options.process_includes {
            let expansion = resolver.expand(&file.path, text)?;
            text = expansion.text;
            included = expansion.included;
        }

        let relative = relative_path(root, &file.path);
        let mut rendered = String::with_capacity(text.len() + 64);

        if self.options.breadcrumbs {
            rendered.push_str(&format!("<!-- Source: {relative} -->\n"));
        }
        if self.options.auto_file_title && first_h1(&text).is_none() {
            let stem = file
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| relative.clone());
            let title = title_from_stem(&stem);
            rendered.push_str(&format!("<a id=\"{}\"></a>\n\n# {title}\n\n", slugify(&title)));
        }
        rendered.push_str(text.trim());

        self.sink.emit(
            Event::debug("document rendered")
                .with("file", &relative)
                .with("position", file.position)
                .with("includes", included.len()),
        );

        Ok(RenderedBlock {
            source: file.path.clone(),
            relative,
            text: rendered.trim_end().to_string(),
            included,
        })
    }
}

/// Aggregate `root` with `options`, reporting diagnostics to `sink`.
pub fn aggregate(
    root: &Path,
    manifest: Option<&Path>,
    output: Option<&Path>,
    options: &AggregateOptions,
    sink: &dyn EventSink,
) -> Result<String> {
    Aggregator::new(options.clone())
        .with_sink(sink)
        .aggregate(root, manifest, output)
}

/// Write `text` to `path`, creating parent directories. The file handle is
/// flushed and closed before returning on every path.
pub fn write_output(path: &Path, text: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(text.as_bytes())?;
    writer.flush()
}
