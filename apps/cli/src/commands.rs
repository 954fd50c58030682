//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use mdstitch_core::{Aggregator, digest};
use mdstitch_discovery::relative_path;
use mdstitch_shared::{
    AggregateOptions, AppConfig, CircularIncludePolicy, MdstitchError, TracingSink,
    UnresolvedIncludePolicy, config_file_path, init_config, load_config, load_config_from,
    render_config,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// mdstitch — merge a tree of Markdown documents into one.
#[derive(Parser)]
#[command(
    name = "mdstitch",
    version,
    about = "Merge a directory of Markdown documents into a single document.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Merge every document under ROOT and write the result.
    Merge {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the merged document here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the resolved merge order without merging.
    List {
        #[command(flatten)]
        source: SourceArgs,

        /// Print the plan as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print only the table of contents of the merged document.
    Toc {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults (~/.mdstitch/mdstitch.toml unless --path).
    Init {
        /// Where to write the file.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show the configuration that applies to ROOT.
    Show {
        /// Aggregation root used to find a project config.
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Explicit config file.
        #[arg(long, env = "MDSTITCH_CONFIG")]
        config: Option<PathBuf>,
    },
}

/// Input selection and merge switches shared by `merge`, `list` and `toc`.
#[derive(Args, Debug, Clone)]
pub(crate) struct SourceArgs {
    /// Directory to aggregate, or a single document.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Manifest file listing documents in reading order.
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Glob pattern to skip (repeatable; trailing `/` matches directories only).
    #[arg(long = "ignore", value_name = "PATTERN")]
    pub ignore: Vec<String>,

    /// Text placed between documents.
    #[arg(long, conflicts_with = "no_separator")]
    pub separator: Option<String>,

    /// Join documents with a blank line only.
    #[arg(long)]
    pub no_separator: bool,

    /// Remove leading `---` frontmatter from every document.
    #[arg(long)]
    pub strip_frontmatter: bool,

    /// With a manifest, append documents it does not list.
    #[arg(long)]
    pub hybrid_mode: bool,

    /// Expand `<!-- @include: path -->` directives.
    #[arg(long)]
    pub process_includes: bool,

    /// Prepend a table of contents.
    #[arg(long)]
    pub toc: bool,

    /// Insert a `# Title` derived from the file name when a document has none.
    #[arg(long)]
    pub auto_file_title: bool,

    /// Omit the `<!-- Source: ... -->` comment before each document.
    #[arg(long)]
    pub no_breadcrumbs: bool,

    /// Drop include directives whose target cannot be found.
    #[arg(long)]
    pub remove_unresolved_includes: bool,

    /// Replace circular includes with a comment instead of failing.
    #[arg(long)]
    pub cycle_placeholder: bool,

    /// Config file (defaults to ROOT/mdstitch.toml, then ~/.mdstitch/mdstitch.toml).
    #[arg(long, env = "MDSTITCH_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Flags merged over the config file.
struct Resolved {
    root: PathBuf,
    manifest: Option<PathBuf>,
    output: Option<PathBuf>,
    options: AggregateOptions,
}

impl SourceArgs {
    /// Load the applicable config and apply command-line overrides on top.
    fn resolve(&self, output: Option<&Path>) -> Result<Resolved> {
        let base = config_base(&self.root);
        let config = match &self.config {
            Some(path) => load_config_from(path)?,
            None => load_config(&base)?,
        };

        let section = config.aggregate;
        let mut options = section.options;

        options.ignore.extend(self.ignore.iter().cloned());
        if let Some(separator) = &self.separator {
            options.separator = separator.clone();
        }
        if self.no_separator {
            options.separator.clear();
        }
        options.strip_frontmatter |= self.strip_frontmatter;
        options.hybrid_mode |= self.hybrid_mode;
        options.process_includes |= self.process_includes;
        options.include_toc |= self.toc;
        options.auto_file_title |= self.auto_file_title;
        if self.no_breadcrumbs {
            options.breadcrumbs = false;
        }
        if self.remove_unresolved_includes {
            options.unresolved_includes = UnresolvedIncludePolicy::Remove;
        }
        if self.cycle_placeholder {
            options.circular_includes = CircularIncludePolicy::Placeholder;
        }
        options.validate()?;

        let output = match output {
            Some(path) => Some(path.to_path_buf()),
            None => section.output.map(|path| base.join(path)),
        };

        Ok(Resolved {
            root: self.root.clone(),
            manifest: self.manifest.clone().or(section.manifest),
            output,
            options,
        })
    }
}

/// Directory a project config is looked up in.
fn config_base(root: &Path) -> PathBuf {
    if root.is_file() {
        root.parent().map(Path::to_path_buf).unwrap_or_default()
    } else {
        root.to_path_buf()
    }
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "mdstitch=info",
        1 => "mdstitch=debug",
        _ => "mdstitch=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge { source, output } => cmd_merge(&source, output.as_deref()),
        Command::List { source, json } => cmd_list(&source, json),
        Command::Toc { source } => cmd_toc(&source),
        Command::Config { action } => match action {
            ConfigAction::Init { path, force } => cmd_config_init(path, force),
            ConfigAction::Show { root, config } => cmd_config_show(&root, config.as_deref()),
        },
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

fn cmd_merge(source: &SourceArgs, output: Option<&Path>) -> Result<()> {
    let resolved = source.resolve(output)?;
    let sink = TracingSink;
    let result = Aggregator::new(resolved.options)
        .with_sink(&sink)
        .aggregate(
            &resolved.root,
            resolved.manifest.as_deref(),
            resolved.output.as_deref(),
        );

    if let Ok(text) = &result {
        info!(bytes = text.len(), digest = %digest(text), "merge complete");
    }
    deliver(result, resolved.output.is_none(), &mut std::io::stdout().lock())
}

/// Send the merged text to `out` when it has no other destination, or when
/// writing the output file failed, so a completed merge is never lost.
fn deliver<W: Write>(
    result: std::result::Result<String, MdstitchError>,
    to_out: bool,
    out: &mut W,
) -> Result<()> {
    match result {
        Ok(text) if to_out => write_document(out, &text),
        Ok(_) => Ok(()),
        Err(err) => {
            if let MdstitchError::OutputWrite { merged, .. } = &err {
                write_document(out, merged)?;
                return Err(err).wrap_err("merged document printed to stdout instead");
            }
            Err(err.into())
        }
    }
}

fn cmd_list(source: &SourceArgs, json: bool) -> Result<()> {
    let resolved = source.resolve(None)?;
    let sink = TracingSink;
    let plan = Aggregator::new(resolved.options)
        .with_sink(&sink)
        .plan(&resolved.root, resolved.manifest.as_deref())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    for file in &plan.files {
        println!(
            "{:>4}  {:<9}  {}",
            file.position + 1,
            file.origin.to_string(),
            relative_path(&plan.root, &file.path)
        );
    }
    info!(mode = %plan.mode, files = plan.files.len(), "merge order resolved");
    Ok(())
}

fn cmd_toc(source: &SourceArgs) -> Result<()> {
    let mut resolved = source.resolve(None)?;
    resolved.options.include_toc = true;

    let sink = TracingSink;
    let document = Aggregator::new(resolved.options)
        .with_sink(&sink)
        .build(&resolved.root, resolved.manifest.as_deref())?;

    let toc = document
        .toc_text
        .ok_or_else(|| eyre!("no table of contents was produced"))?;
    write_document(&mut std::io::stdout().lock(), &toc)
}

fn cmd_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config_file_path()?,
    };
    if path.exists() && !force {
        return Err(eyre!(
            "config file already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }

    let path = init_config(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(root: &Path, config: Option<&Path>) -> Result<()> {
    let config: AppConfig = match config {
        Some(path) => load_config_from(path)?,
        None => load_config(&config_base(root))?,
    };
    println!("{}", render_config(&config)?);
    Ok(())
}

fn write_document<W: Write>(out: &mut W, text: &str) -> Result<()> {
    out.write_all(text.as_bytes())
        .and_then(|()| out.flush())
        .wrap_err("failed to write to stdout")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
