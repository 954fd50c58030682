//! Configuration for mdstitch.
//!
//! A project config lives at `<root>/mdstitch.toml`; a user-wide fallback at
//! `~/.mdstitch/mdstitch.toml`. CLI flags override config file values, which
//! override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{MdstitchError, Result};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "mdstitch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".mdstitch";

// ---------------------------------------------------------------------------
// Aggregation options
// ---------------------------------------------------------------------------

/// What to do with an include directive whose target cannot be found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedIncludePolicy {
    /// Leave the directive text in place.
    #[default]
    Keep,
    /// Delete the directive.
    Remove,
}

/// What to do when an include chain loops back on itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircularIncludePolicy {
    /// Abort the whole invocation with `CircularInclude`.
    #[default]
    Fail,
    /// Replace the offending directive with a diagnostic comment and continue.
    Placeholder,
}

/// Options for a single aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// Text placed between consecutive documents. Empty disables separators.
    pub separator: String,
    /// Remove a leading `---` metadata block from every document.
    pub strip_frontmatter: bool,
    /// Follow the manifest, then append discovered documents it missed.
    pub hybrid_mode: bool,
    /// Expand `<!-- @include: path -->` directives.
    pub process_includes: bool,
    /// Prepend a table of contents built from the merged headings.
    pub include_toc: bool,
    /// Glob patterns excluded from discovery.
    pub ignore: Vec<String>,
    /// File extensions treated as documents (without the dot).
    pub extensions: Vec<String>,
    /// Prefix each document with a `<!-- Source: ... -->` comment.
    pub breadcrumbs: bool,
    /// Inject `# Title` from the file name when a document has no H1.
    pub auto_file_title: bool,
    pub unresolved_includes: UnresolvedIncludePolicy,
    pub circular_includes: CircularIncludePolicy,
    /// Deepest heading level listed in the TOC.
    pub toc_max_level: u8,
    /// Heading text of the generated TOC.
    pub toc_title: String,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            strip_frontmatter: false,
            hybrid_mode: false,
            process_includes: false,
            include_toc: false,
            ignore: Vec::new(),
            extensions: default_extensions(),
            breadcrumbs: true,
            auto_file_title: false,
            unresolved_includes: UnresolvedIncludePolicy::default(),
            circular_includes: CircularIncludePolicy::default(),
            toc_max_level: 6,
            toc_title: default_toc_title(),
        }
    }
}

fn default_separator() -> String {
    "---".into()
}
fn default_extensions() -> Vec<String> {
    vec!["md".into()]
}
fn default_toc_title() -> String {
    "Table of Contents".into()
}

impl AggregateOptions {
    /// Reject option combinations that cannot produce a sensible document.
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.toc_max_level) {
            return Err(MdstitchError::config(format!(
                "toc_max_level must be between 1 and 6, got {}",
                self.toc_max_level
            )));
        }
        if self.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(MdstitchError::config("at least one document extension is required"));
        }
        if self.separator.contains('\n') {
            return Err(MdstitchError::config("separator must be a single line"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config file (mdstitch.toml)
// ---------------------------------------------------------------------------

/// Top-level config file, deserialized from TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `[aggregate]` section.
    #[serde(default)]
    pub aggregate: AggregateSection,
}

/// `[aggregate]` section: the run options plus default input/output paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSection {
    /// Manifest path, relative to the aggregation root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
    /// Where to write the merged document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(flatten)]
    pub options: AggregateOptions,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.mdstitch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| MdstitchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.mdstitch/mdstitch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the config that applies to `root`.
///
/// Looks for `<root>/mdstitch.toml`, then the user config file. Returns
/// defaults when neither exists.
pub fn load_config(root: &Path) -> Result<AppConfig> {
    let project = root.join(CONFIG_FILE_NAME);
    if project.is_file() {
        return load_config_from(&project);
    }

    // A missing home directory is not an error here; there is simply no
    // user config to read.
    if let Ok(user) = config_file_path() {
        if user.is_file() {
            return load_config_from(&user);
        }
    }

    tracing::debug!(root = %root.display(), "no config file found, using defaults");
    Ok(AppConfig::default())
}

/// Load the config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MdstitchError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        MdstitchError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    config.aggregate.options.validate()?;
    Ok(config)
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| MdstitchError::io(dir, e))?;
    }

    let content = render_config(&AppConfig::default())?;
    std::fs::write(path, content).map_err(|e| MdstitchError::io(path, e))?;
    tracing::info!(path = %path.display(), "created default config file");

    Ok(path.to_path_buf())
}

/// Serialize a config as pretty TOML.
pub fn render_config(config: &AppConfig) -> Result<String> {
    toml::to_string_pretty(config).map_err(|e| MdstitchError::config(e.to_string()))
}
