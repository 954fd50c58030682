//! Error types for mdstitch.
//!
//! Library crates use [`MdstitchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all mdstitch operations.
#[derive(Debug, thiserror::Error)]
pub enum MdstitchError {
    /// The aggregation root does not exist or is not a directory.
    #[error("root not found: {}", path.display())]
    RootNotFound { path: PathBuf },

    /// A manifest was requested but the file is missing.
    #[error("manifest not found: {}", path.display())]
    ManifestNotFound { path: PathBuf },

    /// A manifest line names a path that does not exist under the root.
    #[error("manifest entry not found: {entry} ({}:{line})", manifest.display())]
    ManifestEntryNotFound {
        manifest: PathBuf,
        line: usize,
        entry: String,
    },

    /// The final ordered file list is empty.
    #[error("no documents found under {}", root.display())]
    NoFilesFound { root: PathBuf },

    /// An include directive could not be resolved. Recoverable: only ever
    /// rendered into a warning event.
    #[error("include target not found: {target} (referenced from {})", from.display())]
    IncludeNotFound { target: String, from: PathBuf },

    /// An include chain revisits a file that is still being expanded.
    #[error("circular include: {}", format_chain(chain))]
    CircularInclude { chain: Vec<PathBuf> },

    /// Writing the merged output failed. The merged text is kept so callers
    /// can still use it.
    #[error("failed to write output {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
        merged: String,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An ignore pattern is not a valid glob.
    #[error("invalid ignore pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MdstitchError>;

impl MdstitchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Recover the merged document from an [`MdstitchError::OutputWrite`].
    ///
    /// Returns `None` for every other variant.
    pub fn into_merged(self) -> Option<String> {
        match self {
            Self::OutputWrite { merged, .. } => Some(merged),
            _ => None,
        }
    }

    /// Whether this error aborts the whole invocation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::IncludeNotFound { .. })
    }
}

/// Render an include chain as `a.md -> b.md -> a.md`.
pub fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
