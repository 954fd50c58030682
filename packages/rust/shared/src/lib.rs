//! Shared types, error model, events, and configuration for mdstitch.
//!
//! This crate is the foundation depended on by all other mdstitch crates.
//! It provides:
//! - [`MdstitchError`] — the unified error type
//! - [`EventSink`] — the injected diagnostics channel
//! - Domain types ([`ManifestEntry`], [`ResolvedFile`], [`HeadingRecord`], [`Toc`])
//! - Configuration ([`AggregateOptions`], [`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod events;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AggregateOptions, AggregateSection, AppConfig, CONFIG_FILE_NAME, CircularIncludePolicy,
    UnresolvedIncludePolicy, config_dir, config_file_path, init_config, load_config,
    load_config_from, render_config,
};
pub use error::{MdstitchError, Result, format_chain};
pub use events::{CollectingSink, Event, EventLevel, EventSink, NullSink, TracingSink};
pub use text::read_document;
pub use types::{EntryKind, HeadingRecord, ManifestEntry, Origin, ResolvedFile, Toc, TocEntry};
