//! Document discovery: filesystem walking and manifest parsing.
//!
//! These are the two sources the order planner combines. The walker lists
//! every document under a directory in a stable alphabetical order; the
//! manifest parser reads a hand-maintained ordering file.

mod ignore;
mod manifest;
mod walker;

pub use ignore::IgnoreSet;
pub use manifest::{ExpandedEntry, expand_entries, parse_manifest, resolve_manifest_path};
pub use walker::{DiscoveredFile, WalkerConfig, discover, discover_within, relative_path};
