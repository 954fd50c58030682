//! Aggregation engine for mdstitch.
//!
//! This crate ties together discovery, manifest parsing, and the markdown
//! transforms into one end-to-end merge (see [`Aggregator`]).

pub mod document;
pub mod merger;
pub mod order;
pub mod toc;

pub use document::{MergedDocument, RenderedBlock, digest};
pub use merger::{Aggregator, aggregate, write_output};
pub use order::{OrderMode, Plan, plan};
pub use toc::{build_toc, collect_headings, render_toc};
