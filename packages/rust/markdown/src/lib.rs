//! Markdown text transforms used while stitching documents together.
//!
//! - [`strip_frontmatter`] removes a leading `---` metadata block
//! - [`IncludeResolver`] splices `<!-- @include: path -->` targets in place
//! - [`extract_headings`] / [`slugify`] / [`AnchorRegistry`] feed the TOC

mod frontmatter;
mod heading;
mod include;

pub use frontmatter::{DELIMITER as FRONTMATTER_DELIMITER, has_frontmatter, strip_frontmatter};
pub use heading::{
    AnchorRegistry, Heading, extract_headings, first_h1, slugify, title_from_stem,
};
pub use include::{Expansion, IncludeDirective, IncludeOptions, IncludeResolver, find_directives};
