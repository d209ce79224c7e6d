//! Site tree reconstruction
//!
//! Turns the flat, unordered list of pages produced by a crawl into a
//! hierarchy keyed by URL path segment.

mod builder;
mod node;
mod path;

pub use builder::build_site_tree;
pub use node::{Children, PageEntry, SiteRoot, SiteTree, SiteTreeNode, ROOT_KEY};
pub use path::{canonical_path, path_parts};
