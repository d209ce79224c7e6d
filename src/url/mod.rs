//! URL handling module for Site-Atlas
//!
//! This module provides URL normalization, same-origin and
//! extension filtering for discovered links, and snapshot file naming.

mod normalize;
mod snapshot;

use url::Url;

// Re-export main functions
pub use normalize::normalize_url;
pub use snapshot::{snapshot_key, snapshot_name, SNAPSHOT_EXTENSION};

/// Returns true if both URLs share scheme, host and port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_atlas::url::is_same_origin;
///
/// let a = Url::parse("https://example.com/a").unwrap();
/// let b = Url::parse("https://example.com/b?x=1").unwrap();
/// let c = Url::parse("https://other.com/a").unwrap();
/// assert!(is_same_origin(&a, &b));
/// assert!(!is_same_origin(&a, &c));
/// ```
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Returns true if the URL path ends with one of the given extensions
///
/// Matching is case-insensitive. Extensions are given with their leading dot.
pub fn has_excluded_extension(url: &Url, extensions: &[String]) -> bool {
    let path = url.path().to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| path.ends_with(&ext.to_ascii_lowercase()))
}
