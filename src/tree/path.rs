use super::node::ROOT_KEY;

/// Splits a page URL into path segments relative to the crawl base
///
/// The base prefix is stripped when it ends on a segment boundary (otherwise
/// the whole URL is split), a trailing `#` marker is dropped, and empty
/// segments are removed. A base of `https://ex.com/docs` strips
/// `https://ex.com/docs/intro` but not `https://ex.com/docsearch`.
pub fn path_parts(base_url: &str, url: &str) -> Vec<String> {
    let relative = strip_base(base_url, url).unwrap_or(url);
    let relative = relative.strip_suffix('#').unwrap_or(relative);

    relative
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_base<'a>(base_url: &str, url: &'a str) -> Option<&'a str> {
    let rest = url.strip_prefix(base_url)?;
    let on_boundary = base_url.ends_with('/')
        || rest.is_empty()
        || rest.starts_with(|c: char| matches!(c, '/' | '#' | '?'));
    on_boundary.then_some(rest)
}

/// Anchors a path at the root container
///
/// An empty path names the root itself. Any other path gets the root key
/// prepended unless it already starts with it.
pub fn canonical_path(mut parts: Vec<String>) -> Vec<String> {
    if parts.first().map(String::as_str) != Some(ROOT_KEY) {
        parts.insert(0, ROOT_KEY.to_string());
    }
    parts
}

/// Number of `/`-delimited pieces in a raw URL, empty pieces included
pub(crate) fn url_segment_count(url: &str) -> usize {
    url.split('/').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_base_and_splits() {
        assert_eq!(
            path_parts("https://ex.com/", "https://ex.com/en/about"),
            vec!["en", "about"]
        );
    }

    #[test]
    fn test_base_itself_is_empty() {
        assert!(path_parts("https://ex.com/", "https://ex.com/").is_empty());
        assert!(path_parts("https://ex.com/", "https://ex.com/#").is_empty());
    }

    #[test]
    fn test_trailing_hash_and_slashes_dropped() {
        assert_eq!(
            path_parts("https://ex.com/", "https://ex.com/docs//intro/#"),
            vec!["docs", "intro"]
        );
    }

    #[test]
    fn test_foreign_url_keeps_all_segments() {
        assert_eq!(
            path_parts("https://ex.com/", "https://other.org/a"),
            vec!["https:", "other.org", "a"]
        );
    }

    #[test]
    fn test_base_with_path_strips_on_segment_boundary() {
        let base = "https://ex.com/docs";
        assert!(path_parts(base, "https://ex.com/docs").is_empty());
        assert_eq!(path_parts(base, "https://ex.com/docs/intro"), vec!["intro"]);
        assert_eq!(
            path_parts(base, "https://ex.com/docsearch"),
            vec!["https:", "ex.com", "docsearch"]
        );
    }

    #[test]
    fn test_base_with_trailing_slash_strips_directly() {
        assert_eq!(
            path_parts("https://ex.com/ja/", "https://ex.com/ja/news"),
            vec!["news"]
        );
    }

    #[test]
    fn test_canonical_empty_is_root() {
        assert_eq!(canonical_path(Vec::new()), vec!["top"]);
    }

    #[test]
    fn test_canonical_prepends_root() {
        let parts = vec!["en".to_string(), "about".to_string()];
        assert_eq!(canonical_path(parts), vec!["top", "en", "about"]);
    }

    #[test]
    fn test_canonical_keeps_existing_root() {
        let parts = vec!["top".to_string(), "news".to_string()];
        assert_eq!(canonical_path(parts), vec!["top", "news"]);
    }

    #[test]
    fn test_segment_count_includes_empty_pieces() {
        assert_eq!(url_segment_count("https://ex.com/"), 4);
        assert_eq!(url_segment_count("https://ex.com/en"), 4);
        assert_eq!(url_segment_count("https://ex.com/en/about"), 5);
    }
}
