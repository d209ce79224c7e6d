use url::Url;

/// File extension used for stored page snapshots
pub const SNAPSHOT_EXTENSION: &str = "html";

/// Builds the object store key for a page snapshot
///
/// Keys are grouped per owner and prefixed with the page host so crawls of
/// different sites never collide: `private/{owner}/{host}-{name}`.
pub fn snapshot_key(owner: &str, page_url: &Url, name: &str) -> String {
    let host = page_url
        .host_str()
        .map(|h| h.to_lowercase())
        .unwrap_or_else(|| "unknown-host".to_string());
    format!("private/{}/{}-{}", owner, host, name)
}

/// Derives the snapshot file name for a page relative to the crawl target
///
/// # Naming Rules
///
/// 1. Strip the target prefix from the page URL (pages outside the target
///    prefix fall back to their path)
/// 2. An empty remainder names the site root: `top`
/// 3. Drop `#` markers
/// 4. Replace `/` with `-` and drop one trailing `-`
/// 5. Replace anything outside `[A-Za-z0-9._-]` with `_`
/// 6. Append the snapshot extension
///
/// # Examples
///
/// ```
/// use site_atlas::url::snapshot_name;
///
/// assert_eq!(snapshot_name("https://ex.com/", "https://ex.com/"), "top.html");
/// assert_eq!(snapshot_name("https://ex.com/", "https://ex.com/en/about/"), "en-about.html");
/// ```
pub fn snapshot_name(target: &str, page_url: &str) -> String {
    let remainder = match page_url.strip_prefix(target) {
        Some(rest) => rest.to_string(),
        None => Url::parse(page_url)
            .map(|u| {
                let mut path = u.path().to_string();
                if let Some(query) = u.query() {
                    path.push('?');
                    path.push_str(query);
                }
                path
            })
            .unwrap_or_else(|_| page_url.to_string()),
    };

    let remainder = remainder.trim_start_matches('/').replace('#', "");

    let mut stem = if remainder.is_empty() {
        "top".to_string()
    } else {
        remainder.replace('/', "-")
    };

    if stem.ends_with('-') {
        stem.pop();
    }

    let stem: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}.{}", stem, SNAPSHOT_EXTENSION)
}
