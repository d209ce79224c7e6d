//! HTML parser for extracting the page title and followable links

use scraper::{Html, Selector};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// The page title (from the first `<title>` tag)
    pub title: Option<String>,

    /// Absolute HTTP(S) links found in anchors, in document order
    pub links: Vec<Url>,
}

/// Parses HTML content and extracts the title and anchor links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` anywhere in the document, resolved against `page_url`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to an HTTP or HTTPS URL
///
/// # Example
///
/// ```
/// use site_atlas::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let page_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &page_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// assert_eq!(parsed.links[0].as_str(), "https://example.com/page");
/// ```
pub fn parse_html(html: &str, page_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        title: extract_title(&document),
        links: extract_links(&document, page_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all followable anchor links from the HTML document
fn extract_links(document: &Html, page_url: &Url) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, page_url))
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = page_url.join(href).ok()?;
    matches!(absolute.scheme(), "http" | "https").then_some(absolute)
}
