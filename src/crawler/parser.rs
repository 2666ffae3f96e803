//! HTML parser for extracting visible text and links
//!
//! This module handles parsing HTML content to extract:
//! - The visible text of the page, as one whitespace-joined string
//! - Links to follow (from `<a href>` tags)
//!
//! html5ever is error-tolerant, so malformed markup never fails here; it
//! degrades to whatever text and links could be recovered.

use scraper::{Html, Node, Selector};
use url::Url;

/// Elements whose text content is never shown to a reader
const INVISIBLE_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Visible text, whitespace-collapsed and joined with single spaces
    pub text: String,

    /// All followable links found on the page (absolute URLs, document order)
    pub links: Vec<String>,
}

/// Parses HTML content and extracts text and links
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the page was served from, for resolving relative links
///
/// # Example
///
/// ```
/// use site_sage::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><body><h1>Hi</h1><p>there</p><a href="/next">Next</a></body></html>"#;
/// let base_url = Url::parse("https://example.test/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.text, "Hi there Next");
/// assert_eq!(parsed.links, vec!["https://example.test/next".to_string()]);
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        text: extract_text(&document),
        links: extract_links(&document, base_url),
    }
}

/// Collects every visible text node, in document order
///
/// Whitespace runs inside and between nodes collapse to a single space.
fn extract_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| INVISIBLE_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        parts.extend(text.split_whitespace());
    }

    parts.join(" ")
}

/// Extracts all followable links from the HTML document
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter(|element| element.value().attr("download").is_none())
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url.to_string())
    } else {
        None
    }
}
