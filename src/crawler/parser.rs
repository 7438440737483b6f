//! HTML link extraction
//!
//! Pulls the `href` of every anchor out of a page body. Links come back
//! raw; resolving and canonicalizing them is the normalizer's job.

use scraper::{Html, Selector};

/// Content types we are willing to parse for links
const HTML_CONTENT_TYPES: &[&str] = &["text/html", "application/xhtml+xml"];

/// Extracts raw anchor hrefs from an HTML body
///
/// Returns an empty list for non-HTML content types. Malformed HTML is
/// parsed best-effort; it can cost links but never fails.
pub fn extract_links(body: &str, content_type: &str) -> Vec<String> {
    if !is_html(content_type) {
        return Vec::new();
    }

    let document = Html::parse_document(body);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::trim)
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_html(content_type: &str) -> bool {
    HTML_CONTENT_TYPES
        .iter()
        .any(|html| content_type.starts_with(html))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_hrefs() {
        let html = r#"<html><body>
            <a href="/one">One</a>
            <a href="https://other.test/two">Two</a>
        </body></html>"#;

        let links = extract_links(html, "text/html");
        assert_eq!(links, vec!["/one", "https://other.test/two"]);
    }

    #[test]
    fn test_content_type_with_charset() {
        let html = r#"<a href="/x">x</a>"#;
        let links = extract_links(html, "text/html; charset=utf-8");
        assert_eq!(links, vec!["/x"]);
    }

    #[test]
    fn test_xhtml_accepted() {
        let html = r#"<a href="/x">x</a>"#;
        let links = extract_links(html, "application/xhtml+xml");
        assert_eq!(links, vec!["/x"]);
    }

    #[test]
    fn test_non_html_yields_nothing() {
        let body = r#"{"href": "/not-a-link"}"#;
        assert!(extract_links(body, "application/json").is_empty());
        assert!(extract_links(body, "").is_empty());
    }

    #[test]
    fn test_anchors_without_href_skipped() {
        let html = r#"<a name="top">anchor</a><a href="/real">real</a>"#;
        let links = extract_links(html, "text/html");
        assert_eq!(links, vec!["/real"]);
    }

    #[test]
    fn test_empty_href_skipped() {
        let html = r#"<a href="">blank</a><a href="  ">spaces</a>"#;
        assert!(extract_links(html, "text/html").is_empty());
    }

    #[test]
    fn test_raw_links_not_resolved() {
        // Relative forms and fragments pass through untouched
        let html = r##"<a href="../up">up</a><a href="#frag">frag</a>"##;
        let links = extract_links(html, "text/html");
        assert_eq!(links, vec!["../up", "#frag"]);
    }

    #[test]
    fn test_malformed_html_best_effort() {
        let html = r#"<html><body><a href="/found">ok<div><a href="/also"#;
        let links = extract_links(html, "text/html");
        assert!(links.contains(&"/found".to_string()));
    }
}
