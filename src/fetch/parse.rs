//! Title and main-content extraction from a fetched page.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;

use crate::models::MAX_CONTENT_CHARS;

/// Selector list tried in order for the page's primary content. Falls
/// back to `<body>` when none match, the same try-each-selector-until-one-
/// matches loop used for pagination links in
/// `scrapers/configurable/html_crawl.rs`.
const CONTENT_SELECTORS: &[&str] = &["main", "article", ".content", "#content", "#bodyContent", ".mw-parser-output"];

/// First non-empty `<title>`, else first `<h1>`, else `"Untitled"`.
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);

    if let Ok(selector) = Selector::parse("title") {
        if let Some(text) = first_nonempty_text(&document, &selector) {
            return text;
        }
    }
    if let Ok(selector) = Selector::parse("h1") {
        if let Some(text) = first_nonempty_text(&document, &selector) {
            return text;
        }
    }
    "Untitled".to_string()
}

fn first_nonempty_text(document: &Html, selector: &Selector) -> Option<String> {
    document.select(selector).find_map(|el| {
        let text = el.text().collect::<String>().trim().to_string();
        (!text.is_empty()).then_some(text)
    })
}

/// Extract the page's main textual content, truncated to
/// [`MAX_CONTENT_CHARS`].
pub fn extract_main_content(html: &str) -> String {
    let document = Html::parse_document(html);

    for selector_str in CONTENT_SELECTORS {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        if let Some(el) = document.select(&selector).next() {
            let text = collapse_whitespace(&el.text().collect::<String>());
            if !text.is_empty() {
                return truncate_chars(&text, MAX_CONTENT_CHARS);
            }
        }
    }

    let body_selector = Selector::parse("body").expect("static selector");
    let text = document
        .select(&body_selector)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default();
    truncate_chars(&text, MAX_CONTENT_CHARS)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

fn title_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s*[|\-–—:]\s*[^|\-–—:]+$").expect("static pattern"))
}

/// Strip a trailing `" | Site Name"`-style suffix. Used only when deriving
/// `source.label` from a page title, not for page titles themselves.
pub fn strip_title_suffix(title: &str) -> String {
    let stripped = title_suffix_pattern().replace(title, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        title.trim().to_string()
    } else {
        stripped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_prefers_title_tag() {
        let html = "<html><head><title> My Page </title></head><body><h1>Other</h1></body></html>";
        assert_eq!(extract_title(html), "My Page");
    }

    #[test]
    fn title_falls_back_to_h1() {
        let html = "<html><head><title></title></head><body><h1>Heading</h1></body></html>";
        assert_eq!(extract_title(html), "Heading");
    }

    #[test]
    fn title_falls_back_to_untitled() {
        let html = "<html><head></head><body><p>no headings here</p></body></html>";
        assert_eq!(extract_title(html), "Untitled");
    }

    #[test]
    fn content_prefers_main_tag() {
        let html = "<html><body><nav>skip</nav><main>  keep   this  </main></body></html>";
        assert_eq!(extract_main_content(html), "keep this");
    }

    #[test]
    fn content_falls_back_to_body() {
        let html = "<html><body>just body text</body></html>";
        assert_eq!(extract_main_content(html), "just body text");
    }

    #[test]
    fn content_truncates_to_max_chars() {
        let long = "a ".repeat(MAX_CONTENT_CHARS);
        let html = format!("<html><body><article>{}</article></body></html>", long);
        let content = extract_main_content(&html);
        assert!(content.chars().count() <= MAX_CONTENT_CHARS);
    }

    #[test]
    fn strips_trailing_site_suffix() {
        assert_eq!(strip_title_suffix("Home Page | Example Site"), "Home Page");
        assert_eq!(strip_title_suffix("Just A Title"), "Just A Title");
    }
}
