//! Outbound link extraction, plain and with surrounding context.

use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::normalize::normalize_url;

/// MediaWiki namespace prefixes skipped on wiki-style hosts.
const WIKI_NAMESPACES: &[&str] = &[
    "Wikipedia:",
    "Special:",
    "Portal:",
    "Help:",
    "Template:",
    "Category:",
    "File:",
    "Media:",
    "Talk:",
    "User_talk:",
    "User:",
];

/// Section headings whose descendants are excluded from link extraction.
const SKIPPED_SECTION_HEADINGS: &[&str] = &[
    "references",
    "citations",
    "external links",
    "further reading",
    "bibliography",
    "notes",
    "sources",
];

const SNIPPET_WINDOW: usize = 200;
const EDGE_ZONE: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkContext {
    pub url: String,
    pub snippet: String,
    pub anchor_text: Option<String>,
}

/// Canonical outbound link URLs, skip rules applied, de-duplicated.
pub fn extract_links(html: &str, current_url: &str, same_domain_only: bool) -> Vec<String> {
    extract_links_with_context(html, current_url, same_domain_only)
        .into_iter()
        .map(|link| link.url)
        .collect()
}

/// Outbound links with an anchor-centered text snippet.
pub fn extract_links_with_context(
    html: &str,
    current_url: &str,
    same_domain_only: bool,
) -> Vec<LinkContext> {
    let document = Html::parse_document(html);
    let root = content_root(&document);

    let mut skip_roots = HashSet::new();
    mark_skipped_sections(*root, &mut skip_roots);

    let Ok(base) = Url::parse(current_url) else {
        return Vec::new();
    };
    let current_canonical = normalize_url(current_url);

    let anchor_selector = Selector::parse("a[href]").expect("static selector");
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for anchor in root.select(&anchor_selector) {
        if is_within_skipped_section(&anchor, &skip_roots) {
            continue;
        }
        let href = anchor.value().attr("href").unwrap_or_default();
        if href.trim().is_empty() || href.starts_with('#') {
            continue;
        }

        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        if is_wiki_style_host(resolved.host_str().unwrap_or_default(), resolved.path())
            && is_wiki_namespace_path(resolved.path())
        {
            continue;
        }
        if resolved.path().to_ascii_lowercase().ends_with(".pdf") {
            continue;
        }
        if same_domain_only {
            let current_host = base.host_str().unwrap_or_default();
            let link_host = resolved.host_str().unwrap_or_default();
            if !domains_related(current_host, link_host) {
                continue;
            }
        }

        let canonical = normalize_url(resolved.as_str());
        if canonical == current_canonical {
            continue;
        }
        if !seen.insert(canonical.clone()) {
            continue;
        }

        let anchor_text = {
            let text = anchor.text().collect::<String>().trim().to_string();
            (!text.is_empty()).then_some(text)
        };
        let snippet = build_snippet(&anchor, anchor_text.as_deref());

        out.push(LinkContext {
            url: canonical,
            snippet,
            anchor_text,
        });
    }

    out
}

/// The element whose descendants are searched for links: the first match
/// of the primary-content selector list, else `<body>`, else the whole
/// document.
fn content_root(document: &Html) -> ElementRef<'_> {
    const SELECTORS: &[&str] = &["main", "article", ".content", "#content", "#bodyContent", ".mw-parser-output"];
    for selector_str in SELECTORS {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(el) = document.select(&selector).next() {
                return el;
            }
        }
    }
    if let Ok(body) = Selector::parse("body") {
        if let Some(el) = document.select(&body).next() {
            return el;
        }
    }
    document.root_element()
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn is_skipped_heading_text(text: &str) -> bool {
    let text = text.trim().to_lowercase();
    SKIPPED_SECTION_HEADINGS
        .iter()
        .any(|heading| text == *heading || text.starts_with(&format!("{heading} ")) || text.starts_with(&format!("{heading}(")))
}

/// Walk `root`'s children, recording the root node of every subtree that
/// falls under a skipped section heading, until the next heading of equal
/// or shallower level.
fn mark_skipped_sections(root: NodeRef<'_, scraper::node::Node>, skip_roots: &mut HashSet<NodeId>) {
    let mut skip_active: Option<u8> = None;

    for child in root.children() {
        if let Some(el) = ElementRef::wrap(child) {
            if let Some(level) = heading_level(el.value().name()) {
                if let Some(active) = skip_active {
                    if level <= active {
                        skip_active = None;
                    }
                }
                if skip_active.is_none() {
                    let text = el.text().collect::<String>();
                    if is_skipped_heading_text(&text) {
                        skip_active = Some(level);
                        continue;
                    }
                }
            }

            if skip_active.is_some() {
                skip_roots.insert(child.id());
                continue;
            }

            mark_skipped_sections(child, skip_roots);
        }
    }
}

fn is_within_skipped_section(anchor: &ElementRef<'_>, skip_roots: &HashSet<NodeId>) -> bool {
    if skip_roots.contains(&anchor.id()) {
        return true;
    }
    anchor.ancestors().any(|node| skip_roots.contains(&node.id()))
}

/// Whether a link's own host/path looks like a MediaWiki install, so the
/// namespace skip rule below only fires there and not on an ordinary site
/// whose path segments happen to collide with a wiki namespace prefix.
fn is_wiki_style_host(host: &str, path: &str) -> bool {
    host.to_ascii_lowercase().contains("wiki") || path.starts_with("/wiki/")
}

fn is_wiki_namespace_path(path: &str) -> bool {
    let segment = path.rsplit('/').next().unwrap_or("");
    let segment = segment.trim();
    segment == "Main_Page" || WIKI_NAMESPACES.iter().any(|ns| segment.starts_with(ns))
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

/// Exact, subdomain, or parent-domain relationship after stripping `www.`.
fn domains_related(a: &str, b: &str) -> bool {
    let a = strip_www(a);
    let b = strip_www(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.ends_with(&format!(".{b}")) || b.ends_with(&format!(".{a}"))
}

fn block_ancestor<'a>(anchor: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    anchor.ancestors().find_map(|node| {
        let el = ElementRef::wrap(node)?;
        let is_block = matches!(el.value().name(), "p" | "li" | "td" | "th")
            || (el.value().name() == "div"
                && el
                    .value()
                    .attr("class")
                    .map(|c| c.split_whitespace().any(|cl| cl == "mw-parser-output"))
                    .unwrap_or(false));
        is_block.then_some(el)
    })
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ~200-character window centered on the anchor inside its enclosing
/// block, falling back to the anchor text, then a generic placeholder.
fn build_snippet(anchor: &ElementRef<'_>, anchor_text: Option<&str>) -> String {
    if let Some(block) = block_ancestor(anchor) {
        let block_text = block.text().collect::<String>();
        if let Some(anchor_text) = anchor_text {
            if let Some(snippet) = windowed_snippet(&block_text, anchor_text) {
                return snippet;
            }
        }
    }
    if let Some(anchor_text) = anchor_text {
        let trimmed = collapse_whitespace(anchor_text);
        if !trimmed.is_empty() {
            return trimmed;
        }
    }
    "Link from page".to_string()
}

fn windowed_snippet(block_text: &str, anchor_text: &str) -> Option<String> {
    let chars: Vec<char> = block_text.chars().collect();
    let anchor_chars: Vec<char> = anchor_text.chars().collect();
    if anchor_chars.is_empty() || chars.is_empty() {
        return None;
    }
    let anchor_start = find_subsequence(&chars, &anchor_chars)?;
    let anchor_end = anchor_start + anchor_chars.len();

    let half = SNIPPET_WINDOW / 2;
    let (start, end) = if anchor_start <= EDGE_ZONE {
        (0, SNIPPET_WINDOW.min(chars.len()))
    } else if anchor_end + EDGE_ZONE >= chars.len() {
        (chars.len().saturating_sub(SNIPPET_WINDOW), chars.len())
    } else {
        let mid = (anchor_start + anchor_end) / 2;
        (mid.saturating_sub(half), (mid + half).min(chars.len()))
    };

    let snippet = collapse_whitespace(&chars[start..end].iter().collect::<String>());
    (!snippet.is_empty()).then_some(snippet)
}

fn find_subsequence(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/wiki/Foo";

    #[test]
    fn skips_anchor_only_and_self_links() {
        let html = r#"<html><body><main>
            <a href="#top">top</a>
            <a href="https://example.com/wiki/Foo">self</a>
        </main></body></html>"#;
        assert!(extract_links(html, BASE, false).is_empty());
    }

    #[test]
    fn skips_wiki_namespace_pages() {
        let html = r#"<html><body><main>
            <a href="/wiki/Special:Search">search</a>
            <a href="/wiki/Main_Page">home</a>
            <a href="/wiki/Bar">bar</a>
        </main></body></html>"#;
        let links = extract_links(html, BASE, false);
        assert_eq!(links, vec!["https://example.com/wiki/Bar".to_string()]);
    }

    #[test]
    fn skips_cross_domain_when_same_domain_only() {
        let html = r#"<html><body><main>
            <a href="https://other.com/x">other</a>
            <a href="https://sub.example.com/y">sub</a>
        </main></body></html>"#;
        let links = extract_links(html, BASE, true);
        assert_eq!(links, vec!["https://sub.example.com/y".to_string()]);
    }

    #[test]
    fn skips_pdf_and_non_http_schemes() {
        let html = r#"<html><body><main>
            <a href="/files/doc.pdf">doc</a>
            <a href="mailto:a@b.com">mail</a>
            <a href="javascript:void(0)">js</a>
            <a href="/wiki/Bar">bar</a>
        </main></body></html>"#;
        let links = extract_links(html, BASE, false);
        assert_eq!(links, vec!["https://example.com/wiki/Bar".to_string()]);
    }

    #[test]
    fn skips_references_section_links() {
        let html = r#"<html><body><div class="mw-parser-output">
            <p><a href="/wiki/Keep">keep</a></p>
            <h2>References</h2>
            <p><a href="/wiki/Drop">drop</a></p>
            <ul><li><a href="/wiki/AlsoDrop">also drop</a></li></ul>
            <h2>See also</h2>
            <p><a href="/wiki/KeepAgain">keep again</a></p>
        </div></body></html>"#;
        let links = extract_links(html, BASE, false);
        assert_eq!(
            links,
            vec![
                "https://example.com/wiki/Keep".to_string(),
                "https://example.com/wiki/KeepAgain".to_string(),
            ]
        );
    }

    #[test]
    fn deduplicates_by_canonical_url() {
        let html = r#"<html><body><main>
            <a href="/wiki/Bar">one</a>
            <a href="/wiki/Bar/">two</a>
            <a href="/wiki/Bar?utm_source=x">three</a>
        </main></body></html>"#;
        let links = extract_links(html, BASE, false);
        assert_eq!(links, vec!["https://example.com/wiki/Bar".to_string()]);
    }

    #[test]
    fn context_snippet_centers_on_anchor() {
        let html = r#"<html><body><main>
            <p>Some leading filler text before the link. Then a <a href="/wiki/Bar">bar</a> reference followed by trailing words to pad the block out well past the window edge so centering kicks in for this particular paragraph of text.</p>
        </main></body></html>"#;
        let links = extract_links_with_context(html, BASE, false);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].anchor_text.as_deref(), Some("bar"));
        assert!(links[0].snippet.contains("bar"));
    }

    #[test]
    fn context_falls_back_to_anchor_text_with_no_block() {
        let html = r#"<html><body><main><a href="/wiki/Bar">Bar Page</a></main></body></html>"#;
        let links = extract_links_with_context(html, BASE, false);
        assert_eq!(links[0].anchor_text.as_deref(), Some("Bar Page"));
    }

    #[test]
    fn context_falls_back_to_placeholder_with_no_anchor_text() {
        let html = r#"<html><body><main><a href="/wiki/Bar"><img src="x.png"/></a></main></body></html>"#;
        let links = extract_links_with_context(html, BASE, false);
        assert_eq!(links[0].anchor_text, None);
        assert_eq!(links[0].snippet, "Link from page");
    }
}
