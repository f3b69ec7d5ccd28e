//! Turning response bodies into text, markdown, metadata and links.

use crate::normalize::resolve_link;
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{BTreeMap, HashSet};
use url::Url;

/// Elements whose text is never visible.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Block elements that end a line in the extracted text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "nav", "aside", "li", "ul",
    "ol", "table", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "br", "hr", "blockquote", "pre",
    "dd", "dt",
];

const LEGAL_TITLE_HINTS: &[&str] = &[
    "privacy", "terms", "policy", "legal", "cookie", "agreement", "notice", "conditions",
    "gdpr", "disclaimer",
];

/// Everything pulled out of one fetched document.
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    pub title: String,
    pub raw_text: String,
    pub markdown: String,
    pub metadata: BTreeMap<String, String>,
    pub links: Vec<String>,
}

/// Parse an HTML document fetched from `page_url`.
pub fn extract_html(html: &str, page_url: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let raw_text = visible_text(&document);
    let markdown = html_to_markdown(html).unwrap_or_else(|| raw_text.clone());
    let metadata = extract_metadata(&document);
    let title = extract_title(&document, &metadata).unwrap_or_else(|| title_from_url(page_url));
    let links = extract_links(&document, page_url);

    ExtractedPage {
        title,
        raw_text,
        markdown,
        metadata,
        links,
    }
}

/// Plain-text documents pass through verbatim.
pub fn extract_plain_text(body: &str, page_url: &str) -> ExtractedPage {
    let title = plain_text_title(body).unwrap_or_else(|| title_from_url(page_url));
    ExtractedPage {
        title,
        raw_text: body.to_string(),
        markdown: body.to_string(),
        metadata: BTreeMap::new(),
        links: Vec::new(),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn extract_title(document: &Html, metadata: &BTreeMap<String, String>) -> Option<String> {
    let from_tag = selector("title")
        .and_then(|sel| document.select(&sel).next().map(element_text))
        .filter(|t| !t.is_empty());

    from_tag
        .or_else(|| metadata.get("og:title").cloned())
        .or_else(|| {
            metadata
                .get("h1")
                .and_then(|h| h.split(" | ").next())
                .map(str::to_string)
        })
        .filter(|t| !t.trim().is_empty())
}

/// Visible text with scripts and styles removed, one block per line.
fn visible_text(document: &Html) -> String {
    let root = selector("body")
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut text = String::new();
    for node in root.descendants() {
        match node.value() {
            Node::Text(chunk) => {
                let hidden = node.ancestors().any(|ancestor| {
                    ancestor
                        .value()
                        .as_element()
                        .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
                });
                if hidden {
                    continue;
                }
                let words = chunk.split_whitespace().collect::<Vec<_>>().join(" ");
                if words.is_empty() {
                    continue;
                }
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push(' ');
                }
                text.push_str(&words);
            }
            Node::Element(el) if BLOCK_ELEMENTS.contains(&el.name()) => {
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            _ => {}
        }
    }

    text.trim().to_string()
}

fn html_to_markdown(html: &str) -> Option<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "noscript", "template", "head", "svg"])
        .build();

    converter
        .convert(html)
        .ok()
        .map(|md| md.trim().to_string())
        .filter(|md| !md.is_empty())
}

fn extract_metadata(document: &Html) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    if let Some(sel) = selector("meta") {
        for meta in document.select(&sel) {
            let element = meta.value();
            let key = element
                .attr("name")
                .or_else(|| element.attr("property"))
                .or_else(|| element.attr("http-equiv"));
            if let (Some(key), Some(content)) = (key, element.attr("content")) {
                let content = content.trim();
                if !content.is_empty() {
                    metadata.insert(key.trim().to_lowercase(), content.to_string());
                }
            }
        }
    }

    if let Some(lang) = document.root_element().value().attr("lang") {
        metadata.insert("lang".to_string(), lang.trim().to_string());
    }

    if let Some(href) = selector(r#"link[rel="canonical"]"#)
        .and_then(|sel| document.select(&sel).next())
        .and_then(|link| link.value().attr("href"))
    {
        metadata.insert("canonical".to_string(), href.trim().to_string());
    }

    for level in 1..=6 {
        let tag = format!("h{}", level);
        let Some(sel) = selector(&tag) else {
            continue;
        };
        let headings: Vec<String> = document
            .select(&sel)
            .map(element_text)
            .filter(|h| !h.is_empty())
            .collect();
        if !headings.is_empty() {
            metadata.insert(tag, headings.join(" | "));
        }
    }

    metadata
}

/// Every `<a href>` on the page, resolved, normalized and deduplicated in
/// document order.
fn extract_links(document: &Html, page_url: &str) -> Vec<String> {
    let Some(sel) = selector("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for element in document.select(&sel) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }
        if let Some(absolute) = resolve_link(page_url, href)
            && seen.insert(absolute.clone())
        {
            links.push(absolute);
        }
    }
    links
}

/// First short line that looks like a legal heading, else the first short
/// line of the document.
fn plain_text_title(body: &str) -> Option<String> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(10)
        .collect();

    let keyword_line = lines.iter().find(|line| {
        let lowered = line.to_lowercase();
        line.chars().count() <= 120 && LEGAL_TITLE_HINTS.iter().any(|k| lowered.contains(k))
    });

    keyword_line
        .or_else(|| lines.iter().find(|line| line.chars().count() <= 80))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|line| !line.is_empty())
}

/// A readable title from the last path segment, or the host for the root.
pub fn title_from_url(page_url: &str) -> String {
    let Ok(parsed) = Url::parse(page_url) else {
        return page_url.to_string();
    };

    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|s| s.rsplit_once('.').map_or(s, |(stem, _)| stem).to_string());

    match segment {
        Some(segment) if !segment.is_empty() => segment
            .split(['-', '_', '+'])
            .filter(|w| !w.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
        _ => parsed.host_str().unwrap_or(page_url).to_string(),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
