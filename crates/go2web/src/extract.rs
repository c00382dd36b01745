//! Readable text extraction
//!
//! The fetch pipeline hands decoded HTML to an [`Extractor`] and caches
//! whatever it returns. [`HeuristicExtractor`] is the default: it drops
//! navigation, ads and widgets, picks the most content-looking container,
//! and keeps sentences long enough to be worth reading. It is a heuristic
//! cleanup filter, not a readability algorithm.

use crate::error::FetchError;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;

/// Turns a decoded HTML page into the text returned by a fetch
pub trait Extractor: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Extract text from `html`
    fn extract(&self, html: &str) -> Result<String, FetchError>;
}

/// Returns the decoded body unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughExtractor;

impl Extractor for PassthroughExtractor {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    fn extract(&self, html: &str) -> Result<String, FetchError> {
        Ok(html.to_string())
    }
}

/// Elements removed with their whole subtree
const NOISE_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "noscript", "iframe", "form", "button", "input",
    "select", "textarea", "meta", "link", "aside", "menu", "menuitem", "dialog", "details",
    "summary", "figure", "figcaption", "picture", "source", "track", "video", "audio", "embed",
    "object", "param", "canvas", "svg", "math", "map", "area", "optgroup", "option", "fieldset",
    "legend", "label", "datalist", "output", "progress", "meter", "time", "mark", "ruby", "rt",
    "rp", "bdi", "bdo", "wbr", "slot", "template", "portal",
];

/// Containers searched, in order, for a content-looking class
const CONTENT_TAGS: [&str; 3] = ["main", "article", "div"];

/// Sentences this short (in characters) or shorter are dropped
const MIN_SENTENCE_CHARS: usize = 10;

/// Any class token matching this marks the element as noise
static NOISE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "menu|nav|header|footer|sidebar|banner|ad|cookie|popup|modal|tooltip|dropdown|button|\
         link|social|share|comment|related|widget|navigation|breadcrumb|pagination|search|form|\
         login|signup|subscribe|newsletter|advertisement",
    )
    .expect("invalid noise class pattern")
});

static CONTENT_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("main|content|article|post|entry|text|body|description|summary|excerpt")
        .expect("invalid content class pattern")
});

/// Interface words that survive tag filtering
static BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        "\\b(?:Menu|Navigation|Search|Login|Sign up|Subscribe|Follow us|Share|More|Close|Open|\
         Next|Previous|Back|Forward|Home|About|Contact|Terms|Privacy|Cookie|Settings|Options|\
         Help|Support|Feedback|Report|Download|Upload|Save|Delete|Edit|Update|Refresh|Reload|\
         Cancel|Submit|Send|Post|Comment|Reply|Like|Follow|Unsubscribe|Register|Sign in|Log in|\
         Log out|Profile|Account)\\b",
    )
    .expect("invalid boilerplate pattern")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("invalid whitespace pattern"));

static CONTENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CONTENT_TAGS
        .iter()
        .map(|tag| Selector::parse(tag).expect("invalid selector"))
        .collect()
});

static BODY_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("invalid selector"));

/// Default tag/class filtering extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicExtractor;

impl Extractor for HeuristicExtractor {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn extract(&self, html: &str) -> Result<String, FetchError> {
        let document = Html::parse_document(html);
        let root = content_root(&document).ok_or(FetchError::NoContent)?;

        let mut parts = Vec::new();
        collect_text(root, &mut parts);

        let text = WHITESPACE.replace_all(&parts.join(" "), " ").into_owned();
        let text = BOILERPLATE.replace_all(&text, "");

        Ok(sentences(&text))
    }
}

/// Noise by tag name or by any class token
fn is_noise(element: &ElementRef<'_>) -> bool {
    let value = element.value();
    NOISE_TAGS.contains(&value.name()) || value.classes().any(|c| NOISE_CLASS.is_match(c))
}

/// Noise itself or inside a noise subtree
fn in_noise(element: &ElementRef<'_>) -> bool {
    is_noise(element)
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| is_noise(&a))
}

/// First content-classed `main`, `article` or `div`, else `body`
fn content_root(document: &Html) -> Option<ElementRef<'_>> {
    for selector in CONTENT_SELECTORS.iter() {
        let found = document.select(selector).find(|el| {
            el.value().classes().any(|c| CONTENT_CLASS.is_match(c)) && !in_noise(el)
        });
        if found.is_some() {
            return found;
        }
    }
    document.select(&BODY_SELECTOR).next()
}

/// Trimmed, non-empty text nodes under `element`, skipping noise subtrees
fn collect_text(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    out.push(trimmed.to_string());
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    if !is_noise(&el) {
                        collect_text(el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Split on `.`, keep the long pieces, one sentence per paragraph
fn sentences(text: &str) -> String {
    text.split('.')
        .map(str::trim)
        .filter(|s| s.chars().count() > MIN_SENTENCE_CHARS)
        .map(|s| format!("{}.", s))
        .collect::<Vec<_>>()
        .join("\n\n")
}
