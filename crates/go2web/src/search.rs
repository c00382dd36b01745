//! Web search through DuckDuckGo's HTML endpoint
//!
//! The result page is fetched like any other URL, but through a client
//! whose extractor passes the HTML through untouched, so the result markup
//! is still there to parse.

use crate::client::Client;
use crate::error::FetchError;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// DuckDuckGo HTML results endpoint
pub const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Results returned per search
pub const MAX_RESULTS: usize = 10;

/// Text printed when a search finds nothing
pub const NO_RESULTS: &str = "No results found.";

/// Prefix of DuckDuckGo's click-tracking redirect links
const DDG_REDIRECT_PREFIX: &str = "//duckduckgo.com/l/";

static RESULT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result").expect("invalid selector"));
static RESULT_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".result__title").expect("invalid selector"));
static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("invalid selector"));

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

/// Results page URL for `query`
pub fn search_url(query: &str) -> String {
    Url::parse_with_params(SEARCH_ENDPOINT, &[("q", query)])
        .map(String::from)
        .unwrap_or_else(|_| format!("{}?q={}", SEARCH_ENDPOINT, query))
}

/// Run a search; `client` should use a passthrough extractor
pub fn search(client: &Client, query: &str) -> Result<Vec<SearchResult>, FetchError> {
    let html = client.fetch(&search_url(query))?;
    Ok(parse_results(&html))
}

/// Pull up to [`MAX_RESULTS`] title/link pairs out of a result page
pub fn parse_results(html: &str) -> Vec<SearchResult> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT)
        .take(MAX_RESULTS)
        .filter_map(|result| {
            let title_elem = result.select(&RESULT_TITLE).next()?;
            let title = title_elem
                .text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            let href = title_elem.select(&LINK).next()?.value().attr("href")?;

            Some(SearchResult {
                title,
                url: unwrap_redirect(href),
            })
        })
        .collect()
}

/// Turn `//duckduckgo.com/l/?uddg=<target>&rut=...` into `<target>`
fn unwrap_redirect(href: &str) -> String {
    if !href.starts_with(DDG_REDIRECT_PREFIX) {
        return href.to_string();
    }

    Url::parse(&format!("https:{}", href))
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "uddg")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| href.to_string())
}

/// Render results as `title\nurl\n` blocks separated by blank lines
pub fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS.to_string();
    }
    results
        .iter()
        .map(|r| format!("{}\n{}\n", r.title, r.url))
        .collect::<Vec<_>>()
        .join("\n")
}
