//! Lyrics fetching: Genius search API plus scraping of the song page.
//!
//! Lyrics are a nice-to-have, so most upstream trouble becomes
//! [`LyricsOutcome::NotFound`]. Only transport failures are reported as
//! provider errors.

use std::future::Future;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, warn};

const GENIUS_SEARCH_URL: &str = "https://api.genius.com/search";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LyricsOutcome {
    Found(String),
    NotFound,
    ProviderError(String),
}

/// Looks up the full lyrics for an (artist, title) pair. Either may be empty.
pub trait LyricsSource: Send + Sync {
    fn fetch(&self, artist: &str, title: &str) -> impl Future<Output = LyricsOutcome> + Send;
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// One way of locating lyrics in a song page.
///
/// Strategies are tried in order and the first one that yields text wins, so
/// supporting a new page layout means adding a strategy.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Text blocks found in the page, or `None` if this layout doesn't match.
    fn extract(&self, document: &Html) -> Option<Vec<String>>;
}

/// Pulls text out of elements matching a CSS selector.
pub struct ContainerStrategy {
    name: String,
    selector: Selector,
    /// Collect every match instead of only the first. The current site
    /// splits lyrics across several sibling containers.
    all_matches: bool,
}

impl ContainerStrategy {
    /// `None` if the selector doesn't parse.
    pub fn new(name: &str, css: &str, all_matches: bool) -> Option<Self> {
        match Selector::parse(css) {
            Ok(selector) => Some(Self {
                name: name.to_string(),
                selector,
                all_matches,
            }),
            Err(e) => {
                warn!("Invalid lyrics selector '{}': {:?}", css, e);
                None
            }
        }
    }
}

impl ExtractionStrategy for ContainerStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, document: &Html) -> Option<Vec<String>> {
        let mut matches = document.select(&self.selector);
        let elements: Vec<ElementRef<'_>> = if self.all_matches {
            matches.collect()
        } else {
            matches.next().into_iter().collect()
        };

        let mut blocks = Vec::new();
        for element in elements {
            let mut raw = String::new();
            collect_text(element, &mut raw);
            blocks.extend(
                raw.lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }

        if blocks.is_empty() { None } else { Some(blocks) }
    }
}

/// Flatten an element to text, turning `<br>` and block boundaries into newlines.
fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            // Genius marks embedded headers and ads this way
            if child_element.value().attr("data-exclude-from-selection") == Some("true") {
                continue;
            }
            match child_element.value().name() {
                "br" => out.push('\n'),
                "script" | "style" => {}
                name => {
                    let block = matches!(name, "div" | "p");
                    if block {
                        out.push('\n');
                    }
                    collect_text(child_element, out);
                    if block {
                        out.push('\n');
                    }
                }
            }
        }
    }
}

/// Known Genius layouts, newest first.
pub fn default_strategies() -> Vec<Box<dyn ExtractionStrategy>> {
    [
        ContainerStrategy::new("lyrics-container", r#"div[data-lyrics-container="true"]"#, true),
        ContainerStrategy::new("lyrics-root", r#"div[class*="Lyrics__Root"]"#, false),
        ContainerStrategy::new("legacy-lyrics", "div.lyrics", false),
    ]
    .into_iter()
    .flatten()
    .map(|s| Box::new(s) as Box<dyn ExtractionStrategy>)
    .collect()
}

/// Run the strategies over a page and join the winning blocks with newlines.
pub fn extract_lyrics(html: &str, strategies: &[Box<dyn ExtractionStrategy>]) -> Option<String> {
    let document = Html::parse_document(html);
    for strategy in strategies {
        if let Some(blocks) = strategy.extract(&document) {
            debug!("Lyrics matched strategy '{}' ({} blocks)", strategy.name(), blocks.len());
            return Some(blocks.join("\n"));
        }
    }
    None
}

// =============================================================================
// GENIUS CLIENT
// =============================================================================

#[derive(Deserialize)]
struct SearchResponse {
    response: SearchPayload,
}

#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    result: HitResult,
}

#[derive(Deserialize)]
struct HitResult {
    url: String,
}

pub struct GeniusLyrics {
    token: String,
    http: reqwest::Client,
    search_url: String,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl GeniusLyrics {
    pub fn new(token: String, timeout: Duration) -> Result<Self, String> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;

        Ok(Self {
            token,
            http,
            search_url: GENIUS_SEARCH_URL.to_string(),
            strategies: default_strategies(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_search_url(mut self, url: String) -> Self {
        self.search_url = url;
        self
    }

    /// Page URL of the best hit, `Ok(None)` when the search gave nothing usable.
    async fn search(&self, artist: &str, title: &str) -> Result<Option<String>, String> {
        let term = format!("{title} {artist}");
        let term = term.trim();

        let response = self
            .http
            .get(&self.search_url)
            .bearer_auth(&self.token)
            .query(&[("q", term)])
            .send()
            .await
            .map_err(|e| format!("Genius search failed: {e}"))?;

        if !response.status().is_success() {
            warn!("Genius API error: {}", response.status());
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read Genius response: {e}"))?;

        Ok(parse_search_hits(&body))
    }
}

fn parse_search_hits(body: &str) -> Option<String> {
    match serde_json::from_str::<SearchResponse>(body) {
        Ok(parsed) => parsed.response.hits.into_iter().next().map(|hit| hit.result.url),
        Err(e) => {
            warn!("Unexpected Genius search payload: {e}");
            None
        }
    }
}

impl LyricsSource for GeniusLyrics {
    async fn fetch(&self, artist: &str, title: &str) -> LyricsOutcome {
        info!("📝 Searching Genius for artist: '{}', title: '{}'", artist, title);

        let song_url = match self.search(artist, title).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                info!("No Genius search results");
                return LyricsOutcome::NotFound;
            }
            Err(e) => return LyricsOutcome::ProviderError(e),
        };
        debug!("Genius song URL: {}", song_url);

        let page = match self.http.get(&song_url).send().await {
            Ok(response) if response.status().is_success() => response.text().await,
            Ok(response) => {
                warn!("Genius page returned {}", response.status());
                return LyricsOutcome::NotFound;
            }
            Err(e) => return LyricsOutcome::ProviderError(format!("Failed to fetch lyrics page: {e}")),
        };
        let page = match page {
            Ok(html) => html,
            Err(e) => return LyricsOutcome::ProviderError(format!("Failed to read lyrics page: {e}")),
        };

        match extract_lyrics(&page, &self.strategies) {
            Some(lyrics) => LyricsOutcome::Found(lyrics),
            None => {
                warn!("Lyrics container not found on {}", song_url);
                LyricsOutcome::NotFound
            }
        }
    }
}
