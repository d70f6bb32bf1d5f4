//! Catalog lookup against the iTunes Search API.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::songbot::song::{SongDescriptor, UNKNOWN};

const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

/// Resolves a free-text query to the single best matching song.
pub trait Catalog: Send + Sync {
    /// `Ok(None)` means the provider had no results.
    fn search(&self, query: &str) -> impl Future<Output = Result<Option<SongDescriptor>, CatalogError>> + Send;
}

#[derive(Debug)]
pub enum CatalogError {
    Http(String),
    Api(String),
    Parse(String),
    Timeout,
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Http(e) => write!(f, "HTTP error: {e}"),
            CatalogError::Api(e) => write!(f, "API error: {e}"),
            CatalogError::Parse(e) => write!(f, "Parse error: {e}"),
            CatalogError::Timeout => write!(f, "Timed out"),
        }
    }
}

impl std::error::Error for CatalogError {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    result_count: u32,
    #[serde(default)]
    results: Vec<Track>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Track {
    track_name: Option<String>,
    artist_name: Option<String>,
    collection_name: Option<String>,
    preview_url: Option<String>,
    track_view_url: Option<String>,
    artwork_url100: Option<String>,
}

impl From<Track> for SongDescriptor {
    fn from(track: Track) -> Self {
        Self {
            title: or_unknown(track.track_name),
            artist: or_unknown(track.artist_name),
            album: or_unknown(track.collection_name),
            preview_url: non_empty(track.preview_url),
            canonical_url: non_empty(track.track_view_url),
            artwork_url: non_empty(track.artwork_url100),
        }
    }
}

fn or_unknown(value: Option<String>) -> String {
    non_empty(value).unwrap_or_else(|| UNKNOWN.to_string())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub struct ItunesCatalog {
    http: reqwest::Client,
    base_url: String,
}

impl ItunesCatalog {
    pub fn new(timeout: Duration) -> Result<Self, CatalogError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: ITUNES_SEARCH_URL.to_string(),
        })
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl Catalog for ItunesCatalog {
    async fn search(&self, query: &str) -> Result<Option<SongDescriptor>, CatalogError> {
        info!("🔎 Catalog search: {}", query);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("term", query), ("limit", "1"), ("media", "music")])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout
                } else {
                    CatalogError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api(format!("{status}: {body}")));
        }

        // iTunes answers with text/javascript, so decode the body ourselves.
        let body = response
            .text()
            .await
            .map_err(|e| CatalogError::Http(e.to_string()))?;
        let song = parse_search_response(&body)?;

        debug!("Catalog result: {:?}", song);
        Ok(song)
    }
}

fn parse_search_response(body: &str) -> Result<Option<SongDescriptor>, CatalogError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| CatalogError::Parse(e.to_string()))?;

    if parsed.result_count == 0 {
        return Ok(None);
    }

    Ok(parsed.results.into_iter().next().map(SongDescriptor::from))
}
