//! Client for the two YouTube Data API v3 endpoints the gallery needs:
//! `search` for a channel's latest uploads and `videos` for their durations.
//!
//! HTTP goes through the [`Transport`] trait so the blocking `ureq` agent
//! can be swapped for a scripted one in tests.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::config::{GalleryConfig, MAX_SEARCH_RESULTS};
use crate::duration::parse_duration;
use crate::error::{Endpoint, FetchError, TransportError};
use crate::filter::DurationMap;
use crate::retry::RetryPolicy;

/// Used when the search snippet has no title.
pub const PLACEHOLDER_TITLE: &str = "Video";

/// A video surfaced by the channel search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoCandidate {
    pub video_id: String,
    pub title: String,
    /// Best available thumbnail, or empty when the API offered none.
    pub thumbnail_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Minimal blocking HTTP GET. Non-2xx statuses are returned as responses,
/// not errors; only connection-level failures are errors.
pub trait Transport {
    fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;
}

impl Transport for ureq::Agent {
    fn send(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let mut request = self.get(url);
        for (name, value) in query {
            request = request.query(name, value);
        }
        match request.call() {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|err| TransportError(format!("reading body: {err}")))?;
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => Ok(HttpResponse {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            // The transport error's Display includes the URL, and with it the key.
            Err(ureq::Error::Transport(transport)) => {
                let message = match transport.message() {
                    Some(message) => format!("{}: {message}", transport.kind()),
                    None => transport.kind().to_string(),
                };
                Err(TransportError(message))
            }
        }
    }
}

/// Builds the agent used for API calls. Without a timeout the transport
/// defaults apply.
pub fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
    let mut builder = ureq::AgentBuilder::new();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Option<Vec<SearchItem>>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: Option<SearchItemId>,
    snippet: Option<SearchSnippet>,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchSnippet {
    title: Option<String>,
    thumbnails: Option<Thumbnails>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Thumbnails {
    pub(crate) default: Option<Thumbnail>,
    pub(crate) medium: Option<Thumbnail>,
    pub(crate) high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Thumbnail {
    pub(crate) url: Option<String>,
}

impl Thumbnails {
    /// First present URL from high, then medium, then default resolution.
    pub(crate) fn best_url(&self) -> String {
        [&self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .filter_map(|thumb| thumb.url.as_deref())
            .find(|url| !url.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    items: Option<Vec<VideoItem>>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: Option<String>,
    #[serde(rename = "contentDetails")]
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: Option<String>,
}

impl SearchItem {
    fn into_candidate(self) -> Option<VideoCandidate> {
        let video_id = self.id?.video_id.filter(|id| !id.is_empty())?;
        let (title, thumbnails) = match self.snippet {
            Some(snippet) => (snippet.title, snippet.thumbnails.unwrap_or_default()),
            None => (None, Thumbnails::default()),
        };
        Some(VideoCandidate {
            video_id,
            title: title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string()),
            thumbnail_url: thumbnails.best_url(),
        })
    }
}

/// Issues the search and duration requests for one build.
pub struct YouTubeClient<'a, T: Transport + ?Sized> {
    transport: &'a T,
    api_base: String,
    api_key: String,
    retry: RetryPolicy,
}

impl<'a, T: Transport + ?Sized> YouTubeClient<'a, T> {
    pub fn new(transport: &'a T, api_base: &str, api_key: &str, retry: RetryPolicy) -> Self {
        Self {
            transport,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            retry,
        }
    }

    pub fn from_config(transport: &'a T, config: &GalleryConfig) -> Self {
        Self::new(
            transport,
            &config.api_base,
            &config.api_key,
            config.retry.clone(),
        )
    }

    /// Newest uploads of `channel_id`, videos only, newest first. Entries
    /// without a video id are skipped.
    pub fn fetch_candidates(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<VideoCandidate>, FetchError> {
        let max_results = max_results.min(MAX_SEARCH_RESULTS).to_string();
        let response: SearchResponse = self.get_json(
            Endpoint::Search,
            "search",
            &[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("maxResults", max_results.as_str()),
                ("order", "date"),
                ("type", "video"),
                ("key", self.api_key.as_str()),
            ],
        )?;

        let items = response.items.unwrap_or_default();
        let total = items.len();
        let candidates: Vec<VideoCandidate> = items
            .into_iter()
            .filter_map(SearchItem::into_candidate)
            .collect();
        info!(
            channel_id,
            items = total,
            candidates = candidates.len(),
            "fetched channel uploads"
        );
        Ok(candidates)
    }

    /// Durations for `video_ids` in a single batched request. An empty id
    /// list returns an empty map without touching the network.
    pub fn fetch_durations(&self, video_ids: &[String]) -> Result<DurationMap, FetchError> {
        if video_ids.is_empty() {
            return Ok(DurationMap::new());
        }

        let joined = video_ids.join(",");
        let response: VideoListResponse = self.get_json(
            Endpoint::Videos,
            "videos",
            &[
                ("part", "contentDetails"),
                ("id", joined.as_str()),
                ("key", self.api_key.as_str()),
            ],
        )?;

        let requested: HashSet<&str> = video_ids.iter().map(String::as_str).collect();
        let mut durations = DurationMap::new();
        for item in response.items.unwrap_or_default() {
            let Some(id) = item.id.filter(|id| requested.contains(id.as_str())) else {
                continue;
            };
            let raw = item
                .content_details
                .and_then(|details| details.duration)
                .unwrap_or_default();
            let duration = parse_duration(&raw);
            if duration.is_unknown() {
                debug!(video_id = %id, raw = %raw, "unparseable duration");
            }
            durations.insert(id, duration);
        }
        info!(
            requested = video_ids.len(),
            resolved = durations.len(),
            "fetched video durations"
        );
        Ok(durations)
    }

    fn get_json<R: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<R, FetchError> {
        let url = format!("{}/{}", self.api_base, path);
        debug!(%endpoint, url = %url, "requesting");
        let response = self.retry.run(|| {
            let response = self
                .transport
                .send(&url, query)
                .map_err(|source| FetchError::Transport { endpoint, source })?;
            if !(200..300).contains(&response.status) {
                return Err(FetchError::Status {
                    endpoint,
                    status: response.status,
                });
            }
            Ok(response)
        })?;
        serde_json::from_str(&response.body)
            .map_err(|source| FetchError::Decode { endpoint, source })
    }
}
