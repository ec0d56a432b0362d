//! API client for the Podcast Index.
//!
//! This module provides the remote podcast client: trending feeds, search
//! by term, and paginated episode listing, with the per-request
//! authentication signature the API requires.

use crate::error::{AppError, Result};
use crate::types::{EpisodePage, Podcast, RawEpisode};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const BASE_URL: &str = "https://api.podcastindex.org/api/1.0";
const USER_AGENT: &str = "poddeck/0.1";

/// Request timeout; the app adds no timeout semantics of its own beyond
/// this transport-level one.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote page size for the trending feed.
pub const TRENDING_PAGE_SIZE: u32 = 40;

#[derive(Debug, Deserialize)]
struct FeedsResponse {
    #[serde(default)]
    feeds: Vec<Podcast>,
}

#[derive(Debug, Deserialize)]
struct EpisodesResponse {
    #[serde(default)]
    items: Vec<RawEpisode>,
    #[serde(default)]
    count: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    description: Option<String>,
}

/// Compute the Podcast Index request signature: the lowercase hex SHA-1
/// digest of `key + secret + unix_time`.
pub fn auth_signature(api_key: &str, api_secret: &str, unix_time: u64) -> String {
    let mut hasher = Sha1::new();
    hasher.update(api_key.as_bytes());
    hasher.update(api_secret.as_bytes());
    hasher.update(unix_time.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Extract a human-readable error detail from a non-success response body.
///
/// Prefers the JSON `description` field, falls back to the raw body, then
/// to the status text.
pub fn extract_error_detail(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(description) = parsed.description {
            if !description.is_empty() {
                return description;
            }
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

/// Build an [`EpisodePage`] from a raw episode listing response.
///
/// De-duplicates items by id within the page (keeping first occurrence),
/// computes the minimum publish timestamp across the raw page, and keeps
/// the server-reported total rather than the de-duplicated length.
pub fn build_episode_page(items: Vec<RawEpisode>, count: u64) -> EpisodePage {
    let oldest_timestamp = items.iter().map(|ep| ep.date_published).min();
    let total_count = if count > 0 { count } else { items.len() as u64 };

    let mut seen = HashSet::new();
    let episodes = items
        .into_iter()
        .filter(|ep| seen.insert(ep.id))
        .collect();

    EpisodePage {
        episodes,
        oldest_timestamp,
        total_count,
    }
}

/// Read-only client for the Podcast Index API.
pub struct PodcastClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl PodcastClient {
    /// Create a client with the given credentials.
    pub fn new(api_key: String, api_secret: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_key,
            api_secret,
            base_url: BASE_URL.to_string(),
        })
    }

    fn auth_headers(&self) -> Vec<(&'static str, String)> {
        let unix_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let hash = auth_signature(&self.api_key, &self.api_secret, unix_time);

        vec![
            ("X-Auth-Date", unix_time.to_string()),
            ("X-Auth-Key", self.api_key.clone()),
            ("Authorization", hash),
        ]
    }

    /// Issue a GET request with a freshly computed signature and parse the
    /// JSON response, mapping non-2xx responses to [`AppError::Api`].
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        context: &str,
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("GET {} {:?}", url, query);

        let mut request = self.http.get(&url).query(query);
        for (name, value) in self.auth_headers() {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = extract_error_detail(status, &body);
            return Err(AppError::Api(format!("{}: {}", context, detail)));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Parse(format!("{}: {}", context, e)))
    }

    /// Fetch one page of trending podcasts.
    pub async fn fetch_trending(&self, since: u64, max: u32) -> Result<Vec<Podcast>> {
        let data: FeedsResponse = self
            .fetch_json(
                "/podcasts/trending",
                &[("max", max.to_string()), ("since", since.to_string())],
                "Failed to fetch trending podcasts",
            )
            .await?;

        debug!("Trending page: {} feeds (since={})", data.feeds.len(), since);
        Ok(data.feeds)
    }

    /// Search podcasts by free-text term.
    pub async fn search(&self, term: &str) -> Result<Vec<Podcast>> {
        let data: FeedsResponse = self
            .fetch_json(
                "/search/byterm",
                &[("q", term.to_string())],
                "Failed to search podcasts",
            )
            .await?;

        debug!("Search '{}': {} feeds", term, data.feeds.len());
        Ok(data.feeds)
    }

    /// Fetch one page of a feed's episodes, newest first.
    ///
    /// `since` requests items strictly at-or-after that timestamp on the
    /// server side; callers paginate backwards by passing
    /// `oldest_timestamp - 1` from the previous page.
    pub async fn fetch_episodes_by_feed(
        &self,
        feed_id: u64,
        since: Option<i64>,
        max: u32,
    ) -> Result<EpisodePage> {
        let mut query = vec![("id", feed_id.to_string()), ("max", max.to_string())];
        if let Some(since) = since {
            query.push(("since", since.to_string()));
        }

        let data: EpisodesResponse = self
            .fetch_json(
                "/episodes/byfeedid",
                &query,
                "Failed to fetch episodes",
            )
            .await?;

        let page = build_episode_page(data.items, data.count);
        debug!(
            "Episodes for feed {}: {} unique, oldest={:?}, total={}",
            feed_id,
            page.episodes.len(),
            page.oldest_timestamp,
            page.total_count
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_episode(id: u64, date_published: i64) -> RawEpisode {
        RawEpisode {
            id,
            title: format!("ep-{}", id),
            enclosure_url: format!("https://example.com/{}.mp3", id),
            date_published,
            duration: 0,
            image: String::new(),
        }
    }

    #[test]
    fn test_auth_signature_is_lowercase_hex() {
        let sig = auth_signature("key", "secret", 1_700_000_000);
        assert_eq!(sig.len(), 40);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, sig.to_lowercase());
    }

    #[test]
    fn test_auth_signature_is_deterministic() {
        let a = auth_signature("key", "secret", 1_700_000_000);
        let b = auth_signature("key", "secret", 1_700_000_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_auth_signature_depends_on_time() {
        let a = auth_signature("key", "secret", 1_700_000_000);
        let b = auth_signature("key", "secret", 1_700_000_001);
        assert_ne!(a, b);
    }

    #[test]
    fn test_extract_error_detail_prefers_json_description() {
        let detail = extract_error_detail(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"status":"false","description":"Authentication failed"}"#,
        );
        assert_eq!(detail, "Authentication failed");
    }

    #[test]
    fn test_extract_error_detail_falls_back_to_body() {
        let detail =
            extract_error_detail(reqwest::StatusCode::BAD_GATEWAY, "upstream exploded");
        assert_eq!(detail, "upstream exploded");
    }

    #[test]
    fn test_extract_error_detail_falls_back_to_status_text() {
        let detail = extract_error_detail(reqwest::StatusCode::NOT_FOUND, "  ");
        assert_eq!(detail, "Not Found");
    }

    #[test]
    fn test_extract_error_detail_json_without_description() {
        let detail =
            extract_error_detail(reqwest::StatusCode::BAD_REQUEST, r#"{"status":"false"}"#);
        assert_eq!(detail, r#"{"status":"false"}"#);
    }

    #[test]
    fn test_build_episode_page_dedups_but_keeps_server_count() {
        let items = vec![
            raw_episode(1, 300),
            raw_episode(2, 200),
            raw_episode(1, 300),
            raw_episode(3, 100),
        ];
        let page = build_episode_page(items, 57);

        let ids: Vec<u64> = page.episodes.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(page.total_count, 57);
        assert_eq!(page.oldest_timestamp, Some(100));
    }

    #[test]
    fn test_build_episode_page_count_falls_back_to_raw_length() {
        let items = vec![raw_episode(1, 300), raw_episode(1, 300)];
        let page = build_episode_page(items, 0);
        assert_eq!(page.episodes.len(), 1);
        assert_eq!(page.total_count, 2);
    }

    #[test]
    fn test_build_episode_page_empty() {
        let page = build_episode_page(Vec::new(), 0);
        assert!(page.episodes.is_empty());
        assert_eq!(page.oldest_timestamp, None);
        assert_eq!(page.total_count, 0);
    }
}
