//! Type definitions for the poddeck application.
//!
//! This module contains the core data structures used throughout the
//! application for representing podcasts, episodes, and episode pages.

use serde::{Deserialize, Serialize};

/// A podcast feed record as returned by the Podcast Index.
///
/// The same struct is persisted into the favorites store; `is_favorite` is
/// never populated from the API (the favorites store is the single source
/// of truth for it, see [`crate::favorites::with_favorite_status`]).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    /// Unique feed identifier.
    pub id: u64,

    /// Feed title.
    #[serde(default)]
    pub title: String,

    /// Feed description.
    #[serde(default)]
    pub description: String,

    /// Feed author.
    #[serde(default)]
    pub author: String,

    /// Feed URL.
    #[serde(default)]
    pub url: String,

    /// Feed language code (e.g. "en").
    #[serde(default)]
    pub language: String,

    /// Primary artwork URL.
    #[serde(default)]
    pub artwork: String,

    /// Secondary image URL, sometimes set when `artwork` is empty.
    #[serde(default)]
    pub image: String,

    /// MIME type of the feed document.
    #[serde(default, rename = "contentType")]
    pub content_type: String,

    /// Episode count as reported by the listing response.
    #[serde(default, rename = "episodeCount")]
    pub episode_count: Option<u64>,

    /// Unix timestamp of the last feed update.
    #[serde(default, rename = "lastUpdateTime")]
    pub last_update_time: Option<i64>,

    /// Unix timestamp of the newest item in the feed.
    #[serde(default, rename = "newestItemPublishTime")]
    pub newest_item_publish_time: Option<i64>,

    /// Whether this podcast is favorited. Only meaningful on records owned
    /// by the favorites store or returned by `with_favorite_status`.
    #[serde(default, rename = "isFavorite")]
    pub is_favorite: bool,
}

impl Podcast {
    /// Format the podcast for display in list rows.
    pub fn to_display(&self) -> String {
        match self.episode_count {
            Some(n) => format!("{} — {} ({} eps)", self.title, self.author, n),
            None => format!("{} — {}", self.title, self.author),
        }
    }

    /// Best available artwork URL.
    pub fn artwork_url(&self) -> &str {
        if self.artwork.is_empty() {
            &self.image
        } else {
            &self.artwork
        }
    }
}

/// A raw episode record as returned by `/episodes/byfeedid`.
///
/// Converted to [`Episode`] by the detail browser, which supplies the
/// owning podcast's title and fallback image.
#[derive(Clone, Debug, Deserialize)]
pub struct RawEpisode {
    /// Unique episode identifier.
    pub id: u64,

    /// Episode title.
    #[serde(default)]
    pub title: String,

    /// URL of the audio enclosure.
    #[serde(default, rename = "enclosureUrl")]
    pub enclosure_url: String,

    /// Unix publish timestamp.
    #[serde(default, rename = "datePublished")]
    pub date_published: i64,

    /// Duration in seconds, zero when the feed does not report one.
    #[serde(default)]
    pub duration: u64,

    /// Episode-level image URL.
    #[serde(default)]
    pub image: String,
}

/// One page of episodes from the remote client, de-duplicated by id.
#[derive(Clone, Debug)]
pub struct EpisodePage {
    /// Episodes with unique ids, in server order.
    pub episodes: Vec<RawEpisode>,
    /// Minimum publish timestamp across the raw page; the next pagination
    /// cursor. None when the page was empty.
    pub oldest_timestamp: Option<i64>,
    /// Server-reported total for the feed, not the de-duplicated length.
    pub total_count: u64,
}

/// An episode of a podcast, ready for display and playback.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode {
    /// Unique episode identifier.
    pub id: u64,

    /// Episode title.
    pub title: String,

    /// URL of the audio enclosure.
    pub enclosure_url: String,

    /// Title of the owning podcast.
    pub podcast_title: String,

    /// Image URL (episode image or the podcast's artwork).
    pub image: String,

    /// Duration in seconds, if known.
    pub duration: Option<u64>,

    /// Unix publish timestamp.
    pub date_published: i64,
}

impl Episode {
    /// Format the episode for display in list rows.
    pub fn to_display(&self) -> String {
        match self.duration {
            Some(secs) if secs > 0 => {
                format!("{} [{}]", self.title, format_duration(secs))
            }
            _ => self.title.clone(),
        }
    }
}

/// Format a duration in seconds as `h:mm:ss` or `m:ss`.
pub fn format_duration(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Format a playback position in (possibly fractional) seconds.
pub fn format_position(secs: f64) -> String {
    format_duration(secs.max(0.0) as u64)
}

/// Humanize the age of a unix timestamp relative to `now` ("3d ago").
pub fn format_age(published: i64, now: i64) -> String {
    let delta = now.saturating_sub(published);
    if delta < 0 || published <= 0 {
        return String::new();
    }
    match delta {
        d if d < 3600 => format!("{}m ago", d / 60),
        d if d < 86_400 => format!("{}h ago", d / 3600),
        d if d < 365 * 86_400 => format!("{}d ago", d / 86_400),
        d => format!("{}y ago", d / (365 * 86_400)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_podcast_to_display_with_count() {
        let podcast = Podcast {
            id: 1,
            title: "Test Cast".to_string(),
            author: "Jane".to_string(),
            episode_count: Some(42),
            ..Default::default()
        };
        assert_eq!(podcast.to_display(), "Test Cast — Jane (42 eps)");
    }

    #[test]
    fn test_podcast_to_display_without_count() {
        let podcast = Podcast {
            id: 1,
            title: "Test Cast".to_string(),
            author: "Jane".to_string(),
            ..Default::default()
        };
        assert_eq!(podcast.to_display(), "Test Cast — Jane");
    }

    #[test]
    fn test_artwork_fallback() {
        let podcast = Podcast {
            id: 1,
            image: "https://example.com/i.jpg".to_string(),
            ..Default::default()
        };
        assert_eq!(podcast.artwork_url(), "https://example.com/i.jpg");
    }

    #[test]
    fn test_podcast_deserializes_camel_case() {
        let json = r#"{
            "id": 920666,
            "title": "Some Cast",
            "author": "A. Host",
            "contentType": "application/rss+xml",
            "episodeCount": 12,
            "lastUpdateTime": 1700000000
        }"#;
        let podcast: Podcast = serde_json::from_str(json).unwrap();
        assert_eq!(podcast.id, 920666);
        assert_eq!(podcast.content_type, "application/rss+xml");
        assert_eq!(podcast.episode_count, Some(12));
        assert!(!podcast.is_favorite);
    }

    #[test]
    fn test_episode_to_display() {
        let ep = Episode {
            id: 1,
            title: "Pilot".to_string(),
            enclosure_url: "https://example.com/1.mp3".to_string(),
            podcast_title: "Test Cast".to_string(),
            image: String::new(),
            duration: Some(3725),
            date_published: 0,
        };
        assert_eq!(ep.to_display(), "Pilot [1:02:05]");
    }

    #[test]
    fn test_episode_to_display_unknown_duration() {
        let ep = Episode {
            id: 1,
            title: "Pilot".to_string(),
            enclosure_url: String::new(),
            podcast_title: String::new(),
            image: String::new(),
            duration: None,
            date_published: 0,
        };
        assert_eq!(ep.to_display(), "Pilot");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3600), "1:00:00");
    }

    #[test]
    fn test_format_age() {
        let now = 1_700_000_000;
        assert_eq!(format_age(now - 120, now), "2m ago");
        assert_eq!(format_age(now - 7200, now), "2h ago");
        assert_eq!(format_age(now - 3 * 86_400, now), "3d ago");
        assert_eq!(format_age(now - 2 * 365 * 86_400, now), "2y ago");
        assert_eq!(format_age(0, now), "");
    }
}
