//! Detail and playback overlays.
//!
//! Two independent overlays may be open at once: a detail overlay showing
//! one podcast's description plus its incrementally paginated episode
//! list, and a playback overlay showing transport controls. Keyboard input
//! goes to the topmost open overlay, and a focus ring cycles that
//! overlay's controls with Tab/Shift+Tab so focus never escapes it.

use crate::favorites::FavoritesStore;
use crate::types::{Episode, EpisodePage, Podcast};
use log::debug;
use std::collections::HashSet;

/// Size of the first episode page for a feed.
pub const INITIAL_EPISODE_PAGE: u32 = 1000;

/// Size of every follow-up episode page.
pub const EPISODE_PAGE_SIZE: u32 = 100;

/// Descriptor for the next episode fetch of one feed.
#[derive(Debug, PartialEq, Eq)]
pub struct EpisodeRequest {
    pub feed_id: u64,
    /// Upper bound: items strictly older than the running oldest timestamp.
    pub since: Option<i64>,
    pub max: u32,
}

/// Episode pagination state for one feed, scoped to the detail overlay.
pub struct EpisodeBrowser {
    /// The podcast whose feed is being browsed.
    pub podcast: Podcast,
    /// Favorite status snapshotted from the store when the overlay opened.
    pub is_favorite: bool,
    /// Accumulated episodes, unique by id, newest first.
    pub episodes: Vec<Episode>,
    /// Server-reported feed total, captured from the first page.
    pub total_count: Option<u64>,
    /// Whether another page may exist.
    pub has_more: bool,
    oldest_timestamp: Option<i64>,
    is_loading: bool,
}

impl EpisodeBrowser {
    /// Open a browser for a podcast, snapshotting its favorite status.
    pub fn open(podcast: Podcast, store: &FavoritesStore) -> Self {
        let is_favorite = store.is_favorite(podcast.id);
        Self {
            podcast,
            is_favorite,
            episodes: Vec::new(),
            total_count: None,
            has_more: true,
            oldest_timestamp: None,
            is_loading: false,
        }
    }

    /// Whether a page fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Descriptor for the next page, or None while a fetch is in flight or
    /// the feed is exhausted. Marks the fetch as in flight.
    ///
    /// The first page asks for up to [`INITIAL_EPISODE_PAGE`] items; later
    /// pages ask for [`EPISODE_PAGE_SIZE`] items strictly older than the
    /// running oldest timestamp.
    pub fn next_request(&mut self) -> Option<EpisodeRequest> {
        if self.is_loading || !self.has_more {
            return None;
        }
        self.is_loading = true;

        Some(match self.oldest_timestamp {
            None => EpisodeRequest {
                feed_id: self.podcast.id,
                since: None,
                max: INITIAL_EPISODE_PAGE,
            },
            Some(oldest) => EpisodeRequest {
                feed_id: self.podcast.id,
                since: Some(oldest - 1),
                max: EPISODE_PAGE_SIZE,
            },
        })
    }

    /// Apply a fetched page: de-duplicate against the accumulated list and
    /// stop paginating once a page contributes nothing new.
    pub fn apply_page(&mut self, page: EpisodePage) {
        self.is_loading = false;

        if page.episodes.is_empty() {
            self.has_more = false;
            return;
        }

        if self.total_count.is_none() {
            self.total_count = Some(page.total_count);
        }

        let held: HashSet<u64> = self.episodes.iter().map(|e| e.id).collect();
        let fresh: Vec<Episode> = page
            .episodes
            .into_iter()
            .filter(|ep| !held.contains(&ep.id))
            .map(|ep| {
                let image = if ep.image.is_empty() {
                    self.podcast.artwork_url().to_string()
                } else {
                    ep.image
                };
                Episode {
                    id: ep.id,
                    title: ep.title,
                    enclosure_url: ep.enclosure_url,
                    podcast_title: self.podcast.title.clone(),
                    image,
                    duration: (ep.duration > 0).then_some(ep.duration),
                    date_published: ep.date_published,
                }
            })
            .collect();

        if fresh.is_empty() {
            debug!("Feed {}: page contributed no new episodes", self.podcast.id);
            self.has_more = false;
            return;
        }

        self.episodes.extend(fresh);
        self.oldest_timestamp = page.oldest_timestamp;
    }

    /// A failed page fetch stops further pagination for this overlay.
    pub fn page_failed(&mut self) {
        self.is_loading = false;
        self.has_more = false;
    }

    /// Flip the local favorite snapshot (the store itself is toggled by
    /// the listing controller).
    pub fn flip_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
    }
}

/// Focusable controls of the detail overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailControl {
    Close,
    Favorite,
    Episodes,
}

/// Focusable controls of the playback overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackControl {
    PlayPause,
    SeekBack,
    SeekForward,
    Stop,
    Close,
}

/// A cyclic focus order over a fixed set of controls.
pub struct FocusRing<T: Copy> {
    controls: Vec<T>,
    index: usize,
}

impl<T: Copy> FocusRing<T> {
    pub fn new(controls: Vec<T>) -> Self {
        Self { controls, index: 0 }
    }

    pub fn current(&self) -> T {
        self.controls[self.index]
    }

    /// Advance focus (Tab), wrapping at the end.
    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.controls.len();
    }

    /// Move focus backwards (Shift+Tab), wrapping at the start.
    pub fn prev(&mut self) {
        self.index = (self.index + self.controls.len() - 1) % self.controls.len();
    }
}

/// Which overlay is topmost for input routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayKind {
    Detail,
    Playback,
}

/// The overlay stack: at most one detail and one playback overlay, open
/// and closed independently of each other.
pub struct Overlays {
    pub detail: Option<EpisodeBrowser>,
    pub playback_open: bool,
    pub detail_focus: FocusRing<DetailControl>,
    pub playback_focus: FocusRing<PlaybackControl>,
}

impl Overlays {
    pub fn new() -> Self {
        Self {
            detail: None,
            playback_open: false,
            detail_focus: Self::fresh_detail_focus(),
            playback_focus: Self::fresh_playback_focus(),
        }
    }

    fn fresh_detail_focus() -> FocusRing<DetailControl> {
        FocusRing::new(vec![
            DetailControl::Episodes,
            DetailControl::Favorite,
            DetailControl::Close,
        ])
    }

    fn fresh_playback_focus() -> FocusRing<PlaybackControl> {
        FocusRing::new(vec![
            PlaybackControl::PlayPause,
            PlaybackControl::SeekBack,
            PlaybackControl::SeekForward,
            PlaybackControl::Stop,
            PlaybackControl::Close,
        ])
    }

    /// Open the detail overlay for a podcast, resetting its focus ring.
    pub fn open_detail(&mut self, browser: EpisodeBrowser) {
        self.detail_focus = Self::fresh_detail_focus();
        self.detail = Some(browser);
    }

    /// Close the detail overlay; the playback overlay is unaffected.
    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Open the playback overlay, resetting its focus ring. Starting the
    /// actual playback is the caller's side effect.
    pub fn open_playback(&mut self) {
        self.playback_focus = Self::fresh_playback_focus();
        self.playback_open = true;
    }

    /// Close the playback overlay; the detail overlay is unaffected.
    pub fn close_playback(&mut self) {
        self.playback_open = false;
    }

    /// The overlay that receives keyboard input, playback above detail.
    pub fn topmost(&self) -> Option<OverlayKind> {
        if self.playback_open {
            Some(OverlayKind::Playback)
        } else if self.detail.is_some() {
            Some(OverlayKind::Detail)
        } else {
            None
        }
    }
}

impl Default for Overlays {
    fn default() -> Self {
        Self::new()
    }
}
