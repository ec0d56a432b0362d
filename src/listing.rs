//! Podcast listing controller.
//!
//! Merges the paginated trending feed, debounced search results, and the
//! favorites store into one displayed list keyed by the active tab. The
//! controller itself performs no I/O: it hands request descriptors to the
//! caller ([`LoadMore::FetchPage`], [`Listing::due_query`]) and has fetch
//! completions fed back in.

use crate::api::TRENDING_PAGE_SIZE;
use crate::favorites::{with_favorite_status, FavoritesStore};
use crate::types::Podcast;
use log::debug;
use std::time::{Duration, Instant};

/// Items revealed per load-more trigger, and the initial reveal count.
pub const REVEAL_STEP: usize = 20;

/// Quiet period before a typed query is dispatched.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// The active listing tab. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Trending,
    Favorites,
    Search,
}

/// Outcome of a load-more trigger on the trending list.
#[derive(Debug, PartialEq, Eq)]
pub enum LoadMore {
    /// More already-downloaded items were revealed; no request needed.
    Revealed,
    /// The caller should fetch the next trending page at this cursor.
    FetchPage { since: u64 },
    /// Nothing to reveal and no further page exists (or one is in flight).
    Idle,
}

/// State machine over the three podcast sources.
pub struct Listing {
    /// Active tab.
    pub tab: Tab,
    /// Downloaded trending pages, in fetch order.
    pages: Vec<Vec<Podcast>>,
    /// How many downloaded trending items are revealed to the UI.
    pub display_count: usize,
    /// Whether the server may have another trending page.
    has_next_page: bool,
    /// In-flight guard for trending page fetches.
    is_fetching_page: bool,
    /// User-visible trending failure, if any.
    pub trending_error: Option<String>,
    /// `since` offset for the first trending page.
    since_base: u64,

    /// Raw search box contents.
    pub search_input: String,
    /// When the search box last changed.
    last_edit: Option<Instant>,
    /// The query most recently dispatched to the remote client. Completions
    /// for any other query are stale and discarded.
    dispatched_query: Option<String>,
    /// Current result set; None before the first completed search.
    search_results: Option<Vec<Podcast>>,
    /// Whether a dispatched search has not completed yet.
    pub is_searching: bool,
}

impl Listing {
    /// Create a listing opened on the trending tab.
    pub fn new(since_base: u64) -> Self {
        Self {
            tab: Tab::Trending,
            pages: Vec::new(),
            display_count: REVEAL_STEP,
            has_next_page: true,
            is_fetching_page: false,
            trending_error: None,
            since_base,
            search_input: String::new(),
            last_edit: None,
            dispatched_query: None,
            search_results: None,
            is_searching: false,
        }
    }

    /// Total trending items downloaded so far.
    pub fn downloaded_len(&self) -> usize {
        self.pages.iter().map(|p| p.len()).sum()
    }

    fn downloaded(&self) -> Vec<Podcast> {
        self.pages.iter().flatten().cloned().collect()
    }

    /// Whether the very first trending page is still loading.
    pub fn is_loading_trending(&self) -> bool {
        self.pages.is_empty() && self.is_fetching_page
    }

    /// Cursor for the next trending page, or None if a fetch is already in
    /// flight or no further page exists. Marks the fetch as in flight.
    pub fn request_trending_page(&mut self) -> Option<u64> {
        if self.is_fetching_page || !self.has_next_page {
            return None;
        }
        self.is_fetching_page = true;
        Some(self.since_base + self.downloaded_len() as u64)
    }

    /// Load-more trigger for the trending list (the scroll sentinel).
    ///
    /// Reveals up to [`REVEAL_STEP`] more already-downloaded items first;
    /// only once everything downloaded is revealed does it request another
    /// remote page.
    pub fn load_more(&mut self) -> LoadMore {
        if self.tab != Tab::Trending {
            return LoadMore::Idle;
        }

        let downloaded = self.downloaded_len();
        if self.display_count < downloaded {
            self.display_count = (self.display_count + REVEAL_STEP).min(downloaded);
            debug!("Revealed {} of {} trending items", self.display_count, downloaded);
            return LoadMore::Revealed;
        }

        match self.request_trending_page() {
            Some(since) => LoadMore::FetchPage { since },
            None => LoadMore::Idle,
        }
    }

    /// Apply a completed trending page fetch. The cursor and the in-flight
    /// guard only advance here, never at request time.
    pub fn apply_trending_page(&mut self, page: Vec<Podcast>) {
        self.is_fetching_page = false;
        self.trending_error = None;
        self.has_next_page = page.len() as u32 == TRENDING_PAGE_SIZE;
        if !page.is_empty() {
            self.pages.push(page);
        }
    }

    /// Record a failed trending page fetch as the user-visible error state.
    pub fn trending_failed(&mut self, message: String) {
        self.is_fetching_page = false;
        self.trending_error = Some(message);
    }

    /// Update the search box text. A non-empty query switches to the search
    /// tab; an empty one clears results and returns to trending.
    pub fn set_query(&mut self, text: &str, now: Instant) {
        self.search_input = text.to_string();
        self.last_edit = Some(now);

        if self.search_input.trim().is_empty() {
            if self.tab == Tab::Search {
                self.tab = Tab::Trending;
            }
            self.search_results = None;
            self.dispatched_query = None;
            self.is_searching = false;
        } else if self.tab != Tab::Search {
            self.tab = Tab::Search;
        }
    }

    /// Return the trimmed query once the debounce quiet period has elapsed
    /// and it differs from the last dispatched one. The returned query
    /// becomes the current token against which completions are matched.
    pub fn due_query(&mut self, now: Instant) -> Option<String> {
        let trimmed = self.search_input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let last_edit = self.last_edit?;
        if now.duration_since(last_edit) < SEARCH_DEBOUNCE {
            return None;
        }
        if self.dispatched_query.as_deref() == Some(trimmed) {
            return None;
        }

        let query = trimmed.to_string();
        self.dispatched_query = Some(query.clone());
        self.search_results = None;
        self.is_searching = true;
        Some(query)
    }

    /// Apply a completed search. Responses whose query does not match the
    /// currently dispatched one are stale and ignored (latest token wins).
    pub fn apply_search_results(&mut self, query: &str, results: Vec<Podcast>) {
        if self.dispatched_query.as_deref() != Some(query) {
            debug!("Discarding stale search response for '{}'", query);
            return;
        }
        self.search_results = Some(results);
        self.is_searching = false;
    }

    /// A failed search degrades to an empty result set, never an error.
    pub fn search_failed(&mut self, query: &str) {
        self.apply_search_results(query, Vec::new());
    }

    /// Switch the active tab, resetting search state and (when returning to
    /// trending) the reveal counter. No-op when the tab is already active.
    pub fn change_tab(&mut self, tab: Tab) {
        if self.tab == tab {
            return;
        }

        self.search_input.clear();
        self.last_edit = None;
        self.dispatched_query = None;
        self.search_results = None;
        self.is_searching = false;
        self.tab = tab;

        if tab == Tab::Trending {
            self.display_count = REVEAL_STEP;
        }
    }

    /// Toggle favorite status for a podcast id.
    ///
    /// The podcast is located in the union of current search results, all
    /// downloaded trending pages, and the current favorites; an unknown id
    /// is a silent no-op.
    pub fn toggle_favorite(&self, id: u64, store: &FavoritesStore) {
        let found = self
            .search_results
            .iter()
            .flatten()
            .chain(self.pages.iter().flatten())
            .find(|p| p.id == id)
            .cloned()
            .or_else(|| store.load().into_iter().find(|p| p.id == id));

        let Some(podcast) = found else {
            debug!("toggle_favorite: id {} not present in any source", id);
            return;
        };

        if store.is_favorite(id) {
            store.remove(id);
        } else {
            store.add(&podcast);
        }
    }

    /// The list to display for the active tab, with favorite status
    /// recomputed from the store at this read boundary.
    pub fn displayed(&self, store: &FavoritesStore) -> Vec<Podcast> {
        match self.tab {
            Tab::Search => {
                if self.is_searching {
                    return Vec::new();
                }
                let results = self.search_results.clone().unwrap_or_default();
                with_favorite_status(results, store)
            }
            Tab::Trending => {
                let mut list = with_favorite_status(self.downloaded(), store);
                list.truncate(self.display_count);
                list
            }
            Tab::Favorites => store.load(),
        }
    }
}
