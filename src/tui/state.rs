//! Application state management and input handling.

use crate::detail::{DetailControl, OverlayKind, Overlays, PlaybackControl};
use crate::favorites::FavoritesStore;
use crate::listing::{Listing, LoadMore, Tab};
use crate::playback::PlaybackState;
use crate::types::Podcast;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::time::Instant;

use super::types::Action;

/// How close to the end of a list the selection gets before more items
/// are requested.
const LOAD_AHEAD: usize = 5;

/// How far a seek key jumps, in seconds.
const SEEK_STEP: f64 = 10.0;

/// Application state for the TUI.
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,
    /// Tabbed podcast listing (trending, favorites, search)
    pub listing: Listing,
    /// Persistent favorites
    pub store: FavoritesStore,
    /// Detail and playback overlays
    pub overlays: Overlays,
    /// Current playback position and episode
    pub playback: PlaybackState,
    /// Whether the search bar has keyboard focus
    pub search_focused: bool,
    /// Selection state for the podcast list
    pub list_state: ListState,
    /// Selection state for the episode list in the detail overlay
    pub episode_list_state: ListState,
    /// Whether help modal is shown
    pub show_help: bool,
    /// Error message to display, for failures outside the listing
    pub error_message: Option<String>,
}

impl App {
    pub fn new(listing: Listing, store: FavoritesStore) -> Self {
        Self {
            should_quit: false,
            listing,
            store,
            overlays: Overlays::new(),
            playback: PlaybackState::new(),
            search_focused: false,
            list_state: ListState::default(),
            episode_list_state: ListState::default(),
            show_help: false,
            error_message: None,
        }
    }

    /// The podcasts currently visible for the active tab.
    pub fn visible(&self) -> Vec<Podcast> {
        self.listing.displayed(&self.store)
    }

    fn selected_podcast(&self) -> Option<Podcast> {
        let visible = self.visible();
        self.list_state
            .selected()
            .and_then(|i| visible.get(i).cloned())
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.listing.change_tab(tab);
        self.list_state.select(None);
    }

    /// Handle keyboard input and return an action.
    pub fn handle_input(&mut self, key: KeyEvent) -> Action {
        // Global quit with Ctrl+C or Ctrl+Q
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => {
                    self.should_quit = true;
                    return Action::Quit;
                }
                _ => {}
            }
        }

        // Handle help modal
        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return Action::None;
        }

        if key.code == KeyCode::Char('?') && !self.search_focused {
            self.show_help = true;
            return Action::None;
        }

        if self.search_focused {
            return self.handle_search_bar_input(key);
        }

        // Input goes to the topmost open overlay
        match self.overlays.topmost() {
            Some(OverlayKind::Playback) => self.handle_playback_input(key),
            Some(OverlayKind::Detail) => self.handle_detail_input(key),
            None => self.handle_list_input(key),
        }
    }

    fn handle_search_bar_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char(c) => {
                let mut text = self.listing.search_input.clone();
                text.push(c);
                self.listing.set_query(&text, Instant::now());
                self.list_state.select(None);
            }
            KeyCode::Backspace => {
                let mut text = self.listing.search_input.clone();
                text.pop();
                self.listing.set_query(&text, Instant::now());
                self.list_state.select(None);
            }
            KeyCode::Esc => {
                self.listing.set_query("", Instant::now());
                self.search_focused = false;
                self.list_state.select(None);
            }
            KeyCode::Enter | KeyCode::Tab => {
                self.search_focused = false;
            }
            _ => {}
        }
        Action::None
    }

    fn handle_list_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('/') => {
                self.search_focused = true;
                Action::None
            }
            KeyCode::Tab => {
                let next = match self.listing.tab {
                    Tab::Trending => Tab::Favorites,
                    Tab::Favorites => Tab::Search,
                    Tab::Search => Tab::Trending,
                };
                self.switch_tab(next);
                Action::None
            }
            KeyCode::Char('1') => {
                self.switch_tab(Tab::Trending);
                Action::None
            }
            KeyCode::Char('2') => {
                self.switch_tab(Tab::Favorites);
                Action::None
            }
            KeyCode::Char('3') => {
                self.switch_tab(Tab::Search);
                Action::None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let i = self.list_state.selected().unwrap_or(0);
                if i > 0 {
                    self.list_state.select(Some(i - 1));
                }
                Action::None
            }
            KeyCode::Char('j') | KeyCode::Down => self.select_next_podcast(),
            KeyCode::Enter => {
                if let Some(podcast) = self.selected_podcast() {
                    Action::OpenDetail(podcast)
                } else {
                    Action::None
                }
            }
            KeyCode::Char('f') => {
                if let Some(podcast) = self.selected_podcast() {
                    self.listing.toggle_favorite(podcast.id, &self.store);
                }
                Action::None
            }
            KeyCode::Char('p') => {
                if self.playback.current_episode.is_some() {
                    self.overlays.open_playback();
                }
                Action::None
            }
            KeyCode::Esc => {
                self.listing.trending_error = None;
                self.error_message = None;
                Action::None
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                Action::Quit
            }
            _ => Action::None,
        }
    }

    /// Move the selection down, revealing or fetching more trending items
    /// when the selection approaches the end of the visible list.
    fn select_next_podcast(&mut self) -> Action {
        let len = self.visible().len();
        if len == 0 {
            return Action::None;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.list_state.select(Some(i));

        if i + LOAD_AHEAD >= len {
            match self.listing.load_more() {
                LoadMore::FetchPage { since } => return Action::FetchTrendingPage(since),
                LoadMore::Revealed | LoadMore::Idle => {}
            }
        }
        Action::None
    }

    fn handle_detail_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                self.overlays.close_detail();
                self.episode_list_state.select(None);
                Action::None
            }
            KeyCode::Tab => {
                self.overlays.detail_focus.next();
                Action::None
            }
            KeyCode::BackTab => {
                self.overlays.detail_focus.prev();
                Action::None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                let i = self.episode_list_state.selected().unwrap_or(0);
                if i > 0 {
                    self.episode_list_state.select(Some(i - 1));
                }
                Action::None
            }
            KeyCode::Char('j') | KeyCode::Down => self.select_next_episode(),
            KeyCode::Char('f') => self.toggle_detail_favorite(),
            KeyCode::Enter => match self.overlays.detail_focus.current() {
                DetailControl::Episodes => self.play_selected_episode(),
                DetailControl::Favorite => self.toggle_detail_favorite(),
                DetailControl::Close => {
                    self.overlays.close_detail();
                    self.episode_list_state.select(None);
                    Action::None
                }
            },
            KeyCode::Char('q') => {
                self.should_quit = true;
                Action::Quit
            }
            _ => Action::None,
        }
    }

    fn select_next_episode(&mut self) -> Action {
        let Some(browser) = self.overlays.detail.as_ref() else {
            return Action::None;
        };
        let len = browser.episodes.len();
        if len == 0 {
            return Action::None;
        }
        let i = match self.episode_list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.episode_list_state.select(Some(i));

        if i + LOAD_AHEAD >= len && browser.has_more && !browser.is_loading() {
            return Action::FetchMoreEpisodes;
        }
        Action::None
    }

    fn toggle_detail_favorite(&mut self) -> Action {
        if let Some(browser) = self.overlays.detail.as_mut() {
            self.listing.toggle_favorite(browser.podcast.id, &self.store);
            browser.flip_favorite();
        }
        Action::None
    }

    fn play_selected_episode(&mut self) -> Action {
        let Some(browser) = self.overlays.detail.as_ref() else {
            return Action::None;
        };
        if let Some(episode) = self
            .episode_list_state
            .selected()
            .and_then(|i| browser.episodes.get(i).cloned())
        {
            self.overlays.open_playback();
            Action::Play(episode)
        } else {
            Action::None
        }
    }

    fn handle_playback_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => {
                // Close the overlay only; the audio keeps playing.
                self.overlays.close_playback();
                Action::None
            }
            KeyCode::Tab => {
                self.overlays.playback_focus.next();
                Action::None
            }
            KeyCode::BackTab => {
                self.overlays.playback_focus.prev();
                Action::None
            }
            KeyCode::Char(' ') => Action::TogglePause,
            KeyCode::Left => Action::SeekBy(-SEEK_STEP),
            KeyCode::Right => Action::SeekBy(SEEK_STEP),
            KeyCode::Char('s') => Action::StopPlayback,
            KeyCode::Enter => match self.overlays.playback_focus.current() {
                PlaybackControl::PlayPause => Action::TogglePause,
                PlaybackControl::SeekBack => Action::SeekBy(-SEEK_STEP),
                PlaybackControl::SeekForward => Action::SeekBy(SEEK_STEP),
                PlaybackControl::Stop => Action::StopPlayback,
                PlaybackControl::Close => {
                    self.overlays.close_playback();
                    Action::None
                }
            },
            KeyCode::Char('q') => {
                self.should_quit = true;
                Action::Quit
            }
            _ => Action::None,
        }
    }
}
