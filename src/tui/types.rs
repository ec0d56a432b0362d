//! TUI type definitions for actions returned from input handling.

use crate::types::{Episode, Podcast};

/// Actions that can be returned from the TUI.
///
/// Actions carry the side effects the event loop must perform; pure state
/// changes are applied inside [`super::App`] directly.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action, continue running
    None,
    /// Quit the application
    Quit,
    /// Fetch the next trending page starting at the given offset
    FetchTrendingPage(u64),
    /// Open the detail overlay for a podcast
    OpenDetail(Podcast),
    /// Fetch the next episode page for the open detail overlay
    FetchMoreEpisodes,
    /// Start playing an episode
    Play(Episode),
    /// Toggle pause on the current episode
    TogglePause,
    /// Stop playback and unload the current episode
    StopPlayback,
    /// Seek by a relative number of seconds
    SeekBy(f64),
}
