//! A terminal podcast client written in Rust.
//!
//! poddeck browses trending podcasts from the Podcast Index, searches the
//! index as you type, keeps a local list of favorite feeds, and plays
//! episodes through mpv.
//!
//! # Features
//!
//! - Trending list that loads more podcasts as you scroll
//! - Debounced search across the Podcast Index
//! - Favorites persisted to a local JSON file
//! - Podcast detail view with incrementally paginated episodes
//! - Episode playback with pause, seek, and a progress bar
//!
//! # Usage
//!
//! ```bash
//! # Requires Podcast Index API credentials, via config file or environment:
//! export PODCAST_INDEX_API_KEY=...
//! export PODCAST_INDEX_API_SECRET=...
//! cargo run
//! ```

pub mod api;
pub mod config;
pub mod detail;
pub mod error;
pub mod favorites;
pub mod listing;
pub mod playback;
pub mod tui;
pub mod types;
