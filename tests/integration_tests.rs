//! Integration tests for poddeck.
//!
//! These tests verify the integration between different modules
//! using mock data where appropriate.

use poddeck::api::{auth_signature, build_episode_page, extract_error_detail};
use poddeck::config::Config;
use poddeck::detail::EpisodeBrowser;
use poddeck::favorites::{with_favorite_status, FavoritesStore};
use poddeck::listing::{Listing, LoadMore, Tab};
use poddeck::types::{format_duration, Episode, Podcast, RawEpisode};

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_store() -> FavoritesStore {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!(
        "poddeck-integration-test-{}-{}.json",
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_file(&path);
    FavoritesStore::new(path)
}

fn podcast(id: u64) -> Podcast {
    Podcast {
        id,
        title: format!("cast-{}", id),
        author: "Host".to_string(),
        ..Default::default()
    }
}

fn raw_episode(id: u64, published: i64) -> RawEpisode {
    serde_json::from_str(&format!(
        r#"{{"id": {}, "title": "ep-{}", "enclosureUrl": "https://example.com/{}.mp3",
            "datePublished": {}, "duration": 1800}}"#,
        id, id, id, published
    ))
    .unwrap()
}

/// Test that podcasts can be created and displayed correctly.
#[test]
fn test_podcast_display_integration() {
    let mut p = podcast(1);
    p.episode_count = Some(24);

    assert!(p.to_display().contains("cast-1"));
    assert!(p.to_display().contains("24 eps"));
}

/// Test episode display formatting.
#[test]
fn test_episode_display_integration() {
    let episode = Episode {
        id: 1,
        title: "Pilot".to_string(),
        enclosure_url: "https://example.com/1.mp3".to_string(),
        podcast_title: "Test Cast".to_string(),
        image: String::new(),
        duration: Some(1800),
        date_published: 0,
    };

    assert!(episode.to_display().contains("Pilot"));
    assert!(episode.to_display().contains(&format_duration(1800)));
}

/// Test config defaults.
#[test]
fn test_config_defaults() {
    let config = Config::new();

    assert!(config.api_key.is_empty());
    assert!(config.player.is_none());
    assert_eq!(config.trending_since, 0);
}

/// Test favorites round-trip through the JSON file.
#[test]
fn test_favorites_round_trip() {
    let store = temp_store();
    assert!(store.load().is_empty());

    store.add(&podcast(1));
    store.add(&podcast(2));
    store.add(&podcast(1)); // idempotent

    let favorites = store.load();
    assert_eq!(favorites.len(), 2);
    assert!(favorites.iter().all(|p| p.is_favorite));

    store.remove(1);
    assert!(!store.is_favorite(1));
    assert!(store.is_favorite(2));
}

/// Test that favorite status is recomputed when tagging a fetched list.
#[test]
fn test_favorite_tagging_integration() {
    let store = temp_store();
    store.add(&podcast(2));

    let tagged = with_favorite_status(vec![podcast(1), podcast(2)], &store);
    assert!(!tagged[0].is_favorite);
    assert!(tagged[1].is_favorite);
}

/// Test the full trending flow: fetch, reveal, fetch again.
#[test]
fn test_trending_reveal_and_pagination_flow() {
    let mut listing = Listing::new(0);

    let since = listing.request_trending_page().unwrap();
    assert_eq!(since, 0);
    listing.apply_trending_page((0..40).map(podcast).collect());

    // First 20 shown, next trigger reveals the rest of the page.
    let store = temp_store();
    assert_eq!(listing.displayed(&store).len(), 20);
    assert_eq!(listing.load_more(), LoadMore::Revealed);
    assert_eq!(listing.displayed(&store).len(), 40);

    // Everything revealed, so the next trigger asks for page two.
    assert_eq!(listing.load_more(), LoadMore::FetchPage { since: 40 });
    listing.apply_trending_page((40..57).map(podcast).collect());

    // A short page ends pagination once revealed.
    assert_eq!(listing.load_more(), LoadMore::Revealed);
    assert_eq!(listing.displayed(&store).len(), 57);
    assert_eq!(listing.load_more(), LoadMore::Idle);
}

/// Test that a late response for an older query never overwrites the
/// results of the newest one.
#[test]
fn test_search_staleness_integration() {
    let mut listing = Listing::new(0);
    let t0 = Instant::now();

    listing.set_query("fir", t0);
    let first = listing.due_query(t0 + Duration::from_millis(600)).unwrap();

    listing.set_query("first", t0 + Duration::from_millis(700));
    let second = listing.due_query(t0 + Duration::from_millis(1300)).unwrap();

    listing.apply_search_results(&second, vec![podcast(2)]);
    listing.apply_search_results(&first, vec![podcast(1)]);

    let store = temp_store();
    let shown = listing.displayed(&store);
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, 2);
}

/// Test that switching tabs drops search state and resets the reveal count.
#[test]
fn test_tab_switch_integration() {
    let mut listing = Listing::new(0);
    listing.apply_trending_page((0..40).map(podcast).collect());
    listing.load_more();
    assert_eq!(listing.display_count, 40);

    let t0 = Instant::now();
    listing.set_query("rust", t0);
    assert_eq!(listing.tab, Tab::Search);

    listing.change_tab(Tab::Trending);
    assert!(listing.search_input.is_empty());
    assert_eq!(listing.display_count, 20);
}

/// Test episode page assembly: oldest timestamp, totals, de-duplication.
#[test]
fn test_episode_page_accounting() {
    let items = vec![
        raw_episode(1, 300),
        raw_episode(2, 100),
        raw_episode(2, 100),
        raw_episode(3, 200),
    ];
    let page = build_episode_page(items, 250);

    assert_eq!(page.episodes.len(), 3);
    assert_eq!(page.oldest_timestamp, Some(100));
    // The server total wins over the de-duplicated length.
    assert_eq!(page.total_count, 250);
}

/// Test the detail browser against pages built by the api module.
#[test]
fn test_detail_browser_integration() {
    let store = temp_store();
    let mut browser = EpisodeBrowser::open(podcast(9), &store);

    let first = browser.next_request().unwrap();
    assert_eq!(first.since, None);
    assert_eq!(first.max, 1000);

    browser.apply_page(build_episode_page(
        vec![raw_episode(1, 300), raw_episode(2, 100)],
        50,
    ));
    assert_eq!(browser.episodes.len(), 2);
    assert_eq!(browser.total_count, Some(50));
    assert_eq!(browser.episodes[0].podcast_title, "cast-9");

    let second = browser.next_request().unwrap();
    assert_eq!(second.since, Some(99));
    assert_eq!(second.max, 100);

    // A page of already-known episodes ends pagination.
    browser.apply_page(build_episode_page(vec![raw_episode(2, 100)], 50));
    assert_eq!(browser.episodes.len(), 2);
    assert!(!browser.has_more);
}

/// Test request signature shape and determinism.
#[test]
fn test_auth_signature_integration() {
    let a = auth_signature("key", "secret", 1_700_000_000);
    let b = auth_signature("key", "secret", 1_700_000_000);
    let c = auth_signature("key", "secret", 1_700_000_001);

    assert_eq!(a.len(), 40);
    assert!(a.chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
    assert_eq!(a, b);
    assert_ne!(a, c);
}

/// Test API error detail extraction fallbacks.
#[test]
fn test_error_detail_extraction() {
    let status = reqwest::StatusCode::UNAUTHORIZED;

    let detail = extract_error_detail(status, r#"{"description": "Invalid key"}"#);
    assert_eq!(detail, "Invalid key");

    let detail = extract_error_detail(status, "plain failure text");
    assert_eq!(detail, "plain failure text");

    let detail = extract_error_detail(status, "");
    assert_eq!(detail, "Unauthorized");
}
