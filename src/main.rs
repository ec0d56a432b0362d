//! Main entry point for the poddeck terminal podcast client.

use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info, warn};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use poddeck::api::{PodcastClient, TRENDING_PAGE_SIZE};
use poddeck::config::Config;
use poddeck::detail::EpisodeBrowser;
use poddeck::error::AppError;
use poddeck::favorites::FavoritesStore;
use poddeck::listing::Listing;
use poddeck::playback::{Player, PlayerUpdate};
use poddeck::tui::{draw, poll_event, Action, App};
use poddeck::types::{Episode, EpisodePage, Podcast};

/// Command-line arguments for the poddeck application.
#[derive(Parser, Debug)]
#[command(
    name = "poddeck",
    version,
    about = "A terminal podcast client",
    long_about = "Browse trending podcasts, search the Podcast Index, and play episodes from a TUI."
)]
struct Args {
    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1)]
    log: u8,

    /// Audio player binary to use (overrides config, defaults to mpv)
    #[arg(short, long)]
    player: Option<String>,
}

/// Search for an executable in the system PATH.
///
/// Absolute paths and paths with separators are checked directly.
fn find_in_path<P: AsRef<Path>>(exe_name: P) -> Option<PathBuf> {
    let exe_path = exe_name.as_ref();

    if exe_path.is_absolute()
        || exe_path
            .to_string_lossy()
            .contains(std::path::MAIN_SEPARATOR)
    {
        if exe_path.is_file() {
            return Some(exe_path.to_path_buf());
        }
        return None;
    }

    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths).find_map(|dir| {
            let full_path = dir.join(&exe_name);
            if full_path.is_file() {
                Some(full_path)
            } else {
                None
            }
        })
    })
}

/// The result of one background fetch, delivered to the event loop.
enum FetchOutcome {
    Trending(Result<Vec<Podcast>, AppError>),
    Search {
        query: String,
        outcome: Result<Vec<Podcast>, AppError>,
    },
    Episodes {
        feed_id: u64,
        outcome: Result<EpisodePage, AppError>,
    },
}

fn spawn_trending(client: Arc<PodcastClient>, since: u64, tx: mpsc::Sender<FetchOutcome>) {
    tokio::spawn(async move {
        let outcome = client.fetch_trending(since, TRENDING_PAGE_SIZE).await;
        let _ = tx.send(FetchOutcome::Trending(outcome)).await;
    });
}

fn spawn_search(client: Arc<PodcastClient>, query: String, tx: mpsc::Sender<FetchOutcome>) {
    tokio::spawn(async move {
        let outcome = client.search(&query).await;
        let _ = tx.send(FetchOutcome::Search { query, outcome }).await;
    });
}

fn spawn_episode_fetch(
    client: Arc<PodcastClient>,
    feed_id: u64,
    since: Option<i64>,
    max: u32,
    tx: mpsc::Sender<FetchOutcome>,
) {
    tokio::spawn(async move {
        let outcome = client.fetch_episodes_by_feed(feed_id, since, max).await;
        let _ = tx.send(FetchOutcome::Episodes { feed_id, outcome }).await;
    });
}

/// Initialize the terminal for TUI rendering.
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    // Load config
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });

    // Credentials must be present before the terminal is taken over
    let (api_key, api_secret) = match config.credentials() {
        Ok(creds) => creds,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!(
                "       Set api_key/api_secret in the config file or the\n       \
                 PODCAST_INDEX_API_KEY / PODCAST_INDEX_API_SECRET environment variables."
            );
            std::process::exit(1);
        }
    };

    let client = Arc::new(PodcastClient::new(api_key, api_secret)?);

    let favorites_path = match FavoritesStore::default_path() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let store = FavoritesStore::new(favorites_path);

    let player_binary = args.player.clone().or_else(|| config.player.clone());
    let player_name = player_binary.as_deref().unwrap_or("mpv");
    if find_in_path(player_name).is_none() {
        eprintln!("Error: {} not found in PATH.", player_name);
        std::process::exit(1);
    }
    info!("Using audio player: {}", player_name);

    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchOutcome>(16);
    let (update_tx, update_rx) = mpsc::channel::<PlayerUpdate>(64);
    let mut player = Player::new(player_binary, update_tx);

    let mut app = App::new(Listing::new(config.trending_since), store);

    // Kick off the first trending page before the first frame
    if let Some(since) = app.listing.request_trending_page() {
        spawn_trending(client.clone(), since, fetch_tx.clone());
    }

    let mut terminal = init_terminal()?;

    let result = run_app(
        &mut terminal,
        &mut app,
        client,
        &mut player,
        fetch_tx,
        fetch_rx,
        update_rx,
    )
    .await;

    player.shutdown().await;
    restore_terminal()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: Arc<PodcastClient>,
    player: &mut Player,
    fetch_tx: mpsc::Sender<FetchOutcome>,
    mut fetch_rx: mpsc::Receiver<FetchOutcome>,
    mut update_rx: mpsc::Receiver<PlayerUpdate>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Draw UI
        terminal.draw(|f| draw(f, app))?;

        // Poll for events
        if let Some(event) = poll_event(Duration::from_millis(100))? {
            if let Event::Key(key) = event {
                let action = app.handle_input(key);

                match action {
                    Action::Quit => break,
                    Action::FetchTrendingPage(since) => {
                        spawn_trending(client.clone(), since, fetch_tx.clone());
                    }
                    Action::OpenDetail(podcast) => {
                        let browser = EpisodeBrowser::open(podcast, &app.store);
                        app.overlays.open_detail(browser);
                        app.episode_list_state.select(None);
                        request_episode_page(app, &client, &fetch_tx);
                    }
                    Action::FetchMoreEpisodes => {
                        request_episode_page(app, &client, &fetch_tx);
                    }
                    Action::Play(episode) => {
                        start_playback(app, player, episode).await;
                    }
                    Action::TogglePause => {
                        let pause = app.playback.is_playing;
                        if let Err(e) = player.set_pause(pause).await {
                            warn!("Pause failed: {}", e);
                        }
                    }
                    Action::StopPlayback => {
                        if let Err(e) = player.stop().await {
                            warn!("Stop failed: {}", e);
                        }
                        app.playback.clear();
                        app.overlays.close_playback();
                    }
                    Action::SeekBy(delta) => {
                        if let Err(e) = player.seek_relative(delta).await {
                            warn!("Seek failed: {}", e);
                        }
                    }
                    Action::None => {}
                }
            }
        }

        // Apply completed background fetches
        while let Ok(outcome) = fetch_rx.try_recv() {
            apply_fetch_outcome(app, outcome);
        }

        // Apply player state changes
        while let Ok(update) = update_rx.try_recv() {
            app.playback.apply(update);
        }

        // Dispatch a debounced search once the input has settled
        if let Some(query) = app.listing.due_query(Instant::now()) {
            spawn_search(client.clone(), query, fetch_tx.clone());
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Ask the open detail overlay for its next episode page and fetch it.
fn request_episode_page(
    app: &mut App,
    client: &Arc<PodcastClient>,
    fetch_tx: &mpsc::Sender<FetchOutcome>,
) {
    if let Some(browser) = app.overlays.detail.as_mut() {
        if let Some(req) = browser.next_request() {
            spawn_episode_fetch(
                client.clone(),
                req.feed_id,
                req.since,
                req.max,
                fetch_tx.clone(),
            );
        }
    }
}

fn apply_fetch_outcome(app: &mut App, outcome: FetchOutcome) {
    match outcome {
        FetchOutcome::Trending(Ok(page)) => {
            app.listing.apply_trending_page(page);
        }
        FetchOutcome::Trending(Err(e)) => {
            warn!("Trending fetch failed: {}", e);
            app.listing.trending_failed(e.to_string());
        }
        FetchOutcome::Search { query, outcome } => match outcome {
            Ok(results) => app.listing.apply_search_results(&query, results),
            Err(e) => {
                warn!("Search for '{}' failed: {}", query, e);
                app.listing.search_failed(&query);
            }
        },
        FetchOutcome::Episodes { feed_id, outcome } => {
            // A page for a feed whose overlay has closed is stale
            let Some(browser) = app.overlays.detail.as_mut() else {
                return;
            };
            if browser.podcast.id != feed_id {
                return;
            }
            match outcome {
                Ok(page) => browser.apply_page(page),
                Err(e) => {
                    warn!("Episode fetch for feed {} failed: {}", feed_id, e);
                    browser.page_failed();
                }
            }
        }
    }
}

async fn start_playback(app: &mut App, player: &mut Player, episode: Episode) {
    debug!("Playing: {}", episode.enclosure_url);
    let url = episode.enclosure_url.clone();

    app.playback.begin(episode);

    match player.play(&url).await {
        Ok(()) => app.playback.is_playing = true,
        Err(e) => {
            warn!("Playback failed: {}", e);
            app.playback.clear();
            app.error_message = Some(format!("Playback failed: {}", e));
        }
    }
}
