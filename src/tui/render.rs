//! UI rendering functions for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::detail::{DetailControl, EpisodeBrowser, PlaybackControl};
use crate::listing::Tab;
use crate::types::{format_age, format_duration, format_position};

use super::state::App;

/// Draw the UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with tabs
            Constraint::Length(3), // Search bar
            Constraint::Min(0),    // Podcast list + details
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, app, chunks[0]);
    draw_search_bar(frame, app, chunks[1]);
    draw_podcasts(frame, app, chunks[2]);
    draw_footer(frame, app, chunks[3]);

    if app.overlays.detail.is_some() {
        draw_detail_overlay(frame, app);
    }
    if app.overlays.playback_open {
        draw_playback_overlay(frame, app);
    }

    if let Some(error) = app
        .listing
        .trending_error
        .as_deref()
        .or(app.error_message.as_deref())
    {
        draw_error_popup(frame, error);
    }

    if app.show_help {
        draw_help_modal(frame);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let selected = match app.listing.tab {
        Tab::Trending => 0,
        Tab::Favorites => 1,
        Tab::Search => 2,
    };

    let tabs = Tabs::new(vec!["Trending", "Favorites", "Search"])
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default().borders(Borders::ALL).title(Span::styled(
                "poddeck",
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            )),
        );

    frame.render_widget(tabs, area);
}

fn draw_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.search_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let search_text = if app.listing.search_input.is_empty() && !app.search_focused {
        "Press '/' to search..."
    } else {
        &app.listing.search_input
    };

    let search = Paragraph::new(search_text)
        .style(if app.search_focused {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search")
                .border_style(border_style),
        );

    frame.render_widget(search, area);

    if app.search_focused {
        frame.set_cursor_position((
            area.x + app.listing.search_input.len() as u16 + 1,
            area.y + 1,
        ));
    }
}

fn draw_podcasts(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.listing.is_loading_trending() || app.listing.is_searching {
        let message = if app.listing.is_searching {
            "Searching..."
        } else {
            "Loading trending podcasts..."
        };
        let loading = Paragraph::new(message)
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title("Podcasts"));
        frame.render_widget(loading, area);
        return;
    }

    let visible = app.visible();
    if visible.is_empty() {
        let message = match app.listing.tab {
            Tab::Trending => "No trending podcasts",
            Tab::Favorites => "No favorites yet. Press 'f' on a podcast to add one.",
            Tab::Search => "Type in the search bar to find podcasts",
        };
        let empty = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Podcasts"));
        frame.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let items: Vec<ListItem> = visible
        .iter()
        .map(|p| {
            let marker = if p.is_favorite { "★ " } else { "  " };
            ListItem::new(format!("{}{}", marker, p.to_display()))
        })
        .collect();

    let title = match app.listing.tab {
        Tab::Trending => format!("Trending ({} shown)", visible.len()),
        Tab::Favorites => format!("Favorites ({})", visible.len()),
        Tab::Search => format!("Results ({})", visible.len()),
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], &mut app.list_state);

    let details = if let Some(i) = app.list_state.selected() {
        if i < visible.len() {
            let podcast = &visible[i];
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);
            let updated = podcast
                .newest_item_publish_time
                .or(podcast.last_update_time)
                .map(|t| format_age(t, now))
                .unwrap_or_default();
            format!(
                "{}\nby {}  [{}]  {}\n\n{}",
                podcast.title, podcast.author, podcast.language, updated, podcast.description
            )
        } else {
            String::new()
        }
    } else {
        "Press Enter to view episodes".to_string()
    };

    let details_widget = Paragraph::new(details)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(Wrap { trim: true });

    frame.render_widget(details_widget, chunks[1]);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.search_focused {
        "[Enter] done  [Esc] clear  results update as you type"
    } else if app.overlays.playback_open {
        "[Space] play/pause  [←→] seek  [s] stop  [Tab] focus  [Esc] close  [q] quit"
    } else if app.overlays.detail.is_some() {
        "[↑↓] episodes  [Enter] play  [f] favorite  [Tab] focus  [Esc] close  [q] quit"
    } else {
        "[/] search  [Tab] tabs  [↑↓] navigate  [Enter] open  [f] favorite  [p] player  [?] help  [q] quit"
    };

    let footer = Paragraph::new(help_text)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

fn draw_detail_overlay(frame: &mut Frame, app: &mut App) {
    let area = centered_rect(80, 80, frame.area());
    frame.render_widget(Clear, area);

    let Some(browser) = app.overlays.detail.as_ref() else {
        return;
    };

    let focused = app.overlays.detail_focus.current();
    let marker = if browser.is_favorite { "★" } else { "☆" };
    let fav_style = if focused == DetailControl::Favorite {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let close_style = if focused == DetailControl::Close {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let title = Line::from(vec![
        Span::styled(
            browser.podcast.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(format!("[{} favorite]", marker), fav_style),
        Span::raw("  "),
        Span::styled("[x close]", close_style),
    ]);

    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(30), // Description
            Constraint::Length(1),      // Episode count line
            Constraint::Min(0),         // Episode list
        ])
        .split(inner);

    let description = Paragraph::new(format!(
        "by {}\n\n{}",
        browser.podcast.author, browser.podcast.description
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(description, chunks[0]);

    let count_line = episode_count_line(browser);
    let count = Paragraph::new(count_line).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(count, chunks[1]);

    let items: Vec<ListItem> = browser
        .episodes
        .iter()
        .map(|e| ListItem::new(e.to_display()))
        .collect();

    let border_style = if focused == DetailControl::Episodes {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Episodes")
                .border_style(border_style),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[2], &mut app.episode_list_state);
}

fn episode_count_line(browser: &EpisodeBrowser) -> String {
    if browser.episodes.is_empty() && browser.is_loading() {
        return "Loading episodes...".to_string();
    }
    match browser.total_count {
        Some(total) => format!("{} of {} episodes", browser.episodes.len(), total),
        None => format!("{} episodes", browser.episodes.len()),
    }
}

fn draw_playback_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Now Playing")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Episode title
            Constraint::Length(1), // Progress gauge
            Constraint::Length(1), // Position / duration
            Constraint::Min(1),    // Controls
        ])
        .split(inner);

    let title = match &app.playback.current_episode {
        Some(ep) => format!("{}\n{}", ep.title, ep.podcast_title),
        None => "Nothing playing".to_string(),
    };
    frame.render_widget(Paragraph::new(title), chunks[0]);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::DarkGray))
        .ratio(app.playback.progress())
        .label("");
    frame.render_widget(gauge, chunks[1]);

    let duration = if app.playback.duration > 0.0 {
        format_duration(app.playback.duration as u64)
    } else {
        "--:--".to_string()
    };
    let times = format!(
        "{} / {}",
        format_position(app.playback.position),
        duration
    );
    frame.render_widget(
        Paragraph::new(times).style(Style::default().fg(Color::DarkGray)),
        chunks[2],
    );

    let focused = app.overlays.playback_focus.current();
    let controls = [
        (
            PlaybackControl::PlayPause,
            if app.playback.is_playing {
                "[pause]"
            } else {
                "[play]"
            },
        ),
        (PlaybackControl::SeekBack, "[-10s]"),
        (PlaybackControl::SeekForward, "[+10s]"),
        (PlaybackControl::Stop, "[stop]"),
        (PlaybackControl::Close, "[close]"),
    ];
    let spans: Vec<Span> = controls
        .iter()
        .flat_map(|(control, label)| {
            let style = if *control == focused {
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            [Span::styled(*label, style), Span::raw("  ")]
        })
        .collect();
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[3]);
}

fn draw_error_popup(frame: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(format!("{}\n\nPress Esc to dismiss", error))
        .style(Style::default().fg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .border_style(Style::default().fg(Color::Red)),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(popup, area);
}

fn draw_help_modal(frame: &mut Frame) {
    let area = centered_rect(70, 80, frame.area());
    frame.render_widget(Clear, area);

    let content = "\
Global Commands
───────────────
  ?           Show/hide this help
  Ctrl+C      Force quit
  /           Focus search bar
  Tab         Next tab (or next control in an overlay)
  1 / 2 / 3   Trending / Favorites / Search tab
  q           Quit

Podcast List
────────────
  j / ↓       Move down (loads more near the end)
  k / ↑       Move up
  Enter       Open podcast details
  f           Toggle favorite
  p           Reopen player

Detail Overlay
──────────────
  j / ↓  k / ↑  Browse episodes
  Enter       Play episode / activate focused control
  f           Toggle favorite
  Esc         Close

Player Overlay
──────────────
  Space       Play / pause
  ← / →       Seek 10s
  s           Stop
  Esc         Close (audio keeps playing)

Press ? to close";

    let help_text = Paragraph::new(content)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(help_text, area);
}

/// Helper function to create a centered rect.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
