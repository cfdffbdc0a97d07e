//! Playlist component: the track list of the Library workspace.

use std::time::Instant;

use deck_core::player::LibraryStatus;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, PromptKind},
    app_state::AppState,
    component::Component,
    theme::{C_CONNECTING, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SELECTION_BG},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
        truncate,
    },
};

pub struct Playlist {
    list: ScrollableList<String>,
    /// (load generation, status, cursor) the list was last synced to.
    followed: Option<(u64, LibraryStatus, Option<usize>)>,
    last_click: Option<(usize, Instant)>,
}

impl Playlist {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            followed: None,
            last_click: None,
        }
    }

    /// Pick up a new load, and move the highlight when the cursor moved.
    pub fn sync(&mut self, state: &AppState) {
        let player = &state.player;
        let cursor = player.playlist().cursor().map(|c| c.index());
        let key = (player.generation(), player.status(), cursor);
        if self.followed == Some(key) {
            return;
        }
        if self.followed.map(|(g, s, _)| (g, s)) != Some((key.0, key.1)) {
            self.list
                .set_items(player.playlist().tracks().iter().map(|t| t.title.clone()).collect());
            self.list.select_first();
        }
        if let Some(i) = cursor {
            self.list.select(i);
        }
        self.followed = Some(key);
    }

    fn empty_message(state: &AppState) -> &'static str {
        match state.player.status() {
            LibraryStatus::Empty => "No music loaded. Press o to open a folder or O for files.",
            LibraryStatus::Enumerating => "Reading library…",
            LibraryStatus::Ready => "No audio files found.",
        }
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Playlist {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        self.sync(state);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(1),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter => {
                if state.player.controls_enabled() {
                    if let Some(i) = self.list.selected_index() {
                        return vec![Action::PlayTrack(i)];
                    }
                }
            }
            KeyCode::Char('o') => return vec![Action::OpenPrompt(PromptKind::Folder)],
            KeyCode::Char('O') => return vec![Action::OpenPrompt(PromptKind::Files)],
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        self.sync(state);
        let rel_row = event.row.saturating_sub(area.y + 1) as usize;
        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                let now = Instant::now();
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == rel_row && t.elapsed().as_millis() < 400)
                    .unwrap_or(false);
                if self.list.handle_click(rel_row) && is_double && state.player.controls_enabled() {
                    self.last_click = None;
                    if let Some(i) = self.list.selected_index() {
                        return vec![Action::PlayTrack(i)];
                    }
                }
                self.last_click = Some((rel_row, now));
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.sync(state);
        let player = &state.player;

        let badge = match player.status() {
            LibraryStatus::Enumerating => Some(Badge::new("LOADING", C_CONNECTING)),
            LibraryStatus::Ready => {
                let mut text = format!("{} tracks", player.playlist().len());
                if player.playlist().shuffle() {
                    text.push_str(" · shuffle");
                }
                Some(Badge::new(text, C_MUTED))
            }
            LibraryStatus::Empty => None,
        };
        let title = player.label().unwrap_or("library");
        let block = pane_chrome(title, Some('1'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.list.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("  {}", Self::empty_message(state)),
                    Style::default().fg(C_MUTED),
                ))
                .wrap(Wrap { trim: false }),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        self.list.ensure_visible(height);
        let selected = self.list.selected_index();
        let cursor = player.playlist().cursor().map(|c| c.index());
        let playing = state.local_is_playing();
        let num_w = self.list.len().to_string().len();
        let title_w = (inner.width as usize).saturating_sub(num_w + 4);

        let items: Vec<ListItem> = self
            .list
            .visible_items(height)
            .map(|(i, title)| {
                let is_current = Some(i) == cursor;
                let is_selected = Some(i) == selected;
                let marker = match (is_current, playing) {
                    (true, true) => Span::styled("▶ ", Style::default().fg(C_PLAYING)),
                    (true, false) => Span::styled("■ ", Style::default().fg(C_SECONDARY)),
                    _ => Span::raw("  "),
                };
                let title_style = if is_current {
                    Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD)
                } else if is_selected {
                    Style::default().fg(C_PRIMARY)
                } else {
                    Style::default().fg(C_SECONDARY)
                };
                let line = Line::from(vec![
                    marker,
                    Span::styled(format!("{:>num_w$} ", i + 1), Style::default().fg(C_MUTED)),
                    Span::styled(truncate(title, title_w), title_style),
                ]);
                let bg = if is_selected {
                    Style::default().bg(C_SELECTION_BG)
                } else {
                    Style::default()
                };
                ListItem::new(line).style(bg)
            })
            .collect();
        frame.render_widget(List::new(items), inner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::browser::StationBrowser;
    use deck_core::favorites::FavoritesStore;
    use deck_core::library::{Artwork, LoadedLibrary, Track};
    use deck_core::state::WorkspaceKind;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded_state(dir: &tempfile::TempDir, n: usize) -> AppState {
        let browser = StationBrowser::new(FavoritesStore::open(dir.path().join("f.json")));
        let mut state = AppState::new(browser, 0.5, WorkspaceKind::Library);
        let token = state.player.begin_load("Music");
        state.player.finish_load(
            token,
            LoadedLibrary {
                tracks: (0..n)
                    .map(|i| Track {
                        title: format!("track {i}"),
                        source: format!("/m/{i}.mp3").into(),
                        artwork: Artwork::None,
                    })
                    .collect(),
                art_dir: None,
            },
        );
        state
    }

    #[test]
    fn enter_plays_the_highlighted_track() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_state(&dir, 3);
        let mut pl = Playlist::new();
        pl.handle_key(key(KeyCode::Down), &state);
        pl.handle_key(key(KeyCode::Down), &state);
        assert_eq!(pl.handle_key(key(KeyCode::Enter), &state), vec![Action::PlayTrack(2)]);
    }

    #[test]
    fn highlight_follows_the_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = loaded_state(&dir, 3);
        let mut pl = Playlist::new();
        pl.sync(&state);
        state.player.select(2);
        pl.sync(&state);
        assert_eq!(pl.list.selected_index(), Some(2));
        state.player.previous();
        pl.sync(&state);
        assert_eq!(pl.list.selected_index(), Some(1));
    }

    #[test]
    fn nothing_to_play_before_a_load() {
        let dir = tempfile::tempdir().unwrap();
        let browser = StationBrowser::new(FavoritesStore::open(dir.path().join("f.json")));
        let state = AppState::new(browser, 0.5, WorkspaceKind::Library);
        let mut pl = Playlist::new();
        assert!(pl.handle_key(key(KeyCode::Enter), &state).is_empty());
        assert_eq!(
            pl.handle_key(key(KeyCode::Char('o')), &state),
            vec![Action::OpenPrompt(PromptKind::Folder)]
        );
    }
}
