//! NowPlaying component: current track, artwork source and the seek bar.

use deck_core::library::Artwork;
use deck_core::player::LibraryStatus;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_COVER, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        progress_bar::{control_at, draw_progress},
        truncate,
    },
};

pub struct NowPlaying {
    /// Where the seek bar was last drawn, for click hit-testing.
    bar_area: Option<Rect>,
}

impl NowPlaying {
    pub fn new() -> Self {
        Self { bar_area: None }
    }

    fn artwork_line(artwork: &Artwork, width: usize) -> Line<'static> {
        let text = match artwork {
            Artwork::None => {
                return Line::from(Span::styled("no artwork", Style::default().fg(C_MUTED)));
            }
            Artwork::Embedded { path, mime } => format!("{} {}", mime, path.display()),
            Artwork::Remote { url } => url.clone(),
        };
        let label = "cover ";
        let room = width.saturating_sub(label.len());
        Line::from(vec![
            Span::styled(label, Style::default().fg(C_MUTED)),
            Span::styled(truncate(&text, room), Style::default().fg(C_COVER)),
        ])
    }
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for NowPlaying {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !state.player.controls_enabled() {
            return vec![];
        }
        match key.code {
            KeyCode::Char('h') => vec![Action::SeekBy(-5.0)],
            KeyCode::Char('l') => vec![Action::SeekBy(5.0)],
            KeyCode::Char('H') => vec![Action::SeekBy(-25.0)],
            KeyCode::Char('L') => vec![Action::SeekBy(25.0)],
            KeyCode::Char('0') | KeyCode::Home => vec![Action::Seek(0.0)],
            KeyCode::Enter => vec![Action::TogglePause],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        if !matches!(event.kind, MouseEventKind::Down(MouseButton::Left))
            || !state.player.controls_enabled()
        {
            return vec![];
        }
        match self.bar_area {
            Some(bar) if event.row == bar.y => control_at(bar, event.column)
                .map(|control| vec![Action::Seek(control)])
                .unwrap_or_default(),
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let player = &state.player;
        let playing = state.local_is_playing();
        let badge = if playing {
            Some(Badge::new("PLAYING", C_PLAYING))
        } else {
            None
        };
        let block = pane_chrome("now playing", Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.bar_area = None;
        if inner.height == 0 {
            return;
        }
        let width = inner.width as usize;

        let Some(track) = player.playlist().current() else {
            let text = match player.status() {
                LibraryStatus::Enumerating => "Reading library…",
                _ => "Nothing queued.",
            };
            frame.render_widget(
                Paragraph::new(Span::styled(text, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        };

        let mode = if player.playlist().shuffle() {
            "shuffle on"
        } else {
            "in order"
        };
        let (icon, icon_color) = if playing {
            ("▶ playing", C_PLAYING)
        } else {
            ("⏸ paused", C_SECONDARY)
        };
        let position = player
            .playlist()
            .cursor()
            .map(|c| format!("{}/{}", c.index() + 1, player.playlist().len()))
            .unwrap_or_default();

        let lines = vec![
            Line::from(Span::styled(
                truncate(&track.title, width),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                truncate(player.label().unwrap_or_default(), width),
                Style::default().fg(C_SECONDARY),
            )),
            Self::artwork_line(&player.now_artwork(), width),
            Line::default(),
            Line::from(vec![
                Span::styled(icon, Style::default().fg(icon_color)),
                Span::styled(format!("  {}  ", position), Style::default().fg(C_MUTED)),
                Span::styled(mode, Style::default().fg(C_MUTED)),
            ]),
        ];
        let text_h = (lines.len() as u16).min(inner.height);
        let text_area = Rect {
            height: text_h,
            ..inner
        };
        frame.render_widget(Paragraph::new(lines), text_area);

        if inner.height > text_h {
            let bar = Rect {
                y: inner.y + text_h,
                height: 1,
                ..inner
            };
            draw_progress(frame, bar, player.transport(), player.controls_enabled());
            self.bar_area = Some(bar);
        }
    }
}
