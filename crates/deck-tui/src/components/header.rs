//! Header: 2-row top bar.
//!
//! Row 1: workspace tabs, volume.
//! Row 2: whatever owns the audio element right now.
//!
//! Not focusable.

use deck_core::cards::cover_for;
use deck_core::state::WorkspaceKind;
use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::{AppState, ElementOwner},
    components::{cover_badge, status_color, status_icon},
    theme::{C_COVER, C_LOCATION, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SELECTION_BG},
};

const WORKSPACES: [(WorkspaceKind, &str); 2] = [
    (WorkspaceKind::Stations, " radio "),
    (WorkspaceKind::Library, " library "),
];

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }

    /// Clicks on a workspace tab switch to it.
    pub fn handle_mouse(&self, event: MouseEvent, area: Rect) -> Vec<Action> {
        if event.kind != MouseEventKind::Down(MouseButton::Left) || event.row != area.y {
            return vec![];
        }
        workspace_at(event.column.saturating_sub(area.x) as usize)
            .map(|ws| vec![Action::SwitchWorkspace(ws)])
            .unwrap_or_default()
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        if area.height == 0 {
            return;
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        frame.render_widget(Clear, rows[0]);
        draw_row1(frame, rows[0], state);
        if area.height >= 2 {
            frame.render_widget(Clear, rows[1]);
            frame.render_widget(Paragraph::new(build_row2(state)), rows[1]);
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

/// Tab under column `offset` of row 1.  Tabs start after one leading space.
fn workspace_at(offset: usize) -> Option<WorkspaceKind> {
    let mut x = 1;
    for (kind, label) in WORKSPACES {
        let w = label.chars().count();
        if offset >= x && offset < x + w {
            return Some(kind);
        }
        x += w + 1;
    }
    None
}

// ── Row 1: workspaces | volume ────────────────────────────────────────────────

fn draw_row1(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![Span::raw(" ")];
    for (kind, label) in WORKSPACES {
        let style = if kind == state.workspace {
            Style::default()
                .fg(C_PRIMARY)
                .bg(C_SELECTION_BG)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(C_MUTED)
        };
        spans.push(Span::styled(label, style));
        spans.push(Span::raw(" "));
    }

    let vol = format!("vol {:>3}% ", (state.volume * 100.0).round() as u32);
    let vol_w = vol.len() as u16;
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
    if area.width > vol_w {
        let vol_area = Rect {
            x: area.x + area.width - vol_w,
            width: vol_w,
            ..area
        };
        frame.render_widget(
            Paragraph::new(Span::styled(vol, Style::default().fg(C_SECONDARY))),
            vol_area,
        );
    }
}

// ── Row 2: now playing ────────────────────────────────────────────────────────

fn build_row2(state: &AppState) -> Line<'static> {
    match state.owner {
        Some(ElementOwner::Radio) => {
            let playback = state.browser.playback();
            let Some(station) = playback.current() else {
                return idle_line();
            };
            let (icon, icon_color) = status_icon(playback.status());
            let mut spans = vec![
                Span::raw(" "),
                Span::styled(icon, Style::default().fg(icon_color)),
                Span::raw(" "),
                Span::styled(cover_badge(&cover_for(station)), Style::default().fg(C_COVER)),
                Span::raw(" "),
                Span::styled(
                    station.name.clone(),
                    Style::default()
                        .fg(status_color(playback.status()))
                        .add_modifier(Modifier::BOLD),
                ),
            ];
            let subtitle = station.subtitle();
            if !subtitle.is_empty() {
                spans.push(Span::styled("  ", Style::default()));
                spans.push(Span::styled(subtitle, Style::default().fg(C_LOCATION)));
            }
            Line::from(spans)
        }
        Some(ElementOwner::Library) => {
            let player = &state.player;
            let Some(track) = player.playlist().current() else {
                return idle_line();
            };
            let (icon, icon_color) = if player.transport().is_playing() {
                ("▶", C_PLAYING)
            } else {
                ("⏸", C_SECONDARY)
            };
            let transport = player.transport();
            Line::from(vec![
                Span::raw(" "),
                Span::styled(icon, Style::default().fg(icon_color)),
                Span::raw(" "),
                Span::styled(
                    track.title.clone(),
                    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!(
                        "  {} / {}",
                        transport.position_label(),
                        transport.duration_label()
                    ),
                    Style::default().fg(C_MUTED),
                ),
            ])
        }
        None => idle_line(),
    }
}

fn idle_line() -> Line<'static> {
    Line::from(Span::styled(" ■ nothing playing", Style::default().fg(C_MUTED)))
}
