//! Bottom line: input mode and the key bindings that apply to it.

use deck_core::state::WorkspaceKind;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MODE_COMMAND, C_MODE_FILTER, C_MODE_NORMAL, C_MUTED};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    /// Typing into the station search.
    Filter,
    /// Typing a path into the open prompt.
    Command,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Filter => "SEARCH",
            Self::Command => "OPEN",
        }
    }

    pub fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_MODE_NORMAL,
            Self::Filter => C_MODE_FILTER,
            Self::Command => C_MODE_COMMAND,
        }
    }
}

fn keys_for(mode: InputMode, workspace: WorkspaceKind) -> &'static str {
    match (mode, workspace) {
        (InputMode::Normal, WorkspaceKind::Stations) => {
            " ↑↓/jk select  Enter play  Space pause  * favorite  t all/favorites  / search  y copy url  ←→ vol  w library  q quit"
        }
        (InputMode::Normal, WorkspaceKind::Library) => {
            " ↑↓/jk select  Enter play  Space pause  n/p next/prev  s shuffle  ,/. seek  o folder  O files  ←→ vol  w stations  q quit"
        }
        (InputMode::Filter, _) => " type to search  Enter search now  Esc clear+close",
        (InputMode::Command, _) => " type a path  Enter open  Esc cancel",
    }
}

pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, workspace: WorkspaceKind) {
    let label = match (mode, workspace) {
        (InputMode::Normal, WorkspaceKind::Stations) => "STATIONS",
        (InputMode::Normal, WorkspaceKind::Library) => "LIBRARY",
        (other, _) => other.label(),
    };
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default()
                .fg(mode.color())
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys_for(mode, workspace), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
