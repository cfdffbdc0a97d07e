//! Bordered pane: `[N] title` on the left, an optional badge on the right.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::theme::{style_border, style_title, C_NUMBER_HINT};

/// Short status in the top border ("LOADING", "12 tracks", ...).
pub struct Badge {
    pub text: String,
    pub color: Color,
}

impl Badge {
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    fn line(self) -> Line<'static> {
        let style = Style::default().fg(self.color).add_modifier(Modifier::BOLD);
        Line::from(Span::styled(format!(" {} ", self.text), style)).right_aligned()
    }
}

pub fn pane_chrome<'a>(
    title: &'a str,
    focus_key: Option<char>,
    focused: bool,
    badge: Option<Badge>,
) -> Block<'a> {
    let hint_style = Style::default().fg(C_NUMBER_HINT);
    let hint = focus_key.map(|key| Span::styled(format!("[{key}] "), hint_style));
    let heading: Vec<Span<'a>> = hint
        .into_iter()
        .chain(std::iter::once(Span::styled(title, style_title(focused))))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(style_border(focused))
        .title(Line::from(heading));
    match badge {
        Some(badge) => block.title_top(badge.line()),
        None => block,
    }
}
