//! One-line text input on top of tui-input.  Used for the station search and
//! for the path prompts.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED};

#[derive(Debug, PartialEq)]
pub enum FilterAction {
    Changed(String),
    Confirmed(String),
    Cancelled,
    None,
}

pub struct FilterInput {
    input: Input,
    active: bool,
    prefix: String,
    placeholder: String,
}

impl FilterInput {
    pub fn new(prefix: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            prefix: prefix.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Esc on text clears it and reports `Changed("")`; Esc on an empty
    /// input closes it.
    pub fn handle_key(&mut self, key: KeyEvent) -> FilterAction {
        match key.code {
            KeyCode::Esc => {
                if !self.input.value().is_empty() {
                    self.input = Input::default();
                    FilterAction::Changed(String::new())
                } else {
                    self.deactivate();
                    FilterAction::Cancelled
                }
            }
            KeyCode::Enter => {
                self.deactivate();
                FilterAction::Confirmed(self.input.value().to_string())
            }
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() == before {
                    FilterAction::None
                } else {
                    FilterAction::Changed(self.input.value().to_string())
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let prefix_w = self.prefix.chars().count() + 1;
        let scroll = self
            .input
            .visual_scroll((area.width as usize).saturating_sub(prefix_w + 2));
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(
                format!("{} {}", self.prefix, self.placeholder),
                Style::default().fg(C_MUTED),
            )
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(
                format!("{} {}", self.prefix, visible),
                Style::default().fg(C_FILTER_FG),
            )
        };
        frame.render_widget(
            Paragraph::new(Line::from(display)).style(Style::default().bg(C_FILTER_BG)),
            area,
        );

        if self.active && area.width > 0 {
            let cursor_x = area.x + (prefix_w + self.input.visual_cursor() - scroll) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn typing_reports_the_whole_value() {
        let mut f = FilterInput::new("/", "search");
        f.activate();
        assert_eq!(f.handle_key(key(KeyCode::Char('r'))), FilterAction::Changed("r".into()));
        assert_eq!(f.handle_key(key(KeyCode::Char('a'))), FilterAction::Changed("ra".into()));
        assert_eq!(f.handle_key(key(KeyCode::Enter)), FilterAction::Confirmed("ra".into()));
        assert!(!f.is_active());
    }

    #[test]
    fn escape_clears_then_closes() {
        let mut f = FilterInput::new("/", "search");
        f.activate();
        f.handle_key(key(KeyCode::Char('x')));
        assert_eq!(f.handle_key(key(KeyCode::Esc)), FilterAction::Changed(String::new()));
        assert!(f.is_active());
        assert_eq!(f.handle_key(key(KeyCode::Esc)), FilterAction::Cancelled);
        assert!(!f.is_active());
    }
}
