//! Short-lived notices stacked in the top-right corner.
//!
//! A busy notice (library reads) sits on top and spins until dismissed;
//! everything else fades after a per-level lifetime.

use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

const BUSY_GLYPHS: [char; 8] = ['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];
const MAX_SHOWN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn lifetime(self) -> Duration {
        Duration::from_secs(match self {
            Level::Info | Level::Success => 3,
            Level::Warning => 4,
            Level::Error => 5,
        })
    }

    fn glyph(self) -> char {
        match self {
            Level::Info => '·',
            Level::Success => '✓',
            Level::Warning => '!',
            Level::Error => '✗',
        }
    }

    fn color(self) -> Color {
        match self {
            Level::Info => C_TOAST_INFO,
            Level::Success => C_TOAST_SUCCESS,
            Level::Warning => C_TOAST_WARNING,
            Level::Error => C_TOAST_ERROR,
        }
    }
}

struct Notice {
    text: String,
    level: Level,
    until: Instant,
}

struct Busy {
    text: String,
    step: usize,
}

#[derive(Default)]
pub struct ToastManager {
    /// Oldest first; a repeated text replaces its earlier copy.
    notices: Vec<Notice>,
    busy: Option<Busy>,
}

impl ToastManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn post(&mut self, text: impl Into<String>, level: Level, now: Instant) {
        let text = text.into();
        self.notices.retain(|n| n.text != text);
        self.notices.push(Notice {
            until: now + level.lifetime(),
            text,
            level,
        });
        let overflow = self.notices.len().saturating_sub(MAX_SHOWN * 2);
        self.notices.drain(..overflow);
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.post(text, Level::Info, Instant::now());
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.post(text, Level::Success, Instant::now());
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.post(text, Level::Warning, Instant::now());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.post(text, Level::Error, Instant::now());
    }

    pub fn spinner(&mut self, text: impl Into<String>) {
        self.busy = Some(Busy {
            text: text.into(),
            step: 0,
        });
    }

    pub fn dismiss_spinner(&mut self) {
        self.busy = None;
    }

    pub fn tick(&mut self) {
        self.expire(Instant::now());
        if let Some(busy) = self.busy.as_mut() {
            busy.step = busy.step.wrapping_add(1);
        }
    }

    fn expire(&mut self, now: Instant) {
        self.notices.retain(|n| n.until > now);
    }

    pub fn is_empty(&self) -> bool {
        self.busy.is_none() && self.notices.is_empty()
    }

    fn rows(&self) -> impl Iterator<Item = (char, &str, Color)> {
        let busy = self.busy.as_ref().map(|b| {
            (BUSY_GLYPHS[b.step % BUSY_GLYPHS.len()], b.text.as_str(), C_TOAST_INFO)
        });
        let recent = self
            .notices
            .iter()
            .rev()
            .take(MAX_SHOWN)
            .map(|n| (n.level.glyph(), n.text.as_str(), n.level.color()));
        busy.into_iter().chain(recent)
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let widest = (area.width / 2).clamp(30, 60);
        let bottom = area.bottom();
        for (row, (glyph, text, color)) in (area.y + 1..bottom).zip(self.rows()) {
            let width = (text.width() as u16).saturating_add(4).min(widest);
            let slot = Rect::new(area.right().saturating_sub(width + 1), row, width, 1);
            let style = Style::default().fg(color).add_modifier(Modifier::BOLD);
            frame.render_widget(Clear, slot);
            let label = Span::styled(format!(" {glyph} {text} "), style);
            frame.render_widget(Paragraph::new(label), slot);
        }
    }
}
