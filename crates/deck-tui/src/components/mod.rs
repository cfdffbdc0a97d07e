pub mod header;
pub mod now_playing;
pub mod playlist;
pub mod station_list;

use deck_core::cards::Cover;
use deck_core::playback::PlaybackStatus;
use ratatui::style::Color;

use crate::theme::{C_ACCENT, C_CONNECTING, C_MUTED, C_PLAYING, C_PRIMARY};

/// Status glyph and color for the radio's current station.
pub fn status_icon(status: PlaybackStatus) -> (&'static str, Color) {
    match status {
        PlaybackStatus::Playing => ("▶", C_PLAYING),
        PlaybackStatus::Paused => ("⏸", C_CONNECTING),
        PlaybackStatus::Loading => ("⋯", C_CONNECTING),
        PlaybackStatus::Error => ("✗", C_ACCENT),
        PlaybackStatus::Idle => ("■", C_MUTED),
    }
}

pub fn status_color(status: PlaybackStatus) -> Color {
    match status {
        PlaybackStatus::Idle => C_PRIMARY,
        other => status_icon(other).1,
    }
}

/// Terminal stand-in for a cover image: `[AB]` initials, or `◉` when the
/// station has an icon URL.
pub fn cover_badge(cover: &Cover) -> String {
    match cover {
        Cover::Icon(_) => "[◉]".to_string(),
        Cover::Initials(text) => format!("[{}]", text),
    }
}
