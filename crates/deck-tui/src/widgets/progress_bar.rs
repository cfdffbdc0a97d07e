//! Seek bar: `MM:SS ████▌     MM:SS`, eighth-block resolution.

use deck_core::transport::{TransportController, SEEK_CONTROL_MAX};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_MUTED, C_PLAYING, C_SECONDARY};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Columns taken by `"MM:SS "` on the left.
const LEFT_LABEL_W: u16 = 6;
/// Columns taken by `" MM:SS"` on the right.
const RIGHT_LABEL_W: u16 = 6;

/// Bar cells for a 0–1 fill over `width` cells.
pub fn bar_cells(fraction: f64, width: usize) -> String {
    let eighths = (fraction.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full = (eighths / 8).min(width);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat('█').take(full));
    if full < width {
        bar.push(BLOCKS[eighths % 8]);
        bar.extend(std::iter::repeat(' ').take(width - full - 1));
    }
    bar
}

/// Draw the transport bar into one row of `area`.
pub fn draw_progress(
    frame: &mut Frame,
    area: Rect,
    transport: &TransportController,
    enabled: bool,
) {
    if area.width < LEFT_LABEL_W + RIGHT_LABEL_W + 4 || area.height == 0 {
        return;
    }
    let bar_w = (area.width - LEFT_LABEL_W - RIGHT_LABEL_W) as usize;
    let fill = if enabled { C_PLAYING } else { C_MUTED };
    let fraction = transport.progress_value() / SEEK_CONTROL_MAX;

    let line = Line::from(vec![
        Span::styled(
            format!("{} ", transport.position_label()),
            Style::default().fg(C_SECONDARY),
        ),
        Span::styled(bar_cells(fraction, bar_w), Style::default().fg(fill)),
        Span::styled(
            format!(" {}", transport.duration_label()),
            Style::default().fg(C_MUTED),
        ),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Map a click column on a bar drawn by `draw_progress` to a 0–100 control
/// value.  `None` outside the bar cells.
pub fn control_at(area: Rect, column: u16) -> Option<f64> {
    if area.width < LEFT_LABEL_W + RIGHT_LABEL_W + 4 {
        return None;
    }
    let bar_x = area.x + LEFT_LABEL_W;
    let bar_w = area.width - LEFT_LABEL_W - RIGHT_LABEL_W;
    if column < bar_x || column >= bar_x + bar_w {
        return None;
    }
    let cell = (column - bar_x) as f64 + 0.5;
    Some((cell / bar_w as f64 * SEEK_CONTROL_MAX).clamp(0.0, SEEK_CONTROL_MAX))
}
