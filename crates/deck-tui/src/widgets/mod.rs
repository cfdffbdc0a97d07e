pub mod filter_input;
pub mod pane_chrome;
pub mod progress_bar;
pub mod scrollable_list;
pub mod status_bar;
pub mod toast;

use unicode_width::UnicodeWidthChar;

/// Cut `text` to at most `width` terminal columns, ending in `…` when cut.
pub fn truncate(text: &str, width: usize) -> String {
    if unicode_width::UnicodeWidthStr::width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::truncate;

    #[test]
    fn truncate_counts_columns_not_bytes() {
        assert_eq!(truncate("Radio", 10), "Radio");
        assert_eq!(truncate("Radio Paradise", 6), "Radio…");
        assert_eq!(truncate("日本語ラジオ", 5), "日本…");
        assert_eq!(truncate("abc", 0), "");
    }
}
