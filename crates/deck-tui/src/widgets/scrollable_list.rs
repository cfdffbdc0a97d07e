//! Selection + scroll bookkeeping for a list drawn a window at a time.

pub struct ScrollableList<T> {
    items: Vec<T>,
    selected: usize,
    scroll_offset: usize,
}

impl<T> ScrollableList<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            selected: 0,
            scroll_offset: 0,
        }
    }

    /// Replace the items, keeping the selection index when it still fits.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
        if self.scroll_offset > self.selected {
            self.scroll_offset = self.selected;
        }
    }

    pub fn select_up(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }

    pub fn select_down(&mut self, n: usize) {
        if self.items.is_empty() {
            return;
        }
        self.selected = (self.selected + n).min(self.items.len() - 1);
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
        self.scroll_offset = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.items.len().saturating_sub(1);
    }

    pub fn select(&mut self, index: usize) {
        if index < self.items.len() {
            self.selected = index;
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        (!self.items.is_empty()).then_some(self.selected)
    }

    pub fn selected_item(&self) -> Option<&T> {
        self.items.get(self.selected)
    }

    /// Keep the selection inside a window of `height` rows.
    pub fn ensure_visible(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.selected < self.scroll_offset {
            self.scroll_offset = self.selected;
        } else if self.selected >= self.scroll_offset + height {
            self.scroll_offset = self.selected + 1 - height;
        }
    }

    /// `(index, item)` pairs in the current window.  Call `ensure_visible`
    /// first.
    pub fn visible_items(&self, height: usize) -> impl Iterator<Item = (usize, &T)> {
        self.items
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(height)
    }

    /// Select the item at `row` of the window.  False when the row is empty.
    pub fn handle_click(&mut self, row: usize) -> bool {
        let target = self.scroll_offset + row;
        if target < self.items.len() {
            self.selected = target;
            return true;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for ScrollableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: usize) -> ScrollableList<usize> {
        let mut l = ScrollableList::new();
        l.set_items((0..n).collect());
        l
    }

    #[test]
    fn window_follows_selection() {
        let mut l = list(10);
        l.select_down(6);
        l.ensure_visible(4);
        let rows: Vec<usize> = l.visible_items(4).map(|(i, _)| i).collect();
        assert_eq!(rows, vec![3, 4, 5, 6]);
        l.select_up(5);
        l.ensure_visible(4);
        assert_eq!(l.visible_items(4).next().map(|(i, _)| i), Some(1));
    }

    #[test]
    fn click_below_last_item_is_ignored() {
        let mut l = list(2);
        assert!(l.handle_click(1));
        assert!(!l.handle_click(5));
        assert_eq!(l.selected_index(), Some(1));
    }

    #[test]
    fn shrinking_clamps_selection() {
        let mut l = list(5);
        l.select_last();
        l.set_items(vec![0, 1]);
        assert_eq!(l.selected_index(), Some(1));
        l.set_items(Vec::new());
        assert_eq!(l.selected_index(), None);
        l.select_down(1);
        assert_eq!(l.selected_item(), None);
    }
}
