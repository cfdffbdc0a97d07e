//! StationList component: the Stations workspace body.
//!
//! Row 0 is the All/Favorites tab bar, the last row the search field, and
//! everything between is one card per station.

use std::time::Instant;

use deck_core::browser::StationTab;
use deck_core::cards::StationCard;
use deck_core::directory::SearchOutcome;
use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

use crate::{
    action::Action,
    app_state::{AppState, ElementOwner},
    component::Component,
    components::{cover_badge, status_color, status_icon},
    theme::{
        C_ACCENT, C_CONNECTING, C_COVER, C_FAVORITE, C_MUTED, C_PRIMARY, C_SECONDARY,
        C_SELECTION_BG, C_TAG,
    },
    widgets::{
        filter_input::{FilterAction, FilterInput},
        pane_chrome::{pane_chrome, Badge},
        scrollable_list::ScrollableList,
        truncate,
    },
};

const TABS: [StationTab; 2] = [StationTab::All, StationTab::Favorites];

pub struct StationList {
    list: ScrollableList<StationCard>,
    search: FilterInput,
    shown_tab: StationTab,
    last_click: Option<(usize, Instant)>,
}

impl StationList {
    pub fn new() -> Self {
        Self {
            list: ScrollableList::new(),
            search: FilterInput::new("/", "search stations by name…"),
            shown_tab: StationTab::All,
            last_click: None,
        }
    }

    /// Re-render cards from the browser state.
    pub fn sync(&mut self, state: &AppState) {
        let tab = state.browser.tab();
        if tab != self.shown_tab {
            self.shown_tab = tab;
            self.list.select_first();
        }
        self.list.set_items(state.browser.cards());
    }

    fn selected_id_action(&self, make: fn(deck_core::station::StationId) -> Action) -> Vec<Action> {
        self.list
            .selected_item()
            .map(|card| vec![make(card.id.clone())])
            .unwrap_or_default()
    }

    fn tab_label(tab: StationTab, state: &AppState) -> String {
        match tab {
            StationTab::All => format!(" {} ", tab.title()),
            StationTab::Favorites => {
                format!(" {} ({}) ", tab.title(), state.browser.favorites().len())
            }
        }
    }

    /// Which tab a click at `offset` columns into the tab bar lands on.
    fn tab_at(offset: usize, state: &AppState) -> Option<StationTab> {
        let mut x = 0;
        for tab in TABS {
            let w = Self::tab_label(tab, state).chars().count();
            if offset < x + w {
                return Some(tab);
            }
            x += w + 1;
        }
        None
    }

    fn render_card<'a>(
        &self,
        card: &'a StationCard,
        is_selected: bool,
        state: &AppState,
        width: usize,
    ) -> ListItem<'a> {
        let playback = state.browser.playback();
        let is_current = state.owner == Some(ElementOwner::Radio)
            && playback.current().map(|s| &s.id) == Some(&card.id);

        let (icon, icon_color) = if is_current {
            status_icon(playback.status())
        } else {
            (" ", C_MUTED)
        };
        let name_color = if is_current {
            status_color(playback.status())
        } else if is_selected {
            C_PRIMARY
        } else {
            C_SECONDARY
        };
        let name_style = if is_current || is_selected {
            Style::default().fg(name_color).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(name_color)
        };
        let (fav, fav_color) = if card.favorite {
            ("★", C_FAVORITE)
        } else {
            ("☆", C_MUTED)
        };

        let cover = cover_badge(&card.cover);
        // "★ ▶ [AB] " prefix plus two spaces before the tags
        let fixed = 5 + cover.chars().count() + 1;
        let room = width.saturating_sub(fixed);
        let name = truncate(&card.name, room.min(40).max(room / 2));
        let name_w = unicode_width::UnicodeWidthStr::width(name.as_str());
        let tags_room = room.saturating_sub(name_w + 2);

        let spans = vec![
            Span::styled(format!("{} ", fav), Style::default().fg(fav_color)),
            Span::styled(icon, Style::default().fg(icon_color)),
            Span::raw(" "),
            Span::styled(cover, Style::default().fg(C_COVER)),
            Span::raw(" "),
            Span::styled(name, name_style),
            Span::raw("  "),
            Span::styled(truncate(&card.tags, tags_room), Style::default().fg(C_TAG)),
        ];

        let bg = if is_selected {
            Style::default().bg(C_SELECTION_BG)
        } else {
            Style::default()
        };
        ListItem::new(Line::from(spans)).style(bg)
    }
}

impl Default for StationList {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for StationList {
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        self.sync(state);

        if self.search.is_active() {
            match key.code {
                KeyCode::Up => {
                    self.list.select_up(1);
                    return vec![];
                }
                KeyCode::Down => {
                    self.list.select_down(1);
                    return vec![];
                }
                _ => {}
            }
            return match self.search.handle_key(key) {
                FilterAction::Changed(q) => vec![Action::SearchChanged(q)],
                FilterAction::Confirmed(q) => vec![Action::SearchNow(q), Action::CloseFilter],
                FilterAction::Cancelled => vec![Action::CloseFilter],
                FilterAction::None => vec![],
            };
        }

        let step = if key.modifiers.contains(KeyModifiers::SHIFT) {
            5
        } else {
            1
        };
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.list.select_up(step),
            KeyCode::Down | KeyCode::Char('j') => self.list.select_down(step),
            KeyCode::PageUp => self.list.select_up(10),
            KeyCode::PageDown => self.list.select_down(10),
            KeyCode::Home | KeyCode::Char('g') => self.list.select_first(),
            KeyCode::End | KeyCode::Char('G') => self.list.select_last(),
            KeyCode::Enter => return self.selected_id_action(Action::PlayStation),
            KeyCode::Char('*') => return self.selected_id_action(Action::ToggleFavorite),
            KeyCode::Char('t') => {
                let next = match state.browser.tab() {
                    StationTab::All => StationTab::Favorites,
                    StationTab::Favorites => StationTab::All,
                };
                return vec![Action::SwitchTab(next)];
            }
            KeyCode::Char('/') => {
                self.search.activate();
                return vec![Action::OpenFilter];
            }
            KeyCode::Char('y') => {
                if let Some(station) = self
                    .list
                    .selected_item()
                    .and_then(|card| state.browser.find(&card.id))
                {
                    return vec![Action::CopyToClipboard(station.stream_url.clone())];
                }
            }
            _ => {}
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, area: Rect, state: &AppState) -> Vec<Action> {
        self.sync(state);
        // inner area: one border on each side
        let rel_row = event.row.saturating_sub(area.y + 1) as usize;
        let rel_col = event.column.saturating_sub(area.x + 1) as usize;
        let inner_h = area.height.saturating_sub(2) as usize;

        match event.kind {
            MouseEventKind::ScrollUp => self.list.select_up(1),
            MouseEventKind::ScrollDown => self.list.select_down(1),
            MouseEventKind::Down(MouseButton::Left) => {
                if rel_row == 0 {
                    return Self::tab_at(rel_col, state)
                        .map(|tab| vec![Action::SwitchTab(tab)])
                        .unwrap_or_default();
                }
                if inner_h > 0 && rel_row == inner_h - 1 {
                    self.search.activate();
                    return vec![Action::OpenFilter];
                }
                let list_row = rel_row - 1;
                let now = Instant::now();
                let is_double = self
                    .last_click
                    .map(|(row, t)| row == list_row && t.elapsed().as_millis() < 400)
                    .unwrap_or(false);
                if self.list.handle_click(list_row) {
                    if is_double {
                        self.last_click = None;
                        return self.selected_id_action(Action::PlayStation);
                    }
                }
                self.last_click = Some((list_row, now));
            }
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::SwitchTab(_) | Action::ToggleFavorite(_) => self.sync(state),
            Action::CloseFilter => self.search.deactivate(),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        self.sync(state);

        let badge = match state.browser.outcome() {
            _ if state.browser.tab() == StationTab::Favorites => None,
            SearchOutcome::Loading => Some(Badge::new("LOADING", C_CONNECTING)),
            SearchOutcome::Failed(_) => Some(Badge::new("ERR", C_ACCENT)),
            SearchOutcome::Loaded(stations) => {
                Some(Badge::new(format!("{}", stations.len()), C_MUTED))
            }
        };
        let block = pane_chrome("stations", Some('1'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 3 {
            return;
        }

        // Tab bar
        let mut tab_spans = Vec::new();
        for (i, tab) in TABS.into_iter().enumerate() {
            if i > 0 {
                tab_spans.push(Span::raw(" "));
            }
            let style = if tab == state.browser.tab() {
                Style::default()
                    .fg(C_PRIMARY)
                    .bg(C_SELECTION_BG)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_MUTED)
            };
            tab_spans.push(Span::styled(Self::tab_label(tab, state), style));
        }
        frame.render_widget(Paragraph::new(Line::from(tab_spans)), Rect { height: 1, ..inner });

        let list_area = Rect {
            y: inner.y + 1,
            height: inner.height - 2,
            ..inner
        };
        let search_area = Rect {
            y: inner.y + inner.height - 1,
            height: 1,
            ..inner
        };
        self.search.draw(frame, search_area);

        if let Some(text) = state.browser.placeholder() {
            frame.render_widget(
                Paragraph::new(Span::styled(format!("  {}", text), Style::default().fg(C_MUTED))),
                list_area,
            );
            return;
        }

        let height = list_area.height as usize;
        self.list.ensure_visible(height);
        let selected = self.list.selected_index();
        let width = list_area.width as usize;
        let items: Vec<ListItem> = self
            .list
            .visible_items(height)
            .map(|(i, card)| self.render_card(card, Some(i) == selected, state, width))
            .collect();
        frame.render_widget(List::new(items), list_area);
    }
}
