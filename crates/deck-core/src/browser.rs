//! Station browser state: search results, favorites, radio playback.

use tracing::{debug, warn};

use crate::cards::{render_cards, StationCard};
use crate::debounce::RequestTokens;
use crate::directory::{DirectoryError, SearchOutcome};
use crate::favorites::FavoritesStore;
use crate::playback::{ElementEvent, PlaybackController, RadioToggle};
use crate::station::{Station, StationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StationTab {
    #[default]
    All,
    Favorites,
}

impl StationTab {
    pub fn title(self) -> &'static str {
        match self {
            StationTab::All => "All Stations",
            StationTab::Favorites => "Favorites",
        }
    }
}

/// A search that was started and still awaits its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub token: u64,
    pub query: Option<String>,
}

pub struct StationBrowser {
    outcome: SearchOutcome,
    favorites: FavoritesStore,
    playback: PlaybackController,
    tab: StationTab,
    query: String,
    tokens: RequestTokens,
}

impl StationBrowser {
    pub fn new(favorites: FavoritesStore) -> Self {
        Self {
            outcome: SearchOutcome::Loading,
            favorites,
            playback: PlaybackController::default(),
            tab: StationTab::All,
            query: String::new(),
            tokens: RequestTokens::default(),
        }
    }

    pub fn outcome(&self) -> &SearchOutcome {
        &self.outcome
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    pub fn tab(&self) -> StationTab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: StationTab) {
        self.tab = tab;
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Stations of the active tab, in display order.
    pub fn visible(&self) -> &[Station] {
        match self.tab {
            StationTab::All => self.outcome.stations(),
            StationTab::Favorites => self.favorites.list(),
        }
    }

    pub fn cards(&self) -> Vec<StationCard> {
        render_cards(self.visible(), &self.favorites)
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self.tab {
            StationTab::All => self.outcome.placeholder(),
            StationTab::Favorites if self.favorites.is_empty() => Some("No stations found."),
            StationTab::Favorites => None,
        }
    }

    /// Start a query for the current text.  Whitespace-only text lists the
    /// whole country.
    pub fn begin_search(&mut self) -> SearchRequest {
        let trimmed = self.query.trim();
        let query = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self.outcome = SearchOutcome::Loading;
        SearchRequest {
            token: self.tokens.issue(),
            query,
        }
    }

    /// Apply a response.  Returns false when a newer search superseded it.
    pub fn finish_search(
        &mut self,
        token: u64,
        result: Result<Vec<Station>, DirectoryError>,
    ) -> bool {
        if !self.tokens.is_current(token) {
            debug!("stations: dropping stale response #{}", token);
            return false;
        }
        if let Err(e) = &result {
            warn!("stations: search failed: {}", e);
        }
        self.outcome = SearchOutcome::from_result(result);
        true
    }

    /// Look up a station on screen or among favorites.
    pub fn find(&self, id: &StationId) -> Option<&Station> {
        self.outcome
            .stations()
            .iter()
            .chain(self.favorites.list())
            .find(|s| &s.id == id)
    }

    /// `None` for unknown ids.  `Some(Err)` means the change stuck in
    /// memory but could not be written.
    pub fn toggle_favorite(&mut self, id: &StationId) -> Option<anyhow::Result<bool>> {
        let station = self.find(id)?.clone();
        Some(self.favorites.toggle(&station))
    }

    /// Make a station current.  Returns the stream URL to load.
    pub fn select_station(&mut self, id: &StationId) -> Option<String> {
        let station = self.find(id)?.clone();
        Some(self.playback.select(&station))
    }

    pub fn can_toggle(&self) -> bool {
        self.playback.can_toggle()
    }

    pub fn toggle(&mut self) -> Option<RadioToggle> {
        self.playback.toggle()
    }

    pub fn on_element_event(&mut self, event: &ElementEvent) {
        self.playback.on_element_event(event);
    }

    pub fn release(&mut self) {
        self.playback.release();
    }
}
