//! AppState: data shared read-only with every component.
//!
//! The App event loop is the only writer.

use deck_core::browser::StationBrowser;
use deck_core::playback::ElementEvent;
use deck_core::player::{LocalPlayer, TrackLoad};
use deck_core::state::WorkspaceKind;
use rand::Rng;
use tracing::info;

use crate::widgets::status_bar::InputMode;

/// Which side issued the last load to the audio element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementOwner {
    Radio,
    Library,
}

pub struct AppState {
    pub browser: StationBrowser,
    pub player: LocalPlayer,
    pub owner: Option<ElementOwner>,
    /// 0.0–1.0
    pub volume: f32,
    pub workspace: WorkspaceKind,
    pub input_mode: InputMode,
}

impl AppState {
    pub fn new(browser: StationBrowser, volume: f32, workspace: WorkspaceKind) -> Self {
        Self {
            browser,
            player: LocalPlayer::default(),
            owner: None,
            volume,
            workspace,
            input_mode: InputMode::Normal,
        }
    }

    /// Hand the element to `owner`; the previous owner goes back to idle.
    pub fn claim_element(&mut self, owner: ElementOwner) {
        match (self.owner, owner) {
            (Some(ElementOwner::Library), ElementOwner::Radio) => {
                info!("element: library → radio");
                self.player.release();
            }
            (Some(ElementOwner::Radio), ElementOwner::Library) => {
                info!("element: radio → library");
                self.browser.release();
            }
            _ => {}
        }
        self.owner = Some(owner);
    }

    /// Route an element event to its owner.  Returns the next track when
    /// local playback reached the end of one.
    pub fn on_element_event<R: Rng + ?Sized>(
        &mut self,
        event: &ElementEvent,
        rng: &mut R,
    ) -> Option<TrackLoad> {
        match self.owner? {
            ElementOwner::Radio => {
                self.browser.on_element_event(event);
                None
            }
            ElementOwner::Library => self.player.on_element_event(event, rng),
        }
    }

    /// Whether a play/pause request has anything to act on.
    pub fn can_toggle(&self) -> bool {
        match self.owner {
            Some(ElementOwner::Radio) => self.browser.can_toggle(),
            Some(ElementOwner::Library) => self.player.controls_enabled(),
            None => false,
        }
    }

    pub fn local_is_playing(&self) -> bool {
        self.owner == Some(ElementOwner::Library) && self.player.transport().is_playing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::favorites::FavoritesStore;
    use deck_core::library::{Artwork, LoadedLibrary, Track};
    use deck_core::playback::PlaybackStatus;
    use deck_core::station::{Station, StationId};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state_with_station() -> (AppState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let browser = StationBrowser::new(FavoritesStore::open(dir.path().join("favorites.json")));
        let mut state = AppState::new(browser, 0.7, WorkspaceKind::Stations);
        let station = Station {
            id: StationId::new("s1"),
            name: "Radio One".into(),
            stream_url: "http://stream/one".into(),
            icon_url: None,
            tags: Some("pop".into()),
            country: Some("Nepal".into()),
        };
        let token = state.browser.begin_search().token;
        state.browser.finish_search(token, Ok(vec![station]));
        (state, dir)
    }

    fn two_tracks() -> LoadedLibrary {
        LoadedLibrary {
            tracks: (0..2)
                .map(|i| Track {
                    title: format!("{i}.mp3"),
                    source: format!("/m/{i}.mp3").into(),
                    artwork: Artwork::None,
                })
                .collect(),
            art_dir: None,
        }
    }

    #[test]
    fn radio_events_only_reach_the_radio_while_it_owns_the_element() {
        let (mut state, _dir) = state_with_station();
        let mut rng = StdRng::seed_from_u64(1);
        state.browser.select_station(&StationId::new("s1"));
        state.claim_element(ElementOwner::Radio);
        state.on_element_event(&ElementEvent::Playing, &mut rng);
        assert_eq!(state.browser.playback().status(), PlaybackStatus::Playing);

        let token = state.player.begin_load("2 files");
        state.player.finish_load(token, two_tracks());
        state.claim_element(ElementOwner::Library);
        assert_eq!(state.browser.playback().status(), PlaybackStatus::Idle);

        state.on_element_event(&ElementEvent::Playing, &mut rng);
        assert_eq!(state.browser.playback().status(), PlaybackStatus::Idle);
        assert!(state.local_is_playing());
    }

    #[test]
    fn end_of_track_advances_the_library() {
        let (mut state, _dir) = state_with_station();
        let mut rng = StdRng::seed_from_u64(1);
        let token = state.player.begin_load("2 files");
        state.player.finish_load(token, two_tracks());
        state.claim_element(ElementOwner::Library);

        let next = state.on_element_event(&ElementEvent::Ended, &mut rng).unwrap();
        assert_eq!(next.index, 1);
        assert!(state.can_toggle());
    }

    #[test]
    fn nothing_to_toggle_before_any_load() {
        let (mut state, _dir) = state_with_station();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!state.can_toggle());
        assert_eq!(state.on_element_event(&ElementEvent::Ended, &mut rng), None);
    }
}
