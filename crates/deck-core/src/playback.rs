//! Radio playback state, driven by audio element events.
//!
//! ```text
//!   Idle ─select─▶ Loading ─Playing─▶ Playing ⇄ Paused
//!                     └────Failed───▶ Error
//! ```
//!
//! The play/pause indicator follows what the element reports, never the key
//! press that asked for it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::station::Station;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackStatus {
    #[default]
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

impl PlaybackStatus {
    pub fn is_playing(self) -> bool {
        self == Self::Playing
    }
}

/// Notifications from the audio element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementEvent {
    Playing,
    Paused,
    Ended,
    Failed(String),
    TimeUpdate(f64),
    DurationChanged(Option<f64>),
}

/// What a play/pause press on the radio turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioToggle {
    /// The element still holds the stream: flip its pause state.
    Element,
    /// The stream ended or failed: load it again.
    Reload(String),
}

#[derive(Debug, Default)]
pub struct PlaybackController {
    current: Option<Station>,
    status: PlaybackStatus,
    /// False once the element has let go of the stream (ended, failed).
    stream_held: bool,
}

impl PlaybackController {
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn current(&self) -> Option<&Station> {
        self.current.as_ref()
    }

    /// Make `station` the active stream.  Returns the URL to load.
    pub fn select(&mut self, station: &Station) -> String {
        info!("radio: selecting {}", station.name);
        self.current = Some(station.clone());
        self.status = PlaybackStatus::Loading;
        self.stream_held = true;
        station.stream_url.clone()
    }

    /// Play/pause for the current station.  `None` without one.
    pub fn toggle(&mut self) -> Option<RadioToggle> {
        let url = self.current.as_ref()?.stream_url.clone();
        if self.stream_held {
            return Some(RadioToggle::Element);
        }
        info!("radio: reloading {}", url);
        self.status = PlaybackStatus::Loading;
        self.stream_held = true;
        Some(RadioToggle::Reload(url))
    }

    /// Whether a play/pause request should reach the element.
    pub fn can_toggle(&self) -> bool {
        self.current.is_some()
    }

    pub fn on_element_event(&mut self, event: &ElementEvent) {
        if self.current.is_none() {
            return;
        }
        let next = match event {
            ElementEvent::Playing => PlaybackStatus::Playing,
            ElementEvent::Paused => PlaybackStatus::Paused,
            ElementEvent::Ended => {
                self.stream_held = false;
                PlaybackStatus::Paused
            }
            ElementEvent::Failed(reason) => {
                warn!("radio: stream failed: {}", reason);
                self.stream_held = false;
                PlaybackStatus::Error
            }
            ElementEvent::TimeUpdate(_) | ElementEvent::DurationChanged(_) => return,
        };
        if next != self.status {
            info!("radio: status {:?} → {:?}", self.status, next);
            self.status = next;
        }
    }

    /// The element was taken over by the local player.
    pub fn release(&mut self) {
        if self.status != PlaybackStatus::Idle {
            info!("radio: released audio element");
        }
        self.status = PlaybackStatus::Idle;
        self.stream_held = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::StationId;

    fn station(id: &str) -> Station {
        Station {
            id: StationId::new(id),
            name: id.to_uppercase(),
            stream_url: format!("http://stream/{id}"),
            icon_url: None,
            tags: None,
            country: None,
        }
    }

    #[test]
    fn select_enters_loading_until_element_confirms() {
        let mut pc = PlaybackController::default();
        assert_eq!(pc.select(&station("a")), "http://stream/a");
        assert_eq!(pc.status(), PlaybackStatus::Loading);
        pc.on_element_event(&ElementEvent::Playing);
        assert_eq!(pc.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn externally_reported_pause_is_reflected() {
        let mut pc = PlaybackController::default();
        pc.select(&station("a"));
        pc.on_element_event(&ElementEvent::Playing);
        pc.on_element_event(&ElementEvent::Paused);
        assert_eq!(pc.status(), PlaybackStatus::Paused);
        pc.on_element_event(&ElementEvent::Playing);
        assert!(pc.status().is_playing());
    }

    #[test]
    fn failed_start_is_error() {
        let mut pc = PlaybackController::default();
        pc.select(&station("a"));
        pc.on_element_event(&ElementEvent::Failed("timeout".into()));
        assert_eq!(pc.status(), PlaybackStatus::Error);
    }

    #[test]
    fn toggle_after_the_stream_ends_reloads_it() {
        let mut pc = PlaybackController::default();
        assert_eq!(pc.toggle(), None);
        pc.select(&station("a"));
        pc.on_element_event(&ElementEvent::Playing);
        assert_eq!(pc.toggle(), Some(RadioToggle::Element));

        pc.on_element_event(&ElementEvent::Ended);
        assert_eq!(pc.status(), PlaybackStatus::Paused);
        assert_eq!(pc.toggle(), Some(RadioToggle::Reload("http://stream/a".into())));
        assert_eq!(pc.status(), PlaybackStatus::Loading);
        assert_eq!(pc.toggle(), Some(RadioToggle::Element));
    }

    #[test]
    fn toggle_after_a_failure_retries_the_stream() {
        let mut pc = PlaybackController::default();
        pc.select(&station("a"));
        pc.on_element_event(&ElementEvent::Failed("no audio after 15s".into()));
        assert_eq!(pc.toggle(), Some(RadioToggle::Reload("http://stream/a".into())));

        pc.release();
        assert_eq!(pc.toggle(), Some(RadioToggle::Reload("http://stream/a".into())));
    }

    #[test]
    fn events_without_a_station_are_ignored() {
        let mut pc = PlaybackController::default();
        assert!(!pc.can_toggle());
        pc.on_element_event(&ElementEvent::Playing);
        assert_eq!(pc.status(), PlaybackStatus::Idle);
    }

    #[test]
    fn selecting_again_replaces_the_stream() {
        let mut pc = PlaybackController::default();
        pc.select(&station("a"));
        pc.on_element_event(&ElementEvent::Playing);
        pc.select(&station("b"));
        assert_eq!(pc.status(), PlaybackStatus::Loading);
        assert_eq!(pc.current().unwrap().id.as_str(), "b");
    }
}
