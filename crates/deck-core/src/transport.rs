//! Position/duration bookkeeping for local playback.

use crate::playback::ElementEvent;

/// Resolution of the seek control.
pub const SEEK_CONTROL_MAX: f64 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct TransportController {
    position: f64,
    duration: Option<f64>,
    playing: bool,
}

impl TransportController {
    /// Back to `00:00` for a freshly loaded track.
    pub fn reset(&mut self) {
        self.position = 0.0;
        self.duration = None;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// The pause flag a play/pause press should request.  The displayed state
    /// only flips once the element reports back.
    pub fn play_pause(&self) -> bool {
        self.playing
    }

    /// Returns true for end-of-media so the caller can advance the playlist.
    pub fn on_element_event(&mut self, event: &ElementEvent) -> bool {
        match event {
            ElementEvent::Playing => self.playing = true,
            ElementEvent::Paused | ElementEvent::Failed(_) => self.playing = false,
            ElementEvent::TimeUpdate(pos) => {
                if pos.is_finite() && *pos >= 0.0 {
                    self.position = *pos;
                }
            }
            ElementEvent::DurationChanged(d) => {
                self.duration = d.filter(|d| d.is_finite() && *d > 0.0);
            }
            ElementEvent::Ended => {
                self.playing = false;
                return true;
            }
        }
        false
    }

    /// The element is now owned by the radio.
    pub fn release(&mut self) {
        self.playing = false;
    }

    /// Map a 0–100 control value to seconds.  `None` until a duration is known.
    pub fn seek_target(&self, control: f64) -> Option<f64> {
        let duration = self.duration?;
        let fraction = (control / SEEK_CONTROL_MAX).clamp(0.0, 1.0);
        Some(fraction * duration)
    }

    /// Current position on the 0–100 control scale.
    pub fn progress_value(&self) -> f64 {
        match self.duration {
            Some(d) => (self.position / d * SEEK_CONTROL_MAX).clamp(0.0, SEEK_CONTROL_MAX),
            None => 0.0,
        }
    }

    pub fn position_label(&self) -> String {
        format_clock(self.position)
    }

    pub fn duration_label(&self) -> String {
        format_clock(self.duration.unwrap_or(0.0))
    }
}

/// `MM:SS` from whole seconds.  There is no hours field: an hour and a half
/// renders as `90:00`.
pub fn format_clock(secs: f64) -> String {
    let whole = if secs.is_finite() && secs > 0.0 {
        secs.floor() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_is_zero_padded_minutes_and_seconds() {
        assert_eq!(format_clock(0.0), "00:00");
        assert_eq!(format_clock(5.9), "00:05");
        assert_eq!(format_clock(65.0), "01:05");
        assert_eq!(format_clock(3725.0), "62:05");
        assert_eq!(format_clock(f64::NAN), "00:00");
        assert_eq!(format_clock(-3.0), "00:00");
    }

    #[test]
    fn seek_maps_control_value_onto_duration() {
        let mut t = TransportController::default();
        assert_eq!(t.seek_target(50.0), None);
        t.on_element_event(&ElementEvent::DurationChanged(Some(200.0)));
        assert_eq!(t.seek_target(50.0), Some(100.0));
        assert_eq!(t.seek_target(0.0), Some(0.0));
        assert_eq!(t.seek_target(150.0), Some(200.0));
    }

    #[test]
    fn progress_follows_time_updates() {
        let mut t = TransportController::default();
        t.on_element_event(&ElementEvent::DurationChanged(Some(120.0)));
        t.on_element_event(&ElementEvent::TimeUpdate(30.0));
        assert_eq!(t.progress_value(), 25.0);
        assert_eq!(t.position_label(), "00:30");
        assert_eq!(t.duration_label(), "02:00");

        t.reset();
        assert_eq!(t.progress_value(), 0.0);
        assert_eq!(t.position_label(), "00:00");
        assert_eq!(t.duration_label(), "00:00");
    }

    #[test]
    fn play_pause_waits_for_the_element() {
        let mut t = TransportController::default();
        assert!(!t.play_pause());
        t.on_element_event(&ElementEvent::Playing);
        assert!(t.play_pause());
        // Asking to pause changes nothing until the element confirms.
        assert!(t.is_playing());
        t.on_element_event(&ElementEvent::Paused);
        assert!(!t.play_pause());
    }

    #[test]
    fn only_end_of_media_requests_advance() {
        let mut t = TransportController::default();
        assert!(!t.on_element_event(&ElementEvent::Playing));
        assert!(t.is_playing());
        assert!(t.on_element_event(&ElementEvent::Ended));
        assert!(!t.is_playing());
    }
}
