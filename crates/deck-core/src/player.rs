//! Local player state: the loaded playlist, transport and artwork.

use std::path::PathBuf;

use rand::Rng;
use tempfile::TempDir;
use tracing::{debug, info};

use crate::debounce::RequestTokens;
use crate::library::{Artwork, LibraryError, LoadedLibrary};
use crate::playback::ElementEvent;
use crate::playlist::{Cursor, Playlist};
use crate::transport::TransportController;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryStatus {
    /// Nothing chosen yet, or the last load failed.
    #[default]
    Empty,
    Enumerating,
    Ready,
}

/// A track the audio element should start playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackLoad {
    pub generation: u64,
    pub index: usize,
    pub title: String,
    pub source: PathBuf,
    /// No embedded picture: ask the remote resolver.
    pub lookup_artwork: bool,
}

#[derive(Default)]
pub struct LocalPlayer {
    playlist: Playlist,
    transport: TransportController,
    status: LibraryStatus,
    label: Option<String>,
    loads: RequestTokens,
    art_dir: Option<TempDir>,
    remote_art: Option<(usize, String)>,
}

impl LocalPlayer {
    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn transport(&self) -> &TransportController {
        &self.transport
    }

    pub fn status(&self) -> LibraryStatus {
        self.status
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn controls_enabled(&self) -> bool {
        self.status == LibraryStatus::Ready && !self.playlist.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.loads.latest()
    }

    /// Start enumerating a new source.  Controls stay disabled until
    /// `finish_load` with the returned token.
    pub fn begin_load(&mut self, label: impl Into<String>) -> u64 {
        let label = label.into();
        info!("library: loading {}", label);
        self.label = Some(label);
        self.status = LibraryStatus::Enumerating;
        self.loads.issue()
    }

    /// Install a loaded library and cue its first track.  The previous
    /// load's artwork dir is dropped here.
    pub fn finish_load(&mut self, token: u64, loaded: LoadedLibrary) -> Option<TrackLoad> {
        if !self.loads.is_current(token) {
            debug!("library: dropping superseded load #{}", token);
            return None;
        }
        let shuffle = self.playlist.shuffle();
        self.playlist = Playlist::new(loaded.tracks, shuffle);
        self.art_dir = loaded.art_dir;
        self.remote_art = None;
        self.transport = TransportController::default();
        self.status = LibraryStatus::Ready;
        info!("library: {} tracks ready", self.playlist.len());
        self.playlist.cursor().map(|c| self.cue(c))
    }

    /// Back to the empty pre-load state.  Returns false for stale tokens.
    pub fn fail_load(&mut self, token: u64, err: &LibraryError) -> bool {
        if !self.loads.is_current(token) {
            return false;
        }
        info!("library: load failed: {}", err);
        let shuffle = self.playlist.shuffle();
        self.playlist = Playlist::new(Vec::new(), shuffle);
        self.art_dir = None;
        self.remote_art = None;
        self.transport = TransportController::default();
        self.status = LibraryStatus::Empty;
        self.label = None;
        true
    }

    pub fn select(&mut self, index: usize) -> Option<TrackLoad> {
        if !self.controls_enabled() {
            return None;
        }
        let cursor = self.playlist.select_index(index)?;
        Some(self.cue(cursor))
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<TrackLoad> {
        if !self.controls_enabled() {
            return None;
        }
        let cursor = self.playlist.next(rng)?;
        Some(self.cue(cursor))
    }

    pub fn previous(&mut self) -> Option<TrackLoad> {
        if !self.controls_enabled() {
            return None;
        }
        let cursor = self.playlist.previous()?;
        Some(self.cue(cursor))
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.playlist.toggle_shuffle()
    }

    /// Seconds to seek to for a 0–100 control value.
    pub fn seek_target(&self, control: f64) -> Option<f64> {
        if !self.controls_enabled() {
            return None;
        }
        self.transport.seek_target(control)
    }

    /// Feed an element event.  End-of-media advances and returns the next
    /// track to load.
    pub fn on_element_event<R: Rng + ?Sized>(
        &mut self,
        event: &ElementEvent,
        rng: &mut R,
    ) -> Option<TrackLoad> {
        if !self.transport.on_element_event(event) {
            return None;
        }
        if !self.controls_enabled() {
            return None;
        }
        let cursor = self.playlist.on_ended(rng)?;
        Some(self.cue(cursor))
    }

    pub fn release(&mut self) {
        self.transport.release();
    }

    /// Accept a looked-up cover if the same track of the same load is still
    /// current.
    pub fn apply_remote_artwork(&mut self, generation: u64, index: usize, url: String) -> bool {
        let current = self.playlist.cursor().map(Cursor::index);
        if !self.loads.is_current(generation) || current != Some(index) {
            debug!("library: dropping late artwork for track {}", index);
            return false;
        }
        self.remote_art = Some((index, url));
        true
    }

    /// Artwork to show for the current track.
    pub fn now_artwork(&self) -> Artwork {
        let Some(cursor) = self.playlist.cursor() else {
            return Artwork::None;
        };
        let track = &self.playlist.tracks()[cursor.index()];
        if !track.artwork.is_none() {
            return track.artwork.clone();
        }
        match &self.remote_art {
            Some((i, url)) if *i == cursor.index() => Artwork::Remote { url: url.clone() },
            _ => Artwork::None,
        }
    }

    fn cue(&mut self, cursor: Cursor) -> TrackLoad {
        self.transport.reset();
        self.remote_art = None;
        let track = &self.playlist.tracks()[cursor.index()];
        TrackLoad {
            generation: self.loads.latest(),
            index: cursor.index(),
            title: track.title.clone(),
            source: track.source.clone(),
            lookup_artwork: track.artwork.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Track;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn loaded(n: usize) -> LoadedLibrary {
        LoadedLibrary {
            tracks: (0..n)
                .map(|i| Track {
                    title: format!("t{i}.mp3"),
                    source: PathBuf::from(format!("/m/t{i}.mp3")),
                    artwork: if i == 1 {
                        Artwork::Embedded {
                            path: PathBuf::from("/tmp/1.jpg"),
                            mime: "image/jpeg".into(),
                        }
                    } else {
                        Artwork::None
                    },
                })
                .collect(),
            art_dir: None,
        }
    }

    #[test]
    fn controls_stay_disabled_until_load_resolves() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = LocalPlayer::default();
        let token = p.begin_load("/m");
        assert!(!p.controls_enabled());
        assert_eq!(p.next(&mut rng), None);

        let first = p.finish_load(token, loaded(3)).unwrap();
        assert!(p.controls_enabled());
        assert_eq!(first.index, 0);
        assert!(first.lookup_artwork);
        assert_eq!(p.transport().position_label(), "00:00");
    }

    #[test]
    fn superseded_load_is_ignored() {
        let mut p = LocalPlayer::default();
        let old = p.begin_load("/a");
        let new = p.begin_load("/b");
        assert!(p.finish_load(old, loaded(2)).is_none());
        assert_eq!(p.status(), LibraryStatus::Enumerating);
        assert!(p.finish_load(new, loaded(1)).is_some());
        assert_eq!(p.playlist().len(), 1);
    }

    #[test]
    fn ended_wraps_around_three_tracks() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut p = LocalPlayer::default();
        let token = p.begin_load("/m");
        p.finish_load(token, loaded(3));
        p.next(&mut rng);
        p.next(&mut rng);
        let wrapped = p.on_element_event(&ElementEvent::Ended, &mut rng).unwrap();
        assert_eq!(wrapped.index, 0);
        assert!(p
            .on_element_event(&ElementEvent::TimeUpdate(3.0), &mut rng)
            .is_none());
    }

    #[test]
    fn embedded_artwork_skips_lookup_and_wins() {
        let mut p = LocalPlayer::default();
        let token = p.begin_load("/m");
        p.finish_load(token, loaded(3));
        let load = p.select(1).unwrap();
        assert!(!load.lookup_artwork);
        p.apply_remote_artwork(token, 1, "https://x/600x600.jpg".into());
        assert!(matches!(p.now_artwork(), Artwork::Embedded { .. }));
    }

    #[test]
    fn remote_artwork_only_applies_to_current_track() {
        let mut p = LocalPlayer::default();
        let token = p.begin_load("/m");
        let first = p.finish_load(token, loaded(3)).unwrap();
        p.select(2);
        assert!(!p.apply_remote_artwork(first.generation, first.index, "https://late".into()));
        assert_eq!(p.now_artwork(), Artwork::None);

        assert!(p.apply_remote_artwork(token, 2, "https://a/600x600bb.jpg".into()));
        assert_eq!(
            p.now_artwork(),
            Artwork::Remote {
                url: "https://a/600x600bb.jpg".into()
            }
        );

        let reload = p.begin_load("/m");
        p.finish_load(reload, loaded(3));
        assert!(!p.apply_remote_artwork(token, 0, "https://stale".into()));
    }

    #[test]
    fn failed_load_returns_to_empty_state() {
        let mut p = LocalPlayer::default();
        let token = p.begin_load("/gone");
        assert!(p.fail_load(token, &LibraryError::NotFound("/gone".into())));
        assert_eq!(p.status(), LibraryStatus::Empty);
        assert!(p.label().is_none());
        assert!(!p.controls_enabled());
    }
}
