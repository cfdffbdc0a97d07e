//! Playlist order, cursor and shuffle policy.
//!
//! `previous()` is always sequential, even with shuffle on; only forward
//! advance is randomized.

use std::sync::Arc;

use rand::Rng;

use crate::library::Track;

/// A valid position in the playlist it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor(usize);

impl Cursor {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Playlist {
    tracks: Arc<[Track]>,
    cursor: Option<Cursor>,
    shuffle: bool,
}

impl Playlist {
    /// New snapshot with the cursor on the first track.  Shuffle carries over
    /// from the previous load for the rest of the session.
    pub fn new(tracks: Vec<Track>, shuffle: bool) -> Self {
        let cursor = (!tracks.is_empty()).then_some(Cursor(0));
        Self {
            tracks: tracks.into(),
            cursor,
            shuffle,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn current(&self) -> Option<&Track> {
        self.cursor.map(|c| &self.tracks[c.0])
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.shuffle
    }

    /// Out-of-range indices leave the cursor untouched.
    pub fn select_index(&mut self, index: usize) -> Option<Cursor> {
        if index >= self.tracks.len() {
            return None;
        }
        self.cursor = Some(Cursor(index));
        self.cursor
    }

    pub fn previous(&mut self) -> Option<Cursor> {
        let n = self.tracks.len();
        let current = self.cursor?;
        self.cursor = Some(Cursor((current.0 + n - 1) % n));
        self.cursor
    }

    pub fn next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Cursor> {
        let n = self.tracks.len();
        let current = self.cursor?;
        let index = if self.shuffle {
            rng.gen_range(0..n)
        } else {
            (current.0 + 1) % n
        };
        self.cursor = Some(Cursor(index));
        self.cursor
    }

    /// End-of-track follows the same policy as `next()`.
    pub fn on_ended<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Cursor> {
        self.next(rng)
    }
}

impl Default for Playlist {
    fn default() -> Self {
        Self::new(Vec::new(), false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Artwork;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn tracks(n: usize) -> Vec<Track> {
        (0..n)
            .map(|i| Track {
                title: format!("{i}.mp3"),
                source: PathBuf::from(format!("/music/{i}.mp3")),
                artwork: Artwork::None,
            })
            .collect()
    }

    #[test]
    fn empty_playlist_operations_are_noops() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut p = Playlist::new(Vec::new(), true);
        assert_eq!(p.cursor(), None);
        assert_eq!(p.next(&mut rng), None);
        assert_eq!(p.previous(), None);
        assert_eq!(p.on_ended(&mut rng), None);
        assert_eq!(p.select_index(0), None);
        assert_eq!(p.cursor(), None);
        assert!(p.current().is_none());
    }

    #[test]
    fn sequential_next_cycles_and_previous_inverts() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut p = Playlist::new(tracks(4), false);
        let forward: Vec<usize> = (0..8).map(|_| p.next(&mut rng).unwrap().index()).collect();
        assert_eq!(forward, vec![1, 2, 3, 0, 1, 2, 3, 0]);

        let backward: Vec<usize> = (0..5).map(|_| p.previous().unwrap().index()).collect();
        assert_eq!(backward, vec![3, 2, 1, 0, 3]);
    }

    #[test]
    fn previous_ignores_shuffle() {
        let mut p = Playlist::new(tracks(3), true);
        assert_eq!(p.previous().unwrap().index(), 2);
        assert_eq!(p.previous().unwrap().index(), 1);
        assert_eq!(p.previous().unwrap().index(), 0);
    }

    #[test]
    fn three_tracks_wrap_after_two_nexts() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Playlist::new(tracks(3), false);
        assert_eq!(p.cursor().unwrap().index(), 0);
        p.next(&mut rng);
        assert_eq!(p.next(&mut rng).unwrap().index(), 2);
        assert_eq!(p.next(&mut rng).unwrap().index(), 0);
    }

    #[test]
    fn shuffle_stays_in_range_and_reaches_every_index() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut p = Playlist::new(tracks(5), false);
        assert!(p.toggle_shuffle());
        let mut seen = [false; 5];
        for _ in 0..500 {
            let i = p.next(&mut rng).unwrap().index();
            assert!(i < 5);
            seen[i] = true;
        }
        assert!(seen.iter().all(|s| *s), "indices never chosen: {seen:?}");
    }

    #[test]
    fn out_of_range_select_keeps_cursor() {
        let mut p = Playlist::new(tracks(2), false);
        p.select_index(1);
        assert_eq!(p.select_index(9), None);
        assert_eq!(p.cursor().unwrap().index(), 1);
        assert_eq!(p.current().unwrap().title, "1.mp3");
    }
}
