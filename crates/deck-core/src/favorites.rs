//! Favorite stations, persisted as one JSON document on every mutation.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::station::{Station, StationId};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FavoriteEntry {
    #[serde(flatten)]
    station: Station,
    #[serde(default = "Utc::now")]
    saved_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    entries: Vec<FavoriteEntry>,
    // Parallel to `entries`; kept so `list()` can hand out a slice.
    stations: Vec<Station>,
}

impl FavoritesStore {
    /// Load favorites from `path`.  Missing or corrupt data yields an empty list.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        info!("favorites: {} loaded from {:?}", entries.len(), path);
        let stations = entries.iter().map(|e| e.station.clone()).collect();
        Self {
            path,
            entries,
            stations,
        }
    }

    pub fn list(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_favorite(&self, id: &StationId) -> bool {
        self.entries.iter().any(|e| &e.station.id == id)
    }

    /// Add a snapshot of `station`, or remove the entry sharing its id.
    /// Returns whether the station is a favorite afterwards.  The in-memory
    /// list changes even if persisting fails; the error is returned so the
    /// caller can surface it.
    pub fn toggle(&mut self, station: &Station) -> anyhow::Result<bool> {
        let now_favorite = match self.entries.iter().position(|e| e.station.id == station.id) {
            Some(pos) => {
                self.entries.remove(pos);
                false
            }
            None => {
                self.entries.push(FavoriteEntry {
                    station: station.clone(),
                    saved_at: Utc::now(),
                });
                true
            }
        };
        self.stations = self.entries.iter().map(|e| e.station.clone()).collect();
        self.save()?;
        Ok(now_favorite)
    }

    fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

fn load_entries(path: &Path) -> Vec<FavoriteEntry> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<FavoriteEntry>>(&content) {
        Ok(mut entries) => {
            // Older or hand-edited files may repeat an id; first one wins.
            let mut seen = std::collections::HashSet::new();
            entries.retain(|e| seen.insert(e.station.id.clone()));
            entries
        }
        Err(e) => {
            warn!("favorites: ignoring unreadable {:?}: {}", path, e);
            Vec::new()
        }
    }
}
