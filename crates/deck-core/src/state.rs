//! Session state that survives restarts: volume and the active workspace.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceKind {
    #[default]
    Stations,
    Library,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistentState {
    pub volume: f32,
    #[serde(default)]
    pub workspace: WorkspaceKind,
}

impl Default for PersistentState {
    fn default() -> Self {
        Self {
            volume: 0.7,
            workspace: WorkspaceKind::default(),
        }
    }
}

pub struct StateStore {
    state_file: PathBuf,
}

impl StateStore {
    pub fn new(state_file: PathBuf) -> Self {
        Self { state_file }
    }

    /// Defaults when the file is missing or unreadable.
    pub fn load(&self, default_volume: f32) -> PersistentState {
        let fallback = PersistentState {
            volume: default_volume,
            ..PersistentState::default()
        };
        let Ok(content) = std::fs::read_to_string(&self.state_file) else {
            return fallback;
        };
        match serde_json::from_str::<PersistentState>(&content) {
            Ok(mut state) => {
                state.volume = state.volume.clamp(0.0, 1.0);
                state
            }
            Err(e) => {
                warn!("state: ignoring {}: {}", self.state_file.display(), e);
                fallback
            }
        }
    }

    pub fn save(&self, state: &PersistentState) -> anyhow::Result<()> {
        if let Some(parent) = self.state_file.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.state_file, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_and_clamps_volume() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));
        assert_eq!(store.load(0.4).volume, 0.4);

        store
            .save(&PersistentState {
                volume: 0.25,
                workspace: WorkspaceKind::Library,
            })
            .unwrap();
        let back = store.load(0.4);
        assert_eq!(back.volume, 0.25);
        assert_eq!(back.workspace, WorkspaceKind::Library);

        std::fs::write(dir.path().join("state.json"), r#"{"volume": 3.0}"#).unwrap();
        let clamped = store.load(0.4);
        assert_eq!(clamped.volume, 1.0);
        assert_eq!(clamped.workspace, WorkspaceKind::Stations);
    }
}
