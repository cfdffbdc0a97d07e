//! Remembers the last chosen library folder across sessions.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct HandleFile {
    #[serde(rename = "dirHandle", default, skip_serializing_if = "Option::is_none")]
    dir_handle: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct HandleStore {
    path: PathBuf,
}

impl HandleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Replace the stored folder.  Last choice wins.
    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = HandleFile {
            dir_handle: Some(dir.to_path_buf()),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        info!("library: remembered {}", dir.display());
        Ok(())
    }

    pub fn load(&self) -> Option<PathBuf> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str::<HandleFile>(&content) {
            Ok(file) => file.dir_handle,
            Err(e) => {
                warn!("library: ignoring unreadable {}: {}", self.path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_corrupt_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = HandleStore::new(dir.path().join("library.json"));
        assert_eq!(store.load(), None);
        std::fs::write(dir.path().join("library.json"), "{not json").unwrap();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn last_save_wins_under_fixed_key() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("library.json");
        let store = HandleStore::new(&file);
        store.save(Path::new("/music/a")).unwrap();
        store.save(Path::new("/music/b")).unwrap();
        assert_eq!(store.load(), Some(PathBuf::from("/music/b")));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(raw["dirHandle"], "/music/b");
    }
}
