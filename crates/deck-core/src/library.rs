//! Local library sources and per-load track materialization.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artwork::{extract_bounded, TagExtractor};

/// Extensions a folder scan accepts.  Compared case-insensitively.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "opus", "m4a", "aac", "aiff"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artwork {
    None,
    /// Extracted into the load's temp dir.  Only valid while that load lives.
    Embedded { path: PathBuf, mime: String },
    Remote { url: String },
}

impl Artwork {
    pub fn is_none(&self) -> bool {
        matches!(self, Artwork::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub source: PathBuf,
    pub artwork: Artwork,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub path: PathBuf,
    pub name: String,
}

impl LibraryEntry {
    fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self { path, name }
    }
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LibraryError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

pub trait LibrarySource: Send + Sync {
    /// Short human label for the header ("~/Music", "3 files").
    fn label(&self) -> String;

    fn enumerate(&self) -> impl Future<Output = Result<Vec<LibraryEntry>, LibraryError>> + Send;
}

/// One folder, not recursive.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LibrarySource for DirectorySource {
    fn label(&self) -> String {
        self.root.display().to_string()
    }

    async fn enumerate(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        let err = |e| LibraryError::from_io(&self.root, e);
        let mut rd = tokio::fs::read_dir(&self.root).await.map_err(err)?;
        let mut entries = Vec::new();
        while let Some(entry) = rd.next_entry().await.map_err(err)? {
            let path = entry.path();
            let is_file = match entry.file_type().await {
                Ok(ft) => ft.is_file() || (ft.is_symlink() && path.is_file()),
                Err(_) => false,
            };
            if is_file && has_audio_extension(&path) {
                entries.push(LibraryEntry::from_path(path));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        info!("library: {} audio files in {}", entries.len(), self.root.display());
        Ok(entries)
    }
}

pub fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| AUDIO_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// An explicit set of files.  Membership is decided by content, not name.
#[derive(Debug, Clone)]
pub struct FileSetSource {
    paths: Vec<PathBuf>,
}

impl FileSetSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl LibrarySource for FileSetSource {
    fn label(&self) -> String {
        match self.paths.len() {
            1 => "1 file".to_string(),
            n => format!("{} files", n),
        }
    }

    async fn enumerate(&self) -> Result<Vec<LibraryEntry>, LibraryError> {
        let paths = self.paths.clone();
        let entries = tokio::task::spawn_blocking(move || {
            paths
                .into_iter()
                .filter(|p| sniff_audio(p))
                .map(LibraryEntry::from_path)
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| LibraryError::Io {
            path: PathBuf::new(),
            source: io::Error::new(io::ErrorKind::Other, e.to_string()),
        })?;
        info!(
            "library: {} of {} selected files are audio",
            entries.len(),
            self.paths.len()
        );
        Ok(entries)
    }
}

/// Probe the file header for a known audio container.
fn sniff_audio(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    // `Probe::new` rather than `Probe::open`: no fallback to the extension.
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("library: cannot open {}: {}", path.display(), e);
            return false;
        }
    };
    match lofty::probe::Probe::new(io::BufReader::new(file)).guess_file_type() {
        Ok(p) => p.file_type().is_some(),
        Err(e) => {
            debug!("library: cannot probe {}: {}", path.display(), e);
            false
        }
    }
}

/// Tracks of one load, plus the temp dir holding their extracted artwork.
/// Dropping this revokes every `Artwork::Embedded` path it handed out.
#[derive(Debug, Default)]
pub struct LoadedLibrary {
    pub tracks: Vec<Track>,
    pub art_dir: Option<TempDir>,
}

/// Materialize tracks from enumerated entries.  Resolves once every
/// extraction attempt has finished or timed out.
pub async fn load_library(
    entries: Vec<LibraryEntry>,
    extractor: Arc<dyn TagExtractor>,
    timeout: Duration,
) -> LoadedLibrary {
    let pictures = join_all(
        entries
            .iter()
            .map(|e| extract_bounded(extractor.clone(), e.path.clone(), timeout)),
    )
    .await;

    let art_dir = if pictures.iter().any(Option::is_some) {
        match tempfile::Builder::new().prefix("tunedeck-art-").tempdir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!("library: cannot create artwork dir: {}", e);
                None
            }
        }
    } else {
        None
    };

    let mut tracks = Vec::with_capacity(entries.len());
    for (i, (entry, picture)) in entries.into_iter().zip(pictures).enumerate() {
        let artwork = match (picture, &art_dir) {
            (Some(pic), Some(dir)) => {
                let path = dir.path().join(format!("{}.{}", i, pic.file_extension()));
                match tokio::fs::write(&path, &pic.data).await {
                    Ok(()) => Artwork::Embedded {
                        path,
                        mime: pic.mime,
                    },
                    Err(e) => {
                        warn!("library: cannot write artwork for {}: {}", entry.name, e);
                        Artwork::None
                    }
                }
            }
            _ => Artwork::None,
        };
        tracks.push(Track {
            title: entry.name,
            source: entry.path,
            artwork,
        });
    }

    LoadedLibrary { tracks, art_dir }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list_is_case_insensitive() {
        assert!(has_audio_extension(Path::new("/m/a.MP3")));
        assert!(has_audio_extension(Path::new("b.Flac")));
        assert!(has_audio_extension(Path::new("c.aiff")));
        assert!(!has_audio_extension(Path::new("cover.jpg")));
        assert!(!has_audio_extension(Path::new("README")));
        assert!(!has_audio_extension(Path::new("song.wv")));
    }

    #[test]
    fn io_errors_map_to_library_errors() {
        let p = Path::new("/nope");
        assert!(matches!(
            LibraryError::from_io(p, io::Error::from(io::ErrorKind::PermissionDenied)),
            LibraryError::PermissionDenied(_)
        ));
        assert!(matches!(
            LibraryError::from_io(p, io::Error::from(io::ErrorKind::NotFound)),
            LibraryError::NotFound(_)
        ));
        assert!(matches!(
            LibraryError::from_io(p, io::Error::from(io::ErrorKind::InvalidData)),
            LibraryError::Io { .. }
        ));
    }

    #[test]
    fn file_set_label_counts_files() {
        assert_eq!(FileSetSource::new(vec!["a".into()]).label(), "1 file");
        assert_eq!(FileSetSource::new(vec![]).label(), "0 files");
    }
}
