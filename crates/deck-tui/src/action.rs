//! Action enum: all user-initiated intents.

use std::path::PathBuf;

use deck_core::browser::StationTab;
use deck_core::state::WorkspaceKind;
use deck_core::station::StationId;

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    StationList,
    Playlist,
    NowPlaying,
}

/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Radio ────────────────────────────────────────────────────────────────
    PlayStation(StationId),
    ToggleFavorite(StationId),
    SwitchTab(StationTab),
    SearchChanged(String),
    SearchNow(String),

    // ── Local player ─────────────────────────────────────────────────────────
    PlayTrack(usize),
    NextTrack,
    PrevTrack,
    ToggleShuffle,
    /// Absolute seek on the 0–100 control scale.
    Seek(f64),
    /// Relative move on the 0–100 control scale.
    SeekBy(f64),
    OpenFolder(PathBuf),
    OpenFiles(Vec<PathBuf>),

    // ── Shared element ───────────────────────────────────────────────────────
    TogglePause,
    Volume(f32),

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),
    SwitchWorkspace(WorkspaceKind),

    // ── Input modes ──────────────────────────────────────────────────────────
    OpenFilter,
    CloseFilter,
    OpenPrompt(PromptKind),
    ClosePrompt,

    // ── System ───────────────────────────────────────────────────────────────
    CopyToClipboard(String),
    Quit,
}

/// What the path prompt will open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Folder,
    Files,
}

impl PromptKind {
    pub fn prefix(self) -> &'static str {
        match self {
            PromptKind::Folder => "folder:",
            PromptKind::Files => "files:",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            PromptKind::Folder => "~/Music",
            PromptKind::Files => "space-separated paths",
        }
    }
}
