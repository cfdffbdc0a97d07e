//! FocusRing: keyboard focus cycling between the panes of a workspace.

use deck_core::state::WorkspaceKind;

use crate::action::ComponentId;

pub struct FocusRing {
    items: Vec<ComponentId>,
    current: usize,
}

impl FocusRing {
    pub fn new(items: Vec<ComponentId>) -> Self {
        Self { items, current: 0 }
    }

    /// Panes reachable in `workspace`, in Tab order.
    pub fn for_workspace(workspace: WorkspaceKind) -> Self {
        match workspace {
            WorkspaceKind::Stations => Self::new(vec![ComponentId::StationList]),
            WorkspaceKind::Library => {
                Self::new(vec![ComponentId::Playlist, ComponentId::NowPlaying])
            }
        }
    }

    pub fn current(&self) -> Option<ComponentId> {
        self.items.get(self.current).copied()
    }

    pub fn next(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + 1) % self.items.len();
        self.current()
    }

    pub fn prev(&mut self) -> Option<ComponentId> {
        if self.items.is_empty() {
            return None;
        }
        self.current = (self.current + self.items.len() - 1) % self.items.len();
        self.current()
    }

    /// No-op for components outside the ring.
    pub fn set(&mut self, id: ComponentId) {
        if let Some(pos) = self.items.iter().position(|&x| x == id) {
            self.current = pos;
        }
    }

    pub fn is_focused(&self, id: ComponentId) -> bool {
        self.current() == Some(id)
    }

    pub fn set_by_position(&mut self, pos: usize) -> Option<ComponentId> {
        if pos < self.items.len() {
            self.current = pos;
        }
        self.current()
    }
}
