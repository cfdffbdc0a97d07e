//! App: the single-owner event loop.
//!
//! Terminal input, element events, HTTP results and library loads all arrive
//! as `AppMessage`s on one channel.  Components turn input into `Action`s and
//! `apply_action` is the only place shared state changes.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use deck_core::artwork::{ArtworkResolver, LoftyExtractor, TagExtractor};
use deck_core::browser::{SearchRequest, StationBrowser};
use deck_core::config::Config;
use deck_core::debounce::Debouncer;
use deck_core::directory::{DirectoryError, StationDirectoryClient};
use deck_core::handles::HandleStore;
use deck_core::library::{
    load_library, DirectorySource, FileSetSource, LibraryError, LibrarySource, LoadedLibrary,
};
use deck_core::playback::{ElementEvent, RadioToggle};
use deck_core::player::TrackLoad;
use deck_core::state::{PersistentState, StateStore, WorkspaceKind};
use deck_core::station::Station;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    action::{Action, ComponentId, PromptKind},
    app_state::{AppState, ElementOwner},
    component::Component,
    components::{
        header::Header, now_playing::NowPlaying, playlist::Playlist, station_list::StationList,
    },
    core::{AudioCommand, CoreEvent},
    focus::FocusRing,
    widgets::{
        filter_input::{FilterAction, FilterInput},
        status_bar::{self, InputMode},
        toast::ToastManager,
    },
};

/// Step for ←/→ volume keys.
const VOLUME_STEP: f32 = 0.05;
/// Step for `,`/`.` on the 0–100 seek scale.
const SEEK_STEP: f64 = 5.0;

#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    Element(ElementEvent),
    SearchResult {
        token: u64,
        result: Result<Vec<Station>, DirectoryError>,
    },
    LibraryLoaded {
        token: u64,
        /// Set for folder loads; persisted on success.
        folder: Option<PathBuf>,
        /// User-chosen loads autoplay and surface errors; a restored folder
        /// only cues its first track and logs failures.
        user: bool,
        result: Result<LoadedLibrary, LibraryError>,
    },
    ArtworkFound {
        generation: u64,
        index: usize,
        url: String,
    },
}

/// Last-drawn layout rects, for mouse hit-testing.
#[derive(Debug, Default, Clone)]
struct PaneAreas {
    header: Rect,
    station_list: Rect,
    playlist: Rect,
    now_playing: Rect,
}

pub struct App {
    config: Config,
    state: AppState,

    // ── Components ────────────────────────────────────────────────────────────
    header: Header,
    station_list: StationList,
    playlist: Playlist,
    now_playing: NowPlaying,
    focus: FocusRing,
    prompt: Option<(PromptKind, FilterInput)>,

    // ── Services ──────────────────────────────────────────────────────────────
    core_tx: mpsc::Sender<CoreEvent>,
    directory: StationDirectoryClient,
    artwork: ArtworkResolver,
    extractor: Arc<dyn TagExtractor>,
    handles: HandleStore,
    state_store: StateStore,
    debouncer: Debouncer<String>,
    search_rx: mpsc::UnboundedReceiver<String>,
    rng: StdRng,

    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,

    should_quit: bool,
    pane_areas: PaneAreas,
    toast: ToastManager,
}

impl App {
    pub fn new(
        config: Config,
        browser: StationBrowser,
        persisted: PersistentState,
        state_store: StateStore,
        core_tx: mpsc::Sender<CoreEvent>,
    ) -> anyhow::Result<Self> {
        let directory = StationDirectoryClient::new(&config.directory)?;
        let artwork = ArtworkResolver::new(&config.artwork)?;
        let handles = HandleStore::new(config.paths.library_file.clone());
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::new(config.directory.debounce(), search_tx);
        let (tx, rx) = mpsc::channel::<AppMessage>(1024);

        let workspace = persisted.workspace;
        Ok(Self {
            config,
            state: AppState::new(browser, persisted.volume.clamp(0.0, 1.0), workspace),
            header: Header::new(),
            station_list: StationList::new(),
            playlist: Playlist::new(),
            now_playing: NowPlaying::new(),
            focus: FocusRing::for_workspace(workspace),
            prompt: None,
            core_tx,
            directory,
            artwork,
            extractor: Arc::new(LoftyExtractor),
            handles,
            state_store,
            debouncer,
            search_rx,
            rng: StdRng::from_entropy(),
            tx,
            rx: Some(rx),
            should_quit: false,
            pane_areas: PaneAreas::default(),
            toast: ToastManager::new(),
        })
    }

    pub async fn run(mut self, mut element_rx: mpsc::Receiver<ElementEvent>) -> anyhow::Result<()> {
        let Some(mut rx) = self.rx.take() else {
            anyhow::bail!("app already ran");
        };

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: element events (AudioCore → AppMessage) ──────────
        let el_tx = self.tx.clone();
        tokio::spawn(async move {
            while let Some(ev) = element_rx.recv().await {
                if el_tx.send(AppMessage::Element(ev)).await.is_err() {
                    break;
                }
            }
        });

        // ── Startup work ──────────────────────────────────────────────────────
        self.send_audio(AudioCommand::SetVolume(self.state.volume)).await;
        self.start_search();
        if let Some(folder) = self.handles.load() {
            info!("restoring library folder {}", folder.display());
            self.spawn_library_load(DirectorySource::new(folder.clone()), Some(folder), false);
        }

        // Toast expiry + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg).await;
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        redraw |= self.handle_message(next).await;
                    }
                    needs_redraw = redraw;
                }

                Some(_query) = self.search_rx.recv() => {
                    // The debounced value is already the browser's query.
                    self.start_search();
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.debouncer.cancel();
        self.send_audio(AudioCommand::Stop).await;
        self.save_session();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
        terminal.show_cursor()?;
        info!("tunedeck exiting");

        Ok(())
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    /// Returns whether a redraw is needed.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action).await;
                }
                matches!(
                    mouse.kind,
                    MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
                )
            }
            AppMessage::Event(Event::Resize(_, _)) => true,
            AppMessage::Event(_) => false,

            AppMessage::Element(ev) => {
                if let ElementEvent::Failed(reason) = &ev {
                    warn!("playback failed: {}", reason);
                    if self.state.owner.is_some() {
                        self.toast.error(format!("playback failed: {}", reason));
                    }
                }
                if let Some(load) = self.state.on_element_event(&ev, &mut self.rng) {
                    self.play_track(load).await;
                }
                true
            }

            AppMessage::SearchResult { token, result } => {
                if let Err(e) = &result {
                    warn!("station search failed: {}", e);
                }
                self.state.browser.finish_search(token, result)
            }

            AppMessage::LibraryLoaded {
                token,
                folder,
                user,
                result,
            } => {
                self.on_library_loaded(token, folder, user, result).await;
                true
            }

            AppMessage::ArtworkFound {
                generation,
                index,
                url,
            } => self.state.player.apply_remote_artwork(generation, index, url),
        }
    }

    async fn on_library_loaded(
        &mut self,
        token: u64,
        folder: Option<PathBuf>,
        user: bool,
        result: Result<LoadedLibrary, LibraryError>,
    ) {
        if token != self.state.player.generation() {
            debug!("library: ignoring superseded load #{}", token);
            return;
        }
        self.toast.dismiss_spinner();
        match result {
            Ok(loaded) => {
                let count = loaded.tracks.len();
                let cued = self.state.player.finish_load(token, loaded);
                if let Some(dir) = folder {
                    if let Err(e) = self.handles.save(&dir) {
                        warn!("library: could not remember {}: {}", dir.display(), e);
                    }
                }
                if count == 0 {
                    if user {
                        self.toast.warning("no audio files found");
                    }
                    return;
                }
                if user {
                    self.toast.success(format!("{} tracks loaded", count));
                }
                match cue_after_load(user, cued) {
                    Cue::Play(load) => self.play_track(load).await,
                    Cue::LookupArtwork(load) => self.spawn_artwork_lookup(load),
                    Cue::Nothing => {}
                }
            }
            Err(e) => {
                self.state.player.fail_load(token, &e);
                if user {
                    self.toast.error(format!("could not open library: {}", e));
                } else {
                    warn!("library: restore failed: {}", e);
                }
            }
        }
    }

    // ── Keyboard handling ─────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let mode = self.state.input_mode;

        // Global keys: always active regardless of focus/mode
        match key.code {
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit];
            }
            KeyCode::Char('q')
                if key.modifiers == KeyModifiers::NONE && mode == InputMode::Normal =>
            {
                return vec![Action::Quit];
            }
            _ => {}
        }

        // Path prompt captures everything
        if mode == InputMode::Command {
            let Some((kind, input)) = self.prompt.as_mut() else {
                return vec![Action::ClosePrompt];
            };
            let kind = *kind;
            return match input.handle_key(key) {
                FilterAction::Confirmed(text) => {
                    let mut actions = vec![Action::ClosePrompt];
                    match kind {
                        PromptKind::Folder if !text.trim().is_empty() => {
                            actions.push(Action::OpenFolder(expand_path(text.trim())));
                        }
                        PromptKind::Files => {
                            let paths: Vec<PathBuf> =
                                text.split_whitespace().map(expand_path).collect();
                            if !paths.is_empty() {
                                actions.push(Action::OpenFiles(paths));
                            }
                        }
                        _ => {}
                    }
                    actions
                }
                FilterAction::Cancelled => vec![Action::ClosePrompt],
                FilterAction::Changed(_) | FilterAction::None => vec![],
            };
        }

        // Tab / Shift-Tab always cycle focus (closing the search first)
        match key.code {
            KeyCode::Tab => {
                if mode == InputMode::Filter {
                    return vec![Action::CloseFilter, Action::FocusNext];
                }
                return vec![Action::FocusNext];
            }
            KeyCode::BackTab => {
                if mode == InputMode::Filter {
                    return vec![Action::CloseFilter, Action::FocusPrev];
                }
                return vec![Action::FocusPrev];
            }
            _ => {}
        }

        // Search typing goes straight to the station list
        if mode == InputMode::Filter {
            return self.station_list.handle_key(key, &self.state);
        }

        // Global playback keys (Normal mode only)
        match key.code {
            KeyCode::Char(' ') => return vec![Action::TogglePause],
            KeyCode::Right | KeyCode::Char('+') | KeyCode::Char('=') => {
                return vec![Action::Volume((self.state.volume + VOLUME_STEP).min(1.0))];
            }
            KeyCode::Left | KeyCode::Char('-') => {
                return vec![Action::Volume((self.state.volume - VOLUME_STEP).max(0.0))];
            }
            KeyCode::Char('w') => {
                return vec![Action::SwitchWorkspace(match self.state.workspace {
                    WorkspaceKind::Stations => WorkspaceKind::Library,
                    WorkspaceKind::Library => WorkspaceKind::Stations,
                })];
            }
            KeyCode::Char('1') => {
                self.focus.set_by_position(0);
                return vec![];
            }
            KeyCode::Char('2') => {
                self.focus.set_by_position(1);
                return vec![];
            }
            _ => {}
        }
        if self.state.workspace == WorkspaceKind::Library {
            match key.code {
                KeyCode::Char('n') => return vec![Action::NextTrack],
                KeyCode::Char('p') => return vec![Action::PrevTrack],
                KeyCode::Char('s') => return vec![Action::ToggleShuffle],
                KeyCode::Char(',') => return vec![Action::SeekBy(-SEEK_STEP)],
                KeyCode::Char('.') => return vec![Action::SeekBy(SEEK_STEP)],
                KeyCode::Char('o') => return vec![Action::OpenPrompt(PromptKind::Folder)],
                KeyCode::Char('O') => return vec![Action::OpenPrompt(PromptKind::Files)],
                _ => {}
            }
        }

        // Dispatch to the focused component
        let s = &self.state;
        match self.focus.current() {
            Some(ComponentId::StationList) => self.station_list.handle_key(key, s),
            Some(ComponentId::Playlist) => self.playlist.handle_key(key, s),
            Some(ComponentId::NowPlaying) => self.now_playing.handle_key(key, s),
            None => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click || self.state.input_mode == InputMode::Command {
            return vec![];
        }

        let col = event.column;
        let row = event.row;

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas.clone();
        let s = &self.state;

        macro_rules! click_pane {
            ($id:expr, $component:expr, $area:expr) => {{
                let mut actions = $component.handle_mouse(event, $area, s);
                if !self.focus.is_focused($id) {
                    actions.insert(0, Action::FocusPane($id));
                }
                return actions;
            }};
        }

        if hit(areas.header, col, row) {
            return self.header.handle_mouse(event, areas.header);
        }
        if hit(areas.station_list, col, row) {
            click_pane!(ComponentId::StationList, self.station_list, areas.station_list);
        }
        if hit(areas.playlist, col, row) {
            click_pane!(ComponentId::Playlist, self.playlist, areas.playlist);
        }
        if hit(areas.now_playing, col, row) {
            click_pane!(ComponentId::NowPlaying, self.now_playing, areas.now_playing);
        }
        vec![]
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    async fn dispatch(&mut self, action: Action) {
        // Components see the action before the app applies it
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.station_list.on_action(&action, s));
            out.extend(self.playlist.on_action(&action, s));
            out.extend(self.now_playing.on_action(&action, s));
            out
        };

        self.apply_action(action).await;

        for a in secondary {
            self.apply_action(a).await;
        }
    }

    async fn apply_action(&mut self, action: Action) {
        debug!("apply_action: {:?}", action);
        match action {
            // ── Radio ─────────────────────────────────────────────────────────
            Action::PlayStation(id) => {
                if let Some(url) = self.state.browser.select_station(&id) {
                    self.state.claim_element(ElementOwner::Radio);
                    self.send_audio(AudioCommand::Load(url)).await;
                }
            }
            Action::ToggleFavorite(id) => match self.state.browser.toggle_favorite(&id) {
                Some(Ok(true)) => self.toast.success("added to favorites"),
                Some(Ok(false)) => self.toast.info("removed from favorites"),
                Some(Err(e)) => {
                    warn!("favorites: {:#}", e);
                    self.toast.warning(format!("favorites not saved: {}", e));
                }
                None => {}
            },
            Action::SwitchTab(tab) => self.state.browser.set_tab(tab),
            Action::SearchChanged(query) => {
                self.state.browser.set_query(query.clone());
                self.debouncer.push(query);
            }
            Action::SearchNow(query) => {
                self.state.browser.set_query(query.clone());
                self.debouncer.flush(query);
            }

            // ── Local player ──────────────────────────────────────────────────
            Action::PlayTrack(index) => {
                if let Some(load) = self.state.player.select(index) {
                    self.play_track(load).await;
                }
            }
            Action::NextTrack => {
                if let Some(load) = self.state.player.next(&mut self.rng) {
                    self.play_track(load).await;
                }
            }
            Action::PrevTrack => {
                if let Some(load) = self.state.player.previous() {
                    self.play_track(load).await;
                }
            }
            Action::ToggleShuffle => {
                let on = self.state.player.toggle_shuffle();
                self.toast.info(if on { "shuffle on" } else { "shuffle off" });
            }
            Action::Seek(control) => self.seek(control).await,
            Action::SeekBy(delta) => {
                let control = self.state.player.transport().progress_value() + delta;
                self.seek(control).await;
            }
            Action::OpenFolder(path) => {
                self.spawn_library_load(DirectorySource::new(path.clone()), Some(path), true);
            }
            Action::OpenFiles(paths) => {
                self.spawn_library_load(FileSetSource::new(paths), None, true);
            }

            // ── Shared element ────────────────────────────────────────────────
            Action::TogglePause => {
                if self.state.owner == Some(ElementOwner::Library) {
                    if self.state.can_toggle() {
                        let pause = self.state.player.transport().play_pause();
                        self.send_audio(AudioCommand::SetPause(pause)).await;
                    }
                } else if self.state.owner == Some(ElementOwner::Radio) {
                    match self.state.browser.toggle() {
                        Some(RadioToggle::Element) => {
                            self.send_audio(AudioCommand::TogglePause).await
                        }
                        Some(RadioToggle::Reload(url)) => {
                            self.send_audio(AudioCommand::Load(url)).await
                        }
                        None => {}
                    }
                } else if self.state.owner.is_none()
                    && self.state.workspace == WorkspaceKind::Library
                {
                    // Start the cued track of a restored library
                    let cued = self.state.player.playlist().cursor().map(|c| c.index());
                    if let Some(load) = cued.and_then(|i| self.state.player.select(i)) {
                        self.play_track(load).await;
                    }
                }
            }
            Action::Volume(v) => {
                self.state.volume = v.clamp(0.0, 1.0);
                self.send_audio(AudioCommand::SetVolume(self.state.volume)).await;
                self.save_session();
            }

            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::SwitchWorkspace(ws) => {
                if self.state.workspace != ws {
                    self.state.workspace = ws;
                    self.focus = FocusRing::for_workspace(ws);
                    if self.state.input_mode == InputMode::Filter {
                        self.station_list.on_action(&Action::CloseFilter, &self.state);
                    }
                    self.state.input_mode = InputMode::Normal;
                    self.save_session();
                }
            }

            // ── Input modes ───────────────────────────────────────────────────
            Action::OpenFilter => self.state.input_mode = InputMode::Filter,
            Action::CloseFilter => {
                if self.state.input_mode == InputMode::Filter {
                    self.state.input_mode = InputMode::Normal;
                }
            }
            Action::OpenPrompt(kind) => {
                let mut input = FilterInput::new(kind.prefix(), kind.placeholder());
                input.activate();
                self.prompt = Some((kind, input));
                self.state.input_mode = InputMode::Command;
            }
            Action::ClosePrompt => {
                self.prompt = None;
                self.state.input_mode = InputMode::Normal;
            }

            // ── System ────────────────────────────────────────────────────────
            Action::CopyToClipboard(text) => {
                let clipboard = arboard::Clipboard::new();
                match clipboard.and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text.clone()
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.warning(format!("clipboard error: {}", e));
                    }
                }
            }
            Action::Quit => self.should_quit = true,
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);
        let (header_area, body_area, status_area) = (outer[0], outer[1], outer[2]);

        self.header.draw(frame, header_area, &self.state);
        self.pane_areas.header = header_area;

        match self.state.workspace {
            WorkspaceKind::Stations => {
                let focused = self.focus.is_focused(ComponentId::StationList);
                self.station_list.draw(frame, body_area, focused, &self.state);
                self.pane_areas.station_list = body_area;
                self.pane_areas.playlist = Rect::default();
                self.pane_areas.now_playing = Rect::default();
            }
            WorkspaceKind::Library => {
                let cols = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(body_area);
                let pl_focused = self.focus.is_focused(ComponentId::Playlist);
                let np_focused = self.focus.is_focused(ComponentId::NowPlaying);
                self.playlist.draw(frame, cols[0], pl_focused, &self.state);
                self.now_playing.draw(frame, cols[1], np_focused, &self.state);
                self.pane_areas.station_list = Rect::default();
                self.pane_areas.playlist = cols[0];
                self.pane_areas.now_playing = cols[1];
            }
        }

        match &self.prompt {
            Some((_, input)) if self.state.input_mode == InputMode::Command => {
                input.draw(frame, status_area);
            }
            _ => status_bar::draw_keys_bar(
                frame,
                status_area,
                self.state.input_mode,
                self.state.workspace,
            ),
        }

        // Toast notifications (topmost layer)
        self.toast.draw(frame, area);
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    async fn send_audio(&self, cmd: AudioCommand) {
        if let Err(e) = self.core_tx.send(CoreEvent::Command(cmd)).await {
            warn!("audio core gone: {}", e);
        }
    }

    /// Issue a directory request for the browser's current query.
    fn start_search(&mut self) {
        let request = self.state.browser.begin_search();
        debug!("search #{}: {:?}", request.token, request.query);
        let client = self.directory.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(run_search(client, request).await).await;
        });
    }

    fn spawn_library_load<S>(&mut self, source: S, folder: Option<PathBuf>, user: bool)
    where
        S: LibrarySource + 'static,
    {
        let label = source.label();
        let token = self.state.player.begin_load(label.clone());
        if user {
            self.toast.spinner(format!("reading {}", label));
        }
        let extractor = self.extractor.clone();
        let timeout = Duration::from_millis(self.config.artwork.extract_timeout_ms);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = match source.enumerate().await {
                Ok(entries) => Ok(load_library(entries, extractor, timeout).await),
                Err(e) => Err(e),
            };
            let _ = tx
                .send(AppMessage::LibraryLoaded {
                    token,
                    folder,
                    user,
                    result,
                })
                .await;
        });
    }

    /// Hand the element to the library and start `load`.
    async fn play_track(&mut self, load: TrackLoad) {
        info!("library: playing #{} {}", load.index, load.title);
        self.state.claim_element(ElementOwner::Library);
        let target = load.source.to_string_lossy().into_owned();
        self.send_audio(AudioCommand::Load(target)).await;

        if load.lookup_artwork {
            self.spawn_artwork_lookup(load);
        }
    }

    /// Remote cover search; the answer only sticks if the same track of the
    /// same load is still current.
    fn spawn_artwork_lookup(&self, load: TrackLoad) {
        let resolver = self.artwork.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match resolver.lookup(&load.title).await {
                Ok(Some(url)) => {
                    let _ = tx
                        .send(AppMessage::ArtworkFound {
                            generation: load.generation,
                            index: load.index,
                            url,
                        })
                        .await;
                }
                Ok(None) => debug!("artwork: no match for {}", load.title),
                Err(e) => debug!("artwork: lookup failed for {}: {:#}", load.title, e),
            }
        });
    }

    async fn seek(&mut self, control: f64) {
        if self.state.owner != Some(ElementOwner::Library) {
            return;
        }
        if let Some(secs) = self.state.player.seek_target(control) {
            self.send_audio(AudioCommand::SeekTo(secs)).await;
        }
    }

    fn save_session(&self) {
        let persisted = PersistentState {
            volume: self.state.volume,
            workspace: self.state.workspace,
        };
        if let Err(e) = self.state_store.save(&persisted) {
            warn!("could not save state: {:#}", e);
        }
    }
}

/// `~/Music` → `$HOME/Music`.
fn expand_path(text: &str) -> PathBuf {
    match text.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(text)),
        None if text == "~" => dirs::home_dir().unwrap_or_else(|| PathBuf::from(text)),
        None => PathBuf::from(text),
    }
}

/// Follow-up for the first track of a freshly read library.
#[derive(Debug, PartialEq)]
enum Cue {
    Play(TrackLoad),
    /// Restored at startup: stay quiet but still fetch the cover.
    LookupArtwork(TrackLoad),
    Nothing,
}

fn cue_after_load(user: bool, cued: Option<TrackLoad>) -> Cue {
    match cued {
        Some(load) if user => Cue::Play(load),
        Some(load) if load.lookup_artwork => Cue::LookupArtwork(load),
        _ => Cue::Nothing,
    }
}

/// Directory round-trip for one search; the token travels with the result.
async fn run_search(client: StationDirectoryClient, request: SearchRequest) -> AppMessage {
    let result = client.search(request.query.as_deref()).await;
    AppMessage::SearchResult {
        token: request.token,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::config::DirectoryConfig;

    fn cued(lookup_artwork: bool) -> TrackLoad {
        TrackLoad {
            generation: 3,
            index: 0,
            title: "one".into(),
            source: "/m/one.mp3".into(),
            lookup_artwork,
        }
    }

    #[test]
    fn restored_library_fetches_cover_without_playing() {
        assert_eq!(cue_after_load(true, Some(cued(true))), Cue::Play(cued(true)));
        assert_eq!(
            cue_after_load(false, Some(cued(true))),
            Cue::LookupArtwork(cued(true))
        );
        assert_eq!(cue_after_load(false, Some(cued(false))), Cue::Nothing);
        assert_eq!(cue_after_load(false, None), Cue::Nothing);
    }

    #[tokio::test]
    async fn search_result_keeps_its_token() {
        let config = DirectoryConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 2,
            ..DirectoryConfig::default()
        };
        let client = StationDirectoryClient::new(&config).unwrap();
        let request = SearchRequest {
            token: 7,
            query: Some("jazz".into()),
        };
        match run_search(client, request).await {
            AppMessage::SearchResult { token, result } => {
                assert_eq!(token, 7);
                assert!(result.is_err());
            }
            _ => panic!("expected a search result"),
        }
    }

    #[test]
    fn tilde_paths_expand_to_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~/Music"), home.join("Music"));
            assert_eq!(expand_path("~"), home);
        }
        assert_eq!(expand_path("/srv/audio"), PathBuf::from("/srv/audio"));
        assert_eq!(expand_path("rel/dir"), PathBuf::from("rel/dir"));
    }
}
