//! AudioCore: single owner of the mpv process.
//!
//! The app sends `AudioCommand`s in and receives `ElementEvent`s back.  Status
//! is derived from observed mpv properties (`pause`, `core-idle`, `time-pos`,
//! `duration`) and `end-file`, never from the command that asked for it.

use std::time::Duration;

use deck_core::playback::ElementEvent;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, Property};

#[derive(Debug, Clone, PartialEq)]
pub enum AudioCommand {
    /// Stream URL or local file path.
    Load(String),
    SetPause(bool),
    TogglePause,
    SeekTo(f64),
    SetVolume(f32),
    Stop,
}

/// All inputs into the core loop.
#[derive(Debug)]
pub enum CoreEvent {
    Command(AudioCommand),
    Mpv(MpvEvent),
    /// Process liveness and connect timeout.
    Heartbeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Derived {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Observed element state, separate from the process plumbing so the
/// transitions can be tested without mpv.
struct Observed {
    active: bool,
    pause: bool,
    core_idle: Option<bool>,
    duration: Option<f64>,
    loading_since: Option<Instant>,
    last: Derived,
    connect_timeout: Duration,
}

impl Observed {
    fn new(connect_timeout: Duration) -> Self {
        Self {
            active: false,
            pause: false,
            core_idle: None,
            duration: None,
            loading_since: None,
            last: Derived::Idle,
            connect_timeout,
        }
    }

    fn begin_load(&mut self, now: Instant) {
        self.active = true;
        self.pause = false;
        self.core_idle = None;
        self.duration = None;
        self.loading_since = Some(now);
        self.last = Derived::Loading;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.loading_since = None;
        self.last = Derived::Idle;
    }

    /// Re-derive status; emits `Playing`/`Paused` on transitions, `Failed`
    /// once the load has been silent for too long.
    fn derive(&mut self, now: Instant) -> Option<ElementEvent> {
        let next = if !self.active {
            Derived::Idle
        } else if self.pause {
            Derived::Paused
        } else if self.core_idle == Some(false) {
            Derived::Playing
        } else {
            Derived::Loading
        };

        if next == Derived::Loading {
            let since = *self.loading_since.get_or_insert(now);
            let waited = now.saturating_duration_since(since);
            if waited >= self.connect_timeout {
                warn!("audio: no audio after {}s", waited.as_secs());
                self.deactivate();
                return Some(ElementEvent::Failed(format!(
                    "no audio after {}s",
                    waited.as_secs()
                )));
            }
        } else {
            self.loading_since = None;
        }

        if next == self.last {
            return None;
        }
        debug!("audio: {:?} → {:?}", self.last, next);
        self.last = next;
        match next {
            Derived::Playing => Some(ElementEvent::Playing),
            Derived::Paused => Some(ElementEvent::Paused),
            Derived::Idle | Derived::Loading => None,
        }
    }

    /// Fold one mpv event into the observed state.
    fn apply(&mut self, evt: &MpvEvent, now: Instant) -> Vec<ElementEvent> {
        match evt {
            MpvEvent::Changed(Property::CoreIdle, data) => self.core_idle = data.as_bool(),
            MpvEvent::Changed(Property::Pause, data) => {
                self.pause = data.as_bool().unwrap_or(false);
            }
            MpvEvent::Changed(Property::TimePos, data) => {
                return match (self.active, data.as_f64()) {
                    (true, Some(pos)) => vec![ElementEvent::TimeUpdate(pos)],
                    _ => vec![],
                };
            }
            MpvEvent::Changed(Property::Duration, data) => {
                let d = data.as_f64();
                if !self.active || d == self.duration {
                    return vec![];
                }
                self.duration = d;
                return vec![ElementEvent::DurationChanged(d)];
            }
            MpvEvent::EndFile { .. } if !self.active => return vec![],
            MpvEvent::EndFile { reason, file_error } => {
                return match reason.as_str() {
                    "eof" => {
                        info!("audio: end of media");
                        self.deactivate();
                        vec![ElementEvent::Ended]
                    }
                    "error" => {
                        let reason = file_error.clone().unwrap_or_else(|| "playback error".into());
                        warn!("audio: load failed: {}", reason);
                        self.deactivate();
                        vec![ElementEvent::Failed(reason)]
                    }
                    // "stop" fires when loadfile replaces the previous file.
                    other => {
                        debug!("audio: end-file reason={}", other);
                        vec![]
                    }
                };
            }
            MpvEvent::Other(_) => return vec![],
        }
        self.derive(now).into_iter().collect()
    }
}

pub struct AudioCore {
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    observed: Observed,
    /// Weak so the loop ends once the app drops its sender.
    core_tx: mpsc::WeakSender<CoreEvent>,
    element_tx: mpsc::Sender<ElementEvent>,
}

impl AudioCore {
    pub fn new(
        volume: f32,
        connect_timeout: Duration,
        core_tx: mpsc::Sender<CoreEvent>,
        element_tx: mpsc::Sender<ElementEvent>,
    ) -> Self {
        Self {
            driver: MpvDriver::new(volume),
            handle: None,
            observed: Observed::new(connect_timeout),
            core_tx: core_tx.downgrade(),
            element_tx,
        }
    }

    /// Runs until every command sender is gone.
    pub async fn run(mut self, mut rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("AudioCore: starting event loop");

        let heartbeat_tx = self.core_tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let Some(tx) = heartbeat_tx.upgrade() else { break };
                if tx.send(CoreEvent::Heartbeat).await.is_err() {
                    break;
                }
            }
        });

        while let Some(evt) = rx.recv().await {
            match evt {
                CoreEvent::Command(cmd) => {
                    debug!("AudioCore: command {:?}", cmd);
                    if let Err(e) = self.handle_command(cmd).await {
                        error!("AudioCore: command error: {}", e);
                    }
                }
                CoreEvent::Mpv(evt) => {
                    for out in self.observed.apply(&evt, Instant::now()) {
                        self.emit(out).await;
                    }
                }
                CoreEvent::Heartbeat => {
                    if self.handle.is_some() && !self.driver.process_alive() {
                        warn!("AudioCore: mpv process died");
                        self.handle = None;
                        if self.observed.active {
                            self.observed.deactivate();
                            self.emit(ElementEvent::Failed("audio engine exited".into()))
                                .await;
                        }
                    }
                    if self.observed.active {
                        if let Some(out) = self.observed.derive(Instant::now()) {
                            let failed = matches!(out, ElementEvent::Failed(_));
                            self.emit(out).await;
                            if failed {
                                self.stop_quietly().await;
                            }
                        }
                    }
                }
            }
        }

        self.cleanup().await;
        Ok(())
    }

    async fn emit(&self, event: ElementEvent) {
        let _ = self.element_tx.send(event).await;
    }

    async fn handle_command(&mut self, cmd: AudioCommand) -> anyhow::Result<()> {
        match cmd {
            AudioCommand::Load(target) => {
                let Some(handle) = self.ensure_handle().await else {
                    self.emit(ElementEvent::Failed("audio engine unavailable".into()))
                        .await;
                    return Ok(());
                };
                self.observed.begin_load(Instant::now());
                if let Err(e) = handle.load(&target, self.driver.last_volume).await {
                    self.observed.deactivate();
                    self.emit(ElementEvent::Failed(e.to_string())).await;
                }
            }
            AudioCommand::SetPause(paused) => {
                if let (true, Some(h)) = (self.observed.active, self.handle.as_ref()) {
                    h.set_pause(paused).await?;
                }
            }
            AudioCommand::TogglePause => {
                // Use the observed pause state rather than an IPC round-trip.
                if let (true, Some(h)) = (self.observed.active, self.handle.as_ref()) {
                    h.set_pause(!self.observed.pause).await?;
                }
            }
            AudioCommand::SeekTo(secs) => {
                if let (true, Some(h)) = (self.observed.active, self.handle.as_ref()) {
                    h.seek_to(secs).await?;
                }
            }
            AudioCommand::SetVolume(volume) => {
                self.driver.last_volume = volume;
                if let Some(h) = self.handle.as_ref() {
                    h.set_volume(volume).await?;
                }
            }
            AudioCommand::Stop => {
                self.observed.deactivate();
                self.stop_quietly().await;
            }
        }
        Ok(())
    }

    async fn stop_quietly(&self) {
        if let Some(h) = self.handle.as_ref() {
            if let Err(e) = h.stop().await {
                debug!("AudioCore: stop failed: {}", e);
            }
        }
    }

    async fn ensure_handle(&mut self) -> Option<MpvHandle> {
        if self.handle.is_some() && !self.driver.process_alive() {
            warn!("AudioCore: mpv process died, dropping handle");
            self.handle = None;
        }
        if self.handle.is_none() {
            let (event_tx, mut event_rx) = mpsc::channel::<MpvEvent>(64);
            let core_tx = self.core_tx.clone();
            tokio::spawn(async move {
                while let Some(evt) = event_rx.recv().await {
                    let Some(tx) = core_tx.upgrade() else { break };
                    if tx.send(CoreEvent::Mpv(evt)).await.is_err() {
                        break;
                    }
                }
            });

            let handle = match self.driver.spawn_and_connect(event_tx).await {
                Ok(h) => h,
                Err(e) => {
                    warn!("AudioCore: failed to start mpv: {}", e);
                    return None;
                }
            };
            handle.observe_properties().await;
            self.handle = Some(handle);
        }
        self.handle.clone()
    }

    async fn cleanup(&mut self) {
        info!("AudioCore: cleanup, killing mpv");
        if let Some(handle) = self.handle.take() {
            let _ = handle.stop().await;
        }
        self.driver.kill().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(property: Property, data: serde_json::Value) -> MpvEvent {
        MpvEvent::Changed(property, data)
    }

    fn end_file(reason: &str) -> MpvEvent {
        MpvEvent::EndFile {
            reason: reason.into(),
            file_error: None,
        }
    }

    #[test]
    fn playing_is_reported_once_audio_flows() {
        let t0 = Instant::now();
        let mut o = Observed::new(Duration::from_secs(15));
        o.begin_load(t0);
        assert!(o.apply(&prop(Property::CoreIdle, json!(true)), t0).is_empty());
        assert_eq!(
            o.apply(&prop(Property::CoreIdle, json!(false)), t0),
            vec![ElementEvent::Playing]
        );
        assert_eq!(o.apply(&prop(Property::Pause, json!(true)), t0), vec![ElementEvent::Paused]);
        assert_eq!(o.apply(&prop(Property::Pause, json!(false)), t0), vec![ElementEvent::Playing]);
    }

    #[test]
    fn silent_load_fails_after_the_connect_timeout() {
        let t0 = Instant::now();
        let mut o = Observed::new(Duration::from_secs(15));
        o.begin_load(t0);
        assert_eq!(o.derive(t0 + Duration::from_secs(14)), None);
        assert!(matches!(
            o.derive(t0 + Duration::from_secs(15)),
            Some(ElementEvent::Failed(_))
        ));
        assert!(!o.active);
    }

    #[test]
    fn end_file_reasons_map_to_element_events() {
        let t0 = Instant::now();
        let mut o = Observed::new(Duration::from_secs(15));
        o.begin_load(t0);
        assert!(o.apply(&end_file("stop"), t0).is_empty());
        assert_eq!(o.apply(&end_file("eof"), t0), vec![ElementEvent::Ended]);

        o.begin_load(t0);
        assert!(matches!(
            o.apply(&end_file("error"), t0).as_slice(),
            [ElementEvent::Failed(_)]
        ));
    }

    #[test]
    fn timeline_is_forwarded_only_while_active() {
        let t0 = Instant::now();
        let mut o = Observed::new(Duration::from_secs(15));
        assert!(o.apply(&prop(Property::TimePos, json!(3.0)), t0).is_empty());
        o.begin_load(t0);
        assert_eq!(
            o.apply(&prop(Property::Duration, json!(240.0)), t0),
            vec![ElementEvent::DurationChanged(Some(240.0))]
        );
        assert!(o.apply(&prop(Property::Duration, json!(240.0)), t0).is_empty());
        assert_eq!(
            o.apply(&prop(Property::TimePos, json!(3.0)), t0),
            vec![ElementEvent::TimeUpdate(3.0)]
        );
    }
}
