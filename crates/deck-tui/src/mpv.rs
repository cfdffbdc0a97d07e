//! mpv child process plus its JSON IPC connection.
//!
//! One task owns the connection: it writes queued requests, reads replies and
//! events line by line, and resolves each reply against the request that is
//! waiting on it.  Unix talks over a domain socket, Windows over the named
//! pipe `\\.\pipe\<name>`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use deck_core::platform;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_ATTEMPTS: usize = 50;
const CONNECT_RETRY: Duration = Duration::from_millis(100);

type Reply = anyhow::Result<Value>;

/// Properties observed on every connection.  The discriminant doubles as the
/// `observe_property` id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Property {
    CoreIdle = 1,
    Pause = 2,
    TimePos = 3,
    Duration = 4,
}

impl Property {
    const ALL: [Property; 4] = [
        Property::CoreIdle,
        Property::Pause,
        Property::TimePos,
        Property::Duration,
    ];

    fn name(self) -> &'static str {
        match self {
            Property::CoreIdle => "core-idle",
            Property::Pause => "pause",
            Property::TimePos => "time-pos",
            Property::Duration => "duration",
        }
    }

    fn from_id(id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| *p as u64 == id)
    }
}

/// Unsolicited messages from mpv that the audio core cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum MpvEvent {
    Changed(Property, Value),
    /// `reason` is "eof", "stop", "error", ...
    EndFile {
        reason: String,
        file_error: Option<String>,
    },
    Other(String),
}

impl MpvEvent {
    fn decode(msg: &Value) -> Option<Self> {
        let text = |key: &str| msg.get(key).and_then(Value::as_str).map(str::to_owned);
        Some(match msg.get("event")?.as_str()? {
            "property-change" => {
                let property = Property::from_id(msg.get("id")?.as_u64()?)?;
                MpvEvent::Changed(property, msg.get("data").cloned().unwrap_or(Value::Null))
            }
            "end-file" => MpvEvent::EndFile {
                reason: text("reason").unwrap_or_else(|| "unknown".into()),
                file_error: text("file_error"),
            },
            other => MpvEvent::Other(other.to_owned()),
        })
    }
}

enum Incoming {
    Reply(u64, Reply),
    Event(MpvEvent),
}

fn decode_line(line: &str) -> Option<Incoming> {
    let msg: Value = match serde_json::from_str(line.trim()) {
        Ok(v) => v,
        Err(e) => {
            if !line.trim().is_empty() {
                debug!("mpv: skipping unparsable line {:?}: {}", line, e);
            }
            return None;
        }
    };
    let Some(id) = msg.get("request_id").and_then(Value::as_u64) else {
        return MpvEvent::decode(&msg).map(Incoming::Event);
    };
    let reply = match msg.get("error").and_then(Value::as_str) {
        Some("success") => Ok(msg),
        status => Err(anyhow!("mpv error: {}", status.unwrap_or("unknown error"))),
    };
    Some(Incoming::Reply(id, reply))
}

struct Request {
    id: u64,
    line: String,
    reply: oneshot::Sender<Reply>,
}

/// Cloneable sender side of a live connection.
#[derive(Clone)]
pub struct MpvHandle {
    requests: mpsc::Sender<Request>,
    next_id: Arc<AtomicU64>,
}

impl MpvHandle {
    fn start<S>(stream: S, events: mpsc::Sender<MpvEvent>) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (requests, queue) = mpsc::channel(64);
        tokio::spawn(pump(stream, queue, events));
        Self {
            requests,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub async fn send(&self, command: Value) -> Reply {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut line = json!({ "command": command, "request_id": id }).to_string();
        line.push('\n');
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(Request { id, line, reply })
            .await
            .map_err(|_| anyhow!("mpv connection is closed"))?;
        match tokio::time::timeout(REPLY_TIMEOUT, answer).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(anyhow!("mpv dropped request {}", id)),
            Err(_) => Err(anyhow!("mpv did not answer request {} in time", id)),
        }
    }

    async fn set(&self, property: &str, value: Value) -> anyhow::Result<()> {
        self.send(json!(["set_property", property, value])).await.map(drop)
    }

    /// Replace whatever is playing, unpaused, at `volume`.
    pub async fn load(&self, target: &str, volume: f32) -> anyhow::Result<()> {
        debug!("mpv: loadfile {}", target);
        self.send(json!(["loadfile", target, "replace"])).await?;
        self.set_pause(false).await?;
        self.set_volume(volume).await
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(json!(["stop"])).await.map(drop)
    }

    pub async fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        self.set("volume", json!(volume_percent(volume))).await
    }

    pub async fn set_pause(&self, paused: bool) -> anyhow::Result<()> {
        self.set("pause", json!(paused)).await
    }

    pub async fn seek_to(&self, secs: f64) -> anyhow::Result<()> {
        self.send(json!(["seek", secs, "absolute"])).await.map(drop)
    }

    /// Needed once per connection; a failure only costs that property's updates.
    pub async fn observe_properties(&self) {
        for property in Property::ALL {
            let command = json!(["observe_property", property as u64, property.name()]);
            if let Err(e) = self.send(command).await {
                warn!("mpv: cannot observe {}: {}", property.name(), e);
            }
        }
    }
}

fn volume_percent(volume: f32) -> f32 {
    (volume * 100.0).clamp(0.0, 100.0)
}

async fn pump<S>(stream: S, mut queue: mpsc::Receiver<Request>, events: mpsc::Sender<MpvEvent>)
where
    S: AsyncRead + AsyncWrite,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut lines = BufReader::new(read_half).lines();
    let mut waiting: HashMap<u64, oneshot::Sender<Reply>> = HashMap::new();

    let ended = loop {
        tokio::select! {
            request = queue.recv() => {
                let Some(request) = request else { break "all handles dropped" };
                debug!("mpv ← {}", request.line.trim_end());
                if let Err(e) = write_half.write_all(request.line.as_bytes()).await {
                    warn!("mpv: write failed: {}", e);
                    let _ = request.reply.send(Err(anyhow!("mpv write failed: {}", e)));
                    break "write failed";
                }
                waiting.insert(request.id, request.reply);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => match decode_line(&line) {
                    Some(Incoming::Reply(id, reply)) => match waiting.remove(&id) {
                        Some(tx) => {
                            let _ = tx.send(reply);
                        }
                        None => debug!("mpv: reply to unknown request {}", id),
                    },
                    Some(Incoming::Event(event)) => {
                        if events.send(event).await.is_err() {
                            break "event receiver dropped";
                        }
                    }
                    None => {}
                },
                Ok(None) => break "connection closed",
                Err(e) => {
                    warn!("mpv: read failed: {}", e);
                    break "read failed";
                }
            },
        }
    };

    debug!("mpv: connection ended: {}", ended);
    for (_, tx) in waiting.drain() {
        let _ = tx.send(Err(anyhow!("mpv {}", ended)));
    }
}

#[cfg(unix)]
async fn open_ipc() -> std::io::Result<tokio::net::UnixStream> {
    tokio::net::UnixStream::connect(platform::mpv_socket_name()).await
}

#[cfg(windows)]
async fn open_ipc() -> std::io::Result<tokio::net::windows::named_pipe::NamedPipeClient> {
    tokio::net::windows::named_pipe::ClientOptions::new()
        .open(format!(r"\\.\pipe\{}", platform::mpv_socket_name()))
}

/// Owns the mpv child process.
pub struct MpvDriver {
    child: Option<tokio::process::Child>,
    /// Passed on the command line when (re)spawning.
    pub last_volume: f32,
}

impl MpvDriver {
    pub fn new(volume: f32) -> Self {
        Self {
            child: None,
            last_volume: volume,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        match self.child.as_mut().map(|c| c.try_wait()) {
            None => false,
            Some(Ok(None)) => true,
            Some(Ok(Some(status))) => {
                warn!("mpv: exited with {}", status);
                false
            }
            Some(Err(e)) => {
                warn!("mpv: cannot poll process: {}", e);
                false
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill().await;
        }
    }

    fn spawn_process(&mut self) -> anyhow::Result<()> {
        let binary = platform::find_mpv_binary().ok_or_else(|| anyhow!("mpv binary not found"))?;
        let data_dir = platform::data_dir();
        std::fs::create_dir_all(&data_dir)?;
        let stderr_path = data_dir.join("mpv-stderr.log");
        let stderr = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;

        let child = tokio::process::Command::new(&binary)
            .args(["--no-video", "--idle=yes", "--quiet", "--no-terminal"])
            .arg(platform::mpv_socket_arg())
            .arg(format!("--volume={}", volume_percent(self.last_volume).round()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn()?;
        info!(
            "mpv: started {} (pid {:?}), stderr in {}",
            binary.display(),
            child.id(),
            stderr_path.display()
        );
        self.child = Some(child);
        Ok(())
    }

    /// Restart mpv and connect to its IPC server, retrying while it boots.
    pub async fn spawn_and_connect(
        &mut self,
        events: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;
        #[cfg(unix)]
        let _ = tokio::fs::remove_file(platform::mpv_socket_name()).await;
        self.spawn_process()?;

        let mut last_error = None;
        for _ in 0..CONNECT_ATTEMPTS {
            tokio::time::sleep(CONNECT_RETRY).await;
            match open_ipc().await {
                Ok(stream) => {
                    info!("mpv: IPC connected");
                    return Ok(MpvHandle::start(stream, events));
                }
                Err(e) => last_error = Some(e),
            }
        }
        Err(anyhow!(
            "mpv IPC never came up: {}",
            last_error.map(|e| e.to_string()).unwrap_or_default()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(line: &str) -> MpvEvent {
        match decode_line(line) {
            Some(Incoming::Event(e)) => e,
            _ => panic!("not an event: {line}"),
        }
    }

    #[test]
    fn observed_properties_decode_by_id() {
        assert_eq!(
            event(r#"{"event":"property-change","id":3,"name":"time-pos","data":12.5}"#),
            MpvEvent::Changed(Property::TimePos, json!(12.5))
        );
        assert_eq!(
            event(r#"{"event":"property-change","id":4,"name":"duration"}"#),
            MpvEvent::Changed(Property::Duration, Value::Null)
        );
        assert!(decode_line(r#"{"event":"property-change","id":99,"data":1}"#).is_none());
    }

    #[test]
    fn end_file_carries_reason_and_error() {
        assert_eq!(
            event(r#"{"event":"end-file","reason":"error","file_error":"loading failed"}"#),
            MpvEvent::EndFile {
                reason: "error".into(),
                file_error: Some("loading failed".into()),
            }
        );
        assert_eq!(event(r#"{"event":"idle"}"#), MpvEvent::Other("idle".into()));
    }

    #[test]
    fn replies_keep_their_request_id() {
        let Some(Incoming::Reply(id, ok)) = decode_line(r#"{"request_id":7,"error":"success"}"#)
        else {
            panic!("expected reply");
        };
        assert_eq!(id, 7);
        assert!(ok.is_ok());

        let Some(Incoming::Reply(_, err)) =
            decode_line(r#"{"request_id":8,"error":"property unavailable"}"#)
        else {
            panic!("expected reply");
        };
        assert!(err.unwrap_err().to_string().contains("property unavailable"));
        assert!(decode_line("not json").is_none());
    }

    #[tokio::test]
    async fn requests_resolve_while_events_stream_past() {
        let (client, server) = tokio::io::duplex(4096);
        let (event_tx, mut event_rx) = mpsc::channel(8);
        let handle = MpvHandle::start(client, event_tx);

        let fake_mpv = tokio::spawn(async move {
            let (read, mut write) = tokio::io::split(server);
            let mut lines = BufReader::new(read).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            let req: Value = serde_json::from_str(&line).unwrap();
            assert_eq!(req["command"], json!(["set_property", "pause", true]));
            let id = req["request_id"].as_u64().unwrap();
            write
                .write_all(b"{\"event\":\"property-change\",\"id\":2,\"data\":true}\n")
                .await
                .unwrap();
            write
                .write_all(format!("{{\"request_id\":{id},\"error\":\"success\"}}\n").as_bytes())
                .await
                .unwrap();
        });

        handle.set_pause(true).await.unwrap();
        assert_eq!(
            event_rx.recv().await,
            Some(MpvEvent::Changed(Property::Pause, json!(true)))
        );
        fake_mpv.await.unwrap();
    }

    #[tokio::test]
    async fn closed_connection_fails_waiting_requests() {
        let (client, server) = tokio::io::duplex(1024);
        let (event_tx, _event_rx) = mpsc::channel(8);
        let handle = MpvHandle::start(client, event_tx);
        let fake_mpv = tokio::spawn(async move {
            let (read, _write) = tokio::io::split(server);
            let mut lines = BufReader::new(read).lines();
            let _ = lines.next_line().await;
        });
        let err = handle.stop().await.unwrap_err();
        assert!(err.to_string().contains("connection closed"), "{err}");
        fake_mpv.await.unwrap();
    }
}
