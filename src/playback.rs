//! Audio playback through a single mpv process.
//!
//! One mpv instance (`--no-video --idle=yes`) is shared by the whole
//! application and driven over its JSON IPC unix socket. A writer task
//! serialises commands onto the socket and a reader task routes replies
//! back through a pending map keyed by request id; property changes and
//! end-of-file events are translated into [`PlayerUpdate`] values the
//! event loop drains between frames.

use crate::error::{AppError, Result};
use crate::types::Episode;
use log::{debug, info, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot, Mutex};

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

const OBS_PAUSE: u64 = 1;
const OBS_TIME_POS: u64 = 2;
const OBS_DURATION: u64 = 3;

const IPC_TIMEOUT: Duration = Duration::from_secs(5);

/// State change reported by mpv, drained by the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerUpdate {
    Position(f64),
    Duration(f64),
    Paused(bool),
    Ended,
}

/// What is currently loaded and where playback stands.
#[derive(Default)]
pub struct PlaybackState {
    pub current_episode: Option<Episode>,
    pub is_playing: bool,
    pub position: f64,
    pub duration: f64,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Playback progress as a ratio in [0, 1].
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.position / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Make an episode current, replacing whatever was loaded before.
    pub fn begin(&mut self, episode: Episode) {
        self.position = 0.0;
        self.duration = episode.duration.unwrap_or(0) as f64;
        self.is_playing = false;
        self.current_episode = Some(episode);
    }

    pub fn apply(&mut self, update: PlayerUpdate) {
        match update {
            PlayerUpdate::Position(p) => self.position = p,
            PlayerUpdate::Duration(d) => self.duration = d,
            PlayerUpdate::Paused(paused) => self.is_playing = !paused,
            PlayerUpdate::Ended => {
                self.is_playing = false;
                self.position = 0.0;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

struct PendingRequest {
    req_id: u64,
    payload: String,
    reply: oneshot::Sender<Result<Value>>,
}

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

/// Cloneable sender side of the writer task.
#[derive(Clone)]
struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
    async fn send(&self, command: Value) -> Result<Value> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let msg = json!({ "command": command, "request_id": req_id });
        let mut raw = serde_json::to_string(&msg)?;
        raw.push('\n');

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest {
                req_id,
                payload: raw,
                reply: reply_tx,
            })
            .await
            .map_err(|_| AppError::Playback("mpv writer task gone".to_string()))?;

        tokio::time::timeout(IPC_TIMEOUT, reply_rx)
            .await
            .map_err(|_| AppError::Playback(format!("mpv IPC timeout for req={}", req_id)))?
            .map_err(|_| AppError::Playback(format!("mpv reply channel dropped req={}", req_id)))?
    }
}

/// Owns the mpv child process and its IPC connection.
pub struct Player {
    binary: String,
    socket_path: PathBuf,
    process: Option<tokio::process::Child>,
    handle: Option<MpvHandle>,
    update_tx: mpsc::Sender<PlayerUpdate>,
}

impl Player {
    /// `binary` overrides the player executable; defaults to `mpv` on PATH.
    pub fn new(binary: Option<String>, update_tx: mpsc::Sender<PlayerUpdate>) -> Self {
        let socket_path =
            std::env::temp_dir().join(format!("poddeck-mpv-{}.sock", std::process::id()));
        Self {
            binary: binary.unwrap_or_else(|| "mpv".to_string()),
            socket_path,
            process: None,
            handle: None,
            update_tx,
        }
    }

    fn process_alive(&mut self) -> bool {
        if let Some(ref mut child) = self.process {
            child.try_wait().ok().flatten().is_none()
        } else {
            false
        }
    }

    /// Load an episode's enclosure URL and start playing.
    ///
    /// If the command fails (dead process, dropped socket), the process is
    /// recreated once and the load retried. A second failure is returned.
    pub async fn play(&mut self, url: &str) -> Result<()> {
        if self.handle.is_none() || !self.process_alive() {
            self.spawn_and_connect().await?;
        }
        if let Err(e) = self.load(url).await {
            warn!("Playback failed, restarting player: {}", e);
            self.spawn_and_connect().await?;
            self.load(url).await?;
        }
        Ok(())
    }

    async fn load(&self, url: &str) -> Result<()> {
        let handle = self.require_handle()?;
        handle.send(json!(["loadfile", url])).await?;
        handle.send(json!(["set_property", "pause", false])).await?;
        Ok(())
    }

    pub async fn set_pause(&self, paused: bool) -> Result<()> {
        self.require_handle()?
            .send(json!(["set_property", "pause", paused]))
            .await?;
        Ok(())
    }

    /// Stop playback and unload the current file; the idle process stays
    /// alive for the next track.
    pub async fn stop(&self) -> Result<()> {
        self.require_handle()?.send(json!(["stop"])).await?;
        Ok(())
    }

    pub async fn seek_to(&self, secs: f64) -> Result<()> {
        self.require_handle()?
            .send(json!(["set_property", "time-pos", secs.max(0.0)]))
            .await?;
        Ok(())
    }

    pub async fn seek_relative(&self, secs: f64) -> Result<()> {
        self.require_handle()?
            .send(json!(["seek", secs, "relative"]))
            .await?;
        Ok(())
    }

    /// Kill the mpv process on shutdown.
    pub async fn shutdown(&mut self) {
        self.handle = None;
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
        let _ = tokio::fs::remove_file(&self.socket_path).await;
    }

    fn require_handle(&self) -> Result<&MpvHandle> {
        self.handle
            .as_ref()
            .ok_or_else(|| AppError::Playback("player not running".to_string()))
    }

    async fn spawn_and_connect(&mut self) -> Result<()> {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
        self.handle = None;
        let _ = tokio::fs::remove_file(&self.socket_path).await;

        info!("Spawning player process: {}", self.binary);
        let ipc_arg = format!("--input-ipc-server={}", self.socket_path.display());
        let child = tokio::process::Command::new(&self.binary)
            .arg("--no-video")
            .arg("--idle=yes")
            .arg("--quiet")
            .arg(&ipc_arg)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| AppError::Playback(format!("Failed to start {}: {}", self.binary, e)))?;
        self.process = Some(child);

        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if self.socket_path.exists() {
                break;
            }
        }
        if !self.socket_path.exists() {
            return Err(AppError::Playback(
                "Player IPC socket did not appear".to_string(),
            ));
        }

        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| AppError::Playback(format!("Player IPC connect failed: {}", e)))?;
        debug!("Connected to player IPC socket");

        let handle = start_io_tasks(stream, self.update_tx.clone());
        observe_properties(&handle).await;
        self.handle = Some(handle);
        Ok(())
    }
}

async fn observe_properties(handle: &MpvHandle) {
    let props = [
        (OBS_PAUSE, "pause"),
        (OBS_TIME_POS, "time-pos"),
        (OBS_DURATION, "duration"),
    ];
    for (id, name) in &props {
        if let Err(e) = handle.send(json!(["observe_property", id, name])).await {
            warn!("observe_property {} failed: {}", name, e);
        }
    }
}

fn start_io_tasks(stream: UnixStream, update_tx: mpsc::Sender<PlayerUpdate>) -> MpvHandle {
    let (read_half, write_half) = stream.into_split();
    let reader = BufReader::new(read_half);

    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(reader, pending, update_tx));

    MpvHandle { tx: cmd_tx }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register the reply channel before writing so the reader can match it.
        {
            let mut map = pending.lock().await;
            map.insert(req.req_id, req.reply);
        }
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("Player IPC write error: {}", e);
            let mut map = pending.lock().await;
            if let Some(tx) = map.remove(&req.req_id) {
                let _ = tx.send(Err(AppError::Playback(format!(
                    "mpv write error: {}",
                    e
                ))));
            }
            break;
        }
    }
    debug!("Player writer task exiting");
}

async fn reader_task<R>(
    mut reader: BufReader<R>,
    pending: PendingMap,
    update_tx: mpsc::Sender<PlayerUpdate>,
) where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("Player IPC connection closed");
                fail_pending(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let val: Value = match serde_json::from_str(trimmed) {
                    Ok(v) => v,
                    Err(e) => {
                        debug!("Ignoring invalid IPC line '{}': {}", trimmed, e);
                        continue;
                    }
                };

                if let Some(req_id) = val.get("request_id").and_then(|v| v.as_u64()) {
                    let mut map = pending.lock().await;
                    if let Some(tx) = map.remove(&req_id) {
                        let result = if val["error"].as_str() == Some("success") {
                            Ok(val)
                        } else {
                            let err = val["error"].as_str().unwrap_or("unknown error");
                            Err(AppError::Playback(format!("mpv error: {}", err)))
                        };
                        let _ = tx.send(result);
                    }
                } else if let Some(update) = translate_event(&val) {
                    let _ = update_tx.send(update).await;
                }
            }
            Err(e) => {
                warn!("Player IPC read error: {}", e);
                fail_pending(&pending, "mpv IPC read error").await;
                break;
            }
        }
    }
}

async fn fail_pending(pending: &PendingMap, reason: &str) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(AppError::Playback(reason.to_string())));
    }
}

/// Map an unsolicited mpv event to a [`PlayerUpdate`], or None for events
/// the application does not track.
fn translate_event(val: &Value) -> Option<PlayerUpdate> {
    match val.get("event")?.as_str()? {
        "end-file" => Some(PlayerUpdate::Ended),
        "property-change" => {
            let id = val.get("id")?.as_u64()?;
            let data = val.get("data")?;
            match id {
                OBS_PAUSE => data.as_bool().map(PlayerUpdate::Paused),
                OBS_TIME_POS => data.as_f64().map(PlayerUpdate::Position),
                OBS_DURATION => data.as_f64().map(PlayerUpdate::Duration),
                _ => None,
            }
        }
        _ => None,
    }
}
