/// mpv JSON IPC driver.
///
/// ```text
///   MpvDriver::spawn_and_connect()
///         │
///         ├── writer_task   ← PendingRequest via mpsc → JSON line on the socket
///         └── reader_task   ← JSON lines from the socket
///                                ├── has request_id → matching oneshot::Sender
///                                └── otherwise      → MpvEvent on event_tx
/// ```
///
/// Requests are written in the order they are enqueued, so the core can
/// enqueue a `loadfile` synchronously and await its reply elsewhere.
///
/// Unix uses a domain socket, Windows a named pipe `\\.\pipe\<name>`.
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

#[cfg(unix)]
use tokio::net::UnixStream;

#[cfg(windows)]
use tokio::net::windows::named_pipe::ClientOptions;

static NEXT_REQ_ID: AtomicU64 = AtomicU64::new(1);

/// observe_property ids, matched in property-change events.
pub const OBS_CORE_IDLE: u64 = 1;
pub const OBS_PAUSE: u64 = 2;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

type Reply = oneshot::Sender<anyhow::Result<Value>>;
type PendingMap = Arc<Mutex<HashMap<u64, Reply>>>;

struct PendingRequest {
    req_id: u64,
    payload: String,
    reply: Reply,
}

/// Unsolicited mpv message: an event or a property change.
#[derive(Debug, Clone)]
pub struct MpvEvent {
    pub raw: Value,
}

impl MpvEvent {
    /// `Some((obs_id, data))` for property-change events.
    pub fn as_property_change(&self) -> Option<(u64, &Value)> {
        if self.event_name()? != "property-change" {
            return None;
        }
        let id = self.raw.get("id")?.as_u64()?;
        Some((id, self.raw.get("data").unwrap_or(&Value::Null)))
    }

    pub fn event_name(&self) -> Option<&str> {
        self.raw.get("event")?.as_str()
    }

    /// Playlist entry a start-file / end-file event refers to.
    pub fn playlist_entry_id(&self) -> Option<i64> {
        self.raw.get("playlist_entry_id")?.as_i64()
    }

    /// end-file reason: "eof", "stop", "quit", "error", "redirect".
    pub fn reason(&self) -> Option<&str> {
        self.raw.get("reason")?.as_str()
    }

    /// Error text mpv attaches to an end-file with reason "error".
    pub fn file_error(&self) -> Option<&str> {
        self.raw.get("file_error")?.as_str()
    }
}

/// Cloneable handle to the writer task.
#[derive(Clone)]
pub struct MpvHandle {
    tx: mpsc::Sender<PendingRequest>,
}

impl MpvHandle {
    /// Queue `command` and return the receiver for its reply.
    pub fn request(
        &self,
        command: Value,
    ) -> anyhow::Result<oneshot::Receiver<anyhow::Result<Value>>> {
        let req_id = NEXT_REQ_ID.fetch_add(1, Ordering::Relaxed);
        let mut payload = serde_json::to_string(&json!({
            "command": command,
            "request_id": req_id,
        }))?;
        payload.push('\n');

        let (reply, rx) = oneshot::channel();
        self.tx
            .try_send(PendingRequest {
                req_id,
                payload,
                reply,
            })
            .map_err(|e| anyhow::anyhow!("mpv writer unavailable: {}", e))?;
        Ok(rx)
    }

    pub async fn send(&self, command: Value) -> anyhow::Result<Value> {
        let rx = self.request(command)?;
        await_reply(rx).await
    }

    /// Queue `loadfile <url> replace`.  The reply resolves to the new
    /// playlist entry id when mpv reports one.
    pub fn begin_load(
        &self,
        url: &str,
    ) -> anyhow::Result<impl std::future::Future<Output = anyhow::Result<Option<i64>>>> {
        debug!("mpv: loadfile {}", url);
        let rx = self.request(json!(["loadfile", url, "replace"]))?;
        Ok(async move {
            let resp = await_reply(rx).await?;
            Ok(resp["data"]["playlist_entry_id"].as_i64())
        })
    }

    pub async fn stop(&self) -> anyhow::Result<()> {
        self.send(json!(["stop"])).await?;
        Ok(())
    }

    pub async fn set_volume(&self, volume: f32) -> anyhow::Result<()> {
        self.send(json!(["set_property", "volume", volume_pct(volume)]))
            .await?;
        Ok(())
    }

    pub async fn cycle(&self, property: &str) -> anyhow::Result<()> {
        self.send(json!(["cycle", property])).await?;
        Ok(())
    }

    /// Register the property observers.  Needed after every fresh connection.
    pub async fn observe_properties(&self) {
        for (id, name) in [(OBS_CORE_IDLE, "core-idle"), (OBS_PAUSE, "pause")] {
            match self.send(json!(["observe_property", id, name])).await {
                Ok(_) => debug!("mpv: observe_property id={} name={}", id, name),
                Err(e) => warn!("mpv: observe_property {} failed: {}", name, e),
            }
        }
    }

    pub async fn core_idle(&self) -> anyhow::Result<bool> {
        let resp = self.send(json!(["get_property", "core-idle"])).await?;
        resp["data"]
            .as_bool()
            .ok_or_else(|| anyhow::anyhow!("core-idle: unexpected reply {}", resp))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        self.send(json!(["get_property", "volume"])).await?;
        Ok(())
    }
}

async fn await_reply(rx: oneshot::Receiver<anyhow::Result<Value>>) -> anyhow::Result<Value> {
    tokio::time::timeout(REPLY_TIMEOUT, rx)
        .await
        .map_err(|_| anyhow::anyhow!("mpv IPC timeout"))?
        .map_err(|_| anyhow::anyhow!("mpv reply channel dropped"))?
}

fn volume_pct(volume: f32) -> f32 {
    (volume * 100.0).clamp(0.0, 100.0).round()
}

/// Owns the mpv child process.
pub struct MpvDriver {
    pub socket_name: String,
    process: Option<tokio::process::Child>,
    pub volume: f32,
    extra_args: Vec<String>,
}

impl MpvDriver {
    pub fn new(volume: f32, extra_args: Vec<String>) -> Self {
        Self {
            socket_name: carousel_proto::platform::mpv_socket_name(),
            process: None,
            volume,
            extra_args,
        }
    }

    pub fn process_alive(&mut self) -> bool {
        let Some(child) = self.process.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                match status.code() {
                    Some(code) => warn!("mpv exited with code {}", code),
                    None => warn!("mpv terminated by signal"),
                }
                false
            }
            Err(e) => {
                warn!("mpv: try_wait failed: {}", e);
                false
            }
        }
    }

    pub async fn kill(&mut self) {
        if let Some(mut p) = self.process.take() {
            let _ = p.kill().await;
        }
        #[cfg(unix)]
        {
            let _ = tokio::fs::remove_file(&self.socket_name).await;
        }
    }

    fn command(&self) -> anyhow::Result<tokio::process::Command> {
        let binary = carousel_proto::platform::find_mpv_binary()
            .ok_or_else(|| anyhow::anyhow!("mpv binary not found (set MPV_PATH)"))?;

        let stderr_path = carousel_proto::platform::data_dir().join("mpv-stderr.log");
        let stderr_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&stderr_path)?;
        debug!("mpv: stderr → {}", stderr_path.display());

        let mut cmd = tokio::process::Command::new(binary);
        cmd.arg("--idle=yes")
            .arg("--force-window=yes")
            .arg("--title=carousel")
            .arg("--quiet")
            .arg(carousel_proto::platform::mpv_socket_arg())
            .arg(format!("--volume={}", volume_pct(self.volume)))
            .args(&self.extra_args)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(stderr_file)
            .kill_on_drop(true);
        Ok(cmd)
    }

    #[cfg(unix)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let child = self.command()?.spawn()?;
        info!("mpv: spawned pid {:?}", child.id());
        self.process = Some(child);

        let socket_path = std::path::PathBuf::from(&self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if socket_path.exists() {
                break;
            }
        }
        if !socket_path.exists() {
            anyhow::bail!("mpv IPC socket did not appear");
        }

        let stream = UnixStream::connect(&socket_path).await?;
        info!("mpv: connected to {}", self.socket_name);
        Ok(start_io_tasks(stream, event_tx))
    }

    /// Connect to a socket left by a still-running mpv.
    #[cfg(unix)]
    pub async fn try_reconnect(&mut self, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
        if !std::path::Path::new(&self.socket_name).exists() {
            return None;
        }
        match UnixStream::connect(&self.socket_name).await {
            Ok(stream) => {
                info!("mpv: reconnected to existing socket");
                Some(start_io_tasks(stream, event_tx))
            }
            Err(e) => {
                warn!("mpv: reconnect failed: {}", e);
                None
            }
        }
    }

    #[cfg(windows)]
    pub async fn spawn_and_connect(
        &mut self,
        event_tx: mpsc::Sender<MpvEvent>,
    ) -> anyhow::Result<MpvHandle> {
        self.kill().await;

        let child = self.command()?.spawn()?;
        info!("mpv: spawned pid {:?}", child.id());
        self.process = Some(child);

        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if let Ok(client) = ClientOptions::new().open(&pipe_path) {
                info!("mpv: connected to {}", pipe_path);
                return Ok(start_io_tasks(client, event_tx));
            }
        }
        anyhow::bail!("mpv named pipe did not appear")
    }

    #[cfg(windows)]
    pub async fn try_reconnect(&mut self, event_tx: mpsc::Sender<MpvEvent>) -> Option<MpvHandle> {
        let pipe_path = format!(r"\\.\pipe\{}", self.socket_name);
        match ClientOptions::new().open(&pipe_path) {
            Ok(client) => Some(start_io_tasks(client, event_tx)),
            Err(e) => {
                warn!("mpv: reconnect failed: {}", e);
                None
            }
        }
    }
}

fn start_io_tasks<S>(stream: S, event_tx: mpsc::Sender<MpvEvent>) -> MpvHandle
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
    let (cmd_tx, cmd_rx) = mpsc::channel::<PendingRequest>(64);

    tokio::spawn(writer_task(write_half, cmd_rx, pending.clone()));
    tokio::spawn(reader_task(BufReader::new(read_half), pending, event_tx));

    MpvHandle { tx: cmd_tx }
}

async fn fail_all(pending: &PendingMap, why: &str) {
    let mut map = pending.lock().await;
    for (_, tx) in map.drain() {
        let _ = tx.send(Err(anyhow::anyhow!("{}", why)));
    }
}

async fn reader_task<R>(mut reader: BufReader<R>, pending: PendingMap, event_tx: mpsc::Sender<MpvEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                debug!("mpv reader: connection closed");
                fail_all(&pending, "mpv IPC connection closed").await;
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("mpv reader: {}", e);
                fail_all(&pending, "mpv IPC read error").await;
                break;
            }
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let val: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(e) => {
                debug!("mpv reader: bad json {:?}: {}", trimmed, e);
                continue;
            }
        };

        let Some(req_id) = val.get("request_id").and_then(Value::as_u64) else {
            debug!("mpv reader: event {}", trimmed);
            if event_tx.send(MpvEvent { raw: val }).await.is_err() {
                break;
            }
            continue;
        };

        let Some(tx) = pending.lock().await.remove(&req_id) else {
            debug!("mpv reader: reply for unknown req={}", req_id);
            continue;
        };
        let result = match val["error"].as_str() {
            Some("success") => Ok(val),
            other => Err(anyhow::anyhow!(
                "mpv error: {}",
                other.unwrap_or("unknown error")
            )),
        };
        let _ = tx.send(result);
    }
}

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: PendingMap)
where
    W: AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // register before writing so a fast reply finds its sender
        pending.lock().await.insert(req.req_id, req.reply);
        debug!("mpv writer: {}", req.payload.trim());
        if let Err(e) = writer.write_all(req.payload.as_bytes()).await {
            warn!("mpv writer: {}", e);
            if let Some(tx) = pending.lock().await.remove(&req.req_id) {
                let _ = tx.send(Err(anyhow::anyhow!("mpv write error: {}", e)));
            }
            break;
        }
    }
    debug!("mpv writer: exiting");
}
