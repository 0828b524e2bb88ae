/// PlayerCore: single owner of the mpv driver, the load tracker and the
/// persisted state.
///
/// The UI sends `CoreEvent::Command`s; mpv events, `loadfile` replies and a
/// one-second heartbeat arrive on the same channel.  After every change the
/// core broadcasts a fresh `PlayerState` snapshot.
///
/// Loads are guarded by generation: the `loadfile` reply is awaited in a
/// spawned task and comes back as `LoadReply { generation, .. }`, and the
/// tracker drops replies and mpv events that belong to an older load.
use std::time::{Duration, Instant};

use carousel_proto::config::Config;
use carousel_proto::playback::{LoadOutcome, LoadTracker};
use carousel_proto::protocol::{Command, MpvHealth, PlayerState};
use carousel_proto::state::{PersistentState, StateStore};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::mpv::{MpvDriver, MpvEvent, MpvHandle, OBS_CORE_IDLE, OBS_PAUSE};
use crate::CoreMessage;

const HEARTBEAT: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub enum CoreEvent {
    Command(Command),
    Mpv(MpvEvent),
    LoadReply {
        generation: u64,
        result: anyhow::Result<Option<i64>>,
    },
    /// `core-idle` read back after `file-loaded` for the given entry.
    CoreIdle { entry: Option<i64>, idle: bool },
    /// Load deadline and process liveness check.
    HeartbeatTick,
    Shutdown,
}

pub struct PlayerCore {
    driver: MpvDriver,
    handle: Option<MpvHandle>,
    tracker: LoadTracker,
    store: StateStore,
    state: PlayerState,
    paused: bool,
    event_tx: mpsc::Sender<CoreEvent>,
    broadcast_tx: broadcast::Sender<CoreMessage>,
}

impl PlayerCore {
    pub fn new(
        config: &Config,
        broadcast_tx: broadcast::Sender<CoreMessage>,
        event_tx: mpsc::Sender<CoreEvent>,
    ) -> Self {
        let store = StateStore::open(
            config.paths.state_file.clone(),
            config.player.default_volume,
        );
        let volume = store.state().volume;
        Self {
            driver: MpvDriver::new(volume, config.player.mpv_args.clone()),
            handle: None,
            tracker: LoadTracker::new(Duration::from_secs(config.player.load_timeout_secs)),
            store,
            state: PlayerState {
                rev: 1,
                volume,
                ..PlayerState::default()
            },
            paused: false,
            event_tx,
            broadcast_tx,
        }
    }

    /// What was saved by the previous session.
    pub fn persisted(&self) -> PersistentState {
        self.store.state().clone()
    }

    pub fn snapshot(&self) -> PlayerState {
        self.state.clone()
    }

    pub async fn run(mut self, mut event_rx: mpsc::Receiver<CoreEvent>) -> anyhow::Result<()> {
        info!("PlayerCore: starting event loop");
        self.publish();

        let heartbeat_tx = self.event_tx.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(HEARTBEAT);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if heartbeat_tx.send(CoreEvent::HeartbeatTick).await.is_err() {
                    break;
                }
            }
        });

        while let Some(event) = event_rx.recv().await {
            match event {
                CoreEvent::Shutdown => {
                    info!("PlayerCore: shutdown requested");
                    break;
                }
                CoreEvent::Command(cmd) => {
                    info!("PlayerCore: command {:?}", cmd);
                    if let Err(e) = self.handle_command(cmd).await {
                        error!("PlayerCore: command failed: {}", e);
                    }
                }
                CoreEvent::Mpv(evt) => self.handle_mpv_event(evt),
                CoreEvent::LoadReply { generation, result } => {
                    let outcome = match result {
                        Ok(entry_id) => {
                            debug!("PlayerCore: load {} → entry {:?}", generation, entry_id);
                            self.tracker.attach(generation, entry_id)
                        }
                        Err(e) => self.tracker.reject(generation, e.to_string()),
                    };
                    self.apply(outcome);
                }
                CoreEvent::CoreIdle { entry, idle } => self.on_core_idle_read(entry, idle),
                CoreEvent::HeartbeatTick => self.heartbeat().await,
            }
        }

        self.cleanup().await;
        Ok(())
    }

    async fn heartbeat(&mut self) {
        if self.handle.is_some() && !self.driver.process_alive() {
            warn!("PlayerCore: mpv process died");
            self.handle = None;
            self.paused = false;
            self.set_mpv_health(MpvHealth::Dead);
            match self.tracker.reject(self.tracker.generation(), "mpv exited") {
                LoadOutcome::Unchanged => {
                    self.tracker.reset();
                    self.sync_status();
                }
                outcome => self.apply(outcome),
            }
        }
        let outcome = self.tracker.tick(Instant::now());
        self.apply(outcome);
    }

    fn handle_mpv_event(&mut self, evt: MpvEvent) {
        if let Some((id, data)) = evt.as_property_change() {
            match id {
                OBS_CORE_IDLE => {
                    if let Some(idle) = data.as_bool() {
                        debug!("mpv: core-idle → {}", idle);
                        let outcome = self.tracker.on_core_idle(idle);
                        self.apply(outcome);
                    }
                }
                OBS_PAUSE => {
                    let paused = data.as_bool().unwrap_or(false);
                    if paused != self.paused {
                        debug!("mpv: pause → {}", paused);
                        self.paused = paused;
                        self.tracker.set_paused(paused);
                        self.sync_status();
                    }
                }
                _ => {}
            }
            return;
        }

        match evt.event_name() {
            Some("start-file") => {
                debug!("mpv: start-file entry={:?}", evt.playlist_entry_id());
                self.tracker.on_start_file(evt.playlist_entry_id());
            }
            Some("file-loaded") => {
                // observers only fire on change; read the value once per file
                if let Some(h) = self.handle.clone() {
                    let entry = self.tracker.started_entry();
                    let tx = self.event_tx.clone();
                    tokio::spawn(async move {
                        match h.core_idle().await {
                            Ok(idle) => {
                                let _ = tx.send(CoreEvent::CoreIdle { entry, idle }).await;
                            }
                            Err(e) => debug!("mpv: core-idle read failed: {}", e),
                        }
                    });
                }
            }
            Some("end-file") => {
                let reason = evt.reason().unwrap_or("unknown");
                info!(
                    "mpv: end-file entry={:?} reason={}",
                    evt.playlist_entry_id(),
                    reason
                );
                let outcome = match self.tracker.on_end_file(evt.playlist_entry_id(), reason) {
                    LoadOutcome::Failed(generic) => {
                        LoadOutcome::Failed(evt.file_error().map(str::to_string).unwrap_or(generic))
                    }
                    other => other,
                };
                self.apply(outcome);
            }
            _ => {}
        }
    }

    fn on_core_idle_read(&mut self, entry: Option<i64>, idle: bool) {
        if entry != self.tracker.started_entry() {
            debug!("mpv: dropping core-idle read for entry {:?}", entry);
            return;
        }
        let outcome = self.tracker.on_core_idle(idle);
        self.apply(outcome);
    }

    async fn handle_command(&mut self, cmd: Command) -> anyhow::Result<()> {
        match cmd {
            Command::Play {
                url,
                name,
                channel_id,
            } => self.play(url, name, channel_id).await,
            Command::Remember { channel_id } => self.store.set_last_channel(channel_id).await?,
            Command::Stop => self.stop().await?,
            Command::TogglePause => {
                if self.state.channel_name.is_some() {
                    if let Some(h) = self.handle.as_ref() {
                        h.cycle("pause").await?;
                    }
                }
            }
            Command::Volume { value } => self.set_volume(value).await?,
            Command::ToggleFullscreen => {
                if let Some(h) = self.handle.as_ref() {
                    h.cycle("fullscreen").await?;
                }
            }
        }
        Ok(())
    }

    async fn play(&mut self, url: String, name: String, channel_id: Option<u32>) {
        info!("Playing channel: {} ({})", name, url);
        let generation = self.tracker.begin(Instant::now());
        self.paused = false;
        self.state.channel_name = Some(name);
        self.state.channel_id = channel_id;
        self.state.last_error = None;
        self.sync_status();

        if let Err(e) = self.store.set_last_channel(channel_id).await {
            warn!("PlayerCore: could not save state: {}", e);
        }

        let Some(handle) = self.ensure_mpv_handle().await else {
            let outcome = self.tracker.reject(generation, "mpv is not available");
            self.apply(outcome);
            return;
        };

        match handle.begin_load(&url) {
            Ok(reply) => {
                let tx = self.event_tx.clone();
                tokio::spawn(async move {
                    let result = reply.await;
                    let _ = tx.send(CoreEvent::LoadReply { generation, result }).await;
                });
            }
            Err(e) => {
                let outcome = self.tracker.reject(generation, e.to_string());
                self.apply(outcome);
            }
        }
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        info!("Stopping playback");
        self.tracker.reset();
        self.paused = false;
        self.sync_status();
        if let Some(h) = self.handle.as_ref() {
            h.stop().await?;
        }
        Ok(())
    }

    async fn set_volume(&mut self, value: f32) -> anyhow::Result<()> {
        let value = value.clamp(0.0, 1.0);
        self.driver.volume = value;
        self.state.volume = value;
        self.state.rev += 1;
        self.publish();
        if let Some(h) = self.handle.as_ref() {
            h.set_volume(value).await?;
        }
        self.store.set_volume(value).await
    }

    async fn ensure_mpv_handle(&mut self) -> Option<MpvHandle> {
        if self.handle.is_some() && !self.driver.process_alive() {
            warn!("PlayerCore: mpv process died, dropping handle");
            self.handle = None;
            self.set_mpv_health(MpvHealth::Dead);
        }
        if let Some(h) = self.handle.clone() {
            match h.ping().await {
                Ok(()) => return Some(h),
                Err(e) => {
                    warn!("PlayerCore: mpv IPC unresponsive ({}), reconnecting", e);
                    self.handle = None;
                }
            }
        }

        // one forwarder per connection
        let (mpv_tx, mut mpv_rx) = mpsc::channel::<MpvEvent>(64);
        let core_tx = self.event_tx.clone();
        tokio::spawn(async move {
            while let Some(evt) = mpv_rx.recv().await {
                if core_tx.send(CoreEvent::Mpv(evt)).await.is_err() {
                    break;
                }
            }
        });

        let reconnected = if self.driver.process_alive() {
            self.driver.try_reconnect(mpv_tx.clone()).await
        } else {
            None
        };
        let handle = match reconnected {
            Some(h) => h,
            None => {
                self.set_mpv_health(MpvHealth::Starting);
                match self.driver.spawn_and_connect(mpv_tx).await {
                    Ok(h) => h,
                    Err(e) => {
                        warn!("PlayerCore: failed to start mpv: {}", e);
                        self.set_mpv_health(MpvHealth::Dead);
                        return None;
                    }
                }
            }
        };

        self.set_mpv_health(MpvHealth::Running);
        handle.observe_properties().await;
        self.handle = Some(handle.clone());
        Some(handle)
    }

    fn set_mpv_health(&mut self, health: MpvHealth) {
        if self.state.mpv_health != health {
            info!(
                "PlayerCore: mpv health {:?} → {:?}",
                self.state.mpv_health, health
            );
            self.state.mpv_health = health;
            self.state.rev += 1;
            self.publish();
        }
    }

    fn apply(&mut self, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Unchanged => return,
            LoadOutcome::Started => info!(
                "PlayerCore: playback started: {}",
                self.state.channel_name.as_deref().unwrap_or("?")
            ),
            LoadOutcome::Ended => info!("PlayerCore: stream ended"),
            LoadOutcome::Failed(reason) => {
                let name = self.state.channel_name.clone().unwrap_or_default();
                warn!("PlayerCore: load of '{}' failed: {}", name, reason);
                self.state.last_error = Some(reason.clone());
                let _ = self
                    .broadcast_tx
                    .send(CoreMessage::LoadFailed { name, reason });
            }
        }
        self.sync_status();
    }

    fn sync_status(&mut self) {
        let status = self.tracker.status().clone();
        if status != self.state.status {
            info!("PlayerCore: status {:?} → {:?}", self.state.status, status);
            self.state.status = status;
        }
        self.state.rev += 1;
        self.publish();
    }

    fn publish(&self) {
        let _ = self
            .broadcast_tx
            .send(CoreMessage::State(self.state.clone()));
    }

    async fn cleanup(&mut self) {
        info!("PlayerCore: cleanup, stopping mpv");
        if let Some(h) = self.handle.take() {
            let _ = h.send(serde_json::json!(["quit"])).await;
        }
        self.driver.kill().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carousel_proto::protocol::PlaybackStatus;
    use serde_json::json;

    fn core(dir: &std::path::Path) -> (PlayerCore, broadcast::Receiver<CoreMessage>) {
        let mut config = Config::default();
        config.paths.state_file = dir.join("state.json");
        let (broadcast_tx, broadcast_rx) = broadcast::channel(64);
        let (event_tx, _event_rx) = mpsc::channel(64);
        (PlayerCore::new(&config, broadcast_tx, event_tx), broadcast_rx)
    }

    fn mpv(raw: serde_json::Value) -> MpvEvent {
        MpvEvent { raw }
    }

    #[tokio::test]
    async fn remember_and_volume_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let (mut core, _rx) = core(dir.path());
        core.handle_command(Command::Remember { channel_id: Some(5) })
            .await
            .unwrap();
        core.handle_command(Command::Volume { value: 0.8 })
            .await
            .unwrap();
        assert_eq!(core.snapshot().volume, 0.8);

        let reopened = StateStore::open(dir.path().join("state.json"), 0.5);
        assert_eq!(reopened.state().last_channel_id, Some(5));
        assert_eq!(reopened.state().volume, 0.8);
    }

    #[tokio::test]
    async fn stale_events_do_not_touch_current_load() {
        let dir = tempfile::tempdir().unwrap();
        let (mut core, mut rx) = core(dir.path());
        let now = Instant::now();
        let old = core.tracker.begin(now);
        core.tracker.attach(old, Some(1));
        let current = core.tracker.begin(now);
        core.state.channel_name = Some("2) Two".into());
        core.sync_status();

        core.handle_mpv_event(mpv(json!({"event": "end-file", "reason": "error", "playlist_entry_id": 1})));
        assert_eq!(core.snapshot().status, PlaybackStatus::Loading);

        let outcome = core.tracker.attach(current, Some(2));
        core.apply(outcome);
        core.handle_mpv_event(mpv(json!({"event": "start-file", "playlist_entry_id": 2})));
        core.handle_mpv_event(mpv(json!({"event": "property-change", "id": OBS_CORE_IDLE, "data": false})));
        assert_eq!(core.snapshot().status, PlaybackStatus::Playing);

        let mut saw_failure = false;
        while let Ok(msg) = rx.try_recv() {
            saw_failure |= matches!(msg, CoreMessage::LoadFailed { .. });
        }
        assert!(!saw_failure);
    }

    #[tokio::test]
    async fn end_file_error_reports_mpv_reason() {
        let dir = tempfile::tempdir().unwrap();
        let (mut core, mut rx) = core(dir.path());
        let generation = core.tracker.begin(Instant::now());
        core.state.channel_name = Some("7) Seven".into());
        let outcome = core.tracker.attach(generation, Some(3));
        core.apply(outcome);

        core.handle_mpv_event(mpv(json!({
            "event": "end-file", "reason": "error", "playlist_entry_id": 3,
            "file_error": "loading failed"
        })));
        let state = core.snapshot();
        assert_eq!(state.status, PlaybackStatus::Error);
        assert_eq!(state.last_error.as_deref(), Some("loading failed"));

        let failure = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|m| matches!(m, CoreMessage::LoadFailed { .. }));
        match failure {
            Some(CoreMessage::LoadFailed { name, reason }) => {
                assert_eq!(name, "7) Seven");
                assert_eq!(reason, "loading failed");
            }
            other => panic!("expected LoadFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn core_idle_read_for_previous_file_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (mut core, _rx) = core(dir.path());
        let generation = core.tracker.begin(Instant::now());
        let outcome = core.tracker.attach(generation, Some(5));
        core.apply(outcome);
        core.handle_mpv_event(mpv(json!({"event": "start-file", "playlist_entry_id": 5})));

        core.on_core_idle_read(Some(4), false);
        assert_eq!(core.snapshot().status, PlaybackStatus::Loading);

        core.on_core_idle_read(Some(5), false);
        assert_eq!(core.snapshot().status, PlaybackStatus::Playing);
    }
}
