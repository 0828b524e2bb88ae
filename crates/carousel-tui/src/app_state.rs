//! AppState: data shared read-only with every component.
//!
//! Only the App event loop writes to it.

use std::time::{Duration, Instant};

use carousel_proto::config::UiConfig;
use carousel_proto::playlist::Channel;
use carousel_proto::protocol::{PlaybackStatus, PlayerState};
use carousel_proto::selection::Selection;
use carousel_proto::visibility::{ListVisibility, OverlayTimer};

/// Where the channel list stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaylistStatus {
    Loading,
    Loaded,
    Failed(String),
}

pub struct AppState {
    // ── Channels ───────────────────────────────────────────────────────────
    pub selection: Selection,
    pub playlist_source: String,
    pub playlist_status: PlaylistStatus,

    // ── Visibility timers ──────────────────────────────────────────────────
    pub list: ListVisibility,
    pub overlay: OverlayTimer,

    // ── Player core ────────────────────────────────────────────────────────
    pub player: PlayerState,

    /// WARN/ERROR lines forwarded from the tracing layer (newest last).
    pub logs: Vec<String>,
}

impl AppState {
    pub fn new(ui: &UiConfig, playlist_source: String, player: PlayerState, now: Instant) -> Self {
        Self {
            selection: Selection::default(),
            playlist_source,
            playlist_status: PlaylistStatus::Loading,
            list: ListVisibility::new(Duration::from_secs(ui.auto_hide_secs), now),
            overlay: OverlayTimer::new(Duration::from_secs(ui.overlay_secs)),
            player,
            logs: Vec::new(),
        }
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.selection.current()
    }

    /// Playback status to show next to `channel`, if it is the one the core
    /// was last asked to play.
    pub fn status_for(&self, channel: &Channel) -> Option<&PlaybackStatus> {
        let same = match (self.player.channel_id, channel.id) {
            (Some(a), Some(b)) => a == b,
            _ => self.player.channel_name.as_deref() == Some(channel.name.as_str()),
        };
        same.then_some(&self.player.status)
    }
}
