use serde::{Deserialize, Serialize};

/// Commands sent from the UI loop to the player core.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd")]
pub enum Command {
    /// Load and play a stream, replacing whatever is playing.
    Play {
        url: String,
        name: String,
        channel_id: Option<u32>,
    },
    /// Persist the selected channel without touching playback.
    Remember { channel_id: Option<u32> },
    Stop,
    TogglePause,
    Volume { value: f32 },
    ToggleFullscreen,
}

/// Detailed playback status, derived from what mpv reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    #[default]
    Idle, // nothing loaded / explicitly stopped
    Loading, // loadfile sent, waiting for the first frame
    Playing, // core-idle=false
    Paused,  // explicitly paused
    Error,   // load failed or timed out
}

impl PlaybackStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Error => "error",
        }
    }
}

/// Health of the mpv process as observed by the player core.
///
/// Transitions:
///   Absent -> Starting -> Running -> Dead -> Starting ...
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MpvHealth {
    /// mpv process does not exist yet (before first use).
    #[default]
    Absent,
    /// Process is spawning / socket not yet available.
    Starting,
    /// Socket connected, IPC responding normally.
    Running,
    /// Process exited or socket closed.
    Dead,
}

impl MpvHealth {
    /// Short label for the header badge.
    pub fn badge_label(&self) -> Option<&str> {
        match self {
            MpvHealth::Absent | MpvHealth::Running => None,
            MpvHealth::Starting => Some("INIT"),
            MpvHealth::Dead => Some("DEAD"),
        }
    }
}

/// Snapshot of the player core, broadcast after every change.  `rev`
/// increases on each update.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PlayerState {
    #[serde(default)]
    pub rev: u64,
    /// Display name of the channel last sent to mpv.
    pub channel_name: Option<String>,
    pub channel_id: Option<u32>,
    pub status: PlaybackStatus,
    pub volume: f32,
    #[serde(default)]
    pub mpv_health: MpvHealth,
    /// Reason for the last `Error` status.
    pub last_error: Option<String>,
}

impl PlayerState {
    pub fn is_loading(&self) -> bool {
        self.status == PlaybackStatus::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_json_is_tagged() {
        let cmd = Command::Volume { value: 0.25 };
        let json = serde_json::to_string(&cmd).unwrap();
        assert_eq!(json, r#"{"cmd":"Volume","value":0.25}"#);
        let back: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn health_badges() {
        assert_eq!(MpvHealth::Running.badge_label(), None);
        assert_eq!(MpvHealth::Dead.badge_label(), Some("DEAD"));
    }
}
