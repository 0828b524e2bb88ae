//! Action enum: user intents and internal events flowing through the App.

use carousel_proto::protocol::Command;

/// Identifier for a UI component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    ChannelList,
    Overlay,
    Header,
    HelpOverlay,
}

/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Selection ────────────────────────────────────────────────────────────
    MoveBy(isize),
    JumpTo(usize), // absolute channel index, e.g. from a click
    PlayCurrent,

    // ── List / overlay visibility ────────────────────────────────────────────
    ToggleList,
    ShowList,
    HideList,
    ShowOverlay,

    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePause,
    VolumeStep(f32),
    ToggleFullscreen,

    // ── System ───────────────────────────────────────────────────────────────
    /// The selection moved; `wrapped` is true when it crossed the list end.
    SelectionChanged { index: usize, wrapped: bool },
    /// A new channel list replaced the old one.
    PlaylistReplaced,
    ReloadPlaylist,
    ToggleHelp,
    SendCommand(Command),
    Quit,
}
