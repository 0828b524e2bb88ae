//! App: the terminal event loop.
//!
//! - `App` owns the components and `AppState`.
//! - Keyboard/mouse events, core broadcasts and playlist loads arrive as
//!   `AppMessage`s on one mpsc channel.
//! - Components return `Vec<Action>`; `dispatch` runs each action through
//!   every component and then through `apply_action`.
//! - Commands for the player core go out on `cmd_tx`.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Paragraph},
    Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use carousel_proto::config::{Config, UiConfig};
use carousel_proto::error::PlaylistError;
use carousel_proto::gesture::{resolve_swipe, Swipe};
use carousel_proto::playlist::{load_playlist, Channel};
use carousel_proto::protocol::{Command, PlaybackStatus, PlayerState};
use carousel_proto::state::{restore_selection, PersistentState};

use crate::core::CoreEvent;
use crate::CoreMessage;
use crate::{
    action::Action,
    app_state::{AppState, PlaylistStatus},
    component::Component,
    components::{
        channel_list::ChannelList, header::Header, help_overlay::HelpOverlay, overlay::Overlay,
    },
    theme::{C_BG, C_MUTED},
    widgets::{
        status_bar,
        toast::{Severity, ToastManager},
    },
};

const VOLUME_STEP: f32 = 0.05;
const MAX_LOGS: usize = 500;

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Event(Event),
    Core(CoreMessage),
    PlaylistLoaded(Result<Vec<Channel>, PlaylistError>),
}

/// Screen areas from the last draw, for mouse hit tests.
#[derive(Debug, Clone, Default)]
struct PaneAreas {
    channel_list: Rect,
    video: Rect,
}

pub struct App {
    state: AppState,
    ui: UiConfig,

    header: Header,
    channel_list: ChannelList,
    overlay: Overlay,
    help_overlay: HelpOverlay,
    toast: ToastManager,
    pane_areas: PaneAreas,

    /// What the previous session saved; refreshed as channels are played.
    saved: PersistentState,
    autoplay_pending: bool,
    /// Press position of an in-progress drag.
    drag_start: Option<(u16, u16)>,

    cmd_tx: mpsc::Sender<CoreEvent>,
    msg_tx: mpsc::Sender<AppMessage>,
    msg_rx: Option<mpsc::Receiver<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        saved: PersistentState,
        player: PlayerState,
        cmd_tx: mpsc::Sender<CoreEvent>,
    ) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel::<AppMessage>(1024);
        Self {
            state: AppState::new(
                &config.ui,
                config.playlist.source.clone(),
                player,
                Instant::now(),
            ),
            ui: config.ui.clone(),
            header: Header::new(),
            channel_list: ChannelList::new(),
            overlay: Overlay::new(),
            help_overlay: HelpOverlay::new(),
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            saved,
            autoplay_pending: config.player.autoplay,
            drag_start: None,
            cmd_tx,
            msg_tx,
            msg_rx: Some(msg_rx),
            should_quit: false,
        }
    }

    pub async fn run(mut self, mut broadcast_rx: broadcast::Receiver<CoreMessage>) -> anyhow::Result<()> {
        let Some(mut rx) = self.msg_rx.take() else {
            anyhow::bail!("App::run called twice");
        };

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.msg_tx.clone();
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

        // ── Background task: core broadcasts ──────────────────────────────────
        let bc_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            loop {
                match broadcast_rx.recv().await {
                    Ok(msg) => {
                        if bc_tx.send(AppMessage::Core(msg)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("broadcast receiver lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        self.spawn_playlist_load();

        // Visibility timers, list easing, toast expiry and spinner frames.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Header clock.
        let mut clock_tick = tokio::time::interval(Duration::from_secs(15));
        clock_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

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

                _ = ui_tick.tick() => {
                    needs_redraw = self.on_ui_tick(Instant::now());
                }

                _ = clock_tick.tick() => {
                    needs_redraw = true;
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        info!("App: quitting");
        let _ = self.cmd_tx.send(CoreEvent::Shutdown).await;
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Returns true when the screen needs a redraw.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action).await;
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                let actions = self.handle_mouse(mouse);
                let redraw = !actions.is_empty();
                for action in actions {
                    self.dispatch(action).await;
                }
                redraw
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,
            AppMessage::Core(CoreMessage::State(player)) => {
                self.on_player_state(player);
                true
            }
            AppMessage::Core(CoreMessage::Log(line)) => {
                self.push_log(line);
                true
            }
            AppMessage::Core(CoreMessage::LoadFailed { name, reason }) => {
                let msg = format!("{}: {}", name, reason);
                if self.toast.has_spinner() {
                    self.toast.resolve_spinner(Severity::Error, msg);
                } else {
                    self.toast.error(msg);
                }
                true
            }
            AppMessage::PlaylistLoaded(result) => {
                self.on_playlist_loaded(result).await;
                true
            }
        }
    }

    fn on_ui_tick(&mut self, now: Instant) -> bool {
        let loading = self.state.player.is_loading();
        if self.state.list.tick(now, loading) {
            debug!("channel list auto-hidden");
        }
        self.state.overlay.tick(now);
        self.channel_list.tick(&self.state);
        self.toast.tick();
        true
    }

    fn on_player_state(&mut self, player: PlayerState) {
        let was = self.state.player.status.clone();
        if was != player.status && self.toast.has_spinner() {
            match player.status {
                PlaybackStatus::Playing => {
                    let name = player.channel_name.clone().unwrap_or_default();
                    self.toast
                        .resolve_spinner(Severity::Success, format!("playing {}", name));
                }
                PlaybackStatus::Idle => self.toast.dismiss_spinner(),
                // failures arrive as LoadFailed with the reason
                _ => {}
            }
        }
        self.state.player = player;
    }

    async fn on_playlist_loaded(&mut self, result: Result<Vec<Channel>, PlaylistError>) {
        match result {
            Ok(channels) => {
                info!("Playlist loaded: {} channels", channels.len());
                let wanted = self
                    .state
                    .current_channel()
                    .and_then(|c| c.id)
                    .or(self.saved.last_channel_id);
                self.state.selection.replace(channels);
                self.state.playlist_status = PlaylistStatus::Loaded;

                self.saved.last_channel_id = wanted;
                if !restore_selection(&mut self.state.selection, &self.saved) {
                    // saved id is gone; overwrite it with the channel now selected
                    let id = self.state.current_channel().and_then(|c| c.id);
                    if wanted.is_some() {
                        debug!("saved channel {:?} not in playlist, using {:?}", wanted, id);
                    }
                    self.saved.last_channel_id = id;
                    self.send_cmd(Command::Remember { channel_id: id }).await;
                }

                self.state.list.show(Instant::now());
                self.dispatch(Action::PlaylistReplaced).await;
                self.toast
                    .info(format!("{} channels", self.state.selection.len()));

                if self.autoplay_pending && !self.state.selection.is_empty() {
                    self.autoplay_pending = false;
                    self.dispatch(Action::PlayCurrent).await;
                }
            }
            Err(e) => {
                error!("Playlist load failed: {}", e);
                self.state.selection.replace(Vec::new());
                self.state.playlist_status = PlaylistStatus::Failed(e.to_string());
                self.dispatch(Action::PlaylistReplaced).await;
                self.toast.error(format!("playlist: {}", e));
            }
        }
    }

    fn spawn_playlist_load(&mut self) {
        self.state.playlist_status = PlaylistStatus::Loading;
        let source = self.state.playlist_source.clone();
        let tx = self.msg_tx.clone();
        info!("Loading playlist from {}", source);
        tokio::spawn(async move {
            let result = load_playlist(&source).await;
            let _ = tx.send(AppMessage::PlaylistLoaded(result)).await;
        });
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return vec![Action::Quit];
            }
            KeyCode::Char('q') if !self.help_overlay.visible => return vec![Action::Quit],
            KeyCode::Char('?') if !self.help_overlay.visible => return vec![Action::ToggleHelp],
            _ => {}
        }

        // Help captures all keys while open
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::MoveBy(-1)],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::MoveBy(1)],
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => vec![Action::ToggleList],
            KeyCode::Enter => vec![Action::PlayCurrent],
            KeyCode::Esc | KeyCode::Backspace => vec![Action::HideList],
            KeyCode::Char(' ') => vec![Action::TogglePause],
            KeyCode::Char('i') => vec![Action::ShowOverlay],
            KeyCode::Char('f') => vec![Action::ToggleFullscreen],
            KeyCode::Char('+') | KeyCode::Char('=') => vec![Action::VolumeStep(VOLUME_STEP)],
            KeyCode::Char('-') => vec![Action::VolumeStep(-VOLUME_STEP)],
            KeyCode::Char('R') => vec![Action::ReloadPlaylist],
            _ => vec![],
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    /// A press/release pair is a swipe when the drag clears the threshold,
    /// otherwise a click at the press position.
    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_start = Some((event.column, event.row));
                vec![]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let Some((col, row)) = self.drag_start.take() else {
                    return vec![];
                };
                let dx = (event.column as i32 - col as i32) * self.ui.cell_width_px;
                let dy = (event.row as i32 - row as i32) * self.ui.cell_height_px;
                if let Some(swipe) = resolve_swipe(dx, dy, self.ui.swipe_threshold_px) {
                    debug!("swipe {:?} (dx={}, dy={})", swipe, dx, dy);
                    return match swipe {
                        Swipe::Left | Swipe::Right => vec![Action::ToggleList],
                        Swipe::Down => vec![Action::MoveBy(-1)],
                        Swipe::Up => vec![Action::MoveBy(1)],
                    };
                }

                if self.help_overlay.visible {
                    return vec![Action::ToggleHelp];
                }
                let area = self.pane_areas.channel_list;
                if self.state.list.is_visible() && hit(area, col, row) {
                    let click = MouseEvent {
                        column: col,
                        row,
                        ..event
                    };
                    return self.channel_list.handle_mouse(click, area, &self.state);
                }
                vec![Action::ShowList]
            }
            MouseEventKind::ScrollUp | MouseEventKind::ScrollDown => {
                let area = self.pane_areas.channel_list;
                if self.state.list.is_visible() && hit(area, event.column, event.row) {
                    return self.channel_list.handle_mouse(event, area, &self.state);
                }
                vec![]
            }
            _ => vec![],
        }
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    /// Every action goes to every component first, then to the App.
    /// Follow-up actions are queued and dispatched the same way.
    async fn dispatch(&mut self, action: Action) {
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            {
                let s = &self.state;
                queue.extend(self.channel_list.on_action(&action, s));
                queue.extend(self.overlay.on_action(&action, s));
                queue.extend(self.header.on_action(&action, s));
                queue.extend(self.help_overlay.on_action(&action, s));
            }
            queue.extend(self.apply_action(action).await);
        }
    }

    async fn apply_action(&mut self, action: Action) -> Vec<Action> {
        let now = Instant::now();
        match action {
            Action::MoveBy(delta) => {
                let Some(moved) = self.state.selection.move_by(delta) else {
                    return vec![];
                };
                self.state.list.show(now);
                return vec![
                    Action::SelectionChanged {
                        index: moved.index,
                        wrapped: moved.wrapped,
                    },
                    Action::PlayCurrent,
                ];
            }
            Action::JumpTo(index) => {
                if !self.state.selection.jump_to(index) {
                    return vec![];
                }
                self.state.list.show(now);
                return vec![
                    Action::SelectionChanged {
                        index,
                        wrapped: false,
                    },
                    Action::PlayCurrent,
                ];
            }
            Action::PlayCurrent => {
                let Some(channel) = self.state.current_channel().cloned() else {
                    return vec![];
                };
                self.state.list.show(now);
                self.state.overlay.show(now);
                self.saved.last_channel_id = channel.id;
                self.toast.spinner(format!("loading {}", channel.label()));
                return vec![Action::SendCommand(Command::Play {
                    url: channel.url,
                    name: channel.name,
                    channel_id: channel.id,
                })];
            }
            Action::ToggleList => self.state.list.toggle(now),
            Action::ShowList => self.state.list.show(now),
            Action::HideList => self.state.list.hide(),
            Action::ShowOverlay => self.state.overlay.show(now),
            Action::TogglePause => return vec![Action::SendCommand(Command::TogglePause)],
            Action::VolumeStep(step) => {
                let value = (self.state.player.volume + step).clamp(0.0, 1.0);
                return vec![Action::SendCommand(Command::Volume { value })];
            }
            Action::ToggleFullscreen => {
                return vec![Action::SendCommand(Command::ToggleFullscreen)];
            }
            Action::ReloadPlaylist => {
                self.toast.info("reloading playlist");
                self.spawn_playlist_load();
            }
            Action::SendCommand(cmd) => self.send_cmd(cmd).await,
            Action::Quit => self.should_quit = true,
            // handled by components
            Action::SelectionChanged { .. } | Action::PlaylistReplaced | Action::ToggleHelp => {}
        }
        vec![]
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);
        let (header_area, body_area, log_area, keys_area) = (outer[0], outer[1], outer[2], outer[3]);

        self.header.draw(frame, header_area, false, &self.state);

        let video_area = if self.state.list.is_visible() {
            let list_w = (body_area.width * 2 / 5).clamp(30, 56).min(body_area.width);
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(list_w), Constraint::Min(0)])
                .split(body_area);
            self.channel_list.draw(frame, cols[0], true, &self.state);
            self.pane_areas.channel_list = cols[0];
            cols[1]
        } else {
            self.pane_areas.channel_list = Rect::default();
            body_area
        };
        self.pane_areas.video = video_area;

        if video_area.height > 0 {
            let hint_area = Rect {
                y: video_area.y + video_area.height / 2,
                height: 1,
                ..video_area
            };
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "video plays in the mpv window",
                    Style::default().fg(C_MUTED),
                ))
                .centered(),
                hint_area,
            );
        }
        self.overlay.draw(frame, video_area, false, &self.state);

        status_bar::draw_log_bar(
            frame,
            log_area,
            self.state.logs.last().map(|s| s.as_str()),
            &self.state.player.mpv_health,
        );
        status_bar::draw_keys_bar(frame, keys_area, self.state.list.is_visible());

        self.help_overlay.draw(frame, area, false, &self.state);
        self.toast.draw(frame, area);
    }

    async fn send_cmd(&self, cmd: Command) {
        let _ = self.cmd_tx.send(CoreEvent::Command(cmd)).await;
    }

    fn push_log(&mut self, msg: String) {
        self.state.logs.push(msg);
        if self.state.logs.len() > MAX_LOGS {
            self.state.logs.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    fn channel(id: u32, group: &str) -> Channel {
        Channel {
            id: Some(id),
            name: format!("{id}) Channel {id}"),
            group: group.to_string(),
            url: format!("https://h/{id}.m3u8"),
            ..Channel::default()
        }
    }

    fn app(saved: Option<u32>, autoplay: bool) -> (App, mpsc::Receiver<CoreEvent>) {
        let mut config = Config::default();
        config.player.autoplay = autoplay;
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let saved = PersistentState {
            last_channel_id: saved,
            volume: 0.5,
        };
        let player = PlayerState {
            volume: 0.5,
            ..PlayerState::default()
        };
        (App::new(&config, saved, player, cmd_tx), cmd_rx)
    }

    fn commands(rx: &mut mpsc::Receiver<CoreEvent>) -> Vec<Command> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                CoreEvent::Command(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn draw(app: &mut App) {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
    }

    async fn loaded(app: &mut App, n: u32) {
        let channels = (1..=n).map(|i| channel(i, "News")).collect();
        app.on_playlist_loaded(Ok(channels)).await;
    }

    #[test]
    fn key_bindings() {
        let (mut app, _rx) = app(None, false);
        assert_eq!(app.handle_key(key(KeyCode::Up)), vec![Action::MoveBy(-1)]);
        assert_eq!(app.handle_key(key(KeyCode::Char('j'))), vec![Action::MoveBy(1)]);
        assert_eq!(app.handle_key(key(KeyCode::Tab)), vec![Action::ToggleList]);
        assert_eq!(app.handle_key(key(KeyCode::Left)), vec![Action::ToggleList]);
        assert_eq!(app.handle_key(key(KeyCode::Backspace)), vec![Action::HideList]);
        assert_eq!(app.handle_key(key(KeyCode::Enter)), vec![Action::PlayCurrent]);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            vec![Action::Quit]
        );
    }

    #[tokio::test]
    async fn help_swallows_keys_until_closed() {
        let (mut app, _rx) = app(None, false);
        app.dispatch(Action::ToggleHelp).await;
        assert!(app.help_overlay.visible);
        assert!(app.handle_key(key(KeyCode::Down)).is_empty());
        let close = app.handle_key(key(KeyCode::Esc));
        assert_eq!(close, vec![Action::ToggleHelp]);
        app.dispatch(Action::ToggleHelp).await;
        assert!(!app.help_overlay.visible);
    }

    #[tokio::test]
    async fn unknown_saved_channel_falls_back_to_first_and_is_overwritten() {
        let (mut app, mut rx) = app(Some(99), true);
        loaded(&mut app, 3).await;
        assert_eq!(app.state.selection.index(), Some(0));
        let cmds = commands(&mut rx);
        assert_eq!(cmds[0], Command::Remember { channel_id: Some(1) });
        assert!(matches!(
            &cmds[1],
            Command::Play { channel_id: Some(1), .. }
        ));
    }

    #[tokio::test]
    async fn saved_channel_is_restored_without_autoplay() {
        let (mut app, mut rx) = app(Some(2), false);
        loaded(&mut app, 3).await;
        assert_eq!(app.state.selection.index(), Some(1));
        assert!(commands(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn failed_playlist_leaves_navigation_inert() {
        let (mut app, mut rx) = app(None, true);
        app.on_playlist_loaded(Err(PlaylistError::Read {
            path: "x.m3u".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        }))
        .await;
        assert!(matches!(app.state.playlist_status, PlaylistStatus::Failed(_)));
        app.dispatch(Action::MoveBy(1)).await;
        app.dispatch(Action::PlayCurrent).await;
        assert!(commands(&mut rx).is_empty());
        draw(&mut app);
    }

    #[tokio::test]
    async fn navigation_plays_and_shows_list_and_overlay() {
        let (mut app, mut rx) = app(None, false);
        loaded(&mut app, 3).await;
        commands(&mut rx);
        app.state.list.hide();

        app.dispatch(Action::MoveBy(-1)).await;
        assert_eq!(app.state.selection.index(), Some(2));
        assert!(app.state.list.is_visible());
        assert!(app.state.overlay.is_visible(Instant::now()));
        assert!(app.toast.has_spinner());
        assert_eq!(
            commands(&mut rx),
            vec![Command::Play {
                url: "https://h/3.m3u8".into(),
                name: "3) Channel 3".into(),
                channel_id: Some(3),
            }]
        );
    }

    #[tokio::test]
    async fn enter_replays_and_brings_list_back() {
        let (mut app, mut rx) = app(None, false);
        loaded(&mut app, 3).await;
        commands(&mut rx);
        app.state.list.hide();

        for action in app.handle_key(key(KeyCode::Enter)) {
            app.dispatch(action).await;
        }
        assert!(app.state.list.is_visible());
        assert!(matches!(
            commands(&mut rx).as_slice(),
            [Command::Play { channel_id: Some(1), .. }]
        ));
    }

    #[tokio::test]
    async fn vertical_swipes_step_and_horizontal_toggles() {
        let (mut app, _rx) = app(None, false);
        loaded(&mut app, 5).await;

        // 4 rows * 16px = 64px downwards
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 60, 5));
        let actions = app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 60, 9));
        assert_eq!(actions, vec![Action::MoveBy(-1)]);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 60, 9));
        let actions = app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 60, 5));
        assert_eq!(actions, vec![Action::MoveBy(1)]);

        // 10 cols * 8px = 80px to the left
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 70, 5));
        let actions = app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 60, 6));
        assert_eq!(actions, vec![Action::ToggleList]);
    }

    #[tokio::test]
    async fn click_selects_row_regardless_of_previous_index() {
        let (mut app, mut rx) = app(None, false);
        loaded(&mut app, 5).await;
        app.dispatch(Action::MoveBy(2)).await;
        commands(&mut rx);
        draw(&mut app);

        // header takes rows 0-1, list border row 2, "News" header row 3,
        // channel 1 on row 4, channel 4 on row 7
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 5, 7));
        let actions = app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 5, 7));
        assert_eq!(actions, vec![Action::JumpTo(3)]);
        for a in actions {
            app.dispatch(a).await;
        }
        assert_eq!(app.state.selection.index(), Some(3));
        assert!(matches!(
            commands(&mut rx).as_slice(),
            [Command::Play { channel_id: Some(4), .. }]
        ));

        // a click on the video area only brings the list up
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 90, 15));
        let actions = app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 90, 15));
        assert_eq!(actions, vec![Action::ShowList]);
    }

    #[tokio::test]
    async fn playing_state_resolves_spinner() {
        let (mut app, _rx) = app(None, false);
        loaded(&mut app, 2).await;
        app.dispatch(Action::PlayCurrent).await;
        assert!(app.toast.has_spinner());

        app.on_player_state(PlayerState {
            status: PlaybackStatus::Loading,
            channel_name: Some("1) Channel 1".into()),
            ..PlayerState::default()
        });
        assert!(app.toast.has_spinner());
        app.on_player_state(PlayerState {
            status: PlaybackStatus::Playing,
            channel_name: Some("1) Channel 1".into()),
            ..PlayerState::default()
        });
        assert!(!app.toast.has_spinner());
    }

    #[tokio::test]
    async fn volume_steps_are_clamped() {
        let (mut app, mut rx) = app(None, false);
        app.state.player.volume = 0.98;
        app.dispatch(Action::VolumeStep(VOLUME_STEP)).await;
        assert_eq!(commands(&mut rx), vec![Command::Volume { value: 1.0 }]);
    }
}
