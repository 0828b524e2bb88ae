//! Header: one row of now-playing info above a separator.
//!
//! Not focusable.

use ratatui::crossterm::event::MouseEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use carousel_proto::protocol::{MpvHealth, PlaybackStatus};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, PlaylistStatus},
    component::Component,
    theme::{
        status_glyph, C_BADGE_ERR, C_BADGE_PENDING, C_ERROR, C_MUTED, C_PRIMARY, C_SECONDARY,
    },
    widgets::status_bar::draw_separator,
};

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Header {
    fn id(&self) -> ComponentId {
        ComponentId::Header
    }

    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        if area.height == 0 {
            return;
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        frame.render_widget(Clear, rows[0]);
        let right = build_right(state);
        let right_w = right.width() as u16;
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(right_w)])
            .split(rows[0]);
        frame.render_widget(Paragraph::new(build_left(state)), cols[0]);
        frame.render_widget(Paragraph::new(right), cols[1]);

        if rows[1].height > 0 {
            draw_separator(frame, rows[1]);
        }
    }
}

fn build_left(state: &AppState) -> Line<'static> {
    let player = &state.player;
    let (icon, color) = status_glyph(&player.status);

    let mut spans: Vec<Span<'static>> = vec![
        Span::raw(" "),
        Span::styled(icon, Style::default().fg(color)),
        Span::raw(" "),
    ];

    match player.channel_name.as_ref() {
        Some(name) => spans.push(Span::styled(
            name.clone(),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::styled("no channel", Style::default().fg(C_MUTED))),
    }

    spans.push(Span::styled(
        format!("  {}", player.status.label()),
        Style::default().fg(color),
    ));
    if player.status == PlaybackStatus::Error {
        if let Some(reason) = player.last_error.as_ref() {
            spans.push(Span::styled(
                format!(": {}", reason),
                Style::default().fg(C_ERROR),
            ));
        }
    }

    match &player.mpv_health {
        MpvHealth::Dead => spans.push(Span::styled(
            " [mpv DEAD]",
            Style::default()
                .fg(C_BADGE_ERR)
                .add_modifier(Modifier::BOLD),
        )),
        MpvHealth::Starting => spans.push(Span::styled(
            " [mpv starting…]",
            Style::default().fg(C_BADGE_PENDING),
        )),
        MpvHealth::Absent | MpvHealth::Running => {}
    }

    match &state.playlist_status {
        PlaylistStatus::Loading => spans.push(Span::styled(
            "  loading playlist…",
            Style::default().fg(C_BADGE_PENDING),
        )),
        PlaylistStatus::Failed(_) => spans.push(Span::styled(
            "  [playlist ERR]",
            Style::default().fg(C_BADGE_ERR),
        )),
        PlaylistStatus::Loaded => {}
    }

    Line::from(spans)
}

fn build_right(state: &AppState) -> Line<'static> {
    let vol = (state.player.volume * 100.0).round() as u32;
    let clock = chrono::Local::now().format("%H:%M").to_string();
    Line::from(vec![
        Span::styled(format!("vol {}%", vol), Style::default().fg(C_SECONDARY)),
        Span::styled(format!("  {} ", clock), Style::default().fg(C_MUTED)),
    ])
}
