//! Channel info overlay drawn over the lower-left of the video area.

use std::time::Instant;

use ratatui::crossterm::event::MouseEvent;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{status_glyph, C_BG, C_GROUP, C_LOGO, C_MUTED, C_NUMBER_HINT, C_PANEL_BORDER, C_PRIMARY},
};

const MIN_WIDTH: u16 = 28;

pub struct Overlay;

impl Overlay {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Overlay {
    fn id(&self) -> ComponentId {
        ComponentId::Overlay
    }

    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        if !state.overlay.is_visible(Instant::now()) {
            return;
        }
        let Some(channel) = state.current_channel() else {
            return;
        };

        let number = match channel.number() {
            "" => String::new(),
            n => format!("{} ", n),
        };
        let logo = if channel.logo.is_empty() {
            "no logo"
        } else {
            channel.logo.as_str()
        };
        let mut title = vec![
            Span::styled(number, Style::default().fg(C_NUMBER_HINT)),
            Span::styled(
                channel.label().to_string(),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(status) = state.status_for(channel) {
            let (icon, color) = status_glyph(status);
            title.push(Span::styled(format!("  {} {}", icon, status.label()), Style::default().fg(color)));
        }
        let lines = vec![
            Line::from(title),
            Line::from(Span::styled(
                channel.group_title().to_string(),
                Style::default().fg(C_GROUP),
            )),
            Line::from(Span::styled(logo.to_string(), Style::default().fg(C_LOGO))),
        ];

        let content_w = [
            channel.name.width() + 12,
            logo.width(),
            channel.group_title().width(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0) as u16;
        let width = (content_w + 4).max(MIN_WIDTH).min(area.width);
        let height = 5u16.min(area.height);
        let popup = Rect {
            x: area.x + 1u16.min(area.width.saturating_sub(width)),
            y: area.y + area.height.saturating_sub(height + 1),
            width,
            height,
        };

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(C_PANEL_BORDER))
                    .title(Span::styled(" now ", Style::default().fg(C_MUTED)))
                    .style(Style::default().bg(C_BG)),
            ),
            popup,
        );
    }
}
