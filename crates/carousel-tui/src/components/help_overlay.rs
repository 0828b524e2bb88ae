//! Centred popup listing the key and mouse bindings.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseEvent};
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    theme::{C_BG, C_MUTED, C_PANEL_BORDER, C_PRIMARY, C_SECONDARY},
};

pub struct HelpOverlay {
    pub visible: bool,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self { visible: false }
    }
}

impl Component for HelpOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::HelpOverlay
    }

    /// Consumes every key while open.
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release || !self.visible {
            return vec![];
        }
        match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => vec![Action::ToggleHelp],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, _event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if let Action::ToggleHelp = action {
            self.visible = !self.visible;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, _state: &AppState) {
        if !self.visible {
            return;
        }

        let mut lines = vec![
            Line::from(Span::styled(
                " keys",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        for (title, rows) in BINDINGS {
            if !title.is_empty() {
                lines.push(Line::from(Span::styled(
                    *title,
                    Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD),
                )));
            }
            lines.extend(rows.iter().map(|(key, desc)| help_row(key, desc)));
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            " press ? or esc to close",
            Style::default().fg(C_MUTED),
        )));

        let height = (lines.len() as u16 + 2).min(area.height);
        let popup = centered_rect(64, height, area);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(C_PANEL_BORDER))
                        .style(Style::default().bg(C_BG)),
                )
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

type Binding = (&'static str, &'static str);

const BINDINGS: &[(&str, &[Binding])] = &[
    (
        " channels",
        &[
            ("↑ / ↓  or  k / j", "previous / next channel (plays it)"),
            ("enter", "play the selected channel"),
            ("← / →  or  tab", "show / hide the channel list"),
            ("esc / backspace", "hide the channel list"),
            ("i", "show channel info"),
            ("R", "reload the playlist"),
        ],
    ),
    (
        " player",
        &[
            ("space", "pause / resume"),
            ("- / +", "volume down / up"),
            ("f", "toggle fullscreen"),
        ],
    ),
    (
        " mouse",
        &[
            ("click row", "play that channel"),
            ("drag ← / →", "show / hide the channel list"),
            ("drag ↓ / ↑", "previous / next channel"),
        ],
    ),
    ("", &[("?", "toggle this help"), ("q / Ctrl+C", "quit")]),
];

fn help_row(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!(" {:<18}", key),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc, Style::default().fg(C_SECONDARY)),
    ])
}

/// A `percent_x` wide, `height` tall rect centred in `r`.
pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(r);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    popup
}
