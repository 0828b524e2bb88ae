//! ChannelList component: the side pane with channels grouped by category.
//!
//! Rows are rebuilt whenever the playlist is replaced: one header row per
//! group followed by one row per channel.  The current channel is kept
//! centred; the scroll offset eases toward that target on every tick, except
//! right after a wraparound where it snaps.

use ratatui::crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Borders, List, ListItem, Paragraph},
    Frame,
};

use carousel_proto::playlist::{group_channels, Channel};

use crate::{
    action::{Action, ComponentId},
    app_state::{AppState, PlaylistStatus},
    component::Component,
    theme::{
        status_glyph, style_selected, C_ACCENT, C_ERROR, C_GROUP, C_MUTED, C_NUMBER_HINT,
        C_PRIMARY, C_SECONDARY,
    },
    widgets::pane_chrome::{pane_chrome, Badge},
};

/// Fraction of the remaining distance covered per tick.
const EASE: f32 = 0.35;
/// Rows moved per wheel notch.
const WHEEL_STEP: f32 = 3.0;

#[derive(Debug, Clone, PartialEq)]
enum Row {
    Group { name: String, count: usize },
    Channel(usize),
}

pub struct ChannelList {
    rows: Vec<Row>,
    /// Row index for each channel index.
    row_of: Vec<usize>,
    /// Eased scroll position, in rows.
    offset: f32,
    /// Where `offset` is heading.
    target: f32,
    snap: bool,
    /// Inner area and first visible row from the last draw, for hit tests.
    inner: Rect,
    first_row: usize,
}

impl ChannelList {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            row_of: Vec::new(),
            offset: 0.0,
            target: 0.0,
            snap: true,
            inner: Rect::default(),
            first_row: 0,
        }
    }

    /// Rebuild rows from a fresh channel list.
    pub fn rebuild(&mut self, channels: &[Channel]) {
        self.rows.clear();
        self.row_of = vec![0; channels.len()];
        for group in group_channels(channels) {
            self.rows.push(Row::Group {
                name: group.name.to_string(),
                count: group.entries.len(),
            });
            for (idx, _) in group.entries {
                self.row_of[idx] = self.rows.len();
                self.rows.push(Row::Channel(idx));
            }
        }
        self.snap = true;
    }

    /// Scroll position that centres `index` in a view of `height` rows.
    fn centred_offset(&self, index: Option<usize>, height: usize) -> f32 {
        let Some(row) = index.and_then(|i| self.row_of.get(i)).copied() else {
            return 0.0;
        };
        let max = self.rows.len().saturating_sub(height);
        row.saturating_sub(height / 2).min(max) as f32
    }

    fn nudge(&mut self, delta: f32) {
        let height = self.inner.height as usize;
        let max = self.rows.len().saturating_sub(height) as f32;
        self.target = (self.target + delta).clamp(0.0, max);
    }

    fn row_at(&self, screen_row: u16) -> Option<&Row> {
        if screen_row < self.inner.y || screen_row >= self.inner.y + self.inner.height {
            return None;
        }
        self.rows
            .get(self.first_row + (screen_row - self.inner.y) as usize)
    }

    fn render_row<'a>(&self, row: &Row, state: &'a AppState) -> ListItem<'a> {
        match row {
            Row::Group { name, count } => ListItem::new(Line::from(vec![
                Span::styled(" ── ", Style::default().fg(C_MUTED)),
                Span::styled(
                    name.clone(),
                    Style::default().fg(C_GROUP).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" ({})", count), Style::default().fg(C_MUTED)),
            ])),
            Row::Channel(idx) => {
                let Some(channel) = state.selection.channels().get(*idx) else {
                    return ListItem::new(Line::from(""));
                };
                let is_current = state.selection.index() == Some(*idx);

                let (icon, icon_color) = match state.status_for(channel) {
                    Some(status) => status_glyph(status),
                    None => (" ", C_MUTED),
                };
                let marker = if is_current { "▸" } else { " " };
                let label_style = if is_current {
                    Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(C_SECONDARY)
                };

                let line = Line::from(vec![
                    Span::styled(marker, Style::default().fg(C_ACCENT)),
                    Span::styled(icon, Style::default().fg(icon_color)),
                    Span::styled(
                        format!(" {:>4} ", channel.number()),
                        Style::default().fg(C_NUMBER_HINT),
                    ),
                    Span::styled(channel.label().to_string(), label_style),
                    Span::styled(
                        format!("  {}", channel.group_title()),
                        Style::default().fg(C_MUTED),
                    ),
                ]);
                let item = ListItem::new(line);
                if is_current {
                    item.style(style_selected())
                } else {
                    item
                }
            }
        }
    }
}

impl Component for ChannelList {
    fn id(&self) -> ComponentId {
        ComponentId::ChannelList
    }

    /// Clicks arrive as left-button releases once the App has ruled out a
    /// swipe.  A channel row selects that channel; anything else just keeps
    /// the list up.
    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => {
                self.nudge(-WHEEL_STEP);
                vec![Action::ShowList]
            }
            MouseEventKind::ScrollDown => {
                self.nudge(WHEEL_STEP);
                vec![Action::ShowList]
            }
            MouseEventKind::Up(MouseButton::Left) => match self.row_at(event.row) {
                Some(Row::Channel(idx)) => vec![Action::JumpTo(*idx)],
                _ => vec![Action::ShowList],
            },
            _ => vec![],
        }
    }

    fn tick(&mut self, _state: &AppState) {
        let diff = self.target - self.offset;
        if diff.abs() < 0.5 {
            self.offset = self.target;
        } else {
            self.offset += diff * EASE;
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::PlaylistReplaced => self.rebuild(state.selection.channels()),
            Action::SelectionChanged { index, wrapped } => {
                let height = self.inner.height as usize;
                self.target = self.centred_offset(Some(*index), height);
                if *wrapped {
                    self.offset = self.target;
                }
            }
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge_text = format!("{} ch", state.selection.len());
        let badge = match &state.playlist_status {
            PlaylistStatus::Failed(_) => Badge {
                text: "ERR",
                color: C_ERROR,
            },
            _ => Badge {
                text: &badge_text,
                color: C_MUTED,
            },
        };
        let block = pane_chrome(
            "channels",
            Some("tab"),
            focused,
            Some(badge),
            Borders::TOP | Borders::RIGHT | Borders::BOTTOM,
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let resized = inner.height != self.inner.height;
        self.inner = inner;

        if self.rows.is_empty() {
            let msg = match &state.playlist_status {
                PlaylistStatus::Loading => "  loading playlist…".to_string(),
                PlaylistStatus::Failed(e) => format!("  playlist unavailable: {}", e),
                PlaylistStatus::Loaded => "  no channels".to_string(),
            };
            frame.render_widget(
                Paragraph::new(Span::styled(msg, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        }

        let height = inner.height as usize;
        if self.snap || resized {
            self.target = self.centred_offset(state.selection.index(), height);
            self.offset = self.target;
            self.snap = false;
        }

        self.first_row = (self.offset.round().max(0.0) as usize)
            .min(self.rows.len().saturating_sub(height));
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .skip(self.first_row)
            .take(height)
            .map(|row| self.render_row(row, state))
            .collect();
        frame.render_widget(List::new(items), inner);
    }
}
