//! Bottom rows: last log line, separator and key hints.

use carousel_proto::protocol::MpvHealth;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{C_ACCENT, C_LOADING, C_MUTED, C_PLAYING, C_SECONDARY, C_SEPARATOR};

/// Log bar: mpv health dot followed by the newest WARN/ERROR line.
pub fn draw_log_bar(frame: &mut Frame, area: Rect, last_log: Option<&str>, health: &MpvHealth) {
    let dot = match health {
        MpvHealth::Running => Span::styled("●", Style::default().fg(C_PLAYING)),
        MpvHealth::Starting => Span::styled("◌", Style::default().fg(C_LOADING)),
        MpvHealth::Dead => Span::styled("○", Style::default().fg(C_ACCENT)),
        MpvHealth::Absent => Span::styled("○", Style::default().fg(C_MUTED)),
    };
    let log_span = Span::styled(last_log.unwrap_or(""), Style::default().fg(C_SECONDARY));
    frame.render_widget(
        Paragraph::new(Line::from(vec![dot, Span::raw(" "), log_span])),
        area,
    );
}

pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

/// Key hints; the mode label tells whether the channel list is up.
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, list_visible: bool) {
    let label = if list_visible { "LIST" } else { "VIDEO" };
    let keys = " ↑↓/jk channel  Enter play  Space pause  ←→/Tab list  Esc hide  i info  f full  +/- vol  R reload  ? help  q quit";
    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", label),
            Style::default()
                .fg(C_SECONDARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(keys, Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
