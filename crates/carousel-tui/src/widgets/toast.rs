//! Toast notifications: transient status lines in the top-right corner.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn icon(self) -> &'static str {
        match self {
            Severity::Info => "·",
            Severity::Success => "✓",
            Severity::Warning => "!",
            Severity::Error => "✗",
        }
    }

    fn color(self) -> ratatui::style::Color {
        match self {
            Severity::Info => C_TOAST_INFO,
            Severity::Success => C_TOAST_SUCCESS,
            Severity::Warning => C_TOAST_WARNING,
            Severity::Error => C_TOAST_ERROR,
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

/// Persistent toast that animates until resolved (channel loading).
struct SpinnerToast {
    message: String,
    frame: usize,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinner: Option<SpinnerToast>,
    max_visible: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinner: None,
            max_visible: 4,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity, duration: Duration) {
        let msg = message.into();
        self.toasts.retain(|t| t.message != msg);
        self.toasts.push_back(Toast {
            message: msg,
            severity,
            expires: Instant::now() + duration,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info, Duration::from_secs(3));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success, Duration::from_secs(3));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning, Duration::from_secs(4));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error, Duration::from_secs(5));
    }

    /// Start or replace the spinner.
    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some(SpinnerToast {
            message: message.into(),
            frame: 0,
        });
    }

    pub fn has_spinner(&self) -> bool {
        self.spinner.is_some()
    }

    /// Replace the spinner with an expiring toast.
    pub fn resolve_spinner(&mut self, severity: Severity, message: impl Into<String>) {
        self.spinner = None;
        let duration = match severity {
            Severity::Error => Duration::from_secs(5),
            Severity::Warning => Duration::from_secs(4),
            _ => Duration::from_secs(3),
        };
        self.push(message, severity, duration);
    }

    pub fn dismiss_spinner(&mut self) {
        self.spinner = None;
    }

    /// Drop expired toasts and advance the spinner.  Call each tick.
    pub fn tick(&mut self) {
        self.expire(Instant::now());
        if let Some(ref mut s) = self.spinner {
            s.frame = (s.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    fn expire(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires > now);
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    /// Render in the top-right corner of `area`, spinner first.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() || area.height == 0 {
            return;
        }
        let max_width = (area.width / 2).clamp(30u16.min(area.width), 60);

        let mut rows: Vec<(String, Style)> = Vec::new();
        if let Some(ref s) = self.spinner {
            let icon = SPINNER_FRAMES[s.frame % SPINNER_FRAMES.len()];
            rows.push((
                format!(" {} {} ", icon, s.message),
                Style::default()
                    .fg(C_TOAST_INFO)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        for toast in self.toasts.iter().rev().take(self.max_visible) {
            rows.push((
                format!(" {} {} ", toast.severity.icon(), toast.message),
                Style::default()
                    .fg(toast.severity.color())
                    .add_modifier(Modifier::BOLD),
            ));
        }

        let mut y = area.y + 1;
        for (text, style) in rows {
            if y >= area.y + area.height {
                break;
            }
            let w = (text.width() as u16).min(max_width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(text, style))),
                toast_area,
            );
            y += 1;
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_messages_collapse() {
        let mut t = ToastManager::new();
        t.error("stream failed");
        t.error("stream failed");
        assert_eq!(t.toasts.len(), 1);
    }

    #[test]
    fn spinner_resolves_into_toast() {
        let mut t = ToastManager::new();
        t.spinner("loading News 24");
        assert!(t.has_spinner());
        t.resolve_spinner(Severity::Success, "playing News 24");
        assert!(!t.has_spinner());
        assert_eq!(t.toasts.back().map(|x| x.message.as_str()), Some("playing News 24"));
    }

    #[test]
    fn expired_toasts_are_dropped() {
        let mut t = ToastManager::new();
        t.push("short", Severity::Info, Duration::from_millis(10));
        t.expire(Instant::now() + Duration::from_secs(1));
        assert!(t.is_empty());
    }
}
