//! Timed show/hide state for the channel list and the channel overlay.
//!
//! Time is passed in explicitly so the transitions can be driven by a
//! simulated clock.
//!
//! ```text
//!   Visible ──toggle / hide / timer elapsed (not loading)──▶ Hidden
//!   Hidden  ──toggle / show / any navigation──────────────▶ Visible (timer reset)
//! ```

use std::time::{Duration, Instant};

/// Default auto-hide delay for the list and the overlay.
pub const AUTO_HIDE: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Channel list visibility with an auto-hide timer.
#[derive(Debug, Clone)]
pub struct ListVisibility {
    state: Visibility,
    timeout: Duration,
    deadline: Option<Instant>,
}

impl ListVisibility {
    /// Starts visible, with the timer armed from `now`.
    pub fn new(timeout: Duration, now: Instant) -> Self {
        Self {
            state: Visibility::Visible,
            timeout,
            deadline: Some(now + timeout),
        }
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == Visibility::Visible
    }

    /// Show the list and restart the timer.  Used by every navigation event.
    pub fn show(&mut self, now: Instant) {
        self.state = Visibility::Visible;
        self.deadline = Some(now + self.timeout);
    }

    /// Hide immediately, disarming the timer.
    pub fn hide(&mut self) {
        self.state = Visibility::Hidden;
        self.deadline = None;
    }

    pub fn set_visible(&mut self, visible: bool, now: Instant) {
        if visible {
            self.show(now);
        } else {
            self.hide();
        }
    }

    pub fn toggle(&mut self, now: Instant) {
        match self.state {
            Visibility::Visible => self.hide(),
            Visibility::Hidden => self.show(now),
        }
    }

    /// Advance the timer.  While `loading` is true the list never auto-hides;
    /// the deadline is kept so the list hides on the first tick after loading
    /// ends.  Returns true when the state changed.
    pub fn tick(&mut self, now: Instant, loading: bool) -> bool {
        if self.state == Visibility::Hidden || loading {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.hide();
                true
            }
            _ => false,
        }
    }
}

/// One-shot overlay that disappears `timeout` after the last `show`.
#[derive(Debug, Clone)]
pub struct OverlayTimer {
    timeout: Duration,
    until: Option<Instant>,
}

impl OverlayTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            until: None,
        }
    }

    pub fn show(&mut self, now: Instant) {
        self.until = Some(now + self.timeout);
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        self.until.map_or(false, |until| now < until)
    }

    /// Clears an expired overlay.  Returns true when it just disappeared.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.until {
            Some(until) if now >= until => {
                self.until = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_visible_and_auto_hides() {
        let t0 = Instant::now();
        let mut vis = ListVisibility::new(AUTO_HIDE, t0);
        assert!(vis.is_visible());
        assert!(!vis.tick(t0 + Duration::from_secs(3), false));
        assert!(vis.tick(t0 + AUTO_HIDE, false));
        assert_eq!(vis.state(), Visibility::Hidden);
    }

    #[test]
    fn never_hides_while_loading() {
        let t0 = Instant::now();
        let mut vis = ListVisibility::new(AUTO_HIDE, t0);
        for secs in [4u64, 10, 60, 600] {
            assert!(!vis.tick(t0 + Duration::from_secs(secs), true));
            assert!(vis.is_visible());
        }
        assert!(vis.tick(t0 + Duration::from_secs(601), false));
    }

    #[test]
    fn navigation_resets_timer() {
        let t0 = Instant::now();
        let mut vis = ListVisibility::new(AUTO_HIDE, t0);
        vis.show(t0 + Duration::from_secs(3));
        assert!(!vis.tick(t0 + Duration::from_secs(5), false));
        assert!(vis.tick(t0 + Duration::from_secs(7), false));
    }

    #[test]
    fn toggle_and_explicit_hide() {
        let t0 = Instant::now();
        let mut vis = ListVisibility::new(AUTO_HIDE, t0);
        vis.toggle(t0);
        assert!(!vis.is_visible());
        vis.toggle(t0);
        assert!(vis.is_visible());
        vis.set_visible(false, t0);
        assert!(!vis.is_visible());
        assert!(!vis.tick(t0 + Duration::from_secs(100), false));
    }

    #[test]
    fn overlay_expires_after_last_show() {
        let t0 = Instant::now();
        let mut overlay = OverlayTimer::new(AUTO_HIDE);
        assert!(!overlay.is_visible(t0));
        overlay.show(t0);
        overlay.show(t0 + Duration::from_secs(2));
        assert!(overlay.is_visible(t0 + Duration::from_secs(5)));
        assert!(!overlay.tick(t0 + Duration::from_secs(5)));
        assert!(overlay.tick(t0 + Duration::from_secs(6)));
        assert!(!overlay.is_visible(t0 + Duration::from_secs(6)));
    }
}
