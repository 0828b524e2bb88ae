//! Load tracking for the playback engine.
//!
//! Every channel load gets a generation number.  mpv answers `loadfile` with
//! the `playlist_entry_id` of the new entry; from then on only events for that
//! entry may move the status out of `Loading`.  Replies for older generations
//! and events for older entries are dropped, so a slow failure of the previous
//! channel can never clear the indicator for the current one.
//!
//! ```text
//!   Idle/Playing/Error ──begin──▶ Loading ──start-file(entry) + core-idle=false──▶ Playing
//!                                    │
//!                                    ├──end-file(entry, error|eof)──▶ Error
//!                                    └──deadline passed────────────▶ Error
//! ```

use std::time::{Duration, Instant};

use tracing::debug;

use crate::protocol::PlaybackStatus;

/// How long a load may take before it is reported as failed.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    /// `loadfile` sent, reply not seen yet.
    Reply,
    /// Only events for this playlist entry count.
    Entry(i64),
    /// mpv did not report an entry id; accept any entry started after
    /// `begin`.
    Any,
}

/// What a tracker transition means for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Unchanged,
    Started,
    Failed(String),
    /// Playback of the current entry ended normally.
    Ended,
}

#[derive(Debug, Clone)]
pub struct LoadTracker {
    timeout: Duration,
    generation: u64,
    expect: Option<Expect>,
    /// Entry id from the most recent `start-file` event.
    started_entry: Option<i64>,
    /// A `start-file` arrived since the current load began.
    started: bool,
    core_idle: Option<bool>,
    deadline: Option<Instant>,
    status: PlaybackStatus,
}

impl Default for LoadTracker {
    fn default() -> Self {
        Self::new(LOAD_TIMEOUT)
    }
}

impl LoadTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            generation: 0,
            expect: None,
            started_entry: None,
            started: false,
            core_idle: None,
            deadline: None,
            status: PlaybackStatus::Idle,
        }
    }

    pub fn status(&self) -> &PlaybackStatus {
        &self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.status == PlaybackStatus::Loading
    }

    /// Start a new load.  Returns its generation.
    pub fn begin(&mut self, now: Instant) -> u64 {
        self.generation += 1;
        self.expect = Some(Expect::Reply);
        self.started_entry = None;
        self.started = false;
        self.core_idle = None;
        self.deadline = Some(now + self.timeout);
        self.status = PlaybackStatus::Loading;
        self.generation
    }

    /// Record the `loadfile` reply for `generation`.
    pub fn attach(&mut self, generation: u64, entry_id: Option<i64>) -> LoadOutcome {
        if generation != self.generation || self.expect != Some(Expect::Reply) {
            debug!(
                "load: dropping reply for generation {} (current {})",
                generation, self.generation
            );
            return LoadOutcome::Unchanged;
        }
        self.expect = Some(entry_id.map_or(Expect::Any, Expect::Entry));
        self.evaluate()
    }

    /// The `loadfile` command itself failed.
    pub fn reject(&mut self, generation: u64, reason: impl Into<String>) -> LoadOutcome {
        if generation != self.generation || !self.is_loading() {
            return LoadOutcome::Unchanged;
        }
        self.fail(reason.into())
    }

    /// Entry id of the last `start-file` seen since the current load began.
    pub fn started_entry(&self) -> Option<i64> {
        self.started_entry
    }

    pub fn on_start_file(&mut self, entry_id: Option<i64>) {
        self.started_entry = entry_id;
        self.started = true;
        self.core_idle = None;
    }

    pub fn on_core_idle(&mut self, idle: bool) -> LoadOutcome {
        self.core_idle = Some(idle);
        self.evaluate()
    }

    pub fn on_end_file(&mut self, entry_id: Option<i64>, reason: &str) -> LoadOutcome {
        if !self.is_current(entry_id) {
            debug!("load: ignoring end-file for stale entry {:?}", entry_id);
            return LoadOutcome::Unchanged;
        }
        match (&self.status, reason) {
            (PlaybackStatus::Loading | PlaybackStatus::Playing | PlaybackStatus::Paused, "error") => {
                self.fail("stream failed to play".to_string())
            }
            (PlaybackStatus::Loading, "eof") => {
                self.fail("stream ended before playback started".to_string())
            }
            // a playlist URL expanded into new entries; follow whichever starts next
            (PlaybackStatus::Loading, "redirect") => {
                self.expect = Some(Expect::Any);
                self.started_entry = None;
                self.started = false;
                self.core_idle = None;
                LoadOutcome::Unchanged
            }
            (PlaybackStatus::Playing | PlaybackStatus::Paused, "eof") => {
                self.status = PlaybackStatus::Idle;
                self.expect = None;
                LoadOutcome::Ended
            }
            _ => LoadOutcome::Unchanged,
        }
    }

    /// Mirror mpv's `pause` property.  Only affects an active stream.
    pub fn set_paused(&mut self, paused: bool) -> bool {
        let next = match (&self.status, paused) {
            (PlaybackStatus::Playing, true) => PlaybackStatus::Paused,
            (PlaybackStatus::Paused, false) => PlaybackStatus::Playing,
            _ => return false,
        };
        self.status = next;
        true
    }

    /// Fail the load once its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> LoadOutcome {
        match self.deadline {
            Some(deadline) if self.is_loading() && now >= deadline => {
                self.fail(format!("no playback after {}s", self.timeout.as_secs()))
            }
            _ => LoadOutcome::Unchanged,
        }
    }

    /// Forget the current load (explicit stop or mpv death).
    pub fn reset(&mut self) {
        self.generation += 1;
        self.expect = None;
        self.started_entry = None;
        self.started = false;
        self.core_idle = None;
        self.deadline = None;
        self.status = PlaybackStatus::Idle;
    }

    fn is_current(&self, entry_id: Option<i64>) -> bool {
        match self.expect {
            Some(Expect::Entry(id)) => entry_id == Some(id),
            Some(Expect::Any) => self.started,
            Some(Expect::Reply) | None => false,
        }
    }

    fn evaluate(&mut self) -> LoadOutcome {
        if !self.is_loading() {
            return LoadOutcome::Unchanged;
        }
        if self.core_idle == Some(false) && self.is_current(self.started_entry) {
            self.status = PlaybackStatus::Playing;
            self.deadline = None;
            return LoadOutcome::Started;
        }
        LoadOutcome::Unchanged
    }

    fn fail(&mut self, reason: String) -> LoadOutcome {
        self.status = PlaybackStatus::Error;
        self.deadline = None;
        LoadOutcome::Failed(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_then_events_start_playback() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let gen = t.begin(now);
        assert!(t.is_loading());
        assert_eq!(t.attach(gen, Some(3)), LoadOutcome::Unchanged);
        t.on_start_file(Some(3));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Started);
        assert_eq!(t.status(), &PlaybackStatus::Playing);
    }

    #[test]
    fn events_before_reply_are_applied_on_attach() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let gen = t.begin(now);
        t.on_start_file(Some(8));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Unchanged);
        assert_eq!(t.attach(gen, Some(8)), LoadOutcome::Started);
    }

    #[test]
    fn stale_end_file_does_not_clear_new_load() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let first = t.begin(now);
        t.attach(first, Some(1));
        let second = t.begin(now);
        t.attach(second, Some(2));

        assert_eq!(t.on_end_file(Some(1), "error"), LoadOutcome::Unchanged);
        assert!(t.is_loading());

        t.on_start_file(Some(2));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Started);
    }

    #[test]
    fn stale_reply_is_dropped() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let first = t.begin(now);
        let second = t.begin(now);
        assert_eq!(t.attach(first, Some(1)), LoadOutcome::Unchanged);
        assert_eq!(t.reject(first, "boom"), LoadOutcome::Unchanged);
        assert!(t.is_loading());
        t.attach(second, Some(2));
        t.on_start_file(Some(1));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Unchanged);
    }

    #[test]
    fn error_for_current_entry_fails_load() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let gen = t.begin(now);
        t.attach(gen, Some(4));
        assert!(matches!(
            t.on_end_file(Some(4), "error"),
            LoadOutcome::Failed(_)
        ));
        assert_eq!(t.status(), &PlaybackStatus::Error);
    }

    #[test]
    fn deadline_fails_load() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let gen = t.begin(now);
        t.attach(gen, Some(1));
        assert_eq!(t.tick(now + Duration::from_secs(14)), LoadOutcome::Unchanged);
        assert_eq!(
            t.tick(now + LOAD_TIMEOUT),
            LoadOutcome::Failed("no playback after 15s".into())
        );
        assert!(!t.is_loading());
    }

    #[test]
    fn missing_entry_id_accepts_any_entry() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let gen = t.begin(now);
        t.attach(gen, None);
        t.on_start_file(Some(42));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Started);
    }

    #[test]
    fn pause_only_toggles_active_stream() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        assert!(!t.set_paused(true));
        let gen = t.begin(now);
        t.attach(gen, Some(1));
        t.on_start_file(Some(1));
        t.on_core_idle(false);
        assert!(t.set_paused(true));
        assert_eq!(t.status(), &PlaybackStatus::Paused);
        assert!(t.set_paused(false));
        assert_eq!(t.on_end_file(Some(1), "eof"), LoadOutcome::Ended);
        assert_eq!(t.status(), &PlaybackStatus::Idle);
    }

    #[test]
    fn previous_entry_cannot_start_load_without_entry_id() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let first = t.begin(now);
        t.attach(first, Some(1));
        t.on_start_file(Some(1));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Started);

        let second = t.begin(now);
        assert_eq!(t.attach(second, None), LoadOutcome::Unchanged);
        assert_eq!(t.on_core_idle(false), LoadOutcome::Unchanged);
        assert!(t.is_loading());

        t.on_start_file(Some(2));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Started);
    }

    #[test]
    fn eof_while_loading_fails_load() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let gen = t.begin(now);
        t.attach(gen, Some(6));
        assert_eq!(
            t.on_end_file(Some(6), "eof"),
            LoadOutcome::Failed("stream ended before playback started".into())
        );
        assert_eq!(t.status(), &PlaybackStatus::Error);
    }

    #[test]
    fn redirect_follows_expanded_entry() {
        let now = Instant::now();
        let mut t = LoadTracker::default();
        let gen = t.begin(now);
        t.attach(gen, Some(6));
        t.on_start_file(Some(6));
        assert_eq!(t.on_end_file(Some(6), "redirect"), LoadOutcome::Unchanged);
        assert!(t.is_loading());

        t.on_start_file(Some(7));
        assert_eq!(t.on_core_idle(false), LoadOutcome::Started);
    }
}
