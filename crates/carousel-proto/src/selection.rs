//! Current-channel state.
//!
//! `Selection` owns the channel list and the index of the current channel.
//! Every operation is a no-op on an empty list.

use crate::playlist::Channel;

/// Result of a relative move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moved {
    pub index: usize,
    /// True when the move crossed the end of the list in either direction.
    pub wrapped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    channels: Vec<Channel>,
    current: usize,
}

impl Selection {
    pub fn new(channels: Vec<Channel>) -> Self {
        Self {
            channels,
            current: 0,
        }
    }

    /// Replace the whole list (playlist reload).  The index resets to 0.
    pub fn replace(&mut self, channels: Vec<Channel>) {
        self.channels = channels;
        self.current = 0;
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Index of the current channel, `None` when the list is empty.
    pub fn index(&self) -> Option<usize> {
        (!self.channels.is_empty()).then_some(self.current)
    }

    pub fn current(&self) -> Option<&Channel> {
        self.channels.get(self.current)
    }

    /// Step circularly by `delta`.
    pub fn move_by(&mut self, delta: isize) -> Option<Moved> {
        let len = self.channels.len();
        if len == 0 {
            return None;
        }
        let raw = self.current as isize + delta;
        let next = raw.rem_euclid(len as isize) as usize;
        let wrapped = raw < 0 || raw >= len as isize;
        self.current = next;
        Some(Moved {
            index: next,
            wrapped,
        })
    }

    /// Select `index` directly.  Out-of-range indices leave the state alone.
    pub fn jump_to(&mut self, index: usize) -> bool {
        if index < self.channels.len() {
            self.current = index;
            true
        } else {
            false
        }
    }

    /// Select the channel carrying `id`.
    pub fn restore_by_id(&mut self, id: u32) -> bool {
        match self.channels.iter().position(|c| c.id == Some(id)) {
            Some(idx) => {
                self.current = idx;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels(n: usize) -> Vec<Channel> {
        (0..n)
            .map(|i| Channel {
                id: Some(i as u32 + 1),
                name: format!("{}) ch{}", i + 1, i),
                url: format!("http://host/{i}"),
                ..Channel::default()
            })
            .collect()
    }

    #[test]
    fn move_by_wraps_both_ways() {
        let mut sel = Selection::new(channels(3));
        assert_eq!(
            sel.move_by(-1),
            Some(Moved {
                index: 2,
                wrapped: true
            })
        );
        assert_eq!(
            sel.move_by(1),
            Some(Moved {
                index: 0,
                wrapped: true
            })
        );
        assert_eq!(
            sel.move_by(1),
            Some(Moved {
                index: 1,
                wrapped: false
            })
        );
    }

    #[test]
    fn n_moves_return_to_start() {
        for len in 1..8usize {
            for delta in [-3isize, -1, 1, 2, 5] {
                let mut sel = Selection::new(channels(len));
                sel.jump_to(len / 2);
                let start = sel.index();
                for _ in 0..len {
                    sel.move_by(delta);
                }
                assert_eq!(sel.index(), start, "len={len} delta={delta}");
            }
        }
    }

    #[test]
    fn empty_list_is_inert() {
        let mut sel = Selection::default();
        assert_eq!(sel.move_by(1), None);
        assert!(!sel.jump_to(0));
        assert!(!sel.restore_by_id(1));
        assert!(sel.current().is_none());
        assert_eq!(sel.index(), None);
    }

    #[test]
    fn jump_to_ignores_prior_index() {
        let mut sel = Selection::new(channels(5));
        sel.move_by(3);
        assert!(sel.jump_to(1));
        assert_eq!(sel.index(), Some(1));
        assert!(!sel.jump_to(5));
        assert_eq!(sel.index(), Some(1));
    }

    #[test]
    fn restore_by_id_finds_channel() {
        let mut sel = Selection::new(channels(4));
        assert!(sel.restore_by_id(3));
        assert_eq!(sel.index(), Some(2));
        assert!(!sel.restore_by_id(99));
        assert_eq!(sel.index(), Some(2));
    }
}
