//! Swipe resolution from a press/release pair.

/// Minimum displacement, in pixels, for a drag to count as a swipe.
pub const SWIPE_THRESHOLD_PX: i32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    Left,
    Right,
    Up,
    Down,
}

impl Swipe {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Swipe::Left | Swipe::Right)
    }
}

/// Resolve a displacement into a swipe.
///
/// The dominant axis is the one with the larger absolute displacement (ties
/// count as vertical); the drag only registers when that displacement is
/// strictly larger than `threshold`.
pub fn resolve_swipe(dx: i32, dy: i32, threshold: i32) -> Option<Swipe> {
    if dx.abs() > dy.abs() {
        if dx > threshold {
            Some(Swipe::Right)
        } else if dx < -threshold {
            Some(Swipe::Left)
        } else {
            None
        }
    } else if dy > threshold {
        Some(Swipe::Down)
    } else if dy < -threshold {
        Some(Swipe::Up)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dominant_axis_wins() {
        assert_eq!(resolve_swipe(80, 30, 50), Some(Swipe::Right));
        assert_eq!(resolve_swipe(-80, 60, 50), Some(Swipe::Left));
        assert_eq!(resolve_swipe(20, 90, 50), Some(Swipe::Down));
        assert_eq!(resolve_swipe(10, -51, 50), Some(Swipe::Up));
    }

    #[test]
    fn threshold_gates_registration() {
        assert_eq!(resolve_swipe(50, 0, 50), None);
        assert_eq!(resolve_swipe(0, -50, 50), None);
        assert_eq!(resolve_swipe(0, 0, 50), None);
        assert_eq!(resolve_swipe(51, 0, 50), Some(Swipe::Right));
    }
}
