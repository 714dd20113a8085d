//! Millisecond countdowns for every timed behaviour in the game.
//!
//! A countdown is a plain value owned by whatever screen it belongs to.
//! Nothing schedules callbacks: owners call `advance()` from their own
//! `advance()`, so dropping the owner cancels the timer.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Countdown {
    total: u64,
    remaining: u64,
    fired: bool,
}

impl Countdown {
    pub fn new(ms: u64) -> Self {
        Countdown { total: ms, remaining: ms, fired: false }
    }

    /// Advance by `dt` ms. Returns `Some(overshoot)` on the call that
    /// finishes the countdown, `None` before and after.
    pub fn advance(&mut self, dt: u64) -> Option<u64> {
        if self.fired {
            return None;
        }
        if dt >= self.remaining {
            let overshoot = dt - self.remaining;
            self.remaining = 0;
            self.fired = true;
            Some(overshoot)
        } else {
            self.remaining -= dt;
            None
        }
    }

    pub fn is_finished(&self) -> bool {
        self.fired
    }

    #[cfg(test)]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn elapsed(&self) -> u64 {
        self.total - self.remaining
    }

    /// 0.0 at start, 1.0 when done. Zero-length countdowns read as done.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.elapsed() as f32 / self.total as f32
        }
    }
}

/// Advance an optional indicator; clears the slot when it expires.
/// Returns true on the tick it expired.
pub fn tick_slot<T>(slot: &mut Option<(T, Countdown)>, dt: u64) -> bool {
    let expired = match slot {
        Some((_, timer)) => timer.advance(dt).is_some(),
        None => false,
    };
    if expired {
        *slot = None;
    }
    expired
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_once() {
        let mut t = Countdown::new(500);
        assert_eq!(t.advance(499), None);
        assert!(!t.is_finished());
        assert_eq!(t.advance(1), Some(0));
        assert!(t.is_finished());
        assert_eq!(t.advance(100), None);
    }

    #[test]
    fn overshoot_is_reported() {
        let mut t = Countdown::new(500);
        assert_eq!(t.advance(650), Some(150));
        assert_eq!(t.remaining(), 0);
        assert_eq!(t.elapsed(), 500);
    }

    #[test]
    fn zero_length_fires_on_first_advance() {
        let mut t = Countdown::new(0);
        assert!(!t.is_finished());
        assert_eq!(t.advance(0), Some(0));
        assert!((t.progress() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn progress_tracks_elapsed() {
        let mut t = Countdown::new(1000);
        t.advance(250);
        assert!((t.progress() - 0.25).abs() < 0.001);
    }

    #[test]
    fn slot_clears_on_expiry() {
        let mut slot = Some(("shake", Countdown::new(500)));
        assert!(!tick_slot(&mut slot, 300));
        assert!(slot.is_some());
        assert!(tick_slot(&mut slot, 200));
        assert!(slot.is_none());
        assert!(!tick_slot(&mut slot, 200));
    }
}
