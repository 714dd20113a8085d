//! Score / progress tracker.
//!
//! Holds one awarded score per level. Completion flags and the total are
//! derived from it, so `total_score()` is always the sum of what the
//! completed levels reported and can never drift out of sync.

use std::fmt;

/// Target score for a flawless run: 150 + 4 × 60 + 8 × 45.
pub const MAX_SCORE: u32 = 750;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LevelId {
    One,
    Two,
    Three,
}

impl LevelId {
    pub const ALL: [LevelId; 3] = [LevelId::One, LevelId::Two, LevelId::Three];

    pub fn from_number(n: u8) -> Option<LevelId> {
        match n {
            1 => Some(LevelId::One),
            2 => Some(LevelId::Two),
            3 => Some(LevelId::Three),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    fn index(self) -> usize {
        match self {
            LevelId::One => 0,
            LevelId::Two => 1,
            LevelId::Three => 2,
        }
    }

    /// The level that must be complete before this one unlocks.
    pub fn prerequisite(self) -> Option<LevelId> {
        match self {
            LevelId::One => None,
            LevelId::Two => Some(LevelId::One),
            LevelId::Three => Some(LevelId::Two),
        }
    }

    /// Title shown on the mission hub. Level 2 is the matching game and
    /// level 3 the crossword, in that unlock order.
    pub fn title(self) -> &'static str {
        match self {
            LevelId::One => "The Chronos System",
            LevelId::Two => "Violation Investigation",
            LevelId::Three => "Decryption Grid",
        }
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level {}", self.number())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgressState {
    awarded: [Option<u32>; 3],
}

impl ProgressState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_complete(&self, level: LevelId) -> bool {
        self.awarded[level.index()].is_some()
    }

    /// Level 1 is always open; every other level needs its predecessor.
    pub fn is_unlocked(&self, level: LevelId) -> bool {
        level.prerequisite().map_or(true, |prev| self.is_complete(prev))
    }

    pub fn all_complete(&self) -> bool {
        LevelId::ALL.iter().all(|&l| self.is_complete(l))
    }

    pub fn total_score(&self) -> u32 {
        self.awarded.iter().flatten().sum()
    }

    pub fn level_score(&self, level: LevelId) -> Option<u32> {
        self.awarded[level.index()]
    }

    /// Merge a reported level score. Replaying a completed level replaces
    /// its slot instead of adding to the total, and never lowers it.
    pub fn record(&mut self, level: LevelId, score: u32) {
        let slot = &mut self.awarded[level.index()];
        *slot = Some(slot.map_or(score, |prev| prev.max(score)));
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ── Rank ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Rank {
    Rookie,
    Skilled,
    Elite,
}

impl Rank {
    pub fn from_score(score: u32) -> Rank {
        if score >= 750 {
            Rank::Elite
        } else if score >= 450 {
            Rank::Skilled
        } else {
            Rank::Rookie
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Elite => "Elite Agent",
            Rank::Skilled => "Skilled Agent",
            Rank::Rookie => "Rookie Agent",
        }
    }

    pub fn medal(self) -> &'static str {
        match self {
            Rank::Elite => "🏆",
            Rank::Skilled => "🥈",
            Rank::Rookie => "🥉",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_progress_only_unlocks_level_one() {
        let p = ProgressState::new();
        assert!(p.is_unlocked(LevelId::One));
        assert!(!p.is_unlocked(LevelId::Two));
        assert!(!p.is_unlocked(LevelId::Three));
        assert_eq!(p.total_score(), 0);
    }

    #[test]
    fn unlocks_follow_completion_order() {
        let mut p = ProgressState::new();
        p.record(LevelId::One, 150);
        assert!(p.is_unlocked(LevelId::Two));
        assert!(!p.is_unlocked(LevelId::Three));
        p.record(LevelId::Two, 240);
        assert!(p.is_unlocked(LevelId::Three));
    }

    #[test]
    fn total_is_sum_of_levels() {
        let mut p = ProgressState::new();
        p.record(LevelId::One, 150);
        p.record(LevelId::Two, 240);
        p.record(LevelId::Three, 360);
        assert_eq!(p.total_score(), MAX_SCORE);
        assert!(p.all_complete());
    }

    #[test]
    fn replaying_a_level_does_not_double_count() {
        let mut p = ProgressState::new();
        p.record(LevelId::One, 150);
        p.record(LevelId::Two, 240);
        p.record(LevelId::Two, 240);
        assert_eq!(p.total_score(), 390);
        p.record(LevelId::One, 0);
        assert_eq!(p.total_score(), 390);
    }

    #[test]
    fn reset_clears_everything() {
        let mut p = ProgressState::new();
        p.record(LevelId::One, 150);
        p.reset();
        assert_eq!(p, ProgressState::new());
        assert!(!p.is_complete(LevelId::One));
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(Rank::from_score(750), Rank::Elite);
        assert_eq!(Rank::from_score(749), Rank::Skilled);
        assert_eq!(Rank::from_score(450), Rank::Skilled);
        assert_eq!(Rank::from_score(449), Rank::Rookie);
        assert_eq!(Rank::Elite.name(), "Elite Agent");
    }

    #[test]
    fn level_numbers_round_trip() {
        for level in LevelId::ALL {
            assert_eq!(LevelId::from_number(level.number()), Some(level));
        }
        assert_eq!(LevelId::from_number(0), None);
        assert_eq!(LevelId::from_number(4), None);
    }
}
