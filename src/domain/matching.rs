//! Level 2: "Compliance Matrix" matching board.
//!
//! Four violations on the left, four regulatory frameworks on the right.
//! The player carries a violation over to a framework slot; a slot fills
//! only with its correct violation and never empties again.

use crate::config::TimingConfig;
use crate::domain::random::{shuffle, RandomSource};
use crate::domain::timer::{tick_slot, Countdown};
use crate::error::{GameError, Result};

pub const MATCH_POINTS: u32 = 60;

pub struct Pair {
    pub violation_id: &'static str,
    pub violation: &'static str,
    pub framework_id: &'static str,
    pub framework: &'static str,
}

pub static PAIRS: [Pair; 4] = [
    Pair {
        violation_id: "v1",
        violation: "Data Privacy Breach",
        framework_id: "f1",
        framework: "GDPR (Privacy & Data Protection)",
    },
    Pair {
        violation_id: "v2",
        violation: "AML Compliance Failure",
        framework_id: "f2",
        framework: "AML (Anti-Money Laundering)",
    },
    Pair {
        violation_id: "v3",
        violation: "Transaction Monitoring Gap",
        framework_id: "f3",
        framework: "MiFID (Market Integrity)",
    },
    Pair {
        violation_id: "v4",
        violation: "Reporting Delay",
        framework_id: "f4",
        framework: "Basel III (Risk Reporting)",
    },
];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchOutcome {
    Matched { points: u32, board_complete: bool },
    Mismatched,
    /// Violation already placed or slot already filled: nothing happens.
    Ignored,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Column {
    Violations,
    Frameworks,
}

pub struct MatchingGame {
    violation_order: Vec<usize>,
    matched: [bool; 4],
    score: u32,
    popup: Option<(usize, Countdown)>,
    shake: Option<(usize, Countdown)>,
    summary_delay: Option<Countdown>,
    summary_visible: bool,
    held: Option<usize>,
    violation_cursor: usize,
    framework_cursor: usize,
    indicator_ms: u64,
    popup_ms: u64,
    summary_ms: u64,
}

fn violation_index(id: &str) -> Result<usize> {
    PAIRS
        .iter()
        .position(|p| p.violation_id == id)
        .ok_or_else(|| GameError::UnknownItem(id.to_string()))
}

fn framework_index(id: &str) -> Result<usize> {
    PAIRS
        .iter()
        .position(|p| p.framework_id == id)
        .ok_or_else(|| GameError::UnknownItem(id.to_string()))
}

impl MatchingGame {
    pub fn new(timing: &TimingConfig, rng: &mut dyn RandomSource) -> Self {
        let mut violation_order: Vec<usize> = (0..PAIRS.len()).collect();
        shuffle(rng, &mut violation_order);

        MatchingGame {
            violation_order,
            matched: [false; 4],
            score: 0,
            popup: None,
            shake: None,
            summary_delay: None,
            summary_visible: false,
            held: None,
            violation_cursor: 0,
            framework_cursor: 0,
            indicator_ms: timing.indicator_ms,
            popup_ms: timing.score_popup_ms,
            summary_ms: timing.summary_delay_ms,
        }
    }

    // ── Queries ──

    /// Violations in display order.
    pub fn violations(&self) -> impl Iterator<Item = &'static Pair> + '_ {
        self.violation_order.iter().map(|&i| &PAIRS[i])
    }

    /// Frameworks are always shown in their fixed order.
    pub fn frameworks(&self) -> impl Iterator<Item = &'static Pair> {
        PAIRS.iter()
    }

    pub fn is_matched(&self, violation_id: &str) -> bool {
        violation_index(violation_id).map(|i| self.matched[i]).unwrap_or(false)
    }

    /// The violation sitting in a framework slot, if filled.
    pub fn slot_content(&self, framework_id: &str) -> Option<&'static str> {
        let i = framework_index(framework_id).ok()?;
        self.matched[i].then(|| PAIRS[i].violation)
    }

    pub fn matched_count(&self) -> usize {
        self.matched.iter().filter(|m| **m).count()
    }

    pub fn is_complete(&self) -> bool {
        self.matched.iter().all(|m| *m)
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn summary_visible(&self) -> bool {
        self.summary_visible
    }

    /// Framework slot showing a "+60" popup.
    pub fn popup(&self) -> Option<&'static str> {
        self.popup.as_ref().map(|(i, _)| PAIRS[*i].framework_id)
    }

    /// Framework slot currently shaking after a wrong drop.
    pub fn shaking(&self) -> Option<&'static str> {
        self.shake.as_ref().map(|(i, _)| PAIRS[*i].framework_id)
    }

    pub fn held(&self) -> Option<&'static Pair> {
        self.held.map(|i| &PAIRS[i])
    }

    pub fn active_column(&self) -> Column {
        if self.held.is_some() {
            Column::Frameworks
        } else {
            Column::Violations
        }
    }

    pub fn violation_cursor(&self) -> usize {
        self.violation_cursor
    }

    pub fn framework_cursor(&self) -> usize {
        self.framework_cursor
    }

    // ── Cursor & drag ──

    /// Move the cursor of the active column. Returns true if it moved.
    pub fn move_cursor(&mut self, delta: isize) -> bool {
        let cursor = match self.active_column() {
            Column::Violations => &mut self.violation_cursor,
            Column::Frameworks => &mut self.framework_cursor,
        };
        let next = (*cursor as isize + delta).clamp(0, PAIRS.len() as isize - 1) as usize;
        let moved = next != *cursor;
        *cursor = next;
        moved
    }

    pub fn pick_up(&mut self, violation_id: &str) -> Result<bool> {
        let i = violation_index(violation_id)?;
        if self.matched[i] {
            return Ok(false);
        }
        self.held = Some(i);
        Ok(true)
    }

    /// Pick up the violation under the cursor. Placed violations stay put.
    pub fn pick_up_at_cursor(&mut self) -> bool {
        let i = self.violation_order[self.violation_cursor];
        self.pick_up(PAIRS[i].violation_id).unwrap_or(false)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.held.take().is_some()
    }

    /// Drop the held violation on a framework slot.
    pub fn drop_on(&mut self, framework_id: &str) -> Result<MatchOutcome> {
        framework_index(framework_id)?;
        let held = self
            .held
            .take()
            .ok_or(GameError::NotReady("Pick up a violation first"))?;
        self.match_pair(PAIRS[held].violation_id, framework_id)
    }

    /// Drop the held violation on the framework under the cursor.
    pub fn drop_at_cursor(&mut self) -> Result<MatchOutcome> {
        self.drop_on(PAIRS[self.framework_cursor].framework_id)
    }

    // ── Matching ──

    pub fn match_pair(&mut self, violation_id: &str, framework_id: &str) -> Result<MatchOutcome> {
        let v = violation_index(violation_id)?;
        let f = framework_index(framework_id)?;
        if self.held == Some(v) {
            self.held = None;
        }

        if self.matched[v] || self.matched[f] {
            return Ok(MatchOutcome::Ignored);
        }

        if v != f {
            self.shake = Some((f, Countdown::new(self.indicator_ms)));
            return Ok(MatchOutcome::Mismatched);
        }

        self.matched[v] = true;
        self.score += MATCH_POINTS;
        self.popup = Some((f, Countdown::new(self.popup_ms)));

        let board_complete = self.is_complete();
        if board_complete {
            self.summary_delay = Some(Countdown::new(self.summary_ms));
        }
        Ok(MatchOutcome::Matched { points: MATCH_POINTS, board_complete })
    }

    /// Score to report from the summary's "Return to Mission Hub".
    pub fn finish(&self) -> Result<u32> {
        if !self.summary_visible {
            return Err(GameError::NotReady("Match every violation first"));
        }
        Ok(self.score)
    }

    pub fn advance(&mut self, dt: u64) {
        tick_slot(&mut self.popup, dt);
        tick_slot(&mut self.shake, dt);
        if let Some(delay) = self.summary_delay.as_mut() {
            if delay.advance(dt).is_some() {
                self.summary_visible = true;
                self.summary_delay = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::random::ScriptedRandom;

    fn game() -> MatchingGame {
        MatchingGame::new(&TimingConfig::default(), &mut ScriptedRandom::zeros())
    }

    fn match_all(g: &mut MatchingGame) {
        for p in PAIRS.iter() {
            g.match_pair(p.violation_id, p.framework_id).unwrap();
        }
    }

    #[test]
    fn violations_are_shuffled_frameworks_are_fixed() {
        let g = game();
        let order: Vec<&str> = g.violations().map(|p| p.violation_id).collect();
        // Zero draws rotate left.
        assert_eq!(order, vec!["v2", "v3", "v4", "v1"]);
        let fixed: Vec<&str> = g.frameworks().map(|p| p.framework_id).collect();
        assert_eq!(fixed, vec!["f1", "f2", "f3", "f4"]);
    }

    #[test]
    fn correct_match_scores_and_fills_slot() {
        let mut g = game();
        let out = g.match_pair("v1", "f1").unwrap();
        assert_eq!(out, MatchOutcome::Matched { points: 60, board_complete: false });
        assert_eq!(g.slot_content("f1"), Some("Data Privacy Breach"));
        assert!(g.is_matched("v1"));
        assert_eq!(g.popup(), Some("f1"));
        assert_eq!(g.score(), 60);
    }

    #[test]
    fn wrong_match_shakes_without_scoring() {
        let mut g = game();
        assert_eq!(g.match_pair("v1", "f2").unwrap(), MatchOutcome::Mismatched);
        assert_eq!(g.shaking(), Some("f2"));
        assert_eq!(g.score(), 0);
        assert_eq!(g.slot_content("f2"), None);

        g.advance(TimingConfig::default().indicator_ms);
        assert_eq!(g.shaking(), None);
    }

    #[test]
    fn filled_slots_and_placed_violations_ignore_drops() {
        let mut g = game();
        g.match_pair("v2", "f2").unwrap();
        assert_eq!(g.match_pair("v2", "f2").unwrap(), MatchOutcome::Ignored);
        assert_eq!(g.match_pair("v1", "f2").unwrap(), MatchOutcome::Ignored);
        assert_eq!(g.match_pair("v2", "f3").unwrap(), MatchOutcome::Ignored);
        assert_eq!(g.score(), 60);
        assert_eq!(g.shaking(), None);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let mut g = game();
        assert!(matches!(g.match_pair("v9", "f1"), Err(GameError::UnknownItem(_))));
        assert!(matches!(g.match_pair("v1", "x"), Err(GameError::UnknownItem(_))));
        assert!(matches!(g.pick_up("nope"), Err(GameError::UnknownItem(_))));
    }

    #[test]
    fn summary_follows_completion_after_delay() {
        let timing = TimingConfig::default();
        let mut g = game();
        for p in PAIRS.iter().take(3) {
            g.match_pair(p.violation_id, p.framework_id).unwrap();
        }
        let last = g.match_pair("v4", "f4").unwrap();
        assert_eq!(last, MatchOutcome::Matched { points: 60, board_complete: true });
        assert!(!g.summary_visible());
        assert!(g.finish().is_err());

        g.advance(timing.summary_delay_ms - 1);
        assert!(!g.summary_visible());
        g.advance(1);
        assert!(g.summary_visible());
        assert_eq!(g.finish().unwrap(), 240);
    }

    #[test]
    fn drag_with_cursors() {
        let mut g = game();
        // Display order is v2, v3, v4, v1.
        assert!(g.pick_up_at_cursor());
        assert_eq!(g.held().map(|p| p.violation_id), Some("v2"));
        assert_eq!(g.active_column(), Column::Frameworks);

        assert!(g.move_cursor(1));
        let out = g.drop_at_cursor().unwrap();
        assert!(matches!(out, MatchOutcome::Matched { .. }));
        assert!(g.held().is_none());
        assert_eq!(g.active_column(), Column::Violations);

        // A placed violation cannot be picked up again.
        assert!(!g.pick_up_at_cursor());
        assert!(matches!(g.drop_at_cursor(), Err(GameError::NotReady(_))));
    }

    #[test]
    fn cancel_drag_returns_the_card() {
        let mut g = game();
        g.pick_up("v3").unwrap();
        assert!(g.cancel_drag());
        assert!(!g.cancel_drag());
        assert!(!g.is_matched("v3"));
    }

    #[test]
    fn drop_by_id() {
        let mut g = game();
        assert!(matches!(g.drop_on("f1"), Err(GameError::NotReady(_))));
        assert!(g.pick_up("v3").unwrap());
        assert!(matches!(g.drop_on("f9"), Err(GameError::UnknownItem(_))));
        // A bad id leaves the card in hand.
        assert!(g.held().is_some());
        assert_eq!(g.drop_on("f3").unwrap(), MatchOutcome::Matched { points: MATCH_POINTS, board_complete: false });
        assert!(g.held().is_none());
    }

    #[test]
    fn full_board_scores_240() {
        let mut g = game();
        match_all(&mut g);
        assert!(g.is_complete());
        assert_eq!(g.matched_count(), 4);
        assert_eq!(g.score(), 240);
    }
}
