//! Level 3: "Decryption Grid" crossword.
//!
//! Clues are answered one at a time in a fixed rotation. The pointer
//! always sits on an unsolved entry until the whole grid is solved; three
//! misses on one clue suspend play until the player takes a stronger hint
//! or abandons the level.

use crate::config::TimingConfig;
use crate::domain::timer::{tick_slot, Countdown};
use crate::error::{GameError, Result};

pub const WORD_POINTS: u32 = 45;
pub const GRID_ROWS: usize = 15;
pub const GRID_COLS: usize = 18;
/// Wrong attempts on one clue before the hint choice is forced.
pub const HINT_CHOICE_AFTER: u32 = 3;

pub const FINAL_MESSAGE: &str = "Congratulations, Agent. You have completed all the missions.";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
    Across,
    Down,
}

pub struct Entry {
    pub number: u8,
    pub clue: &'static str,
    pub answer: &'static str,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
}

impl Entry {
    pub fn len(&self) -> usize {
        self.answer.len()
    }

    /// `(row, col, letter)` for every cell of the entry, in reading order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.answer.chars().enumerate().map(move |(i, ch)| match self.direction {
            Direction::Across => (self.row, self.col + i, ch),
            Direction::Down => (self.row + i, self.col, ch),
        })
    }

    pub fn covers(&self, row: usize, col: usize) -> bool {
        self.cells().any(|(r, c, _)| r == row && c == col)
    }
}

pub static ENTRIES: [Entry; 8] = [
    Entry {
        number: 1,
        clue: "Creative ideas and advancements that transform regulatory technology",
        answer: "INNOVATION",
        row: 0,
        col: 8,
        direction: Direction::Down,
    },
    Entry {
        number: 2,
        clue: "Technology designed to strengthen supervisory capacity and improve monitoring",
        answer: "SUPTECH",
        row: 0,
        col: 16,
        direction: Direction::Down,
    },
    Entry {
        number: 3,
        clue: "A secure testing environment where new regulatory tools are safely trialed",
        answer: "SANDBOX",
        row: 2,
        col: 6,
        direction: Direction::Across,
    },
    Entry {
        number: 4,
        clue: "Continuous supervision and monitoring that ensures the system stays on track",
        answer: "OVERSIGHT",
        row: 3,
        col: 8,
        direction: Direction::Across,
    },
    Entry {
        number: 5,
        clue: "Smart processes that reduce manual effort and enhance efficiency",
        answer: "AUTOMATION",
        row: 4,
        col: 6,
        direction: Direction::Down,
    },
    Entry {
        number: 6,
        clue: "Guidelines or rules that steer decisions and ensure compliance within digital supervision",
        answer: "POLICY",
        row: 7,
        col: 5,
        direction: Direction::Across,
    },
    Entry {
        number: 7,
        clue: "Raw, unprocessed information that powers modern SupTech systems",
        answer: "DATA",
        row: 10,
        col: 7,
        direction: Direction::Down,
    },
    Entry {
        number: 8,
        clue: "Framework ensuring accountability, fairness, and transparency in regulatory systems",
        answer: "GOVERNANCE",
        row: 14,
        col: 0,
        direction: Direction::Across,
    },
];

// ── Grid ──

pub struct Cell {
    pub letter: char,
    /// Indices into `ENTRIES` of every entry crossing this cell.
    pub entries: Vec<usize>,
    /// Clue number printed in the corner when an entry starts here.
    pub number: Option<u8>,
}

pub struct Grid {
    cells: Vec<Option<Cell>>,
}

impl Grid {
    pub fn build(entries: &[Entry]) -> Grid {
        let mut cells: Vec<Option<Cell>> = (0..GRID_ROWS * GRID_COLS).map(|_| None).collect();
        for (idx, entry) in entries.iter().enumerate() {
            for (i, (r, c, ch)) in entry.cells().enumerate() {
                let cell = cells[r * GRID_COLS + c].get_or_insert_with(|| Cell {
                    letter: ch,
                    entries: Vec::new(),
                    number: None,
                });
                cell.entries.push(idx);
                if i == 0 && cell.number.is_none() {
                    cell.number = Some(entry.number);
                }
            }
        }
        Grid { cells }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= GRID_ROWS || col >= GRID_COLS {
            return None;
        }
        self.cells[row * GRID_COLS + col].as_ref()
    }

    #[cfg(test)]
    pub fn letter_cells(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

// ── Outcomes ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SubmitOutcome {
    Solved { number: u8, points: u32, puzzle_complete: bool },
    Wrong { attempts: u32, hint_choice: bool },
    /// Every entry is already solved; input is disabled.
    Ignored,
}

pub struct CrosswordGame {
    grid: Grid,
    solved: [bool; 8],
    current: Option<usize>,
    draft: String,
    wrong_attempts: [u32; 8],
    score: u32,
    hint: Option<String>,
    hint_choice: bool,
    shake: Option<(usize, Countdown)>,
    popup: Option<(u32, Countdown)>,
    just_solved: Option<(usize, Countdown)>,
    modal_delay: Option<Countdown>,
    modal_visible: bool,
    timing: TimingConfig,
}

fn first_letter_hint(answer: &str) -> String {
    let first = answer.chars().next().unwrap_or('?');
    format!("Hint: The word starts with '{first}'.")
}

fn half_word_hint(answer: &str) -> String {
    let len = answer.chars().count();
    let shown = len.div_ceil(2);
    let head: String = answer.chars().take(shown).collect();
    format!("Hint: {head}{}", "•".repeat(len - shown))
}

impl CrosswordGame {
    pub fn new(timing: &TimingConfig) -> Self {
        CrosswordGame {
            grid: Grid::build(&ENTRIES),
            solved: [false; 8],
            current: Some(0),
            draft: String::new(),
            wrong_attempts: [0; 8],
            score: 0,
            hint: None,
            hint_choice: false,
            shake: None,
            popup: None,
            just_solved: None,
            modal_delay: None,
            modal_visible: false,
            timing: timing.clone(),
        }
    }

    // ── Queries ──

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn current_entry(&self) -> Option<&'static Entry> {
        self.current.map(|i| &ENTRIES[i])
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn solved_count(&self) -> usize {
        self.solved.iter().filter(|s| **s).count()
    }

    pub fn wrong_attempts(&self) -> u32 {
        self.current.map(|i| self.wrong_attempts[i]).unwrap_or(0)
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn hint_choice_pending(&self) -> bool {
        self.hint_choice
    }

    pub fn is_shaking(&self) -> bool {
        self.shake.is_some()
    }

    /// Points of the "+45" popup while it is showing.
    pub fn popup(&self) -> Option<u32> {
        self.popup.as_ref().map(|(p, _)| *p)
    }

    pub fn modal_visible(&self) -> bool {
        self.modal_visible
    }

    /// Letter shown at a cell: revealed once any owning entry is solved.
    pub fn revealed(&self, row: usize, col: usize) -> Option<char> {
        let cell = self.grid.cell(row, col)?;
        cell.entries.iter().any(|&e| self.solved[e]).then_some(cell.letter)
    }

    pub fn is_active_cell(&self, row: usize, col: usize) -> bool {
        self.current_entry().is_some_and(|e| e.covers(row, col))
    }

    pub fn is_just_solved_cell(&self, row: usize, col: usize) -> bool {
        self.just_solved
            .as_ref()
            .is_some_and(|(i, _)| ENTRIES[*i].covers(row, col))
    }

    fn accepts_input(&self) -> bool {
        !self.hint_choice && self.current.is_some()
    }

    // ── Draft editing ──

    /// Append a typed character. Returns false when input is disabled.
    pub fn push_char(&mut self, ch: char) -> bool {
        if !self.accepts_input() || ch.is_control() || self.draft.chars().count() >= GRID_COLS {
            return false;
        }
        self.draft.push(ch);
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.accepts_input() && self.draft.pop().is_some()
    }

    // ── Actions ──

    /// Check `text` against the current entry (trimmed, case-insensitive).
    pub fn submit(&mut self, text: &str) -> Result<SubmitOutcome> {
        if self.hint_choice {
            return Err(GameError::HintChoicePending);
        }
        let Some(idx) = self.current else {
            return Ok(SubmitOutcome::Ignored);
        };
        let entry = &ENTRIES[idx];
        self.draft.clear();

        if text.trim().to_uppercase() == entry.answer {
            self.solved[idx] = true;
            self.score += WORD_POINTS;
            self.hint = None;
            self.shake = None;
            self.popup = Some((WORD_POINTS, Countdown::new(self.timing.score_popup_ms)));
            self.just_solved = Some((idx, Countdown::new(self.timing.highlight_ms)));
            self.current = self.next_unsolved(idx);

            let puzzle_complete = self.current.is_none();
            if puzzle_complete {
                self.modal_delay = Some(Countdown::new(self.timing.completion_modal_delay_ms));
            }
            return Ok(SubmitOutcome::Solved {
                number: entry.number,
                points: WORD_POINTS,
                puzzle_complete,
            });
        }

        self.wrong_attempts[idx] += 1;
        let attempts = self.wrong_attempts[idx];
        self.shake = Some((idx, Countdown::new(self.timing.indicator_ms)));
        if attempts >= HINT_CHOICE_AFTER {
            self.hint_choice = true;
        } else {
            self.hint = Some(first_letter_hint(entry.answer));
        }
        Ok(SubmitOutcome::Wrong { attempts, hint_choice: self.hint_choice })
    }

    /// Next unsolved entry after `from`, wrapping. `None` when all solved.
    fn next_unsolved(&self, from: usize) -> Option<usize> {
        let n = ENTRIES.len();
        (1..=n).map(|step| (from + step) % n).find(|&i| !self.solved[i])
    }

    /// Take the stronger hint: the first half of the word, the rest masked.
    pub fn accept_hint(&mut self) -> Result<&str> {
        if !self.hint_choice {
            return Err(GameError::NotReady("No hint on offer"));
        }
        let idx = self.current.ok_or(GameError::NotReady("No hint on offer"))?;
        self.hint_choice = false;
        self.wrong_attempts[idx] = 0;
        Ok(self.hint.insert(half_word_hint(ENTRIES[idx].answer)).as_str())
    }

    /// Start the grid over from the completion modal.
    pub fn replay(&mut self) -> Result<()> {
        if !self.modal_visible {
            return Err(GameError::NotReady("Grid not finished yet"));
        }
        *self = CrosswordGame::new(&self.timing);
        Ok(())
    }

    pub fn finish(&self) -> Result<u32> {
        if !self.modal_visible {
            return Err(GameError::NotReady("Grid not finished yet"));
        }
        Ok(self.score)
    }

    pub fn advance(&mut self, dt: u64) {
        tick_slot(&mut self.shake, dt);
        tick_slot(&mut self.popup, dt);
        tick_slot(&mut self.just_solved, dt);
        if let Some(delay) = self.modal_delay.as_mut() {
            if delay.advance(dt).is_some() {
                self.modal_visible = true;
                self.modal_delay = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> CrosswordGame {
        CrosswordGame::new(&TimingConfig::default())
    }

    fn solve_current(g: &mut CrosswordGame) -> SubmitOutcome {
        let answer = g.current_entry().unwrap().answer;
        g.submit(answer).unwrap()
    }

    #[test]
    fn grid_crossings_agree() {
        let grid = Grid::build(&ENTRIES);
        assert_eq!(grid.letter_cells(), 58);
        for entry in ENTRIES.iter() {
            for (r, c, ch) in entry.cells() {
                assert!(r < GRID_ROWS && c < GRID_COLS);
                assert_eq!(grid.cell(r, c).unwrap().letter, ch, "{} at ({r},{c})", entry.answer);
            }
        }
        // INNOVATION × SANDBOX × OVERSIGHT
        assert_eq!(grid.cell(2, 8).unwrap().entries, vec![0, 2]);
        assert_eq!(grid.cell(3, 8).unwrap().entries, vec![0, 3]);
        assert_eq!(grid.cell(0, 8).unwrap().number, Some(1));
        assert!(grid.cell(0, 0).is_none());
        assert!(grid.cell(GRID_ROWS, 0).is_none());
    }

    #[test]
    fn correct_answer_is_normalized_and_advances() {
        let mut g = game();
        let out = g.submit("  innovation ").unwrap();
        assert_eq!(out, SubmitOutcome::Solved { number: 1, points: 45, puzzle_complete: false });
        assert_eq!(g.current_entry().unwrap().number, 2);
        assert_eq!(g.score(), 45);
        assert_eq!(g.popup(), Some(45));
        assert!(g.is_just_solved_cell(0, 8));
    }

    #[test]
    fn crossing_cells_reveal_from_either_entry() {
        let mut g = game();
        assert_eq!(g.revealed(2, 8), None);
        g.submit("INNOVATION").unwrap();
        // (2,8) is shared with SANDBOX, which is still unsolved.
        assert_eq!(g.revealed(2, 8), Some('N'));
        assert_eq!(g.revealed(2, 6), None);
    }

    #[test]
    fn wrong_answers_hint_then_force_choice() {
        let mut g = game();
        g.push_char('X');
        assert_eq!(
            g.submit("WRONG").unwrap(),
            SubmitOutcome::Wrong { attempts: 1, hint_choice: false }
        );
        assert_eq!(g.draft(), "");
        assert!(g.is_shaking());
        assert_eq!(g.hint(), Some("Hint: The word starts with 'I'."));
        assert_eq!(g.current_entry().unwrap().number, 1);

        g.submit("WRONG").unwrap();
        let third = g.submit("WRONG").unwrap();
        assert_eq!(third, SubmitOutcome::Wrong { attempts: 3, hint_choice: true });
        assert!(g.hint_choice_pending());
        assert!(matches!(g.submit("INNOVATION"), Err(GameError::HintChoicePending)));
        assert!(!g.push_char('I'));
    }

    #[test]
    fn stronger_hint_resets_counter() {
        let mut g = game();
        for _ in 0..3 {
            g.submit("nope").unwrap();
        }
        assert_eq!(g.accept_hint().unwrap(), "Hint: INNOV•••••");
        assert!(!g.hint_choice_pending());
        assert_eq!(g.wrong_attempts(), 0);
        assert!(g.accept_hint().is_err());
    }

    #[test]
    fn odd_length_hint_rounds_up() {
        assert_eq!(half_word_hint("SUPTECH"), "Hint: SUPT•••");
        assert_eq!(half_word_hint("DATA"), "Hint: DA••");
    }

    #[test]
    fn pointer_walks_every_entry_then_disables_input() {
        let mut g = game();
        g.submit("INNOVATION").unwrap();
        for _ in 0..6 {
            solve_current(&mut g);
        }
        assert_eq!(g.current_entry().unwrap().number, 8);
        assert_eq!(g.solved_count(), 7);
        let out = solve_current(&mut g);
        assert_eq!(out, SubmitOutcome::Solved { number: 8, points: 45, puzzle_complete: true });
        assert!(g.current_entry().is_none());
        assert_eq!(g.submit("ANY").unwrap(), SubmitOutcome::Ignored);
    }

    #[test]
    fn full_grid_scores_360_and_shows_modal_later() {
        let timing = TimingConfig::default();
        let mut g = game();
        while g.current_entry().is_some() {
            solve_current(&mut g);
        }
        assert_eq!(g.score(), 360);
        assert!(!g.modal_visible());
        assert!(g.finish().is_err());

        g.advance(timing.completion_modal_delay_ms);
        assert!(g.modal_visible());
        assert_eq!(g.finish().unwrap(), 360);
    }

    #[test]
    fn replay_resets_everything() {
        let timing = TimingConfig::default();
        let mut g = game();
        assert!(g.replay().is_err());
        while g.current_entry().is_some() {
            solve_current(&mut g);
        }
        g.advance(timing.completion_modal_delay_ms);
        g.replay().unwrap();
        assert_eq!(g.score(), 0);
        assert_eq!(g.solved_count(), 0);
        assert_eq!(g.current_entry().unwrap().number, 1);
        assert!(!g.modal_visible());
    }

    #[test]
    fn draft_editing() {
        let mut g = game();
        assert!(g.push_char('i'));
        assert!(g.push_char('n'));
        assert!(g.backspace());
        assert_eq!(g.draft(), "i");
        assert!(!g.push_char('\n'));
    }

    #[test]
    fn indicators_expire() {
        let timing = TimingConfig::default();
        let mut g = game();
        g.submit("INNOVATION").unwrap();
        g.advance(timing.score_popup_ms);
        assert_eq!(g.popup(), None);
        assert!(g.is_just_solved_cell(0, 8));
        g.advance(timing.highlight_ms - timing.score_popup_ms);
        assert!(!g.is_just_solved_cell(0, 8));
    }
}
