//! Level 1: "The Chronos System" case-file quiz.
//!
//! One case file, one question, four options. The player picks options
//! until the right one is found; there is no penalty for wrong picks.

use crate::config::TimingConfig;
use crate::domain::random::{shuffle, RandomSource};
use crate::domain::timer::{tick_slot, Countdown};
use crate::error::{GameError, Result};

pub const TRIVIA_POINTS: u32 = 150;

pub struct CaseFile {
    pub title: &'static str,
    pub body: &'static str,
    pub question: &'static str,
    pub answer: &'static str,
    pub distractors: &'static [&'static str],
}

pub static CHRONOS_CASE: CaseFile = CaseFile {
    title: "LEVEL 1 : THE CHRONOS SYSTEM",
    body: "The corporate net of OmniCorp was breached last night, triggering a red alert \
across Sector 7. Initial reports indicate a sophisticated phish targeting executive \
credentials. Data exfiltration was detected from server 'Cerberus-03', specifically the \
'Project Chimera' directory. Security logs show an anomaly: a phantom user account, \
'Ghost_Protocol', accessing encrypted financial records. The breach occurred at precisely \
02:17 AM. Forensics recovered a fragmented data packet, part of a transaction log, \
revealing a destination IP: 192.168.1.100. This IP address is not internal. The \
exfiltrated data appears to include schematics for a new neural interface. The security \
team is baffled",
    question: "What was the name of the server from which data exfiltration was detected?",
    answer: "Cerberus-03",
    distractors: &["Ghost_Protocol", "OmniCorp", "Project Chimera"],
};

pub const LOADING_STEPS: [&str; 4] = [
    "CONNECTING TO CHRONOS MAINFRAME...",
    "DOWNLOADING CASE FILE D7-2A4B...",
    "DECRYPTING DATA PACKET...",
    "CONNECTION SECURE.",
];

pub const FEEDBACK_GRANTED: &str = "ACCESS GRANTED. Data recovered.";
pub const FEEDBACK_DENIED: &str = "ACCESS DENIED. Incorrect analysis. Please try again.";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TriviaOutcome {
    Correct { points: u32 },
    Incorrect { attempts: u32 },
    /// The case is already closed; the pick changes nothing.
    AlreadySolved,
}

pub struct TriviaGame {
    case: &'static CaseFile,
    options: Vec<&'static str>,
    loading: Countdown,
    loader_step_ms: u64,
    indicator_ms: u64,
    selected: Option<usize>,
    solved: bool,
    attempts: u32,
    score: u32,
    incorrect: Option<(usize, Countdown)>,
    feedback: Option<&'static str>,
    cursor: usize,
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

impl TriviaGame {
    pub fn new(timing: &TimingConfig, rng: &mut dyn RandomSource) -> Self {
        Self::with_case(&CHRONOS_CASE, timing, rng)
    }

    pub fn with_case(case: &'static CaseFile, timing: &TimingConfig, rng: &mut dyn RandomSource) -> Self {
        let mut options: Vec<&'static str> = std::iter::once(case.answer)
            .chain(case.distractors.iter().copied())
            .collect();
        shuffle(rng, &mut options);

        TriviaGame {
            case,
            options,
            loading: Countdown::new(timing.case_file_load_ms),
            loader_step_ms: timing.loader_step_ms.max(1),
            indicator_ms: timing.indicator_ms,
            selected: None,
            solved: false,
            attempts: 0,
            score: 0,
            incorrect: None,
            feedback: None,
            cursor: 0,
        }
    }

    // ── Queries ──

    pub fn case(&self) -> &'static CaseFile {
        self.case
    }

    pub fn options(&self) -> &[&'static str] {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        !self.loading.is_finished()
    }

    /// Loader text: one step per `loader_step_ms`, holding on the last.
    pub fn loading_step(&self) -> &'static str {
        let idx = (self.loading.elapsed() / self.loader_step_ms) as usize;
        LOADING_STEPS[idx.min(LOADING_STEPS.len() - 1)]
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    #[cfg(test)]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn selected(&self) -> Option<&'static str> {
        self.selected.map(|i| self.options[i])
    }

    /// Option currently flashing as wrong, if any.
    pub fn incorrect_option(&self) -> Option<&'static str> {
        self.incorrect.as_ref().map(|(i, _)| self.options[*i])
    }

    pub fn feedback(&self) -> Option<&'static str> {
        self.feedback
    }

    pub fn is_answer(&self, option: &str) -> bool {
        normalize(option) == normalize(self.case.answer)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the highlight; returns true if it moved.
    pub fn move_cursor(&mut self, delta: isize) -> bool {
        let len = self.options.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len - 1) as usize;
        let moved = next != self.cursor;
        self.cursor = next;
        moved
    }

    // ── Actions ──

    /// Compare a pick with the answer, ignoring case and surrounding space.
    pub fn submit(&mut self, option: &str) -> Result<TriviaOutcome> {
        if self.is_loading() {
            return Err(GameError::NotReady("Case file still downloading"));
        }
        if self.solved {
            return Ok(TriviaOutcome::AlreadySolved);
        }

        let idx = self.options.iter().position(|o| normalize(o) == normalize(option));
        self.selected = idx;

        if self.is_answer(option) {
            self.solved = true;
            self.score = TRIVIA_POINTS;
            self.incorrect = None;
            self.feedback = Some(FEEDBACK_GRANTED);
            Ok(TriviaOutcome::Correct { points: TRIVIA_POINTS })
        } else {
            self.attempts += 1;
            self.feedback = Some(FEEDBACK_DENIED);
            self.incorrect = idx.map(|i| (i, Countdown::new(self.indicator_ms)));
            Ok(TriviaOutcome::Incorrect { attempts: self.attempts })
        }
    }

    /// Score to report on "Return to Mission Hub". Only a solved case
    /// reports anything.
    pub fn finish(&self) -> Result<u32> {
        if !self.solved {
            return Err(GameError::NotReady("Case not solved yet"));
        }
        Ok(self.score)
    }

    pub fn advance(&mut self, dt: u64) {
        self.loading.advance(dt);
        tick_slot(&mut self.incorrect, dt);
    }
}
