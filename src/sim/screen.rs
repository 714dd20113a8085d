//! Screen state: which view is mounted, plus the transient overlays that
//! ride on top of it.
//!
//! Each screen variant owns its own state and timers. Replacing the
//! variant drops them, so nothing from an old screen can fire into a new one.

use crate::config::TimingConfig;
use crate::domain::crossword::CrosswordGame;
use crate::domain::matching::MatchingGame;
use crate::domain::profile::{self, Avatar, DEFAULT_CODENAME};
use crate::domain::progress::{LevelId, ProgressState};
use crate::domain::timer::Countdown;
use crate::domain::trivia::TriviaGame;

pub const AUTH_STEPS: [&str; 4] = [
    "VERIFYING CODENAME...",
    "CHECKING AVATAR SIGNATURE...",
    "ACCESSING BUREAU NETWORK...",
    "AUTHENTICATION SUCCESSFUL.",
];

const MAX_CODENAME_CHARS: usize = 24;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ScreenKind {
    Intro,
    Registration,
    ScoringBriefing,
    Briefing,
    Level1,
    Level2,
    Level3,
    Completion,
}

impl ScreenKind {
    /// Stable name; also the seed key for the background particle field.
    pub fn name(self) -> &'static str {
        match self {
            ScreenKind::Intro => "intro",
            ScreenKind::Registration => "registration",
            ScreenKind::ScoringBriefing => "scoringBriefing",
            ScreenKind::Briefing => "briefing",
            ScreenKind::Level1 => "level1",
            ScreenKind::Level2 => "level2",
            ScreenKind::Level3 => "level3",
            ScreenKind::Completion => "completion",
        }
    }

    pub fn for_level(level: LevelId) -> ScreenKind {
        match level {
            LevelId::One => ScreenKind::Level1,
            LevelId::Two => ScreenKind::Level2,
            LevelId::Three => ScreenKind::Level3,
        }
    }

    pub fn is_level(self) -> bool {
        matches!(self, ScreenKind::Level1 | ScreenKind::Level2 | ScreenKind::Level3)
    }
}

// ── Registration ──

#[derive(Clone, Debug)]
pub struct RegistrationForm {
    draft: String,
    avatar: Avatar,
    show_help: bool,
}

impl RegistrationForm {
    pub fn new() -> Self {
        RegistrationForm { draft: String::new(), avatar: Avatar::Detective, show_help: false }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn avatar(&self) -> Avatar {
        self.avatar
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn inline_error(&self) -> Option<String> {
        profile::inline_error(&self.draft)
    }

    pub fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() || self.draft.chars().count() >= MAX_CODENAME_CHARS {
            return false;
        }
        self.draft.push(ch);
        true
    }

    pub fn backspace(&mut self) -> bool {
        self.draft.pop().is_some()
    }

    pub fn use_default(&mut self) {
        self.draft = DEFAULT_CODENAME.to_string();
    }

    pub fn cycle_avatar(&mut self, delta: isize) {
        self.avatar = if delta < 0 { self.avatar.prev() } else { self.avatar.next() };
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }
}

impl Default for RegistrationForm {
    fn default() -> Self {
        Self::new()
    }
}

/// "Authenticating" loader shown between registration and the scoring
/// briefing. Blocks all input until it runs out.
#[derive(Clone, Debug)]
pub struct AuthOverlay {
    countdown: Countdown,
    step_ms: u64,
}

impl AuthOverlay {
    pub fn new(timing: &TimingConfig) -> Self {
        AuthOverlay {
            countdown: Countdown::new(timing.auth_overlay_ms),
            step_ms: timing.loader_step_ms.max(1),
        }
    }

    pub fn step(&self) -> &'static str {
        let idx = (self.countdown.elapsed() / self.step_ms) as usize;
        AUTH_STEPS[idx.min(AUTH_STEPS.len() - 1)]
    }

    pub fn progress(&self) -> f32 {
        self.countdown.progress()
    }

    /// `Some(overshoot)` once, when the overlay is done.
    pub fn advance(&mut self, dt: u64) -> Option<u64> {
        self.countdown.advance(dt)
    }
}

// ── Screen ──

pub enum Screen {
    Intro,
    Registration { form: RegistrationForm, overlay: Option<AuthOverlay> },
    ScoringBriefing,
    Briefing { cursor: usize },
    Level1(TriviaGame),
    Level2(MatchingGame),
    Level3(CrosswordGame),
    Completion,
}

impl Screen {
    pub fn kind(&self) -> ScreenKind {
        match self {
            Screen::Intro => ScreenKind::Intro,
            Screen::Registration { .. } => ScreenKind::Registration,
            Screen::ScoringBriefing => ScreenKind::ScoringBriefing,
            Screen::Briefing { .. } => ScreenKind::Briefing,
            Screen::Level1(_) => ScreenKind::Level1,
            Screen::Level2(_) => ScreenKind::Level2,
            Screen::Level3(_) => ScreenKind::Level3,
            Screen::Completion => ScreenKind::Completion,
        }
    }

    /// Advance timers owned by the mounted screen.
    pub fn advance(&mut self, dt: u64) {
        match self {
            Screen::Level1(game) => game.advance(dt),
            Screen::Level2(game) => game.advance(dt),
            Screen::Level3(game) => game.advance(dt),
            _ => {}
        }
    }
}

/// Mission hub text; changes once every level is done.
pub fn hub_directive(progress: &ProgressState, codename: &str) -> String {
    if progress.all_complete() {
        format!(
            "Excellent work, Agent {codename}. All systems restored. The Bureau is in your debt. \
You may replay any simulation to hone your skills."
        )
    } else {
        "A critical data breach has occurred. Your mission is to restore the Bureau's systems by \
completing the following training modules. The fate of our data is in your hands."
            .to_string()
    }
}

// ── Celebration ──

/// One-shot "level N complete" notice on the mission hub. Runs on its own
/// clock, unrelated to screen fades.
#[derive(Clone, Debug)]
pub struct Celebration {
    level: LevelId,
    countdown: Countdown,
}

impl Celebration {
    pub fn new(level: LevelId, ms: u64) -> Self {
        Celebration { level, countdown: Countdown::new(ms) }
    }

    pub fn level(&self) -> LevelId {
        self.level
    }

    /// True on the tick it expires.
    pub fn advance(&mut self, dt: u64) -> bool {
        self.countdown.advance(dt).is_some()
    }
}

// ── Fade ──

/// What happens when a leaving fade runs out.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FadeTarget {
    Screen(ScreenKind),
    /// Start the authentication overlay on the registration screen.
    Authenticate,
    /// Reset progress, then mount the hub.
    Replay,
}

#[derive(Clone, Debug)]
pub enum Fade {
    Idle,
    Leaving { target: FadeTarget, countdown: Countdown },
    Entering { countdown: Countdown },
}

impl Fade {
    /// Screen opacity, 0.0 (black) to 1.0 (fully shown).
    pub fn opacity(&self) -> f32 {
        match self {
            Fade::Idle => 1.0,
            Fade::Leaving { countdown, .. } => 1.0 - countdown.progress(),
            Fade::Entering { countdown } => countdown.progress(),
        }
    }

    pub fn is_leaving(&self) -> bool {
        matches!(self, Fade::Leaving { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_steps_advance_and_hold() {
        let timing = TimingConfig::default();
        let mut ov = AuthOverlay::new(&timing);
        assert_eq!(ov.step(), AUTH_STEPS[0]);
        ov.advance(timing.loader_step_ms * 2);
        assert_eq!(ov.step(), AUTH_STEPS[2]);
        ov.advance(timing.loader_step_ms);
        assert_eq!(ov.step(), AUTH_STEPS[3]);
        assert!(ov.advance(timing.auth_overlay_ms).is_some());
        assert_eq!(ov.step(), AUTH_STEPS[3]);
    }

    #[test]
    fn registration_form_editing() {
        let mut form = RegistrationForm::new();
        assert!(form.push_char('X'));
        assert!(form.inline_error().is_some());
        form.use_default();
        assert_eq!(form.draft(), "Agent Smith");
        assert_eq!(form.inline_error(), None);
        form.cycle_avatar(-1);
        assert_eq!(form.avatar(), Avatar::Cyborg);
        form.toggle_help();
        assert!(form.show_help());
    }

    #[test]
    fn codename_draft_is_capped() {
        let mut form = RegistrationForm::new();
        for _ in 0..40 {
            form.push_char('a');
        }
        assert_eq!(form.draft().len(), MAX_CODENAME_CHARS);
    }

    #[test]
    fn directive_changes_when_all_done() {
        let mut p = ProgressState::new();
        assert!(hub_directive(&p, "X").starts_with("A critical data breach"));
        for l in LevelId::ALL {
            p.record(l, 1);
        }
        assert!(hub_directive(&p, "Nova").starts_with("Excellent work, Agent Nova."));
    }

    #[test]
    fn fade_opacity_ramps() {
        let mut c = Countdown::new(500);
        c.advance(250);
        let f = Fade::Entering { countdown: c };
        assert!((f.opacity() - 0.5).abs() < 0.01);
        assert!((Fade::Idle.opacity() - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn screen_names_are_stable() {
        assert_eq!(ScreenKind::ScoringBriefing.name(), "scoringBriefing");
        assert_eq!(ScreenKind::for_level(LevelId::Two), ScreenKind::Level2);
        assert!(ScreenKind::Level3.is_level());
        assert!(!ScreenKind::Briefing.is_level());
    }
}
