//! Screen orchestrator: the game's finite state machine.
//!
//! Owns the mounted screen, the fade between screens, the celebration
//! notice and the progress tracker. Every player action is a method that
//! either applies completely or returns a `GameError` and changes nothing.
//! Time only moves through `advance(ms)`.

use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::domain::crossword::{CrosswordGame, SubmitOutcome, FINAL_MESSAGE};
use crate::domain::matching::{MatchOutcome, MatchingGame};
use crate::domain::profile::AgentProfile;
use crate::domain::progress::{LevelId, ProgressState};
use crate::domain::random::RandomSource;
use crate::domain::timer::Countdown;
use crate::domain::trivia::{TriviaGame, TriviaOutcome};
use crate::error::{GameError, Result};
use crate::sim::event::GameEvent;
use crate::sim::screen::{
    AuthOverlay, Celebration, Fade, FadeTarget, RegistrationForm, Screen, ScreenKind,
};

pub const SUCCESS_MESSAGE: &str = "Case successfully solved. Proceeding to next objective.";

pub fn welcome_message(codename: &str) -> String {
    format!("Welcome, Agent {codename}. Your mission is ready.")
}

pub struct Orchestrator {
    screen: Screen,
    fade: Fade,
    celebration: Option<Celebration>,
    progress: ProgressState,
    profile: Option<AgentProfile>,
    rng: Box<dyn RandomSource>,
    timing: TimingConfig,
    events: Vec<GameEvent>,
}

impl Orchestrator {
    pub fn new(timing: TimingConfig, rng: Box<dyn RandomSource>) -> Self {
        Orchestrator {
            screen: Screen::Intro,
            fade: Fade::Idle,
            celebration: None,
            progress: ProgressState::new(),
            profile: None,
            rng,
            timing,
            events: Vec::new(),
        }
    }

    // ── Accessors ──

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn screen_kind(&self) -> ScreenKind {
        self.screen.kind()
    }

    pub fn is_authenticating(&self) -> bool {
        matches!(self.screen, Screen::Registration { overlay: Some(_), .. })
    }

    pub fn fade(&self) -> &Fade {
        &self.fade
    }

    pub fn celebration(&self) -> Option<&Celebration> {
        self.celebration.as_ref()
    }

    pub fn progress(&self) -> &ProgressState {
        &self.progress
    }

    pub fn profile(&self) -> Option<&AgentProfile> {
        self.profile.as_ref()
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Gating ──

    fn ensure_input(&self) -> Result<()> {
        if self.fade.is_leaving() || self.is_authenticating() {
            return Err(GameError::TransitionInProgress);
        }
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidAction { screen: self.screen_kind().name(), action }
    }

    fn expect_screen(&self, kind: ScreenKind, action: &'static str) -> Result<()> {
        self.ensure_input()?;
        if self.screen_kind() != kind {
            return Err(self.invalid(action));
        }
        Ok(())
    }

    fn form_mut(&mut self, action: &'static str) -> Result<&mut RegistrationForm> {
        self.ensure_input()?;
        let err = self.invalid(action);
        match &mut self.screen {
            Screen::Registration { form, .. } => Ok(form),
            _ => Err(err),
        }
    }

    fn trivia_mut(&mut self, action: &'static str) -> Result<&mut TriviaGame> {
        self.ensure_input()?;
        let err = self.invalid(action);
        match &mut self.screen {
            Screen::Level1(game) => Ok(game),
            _ => Err(err),
        }
    }

    fn matching_mut(&mut self, action: &'static str) -> Result<&mut MatchingGame> {
        self.ensure_input()?;
        let err = self.invalid(action);
        match &mut self.screen {
            Screen::Level2(game) => Ok(game),
            _ => Err(err),
        }
    }

    fn crossword_mut(&mut self, action: &'static str) -> Result<&mut CrosswordGame> {
        self.ensure_input()?;
        let err = self.invalid(action);
        match &mut self.screen {
            Screen::Level3(game) => Ok(game),
            _ => Err(err),
        }
    }

    // ── Transitions ──

    fn begin(&mut self, target: FadeTarget) {
        debug!(?target, "leaving {}", self.screen_kind().name());
        self.fade = Fade::Leaving { target, countdown: Countdown::new(self.timing.fade_ms) };
    }

    fn finish_leaving(&mut self, target: FadeTarget) {
        match target {
            FadeTarget::Screen(kind) => self.commit(kind),
            FadeTarget::Authenticate => {
                if let Screen::Registration { overlay, .. } = &mut self.screen {
                    *overlay = Some(AuthOverlay::new(&self.timing));
                }
                if let Some(profile) = &self.profile {
                    self.events.push(GameEvent::Welcome { text: welcome_message(profile.codename()) });
                }
            }
            FadeTarget::Replay => {
                self.progress.reset();
                self.commit(ScreenKind::Briefing);
            }
        }
    }

    fn commit(&mut self, kind: ScreenKind) {
        self.screen = match kind {
            ScreenKind::Intro => Screen::Intro,
            ScreenKind::Registration => Screen::Registration { form: RegistrationForm::new(), overlay: None },
            ScreenKind::ScoringBriefing => Screen::ScoringBriefing,
            ScreenKind::Briefing => Screen::Briefing { cursor: 0 },
            ScreenKind::Level1 => Screen::Level1(TriviaGame::new(&self.timing, self.rng.as_mut())),
            ScreenKind::Level2 => Screen::Level2(MatchingGame::new(&self.timing, self.rng.as_mut())),
            ScreenKind::Level3 => Screen::Level3(CrosswordGame::new(&self.timing)),
            ScreenKind::Completion => Screen::Completion,
        };
        if kind != ScreenKind::Briefing {
            self.celebration = None;
        }
        self.fade = Fade::Entering { countdown: Countdown::new(self.timing.fade_ms) };
        info!(screen = kind.name(), "screen committed");
    }

    /// Advance every running clock by `dt` ms. Phases chain inside one
    /// call: time left over from a finished phase flows into the next.
    pub fn advance(&mut self, dt: u64) {
        if let Some(c) = self.celebration.as_mut() {
            if c.advance(dt) {
                self.celebration = None;
            }
        }

        let mut left = dt;
        loop {
            if let Fade::Leaving { target, countdown } = &mut self.fade {
                let target = *target;
                match countdown.advance(left) {
                    Some(over) => {
                        left = over;
                        self.fade = Fade::Idle;
                        self.finish_leaving(target);
                        continue;
                    }
                    None => {
                        self.screen.advance(left);
                        return;
                    }
                }
            }

            if let Screen::Registration { overlay: Some(ov), .. } = &mut self.screen {
                match ov.advance(left) {
                    Some(over) => {
                        left = over;
                        self.commit(ScreenKind::ScoringBriefing);
                        continue;
                    }
                    None => return,
                }
            }

            if let Fade::Entering { countdown } = &mut self.fade {
                if countdown.advance(left).is_some() {
                    self.fade = Fade::Idle;
                }
            }
            self.screen.advance(left);
            return;
        }
    }

    fn complete_level(&mut self, level: LevelId, score: u32) {
        self.progress.record(level, score);
        info!(%level, score, total = self.progress.total_score(), "level complete");
        self.events.push(GameEvent::LevelCompleted { level, score });

        if level == LevelId::Three {
            self.begin(FadeTarget::Screen(ScreenKind::Completion));
        } else {
            self.celebration = Some(Celebration::new(level, self.timing.celebration_ms));
            self.events.push(GameEvent::Triumph);
            self.begin(FadeTarget::Screen(ScreenKind::Briefing));
        }
    }

    // ── Intro / registration ──

    pub fn start(&mut self) -> Result<()> {
        self.expect_screen(ScreenKind::Intro, "start")?;
        self.events.push(GameEvent::Click);
        self.begin(FadeTarget::Screen(ScreenKind::Registration));
        Ok(())
    }

    /// Validate and create the agent, then authenticate. Starts a fresh run.
    pub fn register(&mut self, codename: &str, avatar_index: usize) -> Result<()> {
        self.expect_screen(ScreenKind::Registration, "register")?;
        let profile = AgentProfile::new(codename, avatar_index)?;
        info!(codename = profile.codename(), avatar = profile.avatar().name(), "agent registered");

        self.profile = Some(profile);
        self.progress.reset();
        self.events.push(GameEvent::Click);
        self.begin(FadeTarget::Authenticate);
        Ok(())
    }

    /// Register with whatever the form currently holds.
    pub fn submit_registration(&mut self) -> Result<()> {
        let form = self.form_mut("register")?;
        let (draft, avatar) = (form.draft().to_string(), form.avatar().index());
        self.register(&draft, avatar)
    }

    pub fn use_default_codename(&mut self) -> Result<()> {
        self.form_mut("use default codename")?.use_default();
        self.events.push(GameEvent::Click);
        Ok(())
    }

    pub fn cycle_avatar(&mut self, delta: isize) -> Result<()> {
        self.form_mut("change avatar")?.cycle_avatar(delta);
        self.events.push(GameEvent::Hover);
        Ok(())
    }

    pub fn toggle_help(&mut self) -> Result<()> {
        self.form_mut("how to play")?.toggle_help();
        self.events.push(GameEvent::Click);
        Ok(())
    }

    pub fn proceed(&mut self) -> Result<()> {
        self.expect_screen(ScreenKind::ScoringBriefing, "proceed")?;
        self.events.push(GameEvent::Click);
        self.begin(FadeTarget::Screen(ScreenKind::Briefing));
        Ok(())
    }

    // ── Typing & cursors ──

    /// Type into whichever text field the screen has.
    pub fn type_char(&mut self, ch: char) -> Result<()> {
        self.ensure_input()?;
        let err = self.invalid("type");
        let typed = match &mut self.screen {
            Screen::Registration { form, .. } => form.push_char(ch),
            Screen::Level3(game) => game.push_char(ch),
            _ => return Err(err),
        };
        if typed {
            self.events.push(GameEvent::Typing);
        }
        Ok(())
    }

    pub fn backspace(&mut self) -> Result<()> {
        self.ensure_input()?;
        let err = self.invalid("erase");
        let erased = match &mut self.screen {
            Screen::Registration { form, .. } => form.backspace(),
            Screen::Level3(game) => game.backspace(),
            _ => return Err(err),
        };
        if erased {
            self.events.push(GameEvent::Typing);
        }
        Ok(())
    }

    /// Move the highlight on list-like screens. Screens without a list
    /// ignore it.
    pub fn move_cursor(&mut self, delta: isize) -> Result<()> {
        self.ensure_input()?;
        let moved = match &mut self.screen {
            Screen::Briefing { cursor } => {
                let next = (*cursor as isize + delta).clamp(0, LevelId::ALL.len() as isize - 1) as usize;
                let moved = next != *cursor;
                *cursor = next;
                moved
            }
            Screen::Level1(game) => game.move_cursor(delta),
            Screen::Level2(game) => game.move_cursor(delta),
            _ => false,
        };
        if moved {
            self.events.push(GameEvent::Hover);
        }
        Ok(())
    }

    // ── Mission hub ──

    pub fn select_level(&mut self, number: u8) -> Result<()> {
        self.expect_screen(ScreenKind::Briefing, "select level")?;
        let level = LevelId::from_number(number)
            .ok_or_else(|| GameError::UnknownItem(format!("level {number}")))?;
        if !self.progress.is_unlocked(level) {
            return Err(GameError::LevelLocked(level));
        }
        self.events.push(GameEvent::Click);
        self.begin(FadeTarget::Screen(ScreenKind::for_level(level)));
        Ok(())
    }

    /// Select the level under the hub cursor.
    pub fn select_highlighted(&mut self) -> Result<()> {
        match self.screen {
            Screen::Briefing { cursor } => self.select_level(cursor as u8 + 1),
            _ => self.select_level(0),
        }
    }

    /// Leave a level without reporting a score.
    pub fn exit_level(&mut self) -> Result<()> {
        self.ensure_input()?;
        if !self.screen_kind().is_level() {
            return Err(self.invalid("exit level"));
        }
        self.events.push(GameEvent::Click);
        self.begin(FadeTarget::Screen(ScreenKind::Briefing));
        Ok(())
    }

    // ── Level 1: trivia ──

    pub fn trivia_submit(&mut self, option: &str) -> Result<TriviaOutcome> {
        let outcome = self.trivia_mut("answer")?.submit(option)?;
        debug!(option, ?outcome, "trivia answer");
        match outcome {
            TriviaOutcome::Correct { .. } => {
                self.events.push(GameEvent::Snap);
                self.events.push(GameEvent::Success { text: SUCCESS_MESSAGE.to_string() });
            }
            TriviaOutcome::Incorrect { .. } => self.events.push(GameEvent::Wrong),
            TriviaOutcome::AlreadySolved => {}
        }
        Ok(outcome)
    }

    /// Answer with the option under the cursor.
    pub fn trivia_submit_highlighted(&mut self) -> Result<TriviaOutcome> {
        let game = self.trivia_mut("answer")?;
        let option = game.options()[game.cursor()];
        self.trivia_submit(option)
    }

    pub fn trivia_finish(&mut self) -> Result<()> {
        let score = self.trivia_mut("return to hub")?.finish()?;
        self.events.push(GameEvent::Click);
        self.complete_level(LevelId::One, score);
        Ok(())
    }

    // ── Level 2: matching ──

    pub fn match_pair(&mut self, violation_id: &str, framework_id: &str) -> Result<MatchOutcome> {
        let outcome = self.matching_mut("match")?.match_pair(violation_id, framework_id)?;
        debug!(violation_id, framework_id, ?outcome, "match attempt");
        self.push_match_events(outcome);
        Ok(outcome)
    }

    fn push_match_events(&mut self, outcome: MatchOutcome) {
        match outcome {
            MatchOutcome::Matched { board_complete, .. } => {
                self.events.push(GameEvent::Snap);
                if board_complete {
                    self.events.push(GameEvent::Triumph);
                }
            }
            MatchOutcome::Mismatched => self.events.push(GameEvent::Wrong),
            MatchOutcome::Ignored => {}
        }
    }

    pub fn pick_up(&mut self) -> Result<()> {
        if self.matching_mut("pick up")?.pick_up_at_cursor() {
            self.events.push(GameEvent::Click);
        }
        Ok(())
    }

    /// Pick up a violation card by id.
    pub fn pick_up_violation(&mut self, violation_id: &str) -> Result<()> {
        if self.matching_mut("pick up")?.pick_up(violation_id)? {
            self.events.push(GameEvent::Click);
        }
        Ok(())
    }

    /// Drop the held card on a framework slot by id.
    pub fn drop_on(&mut self, framework_id: &str) -> Result<MatchOutcome> {
        let outcome = self.matching_mut("drop")?.drop_on(framework_id)?;
        debug!(framework_id, ?outcome, "drop");
        self.push_match_events(outcome);
        Ok(outcome)
    }

    pub fn drop_held(&mut self) -> Result<MatchOutcome> {
        let outcome = self.matching_mut("drop")?.drop_at_cursor()?;
        debug!(?outcome, "drop");
        self.push_match_events(outcome);
        Ok(outcome)
    }

    pub fn cancel_drag(&mut self) -> Result<()> {
        self.matching_mut("cancel drag")?.cancel_drag();
        Ok(())
    }

    pub fn matching_finish(&mut self) -> Result<()> {
        let score = self.matching_mut("return to hub")?.finish()?;
        self.events.push(GameEvent::Click);
        self.complete_level(LevelId::Two, score);
        Ok(())
    }

    // ── Level 3: crossword ──

    pub fn crossword_submit(&mut self, text: &str) -> Result<SubmitOutcome> {
        let outcome = self.crossword_mut("submit")?.submit(text)?;
        debug!(text, ?outcome, "crossword answer");
        match outcome {
            SubmitOutcome::Solved { puzzle_complete, .. } => {
                self.events.push(GameEvent::Snap);
                if puzzle_complete {
                    self.events.push(GameEvent::Triumph);
                    self.events.push(GameEvent::FinalCompletion { text: FINAL_MESSAGE.to_string() });
                }
            }
            SubmitOutcome::Wrong { .. } => self.events.push(GameEvent::Wrong),
            SubmitOutcome::Ignored => {}
        }
        Ok(outcome)
    }

    /// Submit what the player has typed so far.
    pub fn crossword_submit_draft(&mut self) -> Result<SubmitOutcome> {
        let draft = self.crossword_mut("submit")?.draft().to_string();
        self.crossword_submit(&draft)
    }

    pub fn crossword_accept_hint(&mut self) -> Result<String> {
        let hint = self.crossword_mut("hint")?.accept_hint()?.to_string();
        self.events.push(GameEvent::Click);
        Ok(hint)
    }

    /// The "End Game" side of the forced hint choice.
    pub fn crossword_abandon(&mut self) -> Result<()> {
        if !self.crossword_mut("abandon")?.hint_choice_pending() {
            return Err(GameError::NotReady("Nothing to abandon"));
        }
        info!("crossword abandoned");
        self.events.push(GameEvent::Click);
        self.begin(FadeTarget::Screen(ScreenKind::Briefing));
        Ok(())
    }

    pub fn crossword_replay(&mut self) -> Result<()> {
        self.crossword_mut("replay")?.replay()?;
        self.events.push(GameEvent::Click);
        Ok(())
    }

    pub fn crossword_finish(&mut self) -> Result<()> {
        let score = self.crossword_mut("finish mission")?.finish()?;
        self.events.push(GameEvent::Click);
        self.complete_level(LevelId::Three, score);
        Ok(())
    }

    // ── Completion ──

    pub fn replay(&mut self) -> Result<()> {
        self.expect_screen(ScreenKind::Completion, "replay")?;
        self.events.push(GameEvent::Click);
        self.begin(FadeTarget::Replay);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::crossword::ENTRIES;
    use crate::domain::matching::PAIRS;
    use crate::domain::progress::{Rank, MAX_SCORE};
    use crate::domain::random::ScriptedRandom;

    fn orch() -> Orchestrator {
        Orchestrator::new(TimingConfig::default(), Box::new(ScriptedRandom::zeros()))
    }

    /// Run a leaving fade and the following entering fade to completion.
    fn settle(o: &mut Orchestrator) {
        let fade = o.timing().fade_ms;
        o.advance(fade);
        o.advance(fade);
    }

    fn registered() -> Orchestrator {
        let mut o = orch();
        o.start().unwrap();
        settle(&mut o);
        o.register("Agent X", 0).unwrap();
        let t = o.timing().clone();
        o.advance(t.fade_ms + t.auth_overlay_ms + t.fade_ms);
        o
    }

    fn at_hub() -> Orchestrator {
        let mut o = registered();
        o.proceed().unwrap();
        settle(&mut o);
        o
    }

    fn finish_trivia(o: &mut Orchestrator) {
        o.select_level(1).unwrap();
        settle(o);
        o.advance(o.timing().case_file_load_ms);
        o.trivia_submit("Cerberus-03").unwrap();
        o.trivia_finish().unwrap();
        settle(o);
    }

    fn finish_matching(o: &mut Orchestrator) {
        o.select_level(2).unwrap();
        settle(o);
        for p in PAIRS.iter() {
            o.match_pair(p.violation_id, p.framework_id).unwrap();
        }
        o.advance(o.timing().summary_delay_ms);
        o.matching_finish().unwrap();
        settle(o);
    }

    fn finish_crossword(o: &mut Orchestrator) {
        o.select_level(3).unwrap();
        settle(o);
        for e in ENTRIES.iter() {
            o.crossword_submit(e.answer).unwrap();
        }
        o.advance(o.timing().completion_modal_delay_ms);
        o.crossword_finish().unwrap();
        settle(o);
    }

    #[test]
    fn fade_phases_last_exactly_fade_ms() {
        let mut o = orch();
        o.start().unwrap();
        o.advance(499);
        assert_eq!(o.screen_kind(), ScreenKind::Intro);
        assert!(o.fade().is_leaving());
        o.advance(1);
        assert_eq!(o.screen_kind(), ScreenKind::Registration);
        assert!(matches!(o.fade(), Fade::Entering { .. }));
        o.advance(499);
        assert!(matches!(o.fade(), Fade::Entering { .. }));
        o.advance(1);
        assert!(matches!(o.fade(), Fade::Idle));
    }

    #[test]
    fn input_is_gated_while_leaving() {
        let mut o = orch();
        o.start().unwrap();
        assert!(matches!(o.start(), Err(GameError::TransitionInProgress)));
        o.advance(500);
        // Entering fade accepts input.
        assert!(o.register("Agent X", 1).is_ok());
    }

    #[test]
    fn actions_on_the_wrong_screen_are_rejected() {
        let mut o = orch();
        assert!(matches!(o.proceed(), Err(GameError::InvalidAction { screen: "intro", .. })));
        assert!(matches!(o.trivia_submit("x"), Err(GameError::InvalidAction { .. })));
        assert!(o.exit_level().is_err());
        assert!(o.drain_events().is_empty());
    }

    #[test]
    fn overlay_runs_between_fades() {
        let mut o = orch();
        o.start().unwrap();
        settle(&mut o);
        o.register("Agent X", 2).unwrap();
        o.advance(500);
        assert!(o.is_authenticating());
        assert_eq!(o.screen_kind(), ScreenKind::Registration);
        assert!(o.drain_events().contains(&GameEvent::Welcome {
            text: "Welcome, Agent Agent X. Your mission is ready.".into()
        }));
        assert!(matches!(o.toggle_help(), Err(GameError::TransitionInProgress)));

        o.advance(3499);
        assert!(o.is_authenticating());
        o.advance(1);
        assert!(!o.is_authenticating());
        assert_eq!(o.screen_kind(), ScreenKind::ScoringBriefing);
        assert!(matches!(o.fade(), Fade::Entering { .. }));
    }

    #[test]
    fn leftover_time_flows_into_the_next_phase() {
        let mut o = orch();
        o.start().unwrap();
        settle(&mut o);
        o.register("Agent X", 0).unwrap();
        o.advance(500 + 3500 + 100);
        assert_eq!(o.screen_kind(), ScreenKind::ScoringBriefing);
        match o.fade() {
            Fade::Entering { countdown } => assert_eq!(countdown.remaining(), 400),
            other => panic!("expected entering fade, got {other:?}"),
        }
    }

    #[test]
    fn short_codename_blocks_registration() {
        let mut o = orch();
        o.start().unwrap();
        settle(&mut o);
        assert!(matches!(o.register("X", 0), Err(GameError::CodenameTooShort { .. })));
        assert!(matches!(o.register("Agent X", 7), Err(GameError::UnknownAvatar { .. })));
        assert!(o.profile().is_none());
        assert!(!o.fade().is_leaving());
        assert_eq!(o.screen_kind(), ScreenKind::Registration);
    }

    #[test]
    fn form_submission_uses_draft_and_avatar() {
        let mut o = orch();
        o.start().unwrap();
        settle(&mut o);
        o.use_default_codename().unwrap();
        o.cycle_avatar(1).unwrap();
        o.submit_registration().unwrap();
        let p = o.profile().unwrap();
        assert_eq!(p.codename(), "Agent Smith");
        assert_eq!(p.avatar().index(), 1);
    }

    #[test]
    fn locked_levels_are_rejected() {
        let mut o = at_hub();
        assert!(matches!(o.select_level(2), Err(GameError::LevelLocked(LevelId::Two))));
        assert!(matches!(o.select_level(3), Err(GameError::LevelLocked(LevelId::Three))));
        assert!(matches!(o.select_level(9), Err(GameError::UnknownItem(_))));
        assert_eq!(o.screen_kind(), ScreenKind::Briefing);
    }

    #[test]
    fn celebration_expires_on_its_own_clock() {
        let mut o = at_hub();
        o.select_level(1).unwrap();
        settle(&mut o);
        o.advance(3500);
        o.trivia_submit("Cerberus-03").unwrap();
        o.drain_events();
        o.trivia_finish().unwrap();
        assert_eq!(o.celebration().map(|c| c.level()), Some(LevelId::One));
        assert!(o.drain_events().contains(&GameEvent::Triumph));

        o.advance(3999);
        assert_eq!(o.screen_kind(), ScreenKind::Briefing);
        assert!(o.celebration().is_some());
        o.advance(1);
        assert!(o.celebration().is_none());
    }

    #[test]
    fn celebration_is_dropped_when_leaving_the_hub() {
        let mut o = at_hub();
        finish_trivia(&mut o);
        assert!(o.celebration().is_some());
        o.select_level(2).unwrap();
        o.advance(500);
        assert_eq!(o.screen_kind(), ScreenKind::Level2);
        assert!(o.celebration().is_none());
    }

    #[test]
    fn stale_indicators_do_not_survive_a_remount() {
        let mut o = at_hub();
        o.select_level(1).unwrap();
        settle(&mut o);
        o.advance(3500);
        o.trivia_submit("OmniCorp").unwrap();
        o.exit_level().unwrap();
        settle(&mut o);
        o.select_level(1).unwrap();
        settle(&mut o);

        match o.screen() {
            Screen::Level1(game) => {
                assert!(game.is_loading());
                assert_eq!(game.incorrect_option(), None);
                assert_eq!(game.attempts(), 0);
            }
            _ => panic!("expected trivia screen"),
        }
    }

    #[test]
    fn exiting_a_level_scores_nothing() {
        let mut o = at_hub();
        o.select_level(1).unwrap();
        settle(&mut o);
        o.exit_level().unwrap();
        settle(&mut o);
        assert_eq!(o.screen_kind(), ScreenKind::Briefing);
        assert!(!o.progress().is_complete(LevelId::One));
    }

    #[test]
    fn crossword_hint_choice_can_abandon() {
        let mut o = at_hub();
        finish_trivia(&mut o);
        finish_matching(&mut o);
        o.select_level(3).unwrap();
        settle(&mut o);

        assert!(matches!(o.crossword_abandon(), Err(GameError::NotReady(_))));
        for _ in 0..3 {
            o.crossword_submit("WRONG").unwrap();
        }
        assert!(matches!(o.crossword_submit("INNOVATION"), Err(GameError::HintChoicePending)));
        o.crossword_abandon().unwrap();
        settle(&mut o);
        assert_eq!(o.screen_kind(), ScreenKind::Briefing);
        assert!(!o.progress().is_complete(LevelId::Three));
        assert_eq!(o.progress().total_score(), 390);
    }

    #[test]
    fn typing_routes_to_the_crossword_draft() {
        let mut o = at_hub();
        finish_trivia(&mut o);
        finish_matching(&mut o);
        o.select_level(3).unwrap();
        settle(&mut o);
        o.drain_events();

        for ch in "innovation".chars() {
            o.type_char(ch).unwrap();
        }
        let out = o.crossword_submit_draft().unwrap();
        assert!(matches!(out, SubmitOutcome::Solved { number: 1, .. }));
        let events = o.drain_events();
        assert_eq!(events.iter().filter(|e| **e == GameEvent::Typing).count(), 10);
        assert!(events.contains(&GameEvent::Snap));
    }

    #[test]
    fn drag_by_id_emits_cues() {
        let mut o = at_hub();
        finish_trivia(&mut o);
        o.select_level(2).unwrap();
        settle(&mut o);
        o.drain_events();

        o.pick_up_violation("v1").unwrap();
        assert_eq!(o.drop_on("f2").unwrap(), MatchOutcome::Mismatched);
        o.pick_up_violation("v1").unwrap();
        assert!(matches!(o.drop_on("f1").unwrap(), MatchOutcome::Matched { points: 60, .. }));
        assert_eq!(
            o.drain_events(),
            vec![GameEvent::Click, GameEvent::Wrong, GameEvent::Click, GameEvent::Snap]
        );
        assert!(matches!(o.pick_up_violation("v9"), Err(GameError::UnknownItem(_))));
    }

    #[test]
    fn full_run_reaches_elite_agent() {
        let mut o = at_hub();
        assert_eq!(o.progress().total_score(), 0);

        finish_trivia(&mut o);
        assert_eq!(o.screen_kind(), ScreenKind::Briefing);
        assert_eq!(o.progress().total_score(), 150);

        finish_matching(&mut o);
        assert_eq!(o.progress().total_score(), 390);

        finish_crossword(&mut o);
        assert_eq!(o.screen_kind(), ScreenKind::Completion);
        assert_eq!(o.progress().total_score(), MAX_SCORE);
        assert_eq!(Rank::from_score(o.progress().total_score()).name(), "Elite Agent");

        let events = o.drain_events();
        assert!(events.contains(&GameEvent::Triumph));
        assert!(events.contains(&GameEvent::FinalCompletion { text: FINAL_MESSAGE.into() }));
        assert!(events.contains(&GameEvent::Success { text: SUCCESS_MESSAGE.into() }));
    }

    #[test]
    fn replay_resets_progress_and_returns_to_hub() {
        let mut o = at_hub();
        finish_trivia(&mut o);
        finish_matching(&mut o);
        finish_crossword(&mut o);

        o.replay().unwrap();
        assert_eq!(o.progress().total_score(), MAX_SCORE);
        settle(&mut o);
        assert_eq!(o.screen_kind(), ScreenKind::Briefing);
        assert_eq!(o.progress().total_score(), 0);
        assert!(!o.progress().is_unlocked(LevelId::Two));
        assert_eq!(o.profile().map(|p| p.codename()), Some("Agent X"));
    }

    #[test]
    fn replaying_a_completed_level_does_not_double_count() {
        let mut o = at_hub();
        finish_trivia(&mut o);
        finish_trivia(&mut o);
        assert_eq!(o.progress().total_score(), 150);
    }
}
