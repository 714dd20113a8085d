//! Entry point and game loop.

mod cli;
mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::GameConfig;
use domain::progress::MAX_SCORE;
use domain::random::{RandomSource, StdRandom};
use domain::timer::{tick_slot, Countdown};
use error::GameError;
use sim::event::GameEvent;
use sim::orchestrator::Orchestrator;
use sim::screen::{hub_directive, Screen, ScreenKind};
use ui::animate::{CountUp, TypingEffect};
use ui::effects::{Fireworks, ParticleField};
use ui::gamepad::GamepadState;
use ui::input::{Command, Dir, InputState};
use ui::renderer::{Renderer, Scene};
use ui::sound::{process_sound_events, SoundEngine};

const FRAME_SLEEP: Duration = Duration::from_millis(5);
const STATUS_MS: u64 = 2500;
const SUBTITLE_MS: u64 = 4000;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let (config, warnings) = match &args.config {
        Some(path) => {
            let config = GameConfig::load_from(path)
                .with_context(|| format!("cannot load config {}", path.display()))?;
            (config, Vec::new())
        }
        None => GameConfig::load(),
    };
    init_logging(&config, args.log_level.as_deref())?;
    for w in &warnings {
        warn!("{w}");
    }
    info!(seed = ?args.seed, mute = args.mute, "starting");

    let rng: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(StdRandom::seeded(seed)),
        None => Box::new(StdRandom::from_entropy()),
    };
    let mut game = Orchestrator::new(config.timing.clone(), rng);

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let muted = args.mute || !config.audio.enabled;
    let result = game_loop(&mut game, &mut renderer, &config, muted, args.seed.unwrap_or(0));

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for playing SupTech Champions!");
    println!("Final Score: {} / {MAX_SCORE}", game.progress().total_score());
    Ok(())
}

/// The terminal is in raw mode, so logs go to a file. `RUST_LOG` beats
/// `--log-level`, which beats `[general] log_level`.
fn init_logging(config: &GameConfig, cli_level: Option<&str>) -> anyhow::Result<()> {
    let file = File::create(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    let level = cli_level.unwrap_or(&config.log_level);
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Presentation state that lives outside the game core.
struct Shell {
    particles: ParticleField,
    fireworks: Fireworks,
    directive: TypingEffect,
    score: CountUp,
    status: Option<(String, Countdown)>,
    subtitle: Option<(String, Countdown)>,
    sound: Option<SoundEngine>,
    volume: f32,
    muted: bool,
    clock: u64,
}

impl Shell {
    fn new(config: &GameConfig, muted: bool, seed: u64) -> Self {
        Shell {
            particles: ParticleField::new(seed),
            fireworks: Fireworks::new(seed.wrapping_add(1)),
            directive: TypingEffect::new(config.timing.typing_char_ms),
            score: CountUp::new(config.timing.count_up_ms),
            status: None,
            subtitle: None,
            sound: if muted { None } else { SoundEngine::new(config.audio.volume) },
            volume: config.audio.volume,
            muted,
            clock: 0,
        }
    }

    fn audio(&self) -> Option<&SoundEngine> {
        if self.muted {
            None
        } else {
            self.sound.as_ref()
        }
    }

    fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        if !self.muted && self.sound.is_none() {
            self.sound = SoundEngine::new(self.volume);
        }
        info!(muted = self.muted, "sound toggled");
    }

    fn report(&mut self, err: GameError) {
        debug!(error = %err, "action rejected");
        // Keys pressed mid-fade are simply dropped.
        if !matches!(err, GameError::TransitionInProgress) {
            self.status = Some((err.to_string(), Countdown::new(STATUS_MS)));
        }
    }

    /// Point the decorative effects at the current game state, then run
    /// their clocks.
    fn advance(&mut self, game: &Orchestrator, dt: u64, size: (u16, u16)) {
        let kind = game.screen_kind();
        self.particles.sync(kind.name(), size.0, size.1);
        self.fireworks.set_active(kind == ScreenKind::Completion || game.celebration().is_some());

        if kind == ScreenKind::Briefing {
            let codename = game.profile().map(|p| p.codename()).unwrap_or_default();
            self.directive.set(&hub_directive(game.progress(), codename));
        } else {
            self.directive.set("");
        }
        let target = if kind == ScreenKind::Completion { game.progress().total_score() } else { 0 };
        self.score.set_target(target);

        self.clock = self.clock.wrapping_add(dt);
        self.particles.advance(dt);
        self.fireworks.advance(dt, size.0, size.1);
        self.score.advance(dt);
        if self.directive.advance(dt) > 0 {
            process_sound_events(self.audio(), &[GameEvent::Typing]);
        }
        tick_slot(&mut self.status, dt);
        tick_slot(&mut self.subtitle, dt);
    }

    fn play(&mut self, events: &[GameEvent]) {
        for event in events {
            if let Some(text) = event.voice_text() {
                self.subtitle = Some((text.to_string(), Countdown::new(SUBTITLE_MS)));
            }
        }
        process_sound_events(self.audio(), events);
    }

    fn scene(&self) -> Scene<'_> {
        Scene {
            particles: &self.particles,
            fireworks: &self.fireworks,
            directive: &self.directive,
            score: &self.score,
            status: self.status.as_ref().map(|(s, _)| s.as_str()),
            subtitle: self.subtitle.as_ref().map(|(s, _)| s.as_str()),
            muted: self.muted,
            clock: self.clock,
        }
    }
}

fn game_loop(
    game: &mut Orchestrator,
    renderer: &mut Renderer,
    config: &GameConfig,
    muted: bool,
    seed: u64,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut shell = Shell::new(config, muted, seed);

    let tick_rate = Duration::from_millis(config.timing.tick_rate_ms);
    let mut last_tick = Instant::now();

    'frames: loop {
        kb.drain_events();
        gp.update();
        if kb.quit_requested() {
            break;
        }

        let mut commands = kb.commands().to_vec();
        commands.extend(gp.commands());
        for cmd in commands {
            if cmd == Command::Mute {
                shell.toggle_mute();
                continue;
            }
            match dispatch(game, cmd) {
                Ok(Flow::Quit) => break 'frames,
                Ok(Flow::Continue) => {}
                Err(e) => shell.report(e),
            }
        }

        if let Some(dt) = take_tick(&mut last_tick, Instant::now(), tick_rate) {
            game.advance(dt);
            shell.advance(game, dt, renderer.size());
        }
        let events = game.drain_events();
        shell.play(&events);

        renderer.render(game, &shell.scene())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    info!(score = game.progress().total_score(), "quit");
    Ok(())
}

// ── Command dispatch ──

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Screens with a text field swallow letters; elsewhere 'q' quits.
fn accepts_text(game: &Orchestrator) -> bool {
    matches!(game.screen_kind(), ScreenKind::Registration | ScreenKind::Level3)
}

/// Map one command onto the orchestrator for the mounted screen.
/// Commands a screen has no use for are ignored.
fn dispatch(game: &mut Orchestrator, cmd: Command) -> error::Result<Flow> {
    use ScreenKind as K;

    if matches!(cmd, Command::Text('q' | 'Q')) && !accepts_text(game) {
        return Ok(Flow::Quit);
    }

    match (game.screen_kind(), cmd) {
        (K::Intro, Command::Confirm) => game.start()?,

        (K::Registration, Command::Confirm) => game.submit_registration()?,
        (K::Registration, Command::Text(ch)) => game.type_char(ch)?,
        (K::Registration, Command::Erase) => game.backspace()?,
        (K::Registration, Command::Alt) => game.use_default_codename()?,
        (K::Registration, Command::Help) => game.toggle_help()?,
        (K::Registration, Command::Move(Dir::Left)) => game.cycle_avatar(-1)?,
        (K::Registration, Command::Move(Dir::Right)) => game.cycle_avatar(1)?,

        (K::ScoringBriefing, Command::Confirm) => game.proceed()?,

        (K::Briefing, Command::Confirm) => game.select_highlighted()?,
        (K::Briefing, Command::Text(ch @ '1'..='3')) => game.select_level(ch as u8 - b'0')?,

        (K::Briefing | K::Level1 | K::Level2, Command::Move(Dir::Up)) => game.move_cursor(-1)?,
        (K::Briefing | K::Level1 | K::Level2, Command::Move(Dir::Down)) => game.move_cursor(1)?,

        (K::Level1, Command::Confirm) => {
            if matches!(game.screen(), Screen::Level1(t) if t.is_solved()) {
                game.trivia_finish()?;
            } else {
                game.trivia_submit_highlighted()?;
            }
        }
        (K::Level1, Command::Text(ch @ '1'..='4')) => {
            let option = match game.screen() {
                Screen::Level1(t) => t.options().get((ch as u8 - b'1') as usize).copied(),
                _ => None,
            };
            if let Some(option) = option {
                game.trivia_submit(option)?;
            }
        }
        (K::Level1, Command::Back) => game.exit_level()?,

        (K::Level2, Command::Confirm) => {
            let (summary, holding) = matching_state(game);
            if summary {
                game.matching_finish()?;
            } else if holding {
                game.drop_held()?;
            } else {
                game.pick_up()?;
            }
        }
        (K::Level2, Command::Back) => {
            if matching_state(game).1 {
                game.cancel_drag()?;
            } else {
                game.exit_level()?;
            }
        }

        (K::Level3, cmd) => dispatch_crossword(game, cmd)?,

        (K::Completion, Command::Confirm | Command::Text('r' | 'R')) => game.replay()?,

        _ => {}
    }
    Ok(Flow::Continue)
}

/// (summary shown, violation held) for the matching board.
fn matching_state(game: &Orchestrator) -> (bool, bool) {
    match game.screen() {
        Screen::Level2(m) => (m.summary_visible(), m.held().is_some()),
        _ => (false, false),
    }
}

fn dispatch_crossword(game: &mut Orchestrator, cmd: Command) -> error::Result<()> {
    let (modal, choice) = match game.screen() {
        Screen::Level3(x) => (x.modal_visible(), x.hint_choice_pending()),
        _ => return Ok(()),
    };

    if modal {
        match cmd {
            Command::Text('r' | 'R') => game.crossword_replay()?,
            Command::Confirm => game.crossword_finish()?,
            _ => {}
        }
    } else if choice {
        match cmd {
            Command::Alt | Command::Confirm => {
                game.crossword_accept_hint()?;
            }
            Command::Back => game.crossword_abandon()?,
            _ => {}
        }
    } else {
        match cmd {
            Command::Text(ch) => game.type_char(ch)?,
            Command::Erase => game.backspace()?,
            Command::Confirm => {
                game.crossword_submit_draft()?;
            }
            Command::Back => game.exit_level()?,
            _ => {}
        }
    }
    Ok(())
}

/// Whole milliseconds since `last_tick` once a tick is due. Only the
/// time handed out is consumed, so sub-millisecond remainders carry over.
fn take_tick(last_tick: &mut Instant, now: Instant, tick_rate: Duration) -> Option<u64> {
    let elapsed = now.saturating_duration_since(*last_tick);
    if elapsed < tick_rate {
        return None;
    }
    let dt = elapsed.as_millis() as u64;
    *last_tick += Duration::from_millis(dt);
    Some(dt)
}
