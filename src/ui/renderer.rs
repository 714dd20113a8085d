//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! Each frame is composed into a `Canvas`, compared with the previous one,
//! and only the cells that changed are written to the terminal. Commands
//! are batched with `queue!` and flushed once per frame. Composition is
//! pure (`compose` never touches stdout), so screens can be tested against
//! an in-memory canvas.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::crossword::{self, CrosswordGame, Direction, ENTRIES};
use crate::domain::matching::{Column, MatchingGame, MATCH_POINTS, PAIRS};
use crate::domain::profile::Avatar;
use crate::domain::progress::{LevelId, Rank, MAX_SCORE};
use crate::domain::trivia::{TriviaGame, TRIVIA_POINTS};
use crate::sim::orchestrator::Orchestrator;
use crate::sim::screen::{hub_directive, AuthOverlay, RegistrationForm, Screen, ScreenKind};
use crate::ui::animate::{CountUp, TypingEffect};
use crate::ui::effects::{hue_color, Fireworks, ParticleField};

// ── Palette ──

/// Every empty cell gets this explicit background, and `Clear` uses it
/// too, so terminals never show their own default between rows.
const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const PANEL_BG: Color = Color::Rgb { r: 12, g: 12, b: 22 };
const CURSOR_BG: Color = Color::Rgb { r: 20, g: 60, b: 70 };

const CYAN: Color = Color::Rgb { r: 0, g: 255, b: 255 };
const PINK: Color = Color::Rgb { r: 244, g: 114, b: 182 };
const GREEN: Color = Color::Rgb { r: 74, g: 222, b: 128 };
const YELLOW: Color = Color::Rgb { r: 250, g: 204, b: 21 };
const RED: Color = Color::Rgb { r: 248, g: 80, b: 80 };
const PURPLE: Color = Color::Rgb { r: 168, g: 85, b: 247 };
const TEXT: Color = Color::Rgb { r: 220, g: 220, b: 230 };
const MUTED: Color = Color::Rgb { r: 110, g: 110, b: 130 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const BLACK: Color = Color::Rgb { r: 0, g: 0, b: 0 };

const PANEL_W: usize = 76;

// ── Cell & canvas ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
    /// Occupies two columns; the next cell is its continuation.
    wide: bool,
    cont: bool,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: TEXT, bg: BASE_BG, wide: false, cont: false };

    /// Differs from every real cell, so a back buffer full of these forces
    /// a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta, wide: false, cont: false };
}

/// Rough display width: emoji pictographs take two columns.
fn is_wide(c: char) -> bool {
    matches!(c as u32, 0x1F000..=0x1FAFF)
}

pub fn text_width(s: &str) -> usize {
    s.chars().map(|c| if is_wide(c) { 2 } else { 1 }).sum()
}

/// Greedy word wrap on display width. Words longer than `width` get a
/// line of their own.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && text_width(&line) + 1 + text_width(word) > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Mix `c` over `under`; `t` = 1.0 keeps `c` as is.
fn blend(c: Color, under: Color, t: f32) -> Color {
    match (c, under) {
        (Color::Rgb { r, g, b }, Color::Rgb { r: r2, g: g2, b: b2 }) => {
            let mix = |a: u8, z: u8| (z as f32 + (a as f32 - z as f32) * t.clamp(0.0, 1.0)).round() as u8;
            Color::Rgb { r: mix(r, r2), g: mix(g, g2), b: mix(b, b2) }
        }
        _ => c,
    }
}

struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Canvas {
    fn new(w: usize, h: usize) -> Self {
        Canvas { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            *self = Canvas::new(w, h);
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn bg_at(&self, x: usize, y: usize) -> Color {
        self.get(x, y).bg
    }

    /// Write `s` at (x, y). Returns the column after the last character.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) -> usize {
        let mut cx = x;
        for ch in s.chars() {
            let wide = is_wide(ch);
            if cx + usize::from(wide) >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, fg, bg, wide, cont: false });
            if wide {
                self.set(cx + 1, y, Cell { ch: ' ', fg, bg, wide: false, cont: true });
                cx += 2;
            } else {
                cx += 1;
            }
        }
        cx
    }

    /// Write over whatever background is already there.
    fn put_over(&mut self, x: usize, y: usize, s: &str, fg: Color) -> usize {
        let bg = self.bg_at(x, y);
        self.put_str(x, y, s, fg, bg)
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(text_width(s)) / 2;
        self.put_over(x, y, s, fg);
    }

    fn fill(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for row in y..y + h {
            for col in x..x + w {
                self.set(col, row, Cell { bg, ..Cell::BLANK });
            }
        }
    }

    /// Filled panel with a double-line border.
    fn panel(&mut self, x: usize, y: usize, w: usize, h: usize, border: Color) {
        if w < 2 || h < 2 {
            return;
        }
        self.fill(x, y, w, h, PANEL_BG);
        let horiz = "═".repeat(w - 2);
        self.put_str(x, y, &format!("╔{horiz}╗"), border, PANEL_BG);
        self.put_str(x, y + h - 1, &format!("╚{horiz}╝"), border, PANEL_BG);
        for row in y + 1..y + h - 1 {
            self.put_str(x, row, "║", border, PANEL_BG);
            self.put_str(x + w - 1, row, "║", border, PANEL_BG);
        }
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        let w = self.width;
        self.fill(0, y, w, 1, bg);
    }

    /// Blend every cell toward the base background.
    fn fade(&mut self, opacity: f32) {
        if opacity >= 1.0 {
            return;
        }
        for cell in &mut self.cells {
            cell.fg = blend(cell.fg, BASE_BG, opacity);
            cell.bg = blend(cell.bg, BASE_BG, opacity);
        }
    }

    #[cfg(test)]
    fn row(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y)).filter(|c| !c.cont).map(|c| c.ch).collect()
    }

    #[cfg(test)]
    fn contains(&self, needle: &str) -> bool {
        (0..self.height).any(|y| self.row(y).contains(needle))
    }
}

// ── Scene: per-frame presentation state kept outside the game ──

pub struct Scene<'a> {
    pub particles: &'a ParticleField,
    pub fireworks: &'a Fireworks,
    pub directive: &'a TypingEffect,
    pub score: &'a CountUp,
    /// Transient message for the bottom bar (errors, hints).
    pub status: Option<&'a str>,
    /// Text of the last voice cue.
    pub subtitle: Option<&'a str>,
    pub muted: bool,
    /// Wall clock in ms, for blinking and shaking.
    pub clock: u64,
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: Canvas,
    back: Canvas,
    last_screen: Option<ScreenKind>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: Canvas::new(0, 0),
            back: Canvas::new(0, 0),
            last_screen: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;
        self.sync_size()?;
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Terminal size as of the last frame.
    pub fn size(&self) -> (u16, u16) {
        (self.front.width as u16, self.front.height as u16)
    }

    fn invalidate(&mut self) -> io::Result<()> {
        self.back.cells.fill(Cell::INVALID);
        queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))
    }

    fn sync_size(&mut self) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let (w, h) = (tw as usize, th as usize);
        if w != self.front.width || h != self.front.height || self.last_screen.is_none() {
            self.front.resize(w, h);
            self.back.resize(w, h);
            self.invalidate()?;
        }
        Ok(())
    }

    pub fn render(&mut self, game: &Orchestrator, scene: &Scene) -> io::Result<()> {
        self.sync_size()?;

        let kind = game.screen_kind();
        if self.last_screen != Some(kind) {
            self.invalidate()?;
            self.last_screen = Some(kind);
        }

        self.front.clear();
        compose(&mut self.front, game, scene);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = TEXT;
        let mut last_bg = BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let step = if cell.wide { 2 } else { 1 };
                let changed = cell != self.back.get(x, y)
                    || (cell.wide && self.front.get(x + 1, y) != self.back.get(x + 1, y));

                if cell.cont || !changed {
                    x += 1;
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;

                x += step;
                cursor_at = Some((x, y));
            }
        }

        self.writer.flush()
    }
}

// ── Composition ──

fn compose(c: &mut Canvas, game: &Orchestrator, scene: &Scene) {
    compose_particles(c, scene.particles);

    match game.screen() {
        Screen::Intro => compose_intro(c, scene),
        Screen::Registration { form, overlay } => {
            compose_registration(c, form, scene);
            if let Some(ov) = overlay {
                compose_auth_overlay(c, ov);
            }
        }
        Screen::ScoringBriefing => compose_scoring(c),
        Screen::Briefing { cursor } => compose_hub(c, game, *cursor, scene),
        Screen::Level1(trivia) => compose_trivia(c, trivia, scene),
        Screen::Level2(matching) => compose_matching(c, matching, scene),
        Screen::Level3(grid) => compose_crossword(c, grid, scene),
        Screen::Completion => compose_completion(c, game, scene),
    }

    if !matches!(game.screen_kind(), ScreenKind::Intro | ScreenKind::Registration) {
        compose_header(c, game);
    }
    if scene.fireworks.is_active() {
        compose_fireworks(c, scene.fireworks);
    }
    compose_footer(c, game, scene);

    c.fade(game.fade().opacity());
}

fn panel_x(c: &Canvas) -> usize {
    c.width.saturating_sub(PANEL_W) / 2
}

fn panel_w(c: &Canvas) -> usize {
    PANEL_W.min(c.width)
}

fn compose_particles(c: &mut Canvas, field: &ParticleField) {
    let shift = field.glitch_offset();
    for p in field.particles() {
        let x = p.x as i32 + shift;
        if x < 0 || x as usize >= c.width {
            continue;
        }
        let head = p.y.floor() as i32;
        for k in 0..=p.trail as i32 {
            let y = head + k;
            if y < 0 || y as usize >= c.height {
                continue;
            }
            let (ch, t) = if k == 0 { ('•', 0.9) } else { ('·', 0.6 - 0.5 * k as f32 / p.trail as f32) };
            c.set(x as usize, y as usize, Cell { ch, fg: blend(p.color, BASE_BG, t), ..Cell::BLANK });
        }
    }
}

fn compose_fireworks(c: &mut Canvas, fw: &Fireworks) {
    for s in fw.sparks() {
        if s.x < 0.0 || s.y < 0.0 {
            continue;
        }
        let (x, y) = (s.x as usize, s.y as usize);
        if x < c.width && y < c.height {
            let bg = c.bg_at(x, y);
            c.set(x, y, Cell { ch: '*', fg: blend(hue_color(s.hue, 1.0), bg, s.alpha), bg, ..Cell::BLANK });
        }
    }
    for (x, y, hue) in fw.rockets() {
        if x >= 0.0 && y >= 0.0 {
            c.put_over(x as usize, y as usize, "|", hue_color(hue, 1.0));
        }
    }
}

fn compose_header(c: &mut Canvas, game: &Orchestrator) {
    let Some(agent) = game.profile() else {
        return;
    };
    let hdr_bg = Color::Rgb { r: 20, g: 20, b: 60 };
    c.fill_row(0, hdr_bg);
    c.put_str(1, 0, "SupTech Champions", CYAN, hdr_bg);

    let info = format!("Agent {} | Score: {} ", agent.codename(), game.progress().total_score());
    let x = c.width.saturating_sub(text_width(&info));
    let after = c.put_str(x, 0, "Agent ", TEXT, hdr_bg);
    let after = c.put_str(after, 0, agent.codename(), PINK, hdr_bg);
    let after = c.put_str(after, 0, " | Score: ", TEXT, hdr_bg);
    c.put_str(after, 0, &game.progress().total_score().to_string(), GREEN, hdr_bg);
}

/// Help line, or the status message over it, plus the voice subtitle.
fn compose_footer(c: &mut Canvas, game: &Orchestrator, scene: &Scene) {
    if c.height < 3 {
        return;
    }
    let bottom = c.height - 1;

    if let Some(text) = scene.subtitle {
        let line = format!("» {text} «");
        c.put_centered(bottom - 2, &line, Color::Rgb { r: 190, g: 160, b: 255 });
    }

    if let Some(msg) = scene.status {
        c.fill_row(bottom, MSG_BG);
        c.put_str(0, bottom, &format!(" ◈ {msg} "), BLACK, MSG_BG);
        return;
    }
    let mut help = help_line(game).to_string();
    if scene.muted {
        help.push_str("  │  F9 Sound (off)");
    } else {
        help.push_str("  │  F9 Mute");
    }
    c.put_str(1, bottom, &help, MUTED, BASE_BG);
}

fn help_line(game: &Orchestrator) -> &'static str {
    match game.screen() {
        Screen::Intro => "ENTER Start Mission   Q Quit",
        Screen::Registration { .. } => "Type codename  ←→ Avatar  F2 Default name  TAB How to Play  ENTER Submit",
        Screen::ScoringBriefing => "ENTER Proceed to Mission Briefing",
        Screen::Briefing { .. } => "↑↓ Select  ENTER Launch  1-3 Jump  Q Quit",
        Screen::Level1(t) if t.is_solved() => "ENTER Return to Hub  ESC Hub",
        Screen::Level1(_) => "↑↓ Choose  ENTER / 1-4 Answer  ESC Hub",
        Screen::Level2(m) if m.summary_visible() => "ENTER Return to Hub",
        Screen::Level2(m) if m.held().is_some() => "↑↓ Framework  ENTER Drop  ESC Cancel",
        Screen::Level2(_) => "↑↓ Violation  ENTER Pick up  ESC Hub",
        Screen::Level3(x) if x.modal_visible() => "R Replay  ENTER Finish Mission",
        Screen::Level3(x) if x.hint_choice_pending() => "F2 / ENTER Get a Hint  ESC End Game",
        Screen::Level3(_) => "Type answer  ENTER Submit  BACKSPACE Erase  ESC Hub",
        Screen::Completion => "R Replay Missions  Q Quit",
    }
}

fn progress_bar(width: usize, fraction: f32) -> String {
    let filled = ((width as f32) * fraction.clamp(0.0, 1.0)).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled.min(width)))
}

// ── Intro ──

const TITLE_ART: [&str; 5] = [
    r"  ___          _____         _      ",
    r" / __|_  _ _ _|_   _|__ __| |_    ",
    r" \__ \ || | '_ \| |/ -_) _| ' \   ",
    r" |___/\_,_| .__/|_|\___\__|_||_|  ",
    r"          |_|     C H A M P I O N S",
];

fn compose_intro(c: &mut Canvas, scene: &Scene) {
    let top = c.height.saturating_sub(16) / 2;

    // Scanning reticle: the outer ring ticks around once every 2 s.
    let ring = ['◜', '◝', '◞', '◟'];
    let tick = ring[(scene.clock / 500 % 4) as usize];
    c.put_centered(top, &format!("{tick} ◎ {tick}"), CYAN);

    for (i, line) in TITLE_ART.iter().enumerate() {
        c.put_centered(top + 2 + i, line, CYAN);
    }
    c.put_centered(top + 8, "A Data Heist Simulation", PURPLE);

    let blink = scene.clock / 600 % 2 == 0;
    let button = if blink { "▸ [ Start Mission ] ◂" } else { "  [ Start Mission ]  " };
    c.put_centered(top + 11, button, GREEN);
}

// ── Registration ──

const HOW_TO_PLAY: [(&str, &str); 3] = [
    (
        "1. ASSUME YOUR IDENTITY:",
        "Enter an Agent Codename to begin your mission. This is how you'll be known within the Bureau.",
    ),
    (
        "2. ANALYZE THE EVIDENCE:",
        "You will be presented with case files, transaction logs, and encrypted messages. Pay close attention to the details.",
    ),
    (
        "3. ANSWER THE BRIEFING:",
        "Use the information you gather to answer questions and identify the missing data. The fate of the Bureau's secrets is in your hands.",
    ),
];

fn compose_registration(c: &mut Canvas, form: &RegistrationForm, scene: &Scene) {
    let (x, w) = (panel_x(c), panel_w(c));
    let y = 1;
    c.panel(x, y, w, 20.min(c.height.saturating_sub(y + 1)), CYAN);
    c.put_centered(y + 1, "AGENT REGISTRATION", CYAN);

    c.put_over(x + 3, y + 3, "Enter your Agent Codename", TEXT);
    let caret = if scene.clock / 500 % 2 == 0 { "_" } else { " " };
    let field = format!("[ {:<26}]", format!("{}{caret}", form.draft()));
    c.put_over(x + 3, y + 4, &field, PINK);
    if let Some(err) = form.inline_error() {
        c.put_over(x + 3, y + 5, &err, RED);
    }

    c.put_over(x + 3, y + 7, "Select Your Avatar", TEXT);
    let slot_w = 16;
    for (i, avatar) in Avatar::ALL.iter().enumerate() {
        let sx = x + 3 + i * slot_w;
        let selected = *avatar == form.avatar();
        let fg = if selected { CYAN } else { MUTED };
        if selected {
            c.fill(sx, y + 8, slot_w - 2, 4, CURSOR_BG);
        }
        for (row, line) in avatar.glyph().iter().enumerate() {
            c.put_over(sx + 3, y + 8 + row, line, fg);
        }
        c.put_over(sx + (slot_w - 2).saturating_sub(avatar.name().len()) / 2, y + 11, avatar.name(), fg);
    }

    if form.show_help() {
        let mut row = y + 13;
        c.put_over(x + 3, row, "HOW TO PLAY", YELLOW);
        row += 1;
        for (head, body) in HOW_TO_PLAY {
            c.put_over(x + 3, row, head, CYAN);
            row += 1;
            for line in wrap(body, w.saturating_sub(8)) {
                c.put_over(x + 5, row, &line, TEXT);
                row += 1;
            }
        }
    } else {
        c.put_over(x + 3, y + 14, "TAB  How to Play", MUTED);
    }
}

fn compose_auth_overlay(c: &mut Canvas, ov: &AuthOverlay) {
    let w = 44.min(c.width);
    let (x, y) = (c.width.saturating_sub(w) / 2, c.height.saturating_sub(7) / 2);
    c.panel(x, y, w, 7, PURPLE);
    c.put_centered(y + 1, "AUTHENTICATING", PURPLE);
    c.put_centered(y + 3, ov.step(), CYAN);
    c.put_centered(y + 5, &progress_bar(w.saturating_sub(6), ov.progress()), GREEN);
}

// ── Scoring briefing ──

fn compose_scoring(c: &mut Canvas) {
    let (x, w) = (panel_x(c), panel_w(c));
    let inner = w.saturating_sub(6);
    c.panel(x, 2, w, 24.min(c.height.saturating_sub(3)), CYAN);
    c.put_centered(3, "SCORING PROTOCOL", CYAN);

    let mut row = 5;
    let after = c.put_over(x + 3, row, "OBJECTIVE:", YELLOW);
    c.put_over(after, row, &format!(" Achieve a perfect score of {MAX_SCORE}."), TEXT);
    row += 2;

    let intro = "Your performance in each simulation will be evaluated. Points are awarded for \
correct answers. There are no score deductions for incorrect attempts or using hints.";
    for line in wrap(intro, inner) {
        c.put_over(x + 3, row, &line, TEXT);
        row += 1;
    }
    row += 1;

    let tips = [
        ("Accuracy is key:", "Correctly solving a puzzle or answering a question awards the full point value."),
        ("Take your time:", "There are no time limits or penalties for thinking through your options."),
        ("Strive for perfection:", "A flawless run is required for the maximum score."),
    ];
    for (head, body) in tips {
        c.put_over(x + 3, row, &format!("• {head}"), CYAN);
        row += 1;
        for line in wrap(body, inner.saturating_sub(2)) {
            c.put_over(x + 5, row, &line, TEXT);
            row += 1;
        }
    }
    row += 1;

    let table = [
        (LevelId::One, TRIVIA_POINTS),
        (LevelId::Two, MATCH_POINTS * PAIRS.len() as u32),
        (LevelId::Three, crossword::WORD_POINTS * ENTRIES.len() as u32),
    ];
    for (level, pts) in table {
        let line = format!("{level}  {:<26}{pts:>4} pts", level.title());
        c.put_over(x + 5, row, &line, MUTED);
        row += 1;
    }
    row += 1;

    let after = c.put_over(x + 3, row, "CLASSIFIED:", RED);
    let classified = " The first agent to achieve a perfect score will receive a special commendation from the Bureau.";
    let lines = wrap(classified, inner.saturating_sub(12));
    for (i, line) in lines.iter().enumerate() {
        c.put_over(after + 1, row + i, line, TEXT);
    }
}

// ── Mission hub ──

fn compose_hub(c: &mut Canvas, game: &Orchestrator, cursor: usize, scene: &Scene) {
    let (x, w) = (panel_x(c), panel_w(c));
    let mut row = 2;

    if let Some(cel) = game.celebration() {
        let banner = format!("★  {} complete!  ★", cel.level());
        c.put_centered(row, &banner, YELLOW);
    }
    row += 2;

    c.put_over(x + 2, row, "Directive:", CYAN);
    row += 1;
    // Wrap the full text so lines don't reflow while typing.
    let codename = game.profile().map(|p| p.codename()).unwrap_or_default();
    let full = hub_directive(game.progress(), codename);
    let mut budget = scene.directive.visible().chars().count();
    for line in wrap(&full, w.saturating_sub(6)) {
        let n = line.chars().count();
        let shown: String = line.chars().take(budget).collect();
        c.put_over(x + 4, row, &shown, TEXT);
        budget = budget.saturating_sub(n + 1);
        row += 1;
    }
    row += 1;

    let progress = game.progress();
    for (i, level) in LevelId::ALL.iter().enumerate() {
        let unlocked = progress.is_unlocked(*level);
        let done = progress.is_complete(*level);
        let bg = if i == cursor { CURSOR_BG } else { PANEL_BG };
        c.fill(x + 2, row, w.saturating_sub(4), 3, bg);

        let number_fg = if unlocked { CYAN } else { MUTED };
        let marker = if i == cursor { "▸" } else { " " };
        let after = c.put_str(x + 3, row + 1, &format!("{marker} {level}"), number_fg, bg);
        let title_fg = if unlocked { TEXT } else { MUTED };
        c.put_str(after + 3, row + 1, level.title(), title_fg, bg);

        let (status, fg) = match (unlocked, done) {
            (false, _) => ("LOCKED".to_string(), MUTED),
            (true, true) => (format!("✓ Complete  {}", progress.level_score(*level).unwrap_or(0)), GREEN),
            (true, false) => ("READY".to_string(), YELLOW),
        };
        let sx = (x + w).saturating_sub(text_width(&status) + 4);
        c.put_str(sx, row + 1, &status, fg, bg);
        row += 4;
    }
}

// ── Level 1: trivia ──

fn compose_trivia(c: &mut Canvas, game: &TriviaGame, scene: &Scene) {
    let (x, w) = (panel_x(c), panel_w(c));
    let inner = w.saturating_sub(6);

    if game.is_loading() {
        let bw = 48.min(c.width);
        let (bx, by) = (c.width.saturating_sub(bw) / 2, c.height.saturating_sub(5) / 2);
        c.panel(bx, by, bw, 5, CYAN);
        let spin = ['|', '/', '-', '\\'][(scene.clock / 120 % 4) as usize];
        c.put_centered(by + 2, &format!("{spin} {}", game.loading_step()), CYAN);
        return;
    }

    let case = game.case();
    let mut row = 2;
    c.put_centered(row, case.title, CYAN);
    row += 2;

    let body = wrap(case.body, inner);
    c.panel(x, row, w, body.len() + 2, PURPLE);
    row += 1;
    for line in body {
        c.put_over(x + 3, row, &line, TEXT);
        row += 1;
    }
    row += 2;

    for line in wrap(case.question, inner) {
        c.put_over(x + 3, row, &line, YELLOW);
        row += 1;
    }
    row += 1;

    for (i, option) in game.options().iter().enumerate() {
        let (fg, mark) = if game.incorrect_option() == Some(*option) {
            (RED, "✗")
        } else if game.is_solved() && game.selected() == Some(*option) {
            (GREEN, "✓")
        } else {
            (TEXT, " ")
        };
        let bg = if i == game.cursor() && !game.is_solved() { CURSOR_BG } else { BASE_BG };
        c.fill(x + 3, row, inner.min(40), 1, bg);
        c.put_str(x + 3, row, &format!(" {} {}  {option}", i + 1, mark), fg, bg);
        row += 1;
    }
    row += 1;

    if let Some(text) = game.feedback() {
        let fg = if game.is_solved() { GREEN } else { RED };
        c.put_over(x + 3, row, text, fg);
        row += 1;
    }
    if game.is_solved() {
        c.put_over(x + 3, row + 1, &format!("+{TRIVIA_POINTS} points. Press ENTER to return to the hub."), MUTED);
    }
}

// ── Level 2: matching ──

fn compose_matching(c: &mut Canvas, game: &MatchingGame, scene: &Scene) {
    let (x, w) = (panel_x(c), panel_w(c));
    let max = MATCH_POINTS * PAIRS.len() as u32;
    let mut row = 2;
    c.put_centered(row, "LEVEL 2 : VIOLATION INVESTIGATION", CYAN);
    row += 1;
    c.put_centered(row, &format!("Matched {}/{}   Score {} / {max}", game.matched_count(), PAIRS.len(), game.score()), MUTED);
    row += 2;

    let col_w = w.saturating_sub(6) / 2;
    let (lx, rx) = (x + 2, x + 4 + col_w);
    c.put_over(lx, row, "VIOLATIONS", YELLOW);
    c.put_over(rx, row, "REGULATORY FRAMEWORKS", YELLOW);
    row += 2;

    let active = game.active_column();
    for (i, pair) in game.violations().enumerate() {
        let y = row + i * 3;
        let matched = game.is_matched(pair.violation_id);
        let held = game.held().map(|h| h.violation_id) == Some(pair.violation_id);
        let focus = active == Column::Violations && i == game.violation_cursor();
        let bg = if held { Color::Rgb { r: 70, g: 30, b: 90 } } else if focus { CURSOR_BG } else { PANEL_BG };
        let fg = if matched { MUTED } else { TEXT };
        c.fill(lx, y, col_w, 2, bg);
        let mark = if matched { "✓" } else if held { "»" } else if focus { "▸" } else { " " };
        c.put_str(lx + 1, y, &format!("{mark} {}", pair.violation), fg, bg);
    }

    for (i, pair) in game.frameworks().enumerate() {
        let y = row + i * 3;
        let focus = active == Column::Frameworks && i == game.framework_cursor();
        let shake = if game.shaking() == Some(pair.framework_id) && scene.clock / 50 % 2 == 0 { 1 } else { 0 };
        let sx = rx + shake;
        let bg = if game.shaking() == Some(pair.framework_id) {
            Color::Rgb { r: 90, g: 20, b: 20 }
        } else if focus {
            CURSOR_BG
        } else {
            PANEL_BG
        };
        c.fill(sx, y, col_w, 2, bg);
        let mark = if focus { "▸" } else { " " };
        c.put_str(sx + 1, y, &format!("{mark} {}", pair.framework), CYAN, bg);
        let slot = match game.slot_content(pair.framework_id) {
            Some(v) => format!("  [ {v} ]"),
            None => "  [ drop here ]".to_string(),
        };
        let slot_fg = if game.slot_content(pair.framework_id).is_some() { GREEN } else { MUTED };
        let after = c.put_str(sx + 1, y + 1, &slot, slot_fg, bg);
        if game.popup() == Some(pair.framework_id) {
            c.put_str(after + 1, y + 1, &format!("+{MATCH_POINTS}"), YELLOW, bg);
        }
    }

    if game.summary_visible() {
        let bw = 44.min(c.width);
        let (bx, by) = (c.width.saturating_sub(bw) / 2, c.height.saturating_sub(7) / 2);
        c.panel(bx, by, bw, 7, GREEN);
        c.put_centered(by + 1, "INVESTIGATION COMPLETE", GREEN);
        c.put_centered(by + 3, &format!("All violations matched. Score {} / {max}", game.score()), TEXT);
        c.put_centered(by + 5, "ENTER  Return to Hub", CYAN);
    }
}

// ── Level 3: crossword ──

const CELL_W: usize = 2;

fn compose_crossword(c: &mut Canvas, game: &CrosswordGame, scene: &Scene) {
    let x = panel_x(c);
    let gx = x + 1;
    let gy = 3;
    c.put_centered(1, "LEVEL 3 : DECRYPTION GRID", CYAN);

    let grid = game.grid();
    for r in 0..crossword::GRID_ROWS {
        for col in 0..crossword::GRID_COLS {
            let (cx, cy) = (gx + col * CELL_W, gy + r);
            let Some(cell) = grid.cell(r, col) else {
                continue;
            };
            let bg = if game.is_just_solved_cell(r, col) {
                Color::Rgb { r: 20, g: 90, b: 40 }
            } else if game.is_active_cell(r, col) {
                Color::Rgb { r: 30, g: 50, b: 110 }
            } else {
                Color::Rgb { r: 40, g: 40, b: 60 }
            };
            match game.revealed(r, col) {
                Some(letter) => {
                    c.put_str(cx, cy, &format!(" {letter}"), CYAN, bg);
                }
                None => {
                    let num = cell.number.map(|n| char::from(b'0' + n)).unwrap_or(' ');
                    c.put_str(cx, cy, &format!("{num}·"), MUTED, bg);
                }
            }
        }
    }

    // Clue panel to the right of the grid.
    let px = gx + crossword::GRID_COLS * CELL_W + 2;
    let pw = (x + panel_w(c)).saturating_sub(px);
    let mut row = gy;
    c.put_over(px, row, &format!("Solved {}/{}", game.solved_count(), ENTRIES.len()), MUTED);
    row += 1;
    let after = c.put_over(px, row, &format!("Score {}", game.score()), GREEN);
    if let Some(points) = game.popup() {
        c.put_over(after + 2, row, &format!("+{points}"), YELLOW);
    }
    row += 2;

    match game.current_entry() {
        Some(entry) => {
            let dir = match entry.direction {
                Direction::Across => "Across",
                Direction::Down => "Down",
            };
            c.put_over(px, row, &format!("{} {dir} ({} letters)", entry.number, entry.len()), YELLOW);
            row += 1;
            for line in wrap(entry.clue, pw) {
                c.put_over(px, row, &line, TEXT);
                row += 1;
            }
            row += 1;
            let shake = usize::from(game.is_shaking() && scene.clock / 50 % 2 == 0);
            let caret = if scene.clock / 500 % 2 == 0 { "_" } else { " " };
            let fg = if game.is_shaking() { RED } else { PINK };
            c.put_over(px + shake, row, &format!("> {}{caret}", game.draft()), fg);
            row += 2;
            if let Some(hint) = game.hint() {
                for line in wrap(hint, pw) {
                    c.put_over(px, row, &line, PURPLE);
                    row += 1;
                }
            }
            if game.wrong_attempts() > 0 {
                c.put_over(px, row, &format!("Incorrect attempts: {}", game.wrong_attempts()), MUTED);
            }
        }
        None => {
            c.put_over(px, row, "All clues decrypted.", GREEN);
        }
    }

    if game.hint_choice_pending() {
        let bw = 50.min(c.width);
        let (bx, by) = (c.width.saturating_sub(bw) / 2, c.height.saturating_sub(8) / 2);
        c.panel(bx, by, bw, 8, YELLOW);
        c.put_centered(by + 1, "Challenge Detected", YELLOW);
        let lines = wrap("You've made 3 incorrect attempts. How do you wish to proceed?", bw.saturating_sub(6));
        for (i, line) in lines.iter().enumerate() {
            c.put_centered(by + 3 + i, line, TEXT);
        }
        c.put_centered(by + 6, "[F2] Get a Hint     [ESC] End Game", CYAN);
    }

    if game.modal_visible() {
        let bw = 50.min(c.width);
        let (bx, by) = (c.width.saturating_sub(bw) / 2, c.height.saturating_sub(8) / 2);
        c.panel(bx, by, bw, 8, GREEN);
        c.put_centered(by + 1, "GRID DECRYPTED", GREEN);
        c.put_centered(by + 3, &format!("Score {} / {}", game.score(), crossword::WORD_POINTS * ENTRIES.len() as u32), TEXT);
        c.put_centered(by + 6, "[R] Replay     [ENTER] Finish Mission", CYAN);
    }
}

// ── Completion ──

fn compose_completion(c: &mut Canvas, game: &Orchestrator, scene: &Scene) {
    let (x, w) = (panel_x(c), panel_w(c));
    let total = game.progress().total_score();
    let shown = scene.score.value();
    let rank = Rank::from_score(total);
    let codename = game.profile().map(|p| p.codename()).unwrap_or_default();

    c.put_centered(2, &progress_bar(w.saturating_sub(8), shown as f32 / MAX_SCORE as f32), PURPLE);
    c.put_centered(4, "🎉 Mission Complete 🎉", TEXT);
    c.put_centered(6, &shown.to_string(), GREEN);

    let top = 8;
    c.panel(x, top, w, 15.min(c.height.saturating_sub(top + 2)), PURPLE);
    c.put_centered(top + 1, "🏆 CERTIFICATE OF COMPLETION 🏆", YELLOW);
    c.put_centered(top + 3, "This is to certify that", TEXT);
    c.put_centered(top + 4, &format!("Agent {codename}"), PINK);
    c.put_centered(top + 5, "has successfully completed the SupTech Champions Simulation,", TEXT);
    c.put_centered(top + 6, "demonstrating strong capability across supervisory missions", TEXT);
    c.put_centered(top + 7, &format!("with a total score of {total} / {MAX_SCORE}."), GREEN);
    c.put_centered(top + 9, "Awarded the title of", TEXT);
    // The rank appears once the count-up lands.
    if shown == total {
        c.put_centered(top + 10, &format!("{} {}", rank.medal(), rank.name()), YELLOW);
        c.put_centered(top + 11, "for advancing SupTech knowledge and skills.", PURPLE);
    }
    c.put_centered(top + 13, "[R] Replay Missions", CYAN);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimingConfig;
    use crate::domain::random::ScriptedRandom;

    struct Fixture {
        particles: ParticleField,
        fireworks: Fireworks,
        directive: TypingEffect,
        score: CountUp,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                particles: ParticleField::new(1),
                fireworks: Fireworks::new(1),
                directive: TypingEffect::new(1),
                score: CountUp::new(0),
            }
        }

        fn draw(&self, game: &Orchestrator, status: Option<&str>) -> Canvas {
            let scene = Scene {
                particles: &self.particles,
                fireworks: &self.fireworks,
                directive: &self.directive,
                score: &self.score,
                status,
                subtitle: None,
                muted: false,
                clock: 0,
            };
            let mut c = Canvas::new(100, 40);
            compose(&mut c, game, &scene);
            c
        }
    }

    fn game() -> Orchestrator {
        Orchestrator::new(TimingConfig::default(), Box::new(ScriptedRandom::zeros()))
    }

    fn settle(o: &mut Orchestrator) {
        for _ in 0..4 {
            o.advance(10_000);
        }
    }

    fn at_hub() -> Orchestrator {
        let mut o = game();
        o.start().unwrap();
        settle(&mut o);
        o.register("Neo", 1).unwrap();
        settle(&mut o);
        o.proceed().unwrap();
        settle(&mut o);
        o
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps over", "the lazy", "dog"]);
        assert!(wrap("", 10).is_empty());
        assert_eq!(wrap("supercalifragilistic", 5), vec!["supercalifragilistic"]);
    }

    #[test]
    fn wide_chars_take_two_columns() {
        let mut c = Canvas::new(10, 1);
        let end = c.put_str(0, 0, "a🏆b", TEXT, BASE_BG);
        assert_eq!(end, 4);
        assert!(c.get(1, 0).wide);
        assert!(c.get(2, 0).cont);
        assert_eq!(c.row(0).trim_end(), "a🏆b");
    }

    #[test]
    fn fade_blends_toward_background() {
        let mut c = Canvas::new(1, 1);
        c.put_str(0, 0, "x", Color::Rgb { r: 255, g: 255, b: 255 }, BASE_BG);
        c.fade(0.0);
        assert_eq!(c.get(0, 0).fg, BASE_BG);
    }

    #[test]
    fn intro_shows_title_and_button() {
        let f = Fixture::new();
        let c = f.draw(&game(), None);
        assert!(c.contains("A Data Heist Simulation"));
        assert!(c.contains("Start Mission"));
        assert!(c.contains("ENTER Start Mission"));
    }

    #[test]
    fn registration_shows_inline_error_and_avatars() {
        let f = Fixture::new();
        let mut o = game();
        o.start().unwrap();
        settle(&mut o);
        o.type_char('A').unwrap();
        let c = f.draw(&o, None);
        assert!(c.contains("AGENT REGISTRATION"));
        assert!(c.contains("Phantom"));
        assert!(c.contains("Codename must be at least"));
    }

    #[test]
    fn hub_marks_locked_levels() {
        let f = Fixture::new();
        let c = f.draw(&at_hub(), None);
        assert!(c.contains("The Chronos System"));
        assert!(c.contains("READY"));
        assert!(c.contains("LOCKED"));
        assert!(c.contains("Agent Neo | Score: 0"));
    }

    #[test]
    fn status_replaces_help_line() {
        let f = Fixture::new();
        let c = f.draw(&at_hub(), Some("Level 2 is locked"));
        assert!(c.row(39).contains("◈ Level 2 is locked"));
    }

    #[test]
    fn crossword_hint_modal() {
        let f = Fixture::new();
        let mut o = at_hub();
        // Unlock level 3 by clearing the first two.
        o.select_level(1).unwrap();
        settle(&mut o);
        o.trivia_submit("Cerberus-03").unwrap();
        o.trivia_finish().unwrap();
        settle(&mut o);
        o.select_level(2).unwrap();
        settle(&mut o);
        for p in &PAIRS {
            o.match_pair(p.violation_id, p.framework_id).unwrap();
        }
        settle(&mut o);
        o.matching_finish().unwrap();
        settle(&mut o);
        o.select_level(3).unwrap();
        settle(&mut o);

        for _ in 0..3 {
            o.crossword_submit("WRONG").unwrap();
        }
        let c = f.draw(&o, None);
        assert!(c.contains("Challenge Detected"));
        assert!(c.contains("ESC End Game"));
    }
}
