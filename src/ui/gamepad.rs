//! Gamepad input tracker using gilrs.
//!
//! Menus and mini-games only need edge-triggered navigation, so every
//! query here is "pressed this frame". Mapping comes from `[gamepad]` in
//! config.toml; defaults:
//!   D-pad / Left Stick    →  Navigate
//!   A / Start             →  Confirm
//!   B / Select            →  Cancel / Exit level
//!   Y                     →  Alternate (default codename, hint)

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
#[cfg(feature = "gamepad")]
use tracing::debug;

use crate::config::GamepadConfig;
use crate::ui::input::{Command, Dir};

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    alt: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A, Btn::Start],
            cancel: vec![Btn::B, Btn::Select],
            alt: vec![Btn::Y],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons pressed since the last `update()`.
    pressed: Vec<Btn>,
    nav: Vec<Dir>,

    // Stick position, digitized against the deadzone for edge detection.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_dir: Option<Dir>,

    action_map: ActionMap,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let gilrs_opt = match Gilrs::new() {
            Ok(g) => {
                debug!(pads = g.gamepads().count(), "gamepad support ready");
                Some(g)
            }
            Err(e) => {
                debug!(error = %e, "gamepad support unavailable");
                None
            }
        };

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            pressed: Vec::with_capacity(4),
            nav: Vec::with_capacity(4),
            stick_x: 0.0,
            stick_y: 0.0,
            stick_dir: None,
            action_map: ActionMap::default(),
        }
    }

    /// Load button mapping from config. Lists that name no known button
    /// keep their defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
        let alt = parse_list(&cfg.alt);
        if !alt.is_empty() { map.alt = alt; }
    }

    pub fn update(&mut self) {
        self.pressed.clear();
        self.nav.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => self.press(btn),
                EventType::AxisChanged(axis, value, _) => match axis {
                    Axis::LeftStickX => self.stick_x = value,
                    Axis::LeftStickY => self.stick_y = value,
                    _ => {}
                },
                EventType::Connected => debug!(id = ?event.id, "gamepad connected"),
                EventType::Disconnected => {
                    debug!(id = ?event.id, "gamepad disconnected");
                    self.stick_x = 0.0;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }

        let dir = self.stick_direction();
        if dir.is_some() && dir != self.stick_dir {
            self.nav.extend(dir);
        }
        self.stick_dir = dir;
    }

    #[cfg(feature = "gamepad")]
    fn press(&mut self, gilrs_btn: Button) {
        match gilrs_btn {
            Button::DPadUp => self.nav.push(Dir::Up),
            Button::DPadDown => self.nav.push(Dir::Down),
            Button::DPadLeft => self.nav.push(Dir::Left),
            Button::DPadRight => self.nav.push(Dir::Right),
            other => self.pressed.extend(Btn::from_gilrs(other)),
        }
    }

    /// Dominant stick direction outside the deadzone.
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn stick_direction(&self) -> Option<Dir> {
        let (x, y) = (self.stick_x, self.stick_y);
        if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
            None
        } else if x.abs() > y.abs() {
            Some(if x < 0.0 { Dir::Left } else { Dir::Right })
        } else {
            Some(if y > 0.0 { Dir::Up } else { Dir::Down })
        }
    }

    // ── Action queries (config-driven) ──

    fn any_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|b| self.pressed.contains(b))
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.cancel)
    }
    pub fn alt_pressed(&self) -> bool {
        self.any_pressed(&self.action_map.alt)
    }

    /// This frame's presses as game commands: navigation first, then
    /// actions.
    pub fn commands(&self) -> Vec<Command> {
        let mut out: Vec<Command> = self.nav.iter().map(|&d| Command::Move(d)).collect();
        if self.confirm_pressed() {
            out.push(Command::Confirm);
        }
        if self.cancel_pressed() {
            out.push(Command::Back);
        }
        if self.alt_pressed() {
            out.push(Command::Alt);
        }
        out
    }
}
