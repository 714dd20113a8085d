//! Keyboard input.
//!
//! Every game action is edge-triggered, so input is a queue of commands
//! drained once per frame. Key repeat is honored for navigation and
//! typing; Release events are ignored.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    Confirm,
    Back,
    Move(Dir),
    Text(char),
    Erase,
    /// Secondary action: default codename, accept hint.
    Alt,
    /// Toggle the How-to-Play panel.
    Help,
    /// Toggle sound.
    Mute,
}

/// Translate one key press. Printable characters always become `Text`;
/// the screen decides whether they are typing or hotkeys.
pub fn map_key(key: KeyEvent) -> Option<Command> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return None;
    }
    match key.code {
        KeyCode::Enter => Some(Command::Confirm),
        KeyCode::Esc => Some(Command::Back),
        KeyCode::Up => Some(Command::Move(Dir::Up)),
        KeyCode::Down => Some(Command::Move(Dir::Down)),
        KeyCode::Left => Some(Command::Move(Dir::Left)),
        KeyCode::Right => Some(Command::Move(Dir::Right)),
        KeyCode::Backspace => Some(Command::Erase),
        KeyCode::Tab => Some(Command::Help),
        KeyCode::F(2) => Some(Command::Alt),
        KeyCode::F(9) => Some(Command::Mute),
        KeyCode::Char(c) => Some(Command::Text(c)),
        _ => None,
    }
}

pub struct InputState {
    commands: Vec<Command>,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState { commands: Vec::with_capacity(8), quit: false }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame, before the orchestrator tick.
    pub fn drain_events(&mut self) {
        self.commands.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            let Ok(Event::Key(key)) = event::read() else {
                continue;
            };
            if key.kind == KeyEventKind::Release {
                continue;
            }
            if is_ctrl_c(&key) {
                self.quit = true;
                continue;
            }
            self.commands.extend(map_key(key));
        }
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn navigation_and_confirm() {
        assert_eq!(map_key(key(KeyCode::Enter)), Some(Command::Confirm));
        assert_eq!(map_key(key(KeyCode::Esc)), Some(Command::Back));
        assert_eq!(map_key(key(KeyCode::Left)), Some(Command::Move(Dir::Left)));
        assert_eq!(map_key(key(KeyCode::F(2))), Some(Command::Alt));
    }

    #[test]
    fn characters_are_text() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(Command::Text('q')));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(Command::Text('A'))
        );
    }

    #[test]
    fn control_chords_are_not_typed() {
        let chord = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(chord), None);
        assert!(is_ctrl_c(&chord));
        assert!(!is_ctrl_c(&key(KeyCode::Char('c'))));
    }
}
