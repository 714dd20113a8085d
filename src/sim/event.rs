//! Cues emitted by the orchestrator as the player acts.
//! The presentation layer drains these for sound and voice lines.

use crate::domain::progress::LevelId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    Hover,
    Click,
    Snap,
    Wrong,
    Typing,
    Triumph,
    Welcome { text: String },
    Success { text: String },
    FinalCompletion { text: String },
    LevelCompleted { level: LevelId, score: u32 },
}

impl GameEvent {
    /// Spoken line carried by voice cues.
    pub fn voice_text(&self) -> Option<&str> {
        match self {
            GameEvent::Welcome { text }
            | GameEvent::Success { text }
            | GameEvent::FinalCompletion { text } => Some(text),
            _ => None,
        }
    }
}
