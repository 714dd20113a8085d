//! Error types for the game core and runtime shell.
//!
//! Wrong answers are outcomes, not errors. Everything here is a rejected
//! operation that leaves game state untouched.

use thiserror::Error;

use crate::domain::progress::LevelId;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("Codename must be at least {min} characters.")]
    CodenameTooShort { min: usize },

    #[error("Unknown avatar #{index} ({available} available)")]
    UnknownAvatar { index: usize, available: usize },

    #[error("{0} is locked. Complete the previous level first.")]
    LevelLocked(LevelId),

    #[error("'{action}' is not available on the {screen} screen")]
    InvalidAction { screen: &'static str, action: &'static str },

    #[error("Transition in progress")]
    TransitionInProgress,

    #[error("{0}")]
    NotReady(&'static str),

    #[error("Unknown item '{0}'")]
    UnknownItem(String),

    #[error("Choose: accept a hint or abandon the level")]
    HintChoicePending,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GameError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_player_readable() {
        let e = GameError::CodenameTooShort { min: 2 };
        assert_eq!(e.to_string(), "Codename must be at least 2 characters.");

        let e = GameError::LevelLocked(LevelId::Two);
        assert!(e.to_string().starts_with("Level 2"));
    }
}
