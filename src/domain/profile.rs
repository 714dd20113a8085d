//! Agent identity created at registration.

use crate::error::{GameError, Result};

pub const MIN_CODENAME_LEN: usize = 2;
pub const DEFAULT_CODENAME: &str = "Agent Smith";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Avatar {
    Detective,
    Analyst,
    Phantom,
    Cyborg,
}

impl Avatar {
    pub const ALL: [Avatar; 4] = [Avatar::Detective, Avatar::Analyst, Avatar::Phantom, Avatar::Cyborg];

    pub fn from_index(index: usize) -> Result<Avatar> {
        Self::ALL.get(index).copied().ok_or(GameError::UnknownAvatar {
            index,
            available: Self::ALL.len(),
        })
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|&a| a == self).unwrap_or(0)
    }

    pub fn name(self) -> &'static str {
        match self {
            Avatar::Detective => "Detective",
            Avatar::Analyst => "Analyst",
            Avatar::Phantom => "Phantom",
            Avatar::Cyborg => "Cyborg",
        }
    }

    /// Three-line terminal portrait.
    pub fn glyph(self) -> [&'static str; 3] {
        match self {
            Avatar::Detective => [" _===_ ", " (o.o) ", " /|_|\\ "],
            Avatar::Analyst => ["  ___  ", " [o-o] ", " /|=|\\ "],
            Avatar::Phantom => ["  .-.  ", " (° °) ", "  \\~/  "],
            Avatar::Cyborg => [" [###] ", " |0_0| ", " /[=]\\ "],
        }
    }

    pub fn next(self) -> Avatar {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Avatar {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Immutable once created; mini-games only ever see `&AgentProfile`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AgentProfile {
    codename: String,
    avatar: Avatar,
}

impl AgentProfile {
    pub fn new(codename: &str, avatar_index: usize) -> Result<Self> {
        validate_codename(codename)?;
        let avatar = Avatar::from_index(avatar_index)?;
        Ok(AgentProfile { codename: codename.to_string(), avatar })
    }

    pub fn codename(&self) -> &str {
        &self.codename
    }

    pub fn avatar(&self) -> Avatar {
        self.avatar
    }
}

/// Length is counted in characters, not bytes.
pub fn validate_codename(codename: &str) -> Result<()> {
    if codename.chars().count() < MIN_CODENAME_LEN {
        return Err(GameError::CodenameTooShort { min: MIN_CODENAME_LEN });
    }
    Ok(())
}

/// Inline message shown under the input while the draft is too short.
/// An empty draft shows nothing.
pub fn inline_error(draft: &str) -> Option<String> {
    let len = draft.chars().count();
    if len > 0 && len < MIN_CODENAME_LEN {
        Some(GameError::CodenameTooShort { min: MIN_CODENAME_LEN }.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_codenames_register() {
        for name in ["Agent X", "ab", "Ω7", DEFAULT_CODENAME, "  "] {
            let p = AgentProfile::new(name, 0).unwrap();
            assert_eq!(p.codename(), name);
            assert_eq!(p.avatar(), Avatar::Detective);
        }
    }

    #[test]
    fn short_codenames_are_rejected() {
        assert!(matches!(
            AgentProfile::new("", 0),
            Err(GameError::CodenameTooShort { min: 2 })
        ));
        assert!(matches!(
            AgentProfile::new("X", 0),
            Err(GameError::CodenameTooShort { .. })
        ));
        // One multi-byte character is still one character.
        assert!(AgentProfile::new("é", 0).is_err());
    }

    #[test]
    fn avatar_index_out_of_range() {
        assert!(matches!(
            AgentProfile::new("Agent X", 4),
            Err(GameError::UnknownAvatar { index: 4, available: 4 })
        ));
    }

    #[test]
    fn avatar_cycling_wraps() {
        assert_eq!(Avatar::Detective.prev(), Avatar::Cyborg);
        assert_eq!(Avatar::Cyborg.next(), Avatar::Detective);
        assert_eq!(Avatar::Analyst.next(), Avatar::Phantom);
    }

    #[test]
    fn inline_error_only_for_partial_input() {
        assert_eq!(inline_error(""), None);
        assert!(inline_error("A").is_some());
        assert_eq!(inline_error("AB"), None);
    }
}
