//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD), unless an
//! explicit path is given on the command line. Missing files and missing
//! keys fall back to defaults; a file that fails to parse is logged and
//! replaced by defaults so the game always starts.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{GameError, Result};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub audio: AudioConfig,
    pub gamepad: GamepadConfig,
    pub log_file: PathBuf,
    pub log_level: String,
}

/// All durations in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub fade_ms: u64,
    pub auth_overlay_ms: u64,
    pub loader_step_ms: u64,
    pub case_file_load_ms: u64,
    pub celebration_ms: u64,
    pub indicator_ms: u64,       // wrong-answer flash / shake
    pub score_popup_ms: u64,
    pub highlight_ms: u64,       // just-solved crossword entry glow
    pub summary_delay_ms: u64,
    pub completion_modal_delay_ms: u64,
    pub typing_char_ms: u64,
    pub count_up_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AudioConfig {
    pub enabled: bool,
    pub volume: f32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub alt: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    audio: TomlAudio,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_fade")]
    fade_ms: u64,
    #[serde(default = "default_auth_overlay")]
    auth_overlay_ms: u64,
    #[serde(default = "default_loader_step")]
    loader_step_ms: u64,
    #[serde(default = "default_case_file_load")]
    case_file_load_ms: u64,
    #[serde(default = "default_celebration")]
    celebration_ms: u64,
    #[serde(default = "default_indicator")]
    indicator_ms: u64,
    #[serde(default = "default_score_popup")]
    score_popup_ms: u64,
    #[serde(default = "default_highlight")]
    highlight_ms: u64,
    #[serde(default = "default_summary_delay")]
    summary_delay_ms: u64,
    #[serde(default = "default_completion_modal_delay")]
    completion_modal_delay_ms: u64,
    #[serde(default = "default_typing_char")]
    typing_char_ms: u64,
    #[serde(default = "default_count_up")]
    count_up_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlAudio {
    #[serde(default = "default_audio_enabled")]
    enabled: bool,
    #[serde(default = "default_volume")]
    volume: f32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_alt")]
    alt: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_log_file")]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }
fn default_fade() -> u64 { 500 }
fn default_auth_overlay() -> u64 { 3500 }
fn default_loader_step() -> u64 { 800 }
fn default_case_file_load() -> u64 { 3500 }
fn default_celebration() -> u64 { 4000 }   // firework burst on the hub
fn default_indicator() -> u64 { 500 }
fn default_score_popup() -> u64 { 1000 }
fn default_highlight() -> u64 { 2000 }
fn default_summary_delay() -> u64 { 500 }
fn default_completion_modal_delay() -> u64 { 1000 }
fn default_typing_char() -> u64 { 20 }
fn default_count_up() -> u64 { 2000 }

fn default_audio_enabled() -> bool { true }
fn default_volume() -> f32 { 0.8 }

fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_alt() -> Vec<String> { vec!["Y".into()] }

fn default_log_file() -> String { "suptech-champions.log".into() }
fn default_log_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            fade_ms: default_fade(),
            auth_overlay_ms: default_auth_overlay(),
            loader_step_ms: default_loader_step(),
            case_file_load_ms: default_case_file_load(),
            celebration_ms: default_celebration(),
            indicator_ms: default_indicator(),
            score_popup_ms: default_score_popup(),
            highlight_ms: default_highlight(),
            summary_delay_ms: default_summary_delay(),
            completion_modal_delay_ms: default_completion_modal_delay(),
            typing_char_ms: default_typing_char(),
            count_up_ms: default_count_up(),
        }
    }
}

impl Default for TomlAudio {
    fn default() -> Self {
        TomlAudio { enabled: default_audio_enabled(), volume: default_volume() }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            alt: default_alt(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { log_file: default_log_file(), log_level: default_log_level() }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        TomlTiming::default().into()
    }
}

impl From<TomlTiming> for TimingConfig {
    fn from(t: TomlTiming) -> Self {
        TimingConfig {
            tick_rate_ms: t.tick_rate_ms.max(1),
            fade_ms: t.fade_ms,
            auth_overlay_ms: t.auth_overlay_ms,
            loader_step_ms: t.loader_step_ms.max(1),
            case_file_load_ms: t.case_file_load_ms,
            celebration_ms: t.celebration_ms,
            indicator_ms: t.indicator_ms,
            score_popup_ms: t.score_popup_ms,
            highlight_ms: t.highlight_ms,
            summary_delay_ms: t.summary_delay_ms,
            completion_modal_delay_ms: t.completion_modal_delay_ms,
            typing_char_ms: t.typing_char_ms,
            count_up_ms: t.count_up_ms,
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) XDG data home, (4) system data directory.
    ///
    /// Logging is not up yet when this runs, so fallbacks come back as
    /// messages for the caller to log once the subscriber is installed.
    pub fn load() -> (Self, Vec<String>) {
        let (toml_cfg, warnings) = load_toml(&candidate_dirs());
        (Self::from_toml(toml_cfg), warnings)
    }

    /// Load from an explicit path. Unlike `load()`, a missing or broken
    /// file is an error: the player asked for this file by name.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg = toml::from_str::<TomlConfig>(&text)
            .map_err(|e| GameError::Config(format!("{}: {e}", path.display())))?;
        Ok(Self::from_toml(cfg))
    }

    #[cfg(test)]
    pub fn parse(text: &str) -> Result<Self> {
        let cfg = toml::from_str::<TomlConfig>(text)
            .map_err(|e| GameError::Config(e.to_string()))?;
        Ok(Self::from_toml(cfg))
    }

    fn from_toml(cfg: TomlConfig) -> Self {
        GameConfig {
            timing: cfg.timing.into(),
            audio: AudioConfig {
                enabled: cfg.audio.enabled,
                volume: cfg.audio.volume.clamp(0.0, 1.0),
            },
            gamepad: GamepadConfig {
                confirm: cfg.gamepad.confirm,
                cancel: cfg.gamepad.cancel,
                alt: cfg.gamepad.alt,
            },
            log_file: PathBuf::from(cfg.general.log_file),
            log_level: cfg.general.log_level,
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so an installed link still finds the real binary's dir.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/suptech-champions");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/suptech-champions");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories. Returns the config
/// and any fallback warnings.
fn load_toml(search_dirs: &[PathBuf]) -> (TomlConfig, Vec<String>) {
    let mut warnings = Vec::new();
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return (cfg, warnings),
                    Err(e) => {
                        warnings.push(format!("{}: parse error, using defaults: {e}", path.display()));
                        return (TomlConfig::default(), warnings);
                    }
                },
                Err(e) => {
                    warnings.push(format!("{}: could not read config file: {e}", path.display()));
                }
            }
        }
    }
    warnings.push("no usable config.toml found, using defaults".to_string());
    (TomlConfig::default(), warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = GameConfig::parse("").unwrap();
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.timing.fade_ms, 500);
        assert_eq!(cfg.timing.auth_overlay_ms, 3500);
        assert!(cfg.audio.enabled);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[timing]\nfade_ms = 250\n\n[audio]\nvolume = 3.0\n",
        )
        .unwrap();
        assert_eq!(cfg.timing.fade_ms, 250);
        assert_eq!(cfg.timing.celebration_ms, 4000);
        assert!((cfg.audio.volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let cfg = GameConfig::parse("[timing]\ntick_rate_ms = 0\n").unwrap();
        assert_eq!(cfg.timing.tick_rate_ms, 1);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            GameConfig::parse("[timing\nfade_ms = "),
            Err(GameError::Config(_))
        ));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "[general]\nlog_file = \"game.log\"\nlog_level = \"debug\"").unwrap();

        let cfg = GameConfig::load_from(&path).unwrap();
        assert_eq!(cfg.log_file, PathBuf::from("game.log"));
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn missing_explicit_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = GameConfig::load_from(&dir.path().join("nope.toml"));
        assert!(matches!(res, Err(GameError::Io(_))));
    }

    #[test]
    fn search_falls_back_on_bad_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "not = [valid").unwrap();
        let (cfg, warnings) = load_toml(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.timing.fade_ms, 500);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("parse error"));
    }

    #[test]
    fn search_without_any_file_warns() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, warnings) = load_toml(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.general.log_level, "info");
        assert_eq!(warnings, vec!["no usable config.toml found, using defaults".to_string()]);
    }

    #[test]
    fn search_stops_at_first_good_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "[timing]\nfade_ms = 300\n").unwrap();
        let (cfg, warnings) = load_toml(&[dir.path().to_path_buf()]);
        assert_eq!(cfg.timing.fade_ms, 300);
        assert!(warnings.is_empty());
    }
}
