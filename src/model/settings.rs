use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Whether disguise abilities actually roll, or are switched off so
/// every seat registers as its true type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisguiseMode {
    Off,
    Roll,
}

/// Table rules the storyteller can tune per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSettings {
    pub disguise_mode: DisguiseMode,
    /// Chance a disguised minion reads as good to one viewing ability
    /// for one night.
    pub disguise_probability: f64,
    /// Chance the Hermit reads as evil for one night.
    pub hermit_evil_probability: f64,
    /// Evil wins once this few players (or fewer) live while a demon
    /// does. Script-dependent, so configurable rather than fixed.
    pub evil_win_living_threshold: usize,
}

impl Default for RuleSettings {
    fn default() -> Self {
        Self {
            disguise_mode: DisguiseMode::Roll,
            disguise_probability: 0.8,
            hermit_evil_probability: 0.5,
            evil_win_living_threshold: 2,
        }
    }
}

fn settings_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("grimoire");
    fs::create_dir_all(&path).ok();
    path.push("rule_settings.json");
    path
}

pub fn load_settings() -> RuleSettings {
    let path = settings_path();
    fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn save_settings(settings: &RuleSettings) {
    let path = settings_path();
    if let Ok(json) = serde_json::to_string_pretty(settings) {
        let _ = fs::write(path, json);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let settings = RuleSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let back: RuleSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back, settings);
    }
}
