use serde::{Deserialize, Serialize};

/// What a seat looks like to a viewing ability. May diverge from the
/// seat's true role; cached per night so repeated queries agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResult {
    pub registers_as_demon: bool,
    pub registers_as_minion: bool,
    pub registers_as_good: bool,
}

impl RegistrationResult {
    /// Nothing special: reads as an ordinary good seat.
    pub fn neutral() -> Self {
        Self {
            registers_as_demon: false,
            registers_as_minion: false,
            registers_as_good: true,
        }
    }
}

/// One wake step's instructions for the storyteller. Ephemeral, except
/// that the per-role hint cache keeps the last one so stepping backward
/// shows the same text instead of redrawing randomness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightInfoResult {
    pub seat: usize,
    /// What the storyteller does at this step.
    pub action: String,
    /// What the storyteller tells the woken player.
    pub speak: String,
    /// Extra guidance pulled from the role documents, if any.
    pub guide: String,
    pub is_poisoned: bool,
}

/// Outcome of applying one night effect to the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectOutcome {
    Applied,
    Blocked { reason: String },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Good,
    Evil,
}

impl Side {
    pub fn label(self) -> &'static str {
        match self {
            Side::Good => "Good",
            Side::Evil => "Evil",
        }
    }
}

/// Terminal once set; seats may still be edited afterwards but the
/// outcome does not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinResult {
    pub winner: Side,
    pub reason: String,
}
