use serde::{Deserialize, Serialize};

use crate::model::results::WinResult;
use crate::model::seat::Seat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Setup,
    Night,
    Day,
    GameOver,
}

impl GamePhase {
    pub fn label(self) -> &'static str {
        match self {
            GamePhase::Setup => "Setup",
            GamePhase::Night => "Night",
            GamePhase::Day => "Day",
            GamePhase::GameOver => "Game over",
        }
    }
}

/// Free-text log line for the external history/record component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub phase: String,
    pub text: String,
}

/// The single mutable store everything resolves against. Components
/// borrow it per call; only the engine holds it long-term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub seats: Vec<Seat>,
    pub phase: GamePhase,
    /// Current night number; 0 until the first night begins.
    pub night: u32,
    pub day: u32,
    pub win: Option<WinResult>,
    pub log: Vec<LogEntry>,
}

impl GameState {
    pub fn new(seat_count: usize) -> Self {
        Self {
            seats: (0..seat_count).map(Seat::empty).collect(),
            phase: GamePhase::Setup,
            night: 0,
            day: 0,
            win: None,
            log: Vec::new(),
        }
    }

    pub fn seat(&self, id: usize) -> Option<&Seat> {
        self.seats.get(id)
    }

    pub fn seat_mut(&mut self, id: usize) -> Option<&mut Seat> {
        self.seats.get_mut(id)
    }

    pub fn living_count(&self) -> usize {
        self.seats.iter().filter(|s| !s.is_dead).count()
    }

    pub fn log_line(&mut self, text: impl Into<String>) {
        let phase = match self.phase {
            GamePhase::Night => format!("Night {}", self.night),
            GamePhase::Day => format!("Day {}", self.day),
            other => other.label().to_string(),
        };
        self.log.push(LogEntry {
            phase,
            text: text.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_empty_setup() {
        let state = GameState::new(7);
        assert_eq!(state.seats.len(), 7);
        assert_eq!(state.phase, GamePhase::Setup);
        assert_eq!(state.living_count(), 7);
        assert!(state.win.is_none());
    }

    #[test]
    fn log_lines_carry_the_phase_label() {
        let mut state = GameState::new(5);
        state.phase = GamePhase::Night;
        state.night = 2;
        state.log_line("the Fiend strikes");
        assert_eq!(state.log[0].phase, "Night 2");
    }
}
