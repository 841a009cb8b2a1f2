use crate::model::results::{EffectOutcome, NightInfoResult, WinResult};

/// Everything the surrounding application can ask of the engine. One
/// command per discrete storyteller action; nothing is timer-driven.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    AssignRole {
        seat: usize,
        role: String,
        charade: Option<String>,
    },
    /// Mid-game role rewrite: cleanses the seat, keeps its death state.
    SwapRole {
        seat: usize,
        role: String,
    },
    BeginGame {
        force: bool,
    },
    /// Resolve the current wake step with the storyteller's selected
    /// targets, then advance.
    ConfirmStep {
        targets: Vec<usize>,
    },
    StepBack,
    GlobalUndo,
    UseDayPower {
        seat: usize,
        target: usize,
    },
    /// Dusk: execute a seat (or nobody) and move into the next night.
    EndDay {
        execute: Option<usize>,
    },
    Restart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineResponse {
    Ack,
    /// Setup validation failed; correct it or begin again with force.
    SetupRejected {
        reason: String,
    },
    NightBegun {
        night: u32,
        first_seat: Option<usize>,
    },
    StepInfo {
        info: NightInfoResult,
        outcomes: Vec<EffectOutcome>,
        next_seat: Option<usize>,
    },
    NightComplete,
    DayPowerResult {
        outcome: EffectOutcome,
    },
    GameOver {
        result: WinResult,
    },
    /// The command made no sense right now; nothing changed.
    Ignored {
        reason: String,
    },
}
