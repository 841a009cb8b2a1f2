//! The engine: owns the game state, the caches, and the history
//! stack, and resolves one storyteller command at a time. Everything
//! is synchronous; the table only changes inside `handle`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::engine::docs::{NoDocs, RoleDocs};
use crate::engine::effects::{apply_effect, resolve_death, DeathCause, NightEffect};
use crate::engine::night::{resolve_step, HintCache, NightQueue};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::records::{append_record, GameRecord};
use crate::engine::registration::{registered_as_demon, RegistrationCache};
use crate::engine::setup::validate;
use crate::engine::status::{actor_disabled, cleanse_seat, clear_expired};
use crate::engine::win::evaluate;
use crate::model::game_state::{GamePhase, GameState};
use crate::model::results::{EffectOutcome, NightInfoResult, WinResult};
use crate::model::role::{RolePower, Script};
use crate::model::seat::ClearTrigger;
use crate::model::settings::RuleSettings;

/// One undo step: everything a mutating action could have touched,
/// deep-copied. Restored verbatim, so navigation never redraws
/// randomness.
#[derive(Debug, Clone)]
struct GameSnapshot {
    state: GameState,
    queue: NightQueue,
    hints: HintCache,
}

pub struct Engine {
    state: GameState,
    script: Script,
    settings: RuleSettings,
    queue: NightQueue,
    reg_cache: RegistrationCache,
    hints: HintCache,
    history: Vec<GameSnapshot>,
    docs: Box<dyn RoleDocs>,
    rng: StdRng,
}

impl Engine {
    pub fn new(script: Script, seat_count: usize, settings: RuleSettings) -> Self {
        Self::with_docs(script, seat_count, settings, Box::new(NoDocs))
    }

    pub fn with_docs(
        script: Script,
        seat_count: usize,
        settings: RuleSettings,
        docs: Box<dyn RoleDocs>,
    ) -> Self {
        Self {
            state: GameState::new(seat_count),
            script,
            settings,
            queue: NightQueue::default(),
            reg_cache: RegistrationCache::new(),
            hints: HintCache::new(),
            history: Vec::new(),
            docs,
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixes the dice, so a table can be replayed move for move.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn handle(&mut self, cmd: EngineCommand) -> EngineResponse {
        match cmd {
            EngineCommand::AssignRole { seat, role, charade } => {
                self.assign_role(seat, &role, charade.as_deref())
            }
            EngineCommand::SwapRole { seat, role } => self.swap_role(seat, &role),
            EngineCommand::BeginGame { force } => self.begin_game(force),
            EngineCommand::ConfirmStep { targets } => self.confirm_step(&targets),
            EngineCommand::StepBack => self.step_back(),
            EngineCommand::GlobalUndo => self.global_undo(),
            EngineCommand::UseDayPower { seat, target } => self.use_day_power(seat, target),
            EngineCommand::EndDay { execute } => self.end_day(execute),
            EngineCommand::Restart => self.restart(),
        }
    }

    fn snapshot(&mut self) {
        self.history.push(GameSnapshot {
            state: self.state.clone(),
            queue: self.queue.clone(),
            hints: self.hints.clone(),
        });
    }

    fn restore(&mut self, snapshot: GameSnapshot) {
        self.state = snapshot.state;
        self.queue = snapshot.queue;
        self.hints = snapshot.hints;
        // Registration entries belong to one night; if the restore
        // crossed a night boundary they are stale.
        if self.reg_cache.night() != self.state.night {
            self.reg_cache.begin_night(self.state.night);
        }
    }

    fn assign_role(&mut self, seat: usize, role: &str, charade: Option<&str>) -> EngineResponse {
        let Some(role) = self.script.role(role).cloned() else {
            return EngineResponse::Ignored {
                reason: format!("no role '{role}' in {}", self.script.name),
            };
        };
        let charade_role = match charade {
            Some(id) => match self.script.role(id).cloned() {
                Some(r) => Some(r),
                None => {
                    return EngineResponse::Ignored {
                        reason: format!("no charade role '{id}' in {}", self.script.name),
                    }
                }
            },
            None => None,
        };
        let Some(seat) = self.state.seat_mut(seat) else {
            return EngineResponse::Ignored {
                reason: format!("no seat {seat}"),
            };
        };
        seat.role = Some(role);
        seat.charade_role = charade_role;
        EngineResponse::Ack
    }

    fn swap_role(&mut self, seat_id: usize, role: &str) -> EngineResponse {
        let Some(role) = self.script.role(role).cloned() else {
            return EngineResponse::Ignored {
                reason: format!("no role '{role}' in {}", self.script.name),
            };
        };
        if self.state.seat(seat_id).is_none() {
            return EngineResponse::Ignored {
                reason: format!("no seat {seat_id}"),
            };
        }
        self.snapshot();
        let name = role.name.clone();
        if let Some(seat) = self.state.seat_mut(seat_id) {
            cleanse_seat(seat, true);
            seat.role = Some(role);
            seat.charade_role = None;
        }
        self.state
            .log_line(format!("Seat {seat_id} becomes the {name}."));
        EngineResponse::Ack
    }

    fn begin_game(&mut self, force: bool) -> EngineResponse {
        if self.state.phase != GamePhase::Setup {
            return EngineResponse::Ignored {
                reason: "the game is already underway".into(),
            };
        }
        if let Err(err) = validate(&self.state.seats) {
            if !force {
                return EngineResponse::SetupRejected {
                    reason: err.to_string(),
                };
            }
            self.state
                .log_line(format!("Setup overridden by the storyteller: {err}."));
        }
        info!(seats = self.state.seats.len(), "game begins");
        self.state.log_line("The game begins.");
        self.begin_night()
    }

    fn begin_night(&mut self) -> EngineResponse {
        self.state.night += 1;
        self.state.phase = GamePhase::Night;
        self.reg_cache.begin_night(self.state.night);
        self.queue.build(&self.state.seats, self.state.night);
        let first_seat = self.queue.begin();
        self.state.log_line("Night falls.");
        EngineResponse::NightBegun {
            night: self.state.night,
            first_seat,
        }
    }

    fn begin_day(&mut self) {
        self.state.phase = GamePhase::Day;
        self.state.day += 1;
        for seat in &mut self.state.seats {
            clear_expired(seat, ClearTrigger::Dawn);
            seat.protected_by = None;
            seat.marked_by.clear();
            seat.day_power_used_today = false;
        }
        self.state.log_line("Dawn breaks.");
    }

    fn confirm_step(&mut self, targets: &[usize]) -> EngineResponse {
        if self.state.phase != GamePhase::Night {
            return EngineResponse::Ignored {
                reason: "no night step to confirm".into(),
            };
        }
        let Some(seat_id) = self.queue.current() else {
            self.begin_day();
            return EngineResponse::NightComplete;
        };

        let step = resolve_step(
            &self.state,
            seat_id,
            targets,
            &self.settings,
            self.docs.as_ref(),
            &mut self.reg_cache,
            &mut self.rng,
        );
        if let Some(role_id) = self.state.seat(seat_id).and_then(|s| s.role_id()) {
            let role_id = role_id.to_string();
            self.hints.insert(role_id, step.info.clone());
        }
        // Snapshot after the hint is cached but before anything is
        // applied: stepping back then lands on this step with its own
        // hint available for redisplay.
        self.snapshot();

        let mut deadly = false;
        let mut outcomes = Vec::new();
        for effect in step.effects {
            if matches!(effect, NightEffect::Kill { .. }) {
                deadly = true;
            }
            outcomes.push(apply_effect(&mut self.state, effect, &self.settings));
        }

        if deadly {
            if let Some(result) = self.decide(None) {
                return EngineResponse::GameOver { result };
            }
        }

        let next_seat = self.queue.advance();
        EngineResponse::StepInfo {
            info: step.info,
            outcomes,
            next_seat,
        }
    }

    fn step_back(&mut self) -> EngineResponse {
        if self.state.phase != GamePhase::Night {
            return EngineResponse::Ignored {
                reason: "stepping back only works at night".into(),
            };
        }
        let Some(snapshot) = self.history.pop() else {
            return EngineResponse::Ignored {
                reason: "nothing to step back to".into(),
            };
        };
        self.restore(snapshot);
        let current = self.queue.current();
        // Redisplay the cached hint; re-resolving could draw a
        // different random outcome.
        let info = current
            .and_then(|id| self.state.seat(id))
            .and_then(|s| s.role_id())
            .and_then(|role_id| self.hints.get(role_id).cloned())
            .unwrap_or_else(|| NightInfoResult {
                seat: current.unwrap_or(0),
                action: String::new(),
                speak: String::new(),
                guide: String::new(),
                is_poisoned: false,
            });
        EngineResponse::StepInfo {
            info,
            outcomes: Vec::new(),
            next_seat: current,
        }
    }

    fn global_undo(&mut self) -> EngineResponse {
        let Some(snapshot) = self.history.pop() else {
            return EngineResponse::Ignored {
                reason: "nothing to undo".into(),
            };
        };
        self.restore(snapshot);
        EngineResponse::Ack
    }

    fn use_day_power(&mut self, seat_id: usize, target: usize) -> EngineResponse {
        if self.state.phase != GamePhase::Day {
            return EngineResponse::Ignored {
                reason: "day powers only work during the day".into(),
            };
        }
        let Some(seat) = self.state.seat(seat_id) else {
            return EngineResponse::Ignored {
                reason: format!("no seat {seat_id}"),
            };
        };
        let Some(role) = seat.role.clone() else {
            return EngineResponse::Ignored {
                reason: format!("seat {seat_id} has no role"),
            };
        };
        let Some(day_power) = role.day_power.clone() else {
            return EngineResponse::Ignored {
                reason: format!("the {} has no day power", role.name),
            };
        };
        if seat.is_dead {
            return EngineResponse::Ignored {
                reason: "the dead keep their silence".into(),
            };
        }
        if (day_power.once_per_game && seat.power_spent) || seat.day_power_used_today {
            return EngineResponse::Ignored {
                reason: format!("the {} is already spent", day_power.name),
            };
        }

        self.snapshot();
        if let Some(seat) = self.state.seat_mut(seat_id) {
            seat.day_power_used_today = true;
            if day_power.once_per_game {
                seat.power_spent = true;
            }
        }

        let outcome = match role.power {
            RolePower::DayShot => {
                let disabled = self
                    .state
                    .seat(seat_id)
                    .map(|s| actor_disabled(s, None))
                    .unwrap_or(true);
                let hits = !disabled
                    && self
                        .state
                        .seat(target)
                        .map(|t| {
                            registered_as_demon(
                                t,
                                Some(&role),
                                &self.settings,
                                &mut self.reg_cache,
                                &mut self.rng,
                            )
                        })
                        .unwrap_or(false);
                self.state
                    .log_line(format!("Seat {seat_id} ({}) takes the shot.", role.name));
                if hits {
                    resolve_death(
                        &mut self.state,
                        target,
                        DeathCause::DayShot { source: seat_id },
                        &self.settings,
                    )
                } else {
                    self.state.log_line("Nothing happens.".to_string());
                    EffectOutcome::Skipped {
                        reason: "the shot goes wide".into(),
                    }
                }
            }
            _ => EffectOutcome::Skipped {
                reason: format!("the {} has nothing to do by day", role.name),
            },
        };

        if outcome == EffectOutcome::Applied {
            if let Some(result) = self.decide(None) {
                return EngineResponse::GameOver { result };
            }
        }
        EngineResponse::DayPowerResult { outcome }
    }

    fn end_day(&mut self, execute: Option<usize>) -> EngineResponse {
        if self.state.phase != GamePhase::Day {
            return EngineResponse::Ignored {
                reason: "no day to end".into(),
            };
        }
        self.snapshot();

        let mut executed = None;
        if let Some(target) = execute {
            let outcome = resolve_death(&mut self.state, target, DeathCause::Execution, &self.settings);
            if outcome == EffectOutcome::Applied {
                executed = Some(target);
            } else if let EffectOutcome::Blocked { reason } = &outcome {
                self.state.log_line(format!("The execution fails: {reason}."));
            }
        } else {
            self.state.log_line("The day ends without an execution.");
        }

        if let Some(result) = self.decide(executed) {
            return EngineResponse::GameOver { result };
        }

        // Dusk boundary: day-spanning statuses (yesterday's venom)
        // run out here, after the execution has resolved.
        for seat in &mut self.state.seats {
            clear_expired(seat, ClearTrigger::Dusk);
        }
        self.begin_night()
    }

    /// Runs the evaluator once and makes any verdict terminal.
    fn decide(&mut self, executed: Option<usize>) -> Option<WinResult> {
        if self.state.win.is_some() {
            return self.state.win.clone();
        }
        let result = evaluate(&self.state.seats, executed, &self.settings)?;
        self.state.win = Some(result.clone());
        self.state.phase = GamePhase::GameOver;
        self.state
            .log_line(format!("{} wins: {}", result.winner.label(), result.reason));
        if let Err(err) = append_record(GameRecord {
            script: self.script.name.clone(),
            result: Some(result.clone()),
            log: self.state.log.clone(),
        }) {
            warn!(error = %err, "could not append the game record");
        }
        Some(result)
    }

    fn restart(&mut self) -> EngineResponse {
        for seat in &mut self.state.seats {
            cleanse_seat(seat, false);
        }
        self.state.phase = GamePhase::Setup;
        self.state.night = 0;
        self.state.day = 0;
        self.state.win = None;
        self.state.log.clear();
        self.history.clear();
        self.hints.clear();
        self.reg_cache = RegistrationCache::new();
        self.queue = NightQueue::default();
        info!("table reset");
        EngineResponse::Ack
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_player_engine() -> Engine {
        let mut engine = Engine::new(Script::hollow_vale(), 5, RuleSettings::default());
        engine.seed_rng(42);
        for (seat, role) in [
            (0, "oracle"),
            (1, "matron"),
            (2, "scribe"),
            (3, "venomancer"),
            (4, "fiend"),
        ] {
            let resp = engine.handle(EngineCommand::AssignRole {
                seat,
                role: role.into(),
                charade: None,
            });
            assert_eq!(resp, EngineResponse::Ack);
        }
        engine
    }

    #[test]
    fn begin_game_validates_and_can_be_overridden() {
        let mut engine = Engine::new(Script::hollow_vale(), 5, RuleSettings::default());
        engine.seed_rng(1);
        for seat in 0..5 {
            engine.handle(EngineCommand::AssignRole {
                seat,
                role: "scribe".into(),
                charade: None,
            });
        }
        let resp = engine.handle(EngineCommand::BeginGame { force: false });
        assert!(matches!(resp, EngineResponse::SetupRejected { .. }));
        assert_eq!(engine.state().phase, GamePhase::Setup);

        let resp = engine.handle(EngineCommand::BeginGame { force: true });
        assert!(matches!(resp, EngineResponse::NightBegun { night: 1, .. }));
    }

    #[test]
    fn a_first_night_walks_venomancer_then_oracle() {
        let mut engine = five_player_engine();
        let resp = engine.handle(EngineCommand::BeginGame { force: false });
        assert!(matches!(resp, EngineResponse::NightBegun { night: 1, .. }));

        // Venomancer poisons the oracle.
        let resp = engine.handle(EngineCommand::ConfirmStep { targets: vec![0] });
        let EngineResponse::StepInfo { info, outcomes, next_seat } = resp else {
            panic!("expected a step");
        };
        assert!(info.action.contains("Venomancer"));
        assert_eq!(outcomes, vec![EffectOutcome::Applied]);
        assert_eq!(next_seat, Some(0));
        assert!(crate::engine::status::computed_poisoned(&engine.state().seats[0]));

        // The poisoned oracle gets the misinformation path.
        let resp = engine.handle(EngineCommand::ConfirmStep { targets: vec![4, 2] });
        let EngineResponse::StepInfo { info, .. } = resp else {
            panic!("expected a step");
        };
        assert!(info.is_poisoned);
        assert!(info.speak.starts_with("No"));

        // Queue exhausted: the next confirm turns the page to day.
        let resp = engine.handle(EngineCommand::ConfirmStep { targets: vec![] });
        assert_eq!(resp, EngineResponse::NightComplete);
        assert_eq!(engine.state().phase, GamePhase::Day);
    }

    #[test]
    fn step_back_redisplays_the_cached_hint() {
        let mut engine = five_player_engine();
        engine.handle(EngineCommand::BeginGame { force: false });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![2] });
        let resp = engine.handle(EngineCommand::ConfirmStep { targets: vec![4, 2] });
        let EngineResponse::StepInfo { info: first, .. } = resp else {
            panic!("expected a step");
        };

        let resp = engine.handle(EngineCommand::StepBack);
        let EngineResponse::StepInfo { info: replay, next_seat, .. } = resp else {
            panic!("expected a replay");
        };
        assert_eq!(next_seat, Some(0));
        assert_eq!(replay, first);
    }

    #[test]
    fn undo_with_no_history_is_a_no_op() {
        let mut engine = five_player_engine();
        let resp = engine.handle(EngineCommand::GlobalUndo);
        assert!(matches!(resp, EngineResponse::Ignored { .. }));
        assert_eq!(engine.state().phase, GamePhase::Setup);
    }

    #[test]
    fn the_poison_runs_out_at_the_second_dusk() {
        let mut engine = five_player_engine();
        engine.handle(EngineCommand::BeginGame { force: false });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![0] });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![1, 2] });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![] });
        assert!(crate::engine::status::computed_poisoned(&engine.state().seats[0]));

        // Dusk: the venom from night one clears on the way into
        // night two.
        let resp = engine.handle(EngineCommand::EndDay { execute: None });
        assert!(matches!(resp, EngineResponse::NightBegun { night: 2, .. }));
        assert!(!crate::engine::status::computed_poisoned(&engine.state().seats[0]));
    }

    #[test]
    fn good_wins_once_the_last_evil_seat_is_executed() {
        let mut engine = five_player_engine();
        engine.handle(EngineCommand::BeginGame { force: false });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![2] });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![1, 2] });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![] });

        // Executing the Fiend is not enough while the Venomancer
        // breathes.
        let resp = engine.handle(EngineCommand::EndDay { execute: Some(4) });
        assert!(matches!(resp, EngineResponse::NightBegun { night: 2, .. }));
        assert!(engine.state().seats[4].is_dead);

        engine.handle(EngineCommand::ConfirmStep { targets: vec![0] });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![1, 2] });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![] });

        let resp = engine.handle(EngineCommand::EndDay { execute: Some(3) });
        let EngineResponse::GameOver { result } = resp else {
            panic!("expected the game to end, got {resp:?}");
        };
        assert_eq!(result.winner, crate::model::results::Side::Good);
        assert_eq!(engine.state().phase, GamePhase::GameOver);

        // The verdict is terminal; further commands change nothing.
        let resp = engine.handle(EngineCommand::EndDay { execute: None });
        assert!(matches!(resp, EngineResponse::Ignored { .. }));
    }

    #[test]
    fn restart_returns_to_setup_and_keeps_roles() {
        let mut engine = five_player_engine();
        engine.handle(EngineCommand::BeginGame { force: false });
        engine.handle(EngineCommand::ConfirmStep { targets: vec![0] });
        engine.handle(EngineCommand::Restart);

        let state = engine.state();
        assert_eq!(state.phase, GamePhase::Setup);
        assert_eq!(state.night, 0);
        assert!(state.log.is_empty());
        assert_eq!(state.seats[3].role_id(), Some("venomancer"));
        assert!(!crate::engine::status::computed_poisoned(&state.seats[0]));
    }
}
