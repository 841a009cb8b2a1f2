//! Mutations queued by night steps, applied through one exhaustive
//! match. Apply never panics on odd input: an impossible target is
//! reported back as a skip, not a fault.

use tracing::{debug, info};

use crate::engine::neighbors::living_neighbors;
use crate::engine::status::{actor_disabled, add_poison_mark};
use crate::model::game_state::GameState;
use crate::model::results::EffectOutcome;
use crate::model::role::RoleType;
use crate::model::seat::StatusDuration;
use crate::model::settings::RuleSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum DeathCause {
    NightKill { source: usize },
    Execution,
    DayShot { source: usize },
}

/// A state mutation one wake step wants. Kept as data so the engine
/// can apply, log, and report each one.
#[derive(Debug, Clone, PartialEq)]
pub enum NightEffect {
    Poison {
        target: usize,
        source: usize,
        source_role: String,
        duration: StatusDuration,
    },
    Safeguard {
        target: usize,
        protector: usize,
    },
    MarkSeats {
        source: usize,
        targets: Vec<usize>,
    },
    Kill {
        target: usize,
        source: usize,
    },
}

pub fn apply_effect(
    state: &mut GameState,
    effect: NightEffect,
    settings: &RuleSettings,
) -> EffectOutcome {
    match effect {
        NightEffect::Poison {
            target,
            source,
            source_role,
            duration,
        } => {
            let Some(seat) = state.seat_mut(target) else {
                return EffectOutcome::Skipped {
                    reason: format!("no seat {target}"),
                };
            };
            add_poison_mark(seat, &source_role, duration);
            debug!(target, source, "poison mark applied");
            EffectOutcome::Applied
        }

        NightEffect::Safeguard { target, protector } => {
            let Some(seat) = state.seat_mut(target) else {
                return EffectOutcome::Skipped {
                    reason: format!("no seat {target}"),
                };
            };
            seat.protected_by = Some(protector);
            debug!(target, protector, "safeguard applied");
            EffectOutcome::Applied
        }

        NightEffect::MarkSeats { source, targets } => {
            for target in targets {
                if let Some(seat) = state.seat_mut(target) {
                    seat.marked_by.push(source);
                }
            }
            EffectOutcome::Applied
        }

        NightEffect::Kill { target, source } => {
            resolve_death(state, target, DeathCause::NightKill { source }, settings)
        }
    }
}

/// Shared death path for night kills, executions, and day shots.
/// Checks run in order: cause-specific protection, then the one-shot
/// survival, then the death itself and any demon succession.
pub fn resolve_death(
    state: &mut GameState,
    target: usize,
    cause: DeathCause,
    settings: &RuleSettings,
) -> EffectOutcome {
    let Some(seat) = state.seat(target) else {
        return EffectOutcome::Skipped {
            reason: format!("no seat {target}"),
        };
    };
    if seat.is_dead {
        return EffectOutcome::Skipped {
            reason: format!("seat {target} is already dead"),
        };
    }

    if let DeathCause::NightKill { .. } = cause {
        if seat.protected_by.is_some() {
            return EffectOutcome::Blocked {
                reason: format!("seat {target} is safeguarded tonight"),
            };
        }
        // A living neighbor with an active guard keeps good seats
        // alive through the night. The ring walk skips dead seats.
        if !seat.is_truly_evil() {
            let (left, right) = living_neighbors(&state.seats, target);
            for guard_id in [left, right].into_iter().flatten() {
                let guard = &state.seats[guard_id];
                let guards = guard
                    .role
                    .as_ref()
                    .map(|r| r.guards_neighbors)
                    .unwrap_or(false);
                if guards && !actor_disabled(guard, None) {
                    return EffectOutcome::Blocked {
                        reason: format!("guarded by the {} beside them", guard.role_name()),
                    };
                }
            }
        }
    }

    if cause == DeathCause::Execution
        && seat.has_status(crate::model::seat::StatusKind::ExecutionProof)
    {
        return EffectOutcome::Blocked {
            reason: format!("seat {target} cannot be executed"),
        };
    }

    let survives_first = seat
        .role
        .as_ref()
        .map(|r| r.survives_first_death)
        .unwrap_or(false);
    let was_demon = seat.true_type() == Some(RoleType::Demon) || seat.is_demon_successor;
    let name = seat.role_name().to_string();

    if survives_first && !seat.power_spent {
        if let Some(seat) = state.seat_mut(target) {
            seat.power_spent = true;
        }
        return EffectOutcome::Blocked {
            reason: format!("seat {target} shrugs off its first death"),
        };
    }

    if let Some(seat) = state.seat_mut(target) {
        seat.is_dead = true;
    }
    let cause_text = match cause {
        DeathCause::NightKill { .. } => "dies in the night",
        DeathCause::Execution => "is executed",
        DeathCause::DayShot { .. } => "is shot",
    };
    info!(target, cause = ?cause, "seat dies");
    state.log_line(format!("Seat {target} ({name}) {cause_text}."));

    if was_demon {
        succeed_demon(state, settings);
    }
    EffectOutcome::Applied
}

/// When the demon dies with enough of the table still alive, a living
/// successor inherits the mantle. A disabled successor misses its
/// moment.
fn succeed_demon(state: &mut GameState, settings: &RuleSettings) {
    if state.living_count() <= settings.evil_win_living_threshold {
        return;
    }
    let heir = state.seats.iter().find(|s| {
        !s.is_dead
            && !s.is_demon_successor
            && s.role.as_ref().map(|r| r.succeeds_demon).unwrap_or(false)
            && !actor_disabled(s, None)
    });
    if let Some(heir) = heir {
        let id = heir.id;
        let name = heir.role_name().to_string();
        if let Some(seat) = state.seat_mut(id) {
            seat.is_demon_successor = true;
        }
        info!(seat = id, "demon succession");
        state.log_line(format!("Seat {id} ({name}) inherits the demon's mantle."));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::status::add_execution_proof;
    use crate::model::role::Script;
    use crate::model::seat::{ClearTrigger, StatusDuration};

    fn table(roles: &[&str]) -> GameState {
        let script = Script::hollow_vale();
        let mut state = GameState::new(roles.len());
        for (i, id) in roles.iter().enumerate() {
            state.seats[i].role = script.role(id).cloned();
        }
        state
    }

    #[test]
    fn safeguard_blocks_the_night_kill() {
        let mut state = table(&["scribe", "fiend", "sentinel"]);
        state.seats[0].protected_by = Some(2);
        let out = apply_effect(
            &mut state,
            NightEffect::Kill { target: 0, source: 1 },
            &RuleSettings::default(),
        );
        assert!(matches!(out, EffectOutcome::Blocked { .. }));
        assert!(!state.seats[0].is_dead);
    }

    #[test]
    fn neighbor_guard_falls_back_past_a_dead_seat() {
        // Matron at seat 0, dead seat 1, target at seat 2: the walk
        // from 2 skips the corpse and still finds the guard.
        let mut state = table(&["matron", "scribe", "oracle", "fiend", "veteran"]);
        state.seats[1].is_dead = true;
        let out = resolve_death(
            &mut state,
            2,
            DeathCause::NightKill { source: 3 },
            &RuleSettings::default(),
        );
        assert!(matches!(out, EffectOutcome::Blocked { .. }));
        assert!(!state.seats[2].is_dead);
    }

    #[test]
    fn poisoned_guard_does_not_protect() {
        let mut state = table(&["matron", "oracle", "fiend", "scribe", "scribe"]);
        add_poison_mark(
            &mut state.seats[0],
            "venomancer",
            StatusDuration::Until(ClearTrigger::Dusk),
        );
        let out = resolve_death(
            &mut state,
            1,
            DeathCause::NightKill { source: 2 },
            &RuleSettings::default(),
        );
        assert_eq!(out, EffectOutcome::Applied);
        assert!(state.seats[1].is_dead);
    }

    #[test]
    fn guard_does_not_cover_evil_neighbors() {
        let mut state = table(&["matron", "venomancer", "fiend", "scribe", "scribe"]);
        let out = resolve_death(
            &mut state,
            1,
            DeathCause::NightKill { source: 2 },
            &RuleSettings::default(),
        );
        assert_eq!(out, EffectOutcome::Applied);
    }

    #[test]
    fn execution_proof_stops_execution_but_not_the_night_kill() {
        let mut state = table(&["scribe", "fiend", "oracle", "scribe", "scribe"]);
        add_execution_proof(&mut state.seats[0], "rite", StatusDuration::Permanent);
        let out = resolve_death(&mut state, 0, DeathCause::Execution, &RuleSettings::default());
        assert!(matches!(out, EffectOutcome::Blocked { .. }));
        let out = resolve_death(
            &mut state,
            0,
            DeathCause::NightKill { source: 1 },
            &RuleSettings::default(),
        );
        assert_eq!(out, EffectOutcome::Applied);
    }

    #[test]
    fn first_death_grit_is_consumed_once() {
        let mut state = table(&["veteran", "fiend", "oracle", "scribe", "scribe"]);
        let out = resolve_death(
            &mut state,
            0,
            DeathCause::NightKill { source: 1 },
            &RuleSettings::default(),
        );
        assert!(matches!(out, EffectOutcome::Blocked { .. }));
        assert!(state.seats[0].power_spent);
        assert!(!state.seats[0].is_dead);

        let out = resolve_death(&mut state, 0, DeathCause::Execution, &RuleSettings::default());
        assert_eq!(out, EffectOutcome::Applied);
        assert!(state.seats[0].is_dead);
    }

    #[test]
    fn demon_death_converts_the_heiress_when_enough_live() {
        let mut state = table(&["fiend", "heiress", "oracle", "scribe", "matron"]);
        let out = resolve_death(&mut state, 0, DeathCause::Execution, &RuleSettings::default());
        assert_eq!(out, EffectOutcome::Applied);
        assert!(state.seats[1].is_demon_successor);
        assert!(state.seats[1].is_truly_evil());
    }

    #[test]
    fn no_succession_below_the_living_threshold() {
        let mut state = table(&["fiend", "heiress", "oracle", "scribe", "matron"]);
        state.seats[3].is_dead = true;
        state.seats[4].is_dead = true;
        // Three alive before the kill, two after: at the threshold.
        let out = resolve_death(&mut state, 0, DeathCause::Execution, &RuleSettings::default());
        assert_eq!(out, EffectOutcome::Applied);
        assert!(!state.seats[1].is_demon_successor);
    }

    #[test]
    fn dead_targets_are_skipped_not_errors() {
        let mut state = table(&["scribe", "fiend"]);
        state.seats[0].is_dead = true;
        let out = resolve_death(
            &mut state,
            0,
            DeathCause::NightKill { source: 1 },
            &RuleSettings::default(),
        );
        assert!(matches!(out, EffectOutcome::Skipped { .. }));
    }
}
