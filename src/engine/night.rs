//! The night wake queue and per-step resolution. Each step yields a
//! hint (what the storyteller does and says) plus the effects to
//! apply. Hints only format text and queue data; every mutation goes
//! through `effects::apply_effect`.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::engine::docs::RoleDocs;
use crate::engine::effects::NightEffect;
use crate::engine::registration::{registered_as_demon, RegistrationCache};
use crate::engine::status::{actor_disabled, computed_poisoned};
use crate::model::game_state::GameState;
use crate::model::results::NightInfoResult;
use crate::model::role::{Role, RolePower};
use crate::model::seat::{ClearTrigger, Seat, StatusDuration};
use crate::model::settings::RuleSettings;

/// Last hint produced per role id. Stepping backward redisplays this
/// instead of re-resolving, so a random draw never changes on
/// navigation. Cleared on restart; restored verbatim on undo.
pub type HintCache = HashMap<String, NightInfoResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueueState {
    #[default]
    Idle,
    Queued,
    Stepping(usize),
    Complete,
}

/// One night's ordered wake sequence and position.
#[derive(Debug, Clone, Default)]
pub struct NightQueue {
    pub order: Vec<usize>,
    pub state: QueueState,
}

impl NightQueue {
    pub fn build(&mut self, seats: &[Seat], night: u32) {
        self.order = wake_order(seats, night);
        self.state = QueueState::Queued;
        debug!(night, queue = ?self.order, "wake queue built");
    }

    /// Moves into the first step, or straight to complete on an empty
    /// queue.
    pub fn begin(&mut self) -> Option<usize> {
        self.state = if self.order.is_empty() {
            QueueState::Complete
        } else {
            QueueState::Stepping(0)
        };
        self.current()
    }

    pub fn current(&self) -> Option<usize> {
        match self.state {
            QueueState::Stepping(i) => self.order.get(i).copied(),
            _ => None,
        }
    }

    pub fn advance(&mut self) -> Option<usize> {
        if let QueueState::Stepping(i) = self.state {
            if i + 1 < self.order.len() {
                self.state = QueueState::Stepping(i + 1);
            } else {
                self.state = QueueState::Complete;
            }
        }
        self.current()
    }

    pub fn is_complete(&self) -> bool {
        self.state == QueueState::Complete
    }
}

/// The role a seat acts as at night. The always-drunk role wakes and
/// behaves as its charade role; its effects are disabled elsewhere.
pub fn night_role(seat: &Seat) -> Option<&Role> {
    let role = seat.role.as_ref()?;
    if role.always_drunk {
        return seat.charade_role.as_ref().or(Some(role));
    }
    Some(role)
}

fn wake_order(seats: &[Seat], night: u32) -> Vec<usize> {
    let mut entries: Vec<(u32, usize)> = seats
        .iter()
        .filter_map(|seat| {
            let acting = night_role(seat)?;
            let action = acting.night_action?;
            if night < action.first_active_night {
                return None;
            }
            let true_role = seat.role.as_ref()?;
            if seat.is_dead && !true_role.has_power_even_dead {
                return None;
            }
            Some((action.wake_order, seat.id))
        })
        .collect();
    entries.sort_unstable();
    entries.into_iter().map(|(_, id)| id).collect()
}

/// A resolved wake step: the storyteller hint and the queued effects.
#[derive(Debug, Clone, PartialEq)]
pub struct NightStep {
    pub info: NightInfoResult,
    pub effects: Vec<NightEffect>,
}

/// The deliberately wrong answer for a disabled information role. For
/// a presence question the only plausible-but-incorrect answer is the
/// negation; it must never equal the true one.
fn misinformed_answer(truth: bool) -> bool {
    !truth
}

/// Resolves the wake step for one seat. Reads the table, never writes
/// it; the returned effects carry every mutation.
pub fn resolve_step<R: Rng>(
    state: &GameState,
    seat_id: usize,
    targets: &[usize],
    settings: &RuleSettings,
    docs: &dyn RoleDocs,
    reg_cache: &mut RegistrationCache,
    rng: &mut R,
) -> NightStep {
    let empty = |seat| NightStep {
        info: NightInfoResult {
            seat,
            action: String::new(),
            speak: String::new(),
            guide: String::new(),
            is_poisoned: false,
        },
        effects: Vec::new(),
    };
    let Some(seat) = state.seat(seat_id) else {
        return empty(seat_id);
    };
    let Some(acting) = night_role(seat) else {
        return empty(seat_id);
    };

    let poisoned = computed_poisoned(seat);
    let disabled = actor_disabled(seat, Some(poisoned));

    let mut action = String::new();
    let mut speak = String::new();
    let mut guide = docs.guide(&acting.name).unwrap_or_default();
    let mut effects = Vec::new();

    match acting.power {
        RolePower::Venom => {
            push_line(
                &mut action,
                &format!("Wake the {}. They point at one seat.", acting.name),
            );
            speak = "Choose who drinks your venom tonight.".into();
            if let Some(&target) = targets.first() {
                if disabled {
                    push_line(
                        &mut guide,
                        "Their venom is spoiled tonight; accept the choice, mark nothing.",
                    );
                } else {
                    effects.push(NightEffect::Poison {
                        target,
                        source: seat_id,
                        source_role: acting.id.clone(),
                        duration: StatusDuration::Until(ClearTrigger::Dusk),
                    });
                    push_line(
                        &mut action,
                        &format!("Seat {target} is poisoned until dusk tomorrow."),
                    );
                }
            } else {
                push_line(&mut action, "No seat chosen yet.");
            }
        }

        RolePower::Safeguard => {
            push_line(
                &mut action,
                &format!("Wake the {}. They point at one seat to shield.", acting.name),
            );
            speak = "Choose who you watch over tonight.".into();
            if let Some(&target) = targets.first() {
                if disabled {
                    push_line(
                        &mut guide,
                        "Their shield is spoiled tonight; accept the choice, mark nothing.",
                    );
                } else {
                    effects.push(NightEffect::Safeguard {
                        target,
                        protector: seat_id,
                    });
                    push_line(&mut action, &format!("Seat {target} is safe until dawn."));
                }
            } else {
                push_line(&mut action, "No seat chosen yet.");
            }
        }

        RolePower::Strike => {
            push_line(
                &mut action,
                &format!(
                    "Wake the {}. They point at one seat, or shake their head to decline.",
                    acting.name
                ),
            );
            speak = "Choose your prey, or decline.".into();
            if let Some(&target) = targets.first() {
                if disabled {
                    push_line(
                        &mut guide,
                        "The strike fails tonight; accept the choice, nobody dies by it.",
                    );
                } else {
                    effects.push(NightEffect::Kill {
                        target,
                        source: seat_id,
                    });
                }
            } else {
                push_line(&mut action, "They declined; nobody is struck.");
            }
        }

        RolePower::Augury => {
            push_line(
                &mut action,
                &format!("Wake the {}. They point at two seats.", acting.name),
            );
            if targets.len() >= 2 {
                let chosen = &targets[..2];
                // The truth is always computed so the cached
                // registration rolls are drawn either way; a disabled
                // seer is answered from the misinformation path.
                let truth = chosen.iter().any(|&t| {
                    state
                        .seat(t)
                        .map(|target_seat| {
                            registered_as_demon(
                                target_seat,
                                Some(acting),
                                settings,
                                reg_cache,
                                rng,
                            )
                        })
                        .unwrap_or(false)
                });
                let answer = if disabled {
                    misinformed_answer(truth)
                } else {
                    truth
                };
                effects.push(NightEffect::MarkSeats {
                    source: seat_id,
                    targets: chosen.to_vec(),
                });
                speak = if answer {
                    "Yes. A demon stirs between those two.".into()
                } else {
                    "No. No demon sits there.".into()
                };
                if disabled {
                    push_line(&mut guide, "Their sight is clouded; the answer above is false.");
                }
            } else {
                push_line(&mut action, "Two seats are needed.");
            }
        }

        RolePower::TableSight => {
            push_line(
                &mut action,
                &format!("Wake the {}. Show them the whole table, then close it.", acting.name),
            );
            speak = "Look. Remember. Say nothing.".into();
        }

        // Day powers and passive roles never reach the night queue.
        RolePower::DayShot | RolePower::Inert => {}
    }

    NightStep {
        info: NightInfoResult {
            seat: seat_id,
            action,
            speak,
            guide,
            is_poisoned: poisoned,
        },
        effects,
    }
}

fn push_line(text: &mut String, line: &str) {
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(line);
}
