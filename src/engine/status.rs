//! Per-seat transient status tracking: poison, drunkenness, and their
//! clearing triggers. Pure functions over a borrowed seat; missing
//! roles or empty status lists mean "no effect", never an error.

use crate::model::seat::{ClearTrigger, Seat, StatusDuration, StatusEffect, StatusKind};

fn status_label(kind: StatusKind, source: &str) -> String {
    match kind {
        StatusKind::Poisoned => format!("Poisoned ({source})"),
        StatusKind::Drunk => format!("Drunk ({source})"),
        StatusKind::ExecutionProof => format!("Cannot be executed ({source})"),
    }
}

/// Effective poison state: the explicit flag OR any live poison entry,
/// permanent poison included.
pub fn computed_poisoned(seat: &Seat) -> bool {
    seat.is_poisoned || seat.statuses.iter().any(|s| s.effect == StatusKind::Poisoned)
}

fn computed_drunk(seat: &Seat) -> bool {
    if seat.is_drunk {
        return true;
    }
    if seat.statuses.iter().any(|s| s.effect == StatusKind::Drunk) {
        return true;
    }
    seat.role.as_ref().map(|r| r.always_drunk).unwrap_or(false)
}

/// The single gate every effect path checks before doing its real
/// work. A disabled actor still wakes; its effect becomes a no-op or a
/// misinformed result. `known_poisoned` lets a caller that already
/// computed poison reuse the answer.
pub fn actor_disabled(seat: &Seat, known_poisoned: Option<bool>) -> bool {
    let poisoned = known_poisoned.unwrap_or_else(|| computed_poisoned(seat));
    poisoned || computed_drunk(seat)
}

/// Appends a poison mark. Marks from different sources stack; one
/// curing does not cancel another's.
pub fn add_poison_mark(seat: &mut Seat, source: &str, duration: StatusDuration) {
    seat.statuses.push(StatusEffect {
        effect: StatusKind::Poisoned,
        duration,
        source: source.to_string(),
    });
    seat.status_details
        .push(status_label(StatusKind::Poisoned, source));
}

/// Appends a drunk mark, replacing any prior mark from the same source
/// kind: re-application refreshes rather than stacks.
pub fn add_drunk_mark(seat: &mut Seat, source_kind: &str, clear: ClearTrigger) {
    let stale = status_label(StatusKind::Drunk, source_kind);
    seat.statuses
        .retain(|s| !(s.effect == StatusKind::Drunk && s.source == source_kind));
    seat.status_details.retain(|d| d != &stale);

    seat.statuses.push(StatusEffect {
        effect: StatusKind::Drunk,
        duration: StatusDuration::Until(clear),
        source: source_kind.to_string(),
    });
    seat.status_details
        .push(status_label(StatusKind::Drunk, source_kind));
}

pub fn add_execution_proof(seat: &mut Seat, source: &str, duration: StatusDuration) {
    seat.statuses.push(StatusEffect {
        effect: StatusKind::ExecutionProof,
        duration,
        source: source.to_string(),
    });
    seat.status_details
        .push(status_label(StatusKind::ExecutionProof, source));
}

/// Drops every status timed to this boundary.
pub fn clear_expired(seat: &mut Seat, trigger: ClearTrigger) {
    let expired: Vec<String> = seat
        .statuses
        .iter()
        .filter(|s| s.duration == StatusDuration::Until(trigger))
        .map(|s| status_label(s.effect, &s.source))
        .collect();
    seat.statuses
        .retain(|s| s.duration != StatusDuration::Until(trigger));
    for label in expired {
        if let Some(pos) = seat.status_details.iter().position(|d| d == &label) {
            seat.status_details.remove(pos);
        }
    }
}

/// Full reset for a role swap, resurrection, or restart: all transient
/// flags and conversions go back to baseline. Permanent poison
/// survives; death state survives only when asked to.
pub fn cleanse_seat(seat: &mut Seat, keep_death_state: bool) {
    seat.statuses.retain(|s| {
        s.effect == StatusKind::Poisoned && s.duration == StatusDuration::Permanent
    });
    seat.status_details = seat
        .statuses
        .iter()
        .map(|s| status_label(s.effect, &s.source))
        .collect();

    seat.is_poisoned = false;
    seat.is_drunk = false;
    seat.protected_by = None;
    seat.marked_by.clear();
    seat.power_spent = false;
    seat.day_power_used_today = false;
    seat.is_evil_converted = false;
    seat.is_good_converted = false;
    seat.is_demon_successor = false;

    if !keep_death_state {
        seat.is_dead = false;
    }
}
