use serde::{Deserialize, Serialize};

use crate::model::role::{Role, RoleType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Poisoned,
    Drunk,
    ExecutionProof,
}

/// Phase boundary at which a timed status clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearTrigger {
    Dusk,
    Dawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDuration {
    Permanent,
    Until(ClearTrigger),
}

/// One structured status entry. `source` names where the mark came
/// from (a role id, usually) so re-application and cleansing can tell
/// marks from different origins apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub effect: StatusKind,
    pub duration: StatusDuration,
    pub source: String,
}

/// One table position and its full mutable game state. Seats are owned
/// by the game state store; resolution code borrows them per call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seat {
    pub id: usize,
    pub role: Option<Role>,
    /// Second identity some roles are secretly given (the Sot is told
    /// it is this role).
    pub charade_role: Option<Role>,
    pub is_dead: bool,

    pub is_poisoned: bool,
    pub is_drunk: bool,
    /// Human-readable status labels, kept in step with `statuses`.
    pub status_details: Vec<String>,
    pub statuses: Vec<StatusEffect>,

    /// Seat id of whoever shielded this seat tonight.
    pub protected_by: Option<usize>,
    /// Seats that have marked this one tonight.
    pub marked_by: Vec<usize>,

    /// One-shot ability already consumed.
    pub power_spent: bool,
    pub day_power_used_today: bool,

    pub is_evil_converted: bool,
    pub is_good_converted: bool,
    /// Inherits the demon's mantle now that the demon is dead.
    pub is_demon_successor: bool,
}

impl Seat {
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn role_id(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.id.as_str())
    }

    pub fn role_name(&self) -> &str {
        self.role.as_ref().map(|r| r.name.as_str()).unwrap_or("(no role)")
    }

    pub fn true_type(&self) -> Option<RoleType> {
        self.role.as_ref().map(|r| r.role_type)
    }

    /// True moral alignment: the role's family, overridden by
    /// conversion flags.
    pub fn is_truly_evil(&self) -> bool {
        if self.is_good_converted {
            return false;
        }
        if self.is_evil_converted || self.is_demon_successor {
            return true;
        }
        self.true_type().map(|t| t.is_evil()).unwrap_or(false)
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|s| s.effect == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Script;

    #[test]
    fn empty_seat_registers_nothing() {
        let seat = Seat::empty(3);
        assert_eq!(seat.id, 3);
        assert!(seat.role.is_none());
        assert!(!seat.is_truly_evil());
        assert!(!seat.has_status(StatusKind::Poisoned));
    }

    #[test]
    fn conversion_flags_override_role_alignment() {
        let script = Script::hollow_vale();
        let mut seat = Seat::empty(0);
        seat.role = script.role("fiend").cloned();
        assert!(seat.is_truly_evil());
        seat.is_good_converted = true;
        assert!(!seat.is_truly_evil());

        let mut scribe = Seat::empty(1);
        scribe.role = script.role("scribe").cloned();
        assert!(!scribe.is_truly_evil());
        scribe.is_evil_converted = true;
        assert!(scribe.is_truly_evil());
    }
}
