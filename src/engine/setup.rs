//! Seat setup validation: the one storyteller-visible failure in the
//! engine. A bad composition is reported, not enforced; the caller
//! may override it deliberately.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::model::role::RoleType;
use crate::model::seat::Seat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub townsfolk: usize,
    pub outsiders: usize,
    pub minions: usize,
    pub demons: usize,
}

impl fmt::Display for RoleCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} townsfolk / {} outsiders / {} minions / {} demons",
            self.townsfolk, self.outsiders, self.minions, self.demons
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("no rule for a table of {0} players")]
    UnsupportedPlayerCount(usize),
    #[error("seat {0} has no role assigned")]
    MissingRole(usize),
    #[error("a table of {players} needs {expected}, not {found}")]
    WrongCounts {
        players: usize,
        expected: RoleCounts,
        found: RoleCounts,
    },
}

/// Standard composition per player count.
pub fn expected_counts(players: usize) -> Option<RoleCounts> {
    let (townsfolk, outsiders, minions) = match players {
        5 => (3, 0, 1),
        6 => (3, 1, 1),
        7 => (5, 0, 1),
        8 => (5, 1, 1),
        9 => (5, 2, 1),
        10 => (7, 0, 2),
        11 => (7, 1, 2),
        12 => (7, 2, 2),
        13 => (9, 0, 3),
        14 => (9, 1, 3),
        15 => (9, 2, 3),
        _ => return None,
    };
    Some(RoleCounts {
        townsfolk,
        outsiders,
        minions,
        demons: 1,
    })
}

pub fn count_roles(seats: &[Seat]) -> RoleCounts {
    let mut counts = RoleCounts {
        townsfolk: 0,
        outsiders: 0,
        minions: 0,
        demons: 0,
    };
    for seat in seats {
        match seat.true_type() {
            Some(RoleType::Townsfolk) => counts.townsfolk += 1,
            Some(RoleType::Outsider) => counts.outsiders += 1,
            Some(RoleType::Minion) => counts.minions += 1,
            Some(RoleType::Demon) => counts.demons += 1,
            None => {}
        }
    }
    counts
}

pub fn validate(seats: &[Seat]) -> Result<(), SetupError> {
    if let Some(missing) = seats.iter().find(|s| s.role.is_none()) {
        return Err(SetupError::MissingRole(missing.id));
    }
    let players = seats.len();
    let expected =
        expected_counts(players).ok_or(SetupError::UnsupportedPlayerCount(players))?;
    let found = count_roles(seats);
    if found != expected {
        return Err(SetupError::WrongCounts {
            players,
            expected,
            found,
        });
    }
    Ok(())
}
