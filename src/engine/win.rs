//! End-of-game evaluation. Pure over the seat array plus the seat
//! just executed, if any; the engine stores the first non-empty
//! answer and never asks again.

use tracing::info;

use crate::model::results::{Side, WinResult};
use crate::model::seat::Seat;
use crate::model::settings::RuleSettings;

fn is_living_demon(seat: &Seat) -> bool {
    if seat.is_dead || seat.is_good_converted {
        return false;
    }
    seat.is_demon_successor
        || seat
            .true_type()
            .map(|t| t == crate::model::role::RoleType::Demon)
            .unwrap_or(false)
}

/// Scans the table after a death or execution. Rules fire in order:
/// all evil dead, then the living-player floor, then the executed
/// martyr. No rule firing means the game goes on.
pub fn evaluate(
    seats: &[Seat],
    executed: Option<usize>,
    settings: &RuleSettings,
) -> Option<WinResult> {
    let evil_alive = seats.iter().filter(|s| !s.is_dead && s.is_truly_evil()).count();
    if evil_alive == 0 {
        let result = WinResult {
            winner: Side::Good,
            reason: "Every evil seat is dead.".into(),
        };
        info!(winner = ?result.winner, "game decided");
        return Some(result);
    }

    let living = seats.iter().filter(|s| !s.is_dead).count();
    if living <= settings.evil_win_living_threshold && seats.iter().any(is_living_demon) {
        let result = WinResult {
            winner: Side::Evil,
            reason: format!("Only {living} seats live and a demon is among them."),
        };
        info!(winner = ?result.winner, "game decided");
        return Some(result);
    }

    if let Some(id) = executed {
        let martyred = seats
            .get(id)
            .and_then(|s| s.role.as_ref())
            .map(|r| r.loses_if_executed)
            .unwrap_or(false);
        if martyred {
            let result = WinResult {
                winner: Side::Evil,
                reason: format!("Seat {id} was executed, and good cannot survive that."),
            };
            info!(winner = ?result.winner, "game decided");
            return Some(result);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Script;

    fn seats(roles: &[&str]) -> Vec<Seat> {
        let script = Script::hollow_vale();
        roles
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let mut seat = Seat::empty(i);
                seat.role = script.role(id).cloned();
                seat
            })
            .collect()
    }

    #[test]
    fn good_wins_when_all_evil_is_dead() {
        let mut table = seats(&["fiend", "venomancer", "oracle", "scribe", "matron"]);
        table[0].is_dead = true;
        table[1].is_dead = true;
        let result = evaluate(&table, None, &RuleSettings::default()).unwrap();
        assert_eq!(result.winner, Side::Good);
    }

    #[test]
    fn a_living_successor_denies_the_good_win() {
        let mut table = seats(&["fiend", "heiress", "oracle", "scribe", "matron"]);
        table[0].is_dead = true;
        table[1].is_demon_successor = true;
        assert!(evaluate(&table, None, &RuleSettings::default()).is_none());
    }

    #[test]
    fn evil_wins_at_the_living_floor() {
        let mut table = seats(&["fiend", "oracle", "scribe", "scribe", "scribe"]);
        table[2].is_dead = true;
        table[3].is_dead = true;
        table[4].is_dead = true;
        let result = evaluate(&table, None, &RuleSettings::default()).unwrap();
        assert_eq!(result.winner, Side::Evil);
    }

    #[test]
    fn the_floor_is_configurable() {
        let mut table = seats(&["fiend", "oracle", "scribe", "scribe", "scribe"]);
        table[2].is_dead = true;
        let settings = RuleSettings {
            evil_win_living_threshold: 4,
            ..RuleSettings::default()
        };
        let result = evaluate(&table, None, &settings).unwrap();
        assert_eq!(result.winner, Side::Evil);
        assert!(evaluate(&table, None, &RuleSettings::default()).is_none());
    }

    #[test]
    fn executing_the_martyr_hands_evil_the_game() {
        let mut table = seats(&["fiend", "martyr", "oracle", "scribe", "matron"]);
        table[1].is_dead = true;
        let result = evaluate(&table, Some(1), &RuleSettings::default()).unwrap();
        assert_eq!(result.winner, Side::Evil);
        // The same table without the execution marker plays on.
        assert!(evaluate(&table, None, &RuleSettings::default()).is_none());
    }

    #[test]
    fn evaluation_is_stable_over_the_same_table() {
        let mut table = seats(&["fiend", "venomancer", "oracle", "scribe", "matron"]);
        table[0].is_dead = true;
        table[1].is_dead = true;
        let first = evaluate(&table, None, &RuleSettings::default());
        let second = evaluate(&table, None, &RuleSettings::default());
        assert_eq!(first, second);
        assert!(first.is_some());
    }
}
