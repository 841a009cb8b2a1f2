//! Apparent-identity resolution: what a seat registers as, for the
//! purposes of a specific viewing ability. Disguise rolls are drawn at
//! most once per (target, perspective, night) via the cache, so the
//! storyteller can re-open an information window without the answer
//! flipping.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use crate::engine::status::actor_disabled;
use crate::model::results::RegistrationResult;
use crate::model::role::{Role, RoleType};
use crate::model::seat::Seat;
use crate::model::settings::{DisguiseMode, RuleSettings};

/// Per-night result cache. Owned by the engine and cleared wholesale
/// when a night begins; never relies on collection to bound its size.
#[derive(Debug, Clone, Default)]
pub struct RegistrationCache {
    night: u32,
    entries: HashMap<(usize, Option<String>), RegistrationResult>,
}

impl RegistrationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_night(&mut self, night: u32) {
        self.night = night;
        self.entries.clear();
    }

    pub fn night(&self) -> u32 {
        self.night
    }
}

fn from_true_type(role_type: RoleType) -> RegistrationResult {
    RegistrationResult {
        registers_as_demon: role_type == RoleType::Demon,
        registers_as_minion: role_type == RoleType::Minion,
        registers_as_good: !role_type.is_evil(),
    }
}

/// Resolves how `target` registers to `perspective`, honoring
/// conversion overrides, the poison/drunk fallback, and cached
/// disguise rolls.
pub fn registration<R: Rng>(
    target: &Seat,
    perspective: Option<&Role>,
    settings: &RuleSettings,
    cache: &mut RegistrationCache,
    rng: &mut R,
) -> RegistrationResult {
    let key = (target.id, perspective.map(|r| r.id.clone()));
    if let Some(hit) = cache.entries.get(&key) {
        return *hit;
    }
    let result = resolve(target, perspective, settings, rng);
    debug!(
        seat = target.id,
        perspective = perspective.map(|r| r.id.as_str()).unwrap_or("none"),
        demon = result.registers_as_demon,
        minion = result.registers_as_minion,
        "registration resolved"
    );
    cache.entries.insert(key, result);
    result
}

fn resolve<R: Rng>(
    target: &Seat,
    perspective: Option<&Role>,
    settings: &RuleSettings,
    rng: &mut R,
) -> RegistrationResult {
    let Some(role) = target.role.as_ref() else {
        return RegistrationResult::neutral();
    };

    // Conversion flags beat everything, disguises included.
    if target.is_good_converted {
        return RegistrationResult::neutral();
    }
    if target.is_evil_converted {
        return RegistrationResult {
            registers_as_demon: role.role_type == RoleType::Demon,
            registers_as_minion: role.role_type != RoleType::Demon,
            registers_as_good: false,
        };
    }

    let true_result = from_true_type(role.role_type);

    // A disguise only works while its bearer's ability does.
    if (role.disguised_as_good || role.may_register_evil) && actor_disabled(target, None) {
        return true_result;
    }

    if role.disguised_as_good {
        if let Some(_viewer) = perspective {
            if settings.disguise_mode == DisguiseMode::Off {
                return true_result;
            }
            if rng.gen_bool(settings.disguise_probability) {
                return RegistrationResult::neutral();
            }
        }
        return true_result;
    }

    if role.may_register_evil {
        if rng.gen_bool(settings.hermit_evil_probability) {
            let as_demon = rng.gen_bool(0.5);
            return RegistrationResult {
                registers_as_demon: as_demon,
                registers_as_minion: !as_demon,
                registers_as_good: false,
            };
        }
        return true_result;
    }

    true_result
}

pub fn registered_as_demon<R: Rng>(
    target: &Seat,
    perspective: Option<&Role>,
    settings: &RuleSettings,
    cache: &mut RegistrationCache,
    rng: &mut R,
) -> bool {
    registration(target, perspective, settings, cache, rng).registers_as_demon
}

/// The disguised minion registers as a minion only when its cached
/// roll resolved to evil; a successful disguise hides the channel too.
pub fn registered_as_minion<R: Rng>(
    target: &Seat,
    perspective: Option<&Role>,
    settings: &RuleSettings,
    cache: &mut RegistrationCache,
    rng: &mut R,
) -> bool {
    registration(target, perspective, settings, cache, rng).registers_as_minion
}
