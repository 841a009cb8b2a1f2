use serde::{Deserialize, Serialize};

/// The four broad role families. Townsfolk and outsiders are good,
/// minions and demons are evil - before conversions are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Townsfolk,
    Outsider,
    Minion,
    Demon,
}

impl RoleType {
    pub fn is_evil(self) -> bool {
        matches!(self, RoleType::Minion | RoleType::Demon)
    }

    pub fn label(self) -> &'static str {
        match self {
            RoleType::Townsfolk => "Townsfolk",
            RoleType::Outsider => "Outsider",
            RoleType::Minion => "Minion",
            RoleType::Demon => "Demon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightActionKind {
    Kill,
    Poison,
    Protect,
    Mark,
    KillOrSkip,
}

/// When and in what order a role wakes at night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NightAction {
    pub kind: NightActionKind,
    /// Fixed position in the script's wake sequence, ascending.
    pub wake_order: u32,
    /// First night this role acts on (1 = the first night).
    #[serde(default = "first_night")]
    pub first_active_night: u32,
}

fn first_night() -> u32 {
    1
}

/// What actually happens when a role acts. One variant per acted
/// ability; passive behaviors are flags on [`Role`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolePower {
    /// Demon attack on one seat, or a deliberate skip.
    Strike,
    /// Poison one seat until the next dusk.
    Venom,
    /// Shield one seat against the night kill until dawn.
    Safeguard,
    /// Pick two seats and learn whether either registers as a demon.
    Augury,
    /// Shown the whole table; no mechanical effect.
    TableSight,
    /// Day power: publicly shoot a seat, lethal only to a registered demon.
    DayShot,
    /// No acted power.
    Inert,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPower {
    pub name: String,
    pub once_per_game: bool,
}

/// An immutable role definition from the script catalog. Never mutated
/// at runtime; seats hold clones of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub role_type: RoleType,
    pub ability: String,
    #[serde(default)]
    pub night_action: Option<NightAction>,
    #[serde(default = "inert")]
    pub power: RolePower,
    #[serde(default)]
    pub day_power: Option<DayPower>,

    /// Minion that registers as good to viewing abilities.
    #[serde(default)]
    pub disguised_as_good: bool,
    /// Outsider that may register as evil (minion or demon).
    #[serde(default)]
    pub may_register_evil: bool,
    /// Permanently drunk; believes it is its charade role.
    #[serde(default)]
    pub always_drunk: bool,
    /// Good loses the game if this seat is executed.
    #[serde(default)]
    pub loses_if_executed: bool,
    /// Shrugs off the first lethal event, once.
    #[serde(default)]
    pub survives_first_death: bool,
    /// Its living good neighbors cannot die at night.
    #[serde(default)]
    pub guards_neighbors: bool,
    /// Becomes the demon when the demon dies.
    #[serde(default)]
    pub succeeds_demon: bool,
    /// Keeps waking after death.
    #[serde(default)]
    pub has_power_even_dead: bool,
}

fn inert() -> RolePower {
    RolePower::Inert
}

impl Role {
    fn new(id: &str, name: &str, role_type: RoleType, ability: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role_type,
            ability: ability.into(),
            night_action: None,
            power: RolePower::Inert,
            day_power: None,
            disguised_as_good: false,
            may_register_evil: false,
            always_drunk: false,
            loses_if_executed: false,
            survives_first_death: false,
            guards_neighbors: false,
            succeeds_demon: false,
            has_power_even_dead: false,
        }
    }

    fn wakes(mut self, kind: NightActionKind, wake_order: u32, from_night: u32) -> Self {
        self.night_action = Some(NightAction {
            kind,
            wake_order,
            first_active_night: from_night,
        });
        self
    }

    fn with_power(mut self, power: RolePower) -> Self {
        self.power = power;
        self
    }
}

/// A fixed per-script role catalog. Roles are looked up by id and
/// cloned onto seats; the catalog itself is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub roles: Vec<Role>,
}

impl Script {
    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The built-in script.
    pub fn hollow_vale() -> Self {
        let roles = vec![
            Role::new(
                "oracle",
                "Oracle",
                RoleType::Townsfolk,
                "Each night, choose two seats: you learn if either registers as a demon.",
            )
            .wakes(NightActionKind::Mark, 40, 1)
            .with_power(RolePower::Augury),
            Role::new(
                "sentinel",
                "Sentinel",
                RoleType::Townsfolk,
                "Each night after the first, choose a seat: it is safe from the demon tonight.",
            )
            .wakes(NightActionKind::Protect, 20, 2)
            .with_power(RolePower::Safeguard),
            {
                let mut r = Role::new(
                    "matron",
                    "Matron",
                    RoleType::Townsfolk,
                    "While your two living neighbors are good, they cannot die at night.",
                );
                r.guards_neighbors = true;
                r
            },
            {
                let mut r = Role::new(
                    "veteran",
                    "Veteran",
                    RoleType::Townsfolk,
                    "The first time you would die, you do not.",
                );
                r.survives_first_death = true;
                r
            },
            {
                let mut r = Role::new(
                    "marksman",
                    "Marksman",
                    RoleType::Townsfolk,
                    "Once per game during the day, publicly choose a seat: if it is the demon, it dies.",
                );
                r.power = RolePower::DayShot;
                r.day_power = Some(DayPower {
                    name: "Shot".into(),
                    once_per_game: true,
                });
                r
            },
            Role::new(
                "scribe",
                "Scribe",
                RoleType::Townsfolk,
                "You have no ability, only your word.",
            ),
            {
                let mut r = Role::new(
                    "sot",
                    "Sot",
                    RoleType::Outsider,
                    "You do not know you are the Sot. You think you are a townsfolk role, but you are drunk.",
                );
                r.always_drunk = true;
                r
            },
            {
                let mut r = Role::new(
                    "hermit",
                    "Hermit",
                    RoleType::Outsider,
                    "You might register as evil, as a minion or a demon, even to yourself.",
                );
                r.may_register_evil = true;
                r
            },
            {
                let mut r = Role::new(
                    "martyr",
                    "Martyr",
                    RoleType::Outsider,
                    "If you die by execution, your team loses.",
                );
                r.loses_if_executed = true;
                r
            },
            Role::new(
                "venomancer",
                "Venomancer",
                RoleType::Minion,
                "Each night, choose a seat: it is poisoned until dusk tomorrow.",
            )
            .wakes(NightActionKind::Poison, 10, 1)
            .with_power(RolePower::Venom),
            {
                let mut r = Role::new(
                    "infiltrator",
                    "Infiltrator",
                    RoleType::Minion,
                    "Each night, you see the whole table. You register as good.",
                )
                .wakes(NightActionKind::Mark, 15, 1)
                .with_power(RolePower::TableSight);
                r.disguised_as_good = true;
                r
            },
            {
                let mut r = Role::new(
                    "heiress",
                    "Heiress",
                    RoleType::Minion,
                    "If the demon dies and enough players still live, you become the demon.",
                );
                r.succeeds_demon = true;
                r
            },
            Role::new(
                "fiend",
                "Fiend",
                RoleType::Demon,
                "Each night after the first, choose a seat: it dies. You may decline.",
            )
            .wakes(NightActionKind::KillOrSkip, 30, 2)
            .with_power(RolePower::Strike),
        ];

        Self {
            name: "The Hollow Vale".into(),
            roles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup_by_id() {
        let script = Script::hollow_vale();
        assert_eq!(script.role("fiend").map(|r| r.name.as_str()), Some("Fiend"));
        assert!(script.role("nobody").is_none());
    }

    #[test]
    fn wake_orders_are_distinct_and_ascending_by_family() {
        let script = Script::hollow_vale();
        let mut orders: Vec<u32> = script
            .roles
            .iter()
            .filter_map(|r| r.night_action.map(|n| n.wake_order))
            .collect();
        let before = orders.len();
        orders.sort_unstable();
        orders.dedup();
        assert_eq!(orders.len(), before);
    }

    #[test]
    fn script_round_trips_through_json() {
        let script = Script::hollow_vale();
        let json = serde_json::to_string(&script).unwrap();
        let back = Script::from_json(&json).unwrap();
        assert_eq!(back.roles.len(), script.roles.len());
        assert!(back.role("infiltrator").unwrap().disguised_as_good);
    }
}
