//! Per-game rulesets
//!
//! The engine runs one pipeline for every arcade game; a `Ruleset` supplies
//! the kind tables, field geometry and tuning that make it a shooter, a
//! racer or the conquest map. Presets reproduce the portal's games and can
//! be overridden from JSON.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::conquest::ConquestRules;
use super::difficulty::DifficultyCurve;
use super::effects::EffectKind;
use super::entity::{EffectGrant, EntityKind, KindSpec};
use crate::consts::{FIELD_SIZE, LEVEL_BAND};
use crate::error::ConfigError;

/// Which mini-game a session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    Shooter,
    Racer,
    Conquest,
}

impl GameKind {
    /// Catalog id used by the portal
    pub fn id(&self) -> &'static str {
        match self {
            GameKind::Shooter => "cybernetic-assault",
            GameKind::Racer => "neon-racer-x",
            GameKind::Conquest => "galaxy-conquest",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "cybernetic-assault" | "shooter" => Some(GameKind::Shooter),
            "neon-racer-x" | "racer" => Some(GameKind::Racer),
            "galaxy-conquest" | "conquest" => Some(GameKind::Conquest),
            _ => None,
        }
    }

    pub const ALL: [GameKind; 3] = [GameKind::Shooter, GameKind::Racer, GameKind::Conquest];
}

/// How held intents move the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Movement {
    /// Free 2D movement, `speed` units per tick per axis
    Free { speed: f32 },
    /// Discrete lanes; holding a direction repeats a lane change every
    /// `repeat_ticks`
    Lanes {
        count: u8,
        width: f32,
        repeat_ticks: u32,
    },
    /// Pointer-driven game, the player avatar does not move
    Fixed,
}

/// Player weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponRules {
    pub cooldown_ticks: u32,
    pub rapid_cooldown_ticks: u32,
    pub bolt: KindSpec,
}

/// Field extents and spawn placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldGeometry {
    /// Player position is clamped to `[0, player_max]`
    pub player_max: Vec2,
    /// Enemies/obstacles are culled once `y >= enemy_exit_y`
    pub enemy_exit_y: f32,
    pub pickup_exit_y: f32,
    pub spawn_y: f32,
    /// Horizontal spawn range for free-placement games
    pub spawn_x_min: f32,
    pub spawn_x_max: f32,
}

/// Complete configuration of one game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ruleset {
    pub game: GameKind,
    pub player_start: Vec2,
    pub player_size: f32,
    pub player_health: u32,
    pub movement: Movement,
    #[serde(default)]
    pub weapon: Option<WeaponRules>,
    pub field: FieldGeometry,
    /// Enemy/obstacle kind table
    #[serde(default)]
    pub enemies: Vec<KindSpec>,
    /// Power-up/collectible kind table
    #[serde(default)]
    pub pickups: Vec<KindSpec>,
    #[serde(default)]
    pub pickup_chance: f32,
    /// Spawns within this x-distance (or the same lane) of a recent spawn
    /// are suppressed
    pub spawn_spacing: f32,
    /// A recent spawn is one still above this y
    pub spawn_clearance_y: f32,
    /// Forgiveness added to contact thresholds
    pub collision_margin: f32,
    /// Passive score and how often it is granted
    pub survival_score: u64,
    pub survival_interval_ticks: u32,
    pub speed_boost_factor: f32,
    pub slowdown_factor: f32,
    pub difficulty: DifficultyCurve,
    pub level_band: u64,
    #[serde(default)]
    pub conquest: Option<ConquestRules>,
}

fn enemy(kind: EntityKind, weight: u32, size: f32, speed: f32, health: u32, score: u64, damage: u32) -> KindSpec {
    KindSpec {
        kind,
        weight,
        size,
        speed,
        health,
        score,
        damage,
        lethal: false,
        grants: None,
    }
}

fn power_up(effect: EffectKind, weight: u32, duration_ms: f64) -> KindSpec {
    KindSpec {
        kind: EntityKind::PowerUp(effect),
        weight,
        size: 4.0,
        speed: 0.4,
        health: 1,
        score: 0,
        damage: 0,
        lethal: false,
        grants: Some(EffectGrant {
            kind: effect,
            duration_ms,
        }),
    }
}

fn bonus(kind: EntityKind, weight: u32, score: u64) -> KindSpec {
    KindSpec {
        kind,
        weight,
        size: 4.0,
        speed: 0.4,
        health: 1,
        score,
        damage: 0,
        lethal: false,
        grants: None,
    }
}

impl Ruleset {
    pub fn preset(game: GameKind) -> Self {
        match game {
            GameKind::Shooter => Self::shooter(),
            GameKind::Racer => Self::racer(),
            GameKind::Conquest => Self::conquest(),
        }
    }

    /// Cybernetic Assault: free movement, bolts, three enemy tiers
    pub fn shooter() -> Self {
        Self {
            game: GameKind::Shooter,
            player_start: Vec2::new(50.0, 75.0),
            player_size: 6.0,
            player_health: crate::consts::DEFAULT_PLAYER_HEALTH,
            movement: Movement::Free { speed: 1.2 },
            weapon: Some(WeaponRules {
                cooldown_ticks: 12,
                rapid_cooldown_ticks: 4,
                bolt: KindSpec {
                    kind: EntityKind::Bolt,
                    weight: 1,
                    size: 1.5,
                    speed: 2.5,
                    health: 1,
                    score: 0,
                    damage: 1,
                    lethal: false,
                    grants: None,
                },
            }),
            field: FieldGeometry {
                player_max: Vec2::new(95.0, 85.0),
                enemy_exit_y: 95.0,
                pickup_exit_y: 95.0,
                spawn_y: 0.0,
                spawn_x_min: 5.0,
                spawn_x_max: 90.0,
            },
            enemies: vec![
                enemy(EntityKind::Normal, 6, 4.0, 0.6, 1, 10, 10),
                enemy(EntityKind::Fast, 3, 3.0, 1.1, 1, 5, 5),
                enemy(EntityKind::Tank, 1, 6.0, 0.35, 3, 25, 30),
            ],
            pickups: vec![
                power_up(EffectKind::Shield, 3, 5000.0),
                power_up(EffectKind::RapidFire, 3, 6000.0),
                power_up(EffectKind::SpeedBoost, 2, 5000.0),
                bonus(EntityKind::DataCore, 2, 50),
            ],
            pickup_chance: 0.004,
            spawn_spacing: 6.0,
            spawn_clearance_y: 8.0,
            collision_margin: 0.0,
            survival_score: 1,
            survival_interval_ticks: 6,
            speed_boost_factor: 1.6,
            slowdown_factor: 0.5,
            difficulty: DifficultyCurve {
                base_spawn_chance: 0.03,
                max_spawn_chance: 0.12,
                spawn_chance_per_tick: 0.000_01,
                base_speed: 1.0,
                max_speed: 2.0,
                speed_per_tick: 0.000_2,
                step_points: LEVEL_BAND,
                spawn_chance_step: 0.01,
                speed_step: 0.1,
            },
            level_band: LEVEL_BAND,
            conquest: None,
        }
    }

    /// Neon Racer X: five lanes, lethal traffic, oil slicks
    pub fn racer() -> Self {
        let mut car = enemy(EntityKind::Car, 6, 6.0, 0.5, 1, 0, 100);
        car.lethal = true;
        let mut barrier = enemy(EntityKind::Barrier, 2, 8.0, 0.5, 1, 0, 100);
        barrier.lethal = true;
        let mut oil = enemy(EntityKind::Oil, 2, 6.0, 0.5, 1, 0, 0);
        oil.grants = Some(EffectGrant {
            kind: EffectKind::Slowdown,
            duration_ms: 3000.0,
        });

        Self {
            game: GameKind::Racer,
            player_start: Vec2::new(50.0, 80.0),
            player_size: 4.0,
            player_health: crate::consts::DEFAULT_PLAYER_HEALTH,
            movement: Movement::Lanes {
                count: 5,
                width: FIELD_SIZE / 5.0,
                repeat_ticks: 8,
            },
            weapon: None,
            field: FieldGeometry {
                player_max: Vec2::new(FIELD_SIZE, FIELD_SIZE),
                enemy_exit_y: 100.0,
                pickup_exit_y: 100.0,
                spawn_y: 0.0,
                spawn_x_min: 0.0,
                spawn_x_max: FIELD_SIZE,
            },
            enemies: vec![car, barrier, oil],
            pickups: vec![
                power_up(EffectKind::Shield, 1, 5000.0),
                bonus(EntityKind::Coin, 3, 25),
            ],
            pickup_chance: 0.003,
            spawn_spacing: 1.0,
            spawn_clearance_y: 15.0,
            collision_margin: 0.0,
            survival_score: 1,
            survival_interval_ticks: 1,
            speed_boost_factor: 1.0,
            slowdown_factor: 0.5,
            difficulty: DifficultyCurve {
                base_spawn_chance: 0.05,
                max_spawn_chance: 0.10,
                spawn_chance_per_tick: 0.0,
                base_speed: 1.0,
                max_speed: 3.0,
                speed_per_tick: 0.0,
                step_points: LEVEL_BAND,
                spawn_chance_step: 0.005,
                speed_step: 0.2,
            },
            level_band: LEVEL_BAND,
            conquest: None,
        }
    }

    /// Galaxy Conquest: no moving hostiles, economy on the round timer
    pub fn conquest() -> Self {
        Self {
            game: GameKind::Conquest,
            player_start: Vec2::new(50.0, 50.0),
            player_size: 0.0,
            player_health: crate::consts::DEFAULT_PLAYER_HEALTH,
            movement: Movement::Fixed,
            weapon: None,
            field: FieldGeometry {
                player_max: Vec2::new(FIELD_SIZE, FIELD_SIZE),
                enemy_exit_y: 100.0,
                pickup_exit_y: 100.0,
                spawn_y: 0.0,
                spawn_x_min: 0.0,
                spawn_x_max: FIELD_SIZE,
            },
            enemies: Vec::new(),
            pickups: Vec::new(),
            pickup_chance: 0.0,
            spawn_spacing: 0.0,
            spawn_clearance_y: 0.0,
            collision_margin: 0.0,
            survival_score: 0,
            survival_interval_ticks: 0,
            speed_boost_factor: 1.0,
            slowdown_factor: 1.0,
            difficulty: DifficultyCurve {
                base_spawn_chance: 0.0,
                max_spawn_chance: 0.0,
                spawn_chance_per_tick: 0.0,
                base_speed: 1.0,
                max_speed: 1.0,
                speed_per_tick: 0.0,
                step_points: 0,
                spawn_chance_step: 0.0,
                speed_step: 0.0,
            },
            level_band: LEVEL_BAND,
            conquest: Some(ConquestRules::default()),
        }
    }

    /// Parse and validate a ruleset from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: Ruleset = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        let d = &self.difficulty;
        for (field, p) in [
            ("difficulty.base_spawn_chance", d.base_spawn_chance),
            ("difficulty.max_spawn_chance", d.max_spawn_chance),
            ("pickup_chance", self.pickup_chance),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return invalid(field, "must be a probability in [0, 1]");
            }
        }
        if d.max_spawn_chance < d.base_spawn_chance {
            return invalid("difficulty.max_spawn_chance", "below base_spawn_chance");
        }
        if d.max_speed < d.base_speed {
            return invalid("difficulty.max_speed", "below base_speed");
        }
        if d.spawn_chance_per_tick < 0.0
            || d.speed_per_tick < 0.0
            || d.spawn_chance_step < 0.0
            || d.speed_step < 0.0
        {
            return invalid("difficulty", "growth rates must be non-negative");
        }
        if self.player_max_invalid() {
            return invalid("field.player_max", "must lie inside the 0-100 field");
        }
        if !self.enemies.is_empty() && self.enemies.iter().all(|k| k.weight == 0) {
            return invalid("enemies", "at least one kind needs a positive weight");
        }
        if !self.pickups.is_empty() && self.pickups.iter().all(|k| k.weight == 0) {
            return invalid("pickups", "at least one kind needs a positive weight");
        }
        if let Movement::Lanes { count, width, .. } = self.movement {
            if count == 0 || width <= 0.0 {
                return invalid("movement", "lane count and width must be positive");
            }
        }
        if self.game == GameKind::Conquest && self.conquest.is_none() {
            return invalid("conquest", "conquest rules are required for the conquest game");
        }
        if let Some(c) = &self.conquest {
            if !(0.0..=1.0).contains(&c.ai_move_chance) {
                return invalid("conquest.ai_move_chance", "must be a probability in [0, 1]");
            }
            if c.territory_count == 0 {
                return invalid("conquest.territory_count", "must be positive");
            }
        }
        Ok(())
    }

    fn player_max_invalid(&self) -> bool {
        let m = self.field.player_max;
        m.x < 0.0 || m.y < 0.0 || m.x > FIELD_SIZE || m.y > FIELD_SIZE
    }

    /// Lane center x for lane games
    pub fn lane_center(&self, lane: u8) -> f32 {
        match self.movement {
            Movement::Lanes { width, .. } => lane as f32 * width + width / 2.0,
            _ => self.player_start.x,
        }
    }

    pub fn lane_count(&self) -> Option<u8> {
        match self.movement {
            Movement::Lanes { count, .. } => Some(count),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for game in GameKind::ALL {
            let rules = Ruleset::preset(game);
            assert_eq!(rules.game, game);
            rules.validate().unwrap();
        }
    }

    #[test]
    fn test_json_roundtrip_keeps_tables() {
        let json = Ruleset::racer().to_json().unwrap();
        let parsed = Ruleset::from_json(&json).unwrap();
        assert_eq!(parsed, Ruleset::racer());
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let mut rules = Ruleset::shooter();
        rules.pickup_chance = 1.5;
        let json = serde_json::to_string(&rules).unwrap();
        match Ruleset::from_json(&json) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, "pickup_chance"),
            other => panic!("expected invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        assert!(matches!(Ruleset::from_json("{ nope"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_lane_centers() {
        let rules = Ruleset::racer();
        assert_eq!(rules.lane_center(0), 10.0);
        assert_eq!(rules.lane_center(2), 50.0);
        assert_eq!(rules.lane_center(4), 90.0);
        assert_eq!(rules.lane_count(), Some(5));
    }

    #[test]
    fn test_game_ids() {
        for game in GameKind::ALL {
            assert_eq!(GameKind::from_id(game.id()), Some(game));
        }
        assert_eq!(GameKind::from_id("pixel-adventure"), None);
    }
}
