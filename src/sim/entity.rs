//! Moving entities and the registries that own them
//!
//! Enemies, obstacles, bolts and pickups share one shape. Kind-specific
//! numbers (size, score, damage...) are copied from the ruleset's kind table
//! at spawn time, so resolution code never has to look them up again.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::EffectKind;

/// Unique for the lifetime of a session, never reused
pub type EntityId = u32;

/// Entity variants across all arcade games
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    // Shooter enemies
    Normal,
    Fast,
    Tank,
    // Racer obstacles
    Car,
    Barrier,
    Oil,
    // Player projectile
    Bolt,
    // Collectibles
    PowerUp(EffectKind),
    DataCore,
    Coin,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Normal => "normal",
            EntityKind::Fast => "fast",
            EntityKind::Tank => "tank",
            EntityKind::Car => "car",
            EntityKind::Barrier => "barrier",
            EntityKind::Oil => "oil",
            EntityKind::Bolt => "bolt",
            EntityKind::PowerUp(_) => "power-up",
            EntityKind::DataCore => "data-core",
            EntityKind::Coin => "coin",
        }
    }
}

/// An effect applied when an entity touches the player
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectGrant {
    pub kind: EffectKind,
    pub duration_ms: f64,
}

/// One row of a kind table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindSpec {
    pub kind: EntityKind,
    /// Relative spawn weight within its table
    pub weight: u32,
    /// Collision extent (full width)
    pub size: f32,
    /// Travel per tick at speed multiplier 1.0
    pub speed: f32,
    #[serde(default = "default_health")]
    pub health: u32,
    /// Awarded when destroyed by a bolt or collected
    #[serde(default)]
    pub score: u64,
    /// Health removed from an unshielded player on contact
    #[serde(default)]
    pub damage: u32,
    /// Unshielded contact ends the run outright
    #[serde(default)]
    pub lethal: bool,
    /// Effect applied on contact (power-ups, hazards)
    #[serde(default)]
    pub grants: Option<EffectGrant>,
}

fn default_health() -> u32 {
    1
}

/// A live entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    /// Displacement per tick at speed multiplier 1.0
    pub vel: Vec2,
    pub size: f32,
    pub health: u32,
    pub score: u64,
    pub damage: u32,
    pub lethal: bool,
    pub grants: Option<EffectGrant>,
    /// Lane index for lane-based games
    pub lane: Option<u8>,
}

impl Entity {
    /// Build an entity from its kind row, travelling along `dir`
    pub fn from_spec(id: EntityId, spec: &KindSpec, pos: Vec2, dir: Vec2) -> Self {
        Self {
            id,
            kind: spec.kind,
            pos,
            vel: dir * spec.speed,
            size: spec.size,
            health: spec.health,
            score: spec.score,
            damage: spec.damage,
            lethal: spec.lethal,
            grants: spec.grants,
            lane: None,
        }
    }

    pub fn with_lane(mut self, lane: u8) -> Self {
        self.lane = Some(lane);
        self
    }
}

/// Where entities leave the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ExitBoundary {
    /// Downward travel; culled once `y >= limit`
    Bottom(f32),
    /// Upward travel; culled once `y < limit`
    Top(f32),
}

impl ExitBoundary {
    pub fn has_exited(&self, pos: Vec2) -> bool {
        let off_side = pos.x < -crate::consts::FIELD_SIZE * 0.1
            || pos.x > crate::consts::FIELD_SIZE * 1.1;
        off_side
            || match *self {
                ExitBoundary::Bottom(limit) => pos.y >= limit,
                ExitBoundary::Top(limit) => pos.y < limit,
            }
    }
}

/// Ordered collection of one category of entities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    pub entities: Vec<Entity>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    pub fn insert(&mut self, entity: Entity) {
        debug_assert!(!self.contains(entity.id), "duplicate entity id {}", entity.id);
        self.entities.push(entity);
    }

    /// Move every entity by its velocity scaled by `speed`
    pub fn advance(&mut self, speed: f32) {
        for e in self.entities.iter_mut() {
            e.pos += e.vel * speed;
        }
    }

    /// Drop entities past `exit`, returning their ids
    pub fn cull(&mut self, exit: ExitBoundary) -> Vec<EntityId> {
        let mut culled = Vec::new();
        self.entities.retain(|e| {
            if exit.has_exited(e.pos) {
                culled.push(e.id);
                false
            } else {
                true
            }
        });
        culled
    }

    /// Remove all entities whose id is in `ids`
    pub fn remove_ids(&mut self, ids: &[EntityId]) {
        if ids.is_empty() {
            return;
        }
        self.entities.retain(|e| !ids.contains(&e.id));
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Keep iteration order stable across ticks
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }
}
