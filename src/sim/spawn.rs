//! Spawning of enemies, obstacles and pickups
//!
//! Each tick rolls once per category. A successful roll picks a kind by
//! weight and a position, then the fairness rule may veto it: a spawn is
//! suppressed when a recent spawn (still above `spawn_clearance_y`) sits in
//! the same lane or within `spawn_spacing` horizontally.

use glam::Vec2;
use rand::Rng;

use super::entity::{Entity, EntityId, KindSpec, Registry};
use super::rules::Ruleset;
use super::spatial::random_range;
use super::state::Session;

/// Which table and registry a spawn roll targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnCategory {
    Enemy,
    Pickup,
}

/// Weighted pick from a kind table. `None` for an empty or zero-weight table.
pub fn pick_weighted<'a, R: Rng + ?Sized>(table: &'a [KindSpec], rng: &mut R) -> Option<&'a KindSpec> {
    let total: u32 = table.iter().map(|k| k.weight).sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for spec in table {
        if roll < spec.weight {
            return Some(spec);
        }
        roll -= spec.weight;
    }
    None
}

/// Proposed placement for a new entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub pos: Vec2,
    pub lane: Option<u8>,
}

/// Random placement along the spawn edge
pub fn place<R: Rng + ?Sized>(rules: &Ruleset, size: f32, rng: &mut R) -> Placement {
    let y = rules.field.spawn_y;
    match rules.lane_count() {
        Some(count) => {
            let lane = rng.random_range(0..count);
            Placement {
                pos: Vec2::new(rules.lane_center(lane), y),
                lane: Some(lane),
            }
        }
        None => {
            let max_x = (rules.field.spawn_x_max - size).max(rules.field.spawn_x_min);
            Placement {
                pos: Vec2::new(random_range(rng, rules.field.spawn_x_min, max_x), y),
                lane: None,
            }
        }
    }
}

/// Fairness check against entities already in `registry`
pub fn is_blocked(rules: &Ruleset, registry: &Registry, placement: &Placement) -> bool {
    registry.iter().any(|e| {
        if e.pos.y >= rules.spawn_clearance_y {
            return false;
        }
        match (placement.lane, e.lane) {
            (Some(a), Some(b)) => a == b,
            _ => (e.pos.x - placement.pos.x).abs() < rules.spawn_spacing,
        }
    })
}

/// Roll for one spawn in `category`. Returns the new entity's id.
pub fn try_spawn(session: &mut Session, category: SpawnCategory) -> Option<EntityId> {
    let chance = match category {
        SpawnCategory::Enemy => session.difficulty.spawn_chance,
        SpawnCategory::Pickup => session.rules.pickup_chance,
    };
    if chance <= 0.0 || !session.rng.random_bool(f64::from(chance.min(1.0))) {
        return None;
    }

    let table = match category {
        SpawnCategory::Enemy => &session.rules.enemies,
        SpawnCategory::Pickup => &session.rules.pickups,
    };
    let spec = pick_weighted(table, &mut session.rng)?.clone();
    let placement = place(&session.rules, spec.size, &mut session.rng);

    let registry = match category {
        SpawnCategory::Enemy => &session.enemies,
        SpawnCategory::Pickup => &session.pickups,
    };
    if is_blocked(&session.rules, registry, &placement) {
        log::trace!(
            "Spawn of {} suppressed at x={:.1}",
            spec.kind.as_str(),
            placement.pos.x
        );
        return None;
    }

    let id = session.next_entity_id();
    let mut entity = Entity::from_spec(id, &spec, placement.pos, Vec2::Y);
    if let Some(lane) = placement.lane {
        entity = entity.with_lane(lane);
    }
    match category {
        SpawnCategory::Enemy => session.enemies.insert(entity),
        SpawnCategory::Pickup => session.pickups.insert(entity),
    }
    Some(id)
}
