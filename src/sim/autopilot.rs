//! Idle/demo mode: the computer plays
//!
//! Produces the same `TickInput` a human would, so demo runs go through
//! the normal pipeline and stay deterministic for a given seed.

use glam::Vec2;

use super::conquest::{Owner, acquisition_cost};
use super::entity::Entity;
use super::input::{Intents, TickInput};
use super::rules::{GameKind, Movement};
use super::state::Session;

/// Horizontal distance at which an enemy counts as incoming
const DODGE_WIDTH: f32 = 8.0;
/// Enemies further above than this are ignored
const LOOKAHEAD: f32 = 40.0;
/// Preferred shooter altitude
const CRUISE_Y: f32 = 75.0;

/// Input for one tick of demo play
pub fn input(session: &Session) -> TickInput {
    match session.game() {
        GameKind::Shooter => TickInput {
            intents: shooter(session),
            clicks: Vec::new(),
        },
        GameKind::Racer => TickInput {
            intents: racer(session),
            clicks: Vec::new(),
        },
        GameKind::Conquest => TickInput {
            intents: Intents::default(),
            clicks: conquest(session),
        },
    }
}

fn incoming<'a>(session: &'a Session, x: f32, width: f32) -> impl Iterator<Item = &'a Entity> {
    let player_y = session.player.pos.y;
    session.enemies.iter().filter(move |e| {
        e.grants.is_none()
            && e.pos.y < player_y + 2.0
            && player_y - e.pos.y < LOOKAHEAD
            && (e.pos.x - x).abs() < width
    })
}

fn shooter(session: &Session) -> Intents {
    let player = session.player.pos;
    let max = session.rules.field.player_max;
    let mut intents = Intents {
        fire: true,
        ..Default::default()
    };

    // Find the most dangerous enemy (closest above us in our column)
    let threat = incoming(session, player.x, DODGE_WIDTH).max_by(|a, b| {
        a.pos
            .y
            .partial_cmp(&b.pos.y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let target_x = if let Some(threat) = threat {
        // Sidestep toward the roomier side
        if threat.pos.x >= player.x && player.x > DODGE_WIDTH || player.x >= max.x - DODGE_WIDTH {
            player.x - DODGE_WIDTH
        } else {
            player.x + DODGE_WIDTH
        }
    } else if let Some(pickup) = nearest(session.pickups.iter(), player) {
        pickup.pos.x
    } else if let Some(enemy) = session.enemies.iter().max_by(|a, b| {
        a.pos
            .y
            .partial_cmp(&b.pos.y)
            .unwrap_or(std::cmp::Ordering::Equal)
    }) {
        // Line up a shot on the lowest enemy
        enemy.pos.x
    } else {
        player.x
    };

    intents.left = target_x < player.x - 0.5;
    intents.right = target_x > player.x + 0.5;
    intents.up = player.y > CRUISE_Y + 1.0;
    intents.down = player.y < CRUISE_Y - 1.0;
    intents
}

fn racer(session: &Session) -> Intents {
    let mut intents = Intents::default();
    let (Movement::Lanes { count, .. }, Some(lane)) = (&session.rules.movement, session.player.lane)
    else {
        return intents;
    };

    let danger = |lane: u8| {
        let x = session.rules.lane_center(lane);
        incoming(session, x, 1.0).count()
    };
    if danger(lane) == 0 {
        return intents;
    }

    let left = lane.checked_sub(1).map(|l| (l, danger(l)));
    let right = (lane + 1 < *count).then(|| (lane + 1, danger(lane + 1)));
    let best = [left, right]
        .into_iter()
        .flatten()
        .min_by_key(|(_, d)| *d);
    if let Some((target, _)) = best {
        intents.left = target < lane;
        intents.right = target > lane;
    }
    intents
}

fn conquest(session: &Session) -> Vec<u32> {
    let (Some(map), Some(rules)) = (&session.conquest, &session.rules.conquest) else {
        return Vec::new();
    };

    // Cheapest affordable capture from any owned territory
    let best = map
        .territories
        .iter()
        .filter(|t| t.owner == Owner::Player)
        .flat_map(|source| {
            map.territories
                .iter()
                .filter(|t| t.owner != Owner::Player)
                .map(move |target| (source, target, acquisition_cost(rules, source, target)))
        })
        .filter(|(_, _, cost)| *cost <= map.resources)
        .min_by_key(|(_, _, cost)| *cost);

    match best {
        Some((source, target, _)) if map.selected == Some(source.id) => vec![target.id],
        Some((source, target, _)) => vec![source.id, target.id],
        None => Vec::new(),
    }
}

fn nearest<'a>(entities: impl Iterator<Item = &'a Entity>, to: Vec2) -> Option<&'a Entity> {
    entities.min_by(|a, b| {
        a.pos
            .distance_squared(to)
            .partial_cmp(&b.pos.distance_squared(to))
            .unwrap_or(std::cmp::Ordering::Equal)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::SessionId;
    use crate::sim::entity::EntityKind;
    use crate::sim::state::GameConfig;
    use crate::sim::tick::tick;

    #[test]
    fn test_shooter_always_fires() {
        let s = Session::new(&GameConfig::new(GameKind::Shooter, 1), SessionId(1));
        assert!(input(&s).intents.fire);
    }

    #[test]
    fn test_racer_leaves_blocked_lane() {
        let mut s = Session::new(&GameConfig::new(GameKind::Racer, 1), SessionId(1));
        let spec = s.rules.enemies[0].clone();
        let id = s.next_entity_id();
        let pos = Vec2::new(s.player.pos.x, 60.0);
        s.enemies.insert(Entity::from_spec(id, &spec, pos, Vec2::Y).with_lane(2));
        let intents = input(&s).intents;
        assert!(intents.left ^ intents.right);
    }

    #[test]
    fn test_racer_ignores_oil_for_dodging() {
        let mut s = Session::new(&GameConfig::new(GameKind::Racer, 1), SessionId(1));
        let spec = s
            .rules
            .enemies
            .iter()
            .find(|k| k.kind == EntityKind::Oil)
            .cloned()
            .unwrap();
        let id = s.next_entity_id();
        let pos = Vec2::new(s.player.pos.x, 60.0);
        s.enemies.insert(Entity::from_spec(id, &spec, pos, Vec2::Y));
        assert_eq!(input(&s).intents, Intents::default());
    }

    #[test]
    fn test_conquest_selects_then_captures() {
        let mut s = Session::new(&GameConfig::new(GameKind::Conquest, 4), SessionId(1));
        s.conquest.as_mut().unwrap().resources = 10_000;
        let clicks = input(&s).clicks;
        assert_eq!(clicks.len(), 2);
        tick(
            &mut s,
            &TickInput {
                intents: Intents::default(),
                clicks,
            },
        );
        assert_eq!(s.conquest.as_ref().unwrap().count(Owner::Player), 2);
    }

    #[test]
    fn test_demo_run_is_deterministic() {
        let config = GameConfig::new(GameKind::Shooter, 77);
        let mut a = Session::new(&config, SessionId(1));
        let mut b = Session::new(&config, SessionId(1));
        for _ in 0..600 {
            let ia = input(&a);
            let ib = input(&b);
            tick(&mut a, &ia);
            tick(&mut b, &ib);
        }
        assert_eq!(a.score, b.score);
        assert_eq!(a.player, b.player);
    }
}
