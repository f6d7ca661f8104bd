//! Collision detection and response
//!
//! Each pass tests against the entity set as it stood at the start of the
//! pass and applies all removals afterwards, so an entity destroyed by one
//! contact is never scored twice and never skipped because of iteration
//! order.

use super::effects::EffectKind;
use super::entity::{Entity, EntityId};
use super::particles::ParticleColor;
use super::spatial::{contact_threshold, segment_enters_box, within_box};
use super::state::{GameEvent, Outcome, Session};

/// Result of one bolt-vs-enemy pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoltHits {
    /// Bolts that struck something, consumed
    pub spent: Vec<EntityId>,
    /// Enemies that reached zero health, removed and scored
    pub destroyed: Vec<EntityId>,
    pub score: u64,
}

/// Result of the player-contact pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerContacts {
    pub removed: Vec<EntityId>,
    pub damage_taken: u32,
    pub blocked: usize,
}

/// Whether a bolt met an enemy at any point during the last step.
///
/// Both have already moved this tick: the bolt by `vel`, the enemy by
/// `vel * enemy_speed`. Testing the relative path catches fast pairs that
/// swap sides between two end positions.
pub fn swept_touching(bolt: &Entity, enemy: &Entity, margin: f32, enemy_speed: f32) -> bool {
    let end = bolt.pos - enemy.pos;
    let start = end - (bolt.vel - enemy.vel * enemy_speed);
    segment_enters_box(start, end, contact_threshold(bolt.size, enemy.size, margin))
}

/// Pairs `(bolt, enemy)` where each bolt hits at most one enemy, the lowest id
pub fn find_bolt_hits(
    bolts: &[Entity],
    enemies: &[Entity],
    margin: f32,
    enemy_speed: f32,
) -> Vec<(EntityId, EntityId)> {
    bolts
        .iter()
        .filter_map(|bolt| {
            enemies
                .iter()
                .filter(|enemy| swept_touching(bolt, enemy, margin, enemy_speed))
                .map(|enemy| enemy.id)
                .min()
                .map(|enemy| (bolt.id, enemy))
        })
        .collect()
}

/// Step 5: bolts against enemies
pub fn resolve_bolts(session: &mut Session) -> BoltHits {
    let margin = session.rules.collision_margin;
    let pairs = find_bolt_hits(
        &session.projectiles.entities,
        &session.enemies.entities,
        margin,
        session.difficulty.speed,
    );
    if pairs.is_empty() {
        return BoltHits::default();
    }

    let mut hits = BoltHits::default();
    // Damage per enemy accumulated over the whole batch
    let mut damage: Vec<(EntityId, u32)> = Vec::new();
    for (bolt_id, enemy_id) in &pairs {
        let bolt_damage = session
            .projectiles
            .get(*bolt_id)
            .map(|b| b.damage)
            .unwrap_or(0);
        match damage.iter_mut().find(|(id, _)| id == enemy_id) {
            Some((_, d)) => *d += bolt_damage,
            None => damage.push((*enemy_id, bolt_damage)),
        }
        hits.spent.push(*bolt_id);
    }

    let mut bursts = Vec::new();
    for (enemy_id, dealt) in damage {
        let Some(enemy) = session.enemies.entities.iter_mut().find(|e| e.id == enemy_id) else {
            continue;
        };
        enemy.health = enemy.health.saturating_sub(dealt);
        if enemy.health == 0 {
            hits.destroyed.push(enemy.id);
            hits.score += enemy.score;
            session.events.push(GameEvent::EnemyDestroyed {
                id: enemy.id,
                kind: enemy.kind,
                score: enemy.score,
                pos: enemy.pos,
            });
            bursts.push((12, enemy.pos, ParticleColor::Explosion));
        } else {
            session.events.push(GameEvent::EnemyDamaged {
                id: enemy.id,
                health: enemy.health,
            });
            bursts.push((4, enemy.pos, ParticleColor::Spark));
        }
    }

    session.projectiles.remove_ids(&hits.spent);
    session.enemies.remove_ids(&hits.destroyed);
    session.award(hits.score);
    for (count, pos, color) in bursts {
        session.burst(count, pos, color);
    }
    hits
}

/// Step 6: player against enemies/obstacles
///
/// Every touching entity is consumed. Hazards that grant an effect turn into
/// that effect and never damage. Otherwise an active shield absorbs the
/// contact; unshielded contact deals the entity's damage, and a lethal one
/// ends the run as a crash.
pub fn resolve_player_hits(session: &mut Session) -> PlayerContacts {
    let mut contacts = PlayerContacts::default();
    if !session.player.is_alive() || session.player.size <= 0.0 {
        return contacts;
    }

    let margin = session.rules.collision_margin;
    let threshold_for = |size: f32| contact_threshold(session.player.size, size, margin);
    let touching: Vec<Entity> = session
        .enemies
        .iter()
        .filter(|e| within_box(session.player.pos, e.pos, threshold_for(e.size)))
        .cloned()
        .collect();
    if touching.is_empty() {
        return contacts;
    }

    let shielded = session.effects.is_active(EffectKind::Shield);
    for entity in &touching {
        contacts.removed.push(entity.id);

        if let Some(grant) = entity.grants {
            session.activate_effect(grant.kind, grant.duration_ms);
            session.events.push(GameEvent::HazardTriggered {
                kind: entity.kind,
                effect: grant.kind,
            });
            continue;
        }

        if shielded {
            contacts.blocked += 1;
            session.events.push(GameEvent::ShieldBlocked { kind: entity.kind });
            session.burst(8, entity.pos, ParticleColor::Shield);
            continue;
        }

        if !session.player.is_alive() {
            continue;
        }
        let before = session.player.health;
        session.player.health = before.saturating_sub(entity.damage);
        if entity.lethal {
            session.player.health = 0;
            session.pending_outcome = Some(Outcome::Crashed);
        }
        contacts.damage_taken += before - session.player.health;
        session.events.push(GameEvent::PlayerHit {
            kind: entity.kind,
            damage: entity.damage,
            health: session.player.health,
        });
        session.burst(12, entity.pos, ParticleColor::Explosion);
        log::debug!(
            "Player hit by {} for {}, health {}",
            entity.kind.as_str(),
            entity.damage,
            session.player.health
        );
    }

    session.enemies.remove_ids(&contacts.removed);
    contacts
}

/// Step 7: player against pickups. Returns the collected ids.
pub fn resolve_pickups(session: &mut Session) -> Vec<EntityId> {
    if !session.player.is_alive() || session.player.size <= 0.0 {
        return Vec::new();
    }
    let margin = session.rules.collision_margin;
    let player_pos = session.player.pos;
    let player_size = session.player.size;
    let collected: Vec<Entity> = session
        .pickups
        .iter()
        .filter(|p| within_box(player_pos, p.pos, contact_threshold(player_size, p.size, margin)))
        .cloned()
        .collect();

    for pickup in &collected {
        if let Some(grant) = pickup.grants {
            session.activate_effect(grant.kind, grant.duration_ms);
        }
        session.award(pickup.score);
        session.events.push(GameEvent::PickupCollected {
            kind: pickup.kind,
            score: pickup.score,
        });
        session.burst(6, pickup.pos, ParticleColor::PowerUp);
    }

    let ids: Vec<EntityId> = collected.iter().map(|p| p.id).collect();
    session.pickups.remove_ids(&ids);
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::SessionId;
    use crate::sim::entity::{EntityKind, KindSpec};
    use crate::sim::rules::{GameKind, Ruleset};
    use crate::sim::state::GameConfig;
    use glam::Vec2;

    fn shooter() -> Session {
        Session::new(&GameConfig::new(GameKind::Shooter, 5), SessionId(1))
    }

    fn spec(rules: &Ruleset, kind: EntityKind) -> KindSpec {
        rules
            .enemies
            .iter()
            .chain(rules.pickups.iter())
            .find(|k| k.kind == kind)
            .cloned()
            .unwrap()
    }

    fn spawn_enemy(s: &mut Session, kind: EntityKind, pos: Vec2) -> EntityId {
        let id = s.next_entity_id();
        let spec = spec(&s.rules, kind);
        s.enemies.insert(Entity::from_spec(id, &spec, pos, Vec2::Y));
        id
    }

    fn spawn_bolt(s: &mut Session, pos: Vec2) -> EntityId {
        let id = s.next_entity_id();
        let bolt = s.rules.weapon.as_ref().unwrap().bolt.clone();
        s.projectiles.insert(Entity::from_spec(id, &bolt, pos, Vec2::NEG_Y));
        id
    }

    #[test]
    fn test_bolt_hits_lowest_id_only() {
        let mut s = shooter();
        let a = spawn_enemy(&mut s, EntityKind::Normal, Vec2::new(50.0, 30.0));
        let b = spawn_enemy(&mut s, EntityKind::Normal, Vec2::new(51.0, 30.0));
        spawn_bolt(&mut s, Vec2::new(50.5, 30.0));

        let hits = resolve_bolts(&mut s);
        assert_eq!(hits.destroyed, vec![a]);
        assert!(s.enemies.contains(b));
        assert!(s.projectiles.is_empty());
        assert_eq!(s.score, 10);
    }

    #[test]
    fn test_two_bolts_same_enemy_score_once() {
        let mut s = shooter();
        let id = spawn_enemy(&mut s, EntityKind::Normal, Vec2::new(50.0, 30.0));
        spawn_bolt(&mut s, Vec2::new(50.0, 31.0));
        spawn_bolt(&mut s, Vec2::new(50.0, 29.0));

        let hits = resolve_bolts(&mut s);
        assert_eq!(hits.destroyed, vec![id]);
        assert_eq!(hits.spent.len(), 2);
        assert_eq!(s.score, 10);
        let destroyed_events = s
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyDestroyed { .. }))
            .count();
        assert_eq!(destroyed_events, 1);
    }

    #[test]
    fn test_tank_survives_single_bolt() {
        let mut s = shooter();
        let id = spawn_enemy(&mut s, EntityKind::Tank, Vec2::new(50.0, 30.0));
        spawn_bolt(&mut s, Vec2::new(50.0, 30.0));

        let hits = resolve_bolts(&mut s);
        assert!(hits.destroyed.is_empty());
        assert_eq!(s.enemies.get(id).unwrap().health, 2);
        assert_eq!(s.score, 0);
    }

    #[test]
    fn test_miss_leaves_everything() {
        let mut s = shooter();
        spawn_enemy(&mut s, EntityKind::Normal, Vec2::new(10.0, 30.0));
        spawn_bolt(&mut s, Vec2::new(80.0, 30.0));
        assert_eq!(resolve_bolts(&mut s), BoltHits::default());
        assert_eq!(s.enemies.len(), 1);
        assert_eq!(s.projectiles.len(), 1);
    }

    #[test]
    fn test_bolt_hits_enemy_it_crossed() {
        let mut s = shooter();
        s.difficulty.speed = 2.0;
        // End positions already swapped sides: bolt above, enemy below
        let id = spawn_enemy(&mut s, EntityKind::Fast, Vec2::new(30.0, 24.4));
        spawn_bolt(&mut s, Vec2::new(30.0, 22.05));
        let bolt = s.projectiles.iter().next().unwrap();
        let enemy = s.enemies.get(id).unwrap();
        assert!(!within_box(bolt.pos, enemy.pos, contact_threshold(bolt.size, enemy.size, 0.0)));

        let hits = resolve_bolts(&mut s);
        assert_eq!(hits.destroyed, vec![id]);
        assert_eq!(s.score, 5);
    }

    #[test]
    fn test_unshielded_contact_damages_and_removes() {
        let mut s = shooter();
        let pos = s.player.pos;
        let id = spawn_enemy(&mut s, EntityKind::Normal, pos);
        let contacts = resolve_player_hits(&mut s);
        assert_eq!(contacts.removed, vec![id]);
        assert_eq!(contacts.damage_taken, 10);
        assert_eq!(s.player.health, 90);
        assert!(s.enemies.is_empty());
    }

    #[test]
    fn test_shield_blocks_all_damage() {
        let mut s = shooter();
        s.activate_effect(EffectKind::Shield, 5000.0);
        let pos = s.player.pos;
        spawn_enemy(&mut s, EntityKind::Tank, pos);
        spawn_enemy(&mut s, EntityKind::Fast, pos + Vec2::new(1.0, 0.0));

        let contacts = resolve_player_hits(&mut s);
        assert_eq!(contacts.blocked, 2);
        assert_eq!(contacts.damage_taken, 0);
        assert_eq!(s.player.health, 100);
        assert!(s.enemies.is_empty());
    }

    #[test]
    fn test_health_floors_at_zero() {
        let mut s = shooter();
        s.player.health = 5;
        let pos = s.player.pos;
        spawn_enemy(&mut s, EntityKind::Tank, pos);
        resolve_player_hits(&mut s);
        assert_eq!(s.player.health, 0);
    }

    #[test]
    fn test_lethal_contact_marks_crash() {
        let mut s = Session::new(&GameConfig::new(GameKind::Racer, 2), SessionId(1));
        let pos = s.player.pos;
        spawn_enemy(&mut s, EntityKind::Car, pos);
        resolve_player_hits(&mut s);
        assert_eq!(s.player.health, 0);
        assert_eq!(s.pending_outcome, Some(Outcome::Crashed));
    }

    #[test]
    fn test_oil_slows_even_when_shielded() {
        let mut s = Session::new(&GameConfig::new(GameKind::Racer, 2), SessionId(1));
        s.activate_effect(EffectKind::Shield, 5000.0);
        let pos = s.player.pos;
        spawn_enemy(&mut s, EntityKind::Oil, pos);
        let contacts = resolve_player_hits(&mut s);
        assert_eq!(contacts.damage_taken, 0);
        assert!(s.effects.is_active(EffectKind::Slowdown));
        assert!(s.enemies.is_empty());
    }

    #[test]
    fn test_pickup_grants_effect_and_score() {
        let mut s = shooter();
        let pos = s.player.pos;
        for kind in [EntityKind::PowerUp(EffectKind::RapidFire), EntityKind::DataCore] {
            let id = s.next_entity_id();
            let spec = spec(&s.rules, kind);
            s.pickups.insert(Entity::from_spec(id, &spec, pos, Vec2::Y));
        }
        let collected = resolve_pickups(&mut s);
        assert_eq!(collected.len(), 2);
        assert!(s.effects.is_active(EffectKind::RapidFire));
        assert_eq!(s.score, 50);
        assert!(s.pickups.is_empty());
    }
}
