//! Fixed timestep simulation tick
//!
//! One call advances a session by exactly one logical step. Order matters
//! and never changes:
//!
//! 1. apply input (movement, firing, territory clicks)
//! 2. advance projectiles, cull past the top edge
//! 3. advance enemies/obstacles, cull past the exit edge
//! 4. advance pickups, cull past the exit edge
//! 5. bolts vs enemies
//! 6. player vs enemies/obstacles
//! 7. player vs pickups
//! 8. expire effects whose deadline has passed
//! 9. update particles
//! 10. spawn (only while alive)
//! 11. survival score and difficulty escalation (only while alive)
//! 12. terminal check

use glam::Vec2;

use super::collision::{resolve_bolts, resolve_pickups, resolve_player_hits};
use super::entity::{Entity, ExitBoundary};
use super::input::TickInput;
use super::rules::Movement;
use super::spatial::clamp_to_field;
use super::spawn::{SpawnCategory, try_spawn};
use super::state::{GameEvent, Session};
use crate::consts::TICK_INTERVAL_MS;

/// Advance the session by one tick. Returns whether the run continues.
pub fn tick(session: &mut Session, input: &TickInput) -> bool {
    if !session.running {
        return false;
    }

    session.events.clear();
    session.ticks += 1;
    session.clock_ms += TICK_INTERVAL_MS;
    let score_before = session.score;

    // 1
    apply_input(session, input);

    // 2-4
    let speed = session.difficulty.speed;
    session.projectiles.advance(1.0);
    session.projectiles.cull(ExitBoundary::Top(0.0));
    session.enemies.advance(speed);
    session
        .enemies
        .cull(ExitBoundary::Bottom(session.rules.field.enemy_exit_y));
    session.pickups.advance(speed);
    session
        .pickups
        .cull(ExitBoundary::Bottom(session.rules.field.pickup_exit_y));

    // 5-7; a player killed at 6 collects nothing at 7
    resolve_bolts(session);
    resolve_player_hits(session);
    if session.player.is_alive() {
        resolve_pickups(session);
    }

    // 8
    for kind in session.effects.expire_due(session.clock_ms) {
        log::debug!("{} expired at {}", kind.as_str(), session.clock_ms);
        session.events.push(GameEvent::EffectExpired { kind });
    }

    // 9
    session.particles.update();

    if session.player.is_alive() {
        // 10
        try_spawn(session, SpawnCategory::Enemy);
        try_spawn(session, SpawnCategory::Pickup);

        // 11
        let interval = session.rules.survival_interval_ticks;
        if interval > 0 && session.ticks % u64::from(interval) == 0 {
            session.award(session.rules.survival_score);
        }
        session.difficulty.tick(&session.rules.difficulty);
        session.apply_progression(score_before);
    } else if session.score != score_before {
        session.events.push(GameEvent::ScoreChanged {
            score: session.score,
        });
    }

    session.normalize_order();

    // 12
    session.check_terminal()
}

fn apply_input(session: &mut Session, input: &TickInput) {
    let intents = input.intents;
    let multiplier = session.move_multiplier();

    match session.rules.movement {
        Movement::Free { speed } => {
            let delta = Vec2::new(intents.axis_x(), intents.axis_y()) * speed * multiplier;
            session.player.pos = clamp_to_field(
                session.player.pos + delta,
                session.rules.field.player_max,
            );
        }
        Movement::Lanes {
            count,
            repeat_ticks,
            ..
        } => {
            let axis = intents.axis_x();
            if axis == 0.0 {
                // Released: the next press acts immediately
                session.player.lane_cooldown = 0;
            } else {
                session.player.lane_cooldown = session.player.lane_cooldown.saturating_sub(1);
            }
            if axis != 0.0 && session.player.lane_cooldown == 0 {
                let lane = session.player.lane.unwrap_or(count / 2);
                let next = if axis < 0.0 {
                    lane.saturating_sub(1)
                } else {
                    (lane + 1).min(count - 1)
                };
                session.player.lane = Some(next);
                session.player.lane_cooldown =
                    ((repeat_ticks as f32 / multiplier.max(0.01)).round() as u32).max(1);
            }
            if let Some(lane) = session.player.lane {
                session.player.pos.x = session.rules.lane_center(lane);
            }
        }
        Movement::Fixed => {}
    }

    // Firing
    if session.player.fire_cooldown > 0 {
        session.player.fire_cooldown -= 1;
    }
    if intents.fire && session.player.fire_cooldown == 0 && session.player.is_alive() {
        if let Some(bolt) = session.rules.weapon.as_ref().map(|w| w.bolt.clone()) {
            let id = session.next_entity_id();
            let pos = session.player.pos - Vec2::new(0.0, session.player.size / 2.0);
            session
                .projectiles
                .insert(Entity::from_spec(id, &bolt, pos, Vec2::NEG_Y));
            session.player.fire_cooldown = session.fire_cooldown_ticks();
        }
    }

    // Territory clicks, rejections are recorded as events
    for &territory in &input.clicks {
        if let Err(err) = session.click_territory(territory) {
            log::debug!("Click on {} rejected: {}", territory, err);
        }
    }
}
