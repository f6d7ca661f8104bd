//! Session state
//!
//! One `Session` is one run: it is created by `start`, owned by the
//! scheduler, mutated only by the tick pipeline (and the conquest round
//! timer), and dropped on the next start.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::conquest::{AiMove, ClickOutcome, ConquestState, MapStatus, Owner};
use super::difficulty::{Difficulty, bands_crossed};
use super::effects::{EffectKind, EffectManager, ExpiryHandle, SessionId, StatusEffect};
use super::entity::{Entity, EntityId, EntityKind, Registry};
use super::particles::{BurstOptions, Particle, ParticleColor, ParticleSystem};
use super::rules::{GameKind, Movement, Ruleset};
use crate::consts::MAX_PARTICLES;
use crate::error::ConquestError;
use crate::settings::Settings;

/// Everything `start` needs to build a session
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: u64,
    pub rules: Ruleset,
    pub max_particles: usize,
}

impl GameConfig {
    /// Preset rules for `game` with the default particle budget
    pub fn new(game: GameKind, seed: u64) -> Self {
        Self {
            seed,
            rules: Ruleset::preset(game),
            max_particles: MAX_PARTICLES,
        }
    }

    pub fn with_rules(rules: Ruleset, seed: u64) -> Self {
        Self {
            seed,
            rules,
            max_particles: MAX_PARTICLES,
        }
    }

    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.max_particles = settings.max_particles().min(MAX_PARTICLES);
        self
    }

    pub fn game(&self) -> GameKind {
        self.rules.game
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Health worn down to zero
    Destroyed,
    /// Unshielded contact with a lethal obstacle
    Crashed,
    /// Every territory taken
    Victory,
    /// Every territory lost
    Defeat,
}

/// Things that happened during a tick, for the HUD and sound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreChanged { score: u64 },
    EnemyDestroyed { id: EntityId, kind: EntityKind, score: u64, pos: Vec2 },
    EnemyDamaged { id: EntityId, health: u32 },
    PlayerHit { kind: EntityKind, damage: u32, health: u32 },
    ShieldBlocked { kind: EntityKind },
    HazardTriggered { kind: EntityKind, effect: EffectKind },
    PickupCollected { kind: EntityKind, score: u64 },
    EffectActivated { kind: EffectKind, expires_at: f64 },
    EffectExpired { kind: EffectKind },
    DifficultyStep { spawn_chance: f32, speed: f32 },
    LevelUp { level: u32 },
    TerritorySelected { id: u32 },
    TerritoryConquered { id: u32, cost: u32, bonus: u64 },
    ConquestRejected { territory: u32, reason: String, cost: Option<u32> },
    IncomeReceived { amount: u32 },
    TerritoryTaken { id: u32, from: Owner },
    GameOver { outcome: Outcome, final_score: u64 },
}

/// The player's avatar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: f32,
    pub health: u32,
    /// Current lane for lane games
    pub lane: Option<u8>,
    /// Ticks until the next bolt may fire
    pub fire_cooldown: u32,
    /// Ticks until a held direction changes lane again
    pub lane_cooldown: u32,
}

impl Player {
    pub fn new(rules: &Ruleset) -> Self {
        let lane = match rules.movement {
            Movement::Lanes { count, .. } => Some(count / 2),
            _ => None,
        };
        let mut pos = rules.player_start;
        if let Some(lane) = lane {
            pos.x = rules.lane_center(lane);
        }
        Self {
            pos,
            size: rules.player_size,
            health: rules.player_health,
            lane,
            fire_cooldown: 0,
            lane_cooldown: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// One playthrough
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub seed: u64,
    pub rules: Ruleset,
    pub player: Player,
    pub score: u64,
    pub level: u32,
    /// Hostiles/obstacles
    pub enemies: Registry,
    /// Player bolts
    pub projectiles: Registry,
    /// Power-ups and collectibles
    pub pickups: Registry,
    pub effects: EffectManager,
    pub particles: ParticleSystem,
    pub difficulty: Difficulty,
    pub conquest: Option<ConquestState>,
    pub running: bool,
    pub game_over: bool,
    pub outcome: Option<Outcome>,
    pub final_score: Option<u64>,
    /// Logical time (ms), advanced once per processed tick
    pub clock_ms: f64,
    pub ticks: u64,
    /// Events from the latest tick
    pub events: Vec<GameEvent>,
    /// Outcome decided mid-tick, applied by the terminal check
    pub(crate) pending_outcome: Option<Outcome>,
    pub(crate) rng: Pcg32,
    next_id: EntityId,
}

impl Session {
    pub fn new(config: &GameConfig, id: SessionId) -> Self {
        let rules = config.rules.clone();
        let mut rng = Pcg32::seed_from_u64(config.seed);
        let conquest = rules
            .conquest
            .as_ref()
            .map(|c| ConquestState::generate(c, &mut rng));

        Self {
            id,
            seed: config.seed,
            player: Player::new(&rules),
            score: 0,
            level: 1,
            enemies: Registry::new(),
            projectiles: Registry::new(),
            pickups: Registry::new(),
            effects: EffectManager::new(id),
            particles: ParticleSystem::new(config.max_particles),
            difficulty: Difficulty::new(&rules.difficulty),
            conquest,
            running: true,
            game_over: false,
            outcome: None,
            final_score: None,
            clock_ms: 0.0,
            ticks: 0,
            events: Vec::new(),
            pending_outcome: None,
            rng,
            next_id: 1,
            rules,
        }
    }

    pub fn game(&self) -> GameKind {
        self.rules.game
    }

    /// Allocate a new entity id
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Add points. Score never decreases.
    pub fn award(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.score = self.score.saturating_add(points);
    }

    /// Level and difficulty thresholds for a score change since `old_score`
    pub fn apply_progression(&mut self, old_score: u64) {
        if self.score == old_score {
            return;
        }
        self.events.push(GameEvent::ScoreChanged { score: self.score });

        let steps = self
            .difficulty
            .on_score(&self.rules.difficulty, old_score, self.score);
        if steps > 0 {
            self.events.push(GameEvent::DifficultyStep {
                spawn_chance: self.difficulty.spawn_chance,
                speed: self.difficulty.speed,
            });
        }

        for _ in 0..bands_crossed(old_score, self.score, self.rules.level_band) {
            self.level += 1;
            log::info!("{} level up -> {}", self.game().id(), self.level);
            self.events.push(GameEvent::LevelUp { level: self.level });
        }
    }

    /// Activate an effect at the current logical time
    pub fn activate_effect(&mut self, kind: EffectKind, duration_ms: f64) -> ExpiryHandle {
        let handle = self.effects.activate(kind, duration_ms, self.clock_ms);
        self.events.push(GameEvent::EffectActivated {
            kind,
            expires_at: handle.expires_at,
        });
        handle
    }

    /// Deferred expiry from a host timer; inert for other or ended sessions
    pub fn expire_effect(&mut self, handle: &ExpiryHandle) -> bool {
        if handle.session != self.id || !self.running {
            return false;
        }
        let expired = self.effects.fire_expiry(handle);
        if expired {
            self.events.push(GameEvent::EffectExpired { kind: handle.kind });
        }
        expired
    }

    /// Movement speed factor from active effects
    pub fn move_multiplier(&self) -> f32 {
        let mut m = 1.0;
        if self.effects.is_active(EffectKind::SpeedBoost) {
            m *= self.rules.speed_boost_factor;
        }
        if self.effects.is_active(EffectKind::Slowdown) {
            m *= self.rules.slowdown_factor;
        }
        m
    }

    /// Ticks between bolts, shortened by rapid fire
    pub fn fire_cooldown_ticks(&self) -> u32 {
        match &self.rules.weapon {
            Some(w) if self.effects.is_active(EffectKind::RapidFire) => w.rapid_cooldown_ticks,
            Some(w) => w.cooldown_ticks,
            None => 0,
        }
    }

    pub(crate) fn burst(&mut self, count: usize, pos: Vec2, color: ParticleColor) {
        self.particles
            .spawn_burst(&mut self.rng, count, pos, color, BurstOptions::default());
    }

    /// Resolve a territory click. Rejections are returned and also reported
    /// as an event so the UI can show the attempted cost.
    pub fn click_territory(&mut self, id: u32) -> Result<ClickOutcome, ConquestError> {
        if !self.running {
            return Err(ConquestError::RunOver);
        }
        let (Some(map), Some(rules)) = (self.conquest.as_mut(), self.rules.conquest.as_ref())
        else {
            return Err(ConquestError::NotStarted);
        };

        match map.click(rules, id) {
            Ok(ClickOutcome::Selected(id)) => {
                self.events.push(GameEvent::TerritorySelected { id });
                Ok(ClickOutcome::Selected(id))
            }
            Ok(outcome @ ClickOutcome::Conquered { id, cost, bonus, .. }) => {
                let pos = map.territory(id).map(|t| t.pos).unwrap_or_default();
                self.award(bonus);
                self.events.push(GameEvent::TerritoryConquered { id, cost, bonus });
                self.burst(20, pos, ParticleColor::Conquest);
                log::debug!("Territory {} conquered for {}", id, cost);
                Ok(outcome)
            }
            Err(err) => {
                let cost = match err {
                    ConquestError::InsufficientResources { cost, .. } => Some(cost),
                    _ => None,
                };
                self.events.push(GameEvent::ConquestRejected {
                    territory: id,
                    reason: err.to_string(),
                    cost,
                });
                Err(err)
            }
        }
    }

    /// One coarse conquest round (income, opponent). Returns false when the
    /// session has no map or is no longer running.
    pub fn conquest_round(&mut self) -> bool {
        if !self.running {
            return false;
        }
        let (Some(map), Some(rules)) = (self.conquest.as_mut(), self.rules.conquest.as_ref())
        else {
            return false;
        };
        let old_score = self.score;
        let report = map.round(rules, &mut self.rng);
        let round_score = rules.round_score;

        if report.income > 0 {
            self.events.push(GameEvent::IncomeReceived {
                amount: report.income,
            });
        }
        if let Some(AiMove {
            territory,
            taken_from,
        }) = report.ai_move
        {
            self.events.push(GameEvent::TerritoryTaken {
                id: territory,
                from: taken_from,
            });
        }
        self.award(round_score);
        self.apply_progression(old_score);
        self.check_terminal();
        true
    }

    /// Terminal condition check; ends the run when met. Returns `running`.
    pub fn check_terminal(&mut self) -> bool {
        if !self.running {
            return false;
        }

        if !self.player.is_alive() {
            let outcome = self.pending_outcome.take().unwrap_or(Outcome::Destroyed);
            let score = self.score;
            self.finish(outcome, score);
            return false;
        }

        if let (Some(map), Some(rules)) = (&self.conquest, &self.rules.conquest) {
            match map.status() {
                MapStatus::Victory => {
                    let score = self.score + map.victory_bonus(rules);
                    self.finish(Outcome::Victory, score);
                    return false;
                }
                MapStatus::Defeat => {
                    let score = self.score;
                    self.finish(Outcome::Defeat, score);
                    return false;
                }
                MapStatus::Contested => {}
            }
        }
        true
    }

    /// The displayed score is raised to the final score so snapshots agree
    /// with the reported result. Level bands are not re-evaluated.
    fn finish(&mut self, outcome: Outcome, final_score: u64) {
        if final_score > self.score {
            self.score = final_score;
            self.events.push(GameEvent::ScoreChanged { score: final_score });
        }
        self.running = false;
        self.game_over = true;
        self.outcome = Some(outcome);
        self.final_score = Some(final_score);
        self.effects.end();
        self.events.push(GameEvent::GameOver {
            outcome,
            final_score,
        });
        log::info!(
            "{} over ({:?}) after {} ticks, final score {}",
            self.game().id(),
            outcome,
            self.ticks,
            final_score
        );
    }

    /// Abandon the run without an outcome (stop/reset)
    pub fn end(&mut self) {
        self.running = false;
        self.effects.end();
    }

    /// Ensure deterministic iteration order
    pub fn normalize_order(&mut self) {
        self.enemies.normalize_order();
        self.projectiles.normalize_order();
        self.pickups.normalize_order();
    }

    /// Frozen copy for the renderer
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session: self.id,
            game: self.game(),
            tick: self.ticks,
            clock_ms: self.clock_ms,
            score: self.score,
            level: self.level,
            player: self.player.clone(),
            effects: self.effects.active().to_vec(),
            enemies: self.enemies.entities.clone(),
            projectiles: self.projectiles.entities.clone(),
            pickups: self.pickups.entities.clone(),
            particles: self.particles.particles.clone(),
            spawn_chance: self.difficulty.spawn_chance,
            speed: self.difficulty.speed,
            conquest: self.conquest.clone(),
            running: self.running,
            game_over: self.game_over,
            outcome: self.outcome,
            final_score: self.final_score,
            events: self.events.clone(),
        }
    }
}

/// Read-only view handed to the presentation layer after each tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub session: SessionId,
    pub game: GameKind,
    pub tick: u64,
    pub clock_ms: f64,
    pub score: u64,
    pub level: u32,
    pub player: Player,
    pub effects: Vec<StatusEffect>,
    pub enemies: Vec<Entity>,
    pub projectiles: Vec<Entity>,
    pub pickups: Vec<Entity>,
    pub particles: Vec<Particle>,
    pub spawn_chance: f32,
    pub speed: f32,
    pub conquest: Option<ConquestState>,
    pub running: bool,
    pub game_over: bool,
    pub outcome: Option<Outcome>,
    pub final_score: Option<u64>,
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::warn!("Snapshot serialization failed: {}", e);
            String::from("null")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let s = Session::new(&GameConfig::new(GameKind::Shooter, 1), SessionId(1));
        assert_eq!(s.player.health, 100);
        assert_eq!(s.score, 0);
        assert!(s.enemies.is_empty() && s.projectiles.is_empty() && s.pickups.is_empty());
        assert!(s.running && !s.game_over);
        assert_eq!(s.difficulty.spawn_chance, s.rules.difficulty.base_spawn_chance);
        assert_eq!(s.player.pos, Vec2::new(50.0, 75.0));
    }

    #[test]
    fn test_racer_starts_in_middle_lane() {
        let s = Session::new(&GameConfig::new(GameKind::Racer, 1), SessionId(1));
        assert_eq!(s.player.lane, Some(2));
        assert_eq!(s.player.pos, Vec2::new(50.0, 80.0));
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut s = Session::new(&GameConfig::new(GameKind::Shooter, 1), SessionId(1));
        let a = s.next_entity_id();
        let b = s.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_level_up_once_per_band() {
        let mut s = Session::new(&GameConfig::new(GameKind::Shooter, 1), SessionId(1));
        s.score = 499;
        s.award(1);
        s.apply_progression(499);
        s.award(1);
        s.apply_progression(500);
        let level_ups = s
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LevelUp { .. }))
            .count();
        assert_eq!(level_ups, 1);
        assert_eq!(s.level, 2);
    }

    #[test]
    fn test_expiry_after_end_is_inert() {
        let mut s = Session::new(&GameConfig::new(GameKind::Shooter, 1), SessionId(4));
        let handle = s.activate_effect(EffectKind::Shield, 5000.0);
        s.end();
        assert!(!s.expire_effect(&handle));
    }

    #[test]
    fn test_conquest_session_has_map() {
        let s = Session::new(&GameConfig::new(GameKind::Conquest, 3), SessionId(1));
        let map = s.conquest.as_ref().unwrap();
        assert_eq!(map.resources, 100);
        assert_eq!(map.count(Owner::Player), 1);
    }

    #[test]
    fn test_click_without_map() {
        let mut s = Session::new(&GameConfig::new(GameKind::Racer, 1), SessionId(1));
        assert_eq!(s.click_territory(0), Err(ConquestError::NotStarted));
    }

    #[test]
    fn test_snapshot_serializes() {
        let s = Session::new(&GameConfig::new(GameKind::Conquest, 9), SessionId(2));
        let json = s.snapshot().to_json();
        assert!(json.contains("\"score\":0"));
        assert!(json.contains("territories"));
    }
}
