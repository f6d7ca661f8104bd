//! Mystic Legends: menu-driven adventure
//!
//! Not frame driven. Every action is a discrete transition on the state
//! below; travel advances a logical clock by `TRAVEL_MS` so the shared
//! effect manager can time the Regeneration buff.

use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::LEVEL_BAND;
use crate::error::AdventureError;
use crate::sim::difficulty::bands_crossed;
use crate::sim::effects::{EffectKind, EffectManager, SessionId};
use crate::sim::particles::{BurstOptions, ParticleColor, ParticleSystem};
use crate::sim::ProgressSink;
use crate::sim::spatial::random_int;

/// Catalog id reported to the progress sink
pub const GAME_ID: &str = "mystic-legends";

pub const MAX_HEALTH: u32 = 100;
pub const TRAVEL_SCORE: u64 = 10;
pub const TREASURE_SCORE: u64 = 100;
pub const COMBAT_SCORE: u64 = 25;
pub const QUEST_SCORE: u64 = 50;
pub const POTION_HEAL: u32 = 30;
/// Logical time one journey takes
pub const TRAVEL_MS: f64 = 1000.0;
pub const REGEN_PER_TRAVEL: u32 = 5;
pub const REGEN_DURATION_MS: f64 = 5000.0;

pub const HEALTH_POTION: &str = "Health Potion";
pub const HEALING_HERBS: &str = "Healing Herbs";
const STARTING_ITEMS: [&str; 2] = ["Wooden Sword", HEALTH_POTION];
const TREASURES: [&str; 5] = [
    "Magic Scroll",
    "Golden Key",
    "Silver Dagger",
    HEALING_HERBS,
    "Mysterious Amulet",
];

/// Places on the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Village,
    Forest,
    Mountain,
    Tavern,
    Cave,
    River,
    Peak,
    Lake,
    QuestBoard,
}

impl Location {
    pub const ALL: [Location; 9] = [
        Location::Village,
        Location::Forest,
        Location::Mountain,
        Location::Tavern,
        Location::Cave,
        Location::River,
        Location::Peak,
        Location::Lake,
        Location::QuestBoard,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Location::Village => "village",
            Location::Forest => "forest",
            Location::Mountain => "mountain",
            Location::Tavern => "tavern",
            Location::Cave => "cave",
            Location::River => "river",
            Location::Peak => "peak",
            Location::Lake => "lake",
            Location::QuestBoard => "quest",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Location::Village => "Village of Mistwood",
            Location::Forest => "Enchanted Forest",
            Location::Mountain => "Dragonspire Mountain",
            Location::Tavern => "Golden Goblet Tavern",
            Location::Cave => "Crystal Cave",
            Location::River => "Silvermoon River",
            Location::Peak => "Dragon's Peak",
            Location::Lake => "Mirror Lake",
            Location::QuestBoard => "Quest Board",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Location::Village => "A peaceful village at the edge of a mysterious forest.",
            Location::Forest => "A dense forest filled with magical creatures and hidden treasures.",
            Location::Mountain => "A treacherous mountain where dragons are said to reside.",
            Location::Tavern => "A lively tavern where adventurers share tales of their journeys.",
            Location::Cave => "A dark cave filled with glowing crystals and dangerous monsters.",
            Location::River => "A magical river said to grant wishes to those pure of heart.",
            Location::Peak => "The summit of Dragonspire Mountain, home to the ancient dragon.",
            Location::Lake => "A mystical lake that reflects your true self.",
            Location::QuestBoard => "A board with quests posted by villagers and travelers.",
        }
    }

    /// Where you can go from here
    pub fn exits(&self) -> &'static [Location] {
        use Location::*;
        match self {
            Village => &[Forest, Mountain, Tavern],
            Forest => &[Village, Cave, River],
            Mountain => &[Village, Peak, Cave],
            Tavern => &[Village, QuestBoard],
            Cave => &[Forest, Mountain],
            River => &[Forest, Lake],
            Peak => &[Mountain],
            Lake => &[River],
            QuestBoard => &[Tavern],
        }
    }

    /// Monsters never attack in town
    pub fn is_safe(&self) -> bool {
        matches!(self, Location::Village | Location::Tavern)
    }
}

/// What happened on arrival
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encounter {
    Quiet,
    Treasure { item: String },
    /// Found something already carried; nothing gained
    Duplicate { item: String },
    Combat { damage: u32 },
    Defeated { damage: u32 },
}

/// Result of one journey
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelReport {
    pub location: Location,
    pub encounter: Encounter,
    pub health: u32,
    pub score: u64,
    pub regenerated: u32,
    pub level_ups: u64,
    pub game_over: bool,
}

/// One adventure
#[derive(Debug, Clone)]
pub struct Adventure {
    pub location: Location,
    pub health: u32,
    pub score: u64,
    pub level: u32,
    pub inventory: Vec<String>,
    pub quests_accepted: u32,
    pub message: String,
    pub over: bool,
    pub clock_ms: f64,
    pub effects: EffectManager,
    pub particles: ParticleSystem,
    rng: Pcg32,
}

impl Adventure {
    pub fn new(seed: u64, session: SessionId, max_particles: usize) -> Self {
        Self {
            location: Location::Village,
            health: MAX_HEALTH,
            score: 0,
            level: 1,
            inventory: STARTING_ITEMS.iter().map(|s| s.to_string()).collect(),
            quests_accepted: 0,
            message: format!("You begin your adventure in the {}.", Location::Village.name()),
            over: false,
            clock_ms: 0.0,
            effects: EffectManager::new(session),
            particles: ParticleSystem::new(max_particles),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|i| i == item)
    }

    /// Travel along an edge, then roll for treasure or a monster
    pub fn travel<S: ProgressSink + ?Sized>(
        &mut self,
        to: Location,
        sink: &mut S,
    ) -> Result<TravelReport, AdventureError> {
        if self.over {
            return Err(AdventureError::Over);
        }
        if !self.location.exits().contains(&to) {
            return Err(AdventureError::NoRoute {
                from: self.location.id(),
                to: to.id(),
            });
        }

        let old_score = self.score;
        self.location = to;
        self.message = format!("You travel to the {}.", to.name());
        self.clock_ms += TRAVEL_MS;
        self.particles.update();

        let regenerated = self.regenerate();
        for kind in self.effects.expire_due(self.clock_ms) {
            log::debug!("{} wore off", kind.as_str());
        }

        let roll: f64 = self.rng.random();
        let encounter = if roll > 0.8 {
            self.find_treasure()
        } else if roll > 0.6 && !to.is_safe() {
            self.fight()
        } else {
            Encounter::Quiet
        };

        if self.over {
            log::info!("Adventure over at {} with {}", to.name(), self.score);
            sink.on_game_over(GAME_ID, self.score);
        } else {
            self.score += TRAVEL_SCORE;
        }

        let level_ups = self.level_up(old_score);
        if self.score != old_score {
            sink.on_score_change(GAME_ID, self.score);
        }

        Ok(TravelReport {
            location: to,
            encounter,
            health: self.health,
            score: self.score,
            regenerated,
            level_ups,
            game_over: self.over,
        })
    }

    /// Travel by location id, as sent from the menu
    pub fn travel_to<S: ProgressSink + ?Sized>(
        &mut self,
        id: &str,
        sink: &mut S,
    ) -> Result<TravelReport, AdventureError> {
        let to = Location::from_id(id).ok_or(AdventureError::NoRoute {
            from: self.location.id(),
            to: "unknown",
        })?;
        self.travel(to, sink)
    }

    pub fn accept_quest(&mut self) -> Result<u64, AdventureError> {
        if self.over {
            return Err(AdventureError::Over);
        }
        if self.location != Location::QuestBoard {
            return Err(AdventureError::NotAtQuestBoard);
        }
        let old_score = self.score;
        self.quests_accepted += 1;
        self.score += QUEST_SCORE;
        self.level_up(old_score);
        self.message =
            String::from("You accepted a quest to retrieve a magical artifact from the Crystal Cave!");
        Ok(self.score)
    }

    /// Drink the potion. Returns health restored.
    pub fn use_potion(&mut self) -> Result<u32, AdventureError> {
        if self.over {
            return Err(AdventureError::Over);
        }
        let idx = self
            .inventory
            .iter()
            .position(|i| i == HEALTH_POTION)
            .ok_or(AdventureError::MissingItem(HEALTH_POTION))?;
        self.inventory.remove(idx);
        let before = self.health;
        self.health = (self.health + POTION_HEAL).min(MAX_HEALTH);
        self.message = format!("You used a Health Potion and restored {} health!", self.health - before);
        Ok(self.health - before)
    }

    fn regenerate(&mut self) -> u32 {
        if !self.effects.is_active(EffectKind::Regeneration) {
            return 0;
        }
        let before = self.health;
        self.health = (self.health + REGEN_PER_TRAVEL).min(MAX_HEALTH);
        self.health - before
    }

    fn find_treasure(&mut self) -> Encounter {
        let Some(item) = TREASURES.choose(&mut self.rng).copied() else {
            return Encounter::Quiet;
        };
        if self.has_item(item) {
            return Encounter::Duplicate {
                item: item.to_string(),
            };
        }

        self.inventory.push(item.to_string());
        self.score += TREASURE_SCORE;
        self.message.push_str(&format!(" You found a {}!", item));
        self.particles.spawn_burst(
            &mut self.rng,
            15,
            glam::Vec2::new(50.0, 50.0),
            ParticleColor::Treasure,
            BurstOptions::default(),
        );
        if item == HEALING_HERBS {
            self.effects
                .activate(EffectKind::Regeneration, REGEN_DURATION_MS, self.clock_ms);
        }
        Encounter::Treasure {
            item: item.to_string(),
        }
    }

    fn fight(&mut self) -> Encounter {
        let damage = random_int(&mut self.rng, 5, 24) as u32;
        self.health = self.health.saturating_sub(damage);
        self.message
            .push_str(&format!(" You encountered a monster and took {} damage!", damage));
        if self.health == 0 {
            self.over = true;
            self.effects.end();
            Encounter::Defeated { damage }
        } else {
            self.score += COMBAT_SCORE;
            Encounter::Combat { damage }
        }
    }

    fn level_up(&mut self, old_score: u64) -> u64 {
        let crossed = bands_crossed(old_score, self.score, LEVEL_BAND);
        self.level += crossed as u32;
        crossed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::NullSink;

    #[derive(Default)]
    struct Recorder(Vec<u64>);

    impl ProgressSink for Recorder {
        fn on_game_over(&mut self, _game_id: &str, final_score: u64) {
            self.0.push(final_score);
        }
    }

    fn adventure() -> Adventure {
        Adventure::new(42, SessionId(1), 64)
    }

    #[test]
    fn test_starts_in_village() {
        let a = adventure();
        assert_eq!(a.location, Location::Village);
        assert_eq!(a.health, 100);
        assert!(a.has_item(HEALTH_POTION));
    }

    #[test]
    fn test_illegal_route_rejected() {
        let mut a = adventure();
        let err = a.travel(Location::Peak, &mut NullSink).unwrap_err();
        assert_eq!(
            err,
            AdventureError::NoRoute {
                from: "village",
                to: "peak"
            }
        );
        assert_eq!(a.location, Location::Village);
        assert_eq!(a.score, 0);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let mut a = adventure();
        assert!(matches!(
            a.travel_to("moon", &mut NullSink),
            Err(AdventureError::NoRoute { .. })
        ));
    }

    #[test]
    fn test_travel_scores_and_stays_in_bounds() {
        let mut a = adventure();
        let route = [Location::Tavern, Location::Village, Location::Tavern, Location::Village];
        for to in route {
            let report = a.travel(to, &mut NullSink).unwrap();
            // Town is safe: no combat damage
            assert!(!matches!(report.encounter, Encounter::Combat { .. }));
        }
        assert_eq!(a.health, 100);
        assert!(a.score >= 40);
    }

    #[test]
    fn test_quest_only_at_board() {
        let mut a = adventure();
        assert_eq!(a.accept_quest(), Err(AdventureError::NotAtQuestBoard));
        a.location = Location::QuestBoard;
        let before = a.score;
        assert_eq!(a.accept_quest(), Ok(before + 50));
    }

    #[test]
    fn test_potion_heals_once() {
        let mut a = adventure();
        a.health = 90;
        assert_eq!(a.use_potion(), Ok(10));
        assert_eq!(a.health, 100);
        assert_eq!(a.use_potion(), Err(AdventureError::MissingItem(HEALTH_POTION)));
    }

    #[test]
    fn test_death_reported_once() {
        let mut sink = Recorder::default();
        let mut a = adventure();
        a.health = 1;
        // Bounce between forest and cave until a monster shows up
        a.location = Location::Forest;
        let mut to = Location::Cave;
        for _ in 0..500 {
            if a.over {
                break;
            }
            a.travel(to, &mut sink).unwrap();
            to = if to == Location::Cave { Location::Forest } else { Location::Cave };
        }
        assert!(a.over);
        assert_eq!(a.health, 0);
        assert_eq!(sink.0, vec![a.score]);
        assert_eq!(a.travel(Location::Forest, &mut sink), Err(AdventureError::Over));
    }

    #[test]
    fn test_healing_herbs_regenerate() {
        let mut a = adventure();
        a.health = 50;
        // Already carried, so no fresh find can restart the buff
        a.inventory.push(HEALING_HERBS.to_string());
        a.effects
            .activate(EffectKind::Regeneration, REGEN_DURATION_MS, a.clock_ms);
        let report = a.travel(Location::Tavern, &mut NullSink).unwrap();
        assert_eq!(report.regenerated, REGEN_PER_TRAVEL);
        for _ in 0..6 {
            let back = if a.location == Location::Tavern { Location::Village } else { Location::Tavern };
            a.travel(back, &mut NullSink).unwrap();
        }
        assert!(!a.effects.is_active(EffectKind::Regeneration));
    }
}
