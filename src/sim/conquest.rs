//! Territory layer for the conquest game
//!
//! Runs beside the per-frame pipeline: clicks are resolved inside the
//! regular tick, while income and the scripted opponent advance on a coarse
//! round timer driven by the scheduler.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::spatial::{distance, random_range};
use crate::error::ConquestError;

/// Who holds a territory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Neutral,
    Player,
    Enemy,
}

/// A territory (planet) on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Territory {
    pub id: u32,
    pub pos: Vec2,
    pub size: f32,
    pub owner: Owner,
}

/// Economy, cost and AI tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConquestRules {
    pub territory_count: usize,
    pub map_min: f32,
    pub map_max: f32,
    pub size_min: f32,
    pub size_max: f32,
    pub start_resources: u32,
    /// Resources per owned territory per round
    pub income_per_territory: u32,
    /// Score per round survived
    pub round_score: u64,
    pub cost_per_distance: f32,
    pub cost_per_size: f32,
    /// Extra fraction of the base cost for enemy-held targets
    pub defense_surcharge: f32,
    pub conquest_bonus: u64,
    /// Chance per round that the opponent moves
    pub ai_move_chance: f64,
    /// Victory bonus per held territory
    pub victory_bonus_per_territory: u64,
}

impl Default for ConquestRules {
    fn default() -> Self {
        Self {
            territory_count: 15,
            map_min: 10.0,
            map_max: 90.0,
            size_min: 5.0,
            size_max: 20.0,
            start_resources: 100,
            income_per_territory: 2,
            round_score: 1,
            cost_per_distance: 2.0,
            cost_per_size: 5.0,
            defense_surcharge: 0.5,
            conquest_bonus: 100,
            ai_move_chance: 0.2,
            victory_bonus_per_territory: 1000,
        }
    }
}

/// Result of an accepted click
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClickOutcome {
    Selected(u32),
    Conquered {
        id: u32,
        cost: u32,
        bonus: u64,
        was_enemy: bool,
    },
}

/// What the opponent did in a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMove {
    pub territory: u32,
    pub taken_from: Owner,
}

/// Summary of one economy round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub income: u32,
    pub ai_move: Option<AiMove>,
}

/// End state of the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapStatus {
    Contested,
    Victory,
    Defeat,
}

/// Map, treasury and selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConquestState {
    pub territories: Vec<Territory>,
    pub resources: u32,
    pub selected: Option<u32>,
    pub rounds: u64,
}

impl ConquestState {
    /// Random map; territory 0 starts as the player's
    pub fn generate<R: Rng + ?Sized>(rules: &ConquestRules, rng: &mut R) -> Self {
        let territories = (0..rules.territory_count)
            .map(|i| Territory {
                id: i as u32,
                pos: Vec2::new(
                    random_range(rng, rules.map_min, rules.map_max),
                    random_range(rng, rules.map_min, rules.map_max),
                ),
                size: random_range(rng, rules.size_min, rules.size_max),
                owner: if i == 0 { Owner::Player } else { Owner::Neutral },
            })
            .collect();
        Self::with_territories(rules, territories)
    }

    pub fn with_territories(rules: &ConquestRules, territories: Vec<Territory>) -> Self {
        Self {
            territories,
            resources: rules.start_resources,
            selected: None,
            rounds: 0,
        }
    }

    pub fn territory(&self, id: u32) -> Option<&Territory> {
        self.territories.iter().find(|t| t.id == id)
    }

    fn territory_mut(&mut self, id: u32) -> Option<&mut Territory> {
        self.territories.iter_mut().find(|t| t.id == id)
    }

    pub fn count(&self, owner: Owner) -> usize {
        self.territories.iter().filter(|t| t.owner == owner).count()
    }

    pub fn status(&self) -> MapStatus {
        if self.count(Owner::Player) == 0 {
            MapStatus::Defeat
        } else if self.count(Owner::Neutral) == 0 && self.count(Owner::Enemy) == 0 {
            MapStatus::Victory
        } else {
            MapStatus::Contested
        }
    }

    /// Resolve a click: own territory selects it, anything else is an
    /// acquisition attempt from the current selection
    pub fn click(&mut self, rules: &ConquestRules, id: u32) -> Result<ClickOutcome, ConquestError> {
        let target = self
            .territory(id)
            .ok_or(ConquestError::UnknownTerritory(id))?
            .clone();

        if target.owner == Owner::Player {
            self.selected = Some(id);
            return Ok(ClickOutcome::Selected(id));
        }

        let source_id = self.selected.ok_or(ConquestError::NoSourceSelected)?;
        let source = match self.territory(source_id) {
            Some(t) if t.owner == Owner::Player => t.clone(),
            _ => {
                // Lost to the opponent since it was selected
                self.selected = None;
                return Err(ConquestError::NotOwned(source_id));
            }
        };

        let cost = acquisition_cost(rules, &source, &target);
        if self.resources < cost {
            return Err(ConquestError::InsufficientResources {
                cost,
                available: self.resources,
            });
        }

        let was_enemy = target.owner == Owner::Enemy;
        self.resources -= cost;
        if let Some(t) = self.territory_mut(id) {
            t.owner = Owner::Player;
        }
        self.selected = None;
        let bonus = if was_enemy {
            rules.conquest_bonus * 2
        } else {
            rules.conquest_bonus
        };
        Ok(ClickOutcome::Conquered {
            id,
            cost,
            bonus,
            was_enemy,
        })
    }

    /// One coarse round: income, then the opponent's move
    pub fn round<R: Rng + ?Sized>(&mut self, rules: &ConquestRules, rng: &mut R) -> RoundReport {
        self.rounds += 1;
        let income = self.count(Owner::Player) as u32 * rules.income_per_territory;
        self.resources = self.resources.saturating_add(income);

        let ai_move = if rng.random_bool(rules.ai_move_chance.clamp(0.0, 1.0)) {
            self.opponent_move(rng)
        } else {
            None
        };
        RoundReport { income, ai_move }
    }

    fn opponent_move<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<AiMove> {
        let neutral: Vec<&Territory> = self
            .territories
            .iter()
            .filter(|t| t.owner == Owner::Neutral)
            .collect();

        let pick = if !neutral.is_empty() {
            let holdings: Vec<Vec2> = self
                .territories
                .iter()
                .filter(|t| t.owner == Owner::Enemy)
                .map(|t| t.pos)
                .collect();
            if holdings.is_empty() {
                neutral.choose(rng).map(|t| t.id)
            } else {
                // Expand toward the nearest uncontested territory
                neutral
                    .iter()
                    .min_by(|a, b| {
                        let da = nearest(&holdings, a.pos);
                        let db = nearest(&holdings, b.pos);
                        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .map(|t| t.id)
            }
        } else {
            let held: Vec<u32> = self
                .territories
                .iter()
                .filter(|t| t.owner == Owner::Player)
                .map(|t| t.id)
                .collect();
            held.choose(rng).copied()
        }?;

        let territory = self.territory_mut(pick)?;
        let taken_from = territory.owner;
        territory.owner = Owner::Enemy;
        if self.selected == Some(pick) {
            self.selected = None;
        }
        log::debug!("Opponent took territory {} from {:?}", pick, taken_from);
        Some(AiMove {
            territory: pick,
            taken_from,
        })
    }

    /// Final score bonus on victory
    pub fn victory_bonus(&self, rules: &ConquestRules) -> u64 {
        self.resources as u64 + self.count(Owner::Player) as u64 * rules.victory_bonus_per_territory
    }
}

fn nearest(points: &[Vec2], to: Vec2) -> f32 {
    points
        .iter()
        .map(|p| distance(*p, to))
        .fold(f32::MAX, f32::min)
}

/// Cost to take `target` from `source`: distance and size terms, plus the
/// defense surcharge when the target is enemy-held
pub fn acquisition_cost(rules: &ConquestRules, source: &Territory, target: &Territory) -> u32 {
    let base = distance(source.pos, target.pos) * rules.cost_per_distance
        + target.size * rules.cost_per_size;
    let cost = if target.owner == Owner::Enemy {
        base * (1.0 + rules.defense_surcharge)
    } else {
        base
    };
    cost.floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn territory(id: u32, x: f32, y: f32, size: f32, owner: Owner) -> Territory {
        Territory {
            id,
            pos: Vec2::new(x, y),
            size,
            owner,
        }
    }

    fn small_map() -> (ConquestRules, ConquestState) {
        let rules = ConquestRules::default();
        let map = ConquestState::with_territories(
            &rules,
            vec![
                territory(0, 10.0, 10.0, 8.0, Owner::Player),
                territory(1, 13.0, 14.0, 10.0, Owner::Neutral),
                territory(2, 10.0, 20.0, 6.0, Owner::Enemy),
            ],
        );
        (rules, map)
    }

    #[test]
    fn test_cost_formula() {
        let (rules, map) = small_map();
        // distance 5 -> 10, size 10 -> 50
        assert_eq!(acquisition_cost(&rules, &map.territories[0], &map.territories[1]), 60);
        // distance 10 -> 20, size 6 -> 30, enemy +50%
        assert_eq!(acquisition_cost(&rules, &map.territories[0], &map.territories[2]), 75);
    }

    #[test]
    fn test_select_then_conquer() {
        let (rules, mut map) = small_map();
        assert_eq!(map.click(&rules, 0), Ok(ClickOutcome::Selected(0)));
        let outcome = map.click(&rules, 1).unwrap();
        assert_eq!(
            outcome,
            ClickOutcome::Conquered { id: 1, cost: 60, bonus: 100, was_enemy: false }
        );
        assert_eq!(map.resources, 40);
        assert_eq!(map.territory(1).unwrap().owner, Owner::Player);
        assert_eq!(map.selected, None);
    }

    #[test]
    fn test_enemy_target_doubles_bonus() {
        let (rules, mut map) = small_map();
        map.click(&rules, 0).unwrap();
        match map.click(&rules, 2).unwrap() {
            ClickOutcome::Conquered { bonus, was_enemy, cost, .. } => {
                assert_eq!(bonus, 200);
                assert!(was_enemy);
                assert_eq!(cost, 75);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rejections_leave_state_untouched() {
        let (rules, mut map) = small_map();
        assert_eq!(map.click(&rules, 1), Err(ConquestError::NoSourceSelected));
        assert_eq!(map.click(&rules, 9), Err(ConquestError::UnknownTerritory(9)));

        map.resources = 59;
        map.click(&rules, 0).unwrap();
        assert_eq!(
            map.click(&rules, 1),
            Err(ConquestError::InsufficientResources { cost: 60, available: 59 })
        );
        assert_eq!(map.resources, 59);
        assert_eq!(map.territory(1).unwrap().owner, Owner::Neutral);
        assert_eq!(map.selected, Some(0));
    }

    #[test]
    fn test_round_income_and_ai() {
        let (mut rules, mut map) = small_map();
        rules.ai_move_chance = 1.0;
        let mut rng = Pcg32::seed_from_u64(5);
        let report = map.round(&rules, &mut rng);
        assert_eq!(report.income, 2);
        assert_eq!(map.resources, 102);
        // The only neutral territory goes to the opponent
        assert_eq!(report.ai_move, Some(AiMove { territory: 1, taken_from: Owner::Neutral }));

        // No neutral left: the opponent attacks the player
        let report = map.round(&rules, &mut rng);
        assert_eq!(report.ai_move, Some(AiMove { territory: 0, taken_from: Owner::Player }));
        assert_eq!(map.status(), MapStatus::Defeat);
    }

    #[test]
    fn test_status() {
        let rules = ConquestRules::default();
        let map = ConquestState::with_territories(
            &rules,
            vec![territory(0, 0.0, 0.0, 5.0, Owner::Player), territory(1, 5.0, 5.0, 5.0, Owner::Player)],
        );
        assert_eq!(map.status(), MapStatus::Victory);
        assert_eq!(map.victory_bonus(&rules), 100 + 2000);
    }

    #[test]
    fn test_generate_layout() {
        let rules = ConquestRules::default();
        let mut rng = Pcg32::seed_from_u64(11);
        let map = ConquestState::generate(&rules, &mut rng);
        assert_eq!(map.territories.len(), 15);
        assert_eq!(map.count(Owner::Player), 1);
        assert_eq!(map.territories[0].owner, Owner::Player);
        for t in &map.territories {
            assert!(t.pos.x >= 10.0 && t.pos.x < 90.0);
            assert!(t.size >= 5.0 && t.size < 20.0);
        }
    }
}
