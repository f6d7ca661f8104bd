//! Player profile and per-game leaderboards
//!
//! In-memory only; the portal seeds it from its mock user and every finished
//! run is recorded through `ProgressSink`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::GAME_OVER_XP;
use crate::sim::ProgressSink;

/// Maximum number of scores kept per game
pub const MAX_HIGH_SCORES: usize = 10;

/// XP threshold growth per level gained
pub const LEVEL_XP_STEP: u32 = 250;

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: u64,
    /// Profile run counter when achieved
    pub run: u32,
}

/// Top scores for one game, sorted descending
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTable {
    pub entries: Vec<ScoreEntry>,
}

impl ScoreTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the table
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert a score if it qualifies, returning the rank achieved
    pub fn add_score(&mut self, score: u64, run: u32) -> Option<usize> {
        let rank = self.potential_rank(score)?;
        self.entries.insert(rank - 1, ScoreEntry { score, run });
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// What a finished run changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub game_id: String,
    pub final_score: u64,
    pub new_high_score: bool,
    /// Leaderboard rank, if the run made the table
    pub rank: Option<usize>,
    pub xp_gained: u32,
    pub levels_gained: u32,
    pub level: u32,
    pub xp: u32,
    pub next_level_xp: u32,
}

/// The signed-in player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub level: u32,
    pub xp: u32,
    pub next_level_xp: u32,
    pub coins: u32,
    pub games_played: u32,
    /// Best score per game id
    pub high_scores: BTreeMap<String, u64>,
    pub tables: BTreeMap<String, ScoreTable>,
    #[serde(skip)]
    pub last_update: Option<ProgressUpdate>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("Player")
    }
}

impl Profile {
    /// Fresh level-1 profile
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            level: 1,
            xp: 0,
            next_level_xp: 1000,
            coins: 0,
            games_played: 0,
            high_scores: BTreeMap::new(),
            tables: BTreeMap::new(),
            last_update: None,
        }
    }

    /// The portal's demo account
    pub fn demo() -> Self {
        let mut profile = Self::new("NeonWarrior");
        profile.level = 42;
        profile.xp = 4250;
        profile.next_level_xp = 5000;
        profile.coins = 2800;
        profile
    }

    pub fn high_score(&self, game_id: &str) -> Option<u64> {
        self.high_scores.get(game_id).copied()
    }

    pub fn table(&self, game_id: &str) -> Option<&ScoreTable> {
        self.tables.get(game_id)
    }

    /// Record a finished run: high score, leaderboard, XP and level
    pub fn record_run(&mut self, game_id: &str, final_score: u64) -> ProgressUpdate {
        self.games_played += 1;

        let previous = self.high_score(game_id);
        let new_high_score = previous.is_none_or(|best| final_score > best);
        if new_high_score {
            self.high_scores.insert(game_id.to_string(), final_score);
        }

        let rank = self
            .tables
            .entry(game_id.to_string())
            .or_default()
            .add_score(final_score, self.games_played);

        let levels_gained = self.grant_xp(GAME_OVER_XP);

        let update = ProgressUpdate {
            game_id: game_id.to_string(),
            final_score,
            new_high_score,
            rank,
            xp_gained: GAME_OVER_XP,
            levels_gained,
            level: self.level,
            xp: self.xp,
            next_level_xp: self.next_level_xp,
        };
        self.last_update = Some(update.clone());
        update
    }

    /// Add XP, carrying overflow into new levels. Returns levels gained.
    pub fn grant_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.next_level_xp > 0 && self.xp >= self.next_level_xp {
            self.xp -= self.next_level_xp;
            self.level += 1;
            self.next_level_xp += LEVEL_XP_STEP;
            gained += 1;
        }
        gained
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            log::warn!("Profile serialization failed: {}", e);
            String::from("null")
        })
    }
}

impl ProgressSink for Profile {
    fn on_game_over(&mut self, game_id: &str, final_score: u64) {
        let update = self.record_run(game_id, final_score);
        log::info!(
            "{} finished with {} (high score: {}, rank: {:?}, level {})",
            game_id,
            final_score,
            update.new_high_score,
            update.rank,
            update.level
        );
    }
}
