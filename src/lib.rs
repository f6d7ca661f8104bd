//! Neon Arcade - simulation core for the portal's mini-games
//!
//! Core modules:
//! - `sim`: Deterministic arcade engine (entities, collisions, effects, scheduling)
//! - `adventure`: Menu-driven RPG state machine
//! - `profile`: In-memory player profile that receives finished runs
//! - `settings`: Player preferences and quality presets
//! - `web`: Browser bindings (wasm32 only)

pub mod adventure;
pub mod error;
pub mod profile;
pub mod settings;
pub mod sim;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use error::{AdventureError, ConfigError, ConquestError};
pub use profile::{Profile, ProgressUpdate, ScoreTable};
pub use settings::{QualityPreset, Settings};

/// Engine configuration constants
pub mod consts {
    /// Minimum host time between two processed frames (ms)
    pub const TICK_INTERVAL_MS: f64 = 16.0;

    /// Logical play-field extent on each axis (percent of the viewport)
    pub const FIELD_SIZE: f32 = 100.0;

    /// Player health at the start of every run
    pub const DEFAULT_PLAYER_HEALTH: u32 = 100;

    /// Hard cap on live particles regardless of quality preset
    pub const MAX_PARTICLES: usize = 512;

    /// Conquest economy/AI cadence (logical ms)
    pub const CONQUEST_ROUND_MS: f64 = 1000.0;

    /// XP granted to the profile for every finished run
    pub const GAME_OVER_XP: u32 = 50;

    /// Score band for level-up signaling
    pub const LEVEL_BAND: u64 = 500;
}
