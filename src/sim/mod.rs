//! Deterministic simulation module
//!
//! All arcade gameplay logic lives here. This module must be pure and
//! deterministic:
//! - Logical clock only, advanced per processed tick
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod collision;
pub mod conquest;
pub mod difficulty;
pub mod effects;
pub mod entity;
pub mod input;
pub mod particles;
pub mod rules;
pub mod scheduler;
pub mod spatial;
pub mod spawn;
pub mod state;
pub mod tick;

pub use conquest::{ClickOutcome, ConquestRules, ConquestState, MapStatus, Owner, Territory};
pub use difficulty::{Difficulty, DifficultyCurve};
pub use effects::{EffectKind, EffectManager, ExpiryHandle, SessionId, StatusEffect};
pub use entity::{Entity, EntityId, EntityKind, KindSpec, Registry};
pub use input::{InputTracker, Intent, Intents, TickInput};
pub use particles::{Particle, ParticleColor, ParticleSystem};
pub use rules::{GameKind, Movement, Ruleset};
pub use scheduler::{GameLoop, NullSink, ProgressSink};
pub use state::{GameConfig, GameEvent, Outcome, Player, Session, Snapshot};
pub use tick::tick;
