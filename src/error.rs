//! Error types
//!
//! The simulation itself never fails; these cover configuration loading and
//! player actions that can be rejected.

use thiserror::Error;

/// Ruleset/settings loading failures
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid ruleset value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Rejected conquest actions. All of these leave the session untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConquestError {
    #[error("no conquest map in this session")]
    NotStarted,
    #[error("unknown territory {0}")]
    UnknownTerritory(u32),
    #[error("territory {0} is not yours")]
    NotOwned(u32),
    #[error("select one of your territories first")]
    NoSourceSelected,
    #[error("not enough resources: need {cost}, have {available}")]
    InsufficientResources { cost: u32, available: u32 },
    #[error("the run is over")]
    RunOver,
}

/// Rejected adventure actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdventureError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: &'static str, to: &'static str },
    #[error("quests can only be accepted at the quest board")]
    NotAtQuestBoard,
    #[error("no {0} in the inventory")]
    MissingItem(&'static str),
    #[error("the adventure is over")]
    Over,
}
