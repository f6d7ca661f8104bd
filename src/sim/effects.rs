//! Timed status effects on the player
//!
//! At most one instance of each kind is active. Re-activating a kind moves
//! its deadline instead of stacking a second instance.

use serde::{Deserialize, Serialize};

/// Identity of one run. Handles from an older run are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub u64);

/// Status effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Negates damaging collisions
    Shield,
    /// Shorter fire cooldown
    RapidFire,
    /// Faster player movement
    SpeedBoost,
    /// Slower player movement (hazard penalty)
    Slowdown,
    /// Health restored over time (adventure)
    Regeneration,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EffectKind::Shield => "shield",
            EffectKind::RapidFire => "rapid-fire",
            EffectKind::SpeedBoost => "speed-boost",
            EffectKind::Slowdown => "slowdown",
            EffectKind::Regeneration => "regeneration",
        }
    }
}

/// One active effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: EffectKind,
    pub expires_at: f64,
}

/// Token returned by `activate`, for hosts that schedule their own
/// deferred expiry callbacks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpiryHandle {
    pub session: SessionId,
    pub kind: EffectKind,
    pub expires_at: f64,
}

/// Active effects for one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectManager {
    session: SessionId,
    active: Vec<StatusEffect>,
    ended: bool,
}

impl EffectManager {
    pub fn new(session: SessionId) -> Self {
        Self {
            session,
            active: Vec::new(),
            ended: false,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Activate `kind` until `now + duration_ms`. An already active effect
    /// of the same kind gets the new deadline.
    pub fn activate(&mut self, kind: EffectKind, duration_ms: f64, now: f64) -> ExpiryHandle {
        let expires_at = now + duration_ms;
        match self.active.iter_mut().find(|e| e.kind == kind) {
            Some(effect) => effect.expires_at = expires_at,
            None => self.active.push(StatusEffect { kind, expires_at }),
        }
        ExpiryHandle {
            session: self.session,
            kind,
            expires_at,
        }
    }

    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.active.iter().any(|e| e.kind == kind)
    }

    pub fn expires_at(&self, kind: EffectKind) -> Option<f64> {
        self.active.iter().find(|e| e.kind == kind).map(|e| e.expires_at)
    }

    pub fn active(&self) -> &[StatusEffect] {
        &self.active
    }

    /// Remove every effect whose deadline is at or before `now`, returning
    /// the expired kinds in activation order
    pub fn expire_due(&mut self, now: f64) -> Vec<EffectKind> {
        if self.ended {
            return Vec::new();
        }
        let mut expired = Vec::new();
        self.active.retain(|e| {
            if e.expires_at <= now {
                expired.push(e.kind);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Deferred expiry. No-op unless the handle belongs to this live session
    /// and still matches the current deadline (a refresh supersedes it).
    pub fn fire_expiry(&mut self, handle: &ExpiryHandle) -> bool {
        if self.ended || handle.session != self.session {
            log::warn!(
                "Ignoring stale {} expiry from session {:?}",
                handle.kind.as_str(),
                handle.session
            );
            return false;
        }
        let before = self.active.len();
        self.active
            .retain(|e| !(e.kind == handle.kind && e.expires_at == handle.expires_at));
        before != self.active.len()
    }

    /// Mark the owning session as finished; pending handles become inert
    pub fn end(&mut self) {
        self.ended = true;
        self.active.clear();
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}
