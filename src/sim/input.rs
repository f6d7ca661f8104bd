//! Keyboard/pointer intents
//!
//! Directions and fire are level-triggered: they stay set while the key is
//! held and are sampled once per tick. Territory clicks are edge-triggered
//! and consumed by the tick that samples them.

use serde::{Deserialize, Serialize};

/// Held intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    Left,
    Right,
    Up,
    Down,
    Fire,
}

impl Intent {
    /// Map a DOM `KeyboardEvent.key` (or a plain intent name) to an intent
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" | "left" => Some(Intent::Left),
            "ArrowRight" | "d" | "D" | "right" => Some(Intent::Right),
            "ArrowUp" | "w" | "W" | "up" => Some(Intent::Up),
            "ArrowDown" | "s" | "S" | "down" => Some(Intent::Down),
            " " | "Space" | "Spacebar" | "fire" => Some(Intent::Fire),
            _ => None,
        }
    }
}

/// Snapshot of held intents for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intents {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
}

impl Intents {
    pub fn set(&mut self, intent: Intent, held: bool) {
        match intent {
            Intent::Left => self.left = held,
            Intent::Right => self.right = held,
            Intent::Up => self.up = held,
            Intent::Down => self.down = held,
            Intent::Fire => self.fire = held,
        }
    }

    pub fn is_held(&self, intent: Intent) -> bool {
        match intent {
            Intent::Left => self.left,
            Intent::Right => self.right,
            Intent::Up => self.up,
            Intent::Down => self.down,
            Intent::Fire => self.fire,
        }
    }

    /// Horizontal axis in {-1, 0, 1}; opposite keys cancel
    pub fn axis_x(&self) -> f32 {
        (self.right as i8 - self.left as i8) as f32
    }

    /// Vertical axis in {-1, 0, 1}, +1 is down the field
    pub fn axis_y(&self) -> f32 {
        (self.down as i8 - self.up as i8) as f32
    }
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    pub intents: Intents,
    /// Territory clicks since the last tick, in order
    pub clicks: Vec<u32>,
}

/// Accumulates raw key events between ticks
#[derive(Debug, Clone, Default)]
pub struct InputTracker {
    held: Intents,
    clicks: Vec<u32>,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false (and changes nothing) for unrecognized keys
    pub fn key_down(&mut self, key: &str) -> bool {
        self.set_key(key, true)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.set_key(key, false)
    }

    fn set_key(&mut self, key: &str, held: bool) -> bool {
        match Intent::from_key(key) {
            Some(intent) => {
                self.held.set(intent, held);
                true
            }
            None => false,
        }
    }

    pub fn click(&mut self, territory: u32) {
        self.clicks.push(territory);
    }

    pub fn held(&self) -> Intents {
        self.held
    }

    /// Sample for one tick: held intents are kept, clicks are drained
    pub fn sample(&mut self) -> TickInput {
        TickInput {
            intents: self.held,
            clicks: std::mem::take(&mut self.clicks),
        }
    }

    /// Release everything (focus loss, new run)
    pub fn reset(&mut self) {
        self.held = Intents::default();
        self.clicks.clear();
    }
}
