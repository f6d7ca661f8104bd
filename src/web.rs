//! Browser bindings
//!
//! The portal page owns the canvas and the `requestAnimationFrame` loop; it
//! forwards keyboard events and territory clicks here, calls `frame` with the
//! rAF timestamp and draws from `snapshot_json`.

use wasm_bindgen::prelude::*;

use crate::profile::Profile;
use crate::settings::Settings;
use crate::sim::{GameConfig, GameKind, GameLoop, InputTracker, TickInput, autopilot};

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    // Ignored if the page already installed a logger
    let _ = console_log::init_with_level(log::Level::Info);
}

/// One arcade cabinet: a game loop, its input and the player's profile
#[wasm_bindgen]
pub struct WebArcade {
    game: GameKind,
    seed: u64,
    settings: Settings,
    game_loop: GameLoop<Profile>,
    input: InputTracker,
    idle_mode: bool,
}

#[wasm_bindgen]
impl WebArcade {
    /// `game` is a catalog id such as "neon-racer-x". A zero seed picks one
    /// from the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(game: &str, seed: u64) -> Result<WebArcade, JsValue> {
        let kind = GameKind::from_id(game).ok_or_else(|| {
            log::warn!("Unknown game id {}", game);
            JsValue::from_str(&format!("unknown game: {}", game))
        })?;
        let seed = if seed == 0 {
            js_sys::Date::now() as u64
        } else {
            seed
        };
        Ok(Self {
            game: kind,
            seed,
            settings: Settings::default(),
            game_loop: GameLoop::new(Profile::demo()),
            input: InputTracker::new(),
            idle_mode: false,
        })
    }

    /// Apply settings JSON for the next `start`
    pub fn set_settings(&mut self, json: &str) -> Result<(), JsValue> {
        self.settings = Settings::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(())
    }

    /// Begin a run. Each start uses the next seed so replays differ.
    pub fn start(&mut self) -> u64 {
        let config = GameConfig::new(self.game, self.seed).with_settings(&self.settings);
        self.seed = self.seed.wrapping_add(1);
        self.input.reset();
        self.game_loop.start(&config).0
    }

    pub fn stop(&mut self) {
        self.game_loop.stop();
        self.input.reset();
    }

    pub fn pause(&mut self) {
        self.game_loop.pause();
    }

    pub fn resume(&mut self) {
        self.game_loop.resume();
    }

    pub fn is_running(&self) -> bool {
        self.game_loop.is_running()
    }

    pub fn set_idle_mode(&mut self, on: bool) {
        self.idle_mode = on;
        log::info!("Idle mode: {}", on);
    }

    pub fn key_down(&mut self, key: &str) -> bool {
        self.input.key_down(key)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        self.input.key_up(key)
    }

    /// Route a DOM keyboard event; returns true when the key was consumed
    pub fn keyboard_event(&mut self, event: &web_sys::KeyboardEvent, down: bool) -> bool {
        let key = event.key();
        match key.as_str() {
            "Escape" if down => {
                if self.game_loop.is_paused() {
                    self.resume();
                } else {
                    self.pause();
                }
                true
            }
            "i" | "I" if down => {
                self.set_idle_mode(!self.idle_mode);
                true
            }
            _ if down => self.input.key_down(&key),
            _ => self.input.key_up(&key),
        }
    }

    /// Queue a territory click for the next tick
    pub fn click_territory(&mut self, id: u32) {
        self.input.click(id);
    }

    /// Advance from a rAF timestamp. Returns false once the run is over.
    pub fn frame(&mut self, timestamp_ms: f64) -> bool {
        if !self.game_loop.is_due(timestamp_ms) {
            // Keep queued clicks for the tick that will consume them
            return self.game_loop.frame(timestamp_ms, &TickInput::default());
        }
        let input = match (self.idle_mode, self.game_loop.session()) {
            (true, Some(session)) => autopilot::input(session),
            _ => self.input.sample(),
        };
        self.game_loop.frame(timestamp_ms, &input)
    }

    pub fn snapshot_json(&self) -> String {
        self.game_loop
            .snapshot()
            .map(|s| s.to_json())
            .unwrap_or_else(|| String::from("null"))
    }

    pub fn profile_json(&self) -> String {
        self.game_loop.sink().to_json()
    }
}
