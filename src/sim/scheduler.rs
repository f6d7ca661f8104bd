//! Frame scheduling
//!
//! The host calls `frame` once per display frame with a monotonic timestamp.
//! A frame less than `TICK_INTERVAL_MS` after the last processed one is
//! ignored; otherwise exactly one tick runs. There is no catch-up: a long
//! stall costs one tick, not a burst of them. The conquest round timer runs
//! on the session's logical clock and is dropped when the run stops.

use super::effects::SessionId;
use super::input::TickInput;
use super::rules::GameKind;
use super::state::{GameConfig, Session, Snapshot};
use super::tick::tick;
use crate::consts::{CONQUEST_ROUND_MS, TICK_INTERVAL_MS};

/// Receives run results
pub trait ProgressSink {
    /// Called exactly once per run that reaches a terminal condition
    fn on_game_over(&mut self, game_id: &str, final_score: u64);

    /// Called after a frame in which the score changed
    fn on_score_change(&mut self, _game_id: &str, _score: u64) {}
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_game_over(&mut self, _game_id: &str, _final_score: u64) {}
}

/// Repeating timer on a session's logical clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalTimer {
    pub session: SessionId,
    pub period_ms: f64,
    pub next_due_ms: f64,
}

impl IntervalTimer {
    pub fn new(session: SessionId, period_ms: f64, now_ms: f64) -> Self {
        Self {
            session,
            period_ms,
            next_due_ms: now_ms + period_ms,
        }
    }

    /// Fires at most once per poll; stale sessions never fire
    pub fn poll(&mut self, session: SessionId, now_ms: f64) -> bool {
        if session != self.session || now_ms < self.next_due_ms {
            return false;
        }
        self.next_due_ms += self.period_ms;
        // Skip missed periods rather than bursting
        if self.next_due_ms <= now_ms {
            self.next_due_ms = now_ms + self.period_ms;
        }
        true
    }
}

/// Owns the active session and drives it from host frames
#[derive(Debug)]
pub struct GameLoop<S: ProgressSink> {
    sink: S,
    session: Option<Session>,
    generation: u64,
    last_frame_ms: Option<f64>,
    paused: bool,
    round_timer: Option<IntervalTimer>,
    reported: bool,
}

impl<S: ProgressSink> GameLoop<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            session: None,
            generation: 0,
            last_frame_ms: None,
            paused: false,
            round_timer: None,
            reported: false,
        }
    }

    /// Begin a fresh run, discarding any previous one
    pub fn start(&mut self, config: &GameConfig) -> SessionId {
        self.stop();
        self.generation += 1;
        let id = SessionId(self.generation);
        let session = Session::new(config, id);

        self.round_timer = session
            .conquest
            .as_ref()
            .map(|_| IntervalTimer::new(id, CONQUEST_ROUND_MS, session.clock_ms));
        log::info!(
            "Starting {} (session {}, seed {})",
            session.game().id(),
            id.0,
            config.seed
        );

        self.session = Some(session);
        self.last_frame_ms = None;
        self.paused = false;
        self.reported = false;
        id
    }

    /// End the run without reporting a result. Timers for it become inert.
    pub fn stop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if session.running {
                log::debug!("Stopping session {}", session.id.0);
            }
            session.end();
        }
        self.round_timer = None;
        self.last_frame_ms = None;
        self.paused = false;
    }

    pub fn pause(&mut self) {
        if self.is_running() {
            self.paused = true;
        }
    }

    /// Resume from pause; the next frame re-anchors the clock
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.last_frame_ms = None;
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_running(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.running)
    }

    /// Whether a frame at `timestamp_ms` would run a tick
    pub fn is_due(&self, timestamp_ms: f64) -> bool {
        self.is_running() && !self.paused && due(self.last_frame_ms, timestamp_ms)
    }

    /// Process one host frame. Returns whether the run continues.
    pub fn frame(&mut self, timestamp_ms: f64, input: &TickInput) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if !session.running {
            return false;
        }
        if self.paused || !due(self.last_frame_ms, timestamp_ms) {
            return true;
        }
        self.last_frame_ms = Some(timestamp_ms);

        let score_before = session.score;
        let mut running = tick(session, input);

        if running {
            if let Some(timer) = self.round_timer.as_mut() {
                if timer.poll(session.id, session.clock_ms) {
                    session.conquest_round();
                    running = session.running;
                }
            }
        }

        let game_id = session.game().id();
        if session.score != score_before {
            self.sink.on_score_change(game_id, session.score);
        }
        if session.game_over && !self.reported {
            self.reported = true;
            self.round_timer = None;
            let final_score = session.final_score.unwrap_or(session.score);
            self.sink.on_game_over(game_id, final_score);
        }
        running
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut Session> {
        self.session.as_mut()
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.session.as_ref().map(Session::snapshot)
    }

    pub fn game(&self) -> Option<GameKind> {
        self.session.as_ref().map(Session::game)
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

fn due(last_frame_ms: Option<f64>, timestamp_ms: f64) -> bool {
    last_frame_ms.is_none_or(|last| timestamp_ms - last >= TICK_INTERVAL_MS)
}
