//! Difficulty escalation and level-up detection
//!
//! Both parameters only ever grow and are capped by the curve maxima.
//! Score thresholds use band bucketing: the number of bands crossed between
//! two scores is `new / band - old / band`, so a large jump fires once per
//! crossed band and the same band never fires twice.

use serde::{Deserialize, Serialize};

/// Tuning for one game's escalation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    pub base_spawn_chance: f32,
    pub max_spawn_chance: f32,
    /// Continuous growth per tick
    #[serde(default)]
    pub spawn_chance_per_tick: f32,
    pub base_speed: f32,
    pub max_speed: f32,
    #[serde(default)]
    pub speed_per_tick: f32,
    /// Points per threshold step (0 disables stepping)
    #[serde(default)]
    pub step_points: u64,
    #[serde(default)]
    pub spawn_chance_step: f32,
    #[serde(default)]
    pub speed_step: f32,
}

/// Current difficulty parameters of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub spawn_chance: f32,
    pub speed: f32,
    /// Threshold steps applied so far
    pub steps: u64,
}

impl Difficulty {
    pub fn new(curve: &DifficultyCurve) -> Self {
        Self {
            spawn_chance: curve.base_spawn_chance,
            speed: curve.base_speed,
            steps: 0,
        }
    }

    /// Continuous per-tick growth
    pub fn tick(&mut self, curve: &DifficultyCurve) {
        self.spawn_chance =
            (self.spawn_chance + curve.spawn_chance_per_tick).min(curve.max_spawn_chance);
        self.speed = (self.speed + curve.speed_per_tick).min(curve.max_speed);
    }

    /// Apply threshold steps for a score change. Returns how many steps fired.
    pub fn on_score(&mut self, curve: &DifficultyCurve, old_score: u64, new_score: u64) -> u64 {
        let crossed = bands_crossed(old_score, new_score, curve.step_points);
        for _ in 0..crossed {
            self.spawn_chance =
                (self.spawn_chance + curve.spawn_chance_step).min(curve.max_spawn_chance);
            self.speed = (self.speed + curve.speed_step).min(curve.max_speed);
        }
        self.steps += crossed;
        crossed
    }
}

/// Number of `band` multiples crossed going from `old` to `new`
pub fn bands_crossed(old: u64, new: u64, band: u64) -> u64 {
    if band == 0 || new <= old {
        return 0;
    }
    new / band - old / band
}

/// Level for a score (1-based)
pub fn level_for(score: u64, band: u64) -> u32 {
    if band == 0 {
        return 1;
    }
    (score / band) as u32 + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> DifficultyCurve {
        DifficultyCurve {
            base_spawn_chance: 0.05,
            max_spawn_chance: 0.1,
            spawn_chance_per_tick: 0.0,
            base_speed: 1.0,
            max_speed: 3.0,
            speed_per_tick: 0.0,
            step_points: 500,
            spawn_chance_step: 0.005,
            speed_step: 0.2,
        }
    }

    #[test]
    fn test_bands_crossed() {
        assert_eq!(bands_crossed(0, 499, 500), 0);
        assert_eq!(bands_crossed(499, 500, 500), 1);
        assert_eq!(bands_crossed(500, 501, 500), 0);
        // Jump over two bands in one update
        assert_eq!(bands_crossed(480, 1020, 500), 2);
        assert_eq!(bands_crossed(100, 90, 500), 0);
        assert_eq!(bands_crossed(0, 10_000, 0), 0);
    }

    #[test]
    fn test_step_fires_once_per_band() {
        let c = curve();
        let mut d = Difficulty::new(&c);
        assert_eq!(d.on_score(&c, 499, 500), 1);
        // Staying inside the band never fires again
        assert_eq!(d.on_score(&c, 500, 501), 0);
        assert_eq!(d.on_score(&c, 501, 999), 0);
        assert!((d.speed - 1.2).abs() < 1e-6);
        assert_eq!(d.steps, 1);
    }

    #[test]
    fn test_capped_at_maximum() {
        let c = curve();
        let mut d = Difficulty::new(&c);
        d.on_score(&c, 0, 100_000);
        assert_eq!(d.speed, 3.0);
        assert_eq!(d.spawn_chance, 0.1);
    }

    #[test]
    fn test_continuous_growth_is_monotonic_and_bounded() {
        let c = DifficultyCurve {
            spawn_chance_per_tick: 0.01,
            speed_per_tick: 0.5,
            ..curve()
        };
        let mut d = Difficulty::new(&c);
        let mut prev = d;
        for _ in 0..20 {
            d.tick(&c);
            assert!(d.spawn_chance >= prev.spawn_chance && d.speed >= prev.speed);
            prev = d;
        }
        assert_eq!(d.spawn_chance, 0.1);
        assert_eq!(d.speed, 3.0);
    }

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(0, 500), 1);
        assert_eq!(level_for(499, 500), 1);
        assert_eq!(level_for(1000, 500), 3);
    }
}
