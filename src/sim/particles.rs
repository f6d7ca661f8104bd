//! Visual feedback particles
//!
//! Particles never take part in gameplay; they are only carried in the
//! session so the renderer can read them from the post-tick snapshot.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::spatial::random_range;

/// Palette index the renderer maps to a color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleColor {
    Explosion,
    Spark,
    Shield,
    PowerUp,
    Conquest,
    Treasure,
}

/// A single particle. `life` counts down in ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: ParticleColor,
    pub size: f32,
    pub life: f32,
    pub max_life: f32,
}

impl Particle {
    /// Remaining life as a 0-1 ratio (for opacity fades)
    pub fn fade(&self) -> f32 {
        if self.max_life <= 0.0 {
            0.0
        } else {
            (self.life / self.max_life).clamp(0.0, 1.0)
        }
    }
}

/// Shape of a burst
#[derive(Debug, Clone, Copy)]
pub struct BurstOptions {
    pub spread: Vec2,
    pub size_min: f32,
    pub size_max: f32,
    pub life_min: f32,
    pub life_max: f32,
}

impl Default for BurstOptions {
    fn default() -> Self {
        Self {
            spread: Vec2::splat(2.0),
            size_min: 1.0,
            size_max: 4.0,
            life_min: 20.0,
            life_max: 50.0,
        }
    }
}

/// Owns all live particles for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleSystem {
    pub particles: Vec<Particle>,
    cap: usize,
}

impl ParticleSystem {
    pub fn new(cap: usize) -> Self {
        Self {
            particles: Vec::new(),
            cap,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawn `count` particles at `pos`. When the cap is hit the oldest
    /// particles are dropped first.
    pub fn spawn_burst<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        count: usize,
        pos: Vec2,
        color: ParticleColor,
        opts: BurstOptions,
    ) {
        if self.cap == 0 {
            return;
        }
        for _ in 0..count {
            let vel = Vec2::new(
                (rng.random::<f32>() - 0.5) * opts.spread.x,
                (rng.random::<f32>() - 0.5) * opts.spread.y,
            );
            self.particles.push(Particle {
                pos,
                vel,
                color,
                size: random_range(rng, opts.size_min, opts.size_max),
                life: random_range(rng, opts.life_min, opts.life_max),
                max_life: opts.life_max,
            });
        }
        if self.particles.len() > self.cap {
            let excess = self.particles.len() - self.cap;
            self.particles.drain(..excess);
        }
    }

    /// Advance every particle one tick and drop the dead ones
    pub fn update(&mut self) {
        for p in self.particles.iter_mut() {
            p.pos += p.vel;
            // Shrink over the last fifth of the lifetime
            if p.life <= p.max_life * 0.2 {
                p.size *= 0.9;
            }
            p.life -= 1.0;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
