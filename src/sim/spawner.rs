//! Timed entity spawners with admission control
//!
//! Two independent instances run per level: one admits hostile agents, one
//! admits collectibles. Admission requires all three gates at once: the
//! interval has elapsed, the population is under the cap, and the candidate
//! location is far enough from the avatar. A rejected candidate does NOT
//! reset the accumulator, so the check retries every tick until it passes
//! (and can catch up with a burst once the avatar moves away).

use glam::Vec2;

/// State for one spawner instance
#[derive(Debug, Clone)]
pub struct SpawnerState {
    /// Seconds accumulated since the last successful spawn
    pub elapsed: f32,
    /// Round-robin index into `locations`
    pub slot: usize,
    pub interval: f32,
    pub cap: usize,
    /// Candidates closer than this to the avatar are rejected
    pub min_avatar_distance: f32,
    /// Fixed spawn location table
    pub locations: Vec<Vec2>,
}

impl SpawnerState {
    pub fn new(interval: f32, cap: usize, min_avatar_distance: f32, locations: Vec<Vec2>) -> Self {
        Self {
            elapsed: 0.0,
            slot: 0,
            interval,
            cap,
            min_avatar_distance,
            locations,
        }
    }

    /// Accumulate time and decide whether a new entity may be created this
    /// tick. Returns the admitted location; the caller creates the entity.
    pub fn try_admit(&mut self, dt: f32, population: usize, avatar_pos: Vec2) -> Option<Vec2> {
        self.elapsed += dt;
        if self.elapsed < self.interval || population >= self.cap || self.locations.is_empty() {
            return None;
        }

        let candidate = self.locations[self.slot % self.locations.len()];
        if candidate.distance(avatar_pos) <= self.min_avatar_distance {
            // Too close: no spawn, keep the accumulator growing and retry
            // next tick
            return None;
        }

        self.slot = (self.slot + 1) % self.locations.len();
        self.elapsed = 0.0;
        Some(candidate)
    }

    /// Reset for a fresh level
    pub fn reset(&mut self, locations: Vec<Vec2>) {
        self.elapsed = 0.0;
        self.slot = 0;
        self.locations = locations;
    }
}
