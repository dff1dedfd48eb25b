//! Scrapline - a side-scrolling action game simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, enemy AI, combat, levels)
//! - `input`: Per-tick snapshot of player intents
//! - `audio`: Fire-and-forget sound event triggers
//! - `progress`: Level unlock/completion persistence

pub mod audio;
pub mod input;
pub mod progress;
pub mod sim;

pub use audio::{AudioEvent, AudioSink};
pub use input::InputSnapshot;
pub use progress::{LevelRecord, Progress, ProgressStore};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Largest elapsed time a single tick will integrate (frame hitch guard)
    pub const MAX_TICK_DT: f32 = 1.0 / 30.0;

    /// Avatar dimensions
    pub const AVATAR_WIDTH: f32 = 32.0;
    pub const AVATAR_HEIGHT: f32 = 48.0;

    /// Avatar movement
    pub const MOVE_SPEED: f32 = 260.0;
    pub const JUMP_VELOCITY: f32 = -900.0;
    /// Gravity acceleration (y grows downward)
    pub const GRAVITY: f32 = 2400.0;
    /// Terminal fall speed
    pub const MAX_FALL_SPEED: f32 = 1200.0;
    /// Landing impact speed that triggers the "land" sound cue
    pub const LAND_SOUND_SPEED: f32 = 400.0;
    /// Distance below the level floor that counts as falling out
    pub const FALL_MARGIN: f32 = 160.0;

    /// Avatar health and lives
    pub const MAX_HEALTH: i32 = 10;
    pub const START_LIVES: u32 = 3;
    /// Invulnerability window after taking damage (seconds)
    pub const INVULN_DURATION: f32 = 1.5;
    /// Delay between death and respawn (seconds)
    pub const RESPAWN_DELAY: f32 = 2.0;

    /// Avatar attacks
    pub const MELEE_DURATION: f32 = 0.25;
    pub const ATTACK_COOLDOWN: f32 = 0.4;
    pub const MELEE_RANGE: f32 = 44.0;
    pub const MELEE_HEIGHT: f32 = 36.0;
    pub const MELEE_DAMAGE: i32 = 2;
    pub const MELEE_KNOCKBACK: f32 = 28.0;
    pub const PROJECTILE_SPEED: f32 = 620.0;
    pub const PROJECTILE_LIFETIME: f32 = 1.2;
    pub const PROJECTILE_SIZE: f32 = 8.0;
    pub const PROJECTILE_DAMAGE: i32 = 1;

    /// Enemy contact
    pub const CONTACT_DAMAGE: i32 = 2;
    pub const CONTACT_KNOCKBACK: f32 = 36.0;

    /// Scoring
    pub const SCORE_RANGED_KILL: u64 = 100;
    pub const SCORE_MELEE_KILL: u64 = 150;
    pub const SCORE_PICKUP: u64 = 25;

    /// Healing amounts
    pub const HEAL_MINOR: i32 = 2;
    pub const HEAL_MAJOR: i32 = 5;

    /// Behavior hysteresis: chase drops back to patrol past aggro * this
    pub const AGGRO_HYSTERESIS: f32 = 1.5;
    /// Attack drops back to chase past attack range * this
    pub const ATTACK_HYSTERESIS: f32 = 1.2;

    /// Exit victory: vertical tolerance band around the exit point
    pub const EXIT_Y_TOLERANCE: f32 = 100.0;

    /// Spawner defaults
    pub const AGENT_SPAWN_INTERVAL: f32 = 8.0;
    pub const AGENT_SPAWN_CAP: usize = 6;
    pub const AGENT_SPAWN_MIN_DIST: f32 = 200.0;
    pub const PICKUP_SPAWN_INTERVAL: f32 = 12.0;
    pub const PICKUP_SPAWN_CAP: usize = 4;
    pub const PICKUP_SPAWN_MIN_DIST: f32 = 150.0;
}

/// Axis-aligned rectangle, position is the top-left corner (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict AABB overlap test
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let c = Rect::new(10.0, 0.0, 5.0, 5.0);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Touching edges do not overlap
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_rect_edges() {
        let r = Rect::new(2.0, 3.0, 4.0, 5.0);
        assert_eq!(r.left(), 2.0);
        assert_eq!(r.right(), 6.0);
        assert_eq!(r.top(), 3.0);
        assert_eq!(r.bottom(), 8.0);
        assert_eq!(r.center(), Vec2::new(4.0, 5.5));
    }
}
