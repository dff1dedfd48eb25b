//! Avatar physics and platform resolution
//!
//! Integration is explicit Euler against a dt the orchestrator has already
//! clamped. Platform resolution checks platforms in registration order and
//! resolves against the first overlap only; the three corrections (land,
//! ceiling, side) are mutually exclusive.

use glam::Vec2;
use thiserror::Error;

use crate::Rect;
use crate::audio::AudioEvent;
use crate::consts::*;
use crate::input::InputSnapshot;

use super::state::{AnimState, Facing, World};

/// Physics failures surfaced to the orchestrator, which applies the recovery
/// policy (snap to last known ground) once.
#[derive(Debug, Error)]
pub enum PhysicsError {
    #[error("avatar position became non-finite after platform resolution")]
    NonFinite,
}

/// Result of one avatar physics step
#[derive(Debug, Clone, Copy, Default)]
pub struct AvatarStep {
    /// Avatar fell below the level's vertical bound (life-loss event)
    pub fell_out: bool,
}

/// Integrate the avatar and resolve platform collisions.
///
/// Non-finite velocity on either axis is caught before the position commit:
/// that axis's velocity is zeroed and its update skipped. A non-finite
/// *position* after resolution (corrupt geometry) is returned as an error.
pub fn step_avatar(
    world: &mut World,
    input: &InputSnapshot,
    dt: f32,
) -> Result<AvatarStep, PhysicsError> {
    let World {
        avatar,
        platforms,
        events,
        level_width,
        level_height,
        ..
    } = world;

    if avatar.dead {
        return Ok(AvatarStep::default());
    }

    // Horizontal intent
    let axis = input.move_axis();
    avatar.vel.x = axis * MOVE_SPEED;
    if axis < 0.0 {
        avatar.facing = Facing::Left;
    } else if axis > 0.0 {
        avatar.facing = Facing::Right;
    }

    // Jump from the ground
    if input.jump && avatar.grounded && !avatar.jumping {
        avatar.vel.y = JUMP_VELOCITY;
        avatar.jumping = true;
        avatar.grounded = false;
        events.push(AudioEvent::Jump);
    }

    // Gravity accumulates only while airborne; a supported avatar rests at
    // zero vertical speed and must not re-penetrate its floor. The
    // comparison (not `min`) keeps NaN from being masked.
    if !avatar.grounded {
        avatar.vel.y += GRAVITY * dt;
        if avatar.vel.y > MAX_FALL_SPEED {
            avatar.vel.y = MAX_FALL_SPEED;
        }
    }

    let prev = avatar.bounds();
    let impact_speed = avatar.vel.y;

    // Commit each axis separately, guarding against corrupted numeric state
    let new_x = avatar.pos.x + avatar.vel.x * dt;
    if new_x.is_finite() {
        avatar.pos.x = new_x;
    } else {
        log::warn!("non-finite x motion, zeroing x velocity");
        avatar.vel.x = 0.0;
    }
    let new_y = avatar.pos.y + avatar.vel.y * dt;
    if new_y.is_finite() {
        avatar.pos.y = new_y;
    } else {
        log::warn!("non-finite y motion, zeroing y velocity");
        avatar.vel.y = 0.0;
    }

    // World bounds clamp (horizontal only; falling out the bottom is handled
    // as a life-loss event, not a clamp)
    avatar.pos.x = avatar.pos.x.clamp(0.0, (*level_width - avatar.size.x).max(0.0));

    // Platform resolution: first overlap wins
    let mut landed_speed = None;
    for platform in platforms.iter() {
        if !avatar.bounds().overlaps(&platform.rect) {
            continue;
        }

        if avatar.vel.y > 0.0 && prev.bottom() <= platform.rect.top() + 0.01 {
            // Landing: snap to stand on the platform top
            avatar.pos.y = platform.rect.top() - avatar.size.y;
            avatar.vel.y = 0.0;
            avatar.grounded = true;
            avatar.jumping = false;
            avatar.last_ground = avatar.pos;
            landed_speed = Some(impact_speed);
        } else if avatar.vel.y < 0.0 && prev.top() >= platform.rect.bottom() - 0.01 {
            // Ceiling hit: snap below the platform
            avatar.pos.y = platform.rect.bottom();
            avatar.vel.y = 0.0;
        } else if avatar.vel.x != 0.0 {
            // Side hit: snap to the near edge
            if avatar.vel.x > 0.0 {
                avatar.pos.x = platform.rect.left() - avatar.size.x;
            } else {
                avatar.pos.x = platform.rect.right();
            }
            avatar.vel.x = 0.0;
        }
        break;
    }

    // Grounded holds only while a platform still supports the feet;
    // stepping off a ledge starts a fall
    if avatar.grounded {
        let feet = avatar.bounds();
        let supported = platforms.iter().any(|platform| {
            (feet.bottom() - platform.rect.top()).abs() <= 0.1
                && feet.right() > platform.rect.left()
                && feet.left() < platform.rect.right()
        });
        if supported {
            avatar.last_ground = avatar.pos;
        } else {
            avatar.grounded = false;
        }
    }

    if !avatar.pos.is_finite() {
        return Err(PhysicsError::NonFinite);
    }

    if let Some(speed) = landed_speed {
        if speed >= LAND_SOUND_SPEED {
            events.push(AudioEvent::Land);
        }
    }

    // Animation tag from movement (attack overrides)
    if avatar.attack_timer > 0.0 {
        avatar.anim = AnimState::Attack;
    } else if !avatar.grounded {
        avatar.anim = AnimState::Jump;
    } else if avatar.vel.x != 0.0 {
        avatar.anim = AnimState::Walk;
    } else {
        avatar.anim = AnimState::Idle;
    }

    let fell_out = avatar.pos.y > *level_height + FALL_MARGIN;
    Ok(AvatarStep { fell_out })
}

/// Integrate projectiles: move, age, cull on expiry or leaving the level
pub fn step_projectiles(world: &mut World, dt: f32) {
    let bounds = Rect::new(
        -64.0,
        -64.0,
        world.level_width + 128.0,
        world.level_height + 128.0,
    );
    for projectile in &mut world.projectiles {
        if !projectile.active {
            continue;
        }
        projectile.pos += projectile.vel * dt;
        projectile.lifetime -= dt;
        if projectile.lifetime <= 0.0 || !projectile.bounds().overlaps(&bounds) {
            projectile.active = false;
        }
    }
}

/// Advance collectible float animation and cull off-bounds drifters
pub fn step_collectibles(world: &mut World, dt: f32) {
    let max_y = world.level_height + FALL_MARGIN;
    for collectible in &mut world.collectibles {
        if !collectible.active {
            continue;
        }
        collectible.float_phase += dt * 2.0;
        if collectible.pos.y > max_y {
            collectible.active = false;
        }
    }
}

/// Recovery fallback for a failed physics step: put the avatar back on the
/// last ground it stood on and stop it.
pub fn snap_to_last_ground(world: &mut World) {
    let avatar = &mut world.avatar;
    avatar.pos = avatar.last_ground;
    avatar.vel = Vec2::ZERO;
    avatar.grounded = true;
    avatar.jumping = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Platform, SurfaceKind};

    fn world_with_floor() -> World {
        let mut world = World::new(7);
        world.platforms.push(Platform {
            rect: Rect::new(0.0, 500.0, 2000.0, 40.0),
            surface: SurfaceKind::Dirt,
        });
        world.avatar.pos = Vec2::new(100.0, 500.0 - AVATAR_HEIGHT);
        world.avatar.grounded = true;
        world
    }

    #[test]
    fn test_falls_and_lands_on_platform() {
        let mut world = world_with_floor();
        world.avatar.pos.y = 300.0;
        world.avatar.grounded = false;

        let input = InputSnapshot::default();
        for _ in 0..120 {
            step_avatar(&mut world, &input, SIM_DT).unwrap();
        }
        assert!(world.avatar.grounded);
        assert_eq!(world.avatar.pos.y, 500.0 - AVATAR_HEIGHT);
        assert_eq!(world.avatar.vel.y, 0.0);
        // Long fall is loud
        assert!(world.events.contains(&AudioEvent::Land));
    }

    #[test]
    fn test_grounded_stays_stable_while_standing() {
        let mut world = world_with_floor();
        let input = InputSnapshot::default();
        for _ in 0..10 {
            step_avatar(&mut world, &input, SIM_DT).unwrap();
            assert!(world.avatar.grounded);
            assert_eq!(world.avatar.pos.y, 500.0 - AVATAR_HEIGHT);
        }
        // Standing re-lands are silent
        assert!(!world.events.contains(&AudioEvent::Land));
    }

    #[test]
    fn test_jump_then_ceiling_hit() {
        let mut world = world_with_floor();
        // Low ceiling right above the avatar
        world.platforms.push(Platform {
            rect: Rect::new(0.0, 380.0, 2000.0, 20.0),
            surface: SurfaceKind::Metal,
        });

        let input = InputSnapshot {
            jump: true,
            ..Default::default()
        };
        step_avatar(&mut world, &input, SIM_DT).unwrap();
        assert!(world.events.contains(&AudioEvent::Jump));

        let input = InputSnapshot::default();
        for _ in 0..30 {
            step_avatar(&mut world, &input, SIM_DT).unwrap();
        }
        // Must never pass through the ceiling
        assert!(world.avatar.pos.y >= 400.0);
    }

    #[test]
    fn test_side_hit_stops_horizontal_motion() {
        let mut world = world_with_floor();
        // Wall ahead of the avatar
        world.platforms.push(Platform {
            rect: Rect::new(300.0, 300.0, 40.0, 200.0),
            surface: SurfaceKind::Stone,
        });

        let input = InputSnapshot {
            move_right: true,
            ..Default::default()
        };
        for _ in 0..120 {
            step_avatar(&mut world, &input, SIM_DT).unwrap();
            // Walking along the floor must never carry the avatar past the
            // wall face
            assert!(world.avatar.pos.x <= 300.0 - AVATAR_WIDTH);
        }
        assert_eq!(world.avatar.pos.x, 300.0 - AVATAR_WIDTH);
        assert!(world.avatar.grounded);
    }

    #[test]
    fn test_walking_off_ledge_starts_fall() {
        let mut world = World::new(7);
        world.platforms.push(Platform {
            rect: Rect::new(0.0, 500.0, 200.0, 40.0),
            surface: SurfaceKind::Dirt,
        });
        world.avatar.pos = Vec2::new(150.0, 500.0 - AVATAR_HEIGHT);
        world.avatar.grounded = true;

        let input = InputSnapshot {
            move_right: true,
            ..Default::default()
        };
        for _ in 0..60 {
            step_avatar(&mut world, &input, SIM_DT).unwrap();
        }
        assert!(!world.avatar.grounded);
        assert!(world.avatar.pos.y > 500.0 - AVATAR_HEIGHT);
    }

    #[test]
    fn test_first_overlapping_platform_wins() {
        let mut world = World::new(7);
        // Two overlapping platforms; only the first registered resolves,
        // even though the second's top is higher
        world.platforms.push(Platform {
            rect: Rect::new(0.0, 500.0, 400.0, 20.0),
            surface: SurfaceKind::Dirt,
        });
        world.platforms.push(Platform {
            rect: Rect::new(0.0, 498.0, 400.0, 20.0),
            surface: SurfaceKind::Dirt,
        });
        world.avatar.pos = Vec2::new(100.0, 500.0 - AVATAR_HEIGHT - 5.0);
        world.avatar.vel.y = 400.0;
        world.avatar.grounded = false;

        step_avatar(&mut world, &InputSnapshot::default(), SIM_DT).unwrap();
        assert_eq!(world.avatar.pos.y, 500.0 - AVATAR_HEIGHT);
    }

    #[test]
    fn test_falling_out_reports_life_loss_not_error() {
        let mut world = World::new(7);
        world.avatar.pos = Vec2::new(100.0, world.level_height + FALL_MARGIN + 50.0);
        world.avatar.grounded = false;

        let step = step_avatar(&mut world, &InputSnapshot::default(), SIM_DT).unwrap();
        assert!(step.fell_out);
    }

    #[test]
    fn test_non_finite_velocity_is_contained() {
        let mut world = world_with_floor();
        let x_before = world.avatar.pos.x;
        world.avatar.vel.y = f32::NAN;
        world.avatar.grounded = false;
        world.avatar.pos.y = 100.0;

        // NaN vel.y poisons the integration; the commit guard zeroes the
        // axis and skips the update instead of corrupting the position.
        let step = step_avatar(&mut world, &InputSnapshot::default(), SIM_DT);
        assert!(step.is_ok());
        assert!(world.avatar.pos.is_finite());
        assert_eq!(world.avatar.pos.x, x_before);
        assert_eq!(world.avatar.pos.y, 100.0);
        assert_eq!(world.avatar.vel.y, 0.0);
    }

    #[test]
    fn test_projectile_expires() {
        let mut world = World::new(7);
        let id = world.next_entity_id();
        world.projectiles.push(crate::sim::state::Projectile {
            id,
            pos: Vec2::new(100.0, 100.0),
            vel: Vec2::new(PROJECTILE_SPEED, 0.0),
            lifetime: 0.05,
            active: true,
        });

        step_projectiles(&mut world, 0.1);
        assert!(!world.projectiles[0].active);
    }

    #[test]
    fn test_snap_to_last_ground() {
        let mut world = world_with_floor();
        let ground = world.avatar.pos;
        world.avatar.last_ground = ground;
        world.avatar.pos = Vec2::new(5000.0, 5000.0);
        world.avatar.vel = Vec2::new(100.0, 100.0);

        snap_to_last_ground(&mut world);
        assert_eq!(world.avatar.pos, ground);
        assert_eq!(world.avatar.vel, Vec2::ZERO);
        assert!(world.avatar.grounded);
    }
}
