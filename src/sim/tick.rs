//! Tick orchestration and the game mode machine
//!
//! [`Session`] owns everything a running game needs: the world, the level
//! table, progress, and the two spawners. `advance` branches on the current
//! mode; only `Playing` runs the simulation pipeline, and the phase order
//! within it is fixed.

use glam::Vec2;
use rand::Rng;

use crate::audio::AudioEvent;
use crate::consts::*;
use crate::input::InputSnapshot;
use crate::progress::{Progress, ProgressStore};

use super::behavior::update_agents;
use super::combat::resolve_combat;
use super::level::{LevelDefinition, LevelRuntime, complete_level, completion_met, load_level};
use super::physics::{snap_to_last_ground, step_avatar, step_collectibles, step_projectiles};
use super::spawner::SpawnerState;
use super::state::{CollectibleKind, GameMode, Projectile, WeaponKind, World};

/// Nominal viewport width the camera frames
const VIEW_WIDTH: f32 = 800.0;
/// Chance a spawned pickup is the large heal
const MAJOR_PICKUP_CHANCE: f64 = 0.25;

/// A complete game session: mode machine, world, levels, progress, spawners
pub struct Session {
    pub mode: GameMode,
    pub world: World,
    pub progress: Progress,
    levels: Vec<LevelDefinition>,
    runtime: LevelRuntime,
    /// Level highlighted on the title screen
    pending_level: usize,
    agent_spawner: SpawnerState,
    pickup_spawner: SpawnerState,
    /// Round-robin cursor into the level's agent kind table
    spawn_kind_slot: usize,
}

impl Session {
    pub fn new(seed: u64, levels: Vec<LevelDefinition>, progress: Progress) -> Self {
        Self {
            mode: GameMode::Title,
            world: World::new(seed),
            progress,
            levels,
            runtime: LevelRuntime::default(),
            pending_level: 0,
            agent_spawner: SpawnerState::new(
                AGENT_SPAWN_INTERVAL,
                AGENT_SPAWN_CAP,
                AGENT_SPAWN_MIN_DIST,
                Vec::new(),
            ),
            pickup_spawner: SpawnerState::new(
                PICKUP_SPAWN_INTERVAL,
                PICKUP_SPAWN_CAP,
                PICKUP_SPAWN_MIN_DIST,
                Vec::new(),
            ),
            spawn_kind_slot: 0,
        }
    }

    pub fn level_name(&self) -> &str {
        self.levels
            .get(self.runtime.index)
            .map(|l| l.name)
            .unwrap_or("")
    }

    /// Advance the session by one tick. A non-positive dt is a dropped frame;
    /// oversized dts are clamped so a stall never teleports the avatar.
    pub fn advance(&mut self, input: &InputSnapshot, dt: f32, store: &mut dyn ProgressStore) {
        if !(dt > 0.0) {
            return;
        }
        let dt = dt.min(MAX_TICK_DT);

        match self.mode {
            GameMode::Title => self.tick_title(input),
            GameMode::Paused => {
                if input.pause {
                    self.mode = GameMode::Playing;
                }
            }
            GameMode::GameOver => {
                if input.confirm {
                    self.mode = GameMode::Title;
                }
            }
            GameMode::LevelComplete => {
                if input.confirm {
                    let next = self.runtime.index + 1;
                    if next < self.levels.len() && self.progress.is_unlocked(next) {
                        self.start_level(next);
                    } else {
                        self.mode = GameMode::Title;
                    }
                }
            }
            GameMode::Playing => self.tick_playing(input, dt, store),
        }
    }

    fn tick_title(&mut self, input: &InputSnapshot) {
        if let Some(selection) = input.select_level {
            let index = selection.saturating_sub(1);
            if self.progress.is_unlocked(index) {
                self.pending_level = index;
            } else {
                log::info!("level {selection} is locked");
            }
        }
        if input.confirm {
            self.world.avatar.lives = START_LIVES;
            self.start_level(self.pending_level);
        }
    }

    fn start_level(&mut self, index: usize) {
        match load_level(&mut self.world, &self.levels, index, &self.progress) {
            Ok(runtime) => {
                let level = &self.levels[index];
                self.agent_spawner.reset(level.agent_spawn_points.clone());
                self.pickup_spawner
                    .reset(level.collectible_spawn_points.clone());
                self.spawn_kind_slot = 0;
                self.runtime = runtime;
                self.mode = GameMode::Playing;
            }
            Err(err) => {
                log::warn!("level load rejected: {err}");
                self.mode = GameMode::Title;
            }
        }
    }

    fn tick_playing(&mut self, input: &InputSnapshot, dt: f32, store: &mut dyn ProgressStore) {
        if input.pause {
            self.mode = GameMode::Paused;
            return;
        }

        self.apply_avatar_intents(input);
        self.world.avatar.tick_timers(dt);

        match step_avatar(&mut self.world, input, dt) {
            Ok(step) => {
                if step.fell_out && !self.world.avatar.dead {
                    self.kill_avatar();
                }
            }
            Err(err) => {
                log::error!("physics step failed ({err}), snapping to last ground");
                snap_to_last_ground(&mut self.world);
            }
        }

        if self.world.avatar.dead {
            let start = self.world.level_start;
            self.world.avatar.tick_respawn(dt, start);
        }

        update_agents(&mut self.world, dt);
        self.run_spawners(dt);
        resolve_combat(&mut self.world);
        step_projectiles(&mut self.world, dt);
        step_collectibles(&mut self.world, dt);
        self.world.sweep();

        // Camera follows the avatar, clamped to the level
        let target = self.world.avatar.bounds().center().x - VIEW_WIDTH * 0.5;
        self.world.camera_x = target.clamp(0.0, (self.world.level_width - VIEW_WIDTH).max(0.0));

        let level = &self.levels[self.runtime.index];
        if completion_met(&self.world, level, &self.runtime) {
            self.world.push_event(AudioEvent::LevelComplete);
            complete_level(&self.runtime, &mut self.progress, store, self.world.score);
            self.mode = GameMode::LevelComplete;
            return;
        }

        if self.world.avatar.dead && self.world.avatar.lives == 0 {
            self.world.push_event(AudioEvent::GameOver);
            self.mode = GameMode::GameOver;
        }
    }

    fn apply_avatar_intents(&mut self, input: &InputSnapshot) {
        let avatar = &mut self.world.avatar;
        if avatar.dead {
            return;
        }

        if input.switch_weapon {
            avatar.weapon = match avatar.weapon {
                WeaponKind::Melee => WeaponKind::Ranged,
                WeaponKind::Ranged => WeaponKind::Melee,
            };
        }

        if input.attack && avatar.cooldown_timer <= 0.0 && avatar.attack_timer <= 0.0 {
            match avatar.weapon {
                WeaponKind::Melee => {
                    avatar.attack_timer = MELEE_DURATION;
                    avatar.cooldown_timer = ATTACK_COOLDOWN;
                    avatar.swing_hits.clear();
                    self.world.push_event(AudioEvent::Punch);
                }
                WeaponKind::Ranged => {
                    avatar.cooldown_timer = ATTACK_COOLDOWN;
                    let dir = avatar.facing.sign();
                    let muzzle = Vec2::new(
                        if dir > 0.0 {
                            avatar.bounds().right()
                        } else {
                            avatar.bounds().left() - PROJECTILE_SIZE
                        },
                        avatar.pos.y + avatar.size.y * 0.4,
                    );
                    let id = self.world.next_entity_id();
                    self.world.projectiles.push(Projectile {
                        id,
                        pos: muzzle,
                        vel: Vec2::new(dir * PROJECTILE_SPEED, 0.0),
                        lifetime: PROJECTILE_LIFETIME,
                        active: true,
                    });
                    self.world.push_event(AudioEvent::Gunshot);
                }
            }
        }
    }

    /// Fall-out death: bypasses the damage machine (invulnerability does not
    /// protect against the pit)
    fn kill_avatar(&mut self) {
        let avatar = &mut self.world.avatar;
        avatar.health = 0;
        avatar.dead = true;
        avatar.lives = avatar.lives.saturating_sub(1);
        avatar.respawn_timer = RESPAWN_DELAY;
        self.world.push_event(AudioEvent::PlayerDeath);
    }

    fn run_spawners(&mut self, dt: f32) {
        let avatar_pos = self.world.avatar.bounds().center();
        let level = &self.levels[self.runtime.index];

        // An unconfigured kind table must not consume the admission window
        if !level.agent_spawn_kinds.is_empty() {
            let population = self.world.active_agent_count();
            if let Some(pos) = self.agent_spawner.try_admit(dt, population, avatar_pos) {
                let kind = level.agent_spawn_kinds
                    [self.spawn_kind_slot % level.agent_spawn_kinds.len()];
                self.spawn_kind_slot += 1;
                let id = self.world.next_entity_id();
                self.world
                    .agents
                    .push(super::state::Agent::spawn(id, kind, pos));
            }
        }

        let population = self.world.active_collectible_count();
        if let Some(pos) = self.pickup_spawner.try_admit(dt, population, avatar_pos) {
            let kind = if self.world.rng.random_bool(MAJOR_PICKUP_CHANCE) {
                CollectibleKind::Major
            } else {
                CollectibleKind::Minor
            };
            let id = self.world.next_entity_id();
            self.world.collectibles.push(super::state::Collectible {
                id,
                pos,
                kind,
                active: true,
                float_phase: 0.0,
            });
        }
    }
}
