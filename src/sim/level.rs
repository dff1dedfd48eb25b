//! Level definitions and progression
//!
//! A level is loaded wholesale: registries cleared, geometry installed, the
//! avatar reset, and the configured agents and collectibles spawned. Agents
//! required for victory (bosses) are recorded by id at spawn time, so the
//! defeat-boss predicate can never be vacuously true on a level whose spawn
//! table never produced one.

use glam::Vec2;
use thiserror::Error;

use crate::Rect;
use crate::consts::*;
use crate::progress::{Progress, ProgressStore};

use super::state::{Agent, AgentKind, Collectible, CollectibleKind, Platform, SurfaceKind, World};

/// How a level is won
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictoryCondition {
    /// Reach the exit marker (within a vertical tolerance band)
    ReachExit,
    /// Defeat every victory-required agent spawned by the level
    DefeatBoss,
}

/// Invalid level requests, rejected at the boundary with no partial mutation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level index {0} out of range")]
    OutOfRange(usize),
    #[error("level {0} is locked")]
    Locked(usize),
}

/// Static configuration for one level
#[derive(Debug, Clone)]
pub struct LevelDefinition {
    pub name: &'static str,
    pub width: f32,
    pub height: f32,
    pub start: Vec2,
    pub platforms: Vec<Platform>,
    /// Agents placed at load time
    pub agents: Vec<(AgentKind, Vec2)>,
    /// Collectibles placed at load time
    pub collectibles: Vec<(CollectibleKind, Vec2)>,
    /// Round-robin location table for the agent spawner
    pub agent_spawn_points: Vec<Vec2>,
    /// Kinds the agent spawner cycles through
    pub agent_spawn_kinds: Vec<AgentKind>,
    /// Round-robin location table for the collectible spawner
    pub collectible_spawn_points: Vec<Vec2>,
    pub exit: Vec2,
    pub victory: VictoryCondition,
}

/// Per-level runtime state resolved at load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelRuntime {
    pub index: usize,
    /// Ids of agents that must be defeated for a DefeatBoss victory
    pub victory_handles: Vec<u32>,
}

/// The built-in campaign
pub fn builtin_levels() -> Vec<LevelDefinition> {
    vec![
        LevelDefinition {
            name: "Scrapyard Gates",
            width: 2400.0,
            height: 600.0,
            start: Vec2::new(64.0, 400.0),
            platforms: vec![
                Platform {
                    rect: Rect::new(0.0, 520.0, 2400.0, 80.0),
                    surface: SurfaceKind::Dirt,
                },
                Platform {
                    rect: Rect::new(500.0, 420.0, 180.0, 24.0),
                    surface: SurfaceKind::Metal,
                },
                Platform {
                    rect: Rect::new(900.0, 360.0, 160.0, 24.0),
                    surface: SurfaceKind::Metal,
                },
                Platform {
                    rect: Rect::new(1500.0, 430.0, 200.0, 24.0),
                    surface: SurfaceKind::Stone,
                },
            ],
            agents: vec![
                (AgentKind::Grunt, Vec2::new(700.0, 476.0)),
                (AgentKind::Buggy, Vec2::new(1300.0, 492.0)),
            ],
            collectibles: vec![(CollectibleKind::Minor, Vec2::new(960.0, 320.0))],
            agent_spawn_points: vec![
                Vec2::new(400.0, 476.0),
                Vec2::new(1200.0, 476.0),
                Vec2::new(2000.0, 476.0),
            ],
            agent_spawn_kinds: vec![AgentKind::Grunt, AgentKind::Buggy, AgentKind::Drone],
            collectible_spawn_points: vec![Vec2::new(600.0, 380.0), Vec2::new(1700.0, 380.0)],
            exit: Vec2::new(2320.0, 472.0),
            victory: VictoryCondition::ReachExit,
        },
        LevelDefinition {
            name: "Flooded Channel",
            width: 3200.0,
            height: 600.0,
            start: Vec2::new(64.0, 380.0),
            platforms: vec![
                Platform {
                    rect: Rect::new(0.0, 500.0, 1000.0, 100.0),
                    surface: SurfaceKind::Stone,
                },
                Platform {
                    rect: Rect::new(1200.0, 500.0, 800.0, 100.0),
                    surface: SurfaceKind::Stone,
                },
                Platform {
                    rect: Rect::new(2200.0, 500.0, 1000.0, 100.0),
                    surface: SurfaceKind::Stone,
                },
                Platform {
                    rect: Rect::new(1020.0, 430.0, 160.0, 20.0),
                    surface: SurfaceKind::Metal,
                },
                Platform {
                    rect: Rect::new(2020.0, 430.0, 160.0, 20.0),
                    surface: SurfaceKind::Metal,
                },
            ],
            agents: vec![
                (AgentKind::Gunboat, Vec2::new(1100.0, 470.0)),
                (AgentKind::Sniper, Vec2::new(1600.0, 456.0)),
                (AgentKind::Drone, Vec2::new(2100.0, 300.0)),
            ],
            collectibles: vec![
                (CollectibleKind::Minor, Vec2::new(1080.0, 390.0)),
                (CollectibleKind::Major, Vec2::new(2080.0, 390.0)),
            ],
            agent_spawn_points: vec![
                Vec2::new(800.0, 456.0),
                Vec2::new(1700.0, 456.0),
                Vec2::new(2600.0, 456.0),
            ],
            agent_spawn_kinds: vec![AgentKind::Gunboat, AgentKind::Drone, AgentKind::Grunt],
            collectible_spawn_points: vec![Vec2::new(1400.0, 440.0), Vec2::new(2500.0, 440.0)],
            exit: Vec2::new(3120.0, 452.0),
            victory: VictoryCondition::ReachExit,
        },
        LevelDefinition {
            name: "Foundry Core",
            width: 2000.0,
            height: 600.0,
            start: Vec2::new(64.0, 400.0),
            platforms: vec![
                Platform {
                    rect: Rect::new(0.0, 520.0, 2000.0, 80.0),
                    surface: SurfaceKind::Metal,
                },
                Platform {
                    rect: Rect::new(400.0, 400.0, 160.0, 24.0),
                    surface: SurfaceKind::Metal,
                },
                Platform {
                    rect: Rect::new(1440.0, 400.0, 160.0, 24.0),
                    surface: SurfaceKind::Metal,
                },
            ],
            agents: vec![
                (AgentKind::boss(), Vec2::new(1500.0, 432.0)),
                (AgentKind::Tank, Vec2::new(900.0, 484.0)),
            ],
            collectibles: vec![(CollectibleKind::Major, Vec2::new(470.0, 360.0))],
            agent_spawn_points: vec![Vec2::new(300.0, 476.0), Vec2::new(1100.0, 476.0)],
            agent_spawn_kinds: vec![AgentKind::Grunt, AgentKind::Sniper],
            collectible_spawn_points: vec![Vec2::new(1000.0, 440.0)],
            exit: Vec2::new(1900.0, 472.0),
            victory: VictoryCondition::DefeatBoss,
        },
    ]
}

/// Load a level into the world. Out-of-range and locked indices are rejected
/// before any state is touched.
pub fn load_level(
    world: &mut World,
    levels: &[LevelDefinition],
    index: usize,
    progress: &Progress,
) -> Result<LevelRuntime, LevelError> {
    let level = levels.get(index).ok_or(LevelError::OutOfRange(index))?;
    if !progress.is_unlocked(index) {
        return Err(LevelError::Locked(index));
    }

    log::info!("Loading level {}: {}", index + 1, level.name);

    world.agents.clear();
    world.projectiles.clear();
    world.collectibles.clear();
    world.events.clear();
    world.platforms = level.platforms.clone();
    world.level_width = level.width;
    world.level_height = level.height;
    world.level_start = level.start;
    world.camera_x = 0.0;
    world.score = 0;
    world.defeated = 0;
    world.avatar.reset_at(level.start);

    let mut runtime = LevelRuntime {
        index,
        victory_handles: Vec::new(),
    };
    for (kind, pos) in &level.agents {
        let id = world.next_entity_id();
        if kind.is_boss() {
            runtime.victory_handles.push(id);
        }
        world.agents.push(Agent::spawn(id, *kind, *pos));
    }
    for (kind, pos) in &level.collectibles {
        let id = world.next_entity_id();
        world.collectibles.push(Collectible {
            id,
            pos: *pos,
            kind: *kind,
            active: true,
            float_phase: 0.0,
        });
    }

    Ok(runtime)
}

/// Evaluate the level's victory condition against the current world
pub fn completion_met(world: &World, level: &LevelDefinition, runtime: &LevelRuntime) -> bool {
    match level.victory {
        VictoryCondition::ReachExit => {
            world.avatar.pos.x >= level.exit.x
                && (world.avatar.pos.y - level.exit.y).abs() <= EXIT_Y_TOLERANCE
        }
        VictoryCondition::DefeatBoss => {
            // A level whose spawn table produced no boss can never complete
            // this way
            !runtime.victory_handles.is_empty()
                && runtime.victory_handles.iter().all(|id| {
                    world
                        .agents
                        .iter()
                        .find(|a| a.id == *id)
                        .map(|a| !a.active)
                        .unwrap_or(true)
                })
        }
    }
}

/// Record a completion and persist it. A failed save is logged and dropped;
/// the run continues.
pub fn complete_level(
    runtime: &LevelRuntime,
    progress: &mut Progress,
    store: &mut dyn ProgressStore,
    score: u64,
) {
    log::info!("Level {} complete, score {}", runtime.index + 1, score);
    progress.record_completion(runtime.index, score);
    if let Err(err) = store.save(progress) {
        log::warn!("progress save failed: {err}");
    }
}
