//! Deterministic fixed-timestep simulation
//!
//! Each tick runs the phases in a fixed order: avatar intents, physics,
//! agent behavior, spawners, combat, projectile/collectible motion, then a
//! single compaction sweep. [`tick::Session`] owns the world and the mode
//! machine; the host feeds it input snapshots and a clamped dt.

pub mod behavior;
pub mod combat;
pub mod level;
pub mod physics;
pub mod spawner;
pub mod state;
pub mod tick;

pub use level::{LevelDefinition, LevelError, VictoryCondition, builtin_levels};
pub use physics::PhysicsError;
pub use state::{
    Agent, AgentKind, Avatar, BehaviorState, Collectible, CollectibleKind, GameMode, Platform,
    Projectile, RenderView, SurfaceKind, World,
};
pub use tick::Session;
