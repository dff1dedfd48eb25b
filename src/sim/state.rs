//! Game state and core simulation types
//!
//! The world struct owns every mutable registry (avatar, agents, projectiles,
//! collectibles) plus the static level geometry. It is passed by reference to
//! each tick phase; tests construct a fresh one per case.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::Rect;
use crate::audio::AudioEvent;
use crate::consts::*;

/// Top-level game mode, branched on by the tick orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    /// Title/level-select screen
    Title,
    /// Active gameplay
    Playing,
    /// Gameplay frozen
    Paused,
    /// Run ended, all lives spent
    GameOver,
    /// Victory condition met for the current level
    LevelComplete,
}

/// Horizontal facing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    pub fn toward(dx: f32) -> Self {
        if dx < 0.0 { Facing::Left } else { Facing::Right }
    }
}

/// Currently equipped avatar weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponKind {
    Melee,
    Ranged,
}

/// Animation state tag, consumed by the renderer only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimState {
    Idle,
    Walk,
    Jump,
    Attack,
}

/// Outcome of routing damage through the avatar state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Invulnerable or already dead; nothing changed
    Ignored,
    /// Health reduced, invulnerability window started
    Hurt,
    /// Health reached zero; a life was lost
    Died,
}

/// The player's avatar. Single instance, never destroyed, only reset.
#[derive(Debug, Clone)]
pub struct Avatar {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub facing: Facing,
    pub grounded: bool,
    pub jumping: bool,
    pub anim: AnimState,
    pub weapon: WeaponKind,
    /// Remaining melee swing time; the hitbox is live while > 0
    pub attack_timer: f32,
    /// Remaining time before another attack may start
    pub cooldown_timer: f32,
    pub health: i32,
    pub lives: u32,
    pub invuln_timer: f32,
    pub dead: bool,
    pub respawn_timer: f32,
    /// Last position where the avatar stood on ground (recovery fallback)
    pub last_ground: Vec2,
    /// Agents already struck by the current melee swing (one hit per swing)
    pub swing_hits: Vec<u32>,
}

impl Avatar {
    pub fn new(start: Vec2) -> Self {
        Self {
            pos: start,
            vel: Vec2::ZERO,
            size: Vec2::new(AVATAR_WIDTH, AVATAR_HEIGHT),
            facing: Facing::Right,
            grounded: false,
            jumping: false,
            anim: AnimState::Idle,
            weapon: WeaponKind::Melee,
            attack_timer: 0.0,
            cooldown_timer: 0.0,
            health: MAX_HEALTH,
            lives: START_LIVES,
            invuln_timer: 0.0,
            dead: false,
            respawn_timer: 0.0,
            last_ground: start,
            swing_hits: Vec::new(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    /// Whether the melee hitbox is live this tick
    #[inline]
    pub fn melee_active(&self) -> bool {
        self.weapon == WeaponKind::Melee && self.attack_timer > 0.0
    }

    /// Reset for a fresh level, keeping lives and weapon selection
    pub fn reset_at(&mut self, start: Vec2) {
        self.pos = start;
        self.vel = Vec2::ZERO;
        self.health = MAX_HEALTH;
        self.grounded = false;
        self.jumping = false;
        self.anim = AnimState::Idle;
        self.attack_timer = 0.0;
        self.cooldown_timer = 0.0;
        self.invuln_timer = 0.0;
        self.dead = false;
        self.respawn_timer = 0.0;
        self.last_ground = start;
        self.swing_hits.clear();
    }

    /// Route damage through the normal -> invulnerable -> normal machine.
    /// Damage while invulnerable or dead is a no-op.
    pub fn take_damage(&mut self, amount: i32) -> DamageOutcome {
        if self.dead || self.invuln_timer > 0.0 {
            return DamageOutcome::Ignored;
        }
        self.health = (self.health - amount).max(0);
        if self.health == 0 {
            self.dead = true;
            self.lives = self.lives.saturating_sub(1);
            self.respawn_timer = RESPAWN_DELAY;
            DamageOutcome::Died
        } else {
            self.invuln_timer = INVULN_DURATION;
            DamageOutcome::Hurt
        }
    }

    /// Heal, capped at max health
    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount).min(MAX_HEALTH);
    }

    /// Count down the dead state. Returns true on the tick the avatar
    /// respawns: position and health reset, fresh invulnerability window.
    pub fn tick_respawn(&mut self, dt: f32, start: Vec2) -> bool {
        if !self.dead {
            return false;
        }
        self.respawn_timer -= dt;
        if self.respawn_timer <= 0.0 {
            self.pos = start;
            self.vel = Vec2::ZERO;
            self.health = MAX_HEALTH;
            self.dead = false;
            self.invuln_timer = INVULN_DURATION;
            self.anim = AnimState::Idle;
            true
        } else {
            false
        }
    }

    /// Count down the attack/cooldown/invulnerability timers
    pub fn tick_timers(&mut self, dt: f32) {
        self.attack_timer = (self.attack_timer - dt).max(0.0);
        self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);
        self.invuln_timer = (self.invuln_timer - dt).max(0.0);
    }
}

/// Behavior state machine states. Transitions only run
/// patrol -> chase -> attack -> chase -> patrol; there is no direct
/// patrol/attack edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    Patrol,
    Chase,
    Attack,
}

/// Hostile agent variants. Shared fields live on [`Agent`]; the payload here
/// carries only kind-specific state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AgentKind {
    /// Fast ground vehicle
    Buggy,
    /// Slow armored ground vehicle
    Tank,
    /// Airborne, bobs on a sine wave
    Drone,
    /// Waterborne, rides a slower wave
    Gunboat,
    /// Melee infantry
    Grunt,
    /// Ranged infantry, long attack range
    Sniper,
    /// Level boss: phases at 2/3 and 1/3 health, periodically spawns minions
    Boss {
        max_health: i32,
        phase: u32,
        minion_timer: f32,
    },
}

/// Per-kind tuning, resolved once at spawn
#[derive(Debug, Clone, Copy)]
pub struct KindStats {
    pub health: i32,
    pub size: Vec2,
    pub speed: f32,
    pub aggro_range: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub attack_damage: i32,
    /// Flat reduction applied to incoming damage (minimum 1 still lands)
    pub armor: i32,
    /// Seconds per animation frame
    pub anim_rate: f32,
    /// Vertical bob amplitude, zero for ground kinds
    pub bob_amplitude: f32,
    pub bob_frequency: f32,
    pub patrol_distance: f32,
}

impl AgentKind {
    pub fn stats(&self) -> KindStats {
        match self {
            AgentKind::Buggy => KindStats {
                health: 2,
                size: Vec2::new(48.0, 28.0),
                speed: 180.0,
                aggro_range: 320.0,
                attack_range: 48.0,
                attack_cooldown: 1.2,
                attack_damage: 2,
                armor: 0,
                anim_rate: 0.12,
                bob_amplitude: 0.0,
                bob_frequency: 0.0,
                patrol_distance: 140.0,
            },
            AgentKind::Tank => KindStats {
                health: 6,
                size: Vec2::new(64.0, 36.0),
                speed: 70.0,
                aggro_range: 360.0,
                attack_range: 64.0,
                attack_cooldown: 2.0,
                attack_damage: 3,
                armor: 1,
                anim_rate: 0.2,
                bob_amplitude: 0.0,
                bob_frequency: 0.0,
                patrol_distance: 100.0,
            },
            AgentKind::Drone => KindStats {
                health: 1,
                size: Vec2::new(30.0, 22.0),
                speed: 150.0,
                aggro_range: 300.0,
                attack_range: 40.0,
                attack_cooldown: 1.0,
                attack_damage: 1,
                armor: 0,
                anim_rate: 0.08,
                bob_amplitude: 14.0,
                bob_frequency: 3.0,
                patrol_distance: 160.0,
            },
            AgentKind::Gunboat => KindStats {
                health: 3,
                size: Vec2::new(56.0, 26.0),
                speed: 110.0,
                aggro_range: 340.0,
                attack_range: 56.0,
                attack_cooldown: 1.6,
                attack_damage: 2,
                armor: 0,
                anim_rate: 0.15,
                bob_amplitude: 8.0,
                bob_frequency: 1.5,
                patrol_distance: 180.0,
            },
            AgentKind::Grunt => KindStats {
                health: 2,
                size: Vec2::new(30.0, 44.0),
                speed: 120.0,
                aggro_range: 280.0,
                attack_range: 40.0,
                attack_cooldown: 1.0,
                attack_damage: 2,
                armor: 0,
                anim_rate: 0.1,
                bob_amplitude: 0.0,
                bob_frequency: 0.0,
                patrol_distance: 120.0,
            },
            AgentKind::Sniper => KindStats {
                health: 2,
                size: Vec2::new(30.0, 44.0),
                speed: 90.0,
                aggro_range: 420.0,
                attack_range: 360.0,
                attack_cooldown: 2.4,
                attack_damage: 2,
                armor: 0,
                anim_rate: 0.14,
                bob_amplitude: 0.0,
                bob_frequency: 0.0,
                patrol_distance: 80.0,
            },
            AgentKind::Boss { max_health, .. } => KindStats {
                health: *max_health,
                size: Vec2::new(96.0, 88.0),
                speed: 95.0,
                aggro_range: 520.0,
                attack_range: 120.0,
                attack_cooldown: 1.8,
                attack_damage: 3,
                armor: 1,
                anim_rate: 0.18,
                bob_amplitude: 0.0,
                bob_frequency: 0.0,
                patrol_distance: 60.0,
            },
        }
    }

    /// Boss-tagged agents survive compaction even when inactive so level
    /// completion can still observe them.
    #[inline]
    pub fn is_boss(&self) -> bool {
        matches!(self, AgentKind::Boss { .. })
    }

    /// Standard boss loadout
    pub fn boss() -> Self {
        AgentKind::Boss {
            max_health: 24,
            phase: 0,
            minion_timer: 6.0,
        }
    }
}

/// A hostile agent
#[derive(Debug, Clone)]
pub struct Agent {
    pub id: u32,
    pub kind: AgentKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub active: bool,
    pub health: i32,
    pub facing: Facing,
    pub anim_timer: f32,
    pub anim_frame: u32,
    pub aggro_range: f32,
    pub attack_range: f32,
    /// Remaining cooldown before the next attack fires
    pub attack_cooldown: f32,
    pub state: BehaviorState,
    pub patrol_anchor: Vec2,
    pub patrol_dir: f32,
    pub patrol_distance: f32,
    /// Accumulated phase for airborne/waterborne bob
    pub bob_phase: f32,
}

impl Agent {
    pub fn spawn(id: u32, kind: AgentKind, pos: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            pos,
            size: stats.size,
            active: true,
            health: stats.health,
            facing: Facing::Left,
            anim_timer: 0.0,
            anim_frame: 0,
            aggro_range: stats.aggro_range,
            attack_range: stats.attack_range,
            attack_cooldown: stats.attack_cooldown,
            state: BehaviorState::Patrol,
            patrol_anchor: pos,
            patrol_dir: 1.0,
            patrol_distance: stats.patrol_distance,
            bob_phase: 0.0,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    /// Distance between agent and avatar centers
    #[inline]
    pub fn distance_to(&self, avatar: &Avatar) -> f32 {
        self.bounds().center().distance(avatar.bounds().center())
    }
}

/// Avatar-fired bullet
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub lifetime: f32,
    pub active: bool,
}

impl Projectile {
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: Vec2::splat(PROJECTILE_SIZE),
        }
    }
}

/// Healing pickup flavors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectibleKind {
    Minor,
    Major,
}

impl CollectibleKind {
    pub fn heal_amount(&self) -> i32 {
        match self {
            CollectibleKind::Minor => HEAL_MINOR,
            CollectibleKind::Major => HEAL_MAJOR,
        }
    }

    pub fn pickup_event(&self) -> AudioEvent {
        match self {
            CollectibleKind::Minor => AudioEvent::CollectMinor,
            CollectibleKind::Major => AudioEvent::CollectMajor,
        }
    }
}

/// A floating healing pickup
#[derive(Debug, Clone)]
pub struct Collectible {
    pub id: u32,
    pub pos: Vec2,
    pub kind: CollectibleKind,
    pub active: bool,
    /// Float-animation phase (renderer bobs the sprite with it)
    pub float_phase: f32,
}

impl Collectible {
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: Vec2::new(20.0, 20.0),
        }
    }
}

/// Surface flavor for platforms; rendering only, physics ignores it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Dirt,
    Metal,
    Stone,
}

/// Static level geometry
#[derive(Debug, Clone)]
pub struct Platform {
    pub rect: Rect,
    pub surface: SurfaceKind,
}

/// The complete simulation context, owned by the session and passed by
/// reference to each tick phase.
#[derive(Debug)]
pub struct World {
    pub avatar: Avatar,
    pub agents: Vec<Agent>,
    pub projectiles: Vec<Projectile>,
    pub collectibles: Vec<Collectible>,
    pub platforms: Vec<Platform>,
    /// Current level bounds
    pub level_width: f32,
    pub level_height: f32,
    /// Avatar spawn point for the current level
    pub level_start: Vec2,
    /// Camera left edge, follows the avatar
    pub camera_x: f32,
    pub score: u64,
    /// Total agents defeated this level
    pub defeated: u32,
    /// Sound triggers accumulated this tick, drained by the host
    pub events: Vec<AudioEvent>,
    pub rng: Pcg32,
    next_id: u32,
}

impl World {
    pub fn new(seed: u64) -> Self {
        Self {
            avatar: Avatar::new(Vec2::new(64.0, 0.0)),
            agents: Vec::new(),
            projectiles: Vec::new(),
            collectibles: Vec::new(),
            platforms: Vec::new(),
            level_width: 2000.0,
            level_height: 600.0,
            level_start: Vec2::new(64.0, 0.0),
            camera_x: 0.0,
            score: 0,
            defeated: 0,
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    #[inline]
    pub fn push_event(&mut self, event: AudioEvent) {
        self.events.push(event);
    }

    /// Drain this tick's audio triggers into a host sink
    pub fn drain_events(&mut self, sink: &mut dyn crate::audio::AudioSink) {
        for event in self.events.drain(..) {
            sink.play(event);
        }
    }

    pub fn active_agent_count(&self) -> usize {
        self.agents.iter().filter(|a| a.active).count()
    }

    pub fn active_collectible_count(&self) -> usize {
        self.collectibles.iter().filter(|c| c.active).count()
    }

    /// Compaction pass, run once per tick after all phases. Entities are
    /// soft-deleted (active = false) mid-phase; this is where they actually
    /// leave the registries. Inactive bosses are retained so the defeat-boss
    /// victory predicate can still observe them.
    pub fn sweep(&mut self) {
        self.agents.retain(|a| a.active || a.kind.is_boss());
        self.projectiles.retain(|p| p.active);
        self.collectibles.retain(|c| c.active);
    }

    /// Read-only snapshot for the renderer, valid after a tick completes
    pub fn render_view(&self) -> RenderView<'_> {
        RenderView {
            avatar: &self.avatar,
            agents: &self.agents,
            projectiles: &self.projectiles,
            collectibles: &self.collectibles,
            platforms: &self.platforms,
            camera_x: self.camera_x,
            score: self.score,
        }
    }
}

/// Borrowed view over the registries for drawing
#[derive(Debug)]
pub struct RenderView<'a> {
    pub avatar: &'a Avatar,
    pub agents: &'a [Agent],
    pub projectiles: &'a [Projectile],
    pub collectibles: &'a [Collectible],
    pub platforms: &'a [Platform],
    pub camera_x: f32,
    pub score: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_damage_starts_invulnerability() {
        let mut avatar = Avatar::new(Vec2::ZERO);
        assert_eq!(avatar.health, 10);

        let outcome = avatar.take_damage(2);
        assert_eq!(outcome, DamageOutcome::Hurt);
        assert_eq!(avatar.health, 8);
        assert_eq!(avatar.invuln_timer, INVULN_DURATION);

        // Second hit inside the window is a no-op
        let outcome = avatar.take_damage(2);
        assert_eq!(outcome, DamageOutcome::Ignored);
        assert_eq!(avatar.health, 8);
    }

    #[test]
    fn test_lethal_damage_costs_a_life() {
        let mut avatar = Avatar::new(Vec2::ZERO);
        avatar.health = 2;

        let outcome = avatar.take_damage(5);
        assert_eq!(outcome, DamageOutcome::Died);
        assert!(avatar.dead);
        assert_eq!(avatar.health, 0);
        assert_eq!(avatar.lives, START_LIVES - 1);

        // Damage while dead changes nothing
        assert_eq!(avatar.take_damage(3), DamageOutcome::Ignored);
        assert_eq!(avatar.lives, START_LIVES - 1);
    }

    #[test]
    fn test_respawn_resets_and_grants_invulnerability() {
        let start = Vec2::new(50.0, 100.0);
        let mut avatar = Avatar::new(start);
        avatar.pos = Vec2::new(900.0, 400.0);
        avatar.health = 1;
        avatar.take_damage(5);
        assert!(avatar.dead);

        // Not yet
        assert!(!avatar.tick_respawn(RESPAWN_DELAY * 0.5, start));
        assert!(avatar.dead);

        // Timer expires
        assert!(avatar.tick_respawn(RESPAWN_DELAY, start));
        assert!(!avatar.dead);
        assert_eq!(avatar.pos, start);
        assert_eq!(avatar.health, MAX_HEALTH);
        assert!(avatar.invuln_timer > 0.0);
    }

    #[test]
    fn test_heal_is_capped() {
        let mut avatar = Avatar::new(Vec2::ZERO);
        avatar.health = 9;
        avatar.heal(5);
        assert_eq!(avatar.health, 10);
    }

    #[test]
    fn test_sweep_retains_inactive_boss() {
        let mut world = World::new(1);
        let boss_id = world.next_entity_id();
        let grunt_id = world.next_entity_id();
        let mut boss = Agent::spawn(boss_id, AgentKind::boss(), Vec2::new(100.0, 0.0));
        let mut grunt = Agent::spawn(grunt_id, AgentKind::Grunt, Vec2::new(200.0, 0.0));
        boss.active = false;
        grunt.active = false;
        world.agents.push(boss);
        world.agents.push(grunt);

        world.sweep();
        assert_eq!(world.agents.len(), 1);
        assert!(world.agents[0].kind.is_boss());
    }

    #[test]
    fn test_sweep_removes_spent_projectiles_and_pickups() {
        let mut world = World::new(1);
        let pid = world.next_entity_id();
        world.projectiles.push(Projectile {
            id: pid,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            lifetime: 0.0,
            active: false,
        });
        let cid = world.next_entity_id();
        world.collectibles.push(Collectible {
            id: cid,
            pos: Vec2::ZERO,
            kind: CollectibleKind::Minor,
            active: true,
            float_phase: 0.0,
        });

        world.sweep();
        assert!(world.projectiles.is_empty());
        assert_eq!(world.collectibles.len(), 1);
    }

    proptest! {
        /// Arbitrary interleavings of damage and healing keep health in
        /// [0, MAX_HEALTH] and never underflow lives.
        #[test]
        fn prop_health_stays_bounded(ops in prop::collection::vec((0..2usize, 1..6i32), 0..64)) {
            let mut avatar = Avatar::new(Vec2::ZERO);
            for (op, amount) in ops {
                match op {
                    0 => {
                        avatar.take_damage(amount);
                    }
                    _ => avatar.heal(amount),
                }
                avatar.tick_timers(INVULN_DURATION + 0.1);
                avatar.tick_respawn(RESPAWN_DELAY + 0.1, Vec2::ZERO);
                prop_assert!((0..=MAX_HEALTH).contains(&avatar.health));
            }
        }
    }
}
