//! Agent behavior state machine
//!
//! Every active agent runs patrol -> chase -> attack with hysteresis bands on
//! the way back down (aggro * 1.5 to leave chase, attack range * 1.2 to leave
//! attack), so agents do not flicker at a threshold. There is no direct
//! patrol/attack edge in either direction.

use glam::Vec2;

use crate::audio::AudioEvent;
use crate::consts::*;

use super::state::{Agent, AgentKind, BehaviorState, DamageOutcome, Facing, World};

/// Patrol movement runs at a fraction of the kind's chase speed
const PATROL_SPEED_FACTOR: f32 = 0.5;
/// Seconds between boss minion spawns
const BOSS_MINION_INTERVAL: f32 = 8.0;
/// How far outside the level an agent may wander before deactivation
const BOUNDS_MARGIN: f32 = 96.0;

/// Advance every active agent by one tick
pub fn update_agents(world: &mut World, dt: f32) {
    let World {
        agents,
        avatar,
        level_width,
        level_height,
        ..
    } = world;

    let avatar_center = avatar.bounds().center();
    let avatar_dead = avatar.dead;

    // Attack payloads and minion spawns are deferred so the agent loop never
    // aliases the avatar or the registry it iterates
    let mut strikes: Vec<i32> = Vec::new();
    let mut minions: Vec<Vec2> = Vec::new();

    for agent in agents.iter_mut() {
        if !agent.active {
            continue;
        }
        let stats = agent.kind.stats();

        // Facing tracks the avatar every tick, independent of state
        agent.facing = Facing::toward(avatar_center.x - agent.bounds().center().x);

        // Per-kind animation clock, independent of state
        agent.anim_timer += dt;
        while agent.anim_timer >= stats.anim_rate {
            agent.anim_timer -= stats.anim_rate;
            agent.anim_frame = agent.anim_frame.wrapping_add(1);
        }

        // Airborne/waterborne bob, applied as a positional delta so the
        // underlying path is unaffected
        if stats.bob_amplitude > 0.0 {
            let old = agent.bob_phase.sin();
            agent.bob_phase += stats.bob_frequency * dt;
            agent.pos.y += (agent.bob_phase.sin() - old) * stats.bob_amplitude;
        }

        agent.attack_cooldown = (agent.attack_cooldown - dt).max(0.0);

        let distance = agent.distance_to(avatar);
        match agent.state {
            BehaviorState::Patrol => {
                agent.pos.x += agent.patrol_dir * stats.speed * PATROL_SPEED_FACTOR * dt;
                if (agent.pos.x - agent.patrol_anchor.x).abs() > agent.patrol_distance {
                    agent.patrol_dir = -agent.patrol_dir;
                }
                if !avatar_dead && distance <= agent.aggro_range {
                    agent.state = BehaviorState::Chase;
                }
            }
            BehaviorState::Chase => {
                let to_avatar = avatar_center - agent.bounds().center();
                agent.pos.x += to_avatar.x.signum() * stats.speed * dt;
                if stats.bob_amplitude > 0.0 {
                    // Flyers and boats close vertically as well
                    agent.pos.y += to_avatar.y.signum() * stats.speed * 0.5 * dt;
                }
                if avatar_dead || distance > agent.aggro_range * AGGRO_HYSTERESIS {
                    agent.patrol_anchor = agent.pos;
                    agent.state = BehaviorState::Patrol;
                } else if distance <= agent.attack_range {
                    agent.state = BehaviorState::Attack;
                }
            }
            BehaviorState::Attack => {
                // Holds position; fires on cooldown expiry while in range
                if agent.attack_cooldown == 0.0 && !avatar_dead && distance <= agent.attack_range {
                    strikes.push(stats.attack_damage);
                    agent.attack_cooldown = stats.attack_cooldown;
                }
                if avatar_dead || distance > agent.attack_range * ATTACK_HYSTERESIS {
                    agent.state = BehaviorState::Chase;
                }
            }
        }

        // Boss bookkeeping: phase from remaining health, periodic minions
        if let AgentKind::Boss {
            max_health,
            phase,
            minion_timer,
        } = &mut agent.kind
        {
            let fraction = agent.health as f32 / (*max_health).max(1) as f32;
            *phase = if fraction <= 1.0 / 3.0 {
                2
            } else if fraction <= 2.0 / 3.0 {
                1
            } else {
                0
            };

            *minion_timer -= dt;
            if *minion_timer <= 0.0 {
                *minion_timer = BOSS_MINION_INTERVAL;
                minions.push(agent.pos + Vec2::new(-48.0, agent.size.y - 44.0));
            }
        }

        // Agents that leave the playable bounds are retired
        if agent.pos.x < -BOUNDS_MARGIN
            || agent.pos.x > *level_width + BOUNDS_MARGIN
            || agent.pos.y > *level_height + FALL_MARGIN
        {
            agent.active = false;
        }
    }

    // Boss minions respect the same population cap as the spawner
    for pos in minions {
        if world.active_agent_count() >= AGENT_SPAWN_CAP {
            break;
        }
        let id = world.next_entity_id();
        world.agents.push(Agent::spawn(id, AgentKind::Grunt, pos));
    }

    for damage in strikes {
        match world.avatar.take_damage(damage) {
            DamageOutcome::Hurt => world.events.push(AudioEvent::PlayerHurt),
            DamageOutcome::Died => world.events.push(AudioEvent::PlayerDeath),
            DamageOutcome::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Avatar;

    fn agent_at(world: &mut World, kind: AgentKind, x: f32) -> usize {
        let id = world.next_entity_id();
        world.agents.push(Agent::spawn(id, kind, Vec2::new(x, 400.0)));
        world.agents.len() - 1
    }

    fn place_avatar(world: &mut World, x: f32) {
        world.avatar = Avatar::new(Vec2::new(x, 400.0));
    }

    #[test]
    fn test_patrol_enters_chase_within_aggro() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        place_avatar(&mut world, 1200.0);
        let idx = agent_at(&mut world, AgentKind::Grunt, 1000.0);

        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents[idx].state, BehaviorState::Chase);
    }

    #[test]
    fn test_patrol_never_jumps_straight_to_attack() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        // Avatar practically on top of the agent
        place_avatar(&mut world, 1005.0);
        let idx = agent_at(&mut world, AgentKind::Grunt, 1000.0);

        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents[idx].state, BehaviorState::Chase);

        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents[idx].state, BehaviorState::Attack);
    }

    #[test]
    fn test_chase_hysteresis_band() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        place_avatar(&mut world, 1200.0);
        let idx = agent_at(&mut world, AgentKind::Grunt, 1000.0);
        world.agents[idx].state = BehaviorState::Chase;

        // Just past aggro but inside the hysteresis band: keep chasing
        world.avatar.pos.x = 1000.0 + world.agents[idx].aggro_range * 1.2;
        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents[idx].state, BehaviorState::Chase);

        // Past the band: fall back to patrol
        let agent_x = world.agents[idx].pos.x;
        world.avatar.pos.x = agent_x + world.agents[idx].aggro_range * 1.6;
        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents[idx].state, BehaviorState::Patrol);
    }

    #[test]
    fn test_attack_falls_back_to_chase_never_patrol() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        place_avatar(&mut world, 1010.0);
        let idx = agent_at(&mut world, AgentKind::Grunt, 1000.0);
        world.agents[idx].state = BehaviorState::Attack;

        // Way out of range: one tick may only drop to chase
        world.avatar.pos.x = 3000.0;
        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents[idx].state, BehaviorState::Chase);
    }

    #[test]
    fn test_attack_fires_on_cooldown_expiry() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        place_avatar(&mut world, 1010.0);
        let idx = agent_at(&mut world, AgentKind::Grunt, 1000.0);
        world.agents[idx].state = BehaviorState::Attack;
        world.agents[idx].attack_cooldown = 0.0;

        let health_before = world.avatar.health;
        update_agents(&mut world, SIM_DT);
        assert_eq!(world.avatar.health, health_before - 2);
        assert!(world.agents[idx].attack_cooldown > 0.0);
        assert!(world.events.contains(&AudioEvent::PlayerHurt));
    }

    #[test]
    fn test_patrol_reverses_at_boundary() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        // Avatar far away so patrol never escalates
        place_avatar(&mut world, 3500.0);
        let idx = agent_at(&mut world, AgentKind::Grunt, 500.0);
        world.agents[idx].pos.x = 500.0 + world.agents[idx].patrol_distance + 1.0;

        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents[idx].patrol_dir, -1.0);
    }

    #[test]
    fn test_drone_bobs_independent_of_state() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        place_avatar(&mut world, 3500.0);
        let idx = agent_at(&mut world, AgentKind::Drone, 500.0);

        let y0 = world.agents[idx].pos.y;
        let mut moved = false;
        for _ in 0..30 {
            update_agents(&mut world, SIM_DT);
            if (world.agents[idx].pos.y - y0).abs() > 1.0 {
                moved = true;
            }
        }
        assert!(moved);
        assert_eq!(world.agents[idx].state, BehaviorState::Patrol);
    }

    #[test]
    fn test_boss_spawns_minion_and_phases() {
        let mut world = World::new(3);
        world.level_width = 4000.0;
        place_avatar(&mut world, 3500.0);
        let idx = agent_at(&mut world, AgentKind::boss(), 500.0);

        // Fast-forward the minion timer
        if let AgentKind::Boss { minion_timer, .. } = &mut world.agents[idx].kind {
            *minion_timer = 0.01;
        }
        world.agents[idx].health = 7; // under 1/3 of 24

        update_agents(&mut world, SIM_DT);
        assert_eq!(world.agents.len(), 2);
        assert_eq!(world.agents[1].kind, AgentKind::Grunt);
        if let AgentKind::Boss { phase, .. } = world.agents[idx].kind {
            assert_eq!(phase, 2);
        } else {
            panic!("boss kind changed");
        }
    }

    #[test]
    fn test_transitions_stay_legal_for_any_distance_sequence() {
        let mut world = World::new(99);
        world.level_width = 10_000.0;
        let idx = agent_at(&mut world, AgentKind::Buggy, 5000.0);
        place_avatar(&mut world, 9000.0);

        let mut prev = world.agents[idx].state;
        // Drive the avatar through an arbitrary dance around the agent
        let offsets = [
            9000.0, 500.0, 40.0, 10.0, 40.0, 600.0, 10.0, 5.0, 2000.0, 30.0, 9000.0, 15.0,
        ];
        for (i, offset) in offsets.iter().cycle().take(200).enumerate() {
            world.avatar.pos.x = (world.agents[idx].pos.x + offset + i as f32).min(9900.0);
            world.avatar.invuln_timer = 10.0; // keep the avatar alive
            update_agents(&mut world, SIM_DT);
            let next = world.agents[idx].state;
            let legal = matches!(
                (prev, next),
                (BehaviorState::Patrol, BehaviorState::Patrol)
                    | (BehaviorState::Patrol, BehaviorState::Chase)
                    | (BehaviorState::Chase, BehaviorState::Chase)
                    | (BehaviorState::Chase, BehaviorState::Attack)
                    | (BehaviorState::Chase, BehaviorState::Patrol)
                    | (BehaviorState::Attack, BehaviorState::Attack)
                    | (BehaviorState::Attack, BehaviorState::Chase)
            );
            assert!(legal, "illegal transition {:?} -> {:?}", prev, next);
            prev = next;
        }
    }
}
