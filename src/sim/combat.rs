//! Combat resolution
//!
//! Four independent passes per tick: projectiles vs agents, avatar/agent
//! contact, the melee hitbox vs agents, and avatar vs collectibles. Defeat
//! bookkeeping is idempotent: an agent is only ever counted once because
//! damage is routed exclusively through [`damage_agent`], which ignores
//! inactive targets.

use crate::Rect;
use crate::audio::AudioEvent;
use crate::consts::*;

use super::state::{Agent, DamageOutcome, Facing, World};

/// What a single damage application did to an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AgentDamage {
    /// Target was already inactive; nothing happened
    Ignored,
    Hit,
    Defeated,
}

/// Apply damage to an agent, respecting armor and the active flag. The
/// active flag flips here and nowhere else, which is what makes defeat
/// counting idempotent.
fn damage_agent(agent: &mut Agent, amount: i32) -> AgentDamage {
    if !agent.active {
        return AgentDamage::Ignored;
    }
    let dealt = (amount - agent.kind.stats().armor).max(1);
    agent.health -= dealt;
    if agent.health <= 0 {
        agent.active = false;
        AgentDamage::Defeated
    } else {
        AgentDamage::Hit
    }
}

/// Run all four combat passes
pub fn resolve_combat(world: &mut World) {
    projectiles_vs_agents(world);
    avatar_vs_agents(world);
    melee_vs_agents(world);
    avatar_vs_collectibles(world);
}

/// Pass 1: each projectile hits at most one agent, then dies
fn projectiles_vs_agents(world: &mut World) {
    let World {
        projectiles,
        agents,
        events,
        score,
        defeated,
        ..
    } = world;

    for projectile in projectiles.iter_mut() {
        if !projectile.active {
            continue;
        }
        let bounds = projectile.bounds();
        for agent in agents.iter_mut() {
            if !agent.active || !bounds.overlaps(&agent.bounds()) {
                continue;
            }
            projectile.active = false;
            match damage_agent(agent, PROJECTILE_DAMAGE) {
                AgentDamage::Defeated => {
                    *defeated += 1;
                    *score += SCORE_RANGED_KILL;
                    events.push(AudioEvent::EnemyDestroyed);
                }
                AgentDamage::Hit => events.push(AudioEvent::EnemyHit),
                AgentDamage::Ignored => {}
            }
            // One projectile, at most one hit
            break;
        }
    }
}

/// Pass 2: overlapping an agent costs contact damage plus a small knockback
fn avatar_vs_agents(world: &mut World) {
    let World {
        avatar,
        agents,
        events,
        level_width,
        ..
    } = world;

    if avatar.dead {
        return;
    }
    for agent in agents.iter() {
        if !agent.active || !avatar.bounds().overlaps(&agent.bounds()) {
            continue;
        }
        match avatar.take_damage(CONTACT_DAMAGE) {
            DamageOutcome::Ignored => {}
            outcome => {
                // Shove the avatar away from the agent, kept inside the world
                let away = avatar.bounds().center().x - agent.bounds().center().x;
                avatar.pos.x = (avatar.pos.x + away.signum() * CONTACT_KNOCKBACK)
                    .clamp(0.0, (*level_width - avatar.size.x).max(0.0));
                events.push(match outcome {
                    DamageOutcome::Died => AudioEvent::PlayerDeath,
                    _ => AudioEvent::PlayerHurt,
                });
            }
        }
    }
}

/// The melee hitbox, offset from the avatar in its facing direction
pub fn melee_hitbox(avatar: &super::state::Avatar) -> Rect {
    let x = match avatar.facing {
        Facing::Right => avatar.bounds().right(),
        Facing::Left => avatar.bounds().left() - MELEE_RANGE,
    };
    let y = avatar.pos.y + (avatar.size.y - MELEE_HEIGHT) * 0.5;
    Rect::new(x, y, MELEE_RANGE, MELEE_HEIGHT)
}

/// Pass 3: melee strikes while the swing timer is live. Each swing hits a
/// given agent once, tracked by id.
fn melee_vs_agents(world: &mut World) {
    let World {
        avatar,
        agents,
        events,
        score,
        defeated,
        ..
    } = world;

    if !avatar.melee_active() {
        return;
    }
    let hitbox = melee_hitbox(avatar);
    let push = avatar.facing.sign() * MELEE_KNOCKBACK;

    for agent in agents.iter_mut() {
        if !agent.active
            || avatar.swing_hits.contains(&agent.id)
            || !hitbox.overlaps(&agent.bounds())
        {
            continue;
        }
        avatar.swing_hits.push(agent.id);
        agent.pos.x += push;
        match damage_agent(agent, MELEE_DAMAGE) {
            AgentDamage::Defeated => {
                *defeated += 1;
                *score += SCORE_MELEE_KILL;
                events.push(AudioEvent::EnemyDestroyed);
            }
            AgentDamage::Hit => events.push(AudioEvent::EnemyHit),
            AgentDamage::Ignored => {}
        }
    }
}

/// Pass 4: pickups heal (capped) and score, and are removed immediately
/// rather than waiting for the compaction sweep
fn avatar_vs_collectibles(world: &mut World) {
    let World {
        avatar,
        collectibles,
        events,
        score,
        ..
    } = world;

    if avatar.dead {
        return;
    }
    let bounds = avatar.bounds();
    let mut i = 0;
    while i < collectibles.len() {
        let collectible = &collectibles[i];
        if collectible.active && bounds.overlaps(&collectible.bounds()) {
            avatar.heal(collectible.kind.heal_amount());
            *score += SCORE_PICKUP;
            events.push(collectible.kind.pickup_event());
            collectibles.swap_remove(i);
        } else {
            i += 1;
        }
    }
}
