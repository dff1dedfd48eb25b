//! Audio event triggers
//!
//! The simulation never synthesizes sound. Each tick appends named events to
//! the world's queue; the host drains them into an [`AudioSink`]. Triggers are
//! fire-and-forget: a sink that fails or a missing backend never affects
//! simulation correctness.

/// Sound event types emitted by the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    /// Avatar leaves the ground
    Jump,
    /// Avatar lands hard enough to be audible
    Land,
    /// Melee swing
    Punch,
    /// Ranged attack fired
    Gunshot,
    /// Enemy took non-lethal damage
    EnemyHit,
    /// Enemy defeated
    EnemyDestroyed,
    /// Avatar took damage
    PlayerHurt,
    /// Avatar lost a life
    PlayerDeath,
    /// Minor heal collected
    CollectMinor,
    /// Major heal collected
    CollectMajor,
    /// Level victory condition met
    LevelComplete,
    /// Run ended
    GameOver,
}

/// Host-provided audio backend. Calls must not block and must not fail the
/// tick; sinks swallow their own errors.
pub trait AudioSink {
    fn play(&mut self, event: AudioEvent);
}

/// Sink that discards everything (headless runs and tests)
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _event: AudioEvent) {}
}

/// Sink that logs each event at debug level
#[derive(Debug, Default)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&mut self, event: AudioEvent) {
        log::debug!("audio: {:?}", event);
    }
}
