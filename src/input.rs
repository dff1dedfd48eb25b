//! Per-tick input snapshot
//!
//! The core never reads devices directly; the host resolves key/button state
//! into this set of named boolean intents once per frame. Movement and attack
//! intents are level-triggered (read every tick while held). Menu intents
//! (`confirm`, `select_level`) are edge-like: the host is expected to clear
//! them after the tick that consumes them.

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    /// Move left (held)
    pub move_left: bool,
    /// Move right (held)
    pub move_right: bool,
    /// Jump (held)
    pub jump: bool,
    /// Attack with the current weapon (held)
    pub attack: bool,
    /// Toggle melee/ranged weapon
    pub switch_weapon: bool,
    /// Pause toggle
    pub pause: bool,
    /// Menu confirm (click/enter)
    pub confirm: bool,
    /// Level selection digit pressed on the title screen (1-based)
    pub select_level: Option<usize>,
}

impl InputSnapshot {
    /// Horizontal movement intent: -1.0, 0.0 or 1.0
    pub fn move_axis(&self) -> f32 {
        let mut axis = 0.0;
        if self.move_left {
            axis -= 1.0;
        }
        if self.move_right {
            axis += 1.0;
        }
        axis
    }

    /// Clear the edge-triggered menu intents after consumption
    pub fn clear_menu_intents(&mut self) {
        self.confirm = false;
        self.pause = false;
        self.switch_weapon = false;
        self.select_level = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_axis() {
        let mut input = InputSnapshot::default();
        assert_eq!(input.move_axis(), 0.0);

        input.move_left = true;
        assert_eq!(input.move_axis(), -1.0);

        input.move_right = true;
        assert_eq!(input.move_axis(), 0.0);

        input.move_left = false;
        assert_eq!(input.move_axis(), 1.0);
    }

    #[test]
    fn test_clear_menu_intents_keeps_movement() {
        let mut input = InputSnapshot {
            move_right: true,
            jump: true,
            confirm: true,
            select_level: Some(2),
            ..Default::default()
        };
        input.clear_menu_intents();
        assert!(input.move_right);
        assert!(input.jump);
        assert!(!input.confirm);
        assert!(input.select_level.is_none());
    }
}
