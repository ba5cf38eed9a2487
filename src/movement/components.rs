//! Movement domain: per-controller movement state.

use bevy::prelude::*;

/// Timer residue below this ends a dodge, so f32 rounding never leaves a
/// sliver tick behind.
const DODGE_TIMER_EPSILON: f32 = 1e-6;

/// Transient movement state, rebuilt every tick and never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovementState {
    /// Horizontal intent from the last `move_character` call.
    pub intent: Vec3,
    pub vertical_velocity: f32,
    pub grounded: bool,
    pub climbing: bool,
    pub dodging: bool,
    pub dodge_timer: f32,
    pub dodge_velocity: Vec3,
    pub jump_requested: bool,
}

impl MovementState {
    /// Begin a dodge burst. Returns false when a dodge is already running or
    /// the direction has no length.
    pub fn start_dodge(&mut self, direction: Vec3, speed: f32, duration: f32) -> bool {
        if self.dodging {
            return false;
        }
        let Some(direction) = direction.try_normalize() else {
            return false;
        };

        self.dodging = true;
        self.dodge_timer = duration;
        self.dodge_velocity = direction * speed;
        self.climbing = false;
        self.jump_requested = false;
        true
    }

    /// Advance a running dodge by `dt` and return the displacement to apply
    /// this tick. The last tick only covers the time left on the timer.
    pub fn tick_dodge(&mut self, dt: f32) -> Vec3 {
        if !self.dodging {
            return Vec3::ZERO;
        }

        let step = dt.min(self.dodge_timer).max(0.0);
        let displacement = self.dodge_velocity * step;
        self.dodge_timer -= step;
        if self.dodge_timer <= DODGE_TIMER_EPSILON {
            self.clear_dodge();
        }
        displacement
    }

    pub fn clear_dodge(&mut self) {
        self.dodging = false;
        self.dodge_timer = 0.0;
        self.dodge_velocity = Vec3::ZERO;
    }

    pub fn start_climbing(&mut self) {
        if self.dodging {
            return;
        }
        self.climbing = true;
        self.vertical_velocity = 0.0;
    }

    pub fn stop_climbing(&mut self) {
        self.climbing = false;
    }
}
