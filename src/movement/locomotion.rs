//! Movement domain: intent scaling and gravity / jump integration.

use bevy::prelude::*;

use crate::movement::{ControllerTuning, MovementState};

/// What changed while integrating one `update` tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct VerticalTick {
    /// A pending jump turned into upward velocity.
    pub jumped: bool,
    /// The body left the ground this tick.
    pub took_off: bool,
    /// The body touched down this tick.
    pub landed: bool,
}

/// Project `direction` onto the ground plane, clamp it to unit length, and
/// scale it to this tick's walking or running displacement.
pub(crate) fn horizontal_displacement(
    direction: Vec3,
    tuning: &ControllerTuning,
    run: bool,
    dt: f32,
) -> Vec3 {
    if !direction.is_finite() || !dt.is_finite() || dt <= 0.0 {
        return Vec3::ZERO;
    }

    let flat = Vec3::new(direction.x, 0.0, direction.z).clamp_length_max(1.0);
    if flat.length_squared() <= f32::EPSILON {
        return Vec3::ZERO;
    }

    let speed = if run {
        tuning.walk_speed * tuning.run_multiplier
    } else {
        tuning.walk_speed
    };
    flat * speed * dt
}

/// Apply the ground probe result, any pending jump, and gravity to the
/// vertical velocity.
pub(crate) fn integrate_vertical(
    state: &mut MovementState,
    tuning: &ControllerTuning,
    grounded: bool,
    dt: f32,
) -> VerticalTick {
    // A body still rising out of a jump is not standing on anything, even
    // while the probe brushes the floor it left.
    let grounded = grounded && state.vertical_velocity <= 0.0;

    let mut tick = VerticalTick {
        landed: grounded && !state.grounded,
        took_off: !grounded && state.grounded,
        ..default()
    };
    state.grounded = grounded;

    if std::mem::take(&mut state.jump_requested) && !state.climbing && !state.dodging {
        state.vertical_velocity = tuning.jump_velocity;
        tick.jumped = true;
        tick.took_off = true;
        tick.landed = false;
        state.grounded = false;
        return tick;
    }

    if state.climbing || state.dodging {
        state.vertical_velocity = 0.0;
        return tick;
    }

    if state.grounded {
        state.vertical_velocity = state.vertical_velocity.max(0.0);
    } else {
        state.vertical_velocity -= tuning.gravity * dt;
    }

    tick
}
