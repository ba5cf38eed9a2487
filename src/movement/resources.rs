//! Movement domain: tuning for the kinematic character controller.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::physics::BodyShape;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ControllerTuning {
    pub capsule_radius: f32,
    /// Total capsule height, caps included.
    pub capsule_height: f32,
    pub walk_speed: f32,
    pub run_multiplier: f32,
    pub gravity: f32,
    pub jump_velocity: f32,
    pub climb_speed: f32,
    /// How far ahead of the body centre the climb probe sits.
    pub climb_reach: f32,
    pub climb_probe_radius: f32,
    pub dodge_speed: f32,
    pub dodge_duration: f32,
    /// How far below the capsule bottom the ground probe reaches.
    pub ground_probe_depth: f32,
    /// Bottom slice of the capsule ignored by horizontal blocking.
    pub skin_width: f32,
    /// Force (N) pushed into a blocking dynamic body while walking into it.
    pub push_force: f32,
    /// Bisection steps used to close the gap to the floor when a fall is
    /// blocked. Zero holds position.
    pub contact_refine_steps: u32,
}

impl Default for ControllerTuning {
    fn default() -> Self {
        Self {
            capsule_radius: 0.3,
            capsule_height: 1.6,
            walk_speed: 3.0,
            run_multiplier: 2.0,
            gravity: 9.81,
            jump_velocity: 5.0,
            climb_speed: 2.0,
            climb_reach: 0.45,
            climb_probe_radius: 0.15,
            dodge_speed: 12.0,
            dodge_duration: 0.25,
            ground_probe_depth: 0.1,
            skin_width: 0.02,
            push_force: 20.0,
            contact_refine_steps: 4,
        }
    }
}

impl ControllerTuning {
    /// Distance covered by one full dodge burst.
    pub fn dodge_distance(&self) -> f32 {
        self.dodge_speed * self.dodge_duration
    }

    pub fn half_height(&self) -> f32 {
        self.capsule_height * 0.5
    }

    pub fn body_shape(&self) -> BodyShape {
        BodyShape::capsule(self.capsule_radius, self.capsule_height)
    }

    /// The body capsule with its bottom `skin_width` trimmed off, and the
    /// offset from the body centre at which it sits.
    pub fn horizontal_shape(&self) -> (BodyShape, Vec3) {
        let height = self.capsule_height - self.skin_width;
        (
            BodyShape::capsule(self.capsule_radius, height),
            Vec3::Y * (self.skin_width * 0.5),
        )
    }

    /// A thin capsule whose bottom reaches `ground_probe_depth` below the
    /// body's bottom, and its offset from the body centre.
    pub fn ground_probe(&self) -> (BodyShape, Vec3) {
        let radius = self.capsule_radius * 0.9;
        let height = 2.0 * radius + 0.1;
        let bottom = -self.half_height() - self.ground_probe_depth;
        (
            BodyShape::capsule(radius, height),
            Vec3::Y * (bottom + height * 0.5),
        )
    }

    pub fn climb_probe_shape(&self) -> BodyShape {
        let height = (self.capsule_height * 0.5).max(2.0 * self.climb_probe_radius);
        BodyShape::capsule(self.climb_probe_radius, height)
    }

    /// Everything wrong with this tuning, empty when usable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let mut positive = |name: &str, value: f32| {
            if !(value.is_finite() && value > 0.0) {
                problems.push(format!("{name} must be positive, got {value}"));
            }
        };
        positive("capsule_radius", self.capsule_radius);
        positive("capsule_height", self.capsule_height);
        positive("walk_speed", self.walk_speed);
        positive("run_multiplier", self.run_multiplier);
        positive("gravity", self.gravity);
        positive("jump_velocity", self.jump_velocity);
        positive("climb_speed", self.climb_speed);
        positive("climb_reach", self.climb_reach);
        positive("climb_probe_radius", self.climb_probe_radius);
        positive("dodge_speed", self.dodge_speed);
        positive("dodge_duration", self.dodge_duration);
        positive("ground_probe_depth", self.ground_probe_depth);

        if !(self.skin_width.is_finite() && self.skin_width >= 0.0) {
            problems.push(format!("skin_width must not be negative, got {}", self.skin_width));
        }
        if !(self.push_force.is_finite() && self.push_force >= 0.0) {
            problems.push(format!("push_force must not be negative, got {}", self.push_force));
        }
        if self.capsule_height - self.skin_width < 2.0 * self.capsule_radius {
            problems.push(format!(
                "capsule_height {} leaves no room for radius {} and skin {}",
                self.capsule_height, self.capsule_radius, self.skin_width
            ));
        }
        if self.climb_probe_shape().half_height() >= self.half_height() {
            problems.push("climb probe reaches below the capsule".to_string());
        }

        problems
    }
}
