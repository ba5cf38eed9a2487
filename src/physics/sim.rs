//! Physics domain: a headless avian3d world driven one frame at a time.

use std::ops::ControlFlow;
use std::time::Duration;

use avian3d::prelude::*;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::time::TimeUpdateStrategy;
use serde::{Deserialize, Serialize};

use super::clock::FixedStepClock;
use super::world::{BodyDesc, BodyShape, PhysicsError, PhysicsWorld, ShapeHit};

/// Simulation settings, loadable from the arena file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimSettings {
    /// Fixed steps per second.
    pub tick_rate: f64,
    /// Catch-up steps allowed per [`PhysicsSim::step`] call.
    pub max_steps_per_frame: u32,
    /// Downward acceleration applied to dynamic bodies.
    pub gravity: f32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_steps_per_frame: 5,
            gravity: 9.81,
        }
    }
}

impl SimSettings {
    pub fn timestep(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate)
    }
}

/// Installs avian3d with the arena's gravity and fixed timestep. Time is
/// advanced manually by [`PhysicsSim::step`].
pub struct SimulationPlugin {
    pub settings: SimSettings,
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default())
            .insert_resource(Gravity(Vec3::NEG_Y * self.settings.gravity))
            .insert_resource(Time::<Fixed>::from_duration(self.settings.timestep()))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    }
}

/// Headless physics world. Owns a Bevy [`App`] running avian3d and a
/// [`FixedStepClock`] that decides how many fixed steps each frame runs.
pub struct PhysicsSim {
    app: App,
    clock: FixedStepClock,
}

impl PhysicsSim {
    pub fn new(settings: SimSettings) -> Self {
        let clock = FixedStepClock::new(settings.timestep(), settings.max_steps_per_frame);

        let mut app = App::new();
        app.add_plugins((
            MinimalPlugins,
            TransformPlugin,
            AssetPlugin::default(),
            ScenePlugin,
        ))
        .add_plugins(SimulationPlugin {
            settings: settings.clone(),
        })
        .init_resource::<Assets<Mesh>>();

        app.finish();
        app.cleanup();

        // The virtual clock must never clamp a frame the step clock asked for.
        let max_frame = clock.timestep() * (clock.max_steps() + 1);
        app.world_mut()
            .resource_mut::<Time<Virtual>>()
            .set_max_delta(max_frame);

        // The first update only starts Bevy's clocks and has zero delta.
        app.update();

        info!(
            "Physics simulation ready: {} Hz, {} catch-up steps, gravity {}",
            settings.tick_rate, settings.max_steps_per_frame, settings.gravity
        );

        Self { app, clock }
    }

    /// Advance the simulation by `dt` seconds of frame time. Returns the
    /// number of fixed steps that ran.
    pub fn step(&mut self, dt: f32) -> u32 {
        let steps = self.clock.advance(dt);
        if steps == 0 {
            return 0;
        }

        let owed = self.clock.timestep() * steps;
        self.app
            .insert_resource(TimeUpdateStrategy::ManualDuration(owed));
        self.app.update();
        steps
    }

    pub fn clock(&self) -> &FixedStepClock {
        &self.clock
    }

    pub fn world(&self) -> &World {
        self.app.world()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}

impl PhysicsWorld for PhysicsSim {
    fn create_body(&mut self, desc: BodyDesc) -> Result<Entity, PhysicsError> {
        self.world_mut().create_body(desc)
    }

    fn intersections_with_shape(
        &mut self,
        position: Vec3,
        rotation: Quat,
        shape: &BodyShape,
        exclude: Option<Entity>,
        visitor: &mut dyn FnMut(ShapeHit) -> ControlFlow<()>,
    ) -> Result<(), PhysicsError> {
        self.world_mut()
            .intersections_with_shape(position, rotation, shape, exclude, visitor)
    }

    fn apply_impulse_at_point(
        &mut self,
        body: Entity,
        impulse: Vec3,
        point: Vec3,
        wake: bool,
    ) -> Result<(), PhysicsError> {
        self.world_mut()
            .apply_impulse_at_point(body, impulse, point, wake)
    }

    fn remove_rigid_body(&mut self, body: Entity) -> Result<(), PhysicsError> {
        self.world_mut().remove_rigid_body(body)
    }

    fn translation(&self, body: Entity) -> Result<Vec3, PhysicsError> {
        self.world().translation(body)
    }

    fn set_translation(&mut self, body: Entity, translation: Vec3) -> Result<(), PhysicsError> {
        self.world_mut().set_translation(body, translation)
    }
}
