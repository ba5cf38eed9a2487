//! Movement domain: the kinematic character controller.

use bevy::prelude::*;

use crate::activity::{ActivityReporter, MovementActivity, NoopReporter};
use crate::movement::collisions::{blocking_query, body_blocked, climb_surface, ground_contact};
use crate::movement::locomotion::{horizontal_displacement, integrate_vertical};
use crate::movement::resolve::{VerticalContact, settle_vertical, slide_horizontal};
use crate::movement::{ControllerTuning, MovementState};
use crate::physics::{PhysicsError, PhysicsWorld};

/// Moves one kinematic capsule through a physics world.
///
/// The controller owns its body exclusively. Obstacles belong to the world
/// and are only ever inspected or pushed. Every tick-level call takes the
/// world explicitly; a failing query or mutation is logged and that tick's
/// movement is skipped.
pub struct CharacterController {
    body: Entity,
    tuning: ControllerTuning,
    state: MovementState,
    position: Vec3,
    reporter: Box<dyn ActivityReporter>,
}

impl CharacterController {
    /// Create the capsule body at `position`. A controller cannot exist
    /// without its body, so any failure here is returned.
    pub fn new<W: PhysicsWorld + ?Sized>(
        world: &mut W,
        position: Vec3,
        tuning: ControllerTuning,
    ) -> Result<Self, PhysicsError> {
        let problems = tuning.problems();
        if !problems.is_empty() {
            return Err(PhysicsError::InvalidShape(problems.join("; ")));
        }

        let body = world.create_kinematic_body(tuning.body_shape(), position)?;
        info!("Character body {} created at {}", body, position);

        Ok(Self {
            body,
            tuning,
            state: MovementState::default(),
            position,
            reporter: Box::new(NoopReporter),
        })
    }

    pub fn with_reporter(mut self, reporter: impl ActivityReporter) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn body(&self) -> Entity {
        self.body
    }

    pub fn tuning(&self) -> &ControllerTuning {
        &self.tuning
    }

    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn is_grounded(&self) -> bool {
        self.state.grounded
    }

    pub fn is_climbing(&self) -> bool {
        self.state.climbing
    }

    pub fn is_dodging(&self) -> bool {
        self.state.dodging
    }

    pub fn vertical_velocity(&self) -> f32 {
        self.state.vertical_velocity
    }

    /// Teleport the body. The movement state is left alone.
    pub fn set_position<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, position: Vec3) {
        match world.set_translation(self.body, position) {
            Ok(()) => self.position = position,
            Err(err) => warn!("Teleport of {} to {} failed: {}", self.body, position, err),
        }
    }

    /// Queue a jump for the next [`update`](Self::update). Ignored unless
    /// grounded, and never while climbing or dodging.
    pub fn jump(&mut self) {
        if !self.state.grounded || self.state.climbing || self.state.dodging {
            debug!(
                "Jump ignored: grounded={}, climbing={}, dodging={}",
                self.state.grounded, self.state.climbing, self.state.dodging
            );
            return;
        }
        self.state.jump_requested = true;
    }

    /// Start a dodge burst along the flat part of `direction`. A second call
    /// while the burst runs does nothing.
    pub fn dodge(&mut self, direction: Vec3) {
        let flat = Vec3::new(direction.x, 0.0, direction.z);
        if !flat.is_finite() {
            return;
        }
        if self.state.start_dodge(flat, self.tuning.dodge_speed, self.tuning.dodge_duration) {
            debug!("Dodge started along {}", self.state.dodge_velocity);
            self.reporter
                .report(MovementActivity::Dodging, self.tuning.dodge_distance());
        }
    }

    pub fn start_climbing(&mut self) {
        self.state.start_climbing();
    }

    pub fn stop_climbing(&mut self) {
        self.state.stop_climbing();
    }

    /// Ground check, jump and gravity for one tick, followed by the vertical
    /// part of the motion.
    pub fn update<W: PhysicsWorld + ?Sized>(&mut self, world: &mut W, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        if let Err(err) = self.try_update(world, dt) {
            warn!("Character {} skipped vertical update: {}", self.body, err);
        }
    }

    fn try_update<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        dt: f32,
    ) -> Result<(), PhysicsError> {
        let grounded = ground_contact(world, self.body, &self.tuning, self.position)?;

        let mut next = self.state.clone();
        let tick = integrate_vertical(&mut next, &self.tuning, grounded, dt);

        let dy = if next.climbing || next.dodging {
            0.0
        } else if next.grounded {
            // Close whatever gap the probe tolerated.
            -self.tuning.ground_probe_depth
        } else {
            next.vertical_velocity * dt
        };

        let body = self.body;
        let tuning = &self.tuning;
        let outcome = settle_vertical(self.position, dy, tuning.contact_refine_steps, |candidate| {
            body_blocked(world, body, tuning, candidate)
        })?;

        if outcome.position != self.position {
            world.set_translation(self.body, outcome.position)?;
        }
        if outcome.contact == Some(VerticalContact::Ceiling) {
            next.vertical_velocity = 0.0;
        }

        self.position = outcome.position;
        self.state = next;

        if tick.jumped {
            self.reporter
                .report(MovementActivity::Jumping, self.tuning.jump_velocity);
        }
        if tick.took_off {
            self.reporter
                .report(MovementActivity::Airborne, self.state.vertical_velocity.abs());
        }
        if tick.landed {
            debug!("Character {} landed at {}", self.body, self.position);
        }

        Ok(())
    }

    /// Horizontal motion for one tick.
    ///
    /// A running dodge wins and moves the body without any collision checks.
    /// Otherwise the body climbs when asked to and something climbable is
    /// ahead, and walks or runs with wall sliding in every other case.
    pub fn move_character<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        direction: Vec3,
        dt: f32,
        run: bool,
        wants_to_climb: bool,
    ) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }

        let intent = if direction.is_finite() {
            Vec3::new(direction.x, 0.0, direction.z).clamp_length_max(1.0)
        } else {
            Vec3::ZERO
        };
        self.state.intent = intent;

        let result = if self.state.dodging {
            self.dodge_step(world, dt)
        } else {
            self.walk_or_climb(world, intent, dt, run, wants_to_climb)
        };

        if let Err(err) = result {
            warn!("Character {} skipped movement: {}", self.body, err);
        }
    }

    fn dodge_step<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        dt: f32,
    ) -> Result<(), PhysicsError> {
        // The burst is timed, so the countdown runs even if the move fails.
        let displacement = self.state.tick_dodge(dt);
        let target = self.position + displacement;
        world.set_translation(self.body, target)?;
        self.position = target;
        if !self.state.dodging {
            debug!("Dodge finished at {}", self.position);
        }
        Ok(())
    }

    fn walk_or_climb<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        intent: Vec3,
        dt: f32,
        run: bool,
        wants_to_climb: bool,
    ) -> Result<(), PhysicsError> {
        let has_intent = intent.length_squared() > f32::EPSILON;

        if wants_to_climb
            && has_intent
            && climb_surface(world, self.body, &self.tuning, self.position, intent)?
        {
            return self.climb_step(world, dt);
        }

        let displacement = horizontal_displacement(intent, &self.tuning, run, dt);
        let origin = self.position;
        let body = self.body;
        let tuning = &self.tuning;
        let outcome = if displacement == Vec3::ZERO {
            None
        } else {
            Some(slide_horizontal(origin, displacement, |candidate| {
                blocking_query(world, body, tuning, origin, candidate)
            })?)
        };

        // The body moves before anything is pushed, so a failed move leaves
        // the obstacles and the state untouched.
        let moved = match &outcome {
            Some(outcome) if outcome.position != origin => {
                world.set_translation(self.body, outcome.position)?;
                (outcome.position - origin).length()
            }
            _ => 0.0,
        };

        if self.state.climbing {
            self.state.stop_climbing();
            debug!("Character {} stopped climbing", self.body);
        }
        let Some(outcome) = outcome else {
            return Ok(());
        };

        if moved > 0.0 {
            self.position = outcome.position;
            let activity = if run {
                MovementActivity::Running
            } else {
                MovementActivity::Walking
            };
            self.reporter.report(activity, moved);
        }

        let push = intent.normalize_or_zero() * self.tuning.push_force * dt;
        if push == Vec3::ZERO {
            return Ok(());
        }
        for (obstacle, point) in &outcome.pushes {
            match world.apply_impulse_at_point(*obstacle, push, *point, true) {
                Ok(()) => self.reporter.report(MovementActivity::Pushing, push.length()),
                Err(err) => warn!("Character {} could not push {}: {}", self.body, obstacle, err),
            }
        }

        Ok(())
    }

    fn climb_step<W: PhysicsWorld + ?Sized>(
        &mut self,
        world: &mut W,
        dt: f32,
    ) -> Result<(), PhysicsError> {
        let rise = self.tuning.climb_speed * dt;
        let target = self.position + Vec3::Y * rise;
        world.set_translation(self.body, target)?;

        if !self.state.climbing {
            debug!("Character {} started climbing", self.body);
        }
        self.state.start_climbing();
        self.position = target;
        self.reporter.report(MovementActivity::Climbing, rise);
        Ok(())
    }

    /// Remove the body from the world. Consumes the controller, so this can
    /// only happen once.
    pub fn dispose<W: PhysicsWorld + ?Sized>(self, world: &mut W) {
        match world.remove_rigid_body(self.body) {
            Ok(()) => info!("Character body {} removed", self.body),
            Err(err) => warn!("Removing character body {} failed: {}", self.body, err),
        }
    }
}
