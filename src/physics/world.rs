//! Physics domain: the query/mutation contract consumed by character controllers.

use std::ops::ControlFlow;

use avian3d::prelude::*;
use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use thiserror::Error;

/// Errors raised by queries and mutations against the physics world.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("body {0} does not exist or has no physics components")]
    MissingBody(Entity),

    #[error("body {0} is not dynamic and cannot receive impulses")]
    NotDynamic(Entity),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("invalid pose: {0}")]
    InvalidPose(String),

    #[error("the spatial query pipeline is not installed")]
    MissingPipeline,
}

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyKind {
    /// Immovable geometry, blocks unconditionally.
    Static,
    /// Moved directly by its owner.
    Kinematic,
    /// Simulated; blocks movement but accepts impulses.
    Dynamic,
}

impl From<RigidBody> for BodyKind {
    fn from(value: RigidBody) -> Self {
        match value {
            RigidBody::Static => BodyKind::Static,
            RigidBody::Kinematic => BodyKind::Kinematic,
            RigidBody::Dynamic => BodyKind::Dynamic,
        }
    }
}

impl From<BodyKind> for RigidBody {
    fn from(value: BodyKind) -> Self {
        match value {
            BodyKind::Static => RigidBody::Static,
            BodyKind::Kinematic => RigidBody::Kinematic,
            BodyKind::Dynamic => RigidBody::Dynamic,
        }
    }
}

/// Collision shapes understood by the world. Capsules are Y-aligned and
/// `height` is the total height including both caps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BodyShape {
    Capsule { radius: f32, height: f32 },
    Cuboid { half_extents: Vec3 },
}

impl BodyShape {
    pub fn capsule(radius: f32, height: f32) -> Self {
        BodyShape::Capsule { radius, height }
    }

    pub fn cuboid(half_extents: Vec3) -> Self {
        BodyShape::Cuboid { half_extents }
    }

    /// Reject shapes the engine would build degenerate colliders from.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        match *self {
            BodyShape::Capsule { radius, height } => {
                if !positive(radius) || !positive(height) {
                    return Err(PhysicsError::InvalidShape(format!(
                        "capsule radius {radius} / height {height} must be positive"
                    )));
                }
                if height < 2.0 * radius {
                    return Err(PhysicsError::InvalidShape(format!(
                        "capsule height {height} is smaller than its diameter {}",
                        2.0 * radius
                    )));
                }
            }
            BodyShape::Cuboid { half_extents } => {
                if !(positive(half_extents.x) && positive(half_extents.y) && positive(half_extents.z))
                {
                    return Err(PhysicsError::InvalidShape(format!(
                        "cuboid half extents {half_extents} must be positive"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Distance from the shape's centre to its lowest point.
    pub fn half_height(&self) -> f32 {
        match *self {
            BodyShape::Capsule { height, .. } => height * 0.5,
            BodyShape::Cuboid { half_extents } => half_extents.y,
        }
    }
}

impl From<&BodyShape> for Collider {
    fn from(value: &BodyShape) -> Self {
        match *value {
            BodyShape::Capsule { radius, height } => {
                Collider::capsule(radius, (height - 2.0 * radius).max(0.0))
            }
            BodyShape::Cuboid { half_extents } => Collider::cuboid(
                half_extents.x * 2.0,
                half_extents.y * 2.0,
                half_extents.z * 2.0,
            ),
        }
    }
}

/// Everything needed to create one rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub shape: BodyShape,
    pub position: Vec3,
    pub rotation: Quat,
    /// Overrides the density-derived mass of dynamic bodies.
    pub mass: Option<f32>,
}

impl BodyDesc {
    pub fn new(kind: BodyKind, shape: BodyShape, position: Vec3) -> Self {
        Self {
            kind,
            shape,
            position,
            rotation: Quat::IDENTITY,
            mass: None,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    fn validate(&self) -> Result<(), PhysicsError> {
        self.shape.validate()?;
        if !self.position.is_finite() || !self.rotation.is_finite() {
            return Err(PhysicsError::InvalidPose(format!(
                "position {} / rotation {} must be finite",
                self.position, self.rotation
            )));
        }
        if let Some(mass) = self.mass {
            if !(mass.is_finite() && mass > 0.0) {
                return Err(PhysicsError::InvalidShape(format!(
                    "mass {mass} must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// A collider found overlapping a query shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeHit {
    pub body: Entity,
    pub kind: BodyKind,
    pub center: Vec3,
    pub rotation: Quat,
    /// Present when the collider is a box.
    pub half_extents: Option<Vec3>,
}

/// The query and mutation calls a character controller makes against the
/// physics engine. The engine's solver stays a black box behind this trait.
pub trait PhysicsWorld {
    fn create_body(&mut self, desc: BodyDesc) -> Result<Entity, PhysicsError>;

    /// Visit every collider overlapping `shape` at the given pose, skipping
    /// `exclude` and sensors. Returning [`ControlFlow::Break`] from the visitor stops the
    /// iteration.
    fn intersections_with_shape(
        &mut self,
        position: Vec3,
        rotation: Quat,
        shape: &BodyShape,
        exclude: Option<Entity>,
        visitor: &mut dyn FnMut(ShapeHit) -> ControlFlow<()>,
    ) -> Result<(), PhysicsError>;

    fn apply_impulse_at_point(
        &mut self,
        body: Entity,
        impulse: Vec3,
        point: Vec3,
        wake: bool,
    ) -> Result<(), PhysicsError>;

    fn remove_rigid_body(&mut self, body: Entity) -> Result<(), PhysicsError>;

    fn translation(&self, body: Entity) -> Result<Vec3, PhysicsError>;

    fn set_translation(&mut self, body: Entity, translation: Vec3) -> Result<(), PhysicsError>;

    fn create_kinematic_body(
        &mut self,
        shape: BodyShape,
        position: Vec3,
    ) -> Result<Entity, PhysicsError> {
        self.create_body(BodyDesc::new(BodyKind::Kinematic, shape, position))
    }

    fn create_static_body(
        &mut self,
        shape: BodyShape,
        position: Vec3,
        rotation: Quat,
    ) -> Result<Entity, PhysicsError> {
        self.create_body(BodyDesc::new(BodyKind::Static, shape, position).with_rotation(rotation))
    }

    fn create_dynamic_body(
        &mut self,
        shape: BodyShape,
        position: Vec3,
        rotation: Quat,
        mass: Option<f32>,
    ) -> Result<Entity, PhysicsError> {
        let mut desc = BodyDesc::new(BodyKind::Dynamic, shape, position).with_rotation(rotation);
        desc.mass = mass;
        self.create_body(desc)
    }
}

impl PhysicsWorld for World {
    fn create_body(&mut self, desc: BodyDesc) -> Result<Entity, PhysicsError> {
        desc.validate()?;

        let transform = Transform::from_translation(desc.position).with_rotation(desc.rotation);
        let mut body = self.spawn((
            RigidBody::from(desc.kind),
            Collider::from(&desc.shape),
            transform,
            GlobalTransform::from(transform),
            Position(desc.position),
            Rotation(desc.rotation),
        ));
        if let Some(mass) = desc.mass {
            body.insert(Mass(mass));
        }

        let entity = body.id();
        debug!(
            "Created {:?} body {} at {} ({:?})",
            desc.kind, entity, desc.position, desc.shape
        );
        Ok(entity)
    }

    fn intersections_with_shape(
        &mut self,
        position: Vec3,
        rotation: Quat,
        shape: &BodyShape,
        exclude: Option<Entity>,
        visitor: &mut dyn FnMut(ShapeHit) -> ControlFlow<()>,
    ) -> Result<(), PhysicsError> {
        shape.validate()?;
        if !position.is_finite() || !rotation.is_finite() {
            return Err(PhysicsError::InvalidPose(format!(
                "query pose {position} / {rotation} must be finite"
            )));
        }

        if !self.contains_resource::<SpatialQueryPipeline>() {
            return Err(PhysicsError::MissingPipeline);
        }

        // Bodies spawned or teleported since the last step are not in the
        // pipeline yet.
        let mut state = SystemState::<(
            SpatialQuery,
            Query<(&Collider, &Position, &Rotation, Option<&RigidBody>), Without<Sensor>>,
        )>::new(self);
        let (mut spatial_query, colliders) = state.get_mut(self);
        spatial_query.update_pipeline();

        let query_shape = Collider::from(shape);
        let filter = SpatialQueryFilter::from_excluded_entities(exclude);

        spatial_query.shape_intersections_callback(
            &query_shape,
            position,
            rotation,
            &filter,
            |entity| {
                // Sensors are triggers, not geometry.
                let Ok((collider, collider_position, collider_rotation, rigid_body)) =
                    colliders.get(entity)
                else {
                    return true;
                };

                let half_extents = collider.shape_scaled().as_cuboid().map(|cuboid| {
                    Vec3::new(
                        cuboid.half_extents.x,
                        cuboid.half_extents.y,
                        cuboid.half_extents.z,
                    )
                });

                visitor(ShapeHit {
                    body: entity,
                    // Bare colliders are world geometry.
                    kind: rigid_body.copied().map_or(BodyKind::Static, BodyKind::from),
                    center: collider_position.0,
                    rotation: collider_rotation.0,
                    half_extents,
                })
                .is_continue()
            },
        );

        Ok(())
    }

    fn apply_impulse_at_point(
        &mut self,
        body: Entity,
        impulse: Vec3,
        point: Vec3,
        wake: bool,
    ) -> Result<(), PhysicsError> {
        match self.get::<RigidBody>(body) {
            Some(RigidBody::Dynamic) => {}
            Some(_) => return Err(PhysicsError::NotDynamic(body)),
            None => return Err(PhysicsError::MissingBody(body)),
        }
        if !impulse.is_finite() || !point.is_finite() {
            return Err(PhysicsError::InvalidPose(format!(
                "impulse {impulse} at {point} must be finite"
            )));
        }

        let mut state = SystemState::<Query<Forces>>::new(self);
        let mut bodies = state.get_mut(self);
        let mut forces = bodies
            .get_mut(body)
            .map_err(|_| PhysicsError::MissingBody(body))?;

        if wake {
            forces.apply_linear_impulse_at_point(impulse, point);
        } else {
            forces
                .non_waking()
                .apply_linear_impulse_at_point(impulse, point);
        }

        Ok(())
    }

    fn remove_rigid_body(&mut self, body: Entity) -> Result<(), PhysicsError> {
        let entity = self
            .get_entity_mut(body)
            .map_err(|_| PhysicsError::MissingBody(body))?;
        entity.despawn();
        debug!("Removed body {}", body);
        Ok(())
    }

    fn translation(&self, body: Entity) -> Result<Vec3, PhysicsError> {
        self.get::<Position>(body)
            .map(|position| position.0)
            .ok_or(PhysicsError::MissingBody(body))
    }

    fn set_translation(&mut self, body: Entity, translation: Vec3) -> Result<(), PhysicsError> {
        if !translation.is_finite() {
            return Err(PhysicsError::InvalidPose(format!(
                "translation {translation} must be finite"
            )));
        }

        let mut entity = self
            .get_entity_mut(body)
            .map_err(|_| PhysicsError::MissingBody(body))?;

        let Some(mut position) = entity.get_mut::<Position>() else {
            return Err(PhysicsError::MissingBody(body));
        };
        position.0 = translation;

        // Keep the transforms in step so the next physics prepare pass does
        // not pull the body back to its old pose.
        let transform = entity.get_mut::<Transform>().map(|mut transform| {
            transform.translation = translation;
            *transform
        });
        if let Some(transform) = transform {
            if let Some(mut global) = entity.get_mut::<GlobalTransform>() {
                *global = GlobalTransform::from(transform);
            }
        }

        Ok(())
    }
}
