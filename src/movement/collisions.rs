//! Movement domain: shape queries the controller runs against the world.

use std::ops::ControlFlow;

use bevy::prelude::*;

use crate::movement::ControllerTuning;
use crate::movement::resolve::{CollisionQueryResult, contact_point_on_box};
use crate::physics::{BodyKind, BodyShape, PhysicsError, PhysicsWorld};

/// What the body would run into if it moved from `origin` to `position`,
/// ignoring the bottom `skin_width` of the capsule.
///
/// Static and kinematic colliders block outright. Dynamic colliders block
/// too, and each is returned with the point on its surface nearest to
/// `origin`, where a push should land.
pub(crate) fn blocking_query<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    body: Entity,
    tuning: &ControllerTuning,
    origin: Vec3,
    position: Vec3,
) -> Result<CollisionQueryResult, PhysicsError> {
    let (shape, offset) = tuning.horizontal_shape();
    let mut result = CollisionQueryResult::default();

    world.intersections_with_shape(
        position + offset,
        Quat::IDENTITY,
        &shape,
        Some(body),
        &mut |hit| {
            match hit.kind {
                BodyKind::Dynamic => {
                    let point = match hit.half_extents {
                        Some(half_extents) => {
                            contact_point_on_box(origin, hit.center, hit.rotation, half_extents)
                        }
                        None => origin,
                    };
                    result.add_push(hit.body, point);
                }
                BodyKind::Static | BodyKind::Kinematic => result.blocked = true,
            }
            ControlFlow::Continue(())
        },
    )?;

    Ok(result)
}

/// Whether the full body capsule overlaps anything at `position`.
pub(crate) fn body_blocked<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    body: Entity,
    tuning: &ControllerTuning,
    position: Vec3,
) -> Result<bool, PhysicsError> {
    probe_any(world, body, &tuning.body_shape(), position)
}

/// Ground probe: a thin capsule reaching just below the body's bottom.
pub(crate) fn ground_contact<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    body: Entity,
    tuning: &ControllerTuning,
    position: Vec3,
) -> Result<bool, PhysicsError> {
    let (shape, offset) = tuning.ground_probe();
    probe_any(world, body, &shape, position + offset)
}

/// Climb probe: a small capsule `climb_reach` ahead of the body along the
/// flat `direction`.
pub(crate) fn climb_surface<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    body: Entity,
    tuning: &ControllerTuning,
    position: Vec3,
    direction: Vec3,
) -> Result<bool, PhysicsError> {
    let Some(forward) = Vec3::new(direction.x, 0.0, direction.z).try_normalize() else {
        return Ok(false);
    };
    probe_any(
        world,
        body,
        &tuning.climb_probe_shape(),
        position + forward * tuning.climb_reach,
    )
}

fn probe_any<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    body: Entity,
    shape: &BodyShape,
    position: Vec3,
) -> Result<bool, PhysicsError> {
    let mut found = false;
    world.intersections_with_shape(position, Quat::IDENTITY, shape, Some(body), &mut |_| {
        found = true;
        ControlFlow::Break(())
    })?;
    Ok(found)
}
