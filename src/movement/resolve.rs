//! Movement domain: axis-separated sliding, vertical settling, and contact
//! point projection.
//!
//! These functions only see the world through a `blocked_at` callback that
//! answers "what would the body hit at this position", which keeps the
//! algorithms independent of the physics engine.

use bevy::prelude::*;

/// Outcome of one blocking query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionQueryResult {
    pub blocked: bool,
    /// Dynamic bodies in the way, with the point on each to push at.
    pub pushes: Vec<(Entity, Vec3)>,
}

impl CollisionQueryResult {
    pub fn add_push(&mut self, body: Entity, point: Vec3) {
        self.blocked = true;
        if !self.pushes.iter().any(|(existing, _)| *existing == body) {
            self.pushes.push((body, point));
        }
    }
}

/// Where horizontal resolution left the body.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SlideOutcome {
    pub position: Vec3,
    /// The full displacement was blocked.
    pub blocked: bool,
    /// Dynamic bodies blocking the full displacement.
    pub pushes: Vec<(Entity, Vec3)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerticalContact {
    Floor,
    Ceiling,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VerticalOutcome {
    pub position: Vec3,
    pub contact: Option<VerticalContact>,
}

/// Move `origin` by the horizontal `displacement`, sliding along whatever
/// blocks it.
///
/// The combined move is tried first. If it is blocked, the X component is
/// tried on its own, then the Z component from wherever the X attempt ended,
/// so a wall across one axis never stops motion along the other.
pub(crate) fn slide_horizontal<E>(
    origin: Vec3,
    displacement: Vec3,
    mut blocked_at: impl FnMut(Vec3) -> Result<CollisionQueryResult, E>,
) -> Result<SlideOutcome, E> {
    let displacement = Vec3::new(displacement.x, 0.0, displacement.z);
    if displacement.length_squared() <= f32::EPSILON * f32::EPSILON {
        return Ok(SlideOutcome {
            position: origin,
            blocked: false,
            pushes: Vec::new(),
        });
    }

    let combined = blocked_at(origin + displacement)?;
    if !combined.blocked {
        return Ok(SlideOutcome {
            position: origin + displacement,
            blocked: false,
            pushes: Vec::new(),
        });
    }

    let mut position = origin;
    for axis in [Vec3::X, Vec3::Z] {
        let step = displacement * axis;
        if step == Vec3::ZERO {
            continue;
        }
        if !blocked_at(position + step)?.blocked {
            position += step;
        }
    }

    Ok(SlideOutcome {
        position,
        blocked: true,
        pushes: combined.pushes,
    })
}

/// Move `origin` vertically by `dy`.
///
/// A blocked fall keeps the largest free fraction of `dy` found by
/// `refine_steps` rounds of bisection, so the body comes to rest close to
/// the floor. A blocked rise is cancelled outright.
pub(crate) fn settle_vertical<E>(
    origin: Vec3,
    dy: f32,
    refine_steps: u32,
    mut blocked_at: impl FnMut(Vec3) -> Result<bool, E>,
) -> Result<VerticalOutcome, E> {
    if !dy.is_finite() || dy == 0.0 {
        return Ok(VerticalOutcome {
            position: origin,
            contact: None,
        });
    }

    let target = origin + Vec3::Y * dy;
    if !blocked_at(target)? {
        return Ok(VerticalOutcome {
            position: target,
            contact: None,
        });
    }

    if dy > 0.0 {
        return Ok(VerticalOutcome {
            position: origin,
            contact: Some(VerticalContact::Ceiling),
        });
    }

    let (mut free, mut blocked) = (0.0_f32, 1.0_f32);
    for _ in 0..refine_steps {
        let mid = (free + blocked) * 0.5;
        if blocked_at(origin + Vec3::Y * (dy * mid))? {
            blocked = mid;
        } else {
            free = mid;
        }
    }

    Ok(VerticalOutcome {
        position: origin + Vec3::Y * (dy * free),
        contact: Some(VerticalContact::Floor),
    })
}

/// The point on a box obstacle's surface nearest to `character` along the
/// dominant approach axis.
///
/// The offset from the box centre is clamped to the box in its local frame,
/// then the component with the largest magnitude is snapped onto its face.
/// A character sitting exactly at the centre gets its own position back.
pub fn contact_point_on_box(
    character: Vec3,
    center: Vec3,
    rotation: Quat,
    half_extents: Vec3,
) -> Vec3 {
    let offset = rotation.inverse() * (character - center);
    if offset.length_squared() <= 1e-12 {
        return character;
    }

    let mut local = offset.clamp(-half_extents, half_extents);
    let magnitude = offset.abs();
    if magnitude.x >= magnitude.y && magnitude.x >= magnitude.z {
        local.x = half_extents.x.copysign(offset.x);
    } else if magnitude.y >= magnitude.z {
        local.y = half_extents.y.copysign(offset.y);
    } else {
        local.z = half_extents.z.copysign(offset.z);
    }

    center + rotation * local
}
