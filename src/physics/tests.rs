//! Physics domain: tests for the step clock, shapes, and the avian3d world.

use std::ops::ControlFlow;
use std::time::Duration;

use avian3d::prelude::{Collider, Position, Rotation, Sensor};
use bevy::prelude::*;

use super::{
    BodyDesc, BodyKind, BodyShape, FixedStepClock, PhysicsError, PhysicsSim, PhysicsWorld,
    SimSettings,
};

const DT: f32 = 1.0 / 60.0;

fn sim_with_floor() -> (PhysicsSim, Entity) {
    let mut sim = PhysicsSim::new(SimSettings::default());
    let floor = sim
        .create_static_body(
            BodyShape::cuboid(Vec3::new(10.0, 0.5, 10.0)),
            Vec3::new(0.0, -0.5, 0.0),
            Quat::IDENTITY,
        )
        .unwrap();
    (sim, floor)
}

fn overlapping(sim: &mut PhysicsSim, position: Vec3, shape: BodyShape) -> Vec<Entity> {
    let mut hits = Vec::new();
    sim.intersections_with_shape(position, Quat::IDENTITY, &shape, None, &mut |hit| {
        hits.push(hit.body);
        ControlFlow::Continue(())
    })
    .unwrap();
    hits
}

// -----------------------------------------------------------------------------
// FixedStepClock tests
// -----------------------------------------------------------------------------

// 1/64 s is exact in f32, so these deltas convert without rounding.
const TIMESTEP: Duration = Duration::from_nanos(15_625_000);

#[test]
fn test_clock_runs_one_step_per_timestep() {
    let mut clock = FixedStepClock::new(TIMESTEP, 5);

    assert_eq!(clock.advance(0.015625), 1);
    assert_eq!(clock.advance(0.0390625), 2);
    assert!(clock.accumulator() < TIMESTEP);
    assert_eq!(clock.steps_taken(), 3);
}

#[test]
fn test_clock_accumulates_partial_frames() {
    let mut clock = FixedStepClock::new(TIMESTEP, 5);

    assert_eq!(clock.advance(0.00390625), 0);
    assert_eq!(clock.advance(0.00390625), 0);
    assert_eq!(clock.advance(0.00390625), 0);
    assert_eq!(clock.advance(0.00390625), 1);
    assert_eq!(clock.accumulator(), Duration::ZERO);
}

#[test]
fn test_clock_caps_steps_and_discards_excess() {
    let mut clock = FixedStepClock::new(TIMESTEP, 3);

    let steps = clock.advance(1.0);

    assert_eq!(steps, 3);
    assert_eq!(clock.accumulator(), Duration::ZERO);
    assert!(clock.discarded() >= Duration::from_millis(900));

    // The dropped time is not repaid on the next frame.
    assert_eq!(clock.advance(0.015625), 1);
}

#[test]
fn test_clock_ignores_invalid_deltas() {
    let mut clock = FixedStepClock::default();

    assert_eq!(clock.advance(0.0), 0);
    assert_eq!(clock.advance(-1.0), 0);
    assert_eq!(clock.advance(f32::NAN), 0);
    assert_eq!(clock.accumulator(), Duration::ZERO);
}

#[test]
fn test_clock_saturates_huge_deltas() {
    let mut clock = FixedStepClock::new(TIMESTEP, 4);

    assert_eq!(clock.advance(1e30), 4);
    assert_eq!(clock.accumulator(), Duration::ZERO);
    assert!(clock.discarded() > Duration::from_secs(1_000_000));

    assert_eq!(clock.advance(f32::MAX), 4);
    assert_eq!(clock.advance(0.015625), 1);
    assert_eq!(clock.steps_taken(), 9);
}

// -----------------------------------------------------------------------------
// BodyShape tests
// -----------------------------------------------------------------------------

#[test]
fn test_shape_validation() {
    assert!(BodyShape::capsule(0.3, 1.6).validate().is_ok());
    assert!(BodyShape::capsule(0.3, 0.5).validate().is_err());
    assert!(BodyShape::capsule(0.0, 1.6).validate().is_err());
    assert!(BodyShape::cuboid(Vec3::new(1.0, 0.0, 1.0)).validate().is_err());
    assert!(BodyShape::cuboid(Vec3::splat(f32::INFINITY)).validate().is_err());
}

#[test]
fn test_shape_half_height() {
    assert_eq!(BodyShape::capsule(0.3, 1.6).half_height(), 0.8);
    assert_eq!(BodyShape::cuboid(Vec3::splat(0.5)).half_height(), 0.5);
}

// -----------------------------------------------------------------------------
// Avian world tests
// -----------------------------------------------------------------------------

#[test]
fn test_invalid_body_is_rejected() {
    let mut sim = PhysicsSim::new(SimSettings::default());

    let result = sim.create_body(BodyDesc::new(
        BodyKind::Kinematic,
        BodyShape::capsule(-1.0, 1.0),
        Vec3::ZERO,
    ));

    assert!(matches!(result, Err(PhysicsError::InvalidShape(_))));
}

#[test]
fn test_intersection_query_classifies_bodies() {
    let (mut sim, floor) = sim_with_floor();
    let crate_box = sim
        .create_dynamic_body(
            BodyShape::cuboid(Vec3::splat(0.5)),
            Vec3::new(2.0, 0.5, 0.0),
            Quat::IDENTITY,
            None,
        )
        .unwrap();

    let mut kinds = Vec::new();
    sim.intersections_with_shape(
        Vec3::new(2.0, 0.2, 0.0),
        Quat::IDENTITY,
        &BodyShape::cuboid(Vec3::splat(0.4)),
        None,
        &mut |hit| {
            kinds.push((hit.body, hit.kind, hit.half_extents));
            ControlFlow::Continue(())
        },
    )
    .unwrap();

    assert!(kinds.contains(&(floor, BodyKind::Static, Some(Vec3::new(10.0, 0.5, 10.0)))));
    assert!(kinds.contains(&(crate_box, BodyKind::Dynamic, Some(Vec3::splat(0.5)))));
}

#[test]
fn test_intersection_query_excludes_and_stops_early() {
    let (mut sim, floor) = sim_with_floor();
    let shape = BodyShape::cuboid(Vec3::splat(0.2));

    assert_eq!(overlapping(&mut sim, Vec3::new(0.0, 0.1, 0.0), shape), vec![floor]);
    assert!(overlapping(&mut sim, Vec3::new(0.0, 1.0, 0.0), shape).is_empty());

    let mut visited = 0;
    sim.intersections_with_shape(
        Vec3::new(0.0, 0.1, 0.0),
        Quat::IDENTITY,
        &shape,
        Some(floor),
        &mut |_| {
            visited += 1;
            ControlFlow::Break(())
        },
    )
    .unwrap();
    assert_eq!(visited, 0);
}

#[test]
fn test_intersection_query_skips_sensors() {
    let (mut sim, floor) = sim_with_floor();
    let translation = Vec3::new(0.0, 1.0, 0.0);
    let sensor = sim
        .world_mut()
        .spawn((
            Collider::cuboid(2.0, 2.0, 2.0),
            Sensor,
            Transform::from_translation(translation),
            Position(translation),
            Rotation::default(),
        ))
        .id();

    let shape = BodyShape::cuboid(Vec3::splat(0.2));

    let hits = overlapping(&mut sim, Vec3::new(0.0, 0.1, 0.0), shape);

    assert_eq!(hits, vec![floor]);
    assert!(!hits.contains(&sensor));
    assert!(overlapping(&mut sim, translation, shape).is_empty());
}

#[test]
fn test_intersection_query_needs_physics_plugins() {
    let mut world = World::new();

    let result = world.intersections_with_shape(
        Vec3::ZERO,
        Quat::IDENTITY,
        &BodyShape::cuboid(Vec3::ONE),
        None,
        &mut |_| ControlFlow::Continue(()),
    );

    assert_eq!(result, Err(PhysicsError::MissingPipeline));
}

#[test]
fn test_set_translation_moves_query_pose() {
    let mut sim = PhysicsSim::new(SimSettings::default());
    let body = sim
        .create_kinematic_body(BodyShape::capsule(0.3, 1.6), Vec3::new(0.0, 5.0, 0.0))
        .unwrap();

    sim.set_translation(body, Vec3::new(3.0, 5.0, 0.0)).unwrap();

    assert_eq!(sim.translation(body).unwrap(), Vec3::new(3.0, 5.0, 0.0));
    assert_eq!(
        overlapping(&mut sim, Vec3::new(3.0, 5.0, 0.0), BodyShape::cuboid(Vec3::splat(0.1))),
        vec![body]
    );

    sim.step(DT);
    assert!(sim.translation(body).unwrap().abs_diff_eq(Vec3::new(3.0, 5.0, 0.0), 1e-5));
}

#[test]
fn test_impulse_requires_dynamic_body() {
    let (mut sim, floor) = sim_with_floor();

    let result = sim.apply_impulse_at_point(floor, Vec3::X, Vec3::ZERO, true);

    assert_eq!(result, Err(PhysicsError::NotDynamic(floor)));
}

#[test]
fn test_impulse_moves_dynamic_body_on_next_step() {
    let (mut sim, _) = sim_with_floor();
    let crate_box = sim
        .create_dynamic_body(
            BodyShape::cuboid(Vec3::splat(0.5)),
            Vec3::new(0.0, 0.5, 0.0),
            Quat::IDENTITY,
            Some(1.0),
        )
        .unwrap();
    sim.step(DT);
    let start = sim.translation(crate_box).unwrap();

    sim.apply_impulse_at_point(crate_box, Vec3::X * 5.0, start, true)
        .unwrap();
    for _ in 0..10 {
        sim.step(DT);
    }

    assert!(sim.translation(crate_box).unwrap().x > start.x + 0.1);
}

#[test]
fn test_removed_body_is_gone() {
    let mut sim = PhysicsSim::new(SimSettings::default());
    let body = sim
        .create_kinematic_body(BodyShape::capsule(0.3, 1.6), Vec3::ZERO)
        .unwrap();

    sim.remove_rigid_body(body).unwrap();

    assert_eq!(sim.translation(body), Err(PhysicsError::MissingBody(body)));
    assert_eq!(
        sim.remove_rigid_body(body),
        Err(PhysicsError::MissingBody(body))
    );
}

#[test]
fn test_sim_step_respects_catch_up_cap() {
    let mut sim = PhysicsSim::new(SimSettings {
        max_steps_per_frame: 2,
        ..default()
    });

    assert_eq!(sim.step(DT), 1);
    assert_eq!(sim.step(1.0), 2);
    assert!(sim.clock().discarded() > Duration::ZERO);
}

#[test]
fn test_sim_survives_huge_frame_delta() {
    let (mut sim, _) = sim_with_floor();

    assert_eq!(sim.step(1e30), 5);
    assert_eq!(sim.step(DT), 1);
}
