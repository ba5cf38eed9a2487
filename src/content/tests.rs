//! Content domain: tests for arena parsing, scatter, validation, and
//! building.

use std::path::Path;

use bevy::prelude::*;

use super::{
    ArenaDef, BoxDef, ContentLoadError, CrateDef, ScatterDef, build_arena, load_arena,
    parse_arena, validate_arena,
};
use crate::movement::ControllerTuning;
use crate::physics::{PhysicsSim, PhysicsWorld, SimSettings};

const MINIMAL: &str = r#"(name: "minimal", spawn: (0.0, 1.0, 0.0))"#;

fn minimal() -> ArenaDef {
    parse_arena(MINIMAL, "minimal.ron").unwrap()
}

fn static_box(id: &str, half_extents: [f32; 3]) -> BoxDef {
    BoxDef {
        id: id.to_string(),
        center: [0.0, -0.5, 0.0],
        half_extents,
        yaw_degrees: 0.0,
    }
}

fn crate_def(id: &str, mass: Option<f32>) -> CrateDef {
    CrateDef {
        id: id.to_string(),
        center: [2.0, 0.5, 0.0],
        half_extents: [0.5; 3],
        yaw_degrees: 0.0,
        mass,
    }
}

// -----------------------------------------------------------------------------
// Parsing tests
// -----------------------------------------------------------------------------

#[test]
fn test_minimal_arena_fills_defaults() {
    let arena = minimal();

    assert_eq!(arena.name, "minimal");
    assert_eq!(arena.spawn_position(), Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(arena.sim, SimSettings::default());
    assert_eq!(arena.controller, ControllerTuning::default());
    assert!(arena.static_boxes.is_empty());
    assert!(arena.scatter.is_none());
    assert_eq!(arena.script_ticks(), 0);
}

#[test]
fn test_partial_tuning_keeps_other_defaults() {
    let arena = parse_arena(
        r#"(
            name: "fast",
            spawn: (0.0, 0.8, 0.0),
            controller: (walk_speed: 5.0),
            crates: [(id: "c", center: (1.0, 0.5, 0.0), half_extents: (0.5, 0.5, 0.5), mass: 3.0)],
            script: [(ticks: 10, dodge: (1.0, 0.0, 0.0)), (ticks: 5, jump: true)],
        )"#,
        "fast.ron",
    )
    .unwrap();

    assert_eq!(arena.controller.walk_speed, 5.0);
    assert_eq!(arena.controller.capsule_radius, 0.3);
    assert_eq!(arena.crates[0].mass, Some(3.0));
    assert_eq!(arena.script[0].dodge, Some([1.0, 0.0, 0.0]));
    assert!(arena.script[1].jump);
    assert_eq!(arena.script_ticks(), 15);
}

#[test]
fn test_parse_error_names_file() {
    let err = parse_arena("(name: ", "broken.ron").unwrap_err();

    assert!(matches!(err, ContentLoadError::Parse { .. }));
    assert!(err.to_string().contains("broken.ron"));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_arena(Path::new("does/not/exist.ron")).unwrap_err();

    assert!(matches!(err, ContentLoadError::Io { .. }));
}

#[test]
fn test_bundled_arena_is_valid() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/data/arena.ron");

    let arena = load_arena(&path).unwrap();
    let errors = validate_arena(&arena);

    assert!(errors.is_empty(), "{errors:?}");
    assert!(arena.script_ticks() > 0);
}

// -----------------------------------------------------------------------------
// Scatter tests
// -----------------------------------------------------------------------------

#[test]
fn test_scatter_is_deterministic_and_bounded() {
    let scatter = ScatterDef {
        seed: 42,
        count: 16,
        area_half_extent: 4.0,
        half_extent: 0.5,
        mass: Some(2.0),
    };

    let first = scatter.generate();
    let second = scatter.generate();

    assert_eq!(first, second);
    assert_eq!(first.len(), 16);
    for def in &first {
        assert!(def.center[0].abs() <= 3.5 && def.center[2].abs() <= 3.5);
        assert_eq!(def.center[1], 0.5);
        assert_eq!(def.mass, Some(2.0));
    }
}

#[test]
fn test_scatter_seed_changes_layout() {
    let mut scatter = ScatterDef {
        seed: 1,
        count: 4,
        area_half_extent: 10.0,
        half_extent: 0.5,
        mass: None,
    };
    let first = scatter.generate();

    scatter.seed = 2;

    assert_ne!(first, scatter.generate());
}

// -----------------------------------------------------------------------------
// Validation tests
// -----------------------------------------------------------------------------

#[test]
fn test_validation_flags_duplicate_ids() {
    let mut arena = minimal();
    arena.static_boxes.push(static_box("floor", [5.0, 0.5, 5.0]));
    arena.crates.push(crate_def("floor", None));

    let errors = validate_arena(&arena);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].source_type, "Crate");
    assert_eq!(errors[0].field, "id");
}

#[test]
fn test_validation_flags_bad_geometry_and_mass() {
    let mut arena = minimal();
    arena.static_boxes.push(static_box("flat", [5.0, 0.0, 5.0]));
    arena.crates.push(crate_def("ghost", Some(-1.0)));

    let errors = validate_arena(&arena);
    let fields: Vec<_> = errors.iter().map(|e| e.field).collect();

    assert!(fields.contains(&"half_extents"));
    assert!(fields.contains(&"mass"));
}

#[test]
fn test_validation_flags_settings_and_script() {
    let mut arena = minimal();
    arena.sim.max_steps_per_frame = 0;
    arena.controller.gravity = 0.0;
    arena.spawn = [f32::NAN, 0.0, 0.0];
    arena.script.push(Default::default());

    let errors = validate_arena(&arena);
    let fields: Vec<_> = errors.iter().map(|e| e.field).collect();

    assert!(fields.contains(&"sim.max_steps_per_frame"));
    assert!(fields.contains(&"controller"));
    assert!(fields.contains(&"spawn"));
    assert!(fields.contains(&"ticks"));
}

#[test]
fn test_validation_error_display() {
    let mut arena = minimal();
    arena.crates.push(crate_def("heavy", Some(0.0)));

    let errors = validate_arena(&arena);

    assert_eq!(
        errors[0].to_string(),
        "Crate 'heavy' has invalid mass: Some(0.0) must be positive"
    );
}

// -----------------------------------------------------------------------------
// Building tests
// -----------------------------------------------------------------------------

#[test]
fn test_build_arena_creates_every_body() {
    let mut arena = minimal();
    arena.static_boxes.push(static_box("floor", [10.0, 0.5, 10.0]));
    arena.crates.push(crate_def("box", Some(4.0)));
    arena.scatter = Some(ScatterDef {
        seed: 3,
        count: 2,
        area_half_extent: 8.0,
        half_extent: 0.25,
        mass: None,
    });
    let mut sim = PhysicsSim::new(arena.sim.clone());

    let handles = build_arena(&mut sim, &arena).unwrap();

    assert_eq!(handles.static_bodies.len(), 1);
    assert_eq!(handles.crates.len(), 3);
    let body = handles.crate_body("box").unwrap();
    assert_eq!(sim.translation(body).unwrap(), Vec3::new(2.0, 0.5, 0.0));
    assert!(handles.crate_body("scatter_1").is_some());
    assert!(handles.crate_body("missing").is_none());
}

#[test]
fn test_build_arena_rejects_invalid_box() {
    let mut arena = minimal();
    arena.static_boxes.push(static_box("flat", [5.0, 0.0, 5.0]));
    let mut sim = PhysicsSim::new(SimSettings::default());

    assert!(build_arena(&mut sim, &arena).is_err());
}
