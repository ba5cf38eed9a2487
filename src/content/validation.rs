//! Validation for arena definitions: values the physics world would reject
//! and ids that collide.

use std::collections::HashSet;

use thiserror::Error;

use super::data::*;

/// A validation error with context about what failed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{source_type} '{source_id}' has invalid {field}: {message}")]
pub struct ValidationError {
    pub source_type: &'static str,
    pub source_id: String,
    pub field: &'static str,
    pub message: String,
}

/// Helper macro for recording a failed check
macro_rules! check {
    ($errors:expr, $cond:expr, $source_type:expr, $source_id:expr, $field:expr, $($message:tt)+) => {
        if !$cond {
            $errors.push(ValidationError {
                source_type: $source_type,
                source_id: $source_id.to_string(),
                field: $field,
                message: format!($($message)+),
            });
        }
    };
}

fn finite(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn positive(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite() && *v > 0.0)
}

/// Validate every part of the arena.
/// Returns a list of validation errors, empty if the arena is usable.
pub fn validate_arena(arena: &ArenaDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let name = arena.name.as_str();

    // Simulation
    let sim = &arena.sim;
    check!(
        errors,
        sim.tick_rate.is_finite() && sim.tick_rate > 0.0,
        "Arena",
        name,
        "sim.tick_rate",
        "{} must be positive",
        sim.tick_rate
    );
    check!(
        errors,
        sim.max_steps_per_frame > 0,
        "Arena",
        name,
        "sim.max_steps_per_frame",
        "at least one step is required"
    );
    check!(
        errors,
        sim.gravity.is_finite() && sim.gravity >= 0.0,
        "Arena",
        name,
        "sim.gravity",
        "{} must not be negative",
        sim.gravity
    );

    // Controller
    for problem in arena.controller.problems() {
        errors.push(ValidationError {
            source_type: "Arena",
            source_id: name.to_string(),
            field: "controller",
            message: problem,
        });
    }
    check!(
        errors,
        finite(&arena.spawn),
        "Arena",
        name,
        "spawn",
        "{:?} must be finite",
        arena.spawn
    );

    // Geometry
    let mut seen = HashSet::new();
    for def in &arena.static_boxes {
        check!(
            errors,
            seen.insert(def.id.as_str()),
            "StaticBox",
            def.id,
            "id",
            "duplicate id"
        );
        check!(
            errors,
            finite(&def.center) && def.yaw_degrees.is_finite(),
            "StaticBox",
            def.id,
            "center",
            "pose {:?} / {} must be finite",
            def.center,
            def.yaw_degrees
        );
        check!(
            errors,
            positive(&def.half_extents),
            "StaticBox",
            def.id,
            "half_extents",
            "{:?} must be positive",
            def.half_extents
        );
    }

    for def in &arena.crates {
        check!(
            errors,
            seen.insert(def.id.as_str()),
            "Crate",
            def.id,
            "id",
            "duplicate id"
        );
        validate_crate(&mut errors, def);
    }

    if let Some(scatter) = &arena.scatter {
        let id = format!("seed {}", scatter.seed);
        check!(
            errors,
            positive(&[scatter.half_extent]),
            "Scatter",
            id,
            "half_extent",
            "{} must be positive",
            scatter.half_extent
        );
        check!(
            errors,
            scatter.area_half_extent.is_finite() && scatter.area_half_extent >= scatter.half_extent,
            "Scatter",
            id,
            "area_half_extent",
            "{} must fit a crate of half extent {}",
            scatter.area_half_extent,
            scatter.half_extent
        );
        check!(
            errors,
            scatter.mass.is_none_or(|mass| positive(&[mass])),
            "Scatter",
            id,
            "mass",
            "{:?} must be positive",
            scatter.mass
        );
    }

    // Script
    for (index, step) in arena.script.iter().enumerate() {
        let id = format!("#{index}");
        check!(
            errors,
            step.ticks > 0,
            "ScriptStep",
            id,
            "ticks",
            "a step must last at least one tick"
        );
        check!(
            errors,
            finite(&step.direction),
            "ScriptStep",
            id,
            "direction",
            "{:?} must be finite",
            step.direction
        );
        check!(
            errors,
            step.dodge.is_none_or(|dodge| finite(&dodge)),
            "ScriptStep",
            id,
            "dodge",
            "{:?} must be finite",
            step.dodge
        );
    }

    errors
}

fn validate_crate(errors: &mut Vec<ValidationError>, def: &CrateDef) {
    check!(
        errors,
        finite(&def.center) && def.yaw_degrees.is_finite(),
        "Crate",
        def.id,
        "center",
        "pose {:?} / {} must be finite",
        def.center,
        def.yaw_degrees
    );
    check!(
        errors,
        positive(&def.half_extents),
        "Crate",
        def.id,
        "half_extents",
        "{:?} must be positive",
        def.half_extents
    );
    check!(
        errors,
        def.mass.is_none_or(|mass| positive(&[mass])),
        "Crate",
        def.id,
        "mass",
        "{:?} must be positive",
        def.mass
    );
}
