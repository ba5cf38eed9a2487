//! Content domain: RON arena descriptions and turning them into physics
//! bodies.

mod data;
mod loader;
#[cfg(test)]
mod tests;
mod validation;

use bevy::prelude::*;

use crate::physics::{BodyShape, PhysicsError, PhysicsWorld};

pub use data::{ArenaDef, BoxDef, CrateDef, ScatterDef, ScriptStep};
pub use loader::{ContentLoadError, load_arena, parse_arena};
pub use validation::{ValidationError, validate_arena};

/// Bodies created for an arena, keyed by their content id.
#[derive(Debug, Default, Clone)]
pub struct ArenaHandles {
    pub static_bodies: Vec<(String, Entity)>,
    pub crates: Vec<(String, Entity)>,
}

impl ArenaHandles {
    pub fn crate_body(&self, id: &str) -> Option<Entity> {
        self.crates
            .iter()
            .find(|(crate_id, _)| crate_id == id)
            .map(|(_, entity)| *entity)
    }
}

/// Create the static geometry and crates of `arena` in `world`.
pub fn build_arena<W: PhysicsWorld + ?Sized>(
    world: &mut W,
    arena: &ArenaDef,
) -> Result<ArenaHandles, PhysicsError> {
    let mut handles = ArenaHandles::default();

    for def in &arena.static_boxes {
        let body = world.create_static_body(
            BodyShape::cuboid(Vec3::from_array(def.half_extents)),
            Vec3::from_array(def.center),
            def.rotation(),
        )?;
        handles.static_bodies.push((def.id.clone(), body));
    }

    for def in arena.all_crates() {
        let body = world.create_dynamic_body(
            BodyShape::cuboid(Vec3::from_array(def.half_extents)),
            Vec3::from_array(def.center),
            def.rotation(),
            def.mass,
        )?;
        handles.crates.push((def.id, body));
    }

    info!(
        "Built arena '{}': {} static bodies, {} crates",
        arena.name,
        handles.static_bodies.len(),
        handles.crates.len()
    );
    Ok(handles)
}
