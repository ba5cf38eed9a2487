//! Physics domain: the world contract consumed by character controllers and
//! its avian3d-backed implementation.

mod clock;
mod sim;
#[cfg(test)]
mod tests;
mod world;

pub use clock::FixedStepClock;
pub use sim::{PhysicsSim, SimSettings, SimulationPlugin};
pub use world::{BodyDesc, BodyKind, BodyShape, PhysicsError, PhysicsWorld, ShapeHit};
