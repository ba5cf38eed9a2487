//! Movement domain: kinematic capsule controller with wall sliding, pushing,
//! climbing and dodging.

mod collisions;
mod components;
mod controller;
mod locomotion;
mod resolve;
mod resources;

pub use components::MovementState;
pub use controller::CharacterController;
pub use resolve::{CollisionQueryResult, contact_point_on_box};
pub use resources::ControllerTuning;
