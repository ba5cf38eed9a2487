pub mod activity;
pub mod content;
pub mod movement;
pub mod physics;
