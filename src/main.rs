use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arena_kcc::activity::{ActivityStats, ActivityTally, MovementActivity};
use arena_kcc::content::{ArenaDef, build_arena, load_arena, validate_arena};
use arena_kcc::movement::CharacterController;
use arena_kcc::physics::{PhysicsSim, PhysicsWorld};
use bevy::log::LogPlugin;
use bevy::prelude::*;
use serde::Serialize;

const DEFAULT_ARENA: &str = "assets/data/arena.ron";

#[derive(Debug, Serialize)]
struct RunReport {
    arena: String,
    ticks: u32,
    physics_steps: u32,
    discarded_seconds: f32,
    final_position: [f32; 3],
    grounded: bool,
    crates: BTreeMap<String, [f32; 3]>,
    activity: BTreeMap<MovementActivity, ActivityStats>,
}

fn main() -> AppExit {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_ARENA));

    // The simulation runs its own headless app, so this one only carries
    // logging and hands control to the replay.
    App::new()
        .add_plugins(LogPlugin::default())
        .set_runner(move |_| replay(&path))
        .run()
}

fn replay(path: &Path) -> AppExit {
    let arena = match load_arena(path) {
        Ok(arena) => arena,
        Err(err) => {
            error!("{}", err);
            return AppExit::error();
        }
    };

    let errors = validate_arena(&arena);
    if !errors.is_empty() {
        for err in &errors {
            error!("{}", err);
        }
        error!("Arena '{}' has {} validation errors", arena.name, errors.len());
        return AppExit::error();
    }

    match run(&arena) {
        Ok(report) => {
            match serde_json::to_string_pretty(&report) {
                Ok(json) => info!("Run report:\n{}", json),
                Err(err) => error!("Failed to serialize run report: {}", err),
            }
            AppExit::Success
        }
        Err(err) => {
            error!("Arena '{}' failed: {}", arena.name, err);
            AppExit::error()
        }
    }
}

/// Replay the arena's script against a fresh simulation.
fn run(arena: &ArenaDef) -> Result<RunReport, arena_kcc::physics::PhysicsError> {
    let mut sim = PhysicsSim::new(arena.sim.clone());
    let handles = build_arena(&mut sim, arena)?;

    let tally = Arc::new(Mutex::new(ActivityTally::default()));
    let mut controller =
        CharacterController::new(&mut sim, arena.spawn_position(), arena.controller.clone())?
            .with_reporter(tally.clone());

    let dt = arena.sim.timestep().as_secs_f32();
    let mut ticks = 0;
    let mut physics_steps = 0;

    for (index, step) in arena.script.iter().enumerate() {
        debug!("Script step {}: {:?}", index, step);
        for frame in 0..step.ticks {
            if frame == 0 {
                if step.jump {
                    controller.jump();
                }
                if let Some(direction) = step.dodge {
                    controller.dodge(Vec3::from_array(direction));
                }
            }

            controller.update(&mut sim, dt);
            controller.move_character(&mut sim, step.direction(), dt, step.run, step.climb);
            physics_steps += sim.step(dt);
            ticks += 1;

            #[cfg(feature = "dev-tools")]
            debug!(
                "tick {}: position={} grounded={} climbing={} dodging={} vy={:.3}",
                ticks,
                controller.position(),
                controller.is_grounded(),
                controller.is_climbing(),
                controller.is_dodging(),
                controller.vertical_velocity()
            );
        }
    }

    let mut crates = BTreeMap::new();
    for (id, body) in &handles.crates {
        match sim.translation(*body) {
            Ok(position) => {
                crates.insert(id.clone(), position.to_array());
            }
            Err(err) => warn!("Crate '{}' has no position: {}", id, err),
        }
    }

    let activity = match tally.lock() {
        Ok(tally) => tally.iter().collect(),
        Err(_) => {
            warn!("Activity tally lock poisoned, reporting no activity");
            BTreeMap::new()
        }
    };

    let report = RunReport {
        arena: arena.name.clone(),
        ticks,
        physics_steps,
        discarded_seconds: sim.clock().discarded().as_secs_f32(),
        final_position: controller.position().to_array(),
        grounded: controller.is_grounded(),
        crates,
        activity,
    };

    controller.dispose(&mut sim);
    Ok(report)
}
