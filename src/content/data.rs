use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::movement::ControllerTuning;
use crate::physics::SimSettings;

/// One arena: world settings, geometry, the character's tuning and spawn,
/// and the scripted input the demo replays.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArenaDef {
    pub name: String,
    #[serde(default)]
    pub sim: SimSettings,
    #[serde(default)]
    pub controller: ControllerTuning,
    pub spawn: [f32; 3],
    #[serde(default)]
    pub static_boxes: Vec<BoxDef>,
    #[serde(default)]
    pub crates: Vec<CrateDef>,
    #[serde(default)]
    pub scatter: Option<ScatterDef>,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

impl ArenaDef {
    pub fn spawn_position(&self) -> Vec3 {
        Vec3::from_array(self.spawn)
    }

    /// Hand-placed crates followed by the scattered ones.
    pub fn all_crates(&self) -> Vec<CrateDef> {
        let mut crates = self.crates.clone();
        if let Some(scatter) = &self.scatter {
            crates.extend(scatter.generate());
        }
        crates
    }

    pub fn script_ticks(&self) -> u32 {
        self.script.iter().map(|step| step.ticks).sum()
    }
}

/// Immovable box geometry: floors, walls, ledges.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BoxDef {
    pub id: String,
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    #[serde(default)]
    pub yaw_degrees: f32,
}

impl BoxDef {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw_degrees.to_radians())
    }
}

/// A pushable box.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CrateDef {
    pub id: String,
    pub center: [f32; 3],
    pub half_extents: [f32; 3],
    #[serde(default)]
    pub yaw_degrees: f32,
    /// Density-derived when absent.
    #[serde(default)]
    pub mass: Option<f32>,
}

impl CrateDef {
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.yaw_degrees.to_radians())
    }
}

/// Cubic crates dropped at seeded random spots on the floor plane.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScatterDef {
    pub seed: u64,
    pub count: u32,
    /// Crates land within `[-area_half_extent, area_half_extent]` on X and Z.
    pub area_half_extent: f32,
    pub half_extent: f32,
    #[serde(default)]
    pub mass: Option<f32>,
}

impl ScatterDef {
    /// The same seed always yields the same crates.
    pub fn generate(&self) -> Vec<CrateDef> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let reach = (self.area_half_extent - self.half_extent).max(0.0);

        (0..self.count)
            .map(|index| {
                let x = rng.random_range(-reach..=reach);
                let z = rng.random_range(-reach..=reach);
                let yaw = rng.random_range(0.0..360.0);
                CrateDef {
                    id: format!("scatter_{index}"),
                    center: [x, self.half_extent, z],
                    half_extents: [self.half_extent; 3],
                    yaw_degrees: yaw,
                    mass: self.mass,
                }
            })
            .collect()
    }
}

/// Input held for `ticks` frames. Jump and dodge fire on the first frame
/// only.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptStep {
    pub ticks: u32,
    pub direction: [f32; 3],
    pub run: bool,
    pub climb: bool,
    pub jump: bool,
    pub dodge: Option<[f32; 3]>,
}

impl ScriptStep {
    pub fn direction(&self) -> Vec3 {
        Vec3::from_array(self.direction)
    }
}
