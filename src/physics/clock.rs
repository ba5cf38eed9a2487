//! Physics domain: fixed-timestep accumulator with a catch-up cap.

use std::time::Duration;

use bevy::prelude::*;

/// Turns variable frame deltas into a whole number of fixed simulation steps.
///
/// Owed time beyond `max_steps` steps is dropped instead of being carried
/// into the next frame, so a long stall never snowballs into ever longer
/// catch-up frames.
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    timestep: Duration,
    max_steps: u32,
    accumulator: Duration,
    discarded: Duration,
    steps_taken: u64,
}

impl FixedStepClock {
    pub fn new(timestep: Duration, max_steps: u32) -> Self {
        Self {
            timestep,
            max_steps: max_steps.max(1),
            accumulator: Duration::ZERO,
            discarded: Duration::ZERO,
            steps_taken: 0,
        }
    }

    pub fn timestep(&self) -> Duration {
        self.timestep
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// Time owed but not yet simulated (always less than one timestep after
    /// [`advance`](Self::advance)).
    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    /// Total simulation time thrown away by the catch-up cap.
    pub fn discarded(&self) -> Duration {
        self.discarded
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Add `dt` seconds of owed time and return how many fixed steps to run.
    pub fn advance(&mut self, dt: f32) -> u32 {
        if !dt.is_finite() || dt <= 0.0 {
            return 0;
        }

        // Deltas too large for a Duration saturate and end up discarded.
        let owed = Duration::try_from_secs_f32(dt).unwrap_or(Duration::MAX);
        self.accumulator = self.accumulator.saturating_add(owed);

        let mut steps = 0;
        while self.accumulator >= self.timestep && steps < self.max_steps {
            self.accumulator -= self.timestep;
            steps += 1;
        }

        if self.accumulator >= self.timestep {
            debug!(
                "Physics fell behind, discarding {:?} of owed time after {} steps",
                self.accumulator, steps
            );
            self.discarded = self.discarded.saturating_add(self.accumulator);
            self.accumulator = Duration::ZERO;
        }

        self.steps_taken += u64::from(steps);
        steps
    }
}

impl Default for FixedStepClock {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(1.0 / 60.0), 5)
    }
}
