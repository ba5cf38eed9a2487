//! Activity domain: fire-and-forget notifications about movement, consumed by
//! progression systems that live outside the controller.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bevy::prelude::*;
use serde::Serialize;


/// Movement categories a controller reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MovementActivity {
    Walking,
    Running,
    Pushing,
    Climbing,
    Dodging,
    Jumping,
    Airborne,
}

impl MovementActivity {
    pub const ALL: [MovementActivity; 7] = [
        MovementActivity::Walking,
        MovementActivity::Running,
        MovementActivity::Pushing,
        MovementActivity::Climbing,
        MovementActivity::Dodging,
        MovementActivity::Jumping,
        MovementActivity::Airborne,
    ];
}

/// Receives movement notifications. The controller never reads anything
/// back, so implementations must not fail.
pub trait ActivityReporter: Send + Sync + 'static {
    /// `magnitude` is category specific: metres moved, impulse size, or
    /// take-off speed.
    fn report(&mut self, activity: MovementActivity, magnitude: f32);
}

/// The reporter used when nothing is listening.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ActivityReporter for NoopReporter {
    fn report(&mut self, _activity: MovementActivity, _magnitude: f32) {}
}

/// Forwards to a reporter shared with other owners.
impl<R: ActivityReporter> ActivityReporter for Arc<Mutex<R>> {
    fn report(&mut self, activity: MovementActivity, magnitude: f32) {
        match self.lock() {
            Ok(mut reporter) => reporter.report(activity, magnitude),
            Err(_) => warn!("Activity reporter lock poisoned, dropping {:?}", activity),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct ActivityStats {
    pub events: u32,
    pub total: f32,
}

/// Counts events and sums magnitudes per category.
#[derive(Debug, Default, Clone)]
pub struct ActivityTally {
    stats: HashMap<MovementActivity, ActivityStats>,
}

impl ActivityTally {
    pub fn stats(&self, activity: MovementActivity) -> ActivityStats {
        self.stats.get(&activity).copied().unwrap_or_default()
    }

    pub fn events(&self, activity: MovementActivity) -> u32 {
        self.stats(activity).events
    }

    pub fn total(&self, activity: MovementActivity) -> f32 {
        self.stats(activity).total
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Categories that occurred, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (MovementActivity, ActivityStats)> + '_ {
        MovementActivity::ALL
            .into_iter()
            .filter_map(|activity| self.stats.get(&activity).map(|stats| (activity, *stats)))
    }
}

impl ActivityReporter for ActivityTally {
    fn report(&mut self, activity: MovementActivity, magnitude: f32) {
        let stats = self.stats.entry(activity).or_default();
        stats.events += 1;
        if magnitude.is_finite() {
            stats.total += magnitude;
        }
    }
}
