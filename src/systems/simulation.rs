//! Fixed-step simulation system
//!
//! Drives a [`World`] at the configured tick rate and keeps running totals of
//! what happened, so the binary can report on a run without inspecting every
//! step.

use craterkit_core::{StepReport, World};

use crate::config::SimulationConfig;

/// Totals over every step run so far
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationSummary {
    /// Steps taken
    pub steps: usize,
    /// Simulated seconds
    pub elapsed: f32,
    /// Body ticks summed over all steps
    pub ticks: usize,
    /// Impacts reported
    pub impacts: usize,
    /// Fastest impact seen, in px/s
    pub hardest_impact: f32,
}

/// Steps a world with a fixed timestep
pub struct SimulationSystem {
    dt: f32,
    summary: SimulationSummary,
}

impl SimulationSystem {
    /// Create a simulation system stepping `dt` seconds at a time
    pub fn new(dt: f32) -> Self {
        Self {
            dt,
            summary: SimulationSummary::default(),
        }
    }

    /// Create a simulation system at the configured tick rate
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.dt())
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Run one step and fold its report into the summary
    pub fn step(&mut self, world: &mut World) -> StepReport {
        let report = world.step(self.dt);
        self.summary.steps += 1;
        self.summary.elapsed += self.dt;
        self.summary.ticks += report.ticked;
        self.summary.impacts += report.impacts.len();
        for (key, impact) in &report.impacts {
            let speed = impact.speed();
            let name = world
                .get(*key)
                .and_then(|entity| entity.name.as_deref())
                .unwrap_or("<unnamed>");
            log::debug!("{} hit terrain at {:?} at {:.1} px/s", name, impact.cell, speed);
            self.summary.hardest_impact = self.summary.hardest_impact.max(speed);
        }
        report
    }

    /// Run `steps` steps, stopping early once nothing ticks
    ///
    /// Returns the number of steps actually run.
    pub fn run(&mut self, world: &mut World, steps: usize) -> usize {
        for n in 0..steps {
            if self.step(world).ticked == 0 {
                log::info!("world settled after {} steps", n + 1);
                return n + 1;
            }
        }
        steps
    }

    pub fn summary(&self) -> &SimulationSummary {
        &self.summary
    }
}
