/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains every tunable
 * value of the flocking kernel. Parameters are built once, validated when the
 * simulation is constructed, and never modified afterwards.
 */

use crate::error::{FlockError, Result};

/// How the integrator bounds an agent's speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VelocityPolicy {
    /// Rescale velocity so that `|v| <= max_velocity`.
    ClampMax,
    /// Rescale velocity into `min_velocity <= |v| <= max_velocity`.
    Band,
}

/// Per-rule weights applied to the aggregated neighbor statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceWeights {
    pub alignment: f32,
    pub cohesion: f32,
    pub separation: f32,
}

/// How the initial population is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialState {
    /// Seed for the initial distribution; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Each velocity component is drawn uniformly from `[-v, v]`.
    pub max_initial_velocity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub world_width: f32,
    pub world_height: f32,
    pub num_boids: usize,
    pub grid_resolution: f32,
    pub cell_capacity: usize,
    pub perception_radius: f32,
    pub cell_range: usize,
    pub weights: ForceWeights,
    pub min_velocity: f32,
    pub max_velocity: f32,
    pub velocity_policy: VelocityPolicy,
    pub max_acceleration: f32,
    pub initial_state: InitialState,
    // Performance settings
    pub enable_parallel: bool,
    pub enable_spatial_grid: bool,
    /// Size of a dedicated worker pool; `None` shares rayon's global pool.
    pub worker_threads: Option<usize>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self::dense()
    }
}

impl SimulationParams {
    /// Large population on a 2000x2000 torus, bucketed by a 50-unit grid.
    pub fn dense() -> Self {
        Self {
            world_width: 2000.0,
            world_height: 2000.0,
            num_boids: 10_000,
            grid_resolution: 50.0,
            cell_capacity: 256,
            perception_radius: 50.0,
            cell_range: 1,
            weights: ForceWeights {
                alignment: 0.1,
                cohesion: 0.02,
                separation: 25.0,
            },
            min_velocity: 0.0,
            max_velocity: 30.0,
            velocity_policy: VelocityPolicy::ClampMax,
            max_acceleration: 1.0,
            initial_state: InitialState {
                seed: None,
                max_initial_velocity: 30.0,
            },
            enable_parallel: true,
            enable_spatial_grid: true,
            worker_threads: None,
        }
    }

    /// A hundred agents on an 800x800 torus with a wide perception radius and
    /// no separation.
    pub fn small() -> Self {
        Self {
            world_width: 800.0,
            world_height: 800.0,
            num_boids: 100,
            grid_resolution: 200.0,
            cell_capacity: 128,
            perception_radius: 150.0,
            cell_range: 1,
            weights: ForceWeights {
                alignment: 0.1,
                cohesion: 0.01,
                separation: 0.0,
            },
            min_velocity: 0.0,
            max_velocity: 10.0,
            velocity_policy: VelocityPolicy::ClampMax,
            max_acceleration: 0.8,
            initial_state: InitialState {
                seed: None,
                max_initial_velocity: 10.0,
            },
            enable_parallel: true,
            enable_spatial_grid: true,
            worker_threads: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.initial_state.seed = Some(seed);
        self
    }

    /// Grid dimensions as `(width, height)` in cells.
    pub fn grid_dimensions(&self) -> (usize, usize) {
        (
            (self.world_width / self.grid_resolution).ceil() as usize,
            (self.world_height / self.grid_resolution).ceil() as usize,
        )
    }

    /// Smallest cell range that still covers the perception radius.
    pub fn required_cell_range(&self) -> usize {
        (self.perception_radius / self.grid_resolution).ceil() as usize
    }

    /// Reject configurations that would crash or silently mis-simulate.
    pub fn validate(&self) -> Result<()> {
        positive("world_width", self.world_width)?;
        positive("world_height", self.world_height)?;
        positive("grid_resolution", self.grid_resolution)?;
        positive("perception_radius", self.perception_radius)?;
        positive("max_acceleration", self.max_acceleration)?;
        positive("max_velocity", self.max_velocity)?;

        if self.cell_capacity == 0 {
            return Err(FlockError::config("cell_capacity must be > 0"));
        }
        if !(self.min_velocity.is_finite() && self.min_velocity >= 0.0) {
            return Err(FlockError::config(format!(
                "min_velocity must be finite and >= 0, got {}",
                self.min_velocity
            )));
        }
        if self.min_velocity > self.max_velocity {
            return Err(FlockError::config(format!(
                "min_velocity ({}) exceeds max_velocity ({})",
                self.min_velocity, self.max_velocity
            )));
        }

        let ForceWeights { alignment, cohesion, separation } = self.weights;
        if ![alignment, cohesion, separation].iter().all(|w| w.is_finite()) {
            return Err(FlockError::config("force weights must be finite"));
        }

        let init_v = self.initial_state.max_initial_velocity;
        if !(init_v.is_finite() && init_v >= 0.0) {
            return Err(FlockError::config(format!(
                "max_initial_velocity must be finite and >= 0, got {init_v}"
            )));
        }

        if (self.cell_range as f32) * self.grid_resolution < self.perception_radius {
            return Err(FlockError::config(format!(
                "cell_range {} * grid_resolution {} does not cover perception_radius {} (need cell_range >= {})",
                self.cell_range,
                self.grid_resolution,
                self.perception_radius,
                self.required_cell_range()
            )));
        }

        if self.worker_threads == Some(0) {
            return Err(FlockError::config("worker_threads must be > 0 when set"));
        }

        Ok(())
    }
}

fn positive(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FlockError::config(format!("{name} must be finite and > 0, got {value}")))
    }
}
