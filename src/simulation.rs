/*
 * Simulation Module
 *
 * Owns the agents, the grid, the scheduler and (optionally) a dedicated worker
 * pool. Collaborators such as the viewer only call step() and read
 * agents_view() between steps.
 */

use glam::Vec2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::boid::Boid;
use crate::debug::{FlockMetrics, StepDiagnostics};
use crate::error::{try_alloc, FlockError, Result};
use crate::params::SimulationParams;
use crate::physics::{Phase, StepScheduler, TickReport};
use crate::spatial_grid::SpatialGrid;

/// Read-only snapshot of one agent for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentView {
    pub position: Vec2,
    pub velocity: Vec2,
}

pub struct Simulation {
    params: SimulationParams,
    boids: Vec<Boid>,
    grid: SpatialGrid,
    scheduler: StepScheduler,
    pool: Option<rayon::ThreadPool>,
    diagnostics: StepDiagnostics,
}

impl Simulation {
    /// Validate `params` and populate the world from its initial-state policy.
    pub fn new(params: SimulationParams) -> Result<Self> {
        params.validate()?;

        let mut rng = match params.initial_state.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut boids = try_alloc("agent buffer", params.num_boids, Boid::default())?;
        for boid in &mut boids {
            *boid = Boid::random(&mut rng, &params);
        }

        Self::assemble(params, boids)
    }

    /// Start from an existing agent snapshot. `params.num_boids` is replaced
    /// by the snapshot's length.
    pub fn with_boids(params: SimulationParams, boids: Vec<Boid>) -> Result<Self> {
        let params = SimulationParams {
            num_boids: boids.len(),
            ..params
        };
        params.validate()?;

        for (i, boid) in boids.iter().enumerate() {
            let p = boid.position;
            if !(p.is_finite() && boid.velocity.is_finite()) {
                return Err(FlockError::InvalidState(format!("agent {i} has a non-finite state")));
            }
            if !(0.0..params.world_width).contains(&p.x) || !(0.0..params.world_height).contains(&p.y) {
                return Err(FlockError::InvalidState(format!(
                    "agent {i} at ({}, {}) lies outside the {}x{} world",
                    p.x, p.y, params.world_width, params.world_height
                )));
            }
        }

        Self::assemble(params, boids)
    }

    fn assemble(params: SimulationParams, boids: Vec<Boid>) -> Result<Self> {
        let grid = SpatialGrid::new(&params)?;
        let scheduler = StepScheduler::new(boids.len())?;
        let pool = params
            .worker_threads
            .map(|threads| {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("flockgrid-worker-{i}"))
                    .build()
            })
            .transpose()?;

        info!(
            agents = boids.len(),
            world_width = params.world_width,
            world_height = params.world_height,
            grid_width = grid.dimensions().0,
            grid_height = grid.dimensions().1,
            cell_capacity = grid.cell_capacity(),
            parallel = params.enable_parallel,
            spatial_grid = params.enable_spatial_grid,
            worker_threads = ?params.worker_threads,
            "simulation created"
        );

        Ok(Self {
            params,
            boids,
            grid,
            scheduler,
            pool,
            diagnostics: StepDiagnostics::default(),
        })
    }

    /// Advance one tick. The elapsed time is ignored: every tick is one unit
    /// step.
    pub fn step(&mut self, _delta: f32) -> TickReport {
        let Self {
            params,
            boids,
            grid,
            scheduler,
            pool,
            diagnostics,
        } = self;

        let report = match pool {
            Some(pool) => pool.install(|| scheduler.run_tick(boids, grid, params)),
            None => scheduler.run_tick(boids, grid, params),
        };
        diagnostics.record(&report);
        report
    }

    pub fn agents_view(&self) -> impl ExactSizeIterator<Item = AgentView> + '_ {
        self.boids.iter().map(|boid| AgentView {
            position: boid.position,
            velocity: boid.velocity,
        })
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn grid(&self) -> &SpatialGrid {
        &self.grid
    }

    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    pub fn tick(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn diagnostics(&self) -> &StepDiagnostics {
        &self.diagnostics
    }

    pub fn flock_metrics(&self) -> FlockMetrics {
        FlockMetrics::measure(&self.boids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_config_before_any_tick() {
        let params = SimulationParams { cell_range: 0, ..SimulationParams::dense() };
        assert!(matches!(Simulation::new(params), Err(FlockError::InvalidConfig(_))));
    }

    #[test]
    fn seeded_construction_is_reproducible() {
        let params = SimulationParams { num_boids: 50, ..SimulationParams::small() }.with_seed(99);
        let a = Simulation::new(params.clone()).unwrap();
        let b = Simulation::new(params).unwrap();
        assert_eq!(a.boids(), b.boids());
        assert_eq!(a.agents_view().len(), 50);
    }

    #[test]
    fn initial_population_respects_bounds() {
        let params = SimulationParams::small().with_seed(3);
        let sim = Simulation::new(params).unwrap();
        for view in sim.agents_view() {
            assert!((0.0..800.0).contains(&view.position.x));
            assert!((0.0..800.0).contains(&view.position.y));
            assert!(view.velocity.x.abs() <= 10.0 && view.velocity.y.abs() <= 10.0);
        }
    }

    #[test]
    fn with_boids_rejects_out_of_world_agents() {
        let params = SimulationParams::small();
        let outside = vec![Boid::new(Vec2::new(800.0, 10.0), Vec2::ZERO)];
        assert!(matches!(
            Simulation::with_boids(params.clone(), outside),
            Err(FlockError::InvalidState(_))
        ));

        let nan = vec![Boid::new(Vec2::new(1.0, 1.0), Vec2::new(f32::NAN, 0.0))];
        assert!(Simulation::with_boids(params, nan).is_err());
    }

    #[test]
    fn dedicated_pool_runs_ticks() {
        let params = SimulationParams {
            num_boids: 200,
            worker_threads: Some(2),
            ..SimulationParams::small()
        }
        .with_seed(11);
        let mut sim = Simulation::new(params).unwrap();
        let report = sim.step(0.0);
        assert_eq!(report.chunk_size, 100);
        assert_eq!(sim.tick(), 1);
        assert_eq!(sim.phase(), Phase::Idle);
        assert_eq!(sim.diagnostics().ticks, 1);
    }
}
