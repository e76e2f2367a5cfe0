/*
 * Physics Module
 *
 * This module drives one simulation tick as three phases:
 *
 *   Idle -> GridRebuild -> ForceCompute -> Integrate -> Idle
 *
 * - GridRebuild re-buckets every agent (single-threaded, deterministic order);
 *   it is a no-op when the spatial grid is disabled
 * - ForceCompute aggregates neighbors and writes each agent's steering into a
 *   staging buffer; positions and velocities are read-only here
 * - Integrate commits the staged acceleration into each agent and moves it
 *
 * Each parallel phase is a single rayon fork-join, so a phase cannot start
 * before every task of the previous one has returned. No agent integrates
 * against a neighbor that already moved this tick.
 */

use std::time::{Duration, Instant};

use glam::Vec2;
use rayon::prelude::*;
use tracing::trace;

use crate::boid::Boid;
use crate::error::{try_alloc, Result};
use crate::neighbors::{aggregate, aggregate_brute_force};
use crate::params::SimulationParams;
use crate::spatial_grid::{RebuildReport, SpatialGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    GridRebuild,
    ForceCompute,
    Integrate,
}

impl Phase {
    pub fn next(self) -> Phase {
        match self {
            Phase::Idle => Phase::GridRebuild,
            Phase::GridRebuild => Phase::ForceCompute,
            Phase::ForceCompute => Phase::Integrate,
            Phase::Integrate => Phase::Idle,
        }
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub rebuild: RebuildReport,
    pub rebuild_time: Duration,
    pub force_time: Duration,
    pub integrate_time: Duration,
    /// Agents per parallel task; zero when the tick ran sequentially.
    pub chunk_size: usize,
}

impl TickReport {
    pub fn total_time(&self) -> Duration {
        self.rebuild_time + self.force_time + self.integrate_time
    }
}

pub struct StepScheduler {
    phase: Phase,
    ticks: u64,
    accelerations: Vec<Vec2>,
}

impl StepScheduler {
    pub fn new(num_boids: usize) -> Result<Self> {
        Ok(Self {
            phase: Phase::Idle,
            ticks: 0,
            accelerations: try_alloc("acceleration staging buffer", num_boids, Vec2::ZERO)?,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn enter(&mut self, phase: Phase) {
        debug_assert_eq!(self.phase.next(), phase, "illegal phase transition");
        trace!(from = ?self.phase, to = ?phase, tick = self.ticks, "phase transition");
        self.phase = phase;
    }

    /// Run one full tick over `boids`, leaving the scheduler `Idle`.
    pub fn run_tick(
        &mut self,
        boids: &mut [Boid],
        grid: &mut SpatialGrid,
        params: &SimulationParams,
    ) -> TickReport {
        if self.accelerations.len() != boids.len() {
            self.accelerations.resize(boids.len(), Vec2::ZERO);
        }

        // Calculate optimal chunk size based on available threads
        let chunk_size = if params.enable_parallel {
            std::cmp::max(boids.len() / rayon::current_num_threads(), 1)
        } else {
            0
        };

        self.enter(Phase::GridRebuild);
        let started = Instant::now();
        // The linear-scan engine never reads the grid, so nothing is bucketed
        // and nothing can be dropped.
        let rebuild = if params.enable_spatial_grid {
            grid.rebuild(boids)
        } else {
            RebuildReport::default()
        };
        let rebuild_time = started.elapsed();

        self.enter(Phase::ForceCompute);
        let started = Instant::now();
        compute_forces(&mut self.accelerations, boids, grid, params, chunk_size);
        let force_time = started.elapsed();

        self.enter(Phase::Integrate);
        let started = Instant::now();
        integrate(boids, &self.accelerations, params, chunk_size);
        let integrate_time = started.elapsed();

        self.enter(Phase::Idle);
        self.ticks += 1;

        let report = TickReport {
            tick: self.ticks,
            rebuild,
            rebuild_time,
            force_time,
            integrate_time,
            chunk_size,
        };
        trace!(
            tick = report.tick,
            dropped = rebuild.dropped,
            rebuild_us = rebuild_time.as_micros() as u64,
            force_us = force_time.as_micros() as u64,
            integrate_us = integrate_time.as_micros() as u64,
            "tick complete"
        );
        report
    }
}

// Steering for every agent into `accelerations`; reads only positions/velocities
fn compute_forces(
    accelerations: &mut [Vec2],
    boids: &[Boid],
    grid: &SpatialGrid,
    params: &SimulationParams,
    chunk_size: usize,
) {
    let steering_for = |i: usize| {
        let stats = if params.enable_spatial_grid {
            aggregate(boids, i, grid, params.cell_range, params.perception_radius)
        } else {
            aggregate_brute_force(boids, i, params.perception_radius)
        };
        boids[i].steering(&stats, &params.weights, params.max_acceleration)
    };

    if chunk_size > 0 {
        accelerations
            .par_chunks_mut(chunk_size)
            .enumerate()
            .for_each(|(chunk_idx, chunk)| {
                let base = chunk_idx * chunk_size;
                for (offset, acceleration) in chunk.iter_mut().enumerate() {
                    *acceleration = steering_for(base + offset);
                }
            });
    } else {
        for (i, acceleration) in accelerations.iter_mut().enumerate() {
            *acceleration = steering_for(i);
        }
    }
}

// Each agent only touches its own record
fn integrate(boids: &mut [Boid], accelerations: &[Vec2], params: &SimulationParams, chunk_size: usize) {
    let commit = |boid: &mut Boid, acceleration: Vec2| {
        boid.acceleration = acceleration;
        boid.integrate(params);
    };

    if chunk_size > 0 {
        boids
            .par_chunks_mut(chunk_size)
            .zip(accelerations.par_chunks(chunk_size))
            .for_each(|(boid_chunk, acceleration_chunk)| {
                for (boid, &acceleration) in boid_chunk.iter_mut().zip(acceleration_chunk) {
                    commit(boid, acceleration);
                }
            });
    } else {
        for (boid, &acceleration) in boids.iter_mut().zip(accelerations) {
            commit(boid, acceleration);
        }
    }
}
